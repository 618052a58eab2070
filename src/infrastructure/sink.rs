//! Edge record writers: JSON for chart front-ends, CSV for spreadsheets,
//! and an aligned table for the terminal.

use std::io::Write;

use crate::domain::tree_view::{format_percent, format_value};
use crate::domain::EdgeRecord;
use crate::infrastructure::error::{InfraError, InfraResult};

pub fn write_json(edges: &[EdgeRecord], out: &mut dyn Write) -> InfraResult<()> {
    serde_json::to_writer_pretty(&mut *out, edges).map_err(|e| InfraError::output("json", e))?;
    writeln!(out).map_err(|e| InfraError::io("write json", e))
}

pub fn write_csv(edges: &[EdgeRecord], out: &mut dyn Write) -> InfraResult<()> {
    let mut writer = csv::Writer::from_writer(out);
    for edge in edges {
        writer
            .serialize(edge)
            .map_err(|e| InfraError::output("csv", e))?;
    }
    writer.flush().map_err(|e| InfraError::io("flush csv", e))
}

pub fn write_table(edges: &[EdgeRecord], out: &mut dyn Write) -> InfraResult<()> {
    let rows: Vec<[String; 5]> = edges
        .iter()
        .map(|e| {
            [
                e.node_path.clone(),
                format_value(e.value),
                format_percent(e.percent_of_total),
                format_percent(e.percent_of_parent),
                e.color.clone().unwrap_or_default(),
            ]
        })
        .collect();

    let headers = ["PATH", "VALUE", "TOTAL", "PARENT", "COLOR"];
    let mut widths = headers.map(|h| h.chars().count());
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |cells: [&str; 5]| -> String {
        let path = pad_right(cells[0], widths[0]);
        let numbers = cells[1..4]
            .iter()
            .zip(&widths[1..4])
            .map(|(c, w)| pad_left(c, *w))
            .collect::<Vec<_>>()
            .join("  ");
        format!("{}  {}  {}", path, numbers, cells[4]).trim_end().to_string()
    };

    writeln!(out, "{}", line(headers)).map_err(|e| InfraError::io("write table", e))?;
    for row in &rows {
        let cells = [
            row[0].as_str(),
            row[1].as_str(),
            row[2].as_str(),
            row[3].as_str(),
            row[4].as_str(),
        ];
        writeln!(out, "{}", line(cells)).map_err(|e| InfraError::io("write table", e))?;
    }
    Ok(())
}

// Width by chars; CJK labels are wider on screen but this keeps the columns stable.
fn pad_right(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(s.chars().count());
    format!("{}{}", s, " ".repeat(fill))
}

fn pad_left(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(s.chars().count());
    format!("{}{}", " ".repeat(fill), s)
}
