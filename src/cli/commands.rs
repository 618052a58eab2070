//! Command dispatch

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::services::AggregationOutput;
use crate::cli::args::{Cli, Commands, ConfigCommands, OutputFormat};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings, LOCAL_CONFIG_FILE};
use crate::domain::TreeNodeConvert;
use crate::infrastructure::sink::{write_csv, write_json, write_table};
use crate::infrastructure::{InfraError, ServiceContainer};

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        Some(Commands::Config { command }) => _config(cli, command),
        Some(Commands::Build {
            input,
            format,
            output,
        }) => _build(cli, input.as_deref(), *format, output.as_deref()),
        Some(Commands::Tree { input }) => _tree(cli, input.as_deref()),
        Some(Commands::Check { input }) => _check(cli, input.as_deref()),
        None => Err(CliError::Usage(
            "no command given, try `sunburst --help`".to_string(),
        )),
    }
}

/// Layered settings plus command line overrides.
fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(policy) = cli.missing_weight {
        debug!("missing_weight override: {}", policy);
        settings.schema.missing_weight = policy;
    }
    Ok(settings)
}

fn run_pipeline(cli: &Cli, input: Option<&Path>) -> CliResult<AggregationOutput> {
    let container = ServiceContainer::new(load_settings(cli)?)?;
    let source = container.source(input)?;
    Ok(container.aggregation.run(source.as_ref())?)
}

#[instrument(level = "debug", skip(cli))]
fn _build(
    cli: &Cli,
    input: Option<&Path>,
    format: OutputFormat,
    output_path: Option<&Path>,
) -> CliResult<()> {
    let result = run_pipeline(cli, input)?;
    output::summary_line(&result.summary);
    for anomaly in &result.anomalies {
        output::warning(anomaly);
    }

    let mut writer: Box<dyn Write> = match output_path {
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| InfraError::io(format!("create {}", path.display()), e))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    match format {
        OutputFormat::Json => write_json(&result.edges, &mut *writer)?,
        OutputFormat::Csv => write_csv(&result.edges, &mut *writer)?,
        OutputFormat::Table => write_table(&result.edges, &mut *writer)?,
    }
    writer
        .flush()
        .map_err(|e| InfraError::io("flush output", e))?;

    if let Some(path) = output_path {
        output::success(&format!(
            "{} records written to {}",
            result.edges.len(),
            path.display()
        ));
    }
    Ok(())
}

#[instrument(level = "debug", skip(cli))]
fn _tree(cli: &Cli, input: Option<&Path>) -> CliResult<()> {
    let result = run_pipeline(cli, input)?;
    output::summary_line(&result.summary);
    output::info(&result.tree.to_tree_string());
    Ok(())
}

#[instrument(level = "debug", skip(cli))]
fn _check(cli: &Cli, input: Option<&Path>) -> CliResult<()> {
    let result = run_pipeline(cli, input)?;
    output::report(&result.summary, result.tree.tree(), &result.anomalies);
    if result.summary.is_empty_result() {
        return Err(CliError::NoAcceptedRows {
            total: result.summary.total_rows,
            rejected: result.summary.rejected_count(),
        });
    }
    Ok(())
}

fn _config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = load_settings(cli)?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::detail(&format!("global: {}", path.display())),
                None => output::detail("global: (no home directory)"),
            }
            let local = cli
                .config
                .clone()
                .unwrap_or_else(|| Path::new(LOCAL_CONFIG_FILE).to_path_buf());
            let state = if local.exists() { "" } else { " (not found)" };
            output::detail(&format!("local:  {}{}", local.display(), state));
        }
    }
    Ok(())
}
