//! Infrastructure layer: I/O implementations and DI container
//!
//! This layer reads record sources, writes edge output and wires up services.

pub mod di;
pub mod error;
pub mod sink;
pub mod source;
pub mod traits;

pub use di::ServiceContainer;
pub use error::{InfraError, InfraResult};
pub use source::{source_for_path, CsvFileSource, JsonFileSource};
pub use traits::{InMemorySource, RecordSource};
