pub mod config;
pub mod converter;
pub mod descriptor;
pub mod invoker;
pub mod orchestrator;
pub mod placer;
pub mod staging;
pub mod testing;

pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use converter::{Conversion, ConversionError, ConversionOutcome, ConversionRunner};
pub use descriptor::{check_dependents, resolve_dependents, DescriptorError};
pub use invoker::{InvokerError, ProcessInvoker, ToolCatalog, ToolRunner};
pub use orchestrator::{
    JobDescriptor, JobError, JobEvent, JobOrchestrator, JobOutcome, JobReport, JobState,
};
pub use placer::{FsPlacer, PlacementError};
pub use staging::{StagingArea, StagingError, StagingManager};
