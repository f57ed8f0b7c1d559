pub mod classifier;
pub mod common;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod intake;
pub mod pipeline;
pub mod report;

pub use error::{AppError, ClassifierError, ConfigError, DecodeError, ExportError};

pub use config::{ClassifierStrategy, Configuration};
pub use coordinator::{Coordinator, CoordinatorBuilder};
