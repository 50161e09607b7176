pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::tableau::{Credentials, Password, Session, TableauServer};
pub use config::{CliConfig, LogLevel, Settings};
pub use core::report::write_report;
pub use domain::model::{Degradation, ProjectSelector, Selector, Workbook, WorkbookSelector};
pub use domain::ports::WorkbookService;
pub use utils::error::{DegradationError, Result};
