pub mod degradations;
pub mod report;
pub mod selection;

pub use crate::domain::model::{Degradation, DegradationReport, Selector, Workbook};
pub use crate::domain::ports::WorkbookService;
pub use crate::utils::error::Result;
