use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workbook {
    pub id: String,
    pub name: String,
    pub project_id: String,
    pub project_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkbookSelector {
    Id(String),
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectSelector {
    Id(String),
    Name(String),
}

impl ProjectSelector {
    pub fn matches(&self, workbook: &Workbook) -> bool {
        match self {
            ProjectSelector::Id(id) => workbook.project_id == *id,
            ProjectSelector::Name(name) => workbook.project_name == *name,
        }
    }
}

/// 兩個獨立的軸：workbook 與 project，各自最多一種
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    pub workbook: Option<WorkbookSelector>,
    pub project: Option<ProjectSelector>,
}

impl Selector {
    pub fn project_matches(&self, workbook: &Workbook) -> bool {
        self.project
            .as_ref()
            .map_or(true, |project| project.matches(workbook))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Degradation {
    pub name: Option<String>,
    pub severity: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DegradationReport {
    pub workbook_name: String,
    pub degradations: Vec<Degradation>,
}

pub const REPORT_HEADER: &str = "Workbook Name,Degradation Name,Severity";

struct AttrDisplay<'a>(&'a Option<String>);

impl fmt::Display for AttrDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => f.write_str(value),
            None => f.write_str("None"),
        }
    }
}

impl DegradationReport {
    /// One `"<workbook>",<name>,<severity>` line per degradation.
    pub fn rows(&self) -> impl Iterator<Item = String> + '_ {
        self.degradations.iter().map(move |d| {
            format!(
                "\"{}\",{},{}",
                self.workbook_name,
                AttrDisplay(&d.name),
                AttrDisplay(&d.severity)
            )
        })
    }
}
