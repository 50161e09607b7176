pub mod profile;

use crate::domain::model::{ProjectSelector, Selector, WorkbookSelector};
use crate::utils::error::Result;
use crate::utils::validation::{
    normalize_server_address, validate_non_empty_string, validate_required_field, validate_url,
    Validate,
};
use clap::{Parser, ValueEnum};
use profile::Profile;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    #[default]
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Error => "error",
        }
    }
}

// Either workbookId or workbookName, either projectId or projectName.
// Both, either or neither of the two axes may be given.
#[derive(Debug, Clone, Parser)]
#[command(name = "workbook-degradations")]
#[command(about = "Get workbook degradations.")]
pub struct CliConfig {
    #[arg(long, short = 's', required_unless_present = "config", help = "server address")]
    pub server: Option<String>,

    #[arg(
        long,
        short = 'u',
        required_unless_present = "config",
        help = "username to sign into server"
    )]
    pub username: Option<String>,

    #[arg(
        long = "productVersion",
        short = 'v',
        required_unless_present = "config",
        help = "product version to which to test downgrade of workbook"
    )]
    pub product_version: Option<String>,

    #[arg(
        long = "workbookId",
        conflicts_with = "workbook_name",
        help = "Id of workbook upon which to test the degradation"
    )]
    pub workbook_id: Option<String>,

    #[arg(
        long = "workbookName",
        help = "Name of workbook upon which to test the degradation"
    )]
    pub workbook_name: Option<String>,

    #[arg(
        long = "projectId",
        conflicts_with = "project_name",
        help = "Id of project: degradations for all workbooks in project will be returned"
    )]
    pub project_id: Option<String>,

    #[arg(
        long = "projectName",
        help = "Name of project: degradations for all workbooks in project will be returned"
    )]
    pub project_name: Option<String>,

    #[arg(
        long = "logging-level",
        short = 'l',
        value_enum,
        help = "desired logging level (set to error by default)"
    )]
    pub logging_level: Option<LogLevel>,

    #[arg(long, help = "site content URL (default site when omitted)")]
    pub site: Option<String>,

    #[arg(
        long = "api-version",
        help = "REST API version to use instead of the highest the server supports"
    )]
    pub api_version: Option<String>,

    #[arg(long, short = 'c', help = "TOML profile with connection defaults")]
    pub config: Option<PathBuf>,
}

/// Fully resolved run parameters.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: String,
    pub username: String,
    pub product_version: String,
    pub site: String,
    pub api_version: Option<String>,
    pub logging_level: LogLevel,
    pub selector: Selector,
}

impl CliConfig {
    pub fn selector(&self) -> Selector {
        let workbook = match (&self.workbook_id, &self.workbook_name) {
            (Some(id), _) => Some(WorkbookSelector::Id(id.clone())),
            (None, Some(name)) => Some(WorkbookSelector::Name(name.clone())),
            (None, None) => None,
        };
        let project = match (&self.project_id, &self.project_name) {
            (Some(id), _) => Some(ProjectSelector::Id(id.clone())),
            (None, Some(name)) => Some(ProjectSelector::Name(name.clone())),
            (None, None) => None,
        };

        Selector { workbook, project }
    }

    /// Loads the profile named by `--config`, if any, and merges it.
    pub fn resolve(&self) -> Result<Settings> {
        let profile = match &self.config {
            Some(path) => Profile::from_file(path)?,
            None => Profile::default(),
        };
        self.merge(profile)
    }

    pub fn merge(&self, profile: Profile) -> Result<Settings> {
        let server = self.server.clone().or(profile.server);
        let username = self.username.clone().or(profile.username);
        let product_version = self.product_version.clone().or(profile.product_version);

        let settings = Settings {
            server: normalize_server_address(validate_required_field("server", &server)?),
            username: validate_required_field("username", &username)?.clone(),
            product_version: validate_required_field("productVersion", &product_version)?
                .clone(),
            site: self.site.clone().or(profile.site).unwrap_or_default(),
            api_version: self.api_version.clone().or(profile.api_version),
            logging_level: self
                .logging_level
                .or(profile.logging_level)
                .unwrap_or_default(),
            selector: self.selector(),
        };
        settings.validate()?;

        Ok(settings)
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_url("server", &self.server)?;
        validate_non_empty_string("username", &self.username)?;
        validate_non_empty_string("productVersion", &self.product_version)?;
        if let Some(api_version) = &self.api_version {
            validate_non_empty_string("api-version", api_version)?;
        }
        Ok(())
    }
}
