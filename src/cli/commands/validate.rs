//! Implementation of the `agrosense validate` command.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use super::ConfigArgs;
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::errors::ValidationIssue;
use crate::infrastructure::config::ConfigError;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Debug, Serialize)]
pub struct ValidateOutput {
    pub valid: bool,
    pub path: PathBuf,
    pub issues: Vec<ValidationIssue>,
    pub warnings: Vec<String>,
}

impl CommandOutput for ValidateOutput {
    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        if self.valid {
            lines.push(format!("{} is valid", self.path.display()));
        } else {
            lines.push(format!(
                "{} has {} issue(s):",
                self.path.display(),
                self.issues.len()
            ));
            lines.push(TableFormatter::new().format_issues(&self.issues));
        }
        for warning in &self.warnings {
            lines.push(format!("warning: {warning}"));
        }
        lines.join("\n")
    }
}

pub async fn execute(args: ValidateArgs, json_mode: bool) -> Result<()> {
    let path = args.config.config.clone();
    let report = match args.config.load() {
        Ok(config) => ValidateOutput {
            valid: true,
            path,
            issues: vec![],
            warnings: config
                .consistency_warnings()
                .iter()
                .map(ToString::to_string)
                .collect(),
        },
        Err(ConfigError::Invalid { errors, .. }) => ValidateOutput {
            valid: false,
            path,
            issues: errors.into_inner(),
            warnings: vec![],
        },
        Err(other) => return Err(other.into()),
    };

    output(&report, json_mode);
    if report.valid {
        Ok(())
    } else {
        anyhow::bail!("configuration is invalid ({} issue(s))", report.issues.len())
    }
}
