//! Implementation of the `agrosense show` command.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde::Serialize;

use super::ConfigArgs;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Configuration;

#[derive(Args, Debug)]
pub struct ShowArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Only print this section
    #[arg(short, long, value_enum)]
    pub section: Option<Section>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum Section {
    System,
    Drone,
    MlModel,
    SoilSensors,
    ImageProcessing,
    Firebase,
    Alerts,
    MobileApp,
}

impl Section {
    pub const fn key(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Drone => "drone",
            Self::MlModel => "ml_model",
            Self::SoilSensors => "soil_sensors",
            Self::ImageProcessing => "image_processing",
            Self::Firebase => "firebase",
            Self::Alerts => "alerts",
            Self::MobileApp => "mobile_app",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ShowOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<&'static str>,
    pub value: serde_json::Value,
    #[serde(skip)]
    yaml: String,
}

impl CommandOutput for ShowOutput {
    fn to_human(&self) -> String {
        match self.section {
            Some(section) => format!("{section}:\n{}", indent(&self.yaml)),
            None => self.yaml.clone(),
        }
    }

    fn to_json(&self) -> serde_json::Value {
        self.value.clone()
    }
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("  {line}\n"))
        .collect()
}

/// Serialize `config`, keeping only `section` when given.
pub fn render(config: &Configuration, section: Option<Section>) -> Result<ShowOutput> {
    let mut value =
        serde_json::to_value(config).context("Failed to serialize configuration")?;
    if let Some(section) = section {
        value = value
            .get_mut(section.key())
            .map(serde_json::Value::take)
            .with_context(|| format!("section {} missing from output", section.key()))?;
    }
    let yaml = serde_yaml::to_string(&value).context("Failed to render configuration as YAML")?;
    Ok(ShowOutput {
        section: section.map(Section::key),
        value,
        yaml,
    })
}

pub async fn execute(args: ShowArgs, json_mode: bool) -> Result<()> {
    let config = args.config.load()?;
    output(&render(&config, args.section)?, json_mode);
    Ok(())
}
