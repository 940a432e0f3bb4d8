//! Implementation of the `agrosense soil` command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use super::ConfigArgs;
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::{
    Configuration, SoilAnalysis, SoilParameter, SoilReading, SoilThresholds,
};

#[derive(Args, Debug)]
pub struct SoilArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Use built-in defaults instead of reading a configuration file
    #[arg(long)]
    pub defaults: bool,

    /// Readings as PARAMETER=VALUE, e.g. moisture=35 ph=6.8
    #[arg(required = true, value_parser = parse_reading)]
    pub readings: Vec<(SoilParameter, f64)>,
}

#[derive(Debug, Serialize)]
pub struct SoilOutput {
    pub healthy: bool,
    pub moisture_alert: bool,
    pub reading: SoilReading,
    pub analysis: SoilAnalysis,
    #[serde(skip)]
    thresholds: SoilThresholds,
}

impl CommandOutput for SoilOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![TableFormatter::new().format_soil_analysis(
            &self.thresholds,
            &self.reading,
            &self.analysis,
        )];
        if self.healthy {
            lines.push("All readings within the optimal band.".to_string());
        } else {
            lines.push("Recommendations:".to_string());
            for rec in &self.analysis.recommendations {
                lines.push(format!(
                    "  - {} ({}, {}): {}",
                    rec.parameter, rec.condition, rec.current_value, rec.action
                ));
            }
        }
        if self.moisture_alert {
            lines.push("ALERT: soil moisture is at or below the critical threshold".to_string());
        }
        lines.join("\n")
    }
}

/// Parse one `PARAMETER=VALUE` argument.
pub fn parse_reading(arg: &str) -> Result<(SoilParameter, f64), String> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected PARAMETER=VALUE, got '{arg}'"))?;
    let name = name.trim().to_ascii_lowercase();
    let parameter = SoilParameter::from_name(&name).ok_or_else(|| {
        let allowed: Vec<&str> = SoilParameter::ALL.iter().map(|p| p.as_str()).collect();
        format!("unknown soil parameter '{name}' (expected one of {})", allowed.join(", "))
    })?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", value.trim()))?;
    if !value.is_finite() {
        return Err(format!("'{value}' is not a finite number"));
    }
    Ok((parameter, value))
}

/// Classify `readings` against `config`.
pub fn assess(config: &Configuration, readings: &[(SoilParameter, f64)]) -> SoilOutput {
    let reading = readings
        .iter()
        .fold(SoilReading::new(), |reading, &(parameter, value)| {
            reading.with(parameter, value)
        });
    let analysis = config.soil_sensors().analyze(&reading);
    let moisture_alert = reading
        .values
        .get(&SoilParameter::Moisture)
        .is_some_and(|&moisture| config.alerts().moisture_alert(moisture));

    SoilOutput {
        healthy: analysis.is_healthy(),
        moisture_alert,
        reading,
        analysis,
        thresholds: config.soil_sensors().thresholds.clone(),
    }
}

pub async fn execute(args: SoilArgs, json_mode: bool) -> Result<()> {
    let config = if args.defaults {
        Configuration::default()
    } else {
        args.config
            .load()
            .with_context(|| format!("Failed to load {}", args.config.config.display()))?
    };
    output(&assess(&config, &args.readings), json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::SoilCondition;

    #[test]
    fn test_parse_reading() {
        assert_eq!(parse_reading("moisture=35").unwrap(), (SoilParameter::Moisture, 35.0));
        assert_eq!(parse_reading("PH = 6.8").unwrap(), (SoilParameter::Ph, 6.8));
        assert!(parse_reading("moisture").is_err());
        assert!(parse_reading("salinity=3").is_err());
        assert!(parse_reading("ph=acidic").is_err());
        assert!(parse_reading("ph=NaN").is_err());
    }

    #[test]
    fn test_assess_flags_critical_moisture() {
        let config = Configuration::default();
        let out = assess(
            &config,
            &[(SoilParameter::Moisture, 10.0), (SoilParameter::Ph, 6.5)],
        );
        assert!(!out.healthy);
        assert!(out.moisture_alert);
        assert_eq!(out.analysis.conditions[&SoilParameter::Moisture], SoilCondition::Low);
        assert_eq!(out.analysis.conditions[&SoilParameter::Ph], SoilCondition::Optimal);
        assert_eq!(out.analysis.recommendations.len(), 1);
    }

    #[test]
    fn test_assess_healthy_reading() {
        let config = Configuration::default();
        let out = assess(&config, &[(SoilParameter::Temperature, 25.0)]);
        assert!(out.healthy);
        assert!(!out.moisture_alert);
        assert!(out.to_json().get("thresholds").is_none());
    }
}
