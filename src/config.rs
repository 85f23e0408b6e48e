use std::fs;
use log::LevelFilter;
use serde::Deserialize;
use crate::errors::ConfigError;

/// Number of hourly steps forecasted when not configured
const DEFAULT_HORIZON: usize = 24;

#[derive(Deserialize)]
pub struct Files {
    pub data_file: String,
    pub output_file: String,
    pub model_file: String,
}

#[derive(Deserialize)]
pub struct General {
    pub log_path: String,
    pub log_level: LevelFilter,
    pub log_to_stdout: bool,
    #[serde(default)]
    pub skip_failed_cases: bool,
}

#[derive(Deserialize)]
pub struct ForecastParameters {
    #[serde(default = "default_horizon")]
    pub horizon: usize,
}

impl Default for ForecastParameters {
    fn default() -> Self {
        ForecastParameters { horizon: DEFAULT_HORIZON }
    }
}

#[derive(Deserialize)]
pub struct Config {
    pub general: General,
    pub files: Files,
    #[serde(default)]
    pub forecast: ForecastParameters,
}

fn default_horizon() -> usize {
    DEFAULT_HORIZON
}

/// Loads the configuration file and returns a struct with all configuration items
///
/// # Arguments
///
/// * 'config_path' - path to the configuration file
pub fn load_config(config_path: &str) -> Result<Config, ConfigError> {
    let toml = fs::read_to_string(config_path)?;
    let config: Config = toml::from_str(&toml)?;

    if config.forecast.horizon == 0 {
        return Err(ConfigError::from("forecast horizon must be at least one hour"));
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    const BASE: &str = r#"
[general]
log_path = "/tmp/"
log_level = "debug"
log_to_stdout = true

[files]
data_file = "data.json"
output_file = "output.json"
model_file = "model.json"
"#;

    #[test]
    fn loads_with_default_horizon() {
        let file = write_config(BASE);
        let config = load_config(file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.forecast.horizon, 24);
        assert_eq!(config.general.log_level, LevelFilter::Debug);
        assert!(!config.general.skip_failed_cases);
        assert_eq!(config.files.model_file, "model.json");
    }

    #[test]
    fn reads_explicit_horizon() {
        let file = write_config(&format!("{}\n[forecast]\nhorizon = 48\n", BASE));
        let config = load_config(file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.forecast.horizon, 48);
    }

    #[test]
    fn rejects_zero_horizon() {
        let file = write_config(&format!("{}\n[forecast]\nhorizon = 0\n", BASE));

        assert!(load_config(file.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_config("/nonexistent/pm10cast.toml").is_err());
    }
}
