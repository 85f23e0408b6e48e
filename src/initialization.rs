use std::env;
use std::path::Path;
use anyhow::{Context, Result};
use log::info;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Root};
use log4rs::encode::pattern::PatternEncoder;
use crate::config::{load_config, Config, General};
use crate::predictor::LinearModel;

/// Log line layout shared by all appenders
const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {l:<5} {t} - {m}{n}";

/// Name of the log file written under the configured log path
const LOG_FILE: &str = "pm10cast.log";

/// Loads configuration, starts logging and loads the model
///
pub fn init() -> Result<(Config, LinearModel)> {
    let config_path = env::var("CONFIG_PATH").unwrap_or("config.toml".to_string());

    let config = load_config(&config_path)
        .with_context(|| format!("loading configuration from {}", config_path))?;

    setup_logger(&config.general)?;

    info!("pm10cast version: {}", env!("CARGO_PKG_VERSION"));
    info!("configuration loaded from {}", config_path);

    let model = LinearModel::load(&config.files.model_file)
        .with_context(|| format!("loading model from {}", config.files.model_file))?;

    Ok((config, model))
}

/// Sets up log4rs with a file appender and, if configured, a console appender
///
/// # Arguments
///
/// * 'general' - general configuration holding log path, level and stdout flag
fn setup_logger(general: &General) -> Result<()> {
    let log_file = Path::new(&general.log_path).join(LOG_FILE);

    let file = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build(&log_file)
        .with_context(|| format!("creating log file {}", log_file.display()))?;

    let mut builder = log4rs::Config::builder()
        .appender(Appender::builder().build("file", Box::new(file)));
    let mut root = Root::builder().appender("file");

    if general.log_to_stdout {
        let stdout = ConsoleAppender::builder()
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build();
        builder = builder.appender(Appender::builder().build("stdout", Box::new(stdout)));
        root = root.appender("stdout");
    }

    let log_config = builder
        .build(root.build(general.log_level))
        .context("building log configuration")?;
    log4rs::init_config(log_config).context("initializing logger")?;

    Ok(())
}
