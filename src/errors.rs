use thiserror::Error;

/// Errors that abort the forecast of a single case
#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("case '{case_id}' could not be read: {reason}")]
    InvalidCase { case_id: String, reason: String },

    #[error("case '{case_id}' is missing required field '{field}'")]
    MissingField { case_id: String, field: &'static str },

    #[error("case '{case_id}' has an invalid {field}: '{value}'")]
    InvalidFormat { case_id: String, field: &'static str, value: String },

    #[error("case '{case_id}' has malformed history: {reason}")]
    MalformedHistory { case_id: String, reason: String },

    #[error("case '{case_id}' has {found} history point(s), at least 2 are needed for lag features")]
    InsufficientHistory { case_id: String, found: usize },

    #[error(transparent)]
    Predictor(#[from] PredictorError),
}

/// Weather decoding error, never fatal for a case
#[derive(Error, Debug)]
#[error("weather decoding error: {0}")]
pub struct WeatherError(pub String);

#[derive(Error, Debug)]
#[error("predictor error: {0}")]
pub struct PredictorError(pub String);
impl From<serde_json::Error> for PredictorError {
    fn from(e: serde_json::Error) -> PredictorError {
        PredictorError(format!("model document error: {}", e))
    }
}
impl From<std::io::Error> for PredictorError {
    fn from(e: std::io::Error) -> PredictorError {
        PredictorError(format!("model file error: {}", e))
    }
}

#[derive(Error, Debug)]
#[error("config error: {0}")]
pub struct ConfigError(pub String);
impl From<&str> for ConfigError {
    fn from(e: &str) -> Self { ConfigError(e.to_string()) }
}
impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self { ConfigError(e.to_string()) }
}
impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self { ConfigError(e.to_string()) }
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("input document error: {0}")]
    Input(String),

    #[error("output document error: {0}")]
    Output(String),

    #[error(transparent)]
    Forecast(#[from] ForecastError),
}
