use std::collections::HashMap;
use serde::Deserialize;

/// Model document for a linear PM10 model
#[derive(Deserialize)]
pub struct LinearModelDocument {
    pub feature_names: Vec<String>,
    pub intercept: f64,
    #[serde(default)]
    pub coefficients: HashMap<String, f64>,
    #[serde(default)]
    pub station_offsets: HashMap<String, f64>,
}
