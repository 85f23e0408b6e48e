use serde::Serialize;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ForecastRow {
    pub timestamp: String,
    pub pm10_pred: f64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ForecastResult {
    pub case_id: String,
    pub forecast: Vec<ForecastRow>,
}

#[derive(Serialize, Debug)]
pub struct PredictionOutput {
    pub predictions: Vec<ForecastResult>,
}
