use std::collections::HashMap;
use std::fs;
use log::info;
use crate::errors::PredictorError;
use crate::models::linear_model::LinearModelDocument;

/// A single feature value
#[derive(Debug, Clone, PartialEq)]
pub enum Feature {
    Number(f64),
    Text(String),
}

/// One row of named features in the order a predictor declares them.
/// A declared feature that was not available is kept as None.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    values: Vec<(String, Option<Feature>)>,
}

impl FeatureRow {
    /// Projects assembled features onto the given ordered names, dropping anything
    /// not declared
    ///
    /// # Arguments
    ///
    /// * 'features' - all assembled features by name
    /// * 'names' - the ordered feature names to keep
    pub fn project(features: &HashMap<&str, Option<Feature>>, names: &[String]) -> FeatureRow {
        let values = names
            .iter()
            .map(|n| (n.clone(), features.get(n.as_str()).cloned().flatten()))
            .collect();

        FeatureRow { values }
    }

    /// Returns the value of a feature, None if it is unset or not part of the row
    pub fn get(&self, name: &str) -> Option<&Feature> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Feature>)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v.as_ref()))
    }
}

/// A pretrained PM10 model
pub trait Predictor {
    /// Ordered names of the features the model expects
    fn feature_names(&self) -> &[String];

    /// Returns one prediction per feature row
    fn predict(&self, rows: &[FeatureRow]) -> Result<Vec<f64>, PredictorError>;
}

/// Linear model over numeric features with a per station offset
pub struct LinearModel {
    feature_names: Vec<String>,
    intercept: f64,
    coefficients: HashMap<String, f64>,
    station_offsets: HashMap<String, f64>,
}

impl LinearModel {
    /// Loads a linear model from a JSON model file
    ///
    /// # Arguments
    ///
    /// * 'model_path' - path to the model file
    pub fn load(model_path: &str) -> Result<LinearModel, PredictorError> {
        let json = fs::read_to_string(model_path)?;
        let document: LinearModelDocument = serde_json::from_str(&json)?;
        let model = LinearModel::from_document(document)?;

        info!("loaded linear model with {} features from {}", model.feature_names.len(), model_path);

        Ok(model)
    }

    /// Builds a model from its document, every coefficient must name a declared feature
    ///
    /// # Arguments
    ///
    /// * 'document' - the model document
    pub fn from_document(document: LinearModelDocument) -> Result<LinearModel, PredictorError> {
        if let Some(unknown) = document.coefficients
            .keys()
            .find(|k| !document.feature_names.contains(k)) {
            return Err(PredictorError(format!("coefficient for undeclared feature '{}'", unknown)));
        }

        Ok(LinearModel {
            feature_names: document.feature_names,
            intercept: document.intercept,
            coefficients: document.coefficients,
            station_offsets: document.station_offsets,
        })
    }

    fn predict_row(&self, row: &FeatureRow) -> f64 {
        let mut value = self.intercept;

        for (name, feature) in row.iter() {
            if let Some(Feature::Number(v)) = feature {
                value += self.coefficients.get(name).map_or(0.0, |w| w * v);
            }
        }
        if let Some(Feature::Text(code)) = row.get("station_code") {
            value += self.station_offsets.get(code).copied().unwrap_or(0.0);
        }

        value
    }
}

impl Predictor for LinearModel {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict(&self, rows: &[FeatureRow]) -> Result<Vec<f64>, PredictorError> {
        Ok(rows.iter().map(|r| self.predict_row(r)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use serde_json::json;

    fn document(value: serde_json::Value) -> LinearModelDocument {
        serde_json::from_value(value).unwrap()
    }

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn projection_keeps_declared_order_and_drops_extras() {
        let mut features: HashMap<&str, Option<Feature>> = HashMap::new();
        features.insert("hour", Some(Feature::Number(3.0)));
        features.insert("extra", Some(Feature::Number(1.0)));
        features.insert("temperature_C", None);

        let row = FeatureRow::project(&features, &names(&["temperature_C", "hour", "pm10_lag_1"]));

        assert_eq!(row.iter().map(|(n, _)| n).collect::<Vec<&str>>(), vec!["temperature_C", "hour", "pm10_lag_1"]);
        assert_eq!(row.get("hour"), Some(&Feature::Number(3.0)));
        assert_eq!(row.get("temperature_C"), None);
        assert_eq!(row.get("pm10_lag_1"), None);
        assert_eq!(row.get("extra"), None);
    }

    #[test]
    fn linear_prediction_sums_weights_and_station_offset() {
        let model = LinearModel::from_document(document(json!({
            "feature_names": ["pm10_lag_1", "hour", "station_code", "temperature_C"],
            "intercept": 2.0,
            "coefficients": {"pm10_lag_1": 0.5, "hour": 1.0, "temperature_C": 10.0},
            "station_offsets": {"S1": 3.0}
        }))).unwrap();

        let mut features: HashMap<&str, Option<Feature>> = HashMap::new();
        features.insert("pm10_lag_1", Some(Feature::Number(40.0)));
        features.insert("hour", Some(Feature::Number(4.0)));
        features.insert("station_code", Some(Feature::Text("S1".to_string())));
        let row = FeatureRow::project(&features, model.feature_names());

        let prediction = model.predict(&[row]).unwrap();

        assert_eq!(prediction, vec![2.0 + 20.0 + 4.0 + 3.0]);
    }

    #[test]
    fn unknown_station_adds_nothing() {
        let model = LinearModel::from_document(document(json!({
            "feature_names": ["station_code"],
            "intercept": 7.0,
            "station_offsets": {"S1": 3.0}
        }))).unwrap();

        let mut features: HashMap<&str, Option<Feature>> = HashMap::new();
        features.insert("station_code", Some(Feature::Text("S2".to_string())));
        let row = FeatureRow::project(&features, model.feature_names());

        assert_eq!(model.predict(&[row]).unwrap(), vec![7.0]);
    }

    #[test]
    fn rejects_undeclared_coefficient() {
        let result = LinearModel::from_document(document(json!({
            "feature_names": ["hour"],
            "intercept": 0.0,
            "coefficients": {"minute": 1.0}
        })));

        assert!(result.is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"feature_names": ["hour"], "intercept": 1.5, "coefficients": {"hour": 2.0}}"#).unwrap();

        let model = LinearModel::load(file.path().to_str().unwrap()).unwrap();

        assert_eq!(model.feature_names(), &["hour".to_string()]);
    }

    #[test]
    fn load_reports_bad_documents() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{not json").unwrap();

        assert!(LinearModel::load(file.path().to_str().unwrap()).is_err());
        assert!(LinearModel::load("/nonexistent/model.json").is_err());
    }
}
