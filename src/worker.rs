use std::fs;
use log::{debug, error, info};
use serde_json::Value;
use crate::config::Config;
use crate::errors::{ForecastError, WorkerError};
use crate::forecast::forecast_case;
use crate::models::case::{Case, CaseFile};
use crate::models::forecast::PredictionOutput;
use crate::predictor::Predictor;

/// Reads all cases from the data file, forecasts them in order and writes the predictions
/// to the output file
///
/// # Arguments
///
/// * 'config' - configuration
/// * 'predictor' - the loaded model
pub fn run(config: &Config, predictor: &dyn Predictor) -> Result<(), WorkerError> {
    let cases = load_cases(&config.files.data_file)?;
    info!("read {} case(s) from {}", cases.len(), config.files.data_file);

    let output = forecast_cases(&cases, predictor, config.forecast.horizon, config.general.skip_failed_cases)?;

    save_predictions(&config.files.output_file, &output)?;
    info!("wrote {} forecast(s) to {}", output.predictions.len(), config.files.output_file);

    Ok(())
}

/// Forecasts every case in input order.
///
/// Each raw case is converted on its own. A case that cannot be converted or fails to
/// forecast aborts the run unless skipping is enabled, in which case it is logged and
/// left out of the output.
///
/// # Arguments
///
/// * 'cases' - the raw cases to forecast
/// * 'predictor' - the loaded model
/// * 'horizon' - number of hours to forecast per case
/// * 'skip_failed' - whether to continue past a failing case
pub fn forecast_cases(cases: &[Value], predictor: &dyn Predictor, horizon: usize, skip_failed: bool)
    -> Result<PredictionOutput, WorkerError> {

    let mut predictions = Vec::with_capacity(cases.len());

    for (i, value) in cases.iter().enumerate() {
        let outcome = convert_case(i, value).and_then(|case| {
            log_case(&case);
            forecast_case(&case, predictor, horizon)
        });

        match outcome {
            Ok(result) => predictions.push(result),
            Err(e) if skip_failed => error!("skipping case: {}", e),
            Err(e) => return Err(e.into()),
        }
    }

    Ok(PredictionOutput { predictions })
}

/// Converts one raw case, naming it by its case_id if it has a textual one and by its
/// position otherwise
///
/// # Arguments
///
/// * 'index' - position of the case in the input document
/// * 'value' - the raw case
fn convert_case(index: usize, value: &Value) -> Result<Case, ForecastError> {
    Case::from_value(value.clone()).map_err(|e| ForecastError::InvalidCase {
        case_id: value
            .get("case_id")
            .and_then(Value::as_str)
            .map_or_else(|| format!("#{}", index), str::to_string),
        reason: e.to_string(),
    })
}

/// Logs what a case brings before it is forecasted
fn log_case(case: &Case) {
    let (lat, long, start) = case.target
        .as_ref()
        .map_or((None, None, None), |t| (t.latitude, t.longitude, t.prediction_start_time.as_ref()));

    debug!("generating for case: {}, target: ({:?}, {:?}), start: {}",
        case.case_id, lat, long, start.and_then(Value::as_str).unwrap_or("-"));
    debug!("available stations: {}", case.stations.len());
    for station in &case.stations {
        debug!("station {} at ({:?}, {:?}): {} history points",
            station.station_code.as_deref().unwrap_or("?"), station.latitude, station.longitude, station.history.len());
    }
}

/// Loads cases from a JSON input document
///
/// # Arguments
///
/// * 'data_file' - path to the input document
fn load_cases(data_file: &str) -> Result<Vec<Value>, WorkerError> {
    let json = fs::read_to_string(data_file)
        .map_err(|e| WorkerError::Input(format!("{}: {}", data_file, e)))?;
    let case_file: CaseFile = serde_json::from_str(&json)
        .map_err(|e| WorkerError::Input(format!("{}: {}", data_file, e)))?;

    Ok(case_file.cases)
}

/// Saves predictions as a pretty printed JSON document
///
/// # Arguments
///
/// * 'output_file' - path to write to
/// * 'output' - the predictions
fn save_predictions(output_file: &str, output: &PredictionOutput) -> Result<(), WorkerError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| WorkerError::Output(e.to_string()))?;

    fs::write(output_file, json)
        .map_err(|e| WorkerError::Output(format!("{}: {}", output_file, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Files, ForecastParameters, General};
    use crate::errors::PredictorError;
    use crate::predictor::FeatureRow;
    use log::LevelFilter;
    use serde_json::json;

    struct FixedModel {
        names: Vec<String>,
    }

    impl Predictor for FixedModel {
        fn feature_names(&self) -> &[String] {
            &self.names
        }

        fn predict(&self, rows: &[FeatureRow]) -> Result<Vec<f64>, PredictorError> {
            Ok(vec![42.0; rows.len()])
        }
    }

    fn model() -> FixedModel {
        FixedModel { names: vec!["pm10_lag_1".to_string(), "pm10_lag_2".to_string()] }
    }

    fn case_json(case_id: &str, history_len: usize) -> serde_json::Value {
        let history = (0..history_len)
            .map(|h| json!({"timestamp": format!("2025-01-01T{:02}:00:00", h), "pm10": 40.0 + h as f64}))
            .collect::<Vec<serde_json::Value>>();

        json!({
            "case_id": case_id,
            "stations": [{"station_code": "S1", "longitude": 1.0, "latitude": 2.0, "history": history}],
            "target": {"longitude": 1.0, "latitude": 2.0, "prediction_start_time": "2025-01-01T05:00:00"}
        })
    }

    fn cases(value: serde_json::Value) -> Vec<serde_json::Value> {
        serde_json::from_value(value).unwrap()
    }

    fn test_config(dir: &std::path::Path, skip_failed_cases: bool) -> Config {
        Config {
            general: General {
                log_path: dir.to_string_lossy().to_string(),
                log_level: LevelFilter::Off,
                log_to_stdout: false,
                skip_failed_cases,
            },
            files: Files {
                data_file: dir.join("data.json").to_string_lossy().to_string(),
                output_file: dir.join("output.json").to_string_lossy().to_string(),
                model_file: String::new(),
            },
            forecast: ForecastParameters { horizon: 2 },
        }
    }

    fn bad_pm10_case(case_id: &str) -> serde_json::Value {
        let mut value = case_json(case_id, 2);
        value["stations"][0]["history"][1]["pm10"] = json!("n/a");
        value
    }

    #[test]
    fn forecasts_cases_in_input_order() {
        let cases = cases(json!([case_json("b", 2), case_json("a", 3)]));

        let output = forecast_cases(&cases, &model(), 6, false).unwrap();

        let ids = output.predictions.iter().map(|p| p.case_id.as_str()).collect::<Vec<&str>>();
        assert_eq!(ids, vec!["b", "a"]);
        assert!(output.predictions.iter().all(|p| p.forecast.len() == 6));
    }

    #[test]
    fn failing_case_aborts_by_default() {
        let cases = cases(json!([case_json("ok", 2), case_json("short", 1)]));

        let result = forecast_cases(&cases, &model(), 3, false);

        assert!(matches!(result, Err(WorkerError::Forecast(ForecastError::InsufficientHistory { .. }))));
    }

    #[test]
    fn failing_case_is_skipped_when_configured() {
        let cases = cases(json!([case_json("short", 1), case_json("ok", 2)]));

        let output = forecast_cases(&cases, &model(), 3, true).unwrap();

        assert_eq!(output.predictions.len(), 1);
        assert_eq!(output.predictions[0].case_id, "ok");
    }

    #[test]
    fn malformed_case_is_skipped_when_configured() {
        let cases = cases(json!([bad_pm10_case("bad"), case_json("good", 2)]));

        let output = forecast_cases(&cases, &model(), 3, true).unwrap();

        assert_eq!(output.predictions.len(), 1);
        assert_eq!(output.predictions[0].case_id, "good");
    }

    #[test]
    fn malformed_case_aborts_by_default() {
        let cases = cases(json!([case_json("good", 2), bad_pm10_case("bad")]));

        let result = forecast_cases(&cases, &model(), 3, false);

        assert!(matches!(result, Err(WorkerError::Forecast(ForecastError::MalformedHistory { case_id, .. })) if case_id == "bad"));
    }

    #[test]
    fn unconvertible_case_is_named_by_position() {
        let cases = cases(json!([case_json("good", 2), {"case_id": 12}]));

        let result = forecast_cases(&cases, &model(), 3, false);

        assert!(matches!(result, Err(WorkerError::Forecast(ForecastError::InvalidCase { case_id, .. })) if case_id == "#1"));
    }

    #[test]
    fn unconvertible_case_is_skipped_when_configured() {
        let cases = cases(json!([{"stations": []}, case_json("good", 2)]));

        let output = forecast_cases(&cases, &model(), 3, true).unwrap();

        assert_eq!(output.predictions.len(), 1);
        assert_eq!(output.predictions[0].case_id, "good");
    }

    #[test]
    fn run_reads_input_and_writes_output_document() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), false);
        fs::write(&config.files.data_file, json!({"cases": [case_json("c1", 2)]}).to_string()).unwrap();

        run(&config, &model()).unwrap();

        let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&config.files.output_file).unwrap()).unwrap();
        assert_eq!(written, json!({
            "predictions": [{
                "case_id": "c1",
                "forecast": [
                    {"timestamp": "2025-01-01T05:00Z", "pm10_pred": 42.0},
                    {"timestamp": "2025-01-01T06:00Z", "pm10_pred": 42.0}
                ]
            }]
        }));
    }

    #[test]
    fn run_keeps_good_cases_next_to_a_wrongly_typed_one() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), true);
        let mut timestamp_as_number = case_json("c2", 2);
        timestamp_as_number["stations"][0]["history"][0]["timestamp"] = json!(123);
        let document = json!({"cases": [case_json("c1", 2), bad_pm10_case("c3"), timestamp_as_number]});
        fs::write(&config.files.data_file, document.to_string()).unwrap();

        run(&config, &model()).unwrap();

        let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&config.files.output_file).unwrap()).unwrap();
        let predictions = written["predictions"].as_array().unwrap();
        assert_eq!(predictions.len(), 1);
        assert_eq!(predictions[0]["case_id"], "c1");
    }

    #[test]
    fn unreadable_input_is_an_input_error() {
        let cases = load_cases("/nonexistent/data.json");

        assert!(matches!(cases, Err(WorkerError::Input(_))));
    }
}
