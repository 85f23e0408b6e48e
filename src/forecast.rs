use std::collections::HashMap;
use chrono::{NaiveDateTime, TimeDelta};
use log::{debug, warn};
use crate::calendar::{format_forecast_timestamp, parse_instant, CalendarFeatures};
use crate::errors::{ForecastError, PredictorError};
use crate::models::case::Case;
use crate::models::forecast::{ForecastResult, ForecastRow};
use crate::models::weather::DecodedWeatherRecord;
use crate::predictor::{Feature, FeatureRow, Predictor};
use crate::weather_decoding::decode;
use crate::weather_matching::match_weather;

/// Validated inputs of a case
struct CaseInputs<'a> {
    station_code: &'a str,
    lag_1: f64,
    lag_2: f64,
    start_time: NaiveDateTime,
}

/// Forecasts PM10 for a case hour by hour over the given horizon.
///
/// The loop is autoregressive: the first hour uses the two latest observed PM10 values
/// (in the order the history is given) as lag features, every following hour uses the
/// predictions of the preceding hours. Weather, if the case carries any, is decoded once
/// and matched against each forecast hour. A weather decoding failure is logged and the
/// case is forecasted without weather features.
///
/// Only the first station of the case is used.
///
/// # Arguments
///
/// * 'case' - the case to forecast
/// * 'predictor' - the model to evaluate
/// * 'horizon' - number of hours to forecast
pub fn forecast_case(case: &Case, predictor: &dyn Predictor, horizon: usize) -> Result<ForecastResult, ForecastError> {
    let inputs = validate(case)?;
    let weather = decode_case_weather(case);

    let mut lag_1 = inputs.lag_1;
    let mut lag_2 = inputs.lag_2;
    let mut forecast: Vec<ForecastRow> = Vec::with_capacity(horizon);

    for i in 0..horizon {
        let ts = inputs.start_time + TimeDelta::hours(i as i64);

        let mut features = calendar_features(ts);
        features.insert("station_code", Some(Feature::Text(inputs.station_code.to_string())));
        features.insert("pm10_lag_1", Some(Feature::Number(lag_1)));
        features.insert("pm10_lag_2", Some(Feature::Number(lag_2)));
        if let Some(observation) = match_weather(&weather, ts) {
            for (name, value) in observation.features() {
                features.insert(name, value.map(Feature::Number));
            }
        }

        let row = FeatureRow::project(&features, predictor.feature_names());
        let pred = predictor
            .predict(&[row])?
            .first()
            .copied()
            .ok_or_else(|| PredictorError(format!("no prediction returned for case '{}'", case.case_id)))?;

        forecast.push(ForecastRow { timestamp: format_forecast_timestamp(ts), pm10_pred: pred });

        lag_2 = lag_1;
        lag_1 = pred;
    }

    debug!("case '{}' forecasted {} hours from {}", case.case_id, horizon, inputs.start_time);

    Ok(ForecastResult { case_id: case.case_id.clone(), forecast })
}

/// Validates a case and extracts what the forecast loop needs
///
/// # Arguments
///
/// * 'case' - the case to validate
fn validate(case: &Case) -> Result<CaseInputs<'_>, ForecastError> {
    let missing = |field: &'static str| ForecastError::MissingField { case_id: case.case_id.clone(), field };
    let malformed = |reason: String| ForecastError::MalformedHistory { case_id: case.case_id.clone(), reason };

    let station = case.stations.first().ok_or_else(|| missing("stations"))?;
    let station_code = station.station_code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| missing("station_code"))?;

    let history = &station.history;
    if history.is_empty() {
        return Err(malformed("history is empty".to_string()));
    }
    for (i, point) in history.iter().enumerate() {
        let timestamp = point.timestamp
            .as_deref()
            .ok_or_else(|| malformed(format!("point {} has no textual timestamp", i)))?;
        if parse_instant(timestamp).is_none() {
            return Err(malformed(format!("point {} has an invalid timestamp '{}'", i, timestamp)));
        }
        if point.pm10.is_none() {
            return Err(malformed(format!("point {} has no numeric pm10 value", i)));
        }
    }

    let [.., second_last, last] = history.as_slice() else {
        return Err(ForecastError::InsufficientHistory { case_id: case.case_id.clone(), found: history.len() });
    };

    let target = case.target.as_ref().ok_or_else(|| missing("target"))?;
    let start_value = target.prediction_start_time
        .as_ref()
        .ok_or_else(|| missing("prediction_start_time"))?;
    let start_time = start_value
        .as_str()
        .and_then(parse_instant)
        .ok_or_else(|| ForecastError::InvalidFormat {
            case_id: case.case_id.clone(),
            field: "prediction_start_time",
            value: start_value.as_str().map_or_else(|| start_value.to_string(), str::to_string),
        })?;

    Ok(CaseInputs {
        station_code,
        lag_1: last.pm10.unwrap_or_default(),
        lag_2: second_last.pm10.unwrap_or_default(),
        start_time,
    })
}

/// Decodes the weather of a case, falling back to no weather on failure
///
/// # Arguments
///
/// * 'case' - the case holding raw weather reports
fn decode_case_weather(case: &Case) -> Vec<DecodedWeatherRecord> {
    let Some(raw) = case.weather.as_deref() else {
        return Vec::new();
    };

    decode(raw).unwrap_or_else(|e| {
        warn!("case '{}' is forecasted without weather: {}", case.case_id, e);
        Vec::new()
    })
}

/// Calendar and cyclic features of a forecast hour
fn calendar_features(ts: NaiveDateTime) -> HashMap<&'static str, Option<Feature>> {
    let c = CalendarFeatures::from_instant(ts);

    [
        ("year", c.year as f64),
        ("month", c.month as f64),
        ("day", c.day as f64),
        ("hour", c.hour as f64),
        ("weekday", c.weekday as f64),
        ("day_of_year", c.day_of_year as f64),
        ("hour_sin", c.hour_sin),
        ("hour_cos", c.hour_cos),
        ("doy_sin", c.doy_sin),
        ("doy_cos", c.doy_cos),
        ("weekday_sin", c.weekday_sin),
        ("weekday_cos", c.weekday_cos),
    ]
    .into_iter()
    .map(|(name, value)| (name, Some(Feature::Number(value))))
    .collect()
}
