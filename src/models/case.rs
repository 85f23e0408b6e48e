use std::collections::HashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Input document, cases are kept as raw JSON so that each one is converted on its own
#[derive(Deserialize)]
pub struct CaseFile {
    pub cases: Vec<Value>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct HistoryPoint {
    #[serde(default, deserialize_with = "lenient")]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub pm10: Option<f64>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Station {
    #[serde(default, deserialize_with = "lenient")]
    pub station_code: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub history: Vec<HistoryPoint>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Target {
    #[serde(default, deserialize_with = "lenient")]
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub latitude: Option<f64>,
    /// Kept raw so a value of the wrong type can be told apart from a missing one
    #[serde(default)]
    pub prediction_start_time: Option<Value>,
}

/// One raw weather report row, keyed by report codes such as WND or TMP plus DATE
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(transparent)]
pub struct WeatherRecord {
    pub fields: HashMap<String, Value>,
}

impl WeatherRecord {
    /// Returns the textual value of a field. The upper case key wins, otherwise the key
    /// is matched case-insensitively, taking the lowest such key if there are several.
    /// Numbers are given in their textual form, any other non-string value counts as absent.
    ///
    /// # Arguments
    ///
    /// * 'code' - the report code, e.g. "TMP"
    pub fn get(&self, code: &str) -> Option<String> {
        let value = self.fields
            .get(&code.to_ascii_uppercase())
            .or_else(|| {
                self.fields
                    .iter()
                    .filter(|(k, _)| k.eq_ignore_ascii_case(code))
                    .min_by(|(a, _), (b, _)| a.cmp(b))
                    .map(|(_, v)| v)
            })?;

        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// One forecast unit, only the first station is used
#[derive(Deserialize, Clone, Debug)]
pub struct Case {
    pub case_id: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub stations: Vec<Station>,
    #[serde(default, deserialize_with = "lenient")]
    pub target: Option<Target>,
    #[serde(default, deserialize_with = "lenient")]
    pub weather: Option<Vec<WeatherRecord>>,
}

impl Case {
    /// Converts one raw case of the input document.
    ///
    /// Fields of the wrong type read as absent and are reported when the case is
    /// validated, so only a case without a textual case_id fails here.
    ///
    /// # Arguments
    ///
    /// * 'value' - the raw case
    pub fn from_value(value: Value) -> Result<Case, serde_json::Error> {
        serde_json::from_value(value)
    }
}

/// Reads a value of type T, anything of another type (null included) reads as None
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;

    Ok(serde_json::from_value(value).ok())
}

/// Reads a list, anything that is not a well-formed list reads as empty
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(lenient(deserializer)?.unwrap_or_default())
}
