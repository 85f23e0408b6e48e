use chrono::NaiveDateTime;

/// Physical weather columns of one decoded report.
///
/// Continuous columns are None where the source code was missing or failed its quality
/// check and nothing could be interpolated. Ceiling coverage and cloud type are always set,
/// coverage is a 0/1 flag that becomes a fraction once matched records are averaged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherObservation {
    pub wind_speed_raw: Option<f64>,
    pub wind_dir_sin: Option<f64>,
    pub wind_dir_cos: Option<f64>,
    pub ceiling_height_ft: Option<f64>,
    pub ceiling_coverage: f64,
    pub visibility_m: Option<f64>,
    pub temperature_c: Option<f64>,
    pub slp_hpa: Option<f64>,
    pub dew_c: Option<f64>,
    pub ma1_main: Option<f64>,
    pub ma1_sec: Option<f64>,
    pub ga1_amt: Option<f64>,
    pub ga1_height: Option<f64>,
    pub ga1_type: i64,
    pub md1_m1: Option<f64>,
    pub md1_m2: Option<f64>,
}

/// Number of continuous columns in a WeatherObservation
pub const CONTINUOUS_COLUMNS: usize = 14;

impl WeatherObservation {
    /// Continuous columns with their feature names, in schema order
    pub fn continuous(&self) -> [(&'static str, Option<f64>); CONTINUOUS_COLUMNS] {
        [
            ("wind_speed_raw", self.wind_speed_raw),
            ("wind_dir_sin", self.wind_dir_sin),
            ("wind_dir_cos", self.wind_dir_cos),
            ("ceiling_height_ft", self.ceiling_height_ft),
            ("visibility_m", self.visibility_m),
            ("temperature_C", self.temperature_c),
            ("SLP_hpa", self.slp_hpa),
            ("DEW_C", self.dew_c),
            ("MA1_main", self.ma1_main),
            ("MA1_sec", self.ma1_sec),
            ("GA1_amt", self.ga1_amt),
            ("GA1_height", self.ga1_height),
            ("MD1_m1", self.md1_m1),
            ("MD1_m2", self.md1_m2),
        ]
    }

    /// Builds an observation from continuous columns given in the order of `continuous`
    /// and the two always-set columns
    ///
    /// # Arguments
    ///
    /// * 'values' - continuous column values in schema order
    /// * 'ceiling_coverage' - ceiling coverage flag, or its mean
    /// * 'ga1_type' - cloud type category
    pub fn from_columns(values: [Option<f64>; CONTINUOUS_COLUMNS], ceiling_coverage: f64, ga1_type: i64) -> WeatherObservation {
        let [
            wind_speed_raw, wind_dir_sin, wind_dir_cos, ceiling_height_ft, visibility_m,
            temperature_c, slp_hpa, dew_c, ma1_main, ma1_sec, ga1_amt, ga1_height, md1_m1, md1_m2,
        ] = values;

        WeatherObservation {
            wind_speed_raw,
            wind_dir_sin,
            wind_dir_cos,
            ceiling_height_ft,
            ceiling_coverage,
            visibility_m,
            temperature_c,
            slp_hpa,
            dew_c,
            ma1_main,
            ma1_sec,
            ga1_amt,
            ga1_height,
            ga1_type,
            md1_m1,
            md1_m2,
        }
    }

    /// All columns as named numeric features, coverage and cloud type included
    pub fn features(&self) -> Vec<(&'static str, Option<f64>)> {
        let mut features = self.continuous().to_vec();
        features.push(("ceiling_coverage", Some(self.ceiling_coverage)));
        features.push(("GA1_type", Some(self.ga1_type as f64)));

        features
    }
}

/// One decoded weather report
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedWeatherRecord {
    pub date: NaiveDateTime,
    pub observation: WeatherObservation,
}
