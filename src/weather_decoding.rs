use log::debug;
use crate::calendar::parse_instant;
use crate::errors::WeatherError;
use crate::models::case::WeatherRecord;
use crate::models::weather::{DecodedWeatherRecord, WeatherObservation, CONTINUOUS_COLUMNS};

/// Quality code for a measurement that passed quality control
const QUALITY_PASSED: &str = "1";

/// One report row after per-group extraction but before fill and interpolation
struct ExtractedRow {
    observation: WeatherObservation,
    ceiling_coverage: Option<f64>,
    ga1_type: Option<f64>,
}

/// Decodes raw weather reports into fixed-schema records.
///
/// Only the code groups present in a report are decoded, every other column is null.
/// After extraction ceiling coverage and cloud type are forward filled in record order with 0 for anything still missing, and all continuous
/// columns are linearly interpolated over record positions with the boundary values
/// repeated at both ends.
///
/// Fails only if a report lacks a parseable DATE.
///
/// # Arguments
///
/// * 'records' - raw reports in their natural time order
pub fn decode(records: &[WeatherRecord]) -> Result<Vec<DecodedWeatherRecord>, WeatherError> {
    let mut dates = Vec::with_capacity(records.len());
    let mut rows = Vec::with_capacity(records.len());

    for (i, record) in records.iter().enumerate() {
        let date = record.get("DATE")
            .ok_or_else(|| WeatherError(format!("report {} has no DATE", i)))?;
        let date = parse_instant(&date)
            .ok_or_else(|| WeatherError(format!("report {} has an invalid DATE '{}'", i, date)))?;

        dates.push(date);
        rows.push(extract_row(record));
    }

    let ceiling_coverage = fill_forward(rows.iter().map(|r| r.ceiling_coverage).collect());
    let ga1_type = fill_forward(rows.iter().map(|r| r.ga1_type).collect());

    let mut columns: Vec<Vec<Option<f64>>> = vec![Vec::with_capacity(rows.len()); CONTINUOUS_COLUMNS];
    for row in &rows {
        for (c, (_, value)) in row.observation.continuous().into_iter().enumerate() {
            columns[c].push(value);
        }
    }
    for column in columns.iter_mut() {
        interpolate(column);
    }

    let decoded = dates
        .into_iter()
        .enumerate()
        .map(|(i, date)| {
            let mut values = [None; CONTINUOUS_COLUMNS];
            for (c, column) in columns.iter().enumerate() {
                values[c] = column[i];
            }
            DecodedWeatherRecord {
                date,
                observation: WeatherObservation::from_columns(values, ceiling_coverage[i], ga1_type[i] as i64),
            }
        })
        .collect::<Vec<DecodedWeatherRecord>>();

    debug!("decoded {} weather reports", decoded.len());

    Ok(decoded)
}

/// Extracts every code group present in a report
///
/// # Arguments
///
/// * 'record' - the raw report
fn extract_row(record: &WeatherRecord) -> ExtractedRow {
    let mut row = ExtractedRow {
        observation: WeatherObservation::default(),
        ceiling_coverage: None,
        ga1_type: None,
    };
    let obs = &mut row.observation;

    if let Some(code) = record.get("WND") {
        let (speed, sin, cos) = decode_wind(&code);
        obs.wind_speed_raw = speed;
        obs.wind_dir_sin = sin;
        obs.wind_dir_cos = cos;
    }
    if let Some(code) = record.get("TMP") {
        obs.temperature_c = decode_tenths(&code);
    }
    if let Some(code) = record.get("CIG") {
        let (height, coverage) = decode_ceiling(&code);
        obs.ceiling_height_ft = height;
        row.ceiling_coverage = coverage;
    }
    if let Some(code) = record.get("VIS") {
        obs.visibility_m = decode_visibility(&code);
    }
    if let Some(code) = record.get("SLP") {
        obs.slp_hpa = decode_tenths(&code);
    }
    if let Some(code) = record.get("DEW") {
        obs.dew_c = decode_tenths(&code);
    }
    if let Some(code) = record.get("MA1") {
        let p = split_code(&code, 4);
        obs.ma1_main = checked(&p[0], &p[1], 99999.0);
        obs.ma1_sec = checked(&p[2], &p[3], 99999.0);
    }
    if let Some(code) = record.get("GA1") {
        let p = split_code(&code, 6);
        obs.ga1_amt = checked(&p[0], &p[1], 99.0);
        obs.ga1_height = checked(&p[2], &p[3], 99999.0);
        row.ga1_type = checked(&p[4], &p[5], 99.0);
    }
    if let Some(code) = record.get("MD1") {
        let p = split_code(&code, 6);
        obs.md1_m1 = checked(&p[0], &p[1], 999.0);
        obs.md1_m2 = checked(&p[2], &p[3], 999.0);
    }

    row
}

/// Splits a comma-delimited code into exactly n parts, padding with None
///
/// # Arguments
///
/// * 'code' - the encoded field
/// * 'n' - the arity of the code
fn split_code(code: &str, n: usize) -> Vec<Option<String>> {
    let mut parts = code
        .split(',')
        .take(n)
        .map(|p| Some(p.to_string()))
        .collect::<Vec<Option<String>>>();
    parts.resize(n, None);

    parts
}

fn numeric(part: &Option<String>) -> Option<f64> {
    part.as_deref()
        .and_then(|p| p.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn passed(quality: &Option<String>) -> bool {
    quality.as_deref() == Some(QUALITY_PASSED)
}

/// Value paired with a textual quality flag, nulled on its sentinel or a failed flag
fn checked(value: &Option<String>, quality: &Option<String>, sentinel: f64) -> Option<f64> {
    numeric(value).filter(|v| *v != sentinel && passed(quality))
}

/// Wind: direction, direction quality, type, speed, speed quality.
/// Returns speed and the direction as sine/cosine.
fn decode_wind(code: &str) -> (Option<f64>, Option<f64>, Option<f64>) {
    let p = split_code(code, 5);
    let wind_type = p[2].as_deref();

    let mut direction = numeric(&p[0]).filter(|d| *d != 999.0);
    let mut speed = numeric(&p[3]).filter(|s| *s != 9999.0);

    if wind_type == Some("C") {
        speed = Some(0.0);
    }
    if matches!(wind_type, Some("C") | Some("V")) || !passed(&p[1]) {
        direction = None;
    }
    if !passed(&p[4]) {
        speed = None;
    }

    let radians = direction.map(f64::to_radians);
    (speed, radians.map(f64::sin), radians.map(f64::cos))
}

/// Signed tenths value with a numeric quality code, used by TMP, SLP and DEW
fn decode_tenths(code: &str) -> Option<f64> {
    let p = split_code(code, 2);
    let quality = numeric(&p[1]);

    numeric(&p[0])
        .map(|v| v / 10.0)
        .filter(|_| quality == Some(1.0))
}

/// Ceiling: height, determination method, quality, coverage flag.
/// Returns height and coverage.
fn decode_ceiling(code: &str) -> (Option<f64>, Option<f64>) {
    let p = split_code(code, 4);
    let method = p[1].as_deref().filter(|m| *m != "9");
    let quality = p[2].as_deref().filter(|q| *q != "9");

    let height = numeric(&p[0])
        .filter(|h| *h != 99999.0)
        .filter(|_| method.is_some() && quality.is_some());

    let coverage = match p[3].as_deref() {
        Some("N") => Some(0.0),
        Some("Y") => Some(1.0),
        _ => None,
    };

    (height, coverage)
}

/// Visibility: distance, variability flag, quality, extra
fn decode_visibility(code: &str) -> Option<f64> {
    let p = split_code(code, 4);

    numeric(&p[0]).filter(|d| *d != 9999.0 && *d != 99999.0 && passed(&p[1]))
}

/// Forward fills a column and sets anything still missing to 0
fn fill_forward(values: Vec<Option<f64>>) -> Vec<f64> {
    let mut last: Option<f64> = None;
    values
        .into_iter()
        .map(|v| {
            if v.is_some() {
                last = v;
            }
            last.unwrap_or(0.0)
        })
        .collect()
}

/// Linearly interpolates a column over positions, repeating the first and last known
/// values outwards. A column with no known value is left untouched.
///
/// # Arguments
///
/// * 'column' - the column to fill in place
fn interpolate(column: &mut [Option<f64>]) {
    let known = column
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i, v)))
        .collect::<Vec<(usize, f64)>>();

    let (Some(&(first_idx, first)), Some(&(last_idx, last))) = (known.first(), known.last()) else {
        return;
    };

    for v in column[..first_idx].iter_mut() {
        *v = Some(first);
    }
    for v in column[last_idx + 1..].iter_mut() {
        *v = Some(last);
    }
    for pair in known.windows(2) {
        let (i0, v0) = pair[0];
        let (i1, v1) = pair[1];
        for i in i0 + 1..i1 {
            let t = (i - i0) as f64 / (i1 - i0) as f64;
            column[i] = Some(v0 + (v1 - v0) * t);
        }
    }
}
