use chrono::{NaiveDateTime, Timelike};
use crate::models::weather::{DecodedWeatherRecord, WeatherObservation, CONTINUOUS_COLUMNS};

/// Finds the weather observation that best represents the given forecast instant.
///
/// Records from the same hour of day are preferred, and among those the ones closest in
/// calendar days (earlier or later). Only if no record shares the hour of day, the records
/// closest in absolute time are used. A single survivor is returned as is, several
/// survivors are merged by averaging continuous columns and ceiling coverage, while the
/// cloud type is taken from the first survivor.
///
/// Returns None if there are no records at all.
///
/// # Arguments
///
/// * 'records' - decoded weather records in their original order
/// * 'ts' - the forecast instant to match
pub fn match_weather(records: &[DecodedWeatherRecord], ts: NaiveDateTime) -> Option<WeatherObservation> {
    if records.is_empty() {
        return None;
    }

    let same_hour = records
        .iter()
        .filter(|r| r.date.hour() == ts.hour())
        .collect::<Vec<&DecodedWeatherRecord>>();

    let survivors = if !same_hour.is_empty() {
        let target_date = ts.date();
        closest_by(same_hour, |r| (r.date.date() - target_date).num_days().abs())
    } else {
        closest_by(records.iter().collect(), |r| (r.date - ts).num_seconds().abs())
    };

    aggregate(&survivors)
}

/// Keeps all records achieving the minimum distance, in their original order
///
/// # Arguments
///
/// * 'records' - candidate records
/// * 'distance' - distance of a record to the target
fn closest_by<'a, F>(records: Vec<&'a DecodedWeatherRecord>, distance: F) -> Vec<&'a DecodedWeatherRecord>
where
    F: Fn(&DecodedWeatherRecord) -> i64,
{
    let Some(min) = records.iter().map(|r| distance(*r)).min() else {
        return Vec::new();
    };

    records
        .into_iter()
        .filter(|r| distance(*r) == min)
        .collect()
}

/// Merges survivors into one observation
///
/// # Arguments
///
/// * 'survivors' - the records to merge, in original order
fn aggregate(survivors: &[&DecodedWeatherRecord]) -> Option<WeatherObservation> {
    let (first, rest) = survivors.split_first()?;
    if rest.is_empty() {
        return Some(first.observation.clone());
    }

    let mut sums = [0.0; CONTINUOUS_COLUMNS];
    let mut counts = [0usize; CONTINUOUS_COLUMNS];
    for record in survivors {
        for (c, (_, value)) in record.observation.continuous().into_iter().enumerate() {
            if let Some(v) = value {
                sums[c] += v;
                counts[c] += 1;
            }
        }
    }

    let mut means = [None; CONTINUOUS_COLUMNS];
    for c in 0..CONTINUOUS_COLUMNS {
        if counts[c] > 0 {
            means[c] = Some(sums[c] / counts[c] as f64);
        }
    }

    let coverage = survivors
        .iter()
        .map(|r| r.observation.ceiling_coverage)
        .sum::<f64>() / survivors.len() as f64;

    Some(WeatherObservation::from_columns(means, coverage, first.observation.ga1_type))
}
