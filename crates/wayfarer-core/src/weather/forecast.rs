use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use std::collections::BTreeMap;
use tracing::debug;

use super::conditions::map_condition;
use super::ForecastSample;
use crate::models::ForecastDay;

pub const MAX_FORECAST_DAYS: usize = 7;

/// Fold sub-daily samples into calendar days, oldest first, at most seven.
///
/// Per day: `high`/`low` are the extreme sample temperatures, the
/// condition, description and icon come from the middle sample (conditions
/// are categorical, so they are picked rather than averaged) and
/// `precipitation` is the mean of the samples' whole-percent probabilities,
/// rounded to the nearest percent with exact halves rounded down.
pub fn aggregate_forecast(samples: &[ForecastSample], utc_offset_seconds: i32) -> Vec<ForecastDay> {
    let offset = FixedOffset::east_opt(utc_offset_seconds).unwrap_or_else(|| Utc.fix());

    let mut ordered: Vec<&ForecastSample> = samples.iter().collect();
    ordered.sort_by_key(|sample| sample.timestamp);

    let mut days: BTreeMap<NaiveDate, Vec<&ForecastSample>> = BTreeMap::new();
    for sample in ordered {
        let Some(at) = DateTime::<Utc>::from_timestamp(sample.timestamp, 0) else {
            debug!("Skipping forecast sample with bad timestamp {}", sample.timestamp);
            continue;
        };
        let date = at.with_timezone(&offset).date_naive();
        days.entry(date).or_default().push(sample);
    }

    days.into_iter()
        .filter_map(|(date, day)| summarize_day(date, &day))
        .take(MAX_FORECAST_DAYS)
        .collect()
}

fn summarize_day(date: NaiveDate, day: &[&ForecastSample]) -> Option<ForecastDay> {
    let middle = day.get(day.len() / 2)?;

    let high = day
        .iter()
        .map(|s| s.temperature)
        .fold(f64::NEG_INFINITY, f64::max);
    let low = day
        .iter()
        .map(|s| s.temperature)
        .fold(f64::INFINITY, f64::min);

    let percent_total: u32 = day
        .iter()
        .map(|s| (s.precipitation_probability.clamp(0.0, 1.0) * 100.0).round() as u32)
        .sum();
    // Mean rounded to nearest, exact halves going down
    let n = day.len() as u32;
    let precipitation = ((2 * percent_total + n - 1) / (2 * n)).min(100) as u8;

    Some(ForecastDay {
        date,
        high,
        low,
        condition: map_condition(middle.condition_code, &middle.icon),
        description: middle.description.clone(),
        icon: middle.icon.clone(),
        precipitation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WeatherCondition;
    use chrono::TimeZone;

    fn sample(at: DateTime<Utc>, temperature: f64, pop: f64, code: u16) -> ForecastSample {
        ForecastSample {
            timestamp: at.timestamp(),
            temperature,
            condition_code: Some(code),
            description: format!("code {}", code),
            icon: String::new(),
            precipitation_probability: pop,
        }
    }

    fn three_hourly_day(date: (i32, u32, u32), temps: &[f64], pops: &[f64]) -> Vec<ForecastSample> {
        let start = Utc.with_ymd_and_hms(date.0, date.1, date.2, 0, 0, 0).unwrap();
        temps
            .iter()
            .zip(pops)
            .enumerate()
            .map(|(i, (t, p))| {
                let code = if i == 4 { 500 } else { 800 };
                sample(start + chrono::Duration::hours(3 * i as i64), *t, *p, code)
            })
            .collect()
    }

    #[test]
    fn test_single_day_aggregation() {
        let samples = three_hourly_day(
            (2024, 6, 1),
            &[2.0, 3.0, 5.0, 9.0, 11.0, 10.0, 7.0, 4.0],
            &[0.1, 0.1, 0.2, 0.3, 0.3, 0.2, 0.1, 0.1],
        );

        let days = aggregate_forecast(&samples, 0);
        assert_eq!(days.len(), 1);

        let day = &days[0];
        assert_eq!(day.date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(day.high, 11.0);
        assert_eq!(day.low, 2.0);
        assert_eq!(day.precipitation, 17);
        // index 4 of 8 is the representative sample
        assert_eq!(day.condition, WeatherCondition::Rain);
        assert_eq!(day.description, "code 500");
    }

    #[test]
    fn test_precipitation_rounds_to_nearest_percent() {
        let samples = three_hourly_day((2024, 6, 1), &[10.0, 11.0, 12.0], &[0.3, 0.4, 0.4]);
        // mean 36.67%
        assert_eq!(aggregate_forecast(&samples, 0)[0].precipitation, 37);

        let samples = three_hourly_day((2024, 6, 1), &[10.0, 11.0, 12.0], &[0.3, 0.3, 0.4]);
        // mean 33.33%
        assert_eq!(aggregate_forecast(&samples, 0)[0].precipitation, 33);

        let samples = three_hourly_day((2024, 6, 1), &[10.0, 11.0], &[0.0, 0.0]);
        assert_eq!(aggregate_forecast(&samples, 0)[0].precipitation, 0);

        let samples = three_hourly_day((2024, 6, 1), &[10.0, 11.0], &[1.0, 1.0]);
        assert_eq!(aggregate_forecast(&samples, 0)[0].precipitation, 100);
    }

    #[test]
    fn test_days_are_chronological_and_capped_at_seven() {
        let mut samples = Vec::new();
        for d in (1..=9).rev() {
            samples.extend(three_hourly_day((2024, 6, d), &[10.0, 12.0], &[0.0, 0.5]));
        }

        let days = aggregate_forecast(&samples, 0);
        assert_eq!(days.len(), MAX_FORECAST_DAYS);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(days[6].date, NaiveDate::from_ymd_opt(2024, 6, 7).unwrap());
        assert!(days.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn test_local_offset_moves_samples_across_midnight() {
        // 23:00 UTC is already the next day at UTC+2
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 23, 0, 0).unwrap();
        let samples = vec![sample(at, 15.0, 0.0, 800)];

        let utc_days = aggregate_forecast(&samples, 0);
        let local_days = aggregate_forecast(&samples, 2 * 3600);

        assert_eq!(utc_days[0].date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(local_days[0].date, NaiveDate::from_ymd_opt(2024, 6, 2).unwrap());
    }

    #[test]
    fn test_empty_input_gives_no_days() {
        assert!(aggregate_forecast(&[], 0).is_empty());
    }
}
