use chrono::{Duration, TimeZone, Utc};
use nowcast_core::{Forecaster, History, LookbackWindow, NowcastError, Sample, LOOKBACK};
use std::sync::Mutex;

/// Forecaster that remembers every window it was handed and returns the
/// mean of the window's values.
#[derive(Default)]
struct RecordingForecaster {
    seen: Mutex<Vec<Vec<f64>>>,
}

impl Forecaster for RecordingForecaster {
    fn forecast(&self, window: &LookbackWindow) -> Result<f64, NowcastError> {
        let values: Vec<f64> = window.samples().iter().map(Sample::value).collect();
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        self.seen.lock().unwrap().push(values);
        Ok(mean)
    }
}

fn stamped(i: usize) -> Sample {
    let base = Utc.with_ymd_and_hms(2024, 2, 29, 22, 0, 0).unwrap();
    Sample::at(i as f64, base + Duration::minutes(i as i64))
}

#[test]
fn test_length_tracks_appends() {
    let mut history = History::new();
    for n in 1..=200 {
        history.append(stamped(n));
        assert_eq!(history.len(), n);
        assert_eq!(history.total_appended(), n as u64);
    }
}

#[test]
fn test_tail_is_newest_in_order_for_every_k() {
    let mut history = History::new();
    for i in 0..75 {
        history.append(stamped(i));
    }

    for k in 0..=history.len() {
        let tail = history.tail(k).unwrap();
        let expected: Vec<f64> = (75 - k..75).map(|i| i as f64).collect();
        let got: Vec<f64> = tail.iter().map(Sample::value).collect();
        assert_eq!(got, expected, "tail({k}) out of order");
    }
    assert!(history.tail(76).is_none());
}

#[test]
fn test_time_fields_roll_over_midnight() {
    let mut history = History::new();
    for i in 0..180 {
        history.append(stamped(i));
    }
    for sample in history.iter() {
        assert!(sample.hour() <= 23);
        assert!(sample.minute() <= 59);
    }
    // 22:00 + 179 minutes = 00:59 the next day
    let last = history.tail(1).unwrap()[0];
    assert_eq!((last.hour(), last.minute()), (0, 59));
}

#[test]
fn test_window_slides_past_oldest_sample() {
    let forecaster = RecordingForecaster::default();
    let mut history = History::new();

    for i in 0..LOOKBACK + 5 {
        history.append(stamped(i));
        if let Some(window) = history.window() {
            forecaster.forecast(&window).unwrap();
        }
    }

    let seen = forecaster.seen.lock().unwrap();
    assert_eq!(seen.len(), 6);
    for (offset, window) in seen.iter().enumerate() {
        assert_eq!(window.len(), LOOKBACK);
        assert_eq!(window[0], offset as f64);
        assert_eq!(window[LOOKBACK - 1], (offset + LOOKBACK - 1) as f64);
    }
}

#[test]
fn test_bounded_history_windows_match_unbounded() {
    let mut unbounded = History::new();
    let mut bounded = History::with_retention(LOOKBACK + 10).unwrap();

    for i in 0..500 {
        unbounded.append(stamped(i));
        bounded.append(stamped(i));
        assert!(bounded.len() <= LOOKBACK + 10);
        assert_eq!(unbounded.window(), bounded.window());
    }
    assert_eq!(bounded.total_appended(), unbounded.total_appended());
}
