use log::warn;

use crate::models::Entry;

/// Derived metrics for one selected entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub distance: f64,
    pub duration_min: f64,
    /// Absent when distance or duration is not positive, or when the pace
    /// computation itself failed. Never a fabricated zero.
    pub pace: Option<Pace>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pace {
    /// Minutes per unit distance.
    pub minutes: f64,
    /// `M:SS` rendering of `minutes`.
    pub display: String,
}

/// Compute distance, duration and pace for one entry. A pace failure is
/// logged and skipped; it never aborts the run.
pub fn derive(entry: &Entry) -> Metrics {
    let workout = &entry.workout;
    let distance = workout.distance.value;
    let duration_min = workout.duration_min();

    let pace = if distance > 0.0 && duration_min > 0.0 {
        match workout.pace_min() {
            Ok(minutes) => Some(Pace {
                minutes,
                display: format_duration_min(minutes),
            }),
            Err(err) => {
                warn!("skipping pace for entry at {}: {}", entry.at, err);
                None
            }
        }
    } else {
        None
    };

    Metrics {
        distance,
        duration_min,
        pace,
    }
}

/// Render a duration in minutes as `M:SS`, e.g. `6.0 -> "6:00"`.
pub fn format_duration_min(minutes: f64) -> String {
    let total_secs = (minutes * 60.0).round() as i64;
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}

/// Parse an `M:SS` string back into minutes. Inverse of
/// [`format_duration_min`] to within one second.
pub fn parse_duration_str(s: &str) -> Option<f64> {
    let (m, sec) = s.split_once(':')?;
    let m: i64 = m.parse().ok()?;
    let sec: i64 = sec.parse().ok()?;
    if !(0..60).contains(&sec) {
        return None;
    }
    Some((m * 60 + sec) as f64 / 60.0)
}
