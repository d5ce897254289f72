use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DmError;

/// On-disk shape of a cached dailymile entry log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryLog {
    #[serde(default)]
    pub entries: Vec<Entry>,
}

/// One decoded record from the activity log, workout or non-workout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Entry {
    /// Raw RFC 3339 timestamp, parsed lazily via [`Entry::time`].
    #[serde(default)]
    pub at: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub workout: Workout,
}

impl Entry {
    /// Parse the entry timestamp. An unparseable timestamp is fatal to the
    /// run, not skipped.
    pub fn time(&self) -> Result<DateTime<Utc>, DmError> {
        DateTime::parse_from_rfc3339(&self.at)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|source| DmError::Timestamp {
                at: self.at.clone(),
                source,
            })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Workout {
    /// Free-form category; empty means a social/text-only post.
    #[serde(default)]
    pub activity_type: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub distance: Distance,
    /// Elapsed seconds, may be zero.
    #[serde(default)]
    pub duration: i64,
}

impl Workout {
    pub fn is_workout(&self) -> bool {
        !self.activity_type.is_empty()
    }

    pub fn duration_min(&self) -> f64 {
        self.duration as f64 / 60.0
    }

    /// Minutes per unit distance. Only meaningful when both distance and
    /// duration are positive; callers gate on that before calling.
    pub fn pace_min(&self) -> Result<f64, DmError> {
        let pace = self.duration_min() / self.distance.value;
        if pace.is_finite() {
            Ok(pace)
        } else {
            Err(DmError::Pace {
                reason: format!(
                    "non-finite pace for distance {} over {}s",
                    self.distance.value, self.duration
                ),
            })
        }
    }
}

/// Unit-agnostic distance; `units` is whatever the source recorded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Distance {
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub units: Option<String>,
}
