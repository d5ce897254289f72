use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::pace::Metrics;

/// One timestamped write to the sink, rendered as InfluxDB line protocol.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub measurement: String,
    pub tags: BTreeMap<String, String>,
    /// Field order is preserved in the rendered line.
    pub fields: Vec<(String, FieldValue)>,
    /// Unix seconds; the pipeline's declared write precision.
    pub timestamp_secs: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Str(String),
}

impl Point {
    /// Render as one line of InfluxDB line protocol at second precision.
    /// Unsuffixed numeric fields are floats on the wire, matching the
    /// metric semantics.
    pub fn to_line(&self) -> String {
        let mut line = escape_measurement(&self.measurement);
        for (key, value) in &self.tags {
            line.push(',');
            line.push_str(&escape_tag(key));
            line.push('=');
            line.push_str(&escape_tag(value));
        }
        line.push(' ');
        for (i, (key, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                line.push(',');
            }
            line.push_str(&escape_tag(key));
            line.push('=');
            match value {
                FieldValue::Float(v) => line.push_str(&v.to_string()),
                FieldValue::Str(s) => {
                    line.push('"');
                    line.push_str(&escape_field_str(s));
                    line.push('"');
                }
            }
        }
        line.push(' ');
        line.push_str(&self.timestamp_secs.to_string());
        line
    }
}

fn escape_measurement(s: &str) -> String {
    s.replace(',', "\\,").replace(' ', "\\ ")
}

fn escape_tag(s: &str) -> String {
    s.replace(',', "\\,").replace('=', "\\=").replace(' ', "\\ ")
}

fn escape_field_str(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// A selected entry paired with its derived metrics.
#[derive(Debug, Clone)]
pub struct Row {
    pub time: DateTime<Utc>,
    pub activity_type: String,
    pub metrics: Metrics,
}

/// Output payload strategy, selected once per run. The two layouts reflect
/// a backend schema migration; a run never mixes them.
pub trait OutputShape {
    /// Convert derived rows into the sink write payload.
    fn assemble(&self, user: &str, rows: &[Row]) -> Vec<Point>;
    /// Admin statements that clear previously published data for `user`,
    /// so reruns replace instead of accumulate.
    fn clear_statements(&self, user: &str) -> Vec<String>;
}

/// Legacy layout: three independent per-user series, one per metric.
/// `{user}.distance` and `{user}.duration` get a row per entry; a
/// `{user}.pace` row exists only when pace is defined.
pub struct WideShape;

impl OutputShape for WideShape {
    fn assemble(&self, user: &str, rows: &[Row]) -> Vec<Point> {
        let mut distance = Vec::with_capacity(rows.len());
        let mut duration = Vec::with_capacity(rows.len());
        let mut pace = Vec::new();

        for row in rows {
            let time = row.time.timestamp();
            distance.push(Point {
                measurement: format!("{user}.distance"),
                tags: BTreeMap::new(),
                fields: vec![("distance".into(), FieldValue::Float(row.metrics.distance))],
                timestamp_secs: time,
            });
            duration.push(Point {
                measurement: format!("{user}.duration"),
                tags: BTreeMap::new(),
                fields: vec![(
                    "duration".into(),
                    FieldValue::Float(row.metrics.duration_min),
                )],
                timestamp_secs: time,
            });
            if let Some(p) = &row.metrics.pace {
                pace.push(Point {
                    measurement: format!("{user}.pace"),
                    tags: BTreeMap::new(),
                    fields: vec![
                        ("pace".into(), FieldValue::Float(p.minutes)),
                        ("pace_display".into(), FieldValue::Str(p.display.clone())),
                    ],
                    timestamp_secs: time,
                });
            }
        }

        distance.into_iter().chain(duration).chain(pace).collect()
    }

    fn clear_statements(&self, user: &str) -> Vec<String> {
        ["distance", "duration", "pace"]
            .iter()
            .map(|metric| format!("DROP SERIES FROM \"{user}.{metric}\""))
            .collect()
    }
}

/// One shared `workout` measurement tagged with `{user, type}`. Every
/// selected entry contributes exactly one point; absent pace fields are
/// omitted, never zero-filled.
pub struct TaggedShape;

impl OutputShape for TaggedShape {
    fn assemble(&self, user: &str, rows: &[Row]) -> Vec<Point> {
        rows.iter()
            .map(|row| {
                let mut tags = BTreeMap::new();
                tags.insert("user".to_string(), user.to_string());
                tags.insert("type".to_string(), row.activity_type.clone());

                let mut fields = vec![
                    ("distance".into(), FieldValue::Float(row.metrics.distance)),
                    (
                        "duration".into(),
                        FieldValue::Float(row.metrics.duration_min),
                    ),
                ];
                if let Some(p) = &row.metrics.pace {
                    fields.push(("pace".into(), FieldValue::Float(p.minutes)));
                    fields.push(("pace_display".into(), FieldValue::Str(p.display.clone())));
                }

                Point {
                    measurement: "workout".to_string(),
                    tags,
                    fields,
                    timestamp_secs: row.time.timestamp(),
                }
            })
            .collect()
    }

    fn clear_statements(&self, user: &str) -> Vec<String> {
        vec![format!(
            "DELETE FROM \"workout\" WHERE \"user\" = '{}'",
            user.replace('\'', "\\'")
        )]
    }
}
