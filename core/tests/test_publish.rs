use std::cell::RefCell;

use chrono::{DateTime, Utc};
use dm2influx_core::{
    DmError, Metrics, Pace, Point, Publisher, Row, Sink, TaggedShape, WideShape,
};

/// Records every sink call and keeps a naive in-memory point store with the
/// same clear semantics as the real backend.
#[derive(Default)]
struct MockSink {
    calls: RefCell<Vec<String>>,
    databases: RefCell<Vec<String>>,
    points: RefCell<Vec<Point>>,
    fail_on_query: bool,
}

fn quoted_name(command: &str) -> Option<&str> {
    let start = command.find('"')? + 1;
    let end = start + command[start..].find('"')?;
    Some(&command[start..end])
}

impl Sink for MockSink {
    fn list_databases(&self) -> Result<Vec<String>, DmError> {
        self.calls.borrow_mut().push("list".to_string());
        Ok(self.databases.borrow().clone())
    }

    fn create_database_if_not_exists(&self, name: &str) -> Result<(), DmError> {
        self.calls.borrow_mut().push(format!("create {name}"));
        let mut dbs = self.databases.borrow_mut();
        if !dbs.iter().any(|d| d == name) {
            dbs.push(name.to_string());
        }
        Ok(())
    }

    fn execute_query(&self, _db: &str, command: &str) -> Result<(), DmError> {
        self.calls.borrow_mut().push(format!("query {command}"));
        if self.fail_on_query {
            return Err(DmError::SinkResponse("query refused".to_string()));
        }
        if let Some(target) = quoted_name(command) {
            if command.starts_with("DROP SERIES") {
                self.points.borrow_mut().retain(|p| p.measurement != target);
            } else if command.starts_with("DELETE FROM") {
                let user = command
                    .rsplit('\'')
                    .nth(1)
                    .expect("delete statement carries a user");
                self.points.borrow_mut().retain(|p| {
                    p.measurement != target || p.tags.get("user").map(String::as_str) != Some(user)
                });
            }
        }
        Ok(())
    }

    fn write_batch(
        &self,
        _db: &str,
        _retention_policy: Option<&str>,
        points: &[Point],
    ) -> Result<(), DmError> {
        self.calls
            .borrow_mut()
            .push(format!("write {}", points.len()));
        // InfluxDB answers 400 "missing data" to an empty write body
        if points.is_empty() {
            return Err(DmError::Sink {
                status: 400,
                body: r#"{"error":"missing data"}"#.to_string(),
            });
        }
        self.points.borrow_mut().extend(points.iter().cloned());
        Ok(())
    }
}

fn time(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

fn rows() -> Vec<Row> {
    vec![
        Row {
            time: time("2013-01-20T15:36:34Z"),
            activity_type: "running".to_string(),
            metrics: Metrics {
                distance: 5.0,
                duration_min: 30.0,
                pace: Some(Pace {
                    minutes: 6.0,
                    display: "6:00".to_string(),
                }),
            },
        },
        Row {
            time: time("2013-01-21T07:02:10Z"),
            activity_type: "cycling".to_string(),
            metrics: Metrics {
                distance: 20.0,
                duration_min: 60.0,
                pace: Some(Pace {
                    minutes: 3.0,
                    display: "3:00".to_string(),
                }),
            },
        },
    ]
}

#[test]
fn publish_runs_ensure_clear_write_in_order() {
    let sink = MockSink::default();
    let publisher = Publisher::new(&sink, "dailymile");
    publisher
        .publish(&WideShape, "alice", &rows())
        .expect("publish failed");

    let calls = sink.calls.borrow();
    assert_eq!(calls[0], "list");
    assert_eq!(calls[1], "create dailymile");
    assert_eq!(calls[2], "query DROP SERIES FROM \"alice.distance\"");
    assert_eq!(calls[3], "query DROP SERIES FROM \"alice.duration\"");
    assert_eq!(calls[4], "query DROP SERIES FROM \"alice.pace\"");
    assert_eq!(calls[5], "write 6");
    assert_eq!(calls.len(), 6);
}

#[test]
fn publish_creates_database_once_and_idempotently() {
    let sink = MockSink::default();
    let publisher = Publisher::new(&sink, "dailymile");
    publisher.publish(&WideShape, "alice", &rows()).unwrap();
    publisher.publish(&WideShape, "alice", &rows()).unwrap();
    assert_eq!(sink.databases.borrow().as_slice(), ["dailymile"]);
}

#[test]
fn rerun_replaces_instead_of_accumulating() {
    for shape in [
        Box::new(WideShape) as Box<dyn dm2influx_core::OutputShape>,
        Box::new(TaggedShape),
    ] {
        let sink = MockSink::default();
        let publisher = Publisher::new(&sink, "dailymile");

        publisher.publish(shape.as_ref(), "alice", &rows()).unwrap();
        let after_one = sink.points.borrow().clone();

        publisher.publish(shape.as_ref(), "alice", &rows()).unwrap();
        let after_two = sink.points.borrow().clone();

        assert_eq!(after_one, after_two);
    }
}

#[test]
fn tagged_clear_leaves_other_users_alone() {
    let sink = MockSink::default();
    let publisher = Publisher::new(&sink, "dailymile");
    publisher.publish(&TaggedShape, "alice", &rows()).unwrap();
    publisher.publish(&TaggedShape, "bob", &rows()).unwrap();

    let points = sink.points.borrow();
    let users: Vec<&str> = points
        .iter()
        .filter_map(|p| p.tags.get("user").map(String::as_str))
        .collect();
    assert_eq!(users.iter().filter(|u| **u == "alice").count(), 2);
    assert_eq!(users.iter().filter(|u| **u == "bob").count(), 2);
}

#[test]
fn first_error_aborts_before_write() {
    let sink = MockSink {
        fail_on_query: true,
        ..MockSink::default()
    };
    let publisher = Publisher::new(&sink, "dailymile");
    let err = publisher.publish(&WideShape, "alice", &rows());
    assert!(err.is_err());

    let calls = sink.calls.borrow();
    assert!(calls.iter().all(|c| !c.starts_with("write")));
    // aborted on the first clear statement, no rollback attempted
    assert_eq!(
        calls.last().map(String::as_str),
        Some("query DROP SERIES FROM \"alice.distance\"")
    );
    assert!(sink.points.borrow().is_empty());
}

#[test]
fn empty_selection_still_clears_prior_data() {
    let sink = MockSink::default();
    let publisher = Publisher::new(&sink, "dailymile");
    publisher.publish(&WideShape, "alice", &rows()).unwrap();

    let calls_before = sink.calls.borrow().len();
    publisher
        .publish(&WideShape, "alice", &[])
        .expect("zero-point run should succeed");
    assert!(sink.points.borrow().is_empty());

    // prior data was cleared, but no empty write was sent to the sink
    let calls = sink.calls.borrow();
    let second_run = &calls[calls_before..];
    assert!(second_run.iter().any(|c| c.starts_with("query")));
    assert!(second_run.iter().all(|c| !c.starts_with("write")));
}
