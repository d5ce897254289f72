use std::time::Duration;

use log::debug;
use serde::Deserialize;
use ureq::Agent;

use crate::error::DmError;
use crate::series::Point;

/// Abstract capability set of the time-series sink. The publisher and the
/// tests only ever talk to this trait; `HttpSink` is the production
/// implementation.
pub trait Sink {
    fn list_databases(&self) -> Result<Vec<String>, DmError>;
    /// Single idempotent create; InfluxDB `CREATE DATABASE` already means
    /// "if not exists", so there is no check-then-act race.
    fn create_database_if_not_exists(&self, name: &str) -> Result<(), DmError>;
    /// Admin statement against `db` (drop series, delete by tag).
    fn execute_query(&self, db: &str, command: &str) -> Result<(), DmError>;
    /// One batch write at one-second precision. All-or-nothing for the
    /// caller; a partial failure surfaces as a single error.
    fn write_batch(
        &self,
        db: &str,
        retention_policy: Option<&str>,
        points: &[Point],
    ) -> Result<(), DmError>;
}

#[derive(Debug, Clone, Deserialize)]
struct QueryResp {
    #[serde(default)]
    results: Vec<QueryResult>,
}

#[derive(Debug, Clone, Deserialize)]
struct QueryResult {
    #[serde(default)]
    series: Vec<QuerySeries>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct QuerySeries {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Blocking InfluxDB HTTP client (v1 query + write endpoints).
pub struct HttpSink {
    agent: Agent,
    base_url: String,
    username: String,
    password: String,
}

impl HttpSink {
    pub fn new(base_url: &str, username: &str, password: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(10))
            .build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    fn query(&self, db: Option<&str>, q: &str) -> Result<QueryResp, DmError> {
        debug!("influxdb query: {q}");
        let url = format!("{}/query", self.base_url);
        let mut req = self
            .agent
            .post(&url)
            .query("u", &self.username)
            .query("p", &self.password)
            .query("q", q);
        if let Some(db) = db {
            req = req.query("db", db);
        }
        let resp = match req.call() {
            Ok(resp) => resp,
            Err(ureq::Error::Status(status, resp)) => {
                return Err(DmError::Sink {
                    status,
                    body: resp.into_string().unwrap_or_default(),
                })
            }
            Err(err) => return Err(DmError::Http(Box::new(err))),
        };
        let body: QueryResp = resp
            .into_json()
            .map_err(|err| DmError::SinkResponse(err.to_string()))?;
        if let Some(err) = body.results.iter().find_map(|r| r.error.clone()) {
            return Err(DmError::SinkResponse(err));
        }
        Ok(body)
    }
}

impl Sink for HttpSink {
    fn list_databases(&self) -> Result<Vec<String>, DmError> {
        let resp = self.query(None, "SHOW DATABASES")?;
        let names = resp
            .results
            .iter()
            .flat_map(|r| &r.series)
            .flat_map(|s| &s.values)
            .filter_map(|row| row.first())
            .filter_map(|v| v.as_str().map(String::from))
            .collect();
        Ok(names)
    }

    fn create_database_if_not_exists(&self, name: &str) -> Result<(), DmError> {
        self.query(
            None,
            &format!("CREATE DATABASE \"{}\"", name.replace('"', "\\\"")),
        )?;
        Ok(())
    }

    fn execute_query(&self, db: &str, command: &str) -> Result<(), DmError> {
        self.query(Some(db), command)?;
        Ok(())
    }

    fn write_batch(
        &self,
        db: &str,
        retention_policy: Option<&str>,
        points: &[Point],
    ) -> Result<(), DmError> {
        let mut body = String::new();
        for point in points {
            body.push_str(&point.to_line());
            body.push('\n');
        }
        debug!("writing {} points to {db}", points.len());

        let url = format!("{}/write", self.base_url);
        let mut req = self
            .agent
            .post(&url)
            .query("u", &self.username)
            .query("p", &self.password)
            .query("db", db)
            .query("precision", "s");
        if let Some(rp) = retention_policy {
            req = req.query("rp", rp);
        }
        match req.send_string(&body) {
            Ok(_) => Ok(()),
            Err(ureq::Error::Status(status, resp)) => Err(DmError::Sink {
                status,
                body: resp.into_string().unwrap_or_default(),
            }),
            Err(err) => Err(DmError::Http(Box::new(err))),
        }
    }
}
