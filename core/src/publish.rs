use log::info;

use crate::error::DmError;
use crate::influx::Sink;
use crate::series::{OutputShape, Row};

/// Orchestrates one run against the sink: ensure the destination exists,
/// clear prior data for the identity, write the fresh batch. Strict order,
/// first error aborts, nothing is rolled back. Two concurrent runs for the
/// same user race on the clear/write steps; the design does not provide
/// mutual exclusion.
pub struct Publisher<'a, S: Sink> {
    sink: &'a S,
    database: String,
    retention_policy: Option<String>,
}

impl<'a, S: Sink> Publisher<'a, S> {
    pub fn new(sink: &'a S, database: impl Into<String>) -> Self {
        Self {
            sink,
            database: database.into(),
            retention_policy: None,
        }
    }

    pub fn with_retention_policy(mut self, rp: impl Into<String>) -> Self {
        self.retention_policy = Some(rp.into());
        self
    }

    pub fn publish(&self, shape: &dyn OutputShape, user: &str, rows: &[Row]) -> Result<(), DmError> {
        // The listing only drives the progress message; creation itself is
        // idempotent and never gated on it.
        let existing = self.sink.list_databases()?;
        if existing.iter().any(|db| db == &self.database) {
            println!("Database already exists: {}", self.database);
        } else {
            println!("Creating database: {}", self.database);
        }
        self.sink.create_database_if_not_exists(&self.database)?;

        // Clear prior data for this identity so reruns are full
        // replacements, not accumulations.
        for stmt in shape.clear_statements(user) {
            self.sink.execute_query(&self.database, &stmt)?;
        }

        let points = shape.assemble(user, rows);
        // The backend rejects empty writes; a run with zero qualifying
        // entries ends here, after the clear has already replaced prior data.
        if points.is_empty() {
            info!("no points for {user}, nothing to write");
            return Ok(());
        }
        info!(
            "writing {} points for {user} to {}",
            points.len(),
            self.database
        );
        self.sink
            .write_batch(&self.database, self.retention_policy.as_deref(), &points)
    }
}
