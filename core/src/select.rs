use crate::models::Entry;

/// Decides which decoded entries participate in a run.
#[derive(Debug, Clone, Default)]
pub struct Policy {
    /// Workout-type allow-list; `None` allows every type.
    pub types: Option<Vec<String>>,
    /// Upper bound on accepted entries; `None` is unbounded.
    pub max_records: Option<usize>,
}

impl Policy {
    /// Build a policy from the raw CLI values: `-t` comma list (empty means
    /// all types) and `-m` max records (-1 means unbounded).
    pub fn from_args(types: &str, max_records: i64) -> Self {
        let types: Vec<String> = types
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        // No surviving segments means no filter at all, not "reject everything".
        let types = if types.is_empty() { None } else { Some(types) };
        let max_records = usize::try_from(max_records).ok();
        Self { types, max_records }
    }

    fn allows(&self, activity_type: &str) -> bool {
        match &self.types {
            Some(types) => types.iter().any(|t| t == activity_type),
            None => true,
        }
    }

    /// Ordered subsequence of entries to process. Rules in order, first
    /// match wins: non-workout entries are skipped without counting,
    /// disallowed types are skipped without counting, and once `max_records`
    /// entries are accepted later entries are not evaluated at all.
    pub fn select<'a>(&self, entries: &'a [Entry]) -> Vec<&'a Entry> {
        let mut selected = Vec::new();
        for entry in entries {
            if let Some(max) = self.max_records {
                if selected.len() >= max {
                    break;
                }
            }
            if !entry.workout.is_workout() {
                continue;
            }
            if !self.allows(&entry.workout.activity_type) {
                continue;
            }
            selected.push(entry);
        }
        selected
    }
}
