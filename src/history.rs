use std::sync::atomic::{AtomicU32, Ordering};

use chrono::DateTime;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::create_timestamp;
use crate::sandbox::RunResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Queueing,
    Running,
    Finished,
}

/// One entry of the in-memory run log. Submitted sources are deliberately
/// not retained; only targeting metadata and the structured result are.
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub id: u32,
    pub created_time: String,
    pub updated_time: String,
    pub problem_id: Option<u32>,
    pub target_group: Option<String>,
    pub target_case: Option<String>,
    pub state: RunState,
    pub result: Option<RunResult>,
}

#[derive(Deserialize, Default)]
pub struct RunQueryFilter {
    pub problem_id: Option<u32>,
    pub state: Option<RunState>,
    pub success: Option<bool>,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Process-lifetime log of runs, newest last. Nothing is persisted across
/// restarts; durable storage is the catalog collaborator's business.
pub struct RunLog {
    records: RwLock<Vec<RunRecord>>,
    next_id: AtomicU32,
}

impl RunLog {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            next_id: AtomicU32::new(1),
        }
    }

    pub fn create(
        &self,
        problem_id: Option<u32>,
        target_group: Option<&str>,
        target_case: Option<&str>,
    ) -> u32 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = create_timestamp();
        self.records.write().push(RunRecord {
            id,
            created_time: now.clone(),
            updated_time: now,
            problem_id,
            target_group: target_group.map(str::to_string),
            target_case: target_case.map(str::to_string),
            state: RunState::Queueing,
            result: None,
        });
        id
    }

    pub fn set_running(&self, id: u32) {
        self.update(id, |record| record.state = RunState::Running);
    }

    pub fn finish(&self, id: u32, result: RunResult) {
        self.update(id, |record| {
            record.state = RunState::Finished;
            record.result = Some(result);
        });
    }

    fn update(&self, id: u32, mutate: impl FnOnce(&mut RunRecord)) {
        let mut records = self.records.write();
        if let Some(record) = records.iter_mut().find(|r| r.id == id) {
            mutate(record);
            record.updated_time = create_timestamp();
        } else {
            log::warn!("Tried to update unknown run {id}");
        }
    }

    pub fn get(&self, id: u32) -> Option<RunRecord> {
        self.records.read().iter().find(|r| r.id == id).cloned()
    }

    pub fn query(&self, filter: &RunQueryFilter) -> Vec<RunRecord> {
        let from = filter
            .from
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok());
        let to = filter
            .to
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok());

        self.records
            .read()
            .iter()
            .filter(|record| {
                if let Some(problem_id) = filter.problem_id
                    && record.problem_id != Some(problem_id)
                {
                    return false;
                }
                if let Some(state) = filter.state
                    && record.state != state
                {
                    return false;
                }
                if let Some(success) = filter.success
                    && record.result.as_ref().map(|r| r.success) != Some(success)
                {
                    return false;
                }

                let created = DateTime::parse_from_rfc3339(&record.created_time).ok();
                if let (Some(from), Some(created)) = (from, created)
                    && created < from
                {
                    return false;
                }
                if let (Some(to), Some(created)) = (to, created)
                    && created > to
                {
                    return false;
                }

                true
            })
            .cloned()
            .collect()
    }
}

impl Default for RunLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished(log: &RunLog, problem_id: Option<u32>, success: bool) -> u32 {
        let id = log.create(problem_id, None, None);
        log.finish(
            id,
            RunResult {
                success,
                cases_run: 1,
                ..Default::default()
            },
        );
        id
    }

    #[test]
    fn lifecycle_moves_through_states() {
        let log = RunLog::new();
        let id = log.create(Some(0), Some("TestGreet"), None);
        assert_eq!(log.get(id).unwrap().state, RunState::Queueing);

        log.set_running(id);
        assert_eq!(log.get(id).unwrap().state, RunState::Running);

        log.finish(id, RunResult::default());
        let record = log.get(id).unwrap();
        assert_eq!(record.state, RunState::Finished);
        assert!(record.result.is_some());
    }

    #[test]
    fn ids_are_unique_and_increasing() {
        let log = RunLog::new();
        let a = log.create(None, None, None);
        let b = log.create(None, None, None);
        assert!(b > a);
    }

    #[test]
    fn query_filters_by_problem_state_and_success() {
        let log = RunLog::new();
        finished(&log, Some(0), true);
        finished(&log, Some(0), false);
        finished(&log, Some(1), true);
        log.create(Some(0), None, None); // still queueing

        let by_problem = log.query(&RunQueryFilter {
            problem_id: Some(0),
            ..Default::default()
        });
        assert_eq!(by_problem.len(), 3);

        let by_success = log.query(&RunQueryFilter {
            problem_id: Some(0),
            success: Some(true),
            ..Default::default()
        });
        assert_eq!(by_success.len(), 1);

        let queueing = log.query(&RunQueryFilter {
            state: Some(RunState::Queueing),
            ..Default::default()
        });
        assert_eq!(queueing.len(), 1);
    }

    #[test]
    fn query_honors_time_window() {
        let log = RunLog::new();
        let id = finished(&log, None, true);
        let created = log.get(id).unwrap().created_time;

        let inside = log.query(&RunQueryFilter {
            from: Some(created.clone()),
            ..Default::default()
        });
        assert_eq!(inside.len(), 1);

        let after = log.query(&RunQueryFilter {
            from: Some("2999-01-01T00:00:00Z".to_string()),
            ..Default::default()
        });
        assert!(after.is_empty());
    }
}
