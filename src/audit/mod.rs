//! Audit logging
//!
//! Every problem outcome is recorded with its rounds and an integrity hash
//! of the problem text. The log keeps the most recent outcomes up to its
//! capacity and evicts the oldest beyond that.

use crate::error::OrchestrationError;
use crate::models::ProblemOutcome;
use crate::Result;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

pub const DEFAULT_AUDIT_CAPACITY: usize = 1000;

/// Audit trail storage
pub struct AuditLog {
    records: Arc<RwLock<HashMap<Uuid, ProblemOutcome>>>,
    order: Arc<RwLock<VecDeque<Uuid>>>,
    capacity: usize,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_AUDIT_CAPACITY)
    }

    /// A log holding at most `capacity` outcomes (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            order: Arc::new(RwLock::new(VecDeque::new())),
            capacity: capacity.max(1),
        }
    }

    /// Store a problem outcome. Outcomes are immutable once recorded.
    pub async fn record(&self, outcome: ProblemOutcome) -> Result<Uuid> {
        let audit_id = outcome.audit_id;
        let mut records = self.records.write().await;
        if records.contains_key(&audit_id) {
            return Err(OrchestrationError::AuditError(format!(
                "audit id {} already recorded",
                audit_id
            )));
        }
        let mut order = self.order.write().await;
        while order.len() >= self.capacity {
            if let Some(oldest) = order.pop_front() {
                records.remove(&oldest);
                debug!(audit_id = ?oldest, "Evicted oldest audit record");
            }
        }
        records.insert(audit_id, outcome);
        order.push_back(audit_id);
        Ok(audit_id)
    }

    /// Retrieve an outcome by audit ID
    pub async fn get(&self, audit_id: Uuid) -> Result<Option<ProblemOutcome>> {
        let records = self.records.read().await;
        Ok(records.get(&audit_id).cloned())
    }

    /// All outcomes in the order they were recorded
    pub async fn list(&self) -> Result<Vec<ProblemOutcome>> {
        let records = self.records.read().await;
        let order = self.order.read().await;

        Ok(order
            .iter()
            .filter_map(|id| records.get(id).cloned())
            .collect())
    }

    /// Verify an outcome's integrity via hash
    pub async fn verify_integrity(&self, audit_id: Uuid) -> Result<bool> {
        let records = self.records.read().await;

        if let Some(outcome) = records.get(&audit_id) {
            Ok(compute_problem_hash(&outcome.problem) == outcome.problem_hash)
        } else {
            Ok(false)
        }
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

/// SHA256 hash of the problem text, hex encoded
pub fn compute_problem_hash(problem: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(problem.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OutcomeStatus;
    use chrono::Utc;

    fn outcome(problem: &str) -> ProblemOutcome {
        ProblemOutcome {
            audit_id: Uuid::new_v4(),
            problem: problem.to_string(),
            problem_hash: compute_problem_hash(problem),
            status: OutcomeStatus::Verified,
            rounds: vec![],
            started_at: Utc::now(),
            finished_at: Utc::now(),
        }
    }

    #[test]
    fn test_problem_hash() {
        assert_eq!(
            compute_problem_hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_ne!(compute_problem_hash("2 + 2"), compute_problem_hash("2 + 3"));
    }

    #[tokio::test]
    async fn test_record_get_and_list_in_order() {
        let log = AuditLog::new();
        let first = log.record(outcome("2 + 2")).await.unwrap();
        let second = log.record(outcome("x^2 = 4")).await.unwrap();

        assert_eq!(log.get(first).await.unwrap().unwrap().problem, "2 + 2");
        assert!(log.get(Uuid::new_v4()).await.unwrap().is_none());

        let ids: Vec<Uuid> = log.list().await.unwrap().iter().map(|o| o.audit_id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[tokio::test]
    async fn test_verify_integrity() {
        let log = AuditLog::new();
        let good = log.record(outcome("2 + 2")).await.unwrap();

        let mut tampered = outcome("2 + 2");
        tampered.problem = "2 + 3".to_string();
        let bad = log.record(tampered).await.unwrap();

        assert!(log.verify_integrity(good).await.unwrap());
        assert!(!log.verify_integrity(bad).await.unwrap());
        assert!(!log.verify_integrity(Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_capacity_evicts_oldest() {
        let log = AuditLog::with_capacity(2);
        let first = log.record(outcome("1 + 1")).await.unwrap();
        let second = log.record(outcome("2 + 2")).await.unwrap();
        let third = log.record(outcome("3 + 3")).await.unwrap();

        assert!(log.get(first).await.unwrap().is_none());
        assert!(!log.verify_integrity(first).await.unwrap());

        let ids: Vec<Uuid> = log.list().await.unwrap().iter().map(|o| o.audit_id).collect();
        assert_eq!(ids, vec![second, third]);
    }

    #[tokio::test]
    async fn test_duplicate_audit_id_is_rejected() {
        let log = AuditLog::new();
        let entry = outcome("2 + 2");
        log.record(entry.clone()).await.unwrap();

        let err = log.record(entry).await.unwrap_err();
        assert!(matches!(err, OrchestrationError::AuditError(_)));
        assert_eq!(log.list().await.unwrap().len(), 1);
    }
}
