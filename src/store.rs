//! In-memory store for generated PILA submissions.

use crate::error::{EngineError, Result};
use crate::models::{PilaSubmission, SubmissionStatus};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Debug, Default)]
pub struct SubmissionStore {
    submissions: RwLock<HashMap<String, PilaSubmission>>,
}

impl SubmissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, submission: PilaSubmission) -> PilaSubmission {
        info!(
            id = %submission.id,
            period = %submission.period,
            employees = submission.employee_count,
            "PILA submission stored"
        );
        let mut guard = self.submissions.write().await;
        guard.insert(submission.id.clone(), submission.clone());
        submission
    }

    pub async fn get(&self, id: &str) -> Result<PilaSubmission> {
        self.submissions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::SubmissionNotFound(id.to_string()))
    }

    /// All submissions, newest first.
    pub async fn list(&self) -> Vec<PilaSubmission> {
        let mut all: Vec<PilaSubmission> = self.submissions.read().await.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        all
    }

    pub async fn by_period(&self, period: &str) -> Vec<PilaSubmission> {
        let mut all = self.list().await;
        all.retain(|s| s.period == period);
        all
    }

    /// Move a submission to `next`, enforcing the forward-only workflow.
    pub async fn transition(&self, id: &str, next: SubmissionStatus) -> Result<PilaSubmission> {
        let mut guard = self.submissions.write().await;
        let submission = guard
            .get_mut(id)
            .ok_or_else(|| EngineError::SubmissionNotFound(id.to_string()))?;
        let from = submission.status;
        submission.status = from.transition_to(next)?;
        info!(id, %from, to = %next, "PILA submission status changed");
        if submission.status.is_terminal() {
            info!(id, period = %submission.period, "PILA submission closed");
        }
        Ok(submission.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArlRiskClass, Employee};
    use crate::pila::generate_pila_at;
    use chrono::{TimeZone, Utc};

    fn submission(period: &str, hour: u32) -> PilaSubmission {
        let employees = [Employee {
            id: "1".into(),
            document_number: String::new(),
            name: String::new(),
            position: String::new(),
            salary: 1_000_000.0,
        }];
        let at = Utc.with_ymd_and_hms(2025, 9, 1, hour, 0, 0).unwrap();
        generate_pila_at(period, &employees, ArlRiskClass::V, at).unwrap()
    }

    #[tokio::test]
    async fn lists_newest_first_and_filters_by_period() {
        let store = SubmissionStore::new();
        let older = store.insert(submission("2025-07", 8)).await;
        let newer = store.insert(submission("2025-08", 9)).await;
        let ids: Vec<String> = store.list().await.into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![newer.id.clone(), older.id.clone()]);
        let july = store.by_period("2025-07").await;
        assert_eq!(july.len(), 1);
        assert_eq!(july[0].id, older.id);
    }

    #[tokio::test]
    async fn transitions_are_enforced() {
        let store = SubmissionStore::new();
        let sub = store.insert(submission("2025-08", 8)).await;
        let sent = store.transition(&sub.id, SubmissionStatus::Enviado).await.unwrap();
        assert_eq!(sent.status, SubmissionStatus::Enviado);
        let err = store
            .transition(&sub.id, SubmissionStatus::Generado)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition { .. }));
        assert_eq!(store.get(&sub.id).await.unwrap().status, SubmissionStatus::Enviado);
    }

    #[tokio::test]
    async fn unknown_submission_is_not_found() {
        let store = SubmissionStore::new();
        assert!(matches!(
            store.get("nope").await,
            Err(EngineError::SubmissionNotFound(_))
        ));
        assert!(matches!(
            store.transition("nope", SubmissionStatus::Enviado).await,
            Err(EngineError::SubmissionNotFound(_))
        ));
    }
}
