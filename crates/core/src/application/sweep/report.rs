//! Sweep response contract
//!
//! Every sweep, fatal or not, answers with a [`SweepReport`]. Counters that a
//! sweep does not track are omitted from the serialized form.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Which sweep produced a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepKind {
    PickupTimeout,
    WindowStart,
    WindowEnd,
    Reconcile,
}

impl SweepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SweepKind::PickupTimeout => "pickup_timeout",
            SweepKind::WindowStart => "window_start",
            SweepKind::WindowEnd => "window_end",
            SweepKind::Reconcile => "reconcile",
        }
    }

    fn reports_deleted(&self) -> bool {
        matches!(self, SweepKind::PickupTimeout)
    }

    fn reports_scores(&self) -> bool {
        matches!(self, SweepKind::WindowEnd | SweepKind::Reconcile)
    }

    fn reports_notifications(&self) -> bool {
        !matches!(self, SweepKind::Reconcile)
    }
}

impl fmt::Display for SweepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one sweep invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub sweep: SweepKind,
    pub success: bool,
    pub message: String,
    pub processed_count: usize,
    pub updated_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mite_scores_updated: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications_sent: Option<usize>,
    #[serde(default)]
    pub errors: Vec<String>,
    /// Set only on fatal failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SweepReport {
    /// Whole-invocation failure: nothing was processed
    pub fn fatal(sweep: SweepKind, err: &AppError) -> Self {
        Self {
            sweep,
            success: false,
            message: format!("{} sweep aborted", sweep),
            processed_count: 0,
            updated_count: 0,
            deleted_count: None,
            mite_scores_updated: None,
            notifications_sent: None,
            errors: Vec::new(),
            error: Some(err.to_string()),
        }
    }

    /// Nothing to do; a success with zero counts
    pub fn empty(sweep: SweepKind, message: impl Into<String>) -> Self {
        SweepTally::default().finish_with(sweep, message)
    }
}

/// Running counters for one pass
#[derive(Debug, Default)]
pub struct SweepTally {
    pub processed: usize,
    pub updated: usize,
    pub deleted: usize,
    pub mite_scores_updated: usize,
    pub notifications_sent: usize,
    errors: Vec<String>,
}

impl SweepTally {
    /// Record a recovered per-item failure
    pub fn record_error(&mut self, message: String) {
        warn!(error = %message, "Sweep item error");
        self.errors.push(message);
    }

    pub fn record_notification(&mut self, outcome: Result<(), String>) {
        match outcome {
            Ok(()) => self.notifications_sent += 1,
            Err(message) => self.record_error(message),
        }
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn finish(self, sweep: SweepKind) -> SweepReport {
        let message = format!(
            "{} sweep: processed {}, updated {}",
            sweep, self.processed, self.updated
        );
        self.finish_with(sweep, message)
    }

    /// Partial failures stay successful while at least one update landed
    pub fn finish_with(self, sweep: SweepKind, message: impl Into<String>) -> SweepReport {
        let success = self.errors.is_empty() || self.updated > 0;
        SweepReport {
            sweep,
            success,
            message: message.into(),
            processed_count: self.processed,
            updated_count: self.updated,
            deleted_count: sweep.reports_deleted().then_some(self.deleted),
            mite_scores_updated: sweep.reports_scores().then_some(self.mite_scores_updated),
            notifications_sent: sweep
                .reports_notifications()
                .then_some(self.notifications_sent),
            errors: self.errors,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_serializes_camel_case_and_omits_foreign_counters() {
        let mut tally = SweepTally::default();
        tally.processed = 2;
        tally.updated = 1;
        tally.mite_scores_updated = 1;
        let report = tally.finish(SweepKind::WindowEnd);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["processedCount"], 2);
        assert_eq!(json["updatedCount"], 1);
        assert_eq!(json["miteScoresUpdated"], 1);
        assert!(json.get("deletedCount").is_none());
        assert!(json.get("error").is_none());
        assert_eq!(json["errors"], serde_json::json!([]));
    }

    #[test]
    fn test_errors_without_updates_fail_the_report() {
        let mut tally = SweepTally::default();
        tally.processed = 1;
        tally.record_error("item a: boom".to_string());
        assert!(!tally.finish(SweepKind::WindowStart).success);

        let mut tally = SweepTally::default();
        tally.processed = 2;
        tally.updated = 1;
        tally.record_notification(Err("item a: window_started notification failed".into()));
        let report = tally.finish(SweepKind::WindowStart);
        assert!(report.success);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.notifications_sent, Some(0));
    }

    #[test]
    fn test_fatal_report_shape() {
        let report = SweepReport::fatal(
            SweepKind::Reconcile,
            &AppError::Config("reconcile secret not configured".into()),
        );
        assert!(!report.success);
        assert_eq!(report.processed_count, 0);
        assert!(report.error.unwrap().contains("not configured"));
    }
}
