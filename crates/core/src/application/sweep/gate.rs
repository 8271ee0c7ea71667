// Shared-secret gate for the externally triggered reconcile sweep

use crate::error::{AppError, Result};
use constant_time_eq::constant_time_eq;

/// Checks the caller's key against the configured secret.
///
/// Runs before any store access. An unconfigured secret is a configuration
/// error, distinct from a missing or wrong key.
#[derive(Debug, Clone)]
pub struct ReconcileGate {
    secret: Option<String>,
}

impl ReconcileGate {
    /// Empty secrets count as unconfigured
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    pub fn authorize(&self, provided: Option<&str>) -> Result<()> {
        let secret = self.secret.as_deref().ok_or_else(|| {
            AppError::Config("reconcile API key is not configured".to_string())
        })?;

        match provided.filter(|key| !key.is_empty()) {
            None => Err(AppError::Unauthorized("missing API key".to_string())),
            Some(key) if constant_time_eq(key.as_bytes(), secret.as_bytes()) => Ok(()),
            Some(_) => Err(AppError::Unauthorized("invalid API key".to_string())),
        }
    }
}
