//! Pre-deploy health checks.
//!
//! Every collaborator that can be broken by deployment (store, generation
//! service, card template, static assets) exposes a [`HealthCheck`]. The
//! server runs them at startup and from the `preflight` command.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::counter::CounterStore;

/// Result of one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Check passed, with a short detail.
    Pass(String),
    /// Check failed, with the reason.
    Fail(String),
}

impl CheckOutcome {
    /// Whether this outcome is a pass.
    #[must_use]
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass(_))
    }
}

/// Something that can verify it is ready to serve.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Name printed next to the outcome.
    fn name(&self) -> &str;

    /// Whether running the check costs money (e.g. a live model call).
    /// Startup skips these; `preflight` runs everything.
    fn billable(&self) -> bool {
        false
    }

    /// Run the check. Must not panic; failures are reported as
    /// [`CheckOutcome::Fail`].
    async fn check(&self) -> CheckOutcome;
}

/// A finished check.
#[derive(Debug, Clone)]
pub struct CheckReport {
    /// Check name.
    pub name: String,
    /// What happened.
    pub outcome: CheckOutcome,
    /// Wall time in milliseconds.
    pub elapsed_ms: u64,
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            CheckOutcome::Pass(detail) => {
                write!(f, "[PASS] {}: {detail} ({}ms)", self.name, self.elapsed_ms)
            }
            CheckOutcome::Fail(reason) => {
                write!(f, "[FAIL] {}: {reason} ({}ms)", self.name, self.elapsed_ms)
            }
        }
    }
}

/// Run `checks` one after another, in order.
pub async fn run_checks(checks: &[Arc<dyn HealthCheck>]) -> Vec<CheckReport> {
    let mut reports = Vec::with_capacity(checks.len());
    for check in checks {
        let start = Instant::now();
        let outcome = check.check().await;
        reports.push(CheckReport {
            name: check.name().to_string(),
            outcome,
            elapsed_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        });
    }
    reports
}

/// True when every report passed.
#[must_use]
pub fn all_passed(reports: &[CheckReport]) -> bool {
    reports.iter().all(|r| r.outcome.is_pass())
}

// ---------------------------------------------------------------------------
// Built-in checks
// ---------------------------------------------------------------------------

/// Pings the counter store.
pub struct StoreCheck {
    store: Arc<dyn CounterStore>,
}

impl StoreCheck {
    /// Check `store`.
    #[must_use]
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl HealthCheck for StoreCheck {
    fn name(&self) -> &str {
        "counter store"
    }

    async fn check(&self) -> CheckOutcome {
        match self.store.ping().await {
            Ok(()) => CheckOutcome::Pass(format!("{} reachable", self.store.backend())),
            Err(e) => CheckOutcome::Fail(e.to_string()),
        }
    }
}

/// Verifies a file exists and is not empty.
pub struct FileCheck {
    name: String,
    path: PathBuf,
}

impl FileCheck {
    /// Check that `path` exists.
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

#[async_trait]
impl HealthCheck for FileCheck {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self) -> CheckOutcome {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) if meta.is_file() && meta.len() > 0 => {
                CheckOutcome::Pass(format!("found {}", self.path.display()))
            }
            Ok(_) => CheckOutcome::Fail(format!("{} is empty or not a file", self.path.display())),
            Err(e) => CheckOutcome::Fail(format!("{}: {e}", self.path.display())),
        }
    }
}
