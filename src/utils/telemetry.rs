// file: src/utils/telemetry.rs
// description: component health reporting and operation timing
// reference: used by the health command and agent turn timing

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    fn icon(self) -> &'static str {
        match self {
            HealthStatus::Healthy => "✓",
            HealthStatus::Degraded => "⚠",
            HealthStatus::Unhealthy => "✗",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub component: String,
    pub status: HealthStatus,
    pub detail: Option<String>,
    pub elapsed_ms: u64,
}

impl ComponentHealth {
    pub fn new(
        component: &str,
        status: HealthStatus,
        detail: Option<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            component: component.to_string(),
            status,
            detail,
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    pub fn healthy(component: &str, elapsed: Duration) -> Self {
        Self::new(component, HealthStatus::Healthy, None, elapsed)
    }

    pub fn degraded(component: &str, detail: impl Into<String>) -> Self {
        Self::new(
            component,
            HealthStatus::Degraded,
            Some(detail.into()),
            Duration::ZERO,
        )
    }

    pub fn unhealthy(component: &str, detail: impl Into<String>, elapsed: Duration) -> Self {
        Self::new(component, HealthStatus::Unhealthy, Some(detail.into()), elapsed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub components: Vec<ComponentHealth>,
    pub checked_at: DateTime<Utc>,
    pub version: String,
}

impl HealthReport {
    /// Overall status is the worst component status.
    pub fn from_components(components: Vec<ComponentHealth>) -> Self {
        let status = components
            .iter()
            .map(|c| c.status)
            .max()
            .unwrap_or(HealthStatus::Healthy);

        Self {
            status,
            components,
            checked_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }

    pub fn render(&self) -> String {
        let mut out = format!(
            "{} MindGarden {} - {:?} ({})\n",
            self.status.icon(),
            self.version,
            self.status,
            self.checked_at.format("%Y-%m-%d %H:%M:%S UTC")
        );

        for component in &self.components {
            out.push_str(&format!(
                "  {} {:<10} {:?} {}ms",
                component.status.icon(),
                component.component,
                component.status,
                component.elapsed_ms
            ));
            if let Some(detail) = &component.detail {
                out.push_str(&format!(" - {}", detail));
            }
            out.push('\n');
        }

        out
    }
}

pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn start(operation: &str) -> Self {
        debug!("Starting operation: {}", operation);
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn finish(self) -> Duration {
        let elapsed = self.elapsed();
        debug!(
            "Completed operation: {} in {:.2}s",
            self.operation,
            elapsed.as_secs_f64()
        );
        elapsed
    }

    pub fn warn_if_slow(&self, threshold: Duration) {
        let elapsed = self.elapsed();
        if elapsed > threshold {
            warn!(
                "Slow operation [{}]: took {:.2}s (threshold: {:.2}s)",
                self.operation,
                elapsed.as_secs_f64(),
                threshold.as_secs_f64()
            );
        }
    }
}
