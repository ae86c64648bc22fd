//! Observability helpers: request tracing context and health-check shapes
//! used by the server's `/health` and `/ready` handlers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request trace information, attached to a request as it crosses the
/// gateway → core → repository boundary for log correlation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceContext {
    pub trace_id: Uuid,
    pub span_id: Uuid,
    pub parent_span_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
}

impl TraceContext {
    pub fn new() -> Self {
        Self {
            trace_id: Uuid::new_v4(),
            span_id: Uuid::new_v4(),
            parent_span_id: None,
            timestamp: Utc::now(),
        }
    }

    pub fn child_span(&self) -> Self {
        Self {
            trace_id: self.trace_id,
            span_id: Uuid::new_v4(),
            parent_span_id: Some(self.span_id),
            timestamp: Utc::now(),
        }
    }
}

impl Default for TraceContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Metrics for a single HTTP request/response, independent of the
/// Prometheus counters the server also exports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMetrics {
    pub endpoint: String,
    pub method: String,
    pub status_code: u16,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: HealthStatus,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<ComponentCheck>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentCheck {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HealthCheck {
    pub fn healthy(version: String) -> Self {
        Self {
            status: HealthStatus::Healthy,
            version,
            timestamp: Utc::now(),
            checks: None,
        }
    }

    /// Build a readiness-style response from component checks: `Healthy`
    /// only if every component is `Healthy`, `Unhealthy` if any is, else
    /// `Degraded`.
    pub fn from_components(version: String, checks: Vec<ComponentCheck>) -> Self {
        let status = if checks.iter().any(|c| c.status == HealthStatus::Unhealthy) {
            HealthStatus::Unhealthy
        } else if checks.iter().any(|c| c.status == HealthStatus::Degraded) {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        Self {
            status,
            version,
            timestamp: Utc::now(),
            checks: Some(checks),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_span_shares_trace_id_and_points_at_parent() {
        let root = TraceContext::new();
        let child = root.child_span();
        assert_eq!(child.trace_id, root.trace_id);
        assert_eq!(child.parent_span_id, Some(root.span_id));
    }

    #[test]
    fn aggregate_status_is_worst_of_components() {
        let checks = vec![
            ComponentCheck {
                name: "database".to_string(),
                status: HealthStatus::Healthy,
                message: None,
            },
            ComponentCheck {
                name: "cache".to_string(),
                status: HealthStatus::Degraded,
                message: Some("high latency".to_string()),
            },
        ];
        let health = HealthCheck::from_components("0.3.0".to_string(), checks);
        assert_eq!(health.status, HealthStatus::Degraded);
    }
}
