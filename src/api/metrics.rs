use actix_web::{http::StatusCode, HttpResponse};
use serde::Serialize;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide counters fed by [`crate::middleware::RequestMetrics`].
pub static REQUEST_COUNTERS: RequestCounters = RequestCounters::new();

pub struct RequestCounters {
    handled: AtomicU64,
    client_errors: AtomicU64,
    server_errors: AtomicU64,
}

impl RequestCounters {
    pub const fn new() -> Self {
        Self {
            handled: AtomicU64::new(0),
            client_errors: AtomicU64::new(0),
            server_errors: AtomicU64::new(0),
        }
    }

    /// `None` means the service failed before producing a response; counted as a 5xx.
    pub fn observe(&self, status: Option<StatusCode>) {
        self.handled.fetch_add(1, Ordering::Relaxed);
        match status {
            Some(s) if s.is_client_error() => {
                self.client_errors.fetch_add(1, Ordering::Relaxed);
            }
            Some(s) if !s.is_server_error() => {}
            _ => {
                self.server_errors.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            handled: self.handled.load(Ordering::Relaxed),
            client_errors: self.client_errors.load(Ordering::Relaxed),
            server_errors: self.server_errors.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct CounterSnapshot {
    pub handled: u64,
    pub client_errors: u64,
    pub server_errors: u64,
}

impl CounterSnapshot {
    /// Prometheus text exposition: one total, errors split by status class.
    pub fn to_prometheus(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# HELP budget_pal_requests_handled_total Requests that reached a handler");
        let _ = writeln!(out, "# TYPE budget_pal_requests_handled_total counter");
        let _ = writeln!(out, "budget_pal_requests_handled_total {}", self.handled);
        let _ = writeln!(out, "# HELP budget_pal_request_errors_total Error responses by status class");
        let _ = writeln!(out, "# TYPE budget_pal_request_errors_total counter");
        for (class, count) in [("4xx", self.client_errors), ("5xx", self.server_errors)] {
            let _ = writeln!(out, "budget_pal_request_errors_total{{class=\"{}\"}} {}", class, count);
        }
        out
    }
}

#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Health",
    responses(
        (status = 200, description = "Request counters in Prometheus text format", body = String)
    )
)]
pub async fn get_metrics() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(REQUEST_COUNTERS.snapshot().to_prometheus())
}
