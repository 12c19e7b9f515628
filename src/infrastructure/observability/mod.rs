//! Observability infrastructure - Prometheus metrics

mod metrics;

pub use metrics::{
    create_metrics_router, init_metrics, record_authorization, record_http_request,
    record_quota_reset, PrometheusMetrics,
};
