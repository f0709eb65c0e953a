use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use prometheus::{IntCounterVec, Opts, Registry};
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
pub static PROMETHEUS_REGISTRY: OnceLock<Registry> = OnceLock::new();
pub static PAYMENT_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static WEBHOOKS_RECEIVED_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Install the global recorder and register the domain counters. Call once at startup.
pub fn init_metrics() -> anyhow::Result<()> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("failed to install Prometheus recorder: {}", e))?;

    METRICS_HANDLE
        .set(handle)
        .map_err(|_| anyhow::anyhow!("metrics handle already initialized"))?;

    let registry = Registry::new();

    let payment_requests = IntCounterVec::new(
        Opts::new(
            "payment_requests_total",
            "Payment creation requests by outcome",
        ),
        &["outcome"],
    )?;

    let webhooks_received = IntCounterVec::new(
        Opts::new(
            "webhooks_received_total",
            "Gateway webhooks received by processing result",
        ),
        &["result"],
    )?;

    registry.register(Box::new(payment_requests.clone()))?;
    registry.register(Box::new(webhooks_received.clone()))?;

    PROMETHEUS_REGISTRY
        .set(registry)
        .map_err(|_| anyhow::anyhow!("prometheus registry already initialized"))?;
    PAYMENT_REQUESTS_TOTAL
        .set(payment_requests)
        .map_err(|_| anyhow::anyhow!("payment_requests_total already initialized"))?;
    WEBHOOKS_RECEIVED_TOTAL
        .set(webhooks_received)
        .map_err(|_| anyhow::anyhow!("webhooks_received_total already initialized"))?;

    Ok(())
}

pub fn get_metrics() -> String {
    let mut output = METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string());

    if let Some(registry) = PROMETHEUS_REGISTRY.get() {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&registry.gather(), &mut buffer).ok();
        if let Ok(custom_metrics) = String::from_utf8(buffer) {
            output.push_str(&custom_metrics);
        }
    }

    output
}

/// `created`, `invalid`, `rejected`, `gateway_error` or `storage_error`.
pub fn record_payment_request(outcome: &str) {
    if let Some(counter) = PAYMENT_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

/// `updated`, `unknown_order` or `invalid`.
pub fn record_webhook(result: &str) {
    if let Some(counter) = WEBHOOKS_RECEIVED_TOTAL.get() {
        counter.with_label_values(&[result]).inc();
    }
}
