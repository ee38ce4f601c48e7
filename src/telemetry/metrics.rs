//! Prometheus recorder setup and metric descriptions

use anyhow::{Context, Result};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a handle for rendering metrics.
pub fn install_prometheus_recorder() -> Result<PrometheusHandle> {
    // Seconds; sub-millisecond buckets for the cheap endpoints
    let buckets = [
        0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
    ];

    PrometheusBuilder::new()
        .set_buckets(&buckets)
        .context("Failed to set histogram buckets")?
        .install_recorder()
        .context("Failed to install Prometheus recorder")
}

/// Register descriptions and emit zero values so HELP/TYPE lines appear from
/// startup rather than after first use.
pub fn describe_metrics() {
    describe_counter!(
        "storefront_auth_http_requests_total",
        "Total number of HTTP requests"
    );
    describe_histogram!(
        "storefront_auth_http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_gauge!(
        "storefront_auth_http_requests_in_flight",
        "Number of HTTP requests currently being processed"
    );

    describe_counter!("storefront_auth_login_total", "Login attempts by result");
    describe_counter!(
        "storefront_auth_otp_issued_total",
        "One-time passcodes issued by purpose"
    );
    describe_counter!(
        "storefront_auth_otp_verify_total",
        "One-time passcode checks by purpose and outcome"
    );
    describe_counter!(
        "storefront_auth_reset_links_issued_total",
        "Password reset links issued"
    );
    describe_counter!(
        "storefront_auth_mail_sent_total",
        "Outbound credential emails by outcome"
    );

    gauge!("storefront_auth_http_requests_in_flight").set(0.0);
    histogram!("storefront_auth_http_request_duration_seconds", "method" => "GET", "route" => "/health")
        .record(0.0);
    counter!("storefront_auth_login_total", "result" => "success").absolute(0);
    counter!("storefront_auth_login_total", "result" => "failure").absolute(0);
    for purpose in ["signup", "reset"] {
        counter!("storefront_auth_otp_issued_total", "purpose" => purpose).absolute(0);
        counter!("storefront_auth_otp_verify_total", "purpose" => purpose, "outcome" => "verified")
            .absolute(0);
    }
    counter!("storefront_auth_reset_links_issued_total").absolute(0);
    counter!("storefront_auth_mail_sent_total", "outcome" => "sent").absolute(0);
    counter!("storefront_auth_mail_sent_total", "outcome" => "failed").absolute(0);
}
