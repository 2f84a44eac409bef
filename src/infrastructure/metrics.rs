// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::MetricsSettings;
use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

/// 安装Prometheus导出器并登记投递相关指标
pub fn init_metrics(settings: &MetricsSettings) {
    if !settings.enabled {
        info!("Metrics exporter disabled");
        return;
    }

    let addr: SocketAddr = match settings.listen_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!(addr = %settings.listen_addr, error = %e, "Invalid metrics listen address");
            return;
        }
    };

    // Ignore error if address is already in use (for development/testing)
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!("Failed to install Prometheus recorder: {}. This might happen if the port is already in use.", e);
        return;
    }

    describe_metrics();
    info!("Metrics exporter listening on {}", addr);
}

fn describe_metrics() {
    describe_counter!(
        "webhook_delivery_attempts_total",
        "Number of webhook delivery attempts"
    );
    describe_histogram!(
        "webhook_delivery_duration_seconds",
        Unit::Seconds,
        "Time spent sending a webhook request"
    );
    describe_counter!(
        "webhook_delivery_success_total",
        "Number of webhook deliveries answered with a 2xx status"
    );
    describe_counter!(
        "webhook_delivery_failed_total",
        "Number of failed webhook deliveries by reason"
    );
    describe_counter!(
        "webhook_delivery_skipped_total",
        "Number of webhook tasks completed without sending a request"
    );
    describe_counter!(
        "webhook_queue_deduplicated_total",
        "Number of task ids dropped because they were already queued"
    );
    describe_gauge!(
        "webhook_queue_in_flight",
        "Number of task ids queued or being delivered"
    );
    describe_counter!(
        "webhook_tasks_created_total",
        "Number of hook tasks created"
    );
    describe_counter!(
        "webhook_cleanup_deleted_total",
        "Number of hook tasks removed by the retention sweep"
    );
}
