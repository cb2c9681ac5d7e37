// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;

pub const SCRAPE_JOBS_TOTAL: &str = "leadrs_scrape_jobs_total";
pub const LEADS_ADDED_TOTAL: &str = "leadrs_leads_added_total";
pub const LISTINGS_SKIPPED_TOTAL: &str = "leadrs_listings_skipped_total";
pub const LEAD_COMMIT_FAILURES_TOTAL: &str = "leadrs_lead_commit_failures_total";

/// 启动 Prometheus 导出器并注册指标说明
pub fn init_metrics(listen_addr: &str) -> anyhow::Result<()> {
    let addr: SocketAddr = listen_addr.parse()?;

    // Ignore error if address is already in use (for development/testing)
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        tracing::warn!(
            "Failed to install Prometheus recorder: {}. This might happen if the port is already in use.",
            e
        );
        return Ok(());
    }

    describe_counter!(SCRAPE_JOBS_TOTAL, "Scrape jobs finished, labelled by outcome");
    describe_counter!(LEADS_ADDED_TOTAL, "Leads committed to the store");
    describe_counter!(
        LISTINGS_SKIPPED_TOTAL,
        "Listings dropped during extraction because required fields were missing"
    );
    describe_counter!(
        LEAD_COMMIT_FAILURES_TOTAL,
        "Candidate leads that failed to persist"
    );

    info!("Metrics exporter listening on {}", addr);
    Ok(())
}

/// 记录一次任务结束；`outcome` 为 `success` 或错误类别
pub fn record_job(outcome: &'static str) {
    counter!(SCRAPE_JOBS_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_leads_added(count: usize) {
    counter!(LEADS_ADDED_TOTAL).increment(count as u64);
}

pub fn record_listings_skipped(count: usize) {
    counter!(LISTINGS_SKIPPED_TOTAL).increment(count as u64);
}

pub fn record_commit_failure() {
    counter!(LEAD_COMMIT_FAILURES_TOTAL).increment(1);
}
