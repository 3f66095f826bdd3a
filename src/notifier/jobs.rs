//! Background scan loops.
//!
//! The two scans run as independent tokio tasks on independent intervals
//! and are not synchronized with each other or with request handling.
//! Overlapping runs are possible and safe: emission is idempotent within
//! the dedup window, so this is an at-least-once design.

use crate::AppState;
use chrono::Utc;
use tokio_util::sync::CancellationToken;

pub async fn run_low_stock_job(state: AppState, shutdown: CancellationToken) {
    let interval = state.config.notifications.scan_interval;
    tracing::info!(?interval, "Starting low-stock scan job");

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.cancelled() => {
                tracing::info!("Low-stock scan job shutting down");
                return;
            }
        }

        if let Err(e) = super::run_low_stock_scan(&state).await {
            tracing::warn!(error = %e, "Low-stock scan failed");
        }
    }
}

pub async fn run_expiration_job(state: AppState, shutdown: CancellationToken) {
    let interval = state.config.notifications.scan_interval;
    tracing::info!(?interval, "Starting expiration scan job");

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.cancelled() => {
                tracing::info!("Expiration scan job shutting down");
                return;
            }
        }

        if let Err(e) = super::run_expiration_scan(&state, Utc::now().date_naive()).await {
            tracing::warn!(error = %e, "Expiration scan failed");
        }
    }
}
