//! Batched retrieval of per-service incident analytics

use crate::client::IncidentApi;
use crate::errors::Result;
use crate::models::{AnalyticsData, AnalyticsFilters, AnalyticsRequest};
use chrono::{DateTime, Duration, Months, SecondsFormat, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Maximum service IDs per analytics request
pub const BATCH_SIZE: usize = 10;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ServiceAnalytics {
    pub mean_seconds_to_first_ack: f64,
    pub mean_seconds_to_resolve: f64,
}

impl From<&AnalyticsData> for ServiceAnalytics {
    fn from(data: &AnalyticsData) -> Self {
        Self {
            mean_seconds_to_first_ack: data.mean_seconds_to_first_ack.unwrap_or_default(),
            mean_seconds_to_resolve: data.mean_seconds_to_resolve.unwrap_or_default(),
        }
    }
}

/// Creation-time window shared by every batch of one scrape
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnalyticsWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl AnalyticsWindow {
    /// One calendar year ending at `now`
    pub fn trailing_year(now: DateTime<Utc>) -> Self {
        let start = now
            .checked_sub_months(Months::new(12))
            .unwrap_or_else(|| now - Duration::days(365));

        Self { start, end: now }
    }

    fn request_for(&self, service_ids: &[String]) -> AnalyticsRequest {
        AnalyticsRequest {
            filters: AnalyticsFilters {
                created_at_start: self.start.to_rfc3339_opts(SecondsFormat::Secs, true),
                created_at_end: self.end.to_rfc3339_opts(SecondsFormat::Secs, true),
                service_ids: service_ids.to_vec(),
            },
        }
    }
}

/// Consecutive batches of at most `size` IDs
pub fn partition(service_ids: &[String], size: usize) -> Vec<&[String]> {
    service_ids.chunks(size.max(1)).collect()
}

/// Issue one analytics request per batch and merge the results by service name.
///
/// Batches run in order; a later batch overwrites an earlier value for the same
/// service name.
pub async fn collect<A>(
    api: &A,
    service_ids: &[String],
    window: AnalyticsWindow,
) -> Result<BTreeMap<String, ServiceAnalytics>>
where
    A: IncidentApi + ?Sized,
{
    let mut by_service = BTreeMap::new();
    let batches = partition(service_ids, BATCH_SIZE);

    for (index, batch) in batches.iter().enumerate() {
        let response = api.service_analytics(&window.request_for(batch)).await?;
        debug!(
            "Analytics batch {}/{}: {} ids, {} records",
            index + 1,
            batches.len(),
            batch.len(),
            response.data.len()
        );

        for data in &response.data {
            by_service.insert(data.service_name.clone(), ServiceAnalytics::from(data));
        }
    }

    Ok(by_service)
}
