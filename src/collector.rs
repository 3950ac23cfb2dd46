//! Per-scrape collection pipeline

use crate::analytics::{self, AnalyticsWindow, ServiceAnalytics};
use crate::client::IncidentApi;
use crate::compliance::{ComplianceClassifier, ComplianceResult};
use crate::config::{CollectorToggles, Config};
use crate::errors::Result;
use crate::models::{BusinessService, Service, Team, User};
use crate::pagination::{fetch_all, ResourceKind};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Service-derived gauges
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServicesSnapshot {
    pub compliance: ComplianceResult,
    pub business_services: usize,
}

/// Everything one scrape collected. Sections are `None` when their collector is off.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScrapeSnapshot {
    pub services: Option<ServicesSnapshot>,
    pub users: Option<usize>,
    pub teams: Option<usize>,
    pub analytics: Option<BTreeMap<String, ServiceAnalytics>>,
}

/// Runs fetch, classify and analytics in sequence on every scrape.
///
/// Holds no state between scrapes beyond the client and configuration.
pub struct ScrapeCollector {
    api: Arc<dyn IncidentApi>,
    classifier: ComplianceClassifier,
    collectors: CollectorToggles,
}

impl ScrapeCollector {
    pub fn new(api: Arc<dyn IncidentApi>, config: &Config) -> Result<Self> {
        Ok(Self {
            api,
            classifier: ComplianceClassifier::new(&config.compliance_pattern)?,
            collectors: config.collectors,
        })
    }

    #[instrument(skip(self), fields(scrape_id = %Uuid::new_v4()))]
    pub async fn scrape(&self) -> Result<ScrapeSnapshot> {
        let started = Instant::now();
        let snapshot = self.scrape_at(Utc::now()).await?;

        info!(
            "Scrape finished in {}ms - services: {:?}, users: {:?}, teams: {:?}, analytics: {:?}",
            started.elapsed().as_millis(),
            snapshot.services.as_ref().map(|s| s.compliance.total),
            snapshot.users,
            snapshot.teams,
            snapshot.analytics.as_ref().map(|a| a.len()),
        );

        Ok(snapshot)
    }

    /// Run the pipeline with the analytics window ending at `now`
    pub async fn scrape_at(&self, now: DateTime<Utc>) -> Result<ScrapeSnapshot> {
        let api = self.api.as_ref();
        let mut snapshot = ScrapeSnapshot::default();

        let compliance = if self.collectors.needs_services() {
            let services: Vec<Service> = fetch_all(api, ResourceKind::Services).await?;
            let compliance = self.classifier.classify(&services);
            debug!(
                "{} of {} services compliant",
                compliance.compliant, compliance.total
            );
            Some(compliance)
        } else {
            None
        };

        if self.collectors.users {
            let users: Vec<User> = fetch_all(api, ResourceKind::Users).await?;
            snapshot.users = Some(users.len());
        }

        if self.collectors.teams {
            let teams: Vec<Team> = fetch_all(api, ResourceKind::Teams).await?;
            snapshot.teams = Some(teams.len());
        }

        if let Some(compliance) = compliance {
            let business_services = if self.collectors.services {
                let records: Vec<BusinessService> =
                    fetch_all(api, ResourceKind::BusinessServices).await?;
                Some(records.len())
            } else {
                None
            };

            if self.collectors.analytics {
                let window = AnalyticsWindow::trailing_year(now);
                let by_service = analytics::collect(api, &compliance.compliant_ids, window).await?;
                snapshot.analytics = Some(by_service);
            }

            if let Some(business_services) = business_services {
                snapshot.services = Some(ServicesSnapshot {
                    compliance,
                    business_services,
                });
            }
        }

        Ok(snapshot)
    }
}
