//! Prometheus gauges emitted for one scrape

use crate::collector::ScrapeSnapshot;
use crate::errors::{ExporterError, Result};
use prometheus::{Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};

pub const SERVICE_NAME_LABEL: &str = "allServiceNames";
pub const TEAM_NAME_LABEL: &str = "allTeamNames";
pub const COMPLIANT_SERVICE_LABEL: &str = "compliantServiceName";

/// Gauge set registered into a per-scrape registry
struct ScrapeMetrics {
    total_services: Gauge,
    compliant_services: Gauge,
    total_users: Gauge,
    total_teams: Gauge,
    total_business_services: Gauge,
    service_names: GaugeVec,
    mean_seconds_to_first_ack: GaugeVec,
    mean_seconds_to_resolve: GaugeVec,
}

impl ScrapeMetrics {
    fn new() -> Result<Self> {
        Ok(Self {
            total_services: Gauge::new(
                "pagerduty_total_services_metric",
                "The number of total services in PagerDuty",
            )?,
            compliant_services: Gauge::new(
                "pagerduty_total_services_compliant_metric",
                "Shows the number of compliant services names",
            )?,
            total_users: Gauge::new(
                "pagerduty_total_users_metric",
                "Shows the total number of users",
            )?,
            total_teams: Gauge::new(
                "pagerduty_total_teams_metric",
                "Shows the total number of teams",
            )?,
            total_business_services: Gauge::new(
                "pagerduty_total_business_services_metric",
                "Shows the total number of business services",
            )?,
            service_names: GaugeVec::new(
                Opts::new("pagerduty_service_names_metric", "Service name compliance, 1 if compliant"),
                &[SERVICE_NAME_LABEL, TEAM_NAME_LABEL],
            )?,
            mean_seconds_to_first_ack: GaugeVec::new(
                Opts::new("pagerduty_mtta_analytics_metric", "Mean seconds to first ack"),
                &[COMPLIANT_SERVICE_LABEL],
            )?,
            mean_seconds_to_resolve: GaugeVec::new(
                Opts::new("pagerduty_mttr_analytics_metric", "Mean seconds to resolve"),
                &[COMPLIANT_SERVICE_LABEL],
            )?,
        })
    }

    /// Register only the gauges whose section was collected
    fn register(&self, registry: &Registry, snapshot: &ScrapeSnapshot) -> Result<()> {
        if snapshot.services.is_some() {
            registry.register(Box::new(self.total_services.clone()))?;
            registry.register(Box::new(self.compliant_services.clone()))?;
            registry.register(Box::new(self.total_business_services.clone()))?;
            registry.register(Box::new(self.service_names.clone()))?;
        }
        if snapshot.users.is_some() {
            registry.register(Box::new(self.total_users.clone()))?;
        }
        if snapshot.teams.is_some() {
            registry.register(Box::new(self.total_teams.clone()))?;
        }
        if snapshot.analytics.is_some() {
            registry.register(Box::new(self.mean_seconds_to_first_ack.clone()))?;
            registry.register(Box::new(self.mean_seconds_to_resolve.clone()))?;
        }
        Ok(())
    }

    fn record(&self, snapshot: &ScrapeSnapshot) -> Result<()> {
        if let Some(services) = &snapshot.services {
            self.total_services.set(services.compliance.total as f64);
            self.compliant_services.set(services.compliance.compliant as f64);
            self.total_business_services.set(services.business_services as f64);

            for service in &services.compliance.services {
                let value = if service.compliant { 1.0 } else { 0.0 };
                self.service_names
                    .get_metric_with_label_values(&[service.service_name.as_str(), service.team_name.as_str()])?
                    .set(value);
            }
        }

        if let Some(users) = snapshot.users {
            self.total_users.set(users as f64);
        }

        if let Some(teams) = snapshot.teams {
            self.total_teams.set(teams as f64);
        }

        if let Some(analytics) = &snapshot.analytics {
            for (service_name, values) in analytics {
                self.mean_seconds_to_first_ack
                    .get_metric_with_label_values(&[service_name.as_str()])?
                    .set(values.mean_seconds_to_first_ack);
                self.mean_seconds_to_resolve
                    .get_metric_with_label_values(&[service_name.as_str()])?
                    .set(values.mean_seconds_to_resolve);
            }
        }

        Ok(())
    }
}

/// Build a fresh registry holding the gauges for `snapshot`
pub fn build_registry(snapshot: &ScrapeSnapshot) -> Result<Registry> {
    let registry = Registry::new();
    let metrics = ScrapeMetrics::new()?;

    metrics.register(&registry, snapshot)?;
    metrics.record(snapshot)?;

    Ok(registry)
}

/// Render `snapshot` in the Prometheus text exposition format
pub fn encode(snapshot: &ScrapeSnapshot) -> Result<String> {
    let registry = build_registry(snapshot)?;
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&registry.gather(), &mut buffer)?;

    String::from_utf8(buffer)
        .map_err(|e| ExporterError::Metrics(prometheus::Error::Msg(e.to_string())))
}

/// Content type of [`encode`] output
pub fn content_type() -> String {
    TextEncoder::new().format_type().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::ServiceAnalytics;
    use crate::collector::ServicesSnapshot;
    use crate::compliance::{ComplianceResult, ServiceCompliance};
    use std::collections::BTreeMap;

    fn snapshot() -> ScrapeSnapshot {
        let mut analytics = BTreeMap::new();
        analytics.insert(
            "api_SVC".to_string(),
            ServiceAnalytics {
                mean_seconds_to_first_ack: 90.0,
                mean_seconds_to_resolve: 1800.0,
            },
        );

        ScrapeSnapshot {
            services: Some(ServicesSnapshot {
                compliance: ComplianceResult {
                    total: 3,
                    compliant: 2,
                    compliant_ids: vec!["P1".to_string(), "P3".to_string()],
                    services: vec![
                        ServiceCompliance {
                            service_name: "api_SVC".to_string(),
                            team_name: "Ops".to_string(),
                            compliant: true,
                        },
                        ServiceCompliance {
                            service_name: "worker".to_string(),
                            team_name: "Ops".to_string(),
                            compliant: false,
                        },
                    ],
                },
                business_services: 4,
            }),
            users: Some(12),
            teams: Some(5),
            analytics: Some(analytics),
        }
    }

    #[test]
    fn test_encode_full_snapshot() {
        let output = encode(&snapshot()).unwrap();

        assert!(output.contains("pagerduty_total_services_metric 3\n"));
        assert!(output.contains("pagerduty_total_services_compliant_metric 2\n"));
        assert!(output.contains("pagerduty_total_users_metric 12\n"));
        assert!(output.contains("pagerduty_total_teams_metric 5\n"));
        assert!(output.contains("pagerduty_total_business_services_metric 4\n"));
        assert!(output.contains(
            "pagerduty_service_names_metric{allServiceNames=\"api_SVC\",allTeamNames=\"Ops\"} 1\n"
        ));
        assert!(output.contains(
            "pagerduty_service_names_metric{allServiceNames=\"worker\",allTeamNames=\"Ops\"} 0\n"
        ));
        assert!(output.contains("pagerduty_mtta_analytics_metric{compliantServiceName=\"api_SVC\"} 90\n"));
        assert!(output.contains("pagerduty_mttr_analytics_metric{compliantServiceName=\"api_SVC\"} 1800\n"));
    }

    #[test]
    fn test_family_sizes() {
        let registry = build_registry(&snapshot()).unwrap();
        let families = registry.gather();

        let size = |name: &str| {
            families
                .iter()
                .find(|f| f.get_name() == name)
                .map(|f| f.get_metric().len())
                .unwrap_or(0)
        };

        assert_eq!(families.len(), 8);
        assert_eq!(size("pagerduty_service_names_metric"), 2);
        assert_eq!(size("pagerduty_mtta_analytics_metric"), 1);
        assert_eq!(size("pagerduty_mttr_analytics_metric"), 1);
    }

    #[test]
    fn test_disabled_sections_are_omitted() {
        let snapshot = ScrapeSnapshot {
            teams: Some(5),
            ..ScrapeSnapshot::default()
        };

        let output = encode(&snapshot).unwrap();

        assert!(output.contains("pagerduty_total_teams_metric 5\n"));
        assert!(!output.contains("pagerduty_total_services_metric"));
        assert!(!output.contains("pagerduty_total_users_metric"));
        assert!(!output.contains("pagerduty_mtta_analytics_metric"));
    }

    #[test]
    fn test_label_values_are_escaped() {
        let mut snapshot = snapshot();
        if let Some(services) = snapshot.services.as_mut() {
            services.compliance.services[0].team_name = "Ops \"East\"".to_string();
        }

        let output = encode(&snapshot).unwrap();
        assert!(output.contains("allTeamNames=\"Ops \\\"East\\\"\""));
    }

    #[test]
    fn test_each_registry_is_fresh() {
        let first = encode(&snapshot()).unwrap();
        let second = encode(&snapshot()).unwrap();
        assert_eq!(first, second);
    }
}
