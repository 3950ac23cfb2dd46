//! Naming-convention compliance over the service collection

use crate::errors::Result;
use crate::models::Service;
use regex::Regex;
use serde::Serialize;

/// Per-service entry of the compliance projection
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ServiceCompliance {
    pub service_name: String,
    pub team_name: String,
    pub compliant: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ComplianceResult {
    pub total: usize,
    pub compliant: usize,
    /// IDs of compliant services, in upstream order
    pub compliant_ids: Vec<String>,
    /// Only services with at least one team
    pub services: Vec<ServiceCompliance>,
}

#[derive(Debug, Clone)]
pub struct ComplianceClassifier {
    pattern: Regex,
}

impl ComplianceClassifier {
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn is_compliant(&self, name: &str) -> bool {
        self.pattern.is_match(name)
    }

    pub fn classify(&self, services: &[Service]) -> ComplianceResult {
        let mut result = ComplianceResult {
            total: services.len(),
            ..ComplianceResult::default()
        };

        for service in services {
            let compliant = self.is_compliant(&service.name);

            if compliant {
                result.compliant += 1;
                result.compliant_ids.push(service.id.clone());
            }

            // Team name comes from the first team only
            if let Some(team) = service.teams.first() {
                result.services.push(ServiceCompliance {
                    service_name: service.name.clone(),
                    team_name: team.summary.clone(),
                    compliant,
                });
            }
        }

        result
    }
}
