//! Upstream API records and request payloads

use crate::errors::Result;
use serde::{Deserialize, Serialize};

/// Reference to a team as embedded in a service record
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TeamReference {
    pub id: String,
    #[serde(default)]
    pub summary: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub teams: Vec<TeamReference>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Team {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BusinessService {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// One page of a listing endpoint, items still undecoded
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListPage {
    pub items: Vec<serde_json::Value>,
    pub more: bool,
}

impl ListPage {
    /// Split a listing envelope into the items under `key` and the `more` flag.
    ///
    /// Fails when `key` is missing or does not hold an array.
    pub fn from_envelope(mut envelope: serde_json::Value, key: &str) -> Result<Self> {
        let collection = envelope
            .get_mut(key)
            .map(serde_json::Value::take)
            .unwrap_or_default();
        let items: Vec<serde_json::Value> = serde_json::from_value(collection)?;
        let more = envelope["more"].as_bool().unwrap_or(false);

        Ok(Self { items, more })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AnalyticsFilters {
    pub created_at_start: String,
    pub created_at_end: String,
    pub service_ids: Vec<String>,
}

/// Body of the aggregate incident analytics request
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AnalyticsRequest {
    pub filters: AnalyticsFilters,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AnalyticsData {
    pub service_name: String,
    #[serde(default)]
    pub mean_seconds_to_first_ack: Option<f64>,
    #[serde(default)]
    pub mean_seconds_to_resolve: Option<f64>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalyticsResponse {
    #[serde(default)]
    pub data: Vec<AnalyticsData>,
}
