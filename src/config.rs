//! Configuration management for the exporter

use clap::{ArgAction, Parser};
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_URL: &str = "https://api.pagerduty.com";
pub const DEFAULT_COMPLIANCE_PATTERN: &str = "_SVC+";

/// Routes served next to the metrics path
const RESERVED_PATHS: [&str; 2] = ["/", "/health"];

/// Command line flags, each with an environment fallback
#[derive(Debug, Clone, Parser)]
#[command(name = "pd_exporter", version, about = "PagerDuty metrics exporter for Prometheus")]
pub struct Cli {
    /// Address to listen on for web server
    #[arg(long = "web.listen-address", env = "WEB_LISTEN_ADDRESS", default_value = "0.0.0.0:9696")]
    pub listen_address: String,

    /// Path where to expose metrics
    #[arg(long = "web.telemetry-path", env = "WEB_TELEMETRY_PATH", default_value = "/metrics")]
    pub metrics_path: String,

    /// PagerDuty analytics collector on/off
    #[arg(long = "pd.analytics_settings", env = "PD_ANALYTICS_SETTINGS", default_value_t = true, action = ArgAction::Set)]
    pub analytics: bool,

    /// PagerDuty services collector on/off
    #[arg(long = "pd.service_settings", env = "PD_SERVICES_SETTINGS", default_value_t = true, action = ArgAction::Set)]
    pub services: bool,

    /// PagerDuty teams collector on/off
    #[arg(long = "pd.teams_settings", env = "PD_TEAMS_SETTINGS", default_value_t = true, action = ArgAction::Set)]
    pub teams: bool,

    /// PagerDuty users collector on/off
    #[arg(long = "pd.users_settings", env = "PD_USERS_SETTINGS", default_value_t = true, action = ArgAction::Set)]
    pub users: bool,

    /// Base URL of the PagerDuty REST API
    #[arg(long = "pd.api-url", env = "PD_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Regular expression a compliant service name must match
    #[arg(long = "pd.compliance-pattern", env = "PD_COMPLIANCE_PATTERN", default_value = DEFAULT_COMPLIANCE_PATTERN)]
    pub compliance_pattern: String,

    /// PagerDuty API token
    #[arg(long = "pd.auth-token", env = "AUTH_TOKEN", hide_env_values = true, default_value = "")]
    pub auth_token: String,
}

/// Which sections a scrape collects and emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorToggles {
    pub services: bool,
    pub analytics: bool,
    pub users: bool,
    pub teams: bool,
}

impl Default for CollectorToggles {
    fn default() -> Self {
        Self {
            services: true,
            analytics: true,
            users: true,
            teams: true,
        }
    }
}

impl CollectorToggles {
    /// Service records are needed for both the service gauges and analytics
    pub fn needs_services(&self) -> bool {
        self.services || self.analytics
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Socket address the exposition server binds to
    pub listen_address: String,

    /// HTTP path serving the metrics
    pub metrics_path: String,

    /// Base URL of the upstream API
    pub api_url: String,

    /// Static bearer token sent as `Token token=<value>`
    #[serde(skip_serializing)]
    pub auth_token: String,

    /// Naming-convention pattern for compliant services
    pub compliance_pattern: String,

    pub collectors: CollectorToggles,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0:9696".to_string(),
            metrics_path: "/metrics".to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            auth_token: String::new(),
            compliance_pattern: DEFAULT_COMPLIANCE_PATTERN.to_string(),
            collectors: CollectorToggles::default(),
        }
    }
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Self {
            listen_address: cli.listen_address,
            metrics_path: cli.metrics_path,
            api_url: cli.api_url.trim_end_matches('/').to_string(),
            auth_token: cli.auth_token,
            compliance_pattern: cli.compliance_pattern,
            collectors: CollectorToggles {
                services: cli.services,
                analytics: cli.analytics,
                users: cli.users,
                teams: cli.teams,
            },
        }
    }
}

impl Config {
    /// Parse flags and environment into a configuration
    pub fn from_args() -> Self {
        Cli::parse().into()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.auth_token.is_empty() {
            return Err("AUTH_TOKEN must be set".to_string());
        }

        if self.api_url.is_empty() {
            return Err("api_url cannot be empty".to_string());
        }

        if !self.metrics_path.starts_with('/') {
            return Err(format!("metrics_path must start with '/': {}", self.metrics_path));
        }

        if RESERVED_PATHS.contains(&self.metrics_path.as_str()) {
            return Err(format!("metrics_path collides with a built-in route: {}", self.metrics_path));
        }

        if self.listen_address.is_empty() {
            return Err("listen_address cannot be empty".to_string());
        }

        if let Err(e) = Regex::new(&self.compliance_pattern) {
            return Err(format!("invalid compliance pattern: {}", e));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["pd_exporter"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap().into()
    }

    #[test]
    fn test_flag_overrides() {
        let config = parse(&[
            "--web.listen-address",
            "127.0.0.1:9100",
            "--web.telemetry-path",
            "/pd",
            "--pd.users_settings",
            "false",
            "--pd.api-url",
            "http://localhost:8080/",
            "--pd.auth-token",
            "secret",
        ]);

        assert_eq!(config.listen_address, "127.0.0.1:9100");
        assert_eq!(config.metrics_path, "/pd");
        assert_eq!(config.api_url, "http://localhost:8080");
        assert!(!config.collectors.users);
        assert!(config.collectors.teams);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_collector_toggle_flags() {
        let config = parse(&[
            "--pd.analytics_settings",
            "false",
            "--pd.service_settings",
            "false",
            "--pd.teams_settings",
            "false",
            "--pd.users_settings",
            "true",
        ]);

        assert_eq!(
            config.collectors,
            CollectorToggles {
                services: false,
                analytics: false,
                users: true,
                teams: false,
            }
        );

        assert!(Cli::try_parse_from(["pd_exporter", "--pd.teams-settings", "false"]).is_err());
    }

    #[test]
    fn test_validation_rejects_reserved_metrics_path() {
        let mut config = Config {
            auth_token: "secret".to_string(),
            ..Config::default()
        };

        for path in ["/", "/health"] {
            config.metrics_path = path.to_string();
            assert!(config.validate().unwrap_err().contains("built-in route"));
        }

        config.metrics_path = "/healthz".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_missing_token() {
        let config = Config::default();
        assert!(config.validate().unwrap_err().contains("AUTH_TOKEN"));
    }

    #[test]
    fn test_validation_rejects_bad_pattern_and_path() {
        let mut config = Config {
            auth_token: "secret".to_string(),
            ..Config::default()
        };
        config.compliance_pattern = "_SVC(".to_string();
        assert!(config.validate().is_err());

        config.compliance_pattern = DEFAULT_COMPLIANCE_PATTERN.to_string();
        config.metrics_path = "metrics".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_analytics_needs_services() {
        let toggles = CollectorToggles {
            services: false,
            analytics: true,
            users: false,
            teams: false,
        };
        assert!(toggles.needs_services());

        let toggles = CollectorToggles {
            analytics: false,
            ..toggles
        };
        assert!(!toggles.needs_services());
    }
}
