use std::time::Duration;

use api_types::StatsPeriod;
use error_stack::Report;
use nsone_client::ClientConfig;

use crate::config::cli::Cli;
use crate::config::filter::Filter;
use crate::error::ConfigError;
use crate::metrics::Family;
use crate::metrics::Scope;

/// Which metric categories are collected, and for which entities.
#[derive(Debug, Clone, Default)]
pub struct ExportSettings {
    pub usage_by_hour: Filter,
    pub usage_by_day: Filter,
    pub usage_by_month: Filter,

    pub usage_of_account: bool,
    pub usage_of_zones: Filter,
    pub usage_of_records: Filter,

    pub qps_of_account: bool,
    pub qps_of_zones: Filter,
    pub qps_of_records: Filter,
}

impl ExportSettings {
    pub fn period_filter(&self, period: StatsPeriod) -> &Filter {
        match period {
            StatsPeriod::Hourly => &self.usage_by_hour,
            StatsPeriod::Daily => &self.usage_by_day,
            StatsPeriod::Monthly => &self.usage_by_month,
        }
    }

    pub fn enabled_periods(&self) -> impl Iterator<Item = StatsPeriod> + '_ {
        StatsPeriod::ALL
            .iter()
            .copied()
            .filter(|period| self.period_filter(*period).is_enabled())
    }

    /// Gauge families to register for the enabled categories.
    pub fn families(&self) -> Vec<Family> {
        let mut families = Vec::new();
        if self.qps_of_account {
            families.push(Family::Qps(Scope::Account));
        }
        if self.qps_of_zones.is_enabled() {
            families.push(Family::Qps(Scope::Zone));
        }
        if self.qps_of_records.is_enabled() {
            families.push(Family::Qps(Scope::Record));
        }

        let usage_scopes = [
            (self.usage_of_account, Scope::Account),
            (self.usage_of_zones.is_enabled(), Scope::Zone),
            (self.usage_of_records.is_enabled(), Scope::Record),
        ];
        for (enabled, scope) in usage_scopes {
            if enabled {
                families.extend(self.enabled_periods().map(|period| Family::Usage(scope, period)));
            }
        }
        families
    }
}

impl From<&Cli> for ExportSettings {
    fn from(cli: &Cli) -> Self {
        Self {
            usage_by_hour: cli.export_usage_by_hour_filter.clone(),
            usage_by_day: cli.export_usage_by_day_filter.clone(),
            usage_by_month: cli.export_usage_by_month_filter.clone(),
            usage_of_account: cli.export_usage_of_account,
            usage_of_zones: cli.export_usage_of_zones_filter.clone(),
            usage_of_records: cli.export_usage_of_records_filter.clone(),
            qps_of_account: cli.export_qps_of_account,
            qps_of_zones: cli.export_qps_of_zones_filter.clone(),
            qps_of_records: cli.export_qps_of_records_filter.clone(),
        }
    }
}

impl From<&Cli> for ClientConfig {
    fn from(cli: &Cli) -> Self {
        ClientConfig::new(cli.nsone_token.trim())
            .with_api_url(cli.nsone_api_url.clone())
            .with_request_timeout(Duration::from_millis(cli.nsone_timeout_ms))
            .with_max_connections(cli.nsone_connections)
    }
}

/// Sizing of the worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub workers: usize,
    pub queue_capacity: usize,
}

impl From<&Cli> for PoolSettings {
    fn from(cli: &Cli) -> Self {
        Self {
            workers: cli.nsone_workers,
            queue_capacity: cli.nsone_queue_size.unwrap_or(cli.nsone_workers),
        }
    }
}

impl Cli {
    /// Semantic checks that argument parsing cannot express.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Missing`] for a blank token or listen address
    /// - [`ConfigError::Invalid`] for unusable sizes, timeouts or paths
    pub fn validate(&self) -> Result<(), Report<ConfigError>> {
        if self.listen_address.trim().is_empty() {
            return Err(Report::new(ConfigError::Missing {
                flag: "--listen-address",
            }));
        }
        if self.nsone_token.trim().is_empty() {
            return Err(Report::new(ConfigError::Missing {
                flag: "--nsone-token",
            }));
        }
        if !self.telemetry_path.starts_with('/') || self.telemetry_path == "/" {
            return Err(Report::new(ConfigError::Invalid {
                flag: "--telemetry-path",
                reason: format!(
                    "`{}` must start with `/` and must not be the landing page",
                    self.telemetry_path
                ),
            }));
        }
        let sizes = [
            ("--nsone-workers", Some(self.nsone_workers)),
            ("--nsone-queue-size", self.nsone_queue_size),
            ("--nsone-connections", Some(self.nsone_connections)),
        ];
        for (flag, size) in sizes {
            if size == Some(0) {
                return Err(Report::new(ConfigError::Invalid {
                    flag,
                    reason: "must be at least 1".into(),
                }));
            }
        }
        if self.nsone_timeout_ms == 0 {
            return Err(Report::new(ConfigError::Invalid {
                flag: "--nsone-timeout-ms",
                reason: "must be at least 1".into(),
            }));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use similar_asserts::assert_eq;

    use super::*;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["nsone-exporter"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn default_families_cover_monthly_usage_only() {
        let settings = ExportSettings::from(&cli(&["--nsone-token", "abc"]));
        let names: Vec<_> = settings.families().iter().map(Family::name).collect();
        assert_eq!(names, vec![
            "usage_account_monthly",
            "usage_zones_monthly",
            "usage_records_monthly"
        ]);
    }

    #[test]
    fn qps_families_follow_switches() {
        let settings = ExportSettings::from(&cli(&[
            "--nsone-token",
            "abc",
            "--export-usage-by-month-filter",
            "off",
            "--export-qps-of-account",
            "true",
            "--export-qps-of-records-filter",
            ".*",
        ]));
        let names: Vec<_> = settings.families().iter().map(Family::name).collect();
        assert_eq!(names, vec!["qps_account", "qps_records"]);
        assert_eq!(settings.enabled_periods().count(), 0);
    }

    #[test]
    fn queue_capacity_defaults_to_worker_count() {
        let pool = PoolSettings::from(&cli(&["--nsone-token", "abc", "--nsone-workers", "7"]));
        assert_eq!(pool, PoolSettings {
            workers: 7,
            queue_capacity: 7
        });
    }

    #[test]
    fn validation_rejects_blank_token_and_bad_sizes() {
        let report = cli(&["--nsone-token", "  "]).validate().unwrap_err();
        assert!(matches!(
            report.current_context(),
            ConfigError::Missing {
                flag: "--nsone-token"
            }
        ));

        let report = cli(&["--nsone-token", "abc", "--nsone-workers", "0"])
            .validate()
            .unwrap_err();
        assert!(matches!(
            report.current_context(),
            ConfigError::Invalid {
                flag: "--nsone-workers",
                ..
            }
        ));

        let report = cli(&["--nsone-token", "abc", "--telemetry-path", "metrics"])
            .validate()
            .unwrap_err();
        assert!(matches!(
            report.current_context(),
            ConfigError::Invalid {
                flag: "--telemetry-path",
                ..
            }
        ));

        assert!(cli(&["--nsone-token", "abc"]).validate().is_ok());
    }

    #[test]
    fn client_config_carries_connection_settings() {
        let config = ClientConfig::from(&cli(&[
            "--nsone-token",
            " abc ",
            "--nsone-timeout-ms",
            "750",
            "--nsone-connections",
            "4",
        ]));
        assert_eq!(config.api_key, "abc");
        assert_eq!(config.request_timeout, Duration::from_millis(750));
        assert_eq!(config.max_connections, 4);
    }
}
