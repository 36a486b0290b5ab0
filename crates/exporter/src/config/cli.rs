use std::path::PathBuf;

use clap::Parser;
use utils::version;

use crate::config::filter::Filter;

/// Exports usage and queries-per-second statistics of NSONE DNS zones and
/// records as Prometheus metrics.
///
/// Filters are regular expressions matched against `account` (account
/// metrics), `<zoneName>` (zone metrics) or `<recordType> <recordName>`
/// (record metrics). `off`, `none`, `false` or an empty value disable the
/// category.
#[derive(Parser, Debug, Clone)]
#[command(name = "nsone-exporter", about, long_about, version = &**version::VERSION)]
pub struct Cli {
    #[arg(
        long,
        env = "NSONE_EXPORTER_LISTEN_ADDRESS",
        default_value = "0.0.0.0:9113",
        help = "Address to listen on for web interface and telemetry"
    )]
    pub listen_address: String,

    #[arg(
        long,
        env = "NSONE_EXPORTER_TELEMETRY_PATH",
        default_value = "/metrics",
        help = "Path under which to expose metrics"
    )]
    pub telemetry_path: String,

    #[arg(
        long,
        env = "NSONE_EXPORTER_LOG_DIR",
        value_hint = clap::ValueHint::DirPath,
        help = "Directory for daily rotated log files in addition to stderr"
    )]
    pub log_dir: Option<PathBuf>,

    #[arg(
        long,
        env = "NSONE_TOKEN",
        hide_env_values = true,
        help = "Token to access the API of NSONE"
    )]
    pub nsone_token: String,

    #[arg(
        long,
        env = "NSONE_API_URL",
        default_value = nsone_client::config::DEFAULT_API_URL,
        help = "Base url of the NSONE API"
    )]
    pub nsone_api_url: String,

    #[arg(
        long,
        env = "NSONE_TIMEOUT_MS",
        default_value_t = 5000,
        help = "Timeout in milliseconds of a single request to NSONE"
    )]
    pub nsone_timeout_ms: u64,

    #[arg(
        long,
        env = "NSONE_WORKERS",
        default_value_t = 50,
        help = "Parallel workers that retrieve details from NSONE"
    )]
    pub nsone_workers: usize,

    #[arg(
        long,
        env = "NSONE_QUEUE_SIZE",
        help = "Capacity of the task queue in front of the workers (defaults to the number of workers)"
    )]
    pub nsone_queue_size: Option<usize>,

    #[arg(
        long,
        env = "NSONE_CONNECTIONS",
        default_value_t = 50,
        help = "Number of concurrent connections to the NSONE API"
    )]
    pub nsone_connections: usize,

    #[arg(
        long,
        env = "EXPORT_USAGE_BY_HOUR_FILTER",
        default_value = "off",
        help = "Export hourly usage of matching account, zones and records (metric nsone_usage_<scope>_hourly)"
    )]
    pub export_usage_by_hour_filter: Filter,

    #[arg(
        long,
        env = "EXPORT_USAGE_BY_DAY_FILTER",
        default_value = "off",
        help = "Export daily usage of matching account, zones and records (metric nsone_usage_<scope>_daily)"
    )]
    pub export_usage_by_day_filter: Filter,

    #[arg(
        long,
        env = "EXPORT_USAGE_BY_MONTH_FILTER",
        default_value = ".*",
        help = "Export monthly usage of matching account, zones and records (metric nsone_usage_<scope>_monthly)"
    )]
    pub export_usage_by_month_filter: Filter,

    #[arg(
        long,
        env = "EXPORT_USAGE_OF_ACCOUNT",
        default_value_t = true,
        action = clap::ArgAction::Set,
        help = "Export usage of the whole account (metric nsone_usage_account_<period>)"
    )]
    pub export_usage_of_account: bool,

    #[arg(
        long,
        env = "EXPORT_USAGE_OF_ZONES_FILTER",
        default_value = ".*",
        help = "Export usage of matching zones (metric nsone_usage_zones_<period>)"
    )]
    pub export_usage_of_zones_filter: Filter,

    #[arg(
        long,
        env = "EXPORT_USAGE_OF_RECORDS_FILTER",
        default_value = ".*",
        help = "Export usage of records of matching zones and records (metric nsone_usage_records_<period>)"
    )]
    pub export_usage_of_records_filter: Filter,

    #[arg(
        long,
        env = "EXPORT_QPS_OF_ACCOUNT",
        default_value_t = false,
        action = clap::ArgAction::Set,
        help = "Export queries per second of the whole account (metric nsone_qps_account)"
    )]
    pub export_qps_of_account: bool,

    #[arg(
        long,
        env = "EXPORT_QPS_OF_ZONES_FILTER",
        default_value = "off",
        help = "Export queries per second of matching zones (metric nsone_qps_zones)"
    )]
    pub export_qps_of_zones_filter: Filter,

    #[arg(
        long,
        env = "EXPORT_QPS_OF_RECORDS_FILTER",
        default_value = "off",
        help = "Export queries per second of matching zones and records (metric nsone_qps_records)"
    )]
    pub export_qps_of_records_filter: Filter,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use similar_asserts::assert_eq;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_match_documented_values() {
        let cli = Cli::try_parse_from(["nsone-exporter", "--nsone-token", "abc"]).unwrap();

        assert_eq!(cli.listen_address, "0.0.0.0:9113");
        assert_eq!(cli.telemetry_path, "/metrics");
        assert_eq!(cli.nsone_timeout_ms, 5000);
        assert_eq!(cli.nsone_workers, 50);
        assert_eq!(cli.nsone_queue_size, None);
        assert_eq!(cli.nsone_connections, 50);
        assert!(!cli.export_usage_by_hour_filter.is_enabled());
        assert!(!cli.export_usage_by_day_filter.is_enabled());
        assert!(cli.export_usage_by_month_filter.matches("account"));
        assert!(cli.export_usage_of_account);
        assert!(cli.export_usage_of_zones_filter.is_enabled());
        assert!(cli.export_usage_of_records_filter.is_enabled());
        assert!(!cli.export_qps_of_account);
        assert!(!cli.export_qps_of_zones_filter.is_enabled());
        assert!(!cli.export_qps_of_records_filter.is_enabled());
    }

    #[test]
    fn invalid_filter_fails_argument_parsing() {
        let result = Cli::try_parse_from([
            "nsone-exporter",
            "--nsone-token",
            "abc",
            "--export-qps-of-zones-filter",
            "(broken",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn boolean_switches_take_explicit_values() {
        let cli = Cli::try_parse_from([
            "nsone-exporter",
            "--nsone-token",
            "abc",
            "--export-usage-of-account",
            "false",
            "--export-qps-of-account",
            "true",
        ])
        .unwrap();
        assert!(!cli.export_usage_of_account);
        assert!(cli.export_qps_of_account);
    }
}
