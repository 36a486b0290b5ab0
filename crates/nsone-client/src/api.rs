//! Typed statistics API on top of [`RetryingClient`].

use std::sync::Arc;

use api_types::QpsStat;
use api_types::RecordType;
use api_types::StatsPeriod;
use api_types::Usage;
use api_types::Zone;
use error_stack::Report;
use serde::de::DeserializeOwned;
use tracing::info;
use url::Url;

use crate::client::Lookup;
use crate::client::RetryingClient;
use crate::endpoints::Endpoints;
use crate::endpoints::Target;
use crate::error::ClientError;
use crate::error::ClientResult;
use crate::limiter::ConnectionLimiter;
use crate::transport::HttpTransport;
use crate::transport::Transport;
use crate::ClientConfig;

/// Statistics queries the exporter issues against the provider.
pub trait StatsApi: Send + Sync {
    /// All zones of the account, without their records.
    fn zones(&self) -> ClientResult<Vec<Zone>>;

    /// Zone details including records; `NotFound` if the zone vanished.
    fn zone(&self, zone: &str) -> ClientResult<Lookup<Zone>>;

    /// Account-wide usage; the provider must answer with exactly one entry.
    fn account_usage(&self, period: StatsPeriod) -> ClientResult<Usage>;

    /// Usage of every zone, one entry per zone.
    fn zones_usage(&self, period: StatsPeriod) -> ClientResult<Vec<Usage>>;

    /// Usage of every record of `zone`, one entry per record.
    fn records_usage(&self, zone: &str, period: StatsPeriod) -> ClientResult<Vec<Usage>>;

    fn account_qps(&self) -> ClientResult<f64>;

    fn zone_qps(&self, zone: &str) -> ClientResult<f64>;

    fn record_qps(&self, zone: &str, record: &str, record_type: RecordType) -> ClientResult<f64>;
}

/// [`StatsApi`] backed by the provider's REST API.
pub struct NsoneClient<T = HttpTransport> {
    endpoints: Endpoints,
    client: RetryingClient<T>,
}

impl NsoneClient<HttpTransport> {
    /// Must not be called from within an async runtime.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let transport = HttpTransport::new(config)?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> NsoneClient<T> {
    pub fn with_transport(config: &ClientConfig, transport: T) -> ClientResult<Self> {
        let endpoints = Endpoints::new(&config.api_url)?;
        let limiter = Arc::new(ConnectionLimiter::new(config.max_connections));
        info!(
            api_url = %config.api_url,
            max_connections = limiter.max_concurrent(),
            timeout = ?config.request_timeout,
            "NSONE client created"
        );
        Ok(Self {
            endpoints,
            client: RetryingClient::new(transport, limiter, config.retry.clone()),
        })
    }

    pub fn limiter(&self) -> &Arc<ConnectionLimiter> {
        self.client.limiter()
    }

    fn get<P: DeserializeOwned>(&self, url: &Url) -> ClientResult<P> {
        self.client.call(url)?.required(url)
    }
}

impl<T: Transport> StatsApi for NsoneClient<T> {
    fn zones(&self) -> ClientResult<Vec<Zone>> {
        self.get(&self.endpoints.zones(Target::Account)?)
    }

    fn zone(&self, zone: &str) -> ClientResult<Lookup<Zone>> {
        self.client.call(&self.endpoints.zones(Target::Zone(zone))?)
    }

    fn account_usage(&self, period: StatsPeriod) -> ClientResult<Usage> {
        let url = self.endpoints.usage(Target::Account, period, false)?;
        let mut usages: Vec<Usage> = self.get(&url)?;
        if usages.len() != 1 {
            return Err(Report::new(ClientError::UnexpectedPayload {
                message: format!(
                    "expected exactly one account usage entry but got {}",
                    usages.len()
                ),
            })
            .attach_printable(format!("url: {url}")));
        }
        Ok(usages.remove(0))
    }

    fn zones_usage(&self, period: StatsPeriod) -> ClientResult<Vec<Usage>> {
        self.get(&self.endpoints.usage(Target::Account, period, true)?)
    }

    fn records_usage(&self, zone: &str, period: StatsPeriod) -> ClientResult<Vec<Usage>> {
        self.get(&self.endpoints.usage(Target::Zone(zone), period, true)?)
    }

    fn account_qps(&self) -> ClientResult<f64> {
        let stat: QpsStat = self.get(&self.endpoints.qps(Target::Account)?)?;
        Ok(stat.qps)
    }

    fn zone_qps(&self, zone: &str) -> ClientResult<f64> {
        let stat: QpsStat = self.get(&self.endpoints.qps(Target::Zone(zone))?)?;
        Ok(stat.qps)
    }

    fn record_qps(&self, zone: &str, record: &str, record_type: RecordType) -> ClientResult<f64> {
        let target = Target::Record {
            zone,
            record,
            record_type,
        };
        let stat: QpsStat = self.get(&self.endpoints.qps(target)?)?;
        Ok(stat.qps)
    }
}
