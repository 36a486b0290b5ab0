//! Resource addresses of the provider API.

use api_types::RecordType;
use api_types::StatsPeriod;
use error_stack::Report;
use error_stack::ResultExt;
use url::Url;

use crate::error::ClientError;
use crate::error::ClientResult;

/// What a request is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    Account,
    Zone(&'a str),
    Record {
        zone: &'a str,
        record: &'a str,
        record_type: RecordType,
    },
}

impl Target<'_> {
    fn segments(&self) -> ClientResult<Vec<&str>> {
        match *self {
            Target::Account => Ok(Vec::new()),
            Target::Zone(zone) => {
                require_zone(zone)?;
                Ok(vec![zone])
            }
            Target::Record {
                zone,
                record,
                record_type,
            } => {
                require_zone(zone)?;
                if record.is_empty() {
                    return Err(invalid("a record type needs a record"));
                }
                if record_type == RecordType::None {
                    return Err(invalid("a record needs a record type"));
                }
                Ok(vec![zone, record, record_type.as_str()])
            }
        }
    }
}

fn require_zone(zone: &str) -> ClientResult<()> {
    if zone.is_empty() {
        Err(invalid("a record or record type needs a zone"))
    } else {
        Ok(())
    }
}

fn invalid(message: &str) -> Report<ClientError> {
    Report::new(ClientError::InvalidRequest {
        message: message.to_string(),
    })
}

/// Builds URLs below the API root.
#[derive(Debug, Clone)]
pub struct Endpoints {
    root: Url,
}

impl Endpoints {
    pub fn new(api_url: &str) -> ClientResult<Self> {
        let root = Url::parse(api_url).change_context(ClientError::Configuration {
            message: format!("Invalid API url `{api_url}`"),
        })?;
        if root.cannot_be_a_base() {
            return Err(Report::new(ClientError::Configuration {
                message: format!("API url `{api_url}` cannot be a base"),
            }));
        }
        Ok(Self { root })
    }

    /// `/zones[/{zone}[/{record}/{type}]]`
    pub fn zones(&self, target: Target<'_>) -> ClientResult<Url> {
        self.build("zones", None, target)
    }

    /// `/stats/usage[/{zone}[/{record}/{type}]]?period=..&expand=..`
    pub fn usage(&self, target: Target<'_>, period: StatsPeriod, expand: bool) -> ClientResult<Url> {
        self.build("stats/usage", Some((period, expand)), target)
    }

    /// `/stats/qps[/{zone}[/{record}/{type}]]`
    pub fn qps(&self, target: Target<'_>) -> ClientResult<Url> {
        self.build("stats/qps", None, target)
    }

    fn build(
        &self,
        resource: &str,
        usage_query: Option<(StatsPeriod, bool)>,
        target: Target<'_>,
    ) -> ClientResult<Url> {
        let segments = target
            .segments()
            .attach_printable_lazy(|| format!("resource: {resource}"))?;

        let mut url = self.root.clone();
        url.path_segments_mut()
            .map_err(|()| {
                Report::new(ClientError::Configuration {
                    message: "API url cannot be a base".into(),
                })
            })?
            .pop_if_empty()
            .extend(resource.split('/'))
            .extend(segments);

        if let Some((period, expand)) = usage_query {
            url.query_pairs_mut()
                .append_pair("period", period.as_str())
                .append_pair("expand", if expand { "true" } else { "false" });
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    fn endpoints() -> Endpoints {
        Endpoints::new("https://api.nsone.net/v1").unwrap()
    }

    #[test]
    fn builds_account_zone_and_record_addresses() {
        let endpoints = endpoints();

        assert_eq!(
            endpoints.zones(Target::Account).unwrap().as_str(),
            "https://api.nsone.net/v1/zones"
        );
        assert_eq!(
            endpoints.qps(Target::Zone("example.com")).unwrap().as_str(),
            "https://api.nsone.net/v1/stats/qps/example.com"
        );
        assert_eq!(
            endpoints
                .qps(Target::Record {
                    zone: "example.com",
                    record: "www.example.com",
                    record_type: RecordType::Aaaa,
                })
                .unwrap()
                .as_str(),
            "https://api.nsone.net/v1/stats/qps/example.com/www.example.com/AAAA"
        );
    }

    #[test]
    fn usage_carries_period_and_expand() {
        let url = endpoints()
            .usage(Target::Account, StatsPeriod::Daily, true)
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.nsone.net/v1/stats/usage?period=24h&expand=true"
        );

        let url = endpoints()
            .usage(Target::Zone("example.com"), StatsPeriod::Hourly, false)
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.nsone.net/v1/stats/usage/example.com?period=1h&expand=false"
        );
    }

    #[test]
    fn trailing_slash_in_root_is_tolerated() {
        let endpoints = Endpoints::new("http://127.0.0.1:8080/v1/").unwrap();
        assert_eq!(
            endpoints.zones(Target::Account).unwrap().as_str(),
            "http://127.0.0.1:8080/v1/zones"
        );
    }

    #[test]
    fn rejects_incomplete_targets() {
        let endpoints = endpoints();
        let cases = [
            Target::Zone(""),
            Target::Record {
                zone: "",
                record: "www.example.com",
                record_type: RecordType::A,
            },
            Target::Record {
                zone: "example.com",
                record: "www.example.com",
                record_type: RecordType::None,
            },
            Target::Record {
                zone: "example.com",
                record: "",
                record_type: RecordType::A,
            },
        ];

        for target in cases {
            let report = endpoints.qps(target).unwrap_err();
            assert!(
                matches!(report.current_context(), ClientError::InvalidRequest { .. }),
                "{target:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_unusable_roots() {
        assert!(Endpoints::new("not a url").is_err());
        assert!(Endpoints::new("mailto:ops@example.com").is_err());
    }
}
