//! Shared API type definitions
//!
//! This crate contains the payload shapes returned by the NSONE REST API
//! (`https://api.nsone.net/v1`) that the exporter consumes: zones, records,
//! usage statistics and queries-per-second statistics.
//!
//! Only the identity fields (names, record types, links) and the numeric
//! fields (query counts, qps) are interpreted by the exporter; everything else
//! is carried along for completeness and defaults when absent.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

/// A DNS zone as returned by `GET /zones` and `GET /zones/{zone}`.
///
/// The zone listing omits `records`; they are only populated by the detail
/// endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Zone {
    /// Zone name, e.g. `example.com`
    #[serde(rename = "zone", deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub serial: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub ttl: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub nx_ttl: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub retry: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub refresh: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub expiry: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub hostmaster: String,
    #[serde(deserialize_with = "null_as_default")]
    pub pool: String,
    #[serde(deserialize_with = "null_as_default")]
    pub network_pools: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub dns_servers: Vec<String>,
    /// Records of this zone (detail endpoint only)
    #[serde(deserialize_with = "null_as_default")]
    pub records: Vec<Record>,
    /// Name of the zone this zone is linked to, if it is an alias
    #[serde(deserialize_with = "null_as_default")]
    pub link: Option<String>,
}

impl Zone {
    /// Whether this zone is an alias of another zone.
    pub fn is_linked(&self) -> bool {
        self.link.as_deref().is_some_and(|link| !link.is_empty())
    }
}

/// A DNS record summary embedded in a zone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Record {
    /// Fully qualified record name
    #[serde(rename = "domain", deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub record_type: RecordType,
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub short_answers: Vec<String>,
    /// Name of the record this record is linked to, if it is an alias
    #[serde(deserialize_with = "null_as_default")]
    pub link: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub ttl: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub tier: i64,
}

impl Record {
    /// Whether this record is an alias of another record.
    pub fn is_linked(&self) -> bool {
        self.link.as_deref().is_some_and(|link| !link.is_empty())
    }

    /// Subject used for record filters: `"<TYPE> <name>"`.
    pub fn filter_subject(&self) -> String {
        format!("{} {}", self.record_type, self.name)
    }
}

/// Usage statistics for the account, a zone or a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Usage {
    #[serde(deserialize_with = "null_as_default")]
    pub zone: String,
    #[serde(deserialize_with = "null_as_default")]
    pub domain: String,
    #[serde(rename = "rectype", deserialize_with = "null_as_default")]
    pub record_type: RecordType,
    #[serde(deserialize_with = "null_as_default")]
    pub queries: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub period: Option<StatsPeriod>,
    #[serde(deserialize_with = "null_as_default")]
    pub graph: Vec<Vec<f64>>,
    #[serde(deserialize_with = "null_as_default")]
    pub records: f64,
}

impl Usage {
    /// Subject used for record filters: `"<TYPE> <domain>"`.
    pub fn filter_subject(&self) -> String {
        format!("{} {}", self.record_type, self.domain)
    }
}

/// Queries per second of the account, a zone or a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QpsStat {
    #[serde(deserialize_with = "null_as_default")]
    pub qps: f64,
}

/// Error returned when parsing an unknown record type or period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    kind: &'static str,
    value: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Illegal {}: {:?}", self.kind, self.value)
    }
}

impl std::error::Error for ParseError {}

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:literal, $normalize:ident) {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// All variants in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire representation of this value.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let normalized = value.trim().$normalize();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|candidate| candidate.as_str() == normalized)
                    .ok_or_else(|| ParseError {
                        kind: $kind,
                        value: value.to_string(),
                    })
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
                value.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

string_enum! {
    /// DNS record types known to the provider. `None` stands for "no type",
    /// which is what account and zone level statistics carry.
    RecordType("record type", to_uppercase) {
        None => "",
        A => "A",
        Aaaa => "AAAA",
        Alias => "ALIAS",
        Afsdb => "AFSDB",
        Any => "ANY",
        Cname => "CNAME",
        Dname => "DNAME",
        Hinfo => "HINFO",
        Ebot => "EBOT",
        Linked => "LINKED",
        Mx => "MX",
        Naptr => "NAPTR",
        Nxdomain => "NXDOMAIN",
        Ns => "NS",
        Ptr => "PTR",
        Rp => "RP",
        Spf => "SPF",
        Srv => "SRV",
        Soa => "SOA",
        Txt => "TXT",
    }
}

impl Default for RecordType {
    fn default() -> Self {
        RecordType::None
    }
}

string_enum! {
    /// Aggregation window of usage statistics.
    StatsPeriod("period", to_lowercase) {
        Hourly => "1h",
        Daily => "24h",
        Monthly => "30d",
    }
}

impl StatsPeriod {
    /// Suffix used in metric names, e.g. `usage_zones_hourly`.
    pub fn metric_suffix(&self) -> &'static str {
        match self {
            StatsPeriod::Hourly => "hourly",
            StatsPeriod::Daily => "daily",
            StatsPeriod::Monthly => "monthly",
        }
    }
}

/// The provider sends `null` for absent values of any type.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
