//! Metric families exported for the provider statistics.
//!
//! Every family lives in the `nsone` namespace. Its scope decides the labels:
//!
//! | scope   | labels                         |
//! |---------|--------------------------------|
//! | account | none                           |
//! | zone    | `zone`                         |
//! | record  | `zone`, `record`, `recordType` |

pub mod exposition;
pub mod point_store;

use api_types::RecordType;
use api_types::StatsPeriod;

pub use point_store::MetricPointStore;

pub const NAMESPACE: &str = "nsone";

/// Entity level a family is reported at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    Account,
    Zone,
    Record,
}

impl Scope {
    pub fn label_names(&self) -> &'static [&'static str] {
        match self {
            Scope::Account => &[],
            Scope::Zone => &["zone"],
            Scope::Record => &["zone", "record", "recordType"],
        }
    }

    fn name_part(&self) -> &'static str {
        match self {
            Scope::Account => "account",
            Scope::Zone => "zones",
            Scope::Record => "records",
        }
    }
}

/// One gauge family, e.g. `nsone_usage_zones_daily`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Family {
    Qps(Scope),
    Usage(Scope, StatsPeriod),
}

impl Family {
    pub fn scope(&self) -> Scope {
        match self {
            Family::Qps(scope) | Family::Usage(scope, _) => *scope,
        }
    }

    /// Name without the namespace prefix.
    pub fn name(&self) -> String {
        match self {
            Family::Qps(scope) => format!("qps_{}", scope.name_part()),
            Family::Usage(scope, period) => {
                format!("usage_{}_{}", scope.name_part(), period.metric_suffix())
            }
        }
    }

    pub fn help(&self) -> String {
        let subject = match self.scope() {
            Scope::Account => "the whole account",
            Scope::Zone => "all zones",
            Scope::Record => "all records",
        };
        match self {
            Family::Qps(_) => format!("Queries per second of {subject}."),
            Family::Usage(_, period) => {
                let window = match period {
                    StatsPeriod::Hourly => "hour",
                    StatsPeriod::Daily => "day",
                    StatsPeriod::Monthly => "month",
                };
                format!("Usage of {subject} by {window}.")
            }
        }
    }
}

/// Label values addressing one series of a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Series<'a> {
    Account,
    Zone(&'a str),
    Record {
        zone: &'a str,
        record: &'a str,
        record_type: RecordType,
    },
}

impl Series<'_> {
    pub fn scope(&self) -> Scope {
        match self {
            Series::Account => Scope::Account,
            Series::Zone(_) => Scope::Zone,
            Series::Record { .. } => Scope::Record,
        }
    }

    /// Values in the order of [`Scope::label_names`].
    pub fn label_values(&self) -> Vec<&str> {
        match *self {
            Series::Account => Vec::new(),
            Series::Zone(zone) => vec![zone],
            Series::Record {
                zone,
                record,
                record_type,
            } => vec![zone, record, record_type.as_str()],
        }
    }
}
