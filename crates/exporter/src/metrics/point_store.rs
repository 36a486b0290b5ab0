//! Gauge store holding the point-in-time snapshot of one collection cycle.

use std::collections::BTreeMap;
use std::sync::Mutex;

use error_stack::Report;
use prometheus::proto::MetricFamily;
use prometheus::Gauge;
use prometheus::GaugeVec;
use prometheus::Opts;
use prometheus::Registry;

use super::Family;
use super::Series;
use super::NAMESPACE;
use crate::error::CollectError;
use crate::error::CollectResult;

/// Gauge families of the enabled categories plus the `up` health gauge.
///
/// Families are registered once at construction; writing to a family that was
/// not registered is an error. Every write takes the store's write lock.
pub struct MetricPointStore {
    registry: Registry,
    families: BTreeMap<Family, GaugeVec>,
    up: Gauge,
    write: Mutex<()>,
}

impl MetricPointStore {
    pub fn new(families: impl IntoIterator<Item = Family>) -> CollectResult<Self> {
        let registry = Registry::new();

        let up = Gauge::with_opts(
            Opts::new("up", "Was the last collection from NSONE successful?").namespace(NAMESPACE),
        )
        .map_err(|err| registration_failed("up", err))?;
        registry
            .register(Box::new(up.clone()))
            .map_err(|err| registration_failed("up", err))?;

        let mut registered = BTreeMap::new();
        for family in families {
            if registered.contains_key(&family) {
                continue;
            }
            let name = family.name();
            let gauges = GaugeVec::new(
                Opts::new(name.clone(), family.help()).namespace(NAMESPACE),
                family.scope().label_names(),
            )
            .map_err(|err| registration_failed(&name, err))?;
            registry
                .register(Box::new(gauges.clone()))
                .map_err(|err| registration_failed(&name, err))?;
            registered.insert(family, gauges);
        }

        Ok(Self {
            registry,
            families: registered,
            up,
            write: Mutex::new(()),
        })
    }

    pub fn families(&self) -> impl Iterator<Item = Family> + '_ {
        self.families.keys().copied()
    }

    pub fn is_registered(&self, family: Family) -> bool {
        self.families.contains_key(&family)
    }

    /// Drops every series. The health gauge is kept.
    pub fn clear(&self) {
        let _write = self.write.lock().expect("poisoned");
        for gauges in self.families.values() {
            gauges.reset();
        }
    }

    pub fn set_point(&self, family: Family, series: Series<'_>, value: f64) -> CollectResult<()> {
        let _write = self.write.lock().expect("poisoned");

        let Some(gauges) = self.families.get(&family) else {
            return Err(Report::new(CollectError::UnregisteredFamily {
                name: family.name(),
            }));
        };
        if series.scope() != family.scope() {
            return Err(Report::new(CollectError::SeriesMismatch {
                name: family.name(),
            })
            .attach_printable(format!("series: {series:?}")));
        }

        let gauge = gauges
            .get_metric_with_label_values(&series.label_values())
            .map_err(|err| {
                Report::new(CollectError::SeriesMismatch {
                    name: family.name(),
                })
                .attach_printable(err.to_string())
            })?;
        gauge.set(value);
        Ok(())
    }

    pub fn set_up(&self, up: bool) {
        self.up.set(if up { 1.0 } else { 0.0 });
    }

    /// Families that currently hold at least one series, health gauge included.
    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry
            .gather()
            .into_iter()
            .filter(|family| !family.get_metric().is_empty())
            .collect()
    }

    /// Number of series written since the last [`clear`](Self::clear).
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Series values keyed by `name{label="value",..}`, health gauge excluded.
    pub fn snapshot(&self) -> BTreeMap<String, f64> {
        let up_name = format!("{NAMESPACE}_up");
        let mut points = BTreeMap::new();
        for family in self.gather() {
            if family.get_name() == up_name {
                continue;
            }
            for metric in family.get_metric() {
                let labels: Vec<_> = metric
                    .get_label()
                    .iter()
                    .map(|pair| format!("{}=\"{}\"", pair.get_name(), pair.get_value()))
                    .collect();
                let key = if labels.is_empty() {
                    family.get_name().to_string()
                } else {
                    format!("{}{{{}}}", family.get_name(), labels.join(","))
                };
                points.insert(key, metric.get_gauge().get_value());
            }
        }
        points
    }
}

fn registration_failed(name: &str, err: prometheus::Error) -> Report<CollectError> {
    Report::new(CollectError::Registration {
        name: name.to_string(),
    })
    .attach_printable(err.to_string())
}
