use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use api_types::StatsPeriod;
use api_types::Zone;
use error_stack::Report;
use error_stack::ResultExt;
use nsone_client::Lookup;
use nsone_client::StatsApi;
use prometheus::proto::MetricFamily;
use tracing::debug;
use tracing::error;
use tracing::info;
use utils::worker_pool::FailedTasks;
use utils::worker_pool::PendingTasks;
use utils::worker_pool::TaskFailure;
use utils::worker_pool::WorkerPool;

use crate::config::ExportSettings;
use crate::error::CollectError;
use crate::error::CollectResult;
use crate::metrics::exposition;
use crate::metrics::Family;
use crate::metrics::MetricPointStore;
use crate::metrics::Scope;
use crate::metrics::Series;

/// Worker pool running collection tasks.
pub type TaskPool = WorkerPool<Report<CollectError>>;

type Pending = PendingTasks<Report<CollectError>>;

/// Outcome of one collection cycle.
#[derive(Debug)]
pub struct CycleReport {
    /// metric tasks submitted, zone expansions excluded
    pub tasks_submitted: usize,
    pub duration: Duration,
    /// families exposed for this cycle, gathered before the cycle lock is released
    pub snapshot: Vec<MetricFamily>,
    pub outcome: CollectResult<()>,
}

impl CycleReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Runs collection cycles against a [`StatsApi`], one at a time.
pub struct Orchestrator {
    api: Arc<dyn StatsApi>,
    pool: Arc<TaskPool>,
    store: Arc<MetricPointStore>,
    settings: Arc<ExportSettings>,
    cycle: Mutex<()>,
}

impl Orchestrator {
    /// Registers the gauge families of the enabled categories.
    pub fn new(
        api: Arc<dyn StatsApi>,
        pool: Arc<TaskPool>,
        settings: ExportSettings,
    ) -> CollectResult<Self> {
        let store = MetricPointStore::new(settings.families())?;
        info!(
            families = ?store.families().map(|family| family.name()).collect::<Vec<_>>(),
            "Metric families registered"
        );
        Ok(Self {
            api,
            pool,
            store: Arc::new(store),
            settings: Arc::new(settings),
            cycle: Mutex::new(()),
        })
    }

    pub fn store(&self) -> &Arc<MetricPointStore> {
        &self.store
    }

    pub fn pool(&self) -> &Arc<TaskPool> {
        &self.pool
    }

    /// Runs one cycle and renders its snapshot in the text exposition format.
    pub fn scrape(&self) -> CollectResult<String> {
        let report = self.run_cycle();
        exposition::encode(&report.snapshot)
    }

    /// Runs one complete cycle. Blocks while another cycle is running.
    ///
    /// The store is cleared first. On success the health gauge is set to 1
    /// and every written series is exposed; on any failure the store is
    /// cleared again and only the health gauge (0) is exposed.
    pub fn run_cycle(&self) -> CycleReport {
        let _cycle = self.cycle.lock().expect("poisoned");
        let start = Instant::now();
        info!("Collecting...");

        self.store.clear();
        let mut pending = Pending::new();
        let outcome = self.collect(&mut pending);
        let duration = start.elapsed();

        match &outcome {
            Ok(()) => {
                self.store.set_up(true);
                info!(
                    tasks = pending.len(),
                    series = self.store.len(),
                    ?duration,
                    "Collecting... DONE"
                );
            }
            Err(report) => {
                self.store.clear();
                self.store.set_up(false);
                error!(
                    tasks = pending.len(),
                    ?duration,
                    "Collecting... FAILED: {report:?}"
                );
            }
        }

        CycleReport {
            tasks_submitted: pending.len(),
            duration,
            snapshot: self.store.gather(),
            outcome,
        }
    }

    fn collect(&self, pending: &mut Pending) -> CollectResult<()> {
        let zones = self.api.zones().change_context(CollectError::ZoneListing)?;
        let zones = if self.settings.qps_of_records.is_enabled() {
            self.expand_zones(zones)?
        } else {
            zones
        };
        info!(zones = zones.len(), "Found active zones");

        // every submitted task must finish before the outcome is decided
        let submitted = self.submit_all(&zones, pending);
        debug!(tasks = pending.len(), "Tasks enqueued");
        let finished = pending.wait_all().map_err(failed_tasks_report);

        submitted?;
        finished
    }

    /// Fetches the records of every non-linked zone. Zones that vanished since
    /// listing are dropped.
    fn expand_zones(&self, zones: Vec<Zone>) -> CollectResult<Vec<Zone>> {
        let slots: Arc<Mutex<Vec<Option<Zone>>>> =
            Arc::new(Mutex::new(zones.iter().map(|_| None).collect()));
        let mut expansions = Pending::new();

        let mut submitted = Ok(());
        for (index, zone) in zones.iter().enumerate() {
            if zone.is_linked() {
                continue;
            }
            let api = Arc::clone(&self.api);
            let slots = Arc::clone(&slots);
            let name = zone.name.clone();
            let result = expansions.submit(&self.pool, move || {
                match api
                    .zone(&name)
                    .change_context_lazy(|| CollectError::ZoneExpansion { zone: name.clone() })?
                {
                    Lookup::Found(detail) => {
                        slots.lock().expect("poisoned")[index] = Some(detail);
                    }
                    Lookup::NotFound => debug!(zone = %name, "Zone vanished, skipping"),
                }
                Ok(())
            });
            if let Err(err) = result {
                submitted = Err(Report::new(err).change_context(CollectError::Scheduler));
                break;
            }
        }
        let finished = expansions.wait_all().map_err(failed_tasks_report);
        submitted?;
        finished?;

        let mut details = std::mem::take(&mut *slots.lock().expect("poisoned"));
        let expanded = zones
            .into_iter()
            .enumerate()
            .filter_map(|(index, zone)| {
                if zone.is_linked() {
                    Some(zone)
                } else {
                    details[index].take()
                }
            })
            .collect();
        Ok(expanded)
    }

    fn submit_all(&self, zones: &[Zone], pending: &mut Pending) -> CollectResult<()> {
        self.submit_account_usage(pending)?;
        self.submit_zones_usage(pending)?;
        self.submit_records_usage(zones, pending)?;
        self.submit_account_qps(pending)?;
        self.submit_zones_qps(zones, pending)?;
        self.submit_records_qps(zones, pending)
    }

    fn submit<F>(&self, pending: &mut Pending, task: F) -> CollectResult<()>
    where
        F: FnOnce(&dyn StatsApi, &MetricPointStore) -> CollectResult<()> + Send + 'static,
    {
        let api = Arc::clone(&self.api);
        let store = Arc::clone(&self.store);
        pending
            .submit(&self.pool, move || task(api.as_ref(), store.as_ref()))
            .map_err(|err| Report::new(err).change_context(CollectError::Scheduler))
    }

    fn submit_account_usage(&self, pending: &mut Pending) -> CollectResult<()> {
        if !self.settings.usage_of_account {
            return Ok(());
        }
        for &period in StatsPeriod::ALL {
            if !self.settings.period_filter(period).matches("account") {
                continue;
            }
            self.submit(pending, move |api, store| {
                let usage = api
                    .account_usage(period)
                    .change_context_lazy(|| fetch(format!("{period} usage of account")))?;
                store.set_point(Family::Usage(Scope::Account, period), Series::Account, usage.queries)
            })?;
        }
        Ok(())
    }

    fn submit_zones_usage(&self, pending: &mut Pending) -> CollectResult<()> {
        if !self.settings.usage_of_zones.is_enabled() {
            return Ok(());
        }
        let periods: Vec<_> = self.settings.enabled_periods().collect();
        for period in periods {
            let settings = Arc::clone(&self.settings);
            self.submit(pending, move |api, store| {
                let usages = api
                    .zones_usage(period)
                    .change_context_lazy(|| fetch(format!("{period} usage of zones")))?;
                let period_filter = settings.period_filter(period);
                for usage in usages {
                    if period_filter.matches(&usage.zone) && settings.usage_of_zones.matches(&usage.zone) {
                        store.set_point(
                            Family::Usage(Scope::Zone, period),
                            Series::Zone(&usage.zone),
                            usage.queries,
                        )?;
                    }
                }
                Ok(())
            })?;
        }
        Ok(())
    }

    fn submit_records_usage(&self, zones: &[Zone], pending: &mut Pending) -> CollectResult<()> {
        let records_filter = &self.settings.usage_of_records;
        if !records_filter.is_enabled() {
            return Ok(());
        }
        for zone in zones {
            if zone.is_linked() || !records_filter.matches(&zone.name) {
                continue;
            }
            for &period in StatsPeriod::ALL {
                if !self.settings.period_filter(period).matches(&zone.name) {
                    continue;
                }
                let settings = Arc::clone(&self.settings);
                let zone = zone.name.clone();
                self.submit(pending, move |api, store| {
                    let usages = api
                        .records_usage(&zone, period)
                        .change_context_lazy(|| fetch(format!("{period} usage of records of zone {zone}")))?;
                    let period_filter = settings.period_filter(period);
                    for usage in usages {
                        let subject = usage.filter_subject();
                        if period_filter.matches(&subject) && settings.usage_of_records.matches(&subject) {
                            store.set_point(
                                Family::Usage(Scope::Record, period),
                                Series::Record {
                                    zone: &zone,
                                    record: &usage.domain,
                                    record_type: usage.record_type,
                                },
                                usage.queries,
                            )?;
                        }
                    }
                    Ok(())
                })?;
            }
        }
        Ok(())
    }

    fn submit_account_qps(&self, pending: &mut Pending) -> CollectResult<()> {
        if !self.settings.qps_of_account {
            return Ok(());
        }
        self.submit(pending, |api, store| {
            let qps = api
                .account_qps()
                .change_context_lazy(|| fetch("qps of account".to_string()))?;
            store.set_point(Family::Qps(Scope::Account), Series::Account, qps)
        })
    }

    fn submit_zones_qps(&self, zones: &[Zone], pending: &mut Pending) -> CollectResult<()> {
        let zones_filter = &self.settings.qps_of_zones;
        if !zones_filter.is_enabled() {
            return Ok(());
        }
        for zone in zones {
            if zone.is_linked() || !zones_filter.matches(&zone.name) {
                continue;
            }
            let zone = zone.name.clone();
            self.submit(pending, move |api, store| {
                let qps = api
                    .zone_qps(&zone)
                    .change_context_lazy(|| fetch(format!("qps of zone {zone}")))?;
                store.set_point(Family::Qps(Scope::Zone), Series::Zone(&zone), qps)
            })?;
        }
        Ok(())
    }

    fn submit_records_qps(&self, zones: &[Zone], pending: &mut Pending) -> CollectResult<()> {
        let records_filter = &self.settings.qps_of_records;
        if !records_filter.is_enabled() {
            return Ok(());
        }
        for zone in zones {
            if zone.is_linked() || !records_filter.matches(&zone.name) {
                continue;
            }
            for record in &zone.records {
                if record.is_linked() || !records_filter.matches(&record.filter_subject()) {
                    continue;
                }
                let zone = zone.name.clone();
                let name = record.name.clone();
                let record_type = record.record_type;
                self.submit(pending, move |api, store| {
                    let qps = api
                        .record_qps(&zone, &name, record_type)
                        .change_context_lazy(|| fetch(format!("qps of record {record_type} {name}")))?;
                    store.set_point(
                        Family::Qps(Scope::Record),
                        Series::Record {
                            zone: &zone,
                            record: &name,
                            record_type,
                        },
                        qps,
                    )
                })?;
            }
        }
        Ok(())
    }
}

fn fetch(what: String) -> CollectError {
    CollectError::Fetch { what }
}

fn failed_tasks_report(failed: FailedTasks<Report<CollectError>>) -> Report<CollectError> {
    let report = Report::new(CollectError::TasksFailed {
        failed: failed.failed,
        total: failed.total,
    });
    match failed.first {
        TaskFailure::Error(first) => report.attach_printable(format!("first failure: {first:?}")),
        TaskFailure::Panicked { message } => {
            report.attach_printable(format!("first failure: task panicked: {message}"))
        }
    }
}
