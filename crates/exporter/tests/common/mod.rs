#![allow(dead_code)]

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;

use api_types::Record;
use api_types::RecordType;
use api_types::StatsPeriod;
use api_types::Usage;
use api_types::Zone;
use error_stack::Report;
use nsone_client::ClientError;
use nsone_client::ClientResult;
use nsone_client::Lookup;
use nsone_client::StatsApi;
use nsone_exporter::collector::Orchestrator;
use nsone_exporter::collector::TaskPool;
use nsone_exporter::config::ExportSettings;
use nsone_exporter::config::Filter;

/// In-memory provider recording every call.
///
/// Calls are recorded as `"<method> <args..>"`; a call whose recording is in
/// `failing` answers with HTTP 500.
#[derive(Default)]
pub struct FakeApi {
    pub zones: Vec<Zone>,
    pub details: HashMap<String, Zone>,
    pub failing: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn with_zones(zones: Vec<Zone>) -> Self {
        let details = zones
            .iter()
            .map(|zone| (zone.name.clone(), zone.clone()))
            .collect();
        let listed = zones
            .into_iter()
            .map(|zone| Zone {
                records: Vec::new(),
                ..zone
            })
            .collect();
        Self {
            zones: listed,
            details,
            ..Default::default()
        }
    }

    pub fn failing(mut self, call: &str) -> Self {
        self.failing.insert(call.to_string());
        self
    }

    pub fn without_detail(mut self, zone: &str) -> Self {
        self.details.remove(zone);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        let mut calls = self.calls.lock().unwrap().clone();
        calls.sort();
        calls
    }

    fn record(&self, call: String) -> ClientResult<()> {
        let fail = self.failing.contains(&call);
        self.calls.lock().unwrap().push(call);
        if fail {
            Err(Report::new(ClientError::Status { status: 500 }))
        } else {
            Ok(())
        }
    }
}

impl StatsApi for FakeApi {
    fn zones(&self) -> ClientResult<Vec<Zone>> {
        self.record("zones".into())?;
        Ok(self.zones.clone())
    }

    fn zone(&self, zone: &str) -> ClientResult<Lookup<Zone>> {
        self.record(format!("zone {zone}"))?;
        Ok(match self.details.get(zone) {
            Some(detail) => Lookup::Found(detail.clone()),
            None => Lookup::NotFound,
        })
    }

    fn account_usage(&self, period: StatsPeriod) -> ClientResult<Usage> {
        self.record(format!("account_usage {period}"))?;
        Ok(Usage {
            queries: 1000.0,
            period: Some(period),
            ..Default::default()
        })
    }

    fn zones_usage(&self, period: StatsPeriod) -> ClientResult<Vec<Usage>> {
        self.record(format!("zones_usage {period}"))?;
        Ok(self
            .zones
            .iter()
            .map(|zone| Usage {
                zone: zone.name.clone(),
                queries: 100.0,
                period: Some(period),
                ..Default::default()
            })
            .collect())
    }

    fn records_usage(&self, zone: &str, period: StatsPeriod) -> ClientResult<Vec<Usage>> {
        self.record(format!("records_usage {zone} {period}"))?;
        let records = self
            .details
            .get(zone)
            .map(|detail| detail.records.clone())
            .unwrap_or_default();
        Ok(records
            .into_iter()
            .map(|record| Usage {
                zone: zone.to_string(),
                domain: record.name,
                record_type: record.record_type,
                queries: 5.0,
                period: Some(period),
                ..Default::default()
            })
            .collect())
    }

    fn account_qps(&self) -> ClientResult<f64> {
        self.record("account_qps".into())?;
        Ok(50.0)
    }

    fn zone_qps(&self, zone: &str) -> ClientResult<f64> {
        self.record(format!("zone_qps {zone}"))?;
        Ok(5.0)
    }

    fn record_qps(&self, zone: &str, record: &str, record_type: RecordType) -> ClientResult<f64> {
        self.record(format!("record_qps {zone} {record} {record_type}"))?;
        Ok(0.5)
    }
}

pub fn filter(pattern: &str) -> Filter {
    pattern.parse().expect("valid filter")
}

pub fn record(name: &str, record_type: RecordType) -> Record {
    Record {
        name: name.to_string(),
        record_type,
        ..Default::default()
    }
}

pub fn linked_record(name: &str, record_type: RecordType, link: &str) -> Record {
    Record {
        link: Some(link.to_string()),
        ..record(name, record_type)
    }
}

pub fn zone(name: &str, records: Vec<Record>) -> Zone {
    Zone {
        name: name.to_string(),
        records,
        ..Default::default()
    }
}

pub fn linked_zone(name: &str, link: &str) -> Zone {
    Zone {
        link: Some(link.to_string()),
        ..zone(name, Vec::new())
    }
}

pub fn orchestrator(api: Arc<FakeApi>, settings: ExportSettings) -> Orchestrator {
    let pool = Arc::new(TaskPool::new(4, 4).expect("pool"));
    Orchestrator::new(api, pool, settings).expect("orchestrator")
}
