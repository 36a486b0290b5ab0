//! Collection cycles: fan out statistics requests, wait for all of them, then
//! commit or discard the snapshot as a whole.

mod orchestrator;

pub use orchestrator::CycleReport;
pub use orchestrator::Orchestrator;
pub use orchestrator::TaskPool;
