//! Pipeline entry points for crawl runs.
//!
//! - `CrawlOrchestrator::run`: one incremental crawl of the listing
//! - `run_periodic`: repeated crawls with at-most-one run in flight

pub mod crawl;
pub mod schedule;
#[cfg(test)]
pub(crate) mod testing;

pub use crawl::{CrawlOrchestrator, PageReport};
pub use schedule::{RunLifecycle, RunPermit, run_guarded, run_periodic};
