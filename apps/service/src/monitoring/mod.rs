/// Monitoring engine module - detects stock and price changes
///
/// This module is responsible for:
/// - Fetching target pages with a bounded number of concurrent requests
/// - Extracting stock and price through configurable patterns
/// - Tracking the last known state of each target
/// - Running polling cycles on a fixed interval
pub mod coordinator;
pub mod extractor;
pub mod fetcher;
pub mod scheduler;
pub mod state;
pub mod types;
pub mod validation;


pub use coordinator::CycleCoordinator;
pub use extractor::{Extractor, PatternExtractor};
pub use fetcher::{Fetcher, HttpFetcher};
pub use scheduler::Scheduler;
pub use types::{CycleReport, Target};
