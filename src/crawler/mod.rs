//! Crawler module: the crawl orchestration engine
//!
//! This module contains the core crawling logic, including:
//! - The URL frontier and process-wide visited set
//! - The multi-strategy fetch pipeline with fallback
//! - Link extraction from raw markup
//! - Task lifecycle tracking
//! - The orchestrator that ties them together over a bounded worker pool

mod fetch;
mod frontier;
mod orchestrator;
mod parser;
mod task;

pub use fetch::{
    AsyncClientStrategy, BlockingClientStrategy, FetchError, FetchPipeline, FetchStrategy,
    MinimalClientStrategy,
};
pub use frontier::{Frontier, VisitedSet};
pub use orchestrator::{Orchestrator, SharedStore};
pub use parser::LinkExtractor;
pub use task::{CrawlTask, TaskSnapshot, TaskStatus};
