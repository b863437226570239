//! Crawl task lifecycle
//!
//! A task represents one crawl run over a set of seed URLs, tracked through
//! a one-directional status lifecycle with sticky terminal states.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use tokio::task::JoinHandle;

/// Lifecycle status of a crawl task
///
/// Transitions run Pending -> Running -> Completed | Failed and never
/// backwards; Completed and Failed are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    /// Created and registered, not yet picked up by the worker pool
    Pending,

    /// A worker is executing the crawl loop
    Running,

    /// The crawl loop exited normally (queue drained or budget reached)
    Completed,

    /// A fault escaped the crawl loop
    Failed,
}

impl TaskStatus {
    /// Returns true once the status can no longer change
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One crawl run over a set of seed URLs
///
/// Owned by the orchestrator's registry and never removed from it, so a
/// task stays queryable after completion for the lifetime of the process.
/// The status and counter are mutated only by the worker executing the
/// task; the handle slot is written once at submission time.
pub struct CrawlTask {
    id: String,
    seeds: Vec<String>,
    status: Mutex<TaskStatus>,
    pages_crawled: AtomicU32,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl CrawlTask {
    pub fn new(id: String, seeds: Vec<String>) -> Self {
        Self {
            id,
            seeds,
            status: Mutex::new(TaskStatus::Pending),
            pages_crawled: AtomicU32::new(0),
            handle: Mutex::new(None),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn seeds(&self) -> &[String] {
        &self.seeds
    }

    pub fn status(&self) -> TaskStatus {
        *self.status.lock().unwrap()
    }

    /// Transitions the task status
    ///
    /// Terminal states are sticky: once Completed or Failed, further
    /// transitions are ignored.
    pub fn set_status(&self, next: TaskStatus) {
        let mut status = self.status.lock().unwrap();
        if status.is_terminal() {
            return;
        }
        *status = next;
    }

    /// Pages visited by this task so far (monotonically increasing)
    pub fn pages_crawled(&self) -> u32 {
        self.pages_crawled.load(Ordering::SeqCst)
    }

    /// Increments the pages-crawled counter, returning the new value
    ///
    /// Called exactly once per dequeued URL that wins the visited-set
    /// claim, regardless of how the fetch turns out.
    pub fn increment_pages(&self) -> u32 {
        self.pages_crawled.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Attaches the worker's join handle
    ///
    /// The handle doubles as the task's completion signal and, through
    /// `abort()`, its cancellation token. Status queries never touch it.
    pub fn set_handle(&self, handle: JoinHandle<()>) {
        *self.handle.lock().unwrap() = Some(handle);
    }

    /// Takes the join handle, if nobody consumed it yet
    pub fn take_handle(&self) -> Option<JoinHandle<()>> {
        self.handle.lock().unwrap().take()
    }

    /// Point-in-time view for status queries
    pub fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            id: self.id.clone(),
            status: self.status(),
            pages_crawled: self.pages_crawled(),
            seed_count: self.seeds.len(),
        }
    }
}

/// Snapshot of a task's externally visible state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSnapshot {
    pub id: String,
    pub status: TaskStatus,
    pub pages_crawled: u32,
    pub seed_count: usize,
}
