//! Crawl orchestration: task registry, worker pool, and the crawl loop
//!
//! The orchestrator owns the only cross-task mutable state in the crate:
//! the task registry and the shared visited set. Both are injected into
//! workers as handles, never reached through globals. A bounded semaphore
//! stands in for the worker pool; each task runs its crawl loop strictly
//! sequentially on its own spawned tokio task.

use crate::config::Config;
use crate::crawler::fetch::FetchPipeline;
use crate::crawler::frontier::{Frontier, VisitedSet};
use crate::crawler::parser::LinkExtractor;
use crate::crawler::task::{CrawlTask, TaskSnapshot, TaskStatus};
use crate::extract::ContactExtractor;
use crate::storage::{Company, CompanyStore};
use crate::{CrawlerError, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use uuid::Uuid;

/// Company store handle shared across tasks
pub type SharedStore = Arc<Mutex<dyn CompanyStore>>;

/// Everything a worker needs to run one task's crawl loop
struct CrawlContext {
    config: Config,
    pipeline: FetchPipeline,
    extractor: ContactExtractor,
    links: LinkExtractor,
    store: SharedStore,
    visited: Arc<VisitedSet>,
    total_pages: AtomicU64,
}

/// Crawl orchestrator
///
/// Starts tasks, bounds their concurrency, and answers status queries.
/// Tasks are registered before submission, so an identifier returned by
/// [`start_crawl`](Self::start_crawl) is immediately queryable; registry
/// entries are never removed.
pub struct Orchestrator {
    ctx: Arc<CrawlContext>,
    registry: Arc<RwLock<HashMap<String, Arc<CrawlTask>>>>,
    pool: Arc<Semaphore>,
    queue_when_saturated: bool,
}

impl Orchestrator {
    /// Creates an orchestrator over the given collaborators
    pub fn new(
        config: Config,
        pipeline: FetchPipeline,
        extractor: ContactExtractor,
        store: SharedStore,
    ) -> Self {
        let max_tasks = config.crawler.max_concurrent_tasks as usize;
        let queue_when_saturated = config.crawler.queue_when_saturated;

        Self {
            ctx: Arc::new(CrawlContext {
                config,
                pipeline,
                extractor,
                links: LinkExtractor::new(),
                store,
                visited: Arc::new(VisitedSet::new()),
                total_pages: AtomicU64::new(0),
            }),
            registry: Arc::new(RwLock::new(HashMap::new())),
            pool: Arc::new(Semaphore::new(max_tasks)),
            queue_when_saturated,
        }
    }

    /// Starts a crawl over `seeds` and returns its task identifier
    ///
    /// The task is registered in Pending state before the worker is
    /// spawned, then the identifier is returned without waiting for
    /// execution to begin. With queueing disabled, a saturated pool makes
    /// this fail with [`CrawlerError::PoolSaturated`] instead of spawning.
    pub fn start_crawl(&self, seeds: Vec<String>) -> Result<String> {
        // In reject mode the permit is claimed up front so the capacity
        // error surfaces synchronously, before anything is registered
        let permit = if self.queue_when_saturated {
            None
        } else {
            match Arc::clone(&self.pool).try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => return Err(CrawlerError::PoolSaturated),
            }
        };

        let task_id = Uuid::new_v4().to_string();
        let task = Arc::new(CrawlTask::new(task_id.clone(), seeds));

        // Registration happens-before submission: an immediate status
        // query for the returned id cannot miss
        self.registry
            .write()
            .unwrap()
            .insert(task_id.clone(), Arc::clone(&task));

        let ctx = Arc::clone(&self.ctx);
        let pool = Arc::clone(&self.pool);
        let worker_task = Arc::clone(&task);
        let handle = tokio::spawn(async move {
            run_task(worker_task, ctx, pool, permit).await;
        });
        task.set_handle(handle);

        Ok(task_id)
    }

    /// Looks up a task's current status and progress
    pub fn get_status(&self, task_id: &str) -> Option<TaskSnapshot> {
        self.registry
            .read()
            .unwrap()
            .get(task_id)
            .map(|task| task.snapshot())
    }

    /// Snapshot of every task ever started, keyed by identifier
    pub fn get_all_tasks(&self) -> HashMap<String, TaskSnapshot> {
        self.registry
            .read()
            .unwrap()
            .iter()
            .map(|(id, task)| (id.clone(), task.snapshot()))
            .collect()
    }

    /// Pages visited across all tasks since process start (never reset)
    pub fn total_pages_crawled(&self) -> u64 {
        self.ctx.total_pages.load(Ordering::SeqCst)
    }

    /// Awaits a task's completion handle and returns its final snapshot
    ///
    /// If the handle was already consumed by an earlier waiter, the current
    /// snapshot is returned without blocking.
    pub async fn wait(&self, task_id: &str) -> Result<TaskSnapshot> {
        let task = self
            .registry
            .read()
            .unwrap()
            .get(task_id)
            .cloned()
            .ok_or_else(|| CrawlerError::TaskNotFound(task_id.to_string()))?;

        if let Some(handle) = task.take_handle() {
            // An aborted worker still leaves the task queryable
            let _ = handle.await;
        }

        Ok(task.snapshot())
    }
}

/// Worker entry point: pool admission, lifecycle bookkeeping, crawl loop
async fn run_task(
    task: Arc<CrawlTask>,
    ctx: Arc<CrawlContext>,
    pool: Arc<Semaphore>,
    permit: Option<OwnedSemaphorePermit>,
) {
    // Hold a pool permit for the whole crawl; in queue mode the task waits
    // here until a slot frees up
    let _permit = match permit {
        Some(permit) => permit,
        None => match pool.acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                // The pool only closes on shutdown
                task.set_status(TaskStatus::Failed);
                return;
            }
        },
    };

    task.set_status(TaskStatus::Running);
    tracing::info!("Task {} started with {} seed(s)", task.id(), task.seeds().len());

    match crawl(&task, &ctx).await {
        Ok(()) => {
            task.set_status(TaskStatus::Completed);
            tracing::info!(
                "Task {} completed, {} page(s) crawled",
                task.id(),
                task.pages_crawled()
            );
        }
        Err(e) => {
            task.set_status(TaskStatus::Failed);
            tracing::error!("Task {} failed: {}", task.id(), e);
        }
    }
}

/// The crawl loop for one task: strictly sequential, one URL at a time
///
/// Terminates when the per-task queue drains or the page budget is
/// reached; hitting the budget with URLs still queued is normal
/// completion, not a fault. Per-URL faults are logged and the loop moves
/// on; only an error escaping this function fails the task.
async fn crawl(task: &CrawlTask, ctx: &CrawlContext) -> Result<()> {
    let budget = ctx.config.crawler.max_pages_per_task;
    let delay = Duration::from_millis(ctx.config.crawler.politeness_delay_ms);

    let mut frontier = Frontier::new(Arc::clone(&ctx.visited));
    for seed in task.seeds() {
        frontier.push(seed.clone());
    }

    while task.pages_crawled() < budget {
        let url = match frontier.pop() {
            Some(url) => url,
            None => break,
        };

        // First-wins gate: a URL some task already claimed is skipped
        // without counting
        if !frontier.try_visit(&url) {
            continue;
        }

        task.increment_pages();
        ctx.total_pages.fetch_add(1, Ordering::SeqCst);

        if let Err(e) = process_page(ctx, &mut frontier, &url).await {
            tracing::warn!("Failed to process {}: {}", url, e);
        }

        tokio::time::sleep(delay).await;
    }

    Ok(())
}

/// Fetches one page, extracts contacts and links, and feeds the frontier
async fn process_page(ctx: &CrawlContext, frontier: &mut Frontier, url: &str) -> Result<()> {
    tracing::info!("Crawling: {}", url);

    let content = ctx.pipeline.fetch(url).await;
    if content.is_empty() {
        // Nothing fetched: skip extraction and discovery, keep the task alive
        tracing::debug!("No content for {}, skipping extraction", url);
        return Ok(());
    }

    if let Some(company) = ctx.extractor.extract(&content, url) {
        save_company_if_new(&ctx.store, &company)?;
    }

    for link in ctx.links.extract_links(&content, url) {
        if !frontier.is_visited(&link) {
            frontier.push(link);
        }
    }

    Ok(())
}

/// Persists a company unless its website is already known
///
/// The find-then-save window is not atomic across tasks; the store's
/// website uniqueness constraint is what actually guarantees one row per
/// website.
fn save_company_if_new(store: &SharedStore, company: &Company) -> Result<()> {
    let mut store = store.lock().unwrap();

    if store.find_by_website(&company.website)?.is_none() && store.save(company)? {
        tracing::info!("Saved company: {} ({})", company.name, company.website);
    }

    Ok(())
}
