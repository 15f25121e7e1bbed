//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Fetching robots.txt and seeding the scheduler
//! - Dispatching fetches as tasks, bounded by the scheduler
//! - Extracting records and child links from every response
//! - Writing records to the sink
//! - Enforcing the time, idle and error-count limits
//! - Handling interrupts

use crate::config::Config;
use crate::crawler::controller::{CrawlRequest, RecursionController};
use crate::crawler::extractor::{Extractor, PageNode};
use crate::crawler::scheduler::{ScheduledRequest, Scheduler};
use crate::crawler::{build_http_client, fetch_url, FetchResult};
use crate::output::{feed_path, log_statistics, CrawlStatistics, CsvSink, RecordSink};
use crate::report::{CrawlObserver, LifecycleLogger, ProgressReporter};
use crate::robots::{fetch_robots, RobotsPolicy};
use crate::state::{CloseSpiderMonitor, CrawlState};
use crate::AtcError;
use chrono::Utc;
use reqwest::Client;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use url::Url;

/// How a crawl ended
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    /// The terminal state
    pub state: CrawlState,

    /// Counters collected during the crawl
    pub stats: CrawlStatistics,

    /// Where the feed was written, when the coordinator owns a CSV feed
    pub output_path: Option<PathBuf>,
}

/// Per-run state owned by the crawl loop
struct CrawlRun {
    scheduler: Scheduler,
    monitor: CloseSpiderMonitor,
    stats: CrawlStatistics,
    robots: RobotsPolicy,
    tasks: JoinSet<(CrawlRequest, FetchResult)>,
}

impl CrawlRun {
    /// Queues a request unless robots.txt disallows it
    fn enqueue(&mut self, request: CrawlRequest, user_agent: &str) {
        if !self.robots.is_allowed(&request.url, user_agent) {
            tracing::debug!("Forbidden by robots.txt: {}", request.url);
            self.stats.robots_denied += 1;
            return;
        }
        self.scheduler.enqueue(request);
    }

    /// Counts one failure against the error budget
    fn record_error(&mut self) -> u32 {
        self.monitor.record_error()
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    client: Client,
    extractor: Extractor,
    controller: RecursionController,
    sink: Box<dyn RecordSink>,
    output_path: Option<PathBuf>,
    observers: Vec<Box<dyn CrawlObserver>>,
}

impl Coordinator {
    /// Creates a coordinator writing to a fresh timestamped CSV feed
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(AtcError)` - The client, extractor or feed file could not be set up
    pub fn new(config: Config) -> Result<Self, AtcError> {
        let path = feed_path(&config.output, Utc::now());
        let sink = CsvSink::create(&path, &config.output.join_multivalued)?;

        let mut coordinator = Self::with_sink(config, Box::new(sink))?;
        coordinator.output_path = Some(path);
        Ok(coordinator)
    }

    /// Creates a coordinator writing to the given sink
    pub fn with_sink(config: Config, sink: Box<dyn RecordSink>) -> Result<Self, AtcError> {
        let client = build_http_client(&config)?;
        let extractor = Extractor::new()?;
        let controller = RecursionController::new(&config.site, config.crawler.max_depth)?;

        Ok(Self {
            config: Arc::new(config),
            client,
            extractor,
            controller,
            sink,
            output_path: None,
            observers: Vec::new(),
        })
    }

    /// Registers an observer for crawl events
    pub fn add_observer(&mut self, observer: Box<dyn CrawlObserver>) {
        self.observers.push(observer);
    }

    /// Path of the CSV feed, if this coordinator writes one
    pub fn output_path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }

    /// Runs the crawl until it finishes or hits a limit
    pub async fn run(self) -> Result<CrawlOutcome, AtcError> {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Runs the crawl until it finishes, hits a limit or `shutdown` resolves
    ///
    /// Resolving `shutdown` closes the crawl as `UserStopped`; in-flight
    /// fetches are cancelled.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<CrawlOutcome, AtcError>
    where
        F: Future<Output = ()>,
    {
        let start = self.controller.start_request();
        tracing::info!(
            "Spider opened: crawling {} (max depth {}, {} concurrent requests)",
            start.url,
            self.controller.max_depth(),
            self.config.crawler.concurrent_requests
        );

        let robots = self.load_robots(&start.url).await;
        let crawl_delay = robots
            .crawl_delay(&self.config.user_agent.name)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok());

        let mut run = CrawlRun {
            scheduler: Scheduler::new(&self.config.crawler, crawl_delay),
            monitor: CloseSpiderMonitor::new(&self.config.close_spider, Instant::now()),
            stats: CrawlStatistics::new(Utc::now()),
            robots,
            tasks: JoinSet::new(),
        };
        tracing::debug!(
            "Download delay {:?}{}",
            run.scheduler.download_delay(),
            if self.config.crawler.randomize_download_delay {
                " (randomized)"
            } else {
                ""
            }
        );
        run.enqueue(start, &self.config.user_agent.name);

        let result = self.drive(&mut run, shutdown).await;

        if !run.tasks.is_empty() {
            tracing::debug!("Cancelling {} in-flight requests", run.tasks.len());
        }
        run.tasks.shutdown().await;

        let state = match result {
            Ok(state) => state,
            Err(e) => {
                for observer in &mut self.observers {
                    observer.on_aborted(&e);
                }
                if let Err(flush_error) = self.sink.finish() {
                    tracing::error!("Failed to flush output: {}", flush_error);
                }
                return Err(e);
            }
        };

        if state.is_limit() {
            tracing::warn!("Closing spider ({})", state.reason());
        }

        for observer in &mut self.observers {
            observer.on_closed(state);
        }
        self.sink.finish()?;

        run.stats.close(state, Utc::now());
        log_statistics(&run.stats);

        Ok(CrawlOutcome {
            state,
            stats: run.stats,
            output_path: self.output_path,
        })
    }

    /// The crawl loop; returns the terminal state
    async fn drive<F>(&mut self, run: &mut CrawlRun, shutdown: F) -> Result<CrawlState, AtcError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            self.dispatch(run);

            if run.tasks.is_empty() && run.scheduler.pending() == 0 {
                for observer in &mut self.observers {
                    observer.on_idle();
                }
                return Ok(CrawlState::Finished);
            }

            let deadline = run.monitor.next_deadline();

            tokio::select! {
                joined = run.tasks.join_next() => match joined {
                    Some(Ok((request, result))) => self.handle_fetch(run, request, result)?,
                    Some(Err(e)) => {
                        run.stats.task_failures += 1;
                        let count = run.record_error();
                        tracing::error!("Fetch task failed: {} ({} errors)", e, count);
                    }
                    None => {}
                },
                _ = sleep_until_deadline(deadline.map(|(at, _)| at)) => {
                    if let Some((_, state)) = deadline {
                        return Ok(state);
                    }
                },
                _ = &mut shutdown => {
                    tracing::info!("Received shutdown signal");
                    return Ok(CrawlState::UserStopped);
                },
            }

            if let Some(state) = run.monitor.check(Instant::now()) {
                return Ok(state);
            }
        }
    }

    /// Spawns fetch tasks for as many pending requests as the scheduler releases
    fn dispatch(&self, run: &mut CrawlRun) {
        while let Some(scheduled) = run.scheduler.try_next(tokio::time::Instant::now()) {
            let client = self.client.clone();
            let config = Arc::clone(&self.config);
            run.stats.requests_sent += 1;

            run.tasks.spawn(async move {
                let ScheduledRequest {
                    request,
                    not_before,
                    permit,
                } = scheduled;

                tokio::time::sleep_until(not_before).await;
                let result = fetch_url(&client, &request.url, &config.retry).await;
                drop(permit);

                (request, result)
            });
        }
    }

    /// Handles one completed fetch
    fn handle_fetch(
        &mut self,
        run: &mut CrawlRun,
        request: CrawlRequest,
        result: FetchResult,
    ) -> Result<(), AtcError> {
        match result {
            FetchResult::Success {
                final_url,
                status_code,
                body,
                attempts,
            } => {
                tracing::debug!(
                    "Crawled ({}) {} (depth {}, {} attempts)",
                    status_code,
                    final_url,
                    request.depth,
                    attempts
                );

                for observer in &mut self.observers {
                    observer.on_response(&request);
                }

                match self.extractor.extract(&body, request.is_root_page) {
                    Ok(page) => self.process_page(run, &request, page)?,
                    Err(e) => {
                        run.stats.structural_errors += 1;
                        let count = run.record_error();
                        tracing::error!("Error processing {}: {} ({} errors)", request.url, e, count);
                    }
                }
            }

            FetchResult::HttpError { status_code } => {
                run.stats.http_ignored += 1;
                tracing::info!(
                    "Ignoring response <{} {}>: HTTP status code is not handled or not allowed",
                    status_code,
                    request.url
                );
            }

            FetchResult::Failed { error, attempts } => {
                run.stats.request_failures += 1;
                let count = run.record_error();
                tracing::error!(
                    "Error downloading {} after {} attempts: {} ({} errors)",
                    request.url,
                    attempts,
                    error,
                    count
                );
            }
        }

        Ok(())
    }

    /// Writes a page's records and queues its children
    fn process_page(
        &mut self,
        run: &mut CrawlRun,
        request: &CrawlRequest,
        page: PageNode,
    ) -> Result<(), AtcError> {
        for record in page.records() {
            self.sink.write_record(record)?;
            run.stats.records += 1;
            run.monitor.record_item(Instant::now());
        }

        let plan = self.controller.plan_children(request, &page);
        run.stats.depth_filtered += plan.depth_filtered as u64;
        run.stats.offsite_filtered += plan.offsite_filtered as u64;
        run.stats.invalid_links += plan.invalid as u64;

        for child in plan.requests {
            run.enqueue(child, &self.config.user_agent.name);
        }

        run.stats.pages_processed += 1;
        for observer in &mut self.observers {
            observer.on_page_processed(&page);
        }

        Ok(())
    }

    /// Fetches robots.txt when the crawl obeys it
    async fn load_robots(&self, base_url: &Url) -> RobotsPolicy {
        if !self.config.crawler.obey_robots {
            return RobotsPolicy::allow_all();
        }

        let robots = fetch_robots(&self.client, base_url).await;
        if !robots.is_allow_all() {
            tracing::debug!("Loaded robots.txt for {}", base_url);
        }
        robots
    }
}

/// Sleeps until `deadline`, or forever without one
async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending::<()>().await,
    }
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Runs the main crawl operation
///
/// This function:
/// 1. Creates the timestamped CSV feed
/// 2. Registers the progress reporter and lifecycle logger
/// 3. Crawls until the index is exhausted, a limit is hit or Ctrl-C is pressed
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlOutcome)` - The crawl closed, for any reason
/// * `Err(AtcError)` - The crawl could not be set up or the feed could not be written
///
/// # Example
///
/// ```no_run
/// use atc_spider::config::Config;
/// use atc_spider::crawler::run_crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let outcome = run_crawl(Config::default()).await?;
/// println!("closed: {}", outcome.state);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config) -> Result<CrawlOutcome, AtcError> {
    let progress = config.crawler.progress_logging;

    let mut coordinator = Coordinator::new(config)?;
    if let Some(path) = coordinator.output_path() {
        tracing::info!("Writing feed to {}", path.display());
    }
    coordinator.add_observer(Box::new(ProgressReporter::new(progress)));
    coordinator.add_observer(Box::new(LifecycleLogger::new()));

    coordinator.run_until(ctrl_c()).await
}
