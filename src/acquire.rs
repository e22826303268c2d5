use std::any::Any;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use serde::Serialize;

use crate::config::{DEFAULT_DELAY_SECS, DEFAULT_WORKERS};
use crate::domain::{Airline, IcaoCode};
use crate::error::LogoError;
use crate::fetch::{FetchJob, FetchOutcome, FetchWorker, RetryPolicy, Sleeper, ThreadSleeper};
use crate::http::LogoClient;
use crate::progress::{ProgressReporter, ProgressState, ProgressTracker, SourceCount};
use crate::sources::SourceDescriptor;
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct AcquireOptions {
    pub workers: usize,
    /// Pause after an airline for which at least one request went out.
    pub delay: Duration,
    pub skip_existing: bool,
}

impl Default for AcquireOptions {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            delay: Duration::from_secs_f64(DEFAULT_DELAY_SECS),
            skip_existing: false,
        }
    }
}

/// ICAO codes already handed to a worker during this run.
#[derive(Debug, Default)]
pub struct ProcessedSet {
    inner: Mutex<HashSet<IcaoCode>>,
}

impl ProcessedSet {
    /// Marks `key` as processed. Returns false if it already was.
    pub fn claim(&self, key: &IcaoCode) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything shared between the workers of one run.
pub struct RunContext {
    pub progress: ProgressTracker,
    pub processed: ProcessedSet,
}

impl RunContext {
    pub fn new(progress: ProgressTracker) -> Self {
        Self {
            progress,
            processed: ProcessedSet::default(),
        }
    }
}

/// Reports entity completion on every exit path, unwinding included.
struct CompletionGuard<'a>(&'a ProgressTracker);

impl Drop for CompletionGuard<'_> {
    fn drop(&mut self) {
        self.0.complete_entity();
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceFiles {
    pub name: String,
    pub directory: String,
    pub files: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AcquireSummary {
    pub entities: usize,
    pub completed: usize,
    pub processed: usize,
    pub sources: Vec<SourceCount>,
    pub files: Vec<SourceFiles>,
}

pub struct Acquisition<C: LogoClient> {
    client: C,
    store: Store,
    sources: Vec<SourceDescriptor>,
    options: AcquireOptions,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl<C: LogoClient> Acquisition<C> {
    /// Only the enabled descriptors of `sources` take part in the run.
    pub fn new(
        client: C,
        store: Store,
        sources: Vec<SourceDescriptor>,
        options: AcquireOptions,
    ) -> Self {
        Self {
            client,
            store,
            sources: sources.into_iter().filter(|source| source.enabled).collect(),
            options,
            policy: RetryPolicy::default(),
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn sources(&self) -> &[SourceDescriptor] {
        &self.sources
    }

    /// Runs one task per airline on a pool of `workers` threads and waits
    /// for all of them. Airlines are dispatched in ICAO order.
    pub fn run(
        &self,
        mut airlines: Vec<Airline>,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Result<AcquireSummary, LogoError> {
        let mut counts = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            let dir = self.store.ensure_dir(&source.directory)?;
            counts.push(SourceCount {
                name: source.name.clone(),
                label: source.label.clone(),
                new: 0,
                total: Store::count_files(&dir)?,
            });
        }

        airlines.sort_by(|a, b| a.icao().cmp(b.icao()));
        let entities = airlines.len();
        let ctx = RunContext::new(ProgressTracker::new(
            ProgressState::new(entities, counts),
            reporter,
        ));
        ctx.progress.begin();

        let workers = self.options.workers.max(1);
        let (tx, rx) = crossbeam_channel::bounded::<Airline>(workers.saturating_mul(2));
        thread::scope(|scope| {
            for _ in 0..workers {
                let rx = rx.clone();
                let ctx = &ctx;
                scope.spawn(move || {
                    for airline in rx.iter() {
                        self.dispatch(ctx, &airline);
                    }
                });
            }
            drop(rx);
            for airline in airlines {
                if tx.send(airline).is_err() {
                    break;
                }
            }
            drop(tx);
        });

        ctx.progress.finish();

        let mut files = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            files.push(SourceFiles {
                name: source.name.clone(),
                directory: source.directory.to_string(),
                files: Store::count_files(&self.store.dir(&source.directory))?,
            });
        }

        let state = ctx.progress.snapshot();
        Ok(AcquireSummary {
            entities,
            completed: state.completed,
            processed: ctx.processed.len(),
            sources: state.sources,
            files,
        })
    }

    fn dispatch(&self, ctx: &RunContext, airline: &Airline) {
        let _completion = CompletionGuard(&ctx.progress);
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.process(ctx, airline)));
        if let Err(payload) = result {
            ctx.progress.log(&format!(
                "Error processing {}: {}",
                airline.icao(),
                panic_message(payload.as_ref())
            ));
        }
    }

    /// The per-airline source loop. Runs at most once per ICAO.
    pub fn process(&self, ctx: &RunContext, airline: &Airline) -> Vec<(String, FetchOutcome)> {
        let mut outcomes = Vec::new();
        if !ctx.processed.claim(airline.icao()) {
            tracing::debug!("{} already processed", airline.icao());
            return outcomes;
        }

        let worker = FetchWorker::new(
            &self.client,
            &self.policy,
            self.sleeper.as_ref(),
            &ctx.progress,
        );
        let mut requested = false;
        for source in &self.sources {
            let destination = source.file_path(self.store.root(), airline);
            if self.options.skip_existing && destination.as_std_path().exists() {
                continue;
            }
            let Some(url) = source.url_for(airline) else {
                tracing::debug!("no {} url for {}", source.name, airline);
                continue;
            };
            requested = true;
            let outcome = worker.run(&FetchJob {
                airline,
                source,
                url: &url,
                destination: &destination,
            });
            outcomes.push((source.name.clone(), outcome));
        }

        if requested && !self.options.delay.is_zero() {
            self.sleeper.sleep(self.options.delay);
        }
        outcomes
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "task panicked".to_string()
    }
}
