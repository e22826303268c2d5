use std::io::Cursor;
use std::thread;
use std::time::Duration;

use camino::Utf8Path;
use image::ImageFormat;
use serde::Serialize;

use crate::domain::Airline;
use crate::http::{HttpResponse, LogoClient, TransportError};
use crate::progress::ProgressTracker;
use crate::sources::SourceDescriptor;
use crate::store::Store;
use crate::validate::{images_are_same, is_blank, is_single_pixel};

pub const MAX_RETRIES: u32 = 5;
pub const TRANSPORT_RETRY_DELAY: Duration = Duration::from_secs(1);
const RATE_LIMITED: u16 = 429;

pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub transport_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            transport_delay: TRANSPORT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Backoff after the `attempt`-th 429 (zero based): 4, 8, 16, 32, 64 s.
    pub fn rate_limit_delay(&self, attempt: u32) -> Duration {
        Duration::from_secs(1u64 << (attempt + 2).min(32))
    }
}

/// Result of one (airline, source) download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FetchOutcome {
    Saved,
    SkippedBlank,
    SkippedPlaceholder,
    NotFound,
    RateLimited { exhausted: bool },
    UnexpectedStatus(u16),
    /// A transport failure with retries left.
    TransientError(String),
    FatalError(String),
}

pub fn classify_rate_limit(attempt: u32, max_retries: u32) -> FetchOutcome {
    FetchOutcome::RateLimited {
        exhausted: attempt >= max_retries,
    }
}

pub fn classify_transport(err: &TransportError, attempt: u32, max_retries: u32) -> FetchOutcome {
    if attempt < max_retries {
        FetchOutcome::TransientError(err.to_string())
    } else {
        FetchOutcome::FatalError(err.to_string())
    }
}

pub struct FetchJob<'a> {
    pub airline: &'a Airline,
    pub source: &'a SourceDescriptor,
    pub url: &'a str,
    pub destination: &'a Utf8Path,
}

pub struct FetchWorker<'a, C: LogoClient + ?Sized> {
    client: &'a C,
    policy: &'a RetryPolicy,
    sleeper: &'a dyn Sleeper,
    tracker: &'a ProgressTracker,
}

impl<'a, C: LogoClient + ?Sized> FetchWorker<'a, C> {
    pub fn new(
        client: &'a C,
        policy: &'a RetryPolicy,
        sleeper: &'a dyn Sleeper,
        tracker: &'a ProgressTracker,
    ) -> Self {
        Self {
            client,
            policy,
            sleeper,
            tracker,
        }
    }

    /// Downloads, validates and stores one logo. Writes at most one file and
    /// logs at most one line.
    pub fn run(&self, job: &FetchJob<'_>) -> FetchOutcome {
        let outcome = match self.request(job) {
            Ok(response) if response.is_success() => self.accept(job, &response.body),
            Ok(response) if job.source.is_missing_status(response.status) => FetchOutcome::NotFound,
            Ok(response) => FetchOutcome::UnexpectedStatus(response.status),
            Err(outcome) => outcome,
        };
        self.report(job, &outcome);
        outcome
    }

    fn request(&self, job: &FetchJob<'_>) -> Result<HttpResponse, FetchOutcome> {
        let max = self.policy.max_retries;
        let mut attempt = 0u32;
        loop {
            match self.client.get(job.url) {
                Ok(response) if response.status == RATE_LIMITED => {
                    match classify_rate_limit(attempt, max) {
                        FetchOutcome::RateLimited { exhausted: false } => {
                            let delay = self.policy.rate_limit_delay(attempt);
                            tracing::debug!(
                                "429 for {} from {}, retrying in {}s",
                                job.airline.icao(),
                                job.source.name,
                                delay.as_secs()
                            );
                            self.sleeper.sleep(delay);
                            attempt += 1;
                        }
                        outcome => return Err(outcome),
                    }
                }
                Ok(response) => return Ok(response),
                Err(err) => match classify_transport(&err, attempt, max) {
                    FetchOutcome::TransientError(reason) => {
                        tracing::debug!(
                            "transport error for {} from {}: {reason}; retrying",
                            job.airline.icao(),
                            job.source.name
                        );
                        self.sleeper.sleep(self.policy.transport_delay);
                        attempt += 1;
                    }
                    outcome => return Err(outcome),
                },
            }
        }
    }

    fn accept(&self, job: &FetchJob<'_>, body: &[u8]) -> FetchOutcome {
        let image = match image::load_from_memory(body) {
            Ok(image) => image,
            Err(err) => return FetchOutcome::FatalError(format!("cannot decode image: {err}")),
        };

        if is_single_pixel(&image) || is_blank(&image) {
            return FetchOutcome::SkippedBlank;
        }
        if let Some(placeholder) = &job.source.placeholder {
            if images_are_same(&image, placeholder) {
                return FetchOutcome::SkippedPlaceholder;
            }
        }

        let mut encoded = Vec::new();
        if let Err(err) = image.write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png) {
            return FetchOutcome::FatalError(format!("cannot encode png: {err}"));
        }
        if let Err(err) = Store::write_bytes_atomic(job.destination, &encoded) {
            return FetchOutcome::FatalError(err.to_string());
        }

        self.tracker.record_saved(
            &job.source.name,
            &format!("Downloaded {} from {}", job.airline.icao(), job.source.name),
        );
        FetchOutcome::Saved
    }

    fn report(&self, job: &FetchJob<'_>, outcome: &FetchOutcome) {
        let icao = job.airline.icao();
        let source = &job.source.name;
        match outcome {
            FetchOutcome::RateLimited { .. } => self.tracker.log(&format!(
                "Rate limit exceeded (429) for {icao} from {source} after retries"
            )),
            FetchOutcome::UnexpectedStatus(status) => {
                self.tracker.log(&format!("{status} for {icao} {source}"))
            }
            FetchOutcome::FatalError(reason) | FetchOutcome::TransientError(reason) => self
                .tracker
                .log(&format!("Error downloading {icao} from {source}: {reason}")),
            FetchOutcome::SkippedBlank
            | FetchOutcome::SkippedPlaceholder
            | FetchOutcome::NotFound => {
                tracing::debug!("{icao} from {source}: {outcome:?}");
            }
            FetchOutcome::Saved => {}
        }
    }
}
