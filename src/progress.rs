use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crossterm::cursor::{MoveToColumn, MoveToPreviousLine};
use crossterm::queue;
use crossterm::terminal::{self, Clear, ClearType};
use serde::Serialize;

const NEW_PREFIX: &str = "NEW THIS RUN ";
const TOTAL_PREFIX: &str = "TOTAL DIR+NEW";
const SEPARATOR_WIDTH: usize = 120;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceCount {
    pub name: String,
    pub label: String,
    pub new: u64,
    pub total: u64,
}

/// Run-wide counters. Only ever incremented during a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProgressState {
    pub completed: usize,
    pub total_entities: usize,
    pub sources: Vec<SourceCount>,
}

impl ProgressState {
    pub fn new(total_entities: usize, sources: Vec<SourceCount>) -> Self {
        Self {
            completed: 0,
            total_entities,
            sources,
        }
    }

    pub fn source(&self, name: &str) -> Option<&SourceCount> {
        self.sources.iter().find(|source| source.name == name)
    }

    fn record_saved(&mut self, name: &str) {
        if let Some(source) = self.sources.iter_mut().find(|source| source.name == name) {
            source.new += 1;
            source.total += 1;
        }
    }

    /// The three footer lines, each cut to `width - 5` columns when a width
    /// is known.
    pub fn footer_lines(&self, width: Option<usize>) -> [String; 3] {
        let new_line = counts_line(NEW_PREFIX, &self.sources, |source| source.new);
        let total_line = counts_line(TOTAL_PREFIX, &self.sources, |source| source.total);
        let progress_line = progress_line(self.completed, self.total_entities);
        [new_line, total_line, progress_line].map(|line| truncate(line, width))
    }
}

fn counts_line(prefix: &str, sources: &[SourceCount], pick: impl Fn(&SourceCount) -> u64) -> String {
    let counts = sources
        .iter()
        .map(|source| format!("{}:{}", source.label, pick(source)))
        .collect::<Vec<_>>()
        .join(" | ");
    format!("{prefix} {counts}")
}

pub fn progress_line(completed: usize, total: usize) -> String {
    let percent = if total == 0 {
        0.0
    } else {
        completed as f64 / total as f64 * 100.0
    };
    format!("Progress: {completed}/{total} ({percent:.2}%)")
}

fn truncate(line: String, width: Option<usize>) -> String {
    match width {
        Some(width) if line.chars().count() > width.saturating_sub(5) => {
            line.chars().take(width.saturating_sub(5)).collect()
        }
        _ => line,
    }
}

/// Renders progress. Every call happens with the tracker lock held, so an
/// implementation sees a consistent snapshot and never races another
/// writer on the console.
pub trait ProgressReporter: Send + Sync {
    fn begin(&self, _state: &ProgressState) {}

    /// Prints one log line above the footer.
    fn log(&self, message: &str, state: &ProgressState);

    fn redraw(&self, state: &ProgressState);

    fn finish(&self, _state: &ProgressState) {}
}

/// Shared counters plus the reporter that renders them. One lock covers
/// both, so a counter update and the matching redraw are atomic.
pub struct ProgressTracker {
    state: Mutex<ProgressState>,
    reporter: Arc<dyn ProgressReporter>,
}

impl ProgressTracker {
    pub fn new(state: ProgressState, reporter: Arc<dyn ProgressReporter>) -> Self {
        Self {
            state: Mutex::new(state),
            reporter,
        }
    }

    // Counters stay meaningful after a panic elsewhere, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, ProgressState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn begin(&self) {
        let state = self.lock();
        self.reporter.begin(&state);
    }

    pub fn log(&self, message: &str) {
        let state = self.lock();
        self.reporter.log(message, &state);
    }

    /// Counts one saved file for `source` and logs `message` in the same
    /// critical section.
    pub fn record_saved(&self, source: &str, message: &str) {
        let mut state = self.lock();
        state.record_saved(source);
        self.reporter.log(message, &state);
    }

    pub fn complete_entity(&self) {
        let mut state = self.lock();
        state.completed += 1;
        self.reporter.redraw(&state);
    }

    pub fn snapshot(&self) -> ProgressState {
        self.lock().clone()
    }

    pub fn finish(&self) {
        let state = self.lock();
        self.reporter.finish(&state);
    }
}

/// Live three-line footer at the bottom of the terminal.
#[derive(Debug, Default)]
pub struct TerminalFooter;

impl TerminalFooter {
    fn width() -> Option<usize> {
        terminal::size().ok().map(|(cols, _)| cols as usize)
    }

    fn clear(out: &mut impl Write) -> io::Result<()> {
        queue!(
            out,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            MoveToPreviousLine(1),
            Clear(ClearType::CurrentLine),
            MoveToPreviousLine(1),
            Clear(ClearType::CurrentLine)
        )
    }

    fn draw(out: &mut impl Write, state: &ProgressState) -> io::Result<()> {
        let [new_line, total_line, progress] = state.footer_lines(Self::width());
        write!(out, "{new_line}")?;
        queue!(out, Clear(ClearType::UntilNewLine))?;
        write!(out, "\n{total_line}")?;
        queue!(out, Clear(ClearType::UntilNewLine))?;
        write!(out, "\n{progress}")?;
        queue!(out, Clear(ClearType::UntilNewLine))?;
        out.flush()
    }

    fn log_line(message: &str, state: &ProgressState) -> io::Result<()> {
        let mut out = io::stdout().lock();
        Self::clear(&mut out)?;
        writeln!(out, "[{}] {message}", chrono::Local::now().format("%H:%M:%S"))?;
        Self::draw(&mut out, state)
    }

    fn redraw_footer(state: &ProgressState) -> io::Result<()> {
        let mut out = io::stdout().lock();
        Self::clear(&mut out)?;
        Self::draw(&mut out, state)
    }
}

impl ProgressReporter for TerminalFooter {
    fn begin(&self, state: &ProgressState) {
        let width = Self::width().unwrap_or(SEPARATOR_WIDTH).min(SEPARATOR_WIDTH);
        let mut out = io::stdout().lock();
        let result = writeln!(out, "{}", "-".repeat(width)).and_then(|_| Self::draw(&mut out, state));
        if let Err(err) = result {
            tracing::debug!("footer draw failed: {err}");
        }
    }

    fn log(&self, message: &str, state: &ProgressState) {
        if let Err(err) = Self::log_line(message, state) {
            tracing::debug!("footer draw failed: {err}");
        }
    }

    fn redraw(&self, state: &ProgressState) {
        if let Err(err) = Self::redraw_footer(state) {
            tracing::debug!("footer draw failed: {err}");
        }
    }

    fn finish(&self, _state: &ProgressState) {
        let mut out = io::stdout().lock();
        if let Err(err) = writeln!(out).and_then(|_| out.flush()) {
            tracing::debug!("footer teardown failed: {err}");
        }
    }
}

/// Headless reporter: log lines go to `tracing`, no footer is drawn.
#[derive(Debug, Default)]
pub struct LogReporter;

impl ProgressReporter for LogReporter {
    fn log(&self, message: &str, _state: &ProgressState) {
        tracing::info!("{message}");
    }

    fn redraw(&self, state: &ProgressState) {
        tracing::debug!("{}", progress_line(state.completed, state.total_entities));
    }

    fn finish(&self, state: &ProgressState) {
        tracing::info!("{}", progress_line(state.completed, state.total_entities));
    }
}
