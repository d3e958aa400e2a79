//! Fetch progress with CI fallback

use super::context::UiContext;
use super::output::step_info;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Mode {
    /// Nothing at all (library use and tests)
    Hidden,
    /// One info line when fetching starts
    Plain,
    /// Indicatif bar on stderr
    Bar(ProgressBar),
}

/// Progress of the fetch pipeline.
///
/// Shows an indicatif bar on an interactive stderr, a single info line in CI.
/// Cloning shares the same bar so every worker can advance it.
#[derive(Debug, Clone)]
pub struct FetchProgress {
    mode: Mode,
}

impl FetchProgress {
    /// Create a progress indicator suited to the context
    pub fn new(ctx: &UiContext) -> Self {
        let mode = if ctx.use_fancy_output() {
            let bar = ProgressBar::new(0);
            let style = ProgressStyle::default_bar()
                .template("  {spinner:.cyan} Fetching  {bar:20.cyan/dim} {pos}/{len} {msg:.dim}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                .progress_chars("━╸─");
            bar.set_style(style);
            Mode::Bar(bar)
        } else {
            Mode::Plain
        };
        Self { mode }
    }

    /// A progress indicator that prints nothing
    pub fn hidden() -> Self {
        Self {
            mode: Mode::Hidden,
        }
    }

    /// Begin tracking `len` fetch jobs
    pub fn start(&self, len: usize) {
        match &self.mode {
            Mode::Hidden => {}
            Mode::Plain => step_info("Fetching dependency data, this may take a moment..."),
            Mode::Bar(bar) => {
                bar.set_length(len as u64);
                bar.set_position(0);
                bar.enable_steady_tick(Duration::from_millis(120));
            }
        }
    }

    /// Record one finished job
    pub fn advance(&self, name: &str) {
        if let Mode::Bar(bar) = &self.mode {
            bar.set_message(name.to_string());
            bar.inc(1);
        }
    }

    /// Finish and clear the progress bar
    pub fn finish(&self) {
        if let Mode::Bar(bar) = &self.mode {
            bar.disable_steady_tick();
            bar.finish_and_clear();
        }
    }
}
