use crate::types::progress::DownloadProgress;
use crate::utils::logger::{LogLevel, Logger};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::cell::Cell;
use std::fmt::Display;
use std::time::Duration;

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub struct Spinner {
    bar: ProgressBar,
    active: Cell<bool>,
}

impl Spinner {
    pub fn new(message: impl Into<String>) -> Self {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(style);
        bar.set_message(message.into());
        bar.enable_steady_tick(Duration::from_millis(80));

        Spinner {
            bar,
            active: Cell::new(true),
        }
    }

    pub fn succeed(&self, message: impl Into<String>) {
        if self.active.get() {
            self.bar.finish_and_clear();
            Logger::new().log_message(LogLevel::Success, &message.into());
            self.active.set(false);
        }
    }

    pub fn fail(&self, message: impl Into<String>) {
        if self.active.get() {
            self.bar.finish_and_clear();
            Logger::new().log_message(LogLevel::Error, &message.into());
            self.active.set(false);
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if self.active.get() {
            self.bar.abandon();
            self.active.set(false);
        }
    }
}

/// Runs an async step behind a spinner, logging the outcome.
pub async fn run_step<T, E, Fut, S>(start_message: &str, on_success: S, action: Fut) -> Result<T, E>
where
    Fut: std::future::Future<Output = Result<T, E>>,
    S: FnOnce(&T) -> String,
    E: Display,
{
    let spinner = Spinner::new(start_message);
    match action.await {
        Ok(value) => {
            spinner.succeed(on_success(&value));
            Ok(value)
        }
        Err(err) => {
            spinner.fail(err.to_string());
            Err(err)
        }
    }
}

/// Byte progress bars for concurrent downloads.
pub struct DownloadBars {
    multi: MultiProgress,
}

impl DownloadBars {
    pub fn new() -> Self {
        DownloadBars {
            multi: MultiProgress::new(),
        }
    }

    pub fn add(&self, label: &str) -> DownloadBar {
        let bar = self.multi.add(ProgressBar::new_spinner());
        let style = ProgressStyle::with_template(
            "{spinner} {prefix:.bold} {msg} [{bar:30}] {bytes}/{total_bytes}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .tick_strings(TICKS)
        .progress_chars("=> ");
        bar.set_style(style);
        bar.set_prefix(label.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        DownloadBar { bar }
    }
}

impl Default for DownloadBars {
    fn default() -> Self {
        Self::new()
    }
}

pub struct DownloadBar {
    bar: ProgressBar,
}

impl DownloadBar {
    pub fn set_message(&self, message: impl Into<String>) {
        self.bar.set_message(message.into());
    }

    pub fn update(&self, progress: &DownloadProgress) {
        if self.bar.length() != Some(progress.total) {
            self.bar.set_length(progress.total);
        }
        self.bar.set_position(progress.downloaded);
        if progress.is_complete() {
            self.bar.set_message("downloaded");
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
