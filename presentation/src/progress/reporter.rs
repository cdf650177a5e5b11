//! Progress reporting for plan runs and undo replays

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use mender_application::StepProgressNotifier;
use mender_domain::{StepOutcome, ToolCall};
use std::sync::Mutex;
use std::time::Duration;

/// Reports step progress with an indicatif bar
pub struct ProgressReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn step_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn start(&self, prefix: &str, total: usize) {
        if total == 0 {
            return;
        }
        let pb = ProgressBar::new(total as u64);
        pb.set_style(Self::step_style());
        pb.set_prefix(prefix.to_string());
        pb.enable_steady_tick(Duration::from_millis(120));

        if let Ok(mut bar) = self.bar.lock() {
            *bar = Some(pb);
        }
    }

    fn advance(&self, tool_name: &str, outcome: StepOutcome) {
        let done = match self.bar.lock().ok().as_deref().and_then(Option::as_ref) {
            Some(pb) => {
                pb.set_message(status_line(tool_name, outcome));
                pb.inc(1);
                pb.length().is_some_and(|len| pb.position() >= len)
            }
            None => false,
        };
        if done {
            self.finish();
        }
    }

    /// Clear the bar, e.g. when a run stops early
    pub fn finish(&self) {
        if let Some(pb) = self.bar.lock().ok().and_then(|mut bar| bar.take()) {
            pb.finish_and_clear();
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl StepProgressNotifier for ProgressReporter {
    fn on_plan_ready(&self, total: usize) {
        self.start("Steps", total);
    }

    fn on_step_start(&self, _index: usize, call: &ToolCall) {
        if let Ok(guard) = self.bar.lock()
            && let Some(pb) = guard.as_ref()
        {
            pb.set_message(format!("{}...", call.tool_name));
        }
    }

    fn on_step_complete(&self, _index: usize, tool_name: &str, outcome: StepOutcome) {
        self.advance(tool_name, outcome);
    }

    fn on_undo_start(&self, total: usize) {
        self.start("Undo", total);
    }

    fn on_undo_step(&self, tool_name: &str, outcome: StepOutcome) {
        self.advance(tool_name, outcome);
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl StepProgressNotifier for SimpleProgress {
    fn on_plan_ready(&self, total: usize) {
        println!("{} {} ({} steps)", "->".cyan(), "Plan".bold(), total);
    }

    fn on_step_complete(&self, index: usize, tool_name: &str, outcome: StepOutcome) {
        println!("  {}. {}", index + 1, status_line(tool_name, outcome));
    }

    fn on_undo_start(&self, total: usize) {
        println!("{} {} ({} scripts)", "->".cyan(), "Undo".bold(), total);
    }

    fn on_undo_step(&self, tool_name: &str, outcome: StepOutcome) {
        println!("  {}", status_line(tool_name, outcome));
    }
}

fn status_line(tool_name: &str, outcome: StepOutcome) -> String {
    if outcome.is_success() {
        format!("{} {}", "v".green(), tool_name)
    } else {
        format!("{} {} ({})", "x".red(), tool_name, outcome)
    }
}
