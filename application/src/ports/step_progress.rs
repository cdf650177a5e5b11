//! Step progress port
//!
//! Lets the presentation layer follow a plan or an undo replay as it runs.
//! Every callback has a no-op default so adapters only implement what they
//! display.

use mender_domain::{StepOutcome, ToolCall};

/// Callback for step-level progress during `plan` and `undo`
pub trait StepProgressNotifier: Send + Sync {
    /// The planner returned `total` proposed calls
    fn on_plan_ready(&self, _total: usize) {}

    /// Step `index` (0-based) is about to be processed
    fn on_step_start(&self, _index: usize, _call: &ToolCall) {}

    /// Step `index` finished with `outcome`
    fn on_step_complete(&self, _index: usize, _tool_name: &str, _outcome: StepOutcome) {}

    /// An undo replay of `total` scripts is starting
    fn on_undo_start(&self, _total: usize) {}

    /// One undo script finished
    fn on_undo_step(&self, _tool_name: &str, _outcome: StepOutcome) {}
}

/// No-op notifier
pub struct NoStepProgress;

impl StepProgressNotifier for NoStepProgress {}
