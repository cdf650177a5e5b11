//! Console output formatter for run, undo and journal views

use colored::{ColoredString, Colorize};
use mender_application::{RunMode, RunReport, StepReport, UndoReport};
use mender_domain::util::ellipsize;
use mender_domain::{EntryKind, JournalEntry, StepOutcome, ToolDescriptor};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

const OUTPUT_PREVIEW: usize = 120;

/// Formats engine results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the report of one planned run
    pub fn format_run(report: &RunReport) -> String {
        let mut output = String::new();

        let title = match report.mode {
            RunMode::Dry => "Remediation Plan (dry run)",
            RunMode::Execute => "Remediation Run",
        };
        output.push_str(&Self::header(title));
        output.push('\n');

        output.push_str(&format!("{} {}\n", "Issue:".cyan().bold(), report.goal));
        output.push_str(&format!(
            "{} {}\n",
            "Session:".cyan().bold(),
            report.session_id
        ));

        output.push_str(&Self::section_header("Steps"));
        if report.steps.is_empty() && report.halted.is_none() {
            output.push_str(&format!("\n{}\n", "No steps.".dimmed()));
        }
        for step in &report.steps {
            output.push_str(&Self::format_step(step));
        }

        if let Some(reason) = &report.halted {
            output.push_str(&format!("\n{} {}\n", "Aborted:".red().bold(), reason));
        }

        output.push_str(&format!("\n{}\n", Self::run_summary(report)));
        if report.mode == RunMode::Dry && report.halted.is_none() && !report.steps.is_empty() {
            output.push_str(&format!(
                "{}\n",
                "Nothing was run. Re-run with `execute` to apply.".dimmed()
            ));
        }

        output.push_str(&Self::footer());
        output
    }

    fn format_step(step: &StepReport) -> String {
        let mut output = format!(
            "\n{} {} {}\n",
            format!("[{}]", step.index + 1).bold(),
            step.tool_name.yellow().bold(),
            Self::outcome_label(step.outcome)
        );

        if let Some(args) = Self::compact_arguments(&step.arguments) {
            output.push_str(&format!("    {} {}\n", "args:".dimmed(), args));
        }

        match step.outcome {
            StepOutcome::Planned => {
                if step
                    .result
                    .data
                    .as_ref()
                    .and_then(|d| d.get("requires_elevation"))
                    .and_then(Value::as_bool)
                    .unwrap_or(false)
                {
                    output.push_str(&format!(
                        "    {} requires elevated privilege when executed\n",
                        "note:".yellow()
                    ));
                }
                if let Some(script) = step.result.forward() {
                    output.push_str(&Self::indent(script, 6));
                }
                if let Some(undo) = step.result.undo() {
                    output.push_str(&format!("    {}\n", "undo:".dimmed()));
                    output.push_str(&Self::indent(undo, 6));
                }
            }
            StepOutcome::PolicyRejected => {
                if let Some(policy) = &step.policy {
                    output.push_str(&format!("    {} {}\n", "policy:".dimmed(), policy));
                }
            }
            StepOutcome::ValidationFailed => {
                let issues = step
                    .result
                    .data
                    .as_ref()
                    .and_then(|d| d.get("issues"))
                    .and_then(Value::as_array);
                for issue in issues.into_iter().flatten() {
                    output.push_str(&format!("    {} {}\n", "-".red(), Self::issue_text(issue)));
                }
            }
            _ => {}
        }

        if !step.outcome.is_success()
            && step.outcome != StepOutcome::ValidationFailed
            && let Some(error) = &step.result.error
        {
            output.push_str(&format!("    {} {}\n", "error:".red(), error));
        }

        if let Some(text) = step
            .result
            .data
            .as_ref()
            .and_then(|d| d.get("output"))
            .and_then(Value::as_str)
            && !text.trim().is_empty()
            && step.outcome != StepOutcome::PolicyRejected
        {
            output.push_str(&format!(
                "    {} {}\n",
                "output:".dimmed(),
                ellipsize(text.trim(), OUTPUT_PREVIEW)
            ));
        }

        output
    }

    fn run_summary(report: &RunReport) -> String {
        let mut parts = Vec::new();
        for outcome in [
            StepOutcome::Planned,
            StepOutcome::Succeeded,
            StepOutcome::Failed,
            StepOutcome::TimedOut,
            StepOutcome::PolicyRejected,
            StepOutcome::ValidationFailed,
        ] {
            let n = report.count(outcome);
            if n > 0 {
                parts.push(format!("{} {}", n, outcome));
            }
        }
        let label = if report.all_succeeded() {
            "Summary:".green().bold()
        } else {
            "Summary:".red().bold()
        };
        if parts.is_empty() {
            format!("{} no steps", label)
        } else {
            format!("{} {}", label, parts.join(", "))
        }
    }

    /// Format the report of an undo replay
    pub fn format_undo(report: &UndoReport) -> String {
        let mut output = String::new();

        let title = if report.dry_run {
            "Undo (dry run)"
        } else {
            "Undo"
        };
        output.push_str(&Self::header(title));
        output.push('\n');
        output.push_str(&format!(
            "{} {}\n",
            "Target session:".cyan().bold(),
            report.target_session
        ));
        if let Some(session) = &report.undo_session {
            output.push_str(&format!("{} {}\n", "Undo session:".cyan().bold(), session));
        }

        output.push_str(&Self::section_header("Scripts (newest first)"));
        if report.steps.is_empty() {
            output.push_str(&format!("\n{}\n", "Nothing in this session can be undone.".dimmed()));
        }
        for step in &report.steps {
            output.push_str(&format!(
                "\n{} {} {}\n",
                step.tool_name.yellow().bold(),
                format!("({})", step.original_timestamp.format("%Y-%m-%d %H:%M:%S UTC")).dimmed(),
                Self::outcome_label(step.outcome)
            ));
            if report.dry_run {
                output.push_str(&Self::indent(&step.script, 4));
            } else if let Some(error) = &step.result.error {
                output.push_str(&format!("    {} {}\n", "error:".red(), error));
            }
        }

        output.push('\n');
        if report.skipped > 0 {
            output.push_str(&format!(
                "{}\n",
                format!("{} entr(ies) had no undo script.", report.skipped).dimmed()
            ));
        }
        if !report.dry_run {
            let summary = format!(
                "{} of {} undo script(s) failed",
                report.failures(),
                report.steps.len()
            );
            if report.failures() == 0 {
                output.push_str(&format!("{} {}\n", "Summary:".green().bold(), summary));
            } else {
                output.push_str(&format!("{} {}\n", "Summary:".red().bold(), summary));
            }
        }

        output.push_str(&Self::footer());
        output
    }

    /// One line per journal entry, oldest first
    pub fn format_history(entries: &[JournalEntry]) -> String {
        if entries.is_empty() {
            return format!("{}\n", "The journal is empty.".dimmed());
        }

        let mut output = String::new();
        let mut current_session = None;
        for entry in entries {
            if current_session != Some(&entry.session_id) {
                output.push_str(&format!(
                    "\n{} {}\n",
                    "Session".cyan().bold(),
                    entry.session_id
                ));
                current_session = Some(&entry.session_id);
            }

            let kind = match entry.kind {
                EntryKind::Action => "action".normal(),
                EntryKind::Undo => "undo".magenta(),
            };
            let reversible = match (entry.replayable_undo(), &entry.reverses) {
                (Some(_), _) => " [undoable]".dimmed().to_string(),
                (None, Some(target)) => format!(" [reverses {}]", target).dimmed().to_string(),
                (None, None) => String::new(),
            };
            output.push_str(&format!(
                "  {} {:<6} {} {}{}\n",
                entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
                kind,
                entry.tool_name.bold(),
                Self::outcome_label(entry.outcome),
                reversible
            ));
            if let Some(error) = &entry.result.error {
                output.push_str(&format!(
                    "      {}\n",
                    ellipsize(error, OUTPUT_PREVIEW).red()
                ));
            }
        }
        output
    }

    /// The registered tools
    pub fn format_tools<'a>(tools: impl IntoIterator<Item = &'a ToolDescriptor>) -> String {
        let mut output = Self::header("Tools");
        output.push('\n');

        for tool in tools {
            let mut flags = vec![tool.kind.as_str().to_string()];
            if tool.reversible {
                flags.push("reversible".to_string());
            }
            if tool.requires_elevated_privilege {
                flags.push("elevated".to_string());
            }
            output.push_str(&format!(
                "\n{} {}\n  {}\n",
                tool.name.yellow().bold(),
                format!("[{}]", flags.join(", ")).dimmed(),
                tool.description
            ));
            for param in &tool.parameters {
                let required = if param.required { "required" } else { "optional" };
                output.push_str(&format!(
                    "    {} ({}, {}): {}\n",
                    param.name.cyan(),
                    param.param_type,
                    required,
                    param.description
                ));
            }
        }

        output.push_str(&Self::footer());
        output
    }

    /// Configuration file locations, marking the ones that exist
    pub fn format_config_sources<'a>(
        sources: impl IntoIterator<Item = (&'a str, &'a Path, bool)>,
    ) -> String {
        let mut output = Self::section_header("Configuration files");
        for (label, path, found) in sources {
            let status = if found {
                "found".green()
            } else {
                "not found".dimmed()
            };
            output.push_str(&format!("  {:<9} {} ({})\n", label, path.display(), status));
        }
        output
    }

    /// Format as JSON
    pub fn format_json<T: Serialize + ?Sized>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }

    fn outcome_label(outcome: StepOutcome) -> ColoredString {
        let text = outcome.as_str();
        match outcome {
            StepOutcome::Succeeded => text.green(),
            StepOutcome::Planned => text.cyan(),
            StepOutcome::PolicyRejected | StepOutcome::ValidationFailed => text.yellow(),
            StepOutcome::Failed | StepOutcome::TimedOut => text.red().bold(),
        }
    }

    fn issue_text(issue: &Value) -> String {
        let message = issue.get("message").and_then(Value::as_str);
        match (issue.get("parameter").and_then(Value::as_str), message) {
            (Some(param), Some(message)) => format!("{}: {}", param, message),
            (None, Some(message)) => message.to_string(),
            _ => issue.as_str().map(str::to_string).unwrap_or_else(|| issue.to_string()),
        }
    }

    fn compact_arguments(arguments: &Value) -> Option<String> {
        match arguments {
            Value::Null => None,
            Value::Object(map) if map.is_empty() => None,
            Value::Object(map) => Some(
                map.iter()
                    .map(|(k, v)| match v {
                        Value::String(s) => format!("{}={}", k, s),
                        other => format!("{}={}", k, other),
                    })
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            other => Some(other.to_string()),
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    fn indent(text: &str, width: usize) -> String {
        let pad = " ".repeat(width);
        text.lines()
            .map(|line| format!("{}{}\n", pad, line))
            .collect()
    }
}
