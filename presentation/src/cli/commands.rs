//! CLI command definitions

use clap::{Parser, Subcommand};
use mender_application::RunMode;
use mender_domain::SessionId;
use std::path::PathBuf;

/// CLI arguments for mender
#[derive(Parser, Debug)]
#[command(name = "mender")]
#[command(author, version, about = "Gated execution of remediation actions")]
#[command(long_about = r#"
mender turns a free-text issue description into a short plan of remediation
tool calls and runs them behind a policy gate.

Every step is:
1. Validated against the tool's parameter schema
2. Classified by the command policy (default deny, hard-deny ceiling)
3. Run in a bounded child process (timeout kills the whole tree)
4. Recorded in the append-only audit journal, with its undo script

Plans run dry unless `execute` is given. `undo` replays the recorded undo
scripts of a session newest-first.

Configuration files are loaded from (later wins):
1. ~/.config/mender/config.toml   Global config
2. ./mender.toml or ./.mender.toml   Project-level config
3. --config <path>                Explicit config file
4. MENDER_* environment variables (MENDER_EXECUTION__TIMEOUT_SECONDS=30)

Example:
  mender plan "Outlook is slow to start"
  mender plan "websites won't resolve" execute
  mender --allow-maintenance plan "printer queue is stuck" execute
  mender undo --dry
  mender history --limit 50
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Allow maintenance commands (service restarts, cache flushes)
    #[arg(long, global = true)]
    pub allow_maintenance: bool,

    /// Allow targeted process kills
    #[arg(long, global = true)]
    pub allow_kill: bool,

    /// Allow any raw command except those on the hard-deny list (bypasses the deny list and allow tables)
    #[arg(long, global = true)]
    pub allow_dangerous: bool,

    /// Per-action timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Plan remediation steps for an issue and run or preview them
    Plan {
        /// Free-text description of the problem
        issue: String,

        /// `dry` shows the scripts, `execute` runs them
        #[arg(value_name = "MODE", default_value = "dry")]
        mode: RunMode,

        /// Read the plan from a JSON file instead of the keyword planner
        #[arg(long, value_name = "PATH")]
        plan_file: Option<PathBuf>,
    },

    /// Replay the undo scripts of a session, newest first
    Undo {
        /// Session to reverse (default: the latest action session)
        #[arg(long, value_name = "ID")]
        session: Option<SessionId>,

        /// List the undo scripts without running them
        #[arg(long)]
        dry: bool,
    },

    /// Show journal entries
    History {
        /// Number of most recent entries to show
        #[arg(short = 'n', long, value_name = "N", default_value_t = 20)]
        limit: usize,

        /// Show every entry of one session instead
        #[arg(long, value_name = "ID")]
        session: Option<SessionId>,

        /// Print the raw entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the registered tools
    Tools,

    /// Show configuration file locations and the effective configuration
    Config,
}
