//! Planner adapters
//!
//! Both implement the application's `Planner` port. Their output is a
//! proposal only; the engine validates every call again.

pub mod keyword;
pub mod plan_file;

pub use keyword::{KeywordPlanner, KeywordRule, builtin_rules};
pub use plan_file::{PlanFilePlanner, parse_plan};
