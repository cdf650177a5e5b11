//! Policy domain module
//!
//! Decides whether a raw command line may run under the operator's
//! [`PolicyMode`]. The classifier is a pure function of the command text and
//! the mode; it never looks at the environment.
//!
//! Only raw-command capabilities are classified. Structured capabilities
//! generate their own scripts and are gated by the catalog and the
//! argument schema instead.

pub mod classifier;
pub mod mode;
pub mod patterns;

pub use classifier::{PolicyClassifier, PolicyDecision, PolicyRule, Verdict};
pub use mode::PolicyMode;
pub use patterns::PolicyPatterns;
