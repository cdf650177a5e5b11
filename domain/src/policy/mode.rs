//! Operator-supplied policy mode flags

use serde::{Deserialize, Serialize};

/// Mode flags gating categories of otherwise-denied commands.
///
/// The default is triage-only: read-only diagnostics are allowed and
/// everything else is denied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyMode {
    /// Allow maintenance commands (service restarts, cache flushes, repairs)
    pub allow_maintenance: bool,
    /// Allow targeted process kills by name or id
    pub allow_kill: bool,
    /// Allow everything below the hard-deny ceiling
    pub allow_dangerous: bool,
}

impl PolicyMode {
    pub fn triage_only() -> Self {
        Self::default()
    }

    pub fn with_maintenance(mut self, allow: bool) -> Self {
        self.allow_maintenance = allow;
        self
    }

    pub fn with_kill(mut self, allow: bool) -> Self {
        self.allow_kill = allow;
        self
    }

    pub fn with_dangerous(mut self, allow: bool) -> Self {
        self.allow_dangerous = allow;
        self
    }

    /// Every combination of the three flags
    pub fn all_combinations() -> impl Iterator<Item = PolicyMode> {
        (0u8..8).map(|bits| PolicyMode {
            allow_maintenance: bits & 1 != 0,
            allow_kill: bits & 2 != 0,
            allow_dangerous: bits & 4 != 0,
        })
    }
}

impl std::fmt::Display for PolicyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut flags = vec!["triage"];
        if self.allow_maintenance {
            flags.push("maintenance");
        }
        if self.allow_kill {
            flags.push("kill");
        }
        if self.allow_dangerous {
            flags.push("dangerous");
        }
        write!(f, "{}", flags.join("+"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_triage_only() {
        let mode = PolicyMode::default();
        assert_eq!(mode, PolicyMode::triage_only());
        assert_eq!(mode.to_string(), "triage");
    }

    #[test]
    fn test_builder_and_display() {
        let mode = PolicyMode::triage_only().with_maintenance(true).with_kill(true);
        assert_eq!(mode.to_string(), "triage+maintenance+kill");
    }

    #[test]
    fn test_all_combinations_are_distinct() {
        let modes: Vec<PolicyMode> = PolicyMode::all_combinations().collect();
        assert_eq!(modes.len(), 8);
        for (i, a) in modes.iter().enumerate() {
            for b in &modes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
