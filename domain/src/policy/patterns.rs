//! Built-in pattern tables for the policy classifier.
//!
//! All patterns are compiled case-insensitively. Allow patterns are
//! anchored at the start of the command line; deny patterns match anywhere
//! so that a forbidden primitive is caught even inside a pipeline.

use serde::{Deserialize, Serialize};

/// Destructive or irreversible primitives. Denied under every mode.
pub const HARD_DENY: &[&str] = &[
    r"\bformat-volume\b",
    r"(?:^|[\s;&|(])format(?:\.com)?\s+[a-z]:",
    r"\bclear-disk\b",
    r"\binitialize-disk\b",
    r"\bremove-partition\b",
    r"\bdiskpart(?:\.exe)?\b",
    r"\bmkfs(?:\.\w+)?\b",
    r"\bdd\b.*\bof=/dev/",
    r"\bstop-computer\b",
    r"\brestart-computer\b",
    r"\bshutdown(?:\.exe)?\b",
    r"(?:^|[\s;&|(])(?:reboot|poweroff|halt)(?:\s|$)",
    r"\bbcdedit(?:\.exe)?\b",
    r"\bcipher(?:\.exe)?\s+/w\b",
    r"\bvssadmin(?:\.exe)?\b.*\bdelete\b",
    r"\bwevtutil(?:\.exe)?\s+(?:cl|clear-log)\b",
    r"\bclear-eventlog\b",
    r"\brm\s+(?:-\w+\s+)*/(?:\s|\*|$)",
];

/// Mutating verbs, deletion, downloads-to-disk and indirect execution.
pub const DENY_LIST: &[&str] = &[
    r"\bremove-item(?:property)?\b",
    r"(?:^|[\s;&|(])(?:del|erase|rd|rmdir|rm|ri)\s",
    r"\b(?:set|new|rename|move|copy)-item(?:property)?\b",
    r"\b(?:set|add|clear)-content\b",
    r"\bout-file\b",
    r"(?:^|[\s;&|(])reg(?:\.exe)?\s+(?:add|delete|import|restore|load|unload|copy)\b",
    r"\binvoke-webrequest\b.*\s-outfile\b",
    r"\b(?:iwr|curl|wget)(?:\.exe)?\b.*(?:\s-outfile\b|\s-o\b|\s--output\b)",
    r"(?:^|[\s;&|(])wget(?:\.exe)?\s",
    r"\bstart-bitstransfer\b",
    r"\bbitsadmin(?:\.exe)?\b",
    r"\bcertutil(?:\.exe)?\b.*-urlcache\b",
    r"\binvoke-expression\b",
    r"(?:^|[\s;&|(])iex(?:\s|$)",
    r"\bset-executionpolicy\b",
    r"\b(?:new|remove|set|stop)-service\b",
    r"(?:^|[\s;&|(])sc(?:\.exe)?\s+(?:create|delete|config|stop)\b",
    r"\bnet(?:\.exe)?\s+(?:user|localgroup)\b.*\s/(?:add|delete)\b",
    r"\b(?:icacls|takeown|chmod|chown)\b",
    r"\b(?:new|remove)-localuser\b",
    r"\badd-localgroupmember\b",
    r"\bset-mppreference\b",
    r"\bdisable-\w+",
];

/// Read-only diagnostics.
pub const TRIAGE: &[&str] = &[
    r"^\s*get-\w+\b",
    r"^\s*(?:test-netconnection|test-connection|test-path|resolve-dnsname|select-string|measure-object)\b",
    r"^\s*ipconfig(?:\.exe)?(?:\s+/all)?\s*$",
    r"^\s*(?:ping|tracert|traceroute|pathping|nslookup)(?:\.exe)?\s",
    r"^\s*(?:systeminfo|hostname|whoami|tasklist|netstat|driverquery)(?:\.exe)?\b",
    r"^\s*(?:uptime|uname|df|free|ps|lsblk|ss)\b",
    r"^\s*ip\s+(?:a|addr|route|link)\b",
];

/// Service restarts, cache flushes and built-in repair tools.
pub const MAINTENANCE: &[&str] = &[
    r"^\s*(?:restart|start)-service\s",
    r"^\s*clear-dnsclientcache\s*$",
    r"^\s*ipconfig(?:\.exe)?\s+/(?:flushdns|registerdns|renew|release)\s*$",
    r"^\s*restart-netadapter\s",
    r"^\s*sfc(?:\.exe)?\s+/scannow\s*$",
    r"^\s*dism(?:\.exe)?\s+/online\s+/cleanup-image\s+/(?:scanhealth|checkhealth|restorehealth)\s*$",
    r"^\s*gpupdate(?:\.exe)?(?:\s+/force)?\s*$",
    r"^\s*w32tm(?:\.exe)?\s+/resync\b",
    r"^\s*netsh(?:\.exe)?\s+(?:winsock|int\s+ip)\s+reset\s*$",
    r"^\s*systemctl\s+restart\s",
    r"^\s*resolvectl\s+flush-caches\s*$",
];

/// Kills of a single named or numbered process.
pub const TARGETED_KILL: &[&str] = &[
    r"^\s*stop-process\s+-(?:name|id)\s+[\w.\-]+(?:\s+-force)?\s*$",
    r"^\s*taskkill(?:\.exe)?(?:\s+/f)?\s+/(?:pid|im)\s+[\w.\-]+(?:\s+/f)?\s*$",
    r"^\s*kill\s+(?:-(?:9|15|kill|term)\s+)?\d+\s*$",
    r"^\s*pkill\s+(?:-x\s+)?[\w.\-]+\s*$",
];

/// Pattern tables for one classifier instance.
///
/// Operators can append allow patterns; the hard-deny and deny-list
/// tables can only grow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyPatterns {
    pub hard_deny: Vec<String>,
    pub deny: Vec<String>,
    pub triage: Vec<String>,
    pub maintenance: Vec<String>,
    pub kill: Vec<String>,
}

fn owned(patterns: &[&str]) -> Vec<String> {
    patterns.iter().map(|p| p.to_string()).collect()
}

impl PolicyPatterns {
    pub fn builtin() -> Self {
        Self {
            hard_deny: owned(HARD_DENY),
            deny: owned(DENY_LIST),
            triage: owned(TRIAGE),
            maintenance: owned(MAINTENANCE),
            kill: owned(TARGETED_KILL),
        }
    }

    pub fn with_extra_hard_deny(mut self, patterns: impl IntoIterator<Item = String>) -> Self {
        self.hard_deny.extend(patterns);
        self
    }

    pub fn with_extra_deny(mut self, patterns: impl IntoIterator<Item = String>) -> Self {
        self.deny.extend(patterns);
        self
    }

    pub fn with_extra_triage(mut self, patterns: impl IntoIterator<Item = String>) -> Self {
        self.triage.extend(patterns);
        self
    }

    pub fn with_extra_maintenance(mut self, patterns: impl IntoIterator<Item = String>) -> Self {
        self.maintenance.extend(patterns);
        self
    }

    pub fn with_extra_kill(mut self, patterns: impl IntoIterator<Item = String>) -> Self {
        self.kill.extend(patterns);
        self
    }
}

impl Default for PolicyPatterns {
    fn default() -> Self {
        Self::builtin()
    }
}
