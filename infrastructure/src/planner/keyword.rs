//! Rule-based planner.
//!
//! Matches the issue description against keyword rules and proposes the
//! calls of every rule that fires, in rule order. Useful on its own for
//! common issues, and as the offline stand-in for a model-driven planner.

use async_trait::async_trait;
use mender_application::ports::planner::{Planner, PlannerError};
use mender_domain::{DomainError, ToolCall, ToolDescriptor};
use regex::{Regex, RegexBuilder};
use serde_json::{Value, json};
use tracing::debug;

/// One issue pattern and the calls it proposes
#[derive(Debug, Clone)]
pub struct KeywordRule {
    pattern: Regex,
    calls: Vec<ToolCall>,
}

impl KeywordRule {
    /// Rule firing on a case-insensitive regular expression
    pub fn new(pattern: &str, calls: Vec<ToolCall>) -> Result<Self, DomainError> {
        Ok(Self {
            pattern: RegexBuilder::new(pattern).case_insensitive(true).build()?,
            calls,
        })
    }

    /// Rule firing when any of `keywords` appears as a whole word
    pub fn keywords<S: AsRef<str>>(keywords: &[S], calls: Vec<ToolCall>) -> Result<Self, DomainError> {
        let alternatives: Vec<String> = keywords
            .iter()
            .map(|k| regex::escape(k.as_ref().trim()))
            .filter(|k| !k.is_empty())
            .collect();
        Self::new(&format!(r"\b(?:{})\b", alternatives.join("|")), calls)
    }

    pub fn matches(&self, goal: &str) -> bool {
        self.pattern.is_match(goal)
    }
}

fn call(tool: &str, arguments: Value) -> ToolCall {
    ToolCall::new(tool).with_arguments(arguments)
}

fn command(text: &str) -> ToolCall {
    call("run_command", json!({ "command": text }))
}

/// Rules for the built-in capabilities
pub fn builtin_rules() -> Vec<KeywordRule> {
    let rules = [
        (
            r"\boutlook\b",
            vec![call("DisableOutlookAddins", json!({"Scope": "CurrentUser"}))],
        ),
        (
            r"\bdns\b|\bweb ?sites?\b|name resolution",
            vec![command("Resolve-DnsName example.com"), call("FlushDnsCache", json!({}))],
        ),
        (
            r"\bprint(?:er|ing|s)?\b|\bspooler\b",
            vec![
                command("Get-Service Spooler"),
                call("RestartService", json!({"Name": "Spooler"})),
            ],
        ),
        (
            r"\bslow\b|\bsluggish\b|\bfreez\w*\b|\bhigh cpu\b",
            vec![command(
                "Get-Process | Sort-Object CPU -Descending | Select-Object -First 10",
            )],
        ),
        (
            r"\bdisk\b|\bstorage\b|\bspace\b",
            vec![command("Get-Volume")],
        ),
        (
            r"\bnetwork\b|\binternet\b|\bwi-?fi\b|\boffline\b",
            vec![command("ipconfig /all")],
        ),
        (
            r"\bsearch index\w*\b|\bindexing\b",
            vec![call(
                "SetServiceStartupType",
                json!({"Name": "WSearch", "StartupType": "Disabled"}),
            )],
        ),
    ];

    rules
        .into_iter()
        .filter_map(|(pattern, calls)| KeywordRule::new(pattern, calls).ok())
        .collect()
}

pub struct KeywordPlanner {
    rules: Vec<KeywordRule>,
}

impl KeywordPlanner {
    pub fn new(rules: Vec<KeywordRule>) -> Self {
        Self { rules }
    }

    pub fn builtin() -> Self {
        Self::new(builtin_rules())
    }

    /// Append rules (configured rules go after the built-in ones)
    pub fn with_rules(mut self, rules: impl IntoIterator<Item = KeywordRule>) -> Self {
        self.rules.extend(rules);
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[async_trait]
impl Planner for KeywordPlanner {
    async fn plan(
        &self,
        goal: &str,
        catalog: &[ToolDescriptor],
    ) -> Result<Vec<ToolCall>, PlannerError> {
        let mut calls: Vec<ToolCall> = Vec::new();
        for rule in self.rules.iter().filter(|r| r.matches(goal)) {
            for proposed in &rule.calls {
                let duplicate = calls
                    .iter()
                    .any(|c| c.tool_name == proposed.tool_name && c.arguments == proposed.arguments);
                if !duplicate {
                    calls.push(proposed.clone());
                }
            }
        }

        debug!(
            "Keyword planner matched {} call(s) against a catalog of {}",
            calls.len(),
            catalog.len()
        );
        if calls.is_empty() {
            return Err(PlannerError::NoMatch(goal.to_string()));
        }
        Ok(calls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(calls: &[ToolCall]) -> Vec<&str> {
        calls.iter().map(|c| c.tool_name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_outlook_issue() {
        let calls = KeywordPlanner::builtin()
            .plan("Outlook takes forever to start", &[])
            .await
            .unwrap();
        assert_eq!(names(&calls), vec!["DisableOutlookAddins"]);
        assert_eq!(calls[0].get_string("Scope"), Some("CurrentUser"));
    }

    #[tokio::test]
    async fn test_multiple_rules_fire_in_order() {
        let calls = KeywordPlanner::builtin()
            .plan("PC is slow and the printer is stuck", &[])
            .await
            .unwrap();
        assert_eq!(
            names(&calls),
            vec!["run_command", "RestartService", "run_command"]
        );
    }

    #[tokio::test]
    async fn test_duplicates_are_dropped() {
        let planner = KeywordPlanner::new(Vec::new()).with_rules([
            KeywordRule::keywords(&["vpn"], vec![command("ipconfig /all")]).unwrap(),
            KeywordRule::keywords(&["network"], vec![command("ipconfig /all")]).unwrap(),
        ]);
        let calls = planner.plan("VPN network down", &[]).await.unwrap();
        assert_eq!(calls.len(), 1);
    }

    #[tokio::test]
    async fn test_no_match() {
        let err = KeywordPlanner::builtin()
            .plan("my chair squeaks", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, PlannerError::NoMatch(_)));
    }

    #[test]
    fn test_keywords_are_escaped_whole_words() {
        let rule = KeywordRule::keywords(&["c++", " teams "], Vec::new()).unwrap();
        assert!(rule.matches("Teams keeps crashing"));
        assert!(!rule.matches("steamship"));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(KeywordRule::new("(unclosed", Vec::new()).is_err());
    }

    #[test]
    fn test_builtin_rules_all_compile() {
        assert_eq!(builtin_rules().len(), 7);
    }
}
