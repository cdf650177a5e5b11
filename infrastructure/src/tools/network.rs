//! Network remediation: FlushDnsCache

use super::script::with_verdict;
use mender_domain::{Capability, ExecutionResult, ToolCall, ToolDescriptor};

/// Tool name constant
pub const FLUSH_DNS_CACHE: &str = "FlushDnsCache";

/// Get the tool descriptor for FlushDnsCache
pub fn flush_dns_cache_descriptor() -> ToolDescriptor {
    ToolDescriptor::new(
        FLUSH_DNS_CACHE,
        "Clear the DNS client cache (stale or wrong name resolution). Not reversible.",
    )
}

pub struct FlushDnsCache {
    descriptor: ToolDescriptor,
}

impl FlushDnsCache {
    pub fn new() -> Self {
        Self {
            descriptor: flush_dns_cache_descriptor(),
        }
    }
}

impl Default for FlushDnsCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Capability for FlushDnsCache {
    fn describe(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    fn execute(&self, _call: &ToolCall) -> ExecutionResult {
        ExecutionResult::planned(with_verdict(
            "Clear-DnsClientCache\n\
             $result.entries = @(Get-DnsClientCache).Count",
        ))
    }
}
