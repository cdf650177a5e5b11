//! PowerShell script helpers shared by the built-in capabilities.

/// Quote a value as a single-quoted PowerShell literal
pub fn ps_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Wrap `body` so the script always ends by printing one JSON verdict line.
///
/// `body` must leave a hashtable named `$result` with the fields to report;
/// `success = $true` is added when the body completes and an exception
/// becomes `success = $false` with its message.
pub fn with_verdict(body: &str) -> String {
    format!(
        "$ErrorActionPreference = 'Stop'\n\
         $result = @{{}}\n\
         try {{\n\
         {body}\n\
         $result.success = $true\n\
         }} catch {{\n\
         $result = @{{ success = $false; error = $_.Exception.Message }}\n\
         }}\n\
         $result | ConvertTo-Json -Compress"
    )
}
