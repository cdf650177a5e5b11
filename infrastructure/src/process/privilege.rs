//! Elevated-privilege check.

/// Whether the engine runs as root (Unix) or as an administrator (Windows)
pub fn is_elevated() -> bool {
    #[cfg(unix)]
    {
        // SAFETY: geteuid cannot fail and touches no memory
        unsafe { libc::geteuid() == 0 }
    }

    // `net session` only succeeds from an elevated token
    #[cfg(windows)]
    {
        std::process::Command::new("net")
            .arg("session")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    #[cfg(not(any(unix, windows)))]
    {
        false
    }
}
