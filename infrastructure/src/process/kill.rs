//! Process-tree isolation and kill.
//!
//! Unix: the child leads its own process group, so one `killpg` reaches
//! every descendant that did not call `setsid`. Linux additionally asks the
//! kernel to SIGKILL the child if the engine itself dies.
//! Windows: `taskkill /T /F` walks the tree by parent pid.

use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// Configure a command so its whole tree can be killed later
pub fn isolate(cmd: &mut Command) {
    #[cfg(unix)]
    {
        cmd.process_group(0);
    }

    // Linux: request kernel to send SIGKILL to child when parent dies.
    #[cfg(target_os = "linux")]
    unsafe {
        cmd.pre_exec(|| {
            libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGKILL);
            Ok(())
        });
    }

    #[cfg(not(unix))]
    let _ = cmd;
}

/// Kill `child` and everything it started, then reap it
pub async fn kill_tree(child: &mut Child, pid: Option<u32>) {
    if let Some(pid) = pid {
        kill_group(pid).await;
    }
    // Fallback for a leader that is somehow still around
    if let Err(e) = child.start_kill() {
        debug!("start_kill after tree kill: {}", e);
    }
    if let Err(e) = child.wait().await {
        warn!("Could not reap killed process {:?}: {}", pid, e);
    }
}

#[cfg(unix)]
async fn kill_group(pid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return;
    };
    // SAFETY: killpg has no memory-safety preconditions
    let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if rc != 0 {
        debug!(
            "killpg({}) failed: {}",
            pgid,
            std::io::Error::last_os_error()
        );
    }
}

#[cfg(windows)]
async fn kill_group(pid: u32) {
    let status = Command::new("taskkill")
        .args(["/T", "/F", "/PID", &pid.to_string()])
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .await;
    match status {
        Ok(s) if s.success() => {}
        Ok(s) => debug!("taskkill for {} exited with {}", pid, s),
        Err(e) => warn!("Could not run taskkill for {}: {}", pid, e),
    }
}

#[cfg(not(any(unix, windows)))]
async fn kill_group(_pid: u32) {}
