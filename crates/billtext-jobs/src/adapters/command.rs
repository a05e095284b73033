//! Shared runner for external converter commands.

use std::time::Duration;

use tokio::process::Command;

use billtext_core::{Error, Result};

/// Run a command with a timeout, returning raw stdout.
///
/// Output is returned undecoded; the extractor decides how to treat
/// invalid UTF-8.
pub(crate) async fn run_cmd_with_timeout(cmd: &mut Command, timeout: Duration) -> Result<Vec<u8>> {
    // A timed-out child is killed when its handle drops.
    cmd.kill_on_drop(true);

    let output = tokio::time::timeout(timeout, cmd.output())
        .await
        .map_err(|_| {
            Error::Extraction(format!(
                "External command timed out after {}s",
                timeout.as_secs()
            ))
        })?
        .map_err(|e| Error::Extraction(format!("Failed to execute command: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Extraction(format!(
            "Command failed ({}): {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(output.stdout)
}

/// Whether `program` can be spawned with `arg`, accepting the listed exit codes.
pub(crate) async fn probe(program: &str, arg: &str, ok_codes: &[i32]) -> bool {
    match Command::new(program).arg(arg).output().await {
        Ok(output) => {
            output.status.success()
                || output
                    .status
                    .code()
                    .map(|code| ok_codes.contains(&code))
                    .unwrap_or(false)
        }
        Err(_) => false,
    }
}
