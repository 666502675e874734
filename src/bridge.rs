//! Relays the debug protocol between our stdio and the debugger socket.

use anyhow::{Context, Result};
use sockdap_dap::TransportHandle;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Copy stdin to the socket and the socket to stdout until either side
/// closes or Ctrl-C is pressed.
#[cfg(unix)]
pub async fn bridge_stdio(handle: &TransportHandle) -> Result<()> {
    let stream = handle
        .connect()
        .await
        .with_context(|| format!("failed to connect to {}", handle.path().display()))?;
    let (mut reader, mut writer) = stream.into_split();
    let mut stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();

    tokio::select! {
        res = tokio::io::copy(&mut stdin, &mut writer) => {
            let n = res.context("failed to forward stdin to the debugger")?;
            debug!(bytes = n, "stdin closed");
            // Let the debugger see EOF; errors mean it is already gone.
            let _ = writer.shutdown().await;
        }
        res = tokio::io::copy(&mut reader, &mut stdout) => {
            let n = res.context("failed to forward debugger output")?;
            debug!(bytes = n, "debugger closed the connection");
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl-C")?;
            debug!("interrupted");
        }
    }
    stdout.flush().await.context("failed to flush stdout")?;
    Ok(())
}

#[cfg(not(unix))]
pub async fn bridge_stdio(_handle: &TransportHandle) -> Result<()> {
    anyhow::bail!("--bridge needs unix domain sockets")
}
