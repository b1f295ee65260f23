//! Control socket: server (during `navillera run`) and client (for `navillera stop`).
//! Protocol: one line per command; the only command is "cancel".

use anyhow::Result;
use navillera_core::control::RunControl;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

pub const CANCEL_COMMAND: &str = "cancel";

/// Binds `path` and cancels `control` whenever a client sends "cancel".
/// Other lines are ignored.
pub fn spawn_control_listener(
    control: Arc<RunControl>,
    path: impl AsRef<Path>,
) -> Result<tokio::task::JoinHandle<()>> {
    let path = path.as_ref().to_path_buf();
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let _ = std::fs::remove_file(&path);
    let listener = UnixListener::bind(&path)?;
    let handle = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let control = Arc::clone(&control);
                    tokio::spawn(async move {
                        let mut reader = BufReader::new(stream).lines();
                        while let Ok(Some(line)) = reader.next_line().await {
                            if line.trim() == CANCEL_COMMAND {
                                tracing::info!("cancel requested over control socket");
                                control.cancel();
                            }
                        }
                    });
                }
                Err(e) => tracing::debug!("control socket accept: {}", e),
            }
        }
    });
    Ok(handle)
}

/// Sends "cancel\n". Returns false if no run is listening.
pub async fn send_cancel(socket_path: &Path) -> Result<bool> {
    if !socket_path.exists() {
        return Ok(false);
    }
    let mut stream = match UnixStream::connect(socket_path).await {
        Ok(s) => s,
        // Stale socket left by a run that did not exit cleanly.
        Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => return Ok(false),
        Err(e) => return Err(e.into()),
    };
    stream
        .write_all(format!("{}\n", CANCEL_COMMAND).as_bytes())
        .await?;
    stream.shutdown().await?;
    Ok(true)
}
