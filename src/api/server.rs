/*!
 * Control Socket Server
 *
 * Line-oriented Unix socket front end for the control channel.
 *
 * Protocol, one request per line:
 * - `read`   -> `ok <diagnostic>` (pids separated by spaces)
 * - `<pid>`  -> `ok <bytes consumed>`
 * - failures -> `err <errno> <message>`
 *
 * Requests longer than `MAX_CONTROL_LINE` get an error reply and the
 * connection is closed; at most that many bytes are buffered per request.
 * Requests run on the blocking pool since they wait on the registry lock.
 */

use super::control::ControlChannel;
use crate::core::errors::{SchedulerError, SchedulerResult};
use crate::core::limits::MAX_CONTROL_LINE;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, info, warn};

/// Unix socket server for process registration
pub struct ControlServer {
    listener: UnixListener,
    path: PathBuf,
    channel: ControlChannel,
}

impl ControlServer {
    /// Bind the socket, replacing a stale socket file left by a previous run
    pub fn bind(path: impl AsRef<Path>, channel: ControlChannel) -> SchedulerResult<Self> {
        let path = path.as_ref().to_path_buf();
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        let listener = UnixListener::bind(&path)?;
        info!(path = %path.display(), "Control socket listening");
        Ok(Self {
            listener,
            path,
            channel,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Accept connections until `shutdown` resolves
    pub async fn serve<F>(self, shutdown: F) -> SchedulerResult<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, _)) => {
                            let channel = self.channel.clone();
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, channel).await {
                                    debug!(error = %e, "Control connection closed with error");
                                }
                            });
                        }
                        Err(e) => warn!(error = %e, "Control socket accept failed"),
                    }
                }
                _ = &mut shutdown => break,
            }
        }
        info!("Control socket server stopped");
        Ok(())
    }
}

impl Drop for ControlServer {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            debug!(error = %e, "Control socket file already gone");
        }
    }
}

async fn handle_connection(stream: UnixStream, channel: ControlChannel) -> SchedulerResult<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = Vec::with_capacity(MAX_CONTROL_LINE + 1);

    loop {
        line.clear();
        // +1 leaves room for the newline of a full-length request
        let read = (&mut reader)
            .take(MAX_CONTROL_LINE as u64 + 1)
            .read_until(b'\n', &mut line)
            .await?;
        if read == 0 {
            break;
        }
        if line.last() != Some(&b'\n') && line.len() > MAX_CONTROL_LINE {
            warn!(limit = MAX_CONTROL_LINE, "Oversized control request, closing connection");
            write_reply(&mut writer, &error_reply(&oversized())).await?;
            break;
        }

        let reply = match std::str::from_utf8(&line) {
            Ok(text) => {
                let text = text.strip_suffix('\n').unwrap_or(text).to_string();
                let channel = channel.clone();
                tokio::task::spawn_blocking(move || handle_request(&channel, &text))
                    .await
                    .map_err(|e| SchedulerError::Io(e.to_string()))?
            }
            Err(_) => error_reply(&SchedulerError::InvalidInput(
                "request is not valid UTF-8".to_string(),
            )),
        };
        write_reply(&mut writer, &reply).await?;
    }
    Ok(())
}

async fn write_reply(writer: &mut OwnedWriteHalf, reply: &str) -> SchedulerResult<()> {
    writer.write_all(reply.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    Ok(())
}

fn oversized() -> SchedulerError {
    SchedulerError::InvalidInput(format!(
        "request longer than {} bytes",
        MAX_CONTROL_LINE
    ))
}

fn error_reply(e: &SchedulerError) -> String {
    format!("err {} {}", e.errno() as i32, e)
}

/// Produce the reply line for one request line
pub fn handle_request(channel: &ControlChannel, line: &str) -> String {
    let result = if line.len() > MAX_CONTROL_LINE {
        Err(oversized())
    } else if line.trim() == "read" {
        channel.read().map(|diag| diag.replace('\n', " "))
    } else {
        channel.write(line.as_bytes()).map(|n| n.to_string())
    };

    match result {
        Ok(body) => format!("ok {}", body).trim_end().to_string(),
        Err(e) => error_reply(&e),
    }
}
