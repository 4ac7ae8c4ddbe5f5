//! Message channel to a running engine.
//!
//! The channel carries text both ways: one command per outbound message,
//! and inbound messages that may hold zero, one or several `\n`-joined
//! lines. Behind it is either a child process or an in-process peer.

use crate::config::EngineSettings;
use crate::EngineError;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

/// Buffered messages per direction.
const CHANNEL_CAPACITY: usize = 100;

/// Grace period between `quit` and killing the process.
const QUIT_GRACE: Duration = Duration::from_millis(100);

/// Bidirectional text channel to an engine.
pub struct EngineChannel {
    outbound: mpsc::Sender<String>,
    inbound: mpsc::Receiver<String>,
    child: Option<Child>,
}

/// The engine side of an in-memory channel.
pub struct EnginePeer {
    /// Commands written by the client, one per message.
    pub commands: mpsc::Receiver<String>,
    /// Output for the client; messages may contain several lines.
    pub output: mpsc::Sender<String>,
}

impl EngineChannel {
    /// Spawn the configured engine program with piped stdio.
    pub fn spawn(settings: &EngineSettings) -> Result<Self, EngineError> {
        let mut parts = settings.command.split_whitespace();
        let program = parts.next().ok_or(EngineError::EmptyCommand)?;

        let mut child = Command::new(program)
            .args(parts)
            .args(&settings.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child.stdin.take().ok_or(EngineError::Unavailable)?;
        let stdout = child.stdout.take().ok_or(EngineError::Unavailable)?;

        let (outbound, mut stdin_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);
        let (stdout_tx, inbound) = mpsc::channel::<String>(CHANNEL_CAPACITY);

        // Task to write to stdin
        let mut stdin_writer = stdin;
        tokio::spawn(async move {
            while let Some(cmd) = stdin_rx.recv().await {
                if stdin_writer.write_all(cmd.as_bytes()).await.is_err() {
                    break;
                }
                if stdin_writer.write_all(b"\n").await.is_err() {
                    break;
                }
                if stdin_writer.flush().await.is_err() {
                    break;
                }
            }
        });

        // Task to read from stdout. Bytes that are not UTF-8 are replaced,
        // only EOF or a read error ends the stream.
        tokio::spawn(async move {
            let mut reader = BufReader::new(stdout);
            let mut buf = Vec::new();
            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf).await {
                    Ok(0) => break,
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!("Engine read failed: {}", e);
                        break;
                    }
                }
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\r', '\n']).to_string();
                if stdout_tx.send(line).await.is_err() {
                    break;
                }
            }
        });

        tracing::info!(program, pid = ?child.id(), "Engine process started");

        Ok(Self {
            outbound,
            inbound,
            child: Some(child),
        })
    }

    /// A channel whose other end is held in-process.
    pub fn in_memory() -> (Self, EnginePeer) {
        let (outbound, commands) = mpsc::channel(CHANNEL_CAPACITY);
        let (output, inbound) = mpsc::channel(CHANNEL_CAPACITY);
        let channel = Self {
            outbound,
            inbound,
            child: None,
        };
        (channel, EnginePeer { commands, output })
    }

    /// Send one command. Fails once the engine side has gone away.
    pub async fn send(&self, command: &str) -> Result<(), EngineError> {
        tracing::debug!(command, "-> engine");
        self.outbound
            .send(command.to_string())
            .await
            .map_err(|_| EngineError::Unavailable)
    }

    /// Next message from the engine, or `None` once its output has closed.
    pub async fn recv(&mut self) -> Option<String> {
        self.inbound.recv().await
    }

    /// Ask the engine to quit, then make sure the process is gone.
    pub async fn shutdown(mut self) {
        let _ = self.send("quit").await;

        if let Some(mut child) = self.child.take() {
            tokio::time::sleep(QUIT_GRACE).await;
            let _ = child.kill().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_nonexistent_executable_returns_error() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let _guard = runtime.enter();

        let settings = EngineSettings {
            command: "/nonexistent/path/to/engine".to_string(),
            ..EngineSettings::default()
        };
        match EngineChannel::spawn(&settings) {
            Err(EngineError::Spawn(_)) => {}
            Err(other) => panic!("Expected Spawn error, got {:?}", other),
            Ok(_) => panic!("Expected Spawn error, got a channel"),
        }
    }

    #[test]
    fn test_spawn_empty_command() {
        let settings = EngineSettings {
            command: "   ".to_string(),
            ..EngineSettings::default()
        };
        assert!(matches!(
            EngineChannel::spawn(&settings),
            Err(EngineError::EmptyCommand)
        ));
    }

    #[tokio::test]
    async fn in_memory_roundtrip() {
        let (mut channel, mut peer) = EngineChannel::in_memory();

        channel.send("uci").await.unwrap();
        assert_eq!(peer.commands.recv().await.as_deref(), Some("uci"));

        peer.output.send("id name Fake\nuciok".to_string()).await.unwrap();
        assert_eq!(channel.recv().await.as_deref(), Some("id name Fake\nuciok"));

        drop(peer);
        assert!(channel.recv().await.is_none());
        assert!(matches!(
            channel.send("isready").await,
            Err(EngineError::Unavailable)
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn process_channel_echoes_through_cat() {
        let settings = EngineSettings {
            command: "cat".to_string(),
            ..EngineSettings::default()
        };
        let mut channel = EngineChannel::spawn(&settings).unwrap();

        channel.send("uciok").await.unwrap();
        assert_eq!(channel.recv().await.as_deref(), Some("uciok"));

        channel.shutdown().await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_utf8_output_does_not_close_channel() {
        let settings = EngineSettings {
            command: "sh".to_string(),
            args: vec![
                "-c".to_string(),
                "printf 'info string caf\\351\\nbestmove e2e4\\n'; sleep 1".to_string(),
            ],
            ..EngineSettings::default()
        };
        let mut channel = EngineChannel::spawn(&settings).unwrap();

        assert_eq!(
            channel.recv().await.as_deref(),
            Some("info string caf\u{FFFD}")
        );
        assert_eq!(channel.recv().await.as_deref(), Some("bestmove e2e4"));

        channel.shutdown().await;
    }
}
