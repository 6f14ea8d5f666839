// Agent Process Transport
// Feature: Agent Chat Panel (001-agent-chat-panel)
//
// Runs the external agent backend as a child process and talks to it in
// JSON lines:
// - requests on stdin:   {"id": 1, "method": "send_message", "params": {...}}
// - responses on stdout: {"id": 1, "result": {...}} or {"id": 1, "error": "..."}
// - events on stdout:    {"event": "stream_chunk", "params": {...}}
// Events are forwarded to the event bus in the order they are read.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::{oneshot, Mutex};
use tokio::time::Duration;

use crate::error::{PanelError, PanelResult};
use crate::models::RawEvent;
use crate::services::event_bus::EventSender;

/// Default request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// How to launch the agent backend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub cwd: Option<PathBuf>,
}

impl AgentCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            ..Self::default()
        }
    }
}

#[derive(Serialize)]
struct RequestFrame<'a> {
    id: u64,
    method: &'a str,
    params: &'a Value,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum InboundFrame {
    Response {
        id: u64,
        #[serde(default)]
        result: Value,
        #[serde(default)]
        error: Option<Value>,
    },
    Event(RawEvent),
}

type PendingRequests = Arc<Mutex<HashMap<u64, oneshot::Sender<PanelResult<Value>>>>>;

/// Set once the agent's output reaches EOF. Only changed with `pending` locked.
type OutputClosed = Arc<AtomicBool>;

/// Running agent backend
pub struct AgentProcess {
    stdin: Mutex<ChildStdin>,
    child: Mutex<Child>,
    pending: PendingRequests,
    closed: OutputClosed,
    next_id: AtomicU64,
    timeout: Duration,
}

impl AgentProcess {
    /// Spawn the backend and start forwarding its events
    pub async fn spawn(command: &AgentCommand, events: EventSender) -> PanelResult<Self> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .envs(&command.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &command.cwd {
            cmd.current_dir(cwd);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| PanelError::Transport(format!("Failed to spawn agent process: {}", e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| PanelError::Transport("Agent process has no stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| PanelError::Transport("Agent process has no stdout".to_string()))?;
        let stderr = child.stderr.take();

        let pending: PendingRequests = Arc::new(Mutex::new(HashMap::new()));
        let closed: OutputClosed = Arc::new(AtomicBool::new(false));
        tokio::spawn(read_stdout(
            stdout,
            Arc::clone(&pending),
            Arc::clone(&closed),
            events,
        ));
        if let Some(stderr) = stderr {
            tokio::spawn(read_stderr(stderr));
        }

        log::info!(
            "Agent process started: {} (pid {:?})",
            command.program,
            child.id()
        );

        Ok(Self {
            stdin: Mutex::new(stdin),
            child: Mutex::new(child),
            pending,
            closed,
            next_id: AtomicU64::new(1),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send one request and wait for its response
    pub async fn request(&self, method: &str, params: Value) -> PanelResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            if self.closed.load(Ordering::SeqCst) {
                return Err(PanelError::AgentExited);
            }
            pending.insert(id, tx);
        }

        let mut line = serde_json::to_string(&RequestFrame {
            id,
            method,
            params: &params,
        })?;
        line.push('\n');

        log::debug!("Agent request {} -> {}", id, method);

        let written = {
            let mut stdin = self.stdin.lock().await;
            match stdin.write_all(line.as_bytes()).await {
                Ok(()) => stdin.flush().await,
                Err(e) => Err(e),
            }
        };
        if let Err(e) = written {
            self.pending.lock().await.remove(&id);
            return Err(PanelError::Transport(format!(
                "Failed to write {} request: {}",
                method, e
            )));
        }

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(PanelError::AgentExited),
            Err(_) => {
                self.pending.lock().await.remove(&id);
                Err(PanelError::Timeout(self.timeout.as_secs()))
            }
        }
    }

    /// Stop the backend
    pub async fn shutdown(&self) -> PanelResult<()> {
        let mut child = self.child.lock().await;
        if child.try_wait()?.is_none() {
            child.kill().await?;
        }
        log::info!("Agent process stopped");
        Ok(())
    }

    /// Whether the agent's output has closed
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

async fn read_stdout(
    stdout: ChildStdout,
    pending: PendingRequests,
    closed: OutputClosed,
    events: EventSender,
) {
    let mut lines = BufReader::new(stdout).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => handle_line(&line, &pending, &events).await,
            Ok(None) => break,
            Err(e) => {
                log::error!("Failed to read agent output: {}", e);
                break;
            }
        }
    }

    let mut pending = pending.lock().await;
    closed.store(true, Ordering::SeqCst);
    for (_, tx) in pending.drain() {
        let _ = tx.send(Err(PanelError::AgentExited));
    }
    log::info!("Agent process output closed");
}

async fn handle_line(line: &str, pending: &PendingRequests, events: &EventSender) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    match serde_json::from_str::<InboundFrame>(line) {
        Ok(InboundFrame::Response { id, result, error }) => {
            let Some(tx) = pending.lock().await.remove(&id) else {
                log::debug!("Dropping response for unknown request {}", id);
                return;
            };
            let outcome = match error {
                Some(Value::Null) | None => Ok(result),
                Some(Value::String(message)) => Err(PanelError::Backend(message)),
                Some(other) => Err(PanelError::Backend(other.to_string())),
            };
            let _ = tx.send(outcome);
        }
        Ok(InboundFrame::Event(raw)) => {
            events.emit_raw(raw);
        }
        Err(e) => log::warn!("Ignoring non-protocol line from agent process: {}", e),
    }
}

async fn read_stderr(stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        log::debug!("[agent] {}", line);
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::error::PanelErrorCode;
    use crate::models::PanelEvent;
    use crate::services::event_bus::event_bus;
    use serde_json::json;

    fn script(body: &str) -> AgentCommand {
        AgentCommand::new("sh", vec!["-c".to_string(), body.to_string()])
    }

    #[tokio::test]
    async fn test_request_response_and_events() {
        let (sender, mut receiver) = event_bus();
        let agent = AgentProcess::spawn(
            &script(
                r#"read line
printf '%s\n' '{"event":"stream_message_start","params":{"message_id":"m1"}}'
printf '%s\n' 'not json'
printf '%s\n' '{"id":1,"result":{"response":"ok"}}'
read line
printf '%s\n' '{"id":2,"error":"No API key configured. Set ANTHROPIC_API_KEY."}'
read line
exit 0"#,
            ),
            sender,
        )
        .await
        .unwrap();

        let result = agent.request("send_message", json!({"message": "hi"})).await.unwrap();
        assert_eq!(result, json!({"response": "ok"}));
        assert_eq!(
            receiver.try_recv(),
            Some(PanelEvent::StreamMessageStart {
                message_id: "m1".to_string()
            })
        );

        let err = agent
            .request("confirm_operation", json!({"pending_id": "p1"}))
            .await
            .unwrap_err();
        assert_eq!(err.code(), PanelErrorCode::Backend);
        assert_eq!(err.to_string(), "No API key configured. Set ANTHROPIC_API_KEY.");

        let err = agent.request("clear_history", json!({})).await.unwrap_err();
        assert_eq!(err.code(), PanelErrorCode::AgentExited);
    }

    #[tokio::test]
    async fn test_request_after_output_closed_fails_fast() {
        let (sender, _receiver) = event_bus();
        // Closes stdout but keeps reading stdin
        let agent = AgentProcess::spawn(&script("exec 1>&-; sleep 5"), sender)
            .await
            .unwrap()
            .with_timeout(Duration::from_secs(3));

        for _ in 0..50 {
            if agent.is_closed() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(agent.is_closed());

        let started = std::time::Instant::now();
        let err = agent.request("load_config", json!({})).await.unwrap_err();
        assert_eq!(err.code(), PanelErrorCode::AgentExited);
        assert!(started.elapsed() < Duration::from_secs(1));
        agent.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_request_timeout() {
        let (sender, _receiver) = event_bus();
        let agent = AgentProcess::spawn(&script("read line; sleep 5"), sender)
            .await
            .unwrap()
            .with_timeout(Duration::from_millis(100));

        let err = agent.request("load_config", json!({})).await.unwrap_err();
        assert_eq!(err.code(), PanelErrorCode::Timeout);
        agent.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let (sender, _receiver) = event_bus();
        let command = AgentCommand::new("/nonexistent/agent-backend", vec![]);
        let result = AgentProcess::spawn(&command, sender).await;
        assert!(matches!(result, Err(PanelError::Transport(_))));
    }
}
