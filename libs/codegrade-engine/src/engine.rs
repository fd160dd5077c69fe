/// Execution Engine - Abstraction for Code Execution
///
/// **Core Responsibility:**
/// Run one submitted routine with one argument and hand back what it returned.
///
/// **Architectural Boundary:**
/// - Engine knows HOW to execute (subprocess, embedded interpreter, ...)
/// - Engine does NOT compare results or assign statuses
/// - Engine does NOT own the timeout: the executor races `invoke` against a
///   timer and drops the future when the timer wins, so implementations must
///   abandon their work when dropped
///
/// Production uses [`NodeEngine`]: a fresh Node.js process per invocation,
/// running an embedded harness that evaluates the submission in a new `vm`
/// context.
use crate::value::{self, Value, WireNode, MAX_VALUE_DEPTH};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use codegrade_common::config::GraderConfig;
use serde::Deserialize;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

const HARNESS: &str = include_str!("harness.js");

/// One call of a submission's entry point.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub source: &'a str,
    pub entry_point: &'a str,
    /// `None` calls the routine with no argument at all
    pub argument: Option<&'a Value>,
}

/// Why an invocation produced no value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvocationFailure {
    /// The routine threw, or the submission failed to evaluate
    #[error("{0}")]
    Threw(String),
    /// The routine did not settle within its budget
    #[error("Execution timed out after {}ms", .0.as_millis())]
    TimedOut(Duration),
    /// The engine itself could not run the routine
    #[error("{0}")]
    Runtime(String),
}

#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    async fn invoke(&self, invocation: Invocation<'_>) -> Result<Value, InvocationFailure>;
}

/// Envelope the harness prints on stdout.
#[derive(Debug, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
enum HarnessEnvelope {
    Returned { nodes: Vec<WireNode> },
    Threw { message: String },
}

/// Node.js subprocess engine
///
/// **Per-invocation guarantees:**
/// - Input validation: oversized source or argument is rejected before spawning
/// - Isolation: new process, new `vm` context, cleared environment
/// - Transport: source and argument go through stdin, so their size is bound
///   only by the configured limits
/// - Heap limit from `memory_limit_mb`
/// - Abandonment: the child is killed when the invocation future is dropped
#[derive(Debug, Clone)]
pub struct NodeEngine {
    config: GraderConfig,
}

impl NodeEngine {
    pub fn new(config: GraderConfig) -> Self {
        Self { config }
    }

    fn command(&self, invocation: &Invocation<'_>) -> Command {
        let mut cmd = Command::new(&self.config.node_binary);
        cmd.arg(format!("--max-old-space-size={}", self.config.memory_limit_mb))
            .arg("-e")
            .arg(HARNESS)
            .env_clear()
            .env("ENTRY_POINT", invocation.entry_point)
            .env("MAX_DEPTH", MAX_VALUE_DEPTH.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Keep program lookup working after env_clear
        if let Ok(path) = std::env::var("PATH") {
            cmd.env("PATH", path);
        }

        cmd
    }
}

/// Harness stdin: base64 source on the first line, base64 argument (or
/// nothing) on the second.
fn stdin_payload(source: &str, argument: Option<&str>) -> Vec<u8> {
    let mut payload = general_purpose::STANDARD.encode(source);
    payload.push('\n');
    if let Some(argument) = argument {
        payload.push_str(&general_purpose::STANDARD.encode(argument));
    }
    payload.push('\n');
    payload.into_bytes()
}

#[async_trait]
impl ExecutionEngine for NodeEngine {
    async fn invoke(&self, invocation: Invocation<'_>) -> Result<Value, InvocationFailure> {
        if invocation.source.len() > self.config.max_source_bytes {
            return Err(InvocationFailure::Runtime(format!(
                "Source code exceeds maximum size of {} bytes",
                self.config.max_source_bytes
            )));
        }

        let argument = match invocation.argument {
            Some(value) => {
                let json = value
                    .to_json()
                    .map_err(|e| InvocationFailure::Runtime(format!("Test input cannot be passed to the routine: {}", e)))?;
                Some(json.to_string())
            }
            None => None,
        };

        if let Some(arg) = &argument {
            if arg.len() > self.config.max_input_bytes {
                return Err(InvocationFailure::Runtime(format!(
                    "Test input exceeds maximum size of {} bytes",
                    self.config.max_input_bytes
                )));
            }
        }

        let mut child = self.command(&invocation).spawn().map_err(|e| {
            InvocationFailure::Runtime(format!(
                "Failed to start JavaScript runtime '{}': {}",
                self.config.node_binary, e
            ))
        })?;

        // The harness reads all of stdin before producing output. A write
        // failure means the runtime died early; its exit status says why.
        if let Some(mut stdin) = child.stdin.take() {
            let payload = stdin_payload(invocation.source, argument.as_deref());
            if let Err(e) = stdin.write_all(&payload).await {
                debug!(error = %e, "Runtime closed stdin before reading the payload");
            }
        }

        // Dropping this future (timeout) drops the child, which kills it
        let output = child
            .wait_with_output()
            .await
            .map_err(|e| InvocationFailure::Runtime(format!("Failed to collect runtime output: {}", e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            debug!(
                entry_point = invocation.entry_point,
                stderr_preview = stderr.lines().next().unwrap_or(""),
                "Submission wrote to stderr"
            );
        }

        match parse_envelope(&stdout) {
            Some(HarnessEnvelope::Returned { nodes }) => {
                value::from_wire(nodes).map_err(|e| InvocationFailure::Runtime(e.to_string()))
            }
            Some(HarnessEnvelope::Threw { message }) => Err(InvocationFailure::Threw(message)),
            None => {
                warn!(
                    exit_code = ?output.status.code(),
                    stderr_preview = stderr.lines().last().unwrap_or(""),
                    "Runtime produced no result envelope"
                );
                Err(InvocationFailure::Runtime(runtime_crash_message(output.status.code(), &stderr)))
            }
        }
    }
}

/// The envelope is the last non-empty stdout line.
fn parse_envelope(stdout: &str) -> Option<HarnessEnvelope> {
    let line = stdout.lines().rev().find(|line| !line.trim().is_empty())?;
    serde_json::from_str(line).ok()
}

fn runtime_crash_message(exit_code: Option<i32>, stderr: &str) -> String {
    let detail = stderr
        .lines()
        .map(str::trim)
        .find(|line| line.contains("heap out of memory") || line.starts_with("FATAL"))
        .or_else(|| stderr.lines().map(str::trim).rfind(|line| !line.is_empty()));

    match (exit_code, detail) {
        (Some(code), Some(detail)) => format!("JavaScript runtime exited with code {}: {}", code, detail),
        (Some(code), None) => format!("JavaScript runtime exited with code {}", code),
        (None, Some(detail)) => format!("JavaScript runtime was terminated: {}", detail),
        (None, None) => "JavaScript runtime was terminated by a signal".to_string(),
    }
}
