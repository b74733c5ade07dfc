//! Analyzer trait and implementations.
//!
//! The analyzer is an external script that reads a persisted batch file and
//! prints its findings as JSON on stdout.

use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use thiserror::Error;
use tokio::{process::Command, sync::Semaphore};
use tracing::{debug, info};

use crate::config::GatewayConfig;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("Analyzer script execution failed: {0}")]
    Launch(#[source] std::io::Error),
    /// Non-zero exit; carries stderr, or the exit status when stderr is empty.
    #[error("Analyzer script execution failed: {0}")]
    Exit(String),
    #[error("Analyzer script timed out after {0}ms")]
    Timeout(u128),
    #[error("Analyzer script execution failed: concurrency limiter closed")]
    LimiterClosed,
}

// ------------------------------------------------------------------ //
//  Trait                                                              //
// ------------------------------------------------------------------ //

/// Runs an analysis over a persisted batch file and returns raw stdout.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, batch_file: &Path) -> Result<Vec<u8>, AnalyzerError>;
}

// ------------------------------------------------------------------ //
//  ScriptAnalyzer (production)                                        //
// ------------------------------------------------------------------ //

/// Spawns `<interpreter> <script> <batch file>` once per call.
///
/// Concurrency and runtime are unbounded unless a limit is configured.
pub struct ScriptAnalyzer {
    interpreter: String,
    script: PathBuf,
    limiter: Option<Semaphore>,
    timeout: Option<Duration>,
}

impl ScriptAnalyzer {
    pub fn new(interpreter: impl Into<String>, script: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            script: script.into(),
            limiter: None,
            timeout: None,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        let mut analyzer = Self::new(config.interpreter.clone(), config.script.clone());
        if let Some(n) = config.max_concurrent_analyzers {
            analyzer = analyzer.with_max_concurrent(n);
        }
        if let Some(t) = config.analyzer_timeout {
            analyzer = analyzer.with_timeout(t);
        }
        analyzer
    }

    pub fn with_max_concurrent(mut self, permits: usize) -> Self {
        self.limiter = Some(Semaphore::new(permits));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl Analyzer for ScriptAnalyzer {
    async fn analyze(&self, batch_file: &Path) -> Result<Vec<u8>, AnalyzerError> {
        let _permit = match &self.limiter {
            Some(sem) => Some(sem.acquire().await.map_err(|_| AnalyzerError::LimiterClosed)?),
            None => None,
        };

        let mut cmd = Command::new(&self.interpreter);
        cmd.arg(&self.script).arg(batch_file).kill_on_drop(true);

        debug!(
            interpreter = %self.interpreter,
            script = %self.script.display(),
            batch_file = %batch_file.display(),
            "spawning analyzer"
        );

        let run = cmd.output();
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, run)
                .await
                .map_err(|_| AnalyzerError::Timeout(limit.as_millis()))?,
            None => run.await,
        }
        .map_err(AnalyzerError::Launch)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = match stderr.trim() {
                "" => output.status.to_string(),
                s => s.to_string(),
            };
            return Err(AnalyzerError::Exit(reason));
        }

        info!(
            batch_file = %batch_file.display(),
            stdout_bytes = output.stdout.len(),
            "analyzer finished"
        );
        Ok(output.stdout)
    }
}

// ------------------------------------------------------------------ //
//  FakeAnalyzer (for tests)                                           //
// ------------------------------------------------------------------ //

/// Canned reply for a [`FakeAnalyzer`] call.
#[derive(Debug, Clone)]
pub enum FakeReply {
    Stdout(Vec<u8>),
    Exit(String),
    Timeout(u128),
}

/// A call observed by a [`FakeAnalyzer`], with the batch file contents as
/// they were when the analyzer ran.
#[derive(Debug, Clone)]
pub struct FakeInvocation {
    pub batch_file: PathBuf,
    pub contents: Option<Vec<u8>>,
}

/// In-memory analyzer that replays canned replies and records its calls.
///
/// Replies are consumed in order; the last one repeats once the queue is
/// down to a single entry.
#[derive(Debug, Default, Clone)]
pub struct FakeAnalyzer {
    replies: Arc<Mutex<VecDeque<FakeReply>>>,
    pub calls: Arc<Mutex<Vec<FakeInvocation>>>,
}

impl FakeAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replying(reply: FakeReply) -> Self {
        let fake = Self::new();
        fake.push_reply(reply);
        fake
    }

    /// Reply with `value` serialized as JSON.
    pub fn replying_json(value: serde_json::Value) -> Self {
        Self::replying(FakeReply::Stdout(value.to_string().into_bytes()))
    }

    pub fn push_reply(&self, reply: FakeReply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    /// Non-destructive snapshot of the calls seen so far.
    pub fn snapshot(&self) -> Vec<FakeInvocation> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Analyzer for FakeAnalyzer {
    async fn analyze(&self, batch_file: &Path) -> Result<Vec<u8>, AnalyzerError> {
        let contents = tokio::fs::read(batch_file).await.ok();
        self.calls.lock().unwrap().push(FakeInvocation {
            batch_file: batch_file.to_path_buf(),
            contents,
        });

        let reply = {
            let mut replies = self.replies.lock().unwrap();
            if replies.len() > 1 {
                replies.pop_front()
            } else {
                replies.front().cloned()
            }
        };

        match reply {
            Some(FakeReply::Stdout(bytes)) => Ok(bytes),
            Some(FakeReply::Exit(reason)) => Err(AnalyzerError::Exit(reason)),
            Some(FakeReply::Timeout(ms)) => Err(AnalyzerError::Timeout(ms)),
            None => Ok(b"{}".to_vec()),
        }
    }
}

// ------------------------------------------------------------------ //
//  Tests                                                              //
// ------------------------------------------------------------------ //
