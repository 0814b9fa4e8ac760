use crate::clean::{clean_output, should_surface_stderr};
use crate::error::ConfigError;
use crate::{
    sanitize_prompt, EngineConfig, GenerationOptions, GenerationOverrides, InferenceEngine,
    InferenceError, Result,
};
use async_trait::async_trait;
use std::ffi::OsString;
use std::process::Stdio;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::timeout;

const READ_CHUNK_BYTES: usize = 8 * 1024;
const STDERR_PREVIEW_CHARS: usize = 80;
const STDERR_TAIL_BYTES: usize = 2 * 1024;

// Pipes can outlive the engine when a grandchild inherited them.
const OUTPUT_DRAIN_GRACE: Duration = Duration::from_secs(2);
const KILL_REAP_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateSnapshot {
    pub limit: usize,
    pub in_flight: usize,
    pub waiters: usize,
}

#[derive(Debug, Default)]
struct GateCounters {
    in_flight: AtomicUsize,
    waiters: AtomicUsize,
}

struct SlotPermit {
    #[allow(dead_code)]
    permit: OwnedSemaphorePermit,
    counters: Arc<GateCounters>,
}

impl Drop for SlotPermit {
    fn drop(&mut self) {
        self.counters.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}

struct WaiterGuard(Arc<GateCounters>);

impl WaiterGuard {
    fn new(counters: Arc<GateCounters>) -> Self {
        counters.waiters.fetch_add(1, Ordering::Relaxed);
        Self(counters)
    }
}

impl Drop for WaiterGuard {
    fn drop(&mut self) {
        self.0.waiters.fetch_sub(1, Ordering::Relaxed);
    }
}

#[derive(Debug, Default)]
struct CapturedOutput {
    bytes: Vec<u8>,
    received: bool,
    discarded: usize,
}

/// Reader state shared with the spawned reader task; whatever arrived stays here
/// even when the task has to be abandoned.
type Shared<T> = Arc<Mutex<T>>;

fn take_shared<T: Default>(shared: &Shared<T>) -> T {
    std::mem::take(&mut *shared.lock().unwrap_or_else(PoisonError::into_inner))
}

/// Spawns one engine process per request, bounded by a concurrency gate.
#[derive(Debug)]
pub struct ProcessRunner {
    config: EngineConfig,
    gate: Arc<Semaphore>,
    counters: Arc<GateCounters>,
}

impl ProcessRunner {
    pub fn new(config: EngineConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let gate = Arc::new(Semaphore::new(config.max_concurrent));
        Ok(Self {
            config,
            gate,
            counters: Arc::new(GateCounters::default()),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn gate_snapshot(&self) -> GateSnapshot {
        GateSnapshot {
            limit: self.config.max_concurrent,
            in_flight: self.counters.in_flight.load(Ordering::Relaxed),
            waiters: self.counters.waiters.load(Ordering::Relaxed),
        }
    }

    /// Argument contract of the engine CLI, in order.
    pub fn engine_args(&self, prompt: &str, options: &GenerationOptions) -> Vec<OsString> {
        vec![
            "-m".into(),
            self.config.model_path.clone().into_os_string(),
            "-p".into(),
            prompt.into(),
            "-n".into(),
            options.max_tokens.to_string().into(),
            "-c".into(),
            options.context_size.to_string().into(),
            "--temp".into(),
            options.temperature.to_string().into(),
            "--no-display-prompt".into(),
        ]
    }

    pub async fn run(&self, prompt: &str, overrides: GenerationOverrides) -> Result<String> {
        let options = self.config.defaults.apply(&overrides);
        let prompt = sanitize_prompt(prompt);

        let _slot = self.acquire_slot().await?;
        let started = Instant::now();
        let result = self.run_process(&prompt, &options).await;
        match &result {
            Ok(text) => log::info!(
                "Engine response ready in {:?} ({} chars)",
                started.elapsed(),
                text.chars().count()
            ),
            Err(err) => log::warn!("Engine run failed after {:?}: {err}", started.elapsed()),
        }
        result
    }

    async fn acquire_slot(&self) -> Result<SlotPermit> {
        let waiter = WaiterGuard::new(self.counters.clone());
        let wait = self.config.queue_timeout();
        let permit = match timeout(wait, self.gate.clone().acquire_owned()).await {
            Ok(permit) => {
                // The gate is owned by this runner and never closed.
                permit.unwrap_or_else(|_| unreachable!("inference gate semaphore closed"))
            }
            Err(_) => {
                log::warn!(
                    "No inference slot free after {wait:?} (limit {})",
                    self.config.max_concurrent
                );
                return Err(InferenceError::QueueTimeout(wait));
            }
        };
        drop(waiter);
        self.counters.in_flight.fetch_add(1, Ordering::Relaxed);
        Ok(SlotPermit {
            permit,
            counters: self.counters.clone(),
        })
    }

    async fn run_process(&self, prompt: &str, options: &GenerationOptions) -> Result<String> {
        let mut cmd = Command::new(&self.config.binary_path);
        cmd.args(self.engine_args(prompt, options))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        log::debug!(
            "Starting inference engine {:?} (prompt {} chars, max_tokens {}, ctx {})",
            self.config.binary_path,
            prompt.chars().count(),
            options.max_tokens,
            options.context_size
        );
        let mut child = cmd
            .spawn()
            .map_err(|source| InferenceError::StartupFailure {
                binary: self.config.binary_path.clone(),
                source,
            })?;

        let stdout = Shared::<CapturedOutput>::default();
        let stderr = Shared::<String>::default();
        let stdout_task = tokio::spawn(collect_stdout(
            child.stdout.take(),
            self.config.max_output_bytes,
            stdout.clone(),
        ));
        let stderr_task = tokio::spawn(collect_stderr(child.stderr.take(), stderr.clone()));

        let budget = self.config.timeout();
        let status = match timeout(budget, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                terminate(&mut child, budget).await;
                stdout_task.abort();
                stderr_task.abort();
                return Err(InferenceError::Timeout(budget));
            }
        };

        tokio::join!(
            join_reader(stdout_task, "stdout"),
            join_reader(stderr_task, "stderr"),
        );
        let captured = take_shared(&stdout);
        let diagnostics = take_shared(&stderr);

        if let Some(code) = status.code() {
            if code != 0 && !captured.received {
                return Err(InferenceError::InferenceFailure { code, diagnostics });
            }
        }
        if !status.success() {
            log::debug!("Engine exited with {status} after writing output; keeping it");
        }
        if captured.discarded > 0 {
            log::warn!(
                "Engine output exceeded {} bytes; discarded {} bytes",
                self.config.max_output_bytes,
                captured.discarded
            );
        }

        Ok(clean_output(&String::from_utf8_lossy(&captured.bytes)))
    }
}

#[async_trait]
impl InferenceEngine for ProcessRunner {
    async fn generate(&self, prompt: &str, overrides: GenerationOverrides) -> Result<String> {
        self.run(prompt, overrides).await
    }
}

async fn terminate(child: &mut Child, budget: Duration) {
    log::warn!("Inference engine exceeded {budget:?}; terminating");
    if let Err(err) = child.start_kill() {
        log::debug!("Failed to signal engine process: {err}");
    }
    match timeout(KILL_REAP_GRACE, child.wait()).await {
        Ok(Ok(status)) => log::debug!("Engine process terminated ({status})"),
        Ok(Err(err)) => log::debug!("Failed to reap engine process: {err}"),
        Err(_) => log::warn!("Engine process did not exit within {KILL_REAP_GRACE:?} of kill"),
    }
}

/// Waits for a reader to hit EOF. A pipe held open by a lingering grandchild is
/// abandoned after the drain grace; its shared buffer keeps what was read.
async fn join_reader(mut handle: JoinHandle<()>, stream: &str) {
    match timeout(OUTPUT_DRAIN_GRACE, &mut handle).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => log::debug!("Engine {stream} reader failed: {err}"),
        Err(_) => {
            log::debug!("Engine {stream} still open {OUTPUT_DRAIN_GRACE:?} after exit");
            handle.abort();
        }
    }
}

async fn collect_stdout<R: AsyncRead + Unpin>(
    pipe: Option<R>,
    max_bytes: usize,
    out: Shared<CapturedOutput>,
) {
    let Some(mut pipe) = pipe else {
        return;
    };
    let mut buf = vec![0u8; READ_CHUNK_BYTES];
    loop {
        match pipe.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                let mut out = out.lock().unwrap_or_else(PoisonError::into_inner);
                out.received = true;
                let room = max_bytes.saturating_sub(out.bytes.len());
                let keep = n.min(room);
                out.bytes.extend_from_slice(&buf[..keep]);
                out.discarded += n - keep;
            }
            Err(err) => {
                log::debug!("Engine stdout read error: {err}");
                break;
            }
        }
    }
}

/// Logs interesting stderr lines and keeps a bounded tail for diagnostics.
async fn collect_stderr<R: AsyncRead + Unpin>(pipe: Option<R>, tail: Shared<String>) {
    let Some(mut pipe) = pipe else {
        return;
    };
    let mut buf = vec![0u8; READ_CHUNK_BYTES];
    loop {
        match pipe.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                let chunk = String::from_utf8_lossy(&buf[..n]);
                let mut tail = tail.lock().unwrap_or_else(PoisonError::into_inner);
                for line in chunk.lines() {
                    if line.trim().is_empty() || !should_surface_stderr(line) {
                        continue;
                    }
                    let preview: String = line.chars().take(STDERR_PREVIEW_CHARS).collect();
                    log::debug!("[engine] {preview}");
                    tail.push_str(line);
                    tail.push('\n');
                }
                trim_front(&mut tail, STDERR_TAIL_BYTES);
            }
            Err(err) => {
                log::debug!("Engine stderr read error: {err}");
                break;
            }
        }
    }
}

fn trim_front(text: &mut String, max_bytes: usize) {
    if text.len() <= max_bytes {
        return;
    }
    let mut cut = text.len() - max_bytes;
    while !text.is_char_boundary(cut) {
        cut += 1;
    }
    text.drain(..cut);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn args_follow_engine_contract() {
        let runner = ProcessRunner::new(EngineConfig::new("llama-cli", "/models/m.gguf")).unwrap();
        let options = GenerationOptions {
            max_tokens: 200,
            temperature: 0.7,
            context_size: 2048,
        };
        let args: Vec<String> = runner
            .engine_args("Hello", &options)
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "-m",
                "/models/m.gguf",
                "-p",
                "Hello",
                "-n",
                "200",
                "-c",
                "2048",
                "--temp",
                "0.7",
                "--no-display-prompt"
            ]
        );
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = EngineConfig::default().with_max_concurrent(0);
        assert!(ProcessRunner::new(config).is_err());
    }

    #[test]
    fn trim_front_respects_char_boundaries() {
        let mut text = "ééééé".to_string();
        trim_front(&mut text, 3);
        assert_eq!(text, "é");
    }

    #[tokio::test]
    async fn stdout_collection_is_bounded() {
        let data = vec![b'a'; 50_000];
        let shared = Shared::<CapturedOutput>::default();
        collect_stdout(Some(&data[..]), 1_000, shared.clone()).await;
        let out = take_shared(&shared);
        assert!(out.received);
        assert_eq!(out.bytes.len(), 1_000);
        assert_eq!(out.discarded, 49_000);
    }

    #[tokio::test]
    async fn stderr_tail_skips_engine_noise() {
        let data = b"llama_model_load: tensors\nload: vocab\nwarning: low memory\n\n".to_vec();
        let shared = Shared::<String>::default();
        collect_stderr(Some(&data[..]), shared.clone()).await;
        assert_eq!(take_shared(&shared), "warning: low memory\n");
    }

    #[tokio::test]
    async fn slot_counters_track_in_flight() {
        let runner = ProcessRunner::new(EngineConfig::default().with_max_concurrent(2)).unwrap();
        let slot = runner.acquire_slot().await.unwrap();
        assert_eq!(
            runner.gate_snapshot(),
            GateSnapshot {
                limit: 2,
                in_flight: 1,
                waiters: 0
            }
        );
        drop(slot);
        assert_eq!(runner.gate_snapshot().in_flight, 0);
    }
}
