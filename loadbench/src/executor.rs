//! Phase Executor
//!
//! Spawns a built `Command` as a child process and feeds its stdout to the
//! Stream Collector. A phase that outlives its timeout, or whose token is
//! cancelled, gets SIGTERM, a grace period, then SIGKILL.

use crate::config::LoadbenchConfig;
use chrono::{DateTime, Utc};
use loadbench_adapters::{
    AdapterError, BenchmarkAdapter, CollectedOutput, StreamCollector, StreamError,
    TelemetryParser,
};
use loadbench_core::{BenchmarkConfig, Command, ConfigSpec, FinalResult, Phase, Run, Sample, ToolKind};
use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::process::Child;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Bytes of stderr kept for a failed phase
const STDERR_TAIL_BYTES: usize = 2048;

/// Errors from running a phase
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Command could not be built or validated
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    /// Reading the tool's stdout failed
    #[error(transparent)]
    Stream(#[from] StreamError),

    /// Process could not be started
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        /// Program name
        program: String,
        /// Underlying error
        source: io::Error,
    },

    /// A generated file could not be written
    #[error("failed to write {}: {source}", .path.display())]
    WriteFile {
        /// Destination path
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// Waiting on the process failed
    #[error("failed waiting for {program}: {source}")]
    Wait {
        /// Program name
        program: String,
        /// Underlying error
        source: io::Error,
    },

    /// Phase exceeded the executor timeout
    #[error("{program} did not finish within {after:?}")]
    Timeout {
        /// Program name
        program: String,
        /// Configured timeout
        after: Duration,
    },

    /// Cancellation token fired
    #[error("{program} was cancelled")]
    Cancelled {
        /// Program name
        program: String,
    },

    /// Process exited unsuccessfully
    #[error("{program} exited with code {code:?}: {stderr}")]
    NonZeroExit {
        /// Program name
        program: String,
        /// Exit code, `None` when killed by a signal
        code: Option<i32>,
        /// Tail of stderr
        stderr: String,
    },

    /// Child was spawned without a stdout pipe
    #[error("{0} has no stdout pipe")]
    MissingStdout(String),
}

/// Result of one finished phase
#[derive(Debug)]
pub struct PhaseOutcome {
    /// Phase that ran
    pub phase: Phase,
    /// Exit code of the tool
    pub exit_code: Option<i32>,
    /// Archived stdout, plus the tool's result file if it writes one
    pub output: CollectedOutput,
    /// Realtime samples in arrival order
    pub samples: Vec<Sample>,
    /// Wall time from spawn to the end of output
    pub elapsed: Duration,
}

/// Result of prepare → run → cleanup
#[derive(Debug)]
pub struct BenchmarkOutcome {
    /// Run record ready for comparison
    pub run: Run,
    /// Summary extracted from the run phase
    pub final_result: FinalResult,
    /// `None` when skipped
    pub prepare: Option<PhaseOutcome>,
    /// The measured phase
    pub run_phase: PhaseOutcome,
    /// `None` when skipped, cancelled or failed
    pub cleanup: Option<PhaseOutcome>,
}

enum Exit {
    Status(io::Result<ExitStatus>),
    TimedOut,
    Cancelled,
}

/// Runs tool commands as child processes
#[derive(Debug, Clone)]
pub struct Executor {
    collector: StreamCollector,
    timeout: Duration,
    termination_grace: Duration,
}

impl Executor {
    /// Executor with an explicit collector and time limits
    pub fn new(collector: StreamCollector, timeout: Duration, termination_grace: Duration) -> Self {
        Self {
            collector,
            timeout,
            termination_grace,
        }
    }

    /// Executor sized and timed by `[stream]` and `[execution]`
    pub fn from_config(config: &LoadbenchConfig) -> anyhow::Result<Self> {
        Ok(Self::new(
            config.stream_collector(),
            config.timeout()?,
            config.termination_grace()?,
        ))
    }

    /// Per-phase timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run one command to completion
    pub async fn execute(
        &self,
        phase: Phase,
        command: &Command,
        parser: Box<dyn TelemetryParser>,
        cancel: &CancellationToken,
    ) -> Result<PhaseOutcome, ExecutionError> {
        if cancel.is_cancelled() {
            return Err(ExecutionError::Cancelled {
                program: command.program.clone(),
            });
        }

        write_files(command)?;
        let mut child = spawn(command)?;
        let pid = child.id();
        info!(
            phase = %phase,
            pid,
            command = %command.command_line(),
            env = ?command.env.iter().map(|e| e.name.as_str()).collect::<Vec<_>>(),
            "spawned tool process"
        );

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ExecutionError::MissingStdout(command.program.clone()))?;
        let stderr_task = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                // Partial stderr is still useful
                let _ = stderr.read_to_end(&mut buf).await;
                String::from_utf8_lossy(&buf).into_owned()
            })
        });

        let collector_cancel = cancel.child_token();
        let mut session = self.collector.spawn(stdout, parser, collector_cancel.clone());

        let started = Instant::now();
        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);

        let mut samples = Vec::new();
        let mut queue_open = true;
        let mut exit = loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break Exit::Cancelled,
                _ = &mut deadline => break Exit::TimedOut,
                status = child.wait() => break Exit::Status(status),
                sample = session.samples.recv(), if queue_open => match sample {
                    Some(sample) => samples.push(sample),
                    None => queue_open = false,
                },
            }
        };

        // A background process the tool forked can keep both pipes open after
        // the tool itself exits; the deadline and token still apply.
        let mut stderr_task = stderr_task;
        let mut stderr = String::new();
        if matches!(exit, Exit::Status(_)) {
            let pipes_closed = async {
                while let Some(sample) = session.samples.recv().await {
                    samples.push(sample);
                }
                match &mut stderr_task {
                    Some(task) => task.await.unwrap_or_default(),
                    None => String::new(),
                }
            };
            tokio::select! {
                biased;

                _ = cancel.cancelled() => exit = Exit::Cancelled,
                _ = &mut deadline => exit = Exit::TimedOut,
                text = pipes_closed => stderr = text,
            }
        }

        if !matches!(exit, Exit::Status(_)) {
            if let Some(task) = &stderr_task {
                task.abort();
            }
            terminate(&mut child, self.termination_grace).await;
            collector_cancel.cancel();
        }

        while let Some(sample) = session.samples.recv().await {
            samples.push(sample);
        }
        let mut output = session.handle.finish().await?;
        let elapsed = started.elapsed();

        let status = match exit {
            Exit::Cancelled => {
                info!(phase = %phase, "phase cancelled");
                return Err(ExecutionError::Cancelled {
                    program: command.program.clone(),
                });
            }
            Exit::TimedOut => {
                warn!(phase = %phase, timeout = ?self.timeout, "phase timed out");
                return Err(ExecutionError::Timeout {
                    program: command.program.clone(),
                    after: self.timeout,
                });
            }
            Exit::Status(status) => status.map_err(|source| ExecutionError::Wait {
                program: command.program.clone(),
                source,
            })?,
        };

        if let Ok(err) = session.errors.try_recv() {
            return Err(err.into());
        }

        if !status.success() {
            return Err(ExecutionError::NonZeroExit {
                program: command.program.clone(),
                code: status.code(),
                stderr: tail(&stderr, STDERR_TAIL_BYTES).to_string(),
            });
        }

        append_result_file(command, &mut output);

        info!(
            phase = %phase,
            lines = output.lines,
            samples = samples.len(),
            elapsed = ?elapsed,
            "phase finished"
        );

        Ok(PhaseOutcome {
            phase,
            exit_code: status.code(),
            output,
            samples,
            elapsed,
        })
    }

    /// Prepare, run and clean up one benchmark, then extract its result.
    ///
    /// Every command is built (and so validated) before anything is spawned.
    /// Cleanup runs even when the run phase failed, unless cancelled; a
    /// failed cleanup is logged and does not discard the result.
    pub async fn run_benchmark(
        &self,
        adapter: &dyn BenchmarkAdapter,
        config: &BenchmarkConfig,
        cancel: &CancellationToken,
    ) -> Result<BenchmarkOutcome, ExecutionError> {
        let options = &config.options;
        let prepare = if options.skip_prepare {
            None
        } else {
            Some(adapter.build_prepare_command(config)?)
        };
        let run = adapter.build_run_command(config)?;
        let cleanup = if options.skip_cleanup {
            None
        } else {
            Some(adapter.build_cleanup_command(config)?)
        };

        let prepare = match &prepare {
            Some(command) => Some(
                self.execute(Phase::Prepare, command, adapter.telemetry_parser(), cancel)
                    .await?,
            ),
            None => None,
        };

        let started_at = Utc::now();
        let run_phase = self
            .execute(Phase::Run, &run, adapter.telemetry_parser(), cancel)
            .await;
        let finished_at = Utc::now();

        let cleanup = match &cleanup {
            Some(command) if !cancel.is_cancelled() => {
                match self
                    .execute(Phase::Cleanup, command, adapter.telemetry_parser(), cancel)
                    .await
                {
                    Ok(outcome) => Some(outcome),
                    Err(e) => {
                        warn!(error = %e, "cleanup failed");
                        None
                    }
                }
            }
            _ => None,
        };

        let run_phase = run_phase?;
        let final_result = adapter.extract_final_result(&run_phase.output.raw_output)?;
        let spec = config_spec(config);
        let run = Run::from_final_result(
            run_id(adapter.tool(), &spec, started_at),
            spec,
            started_at,
            finished_at,
            &final_result,
        );
        debug!(run = %run.id, tps = run.tps, "benchmark finished");

        Ok(BenchmarkOutcome {
            run,
            final_result,
            prepare,
            run_phase,
            cleanup,
        })
    }
}

/// Grouping identity of a benchmark configuration
pub fn config_spec(config: &BenchmarkConfig) -> ConfigSpec {
    let threads = config
        .param("threads")
        .and_then(|v| v.as_u64())
        .unwrap_or(1)
        .min(u32::MAX as u64) as u32;
    let spec = ConfigSpec::new(threads, config.connection.database, config.template.name.clone());
    match &config.connection.name {
        Some(name) => spec.with_connection(name.clone()),
        None => spec,
    }
}

fn run_id(tool: ToolKind, spec: &ConfigSpec, started_at: DateTime<Utc>) -> String {
    format!(
        "{}-{}t-{}",
        tool.id(),
        spec.threads,
        started_at.format("%Y%m%dT%H%M%S%.3f")
    )
}

fn write_files(command: &Command) -> Result<(), ExecutionError> {
    for file in &command.files {
        let path = command.working_dir.join(&file.relative_path);
        let write = || -> io::Result<()> {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, &file.contents)
        };
        write().map_err(|source| ExecutionError::WriteFile {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "wrote generated file");
    }
    Ok(())
}

fn spawn(command: &Command) -> Result<Child, ExecutionError> {
    let mut process = tokio::process::Command::new(&command.program);
    process
        .args(&command.args)
        .current_dir(&command.working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    for var in &command.env {
        process.env(&var.name, var.value.expose());
    }
    process.spawn().map_err(|source| ExecutionError::Spawn {
        program: command.program.clone(),
        source,
    })
}

/// Send SIGTERM to a process. Returns `Err` if the signal could not be delivered.
fn send_sigterm(pid: u32) -> Result<(), io::Error> {
    let ret = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if ret == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// SIGTERM, wait up to `grace`, then SIGKILL
async fn terminate(child: &mut Child, grace: Duration) {
    let Some(pid) = child.id() else {
        return;
    };
    if let Err(e) = send_sigterm(pid) {
        debug!(pid, error = %e, "SIGTERM not delivered");
    }
    if tokio::time::timeout(grace, child.wait()).await.is_ok() {
        return;
    }
    warn!(pid, grace = ?grace, "process ignored SIGTERM, killing");
    if let Err(e) = child.kill().await {
        warn!(pid, error = %e, "failed to kill process");
    }
}

fn append_result_file(command: &Command, output: &mut CollectedOutput) {
    let Some(relative) = &command.result_file else {
        return;
    };
    let path = command.working_dir.join(relative);
    match std::fs::read_to_string(&path) {
        Ok(text) => {
            output.raw_output.push_str(&text);
            if !text.ends_with('\n') {
                output.raw_output.push('\n');
            }
        }
        Err(e) => warn!(path = %path.display(), error = %e, "result file not readable"),
    }
}

fn tail(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut start = s.len() - max_bytes;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use loadbench_adapters::{SysbenchAdapter, ValidationError};
    use loadbench_core::{ConnectionInfo, DatabaseType, Secret, Template};
    use std::path::Path;

    const SYSBENCH_OUTPUT: &str = "\
[ 1s ] thds: 4 tps: 160.93 qps: 3237.50 (r/w/o: 2268.58/643.74/325.18) lat (ms,95%): 35.59 err/s: 0.00 reconn/s: 0.00
[ 2s ] thds: 4 tps: 170.01 qps: 3400.29 (r/w/o: 2380.20/680.06/340.03) lat (ms,95%): 33.12 err/s: 0.00 reconn/s: 0.00

SQL statistics:
    queries performed:
        read:                            140000
        write:                           40000
        other:                           20000
        total:                           200000
    transactions:                        10000  (166.60 per sec.)
    queries:                             200000 (3332.00 per sec.)
    ignored errors:                      0      (0.00 per sec.)
    reconnects:                          0      (0.00 per sec.)

Latency (ms):
         min:                                    5.12
         avg:                                   24.01
         max:                                  120.55
         95th percentile:                       34.33
         sum:                               240100.00
";

    fn workdir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("loadbench-exec-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn executor(timeout: Duration) -> Executor {
        Executor::new(StreamCollector::default(), timeout, Duration::from_millis(200))
    }

    fn sh(dir: &Path, script: &str) -> Command {
        let mut command = Command::new("sh", dir);
        command.args(["-c", script]);
        command
    }

    fn parser() -> Box<dyn TelemetryParser> {
        SysbenchAdapter.telemetry_parser()
    }

    /// Prepare/cleanup touch a marker; run replays recorded sysbench output
    #[derive(Debug)]
    struct ReplayAdapter;

    impl BenchmarkAdapter for ReplayAdapter {
        fn tool(&self) -> ToolKind {
            ToolKind::Sysbench
        }

        fn supported_databases(&self) -> &'static [DatabaseType] {
            &[DatabaseType::MySql]
        }

        fn validate_config(&self, phase: Phase, config: &BenchmarkConfig) -> Result<(), AdapterError> {
            if phase == Phase::Run && !config.has_param("threads") {
                return Err(ValidationError::MissingParameter {
                    phase,
                    name: "threads".to_string(),
                }
                .into());
            }
            Ok(())
        }

        fn build_command(&self, phase: Phase, config: &BenchmarkConfig) -> Result<Command, AdapterError> {
            self.validate_config(phase, config)?;
            let dir = &config.working_dir;
            Ok(match phase {
                Phase::Prepare => sh(dir, "echo prepared > prepared.marker"),
                Phase::Run => {
                    let mut command = Command::new("cat", dir);
                    command
                        .arg("recorded.txt")
                        .file("recorded.txt", SYSBENCH_OUTPUT.to_string());
                    command
                }
                Phase::Cleanup => sh(dir, "rm -f prepared.marker"),
            })
        }

        fn telemetry_parser(&self) -> Box<dyn TelemetryParser> {
            SysbenchAdapter.telemetry_parser()
        }

        fn extract_final_result(&self, output: &str) -> Result<FinalResult, AdapterError> {
            SysbenchAdapter.extract_final_result(output)
        }
    }

    fn replay_config(dir: &Path) -> BenchmarkConfig {
        BenchmarkConfig::new(
            ConnectionInfo::new(DatabaseType::MySql, "127.0.0.1", "sbtest", "sbtest")
                .with_name("local"),
            Template::named("oltp_read_write"),
        )
        .with_param("threads", 4i64)
        .with_working_dir(dir)
    }

    #[tokio::test]
    async fn test_execute_streams_samples_and_archives_output() {
        let dir = workdir("stream");
        let mut command = Command::new("cat", &dir);
        command
            .arg("out.txt")
            .file("out.txt", format!("garbage text, no markers\n{}", SYSBENCH_OUTPUT));

        let outcome = executor(Duration::from_secs(10))
            .execute(Phase::Run, &command, parser(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.exit_code, Some(0));
        assert_eq!(outcome.samples.len(), 2);
        assert_eq!(outcome.samples[0].tps, Some(160.93));
        assert_eq!(outcome.samples[1].tps, Some(170.01));
        assert!(outcome.output.raw_output.starts_with("garbage text, no markers\n"));
        assert!(outcome.output.raw_output.contains("transactions:"));
        assert!(outcome.output.is_complete());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_secret_env_reaches_child_only() {
        let dir = workdir("env");
        let mut command = sh(&dir, "printf '%s\\n' \"$LB_TEST_SECRET\"");
        command.secret_env("LB_TEST_SECRET", Secret::new("hunter2"));
        assert!(!command.command_line().contains("hunter2"));
        assert!(!format!("{:?}", command).contains("hunter2"));

        let outcome = executor(Duration::from_secs(10))
            .execute(Phase::Run, &command, parser(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.output.raw_output, "hunter2\n");
        assert!(outcome.samples.is_empty());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_nonzero_exit_reports_stderr() {
        let dir = workdir("exit");
        let command = sh(&dir, "echo boom >&2; exit 3");
        let err = executor(Duration::from_secs(10))
            .execute(Phase::Run, &command, parser(), &CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            ExecutionError::NonZeroExit { code, stderr, .. } => {
                assert_eq!(code, Some(3));
                assert!(stderr.contains("boom"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_timeout_terminates_process() {
        let dir = workdir("timeout");
        let command = sh(&dir, "sleep 30");
        let started = Instant::now();
        let err = executor(Duration::from_millis(200))
            .execute(Phase::Run, &command, parser(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::Timeout { .. }), "{err:?}");
        assert!(started.elapsed() < Duration::from_secs(10));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_timeout_applies_after_tool_exits() {
        let dir = workdir("forked");
        // The tool exits at once; the background sleep keeps its pipes open
        let command = sh(&dir, "sleep 20 & echo started");
        let started = Instant::now();
        let err = tokio::time::timeout(
            Duration::from_secs(8),
            executor(Duration::from_millis(500)).execute(
                Phase::Run,
                &command,
                parser(),
                &CancellationToken::new(),
            ),
        )
        .await
        .expect("execute must honor its own timeout")
        .unwrap_err();
        assert!(matches!(err, ExecutionError::Timeout { .. }), "{err:?}");
        assert!(started.elapsed() < Duration::from_secs(5));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_cancellation_applies_after_tool_exits() {
        let dir = workdir("forked-cancel");
        let command = sh(&dir, "sleep 20 & echo started");
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let err = tokio::time::timeout(
            Duration::from_secs(8),
            executor(Duration::from_secs(60)).execute(Phase::Run, &command, parser(), &cancel),
        )
        .await
        .expect("execute must honor cancellation")
        .unwrap_err();
        assert!(matches!(err, ExecutionError::Cancelled { .. }), "{err:?}");
        assert!(started.elapsed() < Duration::from_secs(5));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_cancellation_stops_process() {
        let dir = workdir("cancel");
        let command = sh(&dir, "echo started; sleep 30");
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let err = executor(Duration::from_secs(60))
            .execute(Phase::Run, &command, parser(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::Cancelled { .. }), "{err:?}");
        assert!(started.elapsed() < Duration::from_secs(10));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_result_file_appended() {
        let dir = workdir("result");
        let mut command = sh(&dir, "echo running; printf '<Result>ok</Result>' > result.xml");
        command.result_file = Some(PathBuf::from("result.xml"));

        let outcome = executor(Duration::from_secs(10))
            .execute(Phase::Run, &command, parser(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.output.raw_output, "running\n<Result>ok</Result>\n");
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let dir = workdir("spawn");
        let command = Command::new("loadbench-no-such-tool", &dir);
        let err = executor(Duration::from_secs(10))
            .execute(Phase::Run, &command, parser(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::Spawn { .. }), "{err:?}");
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_run_benchmark_all_phases() {
        let dir = workdir("phases");
        let outcome = executor(Duration::from_secs(10))
            .run_benchmark(&ReplayAdapter, &replay_config(&dir), &CancellationToken::new())
            .await
            .unwrap();

        assert!(outcome.prepare.is_some());
        assert!(outcome.cleanup.is_some());
        assert!(!dir.join("prepared.marker").exists());
        assert_eq!(outcome.run_phase.samples.len(), 2);
        assert!((outcome.final_result.tps - 166.60).abs() < 1e-9);

        let run = &outcome.run;
        assert_eq!(run.spec.threads, 4);
        assert_eq!(run.spec.connection.as_deref(), Some("local"));
        assert_eq!(run.total_queries, 200_000);
        assert!(run.id.starts_with("sysbench-4t-"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_run_benchmark_validates_before_spawning() {
        let dir = workdir("invalid");
        let mut config = replay_config(&dir);
        config.parameters.remove("threads");

        let err = executor(Duration::from_secs(10))
            .run_benchmark(&ReplayAdapter, &config, &CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            ExecutionError::Adapter(e) => assert!(e.is_pre_execution()),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!dir.join("prepared.marker").exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_config_spec_defaults() {
        let config = BenchmarkConfig::new(
            ConnectionInfo::new(DatabaseType::PostgreSql, "h", "u", "d"),
            Template::named("tpcc"),
        );
        let spec = config_spec(&config);
        assert_eq!(spec.threads, 1);
        assert_eq!(spec.connection, None);
        assert_eq!(spec.template, "tpcc");
    }

    #[test]
    fn test_tail_respects_char_boundaries() {
        assert_eq!(tail("short", 10), "short");
        assert_eq!(tail("abcdef", 3), "def");
        assert_eq!(tail("aé", 1), "");
    }
}
