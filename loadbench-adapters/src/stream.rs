//! Realtime Stream Collector
//!
//! Reads a running tool's output line by line, turns telemetry lines into
//! `Sample`s and archives every line for the final result extractor.
//!
//! ## Pipeline
//!
//! ```text
//!  child stdout ──► reader task ──► mpsc (bounded) ──► observer
//!                       │
//!                       ├──► oneshot: StreamError (read failure)
//!                       │
//!                       └──► JoinHandle<CollectedOutput> (raw text)
//! ```
//!
//! The raw buffer is owned by the reader task and handed over through its
//! `JoinHandle`, so it can only be read once collection has finished.
//! Cancellation closes the sample queue and keeps whatever was archived.

use crate::adapter::TelemetryParser;
use crate::error::StreamError;
use loadbench_core::Sample;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default capacity of the sample queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Everything the reader task archived
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectedOutput {
    /// Every line seen, each terminated by `\n`
    pub raw_output: String,
    /// Number of lines archived
    pub lines: usize,
    /// Number of lines that parsed into a sample
    pub samples_parsed: usize,
    /// Collection stopped because the token fired
    pub cancelled: bool,
    /// Read failure that ended collection, if any
    pub read_error: Option<String>,
}

impl CollectedOutput {
    /// Collection ran to end of stream without error or cancellation
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.read_error.is_none()
    }
}

/// Completion handle for a reader task
#[derive(Debug)]
pub struct CollectorHandle {
    task: JoinHandle<CollectedOutput>,
}

impl CollectorHandle {
    /// Wait for the reader task and take ownership of the archived output
    pub async fn finish(self) -> Result<CollectedOutput, StreamError> {
        self.task
            .await
            .map_err(|e| StreamError::TaskFailed(e.to_string()))
    }

    /// Whether the reader task has already stopped
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Channels and completion handle of one collection
#[derive(Debug)]
pub struct CollectorSession {
    /// Samples in line-arrival order; closed when the reader stops
    pub samples: mpsc::Receiver<Sample>,
    /// Fires once if the underlying read fails
    pub errors: oneshot::Receiver<StreamError>,
    /// Yields the raw output once the reader stops
    pub handle: CollectorHandle,
}

/// Spawns one reader task per run
#[derive(Debug, Clone)]
pub struct StreamCollector {
    capacity: usize,
}

impl Default for StreamCollector {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

impl StreamCollector {
    /// Collector whose sample queue holds at most `capacity` samples
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
        }
    }

    /// Queue capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Start reading `reader` on a new task. Must be called inside a tokio runtime.
    pub fn spawn<R>(
        &self,
        reader: R,
        parser: Box<dyn TelemetryParser>,
        cancel: CancellationToken,
    ) -> CollectorSession
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (sample_tx, sample_rx) = mpsc::channel(self.capacity);
        let (error_tx, error_rx) = oneshot::channel();

        let task = tokio::spawn(read_lines(reader, parser, sample_tx, error_tx, cancel));

        CollectorSession {
            samples: sample_rx,
            errors: error_rx,
            handle: CollectorHandle { task },
        }
    }
}

async fn read_lines<R>(
    reader: R,
    mut parser: Box<dyn TelemetryParser>,
    sample_tx: mpsc::Sender<Sample>,
    error_tx: oneshot::Sender<StreamError>,
    cancel: CancellationToken,
) -> CollectedOutput
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut output = CollectedOutput::default();
    let mut buf = Vec::with_capacity(512);
    let mut sample_tx = Some(sample_tx);

    info!("output collector started");

    loop {
        buf.clear();
        let read = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                output.cancelled = true;
                break;
            }
            read = reader.read_until(b'\n', &mut buf) => read,
        };

        match read {
            Ok(0) => break,
            Ok(_) => {
                let line = decode_line(&buf);
                output.raw_output.push_str(&line);
                output.raw_output.push('\n');
                output.lines += 1;

                let Some(sample) = parser.parse_line(&line) else {
                    continue;
                };
                output.samples_parsed += 1;

                if let Some(tx) = &sample_tx {
                    let sent = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            output.cancelled = true;
                            break;
                        }
                        sent = tx.send(sample) => sent,
                    };
                    if sent.is_err() {
                        debug!("sample consumer went away, archiving only");
                        sample_tx = None;
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, lines = output.lines, "reading tool output failed");
                output.read_error = Some(e.to_string());
                let _ = error_tx.send(StreamError::Read(e));
                break;
            }
        }
    }

    info!(
        lines = output.lines,
        samples = output.samples_parsed,
        cancelled = output.cancelled,
        "output collector stopped"
    );
    output
}

fn decode_line(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    text.trim_end_matches(['\n', '\r']).to_string()
}
