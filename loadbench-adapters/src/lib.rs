#![warn(missing_docs)]
//! loadbench Adapters - Tool Integration Layer
//!
//! One adapter per load-testing tool, each providing:
//! - **Command Builder**: prepare / run / cleanup invocations, passwords
//!   only in environment overrides
//! - **Config Validator**: pre-flight checks per phase
//! - **Telemetry Parser**: the tool's realtime line grammar, driven by the
//!   shared [`StreamCollector`]
//! - **Final Result Extractor**: the end-of-run summary as a `FinalResult`
//!
//! [`AdapterRegistry`] maps tool identifiers to adapters.

mod adapter;
mod error;
mod registry;
mod stream;
mod text;
mod validate;

pub mod hammerdb;
pub mod swingbench;
pub mod sysbench;
pub mod tpcc;

pub use adapter::{BenchmarkAdapter, TelemetryParser};
pub use error::{AdapterError, StreamError, ValidationError};
pub use hammerdb::HammerDbAdapter;
pub use registry::AdapterRegistry;
pub use stream::{
    CollectedOutput, CollectorHandle, CollectorSession, DEFAULT_QUEUE_CAPACITY, StreamCollector,
};
pub use swingbench::SwingbenchAdapter;
pub use sysbench::SysbenchAdapter;
pub use tpcc::TpccAdapter;
pub use validate::{THREADS, TIME};
