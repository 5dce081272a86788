//! Observability module
//!
//! Logging, metrics, and the JSONL run event stream.

pub mod events;
pub mod logging;
pub mod metrics;

pub use events::{Event, EventEmitter};
pub use logging::{LogFormat, init_logging};
pub use metrics::{init_metrics, render_metrics};
