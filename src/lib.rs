//! `HyperXGen` — creative generation kernel with a request reliability layer.
//!
//! Every call to the generation API goes through [`reliability::ReliableRequest`],
//! which absorbs quota exhaustion with linear backoff and recovers from
//! credential failures with one re-authenticated retry. Panels drive a
//! [`status::StatusTracker`] around each kernel operation.

pub mod config;
pub mod kernel;
pub mod llm;
pub mod panel;
pub mod prompt;
pub mod reliability;
pub mod status;
pub mod style;

pub use config::{Config, KernelConfig};
pub use kernel::{ChatReply, ChatTurn, Kernel, PanelMode, RealIssue};
pub use llm::{GeminiClient, GenerativeModel, LlmError};
pub use panel::{Panel, PanelError};
pub use reliability::{ErrorClass, ReliableRequest, RetryPolicy};
pub use status::{GenerationStatus, StatusTracker};
pub use style::ExtractionResult;
