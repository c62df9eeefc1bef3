//! Tributary Engine
//!
//! Drives a [`ValidatedGraph`](tributary_graph::ValidatedGraph) as a live
//! dataflow program.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Engine                             │
//! │  - start(graph) → RunHandle                                 │
//! │  - one scheduler task per run                               │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Scheduler                            │
//! │  - readiness over per-port FIFO queues                      │
//! │  - trigger arming and pending resolutions                   │
//! │  - stop, fail-fast / isolate                                │
//! └─────────────────────────────────────────────────────────────┘
//!                               │  JoinSet
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Firings                             │
//! │  - invoke the computation, stream outputs                   │
//! │  - route each output into downstream queues immediately     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let (sink, mut events) = ChannelSink::channel();
//! let engine = Engine::with_sink(EngineConfig::default(), sink);
//!
//! let handle = engine.start(graph.into_validated()?);
//! let controller = handle.controller();
//!
//! while let Some(event) = events.recv().await {
//!   if let ExecutionEvent::InputNeeded { instance_id, .. } = &event {
//!     controller.resolve_trigger(instance_id, 5)?;
//!   }
//!   if event.is_terminal() {
//!     break;
//!   }
//! }
//! let summary = handle.wait().await?;
//! ```

mod context;
mod engine;
mod error;
mod events;
mod firing;
mod handle;
mod queue;
mod scheduler;
mod trigger;

pub use engine::{Engine, EngineConfig};
pub use error::{EngineError, NodeFailure, RunError};
pub use events::{ChannelSink, EventSink, ExecutionEvent, NoopSink};
pub use handle::{RunController, RunHandle, RunSummary};
pub use tributary_config::{FailurePolicy, TriggerMode};
