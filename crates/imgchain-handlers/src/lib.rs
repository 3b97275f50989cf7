//! imgchain handlers - invocation plumbing for the image pipeline
//!
//! Each pipeline stage (rotate, resize, grayscale) is a stateless
//! [`StageHandler`] that accepts either a storage "new object" notification
//! or a direct call carrying the image. In chained mode a stage writes its
//! output under the next stage's prefix and the notification for that write
//! triggers the next stage:
//!
//! ```text
//! input/ → rotate → stage1/ → resize → stage2/ → grayscale → output/
//! ```
//!
//! In direct mode the stage returns the JPEG inline as base64 in its metrics
//! record. The [`RoutingHandler`] seeds a language-specific bucket's `input/`
//! prefix from an uploaded image.
//!
//! Storage is reached only through the [`ObjectStore`] trait; [`FsStore`]
//! and [`MemoryStore`] are provided.

pub mod chain;
pub mod config;
pub mod emit;
pub mod error;
pub mod handler;
pub mod invocation;
pub mod metrics;
pub mod resolve;
pub mod routing;
pub mod stage;
pub mod storage;

pub use chain::{run_chain, ChainRun};
pub use config::{LanguageBuckets, PipelineConfig};
pub use error::HandlerError;
pub use handler::{StageHandler, StageOutcome};
pub use invocation::{classify, notification, DirectRequest, DirectSource, Invocation};
pub use metrics::{Inspector, MetricsRecord};
pub use resolve::Provenance;
pub use routing::{Language, RouteRequest, RouteResponse, RoutingHandler};
pub use stage::Stage;
pub use storage::{FsStore, MemoryStore, ObjectMetadata, ObjectStore, StorageError, StorageLocation};
