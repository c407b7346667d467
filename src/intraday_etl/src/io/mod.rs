//! File-based staging protocol: artifact naming, discovery of the newest
//! artifact, and the writers that produce them.

pub(crate) mod atomic;
pub mod diagnostics;
pub mod discovery;
pub mod sink;
pub mod staging;

pub use diagnostics::RejectionLog;
pub use discovery::{ArtifactPattern, DiscoveryError, Recency, RunId, find_latest, stamp_now};
pub use sink::{DataSink, SinkError};
pub use staging::StagingWriter;
