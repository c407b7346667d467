//! Transform stage: per-entry normalization and the parallel batch driver.

pub mod driver;
pub mod normalize;

pub use driver::{DriverBuildError, EmptyBatchError, TransformDriver, TransformOutcome};
pub use normalize::normalize;
