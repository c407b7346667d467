use std::path::PathBuf;

use snafu::{Backtrace, Snafu};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SinkError {
    /// The destination directory could not be created.
    #[snafu(display("Failed to create directory {}: {source}", path.display()))]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    /// The data could not be converted into the destination format.
    #[snafu(display("Data conversion error: {source}"))]
    Encode {
        source: serde_json::Error,
        backtrace: Backtrace,
    },

    /// An error occurred while writing the artifact (disk full, permission
    /// denied, name already taken, ...). No partial file is left behind.
    #[snafu(display("Failed to write {}: {source}", path.display()))]
    Write {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },
}

pub trait DataSink<T> {
    /// The type of output returned after a successful write operation.
    ///
    /// - A file sink returns the path of the created artifact.
    /// - A database sink might return the number of rows inserted.
    type Output;

    /// Writes a slice of `T` to the destination.
    ///
    /// # Arguments
    /// * `data` - The items to be written.
    fn write(&self, data: &[T]) -> Result<Self::Output, SinkError>;
}
