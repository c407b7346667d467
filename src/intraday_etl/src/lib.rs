#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod db;
pub mod etl;
pub mod extract;
pub mod io;
pub mod load;
pub mod models;
pub mod pipeline;
pub mod providers;
pub mod schema;
pub mod transform;
