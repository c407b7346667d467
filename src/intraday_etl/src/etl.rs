//! Full run: extract → transform → load, stopping at the first failure.

use snafu::{ResultExt, Snafu};

use crate::config::Settings;
use crate::extract::{ExtractError, ExtractSummary, extract};
use crate::io::discovery::RunId;
use crate::load::{LoadError, LoadSummary, load_latest};
use crate::pipeline::{PipelineError, RunSummary, TransformPipeline};
use crate::providers::QuoteProvider;
use crate::transform::DriverBuildError;

#[derive(Debug, Snafu)]
pub enum EtlError {
    #[snafu(display("extract failed: {source}"))]
    Extract {
        #[snafu(backtrace)]
        source: ExtractError,
    },

    #[snafu(display("transform failed: {source}"))]
    Setup {
        #[snafu(backtrace)]
        source: DriverBuildError,
    },

    #[snafu(display("transform failed: {source}"))]
    Transform {
        #[snafu(backtrace)]
        source: PipelineError,
    },

    #[snafu(display("load failed: {source}"))]
    Load {
        #[snafu(backtrace)]
        source: LoadError,
    },
}

#[derive(Debug, Clone)]
pub struct EtlReport {
    pub extract: ExtractSummary,
    pub transform: RunSummary,
    pub load: LoadSummary,
}

pub async fn run_etl(
    provider: &dyn QuoteProvider,
    settings: &Settings,
    run_id: Option<RunId>,
) -> Result<EtlReport, EtlError> {
    let extract = extract(provider, settings).await.context(ExtractSnafu)?;

    let mut pipeline = TransformPipeline::new(settings).context(SetupSnafu)?;
    if let Some(run_id) = run_id {
        pipeline = pipeline.with_run_id(run_id);
    }
    let transform = pipeline.run().context(TransformSnafu)?;

    let load = load_latest(settings).context(LoadSnafu)?;

    Ok(EtlReport {
        extract,
        transform,
        load,
    })
}
