// Single shot: like step-0, but the first error ends the process.
use env_logger::Env;
use forecast_point::{
    ForecastPipeline, PipelineConfig, PipelineError, SINGLE_SHOT_CSV_PATH, SINGLE_SHOT_GRIB_PATH,
};
use log::info;
use std::path::Path;

#[tokio::main]
async fn main() -> Result<(), PipelineError> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let pipeline = ForecastPipeline::from_config(PipelineConfig::single_shot());
    let rows = pipeline
        .run_single_shot(
            Path::new(SINGLE_SHOT_GRIB_PATH),
            Path::new(SINGLE_SHOT_CSV_PATH),
        )
        .await?;
    info!("Wrote {rows} rows to {SINGLE_SHOT_CSV_PATH}");
    Ok(())
}
