// Step-0 batch: every date in one request, analysis step only. Failures are logged.
use env_logger::Env;
use forecast_point::{ForecastPipeline, PipelineConfig, STEP_0_CSV_PATH, STEP_0_GRIB_PATH};
use std::path::Path;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let pipeline = ForecastPipeline::from_config(PipelineConfig::default());
    pipeline
        .run_batch(Path::new(STEP_0_GRIB_PATH), Path::new(STEP_0_CSV_PATH))
        .await;
}
