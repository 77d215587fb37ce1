// Step-360 per date: one request per date with every published step, four dates at a time.
use env_logger::Env;
use forecast_point::{ForecastPipeline, PipelineConfig, PipelineError, STEP_360_CSV_DIR};
use std::path::Path;

#[tokio::main]
async fn main() -> Result<(), PipelineError> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let defaults = PipelineConfig::default();
    let config = PipelineConfig::builder()
        .steps(defaults.client.model.all_steps())
        .build();
    let pipeline = ForecastPipeline::from_config(config);
    let dates = pipeline.config().dates();
    pipeline
        .run_per_date(dates, Path::new(STEP_360_CSV_DIR))
        .await?;
    Ok(())
}
