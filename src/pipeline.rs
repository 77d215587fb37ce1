//! Retrieve, extract, convert and export, for the three run shapes.

use crate::config::{date_csv_path, PipelineConfig};
use crate::error::PipelineError;
use crate::frame::ForecastFrame;
use crate::grid::decoder::{GribDecoder, GridDecoder};
use crate::retrieve::client::{Archive, ArchiveClient};
use crate::utils::ensure_dir_exists;
use chrono::NaiveDate;
use log::{debug, error, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task;

/// Outcome of a run over several dates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Dates whose CSV was written, ascending.
    pub completed: Vec<NaiveDate>,
    /// Dates that failed with their error message, ascending.
    pub failed: Vec<(NaiveDate, String)>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs the point-forecast pipeline against an [`Archive`] and a [`GridDecoder`].
///
/// ```no_run
/// # use forecast_point::{ForecastPipeline, PipelineConfig, PipelineError};
/// # async fn run() -> Result<(), PipelineError> {
/// let pipeline = ForecastPipeline::from_config(PipelineConfig::default());
/// let rows = pipeline
///     .run_single_shot("data/data.grib2".as_ref(), "data/data.csv".as_ref())
///     .await?;
/// println!("Wrote {rows} rows");
/// # Ok(())
/// # }
/// ```
pub struct ForecastPipeline<A, D> {
    config: Arc<PipelineConfig>,
    archive: Arc<A>,
    decoder: Arc<D>,
}

impl<A, D> Clone for ForecastPipeline<A, D> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            archive: Arc::clone(&self.archive),
            decoder: Arc::clone(&self.decoder),
        }
    }
}

impl ForecastPipeline<ArchiveClient, GribDecoder> {
    /// Pipeline downloading from the archive configured in `config.client`.
    pub fn from_config(config: PipelineConfig) -> Self {
        let archive = ArchiveClient::new(config.client.clone());
        Self::new(config, archive, GribDecoder)
    }
}

impl<A, D> ForecastPipeline<A, D>
where
    A: Archive + 'static,
    D: GridDecoder + 'static,
{
    pub fn new(config: PipelineConfig, archive: A, decoder: D) -> Self {
        Self {
            config: Arc::new(config),
            archive: Arc::new(archive),
            decoder: Arc::new(decoder),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Fetches `dates` into `grib_path`, extracts the configured point and writes `csv_path`.
    /// Returns the number of rows written.
    pub async fn process(
        &self,
        dates: Vec<NaiveDate>,
        grib_path: &Path,
        csv_path: &Path,
    ) -> Result<usize, PipelineError> {
        let request = self.config.request(dates);
        let summary = self.archive.fetch(&request, grib_path).await?;
        debug!(
            "{} fields from {} files in {}",
            summary.fields,
            summary.urls.len(),
            summary.target.display()
        );

        let frame = self.extract(grib_path.to_path_buf()).await?;
        Self::write(frame, csv_path.to_path_buf()).await
    }

    async fn extract(&self, grib_path: PathBuf) -> Result<ForecastFrame, PipelineError> {
        let decoder = Arc::clone(&self.decoder);
        let location = self.config.location;
        let param = self.config.param.clone();

        task::spawn_blocking(move || -> Result<ForecastFrame, PipelineError> {
            let series = decoder.extract_point(&grib_path, location, &param)?;
            Ok(ForecastFrame::from_series(&series)?
                .kelvin_to_celsius()?
                .drop_point_coordinates())
        })
        .await?
    }

    async fn write(mut frame: ForecastFrame, csv_path: PathBuf) -> Result<usize, PipelineError> {
        task::spawn_blocking(move || -> Result<usize, PipelineError> {
            frame.write_csv(&csv_path)?;
            Ok(frame.height())
        })
        .await?
    }

    /// All configured dates in one request, step list from the config, a single catch.
    ///
    /// A failure anywhere loses every date. It is logged, not returned.
    pub async fn run_batch(&self, grib_path: &Path, csv_path: &Path) -> RunReport {
        let dates = self.config.dates();
        match self.process(dates.clone(), grib_path, csv_path).await {
            Ok(rows) => {
                info!("Task complete: {} rows written to {}", rows, csv_path.display());
                RunReport {
                    completed: dates,
                    failed: Vec::new(),
                }
            }
            Err(e) => {
                error!("Task failed: {e}");
                let message = e.to_string();
                RunReport {
                    completed: Vec::new(),
                    failed: dates.into_iter().map(|d| (d, message.clone())).collect(),
                }
            }
        }
    }

    /// Like [`Self::run_batch`] but the first error is returned to the caller.
    pub async fn run_single_shot(
        &self,
        grib_path: &Path,
        csv_path: &Path,
    ) -> Result<usize, PipelineError> {
        self.process(self.config.dates(), grib_path, csv_path).await
    }

    /// Processes one date through a temporary grid file, writing `{csv_dir}/{date}.csv`.
    ///
    /// The grid file is removed when this returns, whatever the outcome.
    pub async fn process_date(
        &self,
        date: NaiveDate,
        csv_dir: &Path,
    ) -> Result<PathBuf, PipelineError> {
        let grib_file = tempfile::Builder::new()
            .prefix("forecast_")
            .suffix(&format!("_{date}.grib2"))
            .tempfile()
            .map_err(PipelineError::TempFile)?;
        let csv_path = date_csv_path(csv_dir, date);
        self.process(vec![date], grib_file.path(), &csv_path).await?;
        Ok(csv_path)
    }

    /// Runs [`Self::process_date`] for every date, at most `config.workers` at a time.
    ///
    /// Failed dates are logged and reported. They don't stop the others.
    pub async fn run_per_date(
        &self,
        dates: Vec<NaiveDate>,
        csv_dir: &Path,
    ) -> Result<RunReport, PipelineError> {
        ensure_dir_exists(csv_dir)
            .await
            .map_err(|e| PipelineError::OutputDirCreation(csv_dir.to_path_buf(), e))?;

        let semaphore = Arc::new(Semaphore::new(self.config.workers.max(1)));
        let mut workers = Vec::with_capacity(dates.len());
        for date in dates {
            let pipeline = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let csv_dir = csv_dir.to_path_buf();
            let handle = tokio::spawn(async move {
                // Held until the task ends. The semaphore is never closed.
                let _permit = semaphore.acquire_owned().await;
                pipeline.process_date(date, &csv_dir).await
            });
            workers.push((date, handle));
        }

        // Every handle keeps its date, so a panicking task is still reported against it.
        let mut report = RunReport::default();
        for (date, handle) in workers {
            let outcome = match handle.await {
                Ok(result) => result,
                Err(e) => Err(PipelineError::TaskJoin(e)),
            };
            match outcome {
                Ok(_) => {
                    info!("{date} complete");
                    report.completed.push(date);
                }
                Err(e) => {
                    error!("{date} failed: {e}");
                    report.failed.push((date, e.to_string()));
                }
            }
        }
        report.completed.sort();
        report.failed.sort();
        info!(
            "{} dates complete, {} failed",
            report.completed.len(),
            report.failed.len()
        );
        Ok(report)
    }
}
