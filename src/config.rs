//! Run configuration shared by the three entry points.

use crate::retrieve::client::ClientOptions;
use crate::retrieve::request::{RetrieveRequest, FORECAST_CYCLES};
use bon::Builder;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Represents a geographical coordinate using latitude and longitude.
///
/// # Examples
///
/// ```
/// use forecast_point::LatLon;
///
/// let london = LatLon(51.5, 0.0);
/// assert_eq!(london.0, 51.5); // Latitude
/// assert_eq!(london.1, 0.0); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon(pub f64, pub f64);

const DEFAULT_START: NaiveDate = match NaiveDate::from_ymd_opt(2025, 6, 1) {
    Some(date) => date,
    None => panic!("invalid default start date"),
};

/// Output locations of the step-0 batch run.
pub const STEP_0_GRIB_PATH: &str = "data/aifs-forecast-step-0.grib2";
pub const STEP_0_CSV_PATH: &str = "data/aifs-forecast-step-0.csv";
/// Directory receiving one `{date}.csv` per date in the step-360 run.
pub const STEP_360_CSV_DIR: &str = "data/aifs-forecast-step-360/csv";
/// Output locations of the single-shot run.
pub const SINGLE_SHOT_GRIB_PATH: &str = "data/data.grib2";
pub const SINGLE_SHOT_CSV_PATH: &str = "data/data.csv";

/// Everything a run needs besides its output paths.
///
/// The defaults reproduce the summer-2025 London run: 91 days from 2025-06-01, all four daily
/// cycles, 2 m temperature, AIFS single at 0.25° from the AWS mirror, analysis step only.
///
/// ```
/// use forecast_point::{LatLon, PipelineConfig};
///
/// let config = PipelineConfig::builder()
///     .location(LatLon(52.37, 4.89))
///     .days(3)
///     .build();
/// assert_eq!(config.dates().len(), 3);
/// assert_eq!(config.param, "2t");
/// ```
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct PipelineConfig {
    /// Point whose nearest grid cell is extracted.
    #[builder(default = LatLon(51.5, 0.0))]
    pub location: LatLon,
    /// First run date.
    #[builder(default = DEFAULT_START)]
    pub start: NaiveDate,
    /// Number of consecutive run dates.
    #[builder(default = 91)]
    pub days: usize,
    /// Upper bound on dates processed at the same time by [`crate::ForecastPipeline::run_per_date`].
    #[builder(default = 4)]
    pub workers: usize,
    /// Forecast cycles (issue hours, UTC).
    #[builder(default = FORECAST_CYCLES.to_vec())]
    pub times: Vec<u32>,
    /// Forecast steps in hours.
    #[builder(default = vec![0])]
    pub steps: Vec<u32>,
    /// Short name of the extracted parameter.
    #[builder(into, default = String::from("2t"))]
    pub param: String,
    #[builder(default)]
    pub client: ClientOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig::builder().build()
    }
}

impl PipelineConfig {
    /// Defaults of the single-shot run, which fetches files in date order.
    pub fn single_shot() -> Self {
        PipelineConfig::builder()
            .client(
                ClientOptions::builder()
                    .preserve_request_order(true)
                    .build(),
            )
            .build()
    }

    /// The run dates, `start` and the `days - 1` days after it.
    pub fn dates(&self) -> Vec<NaiveDate> {
        crate::dates::date_range(self.start, self.days)
    }

    /// Request for `dates` with this configuration's cycles, steps and parameter.
    pub fn request(&self, dates: Vec<NaiveDate>) -> RetrieveRequest {
        RetrieveRequest::builder()
            .dates(dates)
            .times(self.times.clone())
            .steps(self.steps.clone())
            .params(vec![self.param.clone()])
            .build()
    }
}

/// `{dir}/{date}.csv`
pub fn date_csv_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("{}.csv", date.format("%Y-%m-%d")))
}
