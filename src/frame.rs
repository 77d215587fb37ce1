//! Tabular form of a [`PointSeries`] and its CSV output.

use crate::error::PipelineError;
use crate::grid::decoder::PointSeries;
use crate::grid::parameter::Parameter;
use chrono::{Duration, NaiveDateTime};
use log::debug;
use polars::prelude::*;
use std::path::Path;

pub const COL_TIME: &str = "time";
pub const COL_STEP: &str = "step";
pub const COL_LATITUDE: &str = "latitude";
pub const COL_LONGITUDE: &str = "longitude";
pub const COL_HEIGHT: &str = "heightAboveGround";
pub const COL_VALID_TIME: &str = "valid_time";
pub const COL_TEMP_C: &str = "temp_c";

const KELVIN_OFFSET: f64 = 273.15;
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Point forecast table, one row per (issue time, step).
///
/// Built by [`ForecastFrame::from_series`] with the columns `time`, `step`, `latitude`,
/// `longitude`, `heightAboveGround`, `valid_time` and the parameter's variable name (`t2m` for
/// 2 m temperature). [`ForecastFrame::kelvin_to_celsius`] and
/// [`ForecastFrame::drop_point_coordinates`] reduce it to the exported shape.
#[derive(Debug, Clone)]
pub struct ForecastFrame {
    /// The underlying Polars DataFrame.
    pub frame: DataFrame,
    parameter: &'static Parameter,
}

impl ForecastFrame {
    pub fn from_series(series: &PointSeries) -> Result<Self, PipelineError> {
        let n = series.records.len();
        let times: Vec<NaiveDateTime> = series.records.iter().map(|r| r.reference_time).collect();
        let steps: Vec<u32> = series.records.iter().map(|r| r.step_hours).collect();
        let valid_times: Vec<NaiveDateTime> = series
            .records
            .iter()
            .map(|r| r.reference_time + Duration::hours(r.step_hours as i64))
            .collect();
        let values: Vec<f64> = series.records.iter().map(|r| r.value).collect();

        let frame = df!(
            COL_TIME => times,
            COL_STEP => steps,
            COL_LATITUDE => vec![series.latitude; n],
            COL_LONGITUDE => vec![series.longitude; n],
            COL_HEIGHT => vec![series.height_above_ground; n],
            COL_VALID_TIME => valid_times,
            series.parameter.variable_name => values,
        )?;
        debug!(
            "Built {} row frame for '{}'",
            frame.height(),
            series.parameter.short_name
        );

        Ok(Self {
            frame,
            parameter: series.parameter,
        })
    }

    /// Replaces the raw kelvin column with `temp_c`.
    pub fn kelvin_to_celsius(self) -> Result<Self, PipelineError> {
        if !self.parameter.is_kelvin() {
            return Err(PipelineError::UnsupportedUnits {
                short_name: self.parameter.short_name.to_string(),
                units: self.parameter.units.to_string(),
            });
        }
        let raw = self.parameter.variable_name;
        let frame = self
            .frame
            .lazy()
            .with_column((col(raw) - lit(KELVIN_OFFSET)).alias(COL_TEMP_C))
            .collect()?
            .drop(raw)?;

        Ok(Self {
            frame,
            parameter: self.parameter,
        })
    }

    /// Removes the grid cell coordinates and level height. Missing columns are skipped.
    pub fn drop_point_coordinates(self) -> Self {
        Self {
            frame: self
                .frame
                .drop_many([COL_LATITUDE, COL_LONGITUDE, COL_HEIGHT]),
            parameter: self.parameter,
        }
    }

    /// Writes the table with a header row and no index column, replacing `path`.
    pub fn write_csv(&mut self, path: &Path) -> Result<(), PipelineError> {
        let mut file = std::fs::File::create(path)
            .map_err(|e| PipelineError::CsvCreate(path.to_path_buf(), e))?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .with_datetime_format(Some(DATETIME_FORMAT.to_string()))
            .finish(&mut self.frame)
            .map_err(|e| PipelineError::CsvWrite(path.to_path_buf(), e))?;
        debug!("Wrote {} rows to {}", self.frame.height(), path.display());
        Ok(())
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn parameter(&self) -> &'static Parameter {
        self.parameter
    }
}
