use crate::config::LatLon;
use crate::grid::error::GridError;
use crate::grid::header::FieldHeader;
use crate::grid::locate::{GridLocator, GridPoint};
use crate::grid::parameter::{Parameter, HEIGHT_ABOVE_GROUND};
use chrono::NaiveDateTime;
use grib::{GridDefinition, Grib2SubmessageDecoder};
use haversine::{distance, Location as HaversineLocation, Units};
use log::{debug, info};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// One value of the point series: a forecast run and a step into it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointRecord {
    /// Forecast issue time (UTC).
    pub reference_time: NaiveDateTime,
    pub step_hours: u32,
    /// Raw value, in the parameter's units.
    pub value: f64,
}

/// The values of one parameter at a single grid point, for every run and step in a file.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSeries {
    pub parameter: &'static Parameter,
    /// Coordinates of the selected grid point, not of the requested location.
    pub latitude: f64,
    pub longitude: f64,
    pub height_above_ground: Option<f64>,
    /// Sorted by issue time, then step.
    pub records: Vec<PointRecord>,
}

/// Reads gridded files and extracts the series at one location.
pub trait GridDecoder: Send + Sync {
    /// Selects the records of `short_name` in the file at `path` and returns their values at the
    /// grid point nearest to `location`.
    fn extract_point(
        &self,
        path: &Path,
        location: LatLon,
        short_name: &str,
    ) -> Result<PointSeries, GridError>;
}

/// [`GridDecoder`] for GRIB2 files.
///
/// Fields are read with the `grib` crate. No index file is written next to the grid file.
#[derive(Debug, Clone, Copy, Default)]
pub struct GribDecoder;

impl GridDecoder for GribDecoder {
    fn extract_point(
        &self,
        path: &Path,
        location: LatLon,
        short_name: &str,
    ) -> Result<PointSeries, GridError> {
        let parameter = Parameter::from_short_name(short_name)
            .ok_or_else(|| GridError::UnknownParameter(short_name.to_string()))?;
        let file = File::open(path).map_err(|e| GridError::FileRead(path.to_path_buf(), e))?;
        let grib2 = grib::from_reader(BufReader::new(file))
            .map_err(|e| GridError::Decode(format!("'{}'", path.display()), e))?;
        debug!("Read {} GRIB fields from {}", grib2.len(), path.display());

        // Nearest point of the last grid seen, keyed by its grid definition section.
        let mut selected: Option<(GridDefinition, GridPoint)> = None;
        let mut height_above_ground = None;
        let mut records = Vec::new();

        for ((message, field), submessage) in grib2.iter() {
            let context = format!("field {message}.{field} of '{}'", path.display());
            let Some(header) = FieldHeader::read(&submessage, &context)? else {
                continue;
            };
            if !parameter.matches(&header) {
                continue;
            }

            let cached = match &selected {
                Some((grid, point)) if grid == submessage.grid_def() => Some(*point),
                _ => None,
            };
            let point = match cached {
                Some(point) => point,
                None => {
                    let latlons = submessage
                        .latlons()
                        .map_err(|e| GridError::Decode(context.clone(), e))?;
                    let locator =
                        GridLocator::new(latlons.map(|(lat, lon)| (lat as f64, lon as f64)));
                    let point = locator
                        .nearest(location)
                        .ok_or_else(|| GridError::EmptyGrid(context.clone()))?;
                    log_selection(location, &point, locator.len());
                    selected = Some((submessage.grid_def().clone(), point));
                    point
                }
            };

            let decoder = Grib2SubmessageDecoder::from(submessage)
                .map_err(|e| GridError::Decode(context.clone(), e))?;
            let values: Vec<f32> = decoder
                .dispatch()
                .map_err(|e| GridError::Decode(context.clone(), e))?
                .collect();
            let value = *values
                .get(point.index)
                .ok_or_else(|| GridError::ValueCountMismatch {
                    context: context.clone(),
                    index: point.index,
                    len: values.len(),
                })?;

            if header.surface_type == HEIGHT_ABOVE_GROUND {
                height_above_ground = header.surface_value;
            }
            records.push(PointRecord {
                reference_time: header.reference_time,
                step_hours: header.step_hours,
                value: value as f64,
            });
        }

        let Some((_, point)) = selected else {
            return Err(GridError::VariableNotFound {
                path: path.to_path_buf(),
                short_name: short_name.to_string(),
            });
        };
        records.sort_by_key(|r| (r.reference_time, r.step_hours));

        Ok(PointSeries {
            parameter,
            latitude: point.latitude,
            longitude: point.longitude,
            height_above_ground,
            records,
        })
    }
}

fn log_selection(location: LatLon, point: &GridPoint, grid_len: usize) {
    let offset_km = distance(
        HaversineLocation {
            latitude: location.0,
            longitude: location.1,
        },
        HaversineLocation {
            latitude: point.latitude,
            longitude: point.longitude,
        },
        Units::Kilometers,
    );
    info!(
        "Nearest of {} grid points to ({}, {}) is ({}, {}), {:.1} km away",
        grid_len, location.0, location.1, point.latitude, point.longitude, offset_km
    );
}
