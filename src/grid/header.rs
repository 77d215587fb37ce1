//! Identification and product definition of a GRIB2 field, as read by the `grib` crate.

use crate::grid::error::GridError;
use chrono::NaiveDateTime;
use grib::codetables::grib2::Table4_4;
use grib::{Code, SectionBody, SubMessage};

/// The parts of a field's headers needed to select it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FieldHeader {
    pub discipline: u8,
    /// Forecast issue time (UTC).
    pub reference_time: NaiveDateTime,
    pub category: u8,
    pub number: u8,
    pub step_hours: u32,
    /// Type of the first fixed surface (code table 4.5).
    pub surface_type: u8,
    pub surface_value: Option<f64>,
}

impl FieldHeader {
    /// Reads the header of `submessage`.
    ///
    /// Returns `Ok(None)` for product templates the `grib` crate can't read a parameter from.
    pub fn read<R>(submessage: &SubMessage<R>, context: &str) -> Result<Option<Self>, GridError> {
        let prod_def = submessage.prod_def();
        let (Some(category), Some(number)) =
            (prod_def.parameter_category(), prod_def.parameter_number())
        else {
            return Ok(None);
        };

        let reference_time = match submessage.1.body.body.as_ref() {
            Some(SectionBody::Section1(identification)) => identification
                .ref_time()
                .map_err(|e| GridError::Decode(context.to_string(), e))?
                .naive_utc(),
            _ => return Err(malformed(context, "identification section missing")),
        };

        let forecast_time = prod_def
            .forecast_time()
            .ok_or_else(|| malformed(context, "no forecast time"))?;
        let step_hours = to_hours(&forecast_time.unit, forecast_time.value).ok_or_else(|| {
            malformed(
                context,
                format!("forecast time {forecast_time} is not a whole number of hours"),
            )
        })?;

        let (first_surface, _) = prod_def
            .fixed_surfaces()
            .ok_or_else(|| malformed(context, "no fixed surface"))?;
        let surface_value = if first_surface.value_is_nan() || first_surface.scale_factor_is_nan()
        {
            None
        } else {
            Some(first_surface.value())
        };

        Ok(Some(Self {
            discipline: submessage.indicator().discipline,
            reference_time,
            category,
            number,
            step_hours,
            surface_type: first_surface.surface_type,
            surface_value,
        }))
    }
}

fn malformed(context: &str, reason: impl Into<String>) -> GridError {
    GridError::MalformedMessage {
        context: context.to_string(),
        reason: reason.into(),
    }
}

/// Forecast time in hours, for the units of code table 4.4 that convert exactly.
fn to_hours(unit: &Code<Table4_4, u8>, value: u32) -> Option<u32> {
    let exact = |divisor: u32| (value % divisor == 0).then(|| value / divisor);
    match unit {
        Code::Name(Table4_4::Hour) => Some(value),
        Code::Name(Table4_4::Minute) => exact(60),
        Code::Name(Table4_4::Second) => exact(3600),
        Code::Name(Table4_4::Day) => value.checked_mul(24),
        Code::Name(Table4_4::ThreeHours) => value.checked_mul(3),
        Code::Name(Table4_4::SixHours) => value.checked_mul(6),
        Code::Name(Table4_4::TwelveHours) => value.checked_mul(12),
        _ => None,
    }
}
