//! Short parameter names and the GRIB2 fields they stand for.

use crate::grid::header::FieldHeader;

/// GRIB2 code for a fixed height above ground, in metres.
pub const HEIGHT_ABOVE_GROUND: u8 = 103;
const GROUND_OR_WATER_SURFACE: u8 = 1;
const MEAN_SEA_LEVEL: u8 = 101;

/// A forecast variable as published by the archive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameter {
    /// Archive short name, e.g. `2t`.
    pub short_name: &'static str,
    /// Conventional variable name used for the raw column, e.g. `t2m`.
    pub variable_name: &'static str,
    pub discipline: u8,
    pub category: u8,
    pub number: u8,
    /// Type of the first fixed surface (GRIB2 code table 4.5).
    pub surface_type: u8,
    /// Level on that surface, when the surface type has one.
    pub surface_value: Option<f64>,
    pub units: &'static str,
}

/// Every parameter this crate can select.
pub static PARAMETERS: [Parameter; 8] = [
    Parameter {
        short_name: "2t",
        variable_name: "t2m",
        discipline: 0,
        category: 0,
        number: 0,
        surface_type: HEIGHT_ABOVE_GROUND,
        surface_value: Some(2.0),
        units: "K",
    },
    Parameter {
        short_name: "2d",
        variable_name: "d2m",
        discipline: 0,
        category: 0,
        number: 6,
        surface_type: HEIGHT_ABOVE_GROUND,
        surface_value: Some(2.0),
        units: "K",
    },
    Parameter {
        short_name: "skt",
        variable_name: "skt",
        discipline: 0,
        category: 0,
        number: 17,
        surface_type: GROUND_OR_WATER_SURFACE,
        surface_value: None,
        units: "K",
    },
    Parameter {
        short_name: "10u",
        variable_name: "u10",
        discipline: 0,
        category: 2,
        number: 2,
        surface_type: HEIGHT_ABOVE_GROUND,
        surface_value: Some(10.0),
        units: "m s**-1",
    },
    Parameter {
        short_name: "10v",
        variable_name: "v10",
        discipline: 0,
        category: 2,
        number: 3,
        surface_type: HEIGHT_ABOVE_GROUND,
        surface_value: Some(10.0),
        units: "m s**-1",
    },
    Parameter {
        short_name: "msl",
        variable_name: "msl",
        discipline: 0,
        category: 3,
        number: 0,
        surface_type: MEAN_SEA_LEVEL,
        surface_value: None,
        units: "Pa",
    },
    Parameter {
        short_name: "sp",
        variable_name: "sp",
        discipline: 0,
        category: 3,
        number: 0,
        surface_type: GROUND_OR_WATER_SURFACE,
        surface_value: None,
        units: "Pa",
    },
    Parameter {
        short_name: "tp",
        variable_name: "tp",
        discipline: 0,
        category: 1,
        number: 8,
        surface_type: GROUND_OR_WATER_SURFACE,
        surface_value: None,
        units: "kg m**-2",
    },
];

impl Parameter {
    /// Looks up a parameter by its archive short name.
    ///
    /// ```
    /// use forecast_point::Parameter;
    ///
    /// let t2m = Parameter::from_short_name("2t").unwrap();
    /// assert_eq!(t2m.variable_name, "t2m");
    /// assert!(Parameter::from_short_name("bogus").is_none());
    /// ```
    pub fn from_short_name(short_name: &str) -> Option<&'static Parameter> {
        PARAMETERS.iter().find(|p| p.short_name == short_name)
    }

    pub fn is_kelvin(&self) -> bool {
        self.units == "K"
    }

    /// Whether a GRIB field holds this parameter.
    pub(crate) fn matches(&self, field: &FieldHeader) -> bool {
        let level_matches = match (self.surface_value, field.surface_value) {
            (Some(expected), Some(actual)) => (expected - actual).abs() < 1e-6,
            (Some(_), None) => false,
            (None, _) => true,
        };
        field.discipline == self.discipline
            && field.category == self.category
            && field.number == self.number
            && field.surface_type == self.surface_type
            && level_matches
    }
}
