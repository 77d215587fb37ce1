//! Builds small GRIB2 messages for tests: a regular lat/lon grid (template 3.0), an analysis
//! or forecast product (template 4.0) and simple packing (template 5.0) with 16-bit values.

use chrono::{Datelike, NaiveDateTime, Timelike};

/// A regular grid scanned west to east, north to south.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GridSpec {
    pub lat_first: f64,
    pub lat_last: f64,
    pub lon_first: f64,
    pub lon_last: f64,
    pub ni: u32,
    pub nj: u32,
}

impl GridSpec {
    /// 5 × 5 points at 0.25° spacing covering 51–52°N, 0–1°E.
    pub fn small() -> Self {
        Self {
            lat_first: 52.0,
            lat_last: 51.0,
            lon_first: 0.0,
            lon_last: 1.0,
            ni: 5,
            nj: 5,
        }
    }

    pub fn len(&self) -> usize {
        (self.ni * self.nj) as usize
    }

    /// A full circle of longitudes at 1° from 180°E eastwards, like the open-data grids, over
    /// 45–40°N.
    pub fn wrapping() -> Self {
        Self {
            lat_first: 45.0,
            lat_last: 40.0,
            lon_first: 180.0,
            lon_last: 179.0,
            ni: 360,
            nj: 6,
        }
    }

    fn lon_increment(&self) -> f64 {
        (self.lon_last - self.lon_first).rem_euclid(360.0) / (self.ni - 1) as f64
    }

    /// Coordinates of point `index` in scanning order, longitude in [0, 360).
    pub fn latlon(&self, index: usize) -> (f64, f64) {
        let (row, col) = (index / self.ni as usize, index % self.ni as usize);
        let dlat = (self.lat_first - self.lat_last) / (self.nj - 1) as f64;
        (
            self.lat_first - row as f64 * dlat,
            (self.lon_first + col as f64 * self.lon_increment()).rem_euclid(360.0),
        )
    }

    /// Index of the point at row `row`, column `col`.
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.ni as usize + col
    }
}

#[derive(Debug, Clone)]
pub(crate) struct FieldSpec {
    pub reference_time: NaiveDateTime,
    pub step_hours: u32,
    pub category: u8,
    pub number: u8,
    pub surface_type: u8,
    pub surface_value: u32,
    /// Whole numbers, so that 16-bit simple packing reproduces them exactly.
    pub values: Vec<f32>,
}

impl FieldSpec {
    /// 2 m temperature, 270 K at the first point and one kelvin more at every next point.
    pub fn t2m(reference_time: NaiveDateTime, step_hours: u32, len: usize) -> Self {
        Self {
            reference_time,
            step_hours,
            category: 0,
            number: 0,
            surface_type: 103,
            surface_value: 2,
            values: (0..len).map(|i| 270.0 + i as f32).collect(),
        }
    }

    /// 10 m zonal wind on the same grid.
    pub fn u10(reference_time: NaiveDateTime, step_hours: u32, len: usize) -> Self {
        Self {
            category: 2,
            number: 2,
            surface_value: 10,
            values: vec![3.0; len],
            ..Self::t2m(reference_time, step_hours, len)
        }
    }

    pub fn with_offset(mut self, offset: f32) -> Self {
        for v in &mut self.values {
            *v += offset;
        }
        self
    }
}

fn micro_degrees(value: f64) -> u32 {
    (value * 1e6).round() as u32
}

fn section(number: u8, body: &[u8]) -> Vec<u8> {
    let mut out = ((body.len() + 5) as u32).to_be_bytes().to_vec();
    out.push(number);
    out.extend_from_slice(body);
    out
}

pub(crate) fn encode_message(grid: &GridSpec, field: &FieldSpec) -> Vec<u8> {
    let n = grid.len() as u32;
    assert_eq!(field.values.len(), grid.len());
    let t = field.reference_time;

    let mut identification = Vec::new();
    identification.extend(98u16.to_be_bytes()); // centre
    identification.extend(0u16.to_be_bytes()); // sub-centre
    identification.extend([28, 0, 1]); // master table, local table, significance of ref time
    identification.extend((t.year() as u16).to_be_bytes());
    identification.extend([
        t.month() as u8,
        t.day() as u8,
        t.hour() as u8,
        t.minute() as u8,
        t.second() as u8,
    ]);
    identification.extend([0, 1]); // operational, forecast

    let mut grid_definition = vec![0];
    grid_definition.extend(n.to_be_bytes());
    grid_definition.extend([0, 0]);
    grid_definition.extend(0u16.to_be_bytes()); // template 3.0
    grid_definition.extend([6, 0]);
    grid_definition.extend(0u32.to_be_bytes());
    grid_definition.push(0);
    grid_definition.extend(0u32.to_be_bytes());
    grid_definition.push(0);
    grid_definition.extend(0u32.to_be_bytes());
    grid_definition.extend(grid.ni.to_be_bytes());
    grid_definition.extend(grid.nj.to_be_bytes());
    grid_definition.extend(0u32.to_be_bytes()); // basic angle
    grid_definition.extend(u32::MAX.to_be_bytes()); // subdivisions: missing
    grid_definition.extend(micro_degrees(grid.lat_first).to_be_bytes());
    grid_definition.extend(micro_degrees(grid.lon_first).to_be_bytes());
    grid_definition.push(0x30);
    grid_definition.extend(micro_degrees(grid.lat_last).to_be_bytes());
    grid_definition.extend(micro_degrees(grid.lon_last).to_be_bytes());
    let di = grid.lon_increment();
    let dj = (grid.lat_first - grid.lat_last) / (grid.nj - 1) as f64;
    grid_definition.extend(micro_degrees(di).to_be_bytes());
    grid_definition.extend(micro_degrees(dj).to_be_bytes());
    grid_definition.push(0x00); // scanning mode

    let mut product = Vec::new();
    product.extend(0u16.to_be_bytes()); // coordinate values
    product.extend(0u16.to_be_bytes()); // template 4.0
    product.extend([field.category, field.number, 2, 0, 0]);
    product.extend(0u16.to_be_bytes());
    product.extend([0, 1]); // cut-off minutes, unit: hour
    product.extend(field.step_hours.to_be_bytes());
    product.extend([field.surface_type, 0]);
    product.extend(field.surface_value.to_be_bytes());
    product.extend([0xFF, 0xFF]);
    product.extend(u32::MAX.to_be_bytes());

    let reference = field
        .values
        .iter()
        .copied()
        .fold(f32::INFINITY, f32::min);
    let mut representation = n.to_be_bytes().to_vec();
    representation.extend(0u16.to_be_bytes()); // template 5.0
    representation.extend(reference.to_be_bytes());
    representation.extend(0u16.to_be_bytes()); // binary scale
    representation.extend(0u16.to_be_bytes()); // decimal scale
    representation.extend([16, 0]);

    let mut data = Vec::with_capacity(grid.len() * 2);
    for v in &field.values {
        data.extend(((v - reference).round() as u16).to_be_bytes());
    }

    let mut body = Vec::new();
    body.extend(section(1, &identification));
    body.extend(section(3, &grid_definition));
    body.extend(section(4, &product));
    body.extend(section(5, &representation));
    body.extend(section(6, &[0xFF]));
    body.extend(section(7, &data));

    let total = (16 + body.len() + 4) as u64;
    let mut message = b"GRIB".to_vec();
    message.extend([0, 0, 0, 2]); // reserved, discipline 0, edition 2
    message.extend(total.to_be_bytes());
    message.extend(body);
    message.extend(b"7777");
    message
}
