//! Nearest-neighbour lookup over the points of a forecast grid.

use crate::config::LatLon;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// A single point of a forecast grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPoint {
    /// Position of the point in the field's scanning order.
    pub index: usize,
    pub latitude: f64,
    pub longitude: f64,
}

/// Lets `rstar` index grid points by (latitude, longitude).
impl RTreeObject for GridPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.latitude, self.longitude])
    }
}

/// Squared Euclidean distance in degrees, treating latitude and longitude as plane axes.
///
/// On a regular lat/lon grid this picks the same cell as choosing the nearest latitude and
/// the nearest longitude independently.
impl PointDistance for GridPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.latitude - point[0];
        let dy = self.longitude - point[1];
        dx * dx + dy * dy
    }
}

/// Finds the grid point closest to a coordinate.
///
/// Longitudes are compared in [-180, 180) whatever convention the grid or the caller uses, and
/// distances wrap around the antimeridian. Coordinates outside a regional grid are not an error:
/// the closest edge point is returned.
#[derive(Debug, Clone)]
pub struct GridLocator {
    rtree: RTree<GridPoint>,
}

impl GridLocator {
    /// Indexes the grid points given in scanning order.
    pub fn new(latlons: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let points = latlons
            .into_iter()
            .enumerate()
            .map(|(index, (latitude, longitude))| GridPoint {
                index,
                latitude,
                longitude: normalize_longitude(longitude),
            })
            .collect();
        GridLocator {
            rtree: RTree::bulk_load(points),
        }
    }

    pub fn len(&self) -> usize {
        self.rtree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }

    /// The grid point nearest to `location`, or `None` for an empty grid.
    pub fn nearest(&self, location: LatLon) -> Option<GridPoint> {
        let longitude = normalize_longitude(location.1);
        // The same meridian one turn over, for points across the antimeridian.
        let wrapped = if longitude < 0.0 {
            longitude + 360.0
        } else {
            longitude - 360.0
        };
        [longitude, wrapped]
            .into_iter()
            .filter_map(|lon| {
                let query = [location.0, lon];
                self.rtree
                    .nearest_neighbor(&query)
                    .map(|point| (point.distance_2(&query), *point))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, point)| point)
    }
}

/// Maps a longitude in degrees to [-180, 180).
pub(crate) fn normalize_longitude(longitude: f64) -> f64 {
    (longitude + 180.0).rem_euclid(360.0) - 180.0
}
