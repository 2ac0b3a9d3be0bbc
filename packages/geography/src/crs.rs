//! Coordinate reprojection between the supported CRSs.
//!
//! NAD83 and WGS 84 differ by about a meter in California, well under the
//! precision of the boundary files, so both are treated as the same
//! geographic system. Web Mercator uses the spherical formulas on the
//! WGS 84 semi-major axis.

use std::f64::consts::FRAC_PI_4;

use geo::{Coord, MapCoords, MultiPolygon};
use rhna_geography_models::Crs;

/// WGS 84 semi-major axis in meters.
const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Reprojects `geometry` from `from` into `to`. Returns a clone when both
/// systems coincide.
#[must_use]
pub fn reproject(geometry: &MultiPolygon<f64>, from: Crs, to: Crs) -> MultiPolygon<f64> {
    if from.is_geographic() == to.is_geographic() {
        return geometry.clone();
    }
    geometry.map_coords(|c| {
        let lon_lat = to_lon_lat(c, from);
        from_lon_lat(lon_lat, to)
    })
}

/// Converts a coordinate in `crs` to longitude/latitude degrees.
fn to_lon_lat(c: Coord<f64>, crs: Crs) -> Coord<f64> {
    match crs {
        Crs::Wgs84 | Crs::Nad83 => c,
        Crs::WebMercator => Coord {
            x: (c.x / EARTH_RADIUS_M).to_degrees(),
            y: (2.0 * (c.y / EARTH_RADIUS_M).exp().atan() - 2.0 * FRAC_PI_4).to_degrees(),
        },
    }
}

/// Converts longitude/latitude degrees into `crs`.
fn from_lon_lat(c: Coord<f64>, crs: Crs) -> Coord<f64> {
    match crs {
        Crs::Wgs84 | Crs::Nad83 => c,
        Crs::WebMercator => Coord {
            x: EARTH_RADIUS_M * c.x.to_radians(),
            y: EARTH_RADIUS_M * (FRAC_PI_4 + c.y.to_radians() / 2.0).tan().ln(),
        },
    }
}

#[cfg(test)]
mod tests {
    use geo::{Rect, coord};

    use super::*;

    fn oakland_box() -> MultiPolygon<f64> {
        MultiPolygon::new(vec![
            Rect::new(coord! { x: -122.3, y: 37.7 }, coord! { x: -122.1, y: 37.9 }).to_polygon(),
        ])
    }

    #[test]
    fn geographic_systems_are_identity() {
        let geom = oakland_box();
        assert_eq!(reproject(&geom, Crs::Nad83, Crs::Wgs84), geom);
    }

    #[test]
    fn projects_to_web_mercator() {
        let point = MultiPolygon::new(vec![
            Rect::new(coord! { x: -122.3, y: 37.7 }, coord! { x: -122.3, y: 37.7 }).to_polygon(),
        ]);
        let projected = reproject(&point, Crs::Wgs84, Crs::WebMercator);
        let first = projected.0[0].exterior().0[0];
        assert!((first.x - -13_614_373.7).abs() < 0.1, "x = {}", first.x);
        assert!((first.y - 4_537_132.1).abs() < 0.1, "y = {}", first.y);
    }

    #[test]
    fn unprojects_web_mercator() {
        let lon_lat = to_lon_lat(
            coord! { x: -13_614_373.72, y: 4_537_132.13 },
            Crs::WebMercator,
        );
        assert!((lon_lat.x - -122.3).abs() < 1e-6, "lon = {}", lon_lat.x);
        assert!((lon_lat.y - 37.7).abs() < 1e-6, "lat = {}", lon_lat.y);
    }

    #[test]
    fn round_trips_through_web_mercator() {
        let geom = oakland_box();
        let back = reproject(
            &reproject(&geom, Crs::Nad83, Crs::WebMercator),
            Crs::WebMercator,
            Crs::Nad83,
        );
        for (a, b) in geom.0[0]
            .exterior()
            .0
            .iter()
            .zip(back.0[0].exterior().0.iter())
        {
            assert!((a.x - b.x).abs() < 1e-9);
            assert!((a.y - b.y).abs() < 1e-9);
        }
    }
}
