//! Lambert Conformal Conic projection between lat/lon and the KMA forecast
//! grid. The constants are fixed by the provider; forecast lookups depend on
//! reproducing its integer cell indices exactly.

use std::f64::consts::PI;

use crate::model::{Coordinate, GridCell};

const EARTH_RADIUS_KM: f64 = 6371.00877;
const GRID_SPACING_KM: f64 = 5.0;
const STD_PARALLEL_1_DEG: f64 = 30.0;
const STD_PARALLEL_2_DEG: f64 = 60.0;
const ORIGIN_LON_DEG: f64 = 126.0;
const ORIGIN_LAT_DEG: f64 = 38.0;
const ORIGIN_X: f64 = 43.0;
const ORIGIN_Y: f64 = 136.0;

/// Projection terms shared by both directions.
struct Lcc {
    re: f64,
    sn: f64,
    sf: f64,
    ro: f64,
    olon: f64,
}

fn lcc() -> Lcc {
    let re = EARTH_RADIUS_KM / GRID_SPACING_KM;
    let slat1 = STD_PARALLEL_1_DEG.to_radians();
    let slat2 = STD_PARALLEL_2_DEG.to_radians();
    let olon = ORIGIN_LON_DEG.to_radians();
    let olat = ORIGIN_LAT_DEG.to_radians();

    let mut sn = (PI * 0.25 + slat2 * 0.5).tan() / (PI * 0.25 + slat1 * 0.5).tan();
    sn = (slat1.cos() / slat2.cos()).ln() / sn.ln();
    let mut sf = (PI * 0.25 + slat1 * 0.5).tan();
    sf = sf.powf(sn) * slat1.cos() / sn;
    let mut ro = (PI * 0.25 + olat * 0.5).tan();
    ro = re * sf / ro.powf(sn);

    Lcc { re, sn, sf, ro, olon }
}

/// Project a coordinate onto the forecast grid.
///
/// Pure and total: any finite lat/lon yields a cell. Indices are produced
/// with `floor(x + 0.5)` (round half up) to match the provider's published
/// reference cells.
pub fn to_grid(latitude: f64, longitude: f64) -> GridCell {
    let p = lcc();

    let mut ra = (PI * 0.25 + latitude.to_radians() * 0.5).tan();
    ra = p.re * p.sf / ra.powf(p.sn);
    let mut theta = longitude.to_radians() - p.olon;
    if theta > PI {
        theta -= 2.0 * PI;
    }
    if theta < -PI {
        theta += 2.0 * PI;
    }
    theta *= p.sn;

    GridCell {
        nx: (ra * theta.sin() + ORIGIN_X + 0.5).floor() as i32,
        ny: (p.ro - ra * theta.cos() + ORIGIN_Y + 0.5).floor() as i32,
    }
}

/// Inverse projection: grid cell back to the lat/lon of its reference point.
///
/// Not used by the live pipeline; provided for completeness and testing.
/// Round-tripping through `to_grid` recovers a coordinate within the grid's
/// ~5 km resolution, not the original exactly.
pub fn to_lat_lon(nx: i32, ny: i32) -> Coordinate {
    let p = lcc();
    let xn = f64::from(nx) - ORIGIN_X;
    let yn = p.ro - f64::from(ny) + ORIGIN_Y;

    let mut ra = (xn * xn + yn * yn).sqrt();
    if p.sn < 0.0 {
        ra = -ra;
    }
    let mut alat = (p.re * p.sf / ra).powf(1.0 / p.sn);
    alat = 2.0 * alat.atan() - PI * 0.5;
    let theta = xn.atan2(yn);
    let alon = theta / p.sn + p.olon;

    Coordinate {
        latitude: alat.to_degrees(),
        longitude: alon.to_degrees(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seoul_city_hall_maps_to_published_cell() {
        let cell = to_grid(37.5665, 126.9780);
        assert_eq!(cell, GridCell { nx: 60, ny: 127 });
    }

    #[test]
    fn busan_and_jeju_map_to_published_cells() {
        assert_eq!(to_grid(35.1796, 129.0756), GridCell { nx: 98, ny: 76 });
        assert_eq!(to_grid(33.4996, 126.5312), GridCell { nx: 53, ny: 38 });
    }

    #[test]
    fn projection_is_deterministic() {
        let a = to_grid(36.3504, 127.3845);
        let b = to_grid(36.3504, 127.3845);
        assert_eq!(a, b);
    }

    #[test]
    fn inverse_of_seoul_cell_is_near_seoul() {
        let coord = to_lat_lon(60, 127);
        assert!((coord.latitude - 37.5665).abs() < 0.05);
        assert!((coord.longitude - 126.9780).abs() < 0.05);
    }

    #[test]
    fn round_trip_stays_within_one_cell() {
        // ~0.045 degrees is one 5 km cell at these latitudes.
        for &(lat, lon) in &[
            (37.5665, 126.9780),
            (35.1796, 129.0756),
            (33.4996, 126.5312),
            (36.3504, 127.3845),
            (38.2070, 128.5918),
        ] {
            let cell = to_grid(lat, lon);
            let back = to_lat_lon(cell.nx, cell.ny);
            assert!(
                (back.latitude - lat).abs() < 0.045,
                "latitude drift too large for ({lat}, {lon})"
            );
            assert!(
                (back.longitude - lon).abs() < 0.045,
                "longitude drift too large for ({lat}, {lon})"
            );
        }
    }
}
