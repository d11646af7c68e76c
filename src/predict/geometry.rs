use chrono::{DateTime, Utc};
use sgp4::{Constants, Elements};

use crate::predict::error::PredictError;

const WGS84_A_KM: f64 = 6378.137;
const WGS84_E2: f64 = 0.00669437999014;

type Vec3 = [f64; 3];

/// Geodetic position of a ground station, as consumed by the predictors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StationLocation {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_m: f64,
}

impl StationLocation {
    /// Earth-fixed position on the WGS-84 ellipsoid, in km.
    pub fn ecef_km(&self) -> Vec3 {
        let (sin_lat, cos_lat) = self.latitude_deg.to_radians().sin_cos();
        let (sin_lon, cos_lon) = self.longitude_deg.to_radians().sin_cos();
        let prime_vertical = WGS84_A_KM / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        let h = self.altitude_m / 1000.0;

        let equatorial = (prime_vertical + h) * cos_lat;
        [
            equatorial * cos_lon,
            equatorial * sin_lon,
            (prime_vertical * (1.0 - WGS84_E2) + h) * sin_lat,
        ]
    }
}

/// East/north/up frame anchored at a station.
///
/// Built once per prediction so the trigonometry of the station is not
/// repeated for every propagation step.
#[derive(Debug, Clone, Copy)]
pub struct TopocentricFrame {
    origin: Vec3,
    up: Vec3,
}

impl TopocentricFrame {
    pub fn new(station: &StationLocation) -> Self {
        let (sin_lat, cos_lat) = station.latitude_deg.to_radians().sin_cos();
        let (sin_lon, cos_lon) = station.longitude_deg.to_radians().sin_cos();
        Self {
            origin: station.ecef_km(),
            up: [cos_lat * cos_lon, cos_lat * sin_lon, sin_lat],
        }
    }

    /// Elevation in degrees of an Earth-fixed point above the local horizon.
    pub fn elevation_deg(&self, target_ecef: Vec3) -> f64 {
        let los = sub(target_ecef, self.origin);
        let range = dot(los, los).sqrt();
        if range == 0.0 {
            return 0.0;
        }
        (dot(los, self.up) / range).asin().to_degrees()
    }
}

/// Propagates the elements to `at` and returns the satellite's Earth-fixed position.
pub fn satellite_ecef_km(
    elements: &Elements,
    constants: &Constants,
    at: DateTime<Utc>,
) -> Result<Vec3, PredictError> {
    let naive = at.naive_utc();
    let minutes = elements
        .datetime_to_minutes_since_epoch(&naive)
        .map_err(|e| PredictError::Propagation(e.to_string()))?;
    let teme = constants
        .propagate(minutes)
        .map_err(|e| PredictError::Propagation(e.to_string()))?
        .position;

    let gmst = sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(&naive));
    Ok(rotate_z(teme, gmst))
}

/// Rotates a TEME vector about the pole by `-angle`, giving the Earth-fixed vector.
fn rotate_z(v: Vec3, angle: f64) -> Vec3 {
    let (s, c) = angle.sin_cos();
    [c * v[0] + s * v[1], c * v[1] - s * v[0], v[2]]
}

fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn dot(a: Vec3, b: Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(v: Vec3) -> f64 {
        dot(v, v).sqrt()
    }

    #[test]
    fn equator_prime_meridian_sits_on_x_axis() {
        let station = StationLocation {
            latitude_deg: 0.0,
            longitude_deg: 0.0,
            altitude_m: 0.0,
        };
        let [x, y, z] = station.ecef_km();
        assert!((x - WGS84_A_KM).abs() < 1e-6);
        assert!(y.abs() < 1e-9);
        assert!(z.abs() < 1e-9);
    }

    #[test]
    fn altitude_raises_radius() {
        let low = StationLocation {
            latitude_deg: 45.0,
            longitude_deg: 10.0,
            altitude_m: 0.0,
        };
        let high = StationLocation {
            altitude_m: 1000.0,
            ..low
        };
        let delta = norm(high.ecef_km()) - norm(low.ecef_km());
        assert!((delta - 1.0).abs() < 1e-3);
    }

    #[test]
    fn zenith_and_horizon_elevations() {
        let station = StationLocation {
            latitude_deg: 0.0,
            longitude_deg: 0.0,
            altitude_m: 0.0,
        };
        let frame = TopocentricFrame::new(&station);

        let overhead = [WGS84_A_KM + 500.0, 0.0, 0.0];
        assert!((frame.elevation_deg(overhead) - 90.0).abs() < 1e-9);

        let due_north = [WGS84_A_KM, 0.0, 500.0];
        assert!(frame.elevation_deg(due_north).abs() < 1e-9);
    }

    #[test]
    fn zero_sidereal_angle_is_identity() {
        assert_eq!(rotate_z([7000.0, -12.5, 300.0], 0.0), [7000.0, -12.5, 300.0]);
    }
}
