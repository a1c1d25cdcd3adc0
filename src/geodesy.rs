use serde::Deserialize;

pub type Degrees = f64;
pub type Meters = f64;

// WGS84
const SEMI_MAJOR_AXIS_M: Meters = 6_378_137.0;
const SEMI_MINOR_AXIS_M: Meters = 6_356_752.3142;

const MAX_ITERATIONS: u32 = 20;
const CONVERGENCE: f64 = 1.0e-12;


/**
 * A latitude and longitude pair in degrees. Values are not range checked.
 */
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct Coordinate {
    pub latitude: Degrees,
    pub longitude: Degrees,
}


impl Coordinate {
    pub fn new(latitude: Degrees, longitude: Degrees) -> Coordinate {
        Coordinate {
            latitude: latitude,
            longitude: longitude,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}


/**
 * Distance and bearings between two coordinates. Bearings are in
 * (-180, 180] degrees, clockwise from true north.
 */
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DistanceResult {
    pub distance: Meters,
    pub initial_bearing: Degrees,
    pub final_bearing: Degrees,
}


/**
 * Computes the ellipsoidal distance and the initial and final bearings
 * between two coordinates using Vincenty's inverse formula on WGS84. See
 * http://www.ngs.noaa.gov/PUBS_LIB/inverse.pdf
 *
 * Identical points yield a distance and bearings of 0. NaN inputs produce
 * NaN outputs.
 */
pub fn distance_between(start: &Coordinate, end: &Coordinate) -> DistanceResult {
    let lat1 = start.latitude.to_radians();
    let lat2 = end.latitude.to_radians();
    let lon1 = start.longitude.to_radians();
    let lon2 = end.longitude.to_radians();

    let a = SEMI_MAJOR_AXIS_M;
    let b = SEMI_MINOR_AXIS_M;
    let f = (a - b) / a;
    let a_sq_minus_b_sq_over_b_sq = (a * a - b * b) / (b * b);

    let l = lon2 - lon1;
    let u1 = ((1.0 - f) * lat1.tan()).atan();
    let u2 = ((1.0 - f) * lat2.tan()).atan();

    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();
    let cos_u1_cos_u2 = cos_u1 * cos_u2;
    let sin_u1_sin_u2 = sin_u1 * sin_u2;

    let mut a_coefficient = 0.0;
    let mut sigma = 0.0;
    let mut delta_sigma = 0.0;
    let mut sin_lambda = 0.0;
    let mut cos_lambda = 0.0;

    // Initial guess
    let mut lambda = l;
    for _ in 0..MAX_ITERATIONS {
        let lambda_previous = lambda;
        let (s, c) = lambda.sin_cos();
        sin_lambda = s;
        cos_lambda = c;

        let t1 = cos_u2 * sin_lambda;
        let t2 = cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda;
        let sin_sigma = (t1 * t1 + t2 * t2).sqrt();
        let cos_sigma = sin_u1_sin_u2 + cos_u1_cos_u2 * cos_lambda;
        sigma = sin_sigma.atan2(cos_sigma);

        let sin_alpha = if sin_sigma == 0.0 {
            0.0
        } else {
            cos_u1_cos_u2 * sin_lambda / sin_sigma
        };
        let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        // Equatorial lines have cos_sq_alpha == 0
        let cos_2_sigma_m = if cos_sq_alpha == 0.0 {
            0.0
        } else {
            cos_sigma - 2.0 * sin_u1_sin_u2 / cos_sq_alpha
        };

        let u_squared = cos_sq_alpha * a_sq_minus_b_sq_over_b_sq;
        a_coefficient = 1.0 + (u_squared / 16384.0)
            * (4096.0 + u_squared * (-768.0 + u_squared * (320.0 - 175.0 * u_squared)));
        let b_coefficient = (u_squared / 1024.0)
            * (256.0 + u_squared * (-128.0 + u_squared * (74.0 - 47.0 * u_squared)));
        let c_coefficient = (f / 16.0) * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));

        let cos_2_sigma_m_sq = cos_2_sigma_m * cos_2_sigma_m;
        delta_sigma = b_coefficient * sin_sigma * (
            cos_2_sigma_m + (b_coefficient / 4.0) * (
                cos_sigma * (-1.0 + 2.0 * cos_2_sigma_m_sq)
                - (b_coefficient / 6.0) * cos_2_sigma_m
                    * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                    * (-3.0 + 4.0 * cos_2_sigma_m_sq)
            )
        );

        lambda = l + (1.0 - c_coefficient) * f * sin_alpha * (
            sigma + c_coefficient * sin_sigma * (
                cos_2_sigma_m + c_coefficient * cos_sigma * (-1.0 + 2.0 * cos_2_sigma_m_sq)
            )
        );

        if lambda == 0.0 || ((lambda - lambda_previous) / lambda).abs() < CONVERGENCE {
            break;
        }
    }

    let distance = b * a_coefficient * (sigma - delta_sigma);
    let initial_bearing = (cos_u2 * sin_lambda)
        .atan2(cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda)
        .to_degrees();
    let final_bearing = (cos_u1 * sin_lambda)
        .atan2(-sin_u1 * cos_u2 + cos_u1 * sin_u2 * cos_lambda)
        .to_degrees();

    DistanceResult {
        distance: distance,
        initial_bearing: initial_bearing,
        final_bearing: final_bearing,
    }
}


/**
 * Normalizes a bearing for display. Positive bearings pass through, zero and
 * negative bearings become |bearing - 180|.
 */
pub fn bearing_to_azimuth(bearing: Option<Degrees>) -> Option<Degrees> {
    let bearing = bearing?;
    if bearing > 0.0 {
        Some(bearing)
    } else {
        Some((bearing - 180.0).abs())
    }
}


#[cfg(test)]
pub fn assert_approx_eq(value_1: f64, value_2: f64, tolerance: f64) {
    let diff = (value_1 - value_2).abs();
    assert!(
        diff <= tolerance,
        "{} and {} differ by {}, more than {}",
        value_1,
        value_2,
        diff,
        tolerance);
}
