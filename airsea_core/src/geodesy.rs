//! Great-circle distance on a spherical Earth.

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance in meters between two WGS84 points given in degrees.
///
/// Inputs are not range-checked.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    haversine_distance_with_radius(lat1, lon1, lat2, lon2, EARTH_RADIUS_M)
}

/// Haversine distance on a sphere of the given radius (same unit as the result).
pub fn haversine_distance_with_radius(
    lat1: f64,
    lon1: f64,
    lat2: f64,
    lon2: f64,
    radius: f64,
) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();
    
    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    
    radius * c
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    
    #[test]
    fn test_identical_points() {
        assert_eq!(haversine_distance(-6.2, 106.8, -6.2, 106.8), 0.0);
    }
    
    #[test]
    fn test_one_ten_thousandth_degree_latitude() {
        // 0.0001° of arc on a 6371 km sphere
        let d = haversine_distance(0.0, 0.0, 0.0001, 0.0);
        assert_relative_eq!(d, 11.119_492_664, epsilon = 1e-6);
    }
    
    #[test]
    fn test_symmetric() {
        let ab = haversine_distance(-6.2000, 106.8000, -6.2010, 106.8012);
        let ba = haversine_distance(-6.2010, 106.8012, -6.2000, 106.8000);
        assert_relative_eq!(ab, ba, epsilon = 1e-9);
    }
    
    #[test]
    fn test_jakarta_short_hops() {
        // ~1.1 m and ~111 m north-south hops
        let tiny = haversine_distance(-6.2000, 106.8000, -6.20001, 106.8000);
        assert_relative_eq!(tiny, 1.112, epsilon = 1e-3);
        
        let hop = haversine_distance(-6.2000, 106.8000, -6.2010, 106.8000);
        assert_relative_eq!(hop, 111.195, epsilon = 1e-3);
    }
    
    #[test]
    fn test_antipodal() {
        let d = haversine_distance(0.0, 0.0, 0.0, 180.0);
        assert_relative_eq!(d, std::f64::consts::PI * EARTH_RADIUS_M, epsilon = 1e-3);
    }
    
    #[test]
    fn test_custom_radius_scales_linearly() {
        let unit = haversine_distance_with_radius(10.0, 20.0, 11.0, 21.0, 1.0);
        let earth = haversine_distance(10.0, 20.0, 11.0, 21.0);
        assert_relative_eq!(unit * EARTH_RADIUS_M, earth, max_relative = 1e-12);
    }
}
