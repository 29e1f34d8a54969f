use serde::{Deserialize, Serialize};

/// WGS84 coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

const EARTH_RADIUS_M: f64 = 6_371_000.0;

impl Coordinates {
    /// Haversine great-circle distance to `other`, in meters.
    #[must_use]
    pub fn distance_m(&self, other: &Coordinates) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.lat.to_radians().cos() * other.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
    }
}

/// One physical store branch near the user. Supplied by the store graph
/// collaborator; read-only to the decision core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreLocation {
    /// Store graph identifier, e.g. `"netto-2104"`.
    pub id: String,
    /// Branch display name, e.g. `"Netto Østerbrogade"`.
    pub name: String,
    /// Chain banner, e.g. `"Netto"`.
    pub chain: String,
    #[serde(default)]
    pub address: Option<String>,
    pub coordinates: Coordinates,
    /// Distance from the user's location in meters, computed by the caller.
    pub distance_from_user_m: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_self_is_zero() {
        let p = Coordinates { lat: 55.676, lng: 12.568 };
        assert!(p.distance_m(&p) < 1e-6);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Coordinates { lat: 55.676, lng: 12.568 };
        let b = Coordinates { lat: 55.699, lng: 12.552 };
        let ab = a.distance_m(&b);
        let ba = b.distance_m(&a);
        assert!((ab - ba).abs() < 1e-6);
    }

    #[test]
    fn copenhagen_to_aarhus_is_roughly_157km() {
        // København H to Aarhus H, straight line.
        let cph = Coordinates { lat: 55.6728, lng: 12.5664 };
        let aar = Coordinates { lat: 56.1501, lng: 10.2045 };
        let d = cph.distance_m(&aar);
        assert!(
            (150_000.0..165_000.0).contains(&d),
            "expected ~157km, got {d}"
        );
    }
}
