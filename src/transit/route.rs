use crate::error::Result;
use crate::types::{Checkpoint, GeoPoint};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Mean Earth radius in kilometres
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points (haversine)
pub fn haversine_km(from: &GeoPoint, to: &GeoPoint) -> f64 {
    let lat1 = from.lat().to_radians();
    let lat2 = to.lat().to_radians();
    let d_lat = (to.lat() - from.lat()).to_radians();
    let d_lng = (to.lng() - from.lng()).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    // rounding can push antipodal pairs just past 1.0
    let a = a.clamp(0.0, 1.0);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Sum of the great-circle distances between consecutive points.
/// Fewer than two points cover no distance.
pub fn compute_distance_km<'a, I>(points: I) -> f64
where
    I: IntoIterator<Item = &'a GeoPoint>,
{
    let mut points = points.into_iter();
    let Some(mut previous) = points.next() else {
        return 0.0;
    };

    let mut total = 0.0;
    for point in points {
        total += haversine_km(previous, point);
        previous = point;
    }
    total
}

/// Round a distance to the two decimals shown to users and persisted
pub fn round_km(distance_km: f64) -> f64 {
    (distance_km * 100.0).round() / 100.0
}

/// An ordered route under construction. `total_distance_km` is kept
/// unrounded so it can be re-aggregated without drift. Deserializing
/// recomputes it from the checkpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredRoute")]
pub struct TransitRoute {
    pub checkpoints: Vec<Checkpoint>,
    pub total_distance_km: f64,
}

#[derive(Deserialize)]
struct StoredRoute {
    #[serde(default)]
    checkpoints: Vec<Checkpoint>,
}

impl From<StoredRoute> for TransitRoute {
    fn from(stored: StoredRoute) -> Self {
        TransitRoute::from_checkpoints(stored.checkpoints)
    }
}

impl TransitRoute {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_checkpoints(checkpoints: Vec<Checkpoint>) -> Self {
        let total_distance_km = compute_distance_km(checkpoints.iter().map(|c| &c.point));
        Self {
            checkpoints,
            total_distance_km,
        }
    }

    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }

    pub fn departure(&self) -> Option<&Checkpoint> {
        self.checkpoints.first()
    }

    pub fn arrival(&self) -> Option<&Checkpoint> {
        if self.checkpoints.len() < 2 {
            return None;
        }
        self.checkpoints.last()
    }

    pub fn display_distance_km(&self) -> f64 {
        round_km(self.total_distance_km)
    }

    /// Distance as the fixed two-decimal string shown next to the map
    pub fn formatted_distance(&self) -> String {
        format!("{:.2}", self.total_distance_km)
    }

    /// Return a new route with one more checkpoint at the end
    pub fn with_checkpoint(&self, checkpoint: Checkpoint) -> Self {
        let mut checkpoints = self.checkpoints.clone();
        checkpoints.push(checkpoint);
        Self::from_checkpoints(checkpoints)
    }
}

/// Append a checkpoint to a route and recompute the full distance.
///
/// The input route is left untouched. Without a timestamp the checkpoint is
/// stamped with the current time. Coordinates are validated before they
/// reach the distance fold.
pub fn append_checkpoint(
    route: &TransitRoute,
    lat: f64,
    lng: f64,
    timestamp: Option<DateTime<Utc>>,
) -> Result<TransitRoute> {
    let checkpoint = Checkpoint::new(lat, lng, timestamp.unwrap_or_else(Utc::now))?;
    let updated = route.with_checkpoint(checkpoint);

    debug!(
        "Route now has {} checkpoints covering {:.2} km",
        updated.len(),
        updated.total_distance_km
    );
    Ok(updated)
}
