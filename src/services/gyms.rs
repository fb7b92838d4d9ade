// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gym catalog loading, nearby search and favourites.
//!
//! The catalog ships as a GeoJSON FeatureCollection of Point features; each
//! feature's properties hold the gym record and its geometry the location.

use geo::{Distance, Haversine, Point};
use geojson::GeoJson;
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::db::{Db, KeyedLocks};
use crate::error::AppError;
use crate::models::stats::round2;
use crate::models::{Coordinates, Gym};
use crate::services::modify_user;

/// Default search radius for the nearby lookup.
pub const DEFAULT_RADIUS_METERS: f64 = 5000.0;

/// Gyms parsed from a catalog file.
#[derive(Default, Clone)]
pub struct GymCatalog {
    gyms: Vec<Gym>,
}

impl GymCatalog {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let json_data =
            fs::read_to_string(path.as_ref()).map_err(|e| CatalogError::Io(e.to_string()))?;
        Self::load_from_json(&json_data)
    }

    pub fn load_from_json(json_data: &str) -> Result<Self, CatalogError> {
        let geojson: GeoJson = json_data
            .parse()
            .map_err(|e: geojson::Error| CatalogError::Parse(e.to_string()))?;

        let GeoJson::FeatureCollection(collection) = geojson else {
            return Err(CatalogError::Parse(
                "expected a FeatureCollection".to_string(),
            ));
        };

        let mut gyms = Vec::with_capacity(collection.features.len());
        for feature in collection.features {
            let properties = feature.properties.unwrap_or_default();
            let mut gym: Gym = serde_json::from_value(serde_json::Value::Object(properties))
                .map_err(|e| CatalogError::InvalidFeature(e.to_string()))?;

            if let Some(geometry) = feature.geometry {
                let point: Point<f64> = geometry
                    .value
                    .try_into()
                    .map_err(|_| CatalogError::UnsupportedGeometry(gym.gym_id.clone()))?;
                gym.coordinates = Some(Coordinates {
                    latitude: point.y(),
                    longitude: point.x(),
                });
            }
            gyms.push(gym);
        }

        tracing::info!(count = gyms.len(), "Loaded gym catalog");
        Ok(Self { gyms })
    }

    pub fn gyms(&self) -> &[Gym] {
        &self.gyms
    }

    /// Upsert every catalog gym into the store.
    pub async fn seed(&self, db: &Db) -> Result<usize, AppError> {
        for gym in &self.gyms {
            db.upsert_gym(gym).await?;
        }
        Ok(self.gyms.len())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read file: {0}")]
    Io(String),

    #[error("Failed to parse GeoJSON: {0}")]
    Parse(String),

    #[error("Invalid gym properties: {0}")]
    InvalidFeature(String),

    #[error("Gym {0} has unsupported geometry (expected Point)")]
    UnsupportedGeometry(String),
}

/// A gym with its distance from the search origin.
#[derive(Debug, Clone, Serialize)]
pub struct NearbyGym {
    #[serde(flatten)]
    pub gym: Gym,
    pub distance_km: f64,
}

/// Gyms within `radius_meters` of `origin`, nearest first.
///
/// Gyms without coordinates are never returned.
pub fn nearby(
    gyms: &[Gym],
    origin: Coordinates,
    radius_meters: f64,
) -> Result<Vec<NearbyGym>, AppError> {
    if !origin.is_valid() {
        return Err(AppError::BadRequest(
            "Invalid latitude or longitude values".to_string(),
        ));
    }
    if !radius_meters.is_finite() || radius_meters <= 0.0 {
        return Err(AppError::BadRequest(
            "radius_meters must be positive".to_string(),
        ));
    }

    let here = Point::new(origin.longitude, origin.latitude);
    let mut found: Vec<(f64, &Gym)> = gyms
        .iter()
        .filter_map(|gym| {
            let at = gym.coordinates?;
            let meters = Haversine.distance(here, Point::new(at.longitude, at.latitude));
            (meters <= radius_meters).then_some((meters, gym))
        })
        .collect();
    found.sort_by(|a, b| a.0.total_cmp(&b.0));

    Ok(found
        .into_iter()
        .map(|(meters, gym)| NearbyGym {
            gym: gym.clone(),
            distance_km: round2(meters / 1000.0),
        })
        .collect())
}

#[derive(Clone)]
pub struct GymService {
    db: Db,
    locks: KeyedLocks,
}

impl GymService {
    pub fn new(db: Db, locks: KeyedLocks) -> Self {
        Self { db, locks }
    }

    pub async fn list(&self) -> Result<Vec<Gym>, AppError> {
        self.db.list_gyms().await
    }

    pub async fn around(
        &self,
        origin: Coordinates,
        radius_meters: f64,
    ) -> Result<Vec<NearbyGym>, AppError> {
        let gyms = self.db.list_gyms().await?;
        nearby(&gyms, origin, radius_meters)
    }

    /// Add a favourite gym. The gym must exist; re-adding is a no-op.
    pub async fn add_favourite(&self, user_id: &str, gym_id: &str) -> Result<Vec<String>, AppError> {
        if self.db.get_gym(gym_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Gym {}", gym_id)));
        }

        let user = modify_user(&self.db, &self.locks, user_id, |user| {
            if !user.favourites.iter().any(|id| id == gym_id) {
                user.favourites.push(gym_id.to_string());
            }
            Ok(())
        })
        .await?;
        tracing::debug!(user_id, gym_id, "Added favourite gym");
        Ok(user.favourites)
    }

    pub async fn remove_favourite(
        &self,
        user_id: &str,
        gym_id: &str,
    ) -> Result<Vec<String>, AppError> {
        let user = modify_user(&self.db, &self.locks, user_id, |user| {
            user.favourites.retain(|id| id != gym_id);
            Ok(())
        })
        .await?;
        tracing::debug!(user_id, gym_id, "Removed favourite gym");
        Ok(user.favourites)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;

    const CATALOG: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [46.6753, 24.7136] },
                "properties": {
                    "gym_id": "gym-1",
                    "name": "Fitness First",
                    "location": "Olaya St",
                    "genders_accepted": ["male", "female"],
                    "subscriptions": [{ "name": "Monthly", "length": "1 month", "price": 300.0 }],
                    "services": ["pool"]
                }
            },
            {
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [46.7000, 24.7136] },
                "properties": { "gym_id": "gym-2", "name": "Strength Hub", "location": "East" }
            },
            {
                "type": "Feature",
                "geometry": null,
                "properties": { "gym_id": "gym-3", "name": "Nowhere Gym", "location": "?" }
            }
        ]
    }"#;

    fn origin() -> Coordinates {
        Coordinates {
            latitude: 24.7136,
            longitude: 46.6753,
        }
    }

    #[test]
    fn test_load_catalog() {
        let catalog = GymCatalog::load_from_json(CATALOG).unwrap();
        let gyms = catalog.gyms();
        assert_eq!(gyms.len(), 3);
        assert_eq!(gyms[0].subscriptions[0].price, 300.0);
        assert_eq!(
            gyms[0].coordinates,
            Some(Coordinates {
                latitude: 24.7136,
                longitude: 46.6753
            })
        );
        assert_eq!(gyms[2].coordinates, None);
    }

    #[test]
    fn test_load_rejects_polygon() {
        let json = r#"{"type":"FeatureCollection","features":[{"type":"Feature",
            "geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]},
            "properties":{"gym_id":"g","name":"n","location":"l"}}]}"#;
        assert!(matches!(
            GymCatalog::load_from_json(json),
            Err(CatalogError::UnsupportedGeometry(_))
        ));
    }

    #[test]
    fn test_nearby_sorted_and_filtered() {
        let catalog = GymCatalog::load_from_json(CATALOG).unwrap();

        let close = nearby(catalog.gyms(), origin(), 1000.0).unwrap();
        assert_eq!(close.len(), 1);
        assert_eq!(close[0].gym.gym_id, "gym-1");
        assert_eq!(close[0].distance_km, 0.0);

        // gym-2 is about 2.5 km east.
        let wider = nearby(catalog.gyms(), origin(), 5000.0).unwrap();
        let ids: Vec<_> = wider.iter().map(|g| g.gym.gym_id.as_str()).collect();
        assert_eq!(ids, vec!["gym-1", "gym-2"]);
        assert!(wider[1].distance_km > 2.0 && wider[1].distance_km < 3.0);
    }

    #[test]
    fn test_nearby_validates_input() {
        let bad = Coordinates {
            latitude: 91.0,
            longitude: 0.0,
        };
        assert!(matches!(nearby(&[], bad, 100.0), Err(AppError::BadRequest(_))));
        assert!(matches!(nearby(&[], origin(), 0.0), Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_favourites() {
        let db = Db::new_in_memory();
        GymCatalog::load_from_json(CATALOG).unwrap().seed(&db).await.unwrap();
        let user = User::new("Ana", "ana@example.com", "hash".to_string());
        db.upsert_user(&user).await.unwrap();
        let service = GymService::new(db, KeyedLocks::new());

        let favs = service.add_favourite(&user.user_id, "gym-1").await.unwrap();
        assert_eq!(favs, vec!["gym-1"]);
        let favs = service.add_favourite(&user.user_id, "gym-1").await.unwrap();
        assert_eq!(favs, vec!["gym-1"]);

        let err = service.add_favourite(&user.user_id, "gym-404").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let favs = service.remove_favourite(&user.user_id, "gym-1").await.unwrap();
        assert!(favs.is_empty());
    }
}
