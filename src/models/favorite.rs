use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use super::MediaSnapshot;

/// Opaque account reference issued by the auth provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata provider identifier of a catalog item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovieId(pub u64);

impl Display for MovieId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A row of the `favorites` relation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteRecord {
    /// Row id assigned by the store; absent in some projections
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub movie_data: MediaSnapshot,
    pub created_at: DateTime<Utc>,
}

/// Insert payload; `created_at` is set by the store
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewFavorite {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub movie_data: MediaSnapshot,
}

/// Local view of one id for the current identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Membership {
    /// No load has completed for the current identity
    Unknown,
    NotSaved,
    Saved,
}

impl Membership {
    pub fn is_saved(&self) -> bool {
        matches!(self, Membership::Saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_deserializes_postgrest_row() {
        let json = r#"{
            "id": 12,
            "user_id": "5f0c1d7e-0000-4000-8000-000000000001",
            "movie_id": 42,
            "movie_data": {"id": 42, "title": "The Answer", "poster_path": "/a.jpg"},
            "created_at": "2024-03-01T10:15:30.123456+00:00"
        }"#;

        let record: FavoriteRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, Some(12));
        assert_eq!(record.movie_id, MovieId(42));
        assert_eq!(record.user_id.as_str(), "5f0c1d7e-0000-4000-8000-000000000001");
        assert_eq!(record.movie_data.display_title(), "The Answer");
    }

    #[test]
    fn test_new_favorite_serializes_relation_columns() {
        let payload = NewFavorite {
            user_id: UserId::new("u1"),
            movie_id: MovieId(7),
            movie_data: MediaSnapshot {
                id: MovieId(7),
                title: Some("Se7en".to_string()),
                name: None,
                poster_path: Some("/7.jpg".to_string()),
                backdrop_path: None,
                media_type: None,
                first_air_date: None,
                release_date: None,
                overview: None,
            },
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["user_id"], "u1");
        assert_eq!(value["movie_id"], 7);
        assert_eq!(value["movie_data"]["title"], "Se7en");
        assert!(value.get("created_at").is_none());
    }

    #[test]
    fn test_unknown_membership_reads_as_not_saved() {
        assert!(!Membership::Unknown.is_saved());
        assert!(!Membership::NotSaved.is_saved());
        assert!(Membership::Saved.is_saved());
    }
}
