//! Normalized catalog tracks and recommendation events

use crate::emotion::Emotion;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A catalog item in the shape the UI and history store consume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artist: String,
    pub album: String,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Not every track has a playable preview
    #[serde(default)]
    pub preview_url: Option<String>,
    pub spotify_url: String,
    #[serde(default)]
    pub popularity: Option<u8>,
    /// Duration in milliseconds
    pub duration: u64,
}

/// An emotion-triggered recommendation event
///
/// `tracks` is empty in degraded (fallback) mode but is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicRecommendation {
    pub emotion: Emotion,
    pub tracks: Vec<Track>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_track(id: &str) -> Track {
        Track {
            id: id.to_string(),
            name: format!("Song {}", id),
            artist: "Test Artist".to_string(),
            album: "Test Album".to_string(),
            image_url: None,
            preview_url: None,
            spotify_url: format!("https://open.spotify.com/track/{}", id),
            popularity: Some(50),
            duration: 210_000,
        }
    }

    #[test]
    fn test_recommendation_without_tracks_key_is_rejected() {
        let json = serde_json::json!({ "emotion": "sad" });
        assert!(serde_json::from_value::<MusicRecommendation>(json).is_err());
    }

    #[test]
    fn test_null_tracks_rejected() {
        let json = serde_json::json!({ "emotion": "sad", "tracks": null });
        assert!(serde_json::from_value::<MusicRecommendation>(json).is_err());
    }

    #[test]
    fn test_empty_tracks_accepted() {
        let json = serde_json::json!({ "emotion": "sad", "tracks": [] });
        let rec: MusicRecommendation = serde_json::from_value(json).unwrap();
        assert!(rec.tracks.is_empty());
    }

    #[test]
    fn test_track_optional_fields_default() {
        let json = serde_json::json!({
            "id": "abc",
            "name": "No Preview",
            "artist": "Someone",
            "album": "Something",
            "spotifyUrl": "https://open.spotify.com/track/abc",
            "duration": 1000
        });
        let track: Track = serde_json::from_value(json).unwrap();
        assert!(track.preview_url.is_none());
        assert!(track.popularity.is_none());
    }
}
