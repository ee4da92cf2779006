//! # Moodify Common Library
//!
//! Shared code for the Moodify server and its tests:
//! - Emotion labels, classification results and the classifier adapter
//! - Catalog track and recommendation types
//! - History entries and query filters
//! - Configuration loading
//! - Database bootstrap
//! - Credential hashing and shared API types

pub mod api;
pub mod config;
pub mod db;
pub mod emotion;
pub mod error;
pub mod history;
pub mod music;
pub mod time;
pub mod uuid_utils;

pub use emotion::{Emotion, EmotionResult};
pub use error::{Error, Result};
pub use history::{EntryType, HistoryData, HistoryEntry, HistoryFilters};
pub use music::{MusicRecommendation, Track};
