//! History log entries and query filters

use crate::emotion::{Emotion, EmotionResult};
use crate::music::MusicRecommendation;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Default number of entries per history page
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Upper bound on entries per history page
pub const MAX_PAGE_SIZE: u32 = 100;

/// Discriminator stored alongside every entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Emotion,
    Recommendation,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Emotion => "emotion",
            EntryType::Recommendation => "recommendation",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "emotion" => Ok(EntryType::Emotion),
            "recommendation" => Ok(EntryType::Recommendation),
            other => Err(Error::validation(format!(
                "Invalid type '{}'. Must be 'emotion' or 'recommendation'",
                other
            ))),
        }
    }
}

/// Payload of a history entry
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryData {
    Emotion(EmotionResult),
    Recommendation(MusicRecommendation),
}

impl HistoryData {
    /// Parse an untyped payload according to its declared type
    pub fn from_parts(entry_type: &str, data: Value) -> Result<Self> {
        let entry_type: EntryType = entry_type.parse()?;
        Self::from_typed_parts(entry_type, data)
    }

    fn from_typed_parts(entry_type: EntryType, data: Value) -> Result<Self> {
        let parsed = match entry_type {
            EntryType::Emotion => serde_json::from_value(data)
                .map(HistoryData::Emotion)
                .map_err(|e| Error::validation(format!("Invalid emotion data: {}", e)))?,
            EntryType::Recommendation => serde_json::from_value(data)
                .map(HistoryData::Recommendation)
                .map_err(|e| Error::validation(format!("Invalid recommendation data: {}", e)))?,
        };
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn entry_type(&self) -> EntryType {
        match self {
            HistoryData::Emotion(_) => EntryType::Emotion,
            HistoryData::Recommendation(_) => EntryType::Recommendation,
        }
    }

    /// The emotion this entry is about (nested for recommendations)
    pub fn emotion(&self) -> Emotion {
        match self {
            HistoryData::Emotion(result) => result.emotion,
            HistoryData::Recommendation(rec) => rec.emotion,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            HistoryData::Emotion(result) => result.validate(),
            // tracks is typed as a sequence; an empty one is legitimate
            HistoryData::Recommendation(_) => Ok(()),
        }
    }
}

/// One immutable, timestamped record in the history log
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawHistoryEntry")]
pub struct HistoryEntry {
    pub id: String,
    pub data: HistoryData,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn entry_type(&self) -> EntryType {
        self.data.entry_type()
    }

    pub fn emotion(&self) -> Emotion {
        self.data.emotion()
    }
}

/// Wire envelope: `{id, type, data, timestamp}`
#[derive(Deserialize)]
struct RawHistoryEntry {
    id: String,
    #[serde(rename = "type")]
    entry_type: EntryType,
    data: Value,
    timestamp: DateTime<Utc>,
}

impl TryFrom<RawHistoryEntry> for HistoryEntry {
    type Error = Error;

    fn try_from(raw: RawHistoryEntry) -> Result<Self> {
        Ok(Self {
            data: HistoryData::from_typed_parts(raw.entry_type, raw.data)?,
            id: raw.id,
            timestamp: raw.timestamp,
        })
    }
}

impl Serialize for HistoryEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Envelope<'a, T: Serialize> {
            id: &'a str,
            #[serde(rename = "type")]
            entry_type: EntryType,
            data: &'a T,
            timestamp: &'a DateTime<Utc>,
        }

        match &self.data {
            HistoryData::Emotion(result) => Envelope {
                id: &self.id,
                entry_type: EntryType::Emotion,
                data: result,
                timestamp: &self.timestamp,
            }
            .serialize(serializer),
            HistoryData::Recommendation(rec) => Envelope {
                id: &self.id,
                entry_type: EntryType::Recommendation,
                data: rec,
                timestamp: &self.timestamp,
            }
            .serialize(serializer),
        }
    }
}

/// Query descriptor for reading the history log
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryFilters {
    pub entry_type: Option<EntryType>,
    pub emotion: Option<Emotion>,
    /// Inclusive lower bound on entry timestamp
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound on entry timestamp
    pub end_date: Option<DateTime<Utc>>,
    pub limit: u32,
    /// 1-indexed
    pub page: u32,
}

impl Default for HistoryFilters {
    fn default() -> Self {
        Self {
            entry_type: None,
            emotion: None,
            start_date: None,
            end_date: None,
            limit: DEFAULT_PAGE_SIZE,
            page: 1,
        }
    }
}

impl HistoryFilters {
    pub fn matches(&self, entry: &HistoryEntry) -> bool {
        if let Some(entry_type) = self.entry_type {
            if entry.entry_type() != entry_type {
                return false;
            }
        }
        if let Some(emotion) = self.emotion {
            if entry.emotion() != emotion {
                return false;
            }
        }
        if let Some(start) = self.start_date {
            if entry.timestamp < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if entry.timestamp > end {
                return false;
            }
        }
        true
    }
}
