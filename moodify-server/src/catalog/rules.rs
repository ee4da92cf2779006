//! Static emotion → audio-feature and genre-seed table

use moodify_common::Emotion;

/// Maximum number of genre seeds the catalog accepts per query
pub const MAX_SEED_GENRES: usize = 5;

/// Inclusive range of an audio feature in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureRange {
    pub min: f64,
    pub max: f64,
}

impl FeatureRange {
    const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Midpoint of the range
    pub fn target(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

/// Catalog query shape for one emotion
#[derive(Debug, Clone, Copy)]
pub struct MoodProfile {
    pub valence: FeatureRange,
    pub energy: FeatureRange,
    pub danceability: FeatureRange,
    pub genres: &'static [&'static str],
}

const HAPPY: MoodProfile = MoodProfile {
    valence: FeatureRange::new(0.6, 1.0),
    energy: FeatureRange::new(0.6, 1.0),
    danceability: FeatureRange::new(0.6, 1.0),
    genres: &["pop", "dance", "happy", "funk", "disco"],
};

const SAD: MoodProfile = MoodProfile {
    valence: FeatureRange::new(0.0, 0.4),
    energy: FeatureRange::new(0.0, 0.4),
    danceability: FeatureRange::new(0.0, 0.5),
    genres: &["sad", "acoustic", "indie", "piano", "singer-songwriter"],
};

const ANGRY: MoodProfile = MoodProfile {
    valence: FeatureRange::new(0.0, 0.4),
    energy: FeatureRange::new(0.7, 1.0),
    danceability: FeatureRange::new(0.3, 0.7),
    genres: &["metal", "rock", "punk", "hard-rock", "grunge"],
};

const SURPRISED: MoodProfile = MoodProfile {
    valence: FeatureRange::new(0.5, 0.9),
    energy: FeatureRange::new(0.6, 1.0),
    danceability: FeatureRange::new(0.5, 0.9),
    genres: &["electronic", "edm", "party", "house", "dance"],
};

const NEUTRAL: MoodProfile = MoodProfile {
    valence: FeatureRange::new(0.4, 0.7),
    energy: FeatureRange::new(0.3, 0.6),
    danceability: FeatureRange::new(0.4, 0.7),
    genres: &["chill", "ambient", "jazz", "indie-pop", "study"],
};

const FEAR: MoodProfile = MoodProfile {
    valence: FeatureRange::new(0.0, 0.4),
    energy: FeatureRange::new(0.2, 0.6),
    danceability: FeatureRange::new(0.1, 0.5),
    genres: &["ambient", "classical", "new-age", "piano", "sleep"],
};

const DISGUST: MoodProfile = MoodProfile {
    valence: FeatureRange::new(0.2, 0.5),
    energy: FeatureRange::new(0.4, 0.8),
    danceability: FeatureRange::new(0.3, 0.6),
    genres: &["alternative", "grunge", "industrial", "punk-rock", "emo"],
};

/// Look up the profile for an emotion
pub fn profile_for(emotion: Emotion) -> &'static MoodProfile {
    match emotion {
        Emotion::Happy => &HAPPY,
        Emotion::Sad => &SAD,
        Emotion::Angry => &ANGRY,
        Emotion::Surprised => &SURPRISED,
        Emotion::Neutral => &NEUTRAL,
        Emotion::Fear => &FEAR,
        Emotion::Disgust => &DISGUST,
    }
}

/// Genre seeds: user preferences first, then the emotion's defaults
///
/// Blank and repeated genres are skipped; at most [`MAX_SEED_GENRES`] are kept.
pub fn seed_genres(emotion: Emotion, preferred: &[String]) -> Vec<String> {
    let mut seeds: Vec<String> = Vec::with_capacity(MAX_SEED_GENRES);
    let candidates = preferred
        .iter()
        .map(|g| g.trim().to_lowercase())
        .chain(profile_for(emotion).genres.iter().map(|g| g.to_string()));

    for genre in candidates {
        if seeds.len() == MAX_SEED_GENRES {
            break;
        }
        if !genre.is_empty() && !seeds.contains(&genre) {
            seeds.push(genre);
        }
    }
    seeds
}

/// Query-string parameters for the catalog recommendations endpoint
pub fn recommendation_params(
    emotion: Emotion,
    limit: u32,
    preferred_genres: &[String],
) -> Vec<(String, String)> {
    let profile = profile_for(emotion);
    let mut params = vec![
        ("seed_genres".to_string(), seed_genres(emotion, preferred_genres).join(",")),
        ("limit".to_string(), limit.to_string()),
    ];

    for (name, range) in [
        ("valence", profile.valence),
        ("energy", profile.energy),
        ("danceability", profile.danceability),
    ] {
        params.push((format!("min_{}", name), format_feature(range.min)));
        params.push((format!("max_{}", name), format_feature(range.max)));
        params.push((format!("target_{}", name), format_feature(range.target())));
    }

    params
}

fn format_feature(value: f64) -> String {
    format!("{:.2}", value)
}
