//! Emotion labels, classification results and the classifier adapter
//!
//! The face-expression classifier runs in the browser and reports one score per
//! expression. [`EmotionResult::from_expressions`] turns that raw output into the
//! validated arg-max result used everywhere else.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Tolerance for `allEmotions[emotion] == confidence`
const CONFIDENCE_EPSILON: f64 = 1e-6;

/// Maximum distance of the probability sum from 1.0
const DISTRIBUTION_SUM_TOLERANCE: f64 = 0.05;

/// The fixed set of emotion labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Sad,
    Angry,
    Surprised,
    Neutral,
    Fear,
    Disgust,
}

impl Emotion {
    /// All labels in canonical order (also the arg-max tie-break order)
    pub const ALL: [Emotion; 7] = [
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Surprised,
        Emotion::Neutral,
        Emotion::Fear,
        Emotion::Disgust,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Surprised => "surprised",
            Emotion::Neutral => "neutral",
            Emotion::Fear => "fear",
            Emotion::Disgust => "disgust",
        }
    }

    /// Map a classifier expression name onto a label
    ///
    /// The classifier reports `fearful` and `disgusted`; canonical names are
    /// accepted as well.
    pub fn from_classifier_label(label: &str) -> Option<Emotion> {
        match label.trim().to_ascii_lowercase().as_str() {
            "fearful" => Some(Emotion::Fear),
            "disgusted" => Some(Emotion::Disgust),
            other => other.parse().ok(),
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Emotion::ALL
            .iter()
            .copied()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| {
                Error::validation(format!(
                    "Invalid emotion '{}'. Must be one of: happy, sad, angry, surprised, neutral, fear, disgust",
                    s
                ))
            })
    }
}

/// One classification event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionResult {
    pub emotion: Emotion,
    pub confidence: f64,
    pub all_emotions: BTreeMap<Emotion, f64>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl EmotionResult {
    /// Build a result from raw classifier scores
    ///
    /// Every label must be present exactly once. The highest score wins; ties go
    /// to the label that comes first in [`Emotion::ALL`].
    pub fn from_expressions(
        scores: &HashMap<String, f64>,
        timestamp: DateTime<Utc>,
    ) -> Result<Self> {
        let mut all_emotions = BTreeMap::new();
        for (label, score) in scores {
            let emotion = Emotion::from_classifier_label(label)
                .ok_or_else(|| Error::validation(format!("Unknown expression '{}'", label)))?;
            if all_emotions.insert(emotion, *score).is_some() {
                return Err(Error::validation(format!(
                    "Expression '{}' reported more than once",
                    emotion
                )));
            }
        }

        let mut best: Option<(Emotion, f64)> = None;
        for emotion in Emotion::ALL {
            let score = *all_emotions
                .get(&emotion)
                .ok_or_else(|| Error::validation(format!("Missing expression '{}'", emotion)))?;
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((emotion, score)),
            }
        }

        let (emotion, confidence) = best.ok_or_else(|| Error::validation("No expressions"))?;
        let result = Self {
            emotion,
            confidence,
            all_emotions,
            timestamp,
        };
        result.validate()?;
        Ok(result)
    }

    /// Check range, completeness and arg-max consistency
    pub fn validate(&self) -> Result<()> {
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(Error::validation("Confidence must be between 0 and 1"));
        }

        let mut sum = 0.0;
        for emotion in Emotion::ALL {
            let p = self.all_emotions.get(&emotion).copied().ok_or_else(|| {
                Error::validation(format!("allEmotions is missing '{}'", emotion))
            })?;
            if !p.is_finite() || !(0.0..=1.0).contains(&p) {
                return Err(Error::validation(format!(
                    "allEmotions['{}'] must be between 0 and 1",
                    emotion
                )));
            }
            sum += p;
        }

        if (sum - 1.0).abs() > DISTRIBUTION_SUM_TOLERANCE {
            return Err(Error::validation(format!(
                "allEmotions must sum to 1 (got {:.3})",
                sum
            )));
        }

        let own = self.all_emotions[&self.emotion];
        if (own - self.confidence).abs() > CONFIDENCE_EPSILON {
            return Err(Error::validation(format!(
                "Confidence {} does not match allEmotions['{}'] = {}",
                self.confidence, self.emotion, own
            )));
        }

        if let Some((other, p)) = self
            .all_emotions
            .iter()
            .find(|(_, p)| **p > own + CONFIDENCE_EPSILON)
        {
            return Err(Error::validation(format!(
                "'{}' is not the most probable emotion ('{}' scores {})",
                self.emotion, other, p
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Distribution with `top` at `confidence` and the rest split evenly
    pub(crate) fn sample_result(top: Emotion, confidence: f64) -> EmotionResult {
        let rest = (1.0 - confidence) / 6.0;
        let all_emotions = Emotion::ALL
            .iter()
            .map(|e| (*e, if *e == top { confidence } else { rest }))
            .collect();
        EmotionResult {
            emotion: top,
            confidence,
            all_emotions,
            timestamp: Utc::now(),
        }
    }

    fn classifier_scores(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_emotion_parse_and_display() {
        for emotion in Emotion::ALL {
            assert_eq!(emotion.as_str().parse::<Emotion>().unwrap(), emotion);
        }
        let err = "invalid_emotion".parse::<Emotion>().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_classifier_label_aliases() {
        assert_eq!(Emotion::from_classifier_label("fearful"), Some(Emotion::Fear));
        assert_eq!(Emotion::from_classifier_label("Disgusted"), Some(Emotion::Disgust));
        assert_eq!(Emotion::from_classifier_label("happy"), Some(Emotion::Happy));
        assert_eq!(Emotion::from_classifier_label("bored"), None);
    }

    #[test]
    fn test_valid_result_passes() {
        let result = sample_result(Emotion::Happy, 0.82);
        assert!(result.validate().is_ok());
        assert_eq!(result.all_emotions[&result.emotion], result.confidence);
    }

    #[test]
    fn test_confidence_out_of_range_rejected() {
        let mut result = sample_result(Emotion::Sad, 0.7);
        result.confidence = 1.5;
        assert!(result.validate().unwrap_err().is_validation());

        result.confidence = -0.5;
        assert!(result.validate().unwrap_err().is_validation());
    }

    #[test]
    fn test_confidence_mismatch_rejected() {
        let mut result = sample_result(Emotion::Angry, 0.6);
        result.confidence = 0.55;
        assert!(result.validate().unwrap_err().is_validation());
    }

    #[test]
    fn test_non_argmax_label_rejected() {
        // Label points at a low-probability emotion whose value matches confidence
        let mut result = sample_result(Emotion::Happy, 0.7);
        result.emotion = Emotion::Sad;
        result.confidence = result.all_emotions[&Emotion::Sad];
        assert!(result.validate().unwrap_err().is_validation());
    }

    #[test]
    fn test_incomplete_distribution_rejected() {
        let mut result = sample_result(Emotion::Neutral, 0.4);
        result.all_emotions.remove(&Emotion::Disgust);
        let err = result.validate().unwrap_err();
        assert!(err.to_string().contains("disgust"));
    }

    #[test]
    fn test_distribution_must_sum_to_one() {
        let mut result = sample_result(Emotion::Neutral, 0.4);
        result.all_emotions.insert(Emotion::Fear, 0.35);
        assert!(result.validate().unwrap_err().is_validation());
    }

    #[test]
    fn test_from_expressions_picks_argmax() {
        let scores = classifier_scores(&[
            ("neutral", 0.05),
            ("happy", 0.02),
            ("sad", 0.03),
            ("angry", 0.01),
            ("fearful", 0.04),
            ("disgusted", 0.05),
            ("surprised", 0.80),
        ]);
        let result = EmotionResult::from_expressions(&scores, Utc::now()).unwrap();
        assert_eq!(result.emotion, Emotion::Surprised);
        assert_eq!(result.confidence, 0.80);
        assert_eq!(result.all_emotions.len(), 7);
    }

    #[test]
    fn test_from_expressions_tie_goes_to_canonical_order() {
        let scores = classifier_scores(&[
            ("neutral", 0.0),
            ("happy", 0.0),
            ("sad", 0.5),
            ("angry", 0.0),
            ("fearful", 0.0),
            ("disgusted", 0.0),
            ("surprised", 0.5),
        ]);
        let result = EmotionResult::from_expressions(&scores, Utc::now()).unwrap();
        assert_eq!(result.emotion, Emotion::Sad);
    }

    #[test]
    fn test_from_expressions_missing_label() {
        let scores = classifier_scores(&[("happy", 1.0)]);
        assert!(EmotionResult::from_expressions(&scores, Utc::now())
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn test_from_expressions_duplicate_alias() {
        let scores = classifier_scores(&[
            ("neutral", 0.1),
            ("happy", 0.5),
            ("sad", 0.1),
            ("angry", 0.1),
            ("fearful", 0.1),
            ("fear", 0.0),
            ("disgusted", 0.05),
            ("surprised", 0.05),
        ]);
        assert!(EmotionResult::from_expressions(&scores, Utc::now()).is_err());
    }

    #[test]
    fn test_json_shape_uses_camel_case_keys() {
        let result = sample_result(Emotion::Fear, 0.5);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["emotion"], "fear");
        assert!(json["allEmotions"]["disgust"].is_number());
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_unknown_label_in_distribution_fails_to_parse() {
        let json = serde_json::json!({
            "emotion": "happy",
            "confidence": 1.0,
            "allEmotions": {"happy": 1.0, "bored": 0.0}
        });
        assert!(serde_json::from_value::<EmotionResult>(json).is_err());
    }
}
