//! Analytics aggregation over emotion history
//!
//! Folds emotion entries inside a trailing window into per-day and per-week
//! buckets plus an overall label distribution.
//!
//! Primary emotion of a bucket: highest count; on a tie, the label that was
//! first encountered while walking the window in insertion order.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use moodify_common::{Emotion, HistoryData, HistoryEntry};
use serde::Serialize;
use std::collections::BTreeMap;

/// Window size used when the caller does not supply one
pub const DEFAULT_DAYS_BACK: i64 = 30;

/// Largest window accepted from callers (about a century)
pub const MAX_DAYS_BACK: i64 = 36_500;

/// One calendar-day bucket
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTrend {
    /// `YYYY-MM-DD` (UTC)
    pub date: String,
    pub count: u64,
    pub primary_emotion: Emotion,
    pub emotions: BTreeMap<Emotion, u64>,
}

/// One ISO-week bucket
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyData {
    /// Monday of the week, `YYYY-MM-DD` (UTC)
    pub week_start: String,
    pub count: u64,
    pub primary_emotion: Emotion,
    pub emotions: BTreeMap<Emotion, u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsData {
    pub daily_trends: Vec<DailyTrend>,
    pub emotion_distribution: BTreeMap<Emotion, u64>,
    pub weekly_data: Vec<WeeklyData>,
}

/// Per-bucket counts that remember first-seen order
#[derive(Debug, Default)]
struct Tally {
    first_seen: Vec<Emotion>,
    counts: BTreeMap<Emotion, u64>,
    total: u64,
}

impl Tally {
    fn add(&mut self, emotion: Emotion) {
        let count = self.counts.entry(emotion).or_insert(0);
        if *count == 0 {
            self.first_seen.push(emotion);
        }
        *count += 1;
        self.total += 1;
    }

    fn primary(&self) -> Option<Emotion> {
        let mut best: Option<(Emotion, u64)> = None;
        for emotion in &self.first_seen {
            let count = self.counts[emotion];
            match best {
                Some((_, top)) if count <= top => {}
                _ => best = Some((*emotion, count)),
            }
        }
        best.map(|(emotion, _)| emotion)
    }
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Aggregate emotion entries with `now - days_back days <= timestamp <= now`
///
/// `days_back <= 0` is an empty window.
pub fn get_analytics_data(
    entries: &[HistoryEntry],
    days_back: i64,
    now: DateTime<Utc>,
) -> AnalyticsData {
    if days_back <= 0 {
        return AnalyticsData::default();
    }

    // A window reaching past the representable range has no lower bound
    let window_start = Duration::try_days(days_back)
        .and_then(|span| now.checked_sub_signed(span))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let mut distribution: BTreeMap<Emotion, u64> = BTreeMap::new();
    let mut days: BTreeMap<NaiveDate, Tally> = BTreeMap::new();
    let mut weeks: BTreeMap<NaiveDate, Tally> = BTreeMap::new();

    for entry in entries {
        let HistoryData::Emotion(result) = &entry.data else {
            continue;
        };
        if entry.timestamp < window_start || entry.timestamp > now {
            continue;
        }

        let day = entry.timestamp.date_naive();
        *distribution.entry(result.emotion).or_insert(0) += 1;
        days.entry(day).or_default().add(result.emotion);
        weeks.entry(week_start(day)).or_default().add(result.emotion);
    }

    let daily_trends = days
        .into_iter()
        .filter_map(|(date, tally)| {
            Some(DailyTrend {
                date: date.format("%Y-%m-%d").to_string(),
                count: tally.total,
                primary_emotion: tally.primary()?,
                emotions: tally.counts,
            })
        })
        .collect();

    let weekly_data = weeks
        .into_iter()
        .filter_map(|(monday, tally)| {
            Some(WeeklyData {
                week_start: monday.format("%Y-%m-%d").to_string(),
                count: tally.total,
                primary_emotion: tally.primary()?,
                emotions: tally.counts,
            })
        })
        .collect();

    AnalyticsData {
        daily_trends,
        emotion_distribution: distribution,
        weekly_data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use moodify_common::{EmotionResult, MusicRecommendation};

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn emotion_entry(emotion: Emotion, timestamp: DateTime<Utc>) -> HistoryEntry {
        let all_emotions = Emotion::ALL
            .iter()
            .map(|e| (*e, if *e == emotion { 0.4 } else { 0.1 }))
            .collect();
        HistoryEntry {
            id: format!("{}-{}", emotion, timestamp.timestamp()),
            data: HistoryData::Emotion(EmotionResult {
                emotion,
                confidence: 0.4,
                all_emotions,
                timestamp,
            }),
            timestamp,
        }
    }

    #[test]
    fn test_zero_days_back_is_empty_even_with_todays_entries() {
        let now = at(2025, 3, 5, 12);
        let entries = vec![emotion_entry(Emotion::Happy, now - Duration::hours(1))];

        let data = get_analytics_data(&entries, 0, now);
        assert!(data.daily_trends.is_empty());
        assert!(data.weekly_data.is_empty());
        assert!(data.emotion_distribution.is_empty());
    }

    #[test]
    fn test_huge_window_has_no_lower_bound() {
        let now = at(2025, 3, 5, 12);
        let entries = vec![
            emotion_entry(Emotion::Sad, at(1990, 1, 1, 0)),
            emotion_entry(Emotion::Happy, now - Duration::hours(1)),
        ];

        let data = get_analytics_data(&entries, i64::MAX, now);
        assert_eq!(data.emotion_distribution.values().sum::<u64>(), 2);
        assert_eq!(data.daily_trends.len(), 2);
    }

    #[test]
    fn test_window_excludes_old_and_recommendation_entries() {
        let now = at(2025, 3, 5, 12);
        let rec = HistoryEntry {
            id: "rec".to_string(),
            data: HistoryData::Recommendation(MusicRecommendation {
                emotion: Emotion::Sad,
                tracks: vec![],
                timestamp: now,
            }),
            timestamp: now,
        };
        let entries = vec![
            emotion_entry(Emotion::Angry, at(2025, 2, 1, 12)),
            emotion_entry(Emotion::Happy, at(2025, 3, 4, 9)),
            rec,
        ];

        let data = get_analytics_data(&entries, 7, now);
        assert_eq!(data.emotion_distribution.len(), 1);
        assert_eq!(data.emotion_distribution[&Emotion::Happy], 1);
        assert_eq!(data.daily_trends.len(), 1);
        assert_eq!(data.daily_trends[0].date, "2025-03-04");
    }

    #[test]
    fn test_daily_buckets_and_tie_break() {
        let now = at(2025, 3, 5, 23);
        let entries = vec![
            emotion_entry(Emotion::Sad, at(2025, 3, 5, 8)),
            emotion_entry(Emotion::Happy, at(2025, 3, 5, 9)),
            emotion_entry(Emotion::Happy, at(2025, 3, 5, 10)),
            emotion_entry(Emotion::Sad, at(2025, 3, 5, 11)),
            emotion_entry(Emotion::Neutral, at(2025, 3, 3, 11)),
        ];

        let data = get_analytics_data(&entries, 30, now);
        assert_eq!(data.daily_trends.len(), 2);

        // Ascending by date
        assert_eq!(data.daily_trends[0].date, "2025-03-03");
        let today = &data.daily_trends[1];
        assert_eq!(today.count, 4);
        // Sad and Happy tie at 2; Sad was seen first
        assert_eq!(today.primary_emotion, Emotion::Sad);
        assert_eq!(today.emotions[&Emotion::Happy], 2);
    }

    #[test]
    fn test_weekly_buckets_start_on_monday() {
        // 2025-03-03 is a Monday; 2025-03-09 the following Sunday
        let now = at(2025, 3, 12, 12);
        let entries = vec![
            emotion_entry(Emotion::Fear, at(2025, 3, 2, 12)),
            emotion_entry(Emotion::Disgust, at(2025, 3, 3, 12)),
            emotion_entry(Emotion::Disgust, at(2025, 3, 9, 12)),
            emotion_entry(Emotion::Surprised, at(2025, 3, 10, 12)),
        ];

        let data = get_analytics_data(&entries, 30, now);
        let starts: Vec<&str> = data.weekly_data.iter().map(|w| w.week_start.as_str()).collect();
        assert_eq!(starts, vec!["2025-02-24", "2025-03-03", "2025-03-10"]);
        assert_eq!(data.weekly_data[1].count, 2);
        assert_eq!(data.weekly_data[1].primary_emotion, Emotion::Disgust);
    }

    #[test]
    fn test_serialized_shape() {
        let now = at(2025, 3, 5, 12);
        let entries = vec![emotion_entry(Emotion::Happy, now)];
        let json = serde_json::to_value(get_analytics_data(&entries, 1, now)).unwrap();
        assert_eq!(json["emotionDistribution"]["happy"], 1);
        assert_eq!(json["dailyTrends"][0]["primaryEmotion"], "happy");
        assert_eq!(json["weeklyData"][0]["weekStart"], "2025-03-03");
    }
}
