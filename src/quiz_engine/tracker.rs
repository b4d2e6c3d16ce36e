//! Per-user performance log and the familiarity signals derived from it.
//!
//! `history` is the only authoritative state. The per-category and
//! per-difficulty aggregates are caches rebuilt from it whenever a tracker is
//! loaded, so a persisted blob only ever carries the history.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::quiz_engine::{error::EngineError, models::DifficultyLevel};

/// Attempts after which a category counts as fully explored.
const EXPOSURE_SATURATION: f64 = 10.0;
const SUCCESS_WEIGHT: f64 = 0.7;
const EXPOSURE_WEIGHT: f64 = 0.3;
/// Neutral value for windows with no history.
const NEUTRAL: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceEntry {
    pub question_id: String,
    pub category: String,
    pub difficulty_score: f64,
    pub is_correct: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregate {
    pub attempts: u32,
    pub correct: u32,
}

impl Aggregate {
    fn record(&mut self, is_correct: bool) {
        self.attempts += 1;
        if is_correct {
            self.correct += 1;
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            f64::from(self.correct) / f64::from(self.attempts)
        }
    }
}

#[derive(Serialize, Deserialize)]
struct PerformanceBlob {
    user_id: String,
    history: Vec<PerformanceEntry>,
}

#[derive(Debug, Clone)]
pub struct UserPerformanceTracker {
    user_id: String,
    history: Vec<PerformanceEntry>,
    by_category: HashMap<String, Aggregate>,
    by_difficulty: BTreeMap<DifficultyLevel, Aggregate>,
}

impl UserPerformanceTracker {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self::from_history(user_id, Vec::new())
    }

    /// Rebuild a tracker, recomputing every aggregate from `history`.
    pub fn from_history(user_id: impl Into<String>, history: Vec<PerformanceEntry>) -> Self {
        let mut tracker = Self {
            user_id: user_id.into(),
            history: Vec::with_capacity(history.len()),
            by_category: HashMap::new(),
            by_difficulty: BTreeMap::new(),
        };
        for entry in history {
            tracker.push(entry);
        }
        tracker
    }

    pub fn from_blob(blob: &[u8]) -> Result<Self, serde_json::Error> {
        let PerformanceBlob { user_id, history } = serde_json::from_slice(blob)?;
        Ok(Self::from_history(user_id, history))
    }

    pub fn to_blob(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&PerformanceBlob {
            user_id: self.user_id.clone(),
            history: self.history.clone(),
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn history(&self) -> &[PerformanceEntry] {
        &self.history
    }

    pub fn track_response(
        &mut self,
        question_id: impl Into<String>,
        category: impl Into<String>,
        difficulty_score: f64,
        is_correct: bool,
    ) {
        self.track_response_at(question_id, category, difficulty_score, is_correct, Utc::now());
    }

    pub fn track_response_at(
        &mut self,
        question_id: impl Into<String>,
        category: impl Into<String>,
        difficulty_score: f64,
        is_correct: bool,
        timestamp: DateTime<Utc>,
    ) {
        let difficulty_score = if difficulty_score.is_finite() {
            difficulty_score.clamp(0.0, 1.0)
        } else {
            NEUTRAL
        };
        self.push(PerformanceEntry {
            question_id: question_id.into(),
            category: category.into(),
            difficulty_score,
            is_correct,
            timestamp,
        });
    }

    fn push(&mut self, entry: PerformanceEntry) {
        self.by_category
            .entry(entry.category.clone())
            .or_default()
            .record(entry.is_correct);
        self.by_difficulty
            .entry(DifficultyLevel::from_score(entry.difficulty_score))
            .or_default()
            .record(entry.is_correct);
        self.history.push(entry);
    }

    pub fn category_stats(&self, category: &str) -> Aggregate {
        self.by_category.get(category).copied().unwrap_or_default()
    }

    pub fn by_difficulty(&self) -> &BTreeMap<DifficultyLevel, Aggregate> {
        &self.by_difficulty
    }

    pub fn success_rate(&self, category: &str) -> f64 {
        self.category_stats(category).success_rate()
    }

    pub fn exposure(&self, category: &str) -> f64 {
        (f64::from(self.category_stats(category).attempts) / EXPOSURE_SATURATION).min(1.0)
    }

    /// Blend of accuracy and exposure; 0.0 for categories never attempted.
    pub fn familiarity(&self, category: &str) -> f64 {
        if self.category_stats(category).attempts == 0 {
            return 0.0;
        }
        self.success_rate(category) * SUCCESS_WEIGHT + self.exposure(category) * EXPOSURE_WEIGHT
    }

    fn recent(&self, last_n: usize) -> &[PerformanceEntry] {
        let start = self.history.len().saturating_sub(last_n);
        &self.history[start..]
    }

    /// Share of correct answers among the last `last_n` responses.
    pub fn recent_performance(&self, last_n: usize) -> f64 {
        let window = self.recent(last_n);
        if window.is_empty() {
            return NEUTRAL;
        }
        window.iter().filter(|e| e.is_correct).count() as f64 / window.len() as f64
    }

    pub fn recent_average_difficulty(&self, last_n: usize) -> f64 {
        let window = self.recent(last_n);
        if window.is_empty() {
            return NEUTRAL;
        }
        window.iter().map(|e| e.difficulty_score).sum::<f64>() / window.len() as f64
    }
}

// ---------------------------------------------------------------------------
// Persistence seam
// ---------------------------------------------------------------------------

/// External storage for opaque per-user history blobs.
pub trait HistoryStore {
    fn load_user_history(&self, user_id: &str) -> Result<Option<Vec<u8>>, EngineError>;
    fn save_user_history(&mut self, user_id: &str, blob: Vec<u8>) -> Result<(), EngineError>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryHistoryStore {
    blobs: HashMap<String, Vec<u8>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for InMemoryHistoryStore {
    fn load_user_history(&self, user_id: &str) -> Result<Option<Vec<u8>>, EngineError> {
        Ok(self.blobs.get(user_id).cloned())
    }

    fn save_user_history(&mut self, user_id: &str, blob: Vec<u8>) -> Result<(), EngineError> {
        self.blobs.insert(user_id.to_string(), blob);
        Ok(())
    }
}

/// Load a user's tracker; users without stored history start empty. A blob
/// recorded for a different user is an error.
pub fn load_tracker<H: HistoryStore + ?Sized>(
    store: &H,
    user_id: &str,
) -> Result<UserPerformanceTracker, EngineError> {
    let blob = match store.load_user_history(user_id)? {
        Some(blob) => blob,
        None => return Ok(UserPerformanceTracker::new(user_id)),
    };
    let tracker = UserPerformanceTracker::from_blob(&blob)?;
    if tracker.user_id() != user_id {
        return Err(EngineError::History(format!(
            "history stored for {user_id} belongs to {}",
            tracker.user_id()
        )));
    }
    Ok(tracker)
}

pub fn save_tracker<H: HistoryStore + ?Sized>(
    store: &mut H,
    tracker: &UserPerformanceTracker,
) -> Result<(), EngineError> {
    store.save_user_history(tracker.user_id(), tracker.to_blob()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker_with(results: &[(&str, f64, bool)]) -> UserPerformanceTracker {
        let mut t = UserPerformanceTracker::new("u1");
        for (i, (category, difficulty, correct)) in results.iter().enumerate() {
            t.track_response(format!("q{i}"), *category, *difficulty, *correct);
        }
        t
    }

    #[test]
    fn unseen_category_has_zero_familiarity() {
        let t = tracker_with(&[("award_season", 0.5, true)]);
        assert_eq!(t.familiarity("stat_value"), 0.0);
    }

    #[test]
    fn familiarity_blends_accuracy_and_exposure() {
        let t = tracker_with(&[
            ("award_season", 0.5, true),
            ("award_season", 0.5, true),
            ("award_season", 0.5, false),
            ("award_season", 0.5, true),
        ]);
        // success 0.75, exposure 0.4
        assert!((t.familiarity("award_season") - (0.75 * 0.7 + 0.4 * 0.3)).abs() < 1e-9);
    }

    #[test]
    fn exposure_saturates_at_ten_attempts() {
        let results: Vec<_> = (0..25).map(|_| ("stat_value", 0.4, false)).collect();
        let t = tracker_with(&results);
        assert_eq!(t.exposure("stat_value"), 1.0);
        assert!((t.familiarity("stat_value") - 0.3).abs() < 1e-9);
    }

    #[test]
    fn recent_windows_default_to_neutral() {
        let t = UserPerformanceTracker::new("nobody");
        assert_eq!(t.recent_performance(10), 0.5);
        assert_eq!(t.recent_average_difficulty(10), 0.5);
    }

    #[test]
    fn recent_performance_only_reads_last_entries() {
        let mut results = vec![("match_winner", 0.2, false); 5];
        results.extend(vec![("match_winner", 0.6, true); 10]);
        let t = tracker_with(&results);
        assert_eq!(t.recent_performance(10), 1.0);
        assert!((t.recent_average_difficulty(10) - 0.6).abs() < 1e-9);
        assert!((t.recent_performance(15) - 10.0 / 15.0).abs() < 1e-9);
    }

    #[test]
    fn blob_round_trip_rebuilds_aggregates() {
        let t = tracker_with(&[
            ("award_age", 0.2, true),
            ("award_age", 0.9, false),
            ("stat_leader", 0.5, true),
        ]);
        let restored = UserPerformanceTracker::from_blob(&t.to_blob().unwrap()).unwrap();
        assert_eq!(restored.user_id(), "u1");
        assert_eq!(restored.history(), t.history());
        assert_eq!(restored.category_stats("award_age"), Aggregate { attempts: 2, correct: 1 });
        assert_eq!(restored.by_difficulty(), t.by_difficulty());
        assert_eq!(
            restored.by_difficulty().get(&DifficultyLevel::Advanced),
            Some(&Aggregate { attempts: 1, correct: 0 })
        );
    }

    #[test]
    fn blob_of_another_user_is_rejected() {
        let mut store = InMemoryHistoryStore::new();
        let other = tracker_with(&[("award_age", 0.2, true)]);
        store.save_user_history("u2", other.to_blob().unwrap()).unwrap();
        let err = load_tracker(&store, "u2").unwrap_err();
        assert!(matches!(err, EngineError::History(_)), "{err}");
    }

    #[test]
    fn corrupt_blob_is_an_error() {
        assert!(UserPerformanceTracker::from_blob(b"{not json").is_err());
    }

    #[test]
    fn store_round_trip_and_missing_user() {
        let mut store = InMemoryHistoryStore::new();
        assert!(load_tracker(&store, "new-user").unwrap().history().is_empty());

        let mut t = load_tracker(&store, "u1").unwrap();
        t.track_response("q1", "match_score", 0.7, true);
        save_tracker(&mut store, &t).unwrap();

        let again = load_tracker(&store, "u1").unwrap();
        assert_eq!(again.history().len(), 1);
        assert_eq!(again.success_rate("match_score"), 1.0);
    }
}
