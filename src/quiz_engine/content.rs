//! Read-only access to the content store.
//!
//! The engine only ever asks two things of a store: which award or stat
//! names a competition has, and the records behind one of them.
//! [`CachedContentSource`] wraps any source with a time-limited memo of both.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::quiz_engine::{
    error::ContentError,
    helpers::same_option,
    models::{ContentRecord, RecordCategory},
};

/// Field that names the award or statistic of a record, if the category has one.
pub fn name_field(category: RecordCategory) -> Option<&'static str> {
    match category {
        RecordCategory::AwardWinners => Some("award"),
        RecordCategory::StatLeaders  => Some("stat"),
        RecordCategory::MatchResults => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordFilter {
    /// Award or statistic name.
    pub name: Option<String>,
    pub season: Option<String>,
}

impl RecordFilter {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), season: None }
    }

    pub fn in_season(mut self, season: impl Into<String>) -> Self {
        self.season = Some(season.into());
        self
    }

    fn matches(&self, category: RecordCategory, record: &ContentRecord) -> bool {
        let field_matches = |wanted: &Option<String>, field: Option<&str>| match (wanted, field) {
            (None, _) => true,
            (Some(_), None) => true,
            (Some(w), Some(field)) => record.text(field).map_or(false, |v| same_option(&v, w)),
        };
        field_matches(&self.name, name_field(category)) && field_matches(&self.season, Some("season"))
    }
}

pub trait ContentSource {
    /// Distinct award or stat names of a competition; empty for match results.
    fn list_names(&self, competition_id: &str, category: RecordCategory) -> Result<Vec<String>, ContentError>;

    fn get_records(
        &self,
        competition_id: &str,
        category: RecordCategory,
        filter: &RecordFilter,
    ) -> Result<Vec<ContentRecord>, ContentError>;
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Competition id → category → records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InMemoryContent {
    competitions: HashMap<String, BTreeMap<RecordCategory, Vec<ContentRecord>>>,
}

impl InMemoryContent {
    pub fn new() -> Self {
        Self::default()
    }

    /// `{"premier-league": {"award_winners": [...], "match_results": [...]}}`
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    pub fn insert(
        &mut self,
        competition_id: impl Into<String>,
        category: RecordCategory,
        records: impl IntoIterator<Item = ContentRecord>,
    ) {
        self.competitions
            .entry(competition_id.into())
            .or_default()
            .entry(category)
            .or_default()
            .extend(records);
    }

    fn competition(&self, competition_id: &str) -> Result<&BTreeMap<RecordCategory, Vec<ContentRecord>>, ContentError> {
        self.competitions
            .get(competition_id)
            .ok_or_else(|| ContentError::UnknownCompetition(competition_id.to_string()))
    }
}

impl ContentSource for InMemoryContent {
    fn list_names(&self, competition_id: &str, category: RecordCategory) -> Result<Vec<String>, ContentError> {
        let competition = self.competition(competition_id)?;
        let Some(field) = name_field(category) else {
            return Ok(Vec::new());
        };
        let mut names: Vec<String> = Vec::new();
        for record in competition.get(&category).into_iter().flatten() {
            if let Some(name) = record.text(field) {
                if !names.iter().any(|n| same_option(n, &name)) {
                    names.push(name);
                }
            }
        }
        Ok(names)
    }

    fn get_records(
        &self,
        competition_id: &str,
        category: RecordCategory,
        filter: &RecordFilter,
    ) -> Result<Vec<ContentRecord>, ContentError> {
        let competition = self.competition(competition_id)?;
        Ok(competition
            .get(&category)
            .into_iter()
            .flatten()
            .filter(|r| filter.matches(category, r))
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// TTL cache
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CacheKey {
    Names { competition_id: String, category: RecordCategory },
    Records { competition_id: String, category: RecordCategory, filter: RecordFilter },
}

#[derive(Debug, Clone)]
enum Cached {
    Names(Vec<String>),
    Records(Vec<ContentRecord>),
}

/// Memoises successful queries of the wrapped source for `ttl`. Errors pass
/// through uncached.
#[derive(Debug)]
pub struct CachedContentSource<S> {
    inner: S,
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, (Instant, Cached)>>,
}

impl<S: ContentSource> CachedContentSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, (Instant, Cached)>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lookup(&self, key: &CacheKey) -> Option<Cached> {
        let mut entries = self.lock();
        let fresh = entries
            .get(key)
            .filter(|(stored, _)| stored.elapsed() < self.ttl)
            .map(|(_, value)| value.clone());
        if fresh.is_none() {
            entries.remove(key);
        }
        fresh
    }

    /// Insert a fresh entry and drop every expired one.
    fn store(&self, key: CacheKey, value: Cached) {
        let mut entries = self.lock();
        entries.retain(|_, (stored, _)| stored.elapsed() < self.ttl);
        entries.insert(key, (Instant::now(), value));
    }
}

impl<S: ContentSource> ContentSource for CachedContentSource<S> {
    fn list_names(&self, competition_id: &str, category: RecordCategory) -> Result<Vec<String>, ContentError> {
        let key = CacheKey::Names { competition_id: competition_id.to_string(), category };
        if let Some(Cached::Names(names)) = self.lookup(&key) {
            return Ok(names);
        }
        let names = self.inner.list_names(competition_id, category)?;
        self.store(key, Cached::Names(names.clone()));
        Ok(names)
    }

    fn get_records(
        &self,
        competition_id: &str,
        category: RecordCategory,
        filter: &RecordFilter,
    ) -> Result<Vec<ContentRecord>, ContentError> {
        let key = CacheKey::Records {
            competition_id: competition_id.to_string(),
            category,
            filter: filter.clone(),
        };
        if let Some(Cached::Records(records)) = self.lookup(&key) {
            return Ok(records);
        }
        let records = self.inner.get_records(competition_id, category, filter)?;
        self.store(key, Cached::Records(records.clone()));
        Ok(records)
    }
}
