//! Shared building blocks used across generators, the validator and selection.
//!
//! Generators all do the same chores: parse seasons, split squad strings into
//! club and country tokens, build numeric distractors and clean raw pools.
//! These helpers keep that work in one place so generator files hold only
//! question logic.

use std::ops::RangeInclusive;

use rand::seq::SliceRandom;
use rand::Rng;

/// Placeholder options that signal a generator ran out of real distractors.
pub const GENERIC_DISTRACTORS: &[&str] = &["Other Player", "Unknown", "Not Listed", "None of the above"];

/// Country names recognised inside squad strings and nationality fields.
pub const COUNTRIES: &[&str] = &[
    "Algeria", "Argentina", "Australia", "Austria", "Belgium", "Bosnia and Herzegovina",
    "Brazil", "Bulgaria", "Cameroon", "Canada", "Chile", "Colombia", "Croatia",
    "Czech Republic", "Denmark", "Ecuador", "Egypt", "England", "Finland", "France",
    "Gabon", "Germany", "Ghana", "Greece", "Hungary", "Iceland", "Iran", "Ireland",
    "Italy", "Ivory Coast", "Jamaica", "Japan", "Mexico", "Morocco", "Netherlands",
    "Nigeria", "Northern Ireland", "Norway", "Paraguay", "Peru", "Poland", "Portugal",
    "Republic of Ireland", "Romania", "Russia", "Scotland", "Senegal", "Serbia",
    "Slovakia", "Slovenia", "South Korea", "Spain", "Sweden", "Switzerland", "Togo",
    "Tunisia", "Turkey", "Ukraine", "United States", "Uruguay", "Wales",
];

const SQUAD_SEPARATORS: &[char] = &[',', '/', ';', '|'];

// ---------------------------------------------------------------------------
// Option comparison and cleaning
// ---------------------------------------------------------------------------

/// Options compare trimmed and case-insensitively.
pub fn same_option(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Drop `None`, blanks, duplicates and anything equal to the correct answer,
/// keeping the first occurrence order.
pub fn clean_distractors(correct: &str, raw: &[Option<String>]) -> Vec<String> {
    unique_pool(correct, raw.iter().flatten().cloned())
}

/// Same cleaning as [`clean_distractors`] for pools built from plain strings.
pub fn unique_pool(correct: &str, pool: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut kept: Vec<String> = Vec::new();
    for option in pool {
        let trimmed = option.trim();
        if trimmed.is_empty() || same_option(trimmed, correct) {
            continue;
        }
        if kept.iter().any(|k| same_option(k, trimmed)) {
            continue;
        }
        kept.push(trimmed.to_string());
    }
    kept
}

/// Pick at most `n` distractors from an oversized pool.
pub fn sample_distractors<R: Rng>(rng: &mut R, pool: &[String], n: usize) -> Vec<String> {
    if pool.len() <= n {
        return pool.to_vec();
    }
    pool.choose_multiple(rng, n).cloned().collect()
}

// ---------------------------------------------------------------------------
// Squads and countries
// ---------------------------------------------------------------------------

pub fn is_country(token: &str) -> bool {
    COUNTRIES.iter().any(|c| same_option(c, token))
}

/// Split a squad string such as `"Barcelona, Argentina"` into trimmed tokens.
pub fn squad_tokens(squad: &str) -> Vec<String> {
    squad
        .split(SQUAD_SEPARATORS)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn club_tokens(squad: &str) -> Vec<String> {
    squad_tokens(squad).into_iter().filter(|t| !is_country(t)).collect()
}

pub fn country_tokens(squad: &str) -> Vec<String> {
    squad_tokens(squad).into_iter().filter(|t| is_country(t)).collect()
}

// ---------------------------------------------------------------------------
// Seasons
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeasonFormat {
    /// "2010-11", "2010/11", "2010-2011"
    Range,
    /// "2011"
    Year,
    Other,
}

fn four_digit_year(s: &str) -> Option<i32> {
    if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse().ok()
    } else {
        None
    }
}

fn split_range(season: &str) -> Option<(i32, &str)> {
    let season = season.trim();
    let (start, end) = season.split_once(['-', '/'])?;
    let start = four_digit_year(start)?;
    let valid_end = (end.len() == 2 || end.len() == 4) && end.bytes().all(|b| b.is_ascii_digit());
    valid_end.then_some((start, end))
}

pub fn season_format(season: &str) -> SeasonFormat {
    if split_range(season).is_some() {
        SeasonFormat::Range
    } else if four_digit_year(season.trim()).is_some() {
        SeasonFormat::Year
    } else {
        SeasonFormat::Other
    }
}

pub fn looks_like_season(value: &str) -> bool {
    season_format(value) != SeasonFormat::Other
}

pub fn season_start_year(season: &str) -> Option<i32> {
    match split_range(season) {
        Some((start, _)) => Some(start),
        None => four_digit_year(season.trim()),
    }
}

/// The calendar year a season finishes in: "2010-11" → 2011, "1999-00" → 2000.
pub fn season_event_year(season: &str) -> Option<i32> {
    match split_range(season) {
        Some((_, end)) if end.len() == 4 => end.parse().ok(),
        Some((start, end)) => {
            let suffix: i32 = end.parse().ok()?;
            let mut year = start - start % 100 + suffix;
            if year < start {
                year += 100;
            }
            Some(year)
        }
        None => four_digit_year(season.trim()),
    }
}

// ---------------------------------------------------------------------------
// Numbers
// ---------------------------------------------------------------------------

/// Leading integer of a value such as `"27-123"` (years-days ages).
pub fn parse_leading_int(value: &str) -> Option<i64> {
    let digits: String = value
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Integers render without a decimal point, everything else with one place.
pub fn format_number(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{}", value.round() as i64)
    } else {
        format!("{:.1}", value)
    }
}

pub fn is_numeric_option(value: &str) -> bool {
    value.trim().parse::<f64>().is_ok()
}

/// Offset `correct` by each delta, dropping collisions and out-of-range values.
pub fn offset_distractors(correct: i64, deltas: &[i64], domain: RangeInclusive<i64>) -> Vec<String> {
    let values = deltas
        .iter()
        .map(|d| correct + d)
        .filter(|v| *v != correct && domain.contains(v))
        .map(|v| v.to_string());
    unique_pool(&correct.to_string(), values)
}

/// Scale `correct` by each factor; results below `floor` or equal to the
/// answer once formatted are dropped.
pub fn scaled_distractors(correct: f64, factors: &[f64], floor: f64) -> Vec<String> {
    let integral = (correct - correct.round()).abs() < 1e-9;
    let render = |v: f64| if integral { format_number(v.round()) } else { format!("{:.1}", v) };
    let values = factors
        .iter()
        .map(|f| correct * f)
        .filter(|v| *v >= floor)
        .map(render);
    unique_pool(&render(correct), values)
}
