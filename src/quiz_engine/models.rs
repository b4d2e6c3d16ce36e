use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Content records
// ---------------------------------------------------------------------------

/// One read-only row from the content store: an award winner, a statistic
/// entry or a match result. Field names follow the store's own columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentRecord {
    fields: BTreeMap<String, Value>,
}

impl ContentRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter, mostly used by fixtures and in-memory sources.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Non-blank text field. Numbers are rendered as text; blanks are `None`.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Finite numeric field. Numeric strings are parsed.
    pub fn number(&self, key: &str) -> Option<f64> {
        let value = match self.fields.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }?;
        value.is_finite().then_some(value)
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ContentRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// The three record families the content store exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordCategory {
    AwardWinners,
    StatLeaders,
    MatchResults,
}

impl RecordCategory {
    pub const ALL: [RecordCategory; 3] = [
        RecordCategory::AwardWinners,
        RecordCategory::StatLeaders,
        RecordCategory::MatchResults,
    ];
}

impl fmt::Display for RecordCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordCategory::AwardWinners => write!(f, "award winners"),
            RecordCategory::StatLeaders  => write!(f, "stat leaders"),
            RecordCategory::MatchResults => write!(f, "match results"),
        }
    }
}

// ---------------------------------------------------------------------------
// Question types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    AwardSeason,
    AwardWinner,
    AwardTeam,
    AwardNationality,
    AwardAge,
    StatValue,
    StatLeader,
    StatComparison,
    MatchWinner,
    MatchScore,
}

impl QuestionType {
    pub const ALL: [QuestionType; 10] = [
        QuestionType::AwardSeason,
        QuestionType::AwardWinner,
        QuestionType::AwardTeam,
        QuestionType::AwardNationality,
        QuestionType::AwardAge,
        QuestionType::StatValue,
        QuestionType::StatLeader,
        QuestionType::StatComparison,
        QuestionType::MatchWinner,
        QuestionType::MatchScore,
    ];

    /// Stable identifier, also used as the tracker category.
    pub fn slug(self) -> &'static str {
        match self {
            QuestionType::AwardSeason      => "award_season",
            QuestionType::AwardWinner      => "award_winner",
            QuestionType::AwardTeam        => "award_team",
            QuestionType::AwardNationality => "award_nationality",
            QuestionType::AwardAge         => "award_age",
            QuestionType::StatValue        => "stat_value",
            QuestionType::StatLeader       => "stat_leader",
            QuestionType::StatComparison   => "stat_comparison",
            QuestionType::MatchWinner      => "match_winner",
            QuestionType::MatchScore       => "match_score",
        }
    }

    /// Prefix for generated question ids.
    pub fn prefix(self) -> &'static str {
        match self {
            QuestionType::AwardSeason      => "AS",
            QuestionType::AwardWinner      => "AW",
            QuestionType::AwardTeam        => "AT",
            QuestionType::AwardNationality => "AN",
            QuestionType::AwardAge         => "AA",
            QuestionType::StatValue        => "SV",
            QuestionType::StatLeader       => "SL",
            QuestionType::StatComparison   => "SC",
            QuestionType::MatchWinner      => "MW",
            QuestionType::MatchScore       => "MS",
        }
    }

    /// Which record family feeds this generator.
    pub fn source_category(self) -> RecordCategory {
        match self {
            QuestionType::AwardSeason
            | QuestionType::AwardWinner
            | QuestionType::AwardTeam
            | QuestionType::AwardNationality
            | QuestionType::AwardAge => RecordCategory::AwardWinners,
            QuestionType::StatValue
            | QuestionType::StatLeader
            | QuestionType::StatComparison => RecordCategory::StatLeaders,
            QuestionType::MatchWinner | QuestionType::MatchScore => RecordCategory::MatchResults,
        }
    }

    pub fn for_category(category: RecordCategory) -> impl Iterator<Item = QuestionType> {
        Self::ALL.into_iter().filter(move |t| t.source_category() == category)
    }

    /// Comparison questions are two-choice; everything else needs two wrong options.
    pub fn min_distractors(self) -> usize {
        match self {
            QuestionType::StatComparison => 1,
            _ => 2,
        }
    }

    pub fn concerns_club_team(self) -> bool {
        matches!(self, QuestionType::AwardTeam)
    }

    pub fn concerns_nationality(self) -> bool {
        matches!(self, QuestionType::AwardNationality)
    }

    /// Types whose question text names the options on purpose.
    pub fn options_named_in_text(self) -> bool {
        matches!(self, QuestionType::StatComparison | QuestionType::MatchWinner)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QuestionType::AwardSeason      => "Award Season",
            QuestionType::AwardWinner      => "Award Winner",
            QuestionType::AwardTeam        => "Award Winner's Team",
            QuestionType::AwardNationality => "Award Winner's Nationality",
            QuestionType::AwardAge         => "Award Winner's Age",
            QuestionType::StatValue        => "Stat Value",
            QuestionType::StatLeader       => "Stat Leader",
            QuestionType::StatComparison   => "Stat Comparison",
            QuestionType::MatchWinner      => "Match Winner",
            QuestionType::MatchScore       => "Match Score",
        };
        write!(f, "{}", s)
    }
}

/// Safe rephrasings of a season question when the subject won more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionVariant {
    FirstWin,
    LatestWin,
    WinCount,
}

// ---------------------------------------------------------------------------
// Candidate / final questions
// ---------------------------------------------------------------------------

/// Difficulty-relevant metadata attached by a generator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionContext {
    pub category: String,
    pub competition_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub significance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stat_complexity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_ambiguity: Option<f64>,
    /// The answer derives from an exact date rather than an approximation.
    #[serde(default)]
    pub has_exact_date: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<QuestionVariant>,
    /// Source fields carried through to the caller untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl QuestionContext {
    pub fn new(question_type: QuestionType, competition_id: &str) -> Self {
        Self {
            category: question_type.slug().to_string(),
            competition_id: competition_id.to_string(),
            ..Self::default()
        }
    }
}

/// A generated, not-yet-accepted question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateQuestion {
    pub question_type: QuestionType,
    pub question_text: String,
    pub correct_answer: String,
    /// Unfiltered pool; may hold blanks, `None` and duplicates until cleaned.
    pub raw_distractors: Vec<Option<String>>,
    pub context: QuestionContext,
}

impl CandidateQuestion {
    pub fn new(
        question_type: QuestionType,
        question_text: impl Into<String>,
        correct_answer: impl Into<String>,
        distractors: Vec<String>,
        context: QuestionContext,
    ) -> Self {
        Self {
            question_type,
            question_text: question_text.into(),
            correct_answer: correct_answer.into(),
            raw_distractors: distractors.into_iter().map(Some).collect(),
            context,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl DifficultyLevel {
    /// Bucket a [0, 1] difficulty score.
    pub fn from_score(score: f64) -> Self {
        if score < 0.35 {
            DifficultyLevel::Beginner
        } else if score < 0.65 {
            DifficultyLevel::Intermediate
        } else {
            DifficultyLevel::Advanced
        }
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DifficultyLevel::Beginner     => write!(f, "Beginner"),
            DifficultyLevel::Intermediate => write!(f, "Intermediate"),
            DifficultyLevel::Advanced     => write!(f, "Advanced"),
        }
    }
}

/// A question accepted into a quiz. Never mutated after it is returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalQuestion {
    pub question_id: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(rename = "question")]
    pub question_text: String,
    #[serde(rename = "answer")]
    pub correct_answer: String,
    /// Correct answer plus the selected distractors, shuffled.
    pub options: Vec<String>,
    pub distractors: Vec<String>,
    pub difficulty_score: f64,
    pub difficulty_level: DifficultyLevel,
    pub quality_score: f64,
    #[serde(flatten)]
    pub context: QuestionContext,
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizRequest {
    pub competition_id: String,
    pub num_questions: usize,
    /// Personalise difficulty against this user's stored history.
    pub user_id: Option<String>,
    pub rng_seed: Option<u64>,
}

impl QuizRequest {
    /// Anonymous request with entropy seeding.
    pub fn new(competition_id: impl Into<String>, num_questions: usize) -> Self {
        Self {
            competition_id: competition_id.into(),
            num_questions,
            user_id: None,
            rng_seed: None,
        }
    }

    pub fn for_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn seeded(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }
}
