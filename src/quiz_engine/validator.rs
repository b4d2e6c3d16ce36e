//! Distractor and answer validation.
//!
//! Every candidate starts from a score of 1.0 and loses points per problem
//! found. Structural problems (generic placeholders, blank entries) carry an
//! extra penalty on top of the per-severity one. A candidate that cannot
//! field enough real distractors after cleaning fails outright, whatever its
//! score.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::quiz_engine::{
    config::ValidatorConfig,
    helpers::{
        clean_distractors, is_country, looks_like_season, same_option, season_format, SeasonFormat,
    },
    models::{CandidateQuestion, QuestionContext, QuestionType},
};

const GENERIC_PENALTY: f64 = 0.5;
/// Scaled by the share of blank entries in the raw pool.
const BLANK_PENALTY: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Minor,
    Major,
    Critical,
}

impl Severity {
    pub fn penalty(self) -> f64 {
        match self {
            Severity::Minor    => 0.05,
            Severity::Major    => 0.1,
            Severity::Critical => 0.2,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Minor    => write!(f, "minor"),
            Severity::Major    => write!(f, "major"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MissingAnswer,
    GenericDistractor,
    BlankDistractor,
    AnswerAmongDistractors,
    CountryAsClubTeam,
    NonCountryNationality,
    DuplicateDistractor,
    InconsistentSeasonFormat,
    InsufficientDistractors,
}

impl IssueKind {
    pub fn severity(self) -> Severity {
        match self {
            IssueKind::MissingAnswer
            | IssueKind::GenericDistractor
            | IssueKind::BlankDistractor
            | IssueKind::AnswerAmongDistractors
            | IssueKind::CountryAsClubTeam
            | IssueKind::InsufficientDistractors => Severity::Critical,
            IssueKind::NonCountryNationality | IssueKind::DuplicateDistractor => Severity::Major,
            IssueKind::InconsistentSeasonFormat => Severity::Minor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub severity: Severity,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub quality_score: f64,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn has(&self, kind: IssueKind) -> bool {
        self.issues.iter().any(|i| i.kind == kind)
    }

    pub fn worst_severity(&self) -> Option<Severity> {
        self.issues.iter().map(|i| i.severity).max()
    }
}

/// Running tally for one validation pass.
struct Tally {
    score: f64,
    hard_fail: bool,
    issues: Vec<ValidationIssue>,
}

impl Tally {
    fn new() -> Self {
        Self { score: 1.0, hard_fail: false, issues: Vec::new() }
    }

    fn flag(&mut self, kind: IssueKind, recommendation: impl Into<String>) {
        let severity = kind.severity();
        self.score -= severity.penalty();
        self.issues.push(ValidationIssue {
            kind,
            severity,
            recommendation: recommendation.into(),
        });
    }
}

#[derive(Debug, Clone)]
pub struct DistractorValidator {
    config: ValidatorConfig,
}

impl DistractorValidator {
    pub fn new(config: &ValidatorConfig) -> Self {
        Self { config: config.clone() }
    }

    pub fn validate_candidate(&self, candidate: &CandidateQuestion) -> ValidationResult {
        self.validate(
            candidate.question_type,
            &candidate.correct_answer,
            &candidate.raw_distractors,
            &candidate.context,
        )
    }

    pub fn validate(
        &self,
        question_type: QuestionType,
        correct_answer: &str,
        distractors: &[Option<String>],
        context: &QuestionContext,
    ) -> ValidationResult {
        let mut tally = Tally::new();
        let present: Vec<&str> = distractors
            .iter()
            .flatten()
            .map(|d| d.trim())
            .filter(|d| !d.is_empty())
            .collect();

        if correct_answer.trim().is_empty() {
            tally.flag(IssueKind::MissingAnswer, "generator produced an empty answer");
            tally.hard_fail = true;
        }

        self.check_generic(&present, &mut tally);
        check_blanks(distractors, present.len(), &mut tally);

        if present.iter().any(|d| same_option(d, correct_answer)) {
            tally.flag(
                IssueKind::AnswerAmongDistractors,
                "remove the correct answer from the distractor pool",
            );
        }
        if question_type.concerns_club_team() && present.iter().any(|d| is_country(d)) {
            tally.flag(
                IssueKind::CountryAsClubTeam,
                "use club names only for team questions",
            );
            tally.hard_fail = true;
        }
        if question_type.concerns_nationality()
            && std::iter::once(correct_answer).chain(present.iter().copied()).any(|o| !is_country(o))
        {
            tally.flag(
                IssueKind::NonCountryNationality,
                "use country names only for nationality questions",
            );
        }
        if has_duplicates(&present) {
            tally.flag(IssueKind::DuplicateDistractor, "deduplicate distractors");
        }
        // season answers must also match how the source record writes its season
        let reference = context
            .season
            .as_deref()
            .filter(|_| question_type == QuestionType::AwardSeason && looks_like_season(correct_answer));
        if mixes_season_formats(correct_answer, &present, reference) {
            tally.flag(
                IssueKind::InconsistentSeasonFormat,
                "write every season option in the same format",
            );
        }

        let usable = clean_distractors(correct_answer, distractors)
            .into_iter()
            .filter(|d| !self.is_generic(d))
            .count();
        let needed = question_type.min_distractors();
        if usable < needed {
            tally.flag(
                IssueKind::InsufficientDistractors,
                format!("need at least {needed} distinct distractors, found {usable}"),
            );
            tally.hard_fail = true;
        }

        let quality_score = tally.score.max(0.0);
        ValidationResult {
            is_valid: !tally.hard_fail && quality_score >= self.config.acceptance_threshold,
            quality_score,
            issues: tally.issues,
        }
    }

    fn is_generic(&self, option: &str) -> bool {
        self.config.generic_distractors.iter().any(|g| same_option(g, option))
    }

    fn check_generic(&self, present: &[&str], tally: &mut Tally) {
        let generic: Vec<&str> = present.iter().copied().filter(|d| self.is_generic(d)).collect();
        if !generic.is_empty() {
            tally.score -= GENERIC_PENALTY;
            tally.flag(
                IssueKind::GenericDistractor,
                format!("replace placeholder options: {}", generic.join(", ")),
            );
        }
    }
}

fn check_blanks(distractors: &[Option<String>], present: usize, tally: &mut Tally) {
    let blank = distractors.len() - present;
    if blank > 0 {
        tally.score -= BLANK_PENALTY * blank as f64 / distractors.len() as f64;
        tally.flag(
            IssueKind::BlankDistractor,
            format!("{blank} of {} distractors are empty", distractors.len()),
        );
    }
}

fn has_duplicates(options: &[&str]) -> bool {
    let mut seen = BTreeSet::new();
    options.iter().any(|o| !seen.insert(o.to_lowercase()))
}

/// True when season-shaped options use both "2010-11" and "2011" styles.
fn mixes_season_formats(correct_answer: &str, distractors: &[&str], reference: Option<&str>) -> bool {
    let formats: BTreeSet<u8> = std::iter::once(correct_answer)
        .chain(distractors.iter().copied())
        .chain(reference)
        .filter_map(|o| match season_format(o) {
            SeasonFormat::Range => Some(0),
            SeasonFormat::Year => Some(1),
            SeasonFormat::Other => None,
        })
        .collect();
    formats.len() > 1
}
