use rand::rngs::StdRng;

use crate::quiz_engine::{
    factors::match_significance,
    generators::GeneratorContext,
    helpers::{same_option, season_event_year, unique_pool},
    models::{CandidateQuestion, ContentRecord, QuestionContext, QuestionType},
};

const MAX_SCORE: f64 = 99.0;

pub const DRAW: &str = "Draw";

struct Fixture {
    home: String,
    away: String,
    home_score: i64,
    away_score: i64,
    season: Option<String>,
    date: Option<String>,
    stage: Option<String>,
}

impl Fixture {
    fn from_record(record: &ContentRecord) -> Option<Self> {
        let home = record.text("home_team")?;
        let away = record.text("away_team")?;
        if same_option(&home, &away) {
            return None;
        }
        let home_score = score_field(record, "home_score")?;
        let away_score = score_field(record, "away_score")?;
        Some(Self {
            home,
            away,
            home_score,
            away_score,
            season: record.text("season"),
            date: record.text("date"),
            stage: record.text("stage"),
        })
    }

    /// "on 2014-04-13" or "in the 2013-14 season"; `None` when neither is known.
    fn when(&self) -> Option<String> {
        match (&self.date, &self.season) {
            (Some(date), _) => Some(format!("on {date}")),
            (None, Some(season)) => Some(format!("in the {season} season")),
            (None, None) => None,
        }
    }

    fn year(&self) -> Option<i32> {
        self.date
            .as_deref()
            .and_then(|d| d.get(..4))
            .and_then(|y| y.parse().ok())
            .or_else(|| self.season.as_deref().and_then(season_event_year))
    }

    fn scoreline(&self) -> String {
        format!("{}-{}", self.home_score, self.away_score)
    }
}

/// Goals scored by one side; anything outside 0..=99 is treated as bad data.
fn score_field(record: &ContentRecord, key: &str) -> Option<i64> {
    let value = record.number(key)?;
    ((0.0..=MAX_SCORE).contains(&value) && value.fract() == 0.0).then_some(value as i64)
}

/// Another record with the same home and away sides on the same date (or in
/// the same season when undated) makes "when X hosted Y" ambiguous.
fn is_ambiguous(record: &ContentRecord, fixture: &Fixture, related: &[ContentRecord]) -> bool {
    related
        .iter()
        .filter(|r| !std::ptr::eq(*r, record))
        .filter_map(Fixture::from_record)
        .any(|other| {
            let same_sides = same_option(&other.home, &fixture.home) && same_option(&other.away, &fixture.away);
            let same_slot = match (&fixture.date, &other.date) {
                (Some(a), Some(b)) => same_option(a, b),
                (None, None) => match (&fixture.season, &other.season) {
                    (Some(a), Some(b)) => same_option(a, b),
                    _ => true,
                },
                _ => false,
            };
            same_sides && same_slot
        })
}

fn match_context(question_type: QuestionType, fixture: &Fixture, record: &ContentRecord, ctx: &GeneratorContext<'_>) -> QuestionContext {
    let mut context = QuestionContext::new(question_type, ctx.competition_id);
    context.season = fixture.season.clone();
    context.year = fixture.year();
    context.subject = Some(format!("{} vs {}", fixture.home, fixture.away));
    context.popularity = record.number("popularity");
    context.significance = Some(match_significance(fixture.stage.as_deref()));
    context.has_exact_date = fixture.date.is_some();
    context.extra.insert("home_team".into(), fixture.home.clone().into());
    context.extra.insert("away_team".into(), fixture.away.clone().into());
    if let Some(date) = &fixture.date {
        context.extra.insert("date".into(), date.clone().into());
    }
    if let Some(stage) = &fixture.stage {
        context.extra.insert("stage".into(), stage.clone().into());
    }
    context
}

/// "Who won when H hosted A on D?" Options are both sides and a draw.
pub fn winner(
    record: &ContentRecord,
    related: &[ContentRecord],
    ctx: &GeneratorContext<'_>,
    _rng: &mut StdRng,
) -> Option<CandidateQuestion> {
    let fixture = Fixture::from_record(record)?;
    let when = fixture.when()?;
    if is_ambiguous(record, &fixture, related) {
        return None;
    }

    let answer = match fixture.home_score.cmp(&fixture.away_score) {
        std::cmp::Ordering::Greater => fixture.home.clone(),
        std::cmp::Ordering::Less => fixture.away.clone(),
        std::cmp::Ordering::Equal => DRAW.to_string(),
    };
    let distractors = unique_pool(
        &answer,
        [fixture.home.clone(), fixture.away.clone(), DRAW.to_string()],
    );

    let context = match_context(QuestionType::MatchWinner, &fixture, record, ctx);
    Some(CandidateQuestion::new(
        QuestionType::MatchWinner,
        format!("Who won when {} hosted {} {when}?", fixture.home, fixture.away),
        answer,
        distractors,
        context,
    ))
}

/// "What was the final score when H hosted A on D?" Distractors are the
/// neighbouring scorelines and the reversed one.
pub fn score(
    record: &ContentRecord,
    related: &[ContentRecord],
    ctx: &GeneratorContext<'_>,
    _rng: &mut StdRng,
) -> Option<CandidateQuestion> {
    let fixture = Fixture::from_record(record)?;
    let when = fixture.when()?;
    if is_ambiguous(record, &fixture, related) {
        return None;
    }

    let (h, a) = (fixture.home_score, fixture.away_score);
    let neighbours = [(h + 1, a), (h, a + 1), (h - 1, a), (h, a - 1), (a, h), (h + 1, a + 1)];
    let answer = fixture.scoreline();
    let distractors = unique_pool(
        &answer,
        neighbours
            .into_iter()
            .filter(|(x, y)| *x >= 0 && *y >= 0)
            .map(|(x, y)| format!("{x}-{y}")),
    );
    if distractors.len() < QuestionType::MatchScore.min_distractors() {
        return None;
    }

    let context = match_context(QuestionType::MatchScore, &fixture, record, ctx);
    Some(CandidateQuestion::new(
        QuestionType::MatchScore,
        format!(
            "What was the final score when {} hosted {} {when}?",
            fixture.home, fixture.away
        ),
        answer,
        distractors,
        context,
    ))
}
