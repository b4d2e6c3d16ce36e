use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::quiz_engine::{
    factors::award_significance,
    generators::GeneratorContext,
    helpers::{
        club_tokens, country_tokens, is_country, offset_distractors, parse_leading_int,
        same_option, season_event_year, season_start_year, unique_pool, COUNTRIES,
    },
    models::{CandidateQuestion, ContentRecord, QuestionContext, QuestionType, QuestionVariant},
};

const AGE_DELTAS: &[i64] = &[-4, -3, -2, -1, 1, 2, 3, 4];
const COUNT_DELTAS: &[i64] = &[-2, -1, 1, 2, 3];
/// Nationality questions are padded from the country list up to this many.
const NATIONALITY_POOL: usize = 3;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn award_name(record: &ContentRecord, ctx: &GeneratorContext<'_>) -> String {
    record.text("award").unwrap_or_else(|| ctx.name.to_string())
}

fn event_year(record: &ContentRecord) -> Option<i32> {
    record
        .text("season")
        .and_then(|s| season_event_year(&s))
        .or_else(|| record.number("year").map(|y| y as i32))
}

fn award_context(
    question_type: QuestionType,
    record: &ContentRecord,
    ctx: &GeneratorContext<'_>,
    award: &str,
) -> QuestionContext {
    let mut context = QuestionContext::new(question_type, ctx.competition_id);
    context.season = record.text("season");
    context.year = event_year(record);
    context.subject = record.text("player");
    context.popularity = record.number("popularity");
    context.significance = Some(award_significance(award));
    context.extra.insert("award".into(), award.into());
    context
}

fn is_same_player(record: &ContentRecord, player: &str) -> bool {
    record
        .text("player")
        .map(|p| same_option(&p, player))
        .unwrap_or(false)
}

/// Every distinct season `player` won in, oldest first.
fn seasons_won<'a>(player: &str, records: impl Iterator<Item = &'a ContentRecord>) -> Vec<String> {
    let mut seasons = unique_pool(
        "",
        records
            .filter(|r| is_same_player(r, player))
            .filter_map(|r| r.text("season")),
    );
    seasons.sort_by_key(|s| season_start_year(s).unwrap_or(i32::MAX));
    seasons
}

fn enough(distractors: &[String], question_type: QuestionType) -> bool {
    distractors.len() >= question_type.min_distractors()
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// "In which season did X win the award?"
///
/// When X won in several seasons the plain question has more than one correct
/// answer, so one of three single-answer variants is asked instead. Seasons
/// X won never appear as distractors.
pub fn season(
    record: &ContentRecord,
    related: &[ContentRecord],
    ctx: &GeneratorContext<'_>,
    rng: &mut StdRng,
) -> Option<CandidateQuestion> {
    let player = record.text("player")?;
    let award = award_name(record, ctx);
    let own = seasons_won(&player, std::iter::once(record).chain(related));
    let other_seasons: Vec<String> = related
        .iter()
        .filter_map(|r| r.text("season"))
        .filter(|s| !own.iter().any(|o| same_option(o, s)))
        .collect();

    let mut context = award_context(QuestionType::AwardSeason, record, ctx, &award);

    let (text, answer, distractors) = if own.len() > 1 {
        let variant = match rng.gen_range(0..3) {
            0 => QuestionVariant::FirstWin,
            1 => QuestionVariant::LatestWin,
            _ => QuestionVariant::WinCount,
        };
        context.variant = Some(variant);
        match variant {
            QuestionVariant::FirstWin | QuestionVariant::LatestWin => {
                let (answer, adverb) = if variant == QuestionVariant::FirstWin {
                    (own.first()?.clone(), "first")
                } else {
                    (own.last()?.clone(), "most recently")
                };
                context.season = Some(answer.clone());
                context.year = season_event_year(&answer);
                (
                    format!("In which season did {player} {adverb} win the {award}?"),
                    answer.clone(),
                    unique_pool(&answer, other_seasons),
                )
            }
            QuestionVariant::WinCount => {
                let count = own.len() as i64;
                context.season = None;
                context.year = own.last().and_then(|s| season_event_year(s));
                (
                    format!("How many times has {player} won the {award}?"),
                    count.to_string(),
                    offset_distractors(count, COUNT_DELTAS, 1..=50),
                )
            }
        }
    } else {
        let answer = own.first()?.clone();
        (
            format!("In which season did {player} win the {award}?"),
            answer.clone(),
            unique_pool(&answer, other_seasons),
        )
    };

    if !enough(&distractors, QuestionType::AwardSeason) {
        return None;
    }
    Some(CandidateQuestion::new(QuestionType::AwardSeason, text, answer, distractors, context))
}

/// "Who won the award in season S?" Skipped when S had several winners.
pub fn winner(
    record: &ContentRecord,
    related: &[ContentRecord],
    ctx: &GeneratorContext<'_>,
    _rng: &mut StdRng,
) -> Option<CandidateQuestion> {
    let player = record.text("player")?;
    let season = record.text("season")?;
    let award = award_name(record, ctx);

    let winners_that_season = unique_pool(
        "",
        related
            .iter()
            .filter(|r| r.text("season").map(|s| same_option(&s, &season)).unwrap_or(false))
            .filter_map(|r| r.text("player")),
    );
    if winners_that_season.len() > 1 {
        return None;
    }

    let distractors = unique_pool(&player, related.iter().filter_map(|r| r.text("player")));
    if !enough(&distractors, QuestionType::AwardWinner) {
        return None;
    }
    let context = award_context(QuestionType::AwardWinner, record, ctx, &award);
    Some(CandidateQuestion::new(
        QuestionType::AwardWinner,
        format!("Who won the {award} in the {season} season?"),
        player,
        distractors,
        context,
    ))
}

/// "Which club was X playing for when they won the award in S?"
///
/// Country tokens in squad strings are never offered as clubs.
pub fn team(
    record: &ContentRecord,
    related: &[ContentRecord],
    ctx: &GeneratorContext<'_>,
    _rng: &mut StdRng,
) -> Option<CandidateQuestion> {
    let player = record.text("player")?;
    let season = record.text("season")?;
    let club = club_tokens(&record.text("squad")?).into_iter().next()?;
    let award = award_name(record, ctx);

    let distractors = unique_pool(
        &club,
        related
            .iter()
            .filter_map(|r| r.text("squad"))
            .flat_map(|squad| club_tokens(&squad)),
    );
    if !enough(&distractors, QuestionType::AwardTeam) {
        return None;
    }
    let context = award_context(QuestionType::AwardTeam, record, ctx, &award);
    Some(CandidateQuestion::new(
        QuestionType::AwardTeam,
        format!("Which club was {player} playing for when they won the {award} in {season}?"),
        club,
        distractors,
        context,
    ))
}

fn nationality_of(record: &ContentRecord) -> Option<String> {
    record
        .text("nationality")
        .filter(|n| is_country(n))
        .or_else(|| record.text("squad").and_then(|s| country_tokens(&s).into_iter().next()))
}

/// "Which country does X represent?" Club tokens are never offered as countries.
pub fn nationality(
    record: &ContentRecord,
    related: &[ContentRecord],
    ctx: &GeneratorContext<'_>,
    rng: &mut StdRng,
) -> Option<CandidateQuestion> {
    let player = record.text("player")?;
    let season = record.text("season")?;
    let answer = nationality_of(record)?;
    let award = award_name(record, ctx);

    let mut distractors = unique_pool(&answer, related.iter().filter_map(nationality_of));
    if distractors.len() < NATIONALITY_POOL {
        let mut padding: Vec<String> = COUNTRIES.iter().map(|c| c.to_string()).collect();
        padding.shuffle(rng);
        let needed = NATIONALITY_POOL - distractors.len();
        let extra = unique_pool(&answer, padding)
            .into_iter()
            .filter(|c| !distractors.iter().any(|d| same_option(d, c)))
            .take(needed)
            .collect::<Vec<_>>();
        distractors.extend(extra);
    }

    let context = award_context(QuestionType::AwardNationality, record, ctx, &award);
    Some(CandidateQuestion::new(
        QuestionType::AwardNationality,
        format!("Which country does {player}, winner of the {award} in {season}, represent?"),
        answer,
        distractors,
        context,
    ))
}

/// "How old was X when they won the award in S?"
pub fn age(
    record: &ContentRecord,
    _related: &[ContentRecord],
    ctx: &GeneratorContext<'_>,
    _rng: &mut StdRng,
) -> Option<CandidateQuestion> {
    let player = record.text("player")?;
    let season = record.text("season")?;
    let age = parse_leading_int(&record.text("age")?)?;
    if !(ctx.min_age..=ctx.max_age).contains(&age) {
        return None;
    }
    let award = award_name(record, ctx);

    let distractors = offset_distractors(age, AGE_DELTAS, ctx.min_age..=ctx.max_age);
    if !enough(&distractors, QuestionType::AwardAge) {
        return None;
    }
    let mut context = award_context(QuestionType::AwardAge, record, ctx, &award);
    context.has_exact_date = record.text("birth_date").is_some();
    Some(CandidateQuestion::new(
        QuestionType::AwardAge,
        format!("How old was {player} when they won the {award} in {season}?"),
        age.to_string(),
        distractors,
        context,
    ))
}
