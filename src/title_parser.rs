use crate::error::{TitleField, TitleParseError};
use crate::model::GameNumber;

/// Series prefix used by the recap channel, e.g. `LFR15 - Game 15 - ...`.
pub const TIER_PREFIX: &str = "LFR";

const GAME_MARKER: &str = "Game ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTitle {
    pub tier: String,
    pub game_number: GameNumber,
}

pub fn parse_title(title: &str) -> Result<ParsedTitle, TitleParseError> {
    parse_title_with_prefix(title, TIER_PREFIX)
}

pub fn parse_title_with_prefix(title: &str, prefix: &str) -> Result<ParsedTitle, TitleParseError> {
    let fail = |field| TitleParseError {
        field,
        title: title.to_string(),
    };

    let tier = title
        .trim_start()
        .strip_prefix(prefix)
        .map(|rest| segment(rest, |ch| ch == '-' || ch.is_whitespace()))
        .filter(|tier| is_digits(tier))
        .ok_or_else(|| fail(TitleField::Tier))?;

    let game_number = title
        .split_once(GAME_MARKER)
        .map(|(_, rest)| segment(rest, |ch| ch == '-'))
        .filter(|raw| is_digits(raw))
        .and_then(|raw| raw.parse::<GameNumber>().ok())
        .filter(|n| *n > 0)
        .ok_or_else(|| fail(TitleField::GameNumber))?;

    Ok(ParsedTitle {
        tier: tier.to_string(),
        game_number,
    })
}

fn segment(rest: &str, stop: impl Fn(char) -> bool) -> &str {
    rest.split(stop).next().unwrap_or_default().trim()
}

fn is_digits(raw: &str) -> bool {
    !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit())
}
