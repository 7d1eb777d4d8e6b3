//! Status and engine classification from title words.
//!
//! Each vocabulary is matched independently and the last matching word wins.
//! Status words only count in the prefix and bracket groups, never in the
//! game name itself.

use crate::models::{Engine, Status};
use crate::parser::version::bracket_groups;

/// Split a title into lower-cased words, keeping in-word apostrophes.
pub fn tokenize(title: &str) -> Vec<String> {
    title
        .replace(['’', '‘'], "'")
        .to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|t| t.trim_matches('\''))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// The parts of a title that can carry a status marker: the `X - Y - `
/// prefix ahead of the name, then every bracket group.
fn status_scope(title: &str) -> String {
    let head = title.split('[').next().unwrap_or_default();
    let prefix = head.rsplit_once(" - ").map(|(p, _)| p).unwrap_or_default();

    let mut scope = prefix.to_string();
    for group in bracket_groups(title) {
        scope.push(' ');
        scope.push_str(&group);
    }
    scope
}

/// Classify status and engine; unmatched vocabularies keep their defaults.
pub fn classify(title: &str) -> (Status, Engine) {
    let status = tokenize(&status_scope(title))
        .iter()
        .filter_map(|token| Status::from_token(token))
        .last();

    let tokens = tokenize(title);
    let mut engine = None;
    for (i, token) in tokens.iter().enumerate() {
        // Two-word engine names ("rpg maker", "unreal engine").
        let matched = Engine::from_token(token).or_else(|| {
            tokens
                .get(i + 1)
                .filter(|next| token == "rpg" && next.as_str() == "maker")
                .map(|_| Engine::Rpgm)
        });
        if let Some(e) = matched {
            engine = Some(e);
        }
    }

    (status.unwrap_or_default(), engine.unwrap_or_default())
}
