//! Guess-vs-answer comparison.
//!
//! Matching is literal: lowercase both sides, trim surrounding whitespace,
//! compare for equality. The deadline sentinels are distinct strings, so a
//! timed-out guess can never match a timed-out answer.

/// Recorded for a player who let the answer deadline pass.
pub const NO_ANSWER: &str = "(No answer)";

/// Recorded for a player who let the guess deadline pass.
pub const NO_GUESS: &str = "(No guess)";

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Whether a guess matches the partner's answer. Absent values never match.
pub fn is_match(guess: Option<&str>, answer: Option<&str>) -> bool {
    match (guess, answer) {
        (Some(g), Some(a)) => normalize(g) == normalize(a),
        _ => false,
    }
}
