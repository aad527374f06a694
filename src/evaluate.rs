//! Local answer checks, one per mode.
//!
//! Every function here is pure. The only judgment that cannot be made locally
//! (free-text sentence completion in the Sentence Builder) goes through
//! `ContentSource::evaluate_sentence` instead.

use crate::domain::{ConjugationChallenge, ErrorChallenge, PuzzleChallenge, SentenceChallenge, TriggerChallenge};

/// Punctuation ignored by the lenient puzzle comparison.
const PUZZLE_PUNCTUATION: [char; 6] = ['.', ',', '!', '¡', '?', '¿'];

/// Case-insensitive, whitespace-trimmed equality of two conjugated forms.
pub fn conjugation_matches(expected: &str, answer: &str) -> bool {
  expected.trim().to_lowercase() == answer.trim().to_lowercase()
}

pub fn conjugation_is_correct(challenge: &ConjugationChallenge, answer: &str) -> bool {
  conjugation_matches(&challenge.correct_form, answer)
}

/// `None` when the index does not name an option.
pub fn trigger_option_is_correct(challenge: &TriggerChallenge, index: usize) -> Option<bool> {
  challenge.options.get(index).map(|o| o.is_correct)
}

/// `None` when no option carries this id.
pub fn error_option_is_correct(challenge: &ErrorChallenge, id: i64) -> Option<bool> {
  challenge.options.iter().find(|o| o.id == id).map(|o| o.is_correct)
}

/// Phase 1 of the Sentence Builder: exact identity with the expected infinitive.
pub fn verb_choice_is_correct(challenge: &SentenceChallenge, verb: &str) -> bool {
  challenge.correct_verb_infinitive == verb
}

fn normalize_sentence(s: &str) -> String {
  s.chars()
    .filter(|c| !PUZZLE_PUNCTUATION.contains(c))
    .collect::<String>()
    .trim()
    .to_lowercase()
}

/// Tokens are joined with single spaces. Exact equality wins first; otherwise
/// both sides are compared without `. , ! ¡ ? ¿` and case-folded.
pub fn puzzle_matches<S: AsRef<str>>(original: &str, tokens: &[S]) -> bool {
  let joined = tokens.iter().map(|t| t.as_ref()).collect::<Vec<_>>().join(" ");
  joined == original || normalize_sentence(&joined) == normalize_sentence(original)
}

pub fn puzzle_is_correct<S: AsRef<str>>(challenge: &PuzzleChallenge, tokens: &[S]) -> bool {
  puzzle_matches(&challenge.original_sentence, tokens)
}
