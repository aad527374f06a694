//! Domain models: practice modes, per-mode challenge records and their
//! boundary validation.
//!
//! Records arrive from the content source as camelCase JSON. They are checked
//! once with `validate()` and then treated as immutable for the whole round.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Which screen the learner is on.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
  #[default]
  Home,
  ConjugationDojo,
  TriggerDetective,
  SentenceBuilder,
  SyntaxPuzzle,
  ErrorHunter,
  #[serde(rename = "ROLEPLAY_SCENARIO")]
  Roleplay,
}

impl Mode {
  /// Fixed points awarded for one correct round in this mode.
  pub fn reward(self) -> u32 {
    match self {
      Mode::ConjugationDojo => 10,
      Mode::TriggerDetective => 15,
      Mode::ErrorHunter => 15,
      Mode::SyntaxPuzzle => 20,
      Mode::SentenceBuilder => 25,
      Mode::Roleplay | Mode::Home => 0,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Mode::Home => "home",
      Mode::ConjugationDojo => "conjugation_dojo",
      Mode::TriggerDetective => "trigger_detective",
      Mode::SentenceBuilder => "sentence_builder",
      Mode::SyntaxPuzzle => "syntax_puzzle",
      Mode::ErrorHunter => "error_hunter",
      Mode::Roleplay => "roleplay",
    }
  }
}

fn default_mood() -> String {
  "Subjuntivo".into()
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConjugationChallenge {
  pub verb: String,
  #[serde(default = "default_mood")]
  pub mood: String,
  pub person: String, // "Yo", "Nosotros", ...
  pub tense: String,  // "Presente", "Imperfecto"
  pub correct_form: String,
  #[serde(default)]
  pub hint: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TriggerOption {
  pub text: String,
  pub is_correct: bool,
  #[serde(default)]
  pub explanation: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TriggerChallenge {
  pub sentence_start: String,
  pub trigger_type: String, // Duda, Emoción, Certeza...
  pub options: Vec<TriggerOption>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SentenceChallenge {
  pub context: String,
  pub trigger: String, // "Espero que..."
  pub verb_options: Vec<String>,
  pub correct_verb_infinitive: String,
  #[serde(default)]
  pub target_translation: String,
}

/// External judgment of a free-text sentence completion.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SentenceEvaluation {
  pub is_correct: bool,
  #[serde(default)]
  pub feedback: String,
  #[serde(default)]
  pub correction: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleChallenge {
  pub original_sentence: String,
  pub scrambled_words: Vec<String>,
  #[serde(default)]
  pub translation: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorOption {
  pub id: i64,
  pub text: String,
  pub is_correct: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorChallenge {
  pub context: String,
  pub options: Vec<ErrorOption>,
  #[serde(default)]
  pub explanation: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoleplayOpening {
  pub scenario: String,
  pub teacher_prompt: String,
}

/// One round of content, keyed by the mode that requested it.
#[derive(Clone, Debug, PartialEq)]
pub enum Challenge {
  Conjugation(ConjugationChallenge),
  Trigger(TriggerChallenge),
  Sentence(SentenceChallenge),
  Puzzle(PuzzleChallenge),
  Error(ErrorChallenge),
  Roleplay(RoleplayOpening),
}

impl Challenge {
  pub fn mode(&self) -> Mode {
    match self {
      Challenge::Conjugation(_) => Mode::ConjugationDojo,
      Challenge::Trigger(_) => Mode::TriggerDetective,
      Challenge::Sentence(_) => Mode::SentenceBuilder,
      Challenge::Puzzle(_) => Mode::SyntaxPuzzle,
      Challenge::Error(_) => Mode::ErrorHunter,
      Challenge::Roleplay(_) => Mode::Roleplay,
    }
  }
}

/// Shape check applied at the content-source boundary.
pub trait Validate {
  fn validate(&self) -> Result<(), String>;
}

fn require(field: &str, value: &str) -> Result<(), String> {
  if value.trim().is_empty() {
    Err(format!("missing or empty field `{field}`"))
  } else {
    Ok(())
  }
}

impl Validate for ConjugationChallenge {
  fn validate(&self) -> Result<(), String> {
    require("verb", &self.verb)?;
    require("person", &self.person)?;
    require("tense", &self.tense)?;
    require("correctForm", &self.correct_form)
  }
}

impl Validate for TriggerChallenge {
  fn validate(&self) -> Result<(), String> {
    require("sentenceStart", &self.sentence_start)?;
    if self.options.len() < 2 {
      return Err(format!("expected at least 2 options, got {}", self.options.len()));
    }
    if self.options.iter().any(|o| o.text.trim().is_empty()) {
      return Err("option with empty text".into());
    }
    if !self.options.iter().any(|o| o.is_correct) {
      return Err("no option is marked correct".into());
    }
    Ok(())
  }
}

impl Validate for SentenceChallenge {
  fn validate(&self) -> Result<(), String> {
    require("context", &self.context)?;
    require("trigger", &self.trigger)?;
    require("correctVerbInfinitive", &self.correct_verb_infinitive)?;
    if self.verb_options.len() != 3 {
      return Err(format!("expected 3 verb options, got {}", self.verb_options.len()));
    }
    if !self.verb_options.iter().any(|v| v == &self.correct_verb_infinitive) {
      return Err("correct verb is not among the options".into());
    }
    Ok(())
  }
}

impl Validate for SentenceEvaluation {
  fn validate(&self) -> Result<(), String> {
    Ok(())
  }
}

impl Validate for PuzzleChallenge {
  fn validate(&self) -> Result<(), String> {
    require("originalSentence", &self.original_sentence)?;
    if self.scrambled_words.is_empty() {
      return Err("scrambledWords is empty".into());
    }
    if self.scrambled_words.iter().any(|w| w.trim().is_empty()) {
      return Err("scrambledWords contains an empty word".into());
    }
    Ok(())
  }
}

impl Validate for ErrorChallenge {
  fn validate(&self) -> Result<(), String> {
    require("context", &self.context)?;
    if self.options.len() < 2 {
      return Err(format!("expected at least 2 options, got {}", self.options.len()));
    }
    let correct = self.options.iter().filter(|o| o.is_correct).count();
    if correct != 1 {
      return Err(format!("expected exactly one correct option, got {correct}"));
    }
    let ids: HashSet<i64> = self.options.iter().map(|o| o.id).collect();
    if ids.len() != self.options.len() {
      return Err("duplicate option ids".into());
    }
    Ok(())
  }
}

impl Validate for RoleplayOpening {
  fn validate(&self) -> Result<(), String> {
    require("scenario", &self.scenario)?;
    require("teacherPrompt", &self.teacher_prompt)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn error_challenge(flags: &[(i64, bool)]) -> ErrorChallenge {
    ErrorChallenge {
      context: "Tu amiga busca piso.".into(),
      options: flags
        .iter()
        .map(|(id, ok)| ErrorOption { id: *id, text: format!("opción {id}"), is_correct: *ok })
        .collect(),
      explanation: String::new(),
    }
  }

  #[test]
  fn conjugation_parses_from_camel_case() {
    let json = r#"{"verb":"tener","person":"Nosotros","tense":"Presente","correctForm":"tengamos","hint":"<b>teng-</b>"}"#;
    let c: ConjugationChallenge = serde_json::from_str(json).unwrap();
    assert_eq!(c.correct_form, "tengamos");
    assert_eq!(c.mood, "Subjuntivo");
    assert!(c.validate().is_ok());
  }

  #[test]
  fn missing_required_field_is_a_parse_error() {
    let json = r#"{"verb":"tener","person":"Nosotros","tense":"Presente"}"#;
    assert!(serde_json::from_str::<ConjugationChallenge>(json).is_err());
  }

  #[test]
  fn sentence_scenario_needs_three_verbs_including_the_answer() {
    let mut s = SentenceChallenge {
      context: "Tu amigo está enfermo.".into(),
      trigger: "Espero que...".into(),
      verb_options: vec!["mejorarse".into(), "comer".into(), "saltar".into()],
      correct_verb_infinitive: "mejorarse".into(),
      target_translation: "I hope you get better".into(),
    };
    assert!(s.validate().is_ok());
    s.correct_verb_infinitive = "dormir".into();
    assert!(s.validate().is_err());
    s.verb_options.pop();
    assert!(s.validate().is_err());
  }

  #[test]
  fn error_challenge_requires_exactly_one_correct_and_unique_ids() {
    assert!(error_challenge(&[(1, true), (2, false)]).validate().is_ok());
    assert!(error_challenge(&[(1, true), (2, true)]).validate().is_err());
    assert!(error_challenge(&[(1, false), (2, false)]).validate().is_err());
    assert!(error_challenge(&[(1, true), (1, false)]).validate().is_err());
    assert!(error_challenge(&[(1, true)]).validate().is_err());
  }

  #[test]
  fn trigger_challenge_needs_a_correct_option() {
    let t = TriggerChallenge {
      sentence_start: "No creo que ___ verdad.".into(),
      trigger_type: "Duda".into(),
      options: vec![
        TriggerOption { text: "es".into(), is_correct: false, explanation: String::new() },
        TriggerOption { text: "sea".into(), is_correct: false, explanation: String::new() },
      ],
    };
    assert!(t.validate().is_err());
  }

  #[test]
  fn rewards_are_fixed_per_mode() {
    assert_eq!(Mode::ConjugationDojo.reward(), 10);
    assert_eq!(Mode::TriggerDetective.reward(), 15);
    assert_eq!(Mode::ErrorHunter.reward(), 15);
    assert_eq!(Mode::SyntaxPuzzle.reward(), 20);
    assert_eq!(Mode::SentenceBuilder.reward(), 25);
    assert_eq!(Mode::Roleplay.reward(), 0);
  }

  #[test]
  fn mode_wire_names_match_the_frontend_ids() {
    assert_eq!(serde_json::to_string(&Mode::ConjugationDojo).unwrap(), "\"CONJUGATION_DOJO\"");
    assert_eq!(serde_json::to_string(&Mode::Roleplay).unwrap(), "\"ROLEPLAY_SCENARIO\"");
    let m: Mode = serde_json::from_str("\"SYNTAX_PUZZLE\"").unwrap();
    assert_eq!(m, Mode::SyntaxPuzzle);
  }
}
