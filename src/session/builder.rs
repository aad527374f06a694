//! Sentence Builder: pick the verb that fits, then finish the sentence.
//!
//! Phase 1 is checked locally. Phase 2 is judged by the content source, so it
//! uses the same ticket discipline as loading: `begin_evaluate` marks the
//! request in flight, `finish_evaluate` applies only a current result.

use serde::Serialize;
use tracing::info;

use crate::content::ContentError;
use crate::domain::{Mode, SentenceChallenge, SentenceEvaluation};
use crate::evaluate::verb_choice_is_correct;
use crate::scoring::ScoreBoard;

use super::{Phase, Round, SessionError, Ticket};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BuilderStep {
  #[default]
  ChooseVerb,
  Construct,
  Evaluating,
  Feedback,
}

#[derive(Debug, PartialEq, Eq)]
pub enum VerbChoice {
  Accepted,
  /// Wrong verb; nothing changed and the learner may pick again.
  Rejected,
}

/// What the driver needs to ask for a judgment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationRequest {
  pub ticket: Ticket,
  pub context: String,
  pub trigger: String,
  pub text: String,
}

#[derive(Debug, Default)]
pub struct SentenceBuilderSession {
  round: Round<SentenceChallenge>,
  step: BuilderStep,
  chosen_verb: Option<String>,
  attempt: Option<String>,
  evaluation: Option<SentenceEvaluation>,
}

impl SentenceBuilderSession {
  pub fn round(&self) -> &Round<SentenceChallenge> {
    &self.round
  }

  pub fn step(&self) -> BuilderStep {
    self.step
  }

  pub fn chosen_verb(&self) -> Option<&str> {
    self.chosen_verb.as_deref()
  }

  pub fn attempt(&self) -> Option<&str> {
    self.attempt.as_deref()
  }

  pub fn evaluation(&self) -> Option<&SentenceEvaluation> {
    self.evaluation.as_ref()
  }

  fn clear(&mut self) {
    self.step = BuilderStep::ChooseVerb;
    self.chosen_verb = None;
    self.attempt = None;
    self.evaluation = None;
  }

  /// Refused while a judgment is outstanding; navigation uses `abandon`.
  pub fn begin_load(&mut self) -> Result<Ticket, SessionError> {
    if self.step == BuilderStep::Evaluating {
      return Err(SessionError::Busy);
    }
    let ticket = self.round.begin_load()?;
    self.clear();
    Ok(ticket)
  }

  pub fn finish_load(&mut self, ticket: Ticket, result: Result<SentenceChallenge, ContentError>) -> bool {
    self.round.finish_load(ticket, result)
  }

  pub fn abandon(&mut self) {
    self.round.abandon();
    self.clear();
  }

  pub fn choose_verb(&mut self, verb: &str) -> Result<VerbChoice, SessionError> {
    let challenge = self.round.active()?;
    if self.step != BuilderStep::ChooseVerb {
      return Err(SessionError::NotAccepting("building the sentence"));
    }
    if !challenge.verb_options.iter().any(|v| v == verb) {
      return Err(SessionError::UnknownOption(verb.to_string()));
    }
    if !verb_choice_is_correct(challenge, verb) {
      info!(target: "session", mode = "sentence_builder", %verb, "Verb rejected");
      return Ok(VerbChoice::Rejected);
    }
    self.chosen_verb = Some(verb.to_string());
    self.step = BuilderStep::Construct;
    Ok(VerbChoice::Accepted)
  }

  pub fn begin_evaluate(&mut self, text: &str) -> Result<EvaluationRequest, SessionError> {
    let challenge = self.round.active()?;
    match self.step {
      BuilderStep::Construct => {}
      BuilderStep::Evaluating => return Err(SessionError::Busy),
      BuilderStep::ChooseVerb => return Err(SessionError::NotAccepting("choosing a verb")),
      BuilderStep::Feedback => return Err(SessionError::NotAccepting("showing feedback")),
    }
    let text = text.trim();
    if text.is_empty() {
      return Err(SessionError::EmptyInput);
    }
    let request = EvaluationRequest {
      ticket: self.round.ticket(),
      context: challenge.context.clone(),
      trigger: challenge.trigger.clone(),
      text: text.to_string(),
    };
    self.attempt = Some(request.text.clone());
    self.step = BuilderStep::Evaluating;
    Ok(request)
  }

  /// Returns false when the round moved on while the judgment was pending.
  pub fn finish_evaluate(
    &mut self,
    ticket: Ticket,
    result: Result<SentenceEvaluation, ContentError>,
    score: &mut ScoreBoard,
  ) -> bool {
    if !self.round.is_current(ticket) || self.step != BuilderStep::Evaluating || self.round.phase() != Phase::Active {
      return false;
    }
    self.step = BuilderStep::Feedback;
    match result {
      Ok(evaluation) => {
        let correct = evaluation.is_correct;
        info!(target: "session", mode = "sentence_builder", %correct, "Sentence judged");
        self.evaluation = Some(evaluation);
        self.round.settle(correct);
        if correct {
          score.add_points(Mode::SentenceBuilder.reward());
        }
      }
      Err(e) => self.round.fail(e.to_string()),
    }
    true
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::scoring::MemoryStore;

  fn challenge() -> SentenceChallenge {
    SentenceChallenge {
      context: "Tu amigo está enfermo.".into(),
      trigger: "Espero que...".into(),
      verb_options: vec!["mejorarse".into(), "bailar".into(), "cocinar".into()],
      correct_verb_infinitive: "mejorarse".into(),
      target_translation: "I hope you get better.".into(),
    }
  }

  fn loaded() -> SentenceBuilderSession {
    let mut s = SentenceBuilderSession::default();
    let t = s.begin_load().unwrap();
    s.finish_load(t, Ok(challenge()));
    s
  }

  fn board() -> ScoreBoard {
    ScoreBoard::open(Box::new(MemoryStore::default()))
  }

  #[test]
  fn wrong_verb_leaves_everything_unchanged() {
    let score = board();
    let mut s = loaded();
    for verb in ["bailar", "cocinar"] {
      assert_eq!(s.choose_verb(verb), Ok(VerbChoice::Rejected));
      assert_eq!(s.step(), BuilderStep::ChooseVerb);
      assert_eq!(s.chosen_verb(), None);
    }
    assert_eq!(s.round().phase(), Phase::Active);
    assert_eq!(score.summary().points, 0);
  }

  #[test]
  fn verb_outside_the_options_is_invalid() {
    let mut s = loaded();
    assert!(matches!(s.choose_verb("correr"), Err(SessionError::UnknownOption(_))));
  }

  #[test]
  fn full_round_scores_twenty_five() {
    let mut score = board();
    let mut s = loaded();
    assert_eq!(s.choose_verb("mejorarse"), Ok(VerbChoice::Accepted));
    assert_eq!(s.begin_evaluate(""), Err(SessionError::EmptyInput));
    let req = s.begin_evaluate("te mejores pronto").unwrap();
    assert_eq!(req.trigger, "Espero que...");
    assert_eq!(s.begin_evaluate("otra vez").unwrap_err(), SessionError::Busy);

    let verdict = SentenceEvaluation {
      is_correct: true,
      feedback: "¡Perfecto!".into(),
      correction: "Espero que te mejores pronto.".into(),
    };
    assert!(s.finish_evaluate(req.ticket, Ok(verdict), &mut score));
    assert_eq!(s.step(), BuilderStep::Feedback);
    assert_eq!(s.round().phase(), Phase::AnsweredCorrect);
    assert_eq!(score.summary().points, 25);
  }

  #[test]
  fn failed_judgment_offers_reload_only() {
    let mut score = board();
    let mut s = loaded();
    s.choose_verb("mejorarse").unwrap();
    let req = s.begin_evaluate("te mejores").unwrap();
    assert!(s.finish_evaluate(req.ticket, Err(ContentError::Unavailable("timeout".into())), &mut score));
    assert_eq!(s.round().phase(), Phase::Failed);
    assert_eq!(score.summary().points, 0);
    assert!(s.begin_load().is_ok());
    assert_eq!(s.step(), BuilderStep::ChooseVerb);
  }

  #[test]
  fn judgment_for_an_old_round_is_ignored() {
    let mut score = board();
    let mut s = loaded();
    s.choose_verb("mejorarse").unwrap();
    let req = s.begin_evaluate("te mejores").unwrap();
    s.abandon();
    let verdict = SentenceEvaluation { is_correct: true, feedback: String::new(), correction: String::new() };
    assert!(!s.finish_evaluate(req.ticket, Ok(verdict), &mut score));
    assert_eq!(score.summary().points, 0);
  }

  #[test]
  fn no_reload_while_a_judgment_is_pending() {
    let mut score = board();
    let mut s = loaded();
    s.choose_verb("mejorarse").unwrap();
    let req = s.begin_evaluate("te mejores").unwrap();
    assert_eq!(s.begin_load(), Err(SessionError::Busy));
    assert_eq!(s.step(), BuilderStep::Evaluating);

    let verdict = SentenceEvaluation { is_correct: false, feedback: "Casi.".into(), correction: String::new() };
    assert!(s.finish_evaluate(req.ticket, Ok(verdict), &mut score));
    assert!(s.begin_load().is_ok());
  }
}
