//! Per-connection practice state: which mode is open, one controller per mode,
//! and the async drivers that talk to the content source.
//!
//! Drivers follow a fixed pattern: lock, begin (guarded), unlock, await the
//! source, lock again, finish. The practice lock is never held across a model
//! call, and it is always taken before the score lock.

use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::content::{ContentError, ContentSource};
use crate::domain::{Challenge, Mode};
use crate::puzzle::Side;
use crate::scoring::ScoreBoard;
use crate::session::builder::EvaluationRequest;
use crate::session::roleplay::TurnRequest;
use crate::session::{
  ConjugationSession, ErrorHuntSession, PuzzleSession, RoleplaySession, SentenceBuilderSession,
  SessionError, Ticket, TriggerSession, TriggerStage, VerbChoice,
};

/// A fetch that has been started under the lock but not yet awaited.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadJob {
  pub mode: Mode,
  pub ticket: Ticket,
}

#[derive(Debug, Default)]
pub struct Practice {
  mode: Mode,
  conjugation: ConjugationSession,
  trigger: TriggerSession,
  builder: SentenceBuilderSession,
  puzzle: PuzzleSession,
  error_hunt: ErrorHuntSession,
  roleplay: RoleplaySession,
}

impl Practice {
  pub fn mode(&self) -> Mode {
    self.mode
  }

  pub fn conjugation(&self) -> &ConjugationSession {
    &self.conjugation
  }

  pub fn trigger(&self) -> &TriggerSession {
    &self.trigger
  }

  pub fn builder(&self) -> &SentenceBuilderSession {
    &self.builder
  }

  pub fn puzzle(&self) -> &PuzzleSession {
    &self.puzzle
  }

  pub fn error_hunt(&self) -> &ErrorHuntSession {
    &self.error_hunt
  }

  pub fn roleplay(&self) -> &RoleplaySession {
    &self.roleplay
  }

  fn require(&self, mode: Mode) -> Result<(), SessionError> {
    match self.mode {
      m if m == mode => Ok(()),
      Mode::Home => Err(SessionError::NoActiveMode),
      other => Err(SessionError::NotAccepting(other.as_str())),
    }
  }

  /// Switch screens. Whatever the previous mode had in flight is orphaned.
  /// Returns true when the new mode wants a round loaded right away.
  pub fn navigate(&mut self, mode: Mode) -> bool {
    match self.mode {
      Mode::Home => {}
      Mode::ConjugationDojo => self.conjugation.abandon(),
      Mode::TriggerDetective => self.trigger.abandon(),
      Mode::SentenceBuilder => self.builder.abandon(),
      Mode::SyntaxPuzzle => self.puzzle.abandon(),
      Mode::ErrorHunter => self.error_hunt.abandon(),
      Mode::Roleplay => self.roleplay.abandon(),
    }
    info!(target: "session", from = self.mode.as_str(), to = mode.as_str(), "Navigate");
    self.mode = mode;
    !matches!(mode, Mode::Home | Mode::TriggerDetective)
  }

  /// The connection is gone: orphan whatever is in flight so late results
  /// neither change state nor award points.
  pub fn close(&mut self) {
    self.navigate(Mode::Home);
  }

  /// Start a fresh round in the open mode.
  pub fn begin_load(&mut self) -> Result<LoadJob, SessionError> {
    let ticket = match self.mode {
      Mode::Home => return Err(SessionError::NoActiveMode),
      Mode::ConjugationDojo => self.conjugation.begin_load()?,
      Mode::TriggerDetective => self.trigger.begin_load()?,
      Mode::SentenceBuilder => self.builder.begin_load()?,
      Mode::SyntaxPuzzle => self.puzzle.begin_load()?,
      Mode::ErrorHunter => self.error_hunt.begin_load()?,
      Mode::Roleplay => self.roleplay.begin_load()?,
    };
    Ok(LoadJob { mode: self.mode, ticket })
  }

  /// Hand a fetch result to the controller that asked for it. Returns false
  /// when the result was stale.
  pub fn finish_load(&mut self, mode: Mode, ticket: Ticket, result: Result<Challenge, ContentError>) -> bool {
    match (mode, result) {
      (Mode::ConjugationDojo, Ok(Challenge::Conjugation(c))) => self.conjugation.finish_load(ticket, Ok(c)),
      (Mode::ConjugationDojo, Err(e)) => self.conjugation.finish_load(ticket, Err(e)),
      (Mode::TriggerDetective, Ok(Challenge::Trigger(c))) => self.trigger.finish_load(ticket, Ok(c)),
      (Mode::TriggerDetective, Err(e)) => self.trigger.finish_load(ticket, Err(e)),
      (Mode::SentenceBuilder, Ok(Challenge::Sentence(c))) => self.builder.finish_load(ticket, Ok(c)),
      (Mode::SentenceBuilder, Err(e)) => self.builder.finish_load(ticket, Err(e)),
      (Mode::SyntaxPuzzle, Ok(Challenge::Puzzle(c))) => self.puzzle.finish_load(ticket, Ok(c)),
      (Mode::SyntaxPuzzle, Err(e)) => self.puzzle.finish_load(ticket, Err(e)),
      (Mode::ErrorHunter, Ok(Challenge::Error(c))) => self.error_hunt.finish_load(ticket, Ok(c)),
      (Mode::ErrorHunter, Err(e)) => self.error_hunt.finish_load(ticket, Err(e)),
      (Mode::Roleplay, Ok(Challenge::Roleplay(c))) => self.roleplay.finish_load(ticket, Ok(c)),
      (Mode::Roleplay, Err(e)) => self.roleplay.finish_load(ticket, Err(e)),
      (mode, Ok(other)) => {
        debug!(target: "session", requested = mode.as_str(), got = other.mode().as_str(), "Dropping mismatched challenge");
        false
      }
      (Mode::Home, Err(_)) => false,
    }
  }

  // --- Conjugation Dojo ---

  pub fn toggle_hint(&mut self) -> Result<bool, SessionError> {
    self.require(Mode::ConjugationDojo)?;
    self.conjugation.toggle_hint()
  }

  pub fn submit_conjugation(&mut self, answer: &str, score: &mut ScoreBoard) -> Result<bool, SessionError> {
    self.require(Mode::ConjugationDojo)?;
    self.conjugation.submit(answer, score)
  }

  // --- Trigger Detective ---

  pub fn concept_next(&mut self) -> Result<usize, SessionError> {
    self.require(Mode::TriggerDetective)?;
    Ok(self.trigger.next_card())
  }

  pub fn concept_prev(&mut self) -> Result<usize, SessionError> {
    self.require(Mode::TriggerDetective)?;
    Ok(self.trigger.prev_card())
  }

  /// Leaves the cards. The caller loads the first round.
  pub fn start_practice(&mut self) -> Result<(), SessionError> {
    self.require(Mode::TriggerDetective)?;
    if self.trigger.stage() == TriggerStage::Practice {
      return Err(SessionError::NotAccepting("already practicing"));
    }
    self.trigger.start_practice();
    Ok(())
  }

  pub fn back_to_learn(&mut self) -> Result<(), SessionError> {
    self.require(Mode::TriggerDetective)?;
    self.trigger.back_to_learn();
    Ok(())
  }

  pub fn select_trigger_option(&mut self, index: usize, score: &mut ScoreBoard) -> Result<bool, SessionError> {
    self.require(Mode::TriggerDetective)?;
    self.trigger.select(index, score)
  }

  // --- Sentence Builder ---

  pub fn choose_verb(&mut self, verb: &str) -> Result<VerbChoice, SessionError> {
    self.require(Mode::SentenceBuilder)?;
    self.builder.choose_verb(verb)
  }

  pub fn begin_evaluate(&mut self, text: &str) -> Result<EvaluationRequest, SessionError> {
    self.require(Mode::SentenceBuilder)?;
    self.builder.begin_evaluate(text)
  }

  // --- Syntax Puzzle ---

  pub fn move_token(&mut self, id: usize, from: Side) -> Result<(), SessionError> {
    self.require(Mode::SyntaxPuzzle)?;
    self.puzzle.move_token(id, from)
  }

  pub fn reset_tokens(&mut self) -> Result<(), SessionError> {
    self.require(Mode::SyntaxPuzzle)?;
    self.puzzle.reset()
  }

  pub fn submit_puzzle(&mut self, score: &mut ScoreBoard) -> Result<bool, SessionError> {
    self.require(Mode::SyntaxPuzzle)?;
    self.puzzle.submit(score)
  }

  // --- Error Hunter ---

  pub fn select_error_option(&mut self, id: i64, score: &mut ScoreBoard) -> Result<bool, SessionError> {
    self.require(Mode::ErrorHunter)?;
    self.error_hunt.select(id, score)
  }

  // --- Roleplay ---

  pub fn begin_roleplay_turn(&mut self, text: &str) -> Result<TurnRequest, SessionError> {
    self.require(Mode::Roleplay)?;
    self.roleplay.begin_turn(text)
  }
}

/// Ask the source for one round of the given mode.
pub async fn fetch_challenge<S: ContentSource>(source: &S, mode: Mode) -> Result<Challenge, ContentError> {
  match mode {
    Mode::ConjugationDojo => source.conjugation_challenge().await.map(Challenge::Conjugation),
    Mode::TriggerDetective => source.trigger_challenge().await.map(Challenge::Trigger),
    Mode::SentenceBuilder => source.sentence_scenario().await.map(Challenge::Sentence),
    Mode::SyntaxPuzzle => source.puzzle_challenge().await.map(Challenge::Puzzle),
    Mode::ErrorHunter => source.error_challenge().await.map(Challenge::Error),
    Mode::Roleplay => source.roleplay_start().await.map(Challenge::Roleplay),
    Mode::Home => Err(ContentError::Unavailable("home has no rounds".into())),
  }
}

/// Await the content for a started load and apply it. Returns false when the
/// learner moved on before it arrived and the result was dropped.
#[instrument(level = "info", skip(practice, source), fields(mode = job.mode.as_str()))]
pub async fn complete_load<S: ContentSource>(practice: &Mutex<Practice>, source: &S, job: LoadJob) -> bool {
  let result = fetch_challenge(source, job.mode).await;
  practice.lock().await.finish_load(job.mode, job.ticket, result)
}

/// Begin and complete a load in one go.
pub async fn load_round<S: ContentSource>(practice: &Mutex<Practice>, source: &S) -> Result<bool, SessionError> {
  let job = practice.lock().await.begin_load()?;
  Ok(complete_load(practice, source, job).await)
}

/// Phase 2 of the Sentence Builder: have the source judge the sentence.
#[instrument(level = "info", skip_all, fields(text_len = request.text.len()))]
pub async fn complete_evaluation<S: ContentSource>(
  practice: &Mutex<Practice>,
  source: &S,
  score: &Mutex<ScoreBoard>,
  request: EvaluationRequest,
) -> bool {
  let result = source.evaluate_sentence(&request.context, &request.trigger, &request.text).await;
  let mut p = practice.lock().await;
  let mut board = score.lock().await;
  p.builder.finish_evaluate(request.ticket, result, &mut board)
}

pub async fn evaluate_sentence<S: ContentSource>(
  practice: &Mutex<Practice>,
  source: &S,
  score: &Mutex<ScoreBoard>,
  text: &str,
) -> Result<bool, SessionError> {
  let request = practice.lock().await.begin_evaluate(text)?;
  Ok(complete_evaluation(practice, source, score, request).await)
}

/// Wait for the tutor's answer to a learner line.
#[instrument(level = "info", skip_all, fields(history = request.history.len()))]
pub async fn complete_roleplay_turn<S: ContentSource>(
  practice: &Mutex<Practice>,
  source: &S,
  request: TurnRequest,
) -> bool {
  let result = source.roleplay_turn(&request.history, &request.text).await;
  practice.lock().await.roleplay.finish_turn(request.ticket, result)
}

pub async fn roleplay_turn<S: ContentSource>(
  practice: &Mutex<Practice>,
  source: &S,
  text: &str,
) -> Result<bool, SessionError> {
  let request = practice.lock().await.begin_roleplay_turn(text)?;
  Ok(complete_roleplay_turn(practice, source, request).await)
}
