//! The content source contract: where challenges and free-text judgments
//! come from.
//!
//! Every call either yields a validated record or fails once. Network failures
//! and unusable payloads are distinct here for logging, but session
//! controllers treat both as "fetch failed".

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{
  ConjugationChallenge, ErrorChallenge, PuzzleChallenge, RoleplayOpening, SentenceChallenge,
  SentenceEvaluation, TriggerChallenge,
};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ContentError {
  /// Network, HTTP or model failure; also used when no model is configured.
  #[error("content source unavailable: {0}")]
  Unavailable(String),
  /// Payload did not parse or failed validation.
  #[error("malformed content: {0}")]
  Malformed(String),
}

/// Who said a line in a roleplay conversation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
  Tutor,
  Learner,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
  pub speaker: Speaker,
  pub text: String,
}

impl Turn {
  pub fn tutor(text: impl Into<String>) -> Self {
    Self { speaker: Speaker::Tutor, text: text.into() }
  }

  pub fn learner(text: impl Into<String>) -> Self {
    Self { speaker: Speaker::Learner, text: text.into() }
  }
}

/// Async provider of practice content. Futures must be `Send` so that
/// drivers can run inside spawned tasks.
pub trait ContentSource: Send + Sync {
  fn conjugation_challenge(&self) -> impl Future<Output = Result<ConjugationChallenge, ContentError>> + Send;

  fn trigger_challenge(&self) -> impl Future<Output = Result<TriggerChallenge, ContentError>> + Send;

  fn sentence_scenario(&self) -> impl Future<Output = Result<SentenceChallenge, ContentError>> + Send;

  fn evaluate_sentence(
    &self,
    context: &str,
    trigger: &str,
    text: &str,
  ) -> impl Future<Output = Result<SentenceEvaluation, ContentError>> + Send;

  fn puzzle_challenge(&self) -> impl Future<Output = Result<PuzzleChallenge, ContentError>> + Send;

  fn error_challenge(&self) -> impl Future<Output = Result<ErrorChallenge, ContentError>> + Send;

  fn roleplay_start(&self) -> impl Future<Output = Result<RoleplayOpening, ContentError>> + Send;

  /// `history` is everything said so far, oldest first; `text` is the new
  /// learner line. Returns the tutor's reply.
  fn roleplay_turn(
    &self,
    history: &[Turn],
    text: &str,
  ) -> impl Future<Output = Result<String, ContentError>> + Send;
}

const NOT_CONFIGURED: &str = "no model configured (set OPENAI_API_KEY)";

fn not_configured<T>() -> Result<T, ContentError> {
  Err(ContentError::Unavailable(NOT_CONFIGURED.into()))
}

/// An absent source fails every call, which drives controllers to their
/// retry state instead of inventing content.
impl<S: ContentSource> ContentSource for Option<S> {
  async fn conjugation_challenge(&self) -> Result<ConjugationChallenge, ContentError> {
    match self {
      Some(s) => s.conjugation_challenge().await,
      None => not_configured(),
    }
  }

  async fn trigger_challenge(&self) -> Result<TriggerChallenge, ContentError> {
    match self {
      Some(s) => s.trigger_challenge().await,
      None => not_configured(),
    }
  }

  async fn sentence_scenario(&self) -> Result<SentenceChallenge, ContentError> {
    match self {
      Some(s) => s.sentence_scenario().await,
      None => not_configured(),
    }
  }

  async fn evaluate_sentence(&self, context: &str, trigger: &str, text: &str) -> Result<SentenceEvaluation, ContentError> {
    match self {
      Some(s) => s.evaluate_sentence(context, trigger, text).await,
      None => not_configured(),
    }
  }

  async fn puzzle_challenge(&self) -> Result<PuzzleChallenge, ContentError> {
    match self {
      Some(s) => s.puzzle_challenge().await,
      None => not_configured(),
    }
  }

  async fn error_challenge(&self) -> Result<ErrorChallenge, ContentError> {
    match self {
      Some(s) => s.error_challenge().await,
      None => not_configured(),
    }
  }

  async fn roleplay_start(&self) -> Result<RoleplayOpening, ContentError> {
    match self {
      Some(s) => s.roleplay_start().await,
      None => not_configured(),
    }
  }

  async fn roleplay_turn(&self, history: &[Turn], text: &str) -> Result<String, ContentError> {
    match self {
      Some(s) => s.roleplay_turn(history, text).await,
      None => not_configured(),
    }
  }
}
