//! Roleplay: open conversation with the tutor inside a generated scenario.
//! Never scores.

use tracing::{info, warn};

use crate::content::{ContentError, Turn};
use crate::domain::RoleplayOpening;

use super::{Round, SessionError, Ticket};

/// Reply shown when the tutor answers with nothing.
const EMPTY_REPLY: &str = "...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnRequest {
  pub ticket: Ticket,
  pub history: Vec<Turn>,
  pub text: String,
}

#[derive(Debug, Default)]
pub struct RoleplaySession {
  round: Round<RoleplayOpening>,
  /// What the learner sees.
  transcript: Vec<Turn>,
  /// What the tutor is given: the opening framing plus completed exchanges.
  history: Vec<Turn>,
  pending: Option<String>,
  last_error: Option<String>,
}

impl RoleplaySession {
  pub fn round(&self) -> &Round<RoleplayOpening> {
    &self.round
  }

  pub fn transcript(&self) -> &[Turn] {
    &self.transcript
  }

  pub fn is_waiting(&self) -> bool {
    self.pending.is_some()
  }

  pub fn last_error(&self) -> Option<&str> {
    self.last_error.as_deref()
  }

  fn clear(&mut self) {
    self.transcript.clear();
    self.history.clear();
    self.pending = None;
    self.last_error = None;
  }

  pub fn begin_load(&mut self) -> Result<Ticket, SessionError> {
    if self.pending.is_some() {
      return Err(SessionError::Busy);
    }
    let ticket = self.round.begin_load()?;
    self.clear();
    Ok(ticket)
  }

  pub fn finish_load(&mut self, ticket: Ticket, result: Result<RoleplayOpening, ContentError>) -> bool {
    if !self.round.finish_load(ticket, result) {
      return false;
    }
    if let Some(opening) = self.round.challenge() {
      self.history = vec![
        Turn::learner(format!(
          "Vamos a hacer un roleplay. Escenario: {}. Tú empieza.",
          opening.scenario
        )),
        Turn::tutor(opening.teacher_prompt.clone()),
      ];
      self.transcript = vec![Turn::tutor(opening.teacher_prompt.clone())];
    }
    true
  }

  pub fn abandon(&mut self) {
    self.round.abandon();
    self.clear();
  }

  pub fn begin_turn(&mut self, text: &str) -> Result<TurnRequest, SessionError> {
    self.round.active()?;
    if self.pending.is_some() {
      return Err(SessionError::Busy);
    }
    let text = text.trim();
    if text.is_empty() {
      return Err(SessionError::EmptyInput);
    }
    self.transcript.push(Turn::learner(text));
    self.pending = Some(text.to_string());
    self.last_error = None;
    Ok(TurnRequest { ticket: self.round.ticket(), history: self.history.clone(), text: text.to_string() })
  }

  /// A failed turn keeps the transcript and frees the conversation for
  /// another try. Returns false for a reply to an abandoned conversation.
  pub fn finish_turn(&mut self, ticket: Ticket, result: Result<String, ContentError>) -> bool {
    if !self.round.is_current(ticket) {
      return false;
    }
    let Some(sent) = self.pending.take() else {
      return false;
    };
    match result {
      Ok(reply) => {
        let reply = if reply.trim().is_empty() { EMPTY_REPLY.to_string() } else { reply };
        info!(target: "session", mode = "roleplay", turns = self.transcript.len() + 1, "Tutor replied");
        self.history.push(Turn::learner(sent));
        self.history.push(Turn::tutor(reply.clone()));
        self.transcript.push(Turn::tutor(reply));
      }
      Err(e) => {
        warn!(target: "session", mode = "roleplay", error = %e, "Tutor turn failed");
        self.last_error = Some(e.to_string());
      }
    }
    true
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::content::Speaker;

  fn loaded() -> RoleplaySession {
    let mut s = RoleplaySession::default();
    let t = s.begin_load().unwrap();
    s.finish_load(
      t,
      Ok(RoleplayOpening {
        scenario: "Planear una fiesta sorpresa".into(),
        teacher_prompt: "¿Qué quieres que traigan los invitados?".into(),
      }),
    );
    s
  }

  #[test]
  fn opening_seeds_history_and_transcript() {
    let s = loaded();
    assert_eq!(s.transcript().len(), 1);
    assert_eq!(s.transcript()[0].speaker, Speaker::Tutor);
  }

  #[test]
  fn one_turn_at_a_time() {
    let mut s = loaded();
    let req = s.begin_turn("Quiero que traigan tarta.").unwrap();
    assert_eq!(req.history.len(), 2);
    assert!(req.history[0].text.contains("fiesta sorpresa"));
    assert_eq!(s.begin_turn("y globos"), Err(SessionError::Busy));
    assert!(s.finish_turn(req.ticket, Ok("¡Qué buena idea!".into())));
    assert_eq!(s.transcript().len(), 3);
    let next = s.begin_turn("Ojalá venga Ana.").unwrap();
    assert_eq!(next.history.len(), 4);
  }

  #[test]
  fn new_scenario_waits_for_the_tutor() {
    let mut s = loaded();
    let req = s.begin_turn("Quiero que traigan tarta.").unwrap();
    assert_eq!(s.begin_load(), Err(SessionError::Busy));
    assert_eq!(s.transcript().len(), 2);
    assert!(s.finish_turn(req.ticket, Ok("Perfecto.".into())));
    assert!(s.begin_load().is_ok());
    assert!(s.transcript().is_empty());
  }

  #[test]
  fn failed_turn_keeps_transcript_and_allows_retry() {
    let mut s = loaded();
    let req = s.begin_turn("Espero que llueva.").unwrap();
    assert!(s.finish_turn(req.ticket, Err(ContentError::Unavailable("HTTP 503".into()))));
    assert!(s.last_error().is_some());
    assert!(!s.is_waiting());
    assert_eq!(s.transcript().len(), 2);
    let again = s.begin_turn("Espero que no llueva.").unwrap();
    assert_eq!(again.history.len(), 2);
  }

  #[test]
  fn empty_reply_is_shown_as_ellipsis() {
    let mut s = loaded();
    let req = s.begin_turn("Hola").unwrap();
    s.finish_turn(req.ticket, Ok("  ".into()));
    assert_eq!(s.transcript().last().unwrap().text, EMPTY_REPLY);
  }

  #[test]
  fn blank_message_never_reaches_the_tutor() {
    let mut s = loaded();
    assert_eq!(s.begin_turn("  ").unwrap_err(), SessionError::EmptyInput);
    assert!(!s.is_waiting());
  }
}
