//! Syntax Puzzle: tap words into order. A wrong check keeps the board so the
//! learner can rearrange and try again without a reload.

use tracing::info;

use crate::content::ContentError;
use crate::domain::{Mode, PuzzleChallenge};
use crate::evaluate::puzzle_is_correct;
use crate::puzzle::{BoardStatus, MoveError, Side, TokenBoard};
use crate::scoring::ScoreBoard;

use super::{Round, SessionError, Ticket};

impl From<MoveError> for SessionError {
  fn from(e: MoveError) -> Self {
    match e {
      MoveError::Locked(BoardStatus::Loading) => SessionError::Busy,
      MoveError::Locked(_) => SessionError::NotAccepting("the puzzle is solved"),
      MoveError::NotFound { id, .. } => SessionError::UnknownToken(id),
    }
  }
}

#[derive(Debug, Default)]
pub struct PuzzleSession {
  round: Round<PuzzleChallenge>,
  board: TokenBoard,
}

impl PuzzleSession {
  pub fn round(&self) -> &Round<PuzzleChallenge> {
    &self.round
  }

  pub fn board(&self) -> &TokenBoard {
    &self.board
  }

  pub fn begin_load(&mut self) -> Result<Ticket, SessionError> {
    let ticket = self.round.begin_load()?;
    self.board = TokenBoard::default();
    Ok(ticket)
  }

  pub fn finish_load(&mut self, ticket: Ticket, result: Result<PuzzleChallenge, ContentError>) -> bool {
    if !self.round.finish_load(ticket, result) {
      return false;
    }
    if let Some(challenge) = self.round.challenge() {
      self.board = TokenBoard::from_scrambled(&challenge.scrambled_words);
    }
    true
  }

  pub fn abandon(&mut self) {
    self.round.abandon();
    self.board = TokenBoard::default();
  }

  pub fn move_token(&mut self, id: usize, from: Side) -> Result<(), SessionError> {
    self.round.active()?;
    self.board.move_token(id, from)?;
    Ok(())
  }

  pub fn reset(&mut self) -> Result<(), SessionError> {
    self.round.active()?;
    self.board.reset()?;
    Ok(())
  }

  pub fn submit(&mut self, score: &mut ScoreBoard) -> Result<bool, SessionError> {
    let challenge = self.round.active()?;
    match self.board.status() {
      BoardStatus::Idle => {}
      BoardStatus::Incorrect => return Err(SessionError::NotAccepting("nothing changed since the last check")),
      other => return Err(MoveError::Locked(other).into()),
    }
    if self.board.selected().is_empty() {
      return Err(SessionError::NothingSelected);
    }
    let correct = puzzle_is_correct(challenge, &self.board.selected_texts());
    info!(target: "session", mode = "syntax_puzzle", words = self.board.selected().len(), %correct, "Puzzle checked");
    self.board.mark(correct);
    if correct {
      self.round.settle(true);
      score.add_points(Mode::SyntaxPuzzle.reward());
    }
    Ok(correct)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::scoring::MemoryStore;
  use crate::session::Phase;

  fn challenge() -> PuzzleChallenge {
    PuzzleChallenge {
      original_sentence: "Es probable que llueva mañana.".into(),
      scrambled_words: vec!["llueva".into(), "Es".into(), "mañana".into(), "que".into(), "probable".into()],
      translation: "It will probably rain tomorrow.".into(),
    }
  }

  fn loaded() -> PuzzleSession {
    let mut s = PuzzleSession::default();
    let t = s.begin_load().unwrap();
    assert!(s.finish_load(t, Ok(challenge())));
    s
  }

  #[test]
  fn solving_in_order_scores_twenty() {
    let mut score = ScoreBoard::open(Box::new(MemoryStore::default()));
    let mut s = loaded();
    for id in [1, 4, 3, 0, 2] {
      s.move_token(id, Side::Available).unwrap();
    }
    assert_eq!(s.submit(&mut score), Ok(true));
    assert_eq!(s.round().phase(), Phase::AnsweredCorrect);
    assert_eq!(score.summary().points, 20);
    assert!(s.move_token(1, Side::Selected).is_err());
  }

  #[test]
  fn wrong_order_can_be_fixed_without_reload() {
    let mut score = ScoreBoard::open(Box::new(MemoryStore::default()));
    let mut s = loaded();
    for id in [1, 3, 4, 0, 2] {
      s.move_token(id, Side::Available).unwrap();
    }
    assert_eq!(s.submit(&mut score), Ok(false));
    assert_eq!(s.board().status(), BoardStatus::Incorrect);
    assert_eq!(s.round().phase(), Phase::Active);
    assert!(matches!(s.submit(&mut score), Err(SessionError::NotAccepting(_))));

    s.reset().unwrap();
    assert_eq!(s.board().status(), BoardStatus::Idle);
    for id in [1, 4, 3, 0, 2] {
      s.move_token(id, Side::Available).unwrap();
    }
    assert_eq!(s.submit(&mut score), Ok(true));
    assert_eq!(score.summary().points, 20);
  }

  #[test]
  fn empty_selection_is_rejected() {
    let mut score = ScoreBoard::open(Box::new(MemoryStore::default()));
    let mut s = loaded();
    assert_eq!(s.submit(&mut score), Err(SessionError::NothingSelected));
  }

  #[test]
  fn reload_starts_from_a_fresh_board() {
    let mut s = loaded();
    s.move_token(0, Side::Available).unwrap();
    let t = s.begin_load().unwrap();
    assert!(s.board().available().is_empty() && s.board().selected().is_empty());
    assert_eq!(s.move_token(0, Side::Available), Err(SessionError::Busy));
    s.finish_load(t, Ok(challenge()));
    assert_eq!(s.board().available().len(), 5);
    assert!(s.board().selected().is_empty());
  }
}
