//! Word-token partition for the Syntax Puzzle.
//!
//! Tokens live in exactly one of two ordered sequences. Moving a token is the
//! only mutation, so `available ∪ selected` is always the scrambled multiset
//! the round started with.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WordToken {
  pub id: usize,
  pub text: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
  Available,
  Selected,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BoardStatus {
  #[default]
  Loading,
  Idle,
  Incorrect,
  Correct,
}

#[derive(Debug, PartialEq, Eq)]
pub enum MoveError {
  /// Board is loading or already solved.
  Locked(BoardStatus),
  /// No token with that id on the given side.
  NotFound { id: usize, side: Side },
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct TokenBoard {
  available: Vec<WordToken>,
  selected: Vec<WordToken>,
  status: BoardStatus,
}

impl TokenBoard {
  /// Fresh board in the order the content source scrambled the words.
  pub fn from_scrambled<S: AsRef<str>>(words: &[S]) -> Self {
    let available = words
      .iter()
      .enumerate()
      .map(|(id, w)| WordToken { id, text: w.as_ref().to_string() })
      .collect();
    Self { available, selected: Vec::new(), status: BoardStatus::Idle }
  }

  pub fn available(&self) -> &[WordToken] {
    &self.available
  }

  pub fn selected(&self) -> &[WordToken] {
    &self.selected
  }

  pub fn status(&self) -> BoardStatus {
    self.status
  }

  pub fn selected_texts(&self) -> Vec<&str> {
    self.selected.iter().map(|t| t.text.as_str()).collect()
  }

  fn editable(&self) -> Result<(), MoveError> {
    match self.status {
      BoardStatus::Idle | BoardStatus::Incorrect => Ok(()),
      other => Err(MoveError::Locked(other)),
    }
  }

  /// Take token `id` off `from` and append it to the other side.
  /// A move after a wrong check puts the board back to `Idle`.
  pub fn move_token(&mut self, id: usize, from: Side) -> Result<(), MoveError> {
    self.editable()?;
    let (source, dest) = match from {
      Side::Available => (&mut self.available, &mut self.selected),
      Side::Selected => (&mut self.selected, &mut self.available),
    };
    let pos = source
      .iter()
      .position(|t| t.id == id)
      .ok_or(MoveError::NotFound { id, side: from })?;
    let token = source.remove(pos);
    dest.push(token);
    self.status = BoardStatus::Idle;
    Ok(())
  }

  /// Return every selected token, restoring the scrambled order by id.
  pub fn reset(&mut self) -> Result<(), MoveError> {
    self.editable()?;
    self.available.append(&mut self.selected);
    self.available.sort_by_key(|t| t.id);
    self.status = BoardStatus::Idle;
    Ok(())
  }

  pub(crate) fn mark(&mut self, correct: bool) {
    self.status = if correct { BoardStatus::Correct } else { BoardStatus::Incorrect };
  }
}
