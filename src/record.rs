// Task record and its completion state

use eyre::{Result, eyre};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One row of the tasks table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Assigned by the store, never reused
    pub id: i64,
    pub task: String,
    pub body: String,
    /// false = Pending, true = Completed
    pub state: bool,
}

impl Task {
    /// Map a row selected with `schema::TASKS.column_list()`
    pub(crate) fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            task: row.get(1)?,
            body: row.get(2)?,
            state: row.get(3)?,
        })
    }

    pub fn status(&self) -> State {
        State::from(self.state)
    }
}

/// Textual form of the completion flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Pending,
    Completed,
}

impl State {
    pub fn as_str(self) -> &'static str {
        match self {
            State::Pending => "Pending",
            State::Completed => "Completed",
        }
    }

    pub fn is_completed(self) -> bool {
        self == State::Completed
    }
}

impl From<bool> for State {
    fn from(completed: bool) -> Self {
        if completed { State::Completed } else { State::Pending }
    }
}

impl From<State> for bool {
    fn from(state: State) -> Self {
        state.is_completed()
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Case-insensitive parse, for command-line input
impl FromStr for State {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("pending") {
            Ok(State::Pending)
        } else if s.eq_ignore_ascii_case("completed") {
            Ok(State::Completed)
        } else {
            Err(eyre!("Invalid state: {} (expected Pending or Completed)", s))
        }
    }
}
