// Search query dispatch for tasks

use crate::record::State;

/// Escape character used in LIKE patterns
const LIKE_ESCAPE: char = '\\';

/// Parsed search query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Every task in the given state
    State(State),
    /// Tasks whose task or body contains the text, ignoring case
    Text(String),
}

impl Query {
    /// Three-way dispatch: "pending" and "completed" (any case) are status
    /// filters, everything else is a substring search.
    ///
    /// A task whose text is literally "pending" can therefore never be found
    /// by substring search.
    pub fn parse(input: &str) -> Self {
        if input.eq_ignore_ascii_case("pending") {
            Query::State(State::Pending)
        } else if input.eq_ignore_ascii_case("completed") {
            Query::State(State::Completed)
        } else {
            Query::Text(input.to_string())
        }
    }

    /// WHERE clause body and its single bound parameter
    pub(crate) fn to_sql(&self) -> (&'static str, rusqlite::types::Value) {
        match self {
            Query::State(state) => ("state = ?1", rusqlite::types::Value::Integer(state.is_completed() as i64)),
            Query::Text(text) => (
                "task LIKE ?1 ESCAPE '\\' OR body LIKE ?1 ESCAPE '\\'",
                rusqlite::types::Value::Text(like_pattern(text)),
            ),
        }
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Query::State(state) => write!(f, "state = {}", state),
            Query::Text(text) => write!(f, "contains {:?}", text),
        }
    }
}

/// `%text%` with LIKE wildcards escaped so the text matches literally
fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if c == '%' || c == '_' || c == LIKE_ESCAPE {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
