//! Ordered, finite view over the most recent turns of a session.

use serde::Serialize;

use super::{Role, Turn};

/// Most recent turns of a session, oldest first.
///
/// Owned and finite; iterating twice yields the same sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TurnHistory(Vec<Turn>);

impl TurnHistory {
    pub fn new(turns: Vec<Turn>) -> Self {
        Self(turns)
    }

    /// Keeps the trailing `limit` turns of an oldest-first sequence.
    pub fn from_tail(mut turns: Vec<Turn>, limit: usize) -> Self {
        if turns.len() > limit {
            turns.drain(..turns.len() - limit);
        }
        Self(turns)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Turn> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.0.last()
    }

    /// Returns a view of the trailing `n` turns.
    pub fn window(&self, n: usize) -> &[Turn] {
        let start = self.0.len().saturating_sub(n);
        &self.0[start..]
    }

    /// Turns worth showing to a model as dialogue context.
    ///
    /// Error turns are kept out; they describe our failures, not the dialogue.
    pub fn dialogue(&self, n: usize) -> Vec<&Turn> {
        let dialogue: Vec<&Turn> = self
            .0
            .iter()
            .filter(|t| matches!(t.role(), Role::User | Role::Assistant))
            .collect();
        let start = dialogue.len().saturating_sub(n);
        dialogue[start..].to_vec()
    }

    pub fn into_vec(self) -> Vec<Turn> {
        self.0
    }
}

impl IntoIterator for TurnHistory {
    type Item = Turn;
    type IntoIter = std::vec::IntoIter<Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a TurnHistory {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::TurnErrorKind;
    use proptest::prelude::*;

    fn users(n: usize) -> Vec<Turn> {
        (0..n).map(|i| Turn::user(format!("m{}", i)).unwrap()).collect()
    }

    #[test]
    fn window_returns_tail() {
        let history = TurnHistory::new(users(5));
        let tail: Vec<&str> = history.window(2).iter().map(|t| t.content()).collect();
        assert_eq!(tail, vec!["m3", "m4"]);
    }

    #[test]
    fn dialogue_skips_error_and_system_turns() {
        let mut turns = users(2);
        turns.push(Turn::error("boom", TurnErrorKind::Upstream, None));
        turns.insert(0, Turn::system("Welcome"));
        let history = TurnHistory::new(turns);
        let dialogue: Vec<&str> = history.dialogue(10).iter().map(|t| t.content()).collect();
        assert_eq!(dialogue, vec!["m0", "m1"]);
    }

    #[test]
    fn iteration_is_restartable() {
        let history = TurnHistory::new(users(3));
        let first: Vec<_> = history.iter().map(|t| t.id()).collect();
        let second: Vec<_> = history.iter().map(|t| t.id()).collect();
        assert_eq!(first, second);
    }

    proptest! {
        #[test]
        fn from_tail_keeps_most_recent_in_order(total in 0usize..40, limit in 0usize..50) {
            let turns = users(total);
            let expected: Vec<String> = turns
                .iter()
                .skip(total.saturating_sub(limit))
                .map(|t| t.content().to_string())
                .collect();
            let history = TurnHistory::from_tail(turns, limit);
            prop_assert_eq!(history.len(), total.min(limit));
            let got: Vec<String> = history.iter().map(|t| t.content().to_string()).collect();
            prop_assert_eq!(got, expected);
        }
    }
}
