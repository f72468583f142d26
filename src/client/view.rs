//! View derivations over the client state.
//!
//! Everything here is pure: filtering never mutates the cached sequence and
//! date labels are recomputed from the stored timestamps.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::domain::{Timestamp, Todo};

/// Label shown for an absent date.
pub const DATE_NOT_SET: &str = "Not set";

// =============================================================================
// Filter Mode
// =============================================================================

/// Which todos the view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    /// Every todo.
    #[default]
    All,
    /// Only completed todos.
    Completed,
    /// Only todos that are not completed.
    Pending,
}

impl FilterMode {
    /// Returns `true` if the todo is visible under this mode.
    #[must_use]
    pub const fn matches(self, todo: &Todo) -> bool {
        match self {
            Self::All => true,
            Self::Completed => todo.completed,
            Self::Pending => !todo.completed,
        }
    }

    /// Returns the lowercase name used on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Completed => "completed",
            Self::Pending => "pending",
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Error returned for an unknown filter name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown filter '{0}'. Expected 'all', 'completed' or 'pending'")]
pub struct InvalidFilterMode(pub String);

impl FromStr for FilterMode {
    type Err = InvalidFilterMode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "completed" | "done" => Ok(Self::Completed),
            "pending" | "open" => Ok(Self::Pending),
            _ => Err(InvalidFilterMode(value.to_string())),
        }
    }
}

/// Returns the items visible under `mode`, preserving their order.
pub fn apply_filter<'a, T>(items: &'a [T], mode: FilterMode) -> Vec<&'a T>
where
    T: AsRef<Todo>,
{
    items
        .iter()
        .filter(|item| mode.matches(item.as_ref()))
        .collect()
}

// =============================================================================
// Date Labels
// =============================================================================

/// Formats a date for display, e.g. `Jan 1, 2025`, or `Not set`.
#[must_use]
pub fn format_display_date(date: Option<Timestamp>) -> String {
    date.map_or_else(
        || DATE_NOT_SET.to_string(),
        |date| date.as_datetime().format("%b %-d, %Y").to_string(),
    )
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TodoId;
    use proptest::prelude::*;
    use rstest::rstest;

    fn todo(title: &str, completed: bool) -> Todo {
        Todo::new(TodoId::generate(), title, Timestamp::now()).with_completed(completed)
    }

    #[rstest]
    #[case("all", FilterMode::All)]
    #[case("Completed", FilterMode::Completed)]
    #[case(" pending ", FilterMode::Pending)]
    #[case("done", FilterMode::Completed)]
    fn test_filter_mode_from_str(#[case] input: &str, #[case] expected: FilterMode) {
        assert_eq!(input.parse::<FilterMode>(), Ok(expected));
    }

    #[rstest]
    fn test_filter_mode_from_str_rejects_unknown() {
        assert_eq!(
            "urgent".parse::<FilterMode>(),
            Err(InvalidFilterMode("urgent".to_string()))
        );
    }

    #[rstest]
    #[case(FilterMode::All)]
    #[case(FilterMode::Completed)]
    #[case(FilterMode::Pending)]
    fn test_filter_mode_display_round_trips(#[case] mode: FilterMode) {
        assert_eq!(mode.to_string().parse::<FilterMode>(), Ok(mode));
    }

    #[rstest]
    fn test_apply_filter_preserves_order() {
        let todos = vec![todo("A", true), todo("B", false), todo("C", true)];

        let titles: Vec<&str> = apply_filter(&todos, FilterMode::Completed)
            .into_iter()
            .map(|todo| todo.title.as_str())
            .collect();

        assert_eq!(titles, vec!["A", "C"]);
    }

    #[rstest]
    #[case(None, "Not set")]
    #[case(Some("2025-01-01"), "Jan 1, 2025")]
    #[case(Some("2024-12-25T18:00:00Z"), "Dec 25, 2024")]
    fn test_format_display_date(#[case] input: Option<&str>, #[case] expected: &str) {
        let date = input.map(|value| Timestamp::parse_flexible(value).unwrap());
        assert_eq!(format_display_date(date), expected);
    }

    proptest! {
        #[test]
        fn completed_and_pending_partition_all(flags in proptest::collection::vec(any::<bool>(), 0..40)) {
            let todos: Vec<Todo> = flags
                .iter()
                .enumerate()
                .map(|(index, completed)| todo(&format!("todo-{index}"), *completed))
                .collect();

            let all = apply_filter(&todos, FilterMode::All);
            let completed = apply_filter(&todos, FilterMode::Completed);
            let pending = apply_filter(&todos, FilterMode::Pending);

            prop_assert_eq!(all.len(), todos.len());
            prop_assert_eq!(completed.len() + pending.len(), all.len());
            prop_assert!(completed.iter().all(|todo| !pending.iter().any(|other| other.id == todo.id)));
            let all_covered = all.iter().all(|todo| {
                completed.iter().any(|other| other.id == todo.id)
                    || pending.iter().any(|other| other.id == todo.id)
            });
            prop_assert!(all_covered);
        }
    }
}
