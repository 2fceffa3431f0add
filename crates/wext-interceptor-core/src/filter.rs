//! Declared filters and the filter matching algorithm.
//!
//! A trigger declares which deliveries it cares about through three request
//! headers (names configurable through [`FilterHeaders`]):
//!
//! | Header                  | Meaning                                            |
//! |-------------------------|----------------------------------------------------|
//! | `Wext-Repository-Url`   | Repository the trigger is bound to                 |
//! | `Wext-Incoming-Event`   | Comma-separated event types; absent = any event    |
//! | `Wext-Incoming-Actions` | Comma-separated actions; absent = any action       |
//!
//! [`match_filter`] is pure: it compares already-decoded facts with the
//! declared filter and performs no I/O.

use crate::canonical::canonicalize;
use crate::webhook::header_value;
use http::HeaderMap;
use serde::{Deserialize, Serialize};

pub const REPOSITORY_URL_HEADER: &str = "Wext-Repository-Url";
pub const INCOMING_EVENT_HEADER: &str = "Wext-Incoming-Event";
pub const INCOMING_ACTIONS_HEADER: &str = "Wext-Incoming-Actions";

// ============================================================================
// FilterHeaders
// ============================================================================

/// Names of the request headers a declared filter is read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterHeaders {
    /// Header holding the wanted repository URL
    pub repository_url: String,

    /// Header holding the comma-separated wanted event types
    pub events: String,

    /// Header holding the comma-separated wanted actions
    pub actions: String,
}

impl Default for FilterHeaders {
    fn default() -> Self {
        Self {
            repository_url: REPOSITORY_URL_HEADER.to_string(),
            events: INCOMING_EVENT_HEADER.to_string(),
            actions: INCOMING_ACTIONS_HEADER.to_string(),
        }
    }
}

// ============================================================================
// DeclaredFilter
// ============================================================================

/// Repository, event and action constraints declared by a trigger.
///
/// `wanted_events` and `wanted_actions` hold the comma-separated entries in
/// declaration order, untrimmed; matching trims them. An empty list means
/// "no restriction".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeclaredFilter {
    pub wanted_repository_url: String,
    pub wanted_events: Vec<String>,
    pub wanted_actions: Vec<String>,
}

impl DeclaredFilter {
    /// Create a filter bound to a repository with no event restriction
    pub fn new(wanted_repository_url: impl Into<String>) -> Self {
        Self {
            wanted_repository_url: wanted_repository_url.into(),
            wanted_events: Vec::new(),
            wanted_actions: Vec::new(),
        }
    }

    /// Restrict the filter to the given event types
    pub fn with_events<I, S>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.wanted_events = events.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict the filter to the given actions
    pub fn with_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.wanted_actions = actions.into_iter().map(Into::into).collect();
        self
    }

    /// Read the declared filter from request headers.
    ///
    /// Only the first value of each header is considered. A missing or empty
    /// event/action header yields an empty list. A missing repository header
    /// yields an empty wanted URL, which [`match_filter`] always rejects.
    pub fn from_headers(headers: &HeaderMap, names: &FilterHeaders) -> Self {
        let wanted_repository_url = header_value(headers, &names.repository_url)
            .unwrap_or_default()
            .to_string();

        Self {
            wanted_repository_url,
            wanted_events: split_list(header_value(headers, &names.events)),
            wanted_actions: split_list(header_value(headers, &names.actions)),
        }
    }

    /// Whether any event restriction is active
    pub fn restricts_events(&self) -> bool {
        !self.wanted_events.is_empty()
    }
}

fn split_list(value: Option<&str>) -> Vec<String> {
    match value {
        Some(value) if !value.trim().is_empty() => value.split(',').map(String::from).collect(),
        _ => Vec::new(),
    }
}

// ============================================================================
// Matching
// ============================================================================

/// The three decoded facts the matcher looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventFacts<'a> {
    /// Clone URL reported in the payload
    pub clone_url: &'a str,

    /// Raw value of the provider's event-type header
    pub event_type: &'a str,

    /// Action or state of the event; empty for push-like events
    pub action: &'a str,
}

/// Result of checking a delivery against a declared filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Pass,
    Fail(MismatchReason),
}

impl ValidationOutcome {
    /// Whether the delivery satisfied the filter
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    /// Convert into a `Result` for `?` propagation
    pub fn into_result(self) -> Result<(), MismatchReason> {
        match self {
            Self::Pass => Ok(()),
            Self::Fail(reason) => Err(reason),
        }
    }
}

/// Why a delivery did not satisfy a declared filter.
///
/// These are routine outcomes: the trigger simply does not apply to the event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MismatchReason {
    #[error("repository URLs do not match, got {got} but wanted {wanted}")]
    RepositoryMismatch { got: String, wanted: String },

    #[error("event type does not match, got {got} but wanted one of {wanted:?}")]
    EventTypeMismatch { got: String, wanted: Vec<String> },

    #[error("action does not match, got {got} but wanted one of {wanted:?}")]
    ActionMismatch { got: String, wanted: Vec<String> },
}

/// Decide whether a decoded delivery satisfies a declared filter.
///
/// Checks run in a fixed order and stop at the first decision:
///
/// 1. The wanted URL must be declared and its canonical form must equal the
///    canonicalized clone URL, otherwise [`MismatchReason::RepositoryMismatch`].
///    An undeclared repository fails even against a payload without one.
/// 2. No wanted events: pass.
/// 3. The event type must equal one of the trimmed wanted events,
///    otherwise [`MismatchReason::EventTypeMismatch`].
/// 4. No wanted actions: pass.
/// 5. The action must equal one of the trimmed wanted actions,
///    otherwise [`MismatchReason::ActionMismatch`].
///
/// # Examples
///
/// ```rust
/// use wext_interceptor_core::{match_filter, DeclaredFilter, EventFacts, ValidationOutcome};
///
/// let facts = EventFacts {
///     clone_url: "https://github.com/org/repo.git",
///     event_type: "pull_request",
///     action: "opened",
/// };
/// let filter = DeclaredFilter::new("github.com/org/repo")
///     .with_events(["push", " pull_request"])
///     .with_actions(["opened", "synchronize"]);
///
/// assert_eq!(match_filter(&facts, &filter), ValidationOutcome::Pass);
/// ```
pub fn match_filter(facts: &EventFacts<'_>, filter: &DeclaredFilter) -> ValidationOutcome {
    let got_repository = canonicalize(facts.clone_url);
    let wanted_repository = canonicalize(&filter.wanted_repository_url);
    if wanted_repository.is_empty() || got_repository != wanted_repository {
        return ValidationOutcome::Fail(MismatchReason::RepositoryMismatch {
            got: got_repository,
            wanted: wanted_repository,
        });
    }

    if !filter.restricts_events() {
        return ValidationOutcome::Pass;
    }

    let event_matches = filter
        .wanted_events
        .iter()
        .any(|event| event.trim() == facts.event_type);
    if !event_matches {
        return ValidationOutcome::Fail(MismatchReason::EventTypeMismatch {
            got: facts.event_type.to_string(),
            wanted: filter.wanted_events.clone(),
        });
    }

    if filter.wanted_actions.is_empty() {
        return ValidationOutcome::Pass;
    }

    let action_matches = filter
        .wanted_actions
        .iter()
        .any(|action| action.trim() == facts.action);
    if action_matches {
        ValidationOutcome::Pass
    } else {
        ValidationOutcome::Fail(MismatchReason::ActionMismatch {
            got: facts.action.to_string(),
            wanted: filter.wanted_actions.clone(),
        })
    }
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;
