//! Branch injection.
//!
//! Downstream triggers need the short branch name of a delivery without
//! parsing refs themselves, so the interceptor appends it to the payload under
//! [`BRANCH_FIELD`]. Every other member is re-emitted in order with its value
//! text untouched: number spellings, string escapes and nested whitespace
//! survive as delivered.

use super::{DecodedEvent, EventKind, InterceptorError};
use bytes::Bytes;
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, Serializer};
use serde_json::value::{to_raw_value, RawValue};
use std::fmt;

/// Payload key the branch name is written under.
pub const BRANCH_FIELD: &str = "webhooks-tekton-git-branch";

/// Short branch name for a ref: everything after the last `/`.
///
/// A ref without `/` is returned whole.
pub fn branch_from_ref(git_ref: &str) -> &str {
    git_ref.rsplit('/').next().unwrap_or(git_ref)
}

/// Serialize the payload of `event` with its branch name appended.
///
/// # Errors
///
/// Returns [`InterceptorError::UnsupportedEventType`] for events that carry no
/// branch ([`EventKind::Other`]); no bytes are produced for them.
pub fn augment(event: &DecodedEvent) -> Result<Bytes, InterceptorError> {
    let branch = match event.kind() {
        EventKind::Push => branch_from_ref(event.ref_like()),
        EventKind::PullRequest => branch_from_ref(event.ref_like()),
        EventKind::Other => {
            return Err(InterceptorError::UnsupportedEventType {
                event_type: event.event_type().to_string(),
            })
        }
    };

    let mut payload: RawObject = serde_json::from_slice(event.payload())?;
    payload.replace_last(BRANCH_FIELD, to_raw_value(branch)?);

    Ok(Bytes::from(serde_json::to_vec(&payload)?))
}

/// JSON object whose member values are kept as their original text.
#[derive(Debug)]
struct RawObject(Vec<(String, Box<RawValue>)>);

impl RawObject {
    /// Drop every member named `key`, then append `key: value`.
    fn replace_last(&mut self, key: &str, value: Box<RawValue>) {
        self.0.retain(|(name, _)| name != key);
        self.0.push((key.to_string(), value));
    }
}

impl<'de> Deserialize<'de> for RawObject {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RawObjectVisitor;

        impl<'de> Visitor<'de> for RawObjectVisitor {
            type Value = RawObject;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut members = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(member) = map.next_entry::<String, Box<RawValue>>()? {
                    members.push(member);
                }
                Ok(RawObject(members))
            }
        }

        deserializer.deserialize_map(RawObjectVisitor)
    }
}

impl Serialize for RawObject {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(self.0.iter().map(|(name, value)| (name, value)))
    }
}

#[cfg(test)]
#[path = "augment_tests.rs"]
mod tests;
