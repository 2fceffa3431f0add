//! Tests for branch injection.

use super::*;
use crate::webhook::github_provider::{PullRequestEvent, PushEvent};
use crate::webhook::{GitHubEvent, GitHubProvider, OtherEvent, WebhookEvent, WebhookProvider};
use http::{HeaderMap, HeaderValue};
use serde_json::{json, Value};

fn raw_push_event(git_ref: &str, payload: &'static [u8]) -> DecodedEvent {
    DecodedEvent::new(
        "push",
        None,
        WebhookEvent::GitHub(GitHubEvent::Push(PushEvent {
            git_ref: git_ref.to_string(),
            clone_url: String::new(),
        })),
        Bytes::from_static(payload),
    )
}

fn push_event(payload: Value) -> DecodedEvent {
    let git_ref = payload["ref"].as_str().unwrap_or_default().to_string();
    DecodedEvent::new(
        "push",
        None,
        WebhookEvent::GitHub(GitHubEvent::Push(PushEvent {
            git_ref,
            clone_url: String::new(),
        })),
        serde_json::to_vec(&payload).unwrap(),
    )
}

#[test]
fn test_branch_from_ref() {
    assert_eq!(branch_from_ref("refs/heads/main"), "main");
    assert_eq!(branch_from_ref("refs/heads/feature/login"), "login");
    assert_eq!(branch_from_ref("/blah/head/foo"), "foo");
    assert_eq!(branch_from_ref("main"), "main");
    assert_eq!(branch_from_ref("refs/heads/"), "");
    assert_eq!(branch_from_ref(""), "");
}

#[test]
fn test_push_appends_branch_field_last() {
    let event = push_event(json!({"ref": "/blah/head/foo"}));
    let bytes = augment(&event).unwrap();
    assert_eq!(
        &bytes[..],
        br#"{"ref":"/blah/head/foo","webhooks-tekton-git-branch":"foo"}"#
    );
}

#[test]
fn test_original_field_order_is_preserved() {
    let event = push_event(json!({
        "zeta": 1,
        "ref": "refs/heads/main",
        "alpha": {"nested": [1, 2]}
    }));
    let bytes = augment(&event).unwrap();
    assert_eq!(
        &bytes[..],
        br#"{"zeta":1,"ref":"refs/heads/main","alpha":{"nested":[1,2]},"webhooks-tekton-git-branch":"main"}"#
    );
}

#[test]
fn test_existing_branch_field_is_replaced_and_moved_last() {
    let event = push_event(json!({
        "webhooks-tekton-git-branch": "stale",
        "ref": "refs/heads/main"
    }));
    let bytes = augment(&event).unwrap();
    assert_eq!(
        &bytes[..],
        br#"{"ref":"refs/heads/main","webhooks-tekton-git-branch":"main"}"#
    );
}

#[test]
fn test_pull_request_uses_head_ref_regardless_of_base() {
    let payload = serde_json::to_vec(&json!({
        "action": "opened",
        "pull_request": {"head": {"ref": "/blah/head/foo"}, "base": {"ref": "/blah/head/bar"}}
    }))
    .unwrap();
    let event = DecodedEvent::new(
        "pull_request",
        None,
        WebhookEvent::GitHub(GitHubEvent::PullRequest(PullRequestEvent {
            action: "opened".to_string(),
            number: None,
            head_ref: "/blah/head/foo".to_string(),
            base_ref: Some("/blah/head/bar".to_string()),
            clone_url: String::new(),
        })),
        payload,
    );

    let augmented: Value = serde_json::from_slice(&augment(&event).unwrap()).unwrap();
    assert_eq!(augmented[BRANCH_FIELD], "foo");
    assert_eq!(augmented["pull_request"]["base"]["ref"], "/blah/head/bar");
}

#[test]
fn test_other_event_is_unsupported() {
    let event = DecodedEvent::new(
        "issue_comment",
        None,
        WebhookEvent::GitHub(GitHubEvent::Other(OtherEvent::default())),
        Bytes::from_static(br#"{"action":"created"}"#),
    );

    let result = augment(&event);
    assert!(
        matches!(
            result,
            Err(InterceptorError::UnsupportedEventType { ref event_type }) if event_type == "issue_comment"
        ),
        "unexpected result: {result:?}"
    );
}

// ============================================================================
// Value encoding
// ============================================================================

mod value_encoding_tests {
    use super::*;

    #[test]
    fn test_number_and_escape_spellings_survive() {
        let original: &[u8] = br#"{"ref":"refs/heads/a","n":1e2,"f":1.50,"s":"caf\u00e9"}"#;
        let event = raw_push_event("refs/heads/a", original);

        let bytes = augment(&event).unwrap();

        assert_eq!(
            &bytes[..],
            br#"{"ref":"refs/heads/a","n":1e2,"f":1.50,"s":"caf\u00e9","webhooks-tekton-git-branch":"a"}"#
        );
        assert!(bytes.starts_with(&original[..original.len() - 1]));
    }

    #[test]
    fn test_nested_values_are_copied_verbatim() {
        let event = raw_push_event(
            "refs/heads/main",
            br#"{"ref":"refs/heads/main","commits":[ {"id": 1.0e0} ],"big":123456789012345678901234567890}"#,
        );

        let bytes = augment(&event).unwrap();

        assert_eq!(
            &bytes[..],
            br#"{"ref":"refs/heads/main","commits":[ {"id": 1.0e0} ],"big":123456789012345678901234567890,"webhooks-tekton-git-branch":"main"}"#
        );
    }

    #[test]
    fn test_empty_object_gets_only_the_branch_field() {
        let event = raw_push_event("refs/heads/main", b"{}");

        let bytes = augment(&event).unwrap();

        assert_eq!(&bytes[..], br#"{"webhooks-tekton-git-branch":"main"}"#);
    }

    #[test]
    fn test_duplicate_branch_fields_collapse_to_one() {
        let event = raw_push_event(
            "refs/heads/main",
            br#"{"webhooks-tekton-git-branch":1,"ref":"refs/heads/main","webhooks-tekton-git-branch":"x"}"#,
        );

        let bytes = augment(&event).unwrap();

        assert_eq!(
            &bytes[..],
            br#"{"ref":"refs/heads/main","webhooks-tekton-git-branch":"main"}"#
        );
    }

    #[test]
    fn test_decoded_github_push_keeps_value_text() {
        let mut headers = HeaderMap::new();
        headers.insert("x-github-event", HeaderValue::from_static("push"));
        let body: &[u8] = br#"{"ref":"refs/heads/a","n":1e2,"f":1.50,"s":"caf\u00e9"}"#;

        let event = GitHubProvider::new().decode(&headers, body).unwrap();
        let bytes = augment(&event).unwrap();

        assert!(
            bytes.starts_with(&body[..body.len() - 1]),
            "original members must be re-emitted verbatim: {}",
            String::from_utf8_lossy(&bytes)
        );
    }
}
