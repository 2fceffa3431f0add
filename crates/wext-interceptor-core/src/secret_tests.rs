//! Tests for trigger secret handling.

use super::*;

fn data(entries: &[(&str, &[u8])]) -> HashMap<String, Vec<u8>> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_vec()))
        .collect()
}

#[test]
fn test_from_data_reads_both_tokens() {
    let secret = WebhookSecret::from_data(&data(&[
        ("secretToken", b"webhook-secret"),
        ("accessToken", b"api-token"),
    ]))
    .unwrap();

    assert_eq!(secret.secret_token(), b"webhook-secret");
    assert_eq!(secret.access_token(), Some(&b"api-token"[..]));
}

#[test]
fn test_from_data_access_token_is_optional() {
    let secret = WebhookSecret::from_data(&data(&[("secretToken", b"webhook-secret")])).unwrap();
    assert_eq!(secret.access_token(), None);
}

#[test]
fn test_from_data_requires_secret_token() {
    let result = WebhookSecret::from_data(&data(&[("accessToken", b"api-token")]));
    assert_eq!(
        result.unwrap_err(),
        SecretError::MissingKey {
            key: "secretToken".to_string()
        }
    );
}

#[test]
fn test_from_data_rejects_empty_secret_token() {
    let result = WebhookSecret::from_data(&data(&[("secretToken", b"")]));
    assert!(matches!(result, Err(SecretError::EmptyValue { .. })));
}

#[test]
fn test_debug_redacts_values() {
    let secret = WebhookSecret::new("super-secret").with_access_token("api-token");
    let debug = format!("{:?}", secret);

    assert!(!debug.contains("super-secret"));
    assert!(!debug.contains("api-token"));
    assert!(debug.contains("<REDACTED>"));
}
