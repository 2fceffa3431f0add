//! Tests for application state and trigger resolution.

use super::*;

#[test]
fn test_app_state_indexes_triggers_by_name() {
    let state = AppState::new(
        Interceptor::new(),
        [
            Trigger::new("a", WebhookSecret::new("one")),
            Trigger::new("b", WebhookSecret::new("two")).with_provider(Provider::GitLab),
        ],
    );

    assert_eq!(state.trigger_count(), 2);
    assert_eq!(state.trigger("a").map(|t| t.provider), Some(None));
    assert_eq!(
        state.trigger("b").and_then(|t| t.provider),
        Some(Provider::GitLab)
    );
    assert!(state.trigger("c").is_none());
}

#[test]
fn test_app_state_from_config_applies_filter_headers() {
    let mut config = ServiceConfig::default();
    config.filter_headers.repository_url = "X-Repo".to_string();
    config.triggers.push(TriggerConfig {
        name: "gitlab".to_string(),
        secret: SecretSourceConfig::Literal {
            value: "token".to_string(),
        },
        repository_url: Some("https://gitlab.com/group/project".to_string()),
    });

    let state = AppState::from_config(&config).unwrap();
    assert_eq!(state.interceptor.filter_headers().repository_url, "X-Repo");
    assert_eq!(
        state.trigger("gitlab").and_then(|t| t.provider),
        Some(Provider::GitLab)
    );
}

#[test]
fn test_trigger_without_repository_url_detects_provider() {
    let trigger = Trigger::from_config(&TriggerConfig {
        name: "any".to_string(),
        secret: SecretSourceConfig::Literal {
            value: "token".to_string(),
        },
        repository_url: None,
    })
    .unwrap();
    assert_eq!(trigger.provider, None);
}

#[test]
fn test_trigger_with_unresolvable_url_fails() {
    let result = Trigger::from_config(&TriggerConfig {
        name: "bad".to_string(),
        secret: SecretSourceConfig::Literal {
            value: "token".to_string(),
        },
        repository_url: Some("not a url".to_string()),
    });
    assert!(matches!(result, Err(ConfigError::Provider { .. })));
}
