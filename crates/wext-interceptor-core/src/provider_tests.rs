//! Tests for provider detection and API endpoint resolution.

use super::*;
use http::HeaderValue;

#[test]
fn test_resolve_public_github() {
    let endpoint = resolve_provider("https://github.com/org/repo").unwrap();
    assert_eq!(endpoint.provider, Provider::GitHub);
    assert_eq!(endpoint.api_url, "https://api.github.com/");

    let endpoint = resolve_provider("https://GitHub.com/org/repo.git").unwrap();
    assert_eq!(endpoint.provider, Provider::GitHub);
    assert_eq!(endpoint.api_url, "https://api.github.com/");
}

#[test]
fn test_resolve_github_enterprise() {
    let endpoint = resolve_provider("https://github.mycompany.com/org/repo").unwrap();
    assert_eq!(endpoint.provider, Provider::GitHub);
    assert_eq!(endpoint.api_url, "https://github.mycompany.com/api/v3/");
}

#[test]
fn test_resolve_github_enterprise_keeps_port() {
    let endpoint = resolve_provider("http://github.internal:8443/org/repo").unwrap();
    assert_eq!(endpoint.api_url, "http://github.internal:8443/api/v3/");
}

#[test]
fn test_resolve_gitlab() {
    let endpoint = resolve_provider("https://gitlab.com/group/project").unwrap();
    assert_eq!(endpoint.provider, Provider::GitLab);
    assert_eq!(endpoint.api_url, "https://gitlab.com/api/v4");
}

#[test]
fn test_resolve_empty_url_fails() {
    assert_eq!(resolve_provider(""), Err(ProviderError::MissingUrl));
}

#[test]
fn test_resolve_relative_url_fails() {
    let result = resolve_provider("github.com/org/repo");
    assert!(
        matches!(result, Err(ProviderError::InvalidUrl { .. })),
        "expected InvalidUrl, got: {result:?}"
    );
}

#[test]
fn test_resolve_unknown_host_fails() {
    let result = resolve_provider("https://bitbucket.org/org/repo");
    assert!(
        matches!(result, Err(ProviderError::UnrecognizedProvider { .. })),
        "expected UnrecognizedProvider, got: {result:?}"
    );
}

#[test]
fn test_detect_provider_from_headers() {
    let mut headers = HeaderMap::new();
    assert_eq!(Provider::detect(&headers), None);

    headers.insert("x-gitlab-event", HeaderValue::from_static("Push Hook"));
    assert_eq!(Provider::detect(&headers), Some(Provider::GitLab));

    headers.insert("x-github-event", HeaderValue::from_static("push"));
    assert_eq!(Provider::detect(&headers), Some(Provider::GitHub));
}

#[test]
fn test_provider_from_str() {
    assert_eq!("GitHub".parse::<Provider>().unwrap(), Provider::GitHub);
    assert_eq!("gitlab".parse::<Provider>().unwrap(), Provider::GitLab);
    assert!("bitbucket".parse::<Provider>().is_err());
}
