//! Tests for repository URL canonicalization.

use super::*;

#[test]
fn test_canonicalize_known_spellings() {
    let cases = [
        ("https://github.com/foo/bar.git", "github.com/foo/bar"),
        ("https://github.com/foo/bar", "github.com/foo/bar"),
        ("http://github.com/foo/bar.git", "github.com/foo/bar"),
        ("http://github.com/foo/bar", "github.com/foo/bar"),
        ("github.com/foo/bar", "github.com/foo/bar"),
        ("HTTPS://github.com/foo/bar.GIT", "github.com/foo/bar"),
        ("hTtP://GiThUb.CoM/FoO/BaR", "github.com/foo/bar"),
        (
            "http://something.else/foo/bar/wibble.git",
            "something.else/foo/bar/wibble",
        ),
    ];

    for (input, expected) in cases {
        assert_eq!(
            canonicalize(input),
            expected,
            "unexpected canonical form for {input}"
        );
    }
}

#[test]
fn test_canonicalize_ignores_case_and_affixes() {
    assert_eq!(canonicalize("HTTPS://Foo.COM/bar.GIT"), "foo.com/bar");
    assert_eq!(canonicalize("foo.com/bar"), "foo.com/bar");
    assert_eq!(
        canonicalize("HTTPS://Foo.COM/bar.GIT"),
        canonicalize("foo.com/bar")
    );
}

#[test]
fn test_canonicalize_is_idempotent() {
    let inputs = [
        "https://github.com/org/repo.git",
        "HTTP://GitLab.example.com/Group/Sub/Project.GIT",
        "github.com/org/repo",
        "",
        "   ",
        "ssh://git@github.com/org/repo.git",
        "repo.git.git",
        "http://https://example.com/x",
    ];

    for input in inputs {
        let once = canonicalize(input);
        assert_eq!(canonicalize(&once), once, "not idempotent for {input:?}");
    }
}

#[test]
fn test_canonicalize_leaves_other_schemes_alone() {
    assert_eq!(
        canonicalize("ssh://git@github.com/org/repo.git"),
        "ssh://git@github.com/org/repo"
    );
}

#[test]
fn test_canonicalize_empty_string() {
    assert_eq!(canonicalize(""), "");
}

#[test]
fn test_same_repository() {
    assert!(same_repository(
        "https://github.com/org/repo.git",
        "github.com/org/repo"
    ));
    assert!(!same_repository(
        "https://github.com/org/repo.git",
        "github.com/org/other"
    ));
}

#[test]
fn test_repeated_passes_strip_upper_case_affixes() {
    assert_eq!(canonicalize("HTTPS://HTTP://Foo.com/Bar.GIT.Git"), "foo.com/bar");
    assert_eq!(canonicalize_once("https://foo.com/bar.git"), "foo.com/bar");
}
