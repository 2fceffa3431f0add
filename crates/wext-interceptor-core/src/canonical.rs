//! Repository URL canonicalization.
//!
//! Providers report clone URLs as `https://host/org/repo.git` while trigger
//! authors tend to write `host/org/repo`. Both sides of the repository check
//! are passed through [`canonicalize`] so that spelling differences in case,
//! scheme and `.git` suffix do not matter.

const GIT_SUFFIX: &str = ".git";
const HTTPS_PREFIX: &str = "https://";
const HTTP_PREFIX: &str = "http://";

/// Normalize a clone-URL-like string.
///
/// Each pass lower-cases the input, strips a trailing `.git`, then a leading
/// `https://`, then a leading `http://`. Passes repeat until the value stops
/// changing, so the result is a fixed point: canonicalizing it again is a
/// no-op. For every ordinary URL a single pass already reaches that point.
///
/// # Examples
///
/// ```rust
/// use wext_interceptor_core::canonicalize;
///
/// assert_eq!(canonicalize("HTTPS://Foo.COM/bar.GIT"), "foo.com/bar");
/// assert_eq!(canonicalize("foo.com/bar"), "foo.com/bar");
/// ```
pub fn canonicalize(input: &str) -> String {
    let mut current = input.to_lowercase();
    loop {
        let next = canonicalize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// One strip pass over an already lower-cased value.
fn canonicalize_once(lowered: &str) -> String {
    let no_suffix = lowered.strip_suffix(GIT_SUFFIX).unwrap_or(lowered);
    let no_https = no_suffix.strip_prefix(HTTPS_PREFIX).unwrap_or(no_suffix);
    let no_http = no_https.strip_prefix(HTTP_PREFIX).unwrap_or(no_https);
    no_http.to_string()
}

/// Compare two repository URLs after canonicalization.
pub fn same_repository(left: &str, right: &str) -> bool {
    canonicalize(left) == canonicalize(right)
}

#[cfg(test)]
#[path = "canonical_tests.rs"]
mod tests;
