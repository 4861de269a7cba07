//! Secret redaction for operator-visible text.

/// Placeholder substituted for secret values.
pub const REDACTED: &str = "<redacted>";

/// Replace every occurrence of each secret in `text` with [`REDACTED`].
///
/// Secrets are matched longest first so a secret containing another is
/// replaced whole.
#[must_use]
pub fn redact(text: &str, secrets: &[String]) -> String {
    let mut ordered: Vec<&str> = secrets
        .iter()
        .map(String::as_str)
        .filter(|s| !s.is_empty())
        .collect();
    ordered.sort_by_key(|s| std::cmp::Reverse(s.len()));

    let mut out = text.to_string();
    for secret in ordered {
        out = out.replace(secret, REDACTED);
    }
    out
}
