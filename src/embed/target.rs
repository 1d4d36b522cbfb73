//! Input validation: which text may become an embed target.

use std::fmt;

use url::Url;

/// Schemes the embedding host accepts.
const ALLOWED_SCHEMES: &[&str] = &["http", "https"];

/// Why submitted input was not accepted as a target.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("input is empty")]
    Empty,

    #[error("not an absolute URL: {0}")]
    Malformed(url::ParseError),

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),
}

/// Identifies one accepted target's lifetime.
///
/// Bumped on every accepted submit. Watchdogs and host callbacks carry the
/// generation they were issued for, so anything from a superseded target
/// can be told apart from the current one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A validated URL bound to the embedding host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub url: Url,
    pub generation: Generation,
}

/// Parse raw input into a URL the host may load.
///
/// Purely structural: no network access happens here.
pub fn parse_target(raw: &str) -> Result<Url, InputError> {
    if raw.trim().is_empty() {
        return Err(InputError::Empty);
    }

    let url = Url::parse(raw).map_err(InputError::Malformed)?;

    if !ALLOWED_SCHEMES.contains(&url.scheme()) {
        return Err(InputError::UnsupportedScheme(url.scheme().to_string()));
    }

    Ok(url)
}

/// Whether `raw` would be accepted as a target.
pub fn validate(raw: &str) -> bool {
    parse_target(raw).is_ok()
}
