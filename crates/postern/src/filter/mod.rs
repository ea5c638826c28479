//! Spam heuristics over structurally valid submissions.
//!
//! Three independent predicates: blacklisted name, disallowed alphabet in
//! the message, and links in the message. They run in the configured
//! order and the first failing check decides the rejection. The default
//! precedence is blacklist, then alphabet, then link.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::info;

use postern_common::{ContentRejection, SubmittedForm};

use crate::config::FilterConfig;

/// Absolute URLs, `www.` hosts, and bare `label.tld` tokens.
static LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(https?://[^\s]+)|(www\.[^\s]+)|([a-z0-9\-]+\.[a-z]{2,})")
        .expect("link pattern is valid")
});

/// A single content predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentCheck {
    Blacklist,
    Alphabet,
    Link,
}

/// Inclusive code point range, written as integers in config
/// (`{ start = 0x0400, end = 0x04FF }`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ScriptRange {
    pub start: u32,
    pub end: u32,
}

impl ScriptRange {
    pub const CYRILLIC: ScriptRange = ScriptRange {
        start: 0x0400,
        end: 0x04FF,
    };

    pub fn contains(&self, c: char) -> bool {
        (self.start..=self.end).contains(&(c as u32))
    }
}

/// Stateless content filter
#[derive(Debug, Clone)]
pub struct ContentFilter {
    checks: Vec<ContentCheck>,
    forbidden_names: Vec<String>,
    disallowed_ranges: Vec<ScriptRange>,
}

impl ContentFilter {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            checks: config.checks.clone(),
            forbidden_names: config
                .forbidden_names
                .iter()
                .map(|n| normalize_name(n))
                .collect(),
            disallowed_ranges: config.disallowed_ranges.clone(),
        }
    }

    /// Run the configured checks in order; the first failure wins.
    pub fn inspect(&self, form: &SubmittedForm) -> Result<(), ContentRejection> {
        for check in &self.checks {
            let verdict = match check {
                ContentCheck::Blacklist => self.check_name(&form.name),
                ContentCheck::Alphabet => self.check_alphabet(&form.message),
                ContentCheck::Link => check_links(&form.message),
            };

            if let Err(rejection) = verdict {
                info!(check = ?check, reason = %rejection, "Submission content rejected");
                return Err(rejection);
            }
        }
        Ok(())
    }

    pub fn check_name(&self, name: &str) -> Result<(), ContentRejection> {
        let normalized = normalize_name(name);
        if self.forbidden_names.iter().any(|n| *n == normalized) {
            return Err(ContentRejection::BlacklistedName);
        }
        Ok(())
    }

    pub fn check_alphabet(&self, message: &str) -> Result<(), ContentRejection> {
        let hit = message
            .chars()
            .any(|c| self.disallowed_ranges.iter().any(|r| r.contains(c)));
        if hit {
            return Err(ContentRejection::DisallowedAlphabet);
        }
        Ok(())
    }
}

pub fn check_links(message: &str) -> Result<(), ContentRejection> {
    if LINK_RE.is_match(message) {
        return Err(ContentRejection::LinkDetected);
    }
    Ok(())
}

/// Lower-case and drop every whitespace character
fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}
