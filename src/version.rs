// SPDX-License-Identifier: MPL-2.0

//! Semantic versions with pre-release and build tags.

use std::cmp::Ordering;
use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use thiserror::Error;

/// Type for semantic versions: `MAJOR.MINOR.PATCH`, optionally followed by
/// `-PRE` and `+BUILD`.
///
/// A version without a pre-release tag is strictly greater than the same
/// triple with one, and two pre-release tags compare lexicographically.
/// The build tag is kept in the string form but ignored by comparisons and
/// hashing, so `1.0.0+a` and `1.0.0+b` are equal.
#[derive(Debug, Clone)]
pub struct SemanticVersion {
    major: u32,
    minor: u32,
    patch: u32,
    pre: Option<String>,
    build: Option<String>,
}

// Constructors
impl SemanticVersion {
    /// Create a version with "major", "minor" and "patch" values.
    /// `version = major.minor.patch`
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            pre: None,
            build: None,
        }
    }

    /// Attach a pre-release tag, e.g. turning `1.0.0` into `1.0.0-alpha.1`.
    /// The tag is not validated; use [`FromStr`] for checked input.
    pub fn with_pre(mut self, pre: impl Into<String>) -> Self {
        self.pre = Some(pre.into());
        self
    }

    /// The pre-release tag, if any.
    pub fn pre(&self) -> Option<&str> {
        self.pre.as_deref()
    }
}

// Convert a tuple (major, minor, patch) into a version.
impl From<(u32, u32, u32)> for SemanticVersion {
    fn from(tuple: (u32, u32, u32)) -> Self {
        let (major, minor, patch) = tuple;
        Self::new(major, minor, patch)
    }
}

// Bump versions.
impl SemanticVersion {
    /// The smallest version with a higher patch number.
    pub fn bump_patch(&self) -> Self {
        Self::new(self.major, self.minor, self.patch + 1)
    }

    /// The smallest version with a higher minor number.
    pub fn bump_minor(&self) -> Self {
        Self::new(self.major, self.minor + 1, 0)
    }

    /// The smallest version with a higher major number.
    pub fn bump_major(&self) -> Self {
        Self::new(self.major + 1, 0, 0)
    }
}

impl PartialEq for SemanticVersion {
    fn eq(&self, other: &Self) -> bool {
        (self.major, self.minor, self.patch) == (other.major, other.minor, other.patch)
            && self.pre == other.pre
    }
}

impl Eq for SemanticVersion {}

impl Hash for SemanticVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.major, self.minor, self.patch).hash(state);
        self.pre.hash(state);
    }
}

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.pre, &other.pre) {
                (None, None) => Ordering::Equal,
                // A release is greater than any of its pre-releases.
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            })
    }
}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre {
            write!(f, "-{}", pre)?;
        }
        if let Some(build) = &self.build {
            write!(f, "+{}", build)?;
        }
        Ok(())
    }
}

/// Error creating [`SemanticVersion`] from a string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionParseError {
    /// The version does not have three dot-separated numeric parts.
    #[error("version \"{full_version}\" must have three numeric parts")]
    NotThreeParts {
        /// The version that was being parsed.
        full_version: String,
    },
    /// One of the numeric parts failed to parse.
    #[error("could not parse \"{version_part}\" in \"{full_version}\" as a number")]
    ParseIntError {
        /// The version that was being parsed.
        full_version: String,
        /// The part that failed.
        version_part: String,
    },
    /// The pre-release or build tag contains a forbidden character.
    #[error("tag \"{tag}\" in \"{full_version}\" contains invalid characters")]
    InvalidTag {
        /// The version that was being parsed.
        full_version: String,
        /// The offending tag.
        tag: String,
    },
}

/// Pre-release and build tags are dotted identifiers over `[A-Za-z0-9.-]`.
fn valid_tag(tag: &str) -> bool {
    !tag.is_empty()
        && tag
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'-')
}

impl FromStr for SemanticVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let not_three_parts = || VersionParseError::NotThreeParts {
            full_version: s.to_string(),
        };
        let invalid_tag = |tag: &str| VersionParseError::InvalidTag {
            full_version: s.to_string(),
            tag: tag.to_string(),
        };

        let (triple_and_pre, build) = match s.split_once('+') {
            Some((head, build)) if valid_tag(build) => (head, Some(build.to_string())),
            Some((_, build)) => return Err(invalid_tag(build)),
            None => (s, None),
        };
        let (triple, pre) = match triple_and_pre.split_once('-') {
            Some((head, pre)) if valid_tag(pre) => (head, Some(pre.to_string())),
            Some((_, pre)) => return Err(invalid_tag(pre)),
            None => (triple_and_pre, None),
        };

        let mut parts = triple.split('.');
        let mut next_number = || -> Result<u32, VersionParseError> {
            let part = parts.next().ok_or_else(not_three_parts)?;
            part.parse().map_err(|_| VersionParseError::ParseIntError {
                full_version: s.to_string(),
                version_part: part.to_string(),
            })
        };
        let major = next_number()?;
        let minor = next_number()?;
        let patch = next_number()?;
        if parts.next().is_some() {
            return Err(not_three_parts());
        }
        Ok(Self {
            major,
            minor,
            patch,
            pre,
            build,
        })
    }
}

// TESTS #######################################################################
