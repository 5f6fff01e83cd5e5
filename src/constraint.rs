// SPDX-License-Identifier: MPL-2.0

//! The textual constraint grammar used by scenario files.
//!
//! Accepted forms:
//! - `*` or the empty string: any version
//! - `X.Y.Z` with no operator: exactly that version
//! - `>=v`, `>v`, `<=v`, `<v`, alone or combined in a comma-separated list
//! - `~X.Y.Z`: `[X.Y.Z, X.(Y+1).0)`
//! - `^X.Y.Z`: `[X.Y.Z, (X+1).0.0)`

use thiserror::Error;
use version_sets::VersionSet;

use crate::version::{SemanticVersion, VersionParseError};

/// Error parsing a version constraint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstraintParseError {
    /// A version inside the constraint failed to parse.
    #[error("invalid version in constraint \"{constraint}\": {source}")]
    Version {
        /// The constraint that was being parsed.
        constraint: String,
        /// The underlying version error.
        source: VersionParseError,
    },
    /// An operator or part of the constraint is not part of the grammar.
    #[error("unsupported constraint part \"{part}\" in \"{constraint}\"")]
    Unsupported {
        /// The constraint that was being parsed.
        constraint: String,
        /// The part that was not recognized.
        part: String,
    },
}

/// Parse a constraint into a canonical version set.
pub fn parse_constraint(input: &str) -> Result<VersionSet<SemanticVersion>, ConstraintParseError> {
    let constraint = input.trim();
    if constraint.is_empty() || constraint == "*" {
        return Ok(VersionSet::full());
    }

    let version = |part: &str| -> Result<SemanticVersion, ConstraintParseError> {
        part.trim()
            .parse()
            .map_err(|source| ConstraintParseError::Version {
                constraint: input.to_string(),
                source,
            })
    };

    // Comma-separated comparator lists intersect through the set algebra.
    if constraint.contains(',') {
        let mut set = VersionSet::full();
        for part in constraint.split(',') {
            let part = part.trim();
            let half = comparator(part, input, &version)?;
            set = set.intersection(&half);
        }
        return Ok(set);
    }

    if let Some(rest) = constraint.strip_prefix('~') {
        let low = version(rest)?;
        return Ok(VersionSet::between(low.clone(), low.bump_minor()));
    }
    if let Some(rest) = constraint.strip_prefix('^') {
        let low = version(rest)?;
        return Ok(VersionSet::between(low.clone(), low.bump_major()));
    }
    if constraint.starts_with(['>', '<']) {
        return comparator(constraint, input, &version);
    }

    // No operator at all: exactly that version.
    Ok(VersionSet::singleton(version(constraint)?))
}

fn comparator(
    part: &str,
    whole: &str,
    version: &impl Fn(&str) -> Result<SemanticVersion, ConstraintParseError>,
) -> Result<VersionSet<SemanticVersion>, ConstraintParseError> {
    if let Some(rest) = part.strip_prefix(">=") {
        Ok(VersionSet::higher_than(version(rest)?))
    } else if let Some(rest) = part.strip_prefix("<=") {
        Ok(VersionSet::lower_than(version(rest)?))
    } else if let Some(rest) = part.strip_prefix('>') {
        Ok(VersionSet::strictly_higher_than(version(rest)?))
    } else if let Some(rest) = part.strip_prefix('<') {
        Ok(VersionSet::strictly_lower_than(version(rest)?))
    } else {
        Err(ConstraintParseError::Unsupported {
            constraint: whole.to_string(),
            part: part.to_string(),
        })
    }
}

// TESTS #######################################################################
