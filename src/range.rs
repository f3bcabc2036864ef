//! NuGet version-range (interval notation) parsing and containment
//!
//! A dependency constraint is either a bare version (`1.0`, a pinned
//! version that acts as an inclusive floor) or an interval in NuGet's
//! bracket/paren notation: `[1.0]` exact, `[1.0,2.0)` half-open,
//! `(1.0,)` open minimum, `(,2.0]` no minimum.
//!
//! Containment is three-way rather than boolean: callers picking the
//! closest candidate when nothing matches exactly need to know whether a
//! rejected version fell below or above the range.
//!
//! # Examples
//!
//! ```
//! use nupm::range::{RangePosition, VersionSpec};
//! use nupm::version::NugetVersion;
//!
//! let spec = VersionSpec::parse("[1.0,2.0)").unwrap();
//! let v = NugetVersion::parse("2.0").unwrap();
//! assert_eq!(spec.position_of(&v), RangePosition::Above);
//! ```

use crate::version::NugetVersion;
use crate::{Error, Result};
use std::fmt;

/// Where a candidate version sits relative to a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePosition {
    Below,
    Within,
    Above,
}

/// A parsed version constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpec {
    /// A bare version. Per NuGet semantics this is an inclusive minimum,
    /// not an exact pin: any equal-or-newer version satisfies it.
    Pinned(NugetVersion),
    /// An interval with independently inclusive/exclusive bounds.
    Range {
        min: Option<NugetVersion>,
        min_inclusive: bool,
        max: Option<NugetVersion>,
        max_inclusive: bool,
    },
}

impl VersionSpec {
    /// Parse NuGet range notation.
    ///
    /// `1.0` → pinned; `[1.0]` → exact; `[1.0,2.0)`, `(1.0,)`, `(,2.0]`
    /// → intervals. A single version in parens (`(1.0)`) matches nothing
    /// and is rejected as malformed.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::malformed(input, "empty version spec"));
        }

        let starts_bracketed = trimmed.starts_with('[') || trimmed.starts_with('(');
        let ends_bracketed = trimmed.ends_with(']') || trimmed.ends_with(')');

        if !starts_bracketed && !ends_bracketed {
            return Ok(VersionSpec::Pinned(NugetVersion::parse(trimmed)?));
        }
        if !starts_bracketed || !ends_bracketed {
            return Err(Error::malformed(input, "unbalanced range brackets"));
        }

        let min_inclusive = trimmed.starts_with('[');
        let max_inclusive = trimmed.ends_with(']');
        let inner = &trimmed[1..trimmed.len() - 1];

        let fields: Vec<&str> = inner.split(',').collect();
        match fields.len() {
            1 => {
                // Single-version form: only the fully inclusive [v] is legal.
                if !min_inclusive || !max_inclusive {
                    return Err(Error::malformed(
                        input,
                        "exact-match range must use square brackets",
                    ));
                }
                let v = NugetVersion::parse(fields[0])?;
                Ok(VersionSpec::Range {
                    min: Some(v.clone()),
                    min_inclusive: true,
                    max: Some(v),
                    max_inclusive: true,
                })
            }
            2 => {
                let min = parse_bound(fields[0])?;
                let max = parse_bound(fields[1])?;
                if min.is_none() && max.is_none() {
                    return Err(Error::malformed(input, "range has no bounds"));
                }
                Ok(VersionSpec::Range {
                    min,
                    min_inclusive,
                    max,
                    max_inclusive,
                })
            }
            _ => Err(Error::malformed(input, "too many commas in range")),
        }
    }

    /// Three-way containment test for `candidate`.
    pub fn position_of(&self, candidate: &NugetVersion) -> RangePosition {
        match self {
            VersionSpec::Pinned(v) => {
                if candidate < v {
                    RangePosition::Below
                } else {
                    RangePosition::Within
                }
            }
            VersionSpec::Range {
                min,
                min_inclusive,
                max,
                max_inclusive,
            } => {
                if let Some(min) = min {
                    if candidate < min || (candidate == min && !min_inclusive) {
                        return RangePosition::Below;
                    }
                }
                match max {
                    Some(max) => {
                        if candidate > max || (candidate == max && !max_inclusive) {
                            RangePosition::Above
                        } else {
                            RangePosition::Within
                        }
                    }
                    // Documented quirk: no max but max-inclusive means exact
                    // match against the minimum.
                    None if *max_inclusive => match min {
                        Some(min) if candidate == min => RangePosition::Within,
                        Some(_) => RangePosition::Above,
                        None => RangePosition::Within,
                    },
                    None => RangePosition::Within,
                }
            }
        }
    }

    /// Whether `candidate` satisfies this constraint.
    pub fn is_satisfied_by(&self, candidate: &NugetVersion) -> bool {
        self.position_of(candidate) == RangePosition::Within
    }

    /// The lower bound, if any. A pinned version is its own lower bound.
    pub fn minimum(&self) -> Option<&NugetVersion> {
        match self {
            VersionSpec::Pinned(v) => Some(v),
            VersionSpec::Range { min, .. } => min.as_ref(),
        }
    }

    /// The upper bound, if any.
    pub fn maximum(&self) -> Option<&NugetVersion> {
        match self {
            VersionSpec::Pinned(_) => None,
            VersionSpec::Range { max, .. } => max.as_ref(),
        }
    }

    /// The exactly pinned version when this spec admits only one:
    /// a bare version, or an exact `[v]` range.
    pub fn exact_version(&self) -> Option<&NugetVersion> {
        match self {
            VersionSpec::Pinned(v) => Some(v),
            VersionSpec::Range {
                min: Some(min),
                min_inclusive: true,
                max: Some(max),
                max_inclusive: true,
            } if min == max => Some(min),
            _ => None,
        }
    }
}

fn parse_bound(field: &str) -> Result<Option<NugetVersion>> {
    let field = field.trim();
    if field.is_empty() {
        Ok(None)
    } else {
        Ok(Some(NugetVersion::parse(field)?))
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSpec::Pinned(v) => write!(f, "{}", v),
            VersionSpec::Range {
                min,
                min_inclusive,
                max,
                max_inclusive,
            } => {
                if let (Some(min), Some(max)) = (min.as_ref(), max.as_ref()) {
                    if min == max && *min_inclusive && *max_inclusive {
                        return write!(f, "[{}]", min);
                    }
                }
                write!(f, "{}", if *min_inclusive { '[' } else { '(' })?;
                if let Some(min) = min {
                    write!(f, "{}", min)?;
                }
                write!(f, ",")?;
                if let Some(max) = max {
                    write!(f, "{}", max)?;
                }
                write!(f, "{}", if *max_inclusive { ']' } else { ')' })
            }
        }
    }
}
