//! # Node Selectors
//!
//! Users refer to nodes either by position or by stable identity:
//!
//! - **Path**: `100-200` (or explicitly `mp:100-200`)
//! - **SID**: `k3j9x0a2mq` (or explicitly `sid:k3j9x0a2mq`)
//!
//! Unprefixed input is classified by shape. A path is 3-digit groups joined by
//! dashes, a SID is 8-12 alphanumeric characters without dashes, so no input
//! matches both. Positions change when nodes move; SIDs never do, which makes
//! them the safer choice for scripts.
//!
//! [`Selector`] remembers whether the user wrote a prefix so that `Display`
//! reproduces what they typed.

use crate::error::{BinderError, Result};
use crate::model::Sid;
use crate::path::MaterializedPath;
use std::fmt;
use std::str::FromStr;

const MP_PREFIX: &str = "mp:";
const SID_PREFIX: &str = "sid:";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    Path(MaterializedPath),
    Sid(Sid),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selector {
    pub target: Target,
    /// True when the input carried an `mp:` / `sid:` prefix.
    pub explicit: bool,
}

impl Selector {
    pub fn path(mp: MaterializedPath) -> Self {
        Self {
            target: Target::Path(mp),
            explicit: false,
        }
    }

    pub fn sid(sid: Sid) -> Self {
        Self {
            target: Target::Sid(sid),
            explicit: false,
        }
    }

    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let invalid = || BinderError::InvalidSelector(input.to_string());

        if trimmed.is_empty() {
            return Err(invalid());
        }

        if let Some(rest) = trimmed.strip_prefix(MP_PREFIX) {
            let mp = MaterializedPath::parse(rest).map_err(|_| invalid())?;
            return Ok(Self {
                target: Target::Path(mp),
                explicit: true,
            });
        }

        if let Some(rest) = trimmed.strip_prefix(SID_PREFIX) {
            let sid = Sid::parse(rest).map_err(|_| invalid())?;
            return Ok(Self {
                target: Target::Sid(sid),
                explicit: true,
            });
        }

        if trimmed.contains(':') {
            return Err(invalid());
        }

        if let Ok(mp) = MaterializedPath::parse(trimmed) {
            return Ok(Self::path(mp));
        }

        if let Ok(sid) = Sid::parse(trimmed) {
            return Ok(Self::sid(sid));
        }

        Err(invalid())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.target, self.explicit) {
            (Target::Path(mp), true) => write!(f, "{}{}", MP_PREFIX, mp),
            (Target::Path(mp), false) => write!(f, "{}", mp),
            (Target::Sid(sid), true) => write!(f, "{}{}", SID_PREFIX, sid),
            (Target::Sid(sid), false) => write!(f, "{}", sid),
        }
    }
}

impl FromStr for Selector {
    type Err = BinderError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_implicit_classification() {
        let s = Selector::parse("100-200").unwrap();
        assert!(matches!(s.target, Target::Path(_)));
        assert!(!s.explicit);

        let s = Selector::parse("abcd1234").unwrap();
        assert!(matches!(s.target, Target::Sid(_)));

        // Eight digits is not a 3-digit path, so it is a SID.
        let s = Selector::parse("12345678").unwrap();
        assert!(matches!(s.target, Target::Sid(_)));

        let s = Selector::parse("123").unwrap();
        assert!(matches!(s.target, Target::Path(_)));
    }

    #[test]
    fn test_explicit_prefixes() {
        let s = Selector::parse("mp:001-002").unwrap();
        assert!(s.explicit);
        assert_eq!(s.target, Target::Path(MaterializedPath::parse("001-002").unwrap()));

        let s = Selector::parse("  sid:abcd1234 ").unwrap();
        assert!(s.explicit);
        assert_eq!(s.target, Target::Sid(Sid::parse("abcd1234").unwrap()));
    }

    #[test]
    fn test_rejections() {
        for bad in ["", "   ", "mp:abc", "sid:short", "foo:100", "100-000", "abc", "100-2000", "a-b-c-d-e-f"] {
            assert!(
                matches!(Selector::parse(bad), Err(BinderError::InvalidSelector(_))),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_display_round_trips_user_intent() {
        for input in ["mp:100-200", "100-200", "sid:abcd1234", "abcd1234"] {
            assert_eq!(Selector::parse(input).unwrap().to_string(), input);
        }
    }
}
