use crate::{CastError, RVec};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::OnceLock;

fn sbp_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(?:(B)|(P)|S\((\d+)\))$").expect("valid SBP pattern"))
}

/// How one hierarchy axis of a placement distributes a logical tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sbp {
    /// Each device holds one contiguous chunk along the given tensor axis.
    Split(usize),
    /// Each device holds the whole tensor.
    Broadcast,
    /// Each device holds a full-shaped partial value; the logical tensor is their sum.
    PartialSum,
}

impl Sbp {
    pub fn split_axis(&self) -> Option<usize> {
        match self {
            Sbp::Split(axis) => Some(*axis),
            _ => None,
        }
    }
}

impl FromStr for Sbp {
    type Err = CastError;

    /// Accepts `B`, `P` or `S(<axis>)`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CastError::InvalidSbp(s.to_string());
        let caps = sbp_pattern().captures(s.trim()).ok_or_else(invalid)?;
        if caps.get(1).is_some() {
            Ok(Sbp::Broadcast)
        } else if caps.get(2).is_some() {
            Ok(Sbp::PartialSum)
        } else {
            caps.get(3)
                .and_then(|axis| axis.as_str().parse().ok())
                .map(Sbp::Split)
                .ok_or_else(invalid)
        }
    }
}

impl std::fmt::Display for Sbp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sbp::Split(axis) => write!(f, "S({})", axis),
            Sbp::Broadcast => write!(f, "B"),
            Sbp::PartialSum => write!(f, "P"),
        }
    }
}

/// One [`Sbp`] per axis of a placement hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NdSbp(RVec<Sbp>);

impl NdSbp {
    pub fn new(sbps: RVec<Sbp>) -> Self {
        Self(sbps)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sbp> {
        self.0.iter()
    }
}

impl From<Sbp> for NdSbp {
    fn from(sbp: Sbp) -> Self {
        Self(std::iter::once(sbp).collect())
    }
}

impl FromIterator<Sbp> for NdSbp {
    fn from_iter<I: IntoIterator<Item = Sbp>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FromStr for NdSbp {
    type Err = CastError;

    /// Comma separated, e.g. `S(0),B`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let sbps = s
            .split(',')
            .map(str::parse::<Sbp>)
            .collect::<Result<NdSbp, _>>()?;
        if sbps.is_empty() {
            return Err(CastError::InvalidSbp(s.to_string()));
        }
        Ok(sbps)
    }
}

impl std::fmt::Display for NdSbp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (idx, sbp) in self.0.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", sbp)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sbp() {
        assert_eq!("B".parse::<Sbp>().unwrap(), Sbp::Broadcast);
        assert_eq!("P".parse::<Sbp>().unwrap(), Sbp::PartialSum);
        assert_eq!("S(12)".parse::<Sbp>().unwrap(), Sbp::Split(12));
        let overflow = "S(99999999999999999999999)";
        for bad in ["S()", "S(-1)", "S(1", "X", "", "BP", "S(1)B", overflow] {
            assert!(
                matches!(bad.parse::<Sbp>(), Err(CastError::InvalidSbp(_))),
                "{} should not parse",
                bad
            );
        }
    }

    #[test]
    fn test_parse_nd_sbp() {
        let nd: NdSbp = "S(0), B".parse().unwrap();
        assert_eq!(nd.len(), 2);
        assert_eq!(nd.to_string(), "(S(0), B)");
        assert!("S(0),".parse::<NdSbp>().is_err());
    }
}
