//! Significance tiers for p-values.
//!
//! Tiers are lower-bound inclusive: p = 0.05 is not significant, p = 0.01
//! falls in the `*` tier and p = 0.001 in the `**` tier.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum SignificanceTier {
    /// p >= .05
    NotSignificant,
    /// .01 <= p < .05
    P05,
    /// .001 <= p < .01
    P01,
    /// p < .001
    P001,
}

impl SignificanceTier {
    pub fn from_p(p: f64) -> Self {
        if p >= 0.05 {
            SignificanceTier::NotSignificant
        } else if p >= 0.01 {
            SignificanceTier::P05
        } else if p >= 0.001 {
            SignificanceTier::P01
        } else {
            SignificanceTier::P001
        }
    }

    pub fn is_significant(self) -> bool {
        self != SignificanceTier::NotSignificant
    }

    /// Asterisk code drawn over a significance bracket.
    pub fn asterisks(self) -> Option<&'static str> {
        match self {
            SignificanceTier::NotSignificant => None,
            SignificanceTier::P05 => Some("*"),
            SignificanceTier::P01 => Some("**"),
            SignificanceTier::P001 => Some("***"),
        }
    }

    /// Text reported next to a correlation coefficient.
    pub fn p_clause(p: f64) -> String {
        match Self::from_p(p) {
            SignificanceTier::NotSignificant => format!("p = {:.2}", p),
            SignificanceTier::P05 => "p < .05".to_string(),
            SignificanceTier::P01 => "p < .01".to_string(),
            SignificanceTier::P001 => "p < .001".to_string(),
        }
    }
}

impl fmt::Display for SignificanceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.asterisks().unwrap_or("n.s."))
    }
}
