//! Storefront placement for injected scripts.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The storefront page a script is injected into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// The pre-purchase payment/information page.
    Checkout,
    /// The post-purchase order confirmation page.
    ThankYouPage,
}

/// Error returned when parsing an unknown placement string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown placement: {0}")]
pub struct PlacementParseError(pub String);

impl Placement {
    /// The canonical string form, matching the serde representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Checkout => "checkout",
            Self::ThankYouPage => "thank_you_page",
        }
    }
}

impl core::fmt::Display for Placement {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Placement {
    type Err = PlacementParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "checkout" => Ok(Self::Checkout),
            "thank_you_page" => Ok(Self::ThankYouPage),
            other => Err(PlacementParseError(other.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_string_roundtrip() {
        for placement in [Placement::Checkout, Placement::ThankYouPage] {
            let parsed: Placement = placement.as_str().parse().unwrap();
            assert_eq!(parsed, placement);
        }
    }

    #[test]
    fn test_placement_rejects_unknown() {
        let err = "sidebar".parse::<Placement>().unwrap_err();
        assert_eq!(err, PlacementParseError("sidebar".to_string()));
    }

    #[test]
    fn test_placement_serde_snake_case() {
        let json = serde_json::to_string(&Placement::ThankYouPage).unwrap();
        assert_eq!(json, "\"thank_you_page\"");
        let back: Placement = serde_json::from_str("\"checkout\"").unwrap();
        assert_eq!(back, Placement::Checkout);
    }
}
