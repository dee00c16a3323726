//! Compound artifact identifiers.
//!
//! Multi-region builders report one identifier for all their outputs:
//! `region:value` units joined by `,`. A single unit without a `,` is valid.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One `(region, value)` pair out of a compound identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionUnit {
    pub region: String,
    pub value: String,
}

impl RegionUnit {
    pub fn new(region: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for RegionUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.region, self.value)
    }
}

/// A unit did not split into exactly two parts on `:`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("poorly formatted artifact ID: {identifier}")]
pub struct MalformedIdentifier {
    /// The whole identifier, not just the failing unit.
    pub identifier: String,
}

/// Split `identifier` into its units, in input order.
///
/// Fails as a whole if any unit is malformed; no partial result is returned.
/// Duplicate units are kept.
pub fn parse_identifier(identifier: &str) -> Result<Vec<RegionUnit>, MalformedIdentifier> {
    identifier
        .split(',')
        .map(|unit| {
            let mut parts = unit.split(':');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(region), Some(value), None) => Ok(RegionUnit::new(region, value)),
                _ => Err(MalformedIdentifier {
                    identifier: identifier.to_string(),
                }),
            }
        })
        .collect()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn unit() -> impl Strategy<Value = (String, String)> {
        ("[a-z]{2}-[a-z]{4,9}-[1-9]", "ami-[0-9a-f]{8,17}")
    }

    proptest! {
        /// Joining well-formed units and parsing them back preserves count and order.
        #[test]
        fn parse_preserves_order(units in prop::collection::vec(unit(), 1..8)) {
            let identifier = units
                .iter()
                .map(|(r, v)| format!("{r}:{v}"))
                .collect::<Vec<_>>()
                .join(",");
            let parsed = parse_identifier(&identifier).unwrap();
            prop_assert_eq!(parsed.len(), units.len());
            for (unit, (region, value)) in parsed.iter().zip(units.iter()) {
                prop_assert_eq!(&unit.region, region);
                prop_assert_eq!(&unit.value, value);
            }
        }

        /// Any unit without a `:` poisons the whole identifier.
        #[test]
        fn unit_without_colon_is_rejected(
            units in prop::collection::vec(unit(), 0..4),
            bad in "[a-z0-9-]{1,20}",
            at in 0usize..5,
        ) {
            let mut parts: Vec<String> = units.iter().map(|(r, v)| format!("{r}:{v}")).collect();
            let at = at.min(parts.len());
            parts.insert(at, bad);
            let identifier = parts.join(",");
            let err = parse_identifier(&identifier).unwrap_err();
            prop_assert_eq!(err.identifier, identifier);
        }
    }
}
