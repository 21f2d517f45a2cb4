//! Typed UUID identifiers.
//!
//! # Responsibility
//! - Wrap `Uuid` in one concrete type per entity so ids cannot be mixed up.
//! - Provide wire (serde) and storage (rusqlite) mapping for each wrapper.
//!
//! # Invariants
//! - Two ids are equal iff their 128 bits are equal.
//! - Ordering compares the upper 64 bits as unsigned integers, then the lower
//!   64 bits as unsigned integers. This matches the byte order PostgreSQL and
//!   SQLite text collation use for canonical UUID strings.
//! - Storage representation is the canonical hyphenated lowercase string.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

macro_rules! wrapped_uuid {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a fresh random (v4) id.
            pub fn new_v4() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID.
            pub const fn from_uuid(value: Uuid) -> Self {
                Self(value)
            }

            /// Returns the wrapped UUID.
            pub const fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0.hyphenated())
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(value).map(Self)
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                compare_unsigned(self.0, other.0)
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.to_string()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let text = value.as_str()?;
                Uuid::parse_str(text)
                    .map(Self)
                    .map_err(|err| FromSqlError::Other(Box::new(err)))
            }
        }
    };
}

wrapped_uuid!(
    /// Stable identifier of one job architecture item.
    JobArchitectureItemId
);

wrapped_uuid!(
    /// Identifier of the user recorded as an item creator.
    UserId
);

fn compare_unsigned(left: Uuid, right: Uuid) -> Ordering {
    let (left_high, left_low) = left.as_u64_pair();
    let (right_high, right_low) = right.as_u64_pair();
    left_high
        .cmp(&right_high)
        .then_with(|| left_low.cmp(&right_low))
}

#[cfg(test)]
mod tests {
    use super::{JobArchitectureItemId, UserId};
    use std::str::FromStr;

    fn item_id(value: &str) -> JobArchitectureItemId {
        JobArchitectureItemId::from_str(value).unwrap()
    }

    #[test]
    fn ordering_treats_upper_half_as_unsigned() {
        let low = item_id("50000000-0000-4000-8000-000000000000");
        let seven = item_id("70000000-0000-4000-8000-000000000000");
        let high = item_id("90000000-0000-4000-8000-000000000000");

        assert!(seven > low);
        assert!(high > low);
        assert!(high > seven);
    }

    #[test]
    fn ordering_treats_lower_half_as_unsigned() {
        let low = item_id("00000000-0000-4000-5000-000000000000");
        let seven = item_id("00000000-0000-4000-7000-000000000000");
        let high = item_id("00000000-0000-4000-9000-000000000000");

        assert!(seven > low);
        assert!(high > low);
        assert!(high > seven);
    }

    #[test]
    fn ordering_breaks_upper_ties_with_lower_half() {
        let first = item_id("12345678-0000-4000-0000-000000000001");
        let second = item_id("12345678-0000-4000-0000-000000000002");

        assert!(first < second);
        assert_eq!(first.cmp(&first), std::cmp::Ordering::Equal);
    }

    #[test]
    fn sorting_matches_canonical_string_order() {
        let mut ids: Vec<_> = (0..32).map(|_| JobArchitectureItemId::new_v4()).collect();
        let mut as_text: Vec<_> = ids.iter().map(ToString::to_string).collect();

        ids.sort();
        as_text.sort();

        let sorted_text: Vec<_> = ids.iter().map(ToString::to_string).collect();
        assert_eq!(sorted_text, as_text);
    }

    #[test]
    fn display_uses_hyphenated_form() {
        let text = "eb184430-ab14-434e-a459-faf7ad919429";
        let id = UserId::from_str(text).unwrap();
        assert_eq!(id.to_string(), text);
        assert_eq!(id.to_string().len(), 36);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(JobArchitectureItemId::from_str("not-a-uuid").is_err());
    }
}
