//! # Negotiation Preferences
//!
//! Closed enumerations attached to a swap request by its requester. They
//! carry no lifecycle semantics; the state machine never reads them. Each
//! enum has a single string form shared by JSON and the database column.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident, field = $field:literal, default = $default:ident, expected = $expected:literal,
        { $( $(#[$vmeta:meta])* $variant:ident => $s:literal ),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $s)] $variant, )+
        }

        impl $name {
            /// All variants in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The canonical string form (JSON and storage).
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s,)+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant),)+
                    other => Err(ValidationError::UnknownVariant {
                        field: $field,
                        value: other.to_string(),
                        expected: $expected,
                    }),
                }
            }
        }
    };
}

string_enum!(
    /// How urgent the requester considers the swap.
    Priority, field = "priority", default = Medium, expected = "low, medium, high",
    {
        /// Whenever convenient.
        Low => "low",
        /// The default.
        Medium => "medium",
        /// As soon as the provider can.
        High => "high",
    }
);

string_enum!(
    /// Where the requester would like to meet.
    MeetingType, field = "preferredMeetingType", default = Either,
    expected = "online, in-person, either",
    {
        /// Video or chat.
        Online => "online",
        /// Face to face.
        InPerson => "in-person",
        /// No preference.
        Either => "either",
    }
);

string_enum!(
    /// When the requester would like the swap to happen.
    Timeline, field = "timeline", default = Flexible,
    expected = "asap, this-week, this-month, flexible",
    {
        /// As soon as possible.
        Asap => "asap",
        /// Within the current week.
        ThisWeek => "this-week",
        /// Within the current month.
        ThisMonth => "this-month",
        /// No deadline.
        Flexible => "flexible",
    }
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn defaults_match_negotiation_defaults() {
        assert_eq!(Priority::default(), Priority::Medium);
        assert_eq!(MeetingType::default(), MeetingType::Either);
        assert_eq!(Timeline::default(), Timeline::Flexible);
    }

    #[test]
    fn kebab_case_wire_names() {
        assert_eq!(
            serde_json::to_string(&MeetingType::InPerson).unwrap(),
            "\"in-person\""
        );
        assert_eq!(
            serde_json::to_string(&Timeline::ThisMonth).unwrap(),
            "\"this-month\""
        );
    }

    #[test]
    fn from_str_matches_as_str_for_every_variant() {
        for p in Priority::ALL {
            assert_eq!(Priority::from_str(p.as_str()).unwrap(), *p);
        }
        for m in MeetingType::ALL {
            assert_eq!(MeetingType::from_str(m.as_str()).unwrap(), *m);
        }
        for t in Timeline::ALL {
            assert_eq!(Timeline::from_str(t.as_str()).unwrap(), *t);
        }
    }

    #[test]
    fn unknown_value_is_rejected_with_field_name() {
        let err = Timeline::from_str("next-year").unwrap_err();
        assert!(err.to_string().contains("timeline"));
        assert!(err.to_string().contains("this-week"));
    }

    #[test]
    fn deserialize_rejects_unknown_priority() {
        let result: Result<Priority, _> = serde_json::from_str("\"urgent\"");
        assert!(result.is_err());
    }
}
