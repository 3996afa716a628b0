//! Lifecycle status of a swap request.

use serde::{Deserialize, Serialize};
use skillswap_core::ValidationError;

/// Where a swap request is in its negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapStatus {
    /// Awaiting the provider's answer.
    Pending,
    /// Provider agreed; the swap can now be completed.
    Accepted,
    /// Provider refused (terminal).
    Declined,
    /// Either party marked the accepted swap as done (terminal).
    Completed,
}

impl SwapStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::Accepted,
        Self::Declined,
        Self::Completed,
    ];

    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Declined | Self::Completed)
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Accepted)
                | (Self::Pending, Self::Declined)
                | (Self::Accepted, Self::Completed)
        )
    }

    /// Position in the lifecycle; strictly increases along every legal edge.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Accepted => 1,
            Self::Declined | Self::Completed => 2,
        }
    }

    /// The wire and storage form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for SwapStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SwapStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "declined" => Ok(Self::Declined),
            "completed" => Ok(Self::Completed),
            other => Err(ValidationError::UnknownVariant {
                field: "status",
                value: other.to_string(),
                expected: "pending, accepted, declined, completed",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legal_edges() {
        use SwapStatus::*;
        let legal: Vec<(SwapStatus, SwapStatus)> = SwapStatus::ALL
            .iter()
            .flat_map(|a| SwapStatus::ALL.iter().map(move |b| (*a, *b)))
            .filter(|(a, b)| a.can_transition_to(*b))
            .collect();
        assert_eq!(
            legal,
            vec![(Pending, Accepted), (Pending, Declined), (Accepted, Completed)]
        );
    }

    #[test]
    fn terminal_states_have_no_successors() {
        for s in SwapStatus::ALL.iter().filter(|s| s.is_terminal()) {
            assert!(SwapStatus::ALL.iter().all(|n| !s.can_transition_to(*n)));
        }
    }

    #[test]
    fn every_edge_increases_rank() {
        for a in SwapStatus::ALL {
            for b in SwapStatus::ALL {
                if a.can_transition_to(b) {
                    assert!(b.rank() > a.rank(), "{a} -> {b}");
                }
            }
        }
    }

    #[test]
    fn string_forms_round_trip() {
        for s in SwapStatus::ALL {
            assert_eq!(s.as_str().parse::<SwapStatus>().unwrap(), s);
            assert_eq!(
                serde_json::to_string(&s).unwrap(),
                format!("\"{}\"", s.as_str())
            );
        }
    }

    #[test]
    fn unknown_status_rejected() {
        assert!("cancelled".parse::<SwapStatus>().is_err());
        assert!("Pending".parse::<SwapStatus>().is_err());
    }
}
