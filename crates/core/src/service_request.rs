//! Service request lifecycle: statuses, priorities, and the transition table.
//!
//! Statuses are stored as lowercase text in `service_requests.status`; the
//! enum here is the single source of truth for which moves are legal.
//!
//! ```text
//! pending ──► approved ──► in_progress ──► completed
//!    │            │              │
//!    ├──► rejected│              │
//!    └──► cancelled ◄────────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a service request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    InProgress,
    Completed,
    Rejected,
    Cancelled,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 6] = [
        RequestStatus::Pending,
        RequestStatus::Approved,
        RequestStatus::InProgress,
        RequestStatus::Completed,
        RequestStatus::Rejected,
        RequestStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::InProgress => "in_progress",
            RequestStatus::Completed => "completed",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal states accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RequestStatus::Completed | RequestStatus::Rejected | RequestStatus::Cancelled
        )
    }

    /// Statuses reachable from `self` in a single step.
    pub fn next_states(self) -> &'static [RequestStatus] {
        use RequestStatus::*;
        match self {
            Pending => &[Approved, Rejected, Cancelled],
            Approved => &[InProgress, Cancelled],
            InProgress => &[Completed, Cancelled],
            Completed | Rejected | Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, next: RequestStatus) -> bool {
        self.next_states().contains(&next)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RequestStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = RequestStatus::ALL.iter().map(|s| s.as_str()).collect();
                format!(
                    "Invalid request status '{s}'. Must be one of: {}",
                    valid.join(", ")
                )
            })
    }
}

/// Validate a transition, producing a client-facing message on failure.
pub fn validate_transition(from: RequestStatus, to: RequestStatus) -> Result<(), String> {
    if from.can_transition_to(to) {
        return Ok(());
    }
    if from.is_terminal() {
        return Err(format!("Request is already {from} and can no longer change status"));
    }
    Err(format!("Cannot move a request from {from} to {to}"))
}

/// Urgency of a service request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestPriority {
    Low,
    Normal,
    High,
    Urgent,
}

impl RequestPriority {
    pub const ALL: [RequestPriority; 4] = [
        RequestPriority::Low,
        RequestPriority::Normal,
        RequestPriority::High,
        RequestPriority::Urgent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RequestPriority::Low => "low",
            RequestPriority::Normal => "normal",
            RequestPriority::High => "high",
            RequestPriority::Urgent => "urgent",
        }
    }
}

impl Default for RequestPriority {
    fn default() -> Self {
        RequestPriority::Normal
    }
}

impl fmt::Display for RequestPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RequestPriority::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| {
                format!("Invalid priority '{s}'. Must be one of: low, normal, high, urgent")
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use RequestStatus::*;

    #[test]
    fn pending_can_be_approved_rejected_or_cancelled() {
        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(InProgress));
    }

    #[test]
    fn work_flows_forward_only() {
        assert!(Approved.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
        assert!(!InProgress.can_transition_to(Pending));
        assert!(!Approved.can_transition_to(Pending));
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for status in [Completed, Rejected, Cancelled] {
            assert!(status.is_terminal());
            for next in RequestStatus::ALL {
                assert!(!status.can_transition_to(next), "{status} -> {next}");
            }
        }
    }

    #[test]
    fn self_transition_is_not_allowed() {
        for status in RequestStatus::ALL {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn parse_round_trips_through_as_str() {
        for status in RequestStatus::ALL {
            assert_eq!(status.as_str().parse::<RequestStatus>(), Ok(status));
        }
        assert!("done".parse::<RequestStatus>().is_err());
    }

    #[test]
    fn transition_error_messages() {
        let msg = validate_transition(Completed, Cancelled).unwrap_err();
        assert!(msg.contains("already completed"));

        let msg = validate_transition(Pending, Completed).unwrap_err();
        assert_eq!(msg, "Cannot move a request from pending to completed");
    }

    #[test]
    fn priority_parsing_and_order() {
        assert_eq!("urgent".parse::<RequestPriority>(), Ok(RequestPriority::Urgent));
        assert!("critical".parse::<RequestPriority>().is_err());
        assert!(RequestPriority::Urgent > RequestPriority::Low);
        assert_eq!(RequestPriority::default(), RequestPriority::Normal);
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }
}
