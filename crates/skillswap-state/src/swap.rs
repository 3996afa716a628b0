//! # Swap Request Record
//!
//! The negotiation record and the rules for moving it through its lifecycle.
//!
//! | Step       | Who                    | From       | To          |
//! |------------|------------------------|------------|-------------|
//! | create     | requester              | (none)     | `pending`   |
//! | accept     | provider               | `pending`  | `accepted`  |
//! | decline    | provider               | `pending`  | `declined`  |
//! | complete   | requester or provider  | `accepted` | `completed` |
//! | cancel     | requester              | `pending`  | (deleted)   |
//!
//! `responded_at` is stamped on accept and decline and never changes again,
//! so it is `None` exactly while the record is `pending`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skillswap_core::{
    MeetingType, Note, Priority, SkillLabel, SwapRequestId, Timeline, UserId, ValidationError,
};

use crate::error::TransitionError;
use crate::status::SwapStatus;

// ─── Roles and actions ───────────────────────────────────────────────

/// Which side of a request a principal is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartyRole {
    /// Initiated the request.
    Requester,
    /// Was asked to provide the skill.
    Provider,
}

/// The provider's answer to a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RespondAction {
    /// Agree to the swap.
    Accept,
    /// Refuse the swap.
    Decline,
}

impl RespondAction {
    /// Status the record moves to.
    pub fn target(&self) -> SwapStatus {
        match self {
            Self::Accept => SwapStatus::Accepted,
            Self::Decline => SwapStatus::Declined,
        }
    }

    /// The wire form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Decline => "decline",
        }
    }

    /// Past tense, for response messages.
    pub fn past_tense(&self) -> &'static str {
        match self {
            Self::Accept => "accepted",
            Self::Decline => "declined",
        }
    }
}

impl std::str::FromStr for RespondAction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accept" => Ok(Self::Accept),
            "decline" => Ok(Self::Decline),
            other => Err(ValidationError::UnknownVariant {
                field: "action",
                value: other.to_string(),
                expected: "accept, decline",
            }),
        }
    }
}

// ─── Input ───────────────────────────────────────────────────────────

/// Validated fields for a new request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSwapRequest {
    /// Principal creating the request.
    pub requester_id: UserId,
    /// Principal being asked.
    pub provider_id: UserId,
    /// Skill being requested.
    pub skill_requested: SkillLabel,
    /// Category of that skill.
    pub skill_category: SkillLabel,
    /// Optional note to the provider.
    pub message: Note,
    /// Urgency.
    pub priority: Priority,
    /// Meeting preference.
    pub preferred_meeting_type: MeetingType,
    /// When the requester wants it.
    pub timeline: Timeline,
}

// ─── Record ──────────────────────────────────────────────────────────

/// A swap request as stored and returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    /// Assigned at creation, never changes.
    pub id: SwapRequestId,
    /// Principal who created the request.
    pub requester_id: UserId,
    /// Principal asked to provide the skill.
    pub provider_id: UserId,
    /// Skill being requested.
    pub skill_requested: SkillLabel,
    /// Category of that skill.
    pub skill_category: SkillLabel,
    /// Requester's note, empty when none was given.
    pub message: Note,
    /// Provider's note, empty until a response carries one.
    pub response_message: Note,
    /// Lifecycle status.
    pub status: SwapStatus,
    /// Urgency.
    pub priority: Priority,
    /// Meeting preference.
    pub preferred_meeting_type: MeetingType,
    /// When the requester wants it.
    pub timeline: Timeline,
    /// Set on accept or decline.
    pub responded_at: Option<DateTime<Utc>>,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Last write instant.
    pub updated_at: DateTime<Utc>,
}

impl SwapRequest {
    /// Build a fresh `pending` record.
    ///
    /// # Errors
    ///
    /// [`TransitionError::SelfRequest`] if requester and provider coincide.
    pub fn new_pending(input: NewSwapRequest, now: DateTime<Utc>) -> Result<Self, TransitionError> {
        if input.requester_id == input.provider_id {
            return Err(TransitionError::SelfRequest);
        }
        Ok(Self {
            id: SwapRequestId::new(),
            requester_id: input.requester_id,
            provider_id: input.provider_id,
            skill_requested: input.skill_requested,
            skill_category: input.skill_category,
            message: input.message,
            response_message: Note::empty(),
            status: SwapStatus::Pending,
            priority: input.priority,
            preferred_meeting_type: input.preferred_meeting_type,
            timeline: input.timeline,
            responded_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// The caller's role on this request, if any.
    pub fn party_role(&self, caller: UserId) -> Option<PartyRole> {
        if caller == self.requester_id {
            Some(PartyRole::Requester)
        } else if caller == self.provider_id {
            Some(PartyRole::Provider)
        } else {
            None
        }
    }

    /// Require the caller to be one of the two parties.
    ///
    /// # Errors
    ///
    /// [`TransitionError::Forbidden`] for anyone else.
    pub fn ensure_party(&self, caller: UserId) -> Result<PartyRole, TransitionError> {
        self.party_role(caller).ok_or(TransitionError::Forbidden(
            "access denied: you are not involved in this request",
        ))
    }

    /// Whether the record can still change.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// The provider accepts or declines (`pending → accepted | declined`).
    ///
    /// # Errors
    ///
    /// `Forbidden` unless the caller is the provider, then
    /// `InvalidTransition` unless the record is `pending`.
    pub fn respond(
        &self,
        caller: UserId,
        action: RespondAction,
        response_message: Note,
        now: DateTime<Utc>,
    ) -> Result<Self, TransitionError> {
        if self.party_role(caller) != Some(PartyRole::Provider) {
            return Err(TransitionError::Forbidden(
                "access denied: only the provider can respond to this request",
            ));
        }
        self.require_status(
            SwapStatus::Pending,
            action.as_str(),
            "this request has already been responded to",
        )?;

        let mut next = self.clone();
        next.status = action.target();
        next.response_message = response_message;
        next.responded_at = Some(now);
        next.updated_at = now;
        Ok(next)
    }

    /// Either party marks an accepted swap as done (`accepted → completed`).
    ///
    /// # Errors
    ///
    /// `Forbidden` for a third party, then `InvalidTransition` unless the
    /// record is `accepted`.
    pub fn complete(&self, caller: UserId, now: DateTime<Utc>) -> Result<Self, TransitionError> {
        self.ensure_party(caller)?;
        self.require_status(
            SwapStatus::Accepted,
            "complete",
            "only accepted requests can be marked as completed",
        )?;

        let mut next = self.clone();
        next.status = SwapStatus::Completed;
        next.updated_at = now;
        Ok(next)
    }

    /// Check that the caller may withdraw this request (`pending → deleted`).
    ///
    /// # Errors
    ///
    /// `Forbidden` unless the caller is the requester, then
    /// `InvalidTransition` unless the record is `pending`.
    pub fn ensure_cancellable(&self, caller: UserId) -> Result<(), TransitionError> {
        if self.party_role(caller) != Some(PartyRole::Requester) {
            return Err(TransitionError::Forbidden(
                "access denied: only the requester can cancel this request",
            ));
        }
        self.require_status(
            SwapStatus::Pending,
            "cancel",
            "only pending requests can be cancelled",
        )
    }

    fn require_status(
        &self,
        expected: SwapStatus,
        action: &'static str,
        reason: &'static str,
    ) -> Result<(), TransitionError> {
        if self.status != expected {
            return Err(TransitionError::InvalidTransition {
                from: self.status,
                action,
                reason,
            });
        }
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn input(requester: UserId, provider: UserId) -> NewSwapRequest {
        NewSwapRequest {
            requester_id: requester,
            provider_id: provider,
            skill_requested: SkillLabel::new("skillRequested", "Guitar").unwrap(),
            skill_category: SkillLabel::new("skillCategory", "Music").unwrap(),
            message: Note::new("message", "Teach me chords").unwrap(),
            priority: Priority::default(),
            preferred_meeting_type: MeetingType::default(),
            timeline: Timeline::default(),
        }
    }

    struct Parties {
        requester: UserId,
        provider: UserId,
        stranger: UserId,
    }

    fn pending() -> (SwapRequest, Parties) {
        let p = Parties {
            requester: UserId::new(),
            provider: UserId::new(),
            stranger: UserId::new(),
        };
        let req = SwapRequest::new_pending(input(p.requester, p.provider), t(0)).unwrap();
        (req, p)
    }

    fn note(s: &str) -> Note {
        Note::new("responseMessage", s).unwrap()
    }

    // ── Creation ─────────────────────────────────────────────────────

    #[test]
    fn new_request_is_pending_with_defaults() {
        let (req, _) = pending();
        assert_eq!(req.status, SwapStatus::Pending);
        assert_eq!(req.responded_at, None);
        assert!(req.response_message.is_empty());
        assert_eq!(req.priority, Priority::Medium);
        assert_eq!(req.preferred_meeting_type, MeetingType::Either);
        assert_eq!(req.timeline, Timeline::Flexible);
        assert_eq!(req.created_at, req.updated_at);
    }

    #[test]
    fn self_request_rejected() {
        let me = UserId::new();
        assert_eq!(
            SwapRequest::new_pending(input(me, me), t(0)).unwrap_err(),
            TransitionError::SelfRequest
        );
    }

    // ── Respond ──────────────────────────────────────────────────────

    #[test]
    fn provider_accepts_with_message() {
        let (req, p) = pending();
        let next = req
            .respond(p.provider, RespondAction::Accept, note("Happy to help"), t(10))
            .unwrap();
        assert_eq!(next.status, SwapStatus::Accepted);
        assert_eq!(next.response_message.as_str(), "Happy to help");
        assert_eq!(next.responded_at, Some(t(10)));
        assert_eq!(next.updated_at, t(10));
        assert_eq!(req.status, SwapStatus::Pending, "input is not mutated");
    }

    #[test]
    fn provider_declines() {
        let (req, p) = pending();
        let next = req
            .respond(p.provider, RespondAction::Decline, Note::empty(), t(5))
            .unwrap();
        assert_eq!(next.status, SwapStatus::Declined);
        assert!(next.is_terminal());
    }

    #[test]
    fn requester_cannot_respond() {
        let (req, p) = pending();
        let err = req
            .respond(p.requester, RespondAction::Accept, Note::empty(), t(1))
            .unwrap_err();
        assert!(matches!(err, TransitionError::Forbidden(_)));
    }

    #[test]
    fn stranger_cannot_respond() {
        let (req, p) = pending();
        let err = req
            .respond(p.stranger, RespondAction::Decline, Note::empty(), t(1))
            .unwrap_err();
        assert!(matches!(err, TransitionError::Forbidden(_)));
    }

    #[test]
    fn second_response_is_invalid_transition() {
        let (req, p) = pending();
        let accepted = req
            .respond(p.provider, RespondAction::Accept, Note::empty(), t(1))
            .unwrap();
        let err = accepted
            .respond(p.provider, RespondAction::Decline, Note::empty(), t(2))
            .unwrap_err();
        assert!(matches!(
            err,
            TransitionError::InvalidTransition {
                from: SwapStatus::Accepted,
                action: "decline",
                ..
            }
        ));
    }

    // ── Complete ─────────────────────────────────────────────────────

    #[test]
    fn either_party_completes_accepted() {
        let (req, p) = pending();
        let accepted = req
            .respond(p.provider, RespondAction::Accept, Note::empty(), t(1))
            .unwrap();
        for caller in [p.requester, p.provider] {
            let done = accepted.complete(caller, t(2)).unwrap();
            assert_eq!(done.status, SwapStatus::Completed);
            assert_eq!(done.responded_at, Some(t(1)), "respondedAt is set once");
        }
    }

    #[test]
    fn declined_cannot_complete() {
        let (req, p) = pending();
        let declined = req
            .respond(p.provider, RespondAction::Decline, Note::empty(), t(1))
            .unwrap();
        let err = declined.complete(p.requester, t(2)).unwrap_err();
        assert!(matches!(
            err,
            TransitionError::InvalidTransition {
                from: SwapStatus::Declined,
                ..
            }
        ));
    }

    #[test]
    fn double_complete_fails() {
        let (req, p) = pending();
        let done = req
            .respond(p.provider, RespondAction::Accept, Note::empty(), t(1))
            .unwrap()
            .complete(p.provider, t(2))
            .unwrap();
        assert!(matches!(
            done.complete(p.requester, t(3)).unwrap_err(),
            TransitionError::InvalidTransition {
                from: SwapStatus::Completed,
                ..
            }
        ));
    }

    #[test]
    fn stranger_completing_terminal_request_gets_forbidden_first() {
        let (req, p) = pending();
        let declined = req
            .respond(p.provider, RespondAction::Decline, Note::empty(), t(1))
            .unwrap();
        assert!(matches!(
            declined.complete(p.stranger, t(2)).unwrap_err(),
            TransitionError::Forbidden(_)
        ));
    }

    // ── Cancel ───────────────────────────────────────────────────────

    #[test]
    fn requester_cancels_pending() {
        let (req, p) = pending();
        assert!(req.ensure_cancellable(p.requester).is_ok());
    }

    #[test]
    fn provider_cannot_cancel() {
        let (req, p) = pending();
        assert!(matches!(
            req.ensure_cancellable(p.provider).unwrap_err(),
            TransitionError::Forbidden(_)
        ));
    }

    #[test]
    fn accepted_cannot_be_cancelled() {
        let (req, p) = pending();
        let accepted = req
            .respond(p.provider, RespondAction::Accept, Note::empty(), t(1))
            .unwrap();
        assert!(matches!(
            accepted.ensure_cancellable(p.requester).unwrap_err(),
            TransitionError::InvalidTransition {
                action: "cancel",
                ..
            }
        ));
    }

    // ── Roles and wire format ────────────────────────────────────────

    #[test]
    fn party_roles() {
        let (req, p) = pending();
        assert_eq!(req.party_role(p.requester), Some(PartyRole::Requester));
        assert_eq!(req.party_role(p.provider), Some(PartyRole::Provider));
        assert_eq!(req.party_role(p.stranger), None);
    }

    #[test]
    fn action_parsing() {
        assert_eq!("accept".parse::<RespondAction>().unwrap(), RespondAction::Accept);
        assert!("approve".parse::<RespondAction>().is_err());
    }

    #[test]
    fn serializes_camel_case() {
        let (req, _) = pending();
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("requesterId").is_some());
        assert!(json.get("skillRequested").is_some());
        assert!(json.get("preferredMeetingType").is_some());
        assert_eq!(json["respondedAt"], serde_json::Value::Null);
        assert_eq!(json["status"], "pending");
        assert_eq!(json["preferredMeetingType"], "either");
    }

    // ── Properties ───────────────────────────────────────────────────

    #[derive(Debug, Clone, Copy)]
    enum Step {
        Respond(u8, RespondAction),
        Complete(u8),
        Cancel(u8),
    }

    fn step() -> impl Strategy<Value = Step> {
        let who = 0u8..3;
        let action = prop_oneof![Just(RespondAction::Accept), Just(RespondAction::Decline)];
        prop_oneof![
            (who.clone(), action).prop_map(|(w, a)| Step::Respond(w, a)),
            who.clone().prop_map(Step::Complete),
            who.prop_map(Step::Cancel),
        ]
    }

    proptest! {
        #[test]
        fn arbitrary_steps_only_follow_legal_edges(steps in prop::collection::vec(step(), 0..12)) {
            let (mut req, p) = pending();
            let who = |w: u8| match w { 0 => p.requester, 1 => p.provider, _ => p.stranger };

            for (i, s) in steps.into_iter().enumerate() {
                let now = t(i as i64 + 1);
                let before = req.status;
                let outcome = match s {
                    Step::Respond(w, a) => req.respond(who(w), a, Note::empty(), now).map(Some),
                    Step::Complete(w) => req.complete(who(w), now).map(Some),
                    Step::Cancel(w) => req.ensure_cancellable(who(w)).map(|_| None),
                };
                match outcome {
                    Ok(Some(next)) => {
                        prop_assert!(before.can_transition_to(next.status));
                        prop_assert!(next.status.rank() > before.rank());
                        req = next;
                    }
                    Ok(None) => {
                        prop_assert_eq!(before, SwapStatus::Pending);
                        break;
                    }
                    Err(_) => {
                        prop_assert_eq!(req.status, before);
                    }
                }
                prop_assert_eq!(req.responded_at.is_none(), req.status == SwapStatus::Pending);
            }
        }
    }
}
