//! Membership state machine - pure decision logic
//!
//! `decide` never touches storage. The caller loads the group, the target's
//! current status and the approved count inside one locked transaction, asks
//! the machine what to do, then applies the returned [`Transition`].

use chrono::{DateTime, Utc};

use crate::domains::groups::models::Group;
use crate::domains::memberships::models::MembershipStatus;
use crate::domains::memberships::{MembershipError, MembershipPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipAction {
    RequestJoin,
    Approve,
    Reject,
    Leave,
    Remove,
}

impl MembershipAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipAction::RequestJoin => "request_join",
            MembershipAction::Approve => "approve",
            MembershipAction::Reject => "reject",
            MembershipAction::Leave => "leave",
            MembershipAction::Remove => "remove",
        }
    }
}

/// Outcome of a legal transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Write the row with this status, refreshing its timestamps
    Upsert(MembershipStatus),
    /// Delete the row
    Delete,
}

/// Everything `decide` looks at
#[derive(Debug, Clone, Copy)]
pub struct TransitionInput<'a> {
    pub group: &'a Group,
    /// Authenticated user performing the action
    pub actor: &'a str,
    /// User whose membership changes (equal to `actor` for join and leave)
    pub target: &'a str,
    /// `None` when no row exists
    pub current: Option<MembershipStatus>,
    /// Approved rows of the group, organiser included
    pub approved_count: i64,
    pub now: DateTime<Utc>,
}

/// Decide the transition for `action`, or the error the caller must report.
///
/// Checks run in a fixed order per action: role, then window, then state,
/// then capacity. Callers rely on that order for stable status codes.
pub fn decide(
    action: MembershipAction,
    input: &TransitionInput<'_>,
    policy: &MembershipPolicy,
) -> Result<Transition, MembershipError> {
    let group = input.group;
    let window_closed = policy.window_closed(group.date_time, input.now);
    let has_capacity = input.approved_count < i64::from(group.max_members);

    match action {
        MembershipAction::RequestJoin => {
            if group.is_organiser(input.target) {
                return Err(MembershipError::Conflict("organiser is already a member"));
            }
            if window_closed {
                return Err(MembershipError::WindowClosed);
            }
            match input.current {
                Some(MembershipStatus::Pending) => {
                    Err(MembershipError::Conflict("join request already pending"))
                }
                Some(MembershipStatus::Approved) => {
                    Err(MembershipError::Conflict("already a member of this group"))
                }
                None | Some(MembershipStatus::Rejected) => {
                    if !has_capacity {
                        return Err(MembershipError::CapacityExceeded);
                    }
                    Ok(Transition::Upsert(MembershipStatus::Pending))
                }
            }
        }

        MembershipAction::Approve | MembershipAction::Reject => {
            if !group.is_organiser(input.actor) {
                return Err(MembershipError::Forbidden(
                    "only the organiser can review join requests",
                ));
            }
            if window_closed {
                return Err(MembershipError::WindowClosed);
            }
            match input.current {
                None => Err(MembershipError::NotFound("join request not found")),
                Some(MembershipStatus::Pending) => {
                    if action == MembershipAction::Reject {
                        return Ok(Transition::Upsert(MembershipStatus::Rejected));
                    }
                    if !has_capacity {
                        return Err(MembershipError::CapacityExceeded);
                    }
                    Ok(Transition::Upsert(MembershipStatus::Approved))
                }
                Some(MembershipStatus::Approved) => {
                    Err(MembershipError::Conflict("user is already a member"))
                }
                Some(MembershipStatus::Rejected) => {
                    Err(MembershipError::Conflict("join request was already rejected"))
                }
            }
        }

        MembershipAction::Leave => {
            if group.is_organiser(input.actor) {
                return Err(MembershipError::Forbidden(
                    "the organiser cannot leave their own group",
                ));
            }
            if window_closed {
                return Err(MembershipError::WindowClosed);
            }
            match input.current {
                None => Err(MembershipError::NotFound("not a member of this group")),
                Some(MembershipStatus::Pending) | Some(MembershipStatus::Approved) => {
                    Ok(Transition::Delete)
                }
                Some(MembershipStatus::Rejected) => Err(MembershipError::Forbidden(
                    "a rejected request cannot be withdrawn",
                )),
            }
        }

        MembershipAction::Remove => {
            if !group.is_organiser(input.actor) {
                return Err(MembershipError::Forbidden(
                    "only the organiser can remove members",
                ));
            }
            if group.is_organiser(input.target) {
                return Err(MembershipError::BadRequest(
                    "the organiser cannot be removed".to_string(),
                ));
            }
            if window_closed {
                return Err(MembershipError::WindowClosed);
            }
            match input.current {
                Some(MembershipStatus::Approved) => Ok(Transition::Delete),
                _ => Err(MembershipError::NotFound("member not found or not approved")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn group(max_members: i32, starts_in: Duration) -> Group {
        Group::builder()
            .name("Climbing")
            .date_time(Utc::now() + starts_in)
            .max_members(max_members)
            .organiser_username("olivia")
            .build()
    }

    fn input<'a>(
        group: &'a Group,
        actor: &'a str,
        target: &'a str,
        current: Option<MembershipStatus>,
        approved_count: i64,
    ) -> TransitionInput<'a> {
        TransitionInput {
            group,
            actor,
            target,
            current,
            approved_count,
            now: Utc::now(),
        }
    }

    fn run(action: MembershipAction, input: TransitionInput<'_>) -> Result<Transition, MembershipError> {
        decide(action, &input, &MembershipPolicy::default())
    }

    #[test]
    fn test_join_creates_pending() {
        let g = group(5, Duration::days(2));
        let t = run(MembershipAction::RequestJoin, input(&g, "ann", "ann", None, 1)).unwrap();
        assert_eq!(t, Transition::Upsert(MembershipStatus::Pending));
    }

    #[test]
    fn test_rejoin_after_rejection_goes_back_to_pending() {
        let g = group(5, Duration::days(2));
        let t = run(
            MembershipAction::RequestJoin,
            input(&g, "ann", "ann", Some(MembershipStatus::Rejected), 1),
        )
        .unwrap();
        assert_eq!(t, Transition::Upsert(MembershipStatus::Pending));
    }

    #[test]
    fn test_rejoin_while_pending_or_approved_conflicts() {
        let g = group(5, Duration::days(2));
        for status in [MembershipStatus::Pending, MembershipStatus::Approved] {
            let err = run(
                MembershipAction::RequestJoin,
                input(&g, "ann", "ann", Some(status), 2),
            )
            .unwrap_err();
            assert!(matches!(err, MembershipError::Conflict(_)), "{status}");
        }
    }

    #[test]
    fn test_join_full_group_is_capacity_exceeded() {
        let g = group(2, Duration::days(2));
        let err = run(MembershipAction::RequestJoin, input(&g, "ann", "ann", None, 2)).unwrap_err();
        assert!(matches!(err, MembershipError::CapacityExceeded));

        let err = run(
            MembershipAction::RequestJoin,
            input(&g, "ann", "ann", Some(MembershipStatus::Rejected), 2),
        )
        .unwrap_err();
        assert!(matches!(err, MembershipError::CapacityExceeded));
    }

    #[test]
    fn test_join_inside_lockout_is_window_closed() {
        let g = group(5, Duration::minutes(30));
        let err = run(MembershipAction::RequestJoin, input(&g, "ann", "ann", None, 1)).unwrap_err();
        assert!(matches!(err, MembershipError::WindowClosed));
    }

    #[test]
    fn test_organiser_cannot_request_to_join() {
        let g = group(5, Duration::days(2));
        let err = run(
            MembershipAction::RequestJoin,
            input(&g, "olivia", "olivia", Some(MembershipStatus::Approved), 1),
        )
        .unwrap_err();
        assert!(matches!(err, MembershipError::Conflict(_)));
    }

    #[test]
    fn test_organiser_join_inside_lockout_is_conflict() {
        let g = group(5, Duration::minutes(30));
        let err = run(
            MembershipAction::RequestJoin,
            input(&g, "olivia", "olivia", Some(MembershipStatus::Approved), 1),
        )
        .unwrap_err();
        assert!(matches!(err, MembershipError::Conflict(_)));
    }

    #[test]
    fn test_approve_requires_organiser() {
        let g = group(5, Duration::days(2));
        let err = run(
            MembershipAction::Approve,
            input(&g, "ann", "bob", Some(MembershipStatus::Pending), 1),
        )
        .unwrap_err();
        assert!(matches!(err, MembershipError::Forbidden(_)));
    }

    #[test]
    fn test_approve_at_capacity_fails() {
        let g = group(1, Duration::days(2));
        let err = run(
            MembershipAction::Approve,
            input(&g, "olivia", "ann", Some(MembershipStatus::Pending), 1),
        )
        .unwrap_err();
        assert!(matches!(err, MembershipError::CapacityExceeded));
    }

    #[test]
    fn test_approve_and_reject_pending() {
        let g = group(3, Duration::days(2));
        let pending = input(&g, "olivia", "ann", Some(MembershipStatus::Pending), 1);
        assert_eq!(
            run(MembershipAction::Approve, pending).unwrap(),
            Transition::Upsert(MembershipStatus::Approved)
        );
        assert_eq!(
            run(MembershipAction::Reject, pending).unwrap(),
            Transition::Upsert(MembershipStatus::Rejected)
        );
    }

    #[test]
    fn test_reject_ignores_capacity() {
        let g = group(1, Duration::days(2));
        let t = run(
            MembershipAction::Reject,
            input(&g, "olivia", "ann", Some(MembershipStatus::Pending), 1),
        )
        .unwrap();
        assert_eq!(t, Transition::Upsert(MembershipStatus::Rejected));
    }

    #[test]
    fn test_review_of_missing_or_settled_request() {
        let g = group(3, Duration::days(2));
        let err = run(MembershipAction::Approve, input(&g, "olivia", "ann", None, 1)).unwrap_err();
        assert!(matches!(err, MembershipError::NotFound(_)));

        for status in [MembershipStatus::Approved, MembershipStatus::Rejected] {
            let err = run(
                MembershipAction::Reject,
                input(&g, "olivia", "ann", Some(status), 2),
            )
            .unwrap_err();
            assert!(matches!(err, MembershipError::Conflict(_)));
        }
    }

    #[test]
    fn test_leave_deletes_pending_and_approved() {
        let g = group(3, Duration::days(2));
        for status in [MembershipStatus::Pending, MembershipStatus::Approved] {
            let t = run(MembershipAction::Leave, input(&g, "ann", "ann", Some(status), 2)).unwrap();
            assert_eq!(t, Transition::Delete);
        }
    }

    #[test]
    fn test_leave_edge_cases() {
        let g = group(3, Duration::days(2));

        let err = run(
            MembershipAction::Leave,
            input(&g, "olivia", "olivia", Some(MembershipStatus::Approved), 1),
        )
        .unwrap_err();
        assert!(matches!(err, MembershipError::Forbidden(_)));

        let err = run(MembershipAction::Leave, input(&g, "ann", "ann", None, 1)).unwrap_err();
        assert!(matches!(err, MembershipError::NotFound(_)));

        let err = run(
            MembershipAction::Leave,
            input(&g, "ann", "ann", Some(MembershipStatus::Rejected), 1),
        )
        .unwrap_err();
        assert!(matches!(err, MembershipError::Forbidden(_)));
    }

    #[test]
    fn test_leave_after_start_is_window_closed() {
        let g = group(3, -Duration::hours(1));
        let err = run(
            MembershipAction::Leave,
            input(&g, "ann", "ann", Some(MembershipStatus::Approved), 2),
        )
        .unwrap_err();
        assert!(matches!(err, MembershipError::WindowClosed));
    }

    #[test]
    fn test_remove_rules() {
        let g = group(3, Duration::days(2));

        let t = run(
            MembershipAction::Remove,
            input(&g, "olivia", "ann", Some(MembershipStatus::Approved), 2),
        )
        .unwrap();
        assert_eq!(t, Transition::Delete);

        let err = run(
            MembershipAction::Remove,
            input(&g, "olivia", "olivia", Some(MembershipStatus::Approved), 2),
        )
        .unwrap_err();
        assert!(matches!(err, MembershipError::BadRequest(_)));

        let err = run(
            MembershipAction::Remove,
            input(&g, "ann", "bob", Some(MembershipStatus::Approved), 3),
        )
        .unwrap_err();
        assert!(matches!(err, MembershipError::Forbidden(_)));

        let err = run(
            MembershipAction::Remove,
            input(&g, "olivia", "ann", Some(MembershipStatus::Pending), 1),
        )
        .unwrap_err();
        assert!(matches!(err, MembershipError::NotFound(_)));
    }

    #[test]
    fn test_configurable_lockout() {
        let g = group(3, Duration::minutes(30));
        let policy = MembershipPolicy {
            lockout: Duration::minutes(10),
            ..Default::default()
        };
        let t = decide(
            MembershipAction::RequestJoin,
            &input(&g, "ann", "ann", None, 1),
            &policy,
        )
        .unwrap();
        assert_eq!(t, Transition::Upsert(MembershipStatus::Pending));
    }
}
