use chrono::Utc;
use tracing::info;

use crate::common::GroupId;
use crate::domains::groups::models::Group;
use crate::domains::memberships::machines::{decide, MembershipAction, Transition, TransitionInput};
use crate::domains::memberships::models::{Membership, MembershipStatus};
use crate::domains::memberships::MembershipError;
use crate::kernel::ServerDeps;

/// A committed membership change
#[derive(Debug, Clone)]
pub struct AppliedTransition {
    pub group: Group,
    /// Row as written, or as it was just before deletion
    pub membership: Membership,
    pub transition: Transition,
    /// Status before the change, `None` if there was no row
    pub previous: Option<MembershipStatus>,
}

/// Run one state-machine step inside a locked transaction and commit it.
///
/// The group lock is held from the read of the current row and the approved
/// count through the write, so concurrent steps on one group never both see
/// the same free slot.
pub(crate) async fn apply_transition(
    deps: &ServerDeps,
    action: MembershipAction,
    group_id: GroupId,
    actor: &str,
    target: &str,
) -> Result<AppliedTransition, MembershipError> {
    let mut tx = deps
        .groups
        .begin(group_id)
        .await?
        .ok_or_else(MembershipError::group_not_found)?;

    let group = tx.group().clone();
    let current = tx.get(target).await?;
    let approved_count = tx.count_by_status(MembershipStatus::Approved).await?;
    let now = Utc::now();

    let transition = decide(
        action,
        &TransitionInput {
            group: &group,
            actor,
            target,
            current: current.as_ref().map(|m| m.status),
            approved_count,
            now,
        },
        &deps.policy,
    )?;

    let previous = current.as_ref().map(|m| m.status);
    let membership = match (transition, current) {
        (Transition::Upsert(status), Some(existing)) if action != MembershipAction::RequestJoin => {
            // Reviews keep the original request time
            let updated = Membership {
                status,
                updated_at: now,
                ..existing
            };
            tx.upsert(&updated).await?;
            updated
        }
        (Transition::Upsert(status), _) => {
            // New or re-submitted request: both timestamps restart
            let fresh = Membership::new(group_id, target, status, now);
            tx.upsert(&fresh).await?;
            fresh
        }
        (Transition::Delete, Some(existing)) => {
            tx.delete(target).await?;
            existing
        }
        (Transition::Delete, None) => return Err(MembershipError::membership_not_found()),
    };

    tx.commit().await?;

    info!(
        group_id = %group_id,
        actor,
        target,
        action = action.as_str(),
        from = ?previous,
        to = ?transition,
        "Membership transition committed"
    );

    Ok(AppliedTransition {
        group,
        membership,
        transition,
        previous,
    })
}
