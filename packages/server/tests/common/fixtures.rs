//! Test fixtures for creating test data.
//!
//! Groups are written through the store so tests can place events at any
//! distance from now, including inside the lockout window.

use chrono::{Duration, Utc};
use groops_core::common::GroupId;
use groops_core::domains::groups::models::{ActivityType, Group, SkillLevel};
use groops_core::domains::memberships::{Membership, MembershipStatus};
use groops_core::kernel::BaseGroupStore;
use serde_json::{json, Value};

use super::TestHarness;

pub const ORGANISER: &str = "olivia";

/// Create a group organised by `olivia` that starts in a week
pub async fn create_test_group(harness: &TestHarness, max_members: i32) -> Group {
    create_test_group_starting_in(harness, max_members, Duration::days(7)).await
}

/// Create a group organised by `olivia` that starts `starts_in` from now
pub async fn create_test_group_starting_in(
    harness: &TestHarness,
    max_members: i32,
    starts_in: Duration,
) -> Group {
    let group = Group::builder()
        .name("Sunday Climbing")
        .description("Bouldering at the gym")
        .activity_type(ActivityType::Sport)
        .skill_level(SkillLevel::Intermediate)
        .cost(12.5)
        .date_time(Utc::now() + starts_in)
        .max_members(max_members)
        .organiser_username(ORGANISER)
        .build();

    harness
        .store
        .create_group(&group)
        .await
        .expect("Failed to create test group")
}

/// Write a membership row directly, skipping the workflow and its side effects
pub async fn seed_membership(
    harness: &TestHarness,
    group_id: GroupId,
    username: &str,
    status: MembershipStatus,
) {
    harness
        .store
        .put_membership(Membership::new(group_id, username, status, Utc::now()))
        .await;
}

/// Body for `POST /api/groups`
pub fn create_group_body(name: &str, max_members: i32) -> Value {
    json!({
        "name": name,
        "description": "Weekly five-a-side",
        "activity_type": "sport",
        "skill_level": "beginner",
        "cost": 5.0,
        "date_time": (Utc::now() + Duration::days(3)).to_rfc3339(),
        "max_members": max_members,
    })
}

pub fn group_path(group_id: GroupId) -> String {
    format!("/api/groups/{}", group_id)
}

pub fn member_path(group_id: GroupId, username: &str, action: &str) -> String {
    format!("/api/groups/{}/members/{}/{}", group_id, username, action)
}
