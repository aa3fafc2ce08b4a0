use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domains::groups::models::{ActivityType, Group, SkillLevel};
use crate::domains::memberships::models::{Membership, MembershipStatus};

/// Body of `POST /api/groups`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub activity_type: ActivityType,
    pub skill_level: SkillLevel,
    #[serde(default)]
    pub cost: f64,
    pub date_time: DateTime<Utc>,
    pub max_members: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemberData {
    pub username: String,
    pub status: MembershipStatus,
    pub joined_at: DateTime<Utc>,
}

impl From<Membership> for MemberData {
    fn from(m: Membership) -> Self {
        Self {
            username: m.username,
            status: m.status,
            joined_at: m.joined_at,
        }
    }
}

/// A group with its membership rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupDetail {
    #[serde(flatten)]
    pub group: Group,
    pub approved_count: usize,
    pub members: Vec<MemberData>,
}

impl GroupDetail {
    pub fn new(group: Group, memberships: Vec<Membership>) -> Self {
        let approved_count = memberships
            .iter()
            .filter(|m| m.status == MembershipStatus::Approved)
            .count();

        Self {
            group,
            approved_count,
            members: memberships.into_iter().map(MemberData::from).collect(),
        }
    }
}
