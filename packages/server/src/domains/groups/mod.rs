//! Groups domain - activity groups and their lifecycle

pub mod actions;
pub mod data;
pub mod models;

pub use data::{CreateGroupRequest, GroupDetail, MemberData};
pub use models::{ActivityType, Group, GroupFilter, GroupSort, SkillLevel, SortOrder};
