use std::cmp::Ordering;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use typed_builder::TypedBuilder;

use crate::common::GroupId;
use crate::domains::memberships::models::{Membership, MembershipStatus};

// ============================================================================
// Enums
// ============================================================================

// Variant order matches the Postgres enum order, so sorting agrees with SQL
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "activity_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Sport,
    Social,
    Games,
    Other,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "skill_level", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
}

// ============================================================================
// Group Model
// ============================================================================

/// An activity group. The organiser owns it and is always an approved member.
#[derive(FromRow, Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct Group {
    #[builder(default = GroupId::new())]
    pub id: GroupId,
    pub name: String,
    #[builder(default)]
    pub description: String,
    #[builder(default = ActivityType::Other)]
    pub activity_type: ActivityType,
    #[builder(default = SkillLevel::Beginner)]
    pub skill_level: SkillLevel,
    #[builder(default)]
    pub cost: f64,
    /// Event start; membership changes freeze shortly before it
    pub date_time: DateTime<Utc>,
    /// Upper bound on approved members, organiser included
    pub max_members: i32,
    pub organiser_username: String,
    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
    #[builder(default = Utc::now())]
    pub updated_at: DateTime<Utc>,
}

/// Column a group listing is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupSort {
    #[default]
    DateTime,
    Name,
    Cost,
    SkillLevel,
    ActivityType,
    MaxMembers,
    CreatedAt,
    UpdatedAt,
}

impl GroupSort {
    /// Unknown names fall back to the default ordering
    pub fn parse(raw: &str) -> Self {
        match raw {
            "name" => Self::Name,
            "cost" => Self::Cost,
            "skill_level" => Self::SkillLevel,
            "activity_type" => Self::ActivityType,
            "max_members" => Self::MaxMembers,
            "created_at" => Self::CreatedAt,
            "updated_at" => Self::UpdatedAt,
            _ => Self::DateTime,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Self::DateTime => "date_time",
            Self::Name => "name",
            Self::Cost => "cost",
            Self::SkillLevel => "skill_level",
            Self::ActivityType => "activity_type",
            Self::MaxMembers => "max_members",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }

    fn compare(&self, a: &Group, b: &Group) -> Ordering {
        match self {
            Self::DateTime => a.date_time.cmp(&b.date_time),
            Self::Name => a.name.cmp(&b.name),
            Self::Cost => a.cost.total_cmp(&b.cost),
            Self::SkillLevel => a.skill_level.cmp(&b.skill_level),
            Self::ActivityType => a.activity_type.cmp(&b.activity_type),
            Self::MaxMembers => a.max_members.cmp(&b.max_members),
            Self::CreatedAt => a.created_at.cmp(&b.created_at),
            Self::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Anything but `desc` sorts ascending
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            Self::Asc
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Listing filters for `GET /groups`.
///
/// Bounds are inclusive. `min_members`/`max_members` bound the group's
/// capacity, not its current head count.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupFilter {
    pub activity_type: Option<ActivityType>,
    pub skill_level: Option<SkillLevel>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub min_members: Option<i32>,
    pub max_members: Option<i32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl GroupFilter {
    pub const DEFAULT_LIMIT: i64 = 10;
    pub const MAX_LIMIT: i64 = 100;

    pub fn limit(&self) -> i64 {
        match self.limit {
            Some(limit) if limit > 0 => limit.min(Self::MAX_LIMIT),
            _ => Self::DEFAULT_LIMIT,
        }
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    pub fn sort(&self) -> GroupSort {
        self.sort_by.as_deref().map(GroupSort::parse).unwrap_or_default()
    }

    pub fn order(&self) -> SortOrder {
        self.sort_order.as_deref().map(SortOrder::parse).unwrap_or_default()
    }

    pub fn matches(&self, group: &Group) -> bool {
        self.activity_type.map_or(true, |t| t == group.activity_type)
            && self.skill_level.map_or(true, |s| s == group.skill_level)
            && self.min_price.map_or(true, |p| group.cost >= p)
            && self.max_price.map_or(true, |p| group.cost <= p)
            && self.date_from.map_or(true, |d| group.date_time >= d)
            && self.date_to.map_or(true, |d| group.date_time <= d)
            && self.min_members.map_or(true, |m| group.max_members >= m)
            && self.max_members.map_or(true, |m| group.max_members <= m)
    }

    /// Listing order; ties break on id in the same direction
    pub fn compare(&self, a: &Group, b: &Group) -> Ordering {
        let ordering = self.sort().compare(a, b).then_with(|| a.id.cmp(&b.id));
        match self.order() {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

impl Group {
    pub fn is_organiser(&self, username: &str) -> bool {
        self.organiser_username == username
    }

    /// The organiser's own membership row, created together with the group
    pub fn organiser_membership(&self) -> Membership {
        Membership::new(
            self.id,
            self.organiser_username.clone(),
            MembershipStatus::Approved,
            self.created_at,
        )
    }

    /// Find group by ID
    pub async fn find_by_id(id: GroupId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM groups WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Find group by ID and lock its row until the surrounding transaction ends.
    ///
    /// Every membership mutation takes this lock first, so capacity counts and
    /// status writes for one group never interleave.
    pub async fn lock_for_update(id: GroupId, conn: &mut PgConnection) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM groups WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await
            .map_err(Into::into)
    }

    /// List groups matching `filter`, in the filter's order
    pub async fn list(filter: &GroupFilter, pool: &PgPool) -> Result<Vec<Self>> {
        // Column and direction come from closed enums, never from raw input
        let direction = filter.order().keyword();
        let query = format!(
            "SELECT * FROM groups
             WHERE ($1::activity_type IS NULL OR activity_type = $1)
               AND ($2::skill_level IS NULL OR skill_level = $2)
               AND ($3::float8 IS NULL OR cost >= $3)
               AND ($4::float8 IS NULL OR cost <= $4)
               AND ($5::timestamptz IS NULL OR date_time >= $5)
               AND ($6::timestamptz IS NULL OR date_time <= $6)
               AND ($7::int4 IS NULL OR max_members >= $7)
               AND ($8::int4 IS NULL OR max_members <= $8)
             ORDER BY {} {}, id {}
             LIMIT $9 OFFSET $10",
            filter.sort().column(),
            direction,
            direction
        );

        sqlx::query_as::<_, Self>(&query)
            .bind(filter.activity_type)
            .bind(filter.skill_level)
            .bind(filter.min_price)
            .bind(filter.max_price)
            .bind(filter.date_from)
            .bind(filter.date_to)
            .bind(filter.min_members)
            .bind(filter.max_members)
            .bind(filter.limit())
            .bind(filter.offset())
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }

    /// Groups whose event starts in `(from, to]`
    pub async fn starting_between(
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM groups
             WHERE date_time > $1 AND date_time <= $2
             ORDER BY date_time ASC, id ASC",
        )
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Insert the group and its organiser's approved membership atomically
    pub async fn insert_with_organiser(&self, pool: &PgPool) -> Result<Self> {
        let mut tx = pool.begin().await?;

        let group = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO groups (
                id, name, description, activity_type, skill_level, cost,
                date_time, max_members, organiser_username, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(&self.name)
        .bind(&self.description)
        .bind(self.activity_type)
        .bind(self.skill_level)
        .bind(self.cost)
        .bind(self.date_time)
        .bind(self.max_members)
        .bind(&self.organiser_username)
        .bind(self.created_at)
        .bind(self.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        Membership::upsert(&group.organiser_membership(), &mut *tx).await?;

        tx.commit().await?;

        Ok(group)
    }

    /// Delete a group; memberships, notifications and messages cascade
    pub async fn delete(id: GroupId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
