//! Day-before and hour-before event reminders
//!
//! Passes are driven directly with `send_due_reminders`; the worker test runs
//! on a paused clock so its polling interval elapses instantly.

mod common;

use chrono::{Duration, Utc};
use groops_core::domains::memberships::MembershipStatus;
use groops_core::domains::reminders::{
    send_due_reminders, ReminderKind, ReminderSettings, ReminderWorker,
};
use groops_core::kernel::{BaseGroupStore, MockEmailService};
use test_context::test_context;

use crate::common::{
    create_test_group_starting_in, email_of, seed_membership, TestHarness, ORGANISER,
};

const SLACK_MINUTES: i64 = 10;

async fn run_pass(ctx: &TestHarness) -> usize {
    send_due_reminders(Utc::now(), Duration::minutes(SLACK_MINUTES), &ctx.deps)
        .await
        .expect("Reminder pass failed")
}

async fn recipients(ctx: &TestHarness) -> Vec<String> {
    let mut to: Vec<String> = ctx.email.sent().await.into_iter().map(|m| m.to_email).collect();
    to.sort();
    to
}

#[test_context(TestHarness)]
#[tokio::test]
async fn hour_reminder_goes_to_approved_members_once(ctx: &TestHarness) {
    let group = create_test_group_starting_in(ctx, 6, Duration::minutes(55)).await;
    seed_membership(ctx, group.id, "alice", MembershipStatus::Approved).await;
    seed_membership(ctx, group.id, "bob", MembershipStatus::Pending).await;
    seed_membership(ctx, group.id, "carol", MembershipStatus::Rejected).await;

    assert_eq!(run_pass(ctx).await, 2);
    assert_eq!(recipients(ctx).await, vec![email_of("alice"), email_of(ORGANISER)]);

    let sent = ctx.email.sent().await;
    assert!(sent.iter().all(|m| m.subject.contains("starts in 1 hour")));
    assert!(ctx.store.reminder_sent(group.id, "alice", ReminderKind::HourBefore).await);
    assert!(!ctx.store.reminder_sent(group.id, "alice", ReminderKind::DayBefore).await);

    assert_eq!(run_pass(ctx).await, 0);
    assert_eq!(ctx.email.sent().await.len(), 2);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn day_reminder_window_and_distant_groups(ctx: &TestHarness) {
    let tomorrow =
        create_test_group_starting_in(ctx, 6, Duration::hours(24) - Duration::minutes(3)).await;
    let later = create_test_group_starting_in(ctx, 6, Duration::days(3)).await;
    let between = create_test_group_starting_in(ctx, 6, Duration::hours(12)).await;
    for group_id in [tomorrow.id, later.id, between.id] {
        seed_membership(ctx, group_id, "alice", MembershipStatus::Approved).await;
    }

    assert_eq!(run_pass(ctx).await, 2);

    let sent = ctx.email.sent().await;
    assert!(sent.iter().all(|m| m.subject.ends_with("is tomorrow")));
    assert!(ctx.store.reminder_sent(tomorrow.id, "alice", ReminderKind::DayBefore).await);
    assert!(!ctx.store.reminder_sent(later.id, "alice", ReminderKind::DayBefore).await);
    assert!(!ctx.store.reminder_sent(between.id, "alice", ReminderKind::DayBefore).await);
}

#[tokio::test]
async fn failed_send_releases_the_claim_for_a_retry() {
    let ctx = TestHarness::with_email(MockEmailService::failing()).await.unwrap();
    let group = create_test_group_starting_in(&ctx, 6, Duration::minutes(55)).await;
    seed_membership(&ctx, group.id, "alice", MembershipStatus::Approved).await;

    assert_eq!(run_pass(&ctx).await, 0);
    assert!(!ctx.store.reminder_sent(group.id, "alice", ReminderKind::HourBefore).await);
    assert!(!ctx.store.reminder_sent(group.id, ORGANISER, ReminderKind::HourBefore).await);

    // Every attempt is retried on the next pass
    assert_eq!(run_pass(&ctx).await, 0);
    assert_eq!(ctx.email.sent().await.len(), 4);

    ctx.deps.tasks.shutdown().await;
}

#[test_context(TestHarness)]
#[tokio::test]
async fn member_without_account_is_skipped(ctx: &TestHarness) {
    let group = create_test_group_starting_in(ctx, 6, Duration::minutes(55)).await;
    seed_membership(ctx, group.id, "zed", MembershipStatus::Approved).await;

    assert_eq!(run_pass(ctx).await, 1);
    assert_eq!(recipients(ctx).await, vec![email_of(ORGANISER)]);
    assert!(!ctx.store.reminder_sent(group.id, "zed", ReminderKind::HourBefore).await);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn deleted_group_gets_no_reminders(ctx: &TestHarness) {
    let group = create_test_group_starting_in(ctx, 6, Duration::minutes(55)).await;
    seed_membership(ctx, group.id, "alice", MembershipStatus::Approved).await;
    assert!(ctx.deps.groups.delete_group(group.id).await.unwrap());

    assert_eq!(run_pass(ctx).await, 0);
    assert!(ctx.email.sent().await.is_empty());
}

#[test_context(TestHarness)]
#[tokio::test(start_paused = true)]
async fn worker_sends_on_its_first_tick_and_stops_on_shutdown(ctx: &TestHarness) {
    let group = create_test_group_starting_in(ctx, 6, Duration::minutes(55)).await;
    seed_membership(ctx, group.id, "alice", MembershipStatus::Approved).await;

    let settings = ReminderSettings {
        interval: std::time::Duration::from_secs(5 * 60),
        slack: Duration::minutes(SLACK_MINUTES),
    };
    ReminderWorker::new(ctx.deps.clone(), settings).start();

    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    assert_eq!(ctx.email.sent().await.len(), 2);

    // Later ticks find the reminders already claimed
    tokio::time::sleep(std::time::Duration::from_secs(5 * 60)).await;
    assert_eq!(ctx.email.sent().await.len(), 2);

    ctx.deps.tasks.shutdown().await;
    assert!(ctx.deps.tasks.is_shut_down());
}
