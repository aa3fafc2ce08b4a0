use chrono::{DateTime, Utc};
use handlebars::html_escape;

use crate::domains::reminders::models::ReminderKind;
use crate::kernel::EmailMessage;

/// Emails sent on membership transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipEmail {
    /// To the organiser when someone asks to join
    JoinRequest { requester: String },
    /// To the requester when the organiser approves
    JoinApproved,
    /// To a member the organiser removed
    MemberRemoved,
}

impl MembershipEmail {
    pub fn render(&self, to_email: &str, to_name: &str, group_name: &str) -> EmailMessage {
        // Names are user input; only the HTML part is markup
        let group_html = html_escape(group_name);

        let (subject, plain_content, html_content) = match self {
            MembershipEmail::JoinRequest { requester } => (
                format!("New Join Request for {}", group_name),
                format!("{} has requested to join your group '{}'", requester, group_name),
                format!(
                    "<p>{} has requested to join your group '<strong>{}</strong>'</p>",
                    html_escape(requester),
                    group_html
                ),
            ),
            MembershipEmail::JoinApproved => (
                format!("You're in! Join request for {} approved", group_name),
                format!("Your request to join '{}' has been approved!", group_name),
                format!(
                    "<p>Good news! Your request to join '<strong>{}</strong>' has been approved!</p>",
                    group_html
                ),
            ),
            MembershipEmail::MemberRemoved => (
                format!("You have been removed from {}", group_name),
                format!("You have been removed from the group '{}'", group_name),
                format!(
                    "<p>You have been removed from the group '<strong>{}</strong>'</p>",
                    group_html
                ),
            ),
        };

        EmailMessage {
            to_email: to_email.to_string(),
            to_name: to_name.to_string(),
            subject,
            plain_content,
            html_content,
        }
    }
}

/// Pre-event reminder to one approved member
pub fn event_reminder(
    kind: ReminderKind,
    to_email: &str,
    username: &str,
    group_name: &str,
    starts_at: DateTime<Utc>,
) -> EmailMessage {
    let subject = match kind {
        ReminderKind::DayBefore => format!("Reminder: {} is tomorrow", group_name),
        ReminderKind::HourBefore => format!("Reminder: {} starts in 1 hour", group_name),
    };
    let when = starts_at.format("%a %b %-d, %-I:%M %p UTC").to_string();

    EmailMessage {
        to_email: to_email.to_string(),
        to_name: username.to_string(),
        subject,
        plain_content: format!(
            "Hello {}, your event {} is coming up soon at {}. Don't miss it!",
            username, group_name, when
        ),
        html_content: format!(
            "<p>Hello {},</p><p>Your event <strong>{}</strong> is coming up soon at {}.</p><p>Don't miss it!</p>",
            html_escape(username),
            html_escape(group_name),
            when
        ),
    }
}
