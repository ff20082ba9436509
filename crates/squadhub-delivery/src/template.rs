//! Per-kind email rendering.
//!
//! Every notification kind has exactly one rendered message shape. The
//! kind enum is closed, so an unknown kind is unrepresentable here.

use squadhub_core::traits::directory::UserInfo;
use squadhub_entity::notification::{Notification, NotificationKind};

/// A rendered email, ready for the mail transport.
#[derive(Debug, Clone)]
pub struct EmailContent {
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html: String,
    /// Plain-text body.
    pub text: String,
}

/// Render the subject and body for one notification.
pub fn render_email(notification: &Notification, recipient: &UserInfo) -> EmailContent {
    let subject = subject_for(notification);
    let greeting = format!("Hi {},", recipient.first_name);

    let action_html = match (&notification.action_url, &notification.action_text) {
        (Some(url), Some(text)) => format!("<p><a href=\"{url}\">{text}</a></p>"),
        (Some(url), None) => format!("<p><a href=\"{url}\">View in Squadhub</a></p>"),
        _ => String::new(),
    };
    let action_text = match (&notification.action_url, &notification.action_text) {
        (Some(url), Some(text)) => format!("\n{text}: {url}\n"),
        (Some(url), None) => format!("\nView in Squadhub: {url}\n"),
        _ => String::new(),
    };

    let html = format!(
        "<html><body>\
         <p>{greeting}</p>\
         <h2>{title}</h2>\
         <p>{message}</p>\
         {action_html}\
         <p>— Squadhub</p>\
         </body></html>",
        title = notification.title,
        message = notification.message,
    );

    let text = format!(
        "{greeting}\n\n{title}\n\n{message}\n{action_text}\n— Squadhub\n",
        title = notification.title,
        message = notification.message,
    );

    EmailContent {
        subject,
        html,
        text,
    }
}

fn subject_for(notification: &Notification) -> String {
    let title = &notification.title;
    match notification.kind {
        NotificationKind::MessageReceived => format!("New message: {title}"),
        NotificationKind::Mention => format!("You were mentioned: {title}"),
        NotificationKind::TrainingScheduled => format!("Training scheduled: {title}"),
        NotificationKind::TrainingUpdated => format!("Training updated: {title}"),
        NotificationKind::TrainingCancelled => format!("Training cancelled: {title}"),
        NotificationKind::MedicalAppointment => format!("Medical appointment: {title}"),
        NotificationKind::InjuryUpdate => format!("Injury update: {title}"),
        NotificationKind::PaymentDue => format!("Payment due: {title}"),
        NotificationKind::PaymentReceived => format!("Payment received: {title}"),
        NotificationKind::TeamAnnouncement => format!("Team announcement: {title}"),
        NotificationKind::ScheduleChange => format!("Schedule change: {title}"),
        NotificationKind::WellnessReminder => format!("Wellness reminder: {title}"),
        NotificationKind::PerformanceReport => format!("Performance report: {title}"),
        NotificationKind::CalendarReminder => format!("Reminder: {title}"),
        NotificationKind::SystemAlert => format!("System alert: {title}"),
        NotificationKind::ReactionAdded => format!("New reaction: {title}"),
        NotificationKind::TaskAssigned => format!("Task assigned: {title}"),
        NotificationKind::DocumentShared => format!("Document shared: {title}"),
        NotificationKind::FeedbackReceived => format!("New feedback: {title}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use squadhub_entity::notification::{
        ChannelKind, NewNotification, NotificationPriority,
    };
    use uuid::Uuid;

    fn notification(kind: NotificationKind) -> Notification {
        NewNotification {
            recipient_id: Uuid::new_v4(),
            organization_id: None,
            team_id: None,
            kind,
            title: "Tuesday session".to_string(),
            message: "Moved to 7pm at the east pitch.".to_string(),
            action_url: Some("https://squadhub.app/schedule".to_string()),
            action_text: Some("Open schedule".to_string()),
            priority: NotificationPriority::High,
            channels: vec![ChannelKind::Email],
            metadata: serde_json::Value::Null,
        }
        .into_notification(Utc::now())
    }

    fn recipient() -> UserInfo {
        UserInfo {
            email: Some("alex@example.com".to_string()),
            first_name: "Alex".to_string(),
            last_name: "Keeper".to_string(),
            timezone: None,
        }
    }

    #[test]
    fn test_subject_varies_by_kind() {
        let scheduled = render_email(&notification(NotificationKind::TrainingScheduled), &recipient());
        let cancelled = render_email(&notification(NotificationKind::TrainingCancelled), &recipient());

        assert!(scheduled.subject.starts_with("Training scheduled:"));
        assert!(cancelled.subject.starts_with("Training cancelled:"));
    }

    #[test]
    fn test_body_carries_message_and_action() {
        let content = render_email(&notification(NotificationKind::ScheduleChange), &recipient());

        assert!(content.html.contains("Moved to 7pm at the east pitch."));
        assert!(content.html.contains("https://squadhub.app/schedule"));
        assert!(content.text.contains("Open schedule: https://squadhub.app/schedule"));
        assert!(content.text.contains("Hi Alex,"));
    }
}
