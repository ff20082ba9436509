//! Notification kind enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of events that produce notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A chat message was received.
    MessageReceived,
    /// The user was mentioned in a message.
    Mention,
    /// A training session was scheduled.
    TrainingScheduled,
    /// A training session was updated.
    TrainingUpdated,
    /// A training session was cancelled.
    TrainingCancelled,
    /// A medical appointment was booked or changed.
    MedicalAppointment,
    /// An injury record was updated.
    InjuryUpdate,
    /// A payment is due.
    PaymentDue,
    /// A payment was received.
    PaymentReceived,
    /// A team-wide announcement was posted.
    TeamAnnouncement,
    /// The team schedule changed.
    ScheduleChange,
    /// A wellness check-in reminder.
    WellnessReminder,
    /// A performance report is available.
    PerformanceReport,
    /// A calendar event reminder.
    CalendarReminder,
    /// A system-level alert.
    SystemAlert,
    /// Someone reacted to the user's message.
    ReactionAdded,
    /// A task was assigned to the user.
    TaskAssigned,
    /// A document was shared with the user.
    DocumentShared,
    /// Feedback was received on the user's activity.
    FeedbackReceived,
}

impl NotificationKind {
    /// Return the kind as a lowercase snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MessageReceived => "message_received",
            Self::Mention => "mention",
            Self::TrainingScheduled => "training_scheduled",
            Self::TrainingUpdated => "training_updated",
            Self::TrainingCancelled => "training_cancelled",
            Self::MedicalAppointment => "medical_appointment",
            Self::InjuryUpdate => "injury_update",
            Self::PaymentDue => "payment_due",
            Self::PaymentReceived => "payment_received",
            Self::TeamAnnouncement => "team_announcement",
            Self::ScheduleChange => "schedule_change",
            Self::WellnessReminder => "wellness_reminder",
            Self::PerformanceReport => "performance_report",
            Self::CalendarReminder => "calendar_reminder",
            Self::SystemAlert => "system_alert",
            Self::ReactionAdded => "reaction_added",
            Self::TaskAssigned => "task_assigned",
            Self::DocumentShared => "document_shared",
            Self::FeedbackReceived => "feedback_received",
        }
    }

    /// Medical kinds always go out on the offline channels as well.
    pub fn is_medical(&self) -> bool {
        matches!(self, Self::MedicalAppointment | Self::InjuryUpdate)
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
