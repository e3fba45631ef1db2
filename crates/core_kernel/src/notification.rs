//! Notification collaborator seam
//!
//! Delivery of notifications (email, push, in-app) is owned by an external
//! collaborator. The core only emits events through the `NotifierPort`,
//! fire-and-forget: a failed emit is logged by the caller and never allowed
//! to block or roll back a financial or occupancy write.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ports::{DomainPort, PortError};

/// Category of an emitted notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    RoomChange,
    PaymentReceived,
    RegistrationApproved,
    General,
}

/// Who the notification is addressed to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationAudience {
    /// All admin users
    Admins,
    /// A single resident, by user id
    Resident(Uuid),
    /// Everyone
    All,
}

/// An event handed to the notification collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub title: String,
    pub message: String,
    pub event_type: NotificationType,
    /// Entity the notification refers to, if any
    pub related_id: Option<Uuid>,
    pub audience: NotificationAudience,
}

impl NotificationEvent {
    /// Creates an event addressed to all admins
    pub fn for_admins(
        title: impl Into<String>,
        message: impl Into<String>,
        event_type: NotificationType,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            event_type,
            related_id: None,
            audience: NotificationAudience::Admins,
        }
    }

    /// Creates an event addressed to a single resident
    pub fn for_resident(
        resident: Uuid,
        title: impl Into<String>,
        message: impl Into<String>,
        event_type: NotificationType,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            event_type,
            related_id: None,
            audience: NotificationAudience::Resident(resident),
        }
    }

    /// Attaches the related entity id
    pub fn with_related(mut self, related_id: Uuid) -> Self {
        self.related_id = Some(related_id);
        self
    }
}

/// Port for the external notification collaborator
///
/// Implementations must not be load-bearing: callers treat every `notify`
/// as best-effort and log failures instead of propagating them.
#[async_trait]
pub trait NotifierPort: DomainPort {
    /// Emits one notification event
    async fn notify(&self, event: NotificationEvent) -> Result<(), PortError>;
}

/// Notifier that only logs the event, used when no collaborator is wired
#[derive(Debug, Default, Clone)]
pub struct LoggingNotifier;

#[async_trait]
impl NotifierPort for LoggingNotifier {
    async fn notify(&self, event: NotificationEvent) -> Result<(), PortError> {
        tracing::info!(
            title = %event.title,
            event_type = ?event.event_type,
            audience = ?event.audience,
            "notification emitted"
        );
        Ok(())
    }
}

impl DomainPort for LoggingNotifier {}

/// In-memory notifier that records emitted events for assertions
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// Recording mock for `NotifierPort`
    #[derive(Debug, Default, Clone)]
    pub struct RecordingNotifier {
        events: Arc<RwLock<Vec<NotificationEvent>>>,
        fail: bool,
    }

    impl RecordingNotifier {
        /// Creates a new recording notifier
        pub fn new() -> Self {
            Self::default()
        }

        /// Creates a notifier whose every emit fails, for best-effort tests
        pub fn failing() -> Self {
            Self {
                events: Arc::default(),
                fail: true,
            }
        }

        /// Returns a snapshot of the recorded events
        pub async fn recorded(&self) -> Vec<NotificationEvent> {
            self.events.read().await.clone()
        }
    }

    impl DomainPort for RecordingNotifier {}

    #[async_trait]
    impl NotifierPort for RecordingNotifier {
        async fn notify(&self, event: NotificationEvent) -> Result<(), PortError> {
            if self.fail {
                return Err(PortError::connection("notification channel down"));
            }
            self.events.write().await.push(event);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::RecordingNotifier;
    use super::*;

    #[tokio::test]
    async fn test_recording_notifier() {
        let notifier = RecordingNotifier::new();
        let event = NotificationEvent::for_admins(
            "Room change completed",
            "Resident moved from A-101 to B-204",
            NotificationType::RoomChange,
        );

        notifier.notify(event).await.unwrap();

        let recorded = notifier.recorded().await;
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].audience, NotificationAudience::Admins);
    }

    #[tokio::test]
    async fn test_failing_notifier_surfaces_transient_error() {
        let notifier = RecordingNotifier::failing();
        let event = NotificationEvent::for_resident(
            Uuid::new_v4(),
            "Payment received",
            "Receipt C00001",
            NotificationType::PaymentReceived,
        );

        let err = notifier.notify(event).await.unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn test_event_serialization() {
        let event = NotificationEvent::for_admins(
            "title",
            "message",
            NotificationType::General,
        )
        .with_related(Uuid::new_v4());

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"general\""));
    }
}
