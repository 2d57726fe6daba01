//! User-facing notifications.
//!
//! Subsystems emit [`NotificationEvent`]s; the plugin collects them into a
//! [`NotificationLog`] the UI layer renders. The save subsystem uses this to
//! surface save failures as modal-style messages.

use bevy::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationPriority {
    /// Something failed or was rejected; needs the user's attention.
    Warning,
    /// General information (completed operations, confirmations).
    Info,
}

impl NotificationPriority {
    pub fn label(self) -> &'static str {
        match self {
            NotificationPriority::Warning => "WARNING",
            NotificationPriority::Info => "INFO",
        }
    }
}

#[derive(Event, Debug, Clone)]
pub struct NotificationEvent {
    pub text: String,
    pub priority: NotificationPriority,
}

/// Collected notifications, oldest first.
#[derive(Resource, Debug, Default)]
pub struct NotificationLog {
    entries: Vec<NotificationEvent>,
}

impl NotificationLog {
    pub fn entries(&self) -> &[NotificationEvent] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

pub struct NotificationPlugin;

impl Plugin for NotificationPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<NotificationEvent>()
            .init_resource::<NotificationLog>()
            .add_systems(Update, collect_notifications);
    }
}

fn collect_notifications(
    mut events: EventReader<NotificationEvent>,
    mut log: ResMut<NotificationLog>,
) {
    for event in events.read() {
        info!("[{}] {}", event.priority.label(), event.text);
        log.entries.push(event.clone());
    }
}
