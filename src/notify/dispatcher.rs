// src/notify/dispatcher.rs

//! Deduplicated delivery of update notifications.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::NotifyConfig;
use crate::notify::{Permission, PermissionPrompt, request_permission};
use crate::pipeline::UpdateSet;

/// A notification ready to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    /// Shared by every notification, so a new one replaces the old one
    pub tag: String,
    pub icon: String,
}

/// Surface that shows notifications.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, notification: &Notification) -> Result<()>;
}

/// Sink that writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn deliver(&self, notification: &Notification) -> Result<()> {
        log::info!(
            "[{}] {}: {}",
            notification.tag,
            notification.title,
            notification.body
        );
        Ok(())
    }
}

/// What a dispatch call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent(Notification),
    Unsupported,
    NotGranted,
    NothingNew,
    /// Same index stamp as the last notification
    Duplicate,
}

/// Holds permission and dedup state for one client session.
#[derive(Debug, Clone)]
pub struct NotificationDispatcher {
    permission: Permission,
    last_emitted: Option<String>,
    config: NotifyConfig,
}

impl NotificationDispatcher {
    pub fn new(config: NotifyConfig) -> Self {
        Self {
            permission: Permission::initial(config.enabled),
            last_emitted: None,
            config,
        }
    }

    pub fn permission(&self) -> Permission {
        self.permission
    }

    /// Index stamp of the last delivered notification.
    pub fn last_emitted(&self) -> Option<&str> {
        self.last_emitted.as_deref()
    }

    pub async fn request_permission(&mut self, prompt: &dyn PermissionPrompt) -> Permission {
        self.permission = request_permission(self.permission, prompt).await;
        self.permission
    }

    /// Notify about `updates` unless nothing changed since the last
    /// notification for index stamp `stamp`.
    pub async fn dispatch(
        &mut self,
        updates: &UpdateSet,
        stamp: &str,
        sink: &dyn NotificationSink,
    ) -> Result<DispatchOutcome> {
        match self.permission {
            Permission::Unsupported => return Ok(DispatchOutcome::Unsupported),
            Permission::Default | Permission::Denied => return Ok(DispatchOutcome::NotGranted),
            Permission::Granted => {}
        }
        if !updates.has_updates() {
            return Ok(DispatchOutcome::NothingNew);
        }
        if self.last_emitted.as_deref() == Some(stamp) {
            return Ok(DispatchOutcome::Duplicate);
        }

        let notification = self.compose(updates);
        sink.deliver(&notification).await?;
        self.last_emitted = Some(stamp.to_string());
        Ok(DispatchOutcome::Sent(notification))
    }

    /// Build the notification text for `updates`.
    pub fn compose(&self, updates: &UpdateSet) -> Notification {
        let sep = self.config.separator.as_str();
        let mut clauses = Vec::new();
        if !updates.new_posts.is_empty() {
            let codes: Vec<&str> = updates.new_posts.iter().map(String::as_str).collect();
            clauses.push(format!("New predictions for {}", codes.join(sep)));
        }
        if !updates.new_notes.is_empty() {
            let codes: Vec<&str> = updates.new_notes.iter().map(String::as_str).collect();
            clauses.push(format!("New notes for {}", codes.join(sep)));
        }

        let title = if updates.notes_only() {
            format!("{}: new notes", self.config.app_name)
        } else {
            format!("{}: new predictions", self.config.app_name)
        };

        Notification {
            title,
            body: clauses.join(". "),
            tag: self.config.tag.clone(),
            icon: self.config.icon.clone(),
        }
    }
}
