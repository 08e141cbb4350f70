//! Notification permission state machine.

use async_trait::async_trait;

/// Permission to show notifications.
///
/// `Default` is the only state a request can leave; `Granted` and `Denied`
/// hold for the rest of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Unsupported,
    Default,
    Granted,
    Denied,
}

impl Permission {
    /// Initial state for a platform.
    pub fn initial(supported: bool) -> Self {
        if supported {
            Self::Default
        } else {
            Self::Unsupported
        }
    }
}

/// Asks the user whether notifications may be shown.
#[async_trait]
pub trait PermissionPrompt: Send + Sync {
    /// `true` when the user grants permission.
    async fn ask(&self) -> bool;
}

/// Prompt with a fixed answer, taken from configuration.
#[derive(Debug, Clone, Copy)]
pub struct StaticPrompt {
    pub grant: bool,
}

impl StaticPrompt {
    pub fn new(grant: bool) -> Self {
        Self { grant }
    }
}

#[async_trait]
impl PermissionPrompt for StaticPrompt {
    async fn ask(&self) -> bool {
        self.grant
    }
}

/// Advance `current` by asking `prompt`, when a request is still possible.
pub async fn request_permission(current: Permission, prompt: &dyn PermissionPrompt) -> Permission {
    match current {
        Permission::Default => {
            if prompt.ask().await {
                Permission::Granted
            } else {
                Permission::Denied
            }
        }
        settled => settled,
    }
}
