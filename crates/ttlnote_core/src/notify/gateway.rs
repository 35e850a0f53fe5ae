//! Permission-gated notification gateway and its shipped backends.

use log::{debug, info};

/// Platform notification permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    /// The platform has no notification capability.
    Unsupported,
    /// The user has not decided yet.
    Default,
    Granted,
    Denied,
}

impl PermissionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unsupported => "unsupported",
            Self::Default => "default",
            Self::Granted => "granted",
            Self::Denied => "denied",
        }
    }
}

/// Platform adapter behind `NotificationGateway`.
pub trait NotificationBackend: Send {
    /// Permission state as known by the platform at startup.
    fn initial_permission(&self) -> PermissionState;
    /// Asks the user for permission. Only called while the state is `Default`.
    ///
    /// Returning `Default` means the prompt was dismissed without a decision.
    fn prompt_permission(&mut self) -> PermissionState;
    /// Shows one notification. Only called while permission is `Granted`.
    fn dispatch(&mut self, title: &str, body: &str);
}

/// Capability-gated notification entry point used by the engine.
pub struct NotificationGateway {
    backend: Box<dyn NotificationBackend>,
    permission: PermissionState,
}

impl NotificationGateway {
    pub fn new(backend: Box<dyn NotificationBackend>) -> Self {
        let permission = backend.initial_permission();
        Self {
            backend,
            permission,
        }
    }

    /// Gateway for platforms without notifications; every call is a no-op.
    pub fn unsupported() -> Self {
        Self::new(Box::new(UnsupportedBackend))
    }

    pub fn permission(&self) -> PermissionState {
        self.permission
    }

    /// Prompts once while undecided; otherwise returns the current state.
    pub fn request_permission(&mut self) -> PermissionState {
        if self.permission != PermissionState::Default {
            return self.permission;
        }

        let decided = self.backend.prompt_permission();
        if decided != PermissionState::Unsupported {
            self.permission = decided;
        }
        info!(
            "event=notify_permission module=notify status=ok permission={}",
            self.permission.as_str()
        );
        self.permission
    }

    /// Dispatches when permitted. Returns whether anything was shown.
    pub fn notify(&mut self, title: &str, body: &str) -> bool {
        if self.permission != PermissionState::Granted {
            debug!(
                "event=notify module=notify status=skipped permission={}",
                self.permission.as_str()
            );
            return false;
        }
        self.backend.dispatch(title, body);
        true
    }
}

/// Backend for hosts without any notification surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedBackend;

impl NotificationBackend for UnsupportedBackend {
    fn initial_permission(&self) -> PermissionState {
        PermissionState::Unsupported
    }

    fn prompt_permission(&mut self) -> PermissionState {
        PermissionState::Unsupported
    }

    fn dispatch(&mut self, _title: &str, _body: &str) {}
}

/// Backend that surfaces notifications as `info` records on the
/// `ttlnote::notice` log target.
///
/// Starts undecided; the prompt resolves to `Granted` or `Denied` according
/// to `grant_on_prompt`.
#[derive(Debug, Clone, Copy)]
pub struct LogNotificationBackend {
    grant_on_prompt: bool,
}

impl LogNotificationBackend {
    pub fn new(grant_on_prompt: bool) -> Self {
        Self { grant_on_prompt }
    }
}

impl Default for LogNotificationBackend {
    fn default() -> Self {
        Self::new(true)
    }
}

impl NotificationBackend for LogNotificationBackend {
    fn initial_permission(&self) -> PermissionState {
        PermissionState::Default
    }

    fn prompt_permission(&mut self) -> PermissionState {
        if self.grant_on_prompt {
            PermissionState::Granted
        } else {
            PermissionState::Denied
        }
    }

    fn dispatch(&mut self, title: &str, body: &str) {
        info!(target: "ttlnote::notice", "{title}: {body}");
    }
}
