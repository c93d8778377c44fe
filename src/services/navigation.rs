use std::sync::{Mutex, PoisonError};

/// Performs a full navigation to another route of the application.
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// Navigator that records where the application was sent. The command-line
/// client uses it to report redirects instead of following them.
#[derive(Debug, Default)]
pub struct HistoryNavigator {
    history: Mutex<Vec<String>>,
}

impl HistoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<String> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    pub fn history(&self) -> Vec<String> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Navigator for HistoryNavigator {
    fn navigate(&self, path: &str) {
        log::info!("Navigating to {}", path);
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.to_string());
    }
}

/// Login route carrying the reason the session ended.
pub fn session_expired_path(login_route: &str) -> String {
    format!("{}?reason=session_expired", login_route)
}
