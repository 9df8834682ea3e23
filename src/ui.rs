//! Host UI capabilities the core needs: notifications and input dialogs.
//!
//! The core never renders anything itself. A terminal host lives in the
//! binary; tests use a scripted host.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Error,
}

/// One entry of a pick list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickItem {
    pub label: String,
    pub description: String,
}

pub trait Host: Send + Sync {
    /// Show a notification. Modal notifications block until acknowledged.
    fn notify(&self, level: Level, message: &str, modal: bool);

    /// Ask for a line of text. `None` when cancelled.
    fn input(&self, prompt: &str, placeholder: &str, password: bool) -> Option<String>;

    /// Offer a single choice. Returns the index of the picked item.
    fn pick(&self, items: &[PickItem], placeholder: &str) -> Option<usize>;

    /// Modal confirmation with a single affirmative action
    fn confirm(&self, message: &str, action: &str) -> bool;

    fn info(&self, message: &str) {
        self.notify(Level::Info, message, false);
    }

    fn warn(&self, message: &str) {
        self.notify(Level::Warning, message, false);
    }

    fn error(&self, message: &str) {
        self.notify(Level::Error, message, false);
    }
}
