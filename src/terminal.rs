use std::io::{self, BufRead, IsTerminal, Write};

use issue_sidebar::ui::{Host, Level, PickItem};

/// Host implementation on stdin/stderr
pub struct TerminalHost {
    assume_yes: bool,
}

impl TerminalHost {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }

    fn prompt_line(&self, prompt: &str) -> Option<String> {
        eprint!("{}", prompt);
        io::stderr().flush().ok()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line).ok()?;
        let line = line.trim().to_string();
        if line.is_empty() {
            None
        } else {
            Some(line)
        }
    }
}

impl Host for TerminalHost {
    fn notify(&self, level: Level, message: &str, modal: bool) {
        let prefix = match level {
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
        };
        eprintln!("{}: {}", prefix, message);

        if modal && io::stdin().is_terminal() {
            let _ = self.prompt_line("Press Enter to continue...");
        }
    }

    fn input(&self, prompt: &str, placeholder: &str, password: bool) -> Option<String> {
        if password {
            let secret = rpassword::prompt_password(format!("{}: ", prompt)).ok()?;
            let secret = secret.trim().to_string();
            return if secret.is_empty() { None } else { Some(secret) };
        }

        if !placeholder.is_empty() {
            eprintln!("{}", placeholder);
        }
        self.prompt_line(&format!("{}: ", prompt))
    }

    fn pick(&self, items: &[PickItem], placeholder: &str) -> Option<usize> {
        for (i, item) in items.iter().enumerate() {
            eprintln!("{:>4}) {} ({})", i + 1, item.label, item.description);
        }

        let answer = self.prompt_line(&format!("{} [1-{}]: ", placeholder, items.len()))?;
        match answer.parse::<usize>() {
            Ok(n) if (1..=items.len()).contains(&n) => Some(n - 1),
            _ => {
                eprintln!("error: not a valid choice: {}", answer);
                None
            }
        }
    }

    fn confirm(&self, message: &str, action: &str) -> bool {
        if self.assume_yes {
            return true;
        }

        let answer = self.prompt_line(&format!("{} ({}) [y/N]: ", message, action));
        matches!(answer.as_deref(), Some("y" | "Y" | "yes" | "Yes"))
    }
}
