//! Interactive confirmation prompt
//!
//! Implements the engine's confirmation capability by reading stdin, so
//! destructive operations pause for a yes/no answer unless --force is set.

use std::io::Write;

use osc_core::Confirm;

/// Reads yes/no answers from stdin
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinConfirm {
    /// Render the question with color
    pub color: bool,
}

impl StdinConfirm {
    pub fn new(color: bool) -> Self {
        Self { color }
    }
}

impl Confirm for StdinConfirm {
    fn confirm(&self, question: &str, default_yes: bool) -> bool {
        let hint = if default_yes { "[Y/n] " } else { "[y/N] " };
        loop {
            if self.color {
                print!("{} {hint}", console::style(question).yellow());
            } else {
                print!("{question} {hint}");
            }
            let _ = std::io::stdout().flush();

            let mut answer = String::new();
            if std::io::stdin().read_line(&mut answer).is_err() {
                return false;
            }
            match answer.trim().to_ascii_lowercase().as_str() {
                "" => return default_yes,
                "y" | "ye" | "yes" => return true,
                "n" | "no" => return false,
                _ => println!("Please respond with 'yes' or 'no' (or 'y' or 'n')."),
            }
        }
    }
}
