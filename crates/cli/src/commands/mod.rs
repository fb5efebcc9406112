//! Subcommand implementations.
//!
//! Every command drives the [`Storefront`] and prints plain text to stdout.
//! Notifications queued by the storefront are printed once the command is
//! done, by [`print_notifications`].

pub mod account;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod session;

use std::io::BufRead;

use thiserror::Error;

use vivahart_storefront::{AppError, NotificationLevel, Storefront};

/// Errors that end a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The storefront reported a failure (already notified).
    #[error(transparent)]
    Storefront(#[from] AppError),

    /// Bad command-line or prompt input.
    #[error("Invalid input: {0}")]
    Input(String),

    /// Reading stdin failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Payment request could not be rendered.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Print queued notifications, errors to stderr.
#[allow(clippy::print_stdout, clippy::print_stderr)]
pub fn print_notifications(storefront: &mut Storefront) {
    for notification in storefront.drain_notifications() {
        match notification.level {
            NotificationLevel::Error => eprintln!("{notification}"),
            NotificationLevel::Success | NotificationLevel::Info => println!("{notification}"),
        }
    }
}

/// Print one line of command output.
#[allow(clippy::print_stdout)]
pub fn out(line: impl std::fmt::Display) {
    println!("{line}");
}

/// Read one trimmed line from stdin, after showing `prompt` on stderr.
///
/// # Errors
///
/// Returns an error if stdin cannot be read or is already closed.
#[allow(clippy::print_stderr)]
pub fn prompt_line(prompt: &str) -> Result<String, CommandError> {
    eprint!("{prompt}");
    let mut line = String::new();
    let read = std::io::stdin().lock().read_line(&mut line)?;
    if read == 0 {
        return Err(CommandError::Input("stdin closed".to_string()));
    }
    Ok(line.trim().to_string())
}
