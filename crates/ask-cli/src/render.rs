use std::io::{self, Write};

use ask_core::ChatEvent;
use colored::Colorize;

const CLEAR_LINE: &str = "\r\x1b[2K";

/// Print one controller event to the terminal.
pub fn print_event(event: &ChatEvent) -> io::Result<()> {
    let mut stdout = io::stdout();
    match event {
        ChatEvent::Question { content } => {
            log::debug!("Question accepted: {}", content);
        }
        ChatEvent::Placeholder { content } => {
            write!(stdout, "{}", content.dimmed())?;
        }
        ChatEvent::AnswerStarted => {
            write!(stdout, "{CLEAR_LINE}")?;
        }
        ChatEvent::Token { content } => {
            write!(stdout, "{}", content.green())?;
        }
        ChatEvent::Replaced { content } => {
            write!(stdout, "{CLEAR_LINE}{}", content.red())?;
        }
        ChatEvent::Stopped { marker } => {
            write!(stdout, "{}", marker.yellow())?;
        }
        ChatEvent::Error { content } => {
            write!(stdout, "{}", content.red())?;
        }
        ChatEvent::Status { message, is_error } => {
            if *is_error {
                writeln!(stdout, "{}", message.red())?;
            } else {
                writeln!(stdout, "{}", message.green())?;
            }
        }
        ChatEvent::Controls {
            submit_enabled,
            stop_enabled,
        } => {
            log::debug!("Controls: submit={} stop={}", submit_enabled, stop_enabled);
        }
        ChatEvent::FocusInput => {}
        ChatEvent::Finished { phase } => {
            writeln!(stdout)?;
            log::debug!("Answer finished: {:?}", phase);
        }
    }
    stdout.flush()
}
