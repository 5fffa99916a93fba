//! Terminal rendering of session snapshots
//!
//! Pure presentation: these functions only read messages and prompts.
//! Positions are shown 1-based; the chat loop converts them back.

use colored::Colorize;

use crate::config::UiConfig;
use crate::session::{Feedback, Message, ReferenceLink, SessionStatus};

/// Render the message at `index` with its attachments
pub fn render_message(index: usize, message: &Message, ui: &UiConfig) -> String {
    let mut out = String::new();
    match message {
        Message::User { text } => {
            out.push_str(&format!(
                "[{}] {}\n{}\n",
                index + 1,
                ui.user_label.bold().blue(),
                text
            ));
        }
        Message::Assistant { text, .. } => {
            out.push_str(&format!(
                "[{}] {}{}\n{}\n",
                index + 1,
                ui.assistant_label.bold().green(),
                feedback_marker(message.feedback()),
                text
            ));
            for image in message.images() {
                out.push_str(&format!(
                    "  {} {} ({})\n",
                    "image:".dimmed(),
                    image.url,
                    image.source
                ));
            }
            for reference in message.references() {
                let link = match reference.link() {
                    Some(ReferenceLink::Web(url)) => format!(" <{}>", url),
                    Some(ReferenceLink::Document(url)) => format!(" [doc] <{}>", url),
                    None => String::new(),
                };
                out.push_str(&format!(
                    "  {} {}{}\n",
                    "ref:".dimmed(),
                    reference.title,
                    link
                ));
            }
        }
    }
    out
}

fn feedback_marker(feedback: Feedback) -> String {
    match feedback {
        Feedback::None => String::new(),
        Feedback::Up => format!(" {}", "[+1]".green()),
        Feedback::Down => format!(" {}", "[-1]".red()),
    }
}

/// Render the whole conversation
pub fn render_conversation(messages: &[Message], ui: &UiConfig) -> String {
    if messages.is_empty() {
        return format!("{}\n", "(no messages yet)".dimmed());
    }
    messages
        .iter()
        .enumerate()
        .map(|(index, message)| render_message(index, message, ui))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render suggested prompts as a numbered list
pub fn render_prompts(prompts: &[String]) -> String {
    if prompts.is_empty() {
        return String::new();
    }
    let mut out = format!("{}\n", "Suggestions:".bold());
    for (i, prompt) in prompts.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", i + 1, prompt.cyan()));
    }
    out
}

/// One-line session status
pub fn render_status(messages: usize, prompts: usize, status: SessionStatus) -> String {
    let status = match status {
        SessionStatus::Idle => "idle".green(),
        SessionStatus::AwaitingResponse => "awaiting response".yellow(),
    };
    format!("{} messages, {} suggestions, {}", messages, prompts, status)
}
