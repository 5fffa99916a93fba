/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes three top-level command modules:

- `chat`: Interactive chat session
- `ask`: Send one message and print the reply
- `prompts`: Fetch and print suggested prompts

The handlers are thin: every state change goes through `ChatSession`, and
printing goes through `render`.
*/

use crate::backend::{Backend, HttpBackend};
use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
use crate::config::{Config, UiConfig};
use crate::error::{ChatlineError, Result};
use crate::render::{render_conversation, render_message, render_prompts, render_status};
use crate::session::{ChatSession, Feedback, PromptRefresh, TurnOutcome, TurnTicket};
use colored::Colorize;

// Special commands parser for the interactive session
pub mod special_commands;

/// Wait for a turn and print its reply and the refreshed suggestions
async fn submit(session: &ChatSession, ticket: Option<TurnTicket>, ui: &UiConfig) {
    let Some(ticket) = ticket else {
        return;
    };

    println!("{}", "thinking...".dimmed());
    match ticket.outcome().await {
        TurnOutcome::Replied { index } => {
            if let Some(message) = session.messages().get(index) {
                println!("\n{}", render_message(index, message, ui));
            }
            print!("{}", render_prompts(&session.prompts()));
        }
        TurnOutcome::Failed { error } => {
            eprintln!("{} {}", "No reply:".red(), error);
        }
        TurnOutcome::Discarded => {
            tracing::debug!("Reply discarded after reset");
        }
    }
}

fn report_refresh(refresh: PromptRefresh) {
    if refresh == PromptRefresh::Failed {
        eprintln!(
            "{}",
            "Could not refresh suggestions; keeping the previous ones".yellow()
        );
    }
}

// Interactive chat command handler
pub mod chat {
    //! Interactive chat session handler.
    //!
    //! Creates a `ChatSession` against the configured backend and runs a
    //! readline loop. Plain input is sent as a turn; `/` commands act on the
    //! session.

    use super::*;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    /// Start the interactive chat session
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `fetch_prompts` - Fetch suggested prompts before the first turn
    ///
    /// # Errors
    ///
    /// Returns error if the backend client or the line editor cannot be
    /// created. Backend failures during the session are printed, not returned.
    pub async fn run_chat(config: Config, fetch_prompts: bool) -> Result<()> {
        tracing::info!("Starting interactive chat mode");

        let session = ChatSession::from_config(&config)?;
        if fetch_prompts && config.session.fetch_prompts_on_start {
            report_refresh(session.initialize().await);
        }

        let mut rl = DefaultEditor::new()?;

        print_welcome_banner(&config);
        print!("{}", render_prompts(&session.prompts()));

        loop {
            match rl.readline(&format!("{} ", ">".bold())) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(trimmed)?;

                    match parse_special_command(trimmed) {
                        Ok(SpecialCommand::None) => {
                            submit(&session, session.send(&line), &config.ui).await;
                        }
                        Ok(SpecialCommand::Exit) => break,
                        Ok(command) => handle_command(&session, command, &config).await,
                        Err(e) => eprintln!("{}", e.to_string().red()),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    return Err(ChatlineError::Readline(err).into());
                }
            }
        }

        tracing::info!(session = %session.id(), "Chat session ended");
        Ok(())
    }

    /// Apply a parsed special command to the session
    pub(crate) async fn handle_command(
        session: &ChatSession,
        command: SpecialCommand,
        config: &Config,
    ) {
        let ui = &config.ui;
        match command {
            SpecialCommand::NewTopic => {
                let refresh = session.reset_topic().await;
                println!("{}", "Started a new topic".green());
                report_refresh(refresh);
                print!("{}", render_prompts(&session.prompts()));
            }
            SpecialCommand::Clear => {
                session.clear_conversation();
                println!("{}", "Chat cleared".green());
            }
            SpecialCommand::Rate { position, rating } => {
                let toggled = position
                    .checked_sub(1)
                    .and_then(|index| session.toggle_feedback(index, rating));
                match toggled {
                    Some(Feedback::None) => println!("Cleared rating on message {}", position),
                    Some(Feedback::Up) => println!("Rated message {} {}", position, "+1".green()),
                    Some(Feedback::Down) => println!("Rated message {} {}", position, "-1".red()),
                    None => eprintln!("Message {} is not an assistant reply", position),
                }
            }
            SpecialCommand::ShowPrompts => {
                let prompts = session.prompts();
                if prompts.is_empty() {
                    println!("{}", "(no suggestions)".dimmed());
                } else {
                    print!("{}", render_prompts(&prompts));
                }
            }
            SpecialCommand::PickPrompt(position) => {
                let prompt = position
                    .checked_sub(1)
                    .and_then(|index| session.prompts().get(index).cloned());
                match prompt {
                    Some(prompt) => {
                        println!("{} {}", ">".bold(), prompt);
                        submit(session, session.select_prompt(&prompt), ui).await;
                    }
                    None => eprintln!("No suggestion number {}", position),
                }
            }
            SpecialCommand::History => {
                print!("{}", render_conversation(&session.messages(), ui));
            }
            SpecialCommand::FeedbackForm => {
                println!("Share your feedback at {}", ui.feedback_form_url.underline());
            }
            SpecialCommand::ShowStatus => {
                let snapshot = session.snapshot();
                println!(
                    "{}",
                    render_status(
                        snapshot.messages.len(),
                        snapshot.prompts.len(),
                        snapshot.status
                    )
                );
            }
            SpecialCommand::Help => print_help(),
            SpecialCommand::Exit | SpecialCommand::None => {}
        }
    }

    fn print_welcome_banner(config: &Config) {
        println!("\n{}", "Chatline".bold());
        println!("Connected to {}", config.backend.base_url.cyan());
        println!("Type a message, or /help for commands.\n");
    }
}

// One-shot ask command handler
pub mod ask {
    //! Sends a single turn and prints the reply.

    use super::*;

    /// Send `message` and print the reply
    ///
    /// # Errors
    ///
    /// Returns error if the message is blank or the backend call fails
    pub async fn run_ask(config: Config, message: String, json: bool) -> Result<()> {
        let session = ChatSession::from_config(&config)?;
        let ticket = session
            .send(&message)
            .ok_or_else(|| ChatlineError::InvalidInput("message cannot be blank".to_string()))?;

        match ticket.outcome().await {
            TurnOutcome::Replied { index } => {
                if json {
                    println!("{}", serde_json::to_string_pretty(&session.snapshot())?);
                } else {
                    if let Some(reply) = session.messages().get(index) {
                        print!("{}", render_message(index, reply, &config.ui));
                    }
                    print!("{}", render_prompts(&session.prompts()));
                }
                Ok(())
            }
            TurnOutcome::Failed { error } => Err(ChatlineError::Backend(error).into()),
            TurnOutcome::Discarded => Err(ChatlineError::SessionClosed.into()),
        }
    }
}

// Suggested prompts command handler
pub mod prompts {
    //! Prints the backend's current suggested prompts.

    use super::*;

    /// Fetch and print suggested prompts
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be reached
    pub async fn list_prompts(config: &Config, json: bool) -> Result<()> {
        let backend = HttpBackend::new(&config.backend)?;
        let prompts = backend.suggested_prompts().await?;

        if json {
            println!("{}", serde_json::to_string_pretty(&prompts)?);
        } else if prompts.is_empty() {
            println!("{}", "(no suggestions)".dimmed());
        } else {
            print!("{}", render_prompts(&prompts));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::FakeBackend;
    use crate::backend::ChatResponse;
    use crate::diagnostics::TracingDiagnostics;
    use crate::session::Rating;
    use std::sync::Arc;

    fn session(backend: &Arc<FakeBackend>) -> ChatSession {
        ChatSession::new(
            Arc::clone(backend) as Arc<dyn Backend>,
            Arc::new(TracingDiagnostics),
        )
    }

    #[tokio::test]
    async fn test_new_topic_command_resets_and_refetches() {
        let backend = Arc::new(FakeBackend::with_prompts(vec!["Fresh".into()]));
        let session = session(&backend);
        submit(&session, session.send("Hello"), &UiConfig::default()).await;
        assert_eq!(session.messages().len(), 2);

        chat::handle_command(&session, SpecialCommand::NewTopic, &Config::default()).await;
        assert!(session.messages().is_empty());
        assert_eq!(session.prompts(), vec!["Fresh"]);
        assert_eq!(backend.prompt_calls(), 1);
    }

    #[tokio::test]
    async fn test_rate_command_uses_one_based_positions() {
        let backend = Arc::new(FakeBackend::new());
        let session = session(&backend);
        submit(&session, session.send("Hello"), &UiConfig::default()).await;

        chat::handle_command(
            &session,
            SpecialCommand::Rate {
                position: 2,
                rating: Rating::Down,
            },
            &Config::default(),
        )
        .await;
        assert_eq!(session.messages()[1].feedback(), Feedback::Down);
    }

    #[tokio::test]
    async fn test_pick_prompt_sends_suggestion() {
        let backend = Arc::new(FakeBackend::new());
        backend.push_reply(ChatResponse::text("Why did the crab never share?"));
        let session = session(&backend).with_initial_prompts(vec!["Tell me a joke".into()]);

        chat::handle_command(&session, SpecialCommand::PickPrompt(1), &Config::default()).await;
        let messages = session.messages();
        assert_eq!(messages[0].text(), "Tell me a joke");
        assert_eq!(messages[1].text(), "Why did the crab never share?");
    }

    #[tokio::test]
    async fn test_pick_prompt_out_of_range_sends_nothing() {
        let backend = Arc::new(FakeBackend::new());
        let session = session(&backend);

        chat::handle_command(&session, SpecialCommand::PickPrompt(3), &Config::default()).await;
        assert!(session.messages().is_empty());
        assert_eq!(backend.chat_calls(), 0);
    }

    #[tokio::test]
    async fn test_clear_command_keeps_prompts() {
        let backend = Arc::new(FakeBackend::new());
        let session = session(&backend).with_initial_prompts(vec!["Hello".into()]);
        submit(&session, session.send("Hi"), &UiConfig::default()).await;

        chat::handle_command(&session, SpecialCommand::Clear, &Config::default()).await;
        assert!(session.messages().is_empty());
        assert_eq!(session.prompts(), vec!["Hello"]);
        assert_eq!(backend.prompt_calls(), 0);
    }
}
