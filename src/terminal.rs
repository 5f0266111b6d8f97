use colored::Colorize;
use log::{ error, info };
use std::error::Error;
use std::path::PathBuf;
use tokio::io::{ AsyncBufReadExt, BufReader };
use tokio_util::sync::CancellationToken;

use crate::export::Exporter;
use crate::export::raster::TYPING_INDICATOR;
use crate::models::chat::{ Message, Sender };
use crate::session::{ ChatSession, SendOutcome, SessionError };

pub const TITLE: &str = "KIN-Bot - Chat Clínico";
pub const EXPORT_COMMAND: &str = "/pdf";
pub const QUIT_COMMAND: &str = "/salir";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Export,
    Quit,
    Text(String),
}

pub fn parse_input(line: &str) -> Input {
    match line.trim() {
        EXPORT_COMMAND => Input::Export,
        QUIT_COMMAND => Input::Quit,
        _ => Input::Text(line.to_string()),
    }
}

pub fn render_message(message: &Message) -> String {
    let label = format!("{}:", message.sender().display_name());
    match message.sender() {
        Sender::User => format!("{} {}", label.bright_blue().bold(), message.text()),
        Sender::Bot => format!("{} {}", label.bright_cyan().bold(), message.text().cyan()),
    }
}

fn show_typing() {
    println!("{}", TYPING_INDICATOR.bright_black().italic());
}

fn show_error(err: &dyn std::fmt::Display) {
    println!("{}", format!("[{}]", err).bright_red());
}

/// Interactive loop: Enter sends, `/pdf` exports, `/salir` or EOF quits,
/// Ctrl-C cancels the pending request and quits.
pub struct Terminal {
    session: ChatSession,
    exporter: Exporter,
    export_dir: PathBuf,
    shutdown: CancellationToken,
}

impl Terminal {
    pub fn new(session: ChatSession, exporter: Exporter, export_dir: PathBuf) -> Self {
        Self {
            session,
            exporter,
            export_dir,
            shutdown: CancellationToken::new(),
        }
    }

    fn print_new_messages(&self, printed: &mut usize) {
        let transcript = self.session.snapshot();
        for message in &transcript.messages()[*printed..] {
            println!("{}", render_message(message));
        }
        *printed = transcript.len();
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                shutdown.cancel();
            }
        });

        println!("{}", TITLE.bold().blue());
        println!(
            "{}",
            format!("Escribe tu pregunta y pulsa Enter. {} guarda la conversación, {} termina.", EXPORT_COMMAND, QUIT_COMMAND)
                .bright_black()
        );

        let mut printed = 0;
        show_typing();
        match self.session.initialize(&self.shutdown).await {
            Ok(()) => self.print_new_messages(&mut printed),
            Err(SessionError::Cancelled) => return Ok(()),
            Err(e) => {
                error!("Case initialization failed: {}", e);
                show_error(&e);
            }
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                line = lines.next_line() => line?,
            };
            let Some(line) = line else { break };

            match parse_input(&line) {
                Input::Quit => break,
                Input::Export => match self.session.export(&self.exporter, &self.export_dir) {
                    Ok(path) => println!("{}", format!("PDF guardado en {}", path.display()).green()),
                    Err(e) => {
                        error!("Export failed: {}", e);
                        show_error(&e);
                    }
                },
                Input::Text(text) => {
                    if text.trim().is_empty() {
                        continue;
                    }
                    show_typing();
                    match self.session.send(&text, &self.shutdown).await {
                        Ok(SendOutcome::Replied(_)) => self.print_new_messages(&mut printed),
                        Ok(SendOutcome::Ignored) => {}
                        Err(SessionError::Cancelled) => break,
                        Err(e) => show_error(&e),
                    }
                }
            }
        }

        info!("Session {} closed", self.session.id());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_are_recognised() {
        assert_eq!(parse_input("/pdf"), Input::Export);
        assert_eq!(parse_input("  /salir "), Input::Quit);
        assert_eq!(parse_input("¿Le duele?"), Input::Text("¿Le duele?".to_string()));
    }

    #[test]
    fn rendered_messages_carry_their_label() {
        colored::control::set_override(false);
        assert_eq!(render_message(&Message::user("Hola")), "Tú: Hola");
        assert_eq!(render_message(&Message::bot("Buenas")), "KIN-Bot: Buenas");
    }
}
