use crate::chat::ChatApp;
use crate::locale::Locale;
use crate::session::Conversation;
use crate::types::Role;
use anyhow::Result;
use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::Write;

const HISTORY_COMMAND: &str = "/history";
const QUIT_COMMAND: &str = "/quit";

/// Plain-text transcript of the visible turns, labeled by role.
pub fn render_transcript(conversation: &Conversation, locale: Locale) -> String {
    conversation
        .visible()
        .map(|msg| {
            let label = match msg.role {
                Role::User => locale.user_label(),
                Role::Assistant => locale.assistant_label(),
            };
            format!("{label}: {}", msg.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Failure text as printed after a streamed reply. When deltas were already
/// shown, the failure starts on its own line since that partial text is not
/// kept in the transcript.
pub fn failure_output(text: &str, partial_shown: bool) -> String {
    if partial_shown {
        format!("\n{text}")
    } else {
        text.to_string()
    }
}

fn print_transcript(app: &ChatApp) {
    let locale = app.locale();
    println!("{}", locale.history_header().bold());
    let transcript = render_transcript(app.conversation(), locale);
    if !transcript.is_empty() {
        println!("{transcript}");
    }
}

/// Run the interactive loop until the user quits.
pub async fn run(mut app: ChatApp) -> Result<()> {
    let locale = app.locale();
    let mut editor = DefaultEditor::new()?;

    println!("{}", locale.title().bold());
    println!("{}", locale.help().dimmed());

    loop {
        let line = match editor.readline(locale.prompt()) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        };

        match line.trim() {
            "" => continue,
            QUIT_COMMAND => break,
            HISTORY_COMMAND => {
                print_transcript(&app);
                continue;
            }
            _ => {}
        }
        let _ = editor.add_history_entry(line.as_str());

        println!("{}", locale.waiting().dimmed());
        print!("{} ", format!("{}:", locale.assistant_label()).bright_green().bold());
        let _ = std::io::stdout().flush();

        let mut partial_shown = false;
        let reply = app
            .submit(&line, |piece| {
                partial_shown |= !piece.is_empty();
                print!("{piece}");
                let _ = std::io::stdout().flush();
            })
            .await;

        if let Some(reply) = reply {
            if reply.is_failure() {
                println!("{}", failure_output(reply.text(), partial_shown).red());
            } else {
                println!();
            }
        }
    }

    tracing::info!(turns = app.conversation().visible().count(), "chat session ended");
    Ok(())
}
