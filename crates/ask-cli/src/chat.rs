use std::io::{self, Write};
use std::path::Path;

use ask_client::Backend;
use ask_core::{Step, Wizard};
use colored::Colorize;

use crate::interrupt::or_exit;
use crate::App;

/// Interactive wizard: rules PDF, audio, then a question loop.
pub async fn run_chat(app: &mut App) -> anyhow::Result<()> {
    println!("{}", "🤖 Rules Co-Pilot".cyan().bold());
    println!(
        "{}",
        format!("Session ID: {}", app.context.read().get_or_create_session_id()).dimmed()
    );

    let mut wizard = match or_exit(app.backend.status()).await {
        Ok(status) => Wizard::from_status(status.pdf_processed, &mut app.context.write()),
        Err(err) => {
            log::error!("Error checking server status: {}", err);
            println!("{}", "Could not connect to server.".red());
            Wizard::new()
        }
    };

    loop {
        let keep_going = match wizard.step() {
            Step::Document => document_step(app, &mut wizard).await?,
            Step::Audio => audio_step(app, &mut wizard).await?,
            Step::Chat => chat_step(app, &mut wizard).await?,
        };
        if !keep_going {
            break;
        }
    }

    println!("{}", "👋 Goodbye!".cyan());
    Ok(())
}

/// Read one trimmed line. `None` on EOF; Ctrl-C exits.
async fn prompt(label: &str) -> io::Result<Option<String>> {
    print!("{label}");
    io::stdout().flush()?;

    let line = or_exit(tokio::task::spawn_blocking(|| {
        let mut input = String::new();
        let read = io::stdin().read_line(&mut input)?;
        Ok::<_, io::Error>((read > 0).then_some(input))
    }))
    .await
    .map_err(io::Error::other)??;
    Ok(line.map(|input| input.trim().to_string()))
}

fn step_header(step: Step, title: &str) {
    println!();
    println!("{}", format!("Step {}/3: {}", step.number(), title).cyan().bold());
}

async fn document_step(app: &mut App, wizard: &mut Wizard) -> anyhow::Result<bool> {
    step_header(Step::Document, "Rules PDF");
    let Some(input) = prompt("PDF path (Enter to skip): ").await? else {
        return Ok(false);
    };

    if input.is_empty() {
        wizard.skip_document(&mut app.context.write());
        println!("{}", format!("📄 {}", wizard.document_summary()).dimmed());
        return Ok(true);
    }

    println!("{}", "Processing PDF... This may take a moment.".dimmed());
    match or_exit(app.backend.process_pdf(Path::new(&input))).await {
        Ok(upload) => {
            wizard.document_indexed(&mut app.context.write(), upload.pdf_filename);
            println!("{}", "✅ PDF processed successfully!".green());
        }
        Err(err) => {
            log::error!("Error processing PDF: {}", err);
            println!("{}", format!("Error: {err}").red());
        }
    }
    Ok(true)
}

async fn audio_step(app: &mut App, wizard: &mut Wizard) -> anyhow::Result<bool> {
    step_header(Step::Audio, "Audio");
    let Some(input) = prompt("Audio path (Enter to skip): ").await? else {
        return Ok(false);
    };

    if input.is_empty() {
        wizard.skip_audio(&mut app.context.write());
        println!("{}", format!("🎵 {}", wizard.audio_summary()).dimmed());
        return Ok(true);
    }

    println!(
        "{}",
        "Uploading and transcribing audio... This can take time.".dimmed()
    );
    match or_exit(app.backend.process_audio(Path::new(&input))).await {
        Ok(upload) => {
            wizard.audio_transcribed(
                &mut app.context.write(),
                upload.transcript.unwrap_or_default(),
                upload.audio_filename,
            );
            println!("{}", "✅ Audio transcribed successfully!".green());
        }
        Err(err) => {
            log::error!("Error processing audio: {}", err);
            println!("{}", format!("Error: {err}").red());
        }
    }
    Ok(true)
}

/// Question loop. Returns `Ok(true)` after a reset so the wizard restarts.
async fn chat_step(app: &mut App, wizard: &mut Wizard) -> anyhow::Result<bool> {
    step_header(Step::Chat, "Chat");
    println!("{}", format!("📄 {}", wizard.document_summary()).dimmed());
    println!("{}", format!("🎵 {}", wizard.audio_summary()).dimmed());
    println!(
        "{}",
        "Type a question. Ctrl-C stops an answer, /reset starts over, 'exit' leaves.".dimmed()
    );

    loop {
        println!();
        let Some(input) = prompt(&format!("{} ", "You:".cyan().bold())).await? else {
            return Ok(false);
        };

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            return Ok(false);
        }
        if input.is_empty() {
            continue;
        }
        if input == "/reset" {
            if reset(app, wizard).await? {
                return Ok(true);
            }
            continue;
        }

        println!("{}", "Assistant:".green().bold());
        app.stream_answer(&input).await?;
    }
}

async fn reset(app: &mut App, wizard: &mut Wizard) -> anyhow::Result<bool> {
    let confirm = prompt("This deletes the current rules index. Are you sure? [y/N] ").await?;
    if !matches!(confirm.as_deref(), Some("y") | Some("Y")) {
        return Ok(false);
    }

    match or_exit(app.backend.reset_index()).await {
        Ok(()) => {
            wizard.reset(&mut app.context.write());
            println!("{}", "App reset. You can now upload a new PDF.".green());
            Ok(true)
        }
        Err(err) => {
            log::error!("Error resetting index: {}", err);
            println!("{}", format!("Could not reset app: {err}").red());
            Ok(false)
        }
    }
}
