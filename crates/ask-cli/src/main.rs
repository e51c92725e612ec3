use std::path::PathBuf;
use std::sync::Arc;

use ask_client::{
    Backend, ClientConfig, HttpBackend, QueryController, QueryError, QueryReport,
    NO_CONTEXT_MESSAGE,
};
use ask_core::{ChatEvent, ContextStore, FileStore, KeyValueStore, RenderStyle};
use clap::{Parser, Subcommand};
use colored::Colorize;
use futures::{Stream, StreamExt};
use parking_lot::RwLock;
use tokio::sync::mpsc;

mod chat;
mod interrupt;
mod logging;
mod render;

use logging::init_logging;

#[derive(Parser)]
#[command(name = "ask-cli")]
#[command(about = "Ask questions about a rules PDF and a meeting recording")]
#[command(version)]
struct Cli {
    /// Backend origin (overrides ask.toml and ASK_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Directory holding the persisted session id
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short, default_value = "false")]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Guided flow: rules PDF, audio, then chat
    Chat,
    /// Ask a single question and stream the answer
    Ask {
        question: String,
        /// File whose contents are sent as the transcript
        #[arg(long)]
        transcript_file: Option<PathBuf>,
        /// Treat the rules PDF as indexed without asking the backend
        #[arg(long)]
        pdf_indexed: bool,
    },
    /// Upload and index a rules PDF
    UploadPdf { file: PathBuf },
    /// Upload and transcribe an audio file
    UploadAudio { file: PathBuf },
    /// Show whether the backend holds an index
    Status,
    /// Delete the backend's rules index
    Reset,
    /// Print this installation's session id
    SessionId,
}

/// Everything a command needs to talk to the backend.
pub struct App {
    pub backend: Arc<HttpBackend>,
    pub context: Arc<RwLock<ContextStore>>,
    pub controller: Arc<QueryController>,
    pub events: mpsc::UnboundedReceiver<ChatEvent>,
}

impl App {
    fn new(config: &ClientConfig) -> anyhow::Result<Self> {
        let backend = HttpBackend::new(config)?;
        let storage = Arc::new(FileStore::new(config.session_store_path()));
        Ok(Self::with_parts(backend, storage, config.display.render_style()))
    }

    fn with_parts(
        backend: HttpBackend,
        storage: Arc<dyn KeyValueStore>,
        style: RenderStyle,
    ) -> Self {
        let backend = Arc::new(backend);
        let context = Arc::new(RwLock::new(ContextStore::new(storage)));
        let (controller, events) =
            QueryController::new(backend.clone(), Arc::clone(&context), style);
        Self {
            backend,
            context,
            controller: Arc::new(controller),
            events,
        }
    }

    /// Submit `question` and print the answer as it streams. Ctrl-C stops
    /// generation.
    pub async fn stream_answer(&mut self, question: &str) -> anyhow::Result<Option<QueryReport>> {
        self.stream_answer_until(question, interrupt::interrupts()).await
    }

    /// Like [`App::stream_answer`], with each item of `interrupts` acting as
    /// a stop request.
    async fn stream_answer_until<S>(
        &mut self,
        question: &str,
        mut interrupts: S,
    ) -> anyhow::Result<Option<QueryReport>>
    where
        S: Stream<Item = ()> + Unpin,
    {
        let mut task = tokio::spawn({
            let controller = Arc::clone(&self.controller);
            let question = question.to_string();
            async move { controller.submit_question(&question).await }
        });

        let joined = loop {
            tokio::select! {
                Some(event) = self.events.recv() => render::print_event(&event)?,
                Some(()) = interrupts.next() => {
                    if !self.controller.cancel() {
                        log::debug!("Interrupt ignored, nothing to stop");
                    }
                }
                joined = &mut task => break joined,
            }
        };
        while let Ok(event) = self.events.try_recv() {
            render::print_event(&event)?;
        }

        match joined? {
            Ok(report) => Ok(Some(report)),
            Err(QueryError::Validation(message)) if message == NO_CONTEXT_MESSAGE => Ok(None),
            Err(err) => {
                println!("{}", format!("❌ {err}").red());
                Ok(None)
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let mut config = ClientConfig::load();
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }
    if let Some(state_dir) = cli.state_dir {
        config.state_dir = state_dir;
    }
    log::debug!("Backend: {}", config.api_url);
    log::debug!("Session store: {}", config.session_store_path().display());

    let mut app = App::new(&config)?;

    match cli.command {
        Commands::Chat => chat::run_chat(&mut app).await,
        Commands::Ask {
            question,
            transcript_file,
            pdf_indexed,
        } => ask_once(&mut app, &question, transcript_file, pdf_indexed).await,
        Commands::UploadPdf { file } => {
            let upload = app.backend.process_pdf(&file).await?;
            println!("{}", format!("✅ PDF processed: {}", upload.pdf_filename).green());
            Ok(())
        }
        Commands::UploadAudio { file } => {
            let upload = app.backend.process_audio(&file).await?;
            println!("{}", format!("✅ Audio transcribed: {}", upload.audio_filename).green());
            println!("{}", upload.transcript.unwrap_or_default());
            Ok(())
        }
        Commands::Status => {
            let status = app.backend.status().await?;
            if status.pdf_processed {
                println!("{}", "📄 Rules PDF: indexed".green());
            } else {
                println!("{}", "📄 Rules PDF: not indexed".yellow());
            }
            Ok(())
        }
        Commands::Reset => {
            app.backend.reset_index().await?;
            println!("{}", "🧹 Index reset".cyan());
            Ok(())
        }
        Commands::SessionId => {
            println!("{}", app.context.read().get_or_create_session_id());
            Ok(())
        }
    }
}

async fn ask_once(
    app: &mut App,
    question: &str,
    transcript_file: Option<PathBuf>,
    pdf_indexed: bool,
) -> anyhow::Result<()> {
    let transcript = match transcript_file {
        Some(path) => Some(tokio::fs::read_to_string(&path).await?),
        None => None,
    };
    let pdf_indexed = if pdf_indexed {
        true
    } else {
        match app.backend.status().await {
            Ok(status) => status.pdf_processed,
            Err(err) => {
                log::warn!("Could not read backend status: {}", err);
                false
            }
        }
    };

    {
        let mut context = app.context.write();
        context.set_transcript(transcript);
        context.set_document_indexed(pdf_indexed);
    }

    if let Some(report) = app.stream_answer(question).await? {
        log::debug!("Final phase: {:?}", report.phase);
    }
    Ok(())
}
