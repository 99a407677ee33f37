//! `vgen` operator CLI.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use vgen_client::{ClientConfig, StudioApi, StudioClient};
use vgen_dashboard::{
    actions_for, init_tracing, DashboardConfig, DashboardError, DashboardSession, IdeaAction, IdeaView,
};
use vgen_models::{
    parse_keywords, progress_bar, status_display, BatchAction, CustomScriptRequest, GenerateIdeasRequest,
    Idea, IdeaId, Stage, UploadVideoRequest, ValidateIdeaRequest, VideoType,
};

#[derive(Parser)]
#[command(name = "vgen", about = "Operate the video generation pipeline")]
struct Cli {
    /// Backend base URL (or set VGEN_BACKEND_URL)
    #[arg(long, env = "VGEN_BACKEND_URL")]
    backend_url: Option<String>,

    /// Emit JSON logs
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum VideoTypeArg {
    Short,
    Normal,
}

impl From<VideoTypeArg> for VideoType {
    fn from(arg: VideoTypeArg) -> Self {
        match arg {
            VideoTypeArg::Short => VideoType::Short,
            VideoTypeArg::Normal => VideoType::Normal,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List ideas, optionally filtered
    List {
        /// Case-insensitive filter over title, keywords and status
        #[arg(long)]
        query: Option<String>,
    },
    /// Show one idea with its available actions
    Show { id: String },
    /// Ask the backend to generate new ideas
    Generate {
        #[arg(long, default_value_t = 5)]
        count: u32,
        /// Comma-separated keywords
        #[arg(long)]
        keywords: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, value_enum, default_value = "short")]
        video_type: VideoTypeArg,
        #[arg(long, default_value_t = 30)]
        duration: u32,
        /// Number of sections for long-form videos
        #[arg(long)]
        sections: Option<u32>,
    },
    /// Create an idea from a script written by hand
    Script {
        /// File holding the script text
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        keywords: Option<String>,
        #[arg(long, value_enum, default_value = "short")]
        video_type: VideoTypeArg,
        #[arg(long, default_value_t = 30)]
        duration: u32,
    },
    /// Validate a pending idea
    Validate {
        id: String,
        #[arg(long, value_enum)]
        video_type: VideoTypeArg,
        /// Target duration in seconds
        #[arg(long)]
        duration: u32,
        #[arg(long)]
        keywords: Option<String>,
    },
    Reject { id: String },
    Delete { id: String },
    /// Queue generation starting at a stage
    Start {
        id: String,
        /// script, adapt, audio or video
        #[arg(long, default_value = "script")]
        from: Stage,
    },
    /// Continue a failed idea after its last checkpoint
    Resume { id: String },
    /// Start a failed idea over from the script
    Restart { id: String },
    /// Remove a queued job
    Cancel { id: String },
    /// Publish a generated video on YouTube
    Upload {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
        /// Publish time (RFC 3339) instead of now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Rendered videos and their YouTube state
    Videos,
    /// Apply generate, delete, validate or reject to several ideas
    Batch {
        action: BatchAction,
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Start several ideas one after the other
    BulkStart {
        #[arg(required = true)]
        ids: Vec<String>,
        #[arg(long, default_value = "script")]
        from: Stage,
    },
    /// Queue statistics and status counters
    Stats,
    /// Job-queue status of one idea
    Queue { id: String },
    /// Live view until Ctrl-C
    Watch {
        #[arg(long)]
        query: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = DashboardConfig::from_env();
    init_tracing(config.json_logs || cli.json_logs);

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Erreur : {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Keep only the operator-facing message.
fn user_error(e: DashboardError) -> anyhow::Error {
    anyhow::anyhow!(e.user_message())
}

async fn run(cli: Cli, config: DashboardConfig) -> Result<()> {
    let mut client_config = ClientConfig::from_env().context("invalid backend configuration")?;
    if let Some(url) = cli.backend_url.as_deref() {
        client_config.base_url = ClientConfig::new(url).context("invalid --backend-url")?.base_url;
    }
    info!(backend = %client_config.base_url, "Connecting to backend");

    let api: Arc<dyn StudioApi> = Arc::new(StudioClient::new(client_config)?);
    let mut session = DashboardSession::new(api, &config);
    session.refresh().await.map_err(user_error)?;

    let result = execute(&mut session, cli.command, &config).await;
    session.shutdown().await;
    result
}

async fn execute(session: &mut DashboardSession, command: Commands, config: &DashboardConfig) -> Result<()> {
    match command {
        Commands::List { query } => {
            if let Some(query) = query {
                session.collection().write().await.set_query(query);
            }
            print_view(&session.view().await);
        }
        Commands::Show { id } => {
            let idea = session.idea(&IdeaId::from(id)).await.map_err(user_error)?;
            print_idea(&idea);
            if idea.script_id.is_some() {
                if let Some(script) = session.script(&idea.id).await.map_err(user_error)? {
                    println!("  script     : {} phrase(s)", script.phrases.len());
                    println!();
                    println!("{}", script.spoken_text());
                }
            }
        }
        Commands::Generate {
            count,
            keywords,
            title,
            video_type,
            duration,
            sections,
        } => {
            let request = GenerateIdeasRequest {
                count,
                keywords: keywords.as_deref().map(parse_keywords),
                custom_title: title,
                video_type: video_type.into(),
                duration_seconds: duration,
                sections_count: sections,
            };
            let generated = session.controller().generate_ideas(&request).await.map_err(user_error)?;
            println!("{} idée(s) générée(s)", generated.count);
            for idea in &generated.ideas {
                println!("  {}  {}", idea.id, idea.title);
            }
        }
        Commands::Script {
            file,
            title,
            keywords,
            video_type,
            duration,
        } => {
            let script_text = std::fs::read_to_string(&file)
                .with_context(|| format!("cannot read {}", file.display()))?;
            let request = CustomScriptRequest {
                script_text,
                custom_title: title,
                keywords: keywords.as_deref().map(parse_keywords),
                video_type: video_type.into(),
                duration_seconds: duration,
            };
            let created = session.controller().create_from_script(&request).await.map_err(user_error)?;
            for idea in &created.ideas {
                println!("Idée créée : {}  {}", idea.id, idea.title);
            }
        }
        Commands::Validate {
            id,
            video_type,
            duration,
            keywords,
        } => {
            let idea = session.idea(&IdeaId::from(id)).await.map_err(user_error)?;
            let mut request = ValidateIdeaRequest::new(video_type.into(), duration);
            if let Some(keywords) = keywords.as_deref() {
                request = request.with_keywords(parse_keywords(keywords));
            }
            let updated = session.controller().validate(&idea, &request).await.map_err(user_error)?;
            println!("{} : {}", updated.id, status_display(updated.status).label);
        }
        Commands::Reject { id } => {
            let idea = session.idea(&IdeaId::from(id)).await.map_err(user_error)?;
            session.controller().reject(&idea).await.map_err(user_error)?;
            println!("Idée rejetée : {}", idea.id);
        }
        Commands::Delete { id } => {
            let idea = session.idea(&IdeaId::from(id)).await.map_err(user_error)?;
            session.controller().delete(&idea).await.map_err(user_error)?;
            println!("Idée supprimée : {}", idea.id);
        }
        Commands::Start { id, from } => {
            let idea = session.idea(&IdeaId::from(id)).await.map_err(user_error)?;
            let response = session.controller().start_stage(&idea, from).await.map_err(user_error)?;
            print_started(&response.idea_id, response.start_from, response.queue_position);
        }
        Commands::Resume { id } => {
            let idea = session.idea(&IdeaId::from(id)).await.map_err(user_error)?;
            let response = session.controller().resume(&idea).await.map_err(user_error)?;
            print_started(&response.idea_id, response.start_from, response.queue_position);
        }
        Commands::Restart { id } => {
            let idea = session.idea(&IdeaId::from(id)).await.map_err(user_error)?;
            let response = session.controller().restart(&idea).await.map_err(user_error)?;
            print_started(&response.idea_id, response.start_from, response.queue_position);
        }
        Commands::Cancel { id } => {
            let idea = session.idea(&IdeaId::from(id)).await.map_err(user_error)?;
            let response = session.controller().cancel(&idea).await.map_err(user_error)?;
            println!("{}", response.message);
        }
        Commands::Upload {
            id,
            title,
            description,
            tags,
            at,
        } => {
            let idea = session.idea(&IdeaId::from(id)).await.map_err(user_error)?;
            let request = UploadVideoRequest {
                title,
                description,
                tags: tags.as_deref().map(parse_keywords).unwrap_or_default(),
                publish_at: at,
            };
            let response = session.controller().upload(&idea, &request).await.map_err(user_error)?;
            match at {
                Some(at) => println!("{} : publication planifiée le {} ({})", idea.id, at, response.youtube_url),
                None => println!("{} : publiée sur {}", idea.id, response.youtube_url),
            }
        }
        Commands::Videos => {
            let videos = session.videos().await.map_err(user_error)?;
            if videos.is_empty() {
                println!("Aucune vidéo");
            }
            for video in &videos {
                let state = match (&video.youtube_url, video.scheduled_publish_date) {
                    (Some(url), _) => url.clone(),
                    (None, Some(at)) if video.is_scheduled => format!("planifiée le {}", at),
                    _ => "non publiée".to_string(),
                };
                println!("{:<24} {:>6.1}s  {}  {}", video.idea_id.as_str(), video.duration_seconds, state, video.title);
            }
        }
        Commands::Batch { action, ids } => {
            let ids: Vec<IdeaId> = ids.into_iter().map(IdeaId::from).collect();
            let report = session.controller().batch_action(&ids, action).await.map_err(user_error)?;
            println!("{}", report.message());
            for failure in &report.outcome.failed {
                println!("  échec {} : {}", failure.id(), failure.reason().unwrap_or("-"));
            }
            for id in &report.dropped {
                println!("  ignorée (inconnue) : {}", id);
            }
            for (id, reason) in &report.refused {
                println!("  refusée {} : {:?}", id, reason);
            }
        }
        Commands::BulkStart { ids, from } => {
            let ids: Vec<IdeaId> = ids.into_iter().map(IdeaId::from).collect();
            let report = session.controller().bulk_start(&ids, from).await;
            println!("{}", report.summary());
            for (id, message) in &report.failed {
                println!("  échec {} : {}", id, message);
            }
            for (id, reason) in &report.skipped {
                println!("  ignorée {} : {:?}", id, reason);
            }
        }
        Commands::Stats => {
            let stats = session.queue_stats().await.map_err(user_error)?;
            let counts = session.status_counts().await;
            println!(
                "Queue : {} en attente, {} en cours, {} terminées aujourd'hui, {}/{} slots libres",
                stats.queued, stats.processing, stats.completed_today, stats.available_slots, stats.max_concurrent
            );
            println!(
                "Idées : {} au total, {} en attente, {} en cours, {} rejetées",
                counts.total, counts.pending, counts.in_progress, counts.rejected
            );
        }
        Commands::Queue { id } => {
            let status = session.job_status(&IdeaId::from(id)).await.map_err(user_error)?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Commands::Watch { query } => {
            if let Some(query) = query {
                session.collection().write().await.set_query(query);
            }
            session.start();

            loop {
                print_view(&session.view().await);
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    _ = tokio::time::sleep(config.refresh_interval) => {}
                }
                println!();
            }
        }
    }

    Ok(())
}

fn print_started(idea_id: &IdeaId, stage: Stage, position: Option<u32>) {
    match position {
        Some(position) => println!("{} : démarrage depuis {} (position {} dans la queue)", idea_id, stage, position),
        None => println!("{} : démarrage depuis {}", idea_id, stage),
    }
}

fn print_view(view: &[IdeaView]) {
    if view.is_empty() {
        println!("Aucune idée");
        return;
    }
    for card in view {
        let position = card
            .queue_position
            .map(|p| format!(" #{}", p))
            .unwrap_or_default();
        println!(
            "{} {:<24} {:<22} {}{}  {}",
            if card.selected { "*" } else { " " },
            card.idea.id.as_str(),
            card.display.label,
            progress_bar(card.idea.progress(), 10),
            position,
            card.idea.title
        );
    }
}

fn print_idea(idea: &Idea) {
    println!("{}  {}", idea.id, idea.title);
    println!("  statut     : {}", status_display(idea.status).label);
    println!("  format     : {} ({})", idea.video_type.as_str(), idea.video_type.aspect_ratio());
    if let Some(duration) = idea.duration_seconds {
        println!("  durée      : {}s", duration);
    }
    if !idea.keywords.is_empty() {
        println!("  mots-clés  : {}", idea.keywords.join(", "));
    }
    println!("  progression: {}", progress_bar(idea.progress(), 20));
    if let Some(step) = idea.current_step.as_deref() {
        println!("  étape      : {}", step);
    }
    if let Some(message) = idea.error_message() {
        println!("  erreur     : {}", message);
    }
    let actions: Vec<String> = actions_for(idea).iter().map(describe_action).collect();
    if !actions.is_empty() {
        println!("  actions    : {}", actions.join(", "));
    }
}

fn describe_action(action: &IdeaAction) -> String {
    match action {
        IdeaAction::Validate => "valider".to_string(),
        IdeaAction::Reject => "rejeter".to_string(),
        IdeaAction::Start(stage) => format!("démarrer ({})", stage),
        IdeaAction::Resume(stage) => format!("reprendre ({})", stage),
        IdeaAction::Restart => "recommencer (script)".to_string(),
        IdeaAction::Cancel => "annuler".to_string(),
        IdeaAction::Upload => "publier".to_string(),
        IdeaAction::Delete => "supprimer".to_string(),
    }
}
