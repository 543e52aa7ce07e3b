use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tubesent::classifier::InferenceApiModel;
use tubesent::cli::{Cli, Commands, ConfigAction};
use tubesent::config::{Config, ConfigValidator};
use tubesent::error::{ErrorKind, Result, TubesentError};
use tubesent::pipeline::Pipeline;
use tubesent::progress::TracingProgress;
use tubesent::report::{self, ReportFormat};
use tubesent::session::{AnalysisSession, SessionState, SessionStore};
use tubesent::youtube::YouTubeClient;

fn main() {
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("✗ {}", e);
        if let Some(hint) = error_hint(&e) {
            eprintln!("  {}", hint);
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    let profile = cli.profile;

    match cli.command {
        Commands::Find { url } => {
            let config = load_config(config_path, profile)?;
            let store = open_store(&config)?;
            let pipeline = build_pipeline(&config)?;
            let rt = build_runtime()?;
            cmd_find(&store, &pipeline, &rt, &url)?;
        }
        Commands::Analyze { max } => {
            let config = load_config(config_path, profile)?;
            let store = open_store(&config)?;
            let pipeline = build_pipeline(&config)?;
            let rt = build_runtime()?;
            cmd_analyze(&config, &store, &pipeline, &rt, max)?;
        }
        Commands::Run { url, max } => {
            // One pipeline and runtime serve both steps
            let config = load_config(config_path, profile)?;
            let store = open_store(&config)?;
            let pipeline = build_pipeline(&config)?;
            let rt = build_runtime()?;
            cmd_find(&store, &pipeline, &rt, &url)?;
            cmd_analyze(&config, &store, &pipeline, &rt, max)?;
        }
        Commands::Status => {
            let config = load_config(config_path, profile)?;
            cmd_status(&config)?;
        }
        Commands::Report { format, output } => {
            let config = load_config(config_path, profile)?;
            cmd_report(&config, &format, output)?;
        }
        Commands::Reset => {
            let config = load_config(config_path, profile)?;
            cmd_reset(&config)?;
        }
        Commands::Config { action } => {
            cmd_config(config_path, profile, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_filter = if verbose { "tubesent=debug" } else { "tubesent=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn error_hint(e: &TubesentError) -> Option<&'static str> {
    match e.kind() {
        ErrorKind::QuotaExceeded => Some(
            "The YouTube Data API daily quota is used up. Wait for the quota to reset (midnight Pacific time) and try again.",
        ),
        ErrorKind::InvalidInput => {
            Some("Pass a youtube.com/watch, youtu.be, shorts or embed link, or an 11-character video id.")
        }
        ErrorKind::EmptyResult => {
            Some("Comments may be disabled, or every comment was too short to classify.")
        }
        ErrorKind::ModelError => Some(
            "Check model.endpoint and the model token, or set model.on_batch_error = \"skip\" to tolerate failed batches.",
        ),
        _ => None,
    }
}

fn build_runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| TubesentError::Io {
            source: e,
            context: "Failed to create tokio runtime".to_string(),
        })
}

fn build_pipeline(config: &Config) -> Result<Pipeline> {
    let api_key = config.youtube.api_key()?;
    let client = Arc::new(YouTubeClient::from_config(&config.youtube, api_key)?);
    let model = Arc::new(InferenceApiModel::new(&config.model, config.model.api_token())?);

    Ok(Pipeline::from_config(config, client, model))
}

fn open_store(config: &Config) -> Result<SessionStore> {
    let data_dir = expand_path(&config.storage.data_dir)?;
    let stale_after = chrono::Duration::from_std(std::time::Duration::from_secs(
        config.storage.stale_analysis_secs,
    ))
    .map_err(|_| TubesentError::InvalidConfigValue {
        path: "storage.stale_analysis_secs".to_string(),
        message: "Stale analysis timeout is too large".to_string(),
    })?;
    Ok(SessionStore::new(data_dir).with_stale_after(stale_after))
}

fn cmd_find(store: &SessionStore, pipeline: &Pipeline, rt: &Runtime, url: &str) -> Result<()> {
    let mut session = store.current_or_create()?;

    // A new lookup starts over from a finished analysis
    if session.result().is_some() {
        session.reset();
    }

    let video = rt.block_on(pipeline.find_video(&mut session, url))?;
    store.save(&session)?;

    println!("✓ Found video");
    println!("  Title:     {}", video.title);
    println!("  Id:        {}", video.id);
    println!("  Thumbnail: {}", video.thumbnail_url);
    println!("  Session:   {}", session.name);

    Ok(())
}

fn cmd_analyze(
    config: &Config,
    store: &SessionStore,
    pipeline: &Pipeline,
    rt: &Runtime,
    max: Option<usize>,
) -> Result<()> {
    let mut session = store.current_or_create()?;
    let max_comments = max.unwrap_or(config.fetch.max_comments);

    let stats = rt.block_on(pipeline.analyze_persisted(
        store,
        &mut session,
        max_comments,
        &TracingProgress,
    ))?;

    println!("✓ Analysis complete");
    println!(
        "  Comments: {} fetched, {} classified, {} too short, {} skipped",
        stats.fetched, stats.classified, stats.dropped, stats.skipped
    );
    println!("  Duration: {:.1}s", stats.duration_ms as f64 / 1000.0);

    if let Some(result) = session.result() {
        println!();
        for (label, count) in result.counts.iter() {
            println!(
                "  {:<9} {:>5}  {:>6.2}%",
                label, count, result.percentages[label]
            );
        }
    }

    Ok(())
}

fn cmd_status(config: &Config) -> Result<()> {
    let store = open_store(config)?;

    println!("Tubesent Status");
    println!("===============");

    let session = match store.current()? {
        Some(session) => session,
        None => {
            println!("\nNo current session. Run 'tubesent find <url>' to start one.");
            return Ok(());
        }
    };

    println!("\nSession: {} ({})", session.name, session.id);
    println!(
        "Created: {}",
        session.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!("State:   {}", session.state().name());

    if let Some(video) = session.video() {
        println!("\nVideo:   {} ({})", video.title, video.id);
    }

    if let SessionState::Analyzed { result, .. } = session.state() {
        println!(
            "\nLast analysis: {} with {}",
            result.analyzed_at.format("%Y-%m-%d %H:%M:%S"),
            result.model_name
        );
        println!(
            "  {} classified, {} too short, {} skipped",
            result.total, result.dropped, result.skipped
        );
        for (label, count) in result.counts.iter() {
            println!(
                "  {:<9} {:>5}  {:>6.2}%",
                label, count, result.percentages[label]
            );
        }
    }

    let sessions = store.list()?;
    if sessions.len() > 1 {
        println!("\nSessions: {} total", sessions.len());
    }

    Ok(())
}

fn cmd_report(config: &Config, format: &str, output: Option<PathBuf>) -> Result<()> {
    let store = open_store(config)?;
    let session = store.current()?.ok_or_else(|| {
        TubesentError::InvalidState("no current session; run 'tubesent run <url>' first".to_string())
    })?;

    let (video, result) = match session.state() {
        SessionState::Analyzed { video, result } => (video, result),
        other => {
            return Err(TubesentError::InvalidState(format!(
                "no analysis to report (session is '{}')",
                other.name()
            )))
        }
    };

    let format: ReportFormat = format.parse()?;
    let rendered = report::render(video, result, format, config.aggregate.bucket_hours)?;

    match output {
        Some(path) => {
            write_report(&path, &rendered)?;
            println!("✓ Report written to: {}", path.display());
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

fn write_report(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| TubesentError::Io {
            source: e,
            context: format!("Failed to create report directory: {:?}", parent),
        })?;
    }

    std::fs::write(path, content).map_err(|e| TubesentError::Io {
        source: e,
        context: format!("Failed to write report: {:?}", path),
    })
}

fn cmd_reset(config: &Config) -> Result<()> {
    let store = open_store(config)?;
    match store.current()? {
        Some(session) if session.is_analyzing() => {
            let video_id = session.video().map(|v| v.id.clone()).unwrap_or_default();
            return Err(TubesentError::AnalysisInProgress { video_id });
        }
        Some(mut session) => {
            session.reset();
            store.save(&session)?;
            println!("✓ Session {} reset", session.name);
        }
        None => {
            let session = AnalysisSession::new_with_timestamp();
            store.save(&session)?;
            store.set_current(&session)?;
            println!("✓ Started new session {}", session.name);
        }
    }
    Ok(())
}

fn cmd_config(
    config_path: Option<PathBuf>,
    profile: Option<String>,
    action: ConfigAction,
) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path, profile)?;
            let content = toml::to_string_pretty(&config)?;
            println!("{}", content);
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            ConfigValidator::validate(&config)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
            if !config.profiles.is_empty() {
                let mut names: Vec<_> = config.profiles.keys().cloned().collect();
                names.sort();
                println!("  Profiles: {}", names.join(", "));
            }
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            // Create parent directory
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| TubesentError::Io {
                    source: e,
                    context: format!("Failed to create config directory: {:?}", parent),
                })?;
            }

            let config = Config::default();
            config.save(&path)?;

            println!("✓ Configuration initialized at: {}", path.display());
            println!(
                "  Set {} to your YouTube Data API key before running an analysis",
                config.youtube.api_key_env
            );
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>, profile: Option<String>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    if !path.exists() {
        tracing::warn!(
            "Config file not found, using defaults. Run 'tubesent config init' to create one."
        );
        let mut config = Config::default();
        config.apply_env_overrides();
        if let Some(profile) = profile {
            config.apply_profile(&profile)?;
        }
        ConfigValidator::validate(&config)?;
        return Ok(config);
    }

    if let Some(profile) = profile {
        Config::load_with_profile(&path, &profile)
    } else {
        Config::load(&path)
    }
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    let path_str = path
        .to_str()
        .ok_or_else(|| TubesentError::Config("Invalid path encoding".to_string()))?;

    if let Some(stripped) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| TubesentError::Config("Cannot determine home directory".to_string()))?;
        Ok(home.join(stripped))
    } else {
        Ok(path.to_path_buf())
    }
}
