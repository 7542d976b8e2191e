//! omni-post - Publish one message to every configured platform

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::debug;

use libomnicast::config::Config;
use libomnicast::error::{OmnicastError, PublishError, Result};
use libomnicast::generator::GeneratedContent;
use libomnicast::http::{HttpTransport, ReqwestTransport};
use libomnicast::logging::{LogFormat, LoggingConfig};
use libomnicast::media::LocalMediaStore;
use libomnicast::orchestrator::{assemble_contents, PublishOrchestrator};
use libomnicast::registry::{create_publishers, PublisherRegistry};
use libomnicast::types::{MediaReference, PlatformId, PublishResult};

#[derive(Parser, Debug)]
#[command(name = "omni-post")]
#[command(version)]
#[command(about = "Publish one message to every configured platform")]
#[command(long_about = "\
omni-post - Publish one message to every configured platform

DESCRIPTION:
    omni-post reads a message from the command line or stdin and publishes
    it to the social platforms enabled in the configuration: Facebook,
    Instagram, LinkedIn, TikTok, and WhatsApp.

    Each platform runs its own publication protocol. Instagram and TikTok
    involve server-side processing and are polled until they finish, so a
    run can take up to a minute. Platforms fail independently: one rejected
    publication never stops the others.

USAGE:
    # Publish a message everywhere
    omni-post \"Release day!\"

    # Pipe the message in
    echo \"Release day!\" | omni-post

    # Publish to selected platforms only
    omni-post --platform facebook,linkedin \"Release day!\"

    # Attach media (link-ingesting platforms need a public URL)
    omni-post --image https://cdn.example/launch.png \"Release day!\"
    omni-post --video ~/videos/launch.mp4 --platform tiktok \"Release day!\"

    # JSON output for scripting
    omni-post --format json \"Release day!\" | jq '.results[]'

CONFIGURATION:
    Configuration file: ~/.config/omnicast/config.toml
    (override with --config or the OMNICAST_CONFIG environment variable)

    One section per platform, for example:

    [facebook]
    enabled = true
    page_id = \"...\"
    access_token = \"...\"

    [defaults]
    platforms = [\"facebook\", \"linkedin\"]

EXIT CODES:
    0 - At least one platform accepted the publication
    1 - Every platform failed, or a runtime error occurred
    2 - Authorization failure
    3 - Invalid input (empty message, unknown platform, nothing enabled)
")]
struct Cli {
    /// Message to publish (reads from stdin if not provided)
    message: Option<String>,

    /// Target specific platform(s) (comma-separated)
    #[arg(short, long, value_name = "PLATFORMS")]
    #[arg(help = "Publish only to these platforms (comma-separated names)")]
    platform: Option<String>,

    /// Image to attach (public URL or local path)
    #[arg(long, value_name = "LOCATION")]
    #[arg(help = "Image for the link-ingesting platforms and LinkedIn")]
    image: Option<String>,

    /// Video to attach (public URL or local path)
    #[arg(long, value_name = "LOCATION")]
    #[arg(help = "Video for TikTok")]
    video: Option<String>,

    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text")]
    #[arg(value_parser = ["text", "json"])]
    format: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging; results go to stdout, logs stay on stderr
    let log_format = std::env::var("OMNICAST_LOG_FORMAT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(LogFormat::Text);
    let log_level = std::env::var("OMNICAST_LOG_LEVEL").unwrap_or_else(|_| "error".to_string());
    LoggingConfig::new(log_format, log_level, cli.verbose).init();

    // Run the main logic and handle errors
    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let run_id = uuid::Uuid::new_v4();
    debug!(%run_id, "omni-post starting");

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    let message = read_message(cli.message)?;

    let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new()?);
    let media_store = Arc::new(LocalMediaStore::new(transport.clone()));
    let publishers = create_publishers(&config, transport, media_store);

    // Narrow to the requested platforms, or the configured defaults
    let publishers = match platform_filter(cli.platform.as_deref(), &config)? {
        Some(wanted) => publishers
            .into_iter()
            .filter(|p| wanted.contains(&p.platform()))
            .collect(),
        None => publishers,
    };
    if publishers.is_empty() {
        return Err(OmnicastError::InvalidInput(
            "No platform is both enabled in configuration and selected".to_string(),
        ));
    }

    let registry = PublisherRegistry::partial(publishers)?;
    let platforms = registry.platforms();
    let orchestrator = PublishOrchestrator::new(registry);

    // The same message goes to every platform; media is routed by what
    // each platform can ingest
    let generated = GeneratedContent {
        posts: platforms.iter().map(|&p| (p, message.clone())).collect(),
        image_prompt: None,
        video_prompt: None,
    };
    let image = cli.image.as_deref().map(MediaReference::from_location);
    let video = cli.video.as_deref().map(MediaReference::from_location);
    let contents = assemble_contents(&generated, image.as_ref(), video.as_ref());

    let results = orchestrator.publish_all(&contents).await;
    print_results(run_id, &message, &results, &cli.format);

    if results.iter().all(|r| !r.success) {
        return Err(PublishError::Protocol(
            "All platform publications failed".to_string(),
        )
        .into());
    }
    Ok(())
}

/// Take the message from the argument, falling back to stdin
fn read_message(message: Option<String>) -> Result<String> {
    let message = match message {
        Some(message) => message,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| OmnicastError::InvalidInput(format!("Failed to read stdin: {}", e)))?;
            buffer
        }
    };

    let message = message.trim().to_string();
    if message.is_empty() {
        return Err(OmnicastError::InvalidInput(
            "Message cannot be empty".to_string(),
        ));
    }
    Ok(message)
}

/// Parse the `--platform` list, or fall back to `defaults.platforms`.
/// `None` means no narrowing: publish to everything enabled.
fn platform_filter(flag: Option<&str>, config: &Config) -> Result<Option<Vec<PlatformId>>> {
    let names: Vec<String> = match flag {
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        None => config.defaults.platforms.clone(),
    };
    if names.is_empty() {
        return Ok(None);
    }

    let mut selected = Vec::new();
    for name in names {
        let platform = name
            .parse::<PlatformId>()
            .map_err(OmnicastError::InvalidInput)?;
        if !selected.contains(&platform) {
            selected.push(platform);
        }
    }
    Ok(Some(selected))
}

fn print_results(run_id: uuid::Uuid, message: &str, results: &[PublishResult], format: &str) {
    match format {
        "json" => {
            let payload = serde_json::json!({
                "run_id": run_id.to_string(),
                "message": message,
                "published_at": chrono::Utc::now().to_rfc3339(),
                "results": results,
            });
            println!("{:#}", payload);
        }
        _ => {
            for result in results {
                let symbol = if result.success { "✓" } else { "✗" };
                if let Some(ref url) = result.url {
                    println!("{} {}: {}", symbol, result.platform, url);
                } else if let Some(ref error) = result.error {
                    println!("{} {}: {}", symbol, result.platform, error);
                } else {
                    println!("{} {}", symbol, result.platform);
                }
            }
        }
    }
}
