use clap::{Parser, Subcommand};
use peerlink_api::RestApi;
use peerlink_core::ModelSink;
use peerlink_engine::{EngineConfig, RecommendationRequest, RecommendationService, Strategy};
use peerlink_storage::{ArtifactStore, JsonFeedStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// People-you-may-know recommendations for campus networks
#[derive(Parser, Debug)]
#[command(name = "peerlink")]
#[command(about = "Explainable peer recommendations", long_about = None)]
struct Args {
    /// JSON profile feed (array of user records)
    #[arg(long, default_value = "./data/users.json")]
    feed: PathBuf,

    /// Directory holding fitted model artifacts
    #[arg(long, default_value = "./data/models")]
    artifacts_dir: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Neighbors returned by the KNN strategy
    #[arg(long, default_value_t = 6)]
    neighbors: usize,

    /// KNN results at or below this similarity are dropped
    #[arg(long, default_value_t = 20.0)]
    min_similarity: f32,

    /// Candidate pool fetch timeout
    #[arg(long, default_value_t = 5000)]
    fetch_timeout_ms: u64,

    /// Snapshots older than this are refit in the background
    #[arg(long, default_value_t = 24 * 60 * 60)]
    model_max_age_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API
    Serve {
        /// HTTP API port
        #[arg(long, default_value_t = 8000)]
        port: u16,
    },
    /// Fit a model from the feed and save it as an artifact
    Train,
    /// Print recommendations for one user as JSON
    Recommend {
        /// Target user id
        #[arg(long)]
        user: String,

        /// rule-based or knn
        #[arg(long, default_value = "rule-based")]
        strategy: Strategy,

        #[arg(long)]
        limit: Option<usize>,
    },
}

impl Args {
    fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig {
            min_similarity: self.min_similarity,
            fetch_timeout: Duration::from_millis(self.fetch_timeout_ms),
            model_max_age: Duration::from_secs(self.model_max_age_secs),
            ..EngineConfig::default()
        };
        config.model.neighbors_k = self.neighbors;
        config
    }
}

fn build_service(args: &Args) -> anyhow::Result<(Arc<ArtifactStore>, RecommendationService<JsonFeedStore>)> {
    let artifacts = Arc::new(ArtifactStore::new(&args.artifacts_dir)?);
    let store = Arc::new(JsonFeedStore::new(&args.feed));
    let service = RecommendationService::new(store, args.engine_config())?
        .with_sink(artifacts.clone() as Arc<dyn ModelSink>);
    Ok((artifacts, service))
}

fn restore_latest(artifacts: &ArtifactStore, service: &RecommendationService<JsonFeedStore>) {
    match artifacts.load_latest() {
        Ok(Some(model)) => {
            let model = service.install_model(model);
            info!("Restored model {} ({} profiles)", model.id(), model.corpus_size());
        }
        Ok(None) => info!("No saved model in {:?}", artifacts.dir()),
        Err(e) => warn!("Failed to restore latest model: {:#}", e),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting PeerLink v{}", env!("CARGO_PKG_VERSION"));
    info!("Profile feed: {:?}", args.feed);
    info!("Artifact directory: {:?}", args.artifacts_dir);

    let (artifacts, service) = build_service(&args)?;

    match args.command {
        Command::Serve { port } => {
            restore_latest(&artifacts, &service);
            let service = Arc::new(service);

            let http_handle = std::thread::spawn(move || {
                info!("Starting HTTP server on port {}", port);
                let sys = actix_web::rt::System::new();
                sys.block_on(async {
                    if let Err(e) = RestApi::start(service, port).await {
                        tracing::error!("HTTP server error: {}", e);
                    }
                })
            });

            info!("HTTP API: http://localhost:{}/", port);

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                }
                _ = tokio::task::spawn_blocking(move || {
                    http_handle.join().ok();
                }) => {
                    info!("HTTP server stopped");
                }
            }
            info!("Shutting down...");
        }
        Command::Train => {
            let profiles = service.fetch_pool().await?;
            info!("Loaded {} profiles", profiles.len());
            let model = service.fit_blocking(&profiles)?;
            info!(
                "Model {} fitted on {} profiles (k = {})",
                model.id(),
                model.corpus_size(),
                model.index().k()
            );
            if let Some(latest) = artifacts.latest_pointer()? {
                println!("{}", serde_json::to_string_pretty(&latest)?);
            }
        }
        Command::Recommend { user, strategy, limit } => {
            if strategy == Strategy::NearestNeighbor {
                restore_latest(&artifacts, &service);
            }
            let request = RecommendationRequest {
                target_user_id: user,
                limit,
                strategy,
            };
            let response = service.recommend(&request).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
