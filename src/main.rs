use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use herdbook::{
    config::Config,
    lineage::PedigreeResolver,
    reports::{ReportGenerator, TransitSummary},
    store::PocketBaseClient,
    transit::{append_checkpoint, parse_checkpoints, TransitPlan, TransitRoute},
    types::GeoPoint,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "herdbook")]
#[command(about = "Pedigree lookup and transit planning for a livestock herd book")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the ancestry tree of an animal
    Lineage {
        /// Animal record id
        #[arg(short, long, required_unless_present = "tag", conflicts_with = "tag")]
        id: Option<String>,

        /// RFID tag of the animal, instead of its record id
        #[arg(short, long)]
        tag: Option<String>,

        /// Generations to expand (defaults to the configured depth)
        #[arg(short, long)]
        depth: Option<u32>,

        /// Output format (json, markdown, text)
        #[arg(short, long, default_value = "text")]
        output: String,

        /// Output file path (defaults to stdout)
        #[arg(short = 'f', long)]
        output_file: Option<PathBuf>,
    },

    /// Total route distance over a sequence of points
    Distance {
        /// Point as LAT,LNG; repeat for each checkpoint
        #[arg(short, long = "point", value_parser = parse_point, allow_hyphen_values = true, required = true)]
        points: Vec<GeoPoint>,

        /// Output format (json, markdown, text)
        #[arg(short, long, default_value = "text")]
        output: String,
    },

    /// Departure, checkpoint and arrival timeline of a stored checkpoint list
    Timeline {
        /// JSON file holding an array of {lat, lng, timestamp}
        #[arg(short, long)]
        file: PathBuf,

        /// Output format (json, markdown, text)
        #[arg(short, long, default_value = "text")]
        output: String,
    },

    /// Show a stored transit record
    Transit {
        /// Transit record id
        #[arg(short, long)]
        id: String,

        /// Output format (json, markdown, text)
        #[arg(short, long, default_value = "text")]
        output: String,
    },

    /// List stored transits
    Transits {
        /// Output format (json, markdown, text)
        #[arg(short, long, default_value = "text")]
        output: String,
    },

    /// List animals that are not currently in transit
    Available {
        /// Output format (json, markdown, text)
        #[arg(short, long, default_value = "text")]
        output: String,
    },

    /// Store a transit, then mark its animals as in transit
    Dispatch {
        #[arg(long)]
        purpose: String,

        /// Origin farm
        #[arg(long)]
        from: String,

        /// Destination farm
        #[arg(long)]
        to: String,

        /// Animal record id; repeat for each animal
        #[arg(short = 'a', long = "animal", required = true)]
        livestock: Vec<String>,

        /// Checkpoint as LAT,LNG in travel order; repeat for each checkpoint
        #[arg(short, long = "point", value_parser = parse_point, allow_hyphen_values = true, required = true)]
        points: Vec<GeoPoint>,
    },

    /// Health check of the record store
    HealthCheck,

    /// Initialize configuration file
    Init {
        /// Configuration file path
        #[arg(long, default_value = "herdbook.yml")]
        config_file: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    init_tracing(&cli.log_level)?;

    if let Commands::Init { config_file, force } = &cli.command {
        return init_config(config_file, *force).await;
    }

    let config = load_config(cli.config.as_ref()).await?;

    match cli.command {
        Commands::Lineage {
            id,
            tag,
            depth,
            output,
            output_file,
        } => {
            let subject = match (id, tag) {
                (Some(id), _) => Subject::Id(id),
                (None, Some(tag)) => Subject::Tag(tag),
                (None, None) => anyhow::bail!("Either --id or --tag is required"),
            };
            lineage(config, subject, depth, output, output_file).await?;
        }

        Commands::Distance { points, output } => {
            distance(points, output)?;
        }

        Commands::Timeline { file, output } => {
            timeline(file, output).await?;
        }

        Commands::Transit { id, output } => {
            show_transit(config, id, output).await?;
        }

        Commands::Transits { output } => {
            list_transits(config, output).await?;
        }

        Commands::Available { output } => {
            available(config, output).await?;
        }

        Commands::Dispatch {
            purpose,
            from,
            to,
            livestock,
            points,
        } => {
            let plan = TransitPlan::new(purpose, from, to, livestock);
            dispatch(config, plan, points).await?;
        }

        Commands::HealthCheck => {
            health_check(config).await?;
        }

        Commands::Init { .. } => {}
    }

    Ok(())
}

/// Initialize tracing with the specified log level
fn init_tracing(log_level: &str) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(log_level))
        .context("Failed to create env filter")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_level(true),
        )
        .with(env_filter)
        .init();

    Ok(())
}

/// Load configuration from file, then apply HERDBOOK_* environment overrides
async fn load_config(config_path: Option<&PathBuf>) -> Result<Config> {
    let mut config = match config_path {
        Some(path) if path.exists() => {
            info!("Loading configuration from: {:?}", path);
            Config::load_from_file(path)
                .await
                .with_context(|| format!("Failed to load configuration file: {:?}", path))?
        }
        Some(path) => {
            warn!("Configuration file not found: {:?}. Using defaults.", path);
            Config::default()
        }
        None => Config::default(),
    };

    let overrides = Config::load_from_env().context("Invalid HERDBOOK_* environment variable")?;
    config.merge_with(overrides);
    config.validate().context("Invalid configuration")?;

    Ok(config)
}

fn parse_point(value: &str) -> std::result::Result<GeoPoint, String> {
    let (lat, lng) = value
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LNG but got '{}'", value))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("invalid latitude '{}'", lat.trim()))?;
    let lng: f64 = lng
        .trim()
        .parse()
        .map_err(|_| format!("invalid longitude '{}'", lng.trim()))?;

    GeoPoint::new(lat, lng).map_err(|e| e.to_string())
}

fn route_through(points: &[GeoPoint]) -> Result<TransitRoute> {
    let mut route = TransitRoute::new();
    for point in points {
        route = append_checkpoint(&route, point.lat(), point.lng(), None)?;
    }
    Ok(route)
}

/// How the subject of a lineage query is named on the command line
enum Subject {
    Id(String),
    Tag(String),
}

async fn lineage(
    config: Config,
    subject: Subject,
    depth: Option<u32>,
    output_format: String,
    output_file: Option<PathBuf>,
) -> Result<()> {
    let client = Arc::new(PocketBaseClient::new(&config.store)?);

    let id = match subject {
        Subject::Id(id) => id,
        Subject::Tag(tag) => {
            let animal = client
                .find_by_tag(&tag)
                .await
                .with_context(|| format!("Failed to look up tag {}", tag))?
                .with_context(|| format!("No animal carries tag {}", tag))?;
            animal.id
        }
    };
    info!("Resolving lineage of {}", id);

    let resolver = PedigreeResolver::new(client.clone(), config.lineage.clone());

    let resolved = match depth {
        Some(depth) => resolver.resolve_lineage(&id, depth).await,
        None => resolver.resolve_default(&id).await,
    }
    .with_context(|| format!("Failed to resolve lineage of {}", id))?;

    if resolved.cycle_detected() {
        warn!("Pedigree of {} contains a cycle; the repeated branch was dropped", id);
    }

    let generator = ReportGenerator::new().with_file_urls(client);
    let content = generator.generate_lineage(resolved, &output_format)?;
    write_output(&content, output_file.as_ref()).await
}

fn distance(points: Vec<GeoPoint>, output_format: String) -> Result<()> {
    let route = route_through(&points)?;
    let summary = TransitSummary::from_route(&route);
    println!("{}", ReportGenerator::new().generate_transit(&summary, &output_format)?);
    Ok(())
}

async fn timeline(file: PathBuf, output_format: String) -> Result<()> {
    let raw = tokio::fs::read_to_string(&file)
        .await
        .with_context(|| format!("Failed to read checkpoints file: {:?}", file))?;
    let checkpoints = parse_checkpoints(&raw).with_context(|| format!("Invalid checkpoints in {:?}", file))?;

    let route = TransitRoute::from_checkpoints(checkpoints);
    if route.len() < 2 {
        warn!("Route has {} checkpoint(s); a timeline needs at least 2", route.len());
    }

    let summary = TransitSummary::from_route(&route);
    println!("{}", ReportGenerator::new().generate_transit(&summary, &output_format)?);
    Ok(())
}

async fn show_transit(config: Config, id: String, output_format: String) -> Result<()> {
    let client = PocketBaseClient::new(&config.store)?;
    let record = client
        .fetch_transit(&id)
        .await
        .with_context(|| format!("Failed to fetch transit {}", id))?;

    let summary = TransitSummary::from_record(&record)?;
    println!("{}", ReportGenerator::new().generate_transit(&summary, &output_format)?);
    Ok(())
}

async fn list_transits(config: Config, output_format: String) -> Result<()> {
    let client = PocketBaseClient::new(&config.store)?;
    let records = client.list_transits().await.context("Failed to list transits")?;

    let mut summaries = Vec::with_capacity(records.len());
    for record in &records {
        match TransitSummary::from_record(record) {
            Ok(summary) => summaries.push(summary),
            Err(e) => warn!("Skipping transit {}: {}", record.id, e),
        }
    }

    println!("{}", ReportGenerator::new().generate_transit_list(&summaries, &output_format)?);
    Ok(())
}

async fn available(config: Config, output_format: String) -> Result<()> {
    let client = PocketBaseClient::new(&config.store)?;
    let animals = client
        .available_livestock()
        .await
        .context("Failed to list livestock")?;

    info!("{} animals available for transit", animals.len());
    println!("{}", ReportGenerator::new().generate_animals(&animals, &output_format)?);
    Ok(())
}

async fn dispatch(config: Config, plan: TransitPlan, points: Vec<GeoPoint>) -> Result<()> {
    let plan = plan.with_route(route_through(&points)?);
    let draft = plan
        .finalize(config.transit.min_checkpoints)
        .context("Transit plan is incomplete")?;

    let client = PocketBaseClient::new(&config.store)?;
    let record = client
        .dispatch_transit(&draft)
        .await
        .context("Failed to store transit")?;

    info!("Transit {} stored", record.id);
    let summary = TransitSummary::from_record(&record)?;
    println!("{}", ReportGenerator::new().generate_transit(&summary, "text")?);
    Ok(())
}

/// Check that the record store is reachable
async fn health_check(config: Config) -> Result<()> {
    info!("Checking record store at {}", config.store.base_url);

    let client = PocketBaseClient::new(&config.store)?;
    match client.health().await {
        Ok(true) => {
            info!("Record store health check passed");
            println!("Record store: Healthy ({})", config.store.base_url);
        }
        Ok(false) => {
            error!("Record store health check failed");
            println!("Record store: Unhealthy ({})", config.store.base_url);
            std::process::exit(1);
        }
        Err(e) => {
            error!("Record store unreachable: {}", e);
            println!("Record store: Error - {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Initialize configuration file
async fn init_config(config_file: &PathBuf, force: bool) -> Result<()> {
    info!("Initializing configuration file: {:?}", config_file);

    if config_file.exists() && !force {
        warn!("Configuration file already exists: {:?}", config_file);
        println!("{:?} already exists; pass --force to overwrite it.", config_file);
        return Ok(());
    }

    Config::default()
        .save_to_file(config_file)
        .await
        .with_context(|| format!("Failed to write configuration file: {:?}", config_file))?;

    info!("Configuration file created successfully: {:?}", config_file);
    println!("Configuration file created: {:?}", config_file);
    println!("Edit this file to point herdbook at your record store.");

    Ok(())
}

/// Write output to a file, or stdout when no file is given
async fn write_output(content: &str, output_file: Option<&PathBuf>) -> Result<()> {
    if let Some(file_path) = output_file {
        tokio::fs::write(file_path, content)
            .await
            .with_context(|| format!("Failed to write output to: {:?}", file_path))?;
        info!("Report written to: {:?}", file_path);
    } else {
        println!("{}", content);
    }

    Ok(())
}
