#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Road risk command line interface.
//!
//! ```text
//! road_risk hotspots [--dataset data/sample_incidents.csv] [--eps 0.01] [--min-samples 5]
//! road_risk schema [--dataset data/sample_incidents.csv] [--standardize]
//! road_risk assess [--lat 19.05 --lon 72.85] [--hour 23] [--weather "Heavy Rain"] ...
//! road_risk match --lat 19.05 --lon 72.85
//! ```
//!
//! Every command prints JSON on stdout. Settings come from `--config` (or
//! the embedded defaults) and are overridden by flags. Set `RUST_LOG` for
//! progress output on stderr.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::Timelike;
use clap::{Args, Parser, Subcommand};
use road_risk_conditions::FixedProvider;
use road_risk_engine::{EngineConfig, RiskResources, load_dataset};
use road_risk_hotspot::{HotspotSnapshot, detect};
use road_risk_incident_models::{
    AccidentCause, ConditionLevel, Coordinate, Lighting, NewsSentiment, RoadCurvature,
    SurfaceCondition, Weather,
};
use road_risk_schema::{DeriveOptions, FeatureSchema};

#[derive(Parser)]
#[command(
    name = "road_risk",
    about = "Accident hotspot detection and road risk assessment"
)]
struct Cli {
    /// TOML configuration file (defaults to the embedded configuration)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cluster historical accidents into hotspots
    Hotspots {
        /// Historical incident CSV
        #[arg(long)]
        dataset: Option<PathBuf>,
        /// Neighborhood radius in degrees
        #[arg(long)]
        eps: Option<f64>,
        /// Points (including itself) needed for a dense neighborhood
        #[arg(long)]
        min_samples: Option<usize>,
    },
    /// Derive the classifier feature schema from a dataset
    Schema {
        /// Historical incident CSV
        #[arg(long)]
        dataset: Option<PathBuf>,
        /// Record standard-score scaling for numeric columns
        #[arg(long)]
        standardize: bool,
    },
    /// Assess accident risk and print the action plan
    Assess(AssessArgs),
    /// List hotspots covering a location
    Match {
        /// Latitude
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Longitude
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Historical incident CSV
        #[arg(long)]
        dataset: Option<PathBuf>,
    },
}

#[derive(Args)]
struct AssessArgs {
    /// Latitude of the road segment
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,
    /// Longitude of the road segment
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,
    /// Hour of day (0-23), defaults to the current local hour
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..24))]
    hour: Option<u32>,
    /// Model JSON artifact
    #[arg(long)]
    model: Option<PathBuf>,
    /// Historical incident CSV for hotspot matching
    #[arg(long)]
    dataset: Option<PathBuf>,
    /// Weather override
    #[arg(long, value_parser = parse_level::<Weather>)]
    weather: Option<Weather>,
    /// Lighting override
    #[arg(long, value_parser = parse_level::<Lighting>)]
    lighting: Option<Lighting>,
    /// Road geometry
    #[arg(long, value_parser = parse_level::<RoadCurvature>)]
    curvature: Option<RoadCurvature>,
    /// Traffic density override (vehicles/km)
    #[arg(long)]
    traffic: Option<u32>,
    /// Heavy commercial vehicle ratio override (0.0-1.0)
    #[arg(long)]
    hcv: Option<f64>,
    /// Road surface friction
    #[arg(long)]
    friction: Option<f64>,
    /// Surface condition
    #[arg(long, value_parser = parse_level::<SurfaceCondition>)]
    surface: Option<SurfaceCondition>,
    /// Dominant historical accident cause
    #[arg(long, value_parser = parse_level::<AccidentCause>)]
    cause: Option<AccidentCause>,
    /// News sentiment
    #[arg(long, value_parser = parse_level::<NewsSentiment>)]
    sentiment: Option<NewsSentiment>,
    /// Speed limit breaches
    #[arg(long)]
    speed_breaches: Option<u32>,
    /// Rash driving incidents
    #[arg(long)]
    rash_driving: Option<u32>,
}

/// Parses a categorical level by its dataset text.
fn parse_level<T: ConditionLevel + FromStr + 'static>(s: &str) -> Result<T, String> {
    s.parse().map_err(|_| {
        let valid: Vec<&str> = T::levels().iter().map(AsRef::as_ref).collect();
        format!("{} expects one of: {}", T::FIELD, valid.join(", "))
    })
}

fn dataset_path(flag: Option<PathBuf>, config: &EngineConfig) -> Result<PathBuf, String> {
    flag.or_else(|| config.resources.dataset.clone())
        .ok_or_else(|| "no dataset given (--dataset or [resources] dataset)".to_string())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn hotspot_snapshot(
    path: &Path,
    config: &EngineConfig,
) -> Result<HotspotSnapshot, Box<dyn std::error::Error>> {
    let records = load_dataset(path)?;
    Ok(HotspotSnapshot::from(detect(&records, config.clustering)?))
}

async fn assess(
    args: AssessArgs,
    mut config: EngineConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(model) = args.model {
        config.resources.model = Some(model);
    }
    if let Some(dataset) = args.dataset {
        config.resources.dataset = Some(dataset);
    }

    let resources = RiskResources::load(&config)?;
    let hour = args.hour.unwrap_or_else(|| chrono::Local::now().hour());
    let location = args.lat.zip(args.lon).map(|(lat, lon)| Coordinate::new(lat, lon));

    let readings = if let Some(location) = location {
        let provider = config.provider.build()?;
        log::info!(
            "Fetching live conditions from '{}' provider",
            provider.name()
        );
        provider.current_conditions(location, hour).await?
    } else {
        log::info!("No location given, using default readings");
        FixedProvider::default().readings(hour)
    };

    let mut conditions =
        readings.into_conditions(args.curvature.unwrap_or(RoadCurvature::Straight), hour);
    if let Some(weather) = args.weather {
        conditions.weather = weather;
    }
    if let Some(lighting) = args.lighting {
        conditions.lighting = lighting;
    }
    if let Some(traffic) = args.traffic {
        conditions.traffic_density = traffic;
    }
    if let Some(hcv) = args.hcv {
        conditions.hcv_ratio = hcv;
    }
    conditions.road_surface_friction = args.friction;
    conditions.surface_condition = args.surface;
    conditions.historical_accident_cause = args.cause;
    conditions.news_sentiment = args.sentiment;
    conditions.speed_limit_breaches = args.speed_breaches;
    conditions.rash_driving_incidents = args.rash_driving;

    let assessment = resources.assess(&conditions, location)?;
    print_json(&assessment)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();
    let mut config = EngineConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Hotspots {
            dataset,
            eps,
            min_samples,
        } => {
            if let Some(eps) = eps {
                config.clustering.eps = eps;
            }
            if let Some(min_samples) = min_samples {
                config.clustering.min_samples = min_samples;
            }
            let path = dataset_path(dataset, &config)?;
            let records = load_dataset(&path)?;
            let report = detect(&records, config.clustering)?;
            print_json(&report)?;
        }
        Commands::Schema {
            dataset,
            standardize,
        } => {
            let path = dataset_path(dataset, &config)?;
            let records = load_dataset(&path)?;
            let schema = FeatureSchema::derive(&records, DeriveOptions { standardize })?;
            print_json(&schema)?;
        }
        Commands::Assess(args) => assess(args, config).await?,
        Commands::Match { lat, lon, dataset } => {
            let path = dataset_path(dataset, &config)?;
            let snapshot = hotspot_snapshot(&path, &config)?;
            let location = Coordinate::new(lat, lon);
            let matches = snapshot.containing(&location);
            if matches.is_empty() {
                log::info!("No hotspot covers ({lat}, {lon})");
            }
            print_json(&serde_json::json!({
                "location": location,
                "containing": matches,
                "nearest": snapshot.nearest(&location),
            }))?;
        }
    }

    Ok(())
}
