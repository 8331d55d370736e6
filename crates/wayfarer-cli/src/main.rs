use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wayfarer_cache::CacheManager;
use wayfarer_core::models::{Category, FavoriteKind};
use wayfarer_core::providers::OpenWeatherProvider;
use wayfarer_core::seed::SeedBundle;
use wayfarer_core::weather::{WeatherOutcome, WeatherSource};
use wayfarer_core::{Config, FavoritesIndex, ImportMode, Importer, Store, StoreManager, WeatherService};

#[derive(Parser)]
#[command(name = "wayfarer")]
#[command(version, about = "Offline-first travel guide data tool", long_about = None)]
struct Cli {
    /// Database file (overrides store.database_path)
    #[arg(long, global = true, env = "WAYFARER_DB")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Import places from a KML placemark document
    Import {
        file: PathBuf,
        /// replace or merge (defaults to import.default_mode)
        #[arg(long)]
        mode: Option<ImportMode>,
    },
    /// Load a JSON seed bundle
    Seed { file: PathBuf },
    /// List places
    Places {
        #[arg(long)]
        category: Option<Category>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show an itinerary with its stops
    Itinerary { id: String },
    /// Toggle a favorite (kind: place, itinerary, tour, hotel)
    Favorite { kind: FavoriteKind, id: String },
    /// List favorites
    Favorites {
        #[arg(long)]
        kind: Option<FavoriteKind>,
    },
    /// Show the weather, fetching when the cache is stale
    Weather {
        /// Fetch even if the cache is fresh
        #[arg(long)]
        force: bool,
        /// Keep refreshing in the background until Ctrl-C
        #[arg(long)]
        watch: bool,
    },
    /// Print the config file path and effective settings
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wayfarer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::load().context("loading config")?;

    if let Commands::Config = cli.command {
        println!("# {}", Config::config_path()?.display());
        print!("{}", toml_preview(&config)?);
        return Ok(());
    }

    let db_path = match cli.db {
        Some(path) => path,
        None => config.database_path()?,
    };
    let store = StoreManager::file(db_path).open().context("opening store")?;

    match cli.command {
        Commands::Import { file, mode } => {
            let mode = mode.unwrap_or(config.import.default_mode);
            let report = Importer::new(&store).import_file(&file, mode)?;
            println!(
                "{} inserted, {} updated, {} failed",
                report.inserted, report.updated, report.failed
            );
        }
        Commands::Seed { file } => {
            let report = SeedBundle::load(&file)
                .with_context(|| format!("reading {}", file.display()))?
                .apply(&store)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Places { category, json } => {
            let places = match category {
                Some(category) => store.places().get_by_category(category)?,
                None => store.places().get_all()?,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&places)?);
            } else {
                for place in &places {
                    println!(
                        "{:<22} {:<12} {:>9.4} {:>9.4}  {}",
                        place.id, place.category, place.latitude, place.longitude, place.name
                    );
                }
            }
        }
        Commands::Itinerary { id } => show_itinerary(&store, &id)?,
        Commands::Favorite { kind, id } => {
            let index = FavoritesIndex::new(store.favorites());
            index.load()?;
            let now_favorite = index.toggle(kind, &id)?;
            println!(
                "{} {} {}",
                kind,
                id,
                if now_favorite { "added to favorites" } else { "removed from favorites" }
            );
        }
        Commands::Favorites { kind } => {
            let index = FavoritesIndex::new(store.favorites());
            index.load()?;
            let kinds = match kind {
                Some(kind) => vec![kind],
                None => FavoriteKind::ALL.to_vec(),
            };
            for kind in kinds {
                for id in index.favorites_of(kind) {
                    println!("{:<10} {}", kind, id);
                }
            }
        }
        Commands::Weather { force, watch } => {
            let service = Arc::new(weather_service(&config, &store)?);

            print_weather(&service.get_weather(force).await?);

            if watch {
                let _refresh = service.clone().spawn_refresh(config.weather.refresh_interval());
                tracing::info!("Refreshing in the background, Ctrl-C to stop");
                tokio::signal::ctrl_c().await?;
            }
        }
        Commands::Config => {}
    }

    Ok(())
}

fn weather_service(config: &Config, store: &Store) -> anyhow::Result<WeatherService> {
    let provider = OpenWeatherProvider::with_base_url(
        config.weather.api_key.clone(),
        config.weather.api_url.clone(),
    )?;

    let cache_path = config.cache_path()?;
    if let Some(parent) = cache_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let kv = Arc::new(CacheManager::open(&cache_path).context("opening weather cache")?);

    Ok(WeatherService::new(
        Box::new(provider),
        config.weather.location(),
        kv,
        store,
    ))
}

fn print_weather(outcome: &WeatherOutcome) {
    if let Some(failure) = &outcome.failure {
        eprintln!("{}", failure.user_message());
    }

    let Some(weather) = &outcome.weather else {
        println!("No weather data yet.");
        return;
    };

    let source = match outcome.source {
        WeatherSource::Fresh => "just fetched",
        WeatherSource::Cached => "cached",
    };
    println!(
        "{}: {:.1}° {} ({}), humidity {}%, wind {:.1}  [{} at {}]",
        weather.location,
        weather.current.temperature,
        weather.current.condition,
        weather.current.description,
        weather.current.humidity,
        weather.current.wind_speed,
        source,
        weather.last_updated.format("%Y-%m-%d %H:%M UTC"),
    );
    for day in &weather.forecast {
        println!(
            "  {}  {:>5.1} / {:>5.1}  {:<13} {:>3}%",
            day.date, day.high, day.low, day.condition, day.precipitation
        );
    }
}

fn show_itinerary(store: &Store, id: &str) -> anyhow::Result<()> {
    let itineraries = store.itineraries();
    let itinerary = itineraries
        .get_by_id(id)?
        .with_context(|| format!("no itinerary with id {}", id))?;

    println!("{} ({}, {} min)", itinerary.title, itinerary.kind, itinerary.estimated_duration);
    for resolved in itineraries.resolve_stops(&itinerary)? {
        let name = resolved
            .place
            .as_ref()
            .map(|p| p.name.as_str())
            .unwrap_or("(place no longer available)");
        println!("  {}. {} ({} min)", resolved.stop.order, name, resolved.stop.estimated_duration);
    }
    Ok(())
}

fn toml_preview(config: &Config) -> anyhow::Result<String> {
    let mut shown = config.clone();
    if shown.weather.api_key.is_some() {
        shown.weather.api_key = Some("********".into());
    }
    Ok(toml::to_string_pretty(&shown)?)
}
