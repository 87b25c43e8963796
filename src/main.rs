use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use astroview::coords::{
    cartesian_to_spherical, ecliptic_vector_to_equatorial, equatorial_to_horizontal,
};
use astroview::logging::init_logging;
use astroview::models::{EquatorialCoords, split_xyz};
use astroview::observatory::{self, OBSERVATORIES, Observatory};
use astroview::time::{TimeSpan, from_julian_date, parse_datetime};
use astroview::{
    AstroViewConfig, AstroViewError, AsteroidVisualizer, CachedSource, GeoLocation,
    HorizonsClient, IdType, ObservingSite, OutputFormat, PersistentCache, Renderer, Target, cache,
};

#[derive(Parser)]
#[command(
    name = "astroview",
    version,
    about = "Solar-system positions and sky charts from JPL Horizons"
)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Heliocentric ecliptic position of a body on one or more dates
    Position {
        /// Target name, designation or Horizons id
        target: String,
        /// Date (YYYY-MM-DD), repeatable
        #[arg(long = "date", required = true)]
        dates: Vec<String>,
        /// How the target identifier is interpreted
        #[arg(long, default_value = "smallbody")]
        id_type: IdType,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Plot a body's orbit around the Sun next to Earth's
    Orbit {
        /// Target (defaults to the configured target)
        target: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        stop: Option<String>,
        /// Step size such as 1d, 12h or 1mo
        #[arg(long)]
        step: Option<String>,
        #[arg(long, default_value = "smallbody")]
        id_type: IdType,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// svg, png or json (defaults to the output extension)
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },
    /// Chart where objects sit in the sky of an observatory
    Skyview {
        /// Objects such as Sun, 301 or Ceres
        #[arg(required = true)]
        objects: Vec<String>,
        /// MPC code, observatory name or lat,lon[,elev_m]
        #[arg(long, allow_hyphen_values = true)]
        site: Option<String>,
        /// UTC time (defaults to now)
        #[arg(long)]
        time: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },
    /// Convert RA/Dec to altitude/azimuth locally
    Altaz {
        /// Right ascension in degrees
        #[arg(long, allow_negative_numbers = true)]
        ra: f64,
        /// Declination in degrees
        #[arg(long, allow_negative_numbers = true)]
        dec: f64,
        #[arg(long, allow_hyphen_values = true)]
        site: Option<String>,
        #[arg(long)]
        time: Option<String>,
    },
    /// List or search the built-in observatories
    Observatories {
        query: Option<String>,
        /// Show the observatory closest to LAT,LON
        #[arg(long, value_name = "LAT,LON", allow_hyphen_values = true)]
        near: Option<String>,
    },
    /// Manage the ephemeris cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Delete all cached ephemerides
    Clear,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", describe(&e));
            ExitCode::FAILURE
        }
    }
}

fn describe(error: &anyhow::Error) -> String {
    match error.downcast_ref::<AstroViewError>() {
        Some(err) => err.user_message(),
        None => format!("{error:#}"),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AstroViewConfig::load_from_path(cli.config)?;
    init_logging(&config, cli.verbose)?;
    info!("AstroView {} starting", astroview::VERSION);

    match cli.command {
        Commands::Position {
            target,
            dates,
            id_type,
            json,
        } => position(&config, &target, &dates, id_type, json).await,
        Commands::Orbit {
            target,
            start,
            stop,
            step,
            id_type,
            output,
            format,
        } => {
            let defaults = &config.defaults;
            let target = target.unwrap_or_else(|| defaults.target.clone());
            let span = TimeSpan::parse(
                start.as_deref().unwrap_or(&defaults.orbit_start),
                stop.as_deref().unwrap_or(&defaults.orbit_stop),
                step.as_deref().unwrap_or(&defaults.orbit_step),
            )?;
            let target = Target::new(target, id_type)?;

            let visualizer = AsteroidVisualizer::new(build_source(&config)?);
            let scene = visualizer.orbit_scene_for(&target, &span).await?;

            let stem = format!("orbit_{}", file_stem(&target.id));
            let (path, format) = output_target(&config, output, format, &stem);
            let bytes = Renderer::new(config.render.clone()).encode_orbit(&scene, format)?;
            astroview::render::write_output(&path, &bytes).await?;
            println!("Orbit figure written to {}", path.display());
            Ok(())
        }
        Commands::Skyview {
            objects,
            site,
            time,
            output,
            format,
        } => {
            let site = resolve_site(&config, site.as_deref())?;
            let time = observation_time(&config, time.as_deref())?;

            let visualizer = AsteroidVisualizer::new(build_source(&config)?);
            let view = visualizer.sky_view(&objects, &site, time).await?;

            let stem = format!(
                "skyview_{}_{}",
                file_stem(&site.label()),
                time.format("%Y%m%dT%H%M")
            );
            let (path, format) = output_target(&config, output, format, &stem);
            let bytes = Renderer::new(config.render.clone()).encode_sky(&view, format)?;
            astroview::render::write_output(&path, &bytes).await?;
            println!("Sky view written to {}", path.display());
            Ok(())
        }
        Commands::Altaz { ra, dec, site, time } => {
            let site = resolve_site(&config, site.as_deref())?;
            let location = site.location().ok_or_else(|| {
                AstroViewError::validation(format!(
                    "site {site} has no known coordinates; pass lat,lon instead"
                ))
            })?;
            let time = observation_time(&config, time.as_deref())?;
            let equatorial = EquatorialCoords {
                ra_deg: ra,
                dec_deg: dec,
            };
            let horizontal = equatorial_to_horizontal(equatorial, location, time);
            println!(
                "{site} at {}: altitude {:.3}°, azimuth {:.3}° ({})",
                time.format("%Y-%m-%d %H:%M:%S UTC"),
                horizontal.altitude_deg,
                horizontal.azimuth_deg,
                if horizontal.is_above_horizon() {
                    "above horizon"
                } else {
                    "below horizon"
                }
            );
            Ok(())
        }
        Commands::Observatories { query, near } => {
            if let Some(near) = near {
                let location = parse_lat_lon(&near)?;
                if let Some((obs, km)) = observatory::nearest(&location) {
                    println!("{} ({km:.1} km away)", format_observatory(obs));
                }
                return Ok(());
            }
            let hits = match query.as_deref() {
                Some(query) => observatory::search(query),
                None => OBSERVATORIES.iter().collect(),
            };
            if hits.is_empty() {
                println!("No observatories match");
            }
            for obs in hits {
                println!("{}", format_observatory(obs));
            }
            Ok(())
        }
        Commands::Cache {
            action: CacheAction::Clear,
        } => {
            let dir = config.cache_dir();
            if cache::purge(&dir)? {
                println!("Removed cache at {}", dir.display());
            } else {
                println!("No cache at {}", dir.display());
            }
            Ok(())
        }
    }
}

async fn position(
    config: &AstroViewConfig,
    target: &str,
    dates: &[String],
    id_type: IdType,
    json: bool,
) -> Result<()> {
    let dates = dates
        .iter()
        .map(|d| {
            NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d")
                .map(|date| (date.year(), date.month(), date.day()))
                .map_err(|_| {
                    AstroViewError::validation(format!("invalid date '{d}', expected YYYY-MM-DD"))
                })
        })
        .collect::<astroview::Result<Vec<_>>>()?;

    let visualizer = AsteroidVisualizer::new(build_source(config)?);
    let vectors = visualizer
        .heliocentric_positions(target, &dates, id_type)
        .await?;

    if json {
        let (x, y, z) = split_xyz(&vectors);
        let value = serde_json::json!({
            "target": target,
            "x": x,
            "y": y,
            "z": z,
            "vectors": vectors,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Heliocentric ecliptic position of {target} (AU, degrees)");
    println!(
        "{:<16}  {:>12}  {:>12}  {:>12}  {:>9}  {:>8}  {:>7}  {:>8}  {:>7}",
        "Date (TDB)", "X", "Y", "Z", "r", "Ecl lon", "Ecl lat", "RA", "Dec"
    );
    for vector in &vectors {
        let [x, y, z] = vector.position;
        let date = from_julian_date(vector.epoch_jd)?
            .format("%Y-%m-%d %H:%M")
            .to_string();
        let ecliptic = cartesian_to_spherical(vector.position);
        let equatorial = ecliptic_vector_to_equatorial(vector.position);
        println!(
            "{date:<16}  {x:>12.8}  {y:>12.8}  {z:>12.8}  {:>9.6}  {:>8.3}  {:>7.3}  {:>8.3}  {:>7.3}",
            ecliptic.distance,
            ecliptic.longitude_deg,
            ecliptic.latitude_deg,
            equatorial.ra_deg,
            equatorial.dec_deg
        );
    }
    Ok(())
}

fn build_source(config: &AstroViewConfig) -> Result<CachedSource<HorizonsClient>> {
    let client = HorizonsClient::new(&config.horizons)?;
    if !config.cache.enabled {
        return Ok(CachedSource::uncached(client));
    }
    let ttl = Duration::from_secs(u64::from(config.cache.ttl_hours) * 3600);
    match PersistentCache::open(config.cache_dir(), ttl) {
        Ok(cache) => Ok(CachedSource::new(client, cache)),
        Err(e) => {
            warn!("Cache unavailable, continuing without it: {}", e);
            Ok(CachedSource::uncached(client))
        }
    }
}

fn resolve_site(config: &AstroViewConfig, cli: Option<&str>) -> Result<ObservingSite> {
    Ok(observatory::resolve_site(cli.unwrap_or(&config.defaults.site))?)
}

fn observation_time(config: &AstroViewConfig, cli: Option<&str>) -> Result<DateTime<Utc>> {
    let raw = cli.unwrap_or(config.defaults.observation_time.as_str());
    if raw.trim().is_empty() {
        return Ok(Utc::now());
    }
    Ok(parse_datetime(raw)?)
}

/// Output path and format from the flags, falling back to the configured
/// output directory and SVG
fn output_target(
    config: &AstroViewConfig,
    output: Option<PathBuf>,
    format: Option<OutputFormat>,
    stem: &str,
) -> (PathBuf, OutputFormat) {
    let format = format
        .or_else(|| output.as_deref().and_then(OutputFormat::from_path))
        .unwrap_or_default();
    let path = output.unwrap_or_else(|| {
        Path::new(&config.defaults.output_dir).join(format!("{stem}.{}", format.extension()))
    });
    (path, format)
}

fn file_stem(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn parse_lat_lon(input: &str) -> Result<GeoLocation> {
    let (lat, lon) = input.split_once(',').context("expected LAT,LON")?;
    let latitude: f64 = lat.trim().parse().context("invalid latitude")?;
    let longitude: f64 = lon.trim().parse().context("invalid longitude")?;
    Ok(GeoLocation::new(latitude, longitude, 0.0, input.to_string())?)
}

fn format_observatory(obs: &Observatory) -> String {
    match obs.position {
        Some(p) => format!(
            "{:<4} {:<45} {:>9.4} {:>10.4} {:>6.0} m",
            obs.code, obs.name, p.latitude, p.longitude, p.elevation_m
        ),
        None => format!("{:<4} {:<45} {:>28}", obs.code, obs.name, "(no coordinates)"),
    }
}
