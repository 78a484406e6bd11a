use futures::prelude::*;
use gpsd_proto::UnifiedResponse;
use std::path::{Path, PathBuf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{Framed, FramedRead, LinesCodec};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use waypoint_nav::magnetic::{DeclinationModel, FixedDeclination, WorldMagneticModel};
use waypoint_nav::{
    Config, Coordinate, Event, Indicator, NavigationSession, OrientationSample, PositionSample,
    Renderer, TomlTargetStore, UserAction,
};

const DEFAULT_CONFIG: &str = "waypoint-nav.toml";

/// Everything the single session owner consumes.
#[derive(Debug, PartialEq)]
enum Input {
    Event(Event),
    Status,
    Quit,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config, source) = load_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .init();

    match source {
        Some(path) => info!("Loaded configuration from {}", path.display()),
        None => info!("Using default configuration"),
    }

    let declination: Box<dyn DeclinationModel + Send> = match config.magnetic.declination_override
    {
        Some(degrees) => {
            info!("Using fixed declination of {} degrees", degrees);
            Box::new(FixedDeclination(degrees))
        }
        None => Box::new(WorldMagneticModel::new()),
    };

    let mut session = NavigationSession::new(
        TomlTargetStore::new(&config.store),
        declination,
        config.map.zoom_level,
    )
    .with_renderer(Box::new(ConsoleRenderer))
    .with_indicator(Box::new(ConsoleIndicator));

    let (tx, mut rx) = mpsc::channel::<Input>(64);

    let address = config.gpsd.address.clone();
    let gnss_tx = tx.clone();
    let gnss = tokio::spawn(async move {
        if let Err(e) = handle_gnss(&address, gnss_tx).await {
            error!("gpsd connection to {} failed: {:#}", address, e);
        }
    });
    let console = tokio::spawn(async move {
        if let Err(e) = handle_console(tx).await {
            error!("Console input failed: {:#}", e);
        }
    });

    // Single owner: every event is applied to the session one at a time.
    while let Some(input) = rx.recv().await {
        match input {
            Input::Event(event) => {
                session.dispatch(event);
            }
            Input::Status => {
                println!("{}", serde_json::to_string_pretty(&session.current_outputs())?);
            }
            Input::Quit => break,
        }
    }

    gnss.abort();
    console.abort();
    info!("Stopped");
    Ok(())
}

fn load_config() -> anyhow::Result<(Config, Option<PathBuf>)> {
    if let Some(arg) = std::env::args().nth(1) {
        let path = PathBuf::from(arg);
        return Ok((Config::load(&path)?, Some(path)));
    }
    let default_path = Path::new(DEFAULT_CONFIG);
    if default_path.exists() {
        return Ok((Config::load(default_path)?, Some(default_path.to_path_buf())));
    }
    Ok((Config::default(), None))
}

async fn handle_gnss(address: &str, tx: mpsc::Sender<Input>) -> anyhow::Result<()> {
    let stream = TcpStream::connect(address).await?;
    let mut framed: Framed<TcpStream, LinesCodec> = Framed::new(stream, LinesCodec::new());
    framed.send(gpsd_proto::ENABLE_WATCH_CMD).await?;
    info!("Watching gpsd at {}", address);

    while let Some(line) = framed.next().await {
        let line = line?;
        let tpv = match serde_json::from_str(&line) {
            Ok(UnifiedResponse::Tpv(t)) => t,
            Ok(_) => continue,
            Err(e) => {
                debug!("Error decoding gpsd report: {}", e);
                continue;
            }
        };
        let Some(sample) = PositionSample::from_tpv(&tpv) else {
            debug!("Skipping TPV report without usable fix (mode {})", tpv.mode);
            continue;
        };
        if tx.send(Input::Event(Event::Position(sample))).await.is_err() {
            break;
        }
    }
    Ok(())
}

async fn handle_console(tx: mpsc::Sender<Input>) -> anyhow::Result<()> {
    let mut lines = FramedRead::new(tokio::io::stdin(), LinesCodec::new());
    while let Some(line) = lines.next().await {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let Some(input) = parse_command(&line) else {
            warn!(
                "Unknown command {:?} (mark, start, stop, reset, heading <deg>, status, quit)",
                line
            );
            continue;
        };
        let quit = input == Input::Quit;
        if tx.send(input).await.is_err() || quit {
            break;
        }
    }
    Ok(())
}

fn parse_command(line: &str) -> Option<Input> {
    let mut words = line.split_whitespace();
    let command = words.next()?.to_ascii_lowercase();
    let input = match command.as_str() {
        "heading" => {
            let degrees: f32 = words.next()?.parse().ok()?;
            Input::Event(Event::Orientation(OrientationSample::new(degrees)))
        }
        "status" => Input::Status,
        "quit" | "exit" => Input::Quit,
        other => Input::Event(Event::UserAction(UserAction::from_str_name(other)?)),
    };
    match words.next() {
        Some(_) => None,
        None => Some(input),
    }
}

struct ConsoleRenderer;

impl Renderer for ConsoleRenderer {
    fn place_marker(&mut self, coordinate: Coordinate) {
        info!(
            "Marker \"Target\" at {:.6}, {:.6}",
            coordinate.latitude, coordinate.longitude
        );
    }

    fn remove_marker(&mut self) {
        info!("Marker removed");
    }

    fn pan_and_zoom_to(&mut self, coordinate: Coordinate, zoom_level: f32) {
        info!(
            "Centering map on {:.6}, {:.6} at zoom {}",
            coordinate.latitude, coordinate.longitude, zoom_level
        );
    }
}

struct ConsoleIndicator;

impl Indicator for ConsoleIndicator {
    fn set_distance_text(&mut self, text: &str) {
        if text.is_empty() {
            println!("Distance: -");
        } else {
            println!("Distance: {} m", text);
        }
    }

    fn rotate_indicator(&mut self, degrees: f32) {
        println!("Arrow: {:.1}°", degrees);
    }

    fn show_arrival_notice(&mut self) {
        println!("You have arrived at your waypoint!");
    }

    fn show_warning(&mut self, message: &str) {
        println!("Warning: {}", message);
    }
}
