use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

mod detection;
mod drive;
mod handlers;
mod motion;
mod state;

use crate::detection::{Detector, DetectorConfig, Rgb, SyntheticCamera};
use crate::drive::{Drive, SimulatedDrive, DEFAULT_SPEED, STOPPED};
use crate::handlers::routes;
use crate::motion::PlannerConfig;
use crate::state::AppState;

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    #[arg(long, env = "PORT", default_value_t = 5000)]
    port: u16,
    #[arg(long)]
    public_dir: Option<PathBuf>,
    /// Wheel duty used for every move.
    #[arg(long, default_value_t = DEFAULT_SPEED)]
    speed: i32,
    /// Coordinates closer than this to the previous kept one are ignored.
    #[arg(long, default_value_t = 20.0)]
    min_distance: f64,
    #[arg(long, default_value_t = 100.0, value_parser = parse_speed)]
    pixels_per_second: f64,
    /// Colour returned by the simulated camera.
    #[arg(long, default_value = "#000000")]
    camera_color: Rgb,
}

fn parse_speed(value: &str) -> Result<f64, String> {
    let speed: f64 = value.parse().map_err(|error| format!("{error}"))?;
    if speed.is_finite() && speed > 0.0 {
        Ok(speed)
    } else {
        Err(format!("expected a positive speed, got {value}"))
    }
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {error}");
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::fmt().init();

    let args = Args::parse();
    let planner = PlannerConfig {
        min_distance: args.min_distance,
        pixels_per_second: args.pixels_per_second,
        ..PlannerConfig::default()
    };
    let simulated = Arc::new(SimulatedDrive::new());
    let drive: Arc<dyn Drive> = simulated.clone();
    let detector = Detector::new(
        Arc::new(SyntheticCamera::new(args.camera_color)),
        DetectorConfig::default(),
    );
    let state = AppState::new(drive.clone(), detector, planner, args.speed);
    tracing::info!("Motor backend: {}", drive.name());

    let public_dir = args
        .public_dir
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../public"));

    let app = routes()
        .fallback_service(ServeDir::new(public_dir).append_index_html_on_directories(true))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::default().level(Level::INFO)),
        )
        .with_state(state);

    let port = args.port;
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Robot server running at http://localhost:{port}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind server");
    if let Err(error) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {error}");
    }

    tracing::info!("Stopping motors");
    if let Err(error) = drive.set_motor_model(STOPPED).await {
        tracing::error!("Cleanup error: {error}");
    }
    tracing::info!(
        "Simulated drive issued {} motor commands",
        simulated.commands().len()
    );
}
