use clap::Parser;
use log::{error, info};
use server::config::ServerConfig;
use server::network::Server;
use shared::{DEFAULT_PORT, MAZE_HEIGHT, MAZE_WIDTH};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,
    /// Server port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Maze width in cells (odd values give the cleanest corridors)
    #[arg(long, default_value_t = MAZE_WIDTH)]
    width: usize,
    /// Maze height in cells
    #[arg(long, default_value_t = MAZE_HEIGHT)]
    height: usize,
    /// Fixed base seed for reproducible mazes; defaults to the wall clock
    #[arg(short, long)]
    seed: Option<u64>,
}

/// Main-method of the application.
/// Parses command-line arguments, binds the listener and runs the lobby until Ctrl+C.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    // Degenerate maze sizes are fatal before anything binds
    let config = ServerConfig::new(args.host, args.port, args.width, args.height, args.seed)?;
    if let Some(seed) = config.seed {
        info!("Using fixed base seed {}", seed);
    }

    let server = Server::bind(&config).await?;
    let handle = server.handle();
    let server_handle = tokio::spawn(server.run());

    tokio::select! {
        result = server_handle => {
            if let Err(e) = result {
                error!("Server task panicked: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
            handle.shutdown();
        }
    }

    Ok(())
}
