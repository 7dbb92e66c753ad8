use clap::Parser;
use client::network::Client;
use log::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:5000")]
    server: String,

    /// Display name sent with JOIN after connecting
    #[arg(short = 'n', long)]
    name: Option<String>,

    /// Print server events as JSON lines
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    info!("Starting client...");
    if !args.json {
        println!("Type `help` for commands");
    }

    let mut client = Client::connect(&args.server, args.json).await?;
    client.run(args.name).await?;

    Ok(())
}
