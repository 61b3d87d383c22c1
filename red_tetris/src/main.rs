use clap::Parser;
use red_tetris::{tcp, Dispatcher, GameConfig};
use std::path::PathBuf;
use tetris_arena::ArenaConfig;
use tokio::net::TcpListener;

/// red_tetris - multiplayer Tetris server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 3004)]
    port: u16,

    /// Path to a JSON game config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum number of open rooms
    #[arg(long)]
    max_rooms: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let config = match &args.config {
        Some(path) => GameConfig::from_file(path)?,
        None => GameConfig::default(),
    };
    let arena = ArenaConfig::new().with_max_rooms(args.max_rooms);

    let dispatcher = Dispatcher::new(config, arena);
    let handle = dispatcher.handle();
    let dispatcher_task = tokio::spawn(dispatcher.run());

    let listener = TcpListener::bind((args.host.as_str(), args.port)).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    tokio::select! {
        result = tcp::serve(listener, handle.clone()) => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("Interrupted"),
    }

    handle.stop();
    dispatcher_task.await?;
    Ok(())
}
