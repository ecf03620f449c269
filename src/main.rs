//! Magnon CLI - run the OSC sequence player or send it a score

use clap::{Parser, Subcommand};
use magnon::client::{ambient_note, OscClient};
use magnon::config::Config;
use magnon::engine::{LogEngine, OscEngine, SynthEngine};
use magnon::loops::Session;
use magnon::score;
use std::io::Read;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "magnon")]
#[command(about = "Magnon: OSC sequence player for live-coded synth engines", long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Listen for sequences and play them
    Serve {
        /// Config file (default: <config dir>/magnon/config.toml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Address to receive OSC on
        #[arg(short, long)]
        listen: Option<SocketAddr>,

        /// Synth engine address
        #[arg(short, long)]
        engine: Option<SocketAddr>,

        /// Tempo in beats per minute
        #[arg(short, long)]
        bpm: Option<f64>,

        /// Log synth triggers instead of sending them
        #[arg(long)]
        dry_run: bool,
    },

    /// Send a score file (or - for stdin) to a running player
    Send {
        /// Score in Sonic Pi line syntax
        input: String,

        /// Player address
        #[arg(short, long, default_value = "127.0.0.1:4560")]
        target: SocketAddr,

        /// Do not send the first note to the ambient voice
        #[arg(long)]
        no_ambient: bool,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Serve {
            config,
            listen,
            engine,
            bpm,
            dry_run,
        } => {
            let mut config = Config::discover(config.as_deref())?;
            if let Some(listen) = listen {
                config.server.listen = listen;
            }
            if let Some(engine) = engine {
                config.engine.target = engine;
            }
            if let Some(bpm) = bpm {
                config.player.bpm = bpm;
            }
            config.engine.dry_run |= dry_run;
            config.validate()?;

            let engine: Arc<dyn SynthEngine> = if config.engine.dry_run {
                info!("Dry run: synth triggers are only logged");
                Arc::new(LogEngine)
            } else {
                Arc::new(OscEngine::new(config.engine.target, &config.engine.synth_prefix)?)
            };

            info!("Starting Magnon at {} BPM", config.player.bpm);
            Session::new(config, engine)?.run().await?;
        }

        Commands::Send {
            input,
            target,
            no_ambient,
        } => {
            let text = if input == "-" {
                let mut buffer = String::new();
                std::io::stdin().read_to_string(&mut buffer)?;
                buffer
            } else {
                std::fs::read_to_string(&input)?
            };

            let events = score::parse(&text);
            if events.is_empty() {
                warn!("Score is empty, nothing sent");
                return Ok(());
            }
            info!(
                "Sending {} events, {} beats long, to {}",
                events.len(),
                score::total_beats(&events),
                target
            );

            let client = OscClient::new(target)?;
            client.send_sequence(&events)?;
            if !no_ambient {
                if let Some(note) = ambient_note(&events) {
                    client.send_ambient(note)?;
                }
            }
        }
    }

    Ok(())
}
