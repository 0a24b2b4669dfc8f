use clap::Parser;
use notemake::midi::{MidiBridge, MidiOutSink, list_ports};
use notemake::{Config, EngineUpdate, NoteScheduler, TimerService, spawn_engine, watch};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "notemake", about = "Generate note-on/note-off pairs from MIDI input")]
struct Args {
    /// Settings file (RON)
    #[arg(short, long, default_value = "notemake.ron")]
    config: PathBuf,

    /// Print MIDI ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Reload velocity and duration when the settings file changes
    #[arg(long)]
    watch: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = if args.config.exists() {
        Config::load(&args.config)?
    } else {
        Config::default()
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if !args.config.exists() {
        tracing::info!(path = %args.config.display(), "no config file, using defaults");
    }

    if args.list_ports {
        let (inputs, outputs) = list_ports()?;
        println!("MIDI inputs:");
        for (i, name) in inputs.iter().enumerate() {
            println!("  {}: {}", i, name);
        }
        println!("MIDI outputs:");
        for (i, name) in outputs.iter().enumerate() {
            println!("  {}: {}", i, name);
        }
        return Ok(());
    }

    let sink = MidiOutSink::connect(&config.midi)?;
    let output_port = sink.port_name().to_string();
    let timers = TimerService::spawn()?;
    let scheduler = NoteScheduler::new(Arc::new(sink), Arc::new(timers), config.initial_note());

    let engine = spawn_engine(scheduler);
    let bridge = MidiBridge::connect(&config.midi, engine.command_tx.clone())?;
    println!("{} -> notemake -> {}", bridge.port_name(), output_port);

    let _watcher = if args.watch {
        Some(watch::watch_config(&args.config, engine.command_tx.clone())?)
    } else {
        None
    };

    let update_rx = engine.update_rx.clone();
    std::thread::spawn(move || {
        for update in update_rx {
            match update {
                EngineUpdate::NoteScheduled { id, pitch } => {
                    tracing::debug!(%id, pitch, "note")
                }
                EngineUpdate::Flushed { count } => tracing::info!(count, "flushed"),
                EngineUpdate::Error { message } => tracing::error!("{}", message),
            }
        }
    });

    println!("Listening for MIDI. Press Enter to quit.");
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    engine.shutdown();
    Ok(())
}
