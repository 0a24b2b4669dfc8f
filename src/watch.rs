use crate::config::Config;
use crate::engine::EngineCommand;
use crossbeam::channel::Sender;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};

/// Reloads the config file whenever it changes and pushes the new default
/// velocity and duration to the engine. The watcher stops when dropped.
pub fn watch_config(
    path: &Path,
    command_tx: Sender<EngineCommand>,
) -> notify::Result<RecommendedWatcher> {
    let config_path: PathBuf = path.to_path_buf();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) if is_content_change(&event.kind) => {
            for command in reload_commands(&config_path) {
                let _ = command_tx.send(command);
            }
        }
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "config watch error"),
    })?;

    watcher.watch(path, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}

fn is_content_change(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Modify(_) | EventKind::Create(_))
}

fn reload_commands(path: &Path) -> Vec<EngineCommand> {
    match Config::load(path) {
        Ok(config) => {
            tracing::info!(
                velocity = config.velocity,
                duration_ms = config.duration_ms,
                "config reloaded"
            );
            vec![
                EngineCommand::Velocity(config.velocity),
                EngineCommand::Duration(config.duration_ms),
            ]
        }
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "ignoring unreadable config");
            Vec::new()
        }
    }
}
