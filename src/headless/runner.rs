//! Headless mode runner - stdin commands in, NDJSON observations out
//!
//! Commands, one per line:
//! `start`, `devices`, `select <udid>`, `toggle <udid>`, `apps`,
//! `payload <json>`, `push <bundle-id>`, `state`, `quit`.

use std::sync::Arc;

use pusher_app::{signals, Engine, EngineEvent, EngineHandle, Event, Settings};
use pusher_core::prelude::*;
use pusher_core::PushPayload;
use pusher_simctl::SimctlProvider;
use tokio::sync::{broadcast, mpsc};

use super::HeadlessEvent;

/// A parsed stdin command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Devices,
    Select(String),
    Toggle(String),
    Apps,
    Payload(String),
    Push(String),
    State,
    Quit,
}

/// Parse one stdin line; `Ok(None)` for blank lines
pub fn parse_command(line: &str) -> std::result::Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let argument = |name: &str| {
        if rest.is_empty() {
            Err(format!("{} requires an argument", name))
        } else {
            Ok(rest.to_string())
        }
    };

    let command = match verb {
        "start" => Command::Start,
        "devices" => Command::Devices,
        "select" => Command::Select(argument("select")?),
        "toggle" => Command::Toggle(argument("toggle")?),
        "apps" => Command::Apps,
        "payload" => Command::Payload(argument("payload")?),
        "push" => Command::Push(argument("push")?),
        "state" => Command::State,
        "q" | "quit" => Command::Quit,
        other => return Err(format!("Unknown command: {}", other)),
    };
    Ok(Some(command))
}

/// Run in headless mode until `quit`, end of stdin, or a termination signal
pub async fn run_headless(settings: Settings, payload: PushPayload) -> Result<()> {
    info!("═══════════════════════════════════════════════════════");
    info!("Pusher starting in HEADLESS mode");
    info!("xcrun: {}", settings.simctl.xcrun);
    info!("═══════════════════════════════════════════════════════");

    let provider = Arc::new(SimctlProvider::new(settings.simctl.clone()));
    let engine = Engine::new(provider, &settings.engine, payload);
    let handle = engine.handle();
    let mut events = handle.subscribe();

    signals::spawn_signal_handler(engine.shutdown_sender());
    let mut engine_task = tokio::spawn(engine.run());
    let mut engine_finished = false;
    let mut stdin_open = true;

    // Blocking stdin reader on its own thread
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(32);
    std::thread::spawn(move || {
        spawn_stdin_reader_blocking(cmd_tx);
    });

    HeadlessEvent::state(&handle.state()).emit();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    if let Some(headless) = HeadlessEvent::from_engine_event(&event) {
                        headless.emit();
                    }
                    if matches!(event, EngineEvent::Shutdown) {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Headless output lagged, skipped {} event(s)", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            result = &mut engine_task => {
                engine_finished = true;
                if let Err(e) = result {
                    error!("Engine task failed: {}", e);
                }
                break;
            }
            command = cmd_rx.recv(), if stdin_open => match command {
                Some(Command::Quit) | None => {
                    info!("Quit requested");
                    stdin_open = false;
                    handle.shutdown();
                }
                Some(command) => {
                    if let Err(e) = execute(&handle, command).await {
                        HeadlessEvent::error(e.to_string(), e.is_fatal()).emit();
                    }
                }
            },
        }
    }

    if !engine_finished {
        if let Err(e) = engine_task.await {
            error!("Engine task failed: {}", e);
        }
    }
    info!("Pusher headless mode exiting");
    Ok(())
}

/// Carry out one command against the engine
async fn execute(handle: &EngineHandle, command: Command) -> Result<()> {
    match command {
        Command::Start => handle.submit(Event::Start).await,
        Command::Devices => {
            HeadlessEvent::devices(&handle.devices()).emit();
            Ok(())
        }
        Command::Select(udid) => handle.select_device(&udid).await,
        Command::Toggle(udid) => handle.toggle_device(&udid).await,
        Command::Apps => {
            let state = handle.state();
            HeadlessEvent::applications(state.device(), state.applications()).emit();
            Ok(())
        }
        Command::Payload(text) => {
            if !handle.is_valid_payload(&text) {
                warn!("Payload accepted but not yet a valid push payload");
            }
            handle.edit_payload(text).await
        }
        Command::Push(bundle_id) => handle.request_push(&bundle_id).await,
        Command::State => {
            HeadlessEvent::state(&handle.state()).emit();
            HeadlessEvent::selection(handle.selected()).emit();
            Ok(())
        }
        Command::Quit => {
            handle.shutdown();
            Ok(())
        }
    }
}

/// Read stdin lines and forward parsed commands (blocking version)
fn spawn_stdin_reader_blocking(cmd_tx: mpsc::Sender<Command>) {
    use std::io::BufRead;

    let stdin = std::io::stdin();
    let reader = stdin.lock();

    for line in reader.lines() {
        match line {
            Ok(line) => match parse_command(&line) {
                Ok(Some(command)) => {
                    let quit = command == Command::Quit;
                    if cmd_tx.blocking_send(command).is_err() || quit {
                        break;
                    }
                }
                Ok(None) => {}
                Err(message) => {
                    warn!("Stdin: {}", message);
                    HeadlessEvent::error(message, false).emit();
                }
            },
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        }
    }

    info!("Stdin reader exiting");
}
