// src/cli/chat.rs — Interactive REPL

use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use super::render;
use crate::audio::{self, AudioOutput, AudioPlayer, SilentOutput};
use crate::client::SimulationApi;
use crate::core::turn::{apply_side_effect, TurnRunner};
use crate::infra::config::Config;
use crate::session::SessionStore;

pub const DELETED_NOTICE: &str = "Archive entry deleted";

/// Everything a slash command may touch.
struct ChatState {
    store: SessionStore,
    audio: AudioPlayer,
    runner: TurnRunner,
    /// Set while the player runs on a silent output because audio started
    /// disabled. `/audio on` opens the device once.
    open_device: Option<fn() -> Box<dyn AudioOutput>>,
}

#[derive(Debug, PartialEq)]
enum Flow {
    Continue,
    Quit,
}

/// Run the interactive simulation until the player quits or stdin closes.
pub async fn run_chat(config: &Config, api: Arc<dyn SimulationApi>) -> anyhow::Result<()> {
    let store = super::open_store(config)?;
    let open_device: Option<fn() -> Box<dyn AudioOutput>> = if config.audio.enabled {
        None
    } else {
        Some(audio::default_output)
    };
    let output: Box<dyn AudioOutput> = match open_device {
        Some(_) => Box::new(SilentOutput),
        None => audio::default_output(),
    };
    let audio = AudioPlayer::new(output, &config.audio);
    let (runner, mut side_effects) = TurnRunner::new(api, config.api.illustrations);

    let mut state = ChatState {
        store,
        audio,
        runner,
        open_device,
    };

    eprintln!(
        "chronos v{} | session {} | {} saved | audio {}\n",
        env!("CARGO_PKG_VERSION"),
        state.store.active_id(),
        state.store.sessions().len(),
        on_off(state.audio.is_enabled()),
    );
    show_resumed(&state);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if handle_line(line.trim(), &mut state).await == Flow::Quit {
                    break;
                }
                prompt();
            }
            Some(effect) = side_effects.recv() => {
                match apply_side_effect(&mut state.store, &mut state.audio, effect) {
                    Ok(Some(notice)) => {
                        eprintln!("\n  [{notice}]");
                        prompt();
                    }
                    Ok(None) => {}
                    Err(e) => warn!("Could not apply turn result: {e}"),
                }
            }
        }
    }

    state.audio.stop_audio();
    if state.runner.pending() > 0 {
        eprintln!("Leaving {} media request(s) unfinished.", state.runner.pending());
    }
    Ok(())
}

fn prompt() {
    print!("> ");
    std::io::stdout().flush().ok();
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

fn show_resumed(state: &ChatState) {
    let active = state.store.active();
    if active.messages.is_empty() {
        eprintln!("Describe a divergence point to begin. /help lists commands.\n");
        return;
    }
    if let Some(last) = active.messages.last() {
        eprintln!("{}\n", render::message(last));
    }
    if let Some(ref world) = active.world_state {
        eprint!("{}", render::world_state(world));
    }
    eprint!("{}", render::suggestions(&active.suggested_actions));
}

async fn handle_line(input: &str, state: &mut ChatState) -> Flow {
    if input == "quit" || input == "exit" {
        return Flow::Quit;
    }
    if input.starts_with('/') {
        return handle_slash_command(input, state);
    }
    if input.is_empty() {
        return Flow::Continue;
    }

    let action = pick_suggestion(input, &state.store.active().suggested_actions)
        .unwrap_or(input)
        .to_string();
    if action != input {
        eprintln!("  > {action}");
    }

    match state
        .runner
        .run(&mut state.store, &mut state.audio, &action)
        .await
    {
        Ok(outcome) => {
            println!("\n{}\n", outcome.narrative);
            if let Some(ref world) = state.store.active().world_state {
                print!("{}", render::world_state(world));
            }
            print!(
                "{}",
                render::suggestions(&state.store.active().suggested_actions)
            );
        }
        Err(e) => eprintln!("[error] {e}"),
    }
    Flow::Continue
}

/// A bare number answers with that suggestion (1-based).
fn pick_suggestion<'a>(input: &str, suggestions: &'a [String]) -> Option<&'a str> {
    let n: usize = input.parse().ok()?;
    n.checked_sub(1)
        .and_then(|i| suggestions.get(i))
        .map(String::as_str)
}

fn handle_slash_command(input: &str, state: &mut ChatState) -> Flow {
    let parts: Vec<&str> = input.splitn(2, ' ').collect();
    let cmd = parts[0];
    let arg = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match cmd {
        "/quit" | "/exit" => return Flow::Quit,
        "/new" => {
            state.audio.stop_audio();
            match state.store.create() {
                Ok(meta) => eprintln!("  Started session {}", meta.id),
                Err(e) => eprintln!("[error] {e}"),
            }
        }
        "/sessions" => {
            eprint!(
                "{}",
                render::session_list(state.store.sessions(), Some(state.store.active_id()))
            );
        }
        "/load" => {
            if arg.is_empty() {
                eprintln!("  Usage: /load <id>");
                return Flow::Continue;
            }
            state.audio.stop_audio();
            match state.store.load(arg) {
                Ok(true) => {
                    eprintln!("  Loaded session {arg}\n");
                    show_resumed(state);
                }
                Ok(false) => eprintln!("  No session with id {arg}"),
                Err(e) => eprintln!("[error] {e}"),
            }
        }
        "/delete" => {
            if arg.is_empty() {
                eprintln!("  Usage: /delete <id>");
                return Flow::Continue;
            }
            let was_active = state.store.active_id() == arg;
            if was_active {
                state.audio.stop_audio();
            }
            match state.store.delete(arg) {
                Ok(()) => {
                    eprintln!("  {DELETED_NOTICE}");
                    if was_active {
                        eprintln!("  Now in session {}", state.store.active_id());
                    }
                }
                Err(e) => eprintln!("[error] {e}"),
            }
        }
        "/state" => {
            let active = state.store.active();
            match active.world_state {
                Some(ref world) => {
                    eprint!("{}", render::world_state(world));
                    eprintln!("  Timeline:");
                    eprint!("{}", render::timeline(&active.history_points));
                }
                None => eprintln!("  No simulation yet."),
            }
        }
        "/history" => {
            let active = state.store.active();
            if active.messages.is_empty() {
                eprintln!("  No messages in this session yet.");
            } else {
                eprint!("{}", render::transcript(&active.messages));
            }
        }
        "/audio" => match arg {
            "" => eprintln!("  Audio: {}", on_off(state.audio.is_enabled())),
            "on" | "off" => {
                if arg == "on" {
                    if let Some(open) = state.open_device.take() {
                        state.audio.replace_output(open());
                    }
                }
                state.audio.set_enabled(arg == "on");
                eprintln!("  Audio {arg}");
            }
            _ => eprintln!("  Usage: /audio [on|off]"),
        },
        "/stop" => state.audio.stop_audio(),
        "/help" => {
            eprintln!("Slash commands:");
            eprintln!("  /new               Start a new session");
            eprintln!("  /sessions          List saved sessions");
            eprintln!("  /load <id>         Switch to a saved session");
            eprintln!("  /delete <id>       Delete a saved session");
            eprintln!("  /state             Show world state and timeline");
            eprintln!("  /history           Show this session's transcript");
            eprintln!("  /audio [on|off]    Show or toggle audio");
            eprintln!("  /stop              Stop narration");
            eprintln!("  /help              Show this help");
            eprintln!("  /quit, quit, exit  End session");
            eprintln!("A bare number picks that suggested action.");
        }
        _ => {
            eprintln!("Unknown command: {}. Type /help for commands.", cmd);
        }
    }
    Flow::Continue
}
