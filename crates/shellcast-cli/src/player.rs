//! Interactive playback in the current terminal.
//!
//! Replayed output goes straight to stdout. With controls enabled the
//! terminal is put in raw mode and keys are routed through a
//! [`KeyInterceptors`] registry:
//!
//! | key              | action              |
//! |------------------|---------------------|
//! | space            | pause / resume      |
//! | `+` `=` up       | double speed        |
//! | `-` down         | halve speed         |
//! | right / left     | seek 5s forward/back|
//! | `0` home         | back to the start   |
//! | `q` esc ctrl-c   | quit                |

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Write};
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::ResetColor;
use crossterm::{cursor, execute, terminal};
use futures::StreamExt;
use shellcast::config::{MAX_PLAYBACK_SPEED, MIN_PLAYBACK_SPEED};
use shellcast::{
    Interceptor, InterceptorHandle, KeyInterceptors, KeyOutcome, PlaybackCallbacks,
    PlaybackConfig, PlaybackEngine, PlaybackStatus, ShellcastError, drive, read_recording_file,
};

const SEEK_STEP_MS: i64 = 5_000;
const PLAYER_SCOPE: &str = "player";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlayerCommand {
    TogglePause,
    Faster,
    Slower,
    SeekBy(i64),
    Restart,
    Quit,
}

type CommandQueue = Rc<RefCell<VecDeque<PlayerCommand>>>;

/// Play a recording file until it ends or the user quits.
pub async fn play(
    path: &Path,
    config: &PlaybackConfig,
    speed: Option<f64>,
    controls: bool,
) -> shellcast::Result<()> {
    let file = read_recording_file(path)?;
    tracing::info!(
        session = %file.metadata.session_name,
        events = file.events.len(),
        "starting playback"
    );

    let mut engine = PlaybackEngine::default()
        .with_config(config)
        .with_callbacks(terminal_callbacks());
    engine.load(file);
    if let Some(speed) = speed
        && !engine.set_playback_speed(speed).is_applied()
    {
        return Err(ShellcastError::config(format!("invalid playback speed {speed}")));
    }
    let _ = engine.play();

    if controls {
        interactive(&mut engine).await
    } else {
        straight_through(&mut engine).await
    }
}

fn terminal_callbacks() -> PlaybackCallbacks {
    PlaybackCallbacks::new()
        .on_output(|bytes| {
            let mut out = io::stdout().lock();
            if let Err(e) = out.write_all(bytes).and_then(|()| out.flush()) {
                tracing::warn!(error = %e, "failed to write replayed output");
            }
        })
        .on_resize(|cols, rows| tracing::debug!(cols, rows, "recorded terminal resized"))
        .on_metadata(|key, value| tracing::debug!(key, %value, "recording marker"))
        .on_ended(|| tracing::info!("playback ended"))
}

async fn straight_through(engine: &mut PlaybackEngine) -> shellcast::Result<()> {
    let interrupted = tokio::select! {
        () = drive(engine) => false,
        result = tokio::signal::ctrl_c() => {
            ShellcastError::with_io_context(result, "waiting for ctrl-c")?;
            true
        }
    };
    if interrupted {
        tracing::info!(position = engine.current_time(), "playback interrupted");
        let _ = engine.stop();
    }
    Ok(())
}

async fn interactive(engine: &mut PlaybackEngine) -> shellcast::Result<()> {
    let _raw = RawModeGuard::enable()?;
    let keys = KeyInterceptors::<KeyEvent>::new();
    let queue = CommandQueue::default();
    let _bindings = bind_keys(&keys, &queue);
    let mut events = EventStream::new();

    loop {
        tokio::select! {
            () = wait_for_tick(engine.next_tick_in()) => {
                let _ = engine.tick();
            }
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) => {
                    if !keys.dispatch(&key).is_consumed() {
                        tracing::trace!(?key, "unbound key");
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    return Err(ShellcastError::io_context("reading terminal events", e));
                }
                None => break,
            },
        }

        let pending: Vec<PlayerCommand> = queue.borrow_mut().drain(..).collect();
        for command in pending {
            if !apply(engine, command) {
                let _ = engine.stop();
                return Ok(());
            }
        }
        if engine.status() == PlaybackStatus::Stopped {
            break;
        }
    }
    Ok(())
}

async fn wait_for_tick(delay: Option<Duration>) {
    match delay {
        Some(delay) => tokio::time::sleep(delay).await,
        None => std::future::pending().await,
    }
}

fn is_press(key: &KeyEvent) -> bool {
    key.kind != KeyEventKind::Release
}

fn bind_keys(keys: &KeyInterceptors<KeyEvent>, queue: &CommandQueue) -> Vec<InterceptorHandle> {
    let quit = Rc::clone(queue);
    let quit_handle = keys.register(
        Interceptor::new(move |key: &KeyEvent| {
            let wants_quit = matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
                || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL));
            if wants_quit {
                quit.borrow_mut().push_back(PlayerCommand::Quit);
                KeyOutcome::Consumed
            } else {
                KeyOutcome::Ignored
            }
        })
        .priority(100)
        .when(is_press),
    );

    let controls = Rc::clone(queue);
    let controls_handle = keys.register(
        Interceptor::new(move |key: &KeyEvent| {
            let command = match key.code {
                KeyCode::Char(' ') => PlayerCommand::TogglePause,
                KeyCode::Char('+' | '=') | KeyCode::Up => PlayerCommand::Faster,
                KeyCode::Char('-') | KeyCode::Down => PlayerCommand::Slower,
                KeyCode::Right => PlayerCommand::SeekBy(SEEK_STEP_MS),
                KeyCode::Left => PlayerCommand::SeekBy(-SEEK_STEP_MS),
                KeyCode::Char('0') | KeyCode::Home => PlayerCommand::Restart,
                _ => return KeyOutcome::Ignored,
            };
            controls.borrow_mut().push_back(command);
            KeyOutcome::Consumed
        })
        .scope(PLAYER_SCOPE)
        .when(is_press),
    );

    keys.set_scope(Some(PLAYER_SCOPE));
    vec![quit_handle, controls_handle]
}

fn step_speed(current: f64, faster: bool) -> f64 {
    let next = if faster { current * 2.0 } else { current / 2.0 };
    next.clamp(MIN_PLAYBACK_SPEED, MAX_PLAYBACK_SPEED)
}

/// Apply one command. Returns `false` when the player should exit.
fn apply(engine: &mut PlaybackEngine, command: PlayerCommand) -> bool {
    let transition = match command {
        PlayerCommand::TogglePause => match engine.status() {
            PlaybackStatus::Playing => engine.pause(),
            PlaybackStatus::Paused => engine.resume(),
            PlaybackStatus::Idle | PlaybackStatus::Stopped => engine.play(),
        },
        PlayerCommand::Faster => engine.set_playback_speed(step_speed(engine.playback_speed(), true)),
        PlayerCommand::Slower => {
            engine.set_playback_speed(step_speed(engine.playback_speed(), false))
        }
        PlayerCommand::SeekBy(delta) => engine.seek(engine.current_time().saturating_add(delta)),
        PlayerCommand::Restart => match engine.start_time() {
            Some(start) => engine.seek(start),
            None => return true,
        },
        PlayerCommand::Quit => return false,
    };
    tracing::debug!(
        ?command,
        ?transition,
        status = %engine.status(),
        speed = engine.playback_speed(),
        "player command"
    );
    true
}

/// Holds the terminal in raw mode; restores it on drop.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> shellcast::Result<Self> {
        terminal::enable_raw_mode().map_err(|e| ShellcastError::io_context("enabling raw mode", e))?;
        tracing::debug!("enabled raw mode");
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            tracing::warn!(error = %e, "failed to leave raw mode");
        }
        let _ = execute!(io::stdout(), ResetColor, cursor::Show);
        tracing::debug!("restored terminal mode");
    }
}
