/// Entry point and frame loop.
///
/// Usage: `lavarunner [level-file]`

mod config;
mod domain;
mod error;
mod logging;
mod sim;
mod ui;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use config::GameConfig;
use error::RenderError;
use logging::StderrGate;
use sim::game::Game;
use sim::level;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::TerminalRenderer;
use ui::sound::{self, SoundEngine};

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() -> ExitCode {
    let (config, notes) = GameConfig::load();
    let gate = logging::init(&config);
    logging::replay(&notes);

    let cli_level = std::env::args_os().nth(1).map(PathBuf::from);
    let source = level::resolve_source(cli_level.as_deref(), &config);
    let level = match level::load(&source, &config) {
        Ok(l) => l,
        Err(e) => {
            log::error!("could not load level {source}: {e}");
            eprintln!("Could not load level {source}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut game = Game::new(level, &config.physics);

    // The terminal is restored when `run` returns, before anything is printed.
    let outcome = run(&mut game, &config, gate.as_ref());
    if let Some(gate) = &gate {
        gate.release();
    }
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("game error: {e}");
            eprintln!("Game error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(game: &mut Game, config: &GameConfig, gate: Option<&StderrGate>) -> error::Result<()> {
    // Devices first: their startup warnings go out before the screen is taken.
    let sound = SoundEngine::new();
    let mut gp = GamepadState::new(&config.gamepad);
    let mut kb = InputState::new();

    let mut term = TerminalRenderer::new().map_err(RenderError::from)?;
    // stderr would draw over the canvas; hold it until the screen is gone.
    if let Some(gate) = gate {
        gate.hold();
    }
    kb.honor_release = term.keyboard_enhanced();

    let mut last_frame = Instant::now();

    while game.is_running() {
        kb.drain_events();
        gp.update();

        let mut events = Vec::new();
        for cmd in kb.controls().merge(gp.controls()).commands() {
            events.extend(game.handle(cmd));
        }

        // Whole milliseconds only; the remainder carries into the next frame.
        let frame_ms = u32::try_from(last_frame.elapsed().as_millis()).unwrap_or(u32::MAX);
        last_frame += Duration::from_millis(frame_ms as u64);
        events.extend(game.advance(frame_ms));

        sound::play_events(sound.as_ref(), &events);

        let canvas = term.begin_frame().map_err(RenderError::from)?;
        game.render(canvas)?;
        term.present(&game.status_line()).map_err(RenderError::from)?;

        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}
