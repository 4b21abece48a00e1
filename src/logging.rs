/// Logger setup.
///
/// `env_logger` filtered by `RUST_LOG` (default `warn`). With `[general]
/// log_file` set, records are appended to that file. Otherwise they go to
/// stderr through a `StderrGate`, which is held while the alternate screen
/// is up and flushed once the terminal is restored.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use crate::config::{ConfigNote, GameConfig};

/// stderr, except that writes are buffered while held.
#[derive(Clone, Default)]
pub struct StderrGate {
    held: Arc<Mutex<Option<Vec<u8>>>>,
}

impl StderrGate {
    /// Start buffering. Already-held output is kept.
    pub fn hold(&self) {
        if let Ok(mut held) = self.held.lock() {
            held.get_or_insert_with(Vec::new);
        }
    }

    /// Stop buffering and write out what was held. No-op when not held.
    pub fn release(&self) {
        if let Some(pending) = self.take_held() {
            let mut err = io::stderr().lock();
            let _ = err.write_all(&pending);
            let _ = err.flush();
        }
    }

    fn take_held(&self) -> Option<Vec<u8>> {
        self.held.lock().ok().and_then(|mut held| held.take())
    }
}

impl Write for StderrGate {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut held = self.held.lock().map_err(|_| io::Error::other("log buffer poisoned"))?;
        match held.as_mut() {
            Some(pending) => {
                pending.extend_from_slice(buf);
                Ok(buf.len())
            }
            None => io::stderr().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

/// Install the global logger. Returns the gate when logging to stderr.
pub fn init(config: &GameConfig) -> Option<StderrGate> {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));

    let file = config.log_file.as_ref().and_then(|path| {
        match std::fs::OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(file),
            Err(e) => {
                eprintln!("could not open log file {}: {e}", path.display());
                None
            }
        }
    });

    let gate = match file {
        Some(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
            None
        }
        None => {
            let gate = StderrGate::default();
            builder.target(env_logger::Target::Pipe(Box::new(gate.clone())));
            Some(gate)
        }
    };

    if let Err(e) = builder.try_init() {
        eprintln!("logger already installed: {e}");
    }
    gate
}

/// Log what config loading collected before the logger existed.
pub fn replay(notes: &[ConfigNote]) {
    for note in notes {
        log::log!(note.level, "{}", note.message);
    }
}
