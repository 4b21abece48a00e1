/// Sound effects: short procedural clips played through rodio.
///
/// Clips are synthesized once at startup as mono f32 samples and replayed
/// fire-and-forget on a detached `Sink`. Without the `sound` feature (or
/// without an output device) `SoundEngine::new` still succeeds or returns
/// `None`, and every call is a no-op.

use crate::sim::event::GameEvent;

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
mod synth {
    use std::f32::consts::TAU;

    pub const SAMPLE_RATE: u32 = 22050;

    fn len(seconds: f32) -> usize {
        (SAMPLE_RATE as f32 * seconds) as usize
    }

    /// Rising square-ish chirp.
    pub fn jump() -> Vec<f32> {
        let n = len(0.11);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                phase += (320.0 + 500.0 * t) / SAMPLE_RATE as f32;
                let wave = (TAU * phase).sin() * 0.75 + (3.0 * TAU * phase).sin() * 0.25;
                wave * (1.0 - t) * 0.25
            })
            .collect()
    }

    /// Low, short thump.
    pub fn land() -> Vec<f32> {
        let n = len(0.06);
        let mut rng = Lcg(7);
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let tone = (TAU * 90.0 * ti).sin();
                (tone * 0.7 + rng.next() * 0.3) * (1.0 - t).powi(2) * 0.35
            })
            .collect()
    }

    /// Sizzle: noise over a falling tone, long tail.
    pub fn burn() -> Vec<f32> {
        let n = len(0.6);
        let mut rng = Lcg(12345);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                phase += (440.0 - 300.0 * t) / SAMPLE_RATE as f32;
                let tone = (TAU * phase).sin();
                let hiss = rng.next();
                (tone * 0.4 + hiss * 0.6 * (1.0 - t)) * (1.0 - t).powf(0.7) * 0.3
            })
            .collect()
    }

    /// Two quick ascending notes.
    pub fn restart() -> Vec<f32> {
        let mut out = Vec::with_capacity(len(0.12));
        for freq in [523.0_f32, 784.0] {
            let n = len(0.06);
            out.extend((0..n).map(|i| {
                let ti = i as f32 / SAMPLE_RATE as f32;
                (TAU * freq * ti).sin() * (1.0 - i as f32 / n as f32) * 0.2
            }));
        }
        out
    }

    /// Cheap white noise in `[-1, 1]`.
    struct Lcg(u32);

    impl Lcg {
        fn next(&mut self) -> f32 {
            self.0 = self.0.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            (self.0 as f32 / u32::MAX as f32) * 2.0 - 1.0
        }
    }
}

#[cfg(feature = "sound")]
mod inner {
    use std::sync::Arc;

    use rodio::buffer::SamplesBuffer;
    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::synth;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        jump: Arc<Vec<f32>>,
        land: Arc<Vec<f32>>,
        burn: Arc<Vec<f32>>,
        restart: Arc<Vec<f32>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("no audio output, sound disabled: {e}");
                    return None;
                }
            };
            Some(SoundEngine {
                _stream: stream,
                handle,
                jump: Arc::new(synth::jump()),
                land: Arc::new(synth::land()),
                burn: Arc::new(synth::burn()),
                restart: Arc::new(synth::restart()),
            })
        }

        fn play(&self, clip: &Arc<Vec<f32>>) {
            match Sink::try_new(&self.handle) {
                Ok(sink) => {
                    sink.append(SamplesBuffer::new(1, synth::SAMPLE_RATE, clip.as_ref().clone()));
                    sink.detach();
                }
                Err(e) => log::debug!("could not open sink: {e}"),
            }
        }

        pub fn play_jump(&self) { self.play(&self.jump); }
        pub fn play_land(&self) { self.play(&self.land); }
        pub fn play_die(&self) { self.play(&self.burn); }
        pub fn play_restart(&self) { self.play(&self.restart); }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API — compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_jump(&self) {}
    pub fn play_land(&self) {}
    pub fn play_die(&self) {}
    pub fn play_restart(&self) {}
}

/// Play the clip for each event that has one.
pub fn play_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let Some(sfx) = sound else { return };
    for event in events {
        match event {
            GameEvent::PlayerJumped => sfx.play_jump(),
            GameEvent::PlayerLanded => sfx.play_land(),
            GameEvent::PlayerKilled => sfx.play_die(),
            GameEvent::LevelRestarted => sfx.play_restart(),
        }
    }
}
