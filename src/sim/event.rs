/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameEvent {
    PlayerJumped,
    PlayerLanded,
    PlayerKilled,
    LevelRestarted,
}
