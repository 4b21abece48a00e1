/// Level loader.
///
/// ## Sources (priority order):
///   1. Path given as the first command-line argument
///   2. `[general] level` in `config.toml`
///   3. Built-in embedded level
///
/// ## Stream format
///   ```
///   # comment
///   <player-x> <player-y> <player-color>
///   <platform-count>
///   <x> <y> <w> <h> <color>                     (× platform-count)
///   <hazard-count>
///   rect <x> <y> <w> <h> <color>                (or)
///   tri <x1> <y1> <x2> <y2> <x3> <y3> <color>   (× hazard-count)
///   ```
///
/// Colors are `RRGGBB` or `RRGGBBAA`. World y grows downward.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use crate::config::GameConfig;
use crate::domain::lava::LavaField;
use crate::domain::platforms::Platforms;
use crate::domain::player::Player;
use crate::domain::records::TokenReader;
use crate::error::Result;

/// Everything a session needs from a level stream.
#[derive(Clone, Debug)]
pub struct Level {
    pub player: Player,
    pub platforms: Platforms,
    pub lava: LavaField,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum LevelSource {
    File(PathBuf),
    Embedded,
}

impl std::fmt::Display for LevelSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LevelSource::File(p) => write!(f, "{}", p.display()),
            LevelSource::Embedded => write!(f, "<embedded>"),
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Pick the level to play: CLI argument, then config, then the built-in one.
pub fn resolve_source(cli_arg: Option<&Path>, config: &GameConfig) -> LevelSource {
    cli_arg
        .map(Path::to_path_buf)
        .or_else(|| config.level.clone())
        .map_or(LevelSource::Embedded, LevelSource::File)
}

pub fn load(source: &LevelSource, config: &GameConfig) -> Result<Level> {
    let level = match source {
        LevelSource::File(path) => Level::from_reader(BufReader::new(File::open(path)?), config)?,
        LevelSource::Embedded => Level::from_text(EMBEDDED_LEVEL, config)?,
    };
    log::info!(
        "loaded level {source}: {} platforms, {} hazards",
        level.platforms.len(),
        level.lava.hazards().len(),
    );
    Ok(level)
}

impl Level {
    pub fn from_reader(reader: impl Read, config: &GameConfig) -> Result<Self> {
        Self::from_tokens(TokenReader::from_reader(reader)?, config)
    }

    pub fn from_text(text: &str, config: &GameConfig) -> Result<Self> {
        Self::from_tokens(TokenReader::from_text(text), config)
    }

    fn from_tokens(mut tokens: TokenReader, config: &GameConfig) -> Result<Self> {
        let player = Player::from_records(&mut tokens, config.physics.clone())?;
        let platforms = Platforms::from_records(&mut tokens)?;
        let lava = LavaField::from_records(&mut tokens)?.with_period(config.lava.period_ms);
        tokens.finish()?;
        Ok(Level { player, platforms, lava })
    }
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback level
// ══════════════════════════════════════════════════════════════

const EMBEDDED_LEVEL: &str = "\
# Lava Runner: built-in level

# spawn
0 -100 ff8c00

# platforms
7
-600 -400  200 500 3a3a4a   # back wall
-400    0  600 100 4a4a5a
 300    0  400 100 4a4a5a
 800  -80  150  20 6a6a7a
1050 -160  150  20 6a6a7a
1300    0  600 100 4a4a5a
1900 -400  200 500 3a3a4a

# hazards
4
rect  200   20  100  80 ff3000
rect  700   20  600  80 ff3000
tri  1500    0 1530 -40 1560 0 e04000
rect -2000 300 5000 200 ff3000cc    # the pit below everything
";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geometry::Rect;
    use crate::error::Error;

    const SMALL: &str = "\
10 -30 ffffff
1
0 0 100 10 808080
1
rect 200 0 50 50 ff0000
";

    #[test]
    fn embedded_level_parses() {
        let level = load(&LevelSource::Embedded, &GameConfig::default()).unwrap();
        assert_eq!(level.platforms.len(), 7);
        assert_eq!(level.lava.hazards().len(), 4);
        assert!(level.player.is_alive());
        // Spawn is not already in lava.
        assert!(!level.lava.overlaps_rect(level.player.rect()));
    }

    #[test]
    fn full_stream_in_order() {
        let level = Level::from_text(SMALL, &GameConfig::default()).unwrap();
        assert_eq!(level.player.rect(), Rect::new(10.0, -30.0, 25.0, 25.0));
        assert_eq!(level.platforms.len(), 1);
        assert_eq!(level.lava.hazards().len(), 1);
        assert_eq!(level.lava.period_ms(), 1000);
    }

    #[test]
    fn lava_period_comes_from_config() {
        let mut config = GameConfig::default();
        config.lava.period_ms = 250;
        let level = Level::from_reader(SMALL.as_bytes(), &config).unwrap();
        assert_eq!(level.lava.period_ms(), 250);
    }

    #[test]
    fn missing_section_reports_last_line() {
        let err = Level::from_text("0 0 ffffff\n0\n", &GameConfig::default());
        assert!(matches!(err, Err(Error::MalformedLevelData { line: 2, .. })));
    }

    #[test]
    fn trailing_garbage_is_rejected() {
        let text = format!("{SMALL}junk\n");
        let err = Level::from_text(&text, &GameConfig::default());
        assert!(matches!(err, Err(Error::MalformedLevelData { line: 6, .. })));
    }

    #[test]
    fn missing_file_is_io_error() {
        let source = LevelSource::File(PathBuf::from("/nonexistent/lava-runner/level.txt"));
        assert!(matches!(load(&source, &GameConfig::default()), Err(Error::Io(_))));
    }

    #[test]
    fn source_priority() {
        let mut config = GameConfig::default();
        assert_eq!(resolve_source(None, &config), LevelSource::Embedded);

        config.level = Some(PathBuf::from("from-config.txt"));
        assert_eq!(resolve_source(None, &config), LevelSource::File("from-config.txt".into()));

        let cli = PathBuf::from("from-cli.txt");
        assert_eq!(resolve_source(Some(&cli), &config), LevelSource::File(cli.clone()));
    }
}
