/// Gamepad input via gilrs (feature `gamepad`).
///
/// Movement comes from the D-pad or the left stick. Buttons are mapped to
/// actions by name from `[gamepad]` in config.toml:
///   jump        A, B
///   debug       Y
///   monochrome  X
///   restart     Start
///   quit        Select
///
/// Without the feature this compiles to an always-disconnected stub that
/// reports empty `Controls`.

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;
use crate::ui::input::Controls;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Face, shoulder and menu buttons, by logical name.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,
    B,
    X,
    Y,
    L1,
    R1,
    Start,
    Select,
}

const BTN_COUNT: usize = 8;

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH" => Some(Btn::A),
            "B" | "EAST" => Some(Btn::B),
            "X" | "WEST" => Some(Btn::X),
            "Y" | "NORTH" => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER" => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South => Some(Btn::A),
            Button::East => Some(Btn::B),
            Button::West => Some(Btn::X),
            Button::North => Some(Btn::Y),
            Button::LeftTrigger => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::Start => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
}

struct ActionMap {
    jump: Vec<Btn>,
    debug: Vec<Btn>,
    monochrome: Vec<Btn>,
    restart: Vec<Btn>,
    quit: Vec<Btn>,
}

impl ActionMap {
    /// Unknown names are skipped; an action left with no buttons keeps
    /// its previous mapping.
    fn from_config(cfg: &GamepadConfig) -> ActionMap {
        fn parse(names: &[String], fallback: Vec<Btn>) -> Vec<Btn> {
            let v: Vec<Btn> = names.iter().filter_map(|s| {
                let b = Btn::from_name(s);
                if b.is_none() {
                    log::warn!("unknown gamepad button `{s}` in config");
                }
                b
            }).collect();
            if v.is_empty() { fallback } else { v }
        }
        let d = ActionMap::default();
        ActionMap {
            jump: parse(&cfg.jump, d.jump),
            debug: parse(&cfg.debug, d.debug),
            monochrome: parse(&cfg.monochrome, d.monochrome),
            restart: parse(&cfg.restart, d.restart),
            quit: parse(&cfg.quit, d.quit),
        }
    }
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            jump: vec![Btn::A, Btn::B],
            debug: vec![Btn::Y],
            monochrome: vec![Btn::X],
            restart: vec![Btn::Start],
            quit: vec![Btn::Select],
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,
    buttons: [BtnState; BTN_COUNT],
    dpad_left: bool,
    dpad_right: bool,
    stick_x: f32,
    action_map: ActionMap,
}

impl GamepadState {
    pub fn new(cfg: &GamepadConfig) -> Self {
        #[cfg(feature = "gamepad")]
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                if let Some((_, pad)) = g.gamepads().next() {
                    log::info!("gamepad detected: {}", pad.name());
                }
                Some(g)
            }
            Err(e) => {
                log::warn!("gamepad support unavailable: {e}");
                None
            }
        };

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs,
            buttons: [BtnState::default(); BTN_COUNT],
            dpad_left: false,
            dpad_right: false,
            stick_x: 0.0,
            action_map: ActionMap::from_config(cfg),
        }
    }

    /// Poll pending device events. Call once per frame.
    pub fn update(&mut self) {
        for b in &mut self.buttons {
            b.just_pressed = false;
        }
        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let Some(gilrs) = &mut self.gilrs else { return };
        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => self.set_button(btn, true),
                EventType::ButtonReleased(btn, _) => self.set_button(btn, false),
                EventType::AxisChanged(Axis::LeftStickX, value, _) => self.stick_x = value,
                EventType::Connected => log::info!("gamepad connected"),
                EventType::Disconnected => {
                    log::info!("gamepad disconnected");
                    self.release_all();
                }
                _ => {}
            }
        }
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, btn: Button, held: bool) {
        match btn {
            Button::DPadLeft => self.dpad_left = held,
            Button::DPadRight => self.dpad_right = held,
            other => {
                if let Some(b) = Btn::from_gilrs(other) {
                    self.press(b, held);
                }
            }
        }
    }

    fn press(&mut self, btn: Btn, held: bool) {
        let s = &mut self.buttons[btn as usize];
        if held && !s.held {
            s.just_pressed = true;
        }
        s.held = held;
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        self.buttons = [BtnState::default(); BTN_COUNT];
        self.dpad_left = false;
        self.dpad_right = false;
        self.stick_x = 0.0;
    }

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[b as usize].just_pressed)
    }

    pub fn controls(&self) -> Controls {
        let m = &self.action_map;
        Controls {
            left: self.dpad_left || self.stick_x < -STICK_DEADZONE,
            right: self.dpad_right || self.stick_x > STICK_DEADZONE,
            jump: self.any_just_pressed(&m.jump),
            debug: self.any_just_pressed(&m.debug),
            monochrome: self.any_just_pressed(&m.monochrome),
            restart: self.any_just_pressed(&m.restart),
            quit: self.any_just_pressed(&m.quit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pad(cfg: &GamepadConfig) -> GamepadState {
        // Build without touching real devices.
        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: None,
            buttons: [BtnState::default(); BTN_COUNT],
            dpad_left: false,
            dpad_right: false,
            stick_x: 0.0,
            action_map: ActionMap::from_config(cfg),
        }
    }

    fn default_cfg() -> GamepadConfig {
        crate::config::GameConfig::default().gamepad
    }

    #[test]
    fn button_names_are_case_insensitive() {
        assert_eq!(Btn::from_name("start"), Some(Btn::Start));
        assert_eq!(Btn::from_name("South"), Some(Btn::A));
        assert_eq!(Btn::from_name("Back"), Some(Btn::Select));
        assert_eq!(Btn::from_name("Turbo"), None);
    }

    #[test]
    fn press_is_edge_triggered() {
        let mut p = pad(&default_cfg());
        p.press(Btn::A, true);
        assert!(p.controls().jump);
        p.update();
        assert!(!p.controls().jump);
        p.press(Btn::A, true);
        assert!(!p.controls().jump);
    }

    #[test]
    fn remapped_buttons() {
        let mut cfg = default_cfg();
        cfg.jump = vec!["R1".into(), "bogus".into()];
        cfg.quit = vec!["bogus".into()];
        let mut p = pad(&cfg);
        p.press(Btn::A, true);
        assert!(!p.controls().jump);
        p.press(Btn::R1, true);
        assert!(p.controls().jump);
        // All names unknown: default mapping stays.
        p.press(Btn::Select, true);
        assert!(p.controls().quit);
    }

    #[test]
    fn stick_deadzone() {
        let mut p = pad(&default_cfg());
        p.stick_x = -0.1;
        assert!(!p.controls().left);
        p.stick_x = -0.8;
        assert!(p.controls().left && !p.controls().right);
        p.release_all();
        assert_eq!(p.controls(), Controls::default());
    }
}
