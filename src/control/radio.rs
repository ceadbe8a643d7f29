use crate::constrain_float;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StickAxis {
    Heading,
    Vertical,
    Horizontal,
    Forward,
}

impl StickAxis {
    pub const ALL: [StickAxis; 4] = [
        StickAxis::Heading,
        StickAxis::Vertical,
        StickAxis::Horizontal,
        StickAxis::Forward,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Button {
    RadioControl,
    Grab,
    Camera,
    Home,
}

impl Button {
    pub const ALL: [Button; 4] = [Button::RadioControl, Button::Grab, Button::Camera, Button::Home];

    fn index(self) -> usize {
        self as usize
    }
}

/// Operator input for one tick.
///
/// A stick left as `None` is not driven and springs back toward center.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioCommand {
    /// Indexed by [`StickAxis`], each in `-1..=1`.
    pub sticks: [Option<f64>; 4],

    /// Indexed by [`Button`], `true` while pressed.
    pub buttons: [bool; 4],
}

impl RadioCommand {
    pub fn stick(mut self, axis: StickAxis, value: f64) -> Self {
        self.sticks[axis.index()] = Some(value);
        self
    }

    pub fn press(mut self, button: Button) -> Self {
        self.buttons[button.index()] = true;
        self
    }
}

/// Stick positions and button latches of a spring-centered transmitter.
#[derive(Clone, Debug)]
pub struct RadioState {
    sticks: [f64; 4],
    button_ttl_usec: [u64; 4],
    decay: f64,
    ttl_usec: u64,
}

impl RadioState {
    /// Sticks move `decay` toward center every undriven tick,
    /// buttons stay pressed for `ttl_usec` after the last press.
    pub fn new(decay: f64, ttl_usec: u64) -> Self {
        Self {
            sticks: [0.; 4],
            button_ttl_usec: [0; 4],
            decay,
            ttl_usec,
        }
    }

    /// Advance one tick of `dt_usec` with the operator's `command`, if any.
    pub fn update(&mut self, command: Option<&RadioCommand>, dt_usec: u64) {
        let default = RadioCommand::default();
        let command = command.unwrap_or(&default);

        for (stick, driven) in self.sticks.iter_mut().zip(command.sticks) {
            *stick = match driven {
                Some(value) => constrain_float(value, -1., 1.),
                None if stick.abs() <= self.decay => 0.,
                None => *stick - self.decay * stick.signum(),
            };
        }

        for (ttl, pressed) in self.button_ttl_usec.iter_mut().zip(command.buttons) {
            *ttl = if pressed {
                self.ttl_usec
            } else {
                ttl.saturating_sub(dt_usec)
            };
        }
    }

    pub fn stick(&self, axis: StickAxis) -> f64 {
        self.sticks[axis.index()]
    }

    pub fn is_pressed(&self, button: Button) -> bool {
        self.button_ttl_usec[button.index()] > 0
    }

    pub fn reset(&mut self) {
        self.sticks = [0.; 4];
        self.button_ttl_usec = [0; 4];
    }
}
