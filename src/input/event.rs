//! Input event records carried from renderer to client

use serde::{Deserialize, Serialize};

/// Event kind, stored as a `u32` tag in the ring
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputKind {
    KeyDown = 0,
    KeyUp = 1,
    MouseDown = 2,
    MouseUp = 3,
    MouseMove = 4,
}

impl InputKind {
    pub fn tag(self) -> u32 {
        self as u32
    }

    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            0 => Some(InputKind::KeyDown),
            1 => Some(InputKind::KeyUp),
            2 => Some(InputKind::MouseDown),
            3 => Some(InputKind::MouseUp),
            4 => Some(InputKind::MouseMove),
            _ => None,
        }
    }

    pub fn is_keyboard(self) -> bool {
        matches!(self, InputKind::KeyDown | InputKind::KeyUp)
    }
}

/// One keyboard or mouse event
///
/// Fields that do not apply to `kind` are zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    pub kind: InputKind,
    pub key_code: u32,
    pub mouse_button: u32,
    pub mouse_x: f32,
    pub mouse_y: f32,
}

impl InputEvent {
    pub fn key_down(key_code: u32) -> Self {
        Self::key(InputKind::KeyDown, key_code)
    }

    pub fn key_up(key_code: u32) -> Self {
        Self::key(InputKind::KeyUp, key_code)
    }

    pub fn mouse_down(button: u32, x: f32, y: f32) -> Self {
        Self::mouse(InputKind::MouseDown, button, x, y)
    }

    pub fn mouse_up(button: u32, x: f32, y: f32) -> Self {
        Self::mouse(InputKind::MouseUp, button, x, y)
    }

    pub fn mouse_move(x: f32, y: f32) -> Self {
        Self::mouse(InputKind::MouseMove, 0, x, y)
    }

    fn key(kind: InputKind, key_code: u32) -> Self {
        Self {
            kind,
            key_code,
            mouse_button: 0,
            mouse_x: 0.0,
            mouse_y: 0.0,
        }
    }

    fn mouse(kind: InputKind, mouse_button: u32, mouse_x: f32, mouse_y: f32) -> Self {
        Self {
            kind,
            key_code: 0,
            mouse_button,
            mouse_x,
            mouse_y,
        }
    }
}
