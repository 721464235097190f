use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Contact phase reported by the input collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    /// The platform aborted the contact (e.g. palm rejection).
    Cancel,
}

/// One pointer/touch sample in screen pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    pub phase: PointerPhase,
}

impl PointerEvent {
    pub fn new(id: u64, x: f32, y: f32, phase: PointerPhase) -> Self {
        Self { id, x, y, phase }
    }

    pub fn down(id: u64, x: f32, y: f32) -> Self {
        Self::new(id, x, y, PointerPhase::Down)
    }

    pub fn moved(id: u64, x: f32, y: f32) -> Self {
        Self::new(id, x, y, PointerPhase::Move)
    }

    pub fn up(id: u64, x: f32, y: f32) -> Self {
        Self::new(id, x, y, PointerPhase::Up)
    }

    #[inline]
    pub fn position(&self) -> Point2<f32> {
        Point2::new(self.x, self.y)
    }
}
