//! Input events delivered to the modal tools and the status they return

use glam::Vec3;
use uuid::Uuid;

/// Scene geometry under the pointer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    pub object: Uuid,
    /// World-space hit location
    pub location: Vec3,
}

/// Pointer state resolved by the host's raycast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    pub hit: Option<SurfaceHit>,
    /// Projection of the pointer onto the floor plane
    pub floor: Option<Vec3>,
    /// View direction of the camera
    pub view_dir: Vec3,
}

impl Default for Pointer {
    fn default() -> Self {
        Self {
            hit: None,
            floor: None,
            view_dir: Vec3::NEG_Z,
        }
    }
}

impl Pointer {
    /// Pointer over the floor, seen from straight above
    pub fn on_floor(point: Vec3) -> Self {
        Self {
            hit: None,
            floor: Some(point),
            view_dir: Vec3::NEG_Z,
        }
    }

    /// Pointer hitting an object, seen from the side
    pub fn on_object(object: Uuid, location: Vec3) -> Self {
        Self {
            hit: Some(SurfaceHit { object, location }),
            floor: Some(location.truncate().extend(0.0)),
            view_dir: Vec3::Y,
        }
    }

    pub fn with_view_dir(mut self, view_dir: Vec3) -> Self {
        self.view_dir = view_dir;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Escape,
    Backspace,
    Tab,
    Left,
    Right,
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerMoved(Pointer),
    Click,
    RightClick,
    Key(Key),
    Timer,
}

/// What a tool tells the event loop after handling one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalStatus {
    Running,
    Finished,
    Cancelled,
    /// Not handled; let other handlers see the event
    PassThrough,
}

impl ModalStatus {
    pub fn is_done(&self) -> bool {
        matches!(self, ModalStatus::Finished | ModalStatus::Cancelled)
    }
}
