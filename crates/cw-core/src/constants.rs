//! Global constants for cw-core

/// Distance under which two wall endpoints count as the same point (1 cm)
pub const WALL_JOINT_TOLERANCE: f32 = 0.01;

/// Half-turn test tolerance when classifying objects rotated to a wall's back face
pub const ROTATION_TOLERANCE: f32 = 0.01;

/// Name prefix of the boolean cut a door or window adds to its wall
pub const WALL_CUT_PREFIX: &str = "Boolean_";

/// Current project file version
pub const PROJECT_VERSION: u32 = 1;
