//! Casework modeling core
//!
//! This crate contains the room model:
//! - Scene: arena of tagged objects with parametric inputs and bindings
//! - Wall graph: follow links between walls, miter angles, chains
//! - Products and obstacles placed along walls
//! - Units, settings, project files and the preset library

pub mod constants;
pub mod library;
pub mod obstacle;
pub mod product;
pub mod project;
pub mod scene;
pub mod settings;
pub mod units;
pub mod wall;

pub use constants::*;
pub use library::{LibraryError, LibraryResult, PresetInfo, PresetKind, PresetLibrary};
pub use obstacle::{ObstacleKind, ObstacleSurface, place_free_obstacle, place_obstacle};
pub use product::{ApplianceKind, CabinetKind, Product, ProductKind, ProductSpec};
pub use project::{Project, ProjectError};
pub use scene::{
    ObjectTag, Scene, SceneError, SceneObject, SceneResult, SceneSnapshot, TagSet, Transform,
};
pub use settings::{CabinetSettings, OpeningSettings, Settings, SnapSettings};
pub use units::{LengthUnit, UnitSettings, UnitSystem, format_distance, inch, parse_distance};
pub use wall::{NeighborSide, WallFace, WallInfo, normalize_angle};
