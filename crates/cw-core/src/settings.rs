//! Document settings
//!
//! Defaults for new walls and products, snapping thresholds and units.
//! Stored in the project file.

use serde::{Deserialize, Serialize};

use crate::units::{UnitSettings, inch};

/// Cabinet defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CabinetSettings {
    /// Width of a single placed cabinet when no width is typed
    pub default_width: f32,
    /// Widest single cabinet auto-fill may produce
    pub max_single_width: f32,
    pub base_height: f32,
    pub base_depth: f32,
    pub tall_height: f32,
    pub tall_depth: f32,
    pub upper_height: f32,
    pub upper_depth: f32,
    /// Bottom of upper cabinets above the floor
    pub upper_location_z: f32,
    /// Bottom of range hoods above the floor
    pub hood_location_z: f32,
    pub material_thickness: f32,
    pub toe_kick_height: f32,
    pub toe_kick_setback: f32,
    /// Start cabinet placement in fill mode
    pub fill_mode: bool,
}

impl Default for CabinetSettings {
    fn default() -> Self {
        Self {
            default_width: inch(18.0),
            max_single_width: inch(36.0),
            base_height: inch(34.5),
            base_depth: inch(24.0),
            tall_height: inch(84.0),
            tall_depth: inch(24.0),
            upper_height: inch(30.0),
            upper_depth: inch(12.0),
            upper_location_z: inch(54.0),
            hood_location_z: inch(54.0),
            material_thickness: inch(0.75),
            toe_kick_height: inch(4.0),
            toe_kick_setback: inch(3.0),
            fill_mode: true,
        }
    }
}

/// Door and window defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpeningSettings {
    pub door_width: f32,
    pub door_height: f32,
    pub window_width: f32,
    pub window_height: f32,
    /// Window sill height above the floor
    pub window_height_from_floor: f32,
}

impl Default for OpeningSettings {
    fn default() -> Self {
        Self {
            door_width: inch(36.0),
            door_height: inch(80.0),
            window_width: inch(36.0),
            window_height: inch(48.0),
            window_height_from_floor: inch(36.0),
        }
    }
}

/// Snapping thresholds used by interactive placement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SnapSettings {
    /// Grid increment for points and lengths
    pub grid_spacing: f32,
    /// Snap a run to the gap center when within this distance
    pub center_threshold: f32,
    /// Snap a run flush to either end of its gap when within this distance
    pub edge_threshold: f32,
    /// Dead band around the wall centerline when picking a face
    pub side_hysteresis: f32,
    /// Pick the nearest wall when the pointer is within this distance
    pub wall_pick_distance: f32,
    /// Plan view when |view direction z| exceeds this
    pub plan_view_threshold: f32,
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self {
            grid_spacing: inch(1.0),
            center_threshold: inch(4.0),
            edge_threshold: inch(4.0),
            side_hysteresis: inch(1.0),
            wall_pick_distance: inch(6.0),
            plan_view_threshold: 0.7,
        }
    }
}

/// All document settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    pub units: UnitSettings,
    pub wall_thickness: f32,
    pub wall_height: f32,
    pub cabinets: CabinetSettings,
    pub openings: OpeningSettings,
    pub snap: SnapSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            units: UnitSettings::imperial(),
            wall_thickness: inch(4.5),
            wall_height: inch(96.0),
            cabinets: CabinetSettings::default(),
            openings: OpeningSettings::default(),
            snap: SnapSettings::default(),
        }
    }
}

impl Settings {
    pub fn with_units(mut self, units: UnitSettings) -> Self {
        self.units = units;
        self
    }

    pub fn with_wall_thickness(mut self, thickness: f32) -> Self {
        self.wall_thickness = thickness;
        self
    }

    pub fn with_wall_height(mut self, height: f32) -> Self {
        self.wall_height = height;
        self
    }

    pub fn with_max_cabinet_width(mut self, width: f32) -> Self {
        self.cabinets.max_single_width = width;
        self
    }

    pub fn with_fill_mode(mut self, fill_mode: bool) -> Self {
        self.cabinets.fill_mode = fill_mode;
        self
    }

    pub fn with_grid_spacing(mut self, spacing: f32) -> Self {
        self.snap.grid_spacing = spacing;
        self
    }
}
