//! Obstacle catalog
//!
//! Fixed items already in the room (outlets, switches, vents, lights).
//! Wall obstacles are parented to a wall face and block placement on that
//! face like any other same-side child.

use std::f32::consts::PI;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::scene::{ObjectTag, Scene, SceneError, SceneResult};
use crate::units::inch;
use crate::wall::WallFace;

/// Surface an obstacle mounts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleSurface {
    Wall,
    Floor,
    Ceiling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleKind {
    OutletStandard,
    OutletDouble,
    OutletGfci,
    SwitchSingle,
    SwitchDouble,
    Thermostat,
    VentWall,
    VentReturn,
    AccessPanel,
    CableOutlet,
    VentFloor,
    FloorDrain,
    FloorOutlet,
    LightRecessed,
    CeilingFan,
    VentCeiling,
    SmokeDetector,
}

/// Catalog entry. Sizes are in inches.
struct CatalogEntry {
    name: &'static str,
    width: f32,
    height: f32,
    depth: f32,
    height_from_floor: f32,
    surface: ObstacleSurface,
}

const fn entry(
    name: &'static str,
    width: f32,
    height: f32,
    depth: f32,
    height_from_floor: f32,
    surface: ObstacleSurface,
) -> CatalogEntry {
    CatalogEntry {
        name,
        width,
        height,
        depth,
        height_from_floor,
        surface,
    }
}

impl ObstacleKind {
    pub const ALL: [ObstacleKind; 17] = [
        ObstacleKind::OutletStandard,
        ObstacleKind::OutletDouble,
        ObstacleKind::OutletGfci,
        ObstacleKind::SwitchSingle,
        ObstacleKind::SwitchDouble,
        ObstacleKind::Thermostat,
        ObstacleKind::VentWall,
        ObstacleKind::VentReturn,
        ObstacleKind::AccessPanel,
        ObstacleKind::CableOutlet,
        ObstacleKind::VentFloor,
        ObstacleKind::FloorDrain,
        ObstacleKind::FloorOutlet,
        ObstacleKind::LightRecessed,
        ObstacleKind::CeilingFan,
        ObstacleKind::VentCeiling,
        ObstacleKind::SmokeDetector,
    ];

    fn entry(&self) -> CatalogEntry {
        use ObstacleSurface::*;
        match self {
            ObstacleKind::OutletStandard => entry("Standard Outlet", 2.75, 4.5, 0.25, 12.0, Wall),
            ObstacleKind::OutletDouble => entry("Double Outlet", 4.5, 4.5, 0.25, 12.0, Wall),
            ObstacleKind::OutletGfci => entry("GFCI Outlet", 2.75, 4.5, 0.25, 42.0, Wall),
            ObstacleKind::SwitchSingle => entry("Light Switch", 2.75, 4.5, 0.25, 48.0, Wall),
            ObstacleKind::SwitchDouble => entry("Double Switch", 4.5, 4.5, 0.25, 48.0, Wall),
            ObstacleKind::Thermostat => entry("Thermostat", 3.0, 4.0, 1.5, 52.0, Wall),
            ObstacleKind::VentWall => entry("Wall Vent", 14.0, 6.0, 2.0, 6.0, Wall),
            ObstacleKind::VentReturn => entry("Return Vent", 20.0, 20.0, 2.0, 12.0, Wall),
            ObstacleKind::AccessPanel => entry("Access Panel", 14.0, 14.0, 1.0, 48.0, Wall),
            ObstacleKind::CableOutlet => entry("Cable/Data Outlet", 2.75, 4.5, 0.25, 12.0, Wall),
            ObstacleKind::VentFloor => entry("Floor Vent", 12.0, 4.0, 2.0, 0.0, Floor),
            ObstacleKind::FloorDrain => entry("Floor Drain", 4.0, 4.0, 4.0, 0.0, Floor),
            ObstacleKind::FloorOutlet => entry("Floor Outlet", 4.0, 4.0, 4.0, 0.0, Floor),
            ObstacleKind::LightRecessed => entry("Recessed Light", 6.0, 6.0, 8.0, 0.0, Ceiling),
            ObstacleKind::CeilingFan => entry("Ceiling Fan", 52.0, 52.0, 12.0, 0.0, Ceiling),
            ObstacleKind::VentCeiling => entry("Ceiling Vent", 24.0, 24.0, 2.0, 0.0, Ceiling),
            ObstacleKind::SmokeDetector => entry("Smoke Detector", 5.0, 5.0, 2.0, 0.0, Ceiling),
        }
    }

    pub fn name(&self) -> &'static str {
        self.entry().name
    }

    pub fn surface(&self) -> ObstacleSurface {
        self.entry().surface
    }

    /// Width, height, depth in meters
    pub fn size(&self) -> Vec3 {
        let e = self.entry();
        Vec3::new(inch(e.width), inch(e.height), inch(e.depth))
    }

    /// Default mounting height in meters (wall obstacles only)
    pub fn height_from_floor(&self) -> f32 {
        inch(self.entry().height_from_floor)
    }

    /// Catalog entries mounting to `surface`
    pub fn for_surface(surface: ObstacleSurface) -> Vec<ObstacleKind> {
        Self::ALL
            .into_iter()
            .filter(|k| k.surface() == surface)
            .collect()
    }
}

fn create_obstacle(scene: &mut Scene, kind: ObstacleKind) -> SceneResult<Uuid> {
    let size = kind.size();
    let id = scene.create_parametric(kind.name(), [ObjectTag::Cage, ObjectTag::Obstacle], "Cage")?;
    scene.set_input(id, "Dim X", size.x)?;
    scene.set_input(id, "Dim Y", size.z)?;
    scene.set_input(id, "Dim Z", size.y)?;
    scene.set_input(id, "Mirror Y", true)?;
    Ok(id)
}

/// Mount an obstacle on one face of a wall, its left edge `x` along the wall
pub fn place_obstacle(
    scene: &mut Scene,
    kind: ObstacleKind,
    wall: Uuid,
    x: f32,
    face: WallFace,
) -> SceneResult<Uuid> {
    let info = scene.wall(wall)?;
    if kind.surface() != ObstacleSurface::Wall {
        debug!("Mounting {} obstacle on a wall", kind.name());
    }

    let id = create_obstacle(scene, kind)?;
    scene.set_parent(id, Some(wall), false)?;
    let z = kind.height_from_floor();
    match face {
        WallFace::Front => {
            scene.set_location(id, Vec3::new(x, 0.0, z))?;
            scene.set_rotation_z(id, 0.0)?;
        }
        WallFace::Back => {
            // Turned around, so its local X runs right to left along the wall
            scene.set_location(id, Vec3::new(x + kind.size().x, info.thickness, z))?;
            scene.set_rotation_z(id, PI)?;
        }
    }
    debug!("Placed {} on wall {} ({})", kind.name(), wall, face.name());
    Ok(id)
}

/// Place a floor or ceiling obstacle at a world location
pub fn place_free_obstacle(
    scene: &mut Scene,
    kind: ObstacleKind,
    location: Vec3,
    rotation_z: f32,
) -> SceneResult<Uuid> {
    let id = create_obstacle(scene, kind)?;
    scene.set_location(id, location)?;
    scene.set_rotation_z(id, rotation_z)?;
    Ok(id)
}

/// Obstacles parented to a wall
pub fn wall_obstacles(scene: &Scene, wall: Uuid) -> SceneResult<Vec<Uuid>> {
    if !scene.has_tag(wall, ObjectTag::Wall) {
        return Err(SceneError::NotAWall(wall));
    }
    Ok(scene.children_with_tag(wall, ObjectTag::Obstacle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::Vec2;

    #[test]
    fn test_catalog_values() {
        let outlet = ObstacleKind::OutletStandard;
        assert_relative_eq!(outlet.size().x, inch(2.75));
        assert_relative_eq!(outlet.height_from_floor(), inch(12.0));
        assert_relative_eq!(ObstacleKind::Thermostat.height_from_floor(), inch(52.0));
        assert_eq!(ObstacleKind::CeilingFan.surface(), ObstacleSurface::Ceiling);

        let floor = ObstacleKind::for_surface(ObstacleSurface::Floor);
        assert_eq!(
            floor,
            vec![
                ObstacleKind::VentFloor,
                ObstacleKind::FloorDrain,
                ObstacleKind::FloorOutlet
            ]
        );
    }

    #[test]
    fn test_place_on_both_faces() {
        let mut scene = Scene::new();
        let wall = scene
            .add_wall(Vec2::ZERO, 0.0, inch(72.0), inch(4.5), inch(96.0))
            .unwrap();

        let front =
            place_obstacle(&mut scene, ObstacleKind::VentReturn, wall, inch(10.0), WallFace::Front)
                .unwrap();
        let t = scene.get(front).unwrap().transform;
        assert_relative_eq!(t.location.x, inch(10.0));
        assert_relative_eq!(t.location.z, inch(12.0));
        assert_eq!(scene.parent(front), Some(wall));

        let back =
            place_obstacle(&mut scene, ObstacleKind::VentReturn, wall, inch(10.0), WallFace::Back)
                .unwrap();
        let t = scene.get(back).unwrap().transform;
        assert_relative_eq!(t.location.x, inch(30.0), epsilon = 1e-6);
        assert_relative_eq!(t.location.y, inch(4.5), epsilon = 1e-6);
        assert_relative_eq!(t.rotation_z, PI);

        assert_eq!(wall_obstacles(&scene, wall).unwrap(), vec![front, back]);
        assert!(scene.has_tag(front, ObjectTag::Obstacle));
    }
}
