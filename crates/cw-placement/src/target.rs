//! Which wall the pointer is over, and which face of it

use cw_core::{ObjectTag, Scene, SnapSettings, WallFace};
use glam::Vec3;
use uuid::Uuid;

use crate::event::Pointer;

/// Pointer resolved against a wall
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallTarget {
    pub wall: Uuid,
    /// Pointer position in the wall's local frame
    pub local: Vec3,
    pub face: WallFace,
}

/// Whether the camera looks down on the floor plan
pub fn is_plan_view(pointer: &Pointer, snap: &SnapSettings) -> bool {
    pointer.view_dir.normalize_or_zero().z.abs() > snap.plan_view_threshold
}

/// World point to track: the floor projection in plan view, the raycast hit
/// otherwise, each falling back to the other.
pub fn pointer_point(pointer: &Pointer, snap: &SnapSettings) -> Option<Vec3> {
    let hit = pointer.hit.map(|h| h.location);
    if is_plan_view(pointer, snap) {
        pointer.floor.or(hit)
    } else {
        hit.or(pointer.floor)
    }
}

/// Wall under the pointer: the hit object's wall ancestor, else the nearest
/// wall footprint within `wall_pick_distance` of the floor point.
pub fn wall_under_pointer(scene: &Scene, pointer: &Pointer, snap: &SnapSettings) -> Option<Uuid> {
    if let Some(hit) = pointer.hit
        && let Some(wall) = scene.find_ancestor(hit.object, |o| o.has_tag(ObjectTag::Wall))
    {
        return Some(wall);
    }

    let floor = pointer.floor?;
    scene
        .walls()
        .into_iter()
        .filter_map(|wall| {
            let info = scene.wall(wall).ok()?;
            let local = scene.to_local(wall, floor).ok()?;
            // Distance from the footprint rectangle, zero inside it
            let dx = (-local.x).max(local.x - info.length).max(0.0);
            let dy = (-local.y).max(local.y - info.thickness).max(0.0);
            let distance = dx.hypot(dy);
            (distance <= snap.wall_pick_distance).then_some((wall, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(wall, _)| wall)
}

/// Face picker with a dead band around the wall centerline so the face does
/// not flicker while the pointer sits on it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SideDetector {
    face: WallFace,
}

impl SideDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn face(&self) -> WallFace {
        self.face
    }

    pub fn update(&mut self, local_y: f32, thickness: f32, hysteresis: f32) -> WallFace {
        let center = thickness / 2.0;
        if local_y < center - hysteresis {
            self.face = WallFace::Front;
        } else if local_y > center + hysteresis {
            self.face = WallFace::Back;
        }
        self.face
    }
}

/// Resolve the pointer to a wall, its local position and a face
pub fn resolve_wall_target(
    scene: &Scene,
    pointer: &Pointer,
    snap: &SnapSettings,
    side: &mut SideDetector,
) -> Option<WallTarget> {
    let wall = wall_under_pointer(scene, pointer, snap)?;
    let point = pointer_point(pointer, snap)?;
    let info = scene.wall(wall).ok()?;
    let local = scene.to_local(wall, point).ok()?;
    let face = side.update(local.y, info.thickness, snap.side_hysteresis);
    Some(WallTarget { wall, local, face })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::SurfaceHit;
    use approx::assert_relative_eq;
    use cw_core::inch;
    use glam::Vec2;
    use std::f32::consts::FRAC_PI_2;

    fn room() -> (Scene, Uuid, Uuid) {
        let mut scene = Scene::new();
        let a = scene
            .add_wall(Vec2::ZERO, 0.0, 3.0, inch(4.5), 2.4)
            .unwrap();
        let b = scene
            .add_wall(Vec2::new(3.0, 0.0), FRAC_PI_2, 2.0, inch(4.5), 2.4)
            .unwrap();
        (scene, a, b)
    }

    #[test]
    fn test_view_dependent_point() {
        let snap = SnapSettings::default();
        let hit = Vec3::new(1.0, 0.0, 0.5);
        let floor = Vec3::new(1.0, -0.3, 0.0);
        let mut pointer = Pointer {
            hit: Some(SurfaceHit {
                object: Uuid::new_v4(),
                location: hit,
            }),
            floor: Some(floor),
            view_dir: Vec3::NEG_Z,
        };
        assert_eq!(pointer_point(&pointer, &snap), Some(floor));

        pointer.view_dir = Vec3::new(0.0, 1.0, -0.3);
        assert_eq!(pointer_point(&pointer, &snap), Some(hit));

        pointer.hit = None;
        assert_eq!(pointer_point(&pointer, &snap), Some(floor));
    }

    #[test]
    fn test_wall_from_hit_ancestor() {
        let (mut scene, a, _) = room();
        let cage = scene.create("Cage", ObjectTag::Cage);
        scene.set_parent(cage, Some(a), false).unwrap();
        let pointer = Pointer::on_object(cage, Vec3::new(1.0, -0.1, 0.3));
        assert_eq!(wall_under_pointer(&scene, &pointer, &SnapSettings::default()), Some(a));
    }

    #[test]
    fn test_nearest_wall_from_floor() {
        let (scene, a, b) = room();
        let snap = SnapSettings::default();

        let near_a = Pointer::on_floor(Vec3::new(1.5, -inch(3.0), 0.0));
        assert_eq!(wall_under_pointer(&scene, &near_a, &snap), Some(a));

        let near_b = Pointer::on_floor(Vec3::new(3.0 - inch(2.0), 1.0, 0.0));
        assert_eq!(wall_under_pointer(&scene, &near_b, &snap), Some(b));

        let far = Pointer::on_floor(Vec3::new(1.5, 1.0, 0.0));
        assert_eq!(wall_under_pointer(&scene, &far, &snap), None);
    }

    #[test]
    fn test_side_hysteresis() {
        let thickness = inch(4.5);
        let band = inch(1.0);
        let mut side = SideDetector::new();
        assert_eq!(side.update(-0.05, thickness, band), WallFace::Front);
        // Inside the dead band: keep the current face
        assert_eq!(side.update(thickness / 2.0 + inch(0.5), thickness, band), WallFace::Front);
        assert_eq!(side.update(thickness + 0.05, thickness, band), WallFace::Back);
        assert_eq!(side.update(thickness / 2.0 - inch(0.5), thickness, band), WallFace::Back);
        assert_eq!(side.update(0.0, thickness, band), WallFace::Front);
    }

    #[test]
    fn test_resolve_target_in_wall_frame() {
        let (scene, _, b) = room();
        let snap = SnapSettings::default();
        let mut side = SideDetector::new();
        // Wall B runs along +Y, so its front (local -Y) faces world +X
        let outside = Pointer::on_floor(Vec3::new(3.0 + inch(5.0), 0.5, 0.0));
        let target = resolve_wall_target(&scene, &outside, &snap, &mut side).unwrap();
        assert_eq!(target.wall, b);
        assert_relative_eq!(target.local.x, 0.5, epsilon = 1e-5);
        assert_relative_eq!(target.local.y, -inch(5.0), epsilon = 1e-5);
        assert_eq!(target.face, WallFace::Front);

        let inside = Pointer::on_floor(Vec3::new(3.0 - inch(6.0), 0.5, 0.0));
        let target = resolve_wall_target(&scene, &inside, &snap, &mut side).unwrap();
        assert_eq!(target.wall, b);
        assert_eq!(target.face, WallFace::Back);
    }
}
