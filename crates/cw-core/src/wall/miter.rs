//! Miter angles at wall joints

use std::f32::consts::{PI, TAU};

use tracing::{debug, info};
use uuid::Uuid;

use super::NeighborSide;
use crate::scene::{Scene, SceneResult};

/// Wrap an angle into (-π, π]
pub fn normalize_angle(angle: f32) -> f32 {
    let mut angle = angle;
    while angle > PI {
        angle -= TAU;
    }
    while angle <= -PI {
        angle += TAU;
    }
    angle
}

impl Scene {
    /// Set both miter inputs of a wall from its current neighbors.
    ///
    /// Each end takes half the direction change at its joint; a side with no
    /// neighbor gets a square cut.
    pub fn recompute_miters(&mut self, wall: Uuid) -> SceneResult<()> {
        let info = self.wall(wall)?;

        let left_angle = self
            .wall_neighbor(wall, NeighborSide::Left)
            .and_then(|prev| self.wall(prev).ok())
            .map(|prev| normalize_angle(info.rotation - prev.rotation) / 2.0)
            .unwrap_or(0.0);
        let right_angle = self
            .wall_neighbor(wall, NeighborSide::Right)
            .and_then(|next| self.wall(next).ok())
            .map(|next| -normalize_angle(next.rotation - info.rotation) / 2.0)
            .unwrap_or(0.0);

        self.set_input(wall, "Left Angle", left_angle)?;
        self.set_input(wall, "Right Angle", right_angle)?;
        debug!(
            "Wall {} miters: left {:.4}, right {:.4}",
            wall, left_angle, right_angle
        );
        Ok(())
    }

    /// Recompute miters on every wall
    pub fn recompute_all_miters(&mut self) -> SceneResult<()> {
        for wall in self.walls() {
            self.recompute_miters(wall)?;
        }
        Ok(())
    }

    /// Finish a room: aim `last` at `first`'s origin, make `first` follow
    /// `last`'s end, and recompute the two new joints.
    pub fn close_loop(&mut self, last: Uuid, first: Uuid) -> SceneResult<()> {
        let last_info = self.wall(last)?;
        let first_info = self.wall(first)?;

        let delta = first_info.start - last_info.start;
        let length = delta.length();
        let rotation = if length > f32::EPSILON {
            delta.y.atan2(delta.x)
        } else {
            last_info.rotation
        };
        self.set_wall_geometry(last, rotation, length)?;

        if self.wall_neighbor(first, NeighborSide::Left) != Some(last) {
            self.disconnect_wall(first);
            self.connect_walls(first, last);
        }

        let mut affected = vec![last, first];
        affected.extend(self.wall_neighbor(last, NeighborSide::Left));
        affected.extend(self.wall_neighbor(first, NeighborSide::Right));
        affected.dedup();
        for wall in affected {
            self.recompute_miters(wall)?;
        }

        info!(
            "Closed loop from wall {} back to {} (closing length {:.4})",
            last, first, length
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::Vec2;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

    fn wall(scene: &mut Scene, start: Vec2, rotation: f32, length: f32) -> Uuid {
        scene.add_wall(start, rotation, length, 0.1, 2.4).unwrap()
    }

    #[test]
    fn test_normalize_angle() {
        assert_relative_eq!(normalize_angle(3.0 * PI / 2.0), -FRAC_PI_2, epsilon = 1e-6);
        assert_relative_eq!(normalize_angle(-PI), PI, epsilon = 1e-6);
        assert_relative_eq!(normalize_angle(PI), PI, epsilon = 1e-6);
        assert_relative_eq!(normalize_angle(5.0 * TAU + 0.25), 0.25, epsilon = 1e-4);
    }

    #[test]
    fn test_isolated_wall_has_square_cuts() {
        let mut scene = Scene::new();
        let a = wall(&mut scene, Vec2::ZERO, 0.4, 2.0);
        scene.recompute_miters(a).unwrap();
        let info = scene.wall(a).unwrap();
        assert_eq!(info.left_angle, 0.0);
        assert_eq!(info.right_angle, 0.0);
    }

    #[test]
    fn test_right_turn_joint() {
        let mut scene = Scene::new();
        let a = wall(&mut scene, Vec2::ZERO, 0.0, 3.0);
        let b = wall(&mut scene, Vec2::ZERO, -FRAC_PI_2, 2.0);
        scene.connect_walls(b, a);
        scene.recompute_all_miters().unwrap();

        assert_relative_eq!(scene.wall(a).unwrap().right_angle, FRAC_PI_4, epsilon = 1e-6);
        assert_relative_eq!(scene.wall(b).unwrap().left_angle, -FRAC_PI_4, epsilon = 1e-6);
    }

    #[test]
    fn test_interior_joints_are_opposite() {
        let mut scene = Scene::new();
        let rotations = [0.0, 0.7, -1.2, 2.9, -3.0];
        let mut previous = None;
        let mut walls = Vec::new();
        for rotation in rotations {
            let w = wall(&mut scene, Vec2::ZERO, rotation, 1.0);
            if let Some(prev) = previous {
                scene.connect_walls(w, prev);
            }
            previous = Some(w);
            walls.push(w);
        }
        scene.recompute_all_miters().unwrap();

        for pair in walls.windows(2) {
            let prev = scene.wall(pair[0]).unwrap();
            let next = scene.wall(pair[1]).unwrap();
            assert_relative_eq!(next.left_angle, -prev.right_angle, epsilon = 1e-6);
            assert!(next.left_angle.abs() <= FRAC_PI_2 + 1e-6);
        }
    }

    #[test]
    fn test_close_triangle_room() {
        let mut scene = Scene::new();
        let a = wall(&mut scene, Vec2::ZERO, 0.0, 3.0);
        let b = wall(&mut scene, Vec2::ZERO, FRAC_PI_2, 2.0);
        scene.connect_walls(b, a);
        let c = wall(&mut scene, Vec2::ZERO, PI, 1.0);
        scene.connect_walls(c, b);
        scene.close_loop(c, a).unwrap();

        assert_eq!(scene.wall_neighbor(a, NeighborSide::Right), Some(b));
        assert_eq!(scene.wall_neighbor(b, NeighborSide::Left), Some(a));
        assert_eq!(scene.wall_neighbor(b, NeighborSide::Right), Some(c));
        assert_eq!(scene.wall_neighbor(c, NeighborSide::Left), Some(b));
        assert_eq!(scene.wall_neighbor(a, NeighborSide::Left), Some(c));

        let c_info = scene.wall(c).unwrap();
        assert_relative_eq!(c_info.length, 13.0_f32.sqrt(), epsilon = 1e-5);
        assert_relative_eq!(c_info.end().x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(c_info.end().y, 0.0, epsilon = 1e-5);

        let infos = [a, b, c].map(|w| scene.wall(w).unwrap());
        assert_relative_eq!(infos[0].left_angle, 1.276_795, epsilon = 1e-4);
        assert_relative_eq!(infos[1].left_angle, FRAC_PI_4, epsilon = 1e-5);
        assert_relative_eq!(infos[2].left_angle, 1.079_4, epsilon = 1e-4);

        for i in 0..3 {
            let current = infos[i];
            let previous = infos[(i + 2) % 3];
            assert!(current.left_angle != 0.0);
            assert!(current.right_angle != 0.0);
            assert_relative_eq!(current.left_angle, -previous.right_angle, epsilon = 1e-5);
        }

        let total_turn: f32 = infos.iter().map(|w| w.left_angle * 2.0).sum();
        assert_relative_eq!(total_turn, TAU, epsilon = 1e-4);

        // First wall did not move
        assert_eq!(infos[0].start, Vec2::ZERO);
    }
}
