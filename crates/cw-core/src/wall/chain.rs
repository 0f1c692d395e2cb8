//! Partition walls into chains by matching end points to start points

use std::collections::HashSet;

use uuid::Uuid;

use super::WallInfo;
use crate::constants::WALL_JOINT_TOLERANCE;
use crate::scene::Scene;

impl Scene {
    /// Group walls into connected runs.
    ///
    /// A wall follows another when its start lies within 1 cm of the other's
    /// end. Chains start at a wall nothing leads into; a closed room has no
    /// such wall and starts at its earliest-created wall instead.
    pub fn find_wall_chains(&self) -> Vec<Vec<Uuid>> {
        let walls: Vec<WallInfo> = self
            .walls()
            .into_iter()
            .filter_map(|id| self.wall(id).ok())
            .collect();

        let next_of = |wall: &WallInfo| {
            walls.iter().find(|other| {
                other.id != wall.id && other.start.distance(wall.end()) <= WALL_JOINT_TOLERANCE
            })
        };
        let has_predecessor = |wall: &WallInfo| {
            walls.iter().any(|other| {
                other.id != wall.id && wall.start.distance(other.end()) <= WALL_JOINT_TOLERANCE
            })
        };

        let mut visited: HashSet<Uuid> = HashSet::new();
        let mut chains = Vec::new();

        let starts = walls
            .iter()
            .filter(|w| !has_predecessor(w))
            .chain(walls.iter());

        for start in starts {
            if visited.contains(&start.id) {
                continue;
            }
            let mut chain = Vec::new();
            let mut current = Some(start);
            while let Some(wall) = current {
                if !visited.insert(wall.id) {
                    break;
                }
                chain.push(wall.id);
                current = next_of(wall);
            }
            chains.push(chain);
        }
        chains
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn wall(scene: &mut Scene, start: Vec2, rotation: f32, length: f32) -> Uuid {
        scene.add_wall(start, rotation, length, 0.1, 2.4).unwrap()
    }

    #[test]
    fn test_open_chain_starts_at_root() {
        let mut scene = Scene::new();
        // Created out of order on purpose
        let b = wall(&mut scene, Vec2::new(3.0, 0.0), FRAC_PI_2, 2.0);
        let a = wall(&mut scene, Vec2::ZERO, 0.0, 3.0);
        let lone = wall(&mut scene, Vec2::new(10.0, 10.0), 0.0, 1.0);

        let chains = scene.find_wall_chains();
        assert_eq!(chains, vec![vec![a, b], vec![lone]]);
    }

    #[test]
    fn test_closed_room_starts_at_earliest_wall() {
        let mut scene = Scene::new();
        let a = wall(&mut scene, Vec2::ZERO, 0.0, 2.0);
        let b = wall(&mut scene, Vec2::new(2.0, 0.0), FRAC_PI_2, 2.0);
        let c = wall(&mut scene, Vec2::new(2.0, 2.0), PI, 2.0);
        let d = wall(&mut scene, Vec2::new(0.0, 2.0), -FRAC_PI_2, 2.0);

        assert_eq!(scene.find_wall_chains(), vec![vec![a, b, c, d]]);
    }

    #[test]
    fn test_tolerance_is_one_centimeter() {
        let mut scene = Scene::new();
        let a = wall(&mut scene, Vec2::ZERO, 0.0, 1.0);
        let near = wall(&mut scene, Vec2::new(1.005, 0.0), 0.0, 1.0);
        let far = wall(&mut scene, Vec2::new(2.03, 0.0), 0.0, 1.0);

        assert_eq!(scene.find_wall_chains(), vec![vec![a, near], vec![far]]);
    }
}
