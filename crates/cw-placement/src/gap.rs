//! Free space along a wall
//!
//! Objects on a wall occupy X-intervals in the wall's local frame. The gap a
//! new object goes into is the free stretch around the cursor, and the
//! object snaps flush to either end of it when close enough.

use std::f32::consts::PI;

use cw_core::{ObjectTag, ROTATION_TOLERANCE, Scene, SceneResult, WallFace, normalize_angle};
use uuid::Uuid;

/// Occupied stretch along a wall, in wall-local X
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub start: f32,
    pub end: f32,
}

impl Interval {
    pub fn new(start: f32, end: f32) -> Self {
        Self { start, end }
    }
}

/// Free gap containing the cursor, and where an object snaps inside it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementGap {
    pub start: f32,
    pub end: f32,
    /// Left edge of the snapped object
    pub snap_x: f32,
}

impl PlacementGap {
    pub fn width(&self) -> f32 {
        (self.end - self.start).max(0.0)
    }

    pub fn center(&self) -> f32 {
        (self.start + self.end) / 2.0
    }
}

/// Which face of its wall a child sits on
pub fn face_of(rotation_z: f32) -> WallFace {
    if (normalize_angle(rotation_z).abs() - PI).abs() < ROTATION_TOLERANCE {
        WallFace::Back
    } else {
        WallFace::Front
    }
}

fn overlaps(a: (f32, f32), b: (f32, f32)) -> bool {
    a.0 < b.1 && b.0 < a.1
}

/// Occupied intervals on one face of a wall, sorted by start.
///
/// Door and window openings cut through the wall, so they block both faces.
/// `face: None` collects every child regardless of face. Only objects whose
/// vertical extent overlaps `z_range` count.
pub fn occupied_intervals(
    scene: &Scene,
    wall: Uuid,
    face: Option<WallFace>,
    z_range: (f32, f32),
    exclude: &[Uuid],
) -> SceneResult<Vec<Interval>> {
    scene.wall(wall)?;

    let mut intervals = Vec::new();
    for &child in scene.children(wall) {
        if exclude.contains(&child) {
            continue;
        }
        let Some(object) = scene.get(child) else {
            continue;
        };
        if object.has_tag(ObjectTag::EndAnchor) || object.has_tag(ObjectTag::Preview) {
            continue;
        }
        let Some(dims) = object.dimensions() else {
            continue;
        };

        let child_face = face_of(object.transform.rotation_z);
        let blocks_both = object.tags.is_opening();
        if let Some(face) = face
            && !blocks_both
            && child_face != face
        {
            continue;
        }

        let z = object.transform.location.z;
        if !overlaps((z, z + dims.z), z_range) {
            continue;
        }

        let x = object.transform.location.x;
        let interval = match child_face {
            WallFace::Front => Interval::new(x, x + dims.x),
            // Turned around: local X runs right to left
            WallFace::Back => Interval::new(x - dims.x, x),
        };
        intervals.push(interval);
    }

    intervals.sort_by(|a, b| a.start.total_cmp(&b.start));
    Ok(intervals)
}

/// Left edge for an object of `width` in `[start, end]` following the cursor
pub fn snap_within_gap(start: f32, end: f32, cursor_x: f32, width: f32) -> f32 {
    let half = width / 2.0;
    if width >= end - start {
        start
    } else if cursor_x - start < half {
        start
    } else if end - cursor_x < half {
        end - width
    } else {
        cursor_x - half
    }
}

/// Gap containing `cursor_x` given sorted occupied intervals.
///
/// A cursor past every object (or inside one) gets the gap after the last
/// object it has passed.
pub fn find_placement_gap(
    intervals: &[Interval],
    wall_length: f32,
    cursor_x: f32,
    width: f32,
) -> PlacementGap {
    let mut gap_start = 0.0_f32;
    for interval in intervals {
        if cursor_x < interval.start && interval.start > gap_start {
            let end = interval.start;
            return PlacementGap {
                start: gap_start,
                end,
                snap_x: snap_within_gap(gap_start, end, cursor_x, width),
            };
        }
        gap_start = gap_start.max(interval.end);
    }

    let end = wall_length.max(gap_start);
    PlacementGap {
        start: gap_start,
        end,
        snap_x: snap_within_gap(gap_start, end, cursor_x, width),
    }
}

/// Number of equal objects needed so none exceeds `max_width`
pub fn auto_quantity(gap_width: f32, max_width: f32) -> usize {
    if max_width <= 0.0 || gap_width <= 0.0 {
        return 1;
    }
    // Slack keeps an exact multiple (72 / 36) from rounding up
    ((gap_width / max_width) - 1e-4).ceil().max(1.0) as usize
}
