//! Point-to-point wall drawing
//!
//! The first click sets the start point. Each further click confirms the
//! live wall and starts the next one at its end, connected to it. Clicking
//! back on the first wall's start closes the room.

use std::f32::consts::{FRAC_PI_2, PI};

use cw_core::units::snap_to_grid;
use cw_core::{
    Scene, SceneResult, Settings, WALL_JOINT_TOLERANCE, format_distance, normalize_angle,
};
use glam::Vec2;
use tracing::{debug, info};
use uuid::Uuid;

use crate::event::{InputEvent, Key, ModalStatus, Pointer};
use crate::pending::PendingObjects;
use crate::status::{StatusMessage, report_error};
use crate::target::pointer_point;
use crate::typing::{TypedInput, TypingOutcome, TypingTarget, starts_typing};

const SNAP_ANGLES: [f32; 4] = [0.0, FRAC_PI_2, PI, -FRAC_PI_2];

/// Closest of the four axis directions
pub fn snap_angle(angle: f32) -> f32 {
    let angle = normalize_angle(angle);
    SNAP_ANGLES
        .into_iter()
        .min_by(|a, b| {
            normalize_angle(angle - a)
                .abs()
                .total_cmp(&normalize_angle(angle - b).abs())
        })
        .unwrap_or(0.0)
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawState {
    WaitingForStart,
    Drawing,
    Typing(TypedInput),
    Finished,
    Cancelled,
}

#[derive(Debug)]
pub struct WallDrawing {
    state: DrawState,
    /// Start of the live wall
    start: Vec2,
    rotation: f32,
    length: f32,
    /// Length from before typing started
    saved_length: Option<f32>,
    current: Option<Uuid>,
    confirmed: Vec<Uuid>,
    pending: PendingObjects,
    last_point: Option<Vec2>,
    header: String,
    status: Option<StatusMessage>,
}

impl Default for WallDrawing {
    fn default() -> Self {
        Self::new()
    }
}

impl WallDrawing {
    pub fn new() -> Self {
        Self {
            state: DrawState::WaitingForStart,
            start: Vec2::ZERO,
            rotation: 0.0,
            length: 0.0,
            saved_length: None,
            current: None,
            confirmed: Vec::new(),
            pending: PendingObjects::new(),
            last_point: None,
            header: "Click to set the wall start".to_string(),
            status: None,
        }
    }

    pub fn state(&self) -> &DrawState {
        &self.state
    }

    /// Walls confirmed so far, in drawing order
    pub fn confirmed(&self) -> &[Uuid] {
        &self.confirmed
    }

    /// The wall following the pointer
    pub fn current(&self) -> Option<Uuid> {
        self.current
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn take_status(&mut self) -> Option<StatusMessage> {
        self.status.take()
    }

    pub fn handle_event(
        &mut self,
        scene: &mut Scene,
        settings: &Settings,
        event: InputEvent,
    ) -> ModalStatus {
        if matches!(self.state, DrawState::Finished | DrawState::Cancelled) {
            return ModalStatus::PassThrough;
        }

        let result = match event {
            InputEvent::PointerMoved(pointer) => self.pointer_moved(scene, settings, &pointer),
            InputEvent::Click => self.click(scene, settings),
            InputEvent::RightClick => self.finish(scene),
            InputEvent::Key(key) => self.handle_key(scene, settings, key),
            InputEvent::Timer => Ok(ModalStatus::PassThrough),
        };
        let status = result.unwrap_or_else(|e| {
            report_error(&mut self.status, e);
            ModalStatus::Running
        });
        self.header = self.header_text(settings);
        status
    }

    fn pointer_moved(
        &mut self,
        scene: &mut Scene,
        settings: &Settings,
        pointer: &Pointer,
    ) -> SceneResult<ModalStatus> {
        let Some(point) = pointer_point(pointer, &settings.snap) else {
            return Ok(ModalStatus::Running);
        };
        let point = point.truncate();
        self.last_point = Some(point);

        // Typed length wins over the pointer
        if self.state != DrawState::Drawing {
            return Ok(ModalStatus::Running);
        }

        let delta = point - self.start;
        if delta.length() > f32::EPSILON {
            self.rotation = snap_angle(delta.y.atan2(delta.x));
        }
        let along = delta.dot(Vec2::from_angle(self.rotation)).max(0.0);
        self.length = snap_to_grid(along, settings.snap.grid_spacing);
        self.update_live_wall(scene)?;
        Ok(ModalStatus::Running)
    }

    fn update_live_wall(&mut self, scene: &mut Scene) -> SceneResult<()> {
        let Some(current) = self.current else {
            return Ok(());
        };
        scene.set_wall_geometry(current, self.rotation, self.length)?;
        scene.recompute_miters(current)?;
        if let Some(&previous) = self.confirmed.last() {
            scene.recompute_miters(previous)?;
        }
        Ok(())
    }

    fn click(&mut self, scene: &mut Scene, settings: &Settings) -> SceneResult<ModalStatus> {
        match &self.state {
            DrawState::WaitingForStart => {
                let Some(point) = self.last_point else {
                    return Ok(ModalStatus::Running);
                };
                let grid = settings.snap.grid_spacing;
                self.start = Vec2::new(snap_to_grid(point.x, grid), snap_to_grid(point.y, grid));
                self.length = 0.0;
                self.start_wall(scene, settings)?;
                self.state = DrawState::Drawing;
                debug!("Wall drawing started at {:?}", self.start);
                Ok(ModalStatus::Running)
            }
            DrawState::Typing(input) => {
                let value = input.value(&settings.units);
                self.commit_typed(scene, settings, value)
            }
            _ => self.confirm(scene, settings),
        }
    }

    fn start_wall(&mut self, scene: &mut Scene, settings: &Settings) -> SceneResult<Uuid> {
        let wall = scene.add_wall(
            self.start,
            self.rotation,
            self.length,
            settings.wall_thickness,
            settings.wall_height,
        )?;
        self.pending.push(wall);
        if let Some(&previous) = self.confirmed.last() {
            scene.connect_walls(wall, previous);
        }
        self.current = Some(wall);
        Ok(wall)
    }

    /// Keep the live wall and start the next one at its end, or close the
    /// room when the pointer is back on the first wall's start.
    fn confirm(&mut self, scene: &mut Scene, settings: &Settings) -> SceneResult<ModalStatus> {
        let Some(current) = self.current else {
            return Ok(ModalStatus::Running);
        };

        if self.confirmed.len() >= 2
            && let Some(&first) = self.confirmed.first()
        {
            let origin = scene.wall(first)?.start;
            let end = scene.wall(current)?.end();
            let near_origin = |p: Vec2| p.distance(origin) <= WALL_JOINT_TOLERANCE;
            if near_origin(end) || self.last_point.is_some_and(near_origin) {
                scene.close_loop(current, first)?;
                self.pending.remove(current);
                self.confirmed.push(current);
                self.current = None;
                info!("Closed room with {} walls", self.confirmed.len());
                self.status = Some(StatusMessage::info(format!(
                    "Closed room with {} walls",
                    self.confirmed.len()
                )));
                self.state = DrawState::Finished;
                return Ok(ModalStatus::Finished);
            }
        }

        if self.length <= WALL_JOINT_TOLERANCE {
            self.status = Some(StatusMessage::warning("Wall is too short"));
            return Ok(ModalStatus::Running);
        }

        self.advance(scene, settings, current)?;
        Ok(ModalStatus::Running)
    }

    /// Confirm `current` and start the next wall at its end
    fn advance(&mut self, scene: &mut Scene, settings: &Settings, current: Uuid) -> SceneResult<()> {
        self.pending.remove(current);
        self.confirmed.push(current);
        scene.recompute_miters(current)?;

        self.start = scene.wall(current)?.end();
        self.length = 0.0;
        self.start_wall(scene, settings)?;
        debug!(
            "Confirmed wall {} ({} total)",
            current,
            self.confirmed.len()
        );
        Ok(())
    }

    fn handle_key(
        &mut self,
        scene: &mut Scene,
        settings: &Settings,
        key: Key,
    ) -> SceneResult<ModalStatus> {
        if let DrawState::Typing(input) = &mut self.state {
            return match input.handle_key(key, &settings.units) {
                TypingOutcome::Preview(value) => {
                    self.length = value.or(self.saved_length).unwrap_or(self.length);
                    self.update_live_wall(scene)?;
                    Ok(ModalStatus::Running)
                }
                TypingOutcome::Commit(value) => self.commit_typed(scene, settings, value),
                TypingOutcome::Exit => {
                    self.restore_length(scene)?;
                    Ok(ModalStatus::Running)
                }
                TypingOutcome::Ignored => Ok(ModalStatus::Running),
            };
        }

        match key {
            Key::Escape => Ok(self.cancel(scene)),
            Key::Enter => self.finish(scene),
            Key::Char(c) if self.state == DrawState::Drawing && starts_typing(c) => {
                self.saved_length = Some(self.length);
                self.state = DrawState::Typing(TypedInput::new(TypingTarget::Length));
                self.handle_key(scene, settings, key)
            }
            _ => Ok(ModalStatus::PassThrough),
        }
    }

    fn restore_length(&mut self, scene: &mut Scene) -> SceneResult<()> {
        if let Some(length) = self.saved_length.take() {
            self.length = length;
        }
        self.state = DrawState::Drawing;
        self.update_live_wall(scene)
    }

    /// Apply a typed length and confirm the wall as typed, without closing
    /// onto the first wall
    fn commit_typed(
        &mut self,
        scene: &mut Scene,
        settings: &Settings,
        value: Option<f32>,
    ) -> SceneResult<ModalStatus> {
        let Some(length) = value.filter(|v| *v > 0.0) else {
            self.status = Some(StatusMessage::warning("Invalid length"));
            self.restore_length(scene)?;
            return Ok(ModalStatus::Running);
        };
        self.saved_length = None;
        self.state = DrawState::Drawing;
        self.length = length;
        self.update_live_wall(scene)?;

        if let Some(current) = self.current {
            self.advance(scene, settings, current)?;
        }
        Ok(ModalStatus::Running)
    }

    /// Keep confirmed walls, drop the live one
    fn finish(&mut self, scene: &mut Scene) -> SceneResult<ModalStatus> {
        if self.state == DrawState::WaitingForStart {
            return Ok(self.cancel(scene));
        }
        self.pending.rollback(scene);
        self.current = None;
        if let Some(&last) = self.confirmed.last() {
            scene.recompute_miters(last)?;
        }
        info!("Finished drawing {} wall(s)", self.confirmed.len());
        self.status = Some(StatusMessage::info(format!(
            "Drew {} wall(s)",
            self.confirmed.len()
        )));
        self.state = DrawState::Finished;
        Ok(ModalStatus::Finished)
    }

    /// Delete every wall of this session
    pub fn cancel(&mut self, scene: &mut Scene) -> ModalStatus {
        self.pending.rollback(scene);
        for wall in self.confirmed.drain(..).rev() {
            if scene.contains(wall)
                && let Err(e) = scene.delete_wall(wall)
            {
                report_error(&mut self.status, e);
            }
        }
        self.current = None;
        info!("Cancelled wall drawing");
        self.status = Some(StatusMessage::info("Wall drawing cancelled"));
        self.state = DrawState::Cancelled;
        ModalStatus::Cancelled
    }

    fn header_text(&self, settings: &Settings) -> String {
        match &self.state {
            DrawState::WaitingForStart => "Click to set the wall start".to_string(),
            DrawState::Finished | DrawState::Cancelled => String::new(),
            state => {
                let mut parts = vec![
                    format!("Wall {}", self.confirmed.len() + 1),
                    format!("Length: {}", format_distance(self.length, &settings.units)),
                    format!("Angle: {:.0}", self.rotation.to_degrees()),
                ];
                if let DrawState::Typing(input) = state {
                    parts.push(input.prompt());
                }
                parts.join(" | ")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cw_core::NeighborSide;
    use glam::Vec3;

    fn settings() -> Settings {
        Settings::default().with_grid_spacing(0.0)
    }

    fn move_to(x: f32, y: f32) -> InputEvent {
        InputEvent::PointerMoved(Pointer::on_floor(Vec3::new(x, y, 0.0)))
    }

    fn run(drawing: &mut WallDrawing, scene: &mut Scene, settings: &Settings, events: &[InputEvent]) -> ModalStatus {
        let mut status = ModalStatus::Running;
        for event in events {
            status = drawing.handle_event(scene, settings, *event);
        }
        status
    }

    #[test]
    fn test_snap_angle() {
        assert_eq!(snap_angle(0.2), 0.0);
        assert_eq!(snap_angle(1.4), FRAC_PI_2);
        assert_eq!(snap_angle(-1.7), -FRAC_PI_2);
        assert_eq!(snap_angle(3.0), PI);
        assert_eq!(snap_angle(-3.0), PI);
    }

    #[test]
    fn test_draws_connected_walls() {
        let settings = settings();
        let mut scene = Scene::new();
        let mut drawing = WallDrawing::new();
        let status = run(
            &mut drawing,
            &mut scene,
            &settings,
            &[
                move_to(0.0, 0.0),
                InputEvent::Click,
                move_to(2.0, 0.1),
                InputEvent::Click,
                move_to(2.2, 1.5),
                InputEvent::Click,
            ],
        );
        assert_eq!(status, ModalStatus::Running);
        assert_eq!(drawing.confirmed().len(), 2);
        let (a, b) = (drawing.confirmed()[0], drawing.confirmed()[1]);
        let a_info = scene.wall(a).unwrap();
        assert_relative_eq!(a_info.length, 2.0, epsilon = 1e-5);
        assert_eq!(a_info.rotation, 0.0);
        let b_info = scene.wall(b).unwrap();
        assert_relative_eq!(b_info.length, 1.5, epsilon = 1e-5);
        assert_relative_eq!(b_info.start.x, 2.0, epsilon = 1e-5);
        assert_eq!(scene.wall_neighbor(b, NeighborSide::Left), Some(a));
        assert_eq!(
            scene.wall_neighbor(b, NeighborSide::Right),
            drawing.current()
        );

        // Right click keeps the two walls and drops the live one
        let status = drawing.handle_event(&mut scene, &settings, InputEvent::RightClick);
        assert_eq!(status, ModalStatus::Finished);
        assert_eq!(scene.walls().len(), 2);
        assert_eq!(scene.wall_neighbor(b, NeighborSide::Right), None);
        assert_eq!(scene.wall(b).unwrap().right_angle, 0.0);
    }

    #[test]
    fn test_typed_length() {
        let settings = settings();
        let mut scene = Scene::new();
        let mut drawing = WallDrawing::new();
        run(
            &mut drawing,
            &mut scene,
            &settings,
            &[
                move_to(0.0, 0.0),
                InputEvent::Click,
                move_to(0.0, 0.8),
                InputEvent::Key(Key::Char('4')),
                InputEvent::Key(Key::Char('8')),
            ],
        );
        assert!(drawing.header().ends_with("Length: 48_"));
        // Pointer moves do not override a length being typed
        drawing.handle_event(&mut scene, &settings, move_to(0.0, 2.0));
        drawing.handle_event(&mut scene, &settings, InputEvent::Key(Key::Enter));

        let wall = drawing.confirmed()[0];
        let info = scene.wall(wall).unwrap();
        assert_relative_eq!(info.length, cw_core::inch(48.0), epsilon = 1e-6);
        assert_relative_eq!(info.rotation, FRAC_PI_2);
        assert_eq!(drawing.state(), &DrawState::Drawing);
    }

    #[test]
    fn test_escape_deletes_session_walls() {
        let settings = settings();
        let mut scene = Scene::new();
        let existing = scene.add_wall(Vec2::new(5.0, 5.0), 0.0, 1.0, 0.1, 2.4).unwrap();
        let mut drawing = WallDrawing::new();
        let status = run(
            &mut drawing,
            &mut scene,
            &settings,
            &[
                move_to(0.0, 0.0),
                InputEvent::Click,
                move_to(1.0, 0.0),
                InputEvent::Click,
                move_to(1.0, 1.0),
                InputEvent::Key(Key::Escape),
            ],
        );
        assert_eq!(status, ModalStatus::Cancelled);
        assert_eq!(scene.walls(), vec![existing]);
    }

    #[test]
    fn test_short_wall_is_not_confirmed() {
        let settings = settings();
        let mut scene = Scene::new();
        let mut drawing = WallDrawing::new();
        run(
            &mut drawing,
            &mut scene,
            &settings,
            &[move_to(0.0, 0.0), InputEvent::Click, InputEvent::Click],
        );
        assert!(drawing.confirmed().is_empty());
        assert_eq!(drawing.status().unwrap().text, "Wall is too short");
    }
}
