//! Door and window placement
//!
//! A single opening slides along the wall under the pointer. Openings go
//! through the wall, so every object on either face bounds the gap. On
//! commit the opening is recorded as a cut on its wall.

use cw_core::{
    ObjectTag, Product, ProductKind, ProductSpec, Scene, SceneResult, Settings, WALL_CUT_PREFIX,
    format_distance,
};
use glam::Vec3;
use tracing::{debug, info};
use uuid::Uuid;

use crate::cabinet::{PlacementParams, PlacementState};
use crate::event::{InputEvent, Key, ModalStatus, Pointer};
use crate::gap::{PlacementGap, find_placement_gap, occupied_intervals};
use crate::pending::PendingObjects;
use crate::status::{StatusMessage, report_error};
use crate::target::{SideDetector, resolve_wall_target};
use crate::typing::{TypedInput, TypingOutcome, TypingTarget, starts_typing};

/// Name of the boolean cut an opening makes in its wall
pub fn cut_name(scene: &Scene, opening: Uuid) -> Option<String> {
    scene
        .get(opening)
        .map(|o| format!("{}{}", WALL_CUT_PREFIX, o.name))
}

/// Resolved opening position on a wall
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpeningLayout {
    pub wall: Uuid,
    pub gap: PlacementGap,
    /// Left edge in wall-local X
    pub x: f32,
    pub width: f32,
    pub height: f32,
    pub z: f32,
}

#[derive(Debug)]
pub struct OpeningPlacement {
    spec: ProductSpec,
    state: PlacementState,
    params: PlacementParams,
    saved: Option<PlacementParams>,
    pending: PendingObjects,
    preview: Option<Uuid>,
    side: SideDetector,
    last_pointer: Option<Pointer>,
    layout: Option<OpeningLayout>,
    header: String,
    status: Option<StatusMessage>,
}

impl OpeningPlacement {
    pub fn new(kind: ProductKind, settings: &Settings) -> Self {
        let spec = ProductSpec::from_settings(kind, settings);
        Self {
            spec,
            state: PlacementState::Idle,
            params: PlacementParams::new(false),
            saved: None,
            pending: PendingObjects::new(),
            preview: None,
            side: SideDetector::new(),
            last_pointer: None,
            layout: None,
            header: format!("Place {}", kind.name()),
            status: None,
        }
    }

    pub fn state(&self) -> &PlacementState {
        &self.state
    }

    pub fn params(&self) -> &PlacementParams {
        &self.params
    }

    pub fn layout(&self) -> Option<&OpeningLayout> {
        self.layout.as_ref()
    }

    pub fn preview(&self) -> Option<Uuid> {
        self.preview
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
        if matches!(self.state, PlacementState::Finished | PlacementState::Cancelled) {
            return ModalStatus::PassThrough;
        }

        match event {
            InputEvent::PointerMoved(pointer) => {
                self.last_pointer = Some(pointer);
                if self.state == PlacementState::Idle {
                    self.state = PlacementState::Placing;
                }
                self.refresh(scene, settings);
                ModalStatus::Running
            }
            InputEvent::Click => {
                if let PlacementState::Typing(input) = &self.state {
                    let outcome = TypingOutcome::Commit(input.value(&settings.units));
                    let target = input.target;
                    self.handle_typing(scene, settings, target, outcome);
                }
                self.commit(scene)
            }
            InputEvent::RightClick => self.cancel(scene),
            InputEvent::Key(key) => self.handle_key(scene, settings, key),
            InputEvent::Timer => ModalStatus::PassThrough,
        }
    }

    fn handle_key(&mut self, scene: &mut Scene, settings: &Settings, key: Key) -> ModalStatus {
        if let PlacementState::Typing(input) = &mut self.state {
            let outcome = input.handle_key(key, &settings.units);
            let target = input.target;
            return self.handle_typing(scene, settings, target, outcome);
        }

        match key {
            Key::Enter => self.commit(scene),
            Key::Escape => self.cancel(scene),
            // Plain numbers position the opening
            Key::Char(c) if starts_typing(c) => {
                self.begin_typing(TypingTarget::OffsetX);
                self.handle_key(scene, settings, key)
            }
            other => match TypingTarget::from_key(other) {
                Some(TypingTarget::Depth) | None => ModalStatus::PassThrough,
                Some(target) => {
                    self.begin_typing(target);
                    self.header = self.header_text(settings);
                    ModalStatus::Running
                }
            },
        }
    }

    fn begin_typing(&mut self, target: TypingTarget) {
        self.saved = Some(self.params);
        self.state = PlacementState::Typing(TypedInput::new(target));
    }

    fn handle_typing(
        &mut self,
        scene: &mut Scene,
        settings: &Settings,
        target: TypingTarget,
        outcome: TypingOutcome,
    ) -> ModalStatus {
        let base = self.saved.unwrap_or(self.params);
        match outcome {
            TypingOutcome::Preview(value) => {
                self.params = base;
                if let Some(value) = value {
                    self.params.apply(target, value);
                }
            }
            TypingOutcome::Commit(value) => {
                self.params = base;
                if let Some(value) = value {
                    self.params.apply(target, value);
                }
                self.saved = None;
                self.state = PlacementState::Placing;
            }
            TypingOutcome::Exit => {
                self.params = base;
                self.saved = None;
                self.state = PlacementState::Placing;
            }
            TypingOutcome::Ignored => return ModalStatus::Running,
        }
        self.refresh(scene, settings);
        ModalStatus::Running
    }

    fn refresh(&mut self, scene: &mut Scene, settings: &Settings) {
        if let Err(e) = self.update(scene, settings) {
            report_error(&mut self.status, e);
        }
        self.header = self.header_text(settings);
    }

    fn update(&mut self, scene: &mut Scene, settings: &Settings) -> SceneResult<()> {
        let Some(pointer) = self.last_pointer else {
            return Ok(());
        };

        let Some(target) = resolve_wall_target(scene, &pointer, &settings.snap, &mut self.side)
        else {
            self.status = Some(StatusMessage::warning(format!(
                "Move the pointer over a wall to place a {}",
                self.spec.kind.name().to_lowercase()
            )));
            return Ok(());
        };
        self.status = None;

        let info = scene.wall(target.wall)?;
        let width = self.params.width.unwrap_or(self.spec.width);
        let height = self.params.height.unwrap_or(self.spec.height);
        let z = self.spec.default_z(settings);
        let exclude: Vec<Uuid> = self.preview.into_iter().collect();
        let intervals = occupied_intervals(scene, target.wall, None, (z, z + height), &exclude)?;
        let gap = find_placement_gap(&intervals, info.length, target.local.x, width);

        let x = match (self.params.offset_left, self.params.offset_right) {
            (Some(left), _) => gap.start + left,
            (None, Some(right)) => gap.end - right - width,
            (None, None) => gap.snap_x,
        };
        let layout = OpeningLayout {
            wall: target.wall,
            gap,
            x,
            width,
            height,
            z,
        };
        self.layout = Some(layout);

        let id = match self.preview {
            Some(id) => id,
            None => {
                let id = self.spec.create(scene, settings)?;
                self.pending.push(id);
                scene.add_tag(id, ObjectTag::Preview)?;
                self.preview = Some(id);
                id
            }
        };

        scene.set_parent(id, Some(layout.wall), false)?;
        scene.set_location(id, Vec3::new(layout.x, 0.0, layout.z))?;
        scene.set_rotation_z(id, 0.0)?;

        // Openings span the full wall thickness
        let dims = Vec3::new(width, info.thickness, height);
        if scene.dimensions(id) != Some(dims) {
            scene.set_input(id, "Dim X", dims.x)?;
            scene.set_input(id, "Dim Y", dims.y)?;
            scene.set_input(id, "Dim Z", dims.z)?;
            scene.recalculate()?;
        }
        Ok(())
    }

    fn header_text(&self, settings: &Settings) -> String {
        let fmt = |v: f32| format_distance(v, &settings.units);
        let mut parts = vec![self.spec.kind.name().to_string()];
        if let Some(layout) = &self.layout {
            parts.push(format!("Gap: {}", fmt(layout.gap.width())));
            parts.push(format!(
                "Left: {}",
                fmt(layout.x - layout.gap.start)
            ));
            parts.push(format!(
                "Right: {}",
                fmt(layout.gap.end - layout.x - layout.width)
            ));
            parts.push(format!("{} x {}", fmt(layout.width), fmt(layout.height)));
        }
        if let PlacementState::Typing(input) = &self.state {
            parts.push(input.prompt());
        }
        parts.join(" | ")
    }

    fn commit(&mut self, scene: &mut Scene) -> ModalStatus {
        let (Some(id), Some(layout)) = (self.preview, self.layout) else {
            self.status = Some(StatusMessage::warning("Nothing to place"));
            return self.cancel(scene);
        };

        let result = scene
            .remove_tag(id, ObjectTag::Preview)
            .and_then(|_| scene.add_cut(layout.wall, id));
        if let Err(e) = result {
            report_error(&mut self.status, e);
        }
        if let Err(e) = scene.recalculate() {
            report_error(&mut self.status, e);
        }

        self.pending.commit();
        let cut = cut_name(scene, id).unwrap_or_default();
        info!("Placed {} on wall {} ({})", self.spec.kind.name(), layout.wall, cut);
        self.status = Some(StatusMessage::info(format!("Placed {}", self.spec.kind.name())));
        self.state = PlacementState::Finished;
        ModalStatus::Finished
    }

    pub fn cancel(&mut self, scene: &mut Scene) -> ModalStatus {
        let removed = self.pending.rollback(scene);
        self.preview = None;
        self.layout = None;
        debug!("Cancelled {} placement ({} removed)", self.spec.kind.name(), removed);
        if self.status.is_none() {
            self.status = Some(StatusMessage::info("Placement cancelled"));
        }
        self.state = PlacementState::Cancelled;
        ModalStatus::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cw_core::{CabinetKind, WallFace, inch};
    use glam::Vec2;

    fn scene_with_wall() -> (Scene, Uuid, Settings) {
        let settings = Settings::default();
        let mut scene = Scene::new();
        let wall = scene
            .add_wall(
                Vec2::ZERO,
                0.0,
                inch(144.0),
                settings.wall_thickness,
                settings.wall_height,
            )
            .unwrap();
        (scene, wall, settings)
    }

    fn over_wall(x_in: f32) -> InputEvent {
        InputEvent::PointerMoved(Pointer::on_floor(Vec3::new(inch(x_in), inch(1.0), 0.0)))
    }

    #[test]
    fn test_typed_offset_places_door_and_cuts_wall() {
        let (mut scene, wall, settings) = scene_with_wall();
        let mut placement = OpeningPlacement::new(ProductKind::Door, &settings);
        placement.handle_event(&mut scene, &settings, over_wall(50.0));

        for c in "12".chars() {
            placement.handle_event(&mut scene, &settings, InputEvent::Key(Key::Char(c)));
        }
        placement.handle_event(&mut scene, &settings, InputEvent::Key(Key::Enter));
        assert_eq!(placement.params().offset_left, Some(inch(12.0)));

        let id = placement.preview().unwrap();
        let object = scene.get(id).unwrap();
        assert_relative_eq!(object.transform.location.x, inch(12.0), epsilon = 1e-5);
        assert_relative_eq!(
            scene.dimensions(id).unwrap().y,
            settings.wall_thickness,
            epsilon = 1e-6
        );

        let status = placement.handle_event(&mut scene, &settings, InputEvent::Click);
        assert_eq!(status, ModalStatus::Finished);
        assert_eq!(scene.get(wall).unwrap().cuts, vec![id]);
        assert!(!scene.has_tag(id, ObjectTag::Preview));
        assert_eq!(cut_name(&scene, id).unwrap(), "Boolean_Door");
    }

    #[test]
    fn test_openings_see_both_faces() {
        let (mut scene, wall, settings) = scene_with_wall();
        // Tall cabinet on the back face at 0..24
        let tall = ProductSpec::from_settings(ProductKind::Cabinet(CabinetKind::Tall), &settings)
            .with_width(inch(24.0))
            .create(&mut scene, &settings)
            .unwrap();
        scene.set_parent(tall, Some(wall), false).unwrap();
        scene
            .set_location(tall, Vec3::new(inch(24.0), settings.wall_thickness, 0.0))
            .unwrap();
        scene.set_rotation_z(tall, std::f32::consts::PI).unwrap();
        assert_eq!(crate::gap::face_of(std::f32::consts::PI), WallFace::Back);

        let mut placement = OpeningPlacement::new(ProductKind::Window, &settings);
        placement.handle_event(&mut scene, &settings, over_wall(40.0));
        let layout = placement.layout().unwrap();
        assert_relative_eq!(layout.gap.start, inch(24.0), epsilon = 1e-5);
        assert_relative_eq!(layout.z, inch(36.0), epsilon = 1e-6);
    }

    #[test]
    fn test_no_wall_warns_and_cancel_cleans_up() {
        let (mut scene, _, settings) = scene_with_wall();
        let before = scene.len();
        let mut placement = OpeningPlacement::new(ProductKind::Window, &settings);
        let away = Pointer::on_floor(Vec3::new(0.0, 3.0, 0.0));
        placement.handle_event(&mut scene, &settings, InputEvent::PointerMoved(away));
        assert!(placement.status().unwrap().text.contains("over a wall"));
        assert!(placement.preview().is_none());

        placement.handle_event(&mut scene, &settings, over_wall(60.0));
        assert!(placement.preview().is_some());
        assert_eq!(
            placement.handle_event(&mut scene, &settings, InputEvent::Key(Key::Escape)),
            ModalStatus::Cancelled
        );
        assert_eq!(scene.len(), before);
    }
}
