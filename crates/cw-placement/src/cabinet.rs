//! Cabinet and appliance placement
//!
//! Places a run of identical products along a wall face, or freely on the
//! floor when no wall is near the pointer. The run is shown as preview
//! objects that follow the pointer; a click keeps them, a cancel deletes
//! them.
//!
//! Every refresh runs the same steps in order: snap, positions, dimensions,
//! header text.

use std::f32::consts::PI;

use cw_core::units::snap_to_grid;
use cw_core::{
    ObjectTag, Product, ProductKind, ProductSpec, Scene, SceneResult, Settings, Transform,
    WallFace, format_distance,
};
use glam::Vec3;
use tracing::{debug, info};
use uuid::Uuid;

use crate::event::{InputEvent, Key, ModalStatus, Pointer};
use crate::gap::{PlacementGap, auto_quantity, face_of, find_placement_gap, occupied_intervals};
use crate::pending::PendingObjects;
use crate::status::{StatusMessage, report_error};
use crate::target::{SideDetector, WallTarget, pointer_point, resolve_wall_target};
use crate::typing::{TypedInput, TypingOutcome, TypingTarget, starts_typing};

// ============== Parameters ==============

#[derive(Debug, Clone, PartialEq)]
pub enum PlacementState {
    /// Waiting for the first pointer event
    Idle,
    Placing,
    Typing(TypedInput),
    Finished,
    Cancelled,
}

/// User overrides accumulated during a placement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementParams {
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub depth: Option<f32>,
    /// Distance from the left end of the gap
    pub offset_left: Option<f32>,
    /// Distance from the right end of the gap
    pub offset_right: Option<f32>,
    pub quantity: usize,
    pub auto_quantity: bool,
    pub fill_mode: bool,
}

impl PlacementParams {
    pub fn new(fill_mode: bool) -> Self {
        Self {
            width: None,
            height: None,
            depth: None,
            offset_left: None,
            offset_right: None,
            quantity: 1,
            auto_quantity: true,
            fill_mode,
        }
    }

    /// Equal widths filling the gap, rather than a fixed width
    pub fn fills_gap(&self) -> bool {
        self.fill_mode && self.width.is_none()
    }

    /// An offset was typed, so the run no longer follows the pointer
    pub fn is_position_locked(&self) -> bool {
        self.offset_left.is_some() || self.offset_right.is_some()
    }

    pub fn apply(&mut self, target: TypingTarget, value: f32) {
        match target {
            TypingTarget::Width | TypingTarget::Length if value > 0.0 => self.width = Some(value),
            TypingTarget::Height if value > 0.0 => self.height = Some(value),
            TypingTarget::Depth if value > 0.0 => self.depth = Some(value),
            TypingTarget::OffsetX => self.offset_left = Some(value.max(0.0)),
            TypingTarget::OffsetRight => self.offset_right = Some(value.max(0.0)),
            _ => debug!("Ignoring {} of {}", target.label(), value),
        }
    }

    /// Like [`apply`](Self::apply), except a typed width is the total of the
    /// run. With auto-quantity the count is re-derived from that total,
    /// and fill mode ends either way.
    pub fn apply_run(&mut self, target: TypingTarget, value: f32, max_single_width: f32) {
        match target {
            TypingTarget::Width | TypingTarget::Length if value > 0.0 => {
                if self.auto_quantity {
                    self.quantity = auto_quantity(value, max_single_width);
                }
                self.width = Some(value / self.quantity.max(1) as f32);
                self.fill_mode = false;
            }
            _ => self.apply(target, value),
        }
    }
}

// ============== Layout ==============

/// What the run is attached to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunAnchor {
    Wall {
        wall: Uuid,
        face: WallFace,
        thickness: f32,
        gap: PlacementGap,
        /// Left edge of the run in wall-local X
        start: f32,
    },
    Floor {
        /// World transform of the first object
        origin: Transform,
    },
}

/// Resolved size and position of the run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunLayout {
    pub anchor: RunAnchor,
    pub width: f32,
    pub height: f32,
    pub depth: f32,
    pub quantity: usize,
    pub z: f32,
}

impl RunLayout {
    pub fn total_width(&self) -> f32 {
        self.width * self.quantity as f32
    }

    /// Parent and local transform of the object at `index`
    pub fn placement(&self, index: usize) -> (Option<Uuid>, Transform) {
        let offset = self.width * index as f32;
        match self.anchor {
            RunAnchor::Wall {
                wall,
                face: WallFace::Front,
                start,
                ..
            } => (
                Some(wall),
                Transform::new(Vec3::new(start + offset, 0.0, self.z), 0.0),
            ),
            // Turned to face away from the wall's back side, so each object's
            // origin sits at its right end in wall coordinates
            RunAnchor::Wall {
                wall,
                face: WallFace::Back,
                thickness,
                start,
                ..
            } => (
                Some(wall),
                Transform::new(
                    Vec3::new(start + offset + self.width, thickness, self.z),
                    PI,
                ),
            ),
            RunAnchor::Floor { origin } => (
                None,
                Transform::new(
                    origin.transform_point(Vec3::new(offset, 0.0, 0.0)),
                    origin.rotation_z,
                ),
            ),
        }
    }
}

// ============== Placement ==============

#[derive(Debug)]
pub struct CabinetPlacement {
    spec: ProductSpec,
    state: PlacementState,
    params: PlacementParams,
    /// Params from before typing started, restored on exit
    saved: Option<PlacementParams>,
    pending: PendingObjects,
    previews: Vec<Uuid>,
    side: SideDetector,
    last_pointer: Option<Pointer>,
    layout: Option<RunLayout>,
    header: String,
    status: Option<StatusMessage>,
}

impl CabinetPlacement {
    pub fn new(kind: ProductKind, settings: &Settings) -> Self {
        // Appliances have fixed widths
        let fill_mode = settings.cabinets.fill_mode && matches!(kind, ProductKind::Cabinet(_));
        Self::with_spec(ProductSpec::from_settings(kind, settings), fill_mode)
    }

    pub fn with_spec(spec: ProductSpec, fill_mode: bool) -> Self {
        Self {
            spec,
            state: PlacementState::Idle,
            params: PlacementParams::new(fill_mode),
            saved: None,
            pending: PendingObjects::new(),
            previews: Vec::new(),
            side: SideDetector::new(),
            last_pointer: None,
            layout: None,
            header: format!("Place {}", spec.kind.name()),
            status: None,
        }
    }

    pub fn kind(&self) -> ProductKind {
        self.spec.kind
    }

    pub fn state(&self) -> &PlacementState {
        &self.state
    }

    pub fn params(&self) -> &PlacementParams {
        &self.params
    }

    pub fn layout(&self) -> Option<&RunLayout> {
        self.layout.as_ref()
    }

    /// Preview objects, left to right
    pub fn previews(&self) -> &[Uuid] {
        &self.previews
    }

    pub fn pending(&self) -> &PendingObjects {
        &self.pending
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
                    debug!("Started placing {}", self.spec.kind.name());
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
            Key::Up => {
                self.change_quantity(1);
                self.refresh(scene, settings);
                ModalStatus::Running
            }
            Key::Down => {
                self.change_quantity(-1);
                self.refresh(scene, settings);
                ModalStatus::Running
            }
            Key::Tab => {
                self.params.fill_mode = !self.params.fill_mode;
                self.refresh(scene, settings);
                ModalStatus::Running
            }
            Key::Char(c) if starts_typing(c) => {
                self.begin_typing(TypingTarget::Width);
                self.handle_key(scene, settings, key)
            }
            other => match TypingTarget::from_key(other) {
                Some(target) => {
                    self.begin_typing(target);
                    self.header = self.header_text(settings);
                    ModalStatus::Running
                }
                None => ModalStatus::PassThrough,
            },
        }
    }

    fn begin_typing(&mut self, target: TypingTarget) {
        debug!("Typing {}", target.label());
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
        let max_width = settings.cabinets.max_single_width;
        match outcome {
            TypingOutcome::Preview(value) => {
                self.params = base;
                if let Some(value) = value {
                    self.params.apply_run(target, value, max_width);
                }
            }
            TypingOutcome::Commit(value) => {
                self.params = base;
                match value {
                    Some(value) => self.params.apply_run(target, value, max_width),
                    None => {
                        self.status = Some(StatusMessage::warning(format!(
                            "Invalid {}",
                            target.label().to_lowercase()
                        )))
                    }
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

    /// Manual quantity turns auto-quantity off. With a typed offset the
    /// current run width is spread over the new count instead.
    fn change_quantity(&mut self, delta: i64) {
        let old = self.params.quantity.max(1);
        let new = (old as i64 + delta).max(1) as usize;
        self.params.auto_quantity = false;
        if !self.params.fills_gap()
            && self.params.is_position_locked()
            && let Some(layout) = &self.layout
        {
            self.params.width = Some(layout.total_width() / new as f32);
        }
        self.params.quantity = new;
    }

    // ============== Refresh ==============

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

        // Snap
        self.layout = self.compute_layout(scene, settings, &pointer)?;
        let Some(layout) = self.layout else {
            return Ok(());
        };
        self.params.quantity = layout.quantity;

        // Positions
        let mut changed = self.sync_previews(scene, settings, &layout)?;
        for (index, &id) in self.previews.iter().enumerate() {
            let (parent, transform) = layout.placement(index);
            scene.set_parent(id, parent, false)?;
            scene.set_location(id, transform.location)?;
            scene.set_rotation_z(id, transform.rotation_z)?;
        }

        // Dimensions
        let dims = Vec3::new(layout.width, layout.depth, layout.height);
        for &id in &self.previews {
            if scene.dimensions(id) != Some(dims) {
                scene.set_input(id, "Dim X", dims.x)?;
                scene.set_input(id, "Dim Y", dims.y)?;
                scene.set_input(id, "Dim Z", dims.z)?;
                changed = true;
            }
        }
        if changed {
            scene.recalculate()?;
        }
        Ok(())
    }

    /// Create or delete previews until there is one per run slot. Returns
    /// whether any were created.
    fn sync_previews(
        &mut self,
        scene: &mut Scene,
        settings: &Settings,
        layout: &RunLayout,
    ) -> SceneResult<bool> {
        let created = self.previews.len() < layout.quantity;
        while self.previews.len() < layout.quantity {
            let spec = ProductSpec::new(self.spec.kind, layout.width, layout.height, layout.depth);
            let id = spec.create(scene, settings)?;
            self.pending.push(id);
            scene.add_tag(id, ObjectTag::Preview)?;
            self.previews.push(id);
        }
        while self.previews.len() > layout.quantity {
            let Some(id) = self.previews.pop() else {
                break;
            };
            self.pending.remove(id);
            scene.delete(id)?;
        }
        Ok(created)
    }

    fn compute_layout(
        &mut self,
        scene: &Scene,
        settings: &Settings,
        pointer: &Pointer,
    ) -> SceneResult<Option<RunLayout>> {
        let height = self.params.height.unwrap_or(self.spec.height);
        let depth = self.params.depth.unwrap_or(self.spec.depth);
        let z = self.spec.default_z(settings);

        match resolve_wall_target(scene, pointer, &settings.snap, &mut self.side) {
            Some(target) => self.wall_layout(scene, settings, pointer, &target, height, depth, z),
            None => Ok(self.floor_layout(scene, settings, pointer, height, depth, z)),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn wall_layout(
        &self,
        scene: &Scene,
        settings: &Settings,
        pointer: &Pointer,
        target: &WallTarget,
        height: f32,
        depth: f32,
        z: f32,
    ) -> SceneResult<Option<RunLayout>> {
        let info = scene.wall(target.wall)?;
        let z_range = (z, z + height);
        let intervals =
            occupied_intervals(scene, target.wall, Some(target.face), z_range, &self.previews)?;
        let cursor = target.local.x;
        let params = &self.params;

        let (gap, start, width, quantity) = if params.fills_gap() {
            let gap = find_placement_gap(&intervals, info.length, cursor, self.spec.width);
            let region_start = gap.start + params.offset_left.unwrap_or(0.0);
            let region_end = gap.end - params.offset_right.unwrap_or(0.0);
            let region = region_end - region_start;
            if region <= f32::EPSILON {
                return Ok(None);
            }
            let quantity = if params.auto_quantity {
                auto_quantity(region, settings.cabinets.max_single_width)
            } else {
                params.quantity.max(1)
            };
            (gap, region_start, region / quantity as f32, quantity)
        } else {
            let quantity = params.quantity.max(1);
            let mut width = params.width.unwrap_or(self.spec.width);
            let gap = find_placement_gap(&intervals, info.length, cursor, width * quantity as f32);
            if params.width.is_none()
                && let (Some(left), Some(right)) = (params.offset_left, params.offset_right)
            {
                width = ((gap.width() - left - right) / quantity as f32).max(0.0);
            }
            let total = width * quantity as f32;

            let start = match (params.offset_left, params.offset_right) {
                (Some(left), _) => gap.start + left,
                (None, Some(right)) => gap.end - right - total,
                (None, None) => {
                    self.pointer_start(scene, settings, pointer, target.wall, z_range, &gap, total)
                }
            };
            // The run never leaves its gap
            let start = if total < gap.width() {
                start.clamp(gap.start, gap.end - total)
            } else {
                gap.start
            };
            (gap, start, width, quantity)
        };

        Ok(Some(RunLayout {
            anchor: RunAnchor::Wall {
                wall: target.wall,
                face: target.face,
                thickness: info.thickness,
                gap,
                start,
            },
            width,
            height,
            depth,
            quantity,
            z,
        }))
    }

    /// Left edge of a run following the pointer. A hovered cage wins, then
    /// the gap center, then either end of the gap; otherwise the grid.
    #[allow(clippy::too_many_arguments)]
    fn pointer_start(
        &self,
        scene: &Scene,
        settings: &Settings,
        pointer: &Pointer,
        wall: Uuid,
        z_range: (f32, f32),
        gap: &PlacementGap,
        total: f32,
    ) -> f32 {
        if let Some(center) = self.cage_center(scene, pointer, wall, z_range) {
            return center - total / 2.0;
        }
        let snap = &settings.snap;
        let centered = gap.center() - total / 2.0;
        let flush_right = gap.end - total;
        if (gap.snap_x - centered).abs() < snap.center_threshold {
            centered
        } else if gap.snap_x - gap.start < snap.edge_threshold {
            gap.start
        } else if flush_right - gap.snap_x < snap.edge_threshold {
            flush_right
        } else {
            snap_to_grid(gap.snap_x, snap.grid_spacing)
        }
    }

    /// Center of a hovered cage on the same wall that sits above or below
    /// the run, e.g. a window over a base cabinet run.
    fn cage_center(
        &self,
        scene: &Scene,
        pointer: &Pointer,
        wall: Uuid,
        z_range: (f32, f32),
    ) -> Option<f32> {
        let hit = pointer.hit?;
        let cage = scene.find_ancestor(hit.object, |o| o.has_tag(ObjectTag::Cage))?;
        if self.previews.contains(&cage) || scene.parent(cage) != Some(wall) {
            return None;
        }
        let object = scene.get(cage)?;
        let dims = object.dimensions()?;
        let z = object.transform.location.z;
        if z < z_range.1 && z_range.0 < z + dims.z {
            return None;
        }
        let x = object.transform.location.x;
        Some(match face_of(object.transform.rotation_z) {
            WallFace::Front => x + dims.x / 2.0,
            WallFace::Back => x - dims.x / 2.0,
        })
    }

    fn floor_layout(
        &self,
        scene: &Scene,
        settings: &Settings,
        pointer: &Pointer,
        height: f32,
        depth: f32,
        z: f32,
    ) -> Option<RunLayout> {
        let width = self.params.width.unwrap_or(self.spec.width);
        let quantity = self.params.quantity.max(1);
        let total = width * quantity as f32;

        let origin = match self.edge_snap(scene, pointer, total) {
            Some(origin) => origin,
            None => {
                let point = pointer_point(pointer, &settings.snap)?;
                let grid = settings.snap.grid_spacing;
                Transform::new(
                    Vec3::new(snap_to_grid(point.x, grid), snap_to_grid(point.y, grid), z),
                    0.0,
                )
            }
        };

        Some(RunLayout {
            anchor: RunAnchor::Floor { origin },
            width,
            height,
            depth,
            quantity,
            z: origin.location.z,
        })
    }

    /// Butt the run against the hovered cabinet's left or right side,
    /// whichever half was hit, matching its rotation and height.
    fn edge_snap(&self, scene: &Scene, pointer: &Pointer, total: f32) -> Option<Transform> {
        let hit = pointer.hit?;
        let cage = scene.find_ancestor(hit.object, |o| {
            o.has_tag(ObjectTag::Cabinet) || o.has_tag(ObjectTag::Appliance)
        })?;
        if self.previews.contains(&cage) {
            return None;
        }
        let width = scene.dimensions(cage)?.x;
        let world = scene.world_transform(cage).ok()?;
        let local = world.inverse_transform_point(hit.location);
        let x = if local.x < width / 2.0 { -total } else { width };
        Some(Transform::new(
            world.transform_point(Vec3::new(x, 0.0, 0.0)),
            world.rotation_z,
        ))
    }

    fn header_text(&self, settings: &Settings) -> String {
        let fmt = |v: f32| format_distance(v, &settings.units);
        let mut parts = Vec::new();
        match &self.layout {
            Some(layout) => {
                match layout.anchor {
                    RunAnchor::Wall { face, gap, .. } => {
                        parts.push(face.name().to_string());
                        parts.push(format!("Gap: {}", fmt(gap.width())));
                    }
                    RunAnchor::Floor { .. } => parts.push("Floor".to_string()),
                }
                parts.push(format!(
                    "{} x {} = {}",
                    layout.quantity,
                    fmt(layout.width),
                    fmt(layout.total_width())
                ));
            }
            None => parts.push(format!("Place {}", self.spec.kind.name())),
        }
        if let Some(left) = self.params.offset_left {
            parts.push(format!("Offset X: {}", fmt(left)));
        }
        if let Some(right) = self.params.offset_right {
            parts.push(format!("Offset Right: {}", fmt(right)));
        }
        if self.params.fills_gap() {
            parts.push("Fill".to_string());
        }
        if let PlacementState::Typing(input) = &self.state {
            parts.push(input.prompt());
        }
        parts.join(" | ")
    }

    // ============== Commit / Cancel ==============

    fn commit(&mut self, scene: &mut Scene) -> ModalStatus {
        if self.previews.is_empty() {
            self.status = Some(StatusMessage::warning("Nothing to place"));
            return self.cancel(scene);
        }

        for &id in &self.previews {
            if let Err(e) = scene.remove_tag(id, ObjectTag::Preview) {
                report_error(&mut self.status, e);
            }
        }
        // Nested carcass bindings can lag one pass behind
        for _ in 0..2 {
            if let Err(e) = scene.recalculate() {
                report_error(&mut self.status, e);
            }
        }

        let placed = self.pending.commit();
        let name = self.spec.kind.name();
        info!("Placed {} {}", placed.len(), name);
        self.status = Some(StatusMessage::info(format!("Placed {} {}(s)", placed.len(), name)));
        self.state = PlacementState::Finished;
        ModalStatus::Finished
    }

    pub fn cancel(&mut self, scene: &mut Scene) -> ModalStatus {
        let removed = self.pending.rollback(scene);
        self.previews.clear();
        self.layout = None;
        info!(
            "Cancelled {} placement, removed {} object(s)",
            self.spec.kind.name(),
            removed
        );
        if self.status.is_none() {
            self.status = Some(StatusMessage::info("Placement cancelled"));
        }
        self.state = PlacementState::Cancelled;
        ModalStatus::Cancelled
    }
}
