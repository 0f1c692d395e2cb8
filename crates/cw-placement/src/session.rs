//! Editing session: the open project plus whichever modal tool is running

use std::path::PathBuf;
use std::sync::Arc;

use cw_core::{ObstacleKind, Project, ProductKind, WallFace};
use parking_lot::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::bulk::BulkStyleJob;
use crate::cabinet::CabinetPlacement;
use crate::event::{InputEvent, ModalStatus};
use crate::opening::OpeningPlacement;
use crate::status::StatusMessage;
use crate::wall_draw::WallDrawing;

/// Actions that can be triggered from menus or scripts
#[derive(Debug, Clone)]
pub enum SessionAction {
    // Tool actions
    /// Start drawing connected walls
    StartWallDrawing,
    /// Start placing a product
    PlaceProduct(ProductKind),
    /// Mount an obstacle on a wall face
    PlaceObstacle {
        kind: ObstacleKind,
        wall: Uuid,
        x: f32,
        face: WallFace,
    },

    // Edit actions
    /// Delete a wall and everything attached to it
    DeleteWall(Uuid),
    /// Apply a door style to every cabinet, one per timer tick
    ApplyStyle(String),
    /// Stop the running style update
    CancelBulk,

    // File actions
    /// Save the project to a file
    SaveProject(PathBuf),
    /// Load a project from a file
    LoadProject(PathBuf),
    /// Start over with an empty project
    NewProject,
}

/// The modal tool currently receiving input
#[derive(Debug, Default)]
pub enum ActiveTool {
    #[default]
    None,
    WallDraw(WallDrawing),
    Cabinet(CabinetPlacement),
    Opening(OpeningPlacement),
}

impl ActiveTool {
    pub fn is_none(&self) -> bool {
        matches!(self, ActiveTool::None)
    }

    /// Header text of the running tool
    pub fn header(&self) -> &str {
        match self {
            ActiveTool::None => "",
            ActiveTool::WallDraw(tool) => tool.header(),
            ActiveTool::Cabinet(tool) => tool.header(),
            ActiveTool::Opening(tool) => tool.header(),
        }
    }
}

/// Editing session state
#[derive(Debug, Default)]
pub struct Session {
    /// Open project
    pub project: Project,
    /// Project file path
    pub project_path: Option<PathBuf>,
    /// Has unsaved changes
    pub modified: bool,
    /// Running modal tool
    tool: ActiveTool,
    /// Running style update
    bulk: Option<BulkStyleJob>,
    /// Last message for the status bar
    status: Option<StatusMessage>,
    /// Pending actions
    pending_actions: Vec<SessionAction>,
}

impl Session {
    pub fn new(project: Project) -> Self {
        Self {
            project,
            ..Default::default()
        }
    }

    pub fn tool(&self) -> &ActiveTool {
        &self.tool
    }

    pub fn bulk(&self) -> Option<&BulkStyleJob> {
        self.bulk.as_ref()
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn set_status(&mut self, status: StatusMessage) {
        self.status = Some(status);
    }

    pub fn take_status(&mut self) -> Option<StatusMessage> {
        self.status.take()
    }

    // ============== Tools ==============

    pub fn start_wall_drawing(&mut self) {
        self.cancel_tool();
        info!("Started wall drawing");
        self.tool = ActiveTool::WallDraw(WallDrawing::new());
    }

    /// Doors and windows cut the wall; everything else places as a run
    pub fn start_placement(&mut self, kind: ProductKind) {
        self.cancel_tool();
        info!("Started placing {}", kind.name());
        let settings = &self.project.settings;
        self.tool = if kind.is_opening() {
            ActiveTool::Opening(OpeningPlacement::new(kind, settings))
        } else {
            ActiveTool::Cabinet(CabinetPlacement::new(kind, settings))
        };
    }

    /// Cancel the running tool, rolling back its uncommitted objects
    pub fn cancel_tool(&mut self) {
        let scene = &mut self.project.scene;
        let status = match &mut self.tool {
            ActiveTool::None => return,
            ActiveTool::WallDraw(tool) => {
                tool.cancel(scene);
                tool.take_status()
            }
            ActiveTool::Cabinet(tool) => {
                tool.cancel(scene);
                tool.take_status()
            }
            ActiveTool::Opening(tool) => {
                tool.cancel(scene);
                tool.take_status()
            }
        };
        self.status = status;
        self.tool = ActiveTool::None;
    }

    // ============== Bulk update ==============

    /// Queue a style update over every cabinet. Replaces a running one.
    pub fn start_bulk_style(&mut self, style: impl Into<String>) {
        self.cancel_bulk();
        let job = BulkStyleJob::for_all_cabinets(&self.project.scene, style);
        info!("Updating {} cabinet(s) to style '{}'", job.total(), job.style());
        self.bulk = Some(job);
    }

    pub fn cancel_bulk(&mut self) {
        if let Some(mut job) = self.bulk.take() {
            job.cancel();
            self.status = job.take_status();
        }
    }

    // ============== Events ==============

    /// Route an input event to the running tool or bulk job
    pub fn handle_event(&mut self, event: InputEvent) -> ModalStatus {
        if matches!(event, InputEvent::Timer) {
            return self.tick_bulk();
        }

        let scene = &mut self.project.scene;
        let settings = &self.project.settings;
        let (result, status) = match &mut self.tool {
            ActiveTool::None => return ModalStatus::PassThrough,
            ActiveTool::WallDraw(tool) => {
                let result = tool.handle_event(scene, settings, event);
                (result, tool.take_status())
            }
            ActiveTool::Cabinet(tool) => {
                let result = tool.handle_event(scene, settings, event);
                (result, tool.take_status())
            }
            ActiveTool::Opening(tool) => {
                let result = tool.handle_event(scene, settings, event);
                (result, tool.take_status())
            }
        };

        if status.is_some() {
            self.status = status;
        }
        match result {
            ModalStatus::Finished => {
                self.modified = true;
                self.tool = ActiveTool::None;
            }
            ModalStatus::Cancelled => self.tool = ActiveTool::None,
            ModalStatus::Running | ModalStatus::PassThrough => {}
        }
        result
    }

    fn tick_bulk(&mut self) -> ModalStatus {
        let Some(job) = self.bulk.as_mut() else {
            return ModalStatus::PassThrough;
        };
        let result = job.tick(&mut self.project.scene);
        if let Some(status) = job.take_status() {
            self.status = Some(status);
        }
        if result.is_done() {
            debug!("Style update done");
            self.bulk = None;
            self.modified = true;
        }
        result
    }

    // ============== Actions ==============

    /// Queue an action
    pub fn queue_action(&mut self, action: SessionAction) {
        self.pending_actions.push(action);
    }

    /// Take pending actions
    pub fn take_pending_actions(&mut self) -> Vec<SessionAction> {
        std::mem::take(&mut self.pending_actions)
    }

    // ============== Project ==============

    /// Reset to a new project, keeping the current settings
    pub fn new_project(&mut self) {
        self.cancel_tool();
        self.bulk = None;
        let settings = self.project.settings.clone();
        self.project = Project::with_settings("New Room", settings);
        self.project_path = None;
        self.modified = false;
    }

    /// Load a project
    pub fn load_project(&mut self, project: Project, path: PathBuf) {
        self.cancel_tool();
        self.bulk = None;
        self.project = project;
        self.project_path = Some(path);
        self.modified = false;
    }
}

pub type SharedSession = Arc<Mutex<Session>>;

/// Create a new shared session
pub fn create_shared_session(project: Project) -> SharedSession {
    Arc::new(Mutex::new(Session::new(project)))
}
