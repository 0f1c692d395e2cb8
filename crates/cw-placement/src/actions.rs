//! Action handlers for the editing session

use std::path::PathBuf;

use cw_core::{ObstacleKind, Project, WallFace, place_obstacle};
use uuid::Uuid;

use crate::session::{SessionAction, SharedSession};
use crate::status::StatusMessage;

/// Context for action handlers
pub struct ActionContext<'a> {
    pub session: &'a SharedSession,
}

impl<'a> ActionContext<'a> {
    pub fn new(session: &'a SharedSession) -> Self {
        Self { session }
    }
}

/// Dispatch an action to the appropriate handler
pub fn dispatch_action(action: SessionAction, ctx: &ActionContext) {
    match action {
        // Tool actions
        SessionAction::StartWallDrawing
        | SessionAction::PlaceProduct(_)
        | SessionAction::PlaceObstacle { .. } => {
            handle_tool_action(action, ctx);
        }

        // Edit actions
        SessionAction::DeleteWall(_) | SessionAction::ApplyStyle(_) | SessionAction::CancelBulk => {
            handle_edit_action(action, ctx);
        }

        // File actions
        SessionAction::SaveProject(_)
        | SessionAction::LoadProject(_)
        | SessionAction::NewProject => {
            handle_file_action(action, ctx);
        }
    }
}

/// Drain and dispatch every queued action
pub fn process_pending_actions(ctx: &ActionContext) -> usize {
    let actions = ctx.session.lock().take_pending_actions();
    let count = actions.len();
    for action in actions {
        dispatch_action(action, ctx);
    }
    count
}

// ============== Tool actions ==============

fn handle_tool_action(action: SessionAction, ctx: &ActionContext) {
    match action {
        SessionAction::StartWallDrawing => ctx.session.lock().start_wall_drawing(),
        SessionAction::PlaceProduct(kind) => ctx.session.lock().start_placement(kind),
        SessionAction::PlaceObstacle {
            kind,
            wall,
            x,
            face,
        } => handle_place_obstacle(kind, wall, x, face, ctx),
        _ => {}
    }
}

fn handle_place_obstacle(
    kind: ObstacleKind,
    wall: Uuid,
    x: f32,
    face: WallFace,
    ctx: &ActionContext,
) {
    let mut session = ctx.session.lock();
    match place_obstacle(&mut session.project.scene, kind, wall, x, face) {
        Ok(id) => {
            tracing::info!("Placed {} {} on {} face", kind.name(), id, face.name());
            session.modified = true;
        }
        Err(e) => {
            tracing::warn!("Failed to place {}: {}", kind.name(), e);
            session.set_status(StatusMessage::error(e.to_string()));
        }
    }
}

// ============== Edit actions ==============

fn handle_edit_action(action: SessionAction, ctx: &ActionContext) {
    match action {
        SessionAction::DeleteWall(wall) => handle_delete_wall(wall, ctx),
        SessionAction::ApplyStyle(style) => ctx.session.lock().start_bulk_style(style),
        SessionAction::CancelBulk => ctx.session.lock().cancel_bulk(),
        _ => {}
    }
}

fn handle_delete_wall(wall: Uuid, ctx: &ActionContext) {
    let mut session = ctx.session.lock();
    match session.project.scene.delete_wall(wall) {
        Ok(removed) => {
            tracing::info!("Deleted wall {} ({} object(s) removed)", wall, removed.len());
            session.modified = true;
        }
        Err(e) => {
            tracing::warn!("Failed to delete wall {}: {}", wall, e);
            session.set_status(StatusMessage::error(e.to_string()));
        }
    }
}

// ============== File actions ==============

fn handle_file_action(action: SessionAction, ctx: &ActionContext) {
    match action {
        SessionAction::SaveProject(path) => handle_save_project(path, ctx),
        SessionAction::LoadProject(path) => handle_load_project(path, ctx),
        SessionAction::NewProject => handle_new_project(ctx),
        _ => {}
    }
}

fn handle_save_project(path: PathBuf, ctx: &ActionContext) {
    let mut session = ctx.session.lock();
    match session.project.save(&path) {
        Ok(()) => {
            session.project_path = Some(path);
            session.modified = false;
        }
        Err(e) => {
            tracing::error!("Failed to save project: {}", e);
            session.set_status(StatusMessage::error(e.to_string()));
        }
    }
}

fn handle_load_project(path: PathBuf, ctx: &ActionContext) {
    match Project::load(&path) {
        Ok(project) => ctx.session.lock().load_project(project, path),
        Err(e) => {
            tracing::error!("Failed to load project: {}", e);
            ctx.session
                .lock()
                .set_status(StatusMessage::error(e.to_string()));
        }
    }
}

fn handle_new_project(ctx: &ActionContext) {
    ctx.session.lock().new_project();
    tracing::info!("Created new project");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{InputEvent, ModalStatus};
    use crate::session::{ActiveTool, create_shared_session};
    use crate::status::Severity;
    use cw_core::{CabinetKind, ObjectTag, ProductKind, Settings, inch};
    use glam::Vec2;

    fn shared_with_wall() -> (SharedSession, Uuid) {
        let mut project = Project::with_settings("Test", Settings::default());
        let wall = project
            .scene
            .add_wall(Vec2::ZERO, 0.0, inch(96.0), inch(4.5), inch(96.0))
            .unwrap();
        (create_shared_session(project), wall)
    }

    #[test]
    fn test_place_product_starts_tool() {
        let (session, _) = shared_with_wall();
        let ctx = ActionContext::new(&session);
        dispatch_action(
            SessionAction::PlaceProduct(ProductKind::Cabinet(CabinetKind::Upper)),
            &ctx,
        );
        assert!(matches!(session.lock().tool(), ActiveTool::Cabinet(_)));
        dispatch_action(SessionAction::PlaceProduct(ProductKind::Window), &ctx);
        assert!(matches!(session.lock().tool(), ActiveTool::Opening(_)));
    }

    #[test]
    fn test_place_obstacle_and_delete_wall() {
        let (session, wall) = shared_with_wall();
        let ctx = ActionContext::new(&session);
        dispatch_action(
            SessionAction::PlaceObstacle {
                kind: ObstacleKind::OutletStandard,
                wall,
                x: inch(30.0),
                face: WallFace::Front,
            },
            &ctx,
        );
        assert!(session.lock().modified);
        assert_eq!(
            session
                .lock()
                .project
                .scene
                .children_with_tag(wall, ObjectTag::Obstacle)
                .len(),
            1
        );

        dispatch_action(SessionAction::DeleteWall(wall), &ctx);
        let guard = session.lock();
        assert!(guard.project.scene.walls().is_empty());
        assert_eq!(guard.project.scene.len(), 0);
    }

    #[test]
    fn test_delete_missing_wall_reports_error() {
        let (session, _) = shared_with_wall();
        let ctx = ActionContext::new(&session);
        dispatch_action(SessionAction::DeleteWall(Uuid::new_v4()), &ctx);
        let status = session.lock().take_status().unwrap();
        assert_eq!(status.severity, Severity::Error);
    }

    #[test]
    fn test_queued_style_runs_on_timer() {
        let (session, _) = shared_with_wall();
        let id = session
            .lock()
            .project
            .scene
            .create_parametric("Base", [ObjectTag::Cage, ObjectTag::Cabinet], "Cage")
            .unwrap();
        session.lock().queue_action(SessionAction::ApplyStyle("Shaker".into()));

        let ctx = ActionContext::new(&session);
        assert_eq!(process_pending_actions(&ctx), 1);
        assert_eq!(
            session.lock().handle_event(InputEvent::Timer),
            ModalStatus::Finished
        );
        let guard = session.lock();
        assert!(guard.bulk().is_none());
        assert_eq!(
            guard.project.scene.get(id).unwrap().style.as_deref(),
            Some("Shaker")
        );
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let (session, wall) = shared_with_wall();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("room.cwp");
        let ctx = ActionContext::new(&session);

        dispatch_action(SessionAction::SaveProject(path.clone()), &ctx);
        assert_eq!(session.lock().project_path.as_deref(), Some(path.as_path()));

        dispatch_action(SessionAction::NewProject, &ctx);
        assert!(session.lock().project.scene.walls().is_empty());

        dispatch_action(SessionAction::LoadProject(path), &ctx);
        assert_eq!(session.lock().project.scene.walls(), vec![wall]);
    }
}
