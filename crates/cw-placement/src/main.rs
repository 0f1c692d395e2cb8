//! Scripted demo: draws a room, fills a wall with base cabinets and saves it

use std::path::PathBuf;

use cw_core::{CabinetKind, ProductKind, Project, ProjectError, Settings, UnitSettings, inch};
use cw_placement::{
    ActionContext, InputEvent, ModalStatus, Pointer, SessionAction, SharedSession,
    create_shared_session, process_pending_actions,
};
use glam::Vec3;

fn send(session: &SharedSession, event: InputEvent) -> ModalStatus {
    session.lock().handle_event(event)
}

fn click_at(session: &SharedSession, point: Vec3) -> ModalStatus {
    send(session, InputEvent::PointerMoved(Pointer::on_floor(point)));
    send(session, InputEvent::Click)
}

fn report(session: &SharedSession) {
    if let Some(status) = session.lock().take_status() {
        tracing::info!("{}", status);
    }
}

fn main() -> Result<(), ProjectError> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cw_placement=debug,cw_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("room.cwp"));

    let settings = Settings::default()
        .with_units(UnitSettings::imperial())
        .with_grid_spacing(0.0);
    let session = create_shared_session(Project::with_settings("Demo Kitchen", settings));
    let ctx = ActionContext::new(&session);

    // Clockwise so every wall front faces into the room
    session.lock().queue_action(SessionAction::StartWallDrawing);
    process_pending_actions(&ctx);
    let corners = [
        Vec3::ZERO,
        Vec3::new(0.0, inch(120.0), 0.0),
        Vec3::new(inch(144.0), inch(120.0), 0.0),
        Vec3::new(inch(144.0), 0.0, 0.0),
        Vec3::ZERO,
    ];
    for corner in corners {
        if click_at(&session, corner).is_done() {
            break;
        }
    }
    report(&session);

    let has_walls = {
        let guard = session.lock();
        let walls = guard.project.scene.walls();
        for &wall in &walls {
            if let Ok(info) = guard.project.scene.wall(wall) {
                tracing::info!(
                    "Wall {}: length {:.3} m, miters {:.3} / {:.3}",
                    wall,
                    info.length,
                    info.left_angle,
                    info.right_angle
                );
            }
        }
        !walls.is_empty()
    };

    if has_walls {
        session.lock().queue_action(SessionAction::PlaceProduct(ProductKind::Cabinet(
            CabinetKind::Base,
        )));
        process_pending_actions(&ctx);
        // Plan view, just inside the first wall's front face
        let inside = Vec3::new(inch(5.0), inch(60.0), 0.0);
        send(&session, InputEvent::PointerMoved(Pointer::on_floor(inside)));
        tracing::info!("{}", session.lock().tool().header());
        send(&session, InputEvent::Click);
        report(&session);
    }

    session
        .lock()
        .queue_action(SessionAction::ApplyStyle("Shaker".to_string()));
    process_pending_actions(&ctx);
    while send(&session, InputEvent::Timer) == ModalStatus::Running {}
    report(&session);

    session.lock().queue_action(SessionAction::SaveProject(path));
    process_pending_actions(&ctx);
    report(&session);

    let guard = session.lock();
    if guard.modified {
        return Err(ProjectError::Io(format!(
            "project '{}' was not saved",
            guard.project.name
        )));
    }
    tracing::info!(
        "Done: {} object(s) in '{}'",
        guard.project.scene.len(),
        guard.project.name
    );
    Ok(())
}
