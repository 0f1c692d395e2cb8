//! Timer-driven style update over many cabinets
//!
//! One cabinet is processed per timer tick so the event loop stays
//! responsive. Cancelling keeps the cabinets already updated.

use cw_core::{ObjectTag, Scene};
use tracing::{debug, info};
use uuid::Uuid;

use crate::event::ModalStatus;
use crate::status::{StatusMessage, report_error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkState {
    Running,
    Finished,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct BulkStyleJob {
    targets: Vec<Uuid>,
    style: String,
    done: usize,
    state: BulkState,
    status: Option<StatusMessage>,
}

impl BulkStyleJob {
    pub fn new(targets: Vec<Uuid>, style: impl Into<String>) -> Self {
        Self {
            targets,
            style: style.into(),
            done: 0,
            state: BulkState::Running,
            status: None,
        }
    }

    /// Every cabinet in the scene, in creation order
    pub fn for_all_cabinets(scene: &Scene, style: impl Into<String>) -> Self {
        Self::new(scene.objects_with_tag(ObjectTag::Cabinet), style)
    }

    pub fn style(&self) -> &str {
        &self.style
    }

    pub fn total(&self) -> usize {
        self.targets.len()
    }

    pub fn done(&self) -> usize {
        self.done
    }

    pub fn state(&self) -> BulkState {
        self.state
    }

    /// Fraction done. Stays below 1 until the job has finished.
    pub fn progress(&self) -> f32 {
        match self.state {
            BulkState::Finished => 1.0,
            _ if self.targets.is_empty() => 0.0,
            _ => (self.done as f32 / self.targets.len() as f32).min(0.99),
        }
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn take_status(&mut self) -> Option<StatusMessage> {
        self.status.take()
    }

    /// Process one cabinet
    pub fn tick(&mut self, scene: &mut Scene) -> ModalStatus {
        if self.state != BulkState::Running {
            return ModalStatus::PassThrough;
        }

        if let Some(&id) = self.targets.get(self.done) {
            if let Err(e) = scene.apply_style(id, &self.style) {
                report_error(&mut self.status, e);
            }
            self.done += 1;
            debug!("Styled {} ({}/{})", id, self.done, self.targets.len());
        }

        if self.done >= self.targets.len() {
            if let Err(e) = scene.recalculate() {
                report_error(&mut self.status, e);
            }
            let text = format!(
                "Updated {} cabinet(s) with style '{}'",
                self.done, self.style
            );
            info!("{}", text);
            self.status = Some(StatusMessage::info(text));
            self.state = BulkState::Finished;
            return ModalStatus::Finished;
        }
        ModalStatus::Running
    }

    /// Stop early; already updated cabinets keep the new style
    pub fn cancel(&mut self) -> ModalStatus {
        if self.state != BulkState::Running {
            return ModalStatus::PassThrough;
        }
        let text = format!("Cancelled. Updated {} of {}", self.done, self.targets.len());
        info!("{}", text);
        self.status = Some(StatusMessage::info(text));
        self.state = BulkState::Cancelled;
        ModalStatus::Cancelled
    }
}
