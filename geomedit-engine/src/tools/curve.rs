use geomedit_core::document::{Curve, EntityId, EntityKind};
use glam::DVec2;
use tracing::debug;

use crate::commands::CreateCurveCommand;
use crate::errors::EditError;
use crate::scene::Scene;
use crate::selection::SelectionKind;
use crate::tools::{ClickOutcome, push_distinct};
use crate::viewport::Viewport;

/// 曲线工具：与折线工具相同的累积方式，结束时至少需要三个控制点。
#[derive(Debug, Clone)]
pub struct CurveTool {
    control_ids: Vec<EntityId>,
    degree: usize,
    sample_count: usize,
}

impl Default for CurveTool {
    fn default() -> Self {
        Self::new(Curve::DEFAULT_DEGREE, Curve::DEFAULT_SAMPLE_COUNT)
    }
}

impl CurveTool {
    pub const MIN_CONTROL_POINTS: usize = 3;

    pub fn new(degree: usize, sample_count: usize) -> Self {
        Self {
            control_ids: Vec::new(),
            degree,
            sample_count,
        }
    }

    pub fn reset(&mut self) {
        self.control_ids.clear();
    }

    pub fn pending(&self) -> &[EntityId] {
        &self.control_ids
    }

    pub fn click(
        &mut self,
        scene: &mut Scene,
        viewport: &dyn Viewport,
        screen: DVec2,
        pick_radius: f64,
    ) -> Result<ClickOutcome, EditError> {
        match scene.select_at_screen_position(viewport, screen, pick_radius) {
            Some(picked) if picked.kind == SelectionKind::Point => {
                push_distinct(&mut self.control_ids, picked.id);
                Ok(ClickOutcome::Pending {
                    count: self.control_ids.len(),
                })
            }
            _ => Ok(ClickOutcome::Ignored),
        }
    }

    pub fn finish(&mut self, scene: &mut Scene) -> Result<ClickOutcome, EditError> {
        let control_ids = std::mem::take(&mut self.control_ids);
        if control_ids.len() < Self::MIN_CONTROL_POINTS {
            debug!(count = control_ids.len(), "曲线控制点不足，放弃");
            return Ok(ClickOutcome::Reset);
        }
        let id = scene.document().next_id(EntityKind::Curve);
        scene.execute(CreateCurveCommand::new(
            id.clone(),
            control_ids,
            self.degree,
            self.sample_count,
        ))?;
        Ok(ClickOutcome::Created {
            kind: EntityKind::Curve,
            id,
        })
    }
}
