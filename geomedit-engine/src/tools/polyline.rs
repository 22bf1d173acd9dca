use geomedit_core::document::{EntityId, EntityKind};
use glam::DVec2;
use tracing::debug;

use crate::commands::CreatePolylineCommand;
use crate::errors::EditError;
use crate::scene::Scene;
use crate::selection::SelectionKind;
use crate::tools::{ClickOutcome, push_distinct};
use crate::viewport::Viewport;

/// 折线工具：累积点选的点，结束时生成一条折线。
#[derive(Debug, Clone, Default)]
pub struct PolylineTool {
    point_ids: Vec<EntityId>,
}

impl PolylineTool {
    pub const MIN_POINTS: usize = 2;

    pub fn reset(&mut self) {
        self.point_ids.clear();
    }

    pub fn pending(&self) -> &[EntityId] {
        &self.point_ids
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
                push_distinct(&mut self.point_ids, picked.id);
                Ok(ClickOutcome::Pending {
                    count: self.point_ids.len(),
                })
            }
            _ => Ok(ClickOutcome::Ignored),
        }
    }

    /// 点数不足时清空累积且不创建任何实体。
    pub fn finish(&mut self, scene: &mut Scene) -> Result<ClickOutcome, EditError> {
        let point_ids = std::mem::take(&mut self.point_ids);
        if point_ids.len() < Self::MIN_POINTS {
            debug!(count = point_ids.len(), "折线点数不足，放弃");
            return Ok(ClickOutcome::Reset);
        }
        let id = scene.document().next_id(EntityKind::Polyline);
        scene.execute(CreatePolylineCommand::new(id.clone(), point_ids))?;
        Ok(ClickOutcome::Created {
            kind: EntityKind::Polyline,
            id,
        })
    }
}
