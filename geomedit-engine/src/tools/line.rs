use geomedit_core::document::{EntityId, EntityKind};
use glam::DVec2;

use crate::commands::CreateLineCommand;
use crate::errors::EditError;
use crate::scene::Scene;
use crate::selection::SelectionKind;
use crate::tools::ClickOutcome;
use crate::viewport::Viewport;

/// 线工具：依次点选已有点，每次点击都把最近两个不同的点连成线段。
#[derive(Debug, Clone, Default)]
pub struct LineTool {
    clicked: Vec<EntityId>,
}

impl LineTool {
    pub fn reset(&mut self) {
        self.clicked.clear();
    }

    pub fn pending(&self) -> &[EntityId] {
        &self.clicked
    }

    pub fn click(
        &mut self,
        scene: &mut Scene,
        viewport: &dyn Viewport,
        screen: DVec2,
        pick_radius: f64,
    ) -> Result<ClickOutcome, EditError> {
        match scene.select_at_screen_position(viewport, screen, pick_radius) {
            Some(picked) if picked.kind == SelectionKind::Point => self.add_point(scene, picked.id),
            _ => Ok(ClickOutcome::Ignored),
        }
    }

    pub fn add_point(&mut self, scene: &mut Scene, id: EntityId) -> Result<ClickOutcome, EditError> {
        if scene.document().point(&id).is_none() {
            return Err(EditError::not_found(EntityKind::Point, &id));
        }
        self.clicked.push(id);
        let [.., previous, latest] = self.clicked.as_slice() else {
            return Ok(ClickOutcome::Pending { count: 1 });
        };
        if previous == latest {
            self.clicked.pop();
            return Ok(ClickOutcome::Pending {
                count: self.clicked.len(),
            });
        }

        let line_id = scene.document().next_id(EntityKind::Line);
        let command =
            CreateLineCommand::between_points(line_id.clone(), previous.clone(), latest.clone());
        // 只保留最后一个点作为下一段的起点
        self.clicked.drain(..self.clicked.len() - 1);
        scene.execute(command)?;
        Ok(ClickOutcome::Created {
            kind: EntityKind::Line,
            id: line_id,
        })
    }
}
