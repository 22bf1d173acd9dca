//! 编辑工具状态机。每个工具只保存自己的点击累积状态，文档与历史都通过 `Scene` 显式传入。

pub mod curve;
pub mod line;
pub mod plane;
pub mod point;
pub mod polyline;

use geomedit_core::document::{EntityId, EntityKind};
use glam::DVec2;
use tracing::debug;

use crate::errors::EditError;
use crate::scene::Scene;
use crate::selection::{DEFAULT_PIXEL_THRESHOLD, DEFAULT_WORLD_THRESHOLD, Picked};
use crate::viewport::Viewport;

pub use curve::CurveTool;
pub use line::LineTool;
pub use plane::PlaneTool;
pub use point::{DragConstraint, PointTool, SnapSettings};
pub use polyline::PolylineTool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolMode {
    #[default]
    Select,
    Point,
    Line,
    Polyline,
    Curve,
    Plane,
}

impl ToolMode {
    pub const ALL: [ToolMode; 6] = [
        ToolMode::Select,
        ToolMode::Point,
        ToolMode::Line,
        ToolMode::Polyline,
        ToolMode::Curve,
        ToolMode::Plane,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ToolMode::Select => "select",
            ToolMode::Point => "point",
            ToolMode::Line => "line",
            ToolMode::Polyline => "polyline",
            ToolMode::Curve => "curve",
            ToolMode::Plane => "plane",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.label() == raw)
    }
}

/// 一次点击或结束操作的结果。
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// 点击没有落在工具关心的对象上。
    Ignored,
    Selected(Picked),
    /// 点击已记录，等待更多输入。
    Pending { count: usize },
    Created { kind: EntityKind, id: EntityId },
    /// 累积的输入无法构成实体，已清空。
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolSettings {
    pub pick_radius_px: f64,
    pub world_pick_threshold: f64,
    pub snap: SnapSettings,
    pub curve_degree: usize,
    pub curve_samples: usize,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            pick_radius_px: DEFAULT_PIXEL_THRESHOLD,
            world_pick_threshold: DEFAULT_WORLD_THRESHOLD,
            snap: SnapSettings::default(),
            curve_degree: geomedit_core::document::Curve::DEFAULT_DEGREE,
            curve_samples: geomedit_core::document::Curve::DEFAULT_SAMPLE_COUNT,
        }
    }
}

/// 在已累积的点序列末尾追加点，跳过与末尾相同的重复点击。
pub(crate) fn push_distinct(ids: &mut Vec<EntityId>, id: EntityId) -> bool {
    if ids.last() == Some(&id) {
        return false;
    }
    ids.push(id);
    true
}

/// 当前工具模式与各工具实例。切换模式会清空所有工具的累积状态。
#[derive(Debug, Clone, Default)]
pub struct Toolbox {
    mode: ToolMode,
    settings: ToolSettings,
    pub point: PointTool,
    pub line: LineTool,
    pub polyline: PolylineTool,
    pub curve: CurveTool,
    pub plane: PlaneTool,
}

impl Toolbox {
    pub fn new(settings: ToolSettings) -> Self {
        Self {
            mode: ToolMode::Select,
            settings,
            point: PointTool::new(settings.snap),
            line: LineTool::default(),
            polyline: PolylineTool::default(),
            curve: CurveTool::new(settings.curve_degree, settings.curve_samples),
            plane: PlaneTool::default(),
        }
    }

    #[inline]
    pub fn mode(&self) -> ToolMode {
        self.mode
    }

    #[inline]
    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    pub fn set_mode(&mut self, mode: ToolMode) {
        if mode != self.mode {
            debug!(from = self.mode.label(), to = mode.label(), "切换编辑工具");
        }
        self.reset();
        self.mode = mode;
    }

    pub fn reset(&mut self) {
        self.point.cancel_drag();
        self.line.reset();
        self.polyline.reset();
        self.curve.reset();
        self.plane.reset();
    }

    /// 主按键点击，分派给当前工具。
    pub fn click(
        &mut self,
        scene: &mut Scene,
        viewport: &dyn Viewport,
        screen: DVec2,
    ) -> Result<ClickOutcome, EditError> {
        let radius = self.settings.pick_radius_px;
        match self.mode {
            ToolMode::Select => Ok(scene
                .select_at_screen_position(viewport, screen, radius)
                .map_or(ClickOutcome::Ignored, ClickOutcome::Selected)),
            ToolMode::Point => {
                let id = self.point.click(scene, viewport, screen)?;
                Ok(ClickOutcome::Created {
                    kind: EntityKind::Point,
                    id,
                })
            }
            ToolMode::Line => self.line.click(scene, viewport, screen, radius),
            ToolMode::Polyline => self.polyline.click(scene, viewport, screen, radius),
            ToolMode::Curve => self.curve.click(scene, viewport, screen, radius),
            ToolMode::Plane => self.plane.click(scene, viewport, screen, radius),
        }
    }

    /// 结束当前累积（次按键点击）。只有折线和曲线工具需要显式结束。
    pub fn finish(&mut self, scene: &mut Scene) -> Result<ClickOutcome, EditError> {
        match self.mode {
            ToolMode::Polyline => self.polyline.finish(scene),
            ToolMode::Curve => self.curve.finish(scene),
            ToolMode::Line | ToolMode::Plane => {
                self.reset();
                Ok(ClickOutcome::Reset)
            }
            ToolMode::Select | ToolMode::Point => Ok(ClickOutcome::Ignored),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes_parse_from_labels() {
        for mode in ToolMode::ALL {
            assert_eq!(ToolMode::parse(mode.label()), Some(mode));
        }
        assert_eq!(ToolMode::parse("eraser"), None);
    }

    #[test]
    fn push_distinct_skips_immediate_repeats() {
        let mut ids = Vec::new();
        assert!(push_distinct(&mut ids, "a".into()));
        assert!(!push_distinct(&mut ids, "a".into()));
        assert!(push_distinct(&mut ids, "b".into()));
        assert!(push_distinct(&mut ids, "a".into()));
        assert_eq!(ids.len(), 3);
    }
}
