use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use geomedit_core::document::{EntityId, EntityKind};
use geomedit_core::geometry::Rgb;
use geomedit_engine::viewport::Renderer;
use glam::DVec3;
use tracing::trace;

/// 渲染出口能区分的图元类别。曲线以采样折线输出。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Point,
    Line,
    Polyline,
    Polygon,
}

impl From<EntityKind> for Primitive {
    fn from(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Point => Primitive::Point,
            EntityKind::Line => Primitive::Line,
            EntityKind::Polyline | EntityKind::Curve => Primitive::Polyline,
            EntityKind::Plane => Primitive::Polygon,
        }
    }
}

/// 渲染统计：调用次数与当前仍在显示的图元。
#[derive(Debug, Clone, Default)]
pub struct RenderStats {
    pub rendered: usize,
    pub removed: usize,
    pub visible: HashSet<(Primitive, EntityId)>,
}

impl RenderStats {
    pub fn visible_count(&self, primitive: Primitive) -> usize {
        self.visible.iter().filter(|(p, _)| *p == primitive).count()
    }
}

/// 没有图形后端时使用的渲染出口：把每次渲染写成 `trace` 事件并维护统计。
#[derive(Debug, Clone, Default)]
pub struct TracingRenderer {
    stats: Rc<RefCell<RenderStats>>,
}

impl TracingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 与渲染器共享的统计句柄，渲染器交给场景后仍可读取。
    pub fn stats(&self) -> Rc<RefCell<RenderStats>> {
        Rc::clone(&self.stats)
    }

    fn record(&mut self, primitive: Primitive, id: &EntityId) {
        let mut stats = self.stats.borrow_mut();
        stats.rendered += 1;
        stats.visible.insert((primitive, id.clone()));
    }
}

impl Renderer for TracingRenderer {
    fn render_point(&mut self, id: &EntityId, position: DVec3, color: Rgb) {
        trace!(id = %id, ?position, ?color, "渲染点");
        self.record(Primitive::Point, id);
    }

    fn render_line(&mut self, id: &EntityId, start: DVec3, end: DVec3, color: Rgb) {
        trace!(id = %id, ?start, ?end, ?color, "渲染线");
        self.record(Primitive::Line, id);
    }

    fn render_polyline(&mut self, id: &EntityId, vertices: &[DVec3], color: Rgb) {
        trace!(id = %id, vertices = vertices.len(), ?color, "渲染折线");
        self.record(Primitive::Polyline, id);
    }

    fn render_polygon(&mut self, id: &EntityId, vertices: &[DVec3], color: Rgb) {
        trace!(id = %id, vertices = vertices.len(), ?color, "渲染面");
        self.record(Primitive::Polygon, id);
    }

    fn remove_rendered(&mut self, kind: EntityKind, id: &EntityId) {
        trace!(kind = %kind, id = %id, "移除渲染");
        let mut stats = self.stats.borrow_mut();
        stats.removed += 1;
        stats.visible.remove(&(Primitive::from(kind), id.clone()));
    }
}
