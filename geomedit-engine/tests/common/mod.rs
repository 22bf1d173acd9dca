#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use geomedit_core::document::{EntityId, EntityKind};
use geomedit_core::geometry::Rgb;
use geomedit_engine::viewport::Renderer;
use glam::DVec3;

#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    Point(EntityId, DVec3, Rgb),
    Line(EntityId, DVec3, DVec3, Rgb),
    Polyline(EntityId, usize, Rgb),
    Polygon(EntityId, Vec<DVec3>, Rgb),
    Removed(EntityKind, EntityId),
}

impl RenderEvent {
    pub fn id(&self) -> &EntityId {
        match self {
            RenderEvent::Point(id, ..)
            | RenderEvent::Line(id, ..)
            | RenderEvent::Polyline(id, ..)
            | RenderEvent::Polygon(id, ..)
            | RenderEvent::Removed(_, id) => id,
        }
    }
}

/// 把所有渲染调用记到共享日志里，测试从另一端读取。
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    pub log: Rc<RefCell<Vec<RenderEvent>>>,
}

impl RecordingRenderer {
    pub fn new() -> (Self, Rc<RefCell<Vec<RenderEvent>>>) {
        let renderer = Self::default();
        let log = Rc::clone(&renderer.log);
        (renderer, log)
    }
}

impl Renderer for RecordingRenderer {
    fn render_point(&mut self, id: &EntityId, position: DVec3, color: Rgb) {
        self.log
            .borrow_mut()
            .push(RenderEvent::Point(id.clone(), position, color));
    }

    fn render_line(&mut self, id: &EntityId, start: DVec3, end: DVec3, color: Rgb) {
        self.log
            .borrow_mut()
            .push(RenderEvent::Line(id.clone(), start, end, color));
    }

    fn render_polyline(&mut self, id: &EntityId, vertices: &[DVec3], color: Rgb) {
        self.log
            .borrow_mut()
            .push(RenderEvent::Polyline(id.clone(), vertices.len(), color));
    }

    fn render_polygon(&mut self, id: &EntityId, vertices: &[DVec3], color: Rgb) {
        self.log
            .borrow_mut()
            .push(RenderEvent::Polygon(id.clone(), vertices.to_vec(), color));
    }

    fn remove_rendered(&mut self, kind: EntityKind, id: &EntityId) {
        self.log
            .borrow_mut()
            .push(RenderEvent::Removed(kind, id.clone()));
    }
}
