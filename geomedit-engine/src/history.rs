use std::collections::VecDeque;
use std::fmt;

use geomedit_core::document::{Document, EntityId, EntityKind};
use geomedit_core::geometry::Rgb;
use tracing::debug;

use crate::errors::EditError;
use crate::selection::SelectionState;
use crate::viewport::Renderer;

pub const DEFAULT_MAX_ITEMS: usize = 100;

/// 命令执行时可访问的全部可变状态。渲染器可以缺省，缺省时跳过渲染。
pub struct EditContext<'a> {
    pub document: &'a mut Document,
    pub selection: &'a mut SelectionState,
    renderer: Option<&'a mut dyn Renderer>,
}

impl<'a> EditContext<'a> {
    pub fn new(
        document: &'a mut Document,
        selection: &'a mut SelectionState,
        renderer: Option<&'a mut dyn Renderer>,
    ) -> Self {
        Self {
            document,
            selection,
            renderer,
        }
    }

    pub fn has_renderer(&self) -> bool {
        self.renderer.is_some()
    }

    /// 按文档中的当前状态重新渲染实体；实体或其引用无法解析时跳过。
    pub fn render(&mut self, kind: EntityKind, id: &EntityId) {
        self.render_as(kind, id, None);
    }

    /// 与 [`EditContext::render`] 相同，但可用 `color` 覆盖实体自身颜色（高亮）。
    pub fn render_as(&mut self, kind: EntityKind, id: &EntityId, color: Option<Rgb>) {
        let Some(renderer) = self.renderer.as_deref_mut() else {
            return;
        };
        let document = &*self.document;
        match kind {
            EntityKind::Point => {
                if let Some(point) = document.point(id) {
                    let color = color.unwrap_or(point.color);
                    renderer.render_point(id, point.position.as_vec3(), color);
                }
            }
            EntityKind::Line => {
                if let (Some(line), Some((start, end))) =
                    (document.line(id), document.line_endpoints(id))
                {
                    let color = color.unwrap_or(line.color);
                    renderer.render_line(id, start.as_vec3(), end.as_vec3(), color);
                }
            }
            EntityKind::Polyline => {
                if let (Some(polyline), Some(vertices)) =
                    (document.polyline(id), document.polyline_vertices(id))
                {
                    let vertices: Vec<_> = vertices.into_iter().map(|v| v.as_vec3()).collect();
                    renderer.render_polyline(id, &vertices, color.unwrap_or(polyline.color));
                }
            }
            EntityKind::Curve => {
                if let (Some(curve), Some(samples)) =
                    (document.curve(id), document.curve_samples(id))
                {
                    let samples: Vec<_> = samples.into_iter().map(|v| v.as_vec3()).collect();
                    renderer.render_polyline(id, &samples, color.unwrap_or(curve.color));
                }
            }
            EntityKind::Plane => {
                if let Some(plane) = document.plane(id) {
                    let vertices: Vec<_> = plane.vertices.iter().map(|v| v.as_vec3()).collect();
                    renderer.render_polygon(id, &vertices, color.unwrap_or(plane.color));
                }
            }
        }
    }

    pub fn remove_rendered(&mut self, kind: EntityKind, id: &EntityId) {
        if let Some(renderer) = self.renderer.as_deref_mut() {
            renderer.remove_rendered(kind, id);
        }
    }
}

/// 可逆的编辑命令。`execute` 失败时不得留下任何修改。
pub trait EditCommand: fmt::Debug {
    fn execute(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError>;

    fn undo(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError>;

    fn describe(&self) -> String;
}

/// 线性撤销历史：撤销栈有上限（超出时丢弃最旧项），重做栈在新操作时清空。
#[derive(Debug)]
pub struct UndoManager {
    undo_stack: VecDeque<Box<dyn EditCommand>>,
    redo_stack: Vec<Box<dyn EditCommand>>,
    max_items: usize,
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ITEMS)
    }
}

impl UndoManager {
    pub fn new(max_items: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_items: max_items.max(1),
        }
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    /// 调整上限，多出的最旧记录立即丢弃。
    pub fn set_max_items(&mut self, max_items: usize) {
        self.max_items = max_items.max(1);
        self.truncate();
    }

    fn truncate(&mut self) {
        while self.undo_stack.len() > self.max_items {
            if let Some(evicted) = self.undo_stack.pop_front() {
                debug!(command = %evicted.describe(), "撤销历史已满，丢弃最旧记录");
            }
        }
    }

    /// 执行命令，成功后入栈并清空重做栈。
    pub fn execute_and_push(
        &mut self,
        mut command: Box<dyn EditCommand>,
        ctx: &mut EditContext<'_>,
    ) -> Result<(), EditError> {
        if let Err(err) = command.execute(ctx) {
            debug!(command = %command.describe(), error = %err, "命令执行被拒绝");
            return Err(err);
        }
        debug!(command = %command.describe(), "命令已执行");
        self.undo_stack.push_back(command);
        self.truncate();
        self.redo_stack.clear();
        Ok(())
    }

    /// 撤销最近的命令；撤销失败时命令放回撤销栈。
    pub fn undo(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError> {
        let mut command = self.undo_stack.pop_back().ok_or(EditError::NothingToUndo)?;
        match command.undo(ctx) {
            Ok(()) => {
                debug!(command = %command.describe(), "已撤销");
                self.redo_stack.push(command);
                Ok(())
            }
            Err(err) => {
                debug!(command = %command.describe(), error = %err, "撤销失败，保留历史");
                self.undo_stack.push_back(command);
                Err(err)
            }
        }
    }

    /// 重做最近撤销的命令；失败时命令放回重做栈。
    pub fn redo(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError> {
        let mut command = self.redo_stack.pop().ok_or(EditError::NothingToRedo)?;
        match command.execute(ctx) {
            Ok(()) => {
                debug!(command = %command.describe(), "已重做");
                self.undo_stack.push_back(command);
                self.truncate();
                Ok(())
            }
            Err(err) => {
                debug!(command = %command.describe(), error = %err, "重做失败，保留历史");
                self.redo_stack.push(command);
                Err(err)
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.back().map(|command| command.describe())
    }

    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.last().map(|command| command.describe())
    }

    /// 撤销栈中从旧到新的命令描述。
    pub fn descriptions(&self) -> Vec<String> {
        self.undo_stack.iter().map(|command| command.describe()).collect()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
