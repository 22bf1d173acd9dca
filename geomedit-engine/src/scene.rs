use std::fmt;

use geomedit_core::document::{Document, EndpointRef, EntityId, EntityKind, Line, Plane, Point};
use geomedit_core::geometry::{Point3, Rgb, WorkspaceBounds};
use glam::{DVec2, DVec3};
use tracing::{debug, info};

use crate::commands::{CreateLineCommand, CreatePointCommand};
use crate::errors::EditError;
use crate::history::{EditCommand, EditContext, UndoManager};
use crate::selection::{self, Highlight, Picked, SelectionKind, SelectionState};
use crate::tools::plane::build_from_lines;
use crate::viewport::{Renderer, Viewport};

/// 边界盒 12 条棱对应的角点下标。
const BOUNDARY_EDGES: [(usize, usize); 12] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 0),
    (4, 5),
    (5, 6),
    (6, 7),
    (7, 4),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

/// 边界盒 6 个面对应的角点下标。
const BOUNDARY_FACES: [[usize; 4]; 6] = [
    [0, 1, 2, 3],
    [4, 5, 6, 7],
    [0, 1, 5, 4],
    [1, 2, 6, 5],
    [2, 3, 7, 6],
    [3, 0, 4, 7],
];

/// 演示场景中的关键实体。
#[derive(Debug, Clone)]
pub struct DemoEntities {
    pub points: [EntityId; 4],
    pub lines: [EntityId; 4],
    pub plane: EntityId,
}

/// 各类实体数量与历史深度，供前端输出摘要。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SceneSummary {
    pub points: usize,
    pub lines: usize,
    pub polylines: usize,
    pub curves: usize,
    pub planes: usize,
    pub undo_depth: usize,
    pub redo_depth: usize,
}

/// 编辑引擎的唯一状态持有者：文档、选择、历史、工作空间边界与可选的渲染器。
pub struct Scene {
    document: Document,
    selection: SelectionState,
    history: UndoManager,
    bounds: WorkspaceBounds,
    renderer: Option<Box<dyn Renderer>>,
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("document", &self.document)
            .field("selection", &self.selection)
            .field("history", &self.history)
            .field("bounds", &self.bounds)
            .field("renderer", &self.renderer.is_some())
            .finish()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::with_bounds(WorkspaceBounds::default())
    }

    pub fn with_bounds(bounds: WorkspaceBounds) -> Self {
        Self {
            document: Document::new(),
            selection: SelectionState::new(),
            history: UndoManager::default(),
            bounds,
            renderer: None,
        }
    }

    #[inline]
    pub fn document(&self) -> &Document {
        &self.document
    }

    #[inline]
    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    #[inline]
    pub fn history(&self) -> &UndoManager {
        &self.history
    }

    #[inline]
    pub fn bounds(&self) -> &WorkspaceBounds {
        &self.bounds
    }

    pub fn set_undo_limit(&mut self, limit: usize) {
        self.history.set_max_items(limit);
    }

    /// 挂接渲染器并立即渲染全部可见实体。
    pub fn set_renderer(&mut self, renderer: Box<dyn Renderer>) {
        self.renderer = Some(renderer);
        self.render_all();
    }

    pub fn take_renderer(&mut self) -> Option<Box<dyn Renderer>> {
        self.renderer.take()
    }

    pub fn has_renderer(&self) -> bool {
        self.renderer.is_some()
    }

    fn split(&mut self) -> (&mut UndoManager, EditContext<'_>) {
        let renderer = self
            .renderer
            .as_deref_mut()
            .map(|renderer| renderer as &mut dyn Renderer);
        (
            &mut self.history,
            EditContext::new(&mut self.document, &mut self.selection, renderer),
        )
    }

    fn context(&mut self) -> EditContext<'_> {
        self.split().1
    }

    /// 重新渲染所有非锁定实体（边界几何不渲染）。
    pub fn render_all(&mut self) {
        if self.renderer.is_none() {
            return;
        }
        let mut targets: Vec<(EntityKind, EntityId)> = Vec::new();
        targets.extend(self.document.points().map(|p| (EntityKind::Point, p.id.clone())));
        targets.extend(self.document.lines().map(|l| (EntityKind::Line, l.id.clone())));
        targets.extend(
            self.document
                .polylines()
                .map(|p| (EntityKind::Polyline, p.id.clone())),
        );
        targets.extend(self.document.curves().map(|c| (EntityKind::Curve, c.id.clone())));
        targets.extend(self.document.planes().map(|p| (EntityKind::Plane, p.id.clone())));

        let mut ctx = self.context();
        for (kind, id) in &targets {
            ctx.render(*kind, id);
        }
    }

    // ---- 命令与历史 ----

    pub fn execute<C: EditCommand + 'static>(&mut self, command: C) -> Result<(), EditError> {
        self.execute_boxed(Box::new(command))
    }

    pub fn execute_boxed(&mut self, command: Box<dyn EditCommand>) -> Result<(), EditError> {
        let (history, mut ctx) = self.split();
        history.execute_and_push(command, &mut ctx)
    }

    pub fn undo(&mut self) -> Result<(), EditError> {
        let (history, mut ctx) = self.split();
        history.undo(&mut ctx)
    }

    pub fn redo(&mut self) -> Result<(), EditError> {
        let (history, mut ctx) = self.split();
        history.redo(&mut ctx)
    }

    /// 清空用户实体、选择与历史，保留边界设置与渲染器。
    /// 重置前已生成的边界几何会按当前边界重新生成。
    pub fn reset(&mut self) {
        let had_boundary = self.document.all_points().any(|point| point.locked);
        let mut ids: Vec<(EntityKind, EntityId)> = Vec::new();
        ids.extend(self.document.points().map(|p| (EntityKind::Point, p.id.clone())));
        ids.extend(self.document.lines().map(|l| (EntityKind::Line, l.id.clone())));
        ids.extend(self.document.polylines().map(|p| (EntityKind::Polyline, p.id.clone())));
        ids.extend(self.document.curves().map(|c| (EntityKind::Curve, c.id.clone())));
        ids.extend(self.document.planes().map(|p| (EntityKind::Plane, p.id.clone())));
        {
            let mut ctx = self.context();
            for (kind, id) in &ids {
                ctx.remove_rendered(*kind, id);
            }
        }
        self.document = Document::new();
        self.selection = SelectionState::new();
        self.history.clear();
        if had_boundary {
            self.init_boundary_geometry();
        }
    }

    // ---- 边界几何 ----

    /// 生成工作空间边界盒：8 个角点、12 条棱、6 个面，全部锁定且不渲染。
    /// 已存在的同名实体保持不变，返回新增实体数量。
    pub fn init_boundary_geometry(&mut self) -> usize {
        let corners = self.bounds.corners();
        let mut created = 0;

        for (index, corner) in corners.iter().enumerate() {
            let mut point = Point::new(format!("boundary_point_{index}"), Point3::from_vec(*corner));
            point.color = Rgb::BOUNDARY_GRAY;
            point.locked = true;
            created += usize::from(self.document.insert_point(point));
        }

        for (index, (a, b)) in BOUNDARY_EDGES.iter().enumerate() {
            let mut line = Line::new(
                format!("boundary_line_{index}"),
                EndpointRef::Coordinate(Point3::from_vec(corners[*a])),
                EndpointRef::Coordinate(Point3::from_vec(corners[*b])),
            );
            line.color = Rgb::BOUNDARY_GRAY;
            line.locked = true;
            created += usize::from(self.document.insert_line(line));
        }

        for (index, face) in BOUNDARY_FACES.iter().enumerate() {
            let vertices = face
                .iter()
                .map(|corner| Point3::from_vec(corners[*corner]))
                .collect();
            let mut plane = Plane::new(format!("boundary_plane_{index}"), vertices);
            plane.color = Rgb::BOUNDARY_GRAY;
            plane.locked = true;
            created += usize::from(self.document.insert_plane(plane));
        }

        debug!(created, bounds = ?self.bounds.to_array(), "已生成边界几何");
        created
    }

    // ---- 选择 ----

    pub fn select_at_screen_position(
        &mut self,
        viewport: &dyn Viewport,
        screen: DVec2,
        pixel_threshold: f64,
    ) -> Option<Picked> {
        selection::select_at_screen_position(
            &self.document,
            &mut self.selection,
            viewport,
            screen,
            pixel_threshold,
        )
    }

    pub fn select_at_position(&mut self, world: DVec3, threshold: f64) -> Option<Picked> {
        selection::select_at_position(&self.document, &mut self.selection, world, threshold)
    }

    /// 按 id 直接选中实体。
    pub fn select(&mut self, kind: SelectionKind, id: &EntityId) -> Result<(), EditError> {
        let entity_kind = kind.entity_kind();
        if !self.document.contains(entity_kind, id) {
            return Err(EditError::not_found(entity_kind, id));
        }
        self.selection.select(kind, id.clone());
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn set_active_plane(&mut self, plane: Option<&EntityId>) -> Result<(), EditError> {
        if let Some(id) = plane {
            if self.document.plane(id).is_none() {
                return Err(EditError::not_found(EntityKind::Plane, id));
            }
        }
        self.selection.set_active_plane(plane.cloned());
        Ok(())
    }

    /// 当前选中实体的聚焦点：点取自身位置，线取中点，面取顶点均值。
    pub fn focus_point(&self) -> Option<DVec3> {
        let (kind, id) = self.selection.selected()?;
        match kind {
            SelectionKind::Point => self.document.point(id).map(|p| p.position.as_vec3()),
            SelectionKind::Line => {
                let (start, end) = self.document.line_endpoints(id)?;
                Some((start.as_vec3() + end.as_vec3()) * 0.5)
            }
            SelectionKind::Plane => self.document.plane(id)?.centroid(),
        }
    }

    // ---- 高亮 ----

    /// 以指定颜色重新渲染实体并缓存原色。实体自身存储的颜色不变。
    pub fn switch_highlight(
        &mut self,
        kind: EntityKind,
        id: &EntityId,
        color: Rgb,
    ) -> Result<(), EditError> {
        let original = self
            .document
            .color(kind, id)
            .ok_or_else(|| EditError::not_found(kind, id))?;
        self.clear_highlight();
        self.selection.set_highlight(Highlight {
            kind,
            id: id.clone(),
            original,
        });
        self.context().render_as(kind, id, Some(color));
        Ok(())
    }

    /// 恢复高亮实体的原色。
    pub fn clear_highlight(&mut self) {
        let Some(highlight) = self.selection.take_highlight() else {
            return;
        };
        self.context()
            .render_as(highlight.kind, &highlight.id, Some(highlight.original));
    }

    // ---- 摘要与演示 ----

    pub fn summary(&self) -> SceneSummary {
        SceneSummary {
            points: self.document.points().count(),
            lines: self.document.lines().count(),
            polylines: self.document.polylines().count(),
            curves: self.document.curves().count(),
            planes: self.document.planes().count(),
            undo_depth: self.history.undo_len(),
            redo_depth: self.history.redo_len(),
        }
    }

    /// 填充一个 10×10 正方形：四个点、四条首尾相接的线以及由线段链闭合出的面。
    pub fn populate_demo(&mut self) -> Result<DemoEntities, EditError> {
        self.clear_selection();

        let corners = [
            [0.0, 0.0, 0.0],
            [10.0, 0.0, 0.0],
            [10.0, 10.0, 0.0],
            [0.0, 10.0, 0.0],
        ];
        let mut points = Vec::with_capacity(4);
        for corner in corners {
            let id = self.document.next_id(EntityKind::Point);
            self.execute(CreatePointCommand::new(id.clone(), corner))?;
            points.push(id);
        }

        let mut lines = Vec::with_capacity(4);
        for index in 0..points.len() {
            let next = (index + 1) % points.len();
            let id = self.document.next_id(EntityKind::Line);
            self.execute(CreateLineCommand::between_points(
                id.clone(),
                points[index].clone(),
                points[next].clone(),
            ))?;
            lines.push(id);
        }

        let polygon = build_from_lines(&self.document, &lines)?;
        let plane = self.document.next_id(EntityKind::Plane);
        self.execute(polygon.into_command(plane.clone()))?;

        let to_array = |ids: Vec<EntityId>| -> Result<[EntityId; 4], EditError> {
            ids.try_into()
                .map_err(|_| EditError::Degenerate("demo scene expects four entities"))
        };
        let demo = DemoEntities {
            points: to_array(points)?,
            lines: to_array(lines)?,
            plane,
        };
        info!(plane = %demo.plane, "已创建演示实体");
        Ok(demo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::MovePointCommand;

    #[test]
    fn demo_population_creates_square_plane() {
        let mut scene = Scene::new();
        let demo = scene.populate_demo().unwrap();
        let summary = scene.summary();
        assert_eq!(summary.points, 4);
        assert_eq!(summary.lines, 4);
        assert_eq!(summary.planes, 1);
        assert_eq!(summary.undo_depth, 9);

        let plane = scene.document().plane(&demo.plane).unwrap();
        assert_eq!(plane.vertices[2], Point3::new(10.0, 10.0, 0.0));
    }

    #[test]
    fn boundary_geometry_is_locked_and_hidden_from_iteration() {
        let mut scene = Scene::new();
        assert_eq!(scene.init_boundary_geometry(), 26);
        assert_eq!(scene.init_boundary_geometry(), 0);

        let doc = scene.document();
        assert_eq!(doc.points().count(), 0);
        assert_eq!(doc.all_points().count(), 8);
        assert_eq!(doc.all_planes().count(), 6);
        let top = doc.plane(&"boundary_plane_1".into()).unwrap();
        assert_eq!(top.color, Rgb::BOUNDARY_GRAY);
        assert!(top.vertices.iter().all(|v| v.z() == 0.0));
        assert_eq!(
            doc.line_endpoints(&"boundary_line_8".into()),
            Some((
                Point3::new(-100.0, -100.0, -50.0),
                Point3::new(-100.0, -100.0, 0.0)
            ))
        );
    }

    #[test]
    fn boundary_entities_reject_edits() {
        let mut scene = Scene::new();
        scene.init_boundary_geometry();
        let err = scene
            .execute(MovePointCommand::to("boundary_point_0", [0.0, 0.0, 0.0]))
            .unwrap_err();
        assert!(matches!(err, EditError::Locked { .. }));
        assert!(!scene.history().can_undo());
    }

    #[test]
    fn focus_point_follows_selection() {
        let mut scene = Scene::new();
        let demo = scene.populate_demo().unwrap();
        assert!(scene.focus_point().is_none());

        scene.select(SelectionKind::Line, &demo.lines[0]).unwrap();
        assert_eq!(scene.focus_point(), Some(DVec3::new(5.0, 0.0, 0.0)));

        scene.select(SelectionKind::Plane, &demo.plane).unwrap();
        assert_eq!(scene.focus_point(), Some(DVec3::new(5.0, 5.0, 0.0)));
        assert_eq!(scene.selection().active_plane(), Some(&demo.plane));

        let missing = EntityId::from("nope");
        assert!(scene.select(SelectionKind::Point, &missing).is_err());
    }

    #[test]
    fn highlight_never_touches_stored_color() {
        let mut scene = Scene::new();
        let demo = scene.populate_demo().unwrap();
        let id = &demo.points[0];
        scene
            .switch_highlight(EntityKind::Point, id, Rgb::YELLOW)
            .unwrap();
        assert_eq!(scene.document().color(EntityKind::Point, id), Some(Rgb::RED));
        assert_eq!(scene.selection().highlight().map(|h| h.original), Some(Rgb::RED));

        scene.clear_highlight();
        assert!(scene.selection().highlight().is_none());
    }

    #[test]
    fn reset_clears_document_and_history() {
        let mut scene = Scene::new();
        scene.populate_demo().unwrap();
        scene.reset();
        assert_eq!(scene.summary(), SceneSummary::default());
    }

    #[test]
    fn reset_keeps_boundary_geometry() {
        let mut scene = Scene::new();
        assert_eq!(scene.init_boundary_geometry(), 26);
        scene.populate_demo().unwrap();
        scene.reset();
        assert_eq!(scene.summary(), SceneSummary::default());
        assert_eq!(scene.document().all_points().count(), 8);
        assert_eq!(scene.document().all_planes().count(), 6);
        assert_eq!(scene.init_boundary_geometry(), 0);
    }
}
