//! 屏幕空间拾取与单选状态。

use std::cmp::Ordering;

use geomedit_core::document::{Document, EntityId, EntityKind};
use geomedit_core::geometry::{Point3, Rgb};
use geomedit_core::measure;
use glam::{DVec2, DVec3};
use tracing::debug;

use crate::convert::screen_to_display;
use crate::viewport::Viewport;

pub const DEFAULT_PIXEL_THRESHOLD: f64 = 10.0;
pub const DEFAULT_WORLD_THRESHOLD: f64 = 0.1;

/// 可被选中的实体类别，声明顺序即拾取优先级。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SelectionKind {
    Point,
    Line,
    Plane,
}

impl SelectionKind {
    #[inline]
    pub fn priority(self) -> u8 {
        match self {
            SelectionKind::Point => 0,
            SelectionKind::Line => 1,
            SelectionKind::Plane => 2,
        }
    }

    pub fn entity_kind(self) -> EntityKind {
        match self {
            SelectionKind::Point => EntityKind::Point,
            SelectionKind::Line => EntityKind::Line,
            SelectionKind::Plane => EntityKind::Plane,
        }
    }

    pub fn from_entity_kind(kind: EntityKind) -> Option<Self> {
        match kind {
            EntityKind::Point => Some(SelectionKind::Point),
            EntityKind::Line => Some(SelectionKind::Line),
            EntityKind::Plane => Some(SelectionKind::Plane),
            EntityKind::Polyline | EntityKind::Curve => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PickedData {
    Point(Point3),
    Line(Point3, Point3),
    Plane(Vec<Point3>),
}

/// 一次拾取的结果。
#[derive(Debug, Clone, PartialEq)]
pub struct Picked {
    pub kind: SelectionKind,
    pub id: EntityId,
    pub data: PickedData,
    pub focus_point: DVec3,
}

/// 高亮旁路：只影响渲染，缓存原颜色以便恢复。
#[derive(Debug, Clone, PartialEq)]
pub struct Highlight {
    pub kind: EntityKind,
    pub id: EntityId,
    pub original: Rgb,
}

/// 单选状态。点、线、面三者至多一个处于选中。
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    selected: Option<(SelectionKind, EntityId)>,
    active_plane: Option<EntityId>,
    highlight: Option<Highlight>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn selected(&self) -> Option<(SelectionKind, &EntityId)> {
        self.selected.as_ref().map(|(kind, id)| (*kind, id))
    }

    fn selected_of(&self, wanted: SelectionKind) -> Option<&EntityId> {
        match &self.selected {
            Some((kind, id)) if *kind == wanted => Some(id),
            _ => None,
        }
    }

    pub fn selected_point(&self) -> Option<&EntityId> {
        self.selected_of(SelectionKind::Point)
    }

    pub fn selected_line(&self) -> Option<&EntityId> {
        self.selected_of(SelectionKind::Line)
    }

    pub fn selected_plane(&self) -> Option<&EntityId> {
        self.selected_of(SelectionKind::Plane)
    }

    /// 选中某个实体并清除其余选择；选中面时同时设为活动平面。
    /// 选中点或线不会改变活动平面，面上取点、连线期间平面参考系保持不变，
    /// 只有 [`SelectionState::clear`] 或 [`SelectionState::set_active_plane`] 会撤掉它。
    pub fn select(&mut self, kind: SelectionKind, id: EntityId) {
        if kind == SelectionKind::Plane {
            self.active_plane = Some(id.clone());
        }
        self.selected = Some((kind, id));
    }

    /// 清除选择与活动平面，高亮不受影响。
    pub fn clear(&mut self) {
        self.selected = None;
        self.active_plane = None;
    }

    #[inline]
    pub fn active_plane(&self) -> Option<&EntityId> {
        self.active_plane.as_ref()
    }

    pub fn set_active_plane(&mut self, plane: Option<EntityId>) {
        self.active_plane = plane;
    }

    #[inline]
    pub fn highlight(&self) -> Option<&Highlight> {
        self.highlight.as_ref()
    }

    pub fn set_highlight(&mut self, highlight: Highlight) -> Option<Highlight> {
        self.highlight.replace(highlight)
    }

    pub fn take_highlight(&mut self) -> Option<Highlight> {
        self.highlight.take()
    }

    /// 实体被删除后清掉所有指向它的状态。
    pub fn forget(&mut self, kind: EntityKind, id: &EntityId) {
        if matches!(&self.selected, Some((selected_kind, selected_id))
            if selected_kind.entity_kind() == kind && selected_id == id)
        {
            self.selected = None;
        }
        if kind == EntityKind::Plane && self.active_plane.as_ref() == Some(id) {
            self.active_plane = None;
        }
        if matches!(&self.highlight, Some(h) if h.kind == kind && &h.id == id) {
            self.highlight = None;
        }
    }
}

#[derive(Debug)]
struct Candidate {
    kind: SelectionKind,
    id: EntityId,
    boundary: bool,
    depth: f64,
    screen_distance: f64,
    data: PickedData,
    focus_point: DVec3,
}

impl Candidate {
    fn ordering(&self, other: &Self) -> Ordering {
        self.kind
            .priority()
            .cmp(&other.kind.priority())
            .then(self.boundary.cmp(&other.boundary))
            .then(self.depth.total_cmp(&other.depth))
            .then(self.screen_distance.total_cmp(&other.screen_distance))
            .then_with(|| self.id.cmp(&other.id))
    }

    fn into_picked(self) -> Picked {
        Picked {
            kind: self.kind,
            id: self.id,
            data: self.data,
            focus_point: self.focus_point,
        }
    }
}

fn project_all(viewport: &dyn Viewport, vertices: &[Point3]) -> Option<Vec<DVec2>> {
    vertices
        .iter()
        .map(|vertex| viewport.world_to_display(vertex.as_vec3()))
        .collect()
}

fn vertex_mean(vertices: &[Point3]) -> Option<DVec3> {
    let positions: Vec<DVec3> = vertices.iter().map(|v| v.as_vec3()).collect();
    measure::centroid(&positions)
}

/// 收集像素阈值内的全部候选实体。锁定的边界几何同样参与拾取。
fn gather_candidates(
    document: &Document,
    viewport: &dyn Viewport,
    click: DVec2,
    pixel_threshold: f64,
) -> Vec<Candidate> {
    let camera = viewport.camera_position();
    let mut candidates = Vec::new();

    for point in document.all_points() {
        let position = point.position.as_vec3();
        let Some(display) = viewport.world_to_display(position) else {
            continue;
        };
        let screen_distance = display.distance(click);
        if screen_distance <= pixel_threshold {
            candidates.push(Candidate {
                kind: SelectionKind::Point,
                id: point.id.clone(),
                boundary: false,
                depth: position.distance(camera),
                screen_distance,
                data: PickedData::Point(point.position),
                focus_point: position,
            });
        }
    }

    for line in document.all_lines() {
        let Some((start, end)) = document.resolve_line(line) else {
            continue;
        };
        let (Some(start_display), Some(end_display)) = (
            viewport.world_to_display(start.as_vec3()),
            viewport.world_to_display(end.as_vec3()),
        ) else {
            continue;
        };
        let screen_distance = measure::distance_point_to_segment_2d(click, start_display, end_display);
        if screen_distance <= pixel_threshold {
            let midpoint = (start.as_vec3() + end.as_vec3()) * 0.5;
            candidates.push(Candidate {
                kind: SelectionKind::Line,
                id: line.id.clone(),
                boundary: false,
                depth: midpoint.distance(camera),
                screen_distance,
                data: PickedData::Line(start, end),
                focus_point: midpoint,
            });
        }
    }

    for plane in document.all_planes() {
        let Some(projected) = project_all(viewport, &plane.vertices) else {
            continue;
        };
        let Some(center) = vertex_mean(&plane.vertices) else {
            continue;
        };
        let inside = measure::point_in_polygon(click, &projected);
        let screen_distance = if inside {
            0.0
        } else {
            measure::centroid_2d(&projected).map_or(f64::INFINITY, |c| c.distance(click))
        };
        if inside || screen_distance <= pixel_threshold {
            candidates.push(Candidate {
                kind: SelectionKind::Plane,
                id: plane.id.clone(),
                boundary: plane.locked,
                depth: center.distance(camera),
                screen_distance,
                data: PickedData::Plane(plane.vertices.clone()),
                focus_point: center,
            });
        }
    }

    candidates
}

/// 屏幕坐标拾取：类别优先级、用户几何优先于边界面、深度、像素距离依次决胜。
///
/// 命中时独占地更新选择状态；未命中时清空全部选择。
pub fn select_at_screen_position(
    document: &Document,
    state: &mut SelectionState,
    viewport: &dyn Viewport,
    screen: DVec2,
    pixel_threshold: f64,
) -> Option<Picked> {
    let click = screen_to_display(viewport, screen);
    let winner = gather_candidates(document, viewport, click, pixel_threshold)
        .into_iter()
        .min_by(Candidate::ordering);

    let Some(winner) = winner else {
        debug!(x = screen.x, y = screen.y, "屏幕拾取未命中，清除选择");
        state.clear();
        return None;
    };
    debug!(
        kind = ?winner.kind,
        id = %winner.id,
        depth = winner.depth,
        pixels = winner.screen_distance,
        "屏幕拾取命中"
    );
    state.select(winner.kind, winner.id.clone());
    Some(winner.into_picked())
}

/// 世界坐标拾取：依次检查点、线、面，首个命中的类别即返回。
pub fn select_at_position(
    document: &Document,
    state: &mut SelectionState,
    world: DVec3,
    threshold: f64,
) -> Option<Picked> {
    let picked = nearest_point(document, world, threshold)
        .or_else(|| nearest_line(document, world, threshold))
        .or_else(|| nearest_plane(document, world, threshold));

    match &picked {
        Some(hit) => {
            debug!(kind = ?hit.kind, id = %hit.id, "世界坐标拾取命中");
            state.select(hit.kind, hit.id.clone());
        }
        None => state.clear(),
    }
    picked
}

fn nearest_point(document: &Document, world: DVec3, threshold: f64) -> Option<Picked> {
    document
        .all_points()
        .map(|point| (point, measure::distance_point_to_point(world, point.position.as_vec3())))
        .filter(|(_, distance)| *distance < threshold)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(point, _)| Picked {
            kind: SelectionKind::Point,
            id: point.id.clone(),
            data: PickedData::Point(point.position),
            focus_point: point.position.as_vec3(),
        })
}

fn nearest_line(document: &Document, world: DVec3, threshold: f64) -> Option<Picked> {
    document
        .all_lines()
        .filter_map(|line| {
            let (start, end) = document.resolve_line(line)?;
            let distance = measure::distance_point_to_segment(world, start.as_vec3(), end.as_vec3());
            (distance < threshold).then_some((line, start, end, distance))
        })
        .min_by(|a, b| a.3.total_cmp(&b.3))
        .map(|(line, start, end, _)| Picked {
            kind: SelectionKind::Line,
            id: line.id.clone(),
            data: PickedData::Line(start, end),
            focus_point: (start.as_vec3() + end.as_vec3()) * 0.5,
        })
}

fn nearest_plane(document: &Document, world: DVec3, threshold: f64) -> Option<Picked> {
    document
        .all_planes()
        .filter_map(|plane| {
            let vertices: Vec<DVec3> = plane.vertices.iter().map(|v| v.as_vec3()).collect();
            let distance = measure::distance_point_to_plane(world, &vertices);
            let center = measure::centroid(&vertices)?;
            (distance < threshold).then_some((plane, center, distance))
        })
        .min_by(|a, b| {
            a.0.locked
                .cmp(&b.0.locked)
                .then(a.2.total_cmp(&b.2))
        })
        .map(|(plane, center, _)| Picked {
            kind: SelectionKind::Plane,
            id: plane.id.clone(),
            data: PickedData::Plane(plane.vertices.clone()),
            focus_point: center,
        })
}
