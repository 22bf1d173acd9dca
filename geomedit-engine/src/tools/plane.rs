use geomedit_core::document::{Document, EndpointRef, EntityId, EntityKind};
use geomedit_core::geometry::Point3;
use geomedit_core::shape::{self, ChainError, ChainVertex};
use glam::{DVec2, DVec3};
use tracing::debug;

use crate::commands::CreatePlaneCommand;
use crate::errors::EditError;
use crate::scene::Scene;
use crate::selection::SelectionKind;
use crate::tools::ClickOutcome;
use crate::viewport::Viewport;

/// 线段端点相接的容差。
pub const CHAIN_TOLERANCE: f64 = 1e-4;
/// 点集去重容差。
pub const POINT_DEDUP_TOLERANCE: f64 = 1e-5;

/// 有序的多边形顶点，以及每个顶点来源的点 id。
#[derive(Debug, Clone, PartialEq)]
pub struct PlanePolygon {
    pub vertices: Vec<Point3>,
    pub anchors: Vec<Option<EntityId>>,
}

impl PlanePolygon {
    pub fn into_command(self, id: impl Into<EntityId>) -> CreatePlaneCommand {
        CreatePlaneCommand::new(id, self.vertices).with_anchors(self.anchors)
    }
}

fn chain_vertex(
    document: &Document,
    endpoint: &EndpointRef,
) -> Option<ChainVertex<Option<EntityId>>> {
    let position = document.resolve(endpoint)?;
    Some(ChainVertex::new(
        position.as_vec3(),
        endpoint.point_id().cloned(),
    ))
}

/// 按选择顺序把线段闭合成多边形。找不到的线段视为断开。
pub fn polygon_from_lines(
    document: &Document,
    line_ids: &[EntityId],
) -> Result<PlanePolygon, ChainError> {
    let mut segments = Vec::with_capacity(line_ids.len());
    for (index, id) in line_ids.iter().enumerate() {
        let broken = ChainError::Disconnected { segment: index };
        let line = document.line(id).ok_or(broken)?;
        let start = chain_vertex(document, &line.start).ok_or(broken)?;
        let end = chain_vertex(document, &line.end).ok_or(broken)?;
        segments.push((start, end));
    }
    let closed = shape::close_line_chain(&segments, CHAIN_TOLERANCE)?;
    let (vertices, anchors) = closed
        .into_iter()
        .map(|vertex| (Point3::from_vec(vertex.position), vertex.anchor))
        .unzip();
    Ok(PlanePolygon { vertices, anchors })
}

/// 对点集拟合平面并按极角排序。点不存在、去重后不足三个或共线时返回 `None`。
pub fn polygon_from_points(document: &Document, point_ids: &[EntityId]) -> Option<PlanePolygon> {
    let positions: Vec<DVec3> = point_ids
        .iter()
        .map(|id| document.point(id).map(|point| point.position.as_vec3()))
        .collect::<Option<_>>()?;
    let ordered = shape::order_coplanar_points(&positions, POINT_DEDUP_TOLERANCE)?;
    let (vertices, anchors) = ordered
        .order
        .into_iter()
        .map(|index| (Point3::from_vec(positions[index]), Some(point_ids[index].clone())))
        .unzip();
    Some(PlanePolygon { vertices, anchors })
}

/// 线段链构建失败时的错误映射。
pub fn build_from_lines(
    document: &Document,
    line_ids: &[EntityId],
) -> Result<PlanePolygon, EditError> {
    polygon_from_lines(document, line_ids).map_err(|err| match err {
        ChainError::TooFew => EditError::TooFewPoints {
            kind: EntityKind::Plane,
            required: 3,
            actual: line_ids.len(),
        },
        ChainError::Disconnected { segment } => EditError::InvalidReference(format!(
            "line {} does not connect to the chain",
            line_ids
                .get(segment)
                .map_or_else(|| "?".to_owned(), ToString::to_string)
        )),
        ChainError::Open => EditError::Degenerate("line chain is not closed"),
    })
}

pub fn build_from_points(
    document: &Document,
    point_ids: &[EntityId],
) -> Result<PlanePolygon, EditError> {
    if point_ids.len() < 3 {
        return Err(EditError::TooFewPoints {
            kind: EntityKind::Plane,
            required: 3,
            actual: point_ids.len(),
        });
    }
    polygon_from_points(document, point_ids)
        .ok_or(EditError::Degenerate("points do not span a plane"))
}

/// 面工具。线段链与点集两种累积方式并行，先凑够有效多边形的一方生成面。
#[derive(Debug, Clone, Default)]
pub struct PlaneTool {
    line_ids: Vec<EntityId>,
    point_ids: Vec<EntityId>,
}

impl PlaneTool {
    pub fn reset(&mut self) {
        self.line_ids.clear();
        self.point_ids.clear();
    }

    pub fn pending_lines(&self) -> &[EntityId] {
        &self.line_ids
    }

    pub fn pending_points(&self) -> &[EntityId] {
        &self.point_ids
    }

    pub fn click(
        &mut self,
        scene: &mut Scene,
        viewport: &dyn Viewport,
        screen: DVec2,
        pick_radius: f64,
    ) -> Result<ClickOutcome, EditError> {
        let Some(picked) = scene.select_at_screen_position(viewport, screen, pick_radius) else {
            return Ok(ClickOutcome::Ignored);
        };
        match picked.kind {
            SelectionKind::Line => self.add_line(scene, picked.id),
            SelectionKind::Point => self.add_point(scene, picked.id),
            SelectionKind::Plane => Ok(ClickOutcome::Ignored),
        }
    }

    /// 追加线段。链断开时清空线段累积；链尚未闭合时继续等待。
    pub fn add_line(&mut self, scene: &mut Scene, id: EntityId) -> Result<ClickOutcome, EditError> {
        if self.line_ids.contains(&id) {
            return Ok(ClickOutcome::Ignored);
        }
        self.line_ids.push(id);
        match polygon_from_lines(scene.document(), &self.line_ids) {
            Ok(polygon) => self.commit(scene, polygon),
            Err(ChainError::Disconnected { segment }) => {
                debug!(segment, "线段不相接，清空线段选择");
                self.line_ids.clear();
                Ok(ClickOutcome::Reset)
            }
            Err(ChainError::TooFew | ChainError::Open) => Ok(ClickOutcome::Pending {
                count: self.line_ids.len(),
            }),
        }
    }

    /// 追加点。凑够三个不共线的点即生成面。
    pub fn add_point(&mut self, scene: &mut Scene, id: EntityId) -> Result<ClickOutcome, EditError> {
        if self.point_ids.contains(&id) {
            return Ok(ClickOutcome::Ignored);
        }
        self.point_ids.push(id);
        if self.point_ids.len() >= 3 {
            if let Some(polygon) = polygon_from_points(scene.document(), &self.point_ids) {
                return self.commit(scene, polygon);
            }
        }
        Ok(ClickOutcome::Pending {
            count: self.point_ids.len(),
        })
    }

    fn commit(&mut self, scene: &mut Scene, polygon: PlanePolygon) -> Result<ClickOutcome, EditError> {
        self.reset();
        let id = scene.document().next_id(EntityKind::Plane);
        scene.execute(polygon.into_command(id.clone()))?;
        Ok(ClickOutcome::Created {
            kind: EntityKind::Plane,
            id,
        })
    }
}
