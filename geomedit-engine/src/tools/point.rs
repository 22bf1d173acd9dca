use geomedit_core::document::{Document, EntityId, EntityKind};
use geomedit_core::geometry::{Point3, WorkspaceBounds};
use geomedit_core::measure;
use glam::{DVec2, DVec3};
use tracing::debug;

use crate::commands::{
    CreatePointCommand, MergeDuplicatePointsCommand, MovePointCommand, duplicate_point_groups,
};
use crate::convert;
use crate::errors::EditError;
use crate::scene::Scene;
use crate::viewport::Viewport;

/// 吸附设置。各项独立开关，按网格、点、线、面的顺序依次作用。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapSettings {
    pub grid: bool,
    pub grid_spacing: f64,
    pub to_points: bool,
    pub to_lines: bool,
    pub to_planes: bool,
    pub threshold: f64,
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self {
            grid: false,
            grid_spacing: 10.0,
            to_points: true,
            to_lines: true,
            to_planes: true,
            threshold: 0.1,
        }
    }
}

impl SnapSettings {
    /// 对位置依次应用全部已开启的吸附，锁定的边界几何不参与。
    pub fn apply(&self, document: &Document, position: DVec3) -> DVec3 {
        let mut result = position;
        if self.grid && self.grid_spacing > 0.0 {
            result = (result / self.grid_spacing).round() * self.grid_spacing;
        }
        if self.to_points {
            if let Some(snapped) = self.nearest_point(document, result) {
                result = snapped;
            }
        }
        if self.to_lines {
            if let Some(snapped) = self.nearest_line_foot(document, result) {
                result = snapped;
            }
        }
        if self.to_planes {
            if let Some(snapped) = self.nearest_plane_centroid(document, result) {
                result = snapped;
            }
        }
        result
    }

    fn nearest_point(&self, document: &Document, position: DVec3) -> Option<DVec3> {
        document
            .points()
            .map(|point| point.position.as_vec3())
            .map(|candidate| (candidate, candidate.distance(position)))
            .filter(|(_, distance)| *distance < self.threshold)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(candidate, _)| candidate)
    }

    fn nearest_line_foot(&self, document: &Document, position: DVec3) -> Option<DVec3> {
        document
            .lines()
            .filter_map(|line| document.resolve_line(line))
            .map(|(start, end)| {
                measure::closest_point_on_segment(position, start.as_vec3(), end.as_vec3())
            })
            .map(|foot| (foot, foot.distance(position)))
            .filter(|(_, distance)| *distance < self.threshold)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(foot, _)| foot)
    }

    fn nearest_plane_centroid(&self, document: &Document, position: DVec3) -> Option<DVec3> {
        document
            .planes()
            .filter_map(|plane| {
                let vertices: Vec<DVec3> = plane.vertices.iter().map(|v| v.as_vec3()).collect();
                let distance = measure::distance_point_to_plane(position, &vertices);
                Some((measure::centroid(&vertices)?, distance))
            })
            .filter(|(_, distance)| *distance < self.threshold)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(centroid, _)| centroid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisConstraint {
    X,
    Y,
    Z,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneConstraint {
    XY,
    XZ,
    YZ,
}

impl PlaneConstraint {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "xy" => Some(PlaneConstraint::XY),
            "xz" => Some(PlaneConstraint::XZ),
            "yz" => Some(PlaneConstraint::YZ),
            _ => None,
        }
    }

    /// 关于该坐标平面的镜像。
    pub fn mirror(self, position: DVec3) -> DVec3 {
        match self {
            PlaneConstraint::XY => DVec3::new(position.x, position.y, -position.z),
            PlaneConstraint::XZ => DVec3::new(position.x, -position.y, position.z),
            PlaneConstraint::YZ => DVec3::new(-position.x, position.y, position.z),
        }
    }
}

/// 拖拽位移约束：沿单轴，或限制在坐标平面内。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragConstraint {
    #[default]
    Free,
    Axis(AxisConstraint),
    Plane(PlaneConstraint),
}

impl DragConstraint {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "free" | "none" => Some(DragConstraint::Free),
            "x" => Some(DragConstraint::Axis(AxisConstraint::X)),
            "y" => Some(DragConstraint::Axis(AxisConstraint::Y)),
            "z" => Some(DragConstraint::Axis(AxisConstraint::Z)),
            other => PlaneConstraint::parse(other).map(DragConstraint::Plane),
        }
    }

    pub fn apply(self, offset: DVec3) -> DVec3 {
        match self {
            DragConstraint::Free => offset,
            DragConstraint::Axis(AxisConstraint::X) => DVec3::new(offset.x, 0.0, 0.0),
            DragConstraint::Axis(AxisConstraint::Y) => DVec3::new(0.0, offset.y, 0.0),
            DragConstraint::Axis(AxisConstraint::Z) => DVec3::new(0.0, 0.0, offset.z),
            DragConstraint::Plane(PlaneConstraint::XY) => DVec3::new(offset.x, offset.y, 0.0),
            DragConstraint::Plane(PlaneConstraint::XZ) => DVec3::new(offset.x, 0.0, offset.z),
            DragConstraint::Plane(PlaneConstraint::YZ) => DVec3::new(0.0, offset.y, offset.z),
        }
    }
}

#[derive(Debug, Clone)]
struct DragState {
    id: EntityId,
    origin: DVec3,
    current: DVec3,
}

/// 点工具：点击放置新点，拖拽移动已有点。
#[derive(Debug, Clone, Default)]
pub struct PointTool {
    pub snap: SnapSettings,
    pub constraint: DragConstraint,
    drag: Option<DragState>,
}

impl PointTool {
    pub fn new(snap: SnapSettings) -> Self {
        Self {
            snap,
            constraint: DragConstraint::Free,
            drag: None,
        }
    }

    /// 射线拾取像素下的几何，未命中时落到深度 0 的平面上。
    pub fn resolve_click(viewport: &dyn Viewport, screen: DVec2) -> Option<DVec3> {
        convert::screen_to_world_raycast(viewport, screen)
    }

    fn finish_position(&self, document: &Document, bounds: &WorkspaceBounds, raw: DVec3) -> DVec3 {
        bounds.clamp(self.snap.apply(document, raw))
    }

    pub fn click(
        &mut self,
        scene: &mut Scene,
        viewport: &dyn Viewport,
        screen: DVec2,
    ) -> Result<EntityId, EditError> {
        let world = Self::resolve_click(viewport, screen)
            .ok_or(EditError::Degenerate("click does not map to a world position"))?;
        self.create_point_at_position(scene, world, None)
    }

    /// 在给定世界坐标放置点（手动输入坐标时使用），同样经过吸附与边界限制。
    pub fn create_point_at_position(
        &self,
        scene: &mut Scene,
        world: DVec3,
        name: Option<&str>,
    ) -> Result<EntityId, EditError> {
        if !world.is_finite() {
            return Err(EditError::NonFinite);
        }
        let position = self.finish_position(scene.document(), scene.bounds(), world);
        let id = scene.document().next_id(EntityKind::Point);
        let mut command = CreatePointCommand::new(id.clone(), position);
        if let Some(name) = name {
            command = command.with_name(name);
        }
        scene.execute(command)?;
        debug!(id = %id, ?position, "点工具创建点");
        Ok(id)
    }

    /// 复制点，可附带偏移；名称随之复制。
    pub fn duplicate_point(
        &self,
        scene: &mut Scene,
        id: &EntityId,
        offset: Option<DVec3>,
    ) -> Result<EntityId, EditError> {
        let point = scene
            .document()
            .point(id)
            .ok_or_else(|| EditError::not_found(EntityKind::Point, id))?;
        let position = point.position.as_vec3() + offset.unwrap_or(DVec3::ZERO);
        let name = point.name.clone();
        self.create_point_at_position(scene, position, name.as_deref())
    }

    pub fn mirror_point(
        &self,
        scene: &mut Scene,
        id: &EntityId,
        plane: PlaneConstraint,
    ) -> Result<EntityId, EditError> {
        let point = scene
            .document()
            .point(id)
            .ok_or_else(|| EditError::not_found(EntityKind::Point, id))?;
        let position = plane.mirror(point.position.as_vec3());
        let name = point.name.clone();
        self.create_point_at_position(scene, position, name.as_deref())
    }

    /// 合并彼此距离小于 `threshold` 的点，返回被删除的重复点数量。没有可合并的点时不写入历史。
    pub fn merge_duplicate_points(
        &self,
        scene: &mut Scene,
        threshold: f64,
    ) -> Result<usize, EditError> {
        let merged: usize = duplicate_point_groups(scene.document(), threshold)
            .iter()
            .map(|group| group.len() - 1)
            .sum();
        if merged == 0 {
            return Ok(0);
        }
        scene.execute(MergeDuplicatePointsCommand::new(threshold))?;
        debug!(merged, threshold, "点工具合并重复点");
        Ok(merged)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// 开始拖拽。锁定的点不可拖动。
    pub fn start_drag(&mut self, scene: &Scene, id: &EntityId) -> Result<(), EditError> {
        let point = scene
            .document()
            .point(id)
            .ok_or_else(|| EditError::not_found(EntityKind::Point, id))?;
        if point.locked {
            return Err(EditError::locked(EntityKind::Point, id));
        }
        let origin = point.position.as_vec3();
        self.drag = Some(DragState {
            id: id.clone(),
            origin,
            current: origin,
        });
        Ok(())
    }

    /// 根据当前光标位置计算拖拽目标，返回量化后的位置；文档在 `end_drag` 时才修改。
    pub fn update_drag(
        &mut self,
        scene: &Scene,
        viewport: &dyn Viewport,
        screen: DVec2,
    ) -> Option<Point3> {
        let cursor = Self::resolve_click(viewport, screen)?;
        let drag = self.drag.as_ref()?;
        let offset = self.constraint.apply(cursor - drag.origin);
        let target = self.finish_position(scene.document(), scene.bounds(), drag.origin + offset);
        let drag = self.drag.as_mut()?;
        drag.current = target;
        Some(Point3::from_vec(target))
    }

    /// 结束拖拽，整个拖拽过程记为一条移动命令。位置未变化时不产生命令。
    pub fn end_drag(&mut self, scene: &mut Scene) -> Result<Option<EntityId>, EditError> {
        let Some(drag) = self.drag.take() else {
            return Ok(None);
        };
        let origin = Point3::from_vec(drag.origin);
        let target = Point3::from_vec(drag.current);
        if origin == target {
            return Ok(None);
        }
        scene.execute(MovePointCommand::new(drag.id.clone(), origin, target))?;
        Ok(Some(drag.id))
    }

    pub fn cancel_drag(&mut self) {
        self.drag = None;
    }
}
