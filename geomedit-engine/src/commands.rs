//! 所有修改文档的具体命令。每个命令在构造或首次执行时记录足以完全逆转自身的状态。

use std::collections::BTreeMap;

use geomedit_core::document::{
    Curve, Document, EndpointRef, EntityId, EntityKind, Line, Plane, Point, PointDependents,
    Polyline,
};
use geomedit_core::geometry::{Point3, Rgb};
use geomedit_core::measure;
use glam::DVec3;
use tracing::debug;

use crate::errors::EditError;
use crate::history::{EditCommand, EditContext};

const MIN_POLYGON_AREA: f64 = 1e-9;

fn ensure_finite(position: Point3) -> Result<(), EditError> {
    if position.is_finite() {
        Ok(())
    } else {
        Err(EditError::NonFinite)
    }
}

/// 实体必须存在且未锁定。
fn ensure_editable(document: &Document, kind: EntityKind, id: &EntityId) -> Result<(), EditError> {
    match document.is_locked(kind, id) {
        None => Err(EditError::not_found(kind, id)),
        Some(true) => Err(EditError::locked(kind, id)),
        Some(false) => Ok(()),
    }
}

fn ensure_absent(document: &Document, kind: EntityKind, id: &EntityId) -> Result<(), EditError> {
    if document.contains(kind, id) {
        Err(EditError::duplicate(kind, id))
    } else {
        Ok(())
    }
}

fn ensure_points_exist(document: &Document, ids: &[EntityId]) -> Result<(), EditError> {
    match ids.iter().find(|id| document.point(id).is_none()) {
        Some(missing) => Err(EditError::InvalidReference(format!(
            "point {missing} does not exist"
        ))),
        None => Ok(()),
    }
}

fn validate_endpoint(document: &Document, endpoint: &EndpointRef) -> Result<(), EditError> {
    match endpoint {
        EndpointRef::Coordinate(position) => ensure_finite(*position),
        EndpointRef::PointId(id) => ensure_points_exist(document, std::slice::from_ref(id)),
    }
}

fn validate_line(document: &Document, line: &Line) -> Result<(), EditError> {
    validate_endpoint(document, &line.start)?;
    validate_endpoint(document, &line.end)?;
    match (&line.start, &line.end) {
        (EndpointRef::PointId(a), EndpointRef::PointId(b)) if a == b => Err(
            EditError::InvalidReference(format!("line endpoints both reference point {a}")),
        ),
        (EndpointRef::Coordinate(a), EndpointRef::Coordinate(b)) if a == b => {
            Err(EditError::Degenerate("line endpoints coincide"))
        }
        _ => Ok(()),
    }
}

fn validate_point_chain(
    document: &Document,
    kind: EntityKind,
    ids: &[EntityId],
) -> Result<(), EditError> {
    if ids.len() < 2 {
        return Err(EditError::TooFewPoints {
            kind,
            required: 2,
            actual: ids.len(),
        });
    }
    ensure_points_exist(document, ids)?;
    if let Some(pair) = ids.windows(2).find(|pair| pair[0] == pair[1]) {
        return Err(EditError::InvalidReference(format!(
            "point {} repeated consecutively",
            pair[0]
        )));
    }
    Ok(())
}

fn validate_plane(plane: &Plane) -> Result<(), EditError> {
    if plane.vertices.len() < 3 {
        return Err(EditError::TooFewPoints {
            kind: EntityKind::Plane,
            required: 3,
            actual: plane.vertices.len(),
        });
    }
    if !plane.vertices.iter().all(|v| v.is_finite()) {
        return Err(EditError::NonFinite);
    }
    let vertices: Vec<DVec3> = plane.vertices.iter().map(|v| v.as_vec3()).collect();
    if measure::newell_normal(&vertices).length() < MIN_POLYGON_AREA {
        return Err(EditError::Degenerate("plane vertices are collinear"));
    }
    Ok(())
}

fn render_dependents(ctx: &mut EditContext<'_>, dependents: &PointDependents) {
    for id in &dependents.lines {
        ctx.render(EntityKind::Line, id);
    }
    for id in &dependents.polylines {
        ctx.render(EntityKind::Polyline, id);
    }
    for id in &dependents.curves {
        ctx.render(EntityKind::Curve, id);
    }
    for id in &dependents.planes {
        ctx.render(EntityKind::Plane, id);
    }
}

fn detach(ctx: &mut EditContext<'_>, kind: EntityKind, id: &EntityId) {
    ctx.selection.forget(kind, id);
    ctx.remove_rendered(kind, id);
}

// ---- 点 ----

#[derive(Debug, Clone)]
pub struct CreatePointCommand {
    point: Point,
}

impl CreatePointCommand {
    pub fn new(id: impl Into<EntityId>, position: impl Into<Point3>) -> Self {
        Self {
            point: Point::new(id, position.into()),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.point.name = Some(name.into());
        self
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.point.color = color.clamped();
        self
    }

    pub fn id(&self) -> &EntityId {
        &self.point.id
    }
}

impl EditCommand for CreatePointCommand {
    fn execute(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError> {
        ensure_finite(self.point.position)?;
        ensure_absent(ctx.document, EntityKind::Point, &self.point.id)?;
        ctx.document.insert_point(self.point.clone());
        ctx.render(EntityKind::Point, &self.point.id);
        Ok(())
    }

    fn undo(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError> {
        let id = &self.point.id;
        if ctx.document.point(id).is_none() {
            return Err(EditError::not_found(EntityKind::Point, id));
        }
        if ctx.document.dependents_of_point(id).has_references() {
            return Err(EditError::PointInUse(id.clone()));
        }
        ctx.document.remove_point(id);
        detach(ctx, EntityKind::Point, id);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("Create point {}", self.point.id)
    }
}

/// 删除点。仍被线、折线或曲线引用的点不能删除；锚定到该点的面顶点解除锚定，只保留坐标快照。
#[derive(Debug, Clone)]
pub struct RemovePointCommand {
    id: EntityId,
    removed: Option<Point>,
    released_anchors: Vec<(EntityId, Vec<Option<EntityId>>)>,
}

impl RemovePointCommand {
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            removed: None,
            released_anchors: Vec::new(),
        }
    }
}

impl EditCommand for RemovePointCommand {
    fn execute(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError> {
        ensure_editable(ctx.document, EntityKind::Point, &self.id)?;
        let dependents = ctx.document.dependents_of_point(&self.id);
        if dependents.has_references() {
            return Err(EditError::PointInUse(self.id.clone()));
        }
        self.released_anchors.clear();
        for plane_id in &dependents.planes {
            if let Some(plane) = ctx.document.plane_mut(plane_id) {
                let anchors = plane.anchors.clone();
                if plane.release_anchor(&self.id) {
                    self.released_anchors.push((plane_id.clone(), anchors));
                }
            }
        }
        self.removed = ctx.document.remove_point(&self.id);
        detach(ctx, EntityKind::Point, &self.id);
        Ok(())
    }

    fn undo(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError> {
        let point = self.removed.clone().ok_or(EditError::NotApplied)?;
        ensure_absent(ctx.document, EntityKind::Point, &self.id)?;
        ctx.document.insert_point(point);
        for (plane_id, anchors) in &self.released_anchors {
            if let Some(plane) = ctx.document.plane_mut(plane_id) {
                plane.anchors = anchors.clone();
            }
        }
        ctx.render(EntityKind::Point, &self.id);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("Remove point {}", self.id)
    }
}

/// 移动点。引用该点的线类实体自动跟随，锚定到该点的面顶点同步重建。
#[derive(Debug, Clone)]
pub struct MovePointCommand {
    id: EntityId,
    old: Option<Point3>,
    new: Point3,
    plane_snapshots: Vec<(EntityId, Vec<Point3>)>,
    applied: bool,
}

impl MovePointCommand {
    pub fn new(id: impl Into<EntityId>, old: impl Into<Point3>, new: impl Into<Point3>) -> Self {
        Self {
            id: id.into(),
            old: Some(old.into()),
            new: new.into(),
            plane_snapshots: Vec::new(),
            applied: false,
        }
    }

    /// 旧位置在首次执行时从文档读取。
    pub fn to(id: impl Into<EntityId>, new: impl Into<Point3>) -> Self {
        Self {
            id: id.into(),
            old: None,
            new: new.into(),
            plane_snapshots: Vec::new(),
            applied: false,
        }
    }

    fn set_position(&self, ctx: &mut EditContext<'_>, position: Point3) -> Result<(), EditError> {
        let point = ctx
            .document
            .point_mut(&self.id)
            .ok_or_else(|| EditError::not_found(EntityKind::Point, &self.id))?;
        point.position = position;
        Ok(())
    }
}

impl EditCommand for MovePointCommand {
    fn execute(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError> {
        ensure_finite(self.new)?;
        ensure_editable(ctx.document, EntityKind::Point, &self.id)?;
        let current = ctx
            .document
            .point(&self.id)
            .map(|point| point.position)
            .ok_or_else(|| EditError::not_found(EntityKind::Point, &self.id))?;
        let old = *self.old.get_or_insert(current);
        ensure_finite(old)?;

        self.set_position(ctx, self.new)?;

        let dependents = ctx.document.dependents_of_point(&self.id);
        self.plane_snapshots.clear();
        for plane_id in &dependents.planes {
            if let Some(plane) = ctx.document.plane_mut(plane_id) {
                self.plane_snapshots
                    .push((plane_id.clone(), plane.vertices.clone()));
                for (vertex, anchor) in plane.vertices.iter_mut().zip(&plane.anchors) {
                    if anchor.as_ref() == Some(&self.id) {
                        *vertex = self.new;
                    }
                }
            }
        }

        self.applied = true;
        ctx.render(EntityKind::Point, &self.id);
        render_dependents(ctx, &dependents);
        Ok(())
    }

    fn undo(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError> {
        let old = match (self.applied, self.old) {
            (true, Some(old)) => old,
            _ => return Err(EditError::NotApplied),
        };
        self.set_position(ctx, old)?;
        for (plane_id, vertices) in &self.plane_snapshots {
            if let Some(plane) = ctx.document.plane_mut(plane_id) {
                plane.vertices = vertices.clone();
            }
        }
        self.applied = false;

        let dependents = ctx.document.dependents_of_point(&self.id);
        ctx.render(EntityKind::Point, &self.id);
        render_dependents(ctx, &dependents);
        Ok(())
    }

    fn describe(&self) -> String {
        format!(
            "Move point {} to ({}, {}, {})",
            self.id,
            self.new.x(),
            self.new.y(),
            self.new.z()
        )
    }
}

// ---- 合并重复点 ----

type PointMapping = BTreeMap<EntityId, EntityId>;

fn remap<'a>(mapping: &'a PointMapping, id: &'a EntityId) -> &'a EntityId {
    mapping.get(id).unwrap_or(id)
}

fn remap_endpoint(mapping: &PointMapping, endpoint: &EndpointRef) -> EndpointRef {
    match endpoint {
        EndpointRef::PointId(id) => EndpointRef::PointId(remap(mapping, id).clone()),
        EndpointRef::Coordinate(position) => EndpointRef::Coordinate(*position),
    }
}

/// 改写点序列，合并后相邻的重复引用只保留一个。
fn remap_chain(mapping: &PointMapping, ids: &[EntityId]) -> Vec<EntityId> {
    let mut chain: Vec<EntityId> = Vec::with_capacity(ids.len());
    for id in ids {
        let target = remap(mapping, id);
        if chain.last() != Some(target) {
            chain.push(target.clone());
        }
    }
    chain
}

fn collapses_references(document: &Document, mapping: &PointMapping) -> bool {
    let line_collapses = document.all_lines().any(|line| {
        matches!(
            (remap_endpoint(mapping, &line.start), remap_endpoint(mapping, &line.end)),
            (EndpointRef::PointId(a), EndpointRef::PointId(b)) if a == b
        )
    });
    line_collapses
        || document
            .polylines()
            .any(|polyline| remap_chain(mapping, &polyline.point_ids).len() < 2)
        || document
            .curves()
            .any(|curve| remap_chain(mapping, &curve.control_point_ids).len() < 2)
}

/// 按 id 顺序把与组首距离小于 `threshold` 的未锁定点分组，组首为保留点。
/// 合并后会让线两端重合、或让折线与曲线不足两个点的组整体跳过。
pub fn duplicate_point_groups(document: &Document, threshold: f64) -> Vec<Vec<EntityId>> {
    let points: Vec<(&EntityId, DVec3)> = document
        .points()
        .map(|point| (&point.id, point.position.as_vec3()))
        .collect();
    let mut consumed = vec![false; points.len()];
    let mut mapping = PointMapping::new();
    let mut groups = Vec::new();

    for (index, (survivor, position)) in points.iter().enumerate() {
        if consumed[index] {
            continue;
        }
        let members: Vec<usize> = (index + 1..points.len())
            .filter(|other| !consumed[*other] && points[*other].1.distance(*position) < threshold)
            .collect();
        if members.is_empty() {
            continue;
        }

        let mut candidate = mapping.clone();
        for other in &members {
            candidate.insert(points[*other].0.clone(), (*survivor).clone());
        }
        if collapses_references(document, &candidate) {
            debug!(survivor = %survivor, "合并会使引用退化，跳过该组");
            continue;
        }
        mapping = candidate;

        let mut group = vec![(*survivor).clone()];
        for other in members {
            consumed[other] = true;
            group.push(points[other].0.clone());
        }
        groups.push(group);
    }
    groups
}

/// 合并重复点：每组保留第一个点并移到组内均值，名称取组内第一个非空名称；
/// 其余点的线、折线、曲线引用与面锚点全部改指向保留点，然后删除。
#[derive(Debug, Clone)]
pub struct MergeDuplicatePointsCommand {
    threshold: f64,
    survivors: Vec<Point>,
    removed: Vec<Point>,
    lines: Vec<Line>,
    polylines: Vec<Polyline>,
    curves: Vec<Curve>,
    planes: Vec<Plane>,
}

impl MergeDuplicatePointsCommand {
    pub const DEFAULT_THRESHOLD: f64 = 0.1;

    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            survivors: Vec::new(),
            removed: Vec::new(),
            lines: Vec::new(),
            polylines: Vec::new(),
            curves: Vec::new(),
            planes: Vec::new(),
        }
    }

    /// 最近一次执行中被删除的重复点数量。
    pub fn merged_count(&self) -> usize {
        self.removed.len()
    }

    fn clear_snapshots(&mut self) {
        self.survivors.clear();
        self.removed.clear();
        self.lines.clear();
        self.polylines.clear();
        self.curves.clear();
        self.planes.clear();
    }

    fn render_touched(&self, ctx: &mut EditContext<'_>) {
        for point in &self.survivors {
            ctx.render(EntityKind::Point, &point.id);
        }
        for line in &self.lines {
            ctx.render(EntityKind::Line, &line.id);
        }
        for polyline in &self.polylines {
            ctx.render(EntityKind::Polyline, &polyline.id);
        }
        for curve in &self.curves {
            ctx.render(EntityKind::Curve, &curve.id);
        }
        for plane in &self.planes {
            ctx.render(EntityKind::Plane, &plane.id);
        }
    }
}

impl EditCommand for MergeDuplicatePointsCommand {
    fn execute(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError> {
        if !(self.threshold.is_finite() && self.threshold > 0.0) {
            return Err(EditError::Degenerate("merge threshold must be positive"));
        }
        let groups = duplicate_point_groups(ctx.document, self.threshold);
        if groups.is_empty() {
            return Err(EditError::NothingToMerge(self.threshold));
        }
        self.clear_snapshots();

        let mut mapping = PointMapping::new();
        let mut moved: BTreeMap<EntityId, Point3> = BTreeMap::new();
        for group in &groups {
            let Some((survivor_id, duplicates)) = group.split_first() else {
                continue;
            };
            let members: Vec<Point> = group
                .iter()
                .filter_map(|id| ctx.document.point(id).cloned())
                .collect();
            let center = members
                .iter()
                .map(|point| point.position.as_vec3())
                .sum::<DVec3>()
                / members.len() as f64;
            let name = members.iter().find_map(|point| point.name.clone());
            if let Some(survivor) = ctx.document.point_mut(survivor_id) {
                self.survivors.push(survivor.clone());
                survivor.position = Point3::from_vec(center);
                survivor.name = name;
                moved.insert(survivor_id.clone(), survivor.position);
            }
            for id in duplicates {
                mapping.insert(id.clone(), survivor_id.clone());
                if let Some(point) = ctx.document.remove_point(id) {
                    self.removed.push(point);
                }
            }
        }

        let line_ids: Vec<EntityId> = ctx
            .document
            .all_lines()
            .filter(|line| mapping.keys().any(|id| line.references(id)))
            .map(|line| line.id.clone())
            .collect();
        for id in &line_ids {
            if let Some(line) = ctx.document.line_mut(id) {
                self.lines.push(line.clone());
                line.start = remap_endpoint(&mapping, &line.start);
                line.end = remap_endpoint(&mapping, &line.end);
            }
        }

        let polyline_ids: Vec<EntityId> = ctx
            .document
            .polylines()
            .filter(|polyline| polyline.point_ids.iter().any(|id| mapping.contains_key(id)))
            .map(|polyline| polyline.id.clone())
            .collect();
        for id in &polyline_ids {
            if let Some(polyline) = ctx.document.polyline_mut(id) {
                self.polylines.push(polyline.clone());
                polyline.point_ids = remap_chain(&mapping, &polyline.point_ids);
            }
        }

        let curve_ids: Vec<EntityId> = ctx
            .document
            .curves()
            .filter(|curve| curve.control_point_ids.iter().any(|id| mapping.contains_key(id)))
            .map(|curve| curve.id.clone())
            .collect();
        for id in &curve_ids {
            if let Some(curve) = ctx.document.curve_mut(id) {
                self.curves.push(curve.clone());
                curve.control_point_ids = remap_chain(&mapping, &curve.control_point_ids);
            }
        }

        let plane_ids: Vec<EntityId> = ctx
            .document
            .all_planes()
            .filter(|plane| {
                plane
                    .anchors
                    .iter()
                    .flatten()
                    .any(|anchor| mapping.contains_key(anchor) || moved.contains_key(anchor))
            })
            .map(|plane| plane.id.clone())
            .collect();
        for id in &plane_ids {
            if let Some(plane) = ctx.document.plane_mut(id) {
                self.planes.push(plane.clone());
                for (vertex, anchor) in plane.vertices.iter_mut().zip(plane.anchors.iter_mut()) {
                    if let Some(anchor) = anchor {
                        let target = remap(&mapping, anchor).clone();
                        if let Some(position) = moved.get(&target) {
                            *vertex = *position;
                        }
                        *anchor = target;
                    }
                }
            }
        }

        for point in &self.removed {
            detach(ctx, EntityKind::Point, &point.id);
        }
        self.render_touched(ctx);
        debug!(
            groups = groups.len(),
            merged = self.removed.len(),
            threshold = self.threshold,
            "已合并重复点"
        );
        Ok(())
    }

    fn undo(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError> {
        if self.survivors.is_empty() {
            return Err(EditError::NotApplied);
        }
        for point in &self.removed {
            ensure_absent(ctx.document, EntityKind::Point, &point.id)?;
        }
        for point in &self.removed {
            ctx.document.insert_point(point.clone());
        }
        for point in &self.survivors {
            if let Some(current) = ctx.document.point_mut(&point.id) {
                *current = point.clone();
            }
        }
        for line in &self.lines {
            if let Some(current) = ctx.document.line_mut(&line.id) {
                *current = line.clone();
            }
        }
        for polyline in &self.polylines {
            if let Some(current) = ctx.document.polyline_mut(&polyline.id) {
                *current = polyline.clone();
            }
        }
        for curve in &self.curves {
            if let Some(current) = ctx.document.curve_mut(&curve.id) {
                *current = curve.clone();
            }
        }
        for plane in &self.planes {
            if let Some(current) = ctx.document.plane_mut(&plane.id) {
                *current = plane.clone();
            }
        }

        for point in &self.removed {
            ctx.render(EntityKind::Point, &point.id);
        }
        self.render_touched(ctx);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("Merge duplicate points within {}", self.threshold)
    }
}

// ---- 线 ----

#[derive(Debug, Clone)]
pub struct CreateLineCommand {
    line: Line,
}

impl CreateLineCommand {
    pub fn new(id: impl Into<EntityId>, start: EndpointRef, end: EndpointRef) -> Self {
        Self {
            line: Line::new(id, start, end),
        }
    }

    pub fn between_points(id: impl Into<EntityId>, start: EntityId, end: EntityId) -> Self {
        Self {
            line: Line::between_points(id, start, end),
        }
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.line.color = color.clamped();
        self
    }

    pub fn id(&self) -> &EntityId {
        &self.line.id
    }
}

impl EditCommand for CreateLineCommand {
    fn execute(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError> {
        ensure_absent(ctx.document, EntityKind::Line, &self.line.id)?;
        validate_line(ctx.document, &self.line)?;
        ctx.document.insert_line(self.line.clone());
        ctx.render(EntityKind::Line, &self.line.id);
        Ok(())
    }

    fn undo(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError> {
        ctx.document
            .remove_line(&self.line.id)
            .ok_or_else(|| EditError::not_found(EntityKind::Line, &self.line.id))?;
        detach(ctx, EntityKind::Line, &self.line.id);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("Create line {}", self.line.id)
    }
}

#[derive(Debug, Clone)]
pub struct RemoveLineCommand {
    id: EntityId,
    removed: Option<Line>,
}

impl RemoveLineCommand {
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            removed: None,
        }
    }
}

impl EditCommand for RemoveLineCommand {
    fn execute(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError> {
        ensure_editable(ctx.document, EntityKind::Line, &self.id)?;
        self.removed = ctx.document.remove_line(&self.id);
        detach(ctx, EntityKind::Line, &self.id);
        Ok(())
    }

    fn undo(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError> {
        let line = self.removed.clone().ok_or(EditError::NotApplied)?;
        ensure_absent(ctx.document, EntityKind::Line, &self.id)?;
        validate_line(ctx.document, &line)?;
        ctx.document.insert_line(line);
        ctx.render(EntityKind::Line, &self.id);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("Remove line {}", self.id)
    }
}

// ---- 折线 ----

#[derive(Debug, Clone)]
pub struct CreatePolylineCommand {
    polyline: Polyline,
}

impl CreatePolylineCommand {
    pub fn new(id: impl Into<EntityId>, point_ids: Vec<EntityId>) -> Self {
        Self {
            polyline: Polyline::new(id, point_ids),
        }
    }

    pub fn id(&self) -> &EntityId {
        &self.polyline.id
    }
}

impl EditCommand for CreatePolylineCommand {
    fn execute(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError> {
        ensure_absent(ctx.document, EntityKind::Polyline, &self.polyline.id)?;
        validate_point_chain(ctx.document, EntityKind::Polyline, &self.polyline.point_ids)?;
        ctx.document.insert_polyline(self.polyline.clone());
        ctx.render(EntityKind::Polyline, &self.polyline.id);
        Ok(())
    }

    fn undo(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError> {
        ctx.document
            .remove_polyline(&self.polyline.id)
            .ok_or_else(|| EditError::not_found(EntityKind::Polyline, &self.polyline.id))?;
        detach(ctx, EntityKind::Polyline, &self.polyline.id);
        Ok(())
    }

    fn describe(&self) -> String {
        format!(
            "Create polyline {} through {} points",
            self.polyline.id,
            self.polyline.point_ids.len()
        )
    }
}

#[derive(Debug, Clone)]
pub struct RemovePolylineCommand {
    id: EntityId,
    removed: Option<Polyline>,
}

impl RemovePolylineCommand {
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            removed: None,
        }
    }
}

impl EditCommand for RemovePolylineCommand {
    fn execute(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError> {
        ensure_editable(ctx.document, EntityKind::Polyline, &self.id)?;
        self.removed = ctx.document.remove_polyline(&self.id);
        detach(ctx, EntityKind::Polyline, &self.id);
        Ok(())
    }

    fn undo(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError> {
        let polyline = self.removed.clone().ok_or(EditError::NotApplied)?;
        ensure_absent(ctx.document, EntityKind::Polyline, &self.id)?;
        validate_point_chain(ctx.document, EntityKind::Polyline, &polyline.point_ids)?;
        ctx.document.insert_polyline(polyline);
        ctx.render(EntityKind::Polyline, &self.id);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("Remove polyline {}", self.id)
    }
}

// ---- 曲线 ----

#[derive(Debug, Clone)]
pub struct CreateCurveCommand {
    curve: Curve,
}

impl CreateCurveCommand {
    pub fn new(
        id: impl Into<EntityId>,
        control_point_ids: Vec<EntityId>,
        degree: usize,
        sample_count: usize,
    ) -> Self {
        Self {
            curve: Curve::new(id, control_point_ids, degree, sample_count),
        }
    }

    pub fn id(&self) -> &EntityId {
        &self.curve.id
    }
}

impl EditCommand for CreateCurveCommand {
    fn execute(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError> {
        ensure_absent(ctx.document, EntityKind::Curve, &self.curve.id)?;
        validate_point_chain(ctx.document, EntityKind::Curve, &self.curve.control_point_ids)?;
        ctx.document.insert_curve(self.curve.clone());
        ctx.render(EntityKind::Curve, &self.curve.id);
        Ok(())
    }

    fn undo(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError> {
        ctx.document
            .remove_curve(&self.curve.id)
            .ok_or_else(|| EditError::not_found(EntityKind::Curve, &self.curve.id))?;
        detach(ctx, EntityKind::Curve, &self.curve.id);
        Ok(())
    }

    fn describe(&self) -> String {
        format!(
            "Create curve {} (degree {}, {} control points)",
            self.curve.id,
            self.curve.degree,
            self.curve.control_point_ids.len()
        )
    }
}

#[derive(Debug, Clone)]
pub struct RemoveCurveCommand {
    id: EntityId,
    removed: Option<Curve>,
}

impl RemoveCurveCommand {
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            removed: None,
        }
    }
}

impl EditCommand for RemoveCurveCommand {
    fn execute(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError> {
        ensure_editable(ctx.document, EntityKind::Curve, &self.id)?;
        self.removed = ctx.document.remove_curve(&self.id);
        detach(ctx, EntityKind::Curve, &self.id);
        Ok(())
    }

    fn undo(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError> {
        let curve = self.removed.clone().ok_or(EditError::NotApplied)?;
        ensure_absent(ctx.document, EntityKind::Curve, &self.id)?;
        validate_point_chain(ctx.document, EntityKind::Curve, &curve.control_point_ids)?;
        ctx.document.insert_curve(curve);
        ctx.render(EntityKind::Curve, &self.id);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("Remove curve {}", self.id)
    }
}

// ---- 面 ----

#[derive(Debug, Clone)]
pub struct CreatePlaneCommand {
    plane: Plane,
}

impl CreatePlaneCommand {
    pub fn new(id: impl Into<EntityId>, vertices: Vec<Point3>) -> Self {
        Self {
            plane: Plane::new(id, vertices),
        }
    }

    /// 记录每个顶点来源的点，点移动时据此同步顶点。
    pub fn with_anchors(mut self, anchors: Vec<Option<EntityId>>) -> Self {
        self.plane = self.plane.with_anchors(anchors);
        self
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.plane.color = color.clamped();
        self
    }

    pub fn id(&self) -> &EntityId {
        &self.plane.id
    }

    pub fn vertices(&self) -> &[Point3] {
        &self.plane.vertices
    }
}

impl EditCommand for CreatePlaneCommand {
    fn execute(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError> {
        ensure_absent(ctx.document, EntityKind::Plane, &self.plane.id)?;
        validate_plane(&self.plane)?;
        ctx.document.insert_plane(self.plane.clone());
        ctx.render(EntityKind::Plane, &self.plane.id);
        Ok(())
    }

    fn undo(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError> {
        ctx.document
            .remove_plane(&self.plane.id)
            .ok_or_else(|| EditError::not_found(EntityKind::Plane, &self.plane.id))?;
        detach(ctx, EntityKind::Plane, &self.plane.id);
        Ok(())
    }

    fn describe(&self) -> String {
        format!(
            "Create plane {} with {} vertices",
            self.plane.id,
            self.plane.vertices.len()
        )
    }
}

#[derive(Debug, Clone)]
pub struct RemovePlaneCommand {
    id: EntityId,
    removed: Option<Plane>,
}

impl RemovePlaneCommand {
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            removed: None,
        }
    }
}

impl EditCommand for RemovePlaneCommand {
    fn execute(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError> {
        ensure_editable(ctx.document, EntityKind::Plane, &self.id)?;
        self.removed = ctx.document.remove_plane(&self.id);
        detach(ctx, EntityKind::Plane, &self.id);
        Ok(())
    }

    fn undo(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError> {
        let plane = self.removed.clone().ok_or(EditError::NotApplied)?;
        ensure_absent(ctx.document, EntityKind::Plane, &self.id)?;
        ctx.document.insert_plane(plane);
        ctx.render(EntityKind::Plane, &self.id);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("Remove plane {}", self.id)
    }
}

// ---- 颜色 ----

/// 修改任意类别实体的颜色。旧颜色在首次执行时记录。
#[derive(Debug, Clone)]
pub struct SetColorCommand {
    kind: EntityKind,
    id: EntityId,
    new: Rgb,
    old: Option<Rgb>,
}

impl SetColorCommand {
    pub fn new(kind: EntityKind, id: impl Into<EntityId>, color: Rgb) -> Self {
        Self {
            kind,
            id: id.into(),
            new: color.clamped(),
            old: None,
        }
    }

    fn apply(&self, ctx: &mut EditContext<'_>, color: Rgb) -> Result<(), EditError> {
        ctx.document
            .set_color(self.kind, &self.id, color)
            .ok_or_else(|| EditError::not_found(self.kind, &self.id))?;
        // 高亮中的实体只更新缓存的原色，保持高亮显示
        let highlighted = match ctx.selection.highlight() {
            Some(h) if h.kind == self.kind && h.id == self.id => Some(h.clone()),
            _ => None,
        };
        match highlighted {
            Some(mut highlight) => {
                highlight.original = color;
                ctx.selection.set_highlight(highlight);
            }
            None => ctx.render(self.kind, &self.id),
        }
        Ok(())
    }
}

impl EditCommand for SetColorCommand {
    fn execute(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError> {
        ensure_editable(ctx.document, self.kind, &self.id)?;
        if self.old.is_none() {
            self.old = ctx.document.color(self.kind, &self.id);
        }
        self.apply(ctx, self.new)
    }

    fn undo(&mut self, ctx: &mut EditContext<'_>) -> Result<(), EditError> {
        let old = self.old.ok_or(EditError::NotApplied)?;
        ensure_editable(ctx.document, self.kind, &self.id)?;
        self.apply(ctx, old)
    }

    fn describe(&self) -> String {
        format!("Set {} {} color", self.kind, self.id)
    }
}

#[cfg(test)]
mod tests {
    use geomedit_core::document::Document;

    use super::*;
    use crate::history::UndoManager;
    use crate::selection::{Highlight, SelectionKind, SelectionState};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn run(
        doc: &mut Document,
        selection: &mut SelectionState,
        command: &mut dyn EditCommand,
    ) -> Result<(), EditError> {
        let mut ctx = EditContext::new(doc, selection, None);
        command.execute(&mut ctx)
    }

    fn revert(
        doc: &mut Document,
        selection: &mut SelectionState,
        command: &mut dyn EditCommand,
    ) -> Result<(), EditError> {
        let mut ctx = EditContext::new(doc, selection, None);
        command.undo(&mut ctx)
    }

    fn seeded() -> (Document, SelectionState) {
        let mut doc = Document::new();
        doc.insert_point(Point::new("a", p(0.0, 0.0, 0.0)));
        doc.insert_point(Point::new("b", p(10.0, 0.0, 0.0)));
        doc.insert_point(Point::new("c", p(10.0, 10.0, 0.0)));
        (doc, SelectionState::new())
    }

    #[test]
    fn create_point_quantizes_and_rejects_duplicates() {
        let (mut doc, mut sel) = seeded();
        let mut create = CreatePointCommand::new("q", [1.234, 5.678, -0.004]);
        run(&mut doc, &mut sel, &mut create).unwrap();
        assert_eq!(doc.point(&"q".into()).unwrap().position.to_array(), [1.23, 5.68, 0.0]);

        let mut again = CreatePointCommand::new("q", [9.0, 9.0, 9.0]);
        let err = run(&mut doc, &mut sel, &mut again).unwrap_err();
        assert!(matches!(err, EditError::DuplicateId { .. }));
        assert_eq!(doc.point(&"q".into()).unwrap().position, p(1.23, 5.68, 0.0));

        revert(&mut doc, &mut sel, &mut create).unwrap();
        assert!(doc.point(&"q".into()).is_none());
    }

    #[test]
    fn non_finite_positions_are_rejected() {
        let (mut doc, mut sel) = seeded();
        let mut create = CreatePointCommand::new("bad", [f64::NAN, 0.0, 0.0]);
        assert_eq!(run(&mut doc, &mut sel, &mut create), Err(EditError::NonFinite));
        let mut moved = MovePointCommand::to("a", [f64::INFINITY, 0.0, 0.0]);
        assert_eq!(run(&mut doc, &mut sel, &mut moved), Err(EditError::NonFinite));
    }

    #[test]
    fn remove_point_restores_full_record() {
        let (mut doc, mut sel) = seeded();
        {
            let point = doc.point_mut(&"a".into()).unwrap();
            point.name = Some("origin".into());
            point.color = Rgb::YELLOW;
        }
        let before = doc.point(&"a".into()).cloned();
        sel.select(SelectionKind::Point, "a".into());

        let mut remove = RemovePointCommand::new("a");
        run(&mut doc, &mut sel, &mut remove).unwrap();
        assert!(doc.point(&"a".into()).is_none());
        assert!(sel.selected().is_none());

        revert(&mut doc, &mut sel, &mut remove).unwrap();
        assert_eq!(doc.point(&"a".into()).cloned(), before);
    }

    #[test]
    fn locked_and_referenced_points_cannot_be_removed() {
        let (mut doc, mut sel) = seeded();
        doc.point_mut(&"c".into()).unwrap().locked = true;
        let mut remove_locked = RemovePointCommand::new("c");
        assert!(matches!(
            run(&mut doc, &mut sel, &mut remove_locked),
            Err(EditError::Locked { .. })
        ));

        doc.insert_line(Line::between_points("l", "a".into(), "b".into()));
        let mut remove_used = RemovePointCommand::new("a");
        assert_eq!(
            run(&mut doc, &mut sel, &mut remove_used),
            Err(EditError::PointInUse("a".into()))
        );
        assert!(doc.point(&"a".into()).is_some());

        let mut remove_missing = RemovePointCommand::new("zz");
        assert!(matches!(
            run(&mut doc, &mut sel, &mut remove_missing),
            Err(EditError::NotFound { .. })
        ));
        assert_eq!(revert(&mut doc, &mut sel, &mut remove_missing), Err(EditError::NotApplied));
    }

    #[test]
    fn move_point_updates_lines_and_anchored_planes() {
        let (mut doc, mut sel) = seeded();
        doc.insert_line(Line::between_points("l", "a".into(), "b".into()));
        doc.insert_plane(
            Plane::new("f", vec![p(0.0, 0.0, 0.0), p(10.0, 0.0, 0.0), p(10.0, 10.0, 0.0)])
                .with_anchors(vec![Some("a".into()), None, None]),
        );

        let mut moved = MovePointCommand::new("a", p(0.0, 0.0, 0.0), p(5.0, 5.0, 5.0));
        run(&mut doc, &mut sel, &mut moved).unwrap();
        assert_eq!(doc.line_endpoints(&"l".into()).unwrap().0, p(5.0, 5.0, 5.0));
        assert_eq!(doc.plane(&"f".into()).unwrap().vertices[0], p(5.0, 5.0, 5.0));
        assert_eq!(doc.plane(&"f".into()).unwrap().vertices[1], p(10.0, 0.0, 0.0));

        revert(&mut doc, &mut sel, &mut moved).unwrap();
        assert_eq!(doc.point(&"a".into()).unwrap().position, p(0.0, 0.0, 0.0));
        assert_eq!(doc.line_endpoints(&"l".into()).unwrap().0, p(0.0, 0.0, 0.0));
        assert_eq!(doc.plane(&"f".into()).unwrap().vertices[0], p(0.0, 0.0, 0.0));
    }

    #[test]
    fn move_without_old_position_records_current() {
        let (mut doc, mut sel) = seeded();
        let mut moved = MovePointCommand::to("b", [3.333, 0.0, 0.0]);
        assert_eq!(revert(&mut doc, &mut sel, &mut moved), Err(EditError::NotApplied));
        run(&mut doc, &mut sel, &mut moved).unwrap();
        assert_eq!(doc.point(&"b".into()).unwrap().position, p(3.33, 0.0, 0.0));
        revert(&mut doc, &mut sel, &mut moved).unwrap();
        assert_eq!(doc.point(&"b".into()).unwrap().position, p(10.0, 0.0, 0.0));
    }

    #[test]
    fn line_validation() {
        let (mut doc, mut sel) = seeded();
        let mut same = CreateLineCommand::between_points("l", "a".into(), "a".into());
        assert!(matches!(
            run(&mut doc, &mut sel, &mut same),
            Err(EditError::InvalidReference(_))
        ));
        let mut dangling = CreateLineCommand::between_points("l", "a".into(), "zz".into());
        assert!(matches!(
            run(&mut doc, &mut sel, &mut dangling),
            Err(EditError::InvalidReference(_))
        ));
        let mut mixed = CreateLineCommand::new(
            "l",
            EndpointRef::PointId("a".into()),
            EndpointRef::Coordinate(p(1.0, 2.0, 3.0)),
        );
        run(&mut doc, &mut sel, &mut mixed).unwrap();
        assert_eq!(doc.len(EntityKind::Line), 1);

        let mut duplicate = CreateLineCommand::between_points("l", "a".into(), "b".into());
        assert!(matches!(
            run(&mut doc, &mut sel, &mut duplicate),
            Err(EditError::DuplicateId { .. })
        ));
    }

    #[test]
    fn polyline_and_curve_require_enough_points() {
        let (mut doc, mut sel) = seeded();
        let mut short = CreatePolylineCommand::new("pl", vec!["a".into()]);
        assert!(matches!(
            run(&mut doc, &mut sel, &mut short),
            Err(EditError::TooFewPoints { required: 2, .. })
        ));

        let mut polyline = CreatePolylineCommand::new("pl", vec!["a".into(), "b".into(), "c".into()]);
        run(&mut doc, &mut sel, &mut polyline).unwrap();
        let mut remove = RemovePolylineCommand::new("pl");
        run(&mut doc, &mut sel, &mut remove).unwrap();
        assert!(doc.polyline(&"pl".into()).is_none());
        revert(&mut doc, &mut sel, &mut remove).unwrap();
        assert_eq!(doc.polyline_vertices(&"pl".into()).unwrap().len(), 3);

        let mut curve = CreateCurveCommand::new("cv", vec!["a".into(), "b".into(), "c".into()], 3, 20);
        run(&mut doc, &mut sel, &mut curve).unwrap();
        assert_eq!(doc.curve_samples(&"cv".into()).unwrap().len(), 20);
        // 被折线和曲线引用的点不可删除
        let mut remove_point = RemovePointCommand::new("b");
        assert!(run(&mut doc, &mut sel, &mut remove_point).is_err());

        let mut remove_curve = RemoveCurveCommand::new("cv");
        run(&mut doc, &mut sel, &mut remove_curve).unwrap();
        revert(&mut doc, &mut sel, &mut remove_curve).unwrap();
        revert(&mut doc, &mut sel, &mut curve).unwrap();
        assert!(doc.curve(&"cv".into()).is_none());
    }

    #[test]
    fn degenerate_planes_are_rejected() {
        let (mut doc, mut sel) = seeded();
        let mut two = CreatePlaneCommand::new("f", vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0)]);
        assert!(matches!(
            run(&mut doc, &mut sel, &mut two),
            Err(EditError::TooFewPoints { required: 3, .. })
        ));
        let mut flat = CreatePlaneCommand::new(
            "f",
            vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(2.0, 0.0, 0.0)],
        );
        assert!(matches!(
            run(&mut doc, &mut sel, &mut flat),
            Err(EditError::Degenerate(_))
        ));
        assert_eq!(doc.len(EntityKind::Plane), 0);
    }

    #[test]
    fn remove_plane_clears_active_plane() {
        let (mut doc, mut sel) = seeded();
        let mut create = CreatePlaneCommand::new(
            "f",
            vec![p(0.0, 0.0, 0.0), p(10.0, 0.0, 0.0), p(10.0, 10.0, 0.0)],
        );
        run(&mut doc, &mut sel, &mut create).unwrap();
        sel.select(SelectionKind::Plane, "f".into());

        let mut remove = RemovePlaneCommand::new("f");
        run(&mut doc, &mut sel, &mut remove).unwrap();
        assert!(sel.active_plane().is_none());
        revert(&mut doc, &mut sel, &mut remove).unwrap();
        assert_eq!(doc.plane(&"f".into()).unwrap().color, Rgb::GREEN);
    }

    #[test]
    fn set_color_round_trips_and_respects_locks() {
        let (mut doc, mut sel) = seeded();
        let mut history = UndoManager::default();
        let mut ctx = EditContext::new(&mut doc, &mut sel, None);
        history
            .execute_and_push(Box::new(SetColorCommand::new(EntityKind::Point, "a", Rgb::BLUE)), &mut ctx)
            .unwrap();
        assert_eq!(ctx.document.color(EntityKind::Point, &"a".into()), Some(Rgb::BLUE));
        history.undo(&mut ctx).unwrap();
        assert_eq!(ctx.document.color(EntityKind::Point, &"a".into()), Some(Rgb::RED));

        ctx.document.point_mut(&"b".into()).unwrap().locked = true;
        let err = history
            .execute_and_push(Box::new(SetColorCommand::new(EntityKind::Point, "b", Rgb::BLUE)), &mut ctx)
            .unwrap_err();
        assert!(matches!(err, EditError::Locked { .. }));
        assert_eq!(history.undo_len(), 0);
    }

    #[test]
    fn set_color_on_highlighted_entity_updates_cached_original() {
        let (mut doc, mut sel) = seeded();
        sel.set_highlight(Highlight {
            kind: EntityKind::Point,
            id: "a".into(),
            original: Rgb::RED,
        });
        let mut recolor = SetColorCommand::new(EntityKind::Point, "a", Rgb::GREEN);
        run(&mut doc, &mut sel, &mut recolor).unwrap();
        assert_eq!(sel.highlight().unwrap().original, Rgb::GREEN);
        revert(&mut doc, &mut sel, &mut recolor).unwrap();
        assert_eq!(sel.highlight().unwrap().original, Rgb::RED);
    }
}
