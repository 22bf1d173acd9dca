pub mod measure;
pub mod shape;

pub mod geometry {
    use glam::DVec3;
    use serde::{Deserialize, Serialize};

    /// 坐标写入统一保留两位小数，保证比较与去重稳定。
    #[inline]
    pub fn round_to_2_decimals(value: f64) -> f64 {
        let rounded = (value * 100.0).round() / 100.0;
        // 消除 -0.0，避免序列化与打印时出现负零
        if rounded == 0.0 { 0.0 } else { rounded }
    }

    #[inline]
    pub fn quantize(vec: DVec3) -> DVec3 {
        DVec3::new(
            round_to_2_decimals(vec.x),
            round_to_2_decimals(vec.y),
            round_to_2_decimals(vec.z),
        )
    }

    /// 三维点，构造时即完成两位小数量化，内部以 `glam::DVec3` 表示。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point3(DVec3);

    impl Point3 {
        #[inline]
        pub fn new(x: f64, y: f64, z: f64) -> Self {
            Self::from_vec(DVec3::new(x, y, z))
        }

        #[inline]
        pub fn from_vec(vec: DVec3) -> Self {
            Self(quantize(vec))
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn z(self) -> f64 {
            self.0.z
        }

        #[inline]
        pub fn as_vec3(self) -> DVec3 {
            self.0
        }

        #[inline]
        pub fn is_finite(self) -> bool {
            self.0.is_finite()
        }

        #[inline]
        pub fn distance(self, other: Point3) -> f64 {
            self.0.distance(other.0)
        }

        #[inline]
        pub fn to_array(self) -> [f64; 3] {
            self.0.to_array()
        }
    }

    impl From<DVec3> for Point3 {
        fn from(value: DVec3) -> Self {
            Self::from_vec(value)
        }
    }

    impl From<[f64; 3]> for Point3 {
        fn from(value: [f64; 3]) -> Self {
            Self::from_vec(DVec3::from_array(value))
        }
    }

    /// RGB 颜色，分量范围 0.0 ~ 1.0。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Rgb {
        pub r: f64,
        pub g: f64,
        pub b: f64,
    }

    impl Rgb {
        pub const RED: Rgb = Rgb::new(1.0, 0.0, 0.0);
        pub const GREEN: Rgb = Rgb::new(0.0, 1.0, 0.0);
        pub const BLUE: Rgb = Rgb::new(0.0, 0.0, 1.0);
        pub const YELLOW: Rgb = Rgb::new(1.0, 1.0, 0.0);
        /// 工作空间边界面使用的浅灰色。
        pub const BOUNDARY_GRAY: Rgb = Rgb::new(0.9, 0.9, 0.9);

        #[inline]
        pub const fn new(r: f64, g: f64, b: f64) -> Self {
            Self { r, g, b }
        }

        /// 将分量限制到 [0, 1]，非有限值按 0 处理。
        pub fn clamped(self) -> Self {
            let fix = |v: f64| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
            Self::new(fix(self.r), fix(self.g), fix(self.b))
        }

        #[inline]
        pub fn to_array(self) -> [f64; 3] {
            [self.r, self.g, self.b]
        }
    }

    /// 轴对齐的工作空间边界 `[xmin, xmax, ymin, ymax, zmin, zmax]`。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct WorkspaceBounds {
        min: DVec3,
        max: DVec3,
    }

    impl WorkspaceBounds {
        /// 按分量取最小/最大值，调用方无需保证参数顺序。
        pub fn new(a: DVec3, b: DVec3) -> Self {
            Self {
                min: a.min(b),
                max: a.max(b),
            }
        }

        pub fn from_array(bounds: [f64; 6]) -> Self {
            Self::new(
                DVec3::new(bounds[0], bounds[2], bounds[4]),
                DVec3::new(bounds[1], bounds[3], bounds[5]),
            )
        }

        pub fn to_array(&self) -> [f64; 6] {
            [
                self.min.x, self.max.x, self.min.y, self.max.y, self.min.z, self.max.z,
            ]
        }

        #[inline]
        pub fn min(&self) -> DVec3 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> DVec3 {
            self.max
        }

        /// 将坐标逐轴限制在边界内（含边界）。
        #[inline]
        pub fn clamp(&self, position: DVec3) -> DVec3 {
            position.clamp(self.min, self.max)
        }

        #[inline]
        pub fn contains(&self, position: DVec3) -> bool {
            position.cmpge(self.min).all() && position.cmple(self.max).all()
        }

        #[inline]
        pub fn center(&self) -> DVec3 {
            (self.min + self.max) * 0.5
        }

        #[inline]
        pub fn diagonal(&self) -> f64 {
            (self.max - self.min).length()
        }

        /// 八个角点：先 `zmin` 底面逆时针四点，再 `zmax` 顶面四点。
        pub fn corners(&self) -> [DVec3; 8] {
            let (lo, hi) = (self.min, self.max);
            [
                DVec3::new(lo.x, lo.y, lo.z),
                DVec3::new(hi.x, lo.y, lo.z),
                DVec3::new(hi.x, hi.y, lo.z),
                DVec3::new(lo.x, hi.y, lo.z),
                DVec3::new(lo.x, lo.y, hi.z),
                DVec3::new(hi.x, lo.y, hi.z),
                DVec3::new(hi.x, hi.y, hi.z),
                DVec3::new(lo.x, hi.y, hi.z),
            ]
        }
    }

    impl Default for WorkspaceBounds {
        fn default() -> Self {
            Self::from_array([-100.0, 100.0, -100.0, 100.0, -50.0, 0.0])
        }
    }

}

pub mod document {
    use std::collections::BTreeMap;
    use std::fmt;

    use serde::{Deserialize, Serialize};

    use crate::geometry::{Point3, Rgb};
    use crate::shape;

    /// 实体标识。各类别内唯一，不同类别之间互不影响。
    #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    pub struct EntityId(String);

    impl EntityId {
        #[inline]
        pub fn new(raw: impl Into<String>) -> Self {
            Self(raw.into())
        }

        #[inline]
        pub fn as_str(&self) -> &str {
            &self.0
        }
    }

    impl fmt::Display for EntityId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl From<&str> for EntityId {
        fn from(value: &str) -> Self {
            Self::new(value)
        }
    }

    impl From<String> for EntityId {
        fn from(value: String) -> Self {
            Self(value)
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum EntityKind {
        Point,
        Line,
        Polyline,
        Curve,
        Plane,
    }

    impl EntityKind {
        pub const ALL: [EntityKind; 5] = [
            EntityKind::Point,
            EntityKind::Line,
            EntityKind::Polyline,
            EntityKind::Curve,
            EntityKind::Plane,
        ];

        pub fn label(self) -> &'static str {
            match self {
                EntityKind::Point => "point",
                EntityKind::Line => "line",
                EntityKind::Polyline => "polyline",
                EntityKind::Curve => "curve",
                EntityKind::Plane => "plane",
            }
        }

        pub fn parse(raw: &str) -> Option<Self> {
            Self::ALL.into_iter().find(|kind| kind.label() == raw)
        }

        /// 新建实体时的默认颜色：点红、线蓝、面绿。
        pub fn default_color(self) -> Rgb {
            match self {
                EntityKind::Point => Rgb::RED,
                EntityKind::Line | EntityKind::Polyline | EntityKind::Curve => Rgb::BLUE,
                EntityKind::Plane => Rgb::GREEN,
            }
        }
    }

    impl fmt::Display for EntityKind {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.label())
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Point {
        pub id: EntityId,
        pub position: Point3,
        pub name: Option<String>,
        pub color: Rgb,
        pub locked: bool,
    }

    impl Point {
        pub fn new(id: impl Into<EntityId>, position: Point3) -> Self {
            Self {
                id: id.into(),
                position,
                name: None,
                color: EntityKind::Point.default_color(),
                locked: false,
            }
        }
    }

    /// 线段端点：直接坐标，或引用某个点（随点移动）。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub enum EndpointRef {
        Coordinate(Point3),
        PointId(EntityId),
    }

    impl EndpointRef {
        #[inline]
        pub fn point_id(&self) -> Option<&EntityId> {
            match self {
                EndpointRef::PointId(id) => Some(id),
                EndpointRef::Coordinate(_) => None,
            }
        }
    }

    impl From<Point3> for EndpointRef {
        fn from(value: Point3) -> Self {
            EndpointRef::Coordinate(value)
        }
    }

    impl From<EntityId> for EndpointRef {
        fn from(value: EntityId) -> Self {
            EndpointRef::PointId(value)
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Line {
        pub id: EntityId,
        pub start: EndpointRef,
        pub end: EndpointRef,
        pub color: Rgb,
        pub locked: bool,
    }

    impl Line {
        pub fn new(id: impl Into<EntityId>, start: EndpointRef, end: EndpointRef) -> Self {
            Self {
                id: id.into(),
                start,
                end,
                color: EntityKind::Line.default_color(),
                locked: false,
            }
        }

        /// 以两个点引用构造线段。
        pub fn between_points(id: impl Into<EntityId>, start: EntityId, end: EntityId) -> Self {
            Self::new(id, EndpointRef::PointId(start), EndpointRef::PointId(end))
        }

        pub fn references(&self, point_id: &EntityId) -> bool {
            self.start.point_id() == Some(point_id) || self.end.point_id() == Some(point_id)
        }
    }

    /// 折线：按顺序引用已有点，作为单个实体渲染。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Polyline {
        pub id: EntityId,
        pub point_ids: Vec<EntityId>,
        pub color: Rgb,
        pub locked: bool,
    }

    impl Polyline {
        pub fn new(id: impl Into<EntityId>, point_ids: Vec<EntityId>) -> Self {
            Self {
                id: id.into(),
                point_ids,
                color: EntityKind::Polyline.default_color(),
                locked: false,
            }
        }
    }

    /// 样条曲线：只保存控制点引用，采样折线在查询时生成。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Curve {
        pub id: EntityId,
        pub control_point_ids: Vec<EntityId>,
        pub degree: usize,
        pub sample_count: usize,
        pub color: Rgb,
        pub locked: bool,
    }

    impl Curve {
        pub const DEFAULT_DEGREE: usize = 3;
        pub const DEFAULT_SAMPLE_COUNT: usize = 100;

        /// 阶数被限制在 `[1, 控制点数 - 1]`，采样数至少为 2。
        pub fn new(
            id: impl Into<EntityId>,
            control_point_ids: Vec<EntityId>,
            degree: usize,
            sample_count: usize,
        ) -> Self {
            let max_degree = control_point_ids.len().saturating_sub(1).max(1);
            Self {
                id: id.into(),
                control_point_ids,
                degree: degree.clamp(1, max_degree),
                sample_count: sample_count.max(2),
                color: EntityKind::Curve.default_color(),
                locked: false,
            }
        }
    }

    /// 平面多边形。顶点为构造时的坐标快照；`anchors` 记录每个顶点取自哪个点（若有）。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Plane {
        pub id: EntityId,
        pub vertices: Vec<Point3>,
        pub anchors: Vec<Option<EntityId>>,
        pub color: Rgb,
        pub locked: bool,
    }

    impl Plane {
        pub fn new(id: impl Into<EntityId>, vertices: Vec<Point3>) -> Self {
            let anchors = vec![None; vertices.len()];
            Self {
                id: id.into(),
                vertices,
                anchors,
                color: EntityKind::Plane.default_color(),
                locked: false,
            }
        }

        /// `anchors` 长度与顶点不一致时按无锚点补齐或截断。
        pub fn with_anchors(mut self, mut anchors: Vec<Option<EntityId>>) -> Self {
            anchors.resize(self.vertices.len(), None);
            self.anchors = anchors;
            self
        }

        pub fn is_anchored_to(&self, point_id: &EntityId) -> bool {
            self.anchors.iter().flatten().any(|anchor| anchor == point_id)
        }

        /// 解除指向某点的锚定，顶点坐标保持不变。返回是否有锚点被解除。
        pub fn release_anchor(&mut self, point_id: &EntityId) -> bool {
            let mut released = false;
            for anchor in &mut self.anchors {
                if anchor.as_ref() == Some(point_id) {
                    *anchor = None;
                    released = true;
                }
            }
            released
        }

        pub fn centroid(&self) -> Option<glam::DVec3> {
            if self.vertices.is_empty() {
                return None;
            }
            let sum: glam::DVec3 = self.vertices.iter().map(|v| v.as_vec3()).sum();
            Some(sum / self.vertices.len() as f64)
        }
    }

    /// 依赖某个点的实体集合。
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct PointDependents {
        pub lines: Vec<EntityId>,
        pub polylines: Vec<EntityId>,
        pub curves: Vec<EntityId>,
        pub planes: Vec<EntityId>,
    }

    impl PointDependents {
        /// 是否存在以引用方式依赖该点的线类实体（面只保存快照，不计入）。
        pub fn has_references(&self) -> bool {
            !(self.lines.is_empty() && self.polylines.is_empty() && self.curves.is_empty())
        }
    }

    /// 实体仓库：各类别按 id 存放，同一实体只存一份。
    #[derive(Debug, Default, Clone, Serialize, Deserialize)]
    pub struct Document {
        points: BTreeMap<EntityId, Point>,
        lines: BTreeMap<EntityId, Line>,
        polylines: BTreeMap<EntityId, Polyline>,
        curves: BTreeMap<EntityId, Curve>,
        planes: BTreeMap<EntityId, Plane>,
    }

    impl Document {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn contains(&self, kind: EntityKind, id: &EntityId) -> bool {
            match kind {
                EntityKind::Point => self.points.contains_key(id),
                EntityKind::Line => self.lines.contains_key(id),
                EntityKind::Polyline => self.polylines.contains_key(id),
                EntityKind::Curve => self.curves.contains_key(id),
                EntityKind::Plane => self.planes.contains_key(id),
            }
        }

        /// 实体的锁定状态；实体不存在时返回 `None`。
        pub fn is_locked(&self, kind: EntityKind, id: &EntityId) -> Option<bool> {
            match kind {
                EntityKind::Point => self.points.get(id).map(|p| p.locked),
                EntityKind::Line => self.lines.get(id).map(|l| l.locked),
                EntityKind::Polyline => self.polylines.get(id).map(|p| p.locked),
                EntityKind::Curve => self.curves.get(id).map(|c| c.locked),
                EntityKind::Plane => self.planes.get(id).map(|p| p.locked),
            }
        }

        pub fn color(&self, kind: EntityKind, id: &EntityId) -> Option<Rgb> {
            match kind {
                EntityKind::Point => self.points.get(id).map(|p| p.color),
                EntityKind::Line => self.lines.get(id).map(|l| l.color),
                EntityKind::Polyline => self.polylines.get(id).map(|p| p.color),
                EntityKind::Curve => self.curves.get(id).map(|c| c.color),
                EntityKind::Plane => self.planes.get(id).map(|p| p.color),
            }
        }

        /// 写入颜色并返回旧值；实体不存在时不做修改。
        pub fn set_color(&mut self, kind: EntityKind, id: &EntityId, color: Rgb) -> Option<Rgb> {
            let slot = match kind {
                EntityKind::Point => self.points.get_mut(id).map(|p| &mut p.color),
                EntityKind::Line => self.lines.get_mut(id).map(|l| &mut l.color),
                EntityKind::Polyline => self.polylines.get_mut(id).map(|p| &mut p.color),
                EntityKind::Curve => self.curves.get_mut(id).map(|c| &mut c.color),
                EntityKind::Plane => self.planes.get_mut(id).map(|p| &mut p.color),
            }?;
            Some(std::mem::replace(slot, color))
        }

        pub fn len(&self, kind: EntityKind) -> usize {
            match kind {
                EntityKind::Point => self.points.len(),
                EntityKind::Line => self.lines.len(),
                EntityKind::Polyline => self.polylines.len(),
                EntityKind::Curve => self.curves.len(),
                EntityKind::Plane => self.planes.len(),
            }
        }

        /// 生成 `point_0`、`line_3` 形式的最小未占用 id。
        pub fn next_id(&self, kind: EntityKind) -> EntityId {
            (0_u64..)
                .map(|index| EntityId::new(format!("{}_{index}", kind.label())))
                .find(|candidate| !self.contains(kind, candidate))
                .unwrap_or_else(|| EntityId::new(kind.label()))
        }

        // ---- 点 ----

        #[inline]
        pub fn point(&self, id: &EntityId) -> Option<&Point> {
            self.points.get(id)
        }

        #[inline]
        pub fn point_mut(&mut self, id: &EntityId) -> Option<&mut Point> {
            self.points.get_mut(id)
        }

        /// 插入点，id 已存在时返回 `false` 且不修改。
        pub fn insert_point(&mut self, point: Point) -> bool {
            if self.points.contains_key(&point.id) {
                return false;
            }
            self.points.insert(point.id.clone(), point);
            true
        }

        pub fn remove_point(&mut self, id: &EntityId) -> Option<Point> {
            self.points.remove(id)
        }

        /// 非锁定的点（常规遍历不包含边界几何）。
        pub fn points(&self) -> impl Iterator<Item = &Point> + '_ {
            self.points.values().filter(|p| !p.locked)
        }

        /// 包含锁定边界点在内的全部点。
        pub fn all_points(&self) -> impl Iterator<Item = &Point> + '_ {
            self.points.values()
        }

        // ---- 线 ----

        #[inline]
        pub fn line(&self, id: &EntityId) -> Option<&Line> {
            self.lines.get(id)
        }

        #[inline]
        pub fn line_mut(&mut self, id: &EntityId) -> Option<&mut Line> {
            self.lines.get_mut(id)
        }

        pub fn insert_line(&mut self, line: Line) -> bool {
            if self.lines.contains_key(&line.id) {
                return false;
            }
            self.lines.insert(line.id.clone(), line);
            true
        }

        pub fn remove_line(&mut self, id: &EntityId) -> Option<Line> {
            self.lines.remove(id)
        }

        pub fn lines(&self) -> impl Iterator<Item = &Line> + '_ {
            self.lines.values().filter(|l| !l.locked)
        }

        pub fn all_lines(&self) -> impl Iterator<Item = &Line> + '_ {
            self.lines.values()
        }

        // ---- 折线 ----

        #[inline]
        pub fn polyline(&self, id: &EntityId) -> Option<&Polyline> {
            self.polylines.get(id)
        }

        #[inline]
        pub fn polyline_mut(&mut self, id: &EntityId) -> Option<&mut Polyline> {
            self.polylines.get_mut(id)
        }

        pub fn insert_polyline(&mut self, polyline: Polyline) -> bool {
            if self.polylines.contains_key(&polyline.id) {
                return false;
            }
            self.polylines.insert(polyline.id.clone(), polyline);
            true
        }

        pub fn remove_polyline(&mut self, id: &EntityId) -> Option<Polyline> {
            self.polylines.remove(id)
        }

        pub fn polylines(&self) -> impl Iterator<Item = &Polyline> + '_ {
            self.polylines.values().filter(|p| !p.locked)
        }

        // ---- 曲线 ----

        #[inline]
        pub fn curve(&self, id: &EntityId) -> Option<&Curve> {
            self.curves.get(id)
        }

        #[inline]
        pub fn curve_mut(&mut self, id: &EntityId) -> Option<&mut Curve> {
            self.curves.get_mut(id)
        }

        pub fn insert_curve(&mut self, curve: Curve) -> bool {
            if self.curves.contains_key(&curve.id) {
                return false;
            }
            self.curves.insert(curve.id.clone(), curve);
            true
        }

        pub fn remove_curve(&mut self, id: &EntityId) -> Option<Curve> {
            self.curves.remove(id)
        }

        pub fn curves(&self) -> impl Iterator<Item = &Curve> + '_ {
            self.curves.values().filter(|c| !c.locked)
        }

        // ---- 面 ----

        #[inline]
        pub fn plane(&self, id: &EntityId) -> Option<&Plane> {
            self.planes.get(id)
        }

        #[inline]
        pub fn plane_mut(&mut self, id: &EntityId) -> Option<&mut Plane> {
            self.planes.get_mut(id)
        }

        pub fn insert_plane(&mut self, plane: Plane) -> bool {
            if self.planes.contains_key(&plane.id) {
                return false;
            }
            self.planes.insert(plane.id.clone(), plane);
            true
        }

        pub fn remove_plane(&mut self, id: &EntityId) -> Option<Plane> {
            self.planes.remove(id)
        }

        pub fn planes(&self) -> impl Iterator<Item = &Plane> + '_ {
            self.planes.values().filter(|p| !p.locked)
        }

        pub fn all_planes(&self) -> impl Iterator<Item = &Plane> + '_ {
            self.planes.values()
        }

        // ---- 引用解析 ----

        /// 端点解析的唯一入口：坐标直接返回，点引用查表。
        pub fn resolve(&self, endpoint: &EndpointRef) -> Option<Point3> {
            match endpoint {
                EndpointRef::Coordinate(position) => Some(*position),
                EndpointRef::PointId(id) => self.points.get(id).map(|p| p.position),
            }
        }

        pub fn resolve_line(&self, line: &Line) -> Option<(Point3, Point3)> {
            Some((self.resolve(&line.start)?, self.resolve(&line.end)?))
        }

        pub fn line_endpoints(&self, id: &EntityId) -> Option<(Point3, Point3)> {
            self.resolve_line(self.lines.get(id)?)
        }

        fn resolve_point_ids(&self, ids: &[EntityId]) -> Option<Vec<Point3>> {
            ids.iter()
                .map(|id| self.points.get(id).map(|p| p.position))
                .collect()
        }

        pub fn polyline_vertices(&self, id: &EntityId) -> Option<Vec<Point3>> {
            self.resolve_point_ids(&self.polylines.get(id)?.point_ids)
        }

        pub fn curve_control_points(&self, id: &EntityId) -> Option<Vec<Point3>> {
            self.resolve_point_ids(&self.curves.get(id)?.control_point_ids)
        }

        /// 按需生成曲线的采样折线（不会作为点写入文档）。
        pub fn curve_samples(&self, id: &EntityId) -> Option<Vec<Point3>> {
            let curve = self.curves.get(id)?;
            let controls: Vec<_> = self
                .resolve_point_ids(&curve.control_point_ids)?
                .into_iter()
                .map(Point3::as_vec3)
                .collect();
            let samples = shape::sample_curve(&controls, curve.degree, curve.sample_count);
            Some(samples.into_iter().map(Point3::from_vec).collect())
        }

        /// 收集引用或锚定到指定点的实体。
        pub fn dependents_of_point(&self, point_id: &EntityId) -> PointDependents {
            PointDependents {
                lines: self
                    .lines
                    .values()
                    .filter(|line| line.references(point_id))
                    .map(|line| line.id.clone())
                    .collect(),
                polylines: self
                    .polylines
                    .values()
                    .filter(|p| p.point_ids.contains(point_id))
                    .map(|p| p.id.clone())
                    .collect(),
                curves: self
                    .curves
                    .values()
                    .filter(|c| c.control_point_ids.contains(point_id))
                    .map(|c| c.id.clone())
                    .collect(),
                planes: self
                    .planes
                    .values()
                    .filter(|plane| plane.is_anchored_to(point_id))
                    .map(|plane| plane.id.clone())
                    .collect(),
            }
        }
    }

}
