use geomedit_core::geometry::WorkspaceBounds;
use glam::{DMat4, DVec2, DVec3, DVec4};

use crate::viewport::Viewport;

const DEFAULT_FOV_Y_DEGREES: f64 = 30.0;
const DEFAULT_NEAR: f64 = 0.01;
const DEFAULT_FAR: f64 = 1000.0;
/// 初始相机距离为工作空间对角线长度的倍数。
const FRAMING_DISTANCE_FACTOR: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionKind {
    #[default]
    Perspective,
    Orthographic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// 垂直视场角（弧度）。
    Perspective { fov_y: f64 },
    /// 正交投影的半高（世界单位），半宽按宽高比推出。
    Orthographic { half_height: f64 },
}

/// 基于 look-at 视图矩阵的相机，实现 [`Viewport`]。
#[derive(Debug, Clone)]
pub struct LookAtCamera {
    eye: DVec3,
    target: DVec3,
    up: DVec3,
    projection: Projection,
    width: f64,
    height: f64,
    near: f64,
    far: f64,
}

impl LookAtCamera {
    pub fn new(
        eye: DVec3,
        target: DVec3,
        up: DVec3,
        projection: Projection,
        size: (f64, f64),
    ) -> Self {
        let far = DEFAULT_FAR.max(eye.distance(target) * 4.0);
        Self {
            eye,
            target,
            up,
            projection,
            width: size.0.max(1.0),
            height: size.1.max(1.0),
            near: DEFAULT_NEAR,
            far,
        }
    }

    /// 斜视整个工作空间，Z 轴朝上。
    pub fn framing(bounds: &WorkspaceBounds, width: f64, height: f64, kind: ProjectionKind) -> Self {
        let direction = DVec3::new(1.0, -1.0, 0.8).normalize();
        Self::looking_from(bounds, direction, DVec3::Z, (width, height), kind)
    }

    /// 自 +Z 方向俯视工作空间，屏幕右为 +X，屏幕上为 +Y。
    pub fn top_down(bounds: &WorkspaceBounds, width: f64, height: f64, kind: ProjectionKind) -> Self {
        Self::looking_from(bounds, DVec3::Z, DVec3::Y, (width, height), kind)
    }

    fn looking_from(
        bounds: &WorkspaceBounds,
        direction: DVec3,
        up: DVec3,
        size: (f64, f64),
        kind: ProjectionKind,
    ) -> Self {
        let diagonal = bounds.diagonal().max(1.0);
        let target = bounds.center();
        let eye = target + direction * diagonal * FRAMING_DISTANCE_FACTOR;
        let projection = match kind {
            ProjectionKind::Perspective => Projection::Perspective {
                fov_y: DEFAULT_FOV_Y_DEGREES.to_radians(),
            },
            ProjectionKind::Orthographic => Projection::Orthographic {
                half_height: diagonal * 0.5,
            },
        };
        Self::new(eye, target, up, projection, size)
    }

    #[inline]
    pub fn target(&self) -> DVec3 {
        self.target
    }

    #[inline]
    pub fn projection(&self) -> Projection {
        self.projection
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width.max(1.0);
        self.height = height.max(1.0);
    }

    /// 保持视线方向，将目标点移到 `focus`。
    pub fn focus_on(&mut self, focus: DVec3) {
        let offset = self.eye - self.target;
        self.target = focus;
        self.eye = focus + offset;
    }

    fn aspect(&self) -> f64 {
        self.width / self.height
    }

    fn view_projection(&self) -> DMat4 {
        let view = DMat4::look_at_rh(self.eye, self.target, self.up);
        let projection = match self.projection {
            Projection::Perspective { fov_y } => {
                DMat4::perspective_rh_gl(fov_y, self.aspect(), self.near, self.far)
            }
            Projection::Orthographic { half_height } => {
                let half_width = half_height * self.aspect();
                DMat4::orthographic_rh_gl(
                    -half_width,
                    half_width,
                    -half_height,
                    half_height,
                    self.near,
                    self.far,
                )
            }
        };
        projection * view
    }
}

impl Viewport for LookAtCamera {
    fn world_to_display(&self, world: DVec3) -> Option<DVec2> {
        let clip = self.view_projection() * world.extend(1.0);
        if clip.w <= f64::EPSILON {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        if !ndc.is_finite() {
            return None;
        }
        Some(DVec2::new(
            (ndc.x + 1.0) * 0.5 * self.width,
            (ndc.y + 1.0) * 0.5 * self.height,
        ))
    }

    fn display_to_world(&self, display: DVec2, depth: f64) -> DVec4 {
        let ndc = DVec4::new(
            display.x / self.width * 2.0 - 1.0,
            display.y / self.height * 2.0 - 1.0,
            depth * 2.0 - 1.0,
            1.0,
        );
        self.view_projection().inverse() * ndc
    }

    fn camera_position(&self) -> DVec3 {
        self.eye
    }

    fn viewport_size(&self) -> (f64, f64) {
        (self.width, self.height)
    }
}
