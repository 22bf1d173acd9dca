//! 屏幕、显示、世界与平面局部坐标之间的转换。
//!
//! 屏幕坐标以左上角为原点（鼠标事件），显示坐标以左下角为原点（视口约定）。
//! 所有退化情形返回 `None`，由调用方回退到无约束的 [`screen_to_world`]。

use geomedit_core::geometry::WorkspaceBounds;
use glam::{DVec2, DVec3, DVec4};

use crate::viewport::Viewport;

const PARALLEL_EPSILON: f64 = 1e-9;

#[inline]
pub fn screen_to_display(viewport: &dyn Viewport, screen: DVec2) -> DVec2 {
    let (_, height) = viewport.viewport_size();
    DVec2::new(screen.x, height - screen.y - 1.0)
}

#[inline]
pub fn display_to_screen(viewport: &dyn Viewport, display: DVec2) -> DVec2 {
    let (_, height) = viewport.viewport_size();
    DVec2::new(display.x, height - display.y - 1.0)
}

pub fn world_to_screen(viewport: &dyn Viewport, world: DVec3) -> Option<DVec2> {
    viewport
        .world_to_display(world)
        .map(|display| display_to_screen(viewport, display))
}

fn homogeneous_to_world(value: DVec4) -> Option<DVec3> {
    if value.w == 0.0 {
        return None;
    }
    let world = value.truncate() / value.w;
    world.is_finite().then_some(world)
}

fn unproject(viewport: &dyn Viewport, display: DVec2, depth: f64) -> Option<DVec3> {
    homogeneous_to_world(viewport.display_to_world(display, depth))
}

/// 像素射线与场景求交；没有命中时在深度 0 处反投影。
pub fn screen_to_world_raycast(viewport: &dyn Viewport, screen: DVec2) -> Option<DVec3> {
    let display = screen_to_display(viewport, screen);
    if let Some(hit) = viewport.pick_surface(display).filter(|hit| hit.is_finite()) {
        return Some(hit);
    }
    unproject(viewport, display, 0.0)
}

/// 在给定归一化深度反投影像素；传入边界时逐轴限制到边界内。
pub fn screen_to_world(
    viewport: &dyn Viewport,
    screen: DVec2,
    depth: f64,
    clip: Option<&WorkspaceBounds>,
) -> Option<DVec3> {
    let world = unproject(viewport, screen_to_display(viewport, screen), depth)?;
    Some(match clip {
        Some(bounds) => bounds.clamp(world),
        None => world,
    })
}

/// 平面上的正交二维坐标系：`u` 沿第一条边，`v = normal × u`。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneBasis {
    pub origin: DVec3,
    pub u: DVec3,
    pub v: DVec3,
    pub normal: DVec3,
}

impl PlaneBasis {
    /// 由前三个顶点构造；第一条边长度为零或三点共线时返回 `None`。
    pub fn from_vertices(vertices: &[DVec3]) -> Option<Self> {
        let [origin, second, third, ..] = vertices else {
            return None;
        };
        let edge = *second - *origin;
        let u = edge.try_normalize()?;
        let normal = edge.cross(*third - *origin).try_normalize()?;
        Some(Self {
            origin: *origin,
            u,
            v: normal.cross(u),
            normal,
        })
    }

    #[inline]
    pub fn to_local(&self, world: DVec3) -> DVec2 {
        let offset = world - self.origin;
        DVec2::new(offset.dot(self.u), offset.dot(self.v))
    }

    #[inline]
    pub fn to_world(&self, local: DVec2) -> DVec3 {
        self.origin + self.u * local.x + self.v * local.y
    }

    /// 射线 `origin + t * direction` 与无限平面的交点，`t < 0` 视为无交点。
    pub fn intersect_ray(&self, origin: DVec3, direction: DVec3) -> Option<DVec3> {
        let denom = self.normal.dot(direction);
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }
        let t = self.normal.dot(self.origin - origin) / denom;
        if t < 0.0 || !t.is_finite() {
            return None;
        }
        Some(origin + direction * t)
    }
}

/// 像素射线与平面的世界交点。
pub fn screen_to_plane_point(
    viewport: &dyn Viewport,
    screen: DVec2,
    plane_vertices: &[DVec3],
) -> Option<DVec3> {
    let basis = PlaneBasis::from_vertices(plane_vertices)?;
    let display = screen_to_display(viewport, screen);
    let near = unproject(viewport, display, 0.0)?;
    let far = unproject(viewport, display, 1.0)?;
    let direction = (far - near).try_normalize()?;
    basis.intersect_ray(near, direction)
}

pub fn screen_to_plane_relative(
    viewport: &dyn Viewport,
    screen: DVec2,
    plane_vertices: &[DVec3],
) -> Option<DVec2> {
    let basis = PlaneBasis::from_vertices(plane_vertices)?;
    let hit = screen_to_plane_point(viewport, screen, plane_vertices)?;
    Some(basis.to_local(hit))
}

pub fn plane_relative_to_world(plane_vertices: &[DVec3], local: DVec2) -> Option<DVec3> {
    PlaneBasis::from_vertices(plane_vertices).map(|basis| basis.to_world(local))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{LookAtCamera, ProjectionKind};

    fn top_down() -> LookAtCamera {
        LookAtCamera::top_down(
            &WorkspaceBounds::default(),
            800.0,
            600.0,
            ProjectionKind::Orthographic,
        )
    }

    fn ground_square() -> Vec<DVec3> {
        vec![
            DVec3::new(0.0, 0.0, -25.0),
            DVec3::new(10.0, 0.0, -25.0),
            DVec3::new(10.0, 10.0, -25.0),
            DVec3::new(0.0, 10.0, -25.0),
        ]
    }

    #[test]
    fn screen_and_display_flip_vertically() {
        let camera = top_down();
        let display = screen_to_display(&camera, DVec2::new(10.0, 0.0));
        assert_eq!(display, DVec2::new(10.0, 599.0));
        assert_eq!(display_to_screen(&camera, display), DVec2::new(10.0, 0.0));
    }

    #[test]
    fn world_round_trips_through_screen() {
        let camera = top_down();
        let world = DVec3::new(20.0, -15.0, -25.0);
        let screen = world_to_screen(&camera, world).unwrap();
        let depth_hit = screen_to_plane_point(&camera, screen, &ground_square()).unwrap();
        assert!(depth_hit.distance(world) < 1e-6);
    }

    #[test]
    fn clipping_clamps_every_axis() {
        let camera = top_down();
        let bounds = WorkspaceBounds::from_array([-1.0, 1.0, -1.0, 1.0, -1.0, 1.0]);
        let world = screen_to_world(&camera, DVec2::new(0.0, 0.0), 0.0, Some(&bounds)).unwrap();
        assert!(bounds.contains(world));
        assert_eq!(world.x, -1.0);
        assert_eq!(world.y, 1.0);
    }

    /// 在相机之上附加固定命中点的拾取能力。
    struct PickingViewport {
        camera: LookAtCamera,
        hit: DVec3,
    }

    impl Viewport for PickingViewport {
        fn world_to_display(&self, world: DVec3) -> Option<DVec2> {
            self.camera.world_to_display(world)
        }

        fn display_to_world(&self, display: DVec2, depth: f64) -> DVec4 {
            self.camera.display_to_world(display, depth)
        }

        fn camera_position(&self) -> DVec3 {
            self.camera.camera_position()
        }

        fn viewport_size(&self) -> (f64, f64) {
            self.camera.viewport_size()
        }

        fn pick_surface(&self, _display: DVec2) -> Option<DVec3> {
            Some(self.hit)
        }
    }

    #[test]
    fn raycast_falls_back_to_depth_zero() {
        let camera = top_down();
        let center = world_to_screen(&camera, DVec3::new(0.0, 0.0, -25.0)).unwrap();
        let world = screen_to_world_raycast(&camera, center).unwrap();
        let near = screen_to_world(&camera, center, 0.0, None).unwrap();
        assert!(world.distance(near) < 1e-9);
        assert!(world.truncate().length() < 1e-6);
        // 深度 0 是近裁剪面，而不是相机目标所在的深度
        assert!(world.z > -25.0);
        assert!((world.z - camera.camera_position().z).abs() < 1.0);
    }

    #[test]
    fn raycast_prefers_picked_surface() {
        let viewport = PickingViewport {
            camera: top_down(),
            hit: DVec3::new(7.0, -3.0, -40.0),
        };
        let world = screen_to_world_raycast(&viewport, DVec2::new(100.0, 100.0)).unwrap();
        assert_eq!(world, DVec3::new(7.0, -3.0, -40.0));
    }

    #[test]
    fn plane_relative_coordinates_follow_first_edge() {
        let camera = top_down();
        let square = ground_square();
        let target = DVec3::new(3.0, 4.0, -25.0);
        let screen = world_to_screen(&camera, target).unwrap();
        let local = screen_to_plane_relative(&camera, screen, &square).unwrap();
        assert!((local - DVec2::new(3.0, 4.0)).length() < 1e-6);

        let back = plane_relative_to_world(&square, local).unwrap();
        assert!(back.distance(target) < 1e-6);
    }

    #[test]
    fn degenerate_or_parallel_planes_yield_none() {
        let camera = top_down();
        let collinear = vec![
            DVec3::ZERO,
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(2.0, 0.0, 0.0),
        ];
        assert!(screen_to_plane_relative(&camera, DVec2::new(400.0, 300.0), &collinear).is_none());
        assert!(plane_relative_to_world(&collinear, DVec2::ZERO).is_none());

        // 竖直平面与俯视射线平行
        let vertical = vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(10.0, 0.0, 0.0),
            DVec3::new(10.0, 0.0, -10.0),
        ];
        assert!(screen_to_plane_relative(&camera, DVec2::new(400.0, 300.0), &vertical).is_none());
    }

    #[test]
    fn planes_behind_the_camera_are_not_hit() {
        let camera = top_down();
        let above = camera.camera_position().z + 50.0;
        let plane = vec![
            DVec3::new(0.0, 0.0, above),
            DVec3::new(1.0, 0.0, above),
            DVec3::new(0.0, 1.0, above),
        ];
        assert!(screen_to_plane_point(&camera, DVec2::new(400.0, 300.0), &plane).is_none());
    }
}
