//! 引擎对外部协作者的窄接口：视口投影与渲染输出。

use geomedit_core::document::{EntityId, EntityKind};
use geomedit_core::geometry::Rgb;
use glam::{DVec2, DVec3, DVec4};

/// 相机与投影状态。显示坐标以左下角为原点，深度归一化到 `[0, 1]`。
pub trait Viewport {
    /// 世界坐标投影到显示坐标；点位于相机后方等无法投影时返回 `None`。
    fn world_to_display(&self, world: DVec3) -> Option<DVec2>;

    /// 显示坐标在给定深度反投影，返回未做齐次除法的世界坐标。
    fn display_to_world(&self, display: DVec2, depth: f64) -> DVec4;

    fn camera_position(&self) -> DVec3;

    fn viewport_size(&self) -> (f64, f64);

    /// 沿像素射线与已渲染几何求交。没有拾取能力的视口保持默认实现。
    fn pick_surface(&self, _display: DVec2) -> Option<DVec3> {
        None
    }
}

/// 渲染副作用出口。引擎在每次成功修改后调用，从不回读渲染状态。
pub trait Renderer {
    fn render_point(&mut self, id: &EntityId, position: DVec3, color: Rgb);

    fn render_line(&mut self, id: &EntityId, start: DVec3, end: DVec3, color: Rgb);

    fn render_polyline(&mut self, id: &EntityId, vertices: &[DVec3], color: Rgb);

    fn render_polygon(&mut self, id: &EntityId, vertices: &[DVec3], color: Rgb);

    fn remove_rendered(&mut self, kind: EntityKind, id: &EntityId);
}
