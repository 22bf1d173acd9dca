//! 距离与多边形判定等纯几何计算，不依赖任何实体状态。

use glam::{DVec2, DVec3};

const DEGENERATE_EPSILON: f64 = 1e-12;

#[inline]
pub fn distance_point_to_point(a: DVec3, b: DVec3) -> f64 {
    a.distance(b)
}

/// 点在线段上的投影，参数限制在 `[0, 1]`。零长度线段返回起点。
pub fn closest_point_on_segment(point: DVec3, start: DVec3, end: DVec3) -> DVec3 {
    let segment = end - start;
    let length_sq = segment.length_squared();
    if length_sq < DEGENERATE_EPSILON {
        return start;
    }
    let t = ((point - start).dot(segment) / length_sq).clamp(0.0, 1.0);
    start + segment * t
}

pub fn distance_point_to_segment(point: DVec3, start: DVec3, end: DVec3) -> f64 {
    point.distance(closest_point_on_segment(point, start, end))
}

pub fn closest_point_on_segment_2d(point: DVec2, start: DVec2, end: DVec2) -> DVec2 {
    let segment = end - start;
    let length_sq = segment.length_squared();
    if length_sq < DEGENERATE_EPSILON {
        return start;
    }
    let t = ((point - start).dot(segment) / length_sq).clamp(0.0, 1.0);
    start + segment * t
}

/// 屏幕空间中点到线段的像素距离。
pub fn distance_point_to_segment_2d(point: DVec2, start: DVec2, end: DVec2) -> f64 {
    point.distance(closest_point_on_segment_2d(point, start, end))
}

/// 由前三个顶点求单位法向量；不足三点或三点共线时返回 `None`。
pub fn plane_normal(vertices: &[DVec3]) -> Option<DVec3> {
    let [v0, v1, v2, ..] = vertices else {
        return None;
    };
    let normal = (*v1 - *v0).cross(*v2 - *v0);
    let length = normal.length();
    if length < DEGENERATE_EPSILON || !length.is_finite() {
        return None;
    }
    Some(normal / length)
}

/// Newell 法向量（未归一化，长度为多边形面积的两倍）。对任意顶点顺序稳定，
/// 全部顶点共线或重合时为零向量。
pub fn newell_normal(vertices: &[DVec3]) -> DVec3 {
    let count = vertices.len();
    (0..count).fold(DVec3::ZERO, |acc, index| {
        let current = vertices[index];
        let next = vertices[(index + 1) % count];
        acc + DVec3::new(
            (current.y - next.y) * (current.z + next.z),
            (current.z - next.z) * (current.x + next.x),
            (current.x - next.x) * (current.y + next.y),
        )
    })
}

/// 点到平面的距离。少于三个顶点时为无穷大；退化平面退回到最近顶点距离。
pub fn distance_point_to_plane(point: DVec3, vertices: &[DVec3]) -> f64 {
    if vertices.len() < 3 {
        return f64::INFINITY;
    }
    match plane_normal(vertices) {
        Some(normal) => (point - vertices[0]).dot(normal).abs(),
        None => vertices
            .iter()
            .map(|vertex| point.distance(*vertex))
            .fold(f64::INFINITY, f64::min),
    }
}

/// 射线法判断二维点是否位于多边形内部。
///
/// 水平边的交点取该边左端点的 x；竖直边总是翻转内外状态。
pub fn point_in_polygon(point: DVec2, vertices: &[DVec2]) -> bool {
    let count = vertices.len();
    if count < 3 {
        return false;
    }
    let (x, y) = (point.x, point.y);
    let mut inside = false;
    let mut p1 = vertices[0];
    for index in 1..=count {
        let p2 = vertices[index % count];
        if y > p1.y.min(p2.y) && y <= p1.y.max(p2.y) && x <= p1.x.max(p2.x) {
            let x_intersection = if p1.y != p2.y {
                (y - p1.y) * (p2.x - p1.x) / (p2.y - p1.y) + p1.x
            } else {
                p1.x
            };
            if p1.x == p2.x || x <= x_intersection {
                inside = !inside;
            }
        }
        p1 = p2;
    }
    inside
}

pub fn centroid(vertices: &[DVec3]) -> Option<DVec3> {
    if vertices.is_empty() {
        return None;
    }
    Some(vertices.iter().copied().sum::<DVec3>() / vertices.len() as f64)
}

pub fn centroid_2d(vertices: &[DVec2]) -> Option<DVec2> {
    if vertices.is_empty() {
        return None;
    }
    Some(vertices.iter().copied().sum::<DVec2>() / vertices.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Vec<DVec3> {
        vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn segment_distance_clamps_parameter() {
        let a = DVec3::ZERO;
        let b = DVec3::new(10.0, 0.0, 0.0);
        assert!((distance_point_to_segment(DVec3::new(5.0, 3.0, 0.0), a, b) - 3.0).abs() < 1e-12);
        assert!((distance_point_to_segment(DVec3::new(-4.0, 3.0, 0.0), a, b) - 5.0).abs() < 1e-12);
        assert!((distance_point_to_segment(DVec3::new(13.0, 4.0, 0.0), a, b) - 5.0).abs() < 1e-12);
        // 零长度线段
        assert!((distance_point_to_segment(DVec3::new(0.0, 2.0, 0.0), a, a) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn segment_distance_in_screen_space() {
        let d = distance_point_to_segment_2d(
            DVec2::new(5.0, 4.0),
            DVec2::new(0.0, 0.0),
            DVec2::new(10.0, 0.0),
        );
        assert!((d - 4.0).abs() < 1e-12);
    }

    #[test]
    fn plane_distance_uses_normal_and_degenerate_fallback() {
        let square = unit_square();
        assert!((distance_point_to_plane(DVec3::new(0.3, 0.3, -2.5), &square) - 2.5).abs() < 1e-12);

        let collinear = vec![
            DVec3::ZERO,
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(2.0, 0.0, 0.0),
        ];
        let d = distance_point_to_plane(DVec3::new(2.0, 3.0, 0.0), &collinear);
        assert!((d - 3.0).abs() < 1e-12);

        assert!(distance_point_to_plane(DVec3::ZERO, &square[..2]).is_infinite());
    }

    #[test]
    fn newell_normal_handles_collinear_leading_vertices() {
        // 前三点共线，但整体是正常的多边形
        let polygon = vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(5.0, 0.0, 0.0),
            DVec3::new(10.0, 0.0, 0.0),
            DVec3::new(10.0, 10.0, 0.0),
        ];
        assert!(plane_normal(&polygon).is_none());
        let normal = newell_normal(&polygon);
        assert!((normal - DVec3::new(0.0, 0.0, 100.0)).length() < 1e-9);

        let flat = vec![DVec3::ZERO, DVec3::X, DVec3::X * 2.0];
        assert!(newell_normal(&flat).length() < 1e-12);
    }

    #[test]
    fn polygon_containment() {
        let square: Vec<DVec2> = unit_square().iter().map(|v| v.truncate()).collect();
        assert!(point_in_polygon(DVec2::new(0.5, 0.5), &square));
        assert!(!point_in_polygon(DVec2::new(1.5, 0.5), &square));
        assert!(!point_in_polygon(DVec2::new(0.5, -0.1), &square));

        let concave = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(4.0, 0.0),
            DVec2::new(4.0, 4.0),
            DVec2::new(2.0, 1.0),
            DVec2::new(0.0, 4.0),
        ];
        assert!(point_in_polygon(DVec2::new(1.0, 1.0), &concave));
        assert!(!point_in_polygon(DVec2::new(2.0, 3.0), &concave));
        assert!(!point_in_polygon(DVec2::new(0.5, 0.5), &concave[..2]));
    }

    #[test]
    fn centroid_is_vertex_mean() {
        assert_eq!(centroid(&unit_square()), Some(DVec3::new(0.5, 0.5, 0.0)));
        assert_eq!(centroid(&[]), None);
    }
}
