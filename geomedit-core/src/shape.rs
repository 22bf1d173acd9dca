//! 曲线采样、线段链闭合与共面点排序。

use glam::DVec3;
use nalgebra::DMatrix;

/// 按控制点生成采样折线。
///
/// 两个控制点或一阶曲线直接返回控制点本身；三个及以上使用 Catmull-Rom 插值，
/// 首尾控制点各复制一次以确定端点切线，在段参数空间内均匀采样。
pub fn sample_curve(controls: &[DVec3], degree: usize, sample_count: usize) -> Vec<DVec3> {
    if controls.len() < 3 || degree <= 1 {
        return controls.to_vec();
    }
    catmull_rom(controls, sample_count.max(2))
}

fn catmull_rom(controls: &[DVec3], sample_count: usize) -> Vec<DVec3> {
    let last = controls.len() - 1;
    let mut extended = Vec::with_capacity(controls.len() + 2);
    extended.push(controls[0]);
    extended.extend_from_slice(controls);
    extended.push(controls[last]);

    let segments = last;
    (0..sample_count)
        .map(|index| {
            let s = index as f64 / (sample_count - 1) as f64 * segments as f64;
            let segment = (s.floor() as usize).min(segments - 1);
            let t = s - segment as f64;
            let [p0, p1, p2, p3] = [
                extended[segment],
                extended[segment + 1],
                extended[segment + 2],
                extended[segment + 3],
            ];
            let t2 = t * t;
            let t3 = t2 * t;
            0.5 * (2.0 * p1
                + (p2 - p0) * t
                + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
                + (3.0 * p1 - p0 - 3.0 * p2 + p3) * t3)
        })
        .collect()
}

/// 线段链上的顶点，`anchor` 由调用方携带（例如来源点的 id）。
#[derive(Debug, Clone, PartialEq)]
pub struct ChainVertex<A> {
    pub position: DVec3,
    pub anchor: A,
}

impl<A> ChainVertex<A> {
    pub fn new(position: DVec3, anchor: A) -> Self {
        Self { position, anchor }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainError {
    /// 少于三条线段。
    TooFew,
    /// 某条线段与链的开放端不相接。
    Disconnected { segment: usize },
    /// 所有线段相接，但末端没有回到起点。
    Open,
}

/// 将首尾相接的线段按顺序闭合为多边形顶点，必要时自动反转线段方向。
pub fn close_line_chain<A: Clone>(
    segments: &[(ChainVertex<A>, ChainVertex<A>)],
    tolerance: f64,
) -> Result<Vec<ChainVertex<A>>, ChainError> {
    let near = |a: &ChainVertex<A>, b: &ChainVertex<A>| a.position.distance(b.position) <= tolerance;

    let Some((first_start, first_end)) = segments.first() else {
        return Err(ChainError::TooFew);
    };
    let mut chain = vec![first_start.clone(), first_end.clone()];

    // 第一条线段若只在起点处与第二条相接，则整体反向
    if let Some((next_start, next_end)) = segments.get(1) {
        let joins_end = near(first_end, next_start) || near(first_end, next_end);
        let joins_start = near(first_start, next_start) || near(first_start, next_end);
        if !joins_end && joins_start {
            chain.reverse();
        }
    }

    for (index, (start, end)) in segments.iter().enumerate().skip(1) {
        let open_end = &chain[chain.len() - 1];
        if near(start, open_end) {
            chain.push(end.clone());
        } else if near(end, open_end) {
            chain.push(start.clone());
        } else {
            return Err(ChainError::Disconnected { segment: index });
        }
    }

    if segments.len() < 3 {
        return Err(ChainError::TooFew);
    }
    if !near(&chain[0], &chain[chain.len() - 1]) {
        return Err(ChainError::Open);
    }
    chain.pop();
    Ok(chain)
}

/// 共面点排序结果：输入下标的环绕顺序及拟合平面的单位法向量。
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedPolygon {
    pub order: Vec<usize>,
    pub normal: DVec3,
}

/// 对点集去重后拟合最佳平面（中心化点云的 SVD），在平面局部坐标系中按极角排序。
///
/// 有效点不足三个或点集共线时返回 `None`。
pub fn order_coplanar_points(points: &[DVec3], dedup_tolerance: f64) -> Option<OrderedPolygon> {
    let mut unique: Vec<usize> = Vec::with_capacity(points.len());
    for (index, point) in points.iter().enumerate() {
        if !point.is_finite() {
            return None;
        }
        if unique
            .iter()
            .all(|&kept| points[kept].distance(*point) > dedup_tolerance)
        {
            unique.push(index);
        }
    }
    if unique.len() < 3 {
        return None;
    }

    let center = unique.iter().map(|&i| points[i]).sum::<DVec3>() / unique.len() as f64;
    let centered = DMatrix::from_fn(unique.len(), 3, |row, col| {
        (points[unique[row]] - center)[col]
    });
    let svd = centered.svd(false, true);
    let v_t = svd.v_t?;

    let mut ranked: Vec<(usize, f64)> = svd.singular_values.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    let (normal_row, _) = ranked[0];
    let scale = ranked[ranked.len() - 1].1.max(1.0);
    if ranked.len() < 3 || ranked[1].1 < 1e-8 * scale {
        return None;
    }

    let normal = DVec3::new(
        v_t[(normal_row, 0)],
        v_t[(normal_row, 1)],
        v_t[(normal_row, 2)],
    )
    .normalize_or_zero();
    if normal == DVec3::ZERO {
        return None;
    }

    let reference = if normal.x.abs() < 0.9 { DVec3::X } else { DVec3::Y };
    let u = normal.cross(reference).normalize();
    let v = normal.cross(u);

    let mut angled: Vec<(usize, f64)> = unique
        .into_iter()
        .map(|index| {
            let offset = points[index] - center;
            (index, offset.dot(v).atan2(offset.dot(u)))
        })
        .collect();
    angled.sort_by(|a, b| a.1.total_cmp(&b.1));

    Some(OrderedPolygon {
        order: angled.into_iter().map(|(index, _)| index).collect(),
        normal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f64, y: f64, z: f64) -> DVec3 {
        DVec3::new(x, y, z)
    }

    fn segment(a: DVec3, b: DVec3, tag: (char, char)) -> (ChainVertex<char>, ChainVertex<char>) {
        (ChainVertex::new(a, tag.0), ChainVertex::new(b, tag.1))
    }

    #[test]
    fn curve_passes_through_end_controls() {
        let controls = [v(0.0, 0.0, 0.0), v(5.0, 5.0, 0.0), v(10.0, 0.0, 0.0)];
        let samples = sample_curve(&controls, 3, 21);
        assert_eq!(samples.len(), 21);
        assert!(samples[0].distance(controls[0]) < 1e-9);
        assert!(samples[20].distance(controls[2]) < 1e-9);
        // 中间采样点恰好落在中间控制点上
        assert!(samples[10].distance(controls[1]) < 1e-9);
    }

    #[test]
    fn short_or_linear_curves_return_controls() {
        let two = [v(0.0, 0.0, 0.0), v(1.0, 1.0, 1.0)];
        assert_eq!(sample_curve(&two, 3, 50), two.to_vec());
        let three = [v(0.0, 0.0, 0.0), v(1.0, 0.0, 0.0), v(1.0, 1.0, 0.0)];
        assert_eq!(sample_curve(&three, 1, 50), three.to_vec());
    }

    #[test]
    fn chain_with_mixed_directions_closes() {
        let (a, b, c, d) = (v(0.0, 0.0, 0.0), v(10.0, 0.0, 0.0), v(10.0, 10.0, 0.0), v(0.0, 10.0, 0.0));
        let segments = [
            segment(a, b, ('A', 'B')),
            segment(c, b, ('C', 'B')),
            segment(c, d, ('C', 'D')),
            segment(a, d, ('A', 'D')),
        ];
        let closed = close_line_chain(&segments, 1e-4).unwrap();
        let tags: Vec<char> = closed.iter().map(|vertex| vertex.anchor).collect();
        assert_eq!(tags, vec!['A', 'B', 'C', 'D']);
    }

    #[test]
    fn reversed_first_segment_is_flipped() {
        let (a, b, c) = (v(0.0, 0.0, 0.0), v(4.0, 0.0, 0.0), v(0.0, 3.0, 0.0));
        let segments = [
            segment(b, a, ('B', 'A')),
            segment(b, c, ('B', 'C')),
            segment(c, a, ('C', 'A')),
        ];
        let closed = close_line_chain(&segments, 1e-4).unwrap();
        let tags: Vec<char> = closed.iter().map(|vertex| vertex.anchor).collect();
        assert_eq!(tags, vec!['A', 'B', 'C']);
    }

    #[test]
    fn broken_or_open_chains_fail() {
        let (a, b, c, d) = (v(0.0, 0.0, 0.0), v(10.0, 0.0, 0.0), v(10.0, 10.0, 0.0), v(0.0, 10.0, 0.0));
        let open = [
            segment(a, b, ('A', 'B')),
            segment(b, c, ('B', 'C')),
            segment(c, d, ('C', 'D')),
        ];
        assert_eq!(close_line_chain(&open, 1e-4), Err(ChainError::Open));

        let gap = [
            segment(a, b, ('A', 'B')),
            segment(c, d, ('C', 'D')),
            segment(d, a, ('D', 'A')),
        ];
        assert_eq!(
            close_line_chain(&gap, 1e-4),
            Err(ChainError::Disconnected { segment: 1 })
        );
        assert_eq!(close_line_chain(&open[..2], 1e-4), Err(ChainError::TooFew));
    }

    #[test]
    fn coplanar_points_are_sorted_by_angle() {
        // 乱序输入的正方形
        let points = [
            v(0.0, 0.0, 0.0),
            v(10.0, 10.0, 0.0),
            v(10.0, 0.0, 0.0),
            v(0.0, 10.0, 0.0),
        ];
        let ordered = order_coplanar_points(&points, 1e-5).unwrap();
        assert_eq!(ordered.order.len(), 4);
        assert!((ordered.normal.z.abs() - 1.0).abs() < 1e-9);

        // 环绕顺序中对角点不相邻
        let position = |index: usize| ordered.order.iter().position(|&i| i == index).unwrap();
        let gap = (position(0) as i64 - position(1) as i64).rem_euclid(4);
        assert_eq!(gap, 2);
    }

    #[test]
    fn duplicate_and_collinear_points_are_rejected() {
        let duplicates = [v(1.0, 1.0, 1.0), v(1.0, 1.0, 1.0), v(2.0, 2.0, 2.0)];
        assert!(order_coplanar_points(&duplicates, 1e-5).is_none());

        let collinear = [v(0.0, 0.0, 0.0), v(1.0, 1.0, 0.0), v(2.0, 2.0, 0.0), v(3.0, 3.0, 0.0)];
        assert!(order_coplanar_points(&collinear, 1e-5).is_none());
    }
}
