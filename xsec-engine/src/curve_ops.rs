//! 曲线级工具：端部延长、同层曲线归并以及与 geo 类型的互转。

use std::collections::HashMap;

use geo::{Coord, Line, LineString, Polygon, Rect, coord};
use xsec_core::geometry::{Bounds2D, Curve, Point2};

#[inline]
pub(crate) fn to_coord(p: Point2) -> Coord<f64> {
    coord! { x: p.x(), y: p.y() }
}

pub(crate) fn line_string(curve: &Curve) -> LineString<f64> {
    LineString::new(curve.points().iter().copied().map(to_coord).collect())
}

/// 断面框的多边形形式，供与曲线做相交判定。
pub(crate) fn box_polygon(bounds: &Bounds2D) -> Polygon<f64> {
    Rect::new(to_coord(bounds.min()), to_coord(bounds.max())).to_polygon()
}

/// 曲线按相邻点对拆成线段，追加到 `out`。
pub(crate) fn push_segments(curve_points: &[Point2], out: &mut Vec<Line<f64>>) {
    for pair in curve_points.windows(2) {
        out.push(Line::new(to_coord(pair[0]), to_coord(pair[1])));
    }
}

/// 坐标量化键。`scale = 1e3` 即三位小数，用于端点度数统计；
/// `scale = 1e9` 接近精确匹配，用于曲线归并。
#[inline]
pub(crate) fn quantize(p: Point2, scale: f64) -> (i64, i64) {
    (
        (p.x() * scale).round() as i64,
        (p.y() * scale).round() as i64,
    )
}

/// 沿两端末段方向各向外延长 `distance`，返回追加了两个端点的新曲线。
/// 末段退化（零长）时以 1 代替模长，退化端只会重复原端点。
pub fn extend(curve: &Curve, distance: f64) -> Curve {
    let points = extend_points(curve.points(), distance);
    // 延长只增加点，原曲线已含两个不同点，构造必然成功
    Curve::new(points).unwrap_or_else(|| curve.clone())
}

pub(crate) fn extend_points(points: &[Point2], distance: f64) -> Vec<Point2> {
    if points.len() < 2 {
        return points.to_vec();
    }
    let (p1, p2) = (points[0], points[1]);
    let head_dir = p2.vector_to(p1);
    let head_mag = if head_dir.length() > 0.0 { head_dir.length() } else { 1.0 };
    let new_start = p1.translate(head_dir.scale(distance / head_mag));

    let (q1, q2) = (points[points.len() - 2], points[points.len() - 1]);
    let tail_dir = q1.vector_to(q2);
    let tail_mag = if tail_dir.length() > 0.0 { tail_dir.length() } else { 1.0 };
    let new_end = q2.translate(tail_dir.scale(distance / tail_mag));

    let mut extended = Vec::with_capacity(points.len() + 2);
    extended.push(new_start);
    extended.extend_from_slice(points);
    extended.push(new_end);
    extended
}

const MERGE_SCALE: f64 = 1e9;

/// 端点归并：恰有两个曲线端相汇的节点被串联成一条最大曲线，
/// 三岔以上的交汇点保持断开。等价于将同层离散线段重构为连续地层线。
pub fn merge_curves(curves: &[Curve]) -> Vec<Curve> {
    let mut ends: HashMap<(i64, i64), Vec<(usize, bool)>> = HashMap::new();
    for (idx, curve) in curves.iter().enumerate() {
        ends.entry(quantize(curve.first(), MERGE_SCALE))
            .or_default()
            .push((idx, true));
        ends.entry(quantize(curve.last(), MERGE_SCALE))
            .or_default()
            .push((idx, false));
    }

    let mut visited = vec![false; curves.len()];
    let mut merged = Vec::new();

    for start in 0..curves.len() {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        let mut chain: Vec<Point2> = curves[start].points().to_vec();

        // 从尾端延伸
        loop {
            let Some(next) = take_neighbor(&ends, &visited, chain[chain.len() - 1]) else {
                break;
            };
            let (idx, joins_at_start) = next;
            visited[idx] = true;
            let piece = if joins_at_start {
                curves[idx].clone()
            } else {
                curves[idx].reversed()
            };
            chain.extend_from_slice(&piece.points()[1..]);
        }
        // 从首端延伸
        loop {
            let Some(next) = take_neighbor(&ends, &visited, chain[0]) else {
                break;
            };
            let (idx, joins_at_start) = next;
            visited[idx] = true;
            let piece = if joins_at_start {
                curves[idx].reversed()
            } else {
                curves[idx].clone()
            };
            let mut head: Vec<Point2> = piece.points()[..piece.len() - 1].to_vec();
            head.extend_from_slice(&chain);
            chain = head;
        }

        if let Some(curve) = Curve::new(chain) {
            merged.push(curve);
        }
    }
    merged
}

/// 节点处恰有两条曲线端相汇且另一条尚未使用时，返回它及其连接方向。
fn take_neighbor(
    ends: &HashMap<(i64, i64), Vec<(usize, bool)>>,
    visited: &[bool],
    at: Point2,
) -> Option<(usize, bool)> {
    let incident = ends.get(&quantize(at, MERGE_SCALE))?;
    if incident.len() != 2 {
        return None;
    }
    incident
        .iter()
        .copied()
        .find(|&(idx, _)| !visited[idx])
}
