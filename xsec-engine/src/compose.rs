//! 区域合成：设计开挖区、超挖区与地层切割网络。

use std::collections::HashMap;

use geo::{
    Area, BooleanOps, EuclideanDistance, Intersects, Line, LineString, MultiPolygon, Point,
    Polygon,
};
use xsec_config::TakeoffConfig;
use xsec_core::geometry::{Curve, Point2};

use crate::curve_ops::{box_polygon, extend_points, line_string, push_segments, quantize, to_coord};
use crate::frame::Frame;

/// 区域几何的显式形态：空、单多边形或多个多边形。
/// 合成、面积汇总与出图统一走 [`RegionGeometry::polygons`] 归一化，
/// 不再区分单体与集合。
#[derive(Debug, Clone)]
pub enum RegionGeometry {
    Empty,
    Single(Polygon<f64>),
    Multiple(Vec<Polygon<f64>>),
}

impl RegionGeometry {
    pub fn from_multi(multi: MultiPolygon<f64>) -> Self {
        let mut polys: Vec<Polygon<f64>> = multi
            .into_iter()
            .filter(|p| p.unsigned_area() > 1e-12)
            .collect();
        match polys.len() {
            0 => RegionGeometry::Empty,
            1 => RegionGeometry::Single(polys.remove(0)),
            _ => RegionGeometry::Multiple(polys),
        }
    }

    /// 归一化为多边形序列。
    pub fn polygons(&self) -> &[Polygon<f64>] {
        match self {
            RegionGeometry::Empty => &[],
            RegionGeometry::Single(poly) => std::slice::from_ref(poly),
            RegionGeometry::Multiple(polys) => polys,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, RegionGeometry::Empty)
    }

    pub fn area(&self) -> f64 {
        self.polygons().iter().map(|p| p.unsigned_area()).sum()
    }

    pub fn to_multi(&self) -> MultiPolygon<f64> {
        MultiPolygon::new(self.polygons().to_vec())
    }

    /// 点到区域的最近距离，位于区域内部时为 0；空区域为正无穷。
    pub fn distance_to_point(&self, point: Point2) -> f64 {
        let p = Point::from(to_coord(point));
        self.polygons()
            .iter()
            .map(|poly| p.euclidean_distance(poly))
            .fold(f64::INFINITY, f64::min)
    }

    /// 与给定单元的交集面积，区域为空或不相交时为 0。
    pub fn intersection_area(&self, cell: &Polygon<f64>) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let cell_multi = MultiPolygon::new(vec![cell.clone()]);
        cell_multi.intersection(&self.to_multi()).unsigned_area()
    }
}

/// 由一组边界曲线合成封闭开挖区：全部采样点按 X 排序，链条向上
/// 对框顶封口成环，再与贴地裁剪区求交。设计线与超挖框走同一路径。
pub fn compose_region(curves: &[Curve], frame: &Frame) -> RegionGeometry {
    let mut points: Vec<Point2> = curves
        .iter()
        .flat_map(|curve| curve.points().iter().copied())
        .collect();
    if points.is_empty() {
        return RegionGeometry::Empty;
    }
    points.sort_by(|a, b| a.x().partial_cmp(&b.x()).expect("边界点坐标不应为 NaN"));

    let top = frame.bounds.max().y();
    let first = points[0];
    let last = points[points.len() - 1];
    let mut ring = Vec::with_capacity(points.len() + 2);
    for point in &points {
        ring.push(to_coord(*point));
    }
    ring.push(to_coord(Point2::new(last.x(), top)));
    ring.push(to_coord(Point2::new(first.x(), top)));
    let shape = MultiPolygon::new(vec![Polygon::new(LineString::new(ring), Vec::new())]);
    let clip = MultiPolygon::new(vec![frame.clip.clone()]);
    RegionGeometry::from_multi(shape.intersection(&clip))
}

/// 净超挖 = 超挖 − 设计；缺设计时即总超挖，缺超挖时为空。
pub fn net_over_region(over: &RegionGeometry, design: &RegionGeometry) -> RegionGeometry {
    if over.is_empty() {
        RegionGeometry::Empty
    } else if design.is_empty() {
        over.clone()
    } else {
        RegionGeometry::from_multi(over.to_multi().difference(&design.to_multi()))
    }
}

/// 端点度数的量化精度：三位小数。
const NODE_SCALE: f64 = 1e3;

/// 组装地层切割网络：框底、左右框边、地面轮廓，加上经过悬挂端点
/// 补线与端部延长的地层线。返回的线段集可直接多边形化为地层单元。
///
/// 悬挂端点 = 全图范围内度数为 1、离地面轮廓足够远、且不在超挖区
/// 附近的地层线端点；它沿水平方向补到较近的框边，弥合绘图断口。
/// 超挖区附近的断口由超挖边界自然吸收，无需补线。
pub fn cutter_segments(
    frame: &Frame,
    merged_geology: &[Curve],
    over: &RegionGeometry,
    cfg: &TakeoffConfig,
) -> Vec<Line<f64>> {
    let mut degree: HashMap<(i64, i64), usize> = HashMap::new();
    for curve in merged_geology {
        *degree.entry(quantize(curve.first(), NODE_SCALE)).or_insert(0) += 1;
        *degree.entry(quantize(curve.last(), NODE_SCALE)).or_insert(0) += 1;
    }

    let bounds = frame.bounds;
    let (min_x, min_y) = (bounds.min().x(), bounds.min().y());
    let (max_x, max_y) = (bounds.max().x(), bounds.max().y());
    let mut segments: Vec<Line<f64>> = Vec::new();
    push_segments(
        &[Point2::new(min_x, min_y), Point2::new(max_x, min_y)],
        &mut segments,
    );
    push_segments(
        &[Point2::new(min_x, min_y), Point2::new(min_x, max_y)],
        &mut segments,
    );
    push_segments(
        &[Point2::new(max_x, min_y), Point2::new(max_x, max_y)],
        &mut segments,
    );
    push_segments(frame.profile.points(), &mut segments);

    let boundary = box_polygon(&bounds);
    let profile = frame.profile_line_string();
    for curve in merged_geology {
        if !boundary.intersects(&line_string(curve)) {
            continue;
        }
        let mut points = curve.points().to_vec();
        let head = points[0];
        if is_dangling(head, &degree, &profile, over, cfg) {
            points.insert(0, Point2::new(nearer_side(head.x(), min_x, max_x), head.y()));
        }
        let tail = points[points.len() - 1];
        if is_dangling(tail, &degree, &profile, over, cfg) {
            points.push(Point2::new(nearer_side(tail.x(), min_x, max_x), tail.y()));
        }
        let extended = extend_points(&points, cfg.cutter_extend);
        push_segments(&extended, &mut segments);
    }
    segments
}

fn is_dangling(
    point: Point2,
    degree: &HashMap<(i64, i64), usize>,
    profile: &LineString<f64>,
    over: &RegionGeometry,
    cfg: &TakeoffConfig,
) -> bool {
    if degree
        .get(&quantize(point, NODE_SCALE))
        .copied()
        .unwrap_or(0)
        != 1
    {
        return false;
    }
    let p = Point::from(to_coord(point));
    if p.euclidean_distance(profile) <= cfg.dangling_clearance {
        return false;
    }
    over.distance_to_point(point) > cfg.dangling_clearance
}

#[inline]
fn nearer_side(x: f64, min_x: f64, max_x: f64) -> f64 {
    if (x - min_x).abs() < (x - max_x).abs() {
        min_x
    } else {
        max_x
    }
}
