//! 单断面框架：重构地面线轮廓并生成贴地裁剪多边形。

use geo::{Intersects, LineString, Polygon};
use thiserror::Error;
use xsec_core::geometry::{Bounds2D, Curve, Point2};

use crate::curve_ops::{box_polygon, line_string, to_coord};

/// 地面数据缺失是按断面恢复的结果，不是错误传播：
/// 该断面整体跳过（无报表行、无填充），批处理继续。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameSkip {
    #[error("断面框内没有任何地面线数据")]
    MissingGround,
}

/// 断面派生状态：外框、横贯全框的地面轮廓线、以及地面以下的裁剪区。
#[derive(Debug, Clone)]
pub struct Frame {
    pub bounds: Bounds2D,
    pub profile: Curve,
    pub clip: Polygon<f64>,
}

impl Frame {
    /// 轮廓在给定 X 处的高程。轮廓点按 X 非降排序，两端取端点高程。
    pub fn profile_y_at(&self, x: f64) -> f64 {
        let points = self.profile.points();
        if x <= points[0].x() {
            return points[0].y();
        }
        for pair in points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if x <= b.x() {
                let dx = b.x() - a.x();
                if dx <= f64::EPSILON {
                    return a.y();
                }
                let t = (x - a.x()) / dx;
                return a.y() + (b.y() - a.y()) * t;
            }
        }
        points[points.len() - 1].y()
    }

    pub(crate) fn profile_line_string(&self) -> LineString<f64> {
        line_string(&self.profile)
    }
}

/// 汇集与断面框相交的地面线在框内的采样点，按 X 排序后在框的左右
/// 边界各补一个同高程端点，得到横贯全框的轮廓；裁剪区是轮廓与框底
/// 之间的区域。框内没有地面点时返回 [`FrameSkip::MissingGround`]。
pub fn build_frame(bounds: &Bounds2D, ground: &[Curve]) -> Result<Frame, FrameSkip> {
    let boundary = box_polygon(bounds);
    let mut points: Vec<Point2> = Vec::new();
    for curve in ground {
        if !boundary.intersects(&line_string(curve)) {
            continue;
        }
        points.extend(
            curve
                .points()
                .iter()
                .copied()
                .filter(|p| bounds.contains(*p)),
        );
    }
    if points.is_empty() {
        return Err(FrameSkip::MissingGround);
    }
    points.sort_by(|a, b| a.x().partial_cmp(&b.x()).expect("地面点坐标不应为 NaN"));

    let first = points[0];
    let last = points[points.len() - 1];
    let mut profile_points = Vec::with_capacity(points.len() + 2);
    profile_points.push(Point2::new(bounds.min().x(), first.y()));
    profile_points.extend_from_slice(&points);
    profile_points.push(Point2::new(bounds.max().x(), last.y()));
    let profile = Curve::new(profile_points).ok_or(FrameSkip::MissingGround)?;

    // 逆时针环：左下 → 右下 → 沿右边上行 → 轮廓自右向左 → 回到左边
    let mut ring = Vec::with_capacity(points.len() + 5);
    ring.push(to_coord(Point2::new(bounds.min().x(), bounds.min().y())));
    ring.push(to_coord(Point2::new(bounds.max().x(), bounds.min().y())));
    ring.push(to_coord(Point2::new(bounds.max().x(), last.y())));
    for point in points.iter().rev() {
        ring.push(to_coord(*point));
    }
    ring.push(to_coord(Point2::new(bounds.min().x(), first.y())));
    let clip = Polygon::new(LineString::new(ring), Vec::new());

    Ok(Frame {
        bounds: *bounds,
        profile,
        clip,
    })
}
