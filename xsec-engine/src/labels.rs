//! 标注匹配：断面配桩号，地层单元配地层名。

use geo::{EuclideanDistance, Point, Polygon};
use xsec_core::geometry::Bounds2D;

use crate::curve_ops::to_coord;
use crate::extract::Label;

/// 无法归属地层名时的占位名称。
pub const UNKNOWN_STRATUM: &str = "未知";

/// 在断面框内挑选离框底中点最近的桩号文字；框内没有候选时退化为
/// 合成编号 `S{index}`。返回值的第二项标记是否用了合成编号。
pub fn station_for_section(
    bounds: &Bounds2D,
    stations: &[Label],
    index: usize,
) -> (String, bool) {
    let anchor = bounds.bottom_midpoint();
    let mut best: Option<(f64, &Label)> = None;
    for label in stations {
        if !bounds.contains(label.position) {
            continue;
        }
        let distance = label.position.distance_to(anchor);
        if best.is_none_or(|(d, _)| distance < d) {
            best = Some((distance, label));
        }
    }
    match best {
        Some((_, label)) => (label.text.clone(), false),
        None => (format!("S{index}"), true),
    }
}

/// 取第一个落在单元 `radius` 邻域内的地层文字。
///
/// 注意这是"先到先得"而非"最近者得"：两条地层名挨得很近时，归属
/// 取决于文字在图纸中的出现顺序。该行为与既有图纸的标注习惯一致，
/// 故保留原样。
pub fn stratum_for_cell<'a>(
    cell: &Polygon<f64>,
    labels: &'a [Label],
    radius: f64,
) -> Option<&'a str> {
    labels.iter().find_map(|label| {
        let p = Point::from(to_coord(label.position));
        (p.euclidean_distance(cell) < radius).then_some(label.text.as_str())
    })
}

#[cfg(test)]
mod tests {
    use geo::{LineString, coord};
    use xsec_core::geometry::Point2;

    use super::*;

    fn label(x: f64, y: f64, text: &str) -> Label {
        Label {
            position: Point2::new(x, y),
            text: text.to_string(),
        }
    }

    fn unit_cell() -> Polygon<f64> {
        Polygon::new(
            LineString::new(vec![
                coord! { x: 0.0, y: 0.0 },
                coord! { x: 10.0, y: 0.0 },
                coord! { x: 10.0, y: 10.0 },
                coord! { x: 0.0, y: 10.0 },
            ]),
            Vec::new(),
        )
    }

    #[test]
    fn nearest_station_to_bottom_midpoint_wins() {
        let bounds = Bounds2D::new(Point2::new(0.0, 0.0), Point2::new(100.0, 50.0));
        let stations = [
            label(10.0, 40.0, "K12+100"),
            label(52.0, 5.0, "K12+300"),
            label(500.0, 5.0, "K99+999"),
        ];
        let (station, defaulted) = station_for_section(&bounds, &stations, 1);
        assert_eq!(station, "K12+300");
        assert!(!defaulted);
    }

    #[test]
    fn missing_station_falls_back_to_ordinal() {
        let bounds = Bounds2D::new(Point2::new(0.0, 0.0), Point2::new(100.0, 50.0));
        let (station, defaulted) = station_for_section(&bounds, &[label(500.0, 5.0, "K1+000")], 3);
        assert_eq!(station, "S3");
        assert!(defaulted);
    }

    #[test]
    fn first_label_in_reach_wins_ties() {
        let cell = unit_cell();
        let labels = [
            label(50.0, 50.0, "太远"),
            label(5.0, 5.0, "粉质黏土"),
            label(5.1, 5.0, "强风化泥岩"),
        ];
        assert_eq!(
            stratum_for_cell(&cell, &labels, 0.3),
            Some("粉质黏土")
        );
    }

    #[test]
    fn label_just_outside_radius_misses() {
        let cell = unit_cell();
        assert_eq!(
            stratum_for_cell(&cell, &[label(10.4, 5.0, "外侧")], 0.3),
            None
        );
        assert_eq!(
            stratum_for_cell(&cell, &[label(10.2, 5.0, "贴边")], 0.3),
            Some("贴边")
        );
    }
}
