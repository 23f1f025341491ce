//! 独立填充模块：把四个语义图层的全部线网直接多边形化，给每个闭合
//! 区着色填充，供人工核图。结果只进图纸，不进算量。

use geo::{Area, Line, Polygon};
use tracing::debug;
use xsec_config::AppConfig;
use xsec_core::document::{Document, Hatch, HatchLoop};
use xsec_core::geometry::Point2;

use crate::arrange::polygonize;
use crate::compose::RegionGeometry;
use crate::curve_ops::push_segments;
use crate::extract::curves_on_layer;

/// 循环取色的固定调色板。
pub const FILL_PALETTE: [[u8; 3]; 5] = [
    [255, 200, 200],
    [200, 255, 200],
    [200, 200, 255],
    [255, 255, 180],
    [220, 180, 255],
];

/// 量测区域的回显颜色：设计开挖区黄色，净超挖区紫色。
pub const DESIGN_REGION_RGB: [u8; 3] = [255, 255, 0];
pub const NET_OVER_REGION_RGB: [u8; 3] = [200, 120, 255];

/// 输出图层的 ACI 颜色。
const HATCH_LAYER_COLOR: i16 = 7;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FillOutcome {
    /// 成功写出的填充实体数。
    pub written: usize,
    /// 因边界环退化而跳过的区域数。
    pub skipped: usize,
}

/// 在图纸上生成核图填充。四个语义图层都没有线形数据时不做任何事，
/// 也不创建输出图层。
pub fn fill_overlay(doc: &mut Document, cfg: &AppConfig) -> FillOutcome {
    let mut segments: Vec<Line<f64>> = Vec::new();
    for layer in [
        &cfg.layers.over,
        &cfg.layers.design,
        &cfg.layers.ground,
        &cfg.layers.geology,
    ] {
        for curve in curves_on_layer(doc, layer) {
            push_segments(curve.points(), &mut segments);
        }
    }
    if segments.is_empty() {
        return FillOutcome::default();
    }

    let regions: Vec<Polygon<f64>> = polygonize(&segments)
        .into_iter()
        .filter(|poly| poly.unsigned_area() > cfg.takeoff.min_cell_area)
        .collect();
    if regions.is_empty() {
        return FillOutcome::default();
    }

    doc.ensure_layer_colored(&cfg.layers.hatch_output, HATCH_LAYER_COLOR);
    let mut outcome = FillOutcome::default();
    for (index, region) in regions.iter().enumerate() {
        let Some(ring) = hatch_ring(region) else {
            outcome.skipped += 1;
            continue;
        };
        doc.add_hatch(Hatch {
            pattern_name: cfg.output.pattern_name.clone(),
            pattern_scale: cfg.output.pattern_scale,
            is_solid: false,
            rgb: Some(FILL_PALETTE[index % FILL_PALETTE.len()]),
            loops: vec![ring],
            layer: cfg.layers.hatch_output.clone(),
        });
        outcome.written += 1;
    }
    debug!(
        written = outcome.written,
        skipped = outcome.skipped,
        "核图填充生成完毕"
    );
    outcome
}

/// 把一个量测区域的各多边形按统一颜色写回图纸，供核对断面量测
/// 结果。区域为空时不落任何实体。
pub fn region_hatches(
    doc: &mut Document,
    region: &RegionGeometry,
    rgb: [u8; 3],
    cfg: &AppConfig,
) -> FillOutcome {
    let mut outcome = FillOutcome::default();
    if region.is_empty() {
        return outcome;
    }
    doc.ensure_layer_colored(&cfg.layers.hatch_output, HATCH_LAYER_COLOR);
    for poly in region.polygons() {
        let Some(ring) = hatch_ring(poly) else {
            outcome.skipped += 1;
            continue;
        };
        doc.add_hatch(Hatch {
            pattern_name: cfg.output.pattern_name.clone(),
            pattern_scale: cfg.output.pattern_scale,
            is_solid: false,
            rgb: Some(rgb),
            loops: vec![ring],
            layer: cfg.layers.hatch_output.clone(),
        });
        outcome.written += 1;
    }
    outcome
}

/// 外边界环转为填充路径；闭合重复点去掉，少于三个顶点的环写不出
/// 有效填充，按单实体失败跳过。
fn hatch_ring(region: &Polygon<f64>) -> Option<HatchLoop> {
    let coords = &region.exterior().0;
    let take = if coords.len() > 1 && coords[0] == coords[coords.len() - 1] {
        coords.len() - 1
    } else {
        coords.len()
    };
    if take < 3 {
        return None;
    }
    Some(HatchLoop {
        vertices: coords[..take]
            .iter()
            .map(|c| Point2::new(c.x, c.y))
            .collect(),
        is_closed: true,
    })
}

#[cfg(test)]
mod tests {
    use xsec_core::document::Entity;

    use super::*;

    fn add_square(doc: &mut Document, layer: &str, x: f64, y: f64, size: f64) {
        doc.add_polyline(
            [
                Point2::new(x, y),
                Point2::new(x + size, y),
                Point2::new(x + size, y + size),
                Point2::new(x, y + size),
                Point2::new(x, y),
            ],
            true,
            layer,
        );
    }

    #[test]
    fn closed_regions_receive_cycled_colors() {
        let cfg = AppConfig::default();
        let mut doc = Document::new();
        add_square(&mut doc, &cfg.layers.design, 0.0, 0.0, 10.0);
        add_square(&mut doc, &cfg.layers.ground, 20.0, 0.0, 10.0);

        let outcome = fill_overlay(&mut doc, &cfg);
        assert_eq!(outcome.written, 2);
        assert_eq!(outcome.skipped, 0);

        let hatches: Vec<&Hatch> = doc
            .entities_on(&cfg.layers.hatch_output)
            .filter_map(|entity| match entity {
                Entity::Hatch(hatch) => Some(hatch),
                _ => None,
            })
            .collect();
        assert_eq!(hatches.len(), 2);
        assert_eq!(hatches[0].rgb, Some(FILL_PALETTE[0]));
        assert_eq!(hatches[1].rgb, Some(FILL_PALETTE[1]));
        assert_eq!(hatches[0].pattern_name, "ANSI31");
        assert!((hatches[0].pattern_scale - 0.8).abs() < 1e-9);
        assert_eq!(
            doc.layer(&cfg.layers.hatch_output).and_then(|l| l.color),
            Some(7)
        );
    }

    #[test]
    fn slivers_are_not_filled() {
        let cfg = AppConfig::default();
        let mut doc = Document::new();
        // 0.2 × 0.2 = 0.04，低于 0.1 的面积下限
        add_square(&mut doc, &cfg.layers.design, 0.0, 0.0, 0.2);
        let outcome = fill_overlay(&mut doc, &cfg);
        assert_eq!(outcome.written, 0);
        assert!(doc.layer(&cfg.layers.hatch_output).is_none());
    }

    #[test]
    fn empty_layers_leave_document_untouched() {
        let cfg = AppConfig::default();
        let mut doc = Document::new();
        doc.add_text(Point2::new(0.0, 0.0), "只有文字", 2.0, 0.0, &cfg.layers.geology);
        let outcome = fill_overlay(&mut doc, &cfg);
        assert_eq!(outcome, FillOutcome::default());
        assert_eq!(doc.entities().count(), 1);
    }

    #[test]
    fn open_linework_produces_no_fill() {
        let cfg = AppConfig::default();
        let mut doc = Document::new();
        doc.add_line(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0), &cfg.layers.ground);
        let outcome = fill_overlay(&mut doc, &cfg);
        assert_eq!(outcome.written, 0);
    }

    #[test]
    fn region_echo_uses_requested_color() {
        use geo::{LineString, coord};

        let cfg = AppConfig::default();
        let mut doc = Document::new();
        let square = Polygon::new(
            LineString::new(vec![
                coord! { x: 0.0, y: 0.0 },
                coord! { x: 4.0, y: 0.0 },
                coord! { x: 4.0, y: 4.0 },
                coord! { x: 0.0, y: 4.0 },
            ]),
            Vec::new(),
        );
        let region = RegionGeometry::Single(square);
        let outcome = region_hatches(&mut doc, &region, DESIGN_REGION_RGB, &cfg);
        assert_eq!(outcome.written, 1);

        let hatch = doc
            .entities_on(&cfg.layers.hatch_output)
            .find_map(|entity| match entity {
                Entity::Hatch(hatch) => Some(hatch),
                _ => None,
            })
            .expect("应当写出区域回显填充");
        assert_eq!(hatch.rgb, Some(DESIGN_REGION_RGB));

        let nothing = region_hatches(&mut doc, &RegionGeometry::Empty, NET_OVER_REGION_RGB, &cfg);
        assert_eq!(nothing, FillOutcome::default());
    }
}
