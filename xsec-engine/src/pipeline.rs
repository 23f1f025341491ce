//! 单张图纸的完整算量流程：核图填充、断面分区、区域合成、
//! 地层单元度量与面积汇总。

use geo::{Area, Centroid, Intersects};
use serde::Serialize;
use tracing::{debug, info, warn};
use xsec_config::AppConfig;
use xsec_core::document::Document;
use xsec_core::geometry::{Curve, Point2};

use crate::aggregate::Accumulator;
use crate::arrange::polygonize;
use crate::compose::{RegionGeometry, compose_region, cutter_segments, net_over_region};
use crate::curve_ops::{box_polygon, line_string, merge_curves};
use crate::extract::{curves_on_layer, labels_on_layer};
use crate::fill::{DESIGN_REGION_RGB, NET_OVER_REGION_RGB, fill_overlay, region_hatches};
use crate::frame::build_frame;
use crate::labels::{UNKNOWN_STRATUM, station_for_section, stratum_for_cell};
use crate::report::QuantityReport;
use crate::section::cluster_sections;

/// 每次可恢复的降级都会被计数，测试与日志据此观察跳过行为。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TakeoffStats {
    pub fill_written: usize,
    pub fill_skipped: usize,
    pub region_fills_written: usize,
    pub region_fills_skipped: usize,
    pub kernel_skipped_no_design: bool,
    pub sections_total: usize,
    pub sections_skipped_no_ground: usize,
    pub stations_defaulted: usize,
    pub cells_counted: usize,
    pub cells_dropped_outside: usize,
    pub cells_dropped_small: usize,
    pub cells_dropped_above_ground: usize,
    pub cells_dropped_degenerate: usize,
    pub rows_emitted: usize,
}

#[derive(Debug)]
pub struct TakeoffResult {
    /// 没有任何保留键时为 None，外层不写报表文件。
    pub report: Option<QuantityReport>,
    pub stats: TakeoffStats,
}

/// 对整张图纸执行算量。核图填充直接写回 `doc`；量测结果汇成报表返回。
pub fn run_takeoff(doc: &mut Document, cfg: &AppConfig) -> TakeoffResult {
    let mut stats = TakeoffStats::default();

    let fill = fill_overlay(doc, cfg);
    stats.fill_written = fill.written;
    stats.fill_skipped = fill.skipped;

    let design_curves = curves_on_layer(doc, &cfg.layers.design);
    if design_curves.is_empty() {
        info!("未发现设计线层数据，跳过算量内核");
        stats.kernel_skipped_no_design = true;
        return TakeoffResult {
            report: None,
            stats,
        };
    }

    let ground_curves = curves_on_layer(doc, &cfg.layers.ground);
    let over_curves = curves_on_layer(doc, &cfg.layers.over);
    let geology_curves = curves_on_layer(doc, &cfg.layers.geology);
    let geology_labels = labels_on_layer(doc, &cfg.layers.geology);
    let station_labels = labels_on_layer(doc, &cfg.layers.station);
    let merged_geology = merge_curves(&geology_curves);

    let sections = cluster_sections(&design_curves, &cfg.takeoff);
    stats.sections_total = sections.len();

    let mut acc = Accumulator::new();
    for section in &sections {
        let frame = match build_frame(&section.bounds, &ground_curves) {
            Ok(frame) => frame,
            Err(skip) => {
                warn!(section = %section.id, %skip, "跳过断面");
                stats.sections_skipped_no_ground += 1;
                continue;
            }
        };

        let (station, defaulted) =
            station_for_section(&section.bounds, &station_labels, section.index);
        if defaulted {
            stats.stations_defaulted += 1;
        }

        let boundary = box_polygon(&section.bounds);
        let local_design: Vec<Curve> = design_curves
            .iter()
            .filter(|c| boundary.intersects(&line_string(c)))
            .cloned()
            .collect();
        let local_over: Vec<Curve> = over_curves
            .iter()
            .filter(|c| boundary.intersects(&line_string(c)))
            .cloned()
            .collect();
        let design_region = compose_region(&local_design, &frame);
        let over_region = compose_region(&local_over, &frame);
        let net_region = net_over_region(&over_region, &design_region);

        // 量测区域回显到输出图层，便于人工核对
        for (region, rgb) in [
            (&design_region, DESIGN_REGION_RGB),
            (&net_region, NET_OVER_REGION_RGB),
        ] {
            let drawn = region_hatches(doc, region, rgb, cfg);
            stats.region_fills_written += drawn.written;
            stats.region_fills_skipped += drawn.skipped;
        }

        // 地层名只在本断面框内取候选，避免邻框文字串层
        let local_labels: Vec<_> = geology_labels
            .iter()
            .filter(|label| section.bounds.contains(label.position))
            .cloned()
            .collect();

        let cutters = cutter_segments(&frame, &merged_geology, &over_region, &cfg.takeoff);
        for cell in polygonize(&cutters) {
            let Some(centroid) = cell.centroid() else {
                stats.cells_dropped_degenerate += 1;
                continue;
            };
            let centroid_point = Point2::new(centroid.x(), centroid.y());
            if !section.bounds.contains(centroid_point) {
                stats.cells_dropped_outside += 1;
                continue;
            }
            if cell.unsigned_area() <= cfg.takeoff.min_cell_area {
                stats.cells_dropped_small += 1;
                continue;
            }
            if centroid.y() >= frame.profile_y_at(centroid.x()) {
                stats.cells_dropped_above_ground += 1;
                continue;
            }

            let stratum = stratum_for_cell(&cell, &local_labels, cfg.takeoff.label_radius)
                .unwrap_or(UNKNOWN_STRATUM);
            let design_area = design_region.intersection_area(&cell);
            let over_area = net_region.intersection_area(&cell);
            acc.add(&section.id, &station, stratum, design_area, over_area);
            stats.cells_counted += 1;
        }
        debug!(section = %section.id, station, "断面量测完成");
    }

    let rows = acc.into_rows(cfg.takeoff.min_cell_area);
    stats.rows_emitted = rows.len();
    let report = if rows.is_empty() {
        None
    } else {
        Some(QuantityReport::from_rows(rows))
    };
    TakeoffResult { report, stats }
}
