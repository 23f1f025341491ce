//! 算量报表的数据模型与抽象输出端。表格的具体序列化（工作簿等）
//! 由外层实现 [`ReportSink`] 提供。

use std::path::Path;

use serde::Serialize;

/// 明细行：一个（断面、桩号、地层）键的累计面积。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub section: String,
    pub station: String,
    pub stratum: String,
    pub design_area: f64,
    pub over_area: f64,
}

/// 桩号 × 地层 的汇总矩阵，缺格填 0。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotTable {
    pub stations: Vec<String>,
    pub strata: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl PivotTable {
    pub fn value(&self, station: &str, stratum: &str) -> Option<f64> {
        let row = self.stations.iter().position(|s| s == station)?;
        let col = self.strata.iter().position(|s| s == stratum)?;
        Some(self.values[row][col])
    }
}

/// 整份报表：明细按处理顺序，两张汇总表按桩号排序。
#[derive(Debug, Clone, Serialize)]
pub struct QuantityReport {
    pub rows: Vec<ReportRow>,
    pub design_pivot: PivotTable,
    pub over_pivot: PivotTable,
}

impl QuantityReport {
    pub fn from_rows(rows: Vec<ReportRow>) -> Self {
        let mut sorted: Vec<&ReportRow> = rows.iter().collect();
        sorted.sort_by_key(|row| station_sort_key(&row.station));

        let mut stations: Vec<String> = Vec::new();
        let mut strata: Vec<String> = Vec::new();
        for row in &sorted {
            if !stations.contains(&row.station) {
                stations.push(row.station.clone());
            }
            if !strata.contains(&row.stratum) {
                strata.push(row.stratum.clone());
            }
        }

        let mut design = vec![vec![0.0; strata.len()]; stations.len()];
        let mut over = vec![vec![0.0; strata.len()]; stations.len()];
        for row in &sorted {
            let r = stations
                .iter()
                .position(|s| s == &row.station)
                .expect("桩号已登记");
            let c = strata
                .iter()
                .position(|s| s == &row.stratum)
                .expect("地层已登记");
            design[r][c] += row.design_area;
            over[r][c] += row.over_area;
        }

        QuantityReport {
            rows,
            design_pivot: PivotTable {
                stations: stations.clone(),
                strata: strata.clone(),
                values: design,
            },
            over_pivot: PivotTable {
                stations,
                strata,
                values: over,
            },
        }
    }
}

/// 桩号排序键：抽出字符串里所有数字串按原顺序拼接成整数，
/// 例如 K71+300 得到 71300。不含数字时取 0。
///
/// 这是一个近似：数字段宽度不一致的桩号（如 K7+30 与 K71+300）
/// 可能得到错误的相对顺序。既有报表即按此约定排序，保持不变。
pub fn station_sort_key(station: &str) -> i64 {
    let digits: String = station.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return 0;
    }
    // 18 位以内必然落在 i64 范围，更长的桩号串直接截断
    let clipped = &digits[..digits.len().min(18)];
    clipped.parse::<i64>().unwrap_or(0)
}

/// 抽象表格输出端：接收整份报表并写到目标路径。
pub trait ReportSink {
    type Error;

    fn write(&self, report: &QuantityReport, path: &Path) -> Result<(), Self::Error>;
}
