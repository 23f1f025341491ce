//! 面积累计：按（断面、桩号、地层）归并单元贡献。

use std::collections::HashMap;

use crate::report::ReportRow;

type Key = (String, String, String);

/// 追加式累计器。键首次出现的顺序即明细行的输出顺序；
/// 累加满足交换律，单元的处理顺序不影响结果。
#[derive(Debug, Default)]
pub struct Accumulator {
    order: Vec<Key>,
    sums: HashMap<Key, (f64, f64)>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        section: &str,
        station: &str,
        stratum: &str,
        design_area: f64,
        over_area: f64,
    ) {
        let key = (
            section.to_string(),
            station.to_string(),
            stratum.to_string(),
        );
        match self.sums.get_mut(&key) {
            Some(entry) => {
                entry.0 += design_area;
                entry.1 += over_area;
            }
            None => {
                self.sums.insert(key.clone(), (design_area, over_area));
                self.order.push(key);
            }
        }
    }

    /// 产出明细行：任一面积超过 `min_area` 的键才保留，数值四舍五入
    /// 到三位小数。
    pub fn into_rows(self, min_area: f64) -> Vec<ReportRow> {
        let Self { order, sums } = self;
        order
            .into_iter()
            .filter_map(|key| {
                let (design, over) = sums[&key];
                if design <= min_area && over <= min_area {
                    return None;
                }
                let (section, station, stratum) = key;
                Some(ReportRow {
                    section,
                    station,
                    stratum,
                    design_area: round3(design),
                    over_area: round3(over),
                })
            })
            .collect()
    }
}

#[inline]
pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contributions_merge_per_key() {
        let mut acc = Accumulator::new();
        acc.add("S1", "K12+300", "粉质黏土", 10.0, 1.0);
        acc.add("S1", "K12+300", "粉质黏土", 2.5, 0.25);
        acc.add("S1", "K12+300", "未知", 3.0, 0.0);

        let rows = acc.into_rows(0.1);
        assert_eq!(rows.len(), 2);
        assert!((rows[0].design_area - 12.5).abs() < 1e-9);
        assert!((rows[0].over_area - 1.25).abs() < 1e-9);
        assert_eq!(rows[1].stratum, "未知");
    }

    #[test]
    fn tiny_keys_are_dropped() {
        let mut acc = Accumulator::new();
        acc.add("S1", "K0+000", "未知", 0.05, 0.04);
        acc.add("S1", "K0+000", "粉质黏土", 0.0, 0.2);
        let rows = acc.into_rows(0.1);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].stratum, "粉质黏土");
    }

    #[test]
    fn totals_are_order_independent() {
        let cells = [
            ("粉质黏土", 1.25, 0.5),
            ("未知", 4.0, 0.0),
            ("粉质黏土", 2.75, 0.125),
            ("未知", 0.5, 1.5),
        ];
        let mut forward = Accumulator::new();
        for (name, d, o) in cells {
            forward.add("S1", "K1+000", name, d, o);
        }
        let mut backward = Accumulator::new();
        for (name, d, o) in cells.iter().rev() {
            backward.add("S1", "K1+000", name, *d, *o);
        }
        let rows_f = forward.into_rows(0.1);
        let rows_b = backward.into_rows(0.1);
        assert_eq!(rows_f.len(), rows_b.len());
        for row in &rows_f {
            let twin = rows_b
                .iter()
                .find(|r| r.stratum == row.stratum)
                .expect("两种顺序应有相同的键");
            assert!((row.design_area - twin.design_area).abs() < 1e-6);
            assert!((row.over_area - twin.over_area).abs() < 1e-6);
        }
    }

    #[test]
    fn rounding_is_three_decimals() {
        assert!((round3(1.23456) - 1.235).abs() < 1e-12);
        assert!((round3(0.0004) - 0.0).abs() < 1e-12);
    }
}
