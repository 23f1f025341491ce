//! 断面分区：设计开挖线按缓冲连通性聚类，自左向右编号。

use geo::EuclideanDistance;
use tracing::debug;
use xsec_config::TakeoffConfig;
use xsec_core::geometry::{Bounds2D, Curve};

use crate::curve_ops::line_string;

/// 一个横断面的空间足迹。`index` 从 1 起计，`id` 即 `S{index}`。
#[derive(Debug, Clone)]
pub struct Section {
    pub index: usize,
    pub id: String,
    pub bounds: Bounds2D,
}

/// 并查集，路径压缩即可，聚类规模很小。
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            let root = self.find(self.parent[x]);
            self.parent[x] = root;
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[rb] = ra;
        }
    }
}

/// 按"半径 `cluster_buffer` 的缓冲互相搭接"给设计线分组：两缓冲相交
/// 等价于曲线间距小于两倍半径，因此直接以距离判定，分组结果与输入
/// 顺序无关。每组范围先补上缓冲半径（与缓冲并集的外包一致），再加
/// 页边距得到断面框，最后按框的最小 X 升序编号。
pub fn cluster_sections(design: &[Curve], cfg: &TakeoffConfig) -> Vec<Section> {
    if design.is_empty() {
        return Vec::new();
    }

    let strings: Vec<_> = design.iter().map(line_string).collect();
    let mut sets = UnionFind::new(design.len());
    let link_distance = cfg.cluster_buffer * 2.0;
    for i in 0..strings.len() {
        for j in (i + 1)..strings.len() {
            if strings[i].euclidean_distance(&strings[j]) < link_distance {
                sets.union(i, j);
            }
        }
    }

    let mut groups: Vec<(usize, Bounds2D)> = Vec::new();
    let mut group_of_root: Vec<Option<usize>> = vec![None; design.len()];
    for (idx, curve) in design.iter().enumerate() {
        let root = sets.find(idx);
        let slot = match group_of_root[root] {
            Some(slot) => slot,
            None => {
                groups.push((root, Bounds2D::empty()));
                group_of_root[root] = Some(groups.len() - 1);
                groups.len() - 1
            }
        };
        let bounds = curve.bounds();
        groups[slot].1.include_bounds(&bounds);
    }

    let mut boxes: Vec<Bounds2D> = groups
        .into_iter()
        .map(|(_, bounds)| {
            bounds.expanded(
                cfg.cluster_buffer + cfg.margin_x,
                cfg.cluster_buffer + cfg.margin_y,
            )
        })
        .collect();
    boxes.sort_by(|a, b| {
        a.min()
            .x()
            .partial_cmp(&b.min().x())
            .expect("断面框坐标不应为 NaN")
    });

    let sections: Vec<Section> = boxes
        .into_iter()
        .enumerate()
        .map(|(i, bounds)| Section {
            index: i + 1,
            id: format!("S{}", i + 1),
            bounds,
        })
        .collect();
    debug!(count = sections.len(), "断面聚类完成");
    sections
}
