//! 平面布置：把一组可能相交、搭接、悬挑的线段整理成闭合面。
//!
//! 流程分四步：成对求交打断线段（含共线搭接与 T 形交点）、节点量化去重、
//! 剔除悬挑枝杈、按方位角排序半边后追踪面环。有界面以逆时针环输出，
//! 被包含的顺时针环归入最小包含壳作为孔洞。

use std::collections::{HashMap, HashSet};

use geo::algorithm::line_intersection::{LineIntersection, line_intersection};
use geo::{Contains, Coord, InteriorPoint, Line, LineString, Polygon, coord};

/// 节点量化精度。坐标以图纸单位计，1e-7 级别的吸附远小于任何
/// 算量容差，但足以并合浮点求交产生的近重合节点。
const SNAP_SCALE: f64 = 1e7;
/// 面积低于该值的面视为数值噪声。
const EPS_AREA: f64 = 1e-9;

type NodeKey = (i64, i64);

#[inline]
fn snap(c: Coord<f64>) -> NodeKey {
    (
        (c.x * SNAP_SCALE).round() as i64,
        (c.y * SNAP_SCALE).round() as i64,
    )
}

#[inline]
fn unsnap(key: NodeKey) -> Coord<f64> {
    coord! { x: key.0 as f64 / SNAP_SCALE, y: key.1 as f64 / SNAP_SCALE }
}

/// 线段内部参数（严格位于两端之间）时返回 t，端点触碰不算打断。
fn interior_param(seg: &Line<f64>, point: Coord<f64>) -> Option<f64> {
    let dx = seg.end.x - seg.start.x;
    let dy = seg.end.y - seg.start.y;
    let len2 = dx * dx + dy * dy;
    if len2 <= 0.0 {
        return None;
    }
    let t = ((point.x - seg.start.x) * dx + (point.y - seg.start.y) * dy) / len2;
    (t > 0.0 && t < 1.0).then_some(t)
}

#[inline]
fn point_at(seg: &Line<f64>, t: f64) -> Coord<f64> {
    coord! {
        x: seg.start.x + (seg.end.x - seg.start.x) * t,
        y: seg.start.y + (seg.end.y - seg.start.y) * t,
    }
}

/// 有向环的有符号面积（鞋带公式）。
fn ring_signed_area(ring: &[Coord<f64>]) -> f64 {
    let mut sum = 0.0;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    sum * 0.5
}

/// 把线段网络多边形化为闭合面。输入无需预先求并：重叠与交叉
/// 在打断阶段统一处理，未能闭合的枝杈被丢弃。
pub fn polygonize(segments: &[Line<f64>]) -> Vec<Polygon<f64>> {
    let segs: Vec<Line<f64>> = segments
        .iter()
        .copied()
        .filter(|seg| snap(seg.start) != snap(seg.end))
        .collect();
    if segs.is_empty() {
        return Vec::new();
    }

    // 1. 成对求交，记录每条线段的内部打断参数
    let mut cuts: Vec<Vec<f64>> = vec![Vec::new(); segs.len()];
    for i in 0..segs.len() {
        for j in (i + 1)..segs.len() {
            match line_intersection(segs[i], segs[j]) {
                Some(LineIntersection::SinglePoint { intersection, .. }) => {
                    if let Some(t) = interior_param(&segs[i], intersection) {
                        cuts[i].push(t);
                    }
                    if let Some(t) = interior_param(&segs[j], intersection) {
                        cuts[j].push(t);
                    }
                }
                Some(LineIntersection::Collinear { intersection }) => {
                    for c in [intersection.start, intersection.end] {
                        if let Some(t) = interior_param(&segs[i], c) {
                            cuts[i].push(t);
                        }
                        if let Some(t) = interior_param(&segs[j], c) {
                            cuts[j].push(t);
                        }
                    }
                }
                None => {}
            }
        }
    }

    // 2. 打断并量化，得到去重后的无向边
    let mut node_index: HashMap<NodeKey, usize> = HashMap::new();
    let mut nodes: Vec<Coord<f64>> = Vec::new();
    let mut edge_seen: HashSet<(NodeKey, NodeKey)> = HashSet::new();
    let mut edges: Vec<(usize, usize)> = Vec::new();

    let intern = |key: NodeKey,
                  node_index: &mut HashMap<NodeKey, usize>,
                  nodes: &mut Vec<Coord<f64>>| {
        *node_index.entry(key).or_insert_with(|| {
            nodes.push(unsnap(key));
            nodes.len() - 1
        })
    };

    for (seg, ts) in segs.iter().zip(cuts.iter_mut()) {
        ts.push(0.0);
        ts.push(1.0);
        ts.sort_by(|a, b| a.partial_cmp(b).expect("打断参数不应为 NaN"));
        for pair in ts.windows(2) {
            let a = snap(point_at(seg, pair[0]));
            let b = snap(point_at(seg, pair[1]));
            if a == b {
                continue;
            }
            let key = if a <= b { (a, b) } else { (b, a) };
            if !edge_seen.insert(key) {
                continue;
            }
            let ia = intern(a, &mut node_index, &mut nodes);
            let ib = intern(b, &mut node_index, &mut nodes);
            edges.push((ia, ib));
        }
    }

    // 3. 悬挑剔除：度数为 1 的节点所挂的边不可能参与闭合面
    let mut degree = vec![0usize; nodes.len()];
    for &(a, b) in &edges {
        degree[a] += 1;
        degree[b] += 1;
    }
    let mut alive = vec![true; edges.len()];
    let mut changed = true;
    while changed {
        changed = false;
        for (idx, &(a, b)) in edges.iter().enumerate() {
            if alive[idx] && (degree[a] == 1 || degree[b] == 1) {
                alive[idx] = false;
                degree[a] -= 1;
                degree[b] -= 1;
                changed = true;
            }
        }
    }

    // 4. 半边结构与面追踪
    let mut he_from = Vec::new();
    let mut he_to = Vec::new();
    for (idx, &(a, b)) in edges.iter().enumerate() {
        if !alive[idx] {
            continue;
        }
        he_from.push(a);
        he_to.push(b);
        he_from.push(b);
        he_to.push(a);
    }
    let he_count = he_from.len();
    if he_count == 0 {
        return Vec::new();
    }

    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for he in 0..he_count {
        outgoing[he_from[he]].push(he);
    }
    for (node, list) in outgoing.iter_mut().enumerate() {
        let origin = nodes[node];
        list.sort_by(|&p, &q| {
            let pa = nodes[he_to[p]];
            let qa = nodes[he_to[q]];
            let ang_p = (pa.y - origin.y).atan2(pa.x - origin.x);
            let ang_q = (qa.y - origin.y).atan2(qa.x - origin.x);
            ang_p.partial_cmp(&ang_q).expect("方位角不应为 NaN")
        });
    }

    // next(h)：到达节点后，取 twin(h) 逆时针序的前一条出边
    let mut next = vec![usize::MAX; he_count];
    for he in 0..he_count {
        let twin = he ^ 1;
        let list = &outgoing[he_to[he]];
        let pos = list
            .iter()
            .position(|&e| e == twin)
            .expect("半边应在出边表中");
        next[he] = if pos == 0 { list[list.len() - 1] } else { list[pos - 1] };
    }

    let mut visited = vec![false; he_count];
    let mut shells: Vec<(Vec<Coord<f64>>, f64)> = Vec::new();
    let mut pits: Vec<Vec<Coord<f64>>> = Vec::new();
    for start in 0..he_count {
        if visited[start] {
            continue;
        }
        let mut ring = Vec::new();
        let mut he = start;
        loop {
            visited[he] = true;
            ring.push(nodes[he_from[he]]);
            he = next[he];
            if he == start {
                break;
            }
        }
        let area = ring_signed_area(&ring);
        if area > EPS_AREA {
            shells.push((ring, area));
        } else if area < -EPS_AREA {
            pits.push(ring);
        }
    }

    // 5. 顺时针环若落在某个壳内，即为该壳的孔洞；否则是外边界，丢弃
    let shell_polys: Vec<Polygon<f64>> = shells
        .iter()
        .map(|(ring, _)| Polygon::new(LineString::new(ring.clone()), Vec::new()))
        .collect();
    let mut interiors: Vec<Vec<LineString<f64>>> = vec![Vec::new(); shells.len()];
    for pit in pits {
        let reversed: Vec<Coord<f64>> = pit.iter().rev().copied().collect();
        let pit_area = ring_signed_area(&reversed);
        let probe = Polygon::new(LineString::new(reversed.clone()), Vec::new());
        let Some(inside) = probe.interior_point() else {
            continue;
        };
        let mut owner: Option<usize> = None;
        for (idx, shell) in shell_polys.iter().enumerate() {
            if shells[idx].1 > pit_area + EPS_AREA
                && shell.contains(&inside)
                && owner.is_none_or(|prev| shells[idx].1 < shells[prev].1)
            {
                owner = Some(idx);
            }
        }
        if let Some(idx) = owner {
            interiors[idx].push(LineString::new(reversed));
        }
    }

    shell_polys
        .into_iter()
        .zip(interiors)
        .map(|(shell, holes)| Polygon::new(shell.into_inner().0, holes))
        .collect()
}
