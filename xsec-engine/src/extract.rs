//! 图层抽取：把图纸实体一次性降解为带类型的曲线与标注值。
//! 下游组件只消费 `Curve` 与 `Label`，不再回头检查实体种类。

use tracing::debug;
use xsec_core::document::{Document, Entity};
use xsec_core::geometry::{Curve, Point2};

/// 文字标注：位置加清洗后的内容。
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub position: Point2,
    pub text: String,
}

/// 抽取指定图层上的全部线形实体。直线给出两点曲线，多段线给出完整
/// 顶点序列（不拆分）。不足两个不同点的实体静默丢弃；图层不存在时
/// 返回空表，抽取本身从不失败。
pub fn curves_on_layer(doc: &Document, layer: &str) -> Vec<Curve> {
    let mut curves = Vec::new();
    let mut dropped = 0usize;
    for entity in doc.entities_on(layer) {
        let candidate = match entity {
            Entity::Line(line) => Curve::new(vec![line.start, line.end]),
            Entity::Polyline(polyline) => Curve::new(polyline.vertices.clone()),
            _ => continue,
        };
        match candidate {
            Some(curve) => curves.push(curve),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        debug!(layer, dropped, "丢弃退化线形实体");
    }
    curves
}

/// 抽取指定图层上的文字标注（单行与多行一视同仁），内容即时清洗。
pub fn labels_on_layer(doc: &Document, layer: &str) -> Vec<Label> {
    doc.entities_on(layer)
        .filter_map(|entity| match entity {
            Entity::Text(text) => Some(Label {
                position: text.insert,
                text: clean_annotation(&text.content),
            }),
            Entity::MText(mtext) => Some(Label {
                position: mtext.insert,
                text: clean_annotation(&mtext.content),
            }),
            _ => None,
        })
        .collect()
}

/// 剥除富文本控制串：取最后一个 `;` 分段，去掉结尾的 `}` 再修剪空白。
pub fn clean_annotation(raw: &str) -> String {
    let tail = raw.rsplit(';').next().unwrap_or(raw);
    tail.trim_end_matches('}').trim().to_string()
}
