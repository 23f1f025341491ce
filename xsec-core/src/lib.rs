pub mod geometry {
    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    /// 二维点，内部以 `glam::DVec2` 表示，全程使用双精度坐标。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_vec(vec: DVec2) -> Self {
            Self(vec)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn translate(self, offset: Vector2) -> Self {
            Self(self.0 + offset.0)
        }

        #[inline]
        pub fn vector_to(self, other: Point2) -> Vector2 {
            Vector2(other.0 - self.0)
        }

        #[inline]
        pub fn distance_to(self, other: Point2) -> f64 {
            self.0.distance(other.0)
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    impl From<DVec2> for Point2 {
        fn from(value: DVec2) -> Self {
            Self::from_vec(value)
        }
    }

    /// 二维向量。提供基础运算。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Vector2(pub DVec2);

    impl Vector2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_points(start: Point2, end: Point2) -> Self {
            Self(end.0 - start.0)
        }

        #[inline]
        pub fn length(self) -> f64 {
            self.0.length()
        }

        #[inline]
        pub fn length_squared(self) -> f64 {
            self.0.length_squared()
        }

        #[inline]
        pub fn scale(self, factor: f64) -> Self {
            Self(self.0 * factor)
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }
    }

    impl From<DVec2> for Vector2 {
        fn from(value: DVec2) -> Self {
            Self(value)
        }
    }

    /// 轴对齐边界框，用于断面分区与范围过滤。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Bounds2D {
        min: Point2,
        max: Point2,
    }

    impl Bounds2D {
        #[inline]
        pub fn new(min: Point2, max: Point2) -> Self {
            Self { min, max }
        }

        #[inline]
        pub fn empty() -> Self {
            Self {
                min: Point2::new(f64::INFINITY, f64::INFINITY),
                max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            }
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.x() > self.max.x() || self.min.y() > self.max.y()
        }

        #[inline]
        pub fn min(&self) -> Point2 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point2 {
            self.max
        }

        #[inline]
        pub fn width(&self) -> f64 {
            self.max.x() - self.min.x()
        }

        #[inline]
        pub fn height(&self) -> f64 {
            self.max.y() - self.min.y()
        }

        pub fn include_point(&mut self, point: Point2) {
            if self.is_empty() {
                self.min = point;
                self.max = point;
                return;
            }
            let min_vec = self.min.as_vec2().min(point.as_vec2());
            let max_vec = self.max.as_vec2().max(point.as_vec2());
            self.min = Point2::from_vec(min_vec);
            self.max = Point2::from_vec(max_vec);
        }

        pub fn include_bounds(&mut self, other: &Bounds2D) {
            if other.is_empty() {
                return;
            }
            self.include_point(other.min);
            self.include_point(other.max);
        }

        /// 沿 X/Y 方向各向外扩展给定距离。
        pub fn expanded(&self, dx: f64, dy: f64) -> Bounds2D {
            debug_assert!(!self.is_empty());
            Bounds2D::new(
                Point2::new(self.min.x() - dx, self.min.y() - dy),
                Point2::new(self.max.x() + dx, self.max.y() + dy),
            )
        }

        #[inline]
        pub fn contains(&self, point: Point2) -> bool {
            point.x() >= self.min.x()
                && point.x() <= self.max.x()
                && point.y() >= self.min.y()
                && point.y() <= self.max.y()
        }

        #[inline]
        pub fn center(&self) -> Point2 {
            debug_assert!(!self.is_empty());
            let min_vec = self.min.as_vec2();
            let max_vec = self.max.as_vec2();
            let center = (min_vec + max_vec) * 0.5;
            Point2::from_vec(center)
        }

        /// 下边缘中点，桩号文字按到该点的距离择优。
        #[inline]
        pub fn bottom_midpoint(&self) -> Point2 {
            Point2::new((self.min.x() + self.max.x()) * 0.5, self.min.y())
        }
    }

    /// 由图元抽取出的采样曲线：有序点列，至少包含两个不同的点。
    /// 抽取之后不再修改；任何派生（延长、归并）都会生成新曲线。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Curve {
        points: Vec<Point2>,
    }

    impl Curve {
        /// 点数不足或所有点重合时返回 None，调用方静默丢弃。
        pub fn new(points: Vec<Point2>) -> Option<Self> {
            if points.len() < 2 {
                return None;
            }
            let first = points[0];
            if points.iter().all(|p| p.distance_to(first) < 1e-12) {
                return None;
            }
            Some(Self { points })
        }

        #[inline]
        pub fn points(&self) -> &[Point2] {
            &self.points
        }

        #[inline]
        pub fn len(&self) -> usize {
            self.points.len()
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.points.is_empty()
        }

        #[inline]
        pub fn first(&self) -> Point2 {
            self.points[0]
        }

        #[inline]
        pub fn last(&self) -> Point2 {
            self.points[self.points.len() - 1]
        }

        pub fn reversed(&self) -> Curve {
            let mut points = self.points.clone();
            points.reverse();
            Curve { points }
        }

        pub fn bounds(&self) -> Bounds2D {
            let mut bounds = Bounds2D::empty();
            for point in &self.points {
                bounds.include_point(*point);
            }
            bounds
        }
    }

}

pub mod document {
    use std::collections::HashMap;

    use serde::{Deserialize, Serialize};

    use crate::geometry::{Bounds2D, Point2};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct EntityId(u64);

    impl EntityId {
        #[inline]
        pub fn new(raw: u64) -> Self {
            Self(raw)
        }

        /// 提供原始数值，便于序列化或日志输出。
        #[inline]
        pub fn get(self) -> u64 {
            self.0
        }
    }

    /// 图层元数据。颜色采用 ACI 索引，缺省表示随容器默认。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Layer {
        pub name: String,
        pub is_visible: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub color: Option<i16>,
    }

    impl Layer {
        #[inline]
        pub fn new(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                is_visible: true,
                color: None,
            }
        }

        #[inline]
        pub fn with_color(name: impl Into<String>, color: i16) -> Self {
            Self {
                name: name.into(),
                is_visible: true,
                color: Some(color),
            }
        }
    }

    /// 本工具读写的图元种类。容器格式中的其他实体在装载层即被丢弃。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub enum Entity {
        Line(Line),
        Polyline(Polyline),
        Text(Text),
        MText(MText),
        Hatch(Hatch),
    }

    impl Entity {
        #[inline]
        pub fn layer_name(&self) -> &str {
            match self {
                Entity::Line(line) => &line.layer,
                Entity::Polyline(polyline) => &polyline.layer,
                Entity::Text(text) => &text.layer,
                Entity::MText(mtext) => &mtext.layer,
                Entity::Hatch(hatch) => &hatch.layer,
            }
        }

        /// 计算实体的 2D 轴对齐范围，文本退化为插入点。
        pub fn bounds(&self) -> Option<Bounds2D> {
            let mut bounds = Bounds2D::empty();
            match self {
                Entity::Line(line) => {
                    bounds.include_point(line.start);
                    bounds.include_point(line.end);
                }
                Entity::Polyline(polyline) => {
                    for vertex in &polyline.vertices {
                        bounds.include_point(*vertex);
                    }
                }
                Entity::Text(text) => {
                    bounds.include_point(text.insert);
                }
                Entity::MText(mtext) => {
                    bounds.include_point(mtext.insert);
                }
                Entity::Hatch(hatch) => {
                    for loop_path in &hatch.loops {
                        for vertex in &loop_path.vertices {
                            bounds.include_point(*vertex);
                        }
                    }
                }
            }
            if bounds.is_empty() { None } else { Some(bounds) }
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Line {
        pub start: Point2,
        pub end: Point2,
        pub layer: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Polyline {
        pub vertices: Vec<Point2>,
        pub is_closed: bool,
        pub layer: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Text {
        pub insert: Point2,
        pub content: String,
        pub height: f64,
        pub rotation: f64,
        pub layer: String,
    }

    /// 多行文字。保留原始内容（含富文本控制串），清洗由抽取层负责。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct MText {
        pub insert: Point2,
        pub content: String,
        pub height: f64,
        pub layer: String,
    }

    /// 填充边界环。闭合环首尾点不重复存储。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct HatchLoop {
        pub vertices: Vec<Point2>,
        pub is_closed: bool,
    }

    /// 图案填充。RGB 缺省时由容器按图层颜色渲染。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Hatch {
        pub pattern_name: String,
        pub pattern_scale: f64,
        pub is_solid: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub rgb: Option<[u8; 3]>,
        pub loops: Vec<HatchLoop>,
        pub layer: String,
    }

    /// 内存中的图纸：图层表加追加式实体列表。
    /// 装载后实体顺序保持不变，新增实体只会排在末尾。
    #[derive(Debug, Default, Clone, Serialize, Deserialize)]
    pub struct Document {
        layers: HashMap<String, Layer>,
        entities: Vec<(EntityId, Entity)>,
        next_entity_id: u64,
    }

    impl Document {
        pub fn new() -> Self {
            let mut doc = Self::default();
            doc.ensure_layer("0");
            doc
        }

        pub fn ensure_layer(&mut self, name: impl AsRef<str>) {
            let key = name.as_ref();
            self.layers
                .entry(key.to_string())
                .or_insert_with(|| Layer::new(key));
        }

        /// 确保图层存在并带指定颜色；已有图层保持原状。
        pub fn ensure_layer_colored(&mut self, name: impl AsRef<str>, color: i16) {
            let key = name.as_ref();
            self.layers
                .entry(key.to_string())
                .or_insert_with(|| Layer::with_color(key, color));
        }

        pub fn add_line(&mut self, start: Point2, end: Point2, layer: impl Into<String>) -> EntityId {
            let layer = layer.into();
            self.ensure_layer(&layer);
            let id = self.next_id();
            self.entities
                .push((id, Entity::Line(Line { start, end, layer })));
            id
        }

        pub fn add_polyline<I>(
            &mut self,
            vertices: I,
            is_closed: bool,
            layer: impl Into<String>,
        ) -> EntityId
        where
            I: IntoIterator<Item = Point2>,
        {
            let layer = layer.into();
            self.ensure_layer(&layer);
            let id = self.next_id();
            self.entities.push((
                id,
                Entity::Polyline(Polyline {
                    vertices: vertices.into_iter().collect(),
                    is_closed,
                    layer,
                }),
            ));
            id
        }

        pub fn add_text(
            &mut self,
            insert: Point2,
            content: impl Into<String>,
            height: f64,
            rotation: f64,
            layer: impl Into<String>,
        ) -> EntityId {
            let layer = layer.into();
            self.ensure_layer(&layer);
            let id = self.next_id();
            self.entities.push((
                id,
                Entity::Text(Text {
                    insert,
                    content: content.into(),
                    height,
                    rotation,
                    layer,
                }),
            ));
            id
        }

        pub fn add_mtext(
            &mut self,
            insert: Point2,
            content: impl Into<String>,
            height: f64,
            layer: impl Into<String>,
        ) -> EntityId {
            let layer = layer.into();
            self.ensure_layer(&layer);
            let id = self.next_id();
            self.entities.push((
                id,
                Entity::MText(MText {
                    insert,
                    content: content.into(),
                    height,
                    layer,
                }),
            ));
            id
        }

        pub fn add_hatch(&mut self, hatch: Hatch) -> EntityId {
            self.ensure_layer(hatch.layer.clone());
            let id = self.next_id();
            self.entities.push((id, Entity::Hatch(hatch)));
            id
        }

        pub fn add_entity(&mut self, entity: Entity) -> EntityId {
            match entity {
                Entity::Line(line) => self.add_line(line.start, line.end, line.layer),
                Entity::Polyline(polyline) => {
                    self.add_polyline(polyline.vertices, polyline.is_closed, polyline.layer)
                }
                Entity::Text(text) => self.add_text(
                    text.insert,
                    text.content,
                    text.height,
                    text.rotation,
                    text.layer,
                ),
                Entity::MText(mtext) => {
                    self.add_mtext(mtext.insert, mtext.content, mtext.height, mtext.layer)
                }
                Entity::Hatch(hatch) => self.add_hatch(hatch),
            }
        }

        #[inline]
        pub fn layer(&self, name: &str) -> Option<&Layer> {
            self.layers.get(name)
        }

        #[inline]
        pub fn layers(&self) -> impl Iterator<Item = &Layer> {
            self.layers.values()
        }

        #[inline]
        pub fn entities(&self) -> impl Iterator<Item = &(EntityId, Entity)> {
            self.entities.iter()
        }

        /// 按图层名筛选实体，图层不存在时迭代器为空。
        pub fn entities_on<'a>(&'a self, layer: &'a str) -> impl Iterator<Item = &'a Entity> {
            self.entities
                .iter()
                .filter(move |(_, entity)| entity.layer_name() == layer)
                .map(|(_, entity)| entity)
        }

        #[inline]
        pub fn entity(&self, id: EntityId) -> Option<&Entity> {
            self.entities.iter().find_map(|(entity_id, entity)| {
                if entity_id.get() == id.get() {
                    Some(entity)
                } else {
                    None
                }
            })
        }

        pub fn bounds(&self) -> Option<Bounds2D> {
            let mut bounds = Bounds2D::empty();
            let mut has = false;
            for (_, entity) in &self.entities {
                if let Some(entity_bounds) = entity.bounds() {
                    bounds.include_bounds(&entity_bounds);
                    has = true;
                }
            }
            if has { Some(bounds) } else { None }
        }

        #[inline]
        fn next_id(&mut self) -> EntityId {
            let id = self.next_entity_id;
            self.next_entity_id += 1;
            EntityId(id)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn document_stores_entities() {
            let mut doc = Document::new();
            let line_id = doc.add_line(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0), "开挖线");
            let poly_id = doc.add_polyline(
                [
                    Point2::new(0.0, 0.0),
                    Point2::new(2.0, 2.0),
                    Point2::new(4.0, 0.0),
                ],
                false,
                "断面线",
            );
            let text_id = doc.add_text(Point2::new(1.0, 1.0), "K12+300", 2.5, 0.0, "桩号");

            assert_eq!(line_id.get(), 0);
            assert_eq!(poly_id.get(), 1);
            assert_eq!(text_id.get(), 2);
            let layers: Vec<_> = doc.layers().map(|l| l.name.clone()).collect();
            assert!(layers.contains(&"开挖线".to_string()));
            assert!(layers.contains(&"桩号".to_string()));
            assert_eq!(doc.entities().count(), 3);
            assert_eq!(doc.entities_on("断面线").count(), 1);
            assert_eq!(doc.entities_on("不存在的层").count(), 0);

            match doc.entity(text_id) {
                Some(Entity::Text(text)) => assert_eq!(text.content, "K12+300"),
                other => panic!("意外的实体查询结果: {other:?}"),
            }

            let bounds = doc.bounds().expect("文档范围应当存在");
            assert!((bounds.max().x() - 10.0).abs() < 1e-9);
            assert!((bounds.max().y() - 2.0).abs() < 1e-9);
        }

        #[test]
        fn colored_layer_is_created_once() {
            let mut doc = Document::new();
            doc.ensure_layer_colored("AA_填充算量层", 7);
            doc.ensure_layer_colored("AA_填充算量层", 3);
            let layer = doc.layer("AA_填充算量层").expect("图层应当存在");
            assert_eq!(layer.color, Some(7));
        }

        #[test]
        fn hatch_bounds_cover_all_loops() {
            let mut doc = Document::new();
            doc.add_hatch(Hatch {
                pattern_name: "ANSI31".to_string(),
                pattern_scale: 0.8,
                is_solid: false,
                rgb: Some([255, 200, 200]),
                loops: vec![HatchLoop {
                    vertices: vec![
                        Point2::new(-1.0, 0.0),
                        Point2::new(3.0, 0.0),
                        Point2::new(3.0, 2.0),
                    ],
                    is_closed: true,
                }],
                layer: "AA_填充算量层".to_string(),
            });
            let bounds = doc.bounds().expect("填充应当具有范围");
            assert!((bounds.min().x() + 1.0).abs() < 1e-9);
            assert!((bounds.max().y() - 2.0).abs() < 1e-9);
        }
    }
}
