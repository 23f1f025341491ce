use xsec_core::document::{Document, Entity, Hatch, HatchLoop};
use xsec_core::geometry::Point2;
use xsec_io::{DocumentLoader, DocumentSaver, IoError, JsonDrawingFacade};

fn sample_document() -> Document {
    let mut doc = Document::new();
    doc.add_line(Point2::new(0.0, 0.0), Point2::new(50.0, 0.0), "断面线");
    doc.add_polyline(
        [
            Point2::new(10.0, -5.0),
            Point2::new(40.0, -5.0),
            Point2::new(45.0, -2.0),
        ],
        false,
        "开挖线",
    );
    doc.add_text(Point2::new(25.0, -20.0), "K12+300", 3.0, 0.0, "桩号");
    doc.add_mtext(Point2::new(20.0, -3.0), "{\\fSimSun;粉质黏土}", 2.5, "地质分层");
    doc.ensure_layer_colored("AA_填充算量层", 7);
    doc.add_hatch(Hatch {
        pattern_name: "ANSI31".to_string(),
        pattern_scale: 0.8,
        is_solid: false,
        rgb: Some([200, 255, 200]),
        loops: vec![HatchLoop {
            vertices: vec![
                Point2::new(10.0, -5.0),
                Point2::new(40.0, -5.0),
                Point2::new(40.0, 0.0),
                Point2::new(10.0, 0.0),
            ],
            is_closed: true,
        }],
        layer: "AA_填充算量层".to_string(),
    });
    doc
}

#[test]
fn save_then_load_preserves_document() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let path = dir.path().join("sample.json");

    let facade = JsonDrawingFacade::new();
    let original = sample_document();
    facade.save(&original, &path).expect("写入 JSON 图纸失败");
    let loaded = facade.load(&path).expect("读取 JSON 图纸失败");

    // 逐字段比较既啰嗦又脆弱，直接比较序列化后的 JSON 值。
    let before = serde_json::to_value(&original).unwrap();
    let after = serde_json::to_value(&loaded).unwrap();
    assert_eq!(before, after);

    assert_eq!(loaded.entities().count(), 5);
    assert_eq!(loaded.entities_on("开挖线").count(), 1);
    let hatch = loaded
        .entities_on("AA_填充算量层")
        .find_map(|entity| match entity {
            Entity::Hatch(hatch) => Some(hatch),
            _ => None,
        })
        .expect("未找到填充实体");
    assert_eq!(hatch.pattern_name, "ANSI31");
    assert_eq!(hatch.rgb, Some([200, 255, 200]));
    assert_eq!(hatch.loops.len(), 1);
    assert_eq!(
        loaded.layer("AA_填充算量层").and_then(|layer| layer.color),
        Some(7)
    );
}

#[test]
fn appended_entities_keep_existing_order() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let path = dir.path().join("append.json");

    let facade = JsonDrawingFacade::new();
    let mut doc = sample_document();
    let before_ids: Vec<u64> = doc.entities().map(|(id, _)| id.get()).collect();
    doc.add_line(Point2::new(-5.0, 0.0), Point2::new(-1.0, 0.0), "断面线");
    facade.save(&doc, &path).unwrap();
    let loaded = facade.load(&path).unwrap();

    let after_ids: Vec<u64> = loaded.entities().map(|(id, _)| id.get()).collect();
    assert_eq!(&after_ids[..before_ids.len()], &before_ids[..]);
    assert_eq!(after_ids.len(), before_ids.len() + 1);
}

#[test]
fn missing_file_reports_read_error() {
    let facade = JsonDrawingFacade::new();
    let err = facade
        .load(std::path::Path::new("/no/such/drawing.json"))
        .unwrap_err();
    assert!(matches!(err, IoError::Read { .. }));
}

#[test]
fn corrupt_file_reports_parse_error() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();

    let facade = JsonDrawingFacade::new();
    let err = facade.load(&path).unwrap_err();
    assert!(matches!(err, IoError::Parse { .. }));
}
