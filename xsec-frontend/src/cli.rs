//! 批处理 CLI：逐个文件 读取 → 算量 → 写图 → 写报表，单个文件的
//! 失败只打一行错误，批次继续。

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use tracing::{error, info};
use xsec_config::AppConfig;
use xsec_engine::report::ReportSink;
use xsec_engine::run_takeoff;
use xsec_io::{DocumentLoader, DocumentSaver, JsonDrawingFacade};

use crate::errors::FrontendError;
use crate::report_writer::JsonReportSink;

/// 批次收尾统计。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// 单个文件的处理结果，供成功行打印。
#[derive(Debug)]
struct FileOutcome {
    fill_written: usize,
    rows_emitted: usize,
    report_path: Option<PathBuf>,
}

/// 逐个处理输入路径。扩展名不符的路径直接忽略；
/// 任何文件的失败都不中断后续文件。
pub fn run_batch(paths: &[PathBuf], config: &AppConfig) -> BatchSummary {
    let mut summary = BatchSummary::default();
    for path in paths {
        if !has_expected_extension(path, &config.output.drawing_extension) {
            info!(path = %path.display(), "扩展名不符，忽略");
            continue;
        }
        summary.processed += 1;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        println!("\n[处理开始] -> {name}");
        match process_file(path, config) {
            Ok(outcome) => {
                summary.succeeded += 1;
                match &outcome.report_path {
                    Some(report) => println!(
                        "✅ 处理成功：生成填充 {} 个，报表行 {} 条 -> {}",
                        outcome.fill_written,
                        outcome.rows_emitted,
                        report.display()
                    ),
                    None => println!(
                        "✅ 处理成功：生成填充 {} 个，无可汇总的算量行",
                        outcome.fill_written
                    ),
                }
            }
            Err(err) => {
                summary.failed += 1;
                error!(path = %path.display(), error = %err, "文件处理失败");
                println!("❌ 处理出错: {err}");
            }
        }
    }
    summary
}

fn process_file(path: &Path, config: &AppConfig) -> Result<FileOutcome, FrontendError> {
    let facade = JsonDrawingFacade::new();
    let mut document = facade.load(path)?;

    let result = run_takeoff(&mut document, config);
    info!(
        path = %path.display(),
        sections = result.stats.sections_total,
        skipped = result.stats.sections_skipped_no_ground,
        cells = result.stats.cells_counted,
        rows = result.stats.rows_emitted,
        "算量完成"
    );

    let drawing_out = derived_path(
        path,
        &config.output.drawing_suffix,
        &config.output.drawing_extension,
    );
    facade.save(&document, &drawing_out)?;

    let report_path = match &result.report {
        Some(report) => {
            let out = derived_path(path, &config.output.report_suffix, "json");
            JsonReportSink::new().write(report, &out)?;
            Some(out)
        }
        None => None,
    };

    Ok(FileOutcome {
        fill_written: result.stats.fill_written,
        rows_emitted: result.stats.rows_emitted,
        report_path,
    })
}

/// 输出路径 = 原文件名（去扩展名）+ 后缀 + 新扩展名，与输入同目录。
fn derived_path(input: &Path, suffix: &str, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{stem}{suffix}.{extension}"))
}

fn has_expected_extension(path: &Path, expected: &str) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(expected))
        .unwrap_or(false)
}

/// 交互式取路径：逐行读取，空行结束。拖拽进来的路径常带引号，剥掉。
pub fn collect_paths_interactively() -> Vec<PathBuf> {
    println!("请拖入或输入图纸文件路径（每行一个，空行开始处理）：");
    let stdin = io::stdin();
    let mut paths = Vec::new();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let trimmed = line.trim().trim_matches('"').trim_matches('\'');
        if trimmed.is_empty() {
            break;
        }
        paths.push(PathBuf::from(trimmed));
    }
    paths
}

/// 批次结束后等待回车再退出，保证拖拽运行时窗口不闪退。
pub fn wait_for_ack() {
    print!("\n任务完成，按回车键退出...");
    let _ = io::stdout().flush();
    let mut line = String::new();
    let _ = io::stdin().read_line(&mut line);
}

#[cfg(test)]
mod tests {
    use xsec_core::document::Document;
    use xsec_core::geometry::Point2;
    use xsec_io::{DocumentLoader, DocumentSaver, JsonDrawingFacade};

    use super::*;

    fn write_drawing(dir: &Path, name: &str, cfg: &AppConfig) -> PathBuf {
        let mut doc = Document::new();
        doc.add_polyline(
            [
                Point2::new(0.0, 0.0),
                Point2::new(50.0, 0.0),
                Point2::new(100.0, -2.0),
            ],
            false,
            &cfg.layers.ground,
        );
        doc.add_polyline(
            [Point2::new(10.0, -5.0), Point2::new(90.0, -5.0)],
            false,
            &cfg.layers.design,
        );
        let path = dir.join(name);
        JsonDrawingFacade::new().save(&doc, &path).unwrap();
        path
    }

    #[test]
    fn derived_paths_replace_extension_and_append_suffix() {
        let out = derived_path(Path::new("/tmp/断面图.json"), "_RESULT", "json");
        assert_eq!(out, PathBuf::from("/tmp/断面图_RESULT.json"));
        let report = derived_path(Path::new("/tmp/断面图.json"), "_算量汇总", "json");
        assert_eq!(report, PathBuf::from("/tmp/断面图_算量汇总.json"));
    }

    #[test]
    fn batch_processes_only_matching_extensions() {
        let cfg = AppConfig::default();
        let dir = tempfile::tempdir().unwrap();
        let good = write_drawing(dir.path(), "a.json", &cfg);
        let ignored = dir.path().join("b.txt");
        std::fs::write(&ignored, "不是图纸").unwrap();

        let summary = run_batch(&[good.clone(), ignored], &cfg);
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 0);

        let result_path = derived_path(&good, &cfg.output.drawing_suffix, "json");
        assert!(result_path.exists());
        let report_path = derived_path(&good, &cfg.output.report_suffix, "json");
        assert!(report_path.exists());
    }

    #[test]
    fn one_bad_file_does_not_abort_batch() {
        let cfg = AppConfig::default();
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ 坏文件").unwrap();
        let good = write_drawing(dir.path(), "good.json", &cfg);

        let summary = run_batch(&[broken, good.clone()], &cfg);
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.succeeded, 1);
        assert!(derived_path(&good, &cfg.output.drawing_suffix, "json").exists());
    }

    #[test]
    fn saved_drawing_contains_original_entities() {
        let cfg = AppConfig::default();
        let dir = tempfile::tempdir().unwrap();
        let input = write_drawing(dir.path(), "keep.json", &cfg);
        run_batch(&[input.clone()], &cfg);

        let out = derived_path(&input, &cfg.output.drawing_suffix, "json");
        let saved = JsonDrawingFacade::new().load(&out).unwrap();
        // 原有实体原样保留，另有一块设计区回显填充
        assert_eq!(saved.entities_on(&cfg.layers.ground).count(), 1);
        assert_eq!(saved.entities_on(&cfg.layers.design).count(), 1);
        assert_eq!(saved.entities_on(&cfg.layers.hatch_output).count(), 1);
        assert_eq!(saved.entities().count(), 3);
    }
}
