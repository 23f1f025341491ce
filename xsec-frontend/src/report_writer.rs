//! 报表的 JSON 落盘实现。工作簿等其他格式可另行实现 [`ReportSink`]。

use std::fs;
use std::path::Path;

use xsec_engine::report::{QuantityReport, ReportSink};
use xsec_io::IoError;

#[derive(Debug, Default)]
pub struct JsonReportSink;

impl JsonReportSink {
    pub fn new() -> Self {
        Self
    }
}

impl ReportSink for JsonReportSink {
    type Error = IoError;

    fn write(&self, report: &QuantityReport, path: &Path) -> Result<(), IoError> {
        let data = serde_json::to_string_pretty(report).map_err(|source| IoError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, data).map_err(|source| IoError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use xsec_engine::report::ReportRow;

    use super::*;

    #[test]
    fn report_is_written_as_json() {
        let dir = tempfile::tempdir().expect("创建临时目录失败");
        let path = dir.path().join("report.json");
        let report = QuantityReport::from_rows(vec![ReportRow {
            section: "S1".to_string(),
            station: "K12+300".to_string(),
            stratum: "未知".to_string(),
            design_area: 368.0,
            over_area: 311.5,
        }]);

        JsonReportSink::new()
            .write(&report, &path)
            .expect("写报表失败");
        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["rows"][0]["station"], "K12+300");
        assert_eq!(value["design_pivot"]["stations"][0], "K12+300");
    }
}
