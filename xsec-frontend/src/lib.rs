pub mod cli;
pub mod errors;
pub mod report_writer;

use std::path::PathBuf;

use tracing::info;
use xsec_config::AppConfig;

pub use cli::BatchSummary;

/// 执行一个批次：路径为空时转入交互式输入。
pub fn run(paths: Vec<PathBuf>, config: &AppConfig) -> BatchSummary {
    let paths = if paths.is_empty() {
        cli::collect_paths_interactively()
    } else {
        paths
    };
    info!(count = paths.len(), "启动断面算量批处理");
    cli::run_batch(&paths, config)
}
