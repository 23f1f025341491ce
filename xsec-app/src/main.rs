use std::path::PathBuf;

use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};
use xsec_config::{AppConfig, ConfigError};

fn main() {
    let mut args = std::env::args().skip(1);
    let mut config_override: Option<PathBuf> = None;
    let mut inputs: Vec<PathBuf> = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let Some(path) = args.next() else {
                    eprintln!("`--config` 需要提供配置文件路径");
                    std::process::exit(1);
                };
                config_override = Some(PathBuf::from(path));
            }
            other if other.starts_with('-') => {
                eprintln!("未知参数：{other}");
                std::process::exit(1);
            }
            path => inputs.push(PathBuf::from(path)),
        }
    }

    let config = load_configuration(config_override);
    init_logging(&config);
    info!("启动断面算量工具");

    println!("========================================");
    println!("      断面开挖算量自动化工具");
    println!("  用法：传入图纸文件路径，或直接拖入");
    println!("========================================");

    let summary = xsec_frontend::run(inputs, &config);
    info!(
        processed = summary.processed,
        succeeded = summary.succeeded,
        failed = summary.failed,
        "批处理完成"
    );
    println!(
        "\n共处理 {} 个文件：成功 {}，失败 {}",
        summary.processed, summary.succeeded, summary.failed
    );

    xsec_frontend::cli::wait_for_ack();
}

fn load_configuration(override_path: Option<PathBuf>) -> AppConfig {
    match override_path {
        Some(path) => AppConfig::from_file(&path).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "加载指定配置失败，使用默认配置");
            AppConfig::default()
        }),
        None => match AppConfig::discover() {
            Ok(cfg) => cfg,
            Err(err) => {
                match &err {
                    ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                        warn!(path = %path.display(), error = %err, "加载默认配置失败，使用内建默认值");
                    }
                    ConfigError::Context { .. } => {
                        warn!(error = %err, "加载默认配置失败，使用内建默认值");
                    }
                }
                AppConfig::default()
            }
        },
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
