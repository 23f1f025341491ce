use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// 应用配置的根结构。全部字段带默认值，配置文件只需覆盖差异项。
/// 配置一经装载即不可变，各组件按引用接收，不存在进程级可变状态。
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub layers: LayerConfig,
    #[serde(default)]
    pub takeoff: TakeoffConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            layers: LayerConfig::default(),
            takeoff: TakeoffConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `XSEC_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os("XSEC_CONFIG") {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 各语义图层在图纸中的名称。角色由配置指定，绝不从几何形态推断。
#[derive(Debug, Clone, Deserialize)]
pub struct LayerConfig {
    #[serde(default = "LayerConfig::default_over")]
    pub over: String,
    #[serde(default = "LayerConfig::default_design")]
    pub design: String,
    #[serde(default = "LayerConfig::default_ground")]
    pub ground: String,
    #[serde(default = "LayerConfig::default_geology")]
    pub geology: String,
    #[serde(default = "LayerConfig::default_station")]
    pub station: String,
    #[serde(default = "LayerConfig::default_hatch_output")]
    pub hatch_output: String,
}

impl LayerConfig {
    fn default_over() -> String {
        "超挖框".to_string()
    }

    fn default_design() -> String {
        "开挖线".to_string()
    }

    fn default_ground() -> String {
        "断面线".to_string()
    }

    fn default_geology() -> String {
        "地质分层".to_string()
    }

    fn default_station() -> String {
        "桩号".to_string()
    }

    fn default_hatch_output() -> String {
        "AA_填充算量层".to_string()
    }
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            over: Self::default_over(),
            design: Self::default_design(),
            ground: Self::default_ground(),
            geology: Self::default_geology(),
            station: Self::default_station(),
            hatch_output: Self::default_hatch_output(),
        }
    }
}

/// 算量内核的几何参数。
#[derive(Debug, Clone, Deserialize)]
pub struct TakeoffConfig {
    /// 断面聚类半径：两条设计线缓冲相交（间距小于 2 倍该值）即归入同一断面。
    #[serde(default = "TakeoffConfig::default_cluster_buffer")]
    pub cluster_buffer: f64,
    /// 断面框相对聚类范围的横向外扩。
    #[serde(default = "TakeoffConfig::default_margin_x")]
    pub margin_x: f64,
    /// 断面框相对聚类范围的纵向外扩。
    #[serde(default = "TakeoffConfig::default_margin_y")]
    pub margin_y: f64,
    /// 地层切割线两端的延伸量，保证多边形化前网络完全贯通。
    #[serde(default = "TakeoffConfig::default_cutter_extend")]
    pub cutter_extend: f64,
    /// 面积下限，小于该值的碎片单元不参与汇总与填充。
    #[serde(default = "TakeoffConfig::default_min_cell_area")]
    pub min_cell_area: f64,
    /// 悬挂端点判定间距：距地面线与超挖区超过该值才补画水平延伸。
    #[serde(default = "TakeoffConfig::default_dangling_clearance")]
    pub dangling_clearance: f64,
    /// 地层名文字与单元的归属半径。
    #[serde(default = "TakeoffConfig::default_label_radius")]
    pub label_radius: f64,
}

impl TakeoffConfig {
    fn default_cluster_buffer() -> f64 {
        5.0
    }

    fn default_margin_x() -> f64 {
        20.0
    }

    fn default_margin_y() -> f64 {
        25.0
    }

    fn default_cutter_extend() -> f64 {
        1.0
    }

    fn default_min_cell_area() -> f64 {
        0.1
    }

    fn default_dangling_clearance() -> f64 {
        0.5
    }

    fn default_label_radius() -> f64 {
        0.3
    }
}

impl Default for TakeoffConfig {
    fn default() -> Self {
        Self {
            cluster_buffer: Self::default_cluster_buffer(),
            margin_x: Self::default_margin_x(),
            margin_y: Self::default_margin_y(),
            cutter_extend: Self::default_cutter_extend(),
            min_cell_area: Self::default_min_cell_area(),
            dangling_clearance: Self::default_dangling_clearance(),
            label_radius: Self::default_label_radius(),
        }
    }
}

/// 输出命名与填充样式。
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// 图纸文件的扩展名，不匹配的输入路径会被忽略。
    #[serde(default = "OutputConfig::default_drawing_extension")]
    pub drawing_extension: String,
    #[serde(default = "OutputConfig::default_drawing_suffix")]
    pub drawing_suffix: String,
    #[serde(default = "OutputConfig::default_report_suffix")]
    pub report_suffix: String,
    #[serde(default = "OutputConfig::default_pattern_name")]
    pub pattern_name: String,
    #[serde(default = "OutputConfig::default_pattern_scale")]
    pub pattern_scale: f64,
}

impl OutputConfig {
    fn default_drawing_extension() -> String {
        "json".to_string()
    }

    fn default_drawing_suffix() -> String {
        "_RESULT".to_string()
    }

    fn default_report_suffix() -> String {
        "_算量汇总".to_string()
    }

    fn default_pattern_name() -> String {
        "ANSI31".to_string()
    }

    fn default_pattern_scale() -> f64 {
        0.8
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            drawing_extension: Self::default_drawing_extension(),
            drawing_suffix: Self::default_drawing_suffix(),
            report_suffix: Self::default_report_suffix(),
            pattern_name: Self::default_pattern_name(),
            pattern_scale: Self::default_pattern_scale(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}
