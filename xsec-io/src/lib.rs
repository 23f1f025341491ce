use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use xsec_core::document::Document;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("读取图纸文件 {path:?} 失败: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析图纸文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("序列化输出 {path:?} 失败: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("写入文件 {path:?} 失败: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub trait DocumentLoader {
    fn load(&self, path: &Path) -> Result<Document, IoError>;
}

pub trait DocumentSaver {
    fn save(&self, document: &Document, path: &Path) -> Result<(), IoError>;
}

/// JSON 图纸容器。CAD 原生格式的解析不在本仓库范围内，
/// 上游转换器以 JSON 形式交换 `Document`，这里负责装载与回写。
/// 未被改动的实体按原顺序原样写回。
#[derive(Debug, Default)]
pub struct JsonDrawingFacade;

impl JsonDrawingFacade {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentLoader for JsonDrawingFacade {
    fn load(&self, path: &Path) -> Result<Document, IoError> {
        let data = fs::read_to_string(path).map_err(|source| IoError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| IoError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl DocumentSaver for JsonDrawingFacade {
    fn save(&self, document: &Document, path: &Path) -> Result<(), IoError> {
        let data = serde_json::to_string_pretty(document).map_err(|source| IoError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, data).map_err(|source| IoError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}
