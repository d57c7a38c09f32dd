//! Ingestion 错误类型

use std::path::PathBuf;

use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 来源配置缺少必要字段
    #[error("source '{source_name}' is missing required setting '{field}'")]
    MissingSetting {
        /// 来源名称
        source_name: String,
        /// 缺失字段
        field: String,
    },

    /// 来源文件无法打开
    #[error("failed to open source file {}: {source}", path.display())]
    OpenFailed {
        /// 文件路径
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
