//! 定义了库中所有可能的错误类型。
//! Defines all possible error types in the library.
//!
//! 生命周期跟踪器本身的操作不会失败；这些错误只出现在解析和构建辅助类型时。
//! The tracker's own operations never fail; these errors only surface while
//! parsing or building the helper types around it.

use thiserror::Error;

/// The primary error type for the lifecycle library.
/// 生命周期库的主要错误类型。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A string did not name any known lifecycle phase.
    /// 字符串不对应任何已知的生命周期阶段。
    #[error("unknown lifecycle phase: {0:?}")]
    UnknownPhase(String),

    /// Build metadata was missing the commit date or the commit id.
    /// 构建元数据缺少提交日期或提交ID。
    #[error("build info is incomplete: missing {0}")]
    IncompleteBuildInfo(&'static str),
}

/// A specialized `Result` type for this library.
/// 本库专用的 `Result` 类型。
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        use std::io::ErrorKind;
        match err {
            Error::UnknownPhase(_) => std::io::Error::new(ErrorKind::InvalidInput, err),
            Error::IncompleteBuildInfo(_) => std::io::Error::new(ErrorKind::InvalidData, err),
        }
    }
}
