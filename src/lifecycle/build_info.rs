//! 构建元数据，用作状态转换日志的前缀
//! Build metadata used as the prefix of transition log lines

use crate::error::{Error, Result};

/// Commit date and id of the running build.
/// 当前运行构建的提交日期和提交ID。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    commit_date: String,
    commit_id: String,
}

impl BuildInfo {
    /// Creates build metadata. Both parts must be non-empty.
    /// 创建构建元数据，两个部分都不能为空。
    pub fn new(commit_date: impl Into<String>, commit_id: impl Into<String>) -> Result<Self> {
        let commit_date = commit_date.into();
        let commit_id = commit_id.into();
        if commit_date.trim().is_empty() {
            return Err(Error::IncompleteBuildInfo("commit_date"));
        }
        if commit_id.trim().is_empty() {
            return Err(Error::IncompleteBuildInfo("commit_id"));
        }
        Ok(Self {
            commit_date,
            commit_id,
        })
    }

    /// Reads `GIT_COMMIT_DATE` and `GIT_COMMIT_ID` as captured at compile time.
    /// Returns `None` unless both were set.
    ///
    /// 读取编译时捕获的 `GIT_COMMIT_DATE` 和 `GIT_COMMIT_ID`，两者都设置时才返回值。
    pub fn from_build_env() -> Option<Self> {
        Self::new(option_env!("GIT_COMMIT_DATE")?, option_env!("GIT_COMMIT_ID")?).ok()
    }

    /// 提交日期
    /// Commit date
    pub fn commit_date(&self) -> &str {
        &self.commit_date
    }

    /// 提交ID
    /// Commit id
    pub fn commit_id(&self) -> &str {
        &self.commit_id
    }

    /// Prefix for transition log lines, e.g. `"(20240105 - a1b2c3d) "`.
    /// 状态转换日志的前缀。
    pub fn annotation(&self) -> String {
        format!("({} - {}) ", self.commit_date, self.commit_id)
    }
}
