//! 保存上下文
//!
//! 封装"我正在保存哪一个题组"这一信息，仅用于日志

use std::fmt::Display;

/// 保存上下文
#[derive(Debug, Clone)]
pub struct SaveCtx {
    /// 本次运行中的序号（从 1 开始）
    pub index: usize,

    /// 来源描述（草稿文件名或题组标题）
    pub source: String,
}

impl SaveCtx {
    /// 创建新的保存上下文
    pub fn new(index: usize, source: impl Into<String>) -> Self {
        Self {
            index,
            source: source.into(),
        }
    }
}

impl Display for SaveCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[草稿 {}]", self.index)
    }
}
