//! 确认能力
//!
//! 破坏性操作（切换题型、更换图片）前向用户请求确认。
//! 由调用方注入，确认与否只是普通的分支。

/// 确认能力
pub trait Confirm {
    /// 请求确认，返回 true 表示继续
    fn request_confirmation(&self, message: &str) -> bool;
}

/// 固定回答（批量导入、测试用）
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl Confirm for AutoConfirm {
    fn request_confirmation(&self, message: &str) -> bool {
        tracing::debug!("自动确认 ({}): {}", self.0, message);
        self.0
    }
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn request_confirmation(&self, message: &str) -> bool {
        self(message)
    }
}
