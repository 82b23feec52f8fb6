//! 日志工具模块
//!
//! 提供日志初始化、格式化和输出的辅助函数

use anyhow::Result;
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 订阅者
///
/// 优先使用 `RUST_LOG`，否则按是否详细日志选择 debug / info
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n题组导入日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
///
/// # 参数
/// - `gateway_base_url`: 网关地址
/// - `draft_folder`: 草稿目录
pub fn log_startup(gateway_base_url: &str, draft_folder: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 题组草稿导入");
    info!("🌐 网关地址: {}", gateway_base_url);
    info!("📁 草稿目录: {}", draft_folder);
    info!("{}", "=".repeat(60));
}

/// 记录草稿加载信息
pub fn log_drafts_loaded(total: usize) {
    info!("✓ 找到 {} 个待导入的草稿", total);
    info!("💡 逐个保存，一个完成后再开始下一个\n");
}

/// 打印最终统计信息
///
/// # 参数
/// - `success`: 完全成功数量
/// - `partial`: 部分成功数量
/// - `failed`: 失败数量
/// - `skipped`: 已保存过而跳过的数量
/// - `total`: 总数
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(
    success: usize,
    partial: usize,
    failed: usize,
    skipped: usize,
    total: usize,
    log_file_path: &str,
) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, total);
    info!("⚠️ 部分成功: {}", partial);
    info!("❌ 失败: {}", failed);
    info!("⏭️ 跳过: {}", skipped);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text_counts_chars() {
        assert_eq!(truncate_text("短文本", 5), "短文本");
        assert_eq!(truncate_text("第一题第二题", 3), "第一题...");
    }
}
