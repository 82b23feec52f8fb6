use std::str::FromStr;

use crate::error::ConfigError;
use crate::services::reconciler::ReconcileStrategy;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    // --- 持久化网关 ---
    pub gateway_base_url: String,
    pub gateway_token: String,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    // --- 草稿导入 ---
    /// 待导入的 TOML 草稿目录
    pub draft_folder: String,
    /// 保存成功后删除草稿文件
    pub remove_saved_drafts: bool,
    // --- 日志 ---
    pub verbose_logging: bool,
    pub output_log_file: String,
    // --- 编辑行为 ---
    /// 整组重新生成时的调和策略
    pub reconcile_strategy: ReconcileStrategy,
    /// 保存前是否把手动修改过的 order 规范化为 1..N
    pub normalize_order_on_save: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gateway_base_url: "http://localhost:8080/api".to_string(),
            gateway_token: String::new(),
            request_timeout_secs: 30,
            draft_folder: "drafts".to_string(),
            remove_saved_drafts: true,
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
            reconcile_strategy: ReconcileStrategy::Positional,
            normalize_order_on_save: false,
        }
    }
}

impl Config {
    /// 从环境变量加载，未设置的项使用默认值
    pub fn from_env() -> Result<Self, ConfigError> {
        let default = Self::default();
        Ok(Self {
            gateway_base_url: std::env::var("GATEWAY_BASE_URL").unwrap_or(default.gateway_base_url),
            gateway_token: std::env::var("GATEWAY_TOKEN").unwrap_or(default.gateway_token),
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", "u64")?
                .unwrap_or(default.request_timeout_secs),
            draft_folder: std::env::var("DRAFT_FOLDER").unwrap_or(default.draft_folder),
            remove_saved_drafts: parse_env("REMOVE_SAVED_DRAFTS", "bool")?
                .unwrap_or(default.remove_saved_drafts),
            verbose_logging: parse_env("VERBOSE_LOGGING", "bool")?
                .unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            reconcile_strategy: parse_env("RECONCILE_STRATEGY", "positional|label")?
                .unwrap_or(default.reconcile_strategy),
            normalize_order_on_save: parse_env("NORMALIZE_ORDER_ON_SAVE", "bool")?
                .unwrap_or(default.normalize_order_on_save),
        })
    }
}

/// 读取并解析环境变量；未设置时返回 None
fn parse_env<T: FromStr>(var_name: &str, expected_type: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => parse_value(var_name, &value, expected_type).map(Some),
        Err(_) => Ok(None),
    }
}

fn parse_value<T: FromStr>(var_name: &str, value: &str, expected_type: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value: value.to_string(),
            expected_type: expected_type.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value::<u64>("X", " 15 ", "u64").unwrap(), 15);
        assert_eq!(
            parse_value::<ReconcileStrategy>("X", "label", "strategy").unwrap(),
            ReconcileStrategy::ByLabel
        );

        let err = parse_value::<bool>("VERBOSE_LOGGING", "yes", "bool").unwrap_err();
        assert!(err.to_string().contains("VERBOSE_LOGGING"));
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.reconcile_strategy, ReconcileStrategy::Positional);
        assert!(!config.normalize_order_on_save);
    }
}
