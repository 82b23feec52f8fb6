use thiserror::Error;

use crate::models::question_type::QuestionType;
use crate::models::sub_question::RecordId;
use crate::workflow::save_flow::SaveReport;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 保存前的本地校验错误
    #[error("校验错误: {0}")]
    Validation(#[from] ValidationError),
    /// 小题生成错误
    #[error("生成错误: {0}")]
    Generation(#[from] GenerationError),
    /// 编辑操作错误
    #[error("编辑错误: {0}")]
    Edit(#[from] EditError),
    /// 持久化网关错误
    #[error("网关错误: {0}")]
    Gateway(#[from] GatewayError),
    /// 保存流程错误
    #[error("保存错误: {0}")]
    Save(#[from] SaveError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 校验错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("题组标题不能为空")]
    MissingTitle,
    #[error("未选择题型")]
    MissingType,
    #[error("题组没有任何小题")]
    NoSubQuestions,
    #[error("以下小题答案为空: {orders:?}")]
    EmptyAnswers { orders: Vec<u32> },
    #[error("结构化载荷与题型 {question_type} 不匹配")]
    PayloadMismatch { question_type: QuestionType },
}

/// 小题生成错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerationError {
    /// 没有可计数的空位/标签，调用方必须阻止进入答案审核
    #[error("{question_type} 没有可生成小题的空位或标签")]
    NoCountableUnits { question_type: QuestionType },
    #[error("{question_type} 的小题需手动添加，不能自动生成")]
    NotDerivable { question_type: QuestionType },
    #[error("{question_type} 缺少结构化载荷")]
    MissingPayload { question_type: QuestionType },
    #[error("结构化载荷与题型 {question_type} 不匹配")]
    PayloadMismatch { question_type: QuestionType },
    #[error("未选择题型")]
    MissingType,
}

/// 编辑操作错误
#[derive(Debug, Error, PartialEq)]
pub enum EditError {
    #[error("索引 {index} 超出范围 (共 {len} 项)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("标签坐标 ({x}, {y}) 超出 [0, 1]")]
    LabelOutOfBounds { x: f64, y: f64 },
    #[error("当前题型没有{expected}编辑器")]
    WrongEditor { expected: &'static str },
    #[error("未选择题型")]
    MissingType,
}

/// 持久化网关错误
#[derive(Debug, Error)]
pub enum GatewayError {
    /// 网络请求失败
    #[error("请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// 网关返回错误响应
    #[error("错误响应 ({endpoint}): status={status}, message={message}")]
    BadResponse {
        endpoint: String,
        status: u16,
        message: String,
    },
    /// JSON 解析失败
    #[error("JSON解析失败 ({endpoint}): {source}")]
    JsonParseFailed {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 保存流程错误
#[derive(Debug, Error)]
pub enum SaveError {
    /// 题组已保存，但小题保存过程中断；不做回滚
    #[error("题组 {group_id} 已保存，但小题保存失败 ({}): {source}", .report.summary())]
    QuestionPassFailed {
        group_id: RecordId,
        /// 中断前已完成的部分（题组、逐个更新）
        report: Box<SaveReport>,
        #[source]
        source: GatewayError,
    },
    /// 上次批量创建的小题 id 未知，再次保存会重复创建
    #[error("题组 {group_id} 需要重新加载后才能再次保存")]
    ReloadRequired { group_id: RecordId },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("删除文件失败 ({path}): {source}")]
    DeleteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
}

// ========== 便捷构造函数 ==========

impl GatewayError {
    pub fn request_failed(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        GatewayError::RequestFailed {
            endpoint: endpoint.into(),
            source,
        }
    }

    pub fn bad_response(endpoint: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        GatewayError::BadResponse {
            endpoint: endpoint.into(),
            status,
            message: message.into(),
        }
    }
}

impl FileError {
    pub fn read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        FileError::ReadFailed {
            path: path.into(),
            source,
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
