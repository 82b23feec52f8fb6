//! 草稿加载
//!
//! 每个 TOML 文件是一个题组草稿：题组字段平铺在顶层，
//! 可选的 `image_path` 指向图表/地图图片（相对路径以草稿所在目录为基准）。
//! 保存过但未删除的草稿在文件开头记录 `saved_group_id`，再次导入时跳过。

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::FileError;
use crate::models::question_group::QuestionGroup;
use crate::models::sub_question::RecordId;
use crate::services::request_assembler::ImageAttachment;

/// 题组草稿
#[derive(Debug, Clone, Deserialize)]
pub struct GroupDraft {
    #[serde(flatten)]
    pub group: QuestionGroup,

    #[serde(default)]
    pub image_path: Option<String>,

    /// 已保存到服务端的题组 id
    #[serde(default)]
    pub saved_group_id: Option<RecordId>,

    /// 草稿文件路径（加载后设置）
    #[serde(skip)]
    pub file_path: Option<PathBuf>,
}

impl GroupDraft {
    /// 用于日志的来源名称
    pub fn source_name(&self) -> String {
        self.file_path
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.group.title.clone())
    }

    /// 图片的实际路径
    pub fn resolved_image_path(&self) -> Option<PathBuf> {
        let image_path = Path::new(self.image_path.as_deref()?);
        if image_path.is_absolute() {
            return Some(image_path.to_path_buf());
        }
        let base = self
            .file_path
            .as_deref()
            .and_then(Path::parent)
            .unwrap_or_else(|| Path::new("."));
        Some(base.join(image_path))
    }
}

/// 从 TOML 文件加载单个草稿
pub async fn load_draft(path: &Path) -> Result<GroupDraft, FileError> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| FileError::read_failed(path.display().to_string(), e))?;

    let mut draft: GroupDraft =
        toml::from_str(&content).map_err(|source| FileError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })?;
    draft.file_path = Some(path.to_path_buf());

    Ok(draft)
}

/// 在草稿文件开头写入 `saved_group_id`
///
/// 顶层键必须出现在任何表之前，所以写在文件开头而不是末尾
pub async fn mark_draft_saved(path: &Path, group_id: RecordId) -> Result<(), FileError> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| FileError::read_failed(path.display().to_string(), e))?;
    let marked = format!("saved_group_id = {}\n{}", group_id, content);
    fs::write(path, marked)
        .await
        .map_err(|source| FileError::WriteFailed {
            path: path.display().to_string(),
            source,
        })
}

/// 读取草稿引用的图片
pub async fn load_image(draft: &GroupDraft) -> Result<Option<ImageAttachment>, FileError> {
    let Some(path) = draft.resolved_image_path() else {
        return Ok(None);
    };
    let bytes = fs::read(&path)
        .await
        .map_err(|e| FileError::read_failed(path.display().to_string(), e))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "image".to_string());

    Ok(Some(ImageAttachment::new(file_name, bytes)))
}

/// 加载文件夹中的所有草稿（按文件名排序），解析失败的文件记录警告后跳过
pub async fn load_all_drafts(folder_path: &str) -> Result<Vec<GroupDraft>, FileError> {
    let folder = PathBuf::from(folder_path);
    if !folder.is_dir() {
        return Err(FileError::DirectoryNotFound {
            path: folder_path.to_string(),
        });
    }

    let mut paths = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .map_err(|e| FileError::read_failed(folder_path, e))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| FileError::read_failed(folder_path, e))?
    {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut drafts = Vec::new();
    for path in paths {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );
        match load_draft(&path).await {
            Ok(draft) => {
                tracing::info!(
                    "成功加载「{}」，{} 个小题",
                    draft.group.title,
                    draft.group.len()
                );
                drafts.push(draft);
            }
            Err(e) => {
                tracing::warn!("跳过草稿: {}", e);
            }
        }
    }

    Ok(drafts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::payload::StructuredPayload;
    use crate::models::question_type::QuestionType;

    const TABLE_DRAFT: &str = r#"
title = "Questions 1-4"
type = "TC"

[structuredPayload]
kind = "table"
items = [["Name", "Price"], ["Tea <input>", ["£1", "<input>"]]]

[[subQuestions]]
id = 7
text = "Row 1, Name"
correctAnswer = "green"
order = 1
"#;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "group_authoring_{}_{}",
            name,
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_load_draft_with_structured_payload() {
        let dir = scratch_dir("single");
        let path = dir.join("table.toml");
        std::fs::write(&path, TABLE_DRAFT).unwrap();

        let draft = load_draft(&path).await.unwrap();
        assert_eq!(draft.group.question_type, Some(QuestionType::TableCompletion));
        assert!(matches!(
            draft.group.structured_payload(),
            Some(StructuredPayload::Table(t)) if t.items.len() == 2
        ));
        assert_eq!(draft.group.sub_questions()[0].id, Some(7));
        assert_eq!(draft.group.sub_questions()[0].points, 1);
        assert_eq!(draft.source_name(), "table.toml");
        assert!(draft.image_path.is_none());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_load_all_drafts_skips_malformed() {
        let dir = scratch_dir("batch");
        std::fs::write(dir.join("a.toml"), TABLE_DRAFT).unwrap();
        std::fs::write(dir.join("b.toml"), "title = [unclosed").unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let drafts = load_all_drafts(dir.to_str().unwrap()).await.unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].group.title, "Questions 1-4");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_missing_folder() {
        let err = load_all_drafts("/nonexistent/drafts").await.unwrap_err();
        assert!(matches!(err, FileError::DirectoryNotFound { .. }));
    }

    #[tokio::test]
    async fn test_image_resolved_relative_to_draft() {
        let dir = scratch_dir("image");
        std::fs::write(dir.join("map.png"), [1u8, 2, 3]).unwrap();
        let path = dir.join("map.toml");
        std::fs::write(
            &path,
            "title = \"Map\"\ntype = \"ML\"\nimage_path = \"map.png\"\n",
        )
        .unwrap();

        let draft = load_draft(&path).await.unwrap();
        let image = load_image(&draft).await.unwrap().unwrap();
        assert_eq!(image.file_name, "map.png");
        assert_eq!(image.content_type, "image/png");
        assert_eq!(image.bytes, vec![1, 2, 3]);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_marked_draft_keeps_content() {
        let dir = scratch_dir("marked");
        let path = dir.join("table.toml");
        std::fs::write(&path, TABLE_DRAFT).unwrap();

        mark_draft_saved(&path, 42).await.unwrap();
        let draft = load_draft(&path).await.unwrap();
        assert_eq!(draft.saved_group_id, Some(42));
        assert_eq!(draft.group.title, "Questions 1-4");
        assert_eq!(draft.group.sub_questions()[0].correct_answer, "green");

        std::fs::remove_dir_all(&dir).ok();
    }
}
