//! 空位标记扫描 - 业务能力层
//!
//! 只负责在纯文本中定位空位标记，不关心渲染或题型

use regex::Regex;
use std::sync::OnceLock;

/// 接受 `<input>`、`<input/>`、`<input />`，忽略大小写
fn marker_regex() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| Regex::new(r"(?i)<input\s*/?>").expect("空位标记正则无效"))
}

/// 统计文本中的空位标记数量
pub fn count_markers(text: &str) -> usize {
    marker_regex().find_iter(text).count()
}

/// 按空位标记切分句子
///
/// 每段截止到（并包含）对应的标记，最后一个标记之后的文本并入最后一段。
/// 没有标记时返回整段文本。
pub fn split_at_markers(text: &str) -> Vec<String> {
    let mut fragments = Vec::new();
    let mut start = 0;
    for m in marker_regex().find_iter(text) {
        fragments.push(text[start..m.end()].trim().to_string());
        start = m.end();
    }

    let rest = text[start..].trim();
    match fragments.last_mut() {
        Some(last) if !rest.is_empty() => {
            last.push(' ');
            last.push_str(rest);
        }
        Some(_) => {}
        None => fragments.push(rest.to_string()),
    }
    fragments
}

/// 把标记替换为可读的下划线（日志/预览用）
pub fn render_blanks(text: &str) -> String {
    marker_regex().replace_all(text, "______").into_owned()
}
