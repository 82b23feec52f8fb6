//! 匹配题选项解析 - 业务能力层
//!
//! 每行一个选项，形如 `A - 文本`、`B) 文本`、`C: 文本`、`D. 文本`。
//! 解析是尽力而为的：不符合格式的行取首字符作为选项值，整行作为选项文本。

use regex::Regex;
use std::sync::OnceLock;

use crate::models::payload::MatchingOption;

fn option_regex() -> &'static Regex {
    static OPTION: OnceLock<Regex> = OnceLock::new();
    OPTION.get_or_init(|| {
        Regex::new(r"^([A-Za-z])\s*[-:).]\s*(.*)$").expect("选项正则无效")
    })
}

/// 解析多行选项文本
///
/// # 参数
/// - `text`: 多行文本，空行被跳过
///
/// # 返回
/// 返回选项列表（value 为大写字母）
pub fn parse_options(text: &str) -> Vec<MatchingOption> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(parse_line)
        .collect()
}

fn parse_line(line: &str) -> MatchingOption {
    if let Some(caps) = option_regex().captures(line) {
        return MatchingOption {
            value: caps[1].to_uppercase(),
            label: caps[2].trim().to_string(),
        };
    }

    MatchingOption {
        value: line
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_default(),
        label: line.to_string(),
    }
}

/// 序列化为规范形式 `<value> - <label>`，每行一个
pub fn format_options(options: &[MatchingOption]) -> String {
    options
        .iter()
        .map(|o| format!("{} - {}", o.value, o.label))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opt(value: &str, label: &str) -> MatchingOption {
        MatchingOption {
            value: value.to_string(),
            label: label.to_string(),
        }
    }

    #[test]
    fn test_parse_mixed_separators() {
        let options = parse_options("A - Cambridge\nB) Oxford\nC: Harvard");
        assert_eq!(
            options,
            vec![
                opt("A", "Cambridge"),
                opt("B", "Oxford"),
                opt("C", "Harvard")
            ]
        );
    }

    #[test]
    fn test_canonical_form_is_idempotent() {
        let options = parse_options("a. Cambridge\n\n  B)Oxford  \nC:Harvard");
        let canonical = format_options(&options);
        assert_eq!(canonical, "A - Cambridge\nB - Oxford\nC - Harvard");
        assert_eq!(parse_options(&canonical), options);
    }

    #[test]
    fn test_fallback_uses_first_character() {
        let options = parse_options("river crossing\n7 bridges");
        assert_eq!(
            options,
            vec![opt("R", "river crossing"), opt("7", "7 bridges")]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_options("").is_empty());
        assert!(parse_options("\n   \n").is_empty());
    }
}
