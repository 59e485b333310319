//! 段落分割器
//!
//! 以空行为界切分全文。只含空白字符的行视为空行；段落内部的换行保留，
//! 首尾空白去除，空段落丢弃。

/// 检查是否为空行（只含空白）
#[inline]
fn is_blank_line(line: &str) -> bool {
    line.trim().is_empty()
}

/// 将全文切分为有序段落
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    // lines() 同时处理 \n 与 \r\n
    for line in text.lines() {
        if is_blank_line(line) {
            flush(&mut current, &mut paragraphs);
        } else {
            current.push(line);
        }
    }
    flush(&mut current, &mut paragraphs);

    paragraphs
}

fn flush(current: &mut Vec<&str>, paragraphs: &mut Vec<String>) {
    if current.is_empty() {
        return;
    }
    let paragraph = current.join("\n");
    let trimmed = paragraph.trim();
    if !trimmed.is_empty() {
        paragraphs.push(trimmed.to_string());
    }
    current.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_paragraphs() {
        let paragraphs = split_paragraphs("小明说：你好。\n\n旁白：天色渐暗。");
        assert_eq!(paragraphs, vec!["小明说：你好。", "旁白：天色渐暗。"]);
    }

    #[test]
    fn test_single_newline_stays_in_paragraph() {
        let paragraphs = split_paragraphs("第一行\n第二行\n\n第三行");
        assert_eq!(paragraphs, vec!["第一行\n第二行", "第三行"]);
    }

    #[test]
    fn test_blank_and_whitespace_paragraphs_dropped() {
        let text = "\n\n  开头  \n\n\n   \n\t\n结尾\n\n";
        assert_eq!(split_paragraphs(text), vec!["开头", "结尾"]);
    }

    #[test]
    fn test_crlf_input() {
        let text = "第一段。\r\n\r\n第二段。\r\n";
        assert_eq!(split_paragraphs(text), vec!["第一段。", "第二段。"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(split_paragraphs("").is_empty());
        assert!(split_paragraphs(" \n \n").is_empty());
    }

    #[test]
    fn test_novel_sample() {
        let text = r#"第001章 陨落的天才

"斗之力，三段！"

望着测验魔石碑上面闪亮得甚至有些刺眼的五个大字，少年面无表情，唇角有着一抹自嘲。"#;

        let paragraphs = split_paragraphs(text);
        assert_eq!(paragraphs.len(), 3);
        assert_eq!(paragraphs[0], "第001章 陨落的天才");
        assert_eq!(paragraphs[1], "\"斗之力，三段！\"");
    }
}
