use line_index::{LineIndex, TextSize};

/// Zero-based line and UTF-8 column of a byte offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

/// Convert a byte offset to line/column, clamping to the end of the text
pub fn line_col(text: &str, offset: usize) -> LineCol {
    let index = LineIndex::new(text);
    let clamped = offset.min(text.len());
    let size = TextSize::try_from(clamped).unwrap_or_else(|_| TextSize::of(text));
    let lc = index.line_col(size);
    LineCol {
        line: lc.line,
        col: lc.col,
    }
}

/// Byte offset of the start of the line containing `offset`.
///
/// Searches bytes, so an offset inside a multi-byte character is accepted.
pub fn line_start(text: &str, offset: usize) -> usize {
    let offset = offset.min(text.len());
    text.as_bytes()[..offset]
        .iter()
        .rposition(|&byte| byte == b'\n')
        .map_or(0, |nl| nl + 1)
}

/// Leading whitespace of the line containing `offset`
pub fn line_indentation(text: &str, offset: usize) -> &str {
    let start = line_start(text, offset);
    let rest = &text[start..];
    let width = rest
        .char_indices()
        .find(|(_, ch)| *ch != ' ' && *ch != '\t')
        .map_or(rest.len(), |(i, _)| i);
    &rest[..width]
}

/// Whether `offset` is the first non-whitespace position on its line
pub fn starts_line(text: &str, offset: usize) -> bool {
    let start = line_start(text, offset);
    text.as_bytes()[start..offset.min(text.len())]
        .iter()
        .all(|&byte| byte == b' ' || byte == b'\t')
}

/// Re-indent a multi-line snippet.
///
/// The common leading indentation of the continuation lines is removed and
/// replaced by `indent`; the first line is left alone because it is placed
/// at the insertion point.
pub fn reindent(snippet: &str, indent: &str, newline: &str) -> String {
    let mut lines = snippet.lines();
    let Some(first) = lines.next() else {
        return String::new();
    };
    let rest: Vec<&str> = lines.collect();
    let common = rest
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut out = String::from(first.trim_start());
    for line in rest {
        out.push_str(newline);
        if line.trim().is_empty() {
            continue;
        }
        out.push_str(indent);
        let strip = common.min(line.len() - line.trim_start().len());
        out.push_str(line.get(strip..).unwrap_or_else(|| line.trim_start()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_inside_multibyte_characters() {
        let text = "ab\n  é;";
        let inside = text.find('é').unwrap() + 1;
        assert_eq!(line_start(text, inside), 3);
        assert!(!starts_line(text, inside));
        assert!(starts_line(text, inside - 1));
        assert_eq!(line_indentation(text, inside), "  ");
    }

    #[test]
    fn test_line_col_after_multibyte() {
        let text = "é\nab";
        assert_eq!(line_col(text, 4), LineCol { line: 1, col: 1 });
        assert_eq!(line_col(text, 100), LineCol { line: 1, col: 2 });
    }

    #[test]
    fn test_line_indentation_and_starts_line() {
        let text = "class C {\n    a;\n}";
        let a = text.find("a;").unwrap();
        assert_eq!(line_indentation(text, a), "    ");
        assert!(starts_line(text, a));
        assert!(!starts_line(text, text.find('{').unwrap()));
    }

    #[test]
    fn test_reindent_strips_common_prefix() {
        let snippet = "class D {\n        x;\n    }";
        assert_eq!(
            reindent(snippet, "  ", "\n"),
            "class D {\n      x;\n  }"
        );
    }
}
