//! Markdown post-processing.
//!
//! The walker leaves conservative spacing; this pass collapses blank-line
//! runs and removes blanks the conversion introduced between adjacent list
//! items, blockquote lines and table rows, which would otherwise split one
//! list into several.

/// Structural classification of a Markdown line, used for spacing decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Blank,
    ListItem,
    Blockquote,
    TableRow,
    Fence,
    Other,
}

fn classify_line(line: &str) -> LineKind {
    let trimmed = line.trim_start();
    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
        return LineKind::Fence;
    }
    if trimmed.starts_with("- ") || trimmed.starts_with("* ") || trimmed.starts_with("+ ") {
        return LineKind::ListItem;
    }
    if is_ordered_item(trimmed) {
        return LineKind::ListItem;
    }
    if trimmed.starts_with('>') {
        return LineKind::Blockquote;
    }
    if trimmed.starts_with('|') {
        return LineKind::TableRow;
    }
    LineKind::Other
}

fn is_ordered_item(trimmed: &str) -> bool {
    let digits: usize = trimmed.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 || digits > 9 {
        return false;
    }
    let rest = &trimmed[digits..];
    rest.starts_with(". ") || rest == "."
}

/// Normalize blank-line runs and intra-block blanks.
///
/// Rules:
/// 1. Runs of blank lines collapse to a single blank line.
/// 2. A blank line separating two lines of the same list/quote/table kind is
///    removed entirely.
/// 3. Leading and trailing blank lines are trimmed; output ends with one
///    final newline.
/// 4. Fenced code blocks pass through untouched.
#[must_use]
pub fn normalize_blank_lines(markdown: &str) -> String {
    let lines: Vec<&str> = markdown.lines().collect();
    let mut result: Vec<String> = Vec::with_capacity(lines.len());
    let mut in_fence = false;
    let mut pending_blank = false;
    let mut prev_kind = LineKind::Blank;

    for line in &lines {
        let kind = classify_line(line);

        if in_fence {
            result.push((*line).to_string());
            if kind == LineKind::Fence {
                in_fence = false;
                prev_kind = LineKind::Fence;
            }
            continue;
        }

        if kind == LineKind::Blank {
            pending_blank = true;
            continue;
        }

        if pending_blank && !result.is_empty() {
            let same_block = prev_kind == kind
                && matches!(
                    kind,
                    LineKind::ListItem | LineKind::Blockquote | LineKind::TableRow
                );
            if !same_block {
                result.push(String::new());
            }
        }
        pending_blank = false;

        if kind == LineKind::Fence {
            in_fence = true;
        }

        result.push(line.trim_end().to_string());
        prev_kind = kind;
    }

    let mut output = result.join("\n");
    let trimmed = output.trim_matches('\n');
    output = trimmed.to_string();
    if !output.is_empty() {
        output.push('\n');
    }
    output
}

/// Fix spacing around complete `**bold**` spans so conversion artifacts like
/// `word**bold**` cannot merge emphasis into the neighboring word. The span
/// interior is never touched.
#[must_use]
pub fn normalize_inline_spacing(markdown: &str) -> String {
    use fancy_regex::Regex;
    use std::sync::LazyLock;

    // A complete span is ** ... ** whose interior never contains a closing
    // marker; single asterisks inside are allowed via the (?!\*) lookahead.
    static WORD_BEFORE_BOLD_SPAN: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(\w)(\*\*(?:[^*\n]|\*(?!\*))+\*\*)")
            .expect("BUG: WORD_BEFORE_BOLD_SPAN regex is invalid")
    });
    static BOLD_SPAN_BEFORE_WORD: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(\*\*(?:[^*\n]|\*(?!\*))+\*\*)(\w)")
            .expect("BUG: BOLD_SPAN_BEFORE_WORD regex is invalid")
    });

    let spaced = WORD_BEFORE_BOLD_SPAN.replace_all(markdown, "$1 $2");
    BOLD_SPAN_BEFORE_WORD
        .replace_all(&spaced, "$1 $2")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bold_span_gets_breathing_room() {
        assert_eq!(
            normalize_inline_spacing("word**bold**tail"),
            "word **bold** tail"
        );
        // Already-spaced spans are untouched.
        assert_eq!(
            normalize_inline_spacing("word **bold** tail"),
            "word **bold** tail"
        );
    }

    #[test]
    fn collapses_blank_runs() {
        let input = "first\n\n\n\n\nsecond";
        assert_eq!(normalize_blank_lines(input), "first\n\nsecond\n");
    }

    #[test]
    fn removes_blank_between_list_items() {
        let input = "- one\n\n- two\n\n- three";
        assert_eq!(normalize_blank_lines(input), "- one\n- two\n- three\n");
    }

    #[test]
    fn removes_blank_between_table_rows() {
        let input = "| a | b |\n\n| --- | --- |\n\n| 1 | 2 |";
        assert_eq!(
            normalize_blank_lines(input),
            "| a | b |\n| --- | --- |\n| 1 | 2 |\n"
        );
    }

    #[test]
    fn keeps_blank_between_paragraph_and_list() {
        let input = "Intro paragraph\n\n- one\n- two";
        assert_eq!(normalize_blank_lines(input), "Intro paragraph\n\n- one\n- two\n");
    }

    #[test]
    fn preserves_code_fence_interior() {
        let input = "```\nline one\n\n\n\nline two\n```";
        assert_eq!(
            normalize_blank_lines(input),
            "```\nline one\n\n\n\nline two\n```\n"
        );
    }

    #[test]
    fn ordered_items_stay_adjacent() {
        let input = "1. one\n\n2. two";
        assert_eq!(normalize_blank_lines(input), "1. one\n2. two\n");
    }

    #[test]
    fn trims_document_edges() {
        let input = "\n\n\ncontent\n\n\n";
        assert_eq!(normalize_blank_lines(input), "content\n");
    }
}
