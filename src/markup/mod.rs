//! Line-oriented content markup.
//!
//! The markup is the text form shared by extraction output and the document
//! writer input. Each line is classified on its own, first rule wins:
//!
//! | Line                         | Block                          |
//! |------------------------------|--------------------------------|
//! | blank                        | [`ContentBlock::Blank`]        |
//! | `=== Heading ===`            | heading level 2                |
//! | `-- Heading` / `## Heading`  | heading level 3                |
//! | `• item`, `- item`, `* item` | bulleted list item             |
//! | `1. item`                    | numbered list item             |
//! | anything else                | joined into the open paragraph |
//!
//! Inside paragraphs `**text**` toggles bold. There is no escaping and no
//! nesting.

/// Inline run of paragraph text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub bold: bool,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
        }
    }
}

/// One normalized unit of document content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
    /// Heading; level 1 is reserved for the document title
    Heading { level: u8, text: String },
    ListItem { ordered: bool, text: String },
    Paragraph { spans: Vec<Span> },
    Blank,
}

impl ContentBlock {
    /// Plain text of the block, bold markers removed.
    pub fn text(&self) -> String {
        match self {
            ContentBlock::Heading { text, .. } | ContentBlock::ListItem { text, .. } => text.clone(),
            ContentBlock::Paragraph { spans } => spans.iter().map(|s| s.text.as_str()).collect(),
            ContentBlock::Blank => String::new(),
        }
    }
}

/// Parse markup into content blocks.
///
/// Consecutive paragraph lines merge into one [`ContentBlock::Paragraph`];
/// every contributed line ends with a single space span. A heading or list
/// marker whose text is empty closes the open paragraph and yields nothing.
pub fn parse(source: &str) -> Vec<ContentBlock> {
    let mut blocks = Vec::new();
    let mut open: Option<Vec<Span>> = None;

    for raw in source.split('\n') {
        let line = raw.trim();

        if line.is_empty() {
            close(&mut open, &mut blocks);
            blocks.push(ContentBlock::Blank);
            continue;
        }

        if let Some(block) = classify(line) {
            close(&mut open, &mut blocks);
            if let Some(block) = block {
                blocks.push(block);
            }
            continue;
        }

        let spans = open.get_or_insert_with(Vec::new);
        if line.contains("**") {
            push_formatted(spans, line);
        } else {
            spans.push(Span::plain(line));
        }
        spans.push(Span::plain(" "));
    }

    close(&mut open, &mut blocks);
    blocks
}

/// Classify a structural line.
///
/// `None` means the line is paragraph text; `Some(None)` a structural line
/// with nothing to emit.
fn classify(line: &str) -> Option<Option<ContentBlock>> {
    if line.starts_with("===") && line.ends_with("===") {
        let text = line.replace('=', "");
        return Some(non_empty(text.trim()).map(|text| ContentBlock::Heading { level: 2, text }));
    }

    if line.starts_with("--") || line.starts_with("##") {
        let text = line.replace(['-', '#'], "");
        return Some(non_empty(text.trim()).map(|text| ContentBlock::Heading { level: 3, text }));
    }

    // `**` opens bold text, not a bullet
    if !line.starts_with("**")
        && let Some(rest) = line
            .strip_prefix('•')
            .or_else(|| line.strip_prefix('-'))
            .or_else(|| line.strip_prefix('*'))
    {
        return Some(non_empty(rest.trim()).map(|text| ContentBlock::ListItem {
            ordered: false,
            text,
        }));
    }

    let mut chars = line.chars();
    if line.chars().count() > 2
        && chars.next().is_some_and(|c| c.is_ascii_digit())
        && chars.next() == Some('.')
    {
        return Some(non_empty(chars.as_str().trim()).map(|text| ContentBlock::ListItem {
            ordered: true,
            text,
        }));
    }

    None
}

/// Split `**`-delimited text into alternating plain and bold spans.
fn push_formatted(spans: &mut Vec<Span>, line: &str) {
    for (i, part) in line.split("**").enumerate() {
        if part.is_empty() {
            continue;
        }
        spans.push(Span {
            text: part.to_string(),
            bold: i % 2 == 1,
        });
    }
}

fn close(open: &mut Option<Vec<Span>>, blocks: &mut Vec<ContentBlock>) {
    if let Some(spans) = open.take() {
        blocks.push(ContentBlock::Paragraph { spans });
    }
}

fn non_empty(text: &str) -> Option<String> {
    (!text.is_empty()).then(|| text.to_string())
}
