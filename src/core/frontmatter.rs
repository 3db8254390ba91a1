//! Frontmatter extraction.
//!
//! Splits a document into its `---` delimited header block and body, and
//! returns the header as an ordered list of string key/value pairs. Every
//! value carries the byte spans it occupies in the raw text so callers can
//! rewrite a single value without touching anything around it. Indented
//! lines below a key (block sequences, folded and literal scalars) belong
//! to that key.
//!
//! Values are opaque strings here; typed parsing happens in `document`.

use std::ops::Range;

/// One top-level key of the header block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub key: String,
    /// Value with surrounding whitespace, matching quotes and a trailing
    /// comment removed. For a block sequence the items are joined with `, `;
    /// for a block scalar the lines are joined as YAML folds them.
    pub value: String,
    /// Byte span of the inline part of the value, on the key line.
    pub value_span: Range<usize>,
    /// Byte spans of the value on continuation lines, without indentation,
    /// `- ` markers or comments.
    pub continuation: Vec<Range<usize>>,
    /// Line number (1-indexed) of the key inside the raw document.
    pub line: usize,
}

impl Field {
    /// Every span of the raw document holding part of this value.
    pub fn spans(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        std::iter::once(self.value_span.clone()).chain(self.continuation.iter().cloned())
    }
}

/// Parsed header block of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frontmatter {
    fields: Vec<Field>,
    /// Byte span between the two delimiter lines.
    pub header_span: Range<usize>,
    /// Byte offset where the body starts (just past the closing delimiter line).
    pub body_start: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontmatterError {
    /// The document does not open with a `---` line.
    NoFrontmatter,
    /// The opening delimiter is never closed.
    Unterminated,
    /// The header block is not a valid YAML mapping.
    InvalidYaml(String),
}

impl FrontmatterError {
    pub fn message(&self) -> String {
        match self {
            FrontmatterError::NoFrontmatter => "Document has no frontmatter block".to_string(),
            FrontmatterError::Unterminated => "Frontmatter block is never closed".to_string(),
            FrontmatterError::InvalidYaml(err) => format!("Invalid YAML frontmatter: {}", err),
        }
    }
}

impl Frontmatter {
    /// First field with the given key.
    pub fn get(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Value of the first field with the given key, `None` when absent or empty.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.get(key)
            .map(|f| f.value.as_str())
            .filter(|v| !v.is_empty())
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == "---"
}

/// Extract the frontmatter block from raw document text.
pub fn extract(raw: &str) -> Result<Frontmatter, FrontmatterError> {
    let mut lines = raw.split_inclusive('\n');
    let first = lines.next().ok_or(FrontmatterError::NoFrontmatter)?;
    if !is_delimiter(first.strip_prefix('\u{feff}').unwrap_or(first)) {
        return Err(FrontmatterError::NoFrontmatter);
    }

    let header_start = first.len();
    let mut offset = header_start;
    let mut fields = Vec::new();
    let mut open: Option<OpenField> = None;
    let mut line_no = 1;

    for line in lines {
        line_no += 1;
        let line_start = offset;
        offset += line.len();

        if is_delimiter(line) {
            fields.extend(open.take().map(OpenField::finish));
            check_yaml(&raw[header_start..line_start])?;
            return Ok(Frontmatter {
                fields,
                header_span: header_start..line_start,
                body_start: offset,
            });
        }

        if let Some(field) = parse_field_line(line, line_start, line_no) {
            fields.extend(open.replace(OpenField::new(field)).map(OpenField::finish));
        } else if let Some(current) = open.as_mut() {
            current.push_line(line, line_start);
        }
    }

    Err(FrontmatterError::Unterminated)
}

/// A field whose continuation lines are still being collected.
struct OpenField {
    field: Field,
    /// Separator for block scalars (`>` folds, `|` keeps newlines).
    block: Option<&'static str>,
    all_items: bool,
    parts: Vec<String>,
}

impl OpenField {
    fn new(field: Field) -> Self {
        let block = match field.value.chars().next() {
            Some('>') => Some(" "),
            Some('|') => Some("\n"),
            _ => None,
        };
        Self {
            field,
            block,
            all_items: true,
            parts: Vec::new(),
        }
    }

    fn push_line(&mut self, line: &str, line_start: usize) {
        let content = line.trim_end_matches(['\n', '\r']);
        let indent = content.len() - content.trim_start().len();
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return;
        }

        // Block scalar text is literal, `#` included
        if self.block.is_some() {
            let start = line_start + indent;
            self.field.continuation.push(start..start + trimmed.len());
            self.parts.push(trimmed.to_string());
            return;
        }

        if trimmed.starts_with('#') {
            return;
        }

        let mut text_start = indent;
        let mut item = false;
        if let Some(rest) = content[indent..].strip_prefix('-') {
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                item = true;
                text_start += 1;
            }
        }

        let text = &content[text_start..];
        let bounds = scalar_bounds(text);
        let start = line_start + text_start + bounds.start;
        self.field.continuation.push(start..start + bounds.len());
        self.parts.push(text[bounds].to_string());
        self.all_items &= item;
    }

    fn finish(mut self) -> Field {
        if self.parts.is_empty() {
            return self.field;
        }

        self.field.value = match self.block {
            Some(separator) => self.parts.join(separator),
            None if self.field.value.is_empty() && self.all_items => self.parts.join(", "),
            None => std::iter::once(self.field.value.as_str())
                .chain(self.parts.iter().map(String::as_str))
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
        };
        self.field
    }
}

/// Parse a top-level `key: value` line. Indented lines, comments and list
/// continuation lines are not top-level fields.
fn parse_field_line(line: &str, line_start: usize, line_no: usize) -> Option<Field> {
    let first = line.chars().next()?;
    if first.is_whitespace() || first == '#' || first == '-' {
        return None;
    }

    let colon = line.find(':')?;
    let key = line[..colon].trim();
    if key.is_empty() {
        return None;
    }

    let content = line.trim_end_matches(['\n', '\r']);
    let after = &content[colon + 1..];
    let bounds = scalar_bounds(after);
    let start = line_start + colon + 1 + bounds.start;

    Some(Field {
        key: key.to_string(),
        value: after[bounds.clone()].to_string(),
        value_span: start..start + bounds.len(),
        continuation: Vec::new(),
        line: line_no,
    })
}

/// Range of the scalar inside `text`: surrounding whitespace, a pair of
/// matching quotes and a trailing `# comment` are left out.
fn scalar_bounds(text: &str) -> Range<usize> {
    let start = text.len() - text.trim_start().len();
    let rest = &text[start..];

    if let Some(quote) = rest.chars().next().filter(|c| *c == '"' || *c == '\'') {
        if let Some(close) = rest.rfind(quote).filter(|&i| i > 0) {
            let tail = rest[close + 1..].trim_start();
            if tail.is_empty() || tail.starts_with('#') {
                return start + 1..start + close;
            }
        }
    }

    let end = comment_start(rest).unwrap_or(rest.len());
    start..start + rest[..end].trim_end().len()
}

/// A `#` opens a comment at the start of a value or after whitespace.
fn comment_start(text: &str) -> Option<usize> {
    text.char_indices()
        .find(|&(i, c)| c == '#' && text[..i].chars().next_back().is_none_or(char::is_whitespace))
        .map(|(i, _)| i)
}

fn check_yaml(header: &str) -> Result<(), FrontmatterError> {
    match serde_yml::from_str::<serde_yml::Value>(header) {
        Ok(serde_yml::Value::Mapping(_)) | Ok(serde_yml::Value::Null) => Ok(()),
        Ok(_) => Err(FrontmatterError::InvalidYaml(
            "header is not a key/value mapping".to_string(),
        )),
        Err(e) => Err(FrontmatterError::InvalidYaml(e.to_string())),
    }
}
