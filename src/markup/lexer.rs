//! Markup tokenizer.
//!
//! Splits an HTML fragment into open tags, close tags and text. Tag and
//! attribute names are lowercased; attribute values and text have their
//! character references decoded. Comments, doctypes and processing
//! instructions are skipped, as is the content of `script` and `style`.
//! Anything that does not look like a tag is text.

/// One lexical unit of markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Open {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    Close {
        name: String,
    },
    Text(String),
}

/// Elements whose content is never markup.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

pub(crate) fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut text_start = 0;
    let mut pos = 0;

    while let Some(offset) = input[pos..].find('<') {
        let lt = pos + offset;
        let rest = &input[lt..];

        let consumed = if rest.starts_with("<!--") {
            Some(skip_past(input, lt + 4, "-->"))
        } else if rest.starts_with("<!") || rest.starts_with("<?") {
            Some(skip_past(input, lt + 2, ">"))
        } else if rest.starts_with("</") {
            lex_close_tag(input, lt).map(|(token, end)| {
                flush_text(input, text_start, lt, &mut tokens);
                tokens.push(token);
                end
            })
        } else {
            lex_open_tag(input, lt).map(|(token, end)| {
                flush_text(input, text_start, lt, &mut tokens);
                let raw_text = match &token {
                    Token::Open {
                        name,
                        self_closing: false,
                        ..
                    } if RAW_TEXT_ELEMENTS.contains(&name.as_str()) => Some(name.clone()),
                    _ => None,
                };
                tokens.push(token);
                match raw_text {
                    Some(name) => skip_raw_text(input, end, &name, &mut tokens),
                    None => end,
                }
            })
        };

        match consumed {
            Some(end) => {
                // Keep the text in front of a skipped comment
                if rest.starts_with("<!") || rest.starts_with("<?") {
                    flush_text(input, text_start, lt, &mut tokens);
                }
                pos = end;
                text_start = end;
            }
            // A lone '<' is text
            None => pos = lt + 1,
        }
    }

    flush_text(input, text_start, input.len(), &mut tokens);
    tokens
}

fn flush_text(input: &str, start: usize, end: usize, tokens: &mut Vec<Token>) {
    if start >= end {
        return;
    }
    let text = decode_entities(&input[start..end]);
    match tokens.last_mut() {
        Some(Token::Text(prev)) => prev.push_str(&text),
        _ => tokens.push(Token::Text(text)),
    }
}

/// Byte index just past the next `terminator` at or after `from`, or the end.
fn skip_past(input: &str, from: usize, terminator: &str) -> usize {
    input
        .get(from..)
        .and_then(|rest| rest.find(terminator))
        .map(|i| from + i + terminator.len())
        .unwrap_or(input.len())
}

/// Skip the content of a raw text element and emit its close tag.
fn skip_raw_text(input: &str, from: usize, name: &str, tokens: &mut Vec<Token>) -> usize {
    let closing = format!("</{}", name);
    let lower = input[from..].to_ascii_lowercase();
    match lower.find(&closing) {
        Some(i) => {
            tokens.push(Token::Close {
                name: name.to_string(),
            });
            skip_past(input, from + i, ">")
        }
        None => input.len(),
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic()
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':'
}

/// Read a tag name starting at `from`. Returns the lowercased name and the
/// index past it.
fn read_name(input: &str, from: usize) -> Option<(String, usize)> {
    let rest = &input[from..];
    if !rest.chars().next().is_some_and(is_name_start) {
        return None;
    }
    let len = rest
        .char_indices()
        .find(|(_, c)| !is_name_char(*c))
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    Some((rest[..len].to_ascii_lowercase(), from + len))
}

fn skip_whitespace(input: &str, mut pos: usize) -> usize {
    while let Some(c) = input[pos..].chars().next() {
        if !c.is_ascii_whitespace() {
            break;
        }
        pos += c.len_utf8();
    }
    pos
}

fn lex_close_tag(input: &str, lt: usize) -> Option<(Token, usize)> {
    let (name, after) = read_name(input, lt + 2)?;
    Some((Token::Close { name }, skip_past(input, after, ">")))
}

fn lex_open_tag(input: &str, lt: usize) -> Option<(Token, usize)> {
    let (name, mut pos) = read_name(input, lt + 1)?;
    let mut attrs: Vec<(String, String)> = Vec::new();
    let mut self_closing = false;

    loop {
        pos = skip_whitespace(input, pos);
        let rest = &input[pos..];
        if rest.is_empty() {
            break;
        }
        if rest.starts_with('>') {
            pos += 1;
            break;
        }
        if rest.starts_with("/>") {
            self_closing = true;
            pos += 2;
            break;
        }
        if rest.starts_with('/') {
            pos += 1;
            continue;
        }

        // Attribute name: anything up to whitespace, '=', '>' or '/'
        let name_len = rest
            .char_indices()
            .find(|(_, c)| c.is_ascii_whitespace() || matches!(c, '=' | '>' | '/'))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        if name_len == 0 {
            // Stray '=' and similar
            pos += rest.chars().next().map(char::len_utf8).unwrap_or(1);
            continue;
        }
        let attr_name = rest[..name_len].to_ascii_lowercase();
        pos = skip_whitespace(input, pos + name_len);

        let mut value = String::new();
        if input[pos..].starts_with('=') {
            pos = skip_whitespace(input, pos + 1);
            let rest = &input[pos..];
            match rest.chars().next() {
                Some(quote @ ('"' | '\'')) => {
                    let body = &rest[1..];
                    let end = body.find(quote).unwrap_or(body.len());
                    value = decode_entities(&body[..end]);
                    pos += 1 + end + if end < body.len() { 1 } else { 0 };
                }
                Some(_) => {
                    let end = rest
                        .char_indices()
                        .find(|(_, c)| c.is_ascii_whitespace() || *c == '>')
                        .map(|(i, _)| i)
                        .unwrap_or(rest.len());
                    value = decode_entities(&rest[..end]);
                    pos += end;
                }
                None => {}
            }
        }

        // The first occurrence of an attribute wins
        if !attrs.iter().any(|(n, _)| *n == attr_name) {
            attrs.push((attr_name, value));
        }
    }

    Some((
        Token::Open {
            name,
            attrs,
            self_closing,
        },
        pos,
    ))
}

// ─────────────────────────────────────────────────────────────────────────────
// Character References
// ─────────────────────────────────────────────────────────────────────────────

/// Decode named and numeric character references. Unknown references are
/// kept literally.
pub(crate) fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        match after.find(';').filter(|&end| end <= 10) {
            Some(end) => match decode_reference(&after[..end]) {
                Some(c) => {
                    out.push(c);
                    rest = &after[end + 1..];
                }
                None => {
                    out.push('&');
                    rest = after;
                }
            },
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    if let Some(number) = name.strip_prefix('#') {
        let hex = number.strip_prefix('x').or_else(|| number.strip_prefix('X'));
        let code = match hex {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse().ok()?,
        };
        return char::from_u32(code).filter(|c| *c != '\0');
    }
    Some(match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{00A0}',
        "copy" => '©',
        "reg" => '®',
        "hellip" => '…',
        "mdash" => '\u{2014}',
        "ndash" => '\u{2013}',
        "laquo" => '«',
        "raquo" => '»',
        "euro" => '€',
        _ => return None,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
