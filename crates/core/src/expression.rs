//! Recognizer for serialized JavaScript function expressions.
//!
//! Schemas may store a computed `keyId` as function source text. Import only
//! needs to know whether such a string is a function literal, so this is a
//! syntactic check over the shape of the text. Nothing is evaluated.

/// Whether `source` is a single function expression.
///
/// Accepts `function` expressions (optionally `async` or generator) and arrow
/// functions, with any number of wrapping parentheses. Anything trailing the
/// function, such as an immediate call, makes it a non-function.
pub fn is_function_literal(source: &str) -> bool {
    let text = strip_wrapping_parens(source.trim());
    if parse_function(text) {
        return true;
    }
    match strip_keyword(text, "async") {
        Some(rest) => parse_function(rest.trim_start()),
        None => false,
    }
}

fn parse_function(text: &str) -> bool {
    match strip_keyword(text, "function") {
        Some(rest) => parse_function_expression(rest),
        None => parse_arrow(text),
    }
}

/// `[*] [name] (params) { body }` following the `function` keyword.
fn parse_function_expression(rest: &str) -> bool {
    let mut rest = rest.trim_start();
    if let Some(after_star) = rest.strip_prefix('*') {
        rest = after_star.trim_start();
    }
    let name_len = identifier_len(rest);
    rest = rest[name_len..].trim_start();

    let Some(after_params) = take_group(rest, b'(') else {
        return false;
    };
    let body = after_params.trim_start();
    matches!(take_group(body, b'{'), Some(tail) if tail.trim().is_empty())
}

/// `ident => body` or `(params) => body`.
fn parse_arrow(text: &str) -> bool {
    let after_params = match identifier_len(text) {
        0 => match take_group(text, b'(') {
            Some(rest) => rest,
            None => return false,
        },
        n => &text[n..],
    };
    let Some(body) = after_params.trim_start().strip_prefix("=>") else {
        return false;
    };
    let body = body.trim();
    if body.starts_with('{') {
        return matches!(take_group(body, b'{'), Some(tail) if tail.trim().is_empty());
    }
    !body.is_empty() && is_single_expression(body)
}

/// Strip `keyword` when it is followed by a non-identifier character.
fn strip_keyword<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(keyword)?;
    match rest.bytes().next() {
        Some(b) if is_ident_byte(b) => None,
        Some(_) => Some(rest),
        None => None,
    }
}

fn strip_wrapping_parens(mut text: &str) -> &str {
    while text.starts_with('(') {
        match take_group(text, b'(') {
            Some(tail) if tail.trim().is_empty() => text = text[1..text.len() - 1].trim(),
            _ => break,
        }
    }
    text
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// Byte length of a leading identifier, 0 when there is none.
fn identifier_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    match bytes.first() {
        Some(b) if b.is_ascii_digit() => 0,
        Some(&b) if is_ident_byte(b) => bytes.iter().take_while(|&&b| is_ident_byte(b)).count(),
        _ => 0,
    }
}

fn closing(open: u8) -> u8 {
    match open {
        b'(' => b')',
        b'[' => b']',
        _ => b'}',
    }
}

/// Consume a balanced group opened by `open` at the start of `text`.
///
/// Returns the text after the closing delimiter. String literals are skipped
/// so delimiters inside them do not count.
fn take_group(text: &str, open: u8) -> Option<&str> {
    let bytes = text.as_bytes();
    if bytes.first() != Some(&open) {
        return None;
    }
    let mut stack = vec![closing(open)];
    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'"' | b'\'' | b'`') => i = skip_string(bytes, i, quote)?,
            b @ (b'(' | b'[' | b'{') => stack.push(closing(b)),
            b @ (b')' | b']' | b'}') => {
                if stack.pop() != Some(b) {
                    return None;
                }
                if stack.is_empty() {
                    return Some(&text[i + 1..]);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Index of the closing quote of the string starting at `start`.
fn skip_string(bytes: &[u8], start: usize, quote: u8) -> Option<usize> {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return Some(i),
            _ => i += 1,
        }
    }
    None
}

/// Balanced delimiters and no top-level statement separator.
fn is_single_expression(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut stack = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'"' | b'\'' | b'`') => match skip_string(bytes, i, quote) {
                Some(end) => i = end,
                None => return false,
            },
            b @ (b'(' | b'[' | b'{') => stack.push(closing(b)),
            b @ (b')' | b']' | b'}') => {
                if stack.pop() != Some(b) {
                    return false;
                }
            }
            b';' if stack.is_empty() => return false,
            _ => {}
        }
        i += 1;
    }
    stack.is_empty()
}
