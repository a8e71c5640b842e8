//! RFC 5545 content-line writer.
//!
//! Lines end with CRLF and are folded at 75 octets without splitting UTF-8
//! sequences. TEXT values are escaped per RFC 5545 §3.3.11.

/// Maximum octets per physical line, excluding the CRLF.
pub const MAX_LINE_OCTETS: usize = 75;

/// Accumulates content lines.
#[derive(Debug, Default)]
pub struct ContentWriter {
    buf: String,
}

impl ContentWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes `BEGIN:<component>`.
    pub fn begin(&mut self, component: &str) {
        self.line("BEGIN", &[], component);
    }

    /// Writes `END:<component>`.
    pub fn end(&mut self, component: &str) {
        self.line("END", &[], component);
    }

    /// Writes a property whose value is already encoded.
    pub fn line(&mut self, name: &str, params: &[(&str, &str)], value: &str) {
        let mut logical = String::with_capacity(name.len() + value.len() + 1);
        logical.push_str(name);
        for (key, val) in params {
            logical.push(';');
            logical.push_str(key);
            logical.push('=');
            push_param_value(&mut logical, val);
        }
        logical.push(':');
        logical.push_str(value);
        fold_into(&mut self.buf, &logical);
    }

    /// Writes a TEXT property, escaping the value.
    pub fn text(&mut self, name: &str, value: &str) {
        self.line(name, &[], &escape_text(value));
    }

    /// Writes a multi-valued TEXT property such as `CATEGORIES`.
    pub fn text_list(&mut self, name: &str, values: &[String]) {
        let joined = values
            .iter()
            .map(|v| escape_text(v))
            .collect::<Vec<_>>()
            .join(",");
        self.line(name, &[], &joined);
    }

    /// Consumes the writer, returning the encoded document.
    pub fn finish(self) -> String {
        self.buf
    }
}

/// Escapes a TEXT value.
pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str("\\n");
            }
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

fn push_param_value(out: &mut String, value: &str) {
    if value.contains([':', ';', ',']) {
        out.push('"');
        out.push_str(&value.replace('"', ""));
        out.push('"');
    } else {
        out.push_str(value);
    }
}

/// Appends `line` to `out`, folding it and terminating it with CRLF.
fn fold_into(out: &mut String, line: &str) {
    let mut used = 0;
    for c in line.chars() {
        let len = c.len_utf8();
        if used + len > MAX_LINE_OCTETS {
            out.push_str("\r\n ");
            // the continuation space counts toward the limit
            used = 1;
        }
        out.push(c);
        used += len;
    }
    out.push_str("\r\n");
}
