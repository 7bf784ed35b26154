//! printf-style rendering of key/value pairs.
//!
//! Supported verbs: `%v`, `%s`, `%d`, `%q`, `%#v` and `%%`, with optional
//! explicit argument indexes (`%[2]q`). Width and precision (`%-10.3v`) are
//! accepted and ignored. Problems are rendered inline the way printf does
//! (`%!v(MISSING)`, `%!(EXTRA ...)`) instead of failing.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;
use std::sync::Arc;

use serde_json::Value;

type Handler = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// Overrides how keys and values are rendered before they reach the format.
///
/// A handler that returns an empty string falls back to the default
/// rendering for that value.
#[derive(Clone, Default)]
pub struct Interceptor {
    display: Option<Handler>,
    source: Option<Handler>,
}

impl Interceptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handler for `%v`, `%s`, `%d` and `%q`.
    pub fn with_display(mut self, f: impl Fn(&Value) -> String + Send + Sync + 'static) -> Self {
        self.display = Some(Arc::new(f));
        self
    }

    /// Handler for `%#v`.
    pub fn with_source(mut self, f: impl Fn(&Value) -> String + Send + Sync + 'static) -> Self {
        self.source = Some(Arc::new(f));
        self
    }

    fn display(&self, v: &Value) -> String {
        if let Some(s) = self.display.as_ref().map(|f| f(v))
            && !s.is_empty()
        {
            return s;
        }
        match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    fn source(&self, v: &Value) -> String {
        if let Some(s) = self.source.as_ref().map(|f| f(v))
            && !s.is_empty()
        {
            return s;
        }
        v.to_string()
    }

    fn quoted(&self, v: &Value) -> String {
        quote(&self.display(v))
    }
}

impl fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptor")
            .field("display", &self.display.is_some())
            .field("source", &self.source.is_some())
            .finish()
    }
}

/// Render `format` against `args`.
pub(crate) fn sprintf(format: &str, args: &[&Value], intercept: &Interceptor) -> String {
    let mut out = String::with_capacity(format.len());
    let mut chars = format.chars().peekable();
    let mut arg_num = 0usize;
    let mut reordered = false;

    while let Some(ch) = chars.next() {
        if ch != '%' {
            out.push(ch);
            continue;
        }

        let mut sharp = false;
        while let Some(&flag) = chars.peek() {
            match flag {
                '#' => sharp = true,
                '+' | '-' | ' ' | '0' => {}
                _ => break,
            }
            chars.next();
        }
        skip_width(&mut chars);

        let mut bad_index = false;
        if chars.peek() == Some(&'[') {
            chars.next();
            reordered = true;
            let mut digits = String::new();
            let mut closed = false;
            for c in chars.by_ref() {
                if c == ']' {
                    closed = true;
                    break;
                }
                digits.push(c);
            }
            match digits.parse::<usize>() {
                Ok(n) if closed && n >= 1 && n <= args.len() => arg_num = n - 1,
                _ => bad_index = true,
            }
            skip_width(&mut chars);
        }

        let Some(verb) = chars.next() else {
            out.push_str("%!(NOVERB)");
            break;
        };

        if verb == '%' {
            out.push('%');
            continue;
        }
        if bad_index {
            out.push_str(&format!("%!{verb}(BADINDEX)"));
            continue;
        }
        let Some(arg) = args.get(arg_num) else {
            out.push_str(&format!("%!{verb}(MISSING)"));
            continue;
        };
        arg_num += 1;

        let rendered = match verb {
            'v' if sharp => intercept.source(arg),
            'v' | 's' | 'd' => intercept.display(arg),
            'q' => intercept.quoted(arg),
            _ => format!("%!{verb}({})", intercept.display(arg)),
        };
        out.push_str(&rendered);
    }

    if !reordered && arg_num < args.len() {
        let extra: Vec<String> = args[arg_num..]
            .iter()
            .map(|v| intercept.display(v))
            .collect();
        out.push_str(&format!("%!(EXTRA {})", extra.join(", ")));
    }

    out
}

/// Consume width and precision digits, which do not affect the output.
fn skip_width(chars: &mut Peekable<Chars<'_>>) {
    while chars.next_if(|c| c.is_ascii_digit() || *c == '.').is_some() {}
}

/// Double-quote `s` with Go-style escapes: `\n` style for the common
/// controls, `\xNN` for other ASCII controls and `\uNNNN` / `\UNNNNNNNN`
/// for non-printable characters beyond ASCII.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{0b}' => out.push_str("\\v"),
            c if !c.is_control() => out.push(c),
            c if (c as u32) < 0x80 => out.push_str(&format!("\\x{:02x}", c as u32)),
            c if (c as u32) < 0x10000 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push_str(&format!("\\U{:08x}", c as u32)),
        }
    }
    out.push('"');
    out
}
