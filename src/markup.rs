//! Constrained rich text for model output.
//!
//! The model is asked to emphasize with a handful of HTML tags. We turn those
//! into a flat list of styled runs and line breaks. Only the allow-listed tags
//! have meaning; any other `<...>` sequence stays in the text verbatim, so the
//! client can render the result with plain text nodes and never needs to
//! interpret markup.
//!
//! Allowed: `<b>`, `<strong>`, `<i>`, `<em>`, `<br>` (any form), `<span ...>`
//! (treated as highlight, attributes ignored), and the `**bold**` / `*italic*`
//! markdown the model slips into despite instructions.

use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Inline {
  Text {
    text: String,
    #[serde(skip_serializing_if = "is_false")]
    bold: bool,
    #[serde(skip_serializing_if = "is_false")]
    italic: bool,
    #[serde(skip_serializing_if = "is_false")]
    highlight: bool,
  },
  LineBreak,
}

fn is_false(b: &bool) -> bool {
  !*b
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RichText(pub Vec<Inline>);

impl RichText {
  pub fn parse(input: &str) -> Self {
    Parser::default().run(input)
  }

  /// Text content without styling; line breaks become `\n`.
  pub fn to_plain(&self) -> String {
    let mut out = String::new();
    for inline in &self.0 {
      match inline {
        Inline::Text { text, .. } => out.push_str(text),
        Inline::LineBreak => out.push('\n'),
      }
    }
    out
  }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Tag {
  Bold,
  Italic,
  Highlight,
  Break,
}

#[derive(Default)]
struct Parser {
  out: Vec<Inline>,
  buf: String,
  bold: u32,
  italic: u32,
  highlight: u32,
  md_bold: bool,
  md_italic: bool,
}

impl Parser {
  fn run(mut self, input: &str) -> RichText {
    let mut rest = input;
    while let Some(ch) = rest.chars().next() {
      if ch == '<' {
        if let Some(end) = rest.find('>') {
          if let Some((tag, closing)) = classify(&rest[1..end]) {
            self.apply(tag, closing);
            rest = &rest[end + 1..];
            continue;
          }
        }
      } else if let Some(after) = rest.strip_prefix("**") {
        self.flush();
        self.md_bold = !self.md_bold;
        rest = after;
        continue;
      } else if ch == '*' && self.italic_marker_ok(rest) {
        self.flush();
        self.md_italic = !self.md_italic;
        rest = &rest[1..];
        continue;
      } else if ch == '\n' {
        self.flush();
        self.out.push(Inline::LineBreak);
        rest = &rest[1..];
        continue;
      }
      self.buf.push(ch);
      rest = &rest[ch.len_utf8()..];
    }
    self.flush();
    RichText(self.out)
  }

  /// A single `*` toggles italics only when it hugs a word, so "3 * 4" and
  /// bullet stars stay literal.
  fn italic_marker_ok(&self, rest: &str) -> bool {
    if self.md_italic {
      return !self.buf.ends_with(char::is_whitespace) && !self.buf.is_empty();
    }
    rest[1..].chars().next().is_some_and(|c| !c.is_whitespace() && c != '*') && rest[1..].contains('*')
  }

  fn apply(&mut self, tag: Tag, closing: bool) {
    if tag == Tag::Break {
      self.flush();
      self.out.push(Inline::LineBreak);
      return;
    }
    self.flush();
    let counter = match tag {
      Tag::Bold => &mut self.bold,
      Tag::Italic => &mut self.italic,
      Tag::Highlight => &mut self.highlight,
      Tag::Break => return,
    };
    if closing {
      *counter = counter.saturating_sub(1);
    } else {
      *counter += 1;
    }
  }

  fn flush(&mut self) {
    if self.buf.is_empty() {
      return;
    }
    let text = std::mem::take(&mut self.buf);
    let bold = self.bold > 0 || self.md_bold;
    let italic = self.italic > 0 || self.md_italic;
    let highlight = self.highlight > 0;
    if let Some(Inline::Text { text: prev, bold: b, italic: i, highlight: h }) = self.out.last_mut() {
      if *b == bold && *i == italic && *h == highlight {
        prev.push_str(&text);
        return;
      }
    }
    self.out.push(Inline::Text { text, bold, italic, highlight });
  }
}

/// Map the inside of `<...>` to an allowed tag, or `None` to keep it literal.
fn classify(inner: &str) -> Option<(Tag, bool)> {
  let inner = inner.trim();
  let (closing, body) = match inner.strip_prefix('/') {
    Some(b) => (true, b.trim_start()),
    None => (false, inner),
  };
  let body = body.trim_end_matches('/').trim_end();
  let name_end = body.find(char::is_whitespace).unwrap_or(body.len());
  let name = body[..name_end].to_ascii_lowercase();
  let has_attrs = name_end < body.len();
  let tag = match name.as_str() {
    "b" | "strong" if !has_attrs => Tag::Bold,
    "i" | "em" if !has_attrs => Tag::Italic,
    "br" if !has_attrs => Tag::Break,
    "span" if !closing || !has_attrs => Tag::Highlight,
    _ => return None,
  };
  Some((tag, closing))
}
