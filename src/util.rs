//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// This is intentionally simple (no nested/conditional logic).
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Remove markdown code fences the model sometimes wraps around JSON/HTML.
/// Fence markers are dropped wherever they appear, then the result is trimmed.
pub fn strip_code_fences(text: &str) -> String {
  text
    .replace("```json", "")
    .replace("```html", "")
    .replace("```", "")
    .trim()
    .to_string()
}

/// Log-safe truncation for large strings.
/// Cuts on a char boundary so Spanish accents never split mid-codepoint.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut cut = max;
  while !s.is_char_boundary(cut) {
    cut -= 1;
  }
  format!("{}… ({} bytes total)", &s[..cut], s.len())
}
