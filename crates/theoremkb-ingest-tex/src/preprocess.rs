//! Source preprocessing ahead of macro scanning.

use regex::Regex;
use std::sync::OnceLock;

use crate::TexPreprocessor;

fn comment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)(^|[^\\])%.*$").expect("comment pattern is a valid regex"))
}

/// Normalizes line endings and drops LaTeX comments. Escaped `\%` is kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommentStripper;

impl TexPreprocessor for CommentStripper {
    fn preprocess(&self, tex: &str) -> String {
        let tex = tex.replace("\r\n", "\n");
        comment_regex().replace_all(&tex, "$1").into_owned()
    }
}
