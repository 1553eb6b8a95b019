//! Input text preparation for the classifier.

use regex::Regex;

use crate::error::AnalysisError;

const ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
    ("&amp;", "&"),
];

/// Strips markup, decodes common entities, collapses whitespace and
/// truncates to the model's input limit.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    tags: Regex,
    max_chars: usize,
}

impl TextNormalizer {
    /// # Errors
    ///
    /// Returns [`AnalysisError::Pattern`] if the tag pattern fails to compile.
    pub fn new(max_chars: usize) -> Result<Self, AnalysisError> {
        Ok(Self {
            tags: Regex::new(r"(?is)<[^>]*>")?,
            max_chars,
        })
    }

    /// Returns `None` when nothing classifiable remains.
    #[must_use]
    pub fn normalize(&self, raw: &str) -> Option<String> {
        let stripped = self.tags.replace_all(raw, " ");
        let mut decoded = stripped.into_owned();
        for (entity, replacement) in ENTITIES {
            if decoded.contains(entity) {
                decoded = decoded.replace(entity, replacement);
            }
        }

        let collapsed = decoded.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            return None;
        }
        Some(match collapsed.char_indices().nth(self.max_chars) {
            Some((cut, _)) => collapsed[..cut].trim_end().to_owned(),
            None => collapsed,
        })
    }
}
