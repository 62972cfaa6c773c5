// src/pipeline/markup.rs

//! HTML cleanup step: drop whatever a template emitted before the doctype
//! (stray whitespace from include directives, mostly) and strip HTML
//! comments.

use regex::Regex;

use crate::errors::StepError;
use crate::pipeline::step::Asset;

#[derive(Debug)]
pub struct HtmlCleaner {
    remove_comments: bool,
    doctype_re: Regex,
    comment_re: Regex,
}

impl HtmlCleaner {
    pub fn new(remove_comments: bool) -> Self {
        Self {
            remove_comments,
            // Both are fixed patterns; compilation cannot fail.
            doctype_re: Regex::new(r"(?i)<!doctype").unwrap(),
            comment_re: Regex::new(r"(?s)<!--.*?-->").unwrap(),
        }
    }

    pub fn apply(&self, asset: Asset) -> Result<Option<Asset>, StepError> {
        let (rel, html) = asset.into_text()?;

        let trimmed = match self.doctype_re.find(&html) {
            Some(m) => &html[m.start()..],
            None => html.as_str(),
        };

        let cleaned = if self.remove_comments {
            self.comment_re.replace_all(trimmed, "").into_owned()
        } else {
            trimmed.to_string()
        };

        Ok(Some(Asset::new(rel, cleaned.into_bytes())))
    }
}
