//! Article → Markdown conversion.
//!
//! The output is a pure function of the [`Article`]: no I/O, no clock, no
//! randomness. Image references point at `./images/<slug>`, which is where
//! the image fetcher stores the same URLs.

use crate::layout::image_link;
use crate::models::{Article, BodyBlock};
use crate::utils::url_slug;

/// Render one article.
///
/// Parts appear in this order and are left out when their field is empty:
/// lead image, sub-headline (`##`), headline (`#`), description (quote),
/// meta line (quote), body blocks, and a trailing `## Source` section.
/// Images whose URL has no file name get no placeholder.
pub fn article_to_markdown(article: &Article) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(link) = placeholder(&article.lead_image_url) {
        parts.push(link);
    }
    if let Some(sub) = non_empty(&article.sub_headline) {
        parts.push(format!("## {sub}"));
    }
    if let Some(headline) = non_empty(&article.headline) {
        parts.push(format!("# {headline}"));
    }
    if let Some(description) = non_empty(&article.description) {
        parts.push(quote(description));
    }
    if let Some(meta) = non_empty(&article.meta) {
        parts.push(quote(meta));
    }

    for block in &article.body {
        match block {
            BodyBlock::Paragraph(text) => {
                if let Some(text) = non_empty(text) {
                    parts.push(text.to_string());
                }
            }
            BodyBlock::Image(url) => {
                if let Some(link) = placeholder(url) {
                    parts.push(link);
                }
            }
        }
    }

    if let Some(url) = non_empty(&article.source_url) {
        parts.push(format!("## Source\n\n{url}"));
    }

    let mut md = parts.join("\n\n");
    md.push('\n');
    md
}

/// Image reference for `url`, or `None` when no file name can be derived
/// from it (`data:` URIs, trailing-slash URLs). Such images are never saved.
fn placeholder(url: &str) -> Option<String> {
    (!url_slug(url).is_empty()).then(|| format!("![]({})", image_link(url)))
}

fn non_empty(s: &str) -> Option<&str> {
    let t = s.trim();
    (!t.is_empty()).then_some(t)
}

fn quote(text: &str) -> String {
    text.lines()
        .map(|line| format!("> {}", line.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}
