//! Index pages that make the archive navigable.
//!
//! # Index Files
//!
//! - **Year index** (`readme.md` at the output root): one table cell per
//!   edition, four cells per row, each with the cover, the date and a link
//!   to the edition directory. Rewritten on every year crawl.
//! - **Section index** (`<date>/readme.md`): edition title, cover, then one
//!   heading per section with a link per article file.
//!
//! Rendering is pure; the `write_*` functions only put the rendered text on
//! disk.

use crate::errors::CrawlError;
use crate::layout::{self, EditionLayout};
use crate::models::{Edition, Section};
use crate::utils::{title_from_slug, url_slug};
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

const EDITIONS_PER_ROW: usize = 4;

/// Render the year index page.
pub fn render_year_index(site_name: &str, year: &str, editions: &[Edition]) -> String {
    let mut rows = String::new();
    for row in editions.chunks(EDITIONS_PER_ROW) {
        rows.push_str("<tr>");
        for edition in row {
            let label = if edition.title.trim().is_empty() {
                edition.date.as_str()
            } else {
                edition.title.trim()
            };
            write!(
                rows,
                "<td><p><img src='{}'/></p><p>{}</p><p><a href='{}'>{}</a></p></td>",
                layout::edition_cover_link(&edition.date),
                edition.date,
                layout::edition_dir_link(&edition.date),
                escape_html(label)
            )
            .unwrap();
        }
        rows.push_str("</tr>");
    }

    format!("# {site_name} {year}\n\n<table>{rows}</table>\n")
}

/// Render an edition's section index page.
///
/// Articles whose URL has no usable slug are left out: no file is ever
/// written for them.
pub fn render_section_index(title: &str, sections: &[Section], layout: &EditionLayout) -> String {
    let mut md = String::new();
    writeln!(md, "## {}\n", title.trim()).unwrap();
    writeln!(md, "![]({})", layout::cover_link()).unwrap();

    for section in sections {
        writeln!(md, "\n### {}\n", section.title).unwrap();
        for link in &section.article_links {
            let slug = url_slug(link);
            if slug.is_empty() {
                continue;
            }
            writeln!(
                md,
                "#### [{}]({})",
                title_from_slug(slug),
                layout.article_link(&section.title, slug)
            )
            .unwrap();
        }
    }
    md
}

/// Write the year index page, replacing any previous one.
#[instrument(level = "info", skip_all, fields(%year, editions = editions.len()))]
pub async fn write_year_index(
    output_dir: &Path,
    site_name: &str,
    year: &str,
    editions: &[Edition],
) -> Result<PathBuf, CrawlError> {
    let path = layout::year_index_path(output_dir);
    let page = render_year_index(site_name, year, editions);
    fs::write(&path, page)
        .await
        .map_err(|e| CrawlError::io(&path, e))?;
    info!(path = %path.display(), "Wrote year index");
    Ok(path)
}

/// Write an edition's section index page.
#[instrument(level = "info", skip_all, fields(date = %layout.date(), sections = sections.len()))]
pub async fn write_section_index(
    layout: &EditionLayout,
    title: &str,
    sections: &[Section],
) -> Result<PathBuf, CrawlError> {
    let path = layout.index_path();
    let page = render_section_index(title, sections, layout);
    fs::write(&path, page)
        .await
        .map_err(|e| CrawlError::io(&path, e))?;
    info!(path = %path.display(), "Wrote section index");
    Ok(path)
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\'', "&#39;")
}
