//! On-disk layout of the archive.
//!
//! ```text
//! output_dir/
//! ├── readme.md                      # year index
//! └── 2020-07-25/
//!     ├── readme.md                  # section index
//!     ├── cover.jpg
//!     └── Leaders/
//!         ├── some-article.md
//!         └── images/
//!             └── 20200725_LDD001.jpg
//! ```
//!
//! Every path the crawler writes and every link an index page emits is built
//! here, so index links always point at files the crawl creates.

use crate::utils::url_slug;
use std::path::{Path, PathBuf};

pub const INDEX_FILE_NAME: &str = "readme.md";
pub const COVER_FILE_NAME: &str = "cover.jpg";
pub const IMAGES_DIR_NAME: &str = "images";
/// Directory name used when a section title leaves nothing usable.
pub const UNTITLED_SECTION: &str = "Untitled";

/// A section title as a single directory name.
///
/// Titles come from the remote page, so separators and control characters
/// become `-` and names that would resolve outside the edition (`""`, `.`,
/// `..`) are replaced. The result is always one normal path component.
pub fn section_dir_name(section_title: &str) -> String {
    let name: String = section_title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect();
    match name.trim() {
        "" | "." | ".." => UNTITLED_SECTION.to_string(),
        name => name.to_string(),
    }
}

/// Path of the year index page under the output root.
pub fn year_index_path(output_dir: &Path) -> PathBuf {
    output_dir.join(INDEX_FILE_NAME)
}

/// Link from the year index to an edition directory.
pub fn edition_dir_link(date: &str) -> String {
    format!("./{date}")
}

/// Link from the year index to an edition's cover.
pub fn edition_cover_link(date: &str) -> String {
    format!("./{date}/{COVER_FILE_NAME}")
}

/// Link from the section index to the cover.
pub fn cover_link() -> String {
    format!("./{COVER_FILE_NAME}")
}

/// Link from an article file to one of its images.
pub fn image_link(image_url: &str) -> String {
    format!("./{IMAGES_DIR_NAME}/{}", url_slug(image_url))
}

/// Paths for one edition, rooted at `<output_dir>/<date>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditionLayout {
    root: PathBuf,
    date: String,
}

impl EditionLayout {
    pub fn new(output_dir: &Path, date: &str) -> Self {
        Self {
            root: output_dir.join(date),
            date: date.to_string(),
        }
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cover_path(&self) -> PathBuf {
        self.root.join(COVER_FILE_NAME)
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE_NAME)
    }

    pub fn section_dir(&self, section_title: &str) -> PathBuf {
        self.root.join(section_dir_name(section_title))
    }

    pub fn image_dir(&self, section_title: &str) -> PathBuf {
        self.section_dir(section_title).join(IMAGES_DIR_NAME)
    }

    pub fn article_path(&self, section_title: &str, article_slug: &str) -> PathBuf {
        self.section_dir(section_title)
            .join(format!("{article_slug}.md"))
    }

    /// Link from the section index to an article file, percent-encoded so
    /// section titles with spaces survive Markdown link parsing.
    pub fn article_link(&self, section_title: &str, article_slug: &str) -> String {
        format!(
            "./{}/{}.md",
            urlencoding::encode(&section_dir_name(section_title)),
            urlencoding::encode(article_slug)
        )
    }
}
