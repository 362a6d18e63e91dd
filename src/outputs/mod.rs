//! Output generation: article Markdown and the index pages.
//!
//! # Submodules
//!
//! - [`markdown`]: converts one [`Article`](crate::models::Article) to Markdown
//! - [`indexes`]: year index and per-edition section index pages

pub mod indexes;
pub mod markdown;
