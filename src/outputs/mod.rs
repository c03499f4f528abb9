//! Output generation: font resolution and the newspaper-style PDF.
//!
//! # Submodules
//!
//! - [`fonts`]: Resolves and loads the Regular/Bold font pair a family needs
//! - [`pdf`]: Lays out the edition as multi-column HTML and renders it to PDF
//!
//! Font resolution happens at startup so a missing file aborts the run
//! before any network traffic; rendering happens once, at the very end.

pub mod fonts;
pub mod pdf;
