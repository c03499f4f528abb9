//! Font file resolution for the PDF renderer.
//!
//! A font family needs an on-disk pair at a conventional location:
//! `<fonts_dir>/<Family>-Regular.ttf` and `<fonts_dir>/<Family>-Bold.ttf`.
//! Both files are resolved and read at startup; a missing file aborts the
//! run with a descriptive error before any site processing begins.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// A font family's Regular/Bold pair, loaded into memory for embedding.
#[derive(Clone, Debug)]
pub struct FontPair {
    /// Family name as referenced from the page CSS.
    pub family: String,
    /// Raw TTF bytes of the regular face.
    pub regular: Vec<u8>,
    /// Raw TTF bytes of the bold face.
    pub bold: Vec<u8>,
}

impl FontPair {
    /// Resolve and load the font pair for `family` from `fonts_dir`.
    #[instrument(level = "info", skip_all, fields(%family, %fonts_dir))]
    pub fn resolve(fonts_dir: &str, family: &str) -> Result<FontPair, Box<dyn Error>> {
        let regular_path = font_path(fonts_dir, family, "Regular")?;
        let bold_path = font_path(fonts_dir, family, "Bold")?;

        let pair = FontPair {
            family: family.to_string(),
            regular: fs::read(&regular_path)?,
            bold: fs::read(&bold_path)?,
        };
        info!(
            regular = %regular_path.display(),
            bold = %bold_path.display(),
            "Loaded font pair"
        );
        Ok(pair)
    }

    /// The bold face's CSS family name.
    pub fn bold_family(&self) -> String {
        format!("{} Bold", self.family)
    }
}

fn font_path(fonts_dir: &str, family: &str, style: &str) -> Result<PathBuf, Box<dyn Error>> {
    let path = Path::new(fonts_dir).join(format!("{family}-{style}.ttf"));
    if !path.is_file() {
        return Err(format!(
            "missing font file for family '{family}': expected {}",
            path.display()
        )
        .into());
    }
    Ok(path)
}
