pub mod pdf;
pub mod raster;

use std::fs;
use std::path::{ Path, PathBuf };
use thiserror::Error;

use crate::models::chat::Message;
use self::pdf::{ write_pdf, PageSize };
use self::raster::TranscriptRenderer;

pub const EXPORT_FILE_NAME: &str = "conversacion_kinbot.pdf";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("captured pane is empty")]
    EmptyImage,
    #[error("PDF encoding failed: {0}")]
    Pdf(String),
    #[error("could not write transcript: {0}")]
    Io(#[from] std::io::Error),
}

/// Captures the conversation pane and lays it out as a one-page PDF.
#[derive(Debug, Clone, Default)]
pub struct Exporter {
    renderer: TranscriptRenderer,
    page: PageSize,
}

impl Exporter {
    pub fn new(renderer: TranscriptRenderer, page: PageSize) -> Self {
        Self { renderer, page }
    }

    pub fn page(&self) -> PageSize {
        self.page
    }

    pub fn render_pdf(&self, messages: &[Message], typing: bool) -> Result<Vec<u8>, ExportError> {
        let image = self.renderer.render(messages, typing);
        write_pdf(&image, self.page)
    }

    pub fn save(&self, messages: &[Message], typing: bool, dir: &Path) -> Result<PathBuf, ExportError> {
        let bytes = self.render_pdf(messages, typing)?;
        fs::create_dir_all(dir)?;
        let path = dir.join(EXPORT_FILE_NAME);
        fs::write(&path, bytes)?;
        Ok(path)
    }
}
