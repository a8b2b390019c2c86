use crate::error::ConsumoError;
use crate::extraction::PageRenderer;
use image::RgbImage;
use std::io::Write;
use std::process::Command;

/// Page rasterizer backed by `pdftoppm` (from poppler-utils).
///
/// Each page is rendered to PNG on stdout and decoded in memory.
pub struct PdftoppmRenderer;

impl PdftoppmRenderer {
    pub fn new() -> Self {
        PdftoppmRenderer
    }
}

impl Default for PdftoppmRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PageRenderer for PdftoppmRenderer {
    fn render_page(
        &self,
        pdf_bytes: &[u8],
        page_index: usize,
        dpi: u32,
    ) -> Result<RgbImage, ConsumoError> {
        let mut tmpfile =
            tempfile::NamedTempFile::new().map_err(|e| ConsumoError::Extraction(e.to_string()))?;
        tmpfile
            .write_all(pdf_bytes)
            .map_err(|e| ConsumoError::Extraction(e.to_string()))?;

        // pdftoppm numbers pages from 1
        let page_number = (page_index + 1).to_string();
        let output = Command::new("pdftoppm")
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-f")
            .arg(&page_number)
            .arg("-l")
            .arg(&page_number)
            .arg("-png")
            .arg(tmpfile.path())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConsumoError::PopplerNotFound { tool: "pdftoppm" }
                } else {
                    ConsumoError::Extraction(format!("pdftoppm failed: {}", e))
                }
            })?;

        if !output.status.success() {
            return Err(ConsumoError::PdftoppmFailed {
                page: page_index + 1,
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        let img = image::load_from_memory_with_format(&output.stdout, image::ImageFormat::Png)?;
        Ok(img.to_rgb8())
    }
}
