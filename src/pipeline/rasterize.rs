//! PDF rasterisation: render every page to an in-memory PNG via pdfium.
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async
//! contexts. `tokio::task::spawn_blocking` moves the work onto the blocking
//! thread pool so Tokio workers never stall on CPU-heavy rendering.
//!
//! PNG over JPEG: lossless compression preserves stroke crispness, which
//! matters far more than file size when the model is reading handwriting.

use crate::error::TranscribeError;
use async_trait::async_trait;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// One rendered page: 1-indexed number plus its PNG bytes.
///
/// Ephemeral — produced by the rasterizer, consumed by the next client
/// call, then dropped.
#[derive(Debug, Clone)]
pub struct PageImage {
    pub page_num: usize,
    pub png: Vec<u8>,
}

/// Turns a document into an ordered sequence of page images.
///
/// A trait rather than a free function so tests can substitute synthetic
/// pages without a pdfium binding or real PDFs on disk.
#[async_trait]
pub trait Rasterizer: Send + Sync {
    async fn rasterize(&self, pdf_path: &Path, dpi: u32) -> Result<Vec<PageImage>, TranscribeError>;
}

/// Production rasterizer backed by pdfium.
pub struct PdfiumRasterizer;

#[async_trait]
impl Rasterizer for PdfiumRasterizer {
    async fn rasterize(&self, pdf_path: &Path, dpi: u32) -> Result<Vec<PageImage>, TranscribeError> {
        let path = pdf_path.to_path_buf();
        tokio::task::spawn_blocking(move || rasterize_blocking(&path, dpi))
            .await
            .map_err(|e| TranscribeError::Internal(format!("Render task panicked: {e}")))?
    }
}

/// Blocking implementation of full-document rendering.
fn rasterize_blocking(pdf_path: &Path, dpi: u32) -> Result<Vec<PageImage>, TranscribeError> {
    let pdfium = Pdfium::default();

    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| TranscribeError::Rasterization {
            path: pdf_path.to_path_buf(),
            detail: format!("{e:?}"),
        })?;

    let pages = document.pages();
    let total = pages.len() as usize;
    debug!("PDF loaded: {} pages at {} DPI", total, dpi);

    // PDF user space is 72 points per inch.
    let render_config = PdfRenderConfig::new().scale_page_by_factor(dpi as f32 / 72.0);

    let mut results = Vec::with_capacity(total);
    for (idx, page) in pages.iter().enumerate() {
        let bitmap =
            page.render_with_config(&render_config)
                .map_err(|e| TranscribeError::Rasterization {
                    path: pdf_path.to_path_buf(),
                    detail: format!("page {}: {e:?}", idx + 1),
                })?;

        let image = bitmap.as_image();
        let png = encode_png(&image).map_err(|e| TranscribeError::Rasterization {
            path: pdf_path.to_path_buf(),
            detail: format!("page {}: PNG encoding failed: {e}", idx + 1),
        })?;

        debug!(
            "Rendered page {} → {}x{} px, {} bytes PNG",
            idx + 1,
            image.width(),
            image.height(),
            png.len()
        );
        results.push(PageImage {
            page_num: idx + 1,
            png,
        });
    }

    Ok(results)
}

/// PNG-encode a rendered page.
fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn encode_png_produces_png_magic() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255])));
        let png = encode_png(&img).expect("encode should succeed");
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
