use crate::error::ConsumoError;
use crate::extraction::{PageContent, PageRenderer};
use crate::layout::sections::{detect_sections, Section};
use crate::model::ParseWarning;
use crate::template::Template;
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, Rgb, RgbImage};
use serde::Serialize;
use std::collections::HashMap;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

const JPEG_QUALITY: u8 = 95;

/// Vertical band of one page, in PDF points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageSlice {
    pub page: usize,
    pub top: f32,
    pub bottom: f32,
}

/// What to render for one section: page bands stacked top to bottom, then
/// cropped horizontally to `[left, right]` plus the margin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapturePlan {
    pub name: String,
    pub slices: Vec<PageSlice>,
    pub left: f32,
    pub right: f32,
    /// Margin in rendered pixels.
    pub margin_px: u32,
}

impl CapturePlan {
    pub fn is_single_page(&self) -> bool {
        self.slices.len() == 1
    }
}

/// Build the capture plan for a section.
///
/// A section on one page covers the union of its rects. A section spanning
/// pages runs from its header to the bottom of the first page, through every
/// intermediate page holding at least one of its detail lines, and from the
/// top of the last page down to its end rect.
pub fn plan_capture(section: &Section, pages: &[PageContent], margin_px: u32) -> CapturePlan {
    let rects = || {
        std::iter::once((section.start_page, section.start_rect))
            .chain(section.detail_rects.iter().copied())
            .chain(std::iter::once((section.end_page, section.end_rect)))
    };
    let bounds = rects()
        .map(|(_, r)| r)
        .reduce(|a, b| a.union(&b))
        .unwrap_or(section.start_rect);

    let slices = if section.start_page == section.end_page {
        let on_page = rects()
            .filter(|(p, _)| *p == section.start_page)
            .map(|(_, r)| r)
            .reduce(|a, b| a.union(&b))
            .unwrap_or(bounds);
        vec![PageSlice {
            page: section.start_page,
            top: on_page.y0,
            bottom: on_page.y1,
        }]
    } else {
        let mut slices = vec![PageSlice {
            page: section.start_page,
            top: section.start_rect.y0,
            bottom: page_height(pages, section.start_page),
        }];
        for page in section.start_page + 1..section.end_page {
            if section.detail_rects.iter().any(|(p, _)| *p == page) {
                slices.push(PageSlice {
                    page,
                    top: 0.0,
                    bottom: page_height(pages, page),
                });
            } else {
                tracing::debug!(
                    section = %section.name,
                    page = page + 1,
                    "intermediate page has no detail lines, skipped"
                );
            }
        }
        slices.push(PageSlice {
            page: section.end_page,
            top: 0.0,
            bottom: section.end_rect.y1,
        });
        slices
    };

    CapturePlan {
        name: section.name.clone(),
        slices,
        left: bounds.x0,
        right: bounds.x1,
        margin_px,
    }
}

/// Unknown pages extend to the bottom of the rendered image.
fn page_height(pages: &[PageContent], page: usize) -> f32 {
    pages
        .iter()
        .find(|p| p.page_index == page)
        .map_or(f32::INFINITY, |p| p.height)
}

/// Render a plan into one image at `dpi`.
pub fn render_capture(
    pdf_bytes: &[u8],
    plan: &CapturePlan,
    renderer: &dyn PageRenderer,
    dpi: u32,
) -> Result<RgbImage, ConsumoError> {
    let scale = dpi as f32 / 72.0;
    let margin = plan.margin_px;

    let mut pieces = Vec::with_capacity(plan.slices.len());
    for slice in &plan.slices {
        let page = renderer.render_page(pdf_bytes, slice.page, dpi)?;
        let height = page.height();
        let mut top = ((slice.top * scale).floor() as u32).min(height);
        let mut bottom = ((slice.bottom * scale).ceil() as u32).min(height);
        if plan.is_single_page() {
            top = top.saturating_sub(margin);
            bottom = bottom.saturating_add(margin).min(height);
        }
        if bottom > top {
            pieces.push(imageops::crop_imm(&page, 0, top, page.width(), bottom - top).to_image());
        }
    }

    let width = pieces.iter().map(|p| p.width()).max().unwrap_or(0);
    let height: u32 = pieces.iter().map(|p| p.height()).sum();
    if width == 0 || height == 0 {
        return Err(ConsumoError::EmptyCapture {
            name: plan.name.clone(),
        });
    }

    let mut stitched = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    let mut y = 0i64;
    for piece in &pieces {
        imageops::overlay(&mut stitched, piece, 0, y);
        y += i64::from(piece.height());
    }

    let left = ((plan.left * scale).floor() as u32).saturating_sub(margin).min(width);
    let right = ((plan.right * scale).ceil() as u32)
        .saturating_add(margin)
        .min(width);
    if right <= left {
        return Err(ConsumoError::EmptyCapture {
            name: plan.name.clone(),
        });
    }

    Ok(imageops::crop_imm(&stitched, left, 0, right - left, height).to_image())
}

/// Hands out capture file names, numbering repeats of the same name.
#[derive(Debug, Clone)]
pub struct CaptureNamer {
    title: String,
    placeholder: String,
    seen: HashMap<String, usize>,
}

impl CaptureNamer {
    pub fn new(title: &str, placeholder: &str) -> Self {
        CaptureNamer {
            title: title.to_string(),
            placeholder: placeholder.to_string(),
            seen: HashMap::new(),
        }
    }

    /// `Consumos NAME.jpg` the first time, `Consumos NAME (n).jpg` after.
    pub fn file_name(&mut self, name: &str) -> String {
        let base = match name.trim() {
            "" => self.placeholder.as_str(),
            trimmed => trimmed,
        };
        let count = self.seen.entry(base.to_string()).or_insert(0);
        *count += 1;
        if *count == 1 {
            format!("{} {}.jpg", self.title, base)
        } else {
            format!("{} {} ({}).jpg", self.title, base, count)
        }
    }
}

pub fn save_jpeg(image: &RgbImage, path: &Path) -> Result<(), ConsumoError> {
    let file = std::fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY).encode_image(image)?;
    Ok(())
}

/// Files written by a capture pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CaptureReport {
    pub files: Vec<PathBuf>,
    pub plans: Vec<CapturePlan>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ParseWarning>,
}

/// Detect sections and write one JPEG per section into `out_dir`.
pub fn capture_statement(
    pdf_bytes: &[u8],
    pages: &[PageContent],
    template: &Template,
    renderer: &dyn PageRenderer,
    dpi: u32,
    out_dir: &Path,
) -> Result<CaptureReport, ConsumoError> {
    let scan = detect_sections(pages, template)?;
    std::fs::create_dir_all(out_dir)?;

    let mut namer = CaptureNamer::new(&template.section_title, &template.capture.placeholder_name);
    let mut report = CaptureReport {
        warnings: scan.warnings,
        ..Default::default()
    };

    for section in &scan.sections {
        let plan = plan_capture(section, pages, template.capture.margin_px);
        let image = render_capture(pdf_bytes, &plan, renderer, dpi)?;
        let path = out_dir.join(namer.file_name(&section.name));
        save_jpeg(&image, &path)?;
        tracing::info!(
            name = %section.name,
            pages = plan.slices.len(),
            path = %path.display(),
            "capture saved"
        );
        report.files.push(path);
        report.plans.push(plan);
    }

    Ok(report)
}
