use crate::error::ConsumoError;
use crate::extraction::{PageContent, PdfExtractor, Rect, Token};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::Write;
use std::process::Command;

/// PDF extraction backend using pdftotext (from poppler-utils).
///
/// Uses `pdftotext -bbox-layout`, which reports every word with its bounding
/// box nested inside `<block>` and `<line>` elements. Block, line and word
/// indices are assigned in document order and restart per page, per block
/// and per line respectively.
pub struct PdftotextExtractor;

impl PdftotextExtractor {
    pub fn new() -> Self {
        PdftotextExtractor
    }
}

impl Default for PdftotextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfExtractor for PdftotextExtractor {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageContent>, ConsumoError> {
        let mut tmpfile =
            tempfile::NamedTempFile::new().map_err(|e| ConsumoError::Extraction(e.to_string()))?;
        tmpfile
            .write_all(pdf_bytes)
            .map_err(|e| ConsumoError::Extraction(e.to_string()))?;

        let output = Command::new("pdftotext")
            .arg("-bbox-layout")
            .arg(tmpfile.path())
            .arg("-")
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConsumoError::PopplerNotFound { tool: "pdftotext" }
                } else {
                    ConsumoError::Extraction(format!("pdftotext -bbox-layout failed: {}", e))
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(ConsumoError::PdftotextFailed { code, stderr });
        }

        let xml = String::from_utf8_lossy(&output.stdout);
        let pages = parse_bbox_layout(&xml)?;
        tracing::debug!(pages = pages.len(), "pdftotext extracted pages");
        Ok(pages)
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}

/// Parse the XHTML produced by `pdftotext -bbox-layout` into word tokens.
pub(crate) fn parse_bbox_layout(xml: &str) -> Result<Vec<PageContent>, ConsumoError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut pages: Vec<PageContent> = Vec::new();
    let mut block: Option<usize> = None;
    let mut line: Option<usize> = None;
    let mut next_block = 0;
    let mut next_line = 0;
    let mut next_word = 0;
    let mut word: Option<(Rect, String)> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| ConsumoError::Extraction(format!("invalid bbox XML: {e}")))?;

        match event {
            Event::Start(ref e) => match e.name().as_ref() {
                b"page" => {
                    pages.push(PageContent {
                        page_index: pages.len(),
                        width: attr_f32(e, b"width").unwrap_or_default(),
                        height: attr_f32(e, b"height").unwrap_or_default(),
                        tokens: Vec::new(),
                    });
                    next_block = 0;
                }
                b"block" => {
                    block = Some(next_block);
                    next_block += 1;
                    next_line = 0;
                }
                b"line" => {
                    line = Some(next_line);
                    next_line += 1;
                    next_word = 0;
                }
                b"word" => {
                    word = word_rect(e).map(|rect| (rect, String::new()));
                }
                _ => {}
            },
            Event::Text(ref t) => {
                if let Some((_, text)) = word.as_mut() {
                    let decoded = t
                        .unescape()
                        .map_err(|e| ConsumoError::Extraction(format!("invalid bbox XML: {e}")))?;
                    text.push_str(&decoded);
                }
            }
            Event::End(ref e) => match e.name().as_ref() {
                b"word" => {
                    if let (Some((rect, text)), Some(page)) = (word.take(), pages.last_mut()) {
                        let text = text.trim();
                        if !text.is_empty() {
                            page.tokens.push(Token {
                                rect,
                                text: text.to_string(),
                                block: block.unwrap_or_default(),
                                line: line.unwrap_or_default(),
                                word: next_word,
                            });
                            next_word += 1;
                        }
                    }
                }
                b"line" => line = None,
                b"block" => block = None,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(pages)
}

fn word_rect(tag: &BytesStart) -> Option<Rect> {
    Some(Rect {
        x0: attr_f32(tag, b"xMin")?,
        y0: attr_f32(tag, b"yMin")?,
        x1: attr_f32(tag, b"xMax")?,
        y1: attr_f32(tag, b"yMax")?,
    })
}

fn attr_f32(tag: &BytesStart, name: &[u8]) -> Option<f32> {
    tag.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name)
        .and_then(|a| a.unescape_value().ok()?.trim().parse().ok())
}
