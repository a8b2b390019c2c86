use crate::error::ConsumoError;
use crate::extraction::{PageContent, Rect};
use crate::layout::grouper::{group_lines, Line};
use crate::model::ParseWarning;
use crate::parsing::normalize::normalize_name;
use crate::template::Template;
use serde::Serialize;

/// How a section's end geometry was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Closure {
    /// Closed by its own total line.
    Total,
    /// Force-closed because another person's header appeared.
    NextHeader,
    /// Force-closed by a document end marker.
    EndMarker,
    /// Still open when the pages ran out.
    EndOfDocument,
}

/// One person's slice of the statement, with resolved start and end geometry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub name: String,
    pub start_page: usize,
    pub start_rect: Rect,
    pub end_page: usize,
    pub end_rect: Rect,
    pub detail_rects: Vec<(usize, Rect)>,
    pub closure: Closure,
}

#[derive(Debug, Clone, PartialEq)]
struct OpenSection {
    name: String,
    start_page: usize,
    start_rect: Rect,
    detail_rects: Vec<(usize, Rect)>,
}

impl OpenSection {
    fn close_at(self, end_page: usize, end_rect: Rect) -> Section {
        Section {
            name: self.name,
            start_page: self.start_page,
            start_rect: self.start_rect,
            end_page,
            end_rect,
            detail_rects: self.detail_rects,
            closure: Closure::Total,
        }
    }

    /// End at the last detail line, or at the header when there is none.
    fn close_fallback(self, closure: Closure) -> Section {
        let (end_page, end_rect) = self
            .detail_rects
            .last()
            .copied()
            .unwrap_or((self.start_page, self.start_rect));
        Section {
            closure,
            ..self.close_at(end_page, end_rect)
        }
    }
}

/// Classification of one line while scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    /// Not scanning: before the start marker or after an end marker.
    Ignored,
    EndMarker,
    /// Opens a section for the normalized name.
    Header(String),
    /// Closes the open section with the given name.
    Total(String),
    /// Belongs to the open section.
    Detail,
    /// Scanning, but no section is open.
    Outside,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    SeekingStart,
    Scanning,
    Done,
}

/// Scan state threaded through the page and line stream.
#[derive(Debug, Clone)]
pub struct ScanState {
    phase: Phase,
    open: Option<OpenSection>,
    closed: Vec<Section>,
    warnings: Vec<ParseWarning>,
}

/// Sections found in a statement plus the warnings raised while closing them.
#[derive(Debug, Clone, Default)]
pub struct SectionScan {
    pub sections: Vec<Section>,
    pub warnings: Vec<ParseWarning>,
}

impl Default for ScanState {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanState {
    pub fn new() -> Self {
        ScanState {
            phase: Phase::SeekingStart,
            open: None,
            closed: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn is_scanning(&self) -> bool {
        self.phase == Phase::Scanning
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    /// Start scanning on the first page whose text holds the start marker.
    pub fn enter_page(mut self, page: &PageContent, template: &Template) -> Self {
        if self.phase == Phase::SeekingStart && page.text().contains(&template.start_marker) {
            tracing::debug!(
                page = page.page_index + 1,
                marker = %template.start_marker,
                "start marker found"
            );
            self.phase = Phase::Scanning;
        }
        self
    }

    /// Feed one line; returns the new state and how the line was classified.
    pub fn step(mut self, page: usize, line: &Line, template: &Template) -> (Self, LineClass) {
        if self.phase != Phase::Scanning {
            return (self, LineClass::Ignored);
        }

        let class = classify_line(
            template,
            self.open.as_ref().map(|s| s.name.as_str()),
            line,
        );

        match &class {
            LineClass::EndMarker => {
                if let Some(open) = self.open.take() {
                    self.close_fallback(open, Closure::EndMarker, &line.text);
                }
                tracing::debug!(page = page + 1, line = %line.text, "end marker reached");
                self.phase = Phase::Done;
            }
            LineClass::Header(name) => {
                if let Some(open) = self.open.take() {
                    self.close_fallback(open, Closure::NextHeader, &line.text);
                }
                tracing::debug!(page = page + 1, name = %name, "section opened");
                self.open = Some(OpenSection {
                    name: name.clone(),
                    start_page: page,
                    start_rect: line.rect,
                    detail_rects: Vec::new(),
                });
            }
            LineClass::Total(_) => {
                if let Some(open) = self.open.take() {
                    tracing::debug!(page = page + 1, name = %open.name, "section closed by total");
                    self.closed.push(open.close_at(page, line.rect));
                }
            }
            LineClass::Detail => {
                if let Some(open) = self.open.as_mut() {
                    open.detail_rects.push((page, line.rect));
                }
            }
            LineClass::Ignored | LineClass::Outside => {}
        }

        (self, class)
    }

    /// Close any open section and hand back the scan result.
    pub fn finish(mut self, template: &Template) -> Result<SectionScan, ConsumoError> {
        if self.phase == Phase::SeekingStart {
            return Err(ConsumoError::StartMarkerNotFound {
                marker: template.start_marker.clone(),
            });
        }

        if let Some(open) = self.open.take() {
            self.close_fallback(open, Closure::EndOfDocument, "end of document");
        }

        Ok(SectionScan {
            sections: self.closed,
            warnings: self.warnings,
        })
    }

    fn close_fallback(&mut self, open: OpenSection, closure: Closure, cause: &str) {
        let message = format!(
            "section for '{}' starting on page {} has no total line; closed at '{}'",
            open.name,
            open.start_page + 1,
            cause.trim()
        );
        tracing::warn!("{message}");
        self.warnings.push(ParseWarning {
            page_index: Some(open.start_page),
            message,
        });
        self.closed.push(open.close_fallback(closure));
    }
}

/// Classify a line in priority order: end marker, header, total, detail.
pub fn classify_line(template: &Template, open_name: Option<&str>, line: &Line) -> LineClass {
    if template.is_end_marker(&line.text, line.rect.y0) {
        return LineClass::EndMarker;
    }

    if let Some(name) = match_header(template, &line.text) {
        return LineClass::Header(name);
    }

    match open_name {
        Some(name) if is_total_for(template, &line.text, name) => {
            LineClass::Total(name.to_string())
        }
        Some(_) => LineClass::Detail,
        None => LineClass::Outside,
    }
}

/// Extract the normalized person name from a section header line.
pub fn match_header(template: &Template, text: &str) -> Option<String> {
    let caps = template.header_pattern.captures(text)?;
    let name = normalize_name(caps.get(1)?.as_str());
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// True if the line is the total line for `name`: the total label followed by
/// exactly that name (case and spacing ignored) and then a non-letter.
pub fn is_total_for(template: &Template, text: &str, name: &str) -> bool {
    let text = normalize_name(text);
    let label = normalize_name(&template.total_label);
    let name = normalize_name(name);

    text.strip_prefix(&label)
        .map(str::trim_start)
        .and_then(|rest| rest.strip_prefix(name.as_str()))
        .is_some_and(|after| after.chars().next().map_or(true, |c| !c.is_alphabetic()))
}

/// Run the section detector over a whole document.
pub fn detect_sections(
    pages: &[PageContent],
    template: &Template,
) -> Result<SectionScan, ConsumoError> {
    pages
        .iter()
        .fold(ScanState::new(), |state, page| {
            if state.is_done() {
                return state;
            }
            let state = state.enter_page(page, template);
            if !state.is_scanning() {
                return state;
            }
            group_lines(&page.tokens)
                .iter()
                .fold(state, |state, line| {
                    state.step(page.page_index, line, template).0
                })
        })
        .finish(template)
}
