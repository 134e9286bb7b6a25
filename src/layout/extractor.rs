// Phase 3: レイアウト抽出: TextLine ごとに LineSample を文書順で生成

use std::path::{Path, PathBuf};

use super::page::Page;
use super::xml::NodeId;
use crate::config::settings::{PipelineMode, Settings};
use crate::diagnostics::{Diagnostic, DiagnosticSink, SkipReason};
use crate::error::{LineCutError, Result};
use crate::geometry::LayoutPolygon;
use crate::paths::image_matches_declared;

/// Options controlling which lines become samples and how text is resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractorOptions {
    pub mode: PipelineMode,
    pub text_index: i32,
    pub skip_invalid: bool,
    pub non_existing_as_empty: bool,
    pub skip_commented: bool,
}

impl From<&Settings> for ExtractorOptions {
    fn from(settings: &Settings) -> Self {
        ExtractorOptions {
            mode: settings.mode,
            text_index: settings.text_index,
            skip_invalid: settings.skip_invalid,
            non_existing_as_empty: settings.non_existing_as_empty,
            skip_commented: settings.skip_commented,
        }
    }
}

/// One text line of a page, ready for cutting.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSample {
    pub page_id: String,
    pub line_id: String,
    /// `type` attribute of the enclosing region, empty when absent.
    pub region_type: String,
    /// Raw layout coordinates, not yet scaled to the image.
    pub polygon: LayoutPolygon,
    /// Clockwise skew correction of the enclosing region, in degrees.
    pub orientation: f64,
    /// `None` when not read or absent; `Some("")` for an empty transcription.
    pub text: Option<String>,
    pub image_path: Option<PathBuf>,
    /// Declared page width the coordinates refer to.
    pub page_width: u32,
}

impl LineSample {
    pub fn sample_id(&self) -> String {
        format!("{}/{}", self.page_id, self.line_id)
    }

    /// Factor mapping layout coordinates onto an image `actual_width` pixels wide.
    pub fn scale_for(&self, actual_width: u32) -> f64 {
        f64::from(actual_width) / f64::from(self.page_width)
    }
}

/// Lazy, one-shot sequence of [`LineSample`]s for one page.
pub struct LineSamples<'a, S: DiagnosticSink + ?Sized> {
    page: &'a Page,
    lines: std::slice::Iter<'a, NodeId>,
    options: ExtractorOptions,
    image_path: Option<PathBuf>,
    page_width: u32,
    sink: &'a mut S,
}

/// Start extracting the samples of `page`.
///
/// Fails up front when the page lacks a usable `imageWidth`. A mismatch
/// between `image_path` and the declared image filename is only reported.
pub fn extract_samples<'a, S>(
    page: &'a Page,
    image_path: Option<&Path>,
    options: ExtractorOptions,
    sink: &'a mut S,
) -> Result<LineSamples<'a, S>>
where
    S: DiagnosticSink + ?Sized,
{
    let page_width = page.image_width()?;

    if let (Some(image_path), Some(declared)) = (image_path, page.image_filename()) {
        if !image_matches_declared(image_path, declared) {
            sink.report(Diagnostic::ImageFilenameMismatch {
                image_path: image_path.to_path_buf(),
                declared: declared.to_string(),
            });
        }
    }

    Ok(LineSamples {
        page,
        lines: page.text_lines().iter(),
        options,
        image_path: image_path.map(Path::to_path_buf),
        page_width,
        sink,
    })
}

impl<S: DiagnosticSink + ?Sized> LineSamples<'_, S> {
    /// Build the sample for one line, `Ok(None)` when the line is skipped.
    fn sample_for(&mut self, line: NodeId) -> Result<Option<LineSample>> {
        let page = self.page;
        let doc = page.document();
        let page_id = page.id();
        let line_id = doc.attribute(line, "id").unwrap_or_default().to_string();

        let commented = doc.attribute(line, "comments").is_some_and(|c| !c.is_empty());
        if self.options.skip_commented && commented {
            self.skip(&line_id, SkipReason::Commented);
            return Ok(None);
        }

        let region = doc.parent(line);
        let region_type = region
            .and_then(|r| doc.attribute(r, "type"))
            .unwrap_or_default()
            .to_string();
        let orientation = match region.and_then(|r| doc.attribute(r, "orientation")) {
            Some(raw) => raw.trim().parse::<f64>().map_err(|_| {
                LineCutError::layout(format!(
                    "Invalid orientation '{raw}' for line '{line_id}' on page '{page_id}'"
                ))
            })?,
            None => 0.0,
        };

        // Lines skipped for their text need no Coords.
        let text = if self.options.mode.requires_ground_truth() {
            match self.resolve_text(line, &line_id)? {
                Some(text) => Some(text),
                None => return Ok(None),
            }
        } else {
            None
        };

        let points = doc
            .first_child_named(line, "Coords")
            .and_then(|c| doc.attribute(c, "points"))
            .ok_or_else(|| {
                LineCutError::layout(format!(
                    "Line '{line_id}' on page '{page_id}' has no Coords points"
                ))
            })?;
        let polygon = LayoutPolygon::parse(points)?;

        Ok(Some(LineSample {
            page_id: page_id.to_string(),
            line_id,
            region_type,
            polygon,
            orientation,
            text,
            image_path: self.image_path.clone(),
            page_width: self.page_width,
        }))
    }

    /// Ground-truth text for a line; `Ok(None)` means the line is dropped.
    fn resolve_text(&mut self, line: NodeId, line_id: &str) -> Result<Option<String>> {
        let candidates = self
            .page
            .transcription_candidates(line, self.options.text_index);
        if candidates.len() > 1 {
            self.sink.report(Diagnostic::DuplicateTranscription {
                page_id: self.page.id().to_string(),
                line_id: line_id.to_string(),
                count: candidates.len(),
            });
        }

        let text = match candidates.first() {
            Some(&te) => self.page.transcription_text(te),
            None if self.options.skip_invalid => {
                self.skip(line_id, SkipReason::TextMissing);
                return Ok(None);
            }
            None if self.options.non_existing_as_empty => String::new(),
            None => {
                return Err(LineCutError::TextMissing {
                    page_id: self.page.id().to_string(),
                    line_id: line_id.to_string(),
                });
            }
        };

        if text.is_empty() && self.options.mode.drops_empty_text() {
            self.skip(line_id, SkipReason::EmptyText);
            return Ok(None);
        }
        Ok(Some(text))
    }

    fn skip(&mut self, line_id: &str, reason: SkipReason) {
        self.sink.report(Diagnostic::SkippedLine {
            page_id: self.page.id().to_string(),
            line_id: line_id.to_string(),
            reason,
        });
    }
}

impl<S: DiagnosticSink + ?Sized> Iterator for LineSamples<'_, S> {
    type Item = Result<LineSample>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(&line) = self.lines.next() {
            match self.sample_for(line) {
                Ok(Some(sample)) => return Some(Ok(sample)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}
