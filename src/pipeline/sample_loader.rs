// Phase 4: ページ単位処理: (画像, レイアウト) 読込 -> 行サンプル -> 並列切り出し

use std::path::{Path, PathBuf};

use image::DynamicImage;
use rayon::prelude::*;

use crate::config::settings::Settings;
use crate::cutter::{AngleSpec, cutout_dynamic, normalize_page, pad_dynamic};
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::{LineCutError, Result};
use crate::layout::{ExtractorOptions, LineSample, Page, extract_samples};
use crate::paths::with_all_ext;

/// An image paired with its layout document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagePair {
    pub image: Option<PathBuf>,
    pub layout: PathBuf,
}

impl PagePair {
    /// Pair an image with the layout file next to it (`gt_extension`).
    pub fn for_image(image: &Path, gt_extension: &str) -> Self {
        PagePair {
            image: Some(image.to_path_buf()),
            layout: with_all_ext(image, gt_extension),
        }
    }
}

/// A parsed page with its samples and, when needed, its decoded image.
pub struct LoadedPage {
    pub page: Page,
    pub samples: Vec<LineSample>,
    pub image: Option<DynamicImage>,
}

/// One sample with its cut line image (`None` when images are not needed).
#[derive(Debug, Clone)]
pub struct CutLine {
    pub sample: LineSample,
    pub image: Option<DynamicImage>,
}

/// Load a page pair. Returns `Ok(None)` when the layout document is missing
/// and `skip_invalid` allows skipping it.
pub fn load_page<S>(pair: &PagePair, settings: &Settings, sink: &mut S) -> Result<Option<LoadedPage>>
where
    S: DiagnosticSink + ?Sized,
{
    if !pair.layout.exists() {
        if settings.skip_invalid {
            sink.report(Diagnostic::MissingDocument {
                path: pair.layout.clone(),
            });
            return Ok(None);
        }
        return Err(LineCutError::MissingDocument(pair.layout.clone()));
    }

    let page = Page::load(&pair.layout)?;
    let samples = extract_samples(
        &page,
        pair.image.as_deref(),
        ExtractorOptions::from(settings),
        sink,
    )?
    .collect::<Result<Vec<_>>>()?;

    let image = match (&pair.image, settings.mode.requires_images()) {
        (Some(path), true) => Some(image::open(path)?),
        (None, true) => {
            return Err(LineCutError::config(format!(
                "Mode {:?} needs the page image for '{}'",
                settings.mode,
                pair.layout.display()
            )));
        }
        (_, false) => None,
    };

    tracing::debug!(page = page.id(), lines = samples.len(), "loaded page");
    Ok(Some(LoadedPage {
        page,
        samples,
        image,
    }))
}

/// Rotation to apply to a line: the region orientation when it is a real
/// rotation, otherwise the automatic estimate if enabled.
pub fn angle_for(sample: &LineSample, settings: &Settings) -> AngleSpec {
    let orientation = sample.orientation;
    if orientation != 0.0 && orientation % 360.0 != 0.0 {
        AngleSpec::Fixed(orientation)
    } else if settings.max_auto_angle > 0.0 {
        AngleSpec::Auto {
            max_angle: settings.max_auto_angle,
        }
    } else {
        AngleSpec::Fixed(0.0)
    }
}

/// Cut a single line out of its page image, padding it if configured.
pub fn cut_line(image: &DynamicImage, sample: &LineSample, settings: &Settings) -> DynamicImage {
    let line = cutout_dynamic(
        image,
        &sample.polygon,
        settings.cut_mode,
        angle_for(sample, settings),
        sample.scale_for(image.width()),
    );
    match settings.pad {
        Some(padding) if line.width() > 0 && line.height() > 0 => pad_dynamic(&line, padding),
        _ => line,
    }
}

/// Cut every line of a loaded page. The page is converted to gray or RGB
/// once, then lines are cut in parallel; output order follows the sample order.
pub fn cut_page(loaded: LoadedPage, settings: &Settings) -> (Page, Vec<CutLine>) {
    let LoadedPage {
        page,
        samples,
        image,
    } = loaded;

    let image = image.map(normalize_page);
    let lines: Vec<CutLine> = match &image {
        Some(image) => samples
            .into_par_iter()
            .map(|sample| {
                let line = cut_line(image, &sample, settings);
                CutLine {
                    sample,
                    image: Some(line),
                }
            })
            .collect(),
        None => samples
            .into_iter()
            .map(|sample| CutLine {
                sample,
                image: None,
            })
            .collect(),
    };
    (page, lines)
}
