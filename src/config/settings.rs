use std::path::{Path, PathBuf};

use serde::Deserialize;

/// How the boundary of a cut line is shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CutMode {
    /// Axis-aligned rectangle around the polygon.
    #[serde(alias = "BOX")]
    Box,
    /// Exact polygon mask.
    #[serde(alias = "POLYGON")]
    Polygon,
    /// Minimum-area (rotated) bounding rectangle used as mask.
    #[serde(alias = "MBR")]
    Mbr,
}

/// Which stage of the recognition pipeline the samples are read for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineMode {
    Training,
    Evaluation,
    Prediction,
    /// Ground truth only, no images.
    Targets,
}

impl PipelineMode {
    /// Whether transcriptions are read from the layout document.
    pub fn requires_ground_truth(self) -> bool {
        matches!(
            self,
            PipelineMode::Training | PipelineMode::Evaluation | PipelineMode::Targets
        )
    }

    /// Whether line images are cut from the page image.
    pub fn requires_images(self) -> bool {
        matches!(
            self,
            PipelineMode::Training | PipelineMode::Evaluation | PipelineMode::Prediction
        )
    }

    /// Whether empty transcriptions are dropped (a zero-length target cannot be aligned).
    pub fn drops_empty_text(self) -> bool {
        matches!(self, PipelineMode::Training | PipelineMode::Evaluation)
    }
}

/// Constant padding added around a cut line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Vec<u32>")]
pub struct Padding {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

impl Padding {
    pub fn uniform(px: u32) -> Self {
        Padding {
            top: px,
            bottom: px,
            left: px,
            right: px,
        }
    }
}

impl TryFrom<Vec<u32>> for Padding {
    type Error = String;

    /// 1 value: every side. 2 values: before/after on both axes.
    /// 4 values: top, bottom, left, right.
    fn try_from(values: Vec<u32>) -> Result<Self, Self::Error> {
        match values.as_slice() {
            [all] => Ok(Padding::uniform(*all)),
            [before, after] => Ok(Padding {
                top: *before,
                bottom: *after,
                left: *before,
                right: *after,
            }),
            [top, bottom, left, right] => Ok(Padding {
                top: *top,
                bottom: *bottom,
                left: *left,
                right: *right,
            }),
            other => Err(format!(
                "pad expects 1, 2 or 4 values, got {}",
                other.len()
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub mode: PipelineMode,
    pub text_index: i32,
    pub skip_invalid: bool,
    pub non_existing_as_empty: bool,
    pub skip_commented: bool,
    pub cut_mode: CutMode,
    pub pad: Option<Padding>,
    pub max_auto_angle: f64,
    pub gt_extension: String,
    pub pred_extension: String,
    pub output_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            mode: PipelineMode::Prediction,
            text_index: 0,
            skip_invalid: true,
            non_existing_as_empty: false,
            skip_commented: false,
            cut_mode: CutMode::Polygon,
            pad: None,
            max_auto_angle: 0.0,
            gt_extension: ".xml".to_string(),
            pred_extension: ".pred.xml".to_string(),
            output_dir: None,
        }
    }
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        let settings: Settings = serde_yml::from_str(yaml).map_err(|e| {
            crate::error::LineCutError::config(format!("Failed to parse settings YAML: {e}"))
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    fn validate(&self) -> crate::error::Result<()> {
        if !self.max_auto_angle.is_finite() || self.max_auto_angle < 0.0 {
            return Err(crate::error::LineCutError::config(format!(
                "max_auto_angle must be a non-negative number, got {}",
                self.max_auto_angle
            )));
        }
        if self.gt_extension.is_empty() || self.pred_extension.is_empty() {
            return Err(crate::error::LineCutError::config(
                "gt_extension and pred_extension must not be empty",
            ));
        }
        if self.gt_extension == self.pred_extension {
            return Err(crate::error::LineCutError::config(
                "pred_extension must differ from gt_extension",
            ));
        }
        Ok(())
    }
}
