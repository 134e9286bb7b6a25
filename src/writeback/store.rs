use std::path::PathBuf;

use crate::error::Result;
use crate::layout::Page;
use crate::paths::with_all_ext;

/// Destination for flushed pages.
pub trait PageStore {
    fn store_page(&mut self, page: &Page, xml: &str) -> Result<()>;
}

/// Writes `<page id><extension>`, optionally redirected into `output_dir`.
#[derive(Debug, Clone)]
pub struct FsPageStore {
    extension: String,
    output_dir: Option<PathBuf>,
}

impl FsPageStore {
    pub fn new(extension: impl Into<String>) -> Self {
        FsPageStore {
            extension: extension.into(),
            output_dir: None,
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn path_for(&self, page_id: &str) -> PathBuf {
        let target = with_all_ext(std::path::Path::new(page_id), &self.extension);
        match (&self.output_dir, target.file_name()) {
            (Some(dir), Some(name)) => dir.join(name),
            _ => target,
        }
    }
}

impl PageStore for FsPageStore {
    fn store_page(&mut self, page: &Page, xml: &str) -> Result<()> {
        let path = self.path_for(page.id());
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, xml)?;
        tracing::info!(page = page.id(), path = %path.display(), "wrote page");
        Ok(())
    }
}

/// Keeps flushed pages in memory, in flush order.
#[derive(Debug, Default, Clone)]
pub struct MemoryPageStore {
    pub flushed: Vec<(String, String)>,
}

impl PageStore for MemoryPageStore {
    fn store_page(&mut self, page: &Page, xml: &str) -> Result<()> {
        self.flushed.push((page.id().to_string(), xml.to_string()));
        Ok(())
    }
}
