// Phase 5: 予測の書き戻し: 行に予測テキストを付与し、ストリームが次のページへ進んだ時点で一度だけ書き出す

pub mod store;

use std::collections::{HashMap, HashSet};

use crate::error::{LineCutError, Result};
use crate::layout::Page;

pub use store::{FsPageStore, MemoryPageStore, PageStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerState {
    Idle,
    Accumulating(String),
}

/// Owns every page that may still receive predictions.
///
/// Predictions must arrive grouped by page. A page is serialized and released
/// as soon as a prediction for a different page arrives, or on [`finish`].
/// A page whose write fails stays held and is written again by the next
/// flush.
/// A prediction for a page that was already flushed is rejected, which makes
/// an interleaved stream detectable instead of silently losing text.
///
/// [`finish`]: WriteBackTracker::finish
pub struct WriteBackTracker<S: PageStore> {
    pages: HashMap<String, Page>,
    flushed: HashSet<String>,
    state: TrackerState,
    text_index: i32,
    store: S,
}

impl<S: PageStore> WriteBackTracker<S> {
    pub fn new(text_index: i32, store: S) -> Self {
        WriteBackTracker {
            pages: HashMap::new(),
            flushed: HashSet::new(),
            state: TrackerState::Idle,
            text_index,
            store,
        }
    }

    /// Take ownership of a loaded page.
    pub fn add_page(&mut self, page: Page) {
        self.flushed.remove(page.id());
        self.pages.insert(page.id().to_string(), page);
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn page(&self, page_id: &str) -> Option<&Page> {
        self.pages.get(page_id)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Attach `text` to line `line_id` of page `page_id`.
    pub fn store_prediction(&mut self, page_id: &str, line_id: &str, text: &str) -> Result<()> {
        if self.flushed.contains(page_id) {
            return Err(LineCutError::write_back(format!(
                "Prediction for page '{page_id}' arrived after the page was flushed; \
                 predictions must be grouped by page"
            )));
        }
        let page = self
            .pages
            .get_mut(page_id)
            .ok_or_else(|| LineCutError::write_back(format!("Unknown page '{page_id}'")))?;
        page.set_transcription(line_id, self.text_index, text)?;

        if let TrackerState::Accumulating(current) = &self.state {
            if current != page_id {
                let previous = current.clone();
                // State moves on only after the previous page is stored.
                self.flush_page(&previous)?;
            }
        }
        self.state = TrackerState::Accumulating(page_id.to_string());
        Ok(())
    }

    /// Same as [`store_prediction`](Self::store_prediction) for a `page/line` sample id.
    pub fn store_sample_prediction(&mut self, sample_id: &str, text: &str) -> Result<()> {
        let (page_id, line_id) = sample_id.rsplit_once('/').ok_or_else(|| {
            LineCutError::write_back(format!("Invalid sample id '{sample_id}'"))
        })?;
        self.store_prediction(page_id, line_id, text)
    }

    /// End of stream: flush the page currently tracked, if any, and go idle.
    pub fn finish(&mut self) -> Result<()> {
        if let TrackerState::Accumulating(current) = &self.state {
            let current = current.clone();
            self.flush_page(&current)?;
        }
        self.state = TrackerState::Idle;
        Ok(())
    }

    /// Flush every page still held, for runs that did not predict sequentially.
    pub fn flush_all(&mut self) -> Result<()> {
        let mut ids: Vec<String> = self.pages.keys().cloned().collect();
        ids.sort();
        for id in ids {
            self.flush_page(&id)?;
        }
        self.state = TrackerState::Idle;
        Ok(())
    }

    fn flush_page(&mut self, page_id: &str) -> Result<()> {
        let Some(page) = self.pages.get(page_id) else {
            return Ok(());
        };
        let xml = page.to_xml()?;
        self.store.store_page(page, &xml)?;
        self.pages.remove(page_id);
        self.flushed.insert(page_id.to_string());
        tracing::debug!(page = page_id, "flushed page");
        Ok(())
    }
}
