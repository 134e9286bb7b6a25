pub mod extractor;
pub mod page;
pub mod xml;

pub use extractor::{ExtractorOptions, LineSample, LineSamples, extract_samples};
pub use page::Page;
