pub mod sample_loader;

pub use sample_loader::{
    CutLine, LoadedPage, PagePair, angle_for, cut_line, cut_page, load_page,
};
