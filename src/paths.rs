use std::path::{Path, PathBuf};

/// Split a path into everything before the first `.` of its file name and
/// the full (possibly multi-part) extension: `a/b.pred.xml` -> (`a/b`, `.pred.xml`).
///
/// A leading dot (hidden file) is not treated as an extension separator.
pub fn split_all_ext(path: &Path) -> (PathBuf, String) {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return (path.to_path_buf(), String::new());
    };
    match name.char_indices().skip(1).find(|&(_, c)| c == '.') {
        Some((pos, _)) => (path.with_file_name(&name[..pos]), name[pos..].to_string()),
        None => (path.to_path_buf(), String::new()),
    }
}

/// Path with all extensions replaced by `extension`.
pub fn with_all_ext(path: &Path, extension: &str) -> PathBuf {
    let (base, _) = split_all_ext(path);
    let mut s = base.into_os_string();
    s.push(extension);
    PathBuf::from(s)
}

/// Whether `image_path` (extensions stripped) ends with the declared image
/// filename (extensions stripped).
pub fn image_matches_declared(image_path: &Path, declared: &str) -> bool {
    let (image_base, _) = split_all_ext(image_path);
    let (declared_base, _) = split_all_ext(Path::new(declared));
    image_base
        .to_string_lossy()
        .ends_with(declared_base.to_string_lossy().as_ref())
}

/// Whether `name` can be joined onto a directory without leaving it:
/// a single normal path component.
pub fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(std::path::Component::Normal(part)), None) if part == name
    )
}
