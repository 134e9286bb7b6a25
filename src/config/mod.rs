pub mod settings;

use settings::Settings;
use std::path::Path;

/// Load settings from an explicit file, or fall back to `settings.yaml`
/// next to the first input when no file is given.
///
/// A missing `settings.yaml` yields the default settings.
pub fn load_settings(explicit: Option<&Path>, first_input: &Path) -> crate::error::Result<Settings> {
    if let Some(path) = explicit {
        return Settings::from_file(path);
    }

    let dir = first_input
        .parent()
        .ok_or_else(|| crate::error::LineCutError::config("Cannot determine input directory"))?;

    let settings_path = dir.join("settings.yaml");

    if settings_path.exists() {
        Settings::from_file(&settings_path)
    } else {
        Ok(Settings::default())
    }
}
