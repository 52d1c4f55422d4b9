use crate::overlay::settings::{DisappearancePolicy, OverlaySettings};
use anyhow::{Context, Result};
use std::path::Path;

pub const OVERLAY_SETTINGS_FILE_NAME: &str = "board_overlay.json";

/// Loads settings from `path`. A missing or blank file yields `None`, since
/// there is no default disappearance policy to fall back on.
pub fn load_from_path(path: &Path) -> Result<Option<OverlaySettings>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read overlay settings file {}", path.display()))?;

    if content.trim().is_empty() {
        return Ok(None);
    }

    let mut loaded: OverlaySettings = serde_json::from_str(&content)
        .with_context(|| format!("deserialize overlay settings file {}", path.display()))?;
    if loaded.sanitize() {
        tracing::warn!(path = %path.display(), "overlay settings contained unusable values");
    }
    Ok(Some(loaded))
}

/// Stored settings, or fresh defaults with `policy` when nothing is stored.
pub fn load_or_new(path: &Path, policy: DisappearancePolicy) -> Result<OverlaySettings> {
    Ok(load_from_path(path)?.unwrap_or_else(|| OverlaySettings::new(policy)))
}

pub fn save_to_path(path: &Path, settings: &OverlaySettings) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create overlay settings parent folder {}", parent.display()))?;
    }

    let mut sanitized = settings.clone();
    sanitized.sanitize();
    let json = serde_json::to_string_pretty(&sanitized).context("serialize overlay settings")?;
    std::fs::write(path, json)
        .with_context(|| format!("write overlay settings file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::{load_from_path, load_or_new, save_to_path, OVERLAY_SETTINGS_FILE_NAME};
    use crate::overlay::model::Orientation;
    use crate::overlay::settings::{DisappearancePolicy, OverlaySettings};

    #[test]
    fn load_or_new_prefers_stored_policy() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(OVERLAY_SETTINGS_FILE_NAME);
        let fresh = load_or_new(&path, DisappearancePolicy::Terminate).expect("fresh");
        assert_eq!(fresh, OverlaySettings::new(DisappearancePolicy::Terminate));

        save_to_path(&path, &OverlaySettings::new(DisappearancePolicy::Retain)).expect("save");
        let stored = load_or_new(&path, DisappearancePolicy::Terminate).expect("stored");
        assert_eq!(stored.disappearance, DisappearancePolicy::Retain);
    }

    #[test]
    fn load_returns_none_when_file_is_missing_or_blank() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(OVERLAY_SETTINGS_FILE_NAME);
        assert_eq!(load_from_path(&path).expect("load missing"), None);

        std::fs::write(&path, "  \n").expect("write blank");
        assert_eq!(load_from_path(&path).expect("load blank"), None);
    }

    #[test]
    fn store_roundtrip_serialization() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join(OVERLAY_SETTINGS_FILE_NAME);

        let mut settings = OverlaySettings::new(DisappearancePolicy::Retain);
        settings.grid_width = 10;
        settings.orientation = Orientation::Flipped;
        settings.arrow_style.line_width = 22.0;

        save_to_path(&path, &settings).expect("save settings");
        let loaded = load_from_path(&path).expect("load settings");
        assert_eq!(loaded, Some(settings));
    }

    #[test]
    fn load_sanitizes_unusable_values() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(OVERLAY_SETTINGS_FILE_NAME);
        std::fs::write(
            &path,
            r#"{"disappearance": "terminate", "poll_interval_ms": 0}"#,
        )
        .expect("write settings");

        let loaded = load_from_path(&path).expect("load").expect("settings present");
        assert_eq!(loaded.poll_interval_ms, 100);
    }

    #[test]
    fn malformed_file_reports_its_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(OVERLAY_SETTINGS_FILE_NAME);
        std::fs::write(&path, "{not json").expect("write settings");

        let err = load_from_path(&path).expect_err("malformed settings");
        assert!(format!("{err:#}").contains(OVERLAY_SETTINGS_FILE_NAME));
    }
}
