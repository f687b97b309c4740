//! Host settings read from a settings document inside the pack
//!
//! The settings file is an ordinary packed resource holding pack markup; it
//! is streamed out of the archive and queried like any other metadata tree.
//! Absent keys keep their defaults. A TOML override layer lets developers
//! patch individual values without rebuilding the pack.

use crate::archive::Archive;
use crate::error::{PackError, Result};
use crate::markup::{self, IngestOptions};
use crate::metadata::{MetadataNode, NodeType, Value};
use serde::{Deserialize, Serialize};

/// Default name of the settings resource
pub const DEFAULT_SETTINGS_FILE: &str = "settings.sgml";

/// Settings consumed by the host application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// `Audio.Enabled`
    pub audio_enabled: bool,
    /// `General.Version`
    pub version: Option<String>,
    /// `General.Title`
    pub title: String,
    /// `Display.Width`
    pub width: u32,
    /// `Display.Height`
    pub height: u32,
    /// `Display.FOV`
    pub fov: f64,
    /// `Graphics.MipmapDefault`
    pub mipmap_default: bool,
    /// `Script.Startup`
    pub startup_script: String,
    /// `Script.Path`
    pub script_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            audio_enabled: true,
            version: None,
            title: "Untitled".to_string(),
            width: 640,
            height: 480,
            fov: 60.0,
            mipmap_default: false,
            startup_script: "script/main.py".to_string(),
            script_path: "script".to_string(),
        }
    }
}

/// Partial settings used by the TOML override layer
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsOverrides {
    audio_enabled: Option<bool>,
    version: Option<String>,
    title: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    fov: Option<f64>,
    mipmap_default: Option<bool>,
    startup_script: Option<String>,
    script_path: Option<String>,
}

impl Settings {
    /// Stream and parse the settings resource `file` out of `archive`
    pub fn load(archive: &mut Archive, file: &str) -> Result<Self> {
        let stream = archive.stream(file)?;
        let size = stream.size();
        let document = markup::ingest_with(stream, size, &IngestOptions::for_source(file))?;

        let body = document.body().ok_or_else(|| {
            PackError::InvalidFormat(format!("settings file `{}` has no <root> element", file))
        })?;

        Ok(Self::from_tree(body))
    }

    /// Read settings from an already ingested `root` element
    pub fn from_tree(body: &MetadataNode) -> Self {
        let mut settings = Self::default();

        if let Some(v) = integer(body, &["Audio", "Enabled"]) {
            settings.audio_enabled = v != 0;
        }
        if let Some(v) = string(body, &["General", "Version"]) {
            settings.version = Some(v);
        }
        if let Some(v) = string(body, &["General", "Title"]) {
            settings.title = v;
        }
        if let Some(v) = dimension(body, &["Display", "Width"]) {
            settings.width = v;
        }
        if let Some(v) = dimension(body, &["Display", "Height"]) {
            settings.height = v;
        }
        if let Some(v) = float(body, &["Display", "FOV"]) {
            settings.fov = v;
        }
        if let Some(v) = integer(body, &["Graphics", "MipmapDefault"]) {
            settings.mipmap_default = v != 0;
        }
        if let Some(v) = string(body, &["Script", "Startup"]) {
            settings.startup_script = v;
        }
        if let Some(v) = string(body, &["Script", "Path"]) {
            settings.script_path = v;
        }

        settings
    }

    /// Merge a partial TOML table over these settings
    ///
    /// Keys use the field names of [`Settings`]; unknown keys are rejected.
    pub fn apply_overrides_toml(&mut self, text: &str) -> Result<()> {
        let overrides: SettingsOverrides = toml::from_str(text)?;

        if let Some(v) = overrides.audio_enabled {
            self.audio_enabled = v;
        }
        if let Some(v) = overrides.version {
            self.version = Some(v);
        }
        if let Some(v) = overrides.title {
            self.title = v;
        }
        if let Some(v) = overrides.width {
            self.width = v;
        }
        if let Some(v) = overrides.height {
            self.height = v;
        }
        if let Some(v) = overrides.fov {
            self.fov = v;
        }
        if let Some(v) = overrides.mipmap_default {
            self.mipmap_default = v;
        }
        if let Some(v) = overrides.startup_script {
            self.startup_script = v;
        }
        if let Some(v) = overrides.script_path {
            self.script_path = v;
        }

        Ok(())
    }
}

fn integer(body: &MetadataNode, path: &[&str]) -> Option<i64> {
    body.lookup_typed_checked(path, NodeType::Integer)
        .ok()
        .and_then(Value::as_integer)
}

fn float(body: &MetadataNode, path: &[&str]) -> Option<f64> {
    body.lookup_typed_checked(path, NodeType::Float)
        .ok()
        .and_then(Value::as_float)
}

fn string(body: &MetadataNode, path: &[&str]) -> Option<String> {
    body.lookup_typed_checked(path, NodeType::String)
        .ok()
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn dimension(body: &MetadataNode, path: &[&str]) -> Option<u32> {
    let v = integer(body, path)?;
    match u32::try_from(v) {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("Ignoring out of range value {} for `{}`", v, path.join("."));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::ingest_str;

    const SETTINGS: &str = r#"
<root>
    <item name="General">
        <item name="Title" type="String">Forest Demo</item>
        <item name="Version" type="String">1.2</item>
    </item>
    <item name="Display">
        <item name="Width" type="Integer">1280</item>
        <item name="Height" type="String">tall</item>
        <item name="FOV" type="Float">90.5</item>
    </item>
    <item name="Audio">
        <item name="Enabled" type="Integer">0</item>
    </item>
</root>
"#;

    #[test]
    fn test_from_tree() {
        let doc = ingest_str(SETTINGS).unwrap();
        let settings = Settings::from_tree(doc.body().unwrap());

        assert_eq!(settings.title, "Forest Demo");
        assert_eq!(settings.version.as_deref(), Some("1.2"));
        assert_eq!(settings.width, 1280);
        assert_eq!(settings.height, 480, "wrong-typed value keeps default");
        assert_eq!(settings.fov, 90.5);
        assert!(!settings.audio_enabled);
        assert_eq!(settings.startup_script, "script/main.py", "missing key keeps default");
    }

    #[test]
    fn test_negative_dimension_ignored() {
        let doc = ingest_str(
            r#"<root><item name="Display"><item name="Width" type="Integer">-5</item></item></root>"#,
        )
        .unwrap();
        assert_eq!(Settings::from_tree(doc.body().unwrap()).width, 640);
    }

    #[test]
    fn test_toml_overrides() {
        let mut settings = Settings::default();
        settings
            .apply_overrides_toml("width = 1920\ntitle = \"Debug\"\nmipmap_default = true\n")
            .unwrap();

        assert_eq!(settings.width, 1920);
        assert_eq!(settings.title, "Debug");
        assert!(settings.mipmap_default);
        assert_eq!(settings.height, 480);

        let err = settings.apply_overrides_toml("colour = \"blue\"").unwrap_err();
        assert!(matches!(err, PackError::TomlError(_)));
    }
}
