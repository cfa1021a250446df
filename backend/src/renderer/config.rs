use json::object;

use crate::data::prelude::*;

/// Back layer decorations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Guides {
    pub frame_origin: bool,
    pub frame_grid: bool,
    pub grid_size: f32,
    pub show_guide: bool,
}

impl Default for Guides {
    fn default() -> Self {
        Self {
            frame_origin: false,
            frame_grid: false,
            grid_size: 10.0,
            show_guide: true,
        }
    }
}

/// Persisted renderer settings: the view and its guides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RendererConfig {
    pub center: ScreenVector,
    pub scale: f32,
    pub guides: Guides,
}

impl Default for RendererConfig {
    fn default() -> Self {
        let view = ViewData::default();
        Self {
            center: view.center,
            scale: view.scale,
            guides: Guides::default(),
        }
    }
}

impl RendererConfig {
    pub const FILE_NAME: &'static str = "vis.renderer.json";

    pub fn to_json(&self) -> json::JsonValue {
        object!{
            view: {
                center_x: self.center.x,
                center_y: self.center.y,
                scale: self.scale,
            },
            frame_origin: self.guides.frame_origin,
            frame_grid: self.guides.frame_grid,
            grid_size: self.guides.grid_size,
            show_guide: self.guides.show_guide,
        }
    }

    pub fn from_json(data: &json::JsonValue) -> anyhow::Result<Self> {
        use json::JsonError::WrongType;
        let number = |value: &json::JsonValue, key: &str| {
            value.as_f32().ok_or_else(|| WrongType(format!("`{}` should be a number", key)))
        };
        let flag = |key: &str| {
            data[key].as_bool().ok_or_else(|| WrongType(format!("`{}` should be a boolean", key)))
        };

        let scale = number(&data["view"]["scale"], "view.scale")?;
        if !is_valid_scale(scale) {
            anyhow::bail!("view scale must lie in {}..={}, found {}", MIN_SCALE, MAX_SCALE, scale);
        }
        Ok(Self {
            center: ScreenVector::new(
                number(&data["view"]["center_x"], "view.center_x")?,
                number(&data["view"]["center_y"], "view.center_y")?,
            ),
            scale,
            guides: Guides {
                frame_origin: flag("frame_origin")?,
                frame_grid: flag("frame_grid")?,
                grid_size: number(&data["grid_size"], "grid_size")?,
                // Older files have no `show_guide`.
                show_guide: data["show_guide"].as_bool().unwrap_or(true),
            },
        })
    }

    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        Self::from_json(&json::parse(std::fs::read_to_string(path)?.as_str())?)
    }

    pub fn save(&self, path: &std::path::Path) -> anyhow::Result<()> {
        std::fs::write(path, self.to_json().pretty(4))?;
        log::info!("saved renderer settings to {}", path.display());
        Ok(())
    }

    /// Falls back to defaults when the file is missing or malformed.
    pub fn load_or_default(path: &std::path::Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("using default renderer settings, `{}` not loaded: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod test_config {
    use super::*;

    #[test]
    fn test_json_keys() {
        let config = RendererConfig {
            center: ScreenVector::new(12.5, -3.0),
            scale: 2.0,
            guides: Guides { frame_grid: true, grid_size: 5.0, ..Guides::default() },
        };
        let data = config.to_json();

        assert_eq!(data["view"]["center_x"].as_f32(), Some(12.5));
        assert_eq!(data["frame_grid"].as_bool(), Some(true));
        assert_eq!(RendererConfig::from_json(&data).unwrap(), config);
    }

    #[test]
    fn test_rejects_bad_values() {
        let data = json::parse(r#"{ "view": { "center_x": 0, "center_y": 0, "scale": 0 },
            "frame_origin": false, "frame_grid": false, "grid_size": 10 }"#).unwrap();
        assert!(RendererConfig::from_json(&data).is_err());

        let data = json::parse(r#"{ "view": { "center_x": 0, "center_y": 0, "scale": 1e-40 },
            "frame_origin": false, "frame_grid": true, "grid_size": 10 }"#).unwrap();
        assert!(RendererConfig::from_json(&data).is_err());

        let data = json::parse(r#"{ "view": { "center_x": 0, "center_y": 0, "scale": 1 },
            "frame_origin": "yes", "frame_grid": false, "grid_size": 10 }"#).unwrap();
        assert!(RendererConfig::from_json(&data).is_err());
    }

    #[test]
    fn test_missing_show_guide_defaults_on() {
        let data = json::parse(r#"{ "view": { "center_x": 1, "center_y": 2, "scale": 3 },
            "frame_origin": true, "frame_grid": false, "grid_size": 10 }"#).unwrap();
        let config = RendererConfig::from_json(&data).unwrap();
        assert!(config.guides.show_guide);
        assert!(config.guides.frame_origin);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let path = std::env::temp_dir().join("vis-renderer-missing.json");
        let _ = std::fs::remove_file(&path);
        assert_eq!(RendererConfig::load_or_default(&path), RendererConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("vis-renderer-{}.json", std::process::id()));
        let config = RendererConfig { scale: 4.0, ..RendererConfig::default() };
        config.save(&path).unwrap();
        assert_eq!(RendererConfig::load(&path).unwrap(), config);
        std::fs::remove_file(&path).unwrap();
    }
}
