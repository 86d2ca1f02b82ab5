//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::OceanMapError;
use crate::settings::MapSettings;
use crate::tile_source::Attribution;

/// Static configuration of the engine, usually loaded once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OceanMapConfig {
    /// Base URL of the data server API, without trailing slash.
    pub api_base_url: String,
    /// Size of a tile side in pixels.
    pub tile_size: u32,
    /// Distance in pixels within which a pointer event hits a feature.
    pub hit_tolerance_px: f64,
    /// Settings the map starts with.
    pub settings: MapSettings,
    /// Attribution shown for the server-rendered base map.
    pub attribution: Option<Attribution>,
}

impl OceanMapConfig {
    /// Parses the configuration from JSON. Missing fields take default values.
    pub fn from_json(json: &str) -> Result<Self, OceanMapError> {
        let mut config: Self = serde_json::from_str(json)?;
        config.api_base_url = config.api_base_url.trim_end_matches('/').to_string();
        if config.tile_size == 0 {
            log::warn!("Tile size of 0 in configuration, using default");
            config.tile_size = Self::default().tile_size;
        }

        Ok(config)
    }
}

impl Default for OceanMapConfig {
    fn default() -> Self {
        Self {
            api_base_url: "/api/v2.0".to_string(),
            tile_size: 256,
            hit_tolerance_px: 5.0,
            settings: MapSettings::default(),
            attribution: None,
        }
    }
}
