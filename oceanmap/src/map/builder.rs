use std::sync::Arc;

use super::OceanMap;
use crate::config::OceanMapConfig;
use crate::error::OceanMapError;
use crate::event::MapEventListener;
use crate::messenger::Messenger;
use crate::settings::{DatasetView, MapSettings};

/// Convenience type to initialize an [`OceanMap`].
///
/// ```
/// use oceanmap::settings::DatasetView;
/// use oceanmap::OceanMapBuilder;
///
/// let map = OceanMapBuilder::default()
///     .with_dataset(DatasetView::new("giops_day", "votemper"))
///     .with_messenger(|| println!("redraw"))
///     .build()
///     .unwrap();
///
/// assert!(!map.is_comparison_enabled());
/// ```
#[derive(Default)]
pub struct OceanMapBuilder {
    config: Option<OceanMapConfig>,
    settings: Option<MapSettings>,
    dataset: Option<DatasetView>,
    messenger: Option<Arc<dyn Messenger>>,
    listeners: Vec<Box<dyn MapEventListener>>,
}

impl OceanMapBuilder {
    /// Sets the engine configuration.
    ///
    /// Defaults to [`OceanMapConfig::default`].
    pub fn with_config(mut self, config: OceanMapConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the initial map settings.
    ///
    /// Defaults to the settings of the configuration.
    pub fn with_settings(mut self, settings: MapSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Sets the dataset of the primary surface.
    ///
    /// Without a dataset the map shows only the base map and overlays until
    /// [`OceanMap::set_dataset`] is called.
    pub fn with_dataset(mut self, dataset: DatasetView) -> Self {
        self.dataset = Some(dataset);
        self
    }

    /// Sets the messenger notified when the map needs to be redrawn.
    pub fn with_messenger(mut self, messenger: impl Messenger + 'static) -> Self {
        self.messenger = Some(Arc::new(messenger));
        self
    }

    /// Adds an event listener.
    pub fn with_listener(mut self, listener: impl MapEventListener + 'static) -> Self {
        self.listeners.push(Box::new(listener));
        self
    }

    /// Creates the map.
    ///
    /// Fails if a dataset was given and it cannot be shown.
    pub fn build(self) -> Result<OceanMap, OceanMapError> {
        let config = self.config.unwrap_or_default();
        let settings = self.settings.unwrap_or_else(|| config.settings.clone());
        let dataset = match self.dataset {
            Some(dataset) => {
                dataset.validate()?;
                dataset
            }
            None => DatasetView::default(),
        };

        Ok(OceanMap::new(
            config,
            settings,
            dataset,
            self.messenger,
            self.listeners,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::ProjectionId;
    use crate::surface::SurfaceRole;
    use assert_matches::assert_matches;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn settings_default_to_config() {
        let config = OceanMapConfig::from_json(r#"{"settings": {"projection": "EPSG:3031"}}"#).expect("valid config");
        let map = OceanMapBuilder::default()
            .with_config(config)
            .build()
            .expect("valid map");
        assert_eq!(map.settings().projection, ProjectionId::Epsg3031);
        assert_eq!(map.store().read().projection(), ProjectionId::Epsg3031);
    }

    #[test]
    fn invalid_dataset_fails() {
        let result = OceanMapBuilder::default()
            .with_dataset(DatasetView::new("giops_day", ""))
            .build();
        assert_matches!(result.err(), Some(OceanMapError::InvalidDataset(_)));
    }

    #[test]
    fn messenger_receives_redraws() {
        let redraws = Arc::new(AtomicUsize::new(0));
        let counter = redraws.clone();
        let mut map = OceanMapBuilder::default()
            .with_messenger(move || {
                counter.fetch_add(1, Ordering::Relaxed);
            })
            .build()
            .expect("valid map");

        map.set_size(SurfaceRole::Primary, 640.0, 480.0);
        assert!(redraws.load(Ordering::Relaxed) > 0);
    }
}
