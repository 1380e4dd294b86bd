//! Listening preferences

use crate::models::QualityMode;
use bridge_traits::storage::SettingsStore;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, warn};

pub const QUALITY_MODE_KEY: &str = "quality_mode";

pub struct Preferences {
    settings: Arc<dyn SettingsStore>,
    quality: RwLock<QualityMode>,
}

impl Preferences {
    pub async fn load(settings: Arc<dyn SettingsStore>) -> Self {
        let quality = match settings.get_string(QUALITY_MODE_KEY).await {
            Ok(Some(raw)) => raw.parse::<QualityMode>().unwrap_or_else(|e: String| {
                warn!(error = %e, "Ignoring stored quality mode");
                QualityMode::default()
            }),
            Ok(None) => QualityMode::default(),
            Err(e) => {
                warn!(error = %e, "Failed to read quality mode");
                QualityMode::default()
            }
        };

        debug!(quality = %quality, "Loaded preferences");
        Self {
            settings,
            quality: RwLock::new(quality),
        }
    }

    pub fn quality_mode(&self) -> QualityMode {
        *self.quality.read()
    }

    pub async fn set_quality_mode(&self, mode: QualityMode) {
        *self.quality.write() = mode;

        if let Err(e) = self.settings.set_string(QUALITY_MODE_KEY, mode.as_str()).await {
            warn!(error = %e, "Failed to persist quality mode");
        }
    }
}
