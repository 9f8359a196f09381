use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Key under which the theme preference is persisted.
pub const THEME_PREFERENCE_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeMode {
    Light,
    Dark,
}

impl ThemeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }

    pub fn flipped(&self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }

    fn from_stored(value: &str) -> Option<Self> {
        match value {
            "light" => Some(ThemeMode::Light),
            "dark" => Some(ThemeMode::Dark),
            _ => None,
        }
    }
}

/// Client-local persistent store addressable by string key.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn load_preference(&self, key: &str) -> Result<Option<String>>;
    async fn save_preference(&self, key: &str, value: &str) -> Result<()>;
}

/// Visual side effect applied whenever the theme changes. The rendering
/// layer supplies the real implementation (class toggle, restyle, reprint).
pub trait ThemeApplier: Send + Sync {
    fn apply(&self, mode: ThemeMode);
}

pub struct NoopThemeApplier;

impl ThemeApplier for NoopThemeApplier {
    fn apply(&self, _mode: ThemeMode) {}
}

/// Owns the process-wide theme preference.
///
/// Consumers read through `current()`; nothing else holds theme state. The
/// stored value is re-applied on initialization and every toggle persists
/// before returning.
pub struct ThemeController {
    store: Arc<dyn PreferenceStore>,
    applier: Arc<dyn ThemeApplier>,
    mode: Mutex<ThemeMode>,
}

impl ThemeController {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self::new_with_applier(store, Arc::new(NoopThemeApplier))
    }

    pub fn new_with_applier(store: Arc<dyn PreferenceStore>, applier: Arc<dyn ThemeApplier>) -> Self {
        Self {
            store,
            applier,
            mode: Mutex::new(ThemeMode::Light),
        }
    }

    /// Reads the persisted preference (defaulting to light when absent or
    /// unreadable) and applies the visual side effect.
    pub async fn initialize(&self) -> ThemeMode {
        let stored = match self.store.load_preference(THEME_PREFERENCE_KEY).await {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "failed to read theme preference; using default");
                None
            }
        };
        let mode = stored
            .as_deref()
            .and_then(ThemeMode::from_stored)
            .unwrap_or(ThemeMode::Light);
        *self.mode.lock().await = mode;
        self.applier.apply(mode);
        info!(theme = mode.as_str(), "theme initialized");
        mode
    }

    /// Flips the theme, persists the new value, and applies the visual side
    /// effect. Persistence failures are logged, never surfaced; the flip
    /// itself always takes effect.
    pub async fn toggle(&self) -> ThemeMode {
        let next = {
            let mut guard = self.mode.lock().await;
            let next = guard.flipped();
            *guard = next;
            next
        };
        if let Err(err) = self
            .store
            .save_preference(THEME_PREFERENCE_KEY, next.as_str())
            .await
        {
            warn!(error = %err, theme = next.as_str(), "failed to persist theme preference");
        }
        self.applier.apply(next);
        next
    }

    pub async fn current(&self) -> ThemeMode {
        *self.mode.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DurablePreferenceStore;
    use anyhow::anyhow;
    use std::{collections::HashMap, sync::Mutex as StdMutex};
    use storage::Storage;

    struct MemoryPreferenceStore {
        values: Mutex<HashMap<String, String>>,
        fail_saves: bool,
        fail_loads: bool,
    }

    impl MemoryPreferenceStore {
        fn empty() -> Self {
            Self {
                values: Mutex::new(HashMap::new()),
                fail_saves: false,
                fail_loads: false,
            }
        }

        fn with_theme(value: &str) -> Self {
            let store = Self::empty();
            store
                .values
                .try_lock()
                .expect("unshared")
                .insert(THEME_PREFERENCE_KEY.to_string(), value.to_string());
            store
        }

        fn failing_saves() -> Self {
            Self {
                fail_saves: true,
                ..Self::empty()
            }
        }

        fn failing_loads() -> Self {
            Self {
                fail_loads: true,
                ..Self::empty()
            }
        }
    }

    #[async_trait]
    impl PreferenceStore for MemoryPreferenceStore {
        async fn load_preference(&self, key: &str) -> Result<Option<String>> {
            if self.fail_loads {
                return Err(anyhow!("preference store unavailable"));
            }
            Ok(self.values.lock().await.get(key).cloned())
        }

        async fn save_preference(&self, key: &str, value: &str) -> Result<()> {
            if self.fail_saves {
                return Err(anyhow!("preference store unavailable"));
            }
            self.values
                .lock()
                .await
                .insert(key.to_string(), value.to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingApplier {
        applied: StdMutex<Vec<ThemeMode>>,
    }

    impl ThemeApplier for RecordingApplier {
        fn apply(&self, mode: ThemeMode) {
            self.applied.lock().expect("applier lock").push(mode);
        }
    }

    #[tokio::test]
    async fn initialize_defaults_to_light_and_applies_it() {
        let applier = Arc::new(RecordingApplier::default());
        let controller = ThemeController::new_with_applier(
            Arc::new(MemoryPreferenceStore::empty()),
            applier.clone(),
        );

        let mode = controller.initialize().await;

        assert_eq!(mode, ThemeMode::Light);
        assert_eq!(controller.current().await, ThemeMode::Light);
        assert_eq!(*applier.applied.lock().expect("lock"), vec![ThemeMode::Light]);
    }

    #[tokio::test]
    async fn initialize_honors_persisted_dark_preference() {
        let controller = ThemeController::new(Arc::new(MemoryPreferenceStore::with_theme("dark")));

        let mode = controller.initialize().await;

        assert_eq!(mode, ThemeMode::Dark);
    }

    #[tokio::test]
    async fn initialize_falls_back_to_light_on_unknown_stored_value() {
        let controller =
            ThemeController::new(Arc::new(MemoryPreferenceStore::with_theme("sepia")));

        assert_eq!(controller.initialize().await, ThemeMode::Light);
    }

    #[tokio::test]
    async fn initialize_survives_an_unreadable_store() {
        let controller = ThemeController::new(Arc::new(MemoryPreferenceStore::failing_loads()));

        assert_eq!(controller.initialize().await, ThemeMode::Light);
    }

    #[tokio::test]
    async fn toggle_flips_persists_and_applies() {
        let store = Arc::new(MemoryPreferenceStore::empty());
        let applier = Arc::new(RecordingApplier::default());
        let controller = ThemeController::new_with_applier(store.clone(), applier.clone());
        controller.initialize().await;

        let mode = controller.toggle().await;

        assert_eq!(mode, ThemeMode::Dark);
        assert_eq!(controller.current().await, ThemeMode::Dark);
        assert_eq!(
            store.values.lock().await.get(THEME_PREFERENCE_KEY).cloned(),
            Some("dark".to_string())
        );
        assert_eq!(
            *applier.applied.lock().expect("lock"),
            vec![ThemeMode::Light, ThemeMode::Dark]
        );
    }

    #[tokio::test]
    async fn double_toggle_restores_mode_and_persisted_value() {
        let store = Arc::new(MemoryPreferenceStore::with_theme("light"));
        let controller = ThemeController::new(store.clone());
        controller.initialize().await;

        controller.toggle().await;
        let mode = controller.toggle().await;

        assert_eq!(mode, ThemeMode::Light);
        assert_eq!(
            store.values.lock().await.get(THEME_PREFERENCE_KEY).cloned(),
            Some("light".to_string())
        );
    }

    #[tokio::test]
    async fn toggle_still_flips_when_persistence_fails() {
        let controller = ThemeController::new(Arc::new(MemoryPreferenceStore::failing_saves()));
        controller.initialize().await;

        let mode = controller.toggle().await;

        assert_eq!(mode, ThemeMode::Dark);
        assert_eq!(controller.current().await, ThemeMode::Dark);
    }

    #[tokio::test]
    async fn durable_store_round_trips_through_sqlite() {
        let storage = Storage::new("sqlite::memory:").await.expect("db");
        let controller = ThemeController::new(Arc::new(DurablePreferenceStore::new(
            storage.clone(),
        )));
        controller.initialize().await;
        controller.toggle().await;

        let reopened = ThemeController::new(Arc::new(DurablePreferenceStore::new(storage)));
        assert_eq!(reopened.initialize().await, ThemeMode::Dark);
    }
}
