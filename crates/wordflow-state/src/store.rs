use wordflow_client::{AppWithVersions, RunWithInputs, VersionWithRuns};

use crate::errors::StateError;
use crate::storage::KeyValueStore;

/// Storage key holding the JSON array of [`AppWithVersions`].
pub const APPS_KEY: &str = "apps";
/// Storage key holding the raw API key string.
pub const API_KEY_KEY: &str = "apiKey";

/// In-memory client state backed by a [`KeyValueStore`].
///
/// Mutators only touch the in-memory copy; nothing hits the backing store
/// until [`AppStore::persist`] is called. Callers batch related mutations and
/// persist once.
pub struct AppStore {
    storage: Box<dyn KeyValueStore>,
    apps: Vec<AppWithVersions>,
    api_key: Option<String>,
}

impl AppStore {
    /// Loads both keys from storage. Missing keys load as empty state;
    /// unparseable `apps` JSON is an error rather than silent data loss.
    pub fn load(storage: Box<dyn KeyValueStore>) -> Result<Self, StateError> {
        let apps = match storage.get(APPS_KEY)? {
            Some(raw) => serde_json::from_str(&raw)?,
            None => Vec::new(),
        };
        let api_key = storage.get(API_KEY_KEY)?;
        Ok(Self {
            storage,
            apps,
            api_key,
        })
    }

    pub fn apps(&self) -> &[AppWithVersions] {
        &self.apps
    }

    pub fn app(&self, app_slug: &str) -> Option<&AppWithVersions> {
        self.apps.iter().find(|a| a.app.app_slug == app_slug)
    }

    /// Returns the currently selected version record of an app.
    pub fn selected_version(&self, app_slug: &str) -> Option<&VersionWithRuns> {
        let app = self.app(app_slug)?;
        app.versions
            .iter()
            .find(|v| v.version.version == app.selected_version)
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn set_api_key(&mut self, key: impl Into<String>) {
        self.api_key = Some(key.into());
    }

    pub fn clear_api_key(&mut self) {
        self.api_key = None;
    }

    /// Replaces the app list wholesale, as the refresh cycle does.
    pub fn replace_apps(&mut self, apps: Vec<AppWithVersions>) {
        self.apps = apps;
    }

    /// Replaces one app record, matched by its slug.
    pub fn update_app(&mut self, updated: AppWithVersions) -> Result<(), StateError> {
        let slot = self.app_mut(&updated.app.app_slug)?;
        *slot = updated;
        Ok(())
    }

    /// Changes which version of an app the client is working against.
    pub fn set_selected_version(&mut self, app_slug: &str, version: &str) -> Result<(), StateError> {
        let app = self.app_mut(app_slug)?;
        if !app.versions.iter().any(|v| v.version.version == version) {
            return Err(StateError::UnknownVersion {
                app_slug: app_slug.to_string(),
                version: version.to_string(),
            });
        }
        app.selected_version = version.to_string();
        Ok(())
    }

    /// Appends a finished run to the history of `(app_slug, version)`.
    pub fn push_run(
        &mut self,
        app_slug: &str,
        version: &str,
        run: RunWithInputs,
    ) -> Result<(), StateError> {
        let app = self.app_mut(app_slug)?;
        let Some(slot) = app
            .versions
            .iter_mut()
            .find(|v| v.version.version == version)
        else {
            return Err(StateError::UnknownVersion {
                app_slug: app_slug.to_string(),
                version: version.to_string(),
            });
        };
        slot.runs.push(run);
        Ok(())
    }

    /// Writes both keys back to storage.
    ///
    /// Keys are written one at a time, `apps` first: if the credential write
    /// fails, the app list is already persisted. Each individual key write is
    /// atomic in [`FileStore`](crate::FileStore).
    pub fn persist(&mut self) -> Result<(), StateError> {
        let raw = serde_json::to_string(&self.apps)?;
        self.storage.set(APPS_KEY, &raw)?;
        match &self.api_key {
            Some(key) => self.storage.set(API_KEY_KEY, key)?,
            None => self.storage.remove(API_KEY_KEY)?,
        }
        Ok(())
    }

    fn app_mut(&mut self, app_slug: &str) -> Result<&mut AppWithVersions, StateError> {
        self.apps
            .iter_mut()
            .find(|a| a.app.app_slug == app_slug)
            .ok_or_else(|| StateError::UnknownApp(app_slug.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use wordflow_client::{
        App, AppWithVersions, Fragment, Role, RunStatus, RunWithInputs, Version, VersionWithRuns,
    };

    use super::*;
    use crate::storage::MemoryStore;

    fn app_record(app_slug: &str, versions: &[&str]) -> AppWithVersions {
        AppWithVersions {
            app: App {
                org_slug: "acme".into(),
                app_slug: app_slug.into(),
                visibility: "private".into(),
                latest_version: None,
                created: "2026-01-01T00:00:00Z".into(),
                last_updated: "2026-02-01T00:00:00Z".into(),
            },
            versions: versions
                .iter()
                .map(|v| VersionWithRuns {
                    version: Version {
                        title: "t".into(),
                        description: "d".into(),
                        version: (*v).into(),
                        inputs: Vec::new(),
                        created: "2026-01-01T00:00:00Z".into(),
                        examples: None,
                    },
                    runs: Vec::new(),
                })
                .collect(),
            selected_version: versions.first().map(|v| (*v).into()).unwrap_or_default(),
        }
    }

    fn finished_run() -> RunWithInputs {
        RunWithInputs {
            status: RunStatus::Complete,
            outputs: vec![Fragment {
                path: "out".into(),
                content: "hello".into(),
                role: Role::System,
            }],
            errors: None,
            run_time: "2026-03-01T00:00:00Z".into(),
            inputs: Vec::new(),
        }
    }

    #[test]
    fn load_tolerates_empty_storage() {
        let store = AppStore::load(Box::new(MemoryStore::new())).expect("load");
        assert!(store.apps().is_empty());
        assert_eq!(store.api_key(), None);
    }

    #[test]
    fn mutations_are_invisible_until_persist() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file_backing = crate::storage::FileStore::new(dir.path()).expect("store");
        let mut store = AppStore::load(Box::new(file_backing)).expect("load");
        store.replace_apps(vec![app_record("summarizer", &["1.0"])]);
        store.set_api_key("secret");
        let unpersisted =
            AppStore::load(Box::new(crate::storage::FileStore::new(dir.path()).expect("store")))
                .expect("load");
        assert!(unpersisted.apps().is_empty());
        assert_eq!(unpersisted.api_key(), None);

        store.persist().expect("persist");
        let reloaded =
            AppStore::load(Box::new(crate::storage::FileStore::new(dir.path()).expect("store")))
                .expect("load");
        assert_eq!(reloaded.apps().len(), 1);
        assert_eq!(reloaded.api_key(), Some("secret"));
    }

    #[test]
    fn push_run_appends_to_the_owning_version() {
        let mut store = AppStore::load(Box::new(MemoryStore::new())).expect("load");
        store.replace_apps(vec![app_record("summarizer", &["2.0", "1.0"])]);
        store
            .push_run("summarizer", "1.0", finished_run())
            .expect("push");
        store
            .push_run("summarizer", "1.0", finished_run())
            .expect("push");

        let app = &store.apps()[0];
        assert!(app.versions[0].runs.is_empty());
        assert_eq!(app.versions[1].runs.len(), 2);
    }

    #[test]
    fn push_run_rejects_unknown_targets() {
        let mut store = AppStore::load(Box::new(MemoryStore::new())).expect("load");
        store.replace_apps(vec![app_record("summarizer", &["1.0"])]);
        assert!(matches!(
            store.push_run("missing", "1.0", finished_run()),
            Err(StateError::UnknownApp(_))
        ));
        assert!(matches!(
            store.push_run("summarizer", "9.9", finished_run()),
            Err(StateError::UnknownVersion { .. })
        ));
    }

    #[test]
    fn set_selected_version_validates_membership() {
        let mut store = AppStore::load(Box::new(MemoryStore::new())).expect("load");
        store.replace_apps(vec![app_record("summarizer", &["2.0", "1.0"])]);
        store
            .set_selected_version("summarizer", "1.0")
            .expect("select");
        assert_eq!(store.apps()[0].selected_version, "1.0");
        assert!(matches!(
            store.set_selected_version("summarizer", "3.0"),
            Err(StateError::UnknownVersion { .. })
        ));
    }

    #[test]
    fn selectors_resolve_the_selected_version() {
        let mut store = AppStore::load(Box::new(MemoryStore::new())).expect("load");
        store.replace_apps(vec![app_record("summarizer", &["2.0", "1.0"])]);
        let selected = store.selected_version("summarizer").expect("selected");
        assert_eq!(selected.version.version, "2.0");
        assert!(store.app("missing").is_none());
        assert!(store.selected_version("missing").is_none());
    }

    #[test]
    fn update_app_replaces_by_slug() {
        let mut store = AppStore::load(Box::new(MemoryStore::new())).expect("load");
        store.replace_apps(vec![app_record("summarizer", &["1.0"])]);
        let mut updated = app_record("summarizer", &["2.0", "1.0"]);
        updated.selected_version = "2.0".into();
        store.update_app(updated).expect("update");
        assert_eq!(store.apps()[0].versions.len(), 2);
        assert!(matches!(
            store.update_app(app_record("missing", &["1.0"])),
            Err(StateError::UnknownApp(_))
        ));
    }

    #[test]
    fn clearing_the_api_key_removes_it_on_persist() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = AppStore::load(Box::new(
            crate::storage::FileStore::new(dir.path()).expect("store"),
        ))
        .expect("load");
        store.set_api_key("secret");
        store.persist().expect("persist");
        store.clear_api_key();
        store.persist().expect("persist");

        let reloaded = AppStore::load(Box::new(
            crate::storage::FileStore::new(dir.path()).expect("store"),
        ))
        .expect("load");
        assert_eq!(reloaded.api_key(), None);
    }
}
