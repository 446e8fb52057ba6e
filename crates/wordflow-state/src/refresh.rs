use tracing::{debug, warn};
use wordflow_client::{
    App, AppWithVersions, CatalogTransport, Version, VersionWithRuns, sort_versions_desc,
};

use crate::errors::StateError;
use crate::store::AppStore;

/// Merges a freshly fetched catalog with existing local state.
///
/// Run history survives a refresh keyed by `(app_slug, version)`; versions the
/// client has never seen start with an empty history. The previously selected
/// version is kept when the platform still lists it, otherwise selection falls
/// back to the newest version. Apps order newest-update-first.
pub fn reconcile_apps(
    fetched: Vec<(App, Vec<Version>)>,
    existing: &[AppWithVersions],
) -> Vec<AppWithVersions> {
    let mut merged: Vec<AppWithVersions> = fetched
        .into_iter()
        .map(|(app, mut versions)| {
            sort_versions_desc(&mut versions);
            let prior = existing.iter().find(|e| e.app.app_slug == app.app_slug);
            let versions: Vec<VersionWithRuns> = versions
                .into_iter()
                .map(|version| {
                    let runs = prior
                        .and_then(|e| {
                            e.versions
                                .iter()
                                .find(|v| v.version.version == version.version)
                        })
                        .map(|v| v.runs.clone())
                        .unwrap_or_default();
                    VersionWithRuns { version, runs }
                })
                .collect();
            let selected_version = prior
                .map(|e| e.selected_version.clone())
                .filter(|sel| versions.iter().any(|v| &v.version.version == sel))
                .or_else(|| versions.first().map(|v| v.version.version.clone()))
                .unwrap_or_default();
            AppWithVersions {
                app,
                versions,
                selected_version,
            }
        })
        .collect();
    merged.sort_by(|a, b| b.app.last_updated_at().cmp(&a.app.last_updated_at()));
    merged
}

/// Re-fetches the full catalog and replaces the store's app list.
///
/// A version-list failure is isolated to its app: the error is logged and the
/// app dropped from this refresh, so one broken app cannot wedge the rest.
pub async fn refresh_apps(
    catalog: &dyn CatalogTransport,
    store: &mut AppStore,
) -> Result<(), StateError> {
    let apps = catalog.fetch_apps().await?;
    let mut fetched = Vec::with_capacity(apps.len());
    for app in apps {
        match catalog.fetch_versions(&app.org_slug, &app.app_slug).await {
            Ok(versions) => fetched.push((app, versions)),
            Err(err) => {
                warn!(
                    app_slug = %app.app_slug,
                    error = %err,
                    "skipping app: version list fetch failed"
                );
            }
        }
    }
    debug!(apps = fetched.len(), "refreshed app catalog");
    let merged = reconcile_apps(fetched, store.apps());
    store.replace_apps(merged);
    store.persist()
}

#[cfg(test)]
mod tests {
    use wordflow_client::{Fragment, Role, RunStatus, RunWithInputs};

    use super::*;

    fn app(app_slug: &str, last_updated: &str) -> App {
        App {
            org_slug: "acme".into(),
            app_slug: app_slug.into(),
            visibility: "private".into(),
            latest_version: None,
            created: "2026-01-01T00:00:00Z".into(),
            last_updated: last_updated.into(),
        }
    }

    fn version(v: &str) -> Version {
        Version {
            title: "t".into(),
            description: "d".into(),
            version: v.into(),
            inputs: Vec::new(),
            created: "2026-01-01T00:00:00Z".into(),
            examples: None,
        }
    }

    fn run(content: &str) -> RunWithInputs {
        RunWithInputs {
            status: RunStatus::Complete,
            outputs: vec![Fragment {
                path: "out".into(),
                content: content.into(),
                role: Role::System,
            }],
            errors: None,
            run_time: "2026-03-01T00:00:00Z".into(),
            inputs: Vec::new(),
        }
    }

    fn existing_record(
        app_slug: &str,
        selected: &str,
        versions: Vec<(&str, Vec<RunWithInputs>)>,
    ) -> AppWithVersions {
        AppWithVersions {
            app: app(app_slug, "2026-02-01T00:00:00Z"),
            versions: versions
                .into_iter()
                .map(|(v, runs)| VersionWithRuns {
                    version: version(v),
                    runs,
                })
                .collect(),
            selected_version: selected.into(),
        }
    }

    #[test]
    fn runs_survive_refresh_keyed_by_app_and_version() {
        let existing = vec![existing_record(
            "summarizer",
            "1.0",
            vec![("1.0", vec![run("kept")])],
        )];
        let fetched = vec![(
            app("summarizer", "2026-02-01T00:00:00Z"),
            vec![version("1.0"), version("2.0")],
        )];

        let merged = reconcile_apps(fetched, &existing);
        assert_eq!(merged.len(), 1);
        // Newest first; 2.0 is unseen so its history starts empty.
        assert_eq!(merged[0].versions[0].version.version, "2.0");
        assert!(merged[0].versions[0].runs.is_empty());
        assert_eq!(merged[0].versions[1].version.version, "1.0");
        assert_eq!(merged[0].versions[1].runs[0].outputs[0].content, "kept");
    }

    #[test]
    fn selected_version_kept_when_still_listed_else_newest() {
        let existing = vec![
            existing_record("keeper", "1.0", vec![("1.0", Vec::new())]),
            existing_record("mover", "0.9", vec![("0.9", Vec::new())]),
        ];
        let fetched = vec![
            (
                app("keeper", "2026-02-01T00:00:00Z"),
                vec![version("2.0"), version("1.0")],
            ),
            (
                app("mover", "2026-02-01T00:00:00Z"),
                vec![version("1.10"), version("1.9")],
            ),
        ];

        let merged = reconcile_apps(fetched, &existing);
        let by_slug = |slug: &str| {
            merged
                .iter()
                .find(|a| a.app.app_slug == slug)
                .expect("app present")
        };
        assert_eq!(by_slug("keeper").selected_version, "1.0");
        // "0.9" vanished from the platform, so selection moves to the newest.
        assert_eq!(by_slug("mover").selected_version, "1.10");
    }

    #[test]
    fn unknown_apps_start_fresh_and_order_by_last_updated() {
        let fetched = vec![
            (app("older", "2026-01-05T00:00:00Z"), vec![version("1.0")]),
            (app("newer", "2026-03-05T00:00:00Z"), vec![version("1.0")]),
        ];

        let merged = reconcile_apps(fetched, &[]);
        assert_eq!(merged[0].app.app_slug, "newer");
        assert_eq!(merged[1].app.app_slug, "older");
        assert_eq!(merged[0].selected_version, "1.0");
        assert!(merged[0].versions[0].runs.is_empty());
    }

    #[test]
    fn app_with_no_versions_gets_empty_selection() {
        let fetched = vec![(app("empty", "2026-01-05T00:00:00Z"), Vec::new())];
        let merged = reconcile_apps(fetched, &[]);
        assert!(merged[0].versions.is_empty());
        assert_eq!(merged[0].selected_version, "");
    }

    #[test]
    fn apps_dropped_by_the_platform_disappear() {
        let existing = vec![existing_record(
            "gone",
            "1.0",
            vec![("1.0", vec![run("orphaned")])],
        )];
        let merged = reconcile_apps(Vec::new(), &existing);
        assert!(merged.is_empty());
    }

    /// Scripted catalog: serves a fixed app list and fails version fetches
    /// for one slug.
    struct FakeCatalog {
        apps: Vec<App>,
        broken_slug: &'static str,
    }

    #[async_trait::async_trait]
    impl CatalogTransport for FakeCatalog {
        async fn fetch_apps(&self) -> Result<Vec<App>, wordflow_client::ClientError> {
            Ok(self.apps.clone())
        }

        async fn fetch_versions(
            &self,
            _org_slug: &str,
            app_slug: &str,
        ) -> Result<Vec<Version>, wordflow_client::ClientError> {
            if app_slug == self.broken_slug {
                return Err(wordflow_client::ClientError::network(
                    "version list unavailable",
                ));
            }
            Ok(vec![version("1.0")])
        }
    }

    #[tokio::test]
    async fn version_fetch_failure_drops_only_that_app() {
        let catalog = FakeCatalog {
            apps: vec![
                app("healthy", "2026-02-01T00:00:00Z"),
                app("broken", "2026-03-01T00:00:00Z"),
                app("also-healthy", "2026-01-01T00:00:00Z"),
            ],
            broken_slug: "broken",
        };
        let mut store = AppStore::load(Box::new(crate::storage::MemoryStore::new()))
            .expect("load");

        refresh_apps(&catalog, &mut store).await.expect("refresh");

        let slugs: Vec<&str> = store
            .apps()
            .iter()
            .map(|a| a.app.app_slug.as_str())
            .collect();
        assert_eq!(slugs, vec!["healthy", "also-healthy"]);
        assert!(store.apps().iter().all(|a| a.selected_version == "1.0"));
    }

    #[tokio::test]
    async fn app_list_failure_fails_the_whole_refresh() {
        struct DownCatalog;

        #[async_trait::async_trait]
        impl CatalogTransport for DownCatalog {
            async fn fetch_apps(&self) -> Result<Vec<App>, wordflow_client::ClientError> {
                Err(wordflow_client::ClientError::network("catalog unreachable"))
            }

            async fn fetch_versions(
                &self,
                _org_slug: &str,
                _app_slug: &str,
            ) -> Result<Vec<Version>, wordflow_client::ClientError> {
                unreachable!("version fetch is never reached when the app list fails")
            }
        }

        let mut store = AppStore::load(Box::new(crate::storage::MemoryStore::new()))
            .expect("load");
        assert!(matches!(
            refresh_apps(&DownCatalog, &mut store).await,
            Err(crate::errors::StateError::Client(_))
        ));
        assert!(store.apps().is_empty());
    }
}
