//! Persisted client-side state for the Wordflow platform.
//!
//! Keeps the app catalog, per-version run history, and the stored API key in
//! a small key-value store, and reconciles that state with fresh platform
//! fetches without losing local run history.
//!
//! ```no_run
//! use wordflow_client::WordflowClient;
//! use wordflow_state::{AppStore, FileStore, refresh_apps};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let mut store = AppStore::load(Box::new(FileStore::new(".wordflow")?))?;
//! let client = WordflowClient::from_env()?;
//! refresh_apps(&client, &mut store).await?;
//! for app in store.apps() {
//!     println!("{} @ {}", app.app.app_slug, app.selected_version);
//! }
//! # Ok(())
//! # }
//! ```

mod errors;
mod refresh;
mod storage;
mod store;

pub use errors::StateError;
pub use refresh::{reconcile_apps, refresh_apps};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use store::{API_KEY_KEY, APPS_KEY, AppStore};
