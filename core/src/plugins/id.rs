//! plugins/id.rs
//! Visitor and session ids.
//!
//! - `userId`: looked up in the visitor store; on first sight derived from a
//!   blake3 digest of the host descriptor and stored, so it survives restarts
//!   when the store is a `FileStore`.
//! - `traceId`: 10 random alphanumerics, kept in a session-scoped store.

use std::sync::Arc;

use tracing::debug;

use crate::config::BuilderConfig;
use crate::constants::hook_names::builder::BEFORE_BUILD;
use crate::constants::storage_keys::{TRACE_ID, USER_ID};
use crate::constants::TRACE_ID_LEN;
use crate::plugins::user_agent::device_descriptor;
use crate::plugins::{ApplyPlugin, ComponentRef, PluginTarget};
use crate::storage::{FileStore, KeyValueStore, MemoryStore};
use crate::types::StorageError;
use crate::utils::random_id;

const VISITOR_ID_HEX_LEN: usize = 32;

pub struct IdPlugin {
    visitor_store: Arc<dyn KeyValueStore>,
    session_store: Arc<dyn KeyValueStore>,
}

impl IdPlugin {
    pub fn new(visitor_store: Arc<dyn KeyValueStore>, session_store: Arc<dyn KeyValueStore>) -> Self {
        Self { visitor_store, session_store }
    }

    /// File-backed visitor store if `visitor_store_path` is set, memory otherwise.
    pub fn from_config(config: &BuilderConfig) -> Result<Self, StorageError> {
        let visitor_store: Arc<dyn KeyValueStore> = match &config.visitor_store_path {
            Some(path) => Arc::new(FileStore::open(path)?),
            None => Arc::new(MemoryStore::new()),
        };
        Ok(Self::new(visitor_store, Arc::new(MemoryStore::new())))
    }

    pub fn visitor_id(&self) -> Result<String, StorageError> {
        if let Some(id) = self.visitor_store.get(USER_ID)? {
            return Ok(id);
        }
        let id = fingerprint();
        self.visitor_store.set(USER_ID, &id)?;
        debug!(target: "river::plugins::id", "new visitor id stored");
        Ok(id)
    }

    pub fn trace_id(&self) -> Result<String, StorageError> {
        if let Some(id) = self.session_store.get(TRACE_ID)? {
            return Ok(id);
        }
        let id = random_id(TRACE_ID_LEN);
        self.session_store.set(TRACE_ID, &id)?;
        Ok(id)
    }
}

fn fingerprint() -> String {
    let d = device_descriptor();
    let mut hasher = blake3::Hasher::new();
    for part in [&d.os_name, &d.os_version, &d.kernel_version, &d.host_name, &d.arch] {
        hasher.update(part.as_bytes());
        hasher.update(&[0]);
    }
    hasher.update(&(d.cpu_count as u64).to_le_bytes());

    let mut id = hex::encode(hasher.finalize().as_bytes());
    id.truncate(VISITOR_ID_HEX_LEN);
    id
}

impl ApplyPlugin for IdPlugin {
    fn name(&self) -> &str {
        "id"
    }

    fn target(&self) -> PluginTarget {
        PluginTarget::Builder
    }

    fn apply(&self, component: ComponentRef<'_>) -> anyhow::Result<()> {
        let builder = component.builder()?;
        let user_id = self.visitor_id()?;
        let trace_id = self.trace_id()?;

        builder.hooks().tap_sync(BEFORE_BUILD, move |message| {
            message.user_id = Some(user_id.clone());
            message.trace_id = Some(trace_id.clone());
            Ok(())
        })?;
        Ok(())
    }
}
