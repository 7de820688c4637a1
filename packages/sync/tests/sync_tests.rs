//! Cross-tab and persistence behavior of synced sessions
//!
//! This tests:
//! - Changes in one tab reach the other
//! - The broadcast payload carries the document only
//! - Rehydration and its fallbacks
//! - Storage failures never touch the document or the unsaved flag

use std::sync::Arc;
use std::time::Duration;

use campaign_editor::{ApplyOutcome, BlockRegistry, CampaignConfig, Mutation};
use campaign_sync::{
    storage_key, EngineConfig, FileStore, KeyValueStore, MemoryStore, Origin, StorageError,
    SyncContext, SyncedSession,
};
use serde_json::{json, Value};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn registry() -> Arc<BlockRegistry> {
    Arc::new(BlockRegistry::builtin())
}

fn add(block_type: &str) -> Mutation {
    Mutation::AddBlock {
        block_type: block_type.into(),
        overrides: None,
    }
}

fn stored(context: &SyncContext, id: uuid::Uuid) -> Option<CampaignConfig> {
    let key = storage_key(&context.config.storage_key_prefix, id);
    let raw = context.store.get(&key).unwrap()?;
    Some(CampaignConfig::from_json(&raw).unwrap())
}

#[tokio::test]
async fn test_change_reaches_sibling_tab() -> anyhow::Result<()> {
    init_tracing();
    let context = SyncContext::in_memory(EngineConfig::default());
    let initial = CampaignConfig::new("Shared");

    let mut tab_a = SyncedSession::create(initial.clone(), registry(), &context);
    let mut tab_b = SyncedSession::create(initial, registry(), &context);

    assert!(tab_a.apply(add("Hero1")).is_applied());
    assert!(tab_b.poll_remote());
    assert_eq!(*tab_b.document(), *tab_a.document());
    assert!(tab_b.has_unsaved_changes());

    // the adopted document is not echoed back
    assert!(!tab_a.poll_remote());

    // and the sibling's own history is untouched
    assert!(!tab_b.session().can_undo());

    tab_a.dispose().await?;
    tab_b.dispose().await?;
    Ok(())
}

#[tokio::test]
async fn test_last_write_wins() -> anyhow::Result<()> {
    let context = SyncContext::in_memory(EngineConfig::default());
    let initial = CampaignConfig::new("Race");

    let mut tab_a = SyncedSession::create(initial.clone(), registry(), &context);
    let mut tab_b = SyncedSession::create(initial, registry(), &context);

    tab_a.apply(Mutation::RenameCampaign { name: "From A".into() });
    tab_b.apply(Mutation::RenameCampaign { name: "From B".into() });

    assert!(tab_a.poll_remote());
    assert_eq!(tab_a.document().name, "From B");

    tab_a.dispose().await?;
    tab_b.dispose().await?;
    Ok(())
}

#[tokio::test]
async fn test_undo_is_replicated() -> anyhow::Result<()> {
    let context = SyncContext::in_memory(EngineConfig::default());
    let initial = CampaignConfig::new("Undo");

    let mut tab_a = SyncedSession::create(initial.clone(), registry(), &context);
    let mut tab_b = SyncedSession::create(initial, registry(), &context);

    tab_a.apply(add("Text1"));
    tab_a.undo();

    assert!(!tab_b.poll_remote());
    assert!(tab_b.document().blocks.is_empty());

    tab_a.redo();
    assert!(tab_b.poll_remote());
    assert_eq!(tab_b.document().blocks.len(), 1);

    tab_a.dispose().await?;
    tab_b.dispose().await?;
    Ok(())
}

#[tokio::test]
async fn test_next_remote_waits_for_sibling() -> anyhow::Result<()> {
    let context = SyncContext::in_memory(EngineConfig::default());
    let initial = CampaignConfig::new("Waiting");

    let mut tab_a = SyncedSession::create(initial.clone(), registry(), &context);
    let mut tab_b = SyncedSession::create(initial, registry(), &context);

    tab_a.apply(add("Cta1"));
    assert!(tab_b.next_remote().await);
    assert_eq!(tab_b.document().blocks[0].block_type, "Cta1");

    tab_a.dispose().await?;
    tab_b.dispose().await?;
    Ok(())
}

#[tokio::test]
async fn test_payload_excludes_saving_flag() {
    let context = SyncContext::in_memory(EngineConfig::default());
    let initial = CampaignConfig::new("Payload");
    let mut listener = context.hub.join(initial.id);

    let mut tab = SyncedSession::create(initial, registry(), &context);
    let _ticket = tab.begin_save();
    assert!(tab.is_saving());
    tab.apply(add("Hero1"));

    let envelope = listener.recv_envelope().await.unwrap();
    let payload: Value = serde_json::from_str(&envelope.payload).unwrap();
    let keys: Vec<&str> = payload.as_object().unwrap().keys().map(String::as_str).collect();

    let mut sorted = keys.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, vec!["blocks", "id", "name", "theme"]);
    assert!(!envelope.payload.contains("isSaving"));
    assert!(!envelope.payload.contains("selectedBlockId"));
}

#[tokio::test]
async fn test_writes_land_in_store() -> anyhow::Result<()> {
    let context = SyncContext::in_memory(EngineConfig::default());
    let initial = CampaignConfig::new("Persisted");
    let id = initial.id;

    let mut tab = SyncedSession::create(initial, registry(), &context);
    for t in ["Hero1", "Features1", "Footer1"] {
        tab.apply(add(t));
    }
    tab.flush().await?;

    assert_eq!(stored(&context, id).as_ref(), Some(&*tab.document()));

    let stats = tab.dispose().await?;
    assert_eq!(stats.landed_stamp, Some(3));
    assert_eq!(stats.failed, 0);
    Ok(())
}

/// Memory store that stalls on values containing `marker`
struct LaggingStore {
    inner: MemoryStore,
    marker: &'static str,
    lag: Duration,
}

impl KeyValueStore for LaggingStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if value.contains(self.marker) {
            std::thread::sleep(self.lag);
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_slow_sibling_write_does_not_overwrite_newer_one() -> anyhow::Result<()> {
    init_tracing();
    let store = Arc::new(LaggingStore {
        inner: MemoryStore::new(),
        marker: "From A",
        lag: Duration::from_millis(30),
    });
    let context = SyncContext::new(EngineConfig::default(), store);
    let initial = CampaignConfig::new("Shared");
    let id = initial.id;

    let mut tab_a = SyncedSession::create(initial.clone(), registry(), &context);
    let mut tab_b = SyncedSession::create(initial.clone(), registry(), &context);

    tab_a.apply(Mutation::RenameCampaign { name: "From A".into() });
    assert!(tab_b.poll_remote());
    tab_b.apply(Mutation::RenameCampaign { name: "From B".into() });
    assert!(tab_a.poll_remote());

    tab_a.flush().await?;
    tab_b.flush().await?;

    assert_eq!(tab_a.document().name, "From B");
    assert_eq!(tab_b.document().name, "From B");
    assert_eq!(stored(&context, id).map(|doc| doc.name).as_deref(), Some("From B"));

    tab_a.dispose().await?;
    tab_b.dispose().await?;

    let reopened = SyncedSession::create(initial, registry(), &context);
    assert_eq!(reopened.origin(), Origin::Stored);
    assert_eq!(reopened.document().name, "From B");
    reopened.dispose().await?;
    Ok(())
}

#[tokio::test]
async fn test_reopen_rehydrates_from_store() -> anyhow::Result<()> {
    let context = SyncContext::in_memory(EngineConfig::default());
    let initial = CampaignConfig::new("Reopen");

    let mut tab = SyncedSession::create(initial.clone(), registry(), &context);
    assert_eq!(tab.origin(), Origin::Initial);
    tab.apply(add("Image1"));
    let edited = tab.document();
    tab.dispose().await?;

    let reopened = SyncedSession::create(initial, registry(), &context);
    assert_eq!(reopened.origin(), Origin::Stored);
    assert_eq!(*reopened.document(), *edited);
    assert!(!reopened.has_unsaved_changes());
    reopened.dispose().await?;
    Ok(())
}

#[tokio::test]
async fn test_corrupt_store_falls_back_to_initial() -> anyhow::Result<()> {
    init_tracing();
    let context = SyncContext::in_memory(EngineConfig::default());
    let initial = CampaignConfig::new("Fallback");
    let key = storage_key(&context.config.storage_key_prefix, initial.id);
    context.store.set(&key, r#"{"id": 42, "blocks": "nope"}"#)?;

    let tab = SyncedSession::create(initial.clone(), registry(), &context);
    assert_eq!(tab.origin(), Origin::Initial);
    assert_eq!(*tab.document(), initial);
    assert_eq!(context.store.get(&key)?, None);

    tab.dispose().await?;
    Ok(())
}

#[tokio::test]
async fn test_quota_failure_keeps_document_and_unsaved_flag() -> anyhow::Result<()> {
    init_tracing();
    let store = Arc::new(MemoryStore::with_quota(64));
    let context = SyncContext::new(EngineConfig::default(), store.clone());
    let initial = CampaignConfig::new("Quota");

    let mut tab = SyncedSession::create(initial, registry(), &context);
    assert_eq!(tab.apply(add("Hero1")), ApplyOutcome::Applied);
    tab.flush().await?;

    assert_eq!(tab.document().blocks.len(), 1);
    assert!(tab.has_unsaved_changes());
    assert!(store.is_empty());

    let stats = tab.dispose().await?;
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.written, 0);
    Ok(())
}

#[tokio::test]
async fn test_file_store_backed_session() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = Arc::new(FileStore::new(dir.path()));
    let context = SyncContext::new(EngineConfig::default(), store.clone());
    let initial = CampaignConfig::new("On disk");
    let id = initial.id;

    let mut tab = SyncedSession::create(initial.clone(), registry(), &context);
    tab.apply(add("Form1"));
    tab.apply(Mutation::UpdateGlobalStyle {
        path: "globalFont".into(),
        value: json!("Lora"),
    });
    tab.dispose().await?;

    let key = storage_key(&context.config.storage_key_prefix, id);
    assert!(store.path_for(&key).exists());

    let reopened = SyncedSession::create(initial, registry(), &context);
    assert_eq!(reopened.document().theme.global_font, "Lora");
    assert_eq!(reopened.document().blocks[0].block_type, "Form1");
    reopened.dispose().await?;
    Ok(())
}

#[tokio::test]
async fn test_config_flows_into_session() -> anyhow::Result<()> {
    let config = EngineConfig::from_json_str(
        r#"{ "historyLimit": 2, "storageKeyPrefix": "tests", "channelCapacity": 8 }"#,
    )?;
    let context = SyncContext::in_memory(config);
    let initial = CampaignConfig::new("Configured");

    let mut tab = SyncedSession::create(initial.clone(), registry(), &context);
    assert_eq!(tab.storage_key(), format!("tests:{}", initial.id));

    for _ in 0..4 {
        tab.apply(add("Text1"));
    }
    assert_eq!(tab.session().history().undo_depth(), 2);

    tab.dispose().await?;
    Ok(())
}
