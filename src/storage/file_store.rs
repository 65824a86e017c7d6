//! JSON file-backed conversation store.
//!
//! One file per conversation key, `chat_<key>.json`, holding the full log as
//! a JSON array. Saves go through a temp file followed by a rename so a
//! crashed or interrupted write never leaves a half-written log where a
//! subsequent load can see it.

use std::fs;
use std::path::{Path, PathBuf};

use crate::chat::{ConversationKey, Message};
use crate::error::{Error, Result};

use super::ConversationStore;

/// Conversation store writing one JSON file per conversation key
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at the given directory
    ///
    /// The directory is created if it does not exist.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| Error::StorageWriteError(format!("create {}: {}", dir.display(), e)))?;
        Ok(Self { dir })
    }

    fn log_path(&self, key: &ConversationKey) -> PathBuf {
        self.dir.join(format!("chat_{}.json", key.as_str()))
    }
}

impl ConversationStore for FileStore {
    fn load(&self, key: &ConversationKey) -> Result<Vec<Message>> {
        let path = self.log_path(key);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(Error::StorageReadError(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        };

        serde_json::from_str(&raw)
            .map_err(|e| Error::StorageReadError(format!("{}: {}", path.display(), e)))
    }

    fn save(&self, key: &ConversationKey, messages: &[Message]) -> Result<()> {
        let path = self.log_path(key);
        let tmp = path.with_extension("json.tmp");

        let encoded = serde_json::to_vec_pretty(messages)?;
        fs::write(&tmp, encoded)
            .map_err(|e| Error::StorageWriteError(format!("{}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &path)
            .map_err(|e| Error::StorageWriteError(format!("{}: {}", path.display(), e)))?;

        tracing::debug!("Persisted {} messages under {}", messages.len(), key);
        Ok(())
    }
}

/// List the conversation keys present under a directory
///
/// Convenience for tooling and tests; the engine itself never enumerates
/// conversations.
pub fn list_keys(dir: &Path) -> Result<Vec<String>> {
    let mut keys = Vec::new();
    for entry in fs::read_dir(dir)? {
        let name = entry?.file_name();
        let name = name.to_string_lossy();
        if let Some(key) = name
            .strip_prefix("chat_")
            .and_then(|rest| rest.strip_suffix(".json"))
        {
            keys.push(key.to_string());
        }
    }
    keys.sort();
    Ok(keys)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::MessageKind;
    use crate::identity::Identity;

    fn identity(id: &str, handle: &str) -> Identity {
        Identity {
            id: id.to_string(),
            handle: handle.to_string(),
            display_name: handle.to_string(),
            avatar_ref: String::new(),
            is_online: true,
            last_seen_at: 0,
        }
    }

    fn sample_log() -> Vec<Message> {
        let bob = identity("0xB", "bob");
        let alice = identity("0xA", "alice");
        vec![
            Message::outgoing(0, &bob, &alice, "hi", MessageKind::Text),
            Message::inbound(1, &alice, &bob, "hello"),
        ]
    }

    #[test]
    fn test_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();
        let key = ConversationKey::new("alice", "bob");
        let log = sample_log();

        store.save(&key, &log).unwrap();
        assert_eq!(store.load(&key).unwrap(), log);

        // A second store over the same directory sees the same data
        let reopened = FileStore::new(dir.path()).unwrap();
        assert_eq!(reopened.load(&key).unwrap(), log);
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();
        let key = ConversationKey::new("alice", "bob");
        assert!(store.load(&key).unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();
        let key = ConversationKey::new("alice", "bob");

        fs::write(dir.path().join("chat_alice-bob.json"), "{ not json").unwrap();

        let err = store.load(&key).unwrap_err();
        assert!(matches!(err, Error::StorageReadError(_)));
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();
        let key = ConversationKey::new("alice", "bob");

        store.save(&key, &sample_log()).unwrap();

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "temp files left behind: {:?}", leftovers);
    }

    #[test]
    fn test_list_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        store
            .save(&ConversationKey::new("alice", "bob"), &sample_log())
            .unwrap();
        store
            .save(&ConversationKey::new("carol", "bob"), &[])
            .unwrap();

        let keys = list_keys(dir.path()).unwrap();
        assert_eq!(keys, vec!["alice-bob", "bob-carol"]);
    }
}
