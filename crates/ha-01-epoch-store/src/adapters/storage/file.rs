use super::{apply_batch, scan_prefix};
use crate::domain::errors::KVStoreError;
use crate::ports::outbound::{BatchOperation, KeyValueStore, ScanResult};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// File magic of the database format.
const MAGIC: &[u8; 4] = b"EPDB";

/// On-disk format version.
const FORMAT_VERSION: u8 = 1;

/// Single-file key-value store.
///
/// Persists the whole table to one file, written atomically via a temp file,
/// `fsync` and `rename`. A batch is first applied to a copy of the table; the
/// in-memory state is only replaced once the file is durable, so a failed
/// write leaves both memory and disk at the previous commit.
///
/// ## File format
///
/// ```text
/// "EPDB" | version:u8 | ([key_len:u32][key][value_len:u32][value])* | crc32:u32
/// ```
pub struct FileBackedKVStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    path: PathBuf,
}

impl FileBackedKVStore {
    /// Open the store at `path`, creating an empty one if the file is absent.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, KVStoreError> {
        let path = path.as_ref().to_path_buf();

        let data = match fs::read(&path) {
            Ok(bytes) => {
                tracing::info!(
                    "[ha-01] Found existing database file: {} ({} bytes)",
                    path.display(),
                    bytes.len()
                );
                decode(&bytes)?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("[ha-01] No existing database file at {}", path.display());
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        tracing::debug!("[ha-01] Loaded {} keys from {}", data.len(), path.display());
        Ok(Self { data, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save_to_file(&self, data: &BTreeMap<Vec<u8>, Vec<u8>>) -> Result<(), KVStoreError> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let bytes = encode(data);

        let temp_path = self.path.with_extension("tmp");
        let mut file = File::create(&temp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileBackedKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        let mut next = self.data.clone();
        apply_batch(&mut next, operations);
        self.save_to_file(&next)?;
        self.data = next;
        Ok(())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError> {
        Ok(scan_prefix(&self.data, prefix))
    }
}

fn encode(data: &BTreeMap<Vec<u8>, Vec<u8>>) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(MAGIC);
    bytes.push(FORMAT_VERSION);

    for (key, value) in data {
        bytes.extend_from_slice(&(key.len() as u32).to_le_bytes());
        bytes.extend_from_slice(key);
        bytes.extend_from_slice(&(value.len() as u32).to_le_bytes());
        bytes.extend_from_slice(value);
    }

    let checksum = crc32fast::hash(&bytes);
    bytes.extend_from_slice(&checksum.to_le_bytes());
    bytes
}

fn decode(bytes: &[u8]) -> Result<BTreeMap<Vec<u8>, Vec<u8>>, KVStoreError> {
    let corrupt = |message: &str| KVStoreError::Corruption {
        message: message.to_string(),
    };

    if bytes.len() < MAGIC.len() + 1 + 4 {
        return Err(corrupt("file too short"));
    }
    let (body, trailer) = bytes.split_at(bytes.len() - 4);
    let expected = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    let actual = crc32fast::hash(body);
    if expected != actual {
        return Err(KVStoreError::Corruption {
            message: format!("checksum mismatch: expected {expected:08x}, got {actual:08x}"),
        });
    }
    if &body[..4] != MAGIC {
        return Err(corrupt("bad magic"));
    }
    if body[4] != FORMAT_VERSION {
        return Err(KVStoreError::Corruption {
            message: format!("unsupported format version {}", body[4]),
        });
    }

    let mut data = BTreeMap::new();
    let mut cursor = 5;
    while cursor < body.len() {
        let key = read_chunk(body, &mut cursor).ok_or_else(|| corrupt("truncated key"))?;
        let value = read_chunk(body, &mut cursor).ok_or_else(|| corrupt("truncated value"))?;
        data.insert(key, value);
    }
    Ok(data)
}

/// Read one length-prefixed chunk, advancing `cursor`.
fn read_chunk(body: &[u8], cursor: &mut usize) -> Option<Vec<u8>> {
    let len_end = cursor.checked_add(4)?;
    let len = u32::from_le_bytes(body.get(*cursor..len_end)?.try_into().ok()?) as usize;
    let end = len_end.checked_add(len)?;
    let chunk = body.get(len_end..end)?.to_vec();
    *cursor = end;
    Some(chunk)
}
