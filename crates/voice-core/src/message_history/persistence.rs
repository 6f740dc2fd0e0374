use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{HistoryLimits, MessageHistory, MessageHistoryEntry};

const MAGIC: &[u8; 4] = b"VXMH";
const VERSION: u8 = 1;

/// Flat serialization format: ordered (sentence, prefix, timestamp) records.
#[derive(Serialize, Deserialize)]
struct MessageHistoryData {
    records: Vec<MessageRecord>,
}

#[derive(Serialize, Deserialize)]
struct MessageRecord {
    sentence: String,
    prefix: String,
    timestamp: u64,
}

impl MessageHistory {
    /// Serialize to bytes (VXMH format).
    pub fn to_bytes(&self) -> Result<Vec<u8>, io::Error> {
        let data = MessageHistoryData {
            records: self
                .entries
                .iter()
                .map(|e| MessageRecord {
                    sentence: e.sentence.clone(),
                    prefix: e.user_prefix.clone(),
                    timestamp: e.timestamp,
                })
                .collect(),
        };
        let body = bincode::serialize(&data).map_err(io::Error::other)?;

        let mut buf = Vec::with_capacity(5 + body.len());
        buf.extend_from_slice(MAGIC);
        buf.push(VERSION);
        buf.extend_from_slice(&body);
        Ok(buf)
    }

    /// Deserialize from bytes (VXMH format).
    pub fn from_bytes(bytes: &[u8], limits: HistoryLimits) -> Result<Self, io::Error> {
        if bytes.len() < 5 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "too short"));
        }
        if &bytes[0..4] != MAGIC {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "bad magic"));
        }
        if bytes[4] != VERSION {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "unsupported version",
            ));
        }
        let data: MessageHistoryData = bincode::deserialize(&bytes[5..])
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let entries = data
            .records
            .into_iter()
            .map(|r| MessageHistoryEntry {
                sentence: r.sentence,
                user_prefix: r.prefix,
                timestamp: r.timestamp,
            })
            .collect();
        Ok(Self::from_entries(entries, limits))
    }

    /// Atomic write: write to .tmp then rename.
    pub fn save(&self, path: &Path) -> Result<(), io::Error> {
        let bytes = self.to_bytes()?;
        let tmp = path.with_extension("tmp");
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Open from file, returning an empty history if the file doesn't exist.
    pub fn open(path: &Path, limits: HistoryLimits) -> Result<Self, io::Error> {
        match fs::read(path) {
            Ok(bytes) => Self::from_bytes(&bytes, limits),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::with_limits(limits)),
            Err(e) => Err(e),
        }
    }
}
