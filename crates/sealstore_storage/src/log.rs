//! Record log used by [`crate::FileProvider`].
//!
//! ## Frame layout
//!
//! ```text
//! magic "SLOG" (4) | version (2) | type (1) | payload len (4) | payload | crc32 (4)
//! ```
//!
//! The CRC covers every byte before it. Integers are little-endian.

use crate::error::{StorageError, StorageResult};

/// Magic bytes identifying a log frame.
pub const LOG_MAGIC: [u8; 4] = *b"SLOG";

/// Current log format version.
pub const LOG_VERSION: u16 = 1;

/// magic (4) + version (2) + type (1) + length (4)
pub const FRAME_HEADER_SIZE: usize = 11;

/// Size of the trailing checksum.
pub const CRC_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum FrameType {
    Put = 1,
    Delete = 2,
    Clear = 3,
}

impl FrameType {
    fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::Put),
            2 => Some(Self::Delete),
            3 => Some(Self::Clear),
            _ => None,
        }
    }
}

/// A mutation recorded in the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRecord {
    /// Insert or replace a value.
    Put {
        /// Record key.
        key: String,
        /// Stored bytes.
        value: Vec<u8>,
    },
    /// Remove a key.
    Delete {
        /// Record key.
        key: String,
    },
    /// Remove every key.
    Clear,
}

impl LogRecord {
    fn frame_type(&self) -> FrameType {
        match self {
            Self::Put { .. } => FrameType::Put,
            Self::Delete { .. } => FrameType::Delete,
            Self::Clear => FrameType::Clear,
        }
    }

    fn encode_payload(&self) -> StorageResult<Vec<u8>> {
        let mut buf = Vec::new();
        match self {
            Self::Put { key, value } => {
                put_bytes(&mut buf, key.as_bytes())?;
                put_bytes(&mut buf, value)?;
            }
            Self::Delete { key } => put_bytes(&mut buf, key.as_bytes())?,
            Self::Clear => {}
        }
        Ok(buf)
    }

    fn decode_payload(frame_type: FrameType, payload: &[u8]) -> StorageResult<Self> {
        let mut cursor = 0;
        let record = match frame_type {
            FrameType::Put => {
                let key = take_string(payload, &mut cursor)?;
                let value = take_bytes(payload, &mut cursor)?.to_vec();
                Self::Put { key, value }
            }
            FrameType::Delete => Self::Delete {
                key: take_string(payload, &mut cursor)?,
            },
            FrameType::Clear => Self::Clear,
        };

        if cursor != payload.len() {
            return Err(StorageError::corrupted(format!(
                "trailing bytes in {frame_type:?} frame: expected {cursor} bytes, got {}",
                payload.len()
            )));
        }
        Ok(record)
    }

    /// Encodes the record as a complete frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the key or value exceeds 4 GiB.
    pub fn encode(&self) -> StorageResult<Vec<u8>> {
        let payload = self.encode_payload()?;
        let len = u32::try_from(payload.len())
            .map_err(|_| StorageError::backend("log record payload too large"))?;

        let mut data = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len() + CRC_SIZE);
        data.extend_from_slice(&LOG_MAGIC);
        data.extend_from_slice(&LOG_VERSION.to_le_bytes());
        data.push(self.frame_type() as u8);
        data.extend_from_slice(&len.to_le_bytes());
        data.extend_from_slice(&payload);

        let crc = compute_crc32(&data);
        data.extend_from_slice(&crc.to_le_bytes());
        Ok(data)
    }
}

/// Result of scanning a log.
#[derive(Debug, Default)]
pub struct Replay {
    /// Every intact record, in order.
    pub records: Vec<LogRecord>,
    /// Length of the intact prefix. Anything after it is a torn tail.
    pub valid_len: usize,
}

impl Replay {
    /// Returns true if bytes after the intact prefix were discarded.
    #[must_use]
    pub fn is_torn(&self, total_len: usize) -> bool {
        self.valid_len < total_len
    }
}

/// Decodes every frame in `data`.
///
/// An incomplete frame at the end, or a final frame whose checksum does not
/// match, is treated as an interrupted write and excluded from
/// [`Replay::valid_len`].
///
/// # Errors
///
/// Returns [`StorageError::Corrupted`] for bad magic, an unknown version or
/// frame type, or a checksum mismatch before the last frame.
pub fn replay(data: &[u8]) -> StorageResult<Replay> {
    let mut replay = Replay::default();
    let mut offset = 0;

    while offset < data.len() {
        let rest = &data[offset..];
        if rest.len() < FRAME_HEADER_SIZE {
            break;
        }

        if rest[0..4] != LOG_MAGIC {
            return Err(StorageError::corrupted(format!(
                "invalid frame magic at offset {offset}"
            )));
        }
        let version = u16::from_le_bytes([rest[4], rest[5]]);
        if version != LOG_VERSION {
            return Err(StorageError::corrupted(format!(
                "unsupported log version {version} at offset {offset}"
            )));
        }
        let frame_type = FrameType::from_byte(rest[6]).ok_or_else(|| {
            StorageError::corrupted(format!("unknown frame type {} at offset {offset}", rest[6]))
        })?;
        let len = u32::from_le_bytes([rest[7], rest[8], rest[9], rest[10]]) as usize;

        let frame_len = FRAME_HEADER_SIZE + len + CRC_SIZE;
        if rest.len() < frame_len {
            break;
        }

        let body = &rest[..FRAME_HEADER_SIZE + len];
        let stored = &rest[FRAME_HEADER_SIZE + len..frame_len];
        let stored_crc = u32::from_le_bytes([stored[0], stored[1], stored[2], stored[3]]);
        if compute_crc32(body) != stored_crc {
            if offset + frame_len == data.len() {
                break;
            }
            return Err(StorageError::corrupted(format!(
                "checksum mismatch at offset {offset}"
            )));
        }

        let payload = &body[FRAME_HEADER_SIZE..];
        replay
            .records
            .push(LogRecord::decode_payload(frame_type, payload)?);
        offset += frame_len;
        replay.valid_len = offset;
    }

    Ok(replay)
}

fn put_bytes(buf: &mut Vec<u8>, bytes: &[u8]) -> StorageResult<()> {
    let len = u32::try_from(bytes.len())
        .map_err(|_| StorageError::backend("log field exceeds 4 GiB"))?;
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(bytes);
    Ok(())
}

fn take_bytes<'a>(payload: &'a [u8], cursor: &mut usize) -> StorageResult<&'a [u8]> {
    let header = payload
        .get(*cursor..*cursor + 4)
        .ok_or_else(|| StorageError::corrupted("unexpected end of payload"))?;
    let len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
    *cursor += 4;

    let bytes = payload
        .get(*cursor..*cursor + len)
        .ok_or_else(|| StorageError::corrupted("unexpected end of payload"))?;
    *cursor += len;
    Ok(bytes)
}

fn take_string(payload: &[u8], cursor: &mut usize) -> StorageResult<String> {
    let bytes = take_bytes(payload, cursor)?;
    String::from_utf8(bytes.to_vec()).map_err(|_| StorageError::corrupted("key is not UTF-8"))
}

/// Computes the CRC-32 (IEEE) checksum of `data`.
#[must_use]
pub fn compute_crc32(data: &[u8]) -> u32 {
    const TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u32;
            let mut j = 0;
            while j < 8 {
                crc = if crc & 1 != 0 {
                    (crc >> 1) ^ 0xEDB8_8320
                } else {
                    crc >> 1
                };
                j += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    };

    !data.iter().fold(0xFFFF_FFFF_u32, |crc, &byte| {
        (crc >> 8) ^ TABLE[((crc ^ u32::from(byte)) & 0xFF) as usize]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_of(records: &[LogRecord]) -> Vec<u8> {
        records
            .iter()
            .flat_map(|r| r.encode().unwrap())
            .collect()
    }

    #[test]
    fn crc32_check_value() {
        assert_eq!(compute_crc32(b"123456789"), 0xCBF4_3926);
        assert_eq!(compute_crc32(b""), 0);
    }

    #[test]
    fn replay_reads_all_frames() {
        let records = vec![
            LogRecord::Put {
                key: "a".into(),
                value: vec![1, 2, 3],
            },
            LogRecord::Delete { key: "a".into() },
            LogRecord::Clear,
            LogRecord::Put {
                key: "b".into(),
                value: Vec::new(),
            },
        ];
        let data = log_of(&records);
        let replay = replay(&data).unwrap();
        assert_eq!(replay.records, records);
        assert_eq!(replay.valid_len, data.len());
        assert!(!replay.is_torn(data.len()));
    }

    #[test]
    fn empty_log() {
        let replay = replay(&[]).unwrap();
        assert!(replay.records.is_empty());
        assert_eq!(replay.valid_len, 0);
    }

    #[test]
    fn torn_tail_is_dropped() {
        let first = LogRecord::Put {
            key: "k".into(),
            value: b"v".to_vec(),
        };
        let mut data = first.encode().unwrap();
        let intact = data.len();
        let second = LogRecord::Delete { key: "k".into() }.encode().unwrap();
        data.extend_from_slice(&second[..second.len() - 3]);

        let replay = replay(&data).unwrap();
        assert_eq!(replay.records, vec![first]);
        assert_eq!(replay.valid_len, intact);
        assert!(replay.is_torn(data.len()));
    }

    #[test]
    fn bad_crc_on_last_frame_is_torn() {
        let mut data = log_of(&[LogRecord::Clear, LogRecord::Clear]);
        let last = data.len() - 1;
        data[last] ^= 0xFF;

        let replay = replay(&data).unwrap();
        assert_eq!(replay.records, vec![LogRecord::Clear]);
    }

    #[test]
    fn bad_crc_mid_log_is_corruption() {
        let mut data = log_of(&[
            LogRecord::Put {
                key: "a".into(),
                value: vec![0; 8],
            },
            LogRecord::Clear,
        ]);
        data[FRAME_HEADER_SIZE + 6] ^= 0xFF;

        assert!(matches!(replay(&data), Err(StorageError::Corrupted(_))));
    }

    #[test]
    fn bad_magic_is_corruption() {
        let mut data = LogRecord::Clear.encode().unwrap();
        data[0] = b'X';
        assert!(matches!(replay(&data), Err(StorageError::Corrupted(_))));
    }
}
