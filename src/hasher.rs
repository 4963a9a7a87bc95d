use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

use log::debug;
use md5::{Digest, Md5};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::FileError;

/// Read size used when streaming file content into the digest.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// 128-bit MD5 digest of a file's full byte content.
///
/// Two files with the same `FileHash` are treated as content-equal; there is
/// no byte-by-byte verification afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileHash([u8; 16]);

impl FileHash {
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for FileHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::LowerHex for FileHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for FileHash {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 16];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl Serialize for FileHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for FileHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Digest of an in-memory buffer.
pub fn hash_bytes(bytes: &[u8]) -> FileHash {
    finish(Md5::new_with_prefix(bytes))
}

/// Streams `reader` to EOF in `chunk_size` reads. A zero chunk size falls
/// back to [`DEFAULT_CHUNK_SIZE`].
pub fn hash_reader<R: Read>(reader: R, chunk_size: usize) -> io::Result<FileHash> {
    digest_reader(reader, chunk_size).map(|(hash, _)| hash)
}

/// Like [`hash_reader`], also returning the number of bytes consumed.
pub(crate) fn digest_reader<R: Read>(mut reader: R, chunk_size: usize) -> io::Result<(FileHash, u64)> {
    let chunk_size = if chunk_size == 0 { DEFAULT_CHUNK_SIZE } else { chunk_size };
    let mut hasher = Md5::new();
    let mut buffer = vec![0u8; chunk_size];
    let mut total_bytes = 0u64;

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
        total_bytes += bytes_read as u64;
    }

    Ok((finish(hasher), total_bytes))
}

pub fn hash_file(file_path: &Path) -> Result<FileHash, FileError> {
    hash_file_with_chunk_size(file_path, DEFAULT_CHUNK_SIZE)
}

pub fn hash_file_with_chunk_size(file_path: &Path, chunk_size: usize) -> Result<FileHash, FileError> {
    hash_file_counted(file_path, chunk_size).map(|(hash, _)| hash)
}

pub(crate) fn hash_file_counted(file_path: &Path, chunk_size: usize) -> Result<(FileHash, u64), FileError> {
    let file = fs::File::open(file_path).map_err(|e| FileError::from_io(file_path, &e))?;
    let (hash, total_bytes) =
        digest_reader(file, chunk_size).map_err(|e| FileError::from_io(file_path, &e))?;
    debug!("Hashed '{}': {} ({} bytes)", file_path.display(), hash, total_bytes);
    Ok((hash, total_bytes))
}

fn finish(hasher: Md5) -> FileHash {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hasher.finalize());
    FileHash(bytes)
}
