use crate::errors::CoreError;

use super::encryption::{KdfParams, NONCE_LEN, SALT_LEN};

/// Magic bytes identifying a PTRK (Portfolio Tracker) file.
pub const MAGIC: &[u8; 4] = b"PTRK";

/// Current file format version.
pub const CURRENT_VERSION: u16 = 1;

/// Minimum header size in bytes:
/// magic(4) + version(2) + kdf_params(12) + salt(16) + nonce(12) + ciphertext_len(8) = 54
pub const MIN_HEADER_SIZE: usize = 54;

/// File header read from an encrypted .ptrk file.
#[derive(Debug)]
pub struct FileHeader {
    pub version: u16,
    pub kdf_params: KdfParams,
    pub salt: [u8; SALT_LEN],
    pub nonce: [u8; NONCE_LEN],
    pub ciphertext_len: u64,
}

/// Write a complete encrypted file to bytes.
///
/// Layout:
/// ```text
/// [PTRK: 4B] [version: 2B LE] [memory_cost: 4B LE] [time_cost: 4B LE]
/// [parallelism: 4B LE] [salt: 16B] [nonce: 12B] [ciphertext_len: 8B LE]
/// [ciphertext: variable]
/// ```
pub fn write_file(
    version: u16,
    kdf_params: &KdfParams,
    salt: &[u8; SALT_LEN],
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(MIN_HEADER_SIZE + ciphertext.len());
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&version.to_le_bytes());
    buf.extend_from_slice(&kdf_params.memory_cost.to_le_bytes());
    buf.extend_from_slice(&kdf_params.time_cost.to_le_bytes());
    buf.extend_from_slice(&kdf_params.parallelism.to_le_bytes());
    buf.extend_from_slice(salt);
    buf.extend_from_slice(nonce);
    buf.extend_from_slice(&(ciphertext.len() as u64).to_le_bytes());
    buf.extend_from_slice(ciphertext);
    buf
}

/// Sequential reader over the raw file bytes.
struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8], CoreError> {
        let end = self.pos + n;
        if end > self.data.len() {
            return Err(CoreError::InvalidFileFormat(format!(
                "File truncated while reading {what}"
            )));
        }
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_u16(&mut self, what: &str) -> Result<u16, CoreError> {
        let bytes = self.take(2, what)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn read_u32(&mut self, what: &str) -> Result<u32, CoreError> {
        let bytes = self.take(4, what)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_u64(&mut self, what: &str) -> Result<u64, CoreError> {
        let bytes = self.take(8, what)?;
        let mut out = [0u8; 8];
        out.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(out))
    }
}

/// Parse the header from raw file bytes.
/// Returns the header and the ciphertext slice.
pub fn read_file(data: &[u8]) -> Result<(FileHeader, &[u8]), CoreError> {
    if data.len() < MIN_HEADER_SIZE {
        return Err(CoreError::InvalidFileFormat(
            "File too small to be a valid PTRK file".into(),
        ));
    }

    let mut reader = ByteReader::new(data);

    if reader.take(4, "magic")? != MAGIC {
        return Err(CoreError::InvalidFileFormat(
            "Invalid magic bytes — not a PTRK file".into(),
        ));
    }

    let version = reader.read_u16("version")?;
    if version == 0 || version > CURRENT_VERSION {
        return Err(CoreError::UnsupportedVersion(version));
    }

    let memory_cost = reader.read_u32("KDF memory_cost")?;
    let time_cost = reader.read_u32("KDF time_cost")?;
    let parallelism = reader.read_u32("KDF parallelism")?;

    // Validate KDF params so a crafted file can't demand absurd
    // resources during key derivation.
    if !(8..=1_048_576).contains(&memory_cost) {
        return Err(CoreError::InvalidFileFormat(format!(
            "KDF memory_cost out of safe range: {memory_cost} KiB (expected 8..1048576)"
        )));
    }
    if !(1..=20).contains(&time_cost) {
        return Err(CoreError::InvalidFileFormat(format!(
            "KDF time_cost out of safe range: {time_cost} (expected 1..20)"
        )));
    }
    if !(1..=16).contains(&parallelism) {
        return Err(CoreError::InvalidFileFormat(format!(
            "KDF parallelism out of safe range: {parallelism} (expected 1..16)"
        )));
    }

    let mut salt = [0u8; SALT_LEN];
    salt.copy_from_slice(reader.take(SALT_LEN, "salt")?);

    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(reader.take(NONCE_LEN, "nonce")?);

    let ciphertext_len = reader.read_u64("ciphertext length")?;
    let available = (data.len() - reader.pos) as u64;
    if available < ciphertext_len {
        return Err(CoreError::InvalidFileFormat(format!(
            "File truncated: expected {ciphertext_len} bytes of ciphertext, got {available}"
        )));
    }
    let ciphertext = reader.take(ciphertext_len as usize, "ciphertext")?;

    Ok((
        FileHeader {
            version,
            kdf_params: KdfParams {
                memory_cost,
                time_cost,
                parallelism,
            },
            salt,
            nonce,
            ciphertext_len,
        },
        ciphertext,
    ))
}
