use crate::errors::CoreError;
use crate::store::records::StoreData;

use super::encryption::{self, KdfParams};
use super::format;

/// High-level storage operations: save/load the record store's data
/// to/from encrypted bytes or files.
pub struct StorageManager;

impl StorageManager {
    /// Encrypt and serialize store data to raw bytes (portable,
    /// platform-independent).
    ///
    /// Flow: StoreData → bincode → AES-256-GCM(Argon2id(password)) → PTRK bytes
    pub fn save_to_bytes(data: &StoreData, password: &str) -> Result<Vec<u8>, CoreError> {
        let plaintext = bincode::serialize(data)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize store: {e}")))?;

        let salt = encryption::generate_salt()?;
        let nonce = encryption::generate_nonce()?;

        let kdf_params = KdfParams::default();
        let key = encryption::derive_key(password, &salt, &kdf_params)?;

        let ciphertext = encryption::encrypt(&plaintext, &key, &nonce)?;

        Ok(format::write_file(
            format::CURRENT_VERSION,
            &kdf_params,
            &salt,
            &nonce,
            &ciphertext,
        ))
    }

    /// Decrypt and deserialize store data from raw bytes.
    ///
    /// Flow: PTRK bytes → parse header → Argon2id(password, salt) → decrypt → bincode → StoreData
    pub fn load_from_bytes(bytes: &[u8], password: &str) -> Result<StoreData, CoreError> {
        let (header, ciphertext) = format::read_file(bytes)?;

        let key = encryption::derive_key(password, &header.salt, &header.kdf_params)?;
        let plaintext = encryption::decrypt(ciphertext, &key, &header.nonce)?;

        bincode::deserialize(&plaintext)
            .map_err(|e| CoreError::Deserialization(format!("Failed to deserialize store: {e}")))
    }

    /// Save store data to an encrypted file on disk (native only).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_file(data: &StoreData, path: &str, password: &str) -> Result<(), CoreError> {
        let bytes = Self::save_to_bytes(data, password)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Load store data from an encrypted file on disk (native only).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_file(path: &str, password: &str) -> Result<StoreData, CoreError> {
        let bytes = std::fs::read(path)?;
        Self::load_from_bytes(&bytes, password)
    }
}
