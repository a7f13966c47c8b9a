use crate::error::{BlockchainError, Result};
use crate::utils::{ecdsa_p256_sha256_sign_digest, new_key_pair, public_key_from_pkcs8};
use data_encoding::HEXLOWER;
use std::fmt;
use zeroize::Zeroizing;

/// The node's signing key and the public key its coinbase rewards credit.
///
/// Fixed for the lifetime of a node. The private key bytes are wiped when
/// the identity is dropped.
#[derive(Clone)]
pub struct MinerIdentity {
    pkcs8: Zeroizing<Vec<u8>>,
    public_key: Vec<u8>,
    owner_public_key: Vec<u8>,
}

impl MinerIdentity {
    /// Generate a fresh key pair. Rewards go to `owner_public_key`, or to the
    /// miner's own key when none is given.
    pub fn generate(owner_public_key: Option<Vec<u8>>) -> Result<MinerIdentity> {
        let pkcs8 = new_key_pair()?;
        Self::from_pkcs8(pkcs8, owner_public_key)
    }

    pub fn from_pkcs8(pkcs8: Vec<u8>, owner_public_key: Option<Vec<u8>>) -> Result<MinerIdentity> {
        let pkcs8 = Zeroizing::new(pkcs8);
        let public_key = public_key_from_pkcs8(&pkcs8)?;
        let owner_public_key = owner_public_key.unwrap_or_else(|| public_key.clone());
        Ok(MinerIdentity {
            pkcs8,
            public_key,
            owner_public_key,
        })
    }

    /// Build an identity from hex strings as they appear in configuration
    pub fn from_hex(pkcs8_hex: Option<&str>, owner_hex: Option<&str>) -> Result<MinerIdentity> {
        let owner = owner_hex.map(decode_hex).transpose()?;
        match pkcs8_hex {
            Some(key) => Self::from_pkcs8(decode_hex(key)?, owner),
            None => Self::generate(owner),
        }
    }

    pub fn get_public_key(&self) -> &[u8] {
        self.public_key.as_slice()
    }

    pub fn get_owner_public_key(&self) -> &[u8] {
        self.owner_public_key.as_slice()
    }

    pub fn get_pkcs8(&self) -> &[u8] {
        self.pkcs8.as_slice()
    }

    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        ecdsa_p256_sha256_sign_digest(&self.pkcs8, message)
    }
}

impl fmt::Debug for MinerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MinerIdentity")
            .field("public_key", &HEXLOWER.encode(&self.public_key))
            .field("owner_public_key", &HEXLOWER.encode(&self.owner_public_key))
            .finish()
    }
}

pub fn decode_hex(value: &str) -> Result<Vec<u8>> {
    HEXLOWER
        .decode(value.trim().to_lowercase().as_bytes())
        .map_err(|e| BlockchainError::Crypto(format!("Invalid hex string: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::ecdsa_p256_sha256_sign_verify;

    #[test]
    fn test_owner_defaults_to_miner_key() {
        let identity = MinerIdentity::generate(None).unwrap();
        assert_eq!(identity.get_public_key(), identity.get_owner_public_key());
    }

    #[test]
    fn test_explicit_owner() {
        let owner = MinerIdentity::generate(None).unwrap();
        let identity =
            MinerIdentity::generate(Some(owner.get_public_key().to_vec())).unwrap();

        assert_eq!(identity.get_owner_public_key(), owner.get_public_key());
        assert_ne!(identity.get_public_key(), owner.get_public_key());
    }

    #[test]
    fn test_from_hex_restores_same_key() {
        let original = MinerIdentity::generate(None).unwrap();
        let key_hex = HEXLOWER.encode(original.get_pkcs8());

        let restored = MinerIdentity::from_hex(Some(&key_hex), None).unwrap();
        assert_eq!(restored.get_public_key(), original.get_public_key());
    }

    #[test]
    fn test_from_hex_rejects_garbage() {
        assert!(MinerIdentity::from_hex(Some("zz"), None).is_err());
        assert!(MinerIdentity::from_hex(Some("abcd"), None).is_err());
    }

    #[test]
    fn test_sign() {
        let identity = MinerIdentity::generate(None).unwrap();
        let signature = identity.sign(b"block").unwrap();
        assert!(ecdsa_p256_sha256_sign_verify(
            identity.get_public_key(),
            &signature,
            b"block"
        ));
    }

    #[test]
    fn test_debug_hides_private_key() {
        let identity = MinerIdentity::generate(None).unwrap();
        let rendered = format!("{identity:?}");
        assert!(!rendered.contains(&HEXLOWER.encode(identity.get_pkcs8())));
    }
}
