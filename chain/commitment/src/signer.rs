//! Operator threshold signing over batch roots
//!
//! Each configured operator key signs SHA-256 of the root bytes; the
//! signatures aggregate non-interactively into one signature the
//! settlement contract checks against the aggregate public key. With no
//! keys configured the signer runs in mock mode and produces a
//! deterministic, prefix-detectable placeholder.

use blst::min_pk::{AggregateSignature, SecretKey, Signature};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::SignError;

/// Ciphersuite domain separation tag for operator signatures.
const DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_NUL_";

/// Prefix of the development placeholder signature.
pub const MOCK_SIGNATURE_PREFIX: &[u8] = b"mock_bls_signature_";

/// Returns true when the bytes are a mock placeholder, not a real signature.
pub fn is_mock_signature(sig: &[u8]) -> bool {
    sig.starts_with(MOCK_SIGNATURE_PREFIX)
}

/// Aggregating signer over the configured operator key set
pub struct ThresholdSigner {
    keys: Vec<SecretKey>,
}

impl ThresholdSigner {
    /// Signer with no keys; always produces mock signatures.
    pub fn mock() -> Self {
        Self { keys: Vec::new() }
    }

    /// Load operator keys from a comma-separated hex list.
    ///
    /// Undecodable or invalid keys are skipped with a warning; they never
    /// abort startup.
    pub fn from_env_value(raw: &str) -> Self {
        let mut keys = Vec::new();
        for (index, entry) in raw.split(',').enumerate() {
            let entry = entry.trim().trim_start_matches("0x");
            if entry.is_empty() {
                continue;
            }
            let bytes = match hex::decode(entry) {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!(index, %err, "skipping undecodable operator key");
                    continue;
                }
            };
            match SecretKey::from_bytes(&bytes) {
                Ok(key) => keys.push(key),
                Err(err) => {
                    warn!(index, ?err, "skipping invalid operator key");
                }
            }
        }
        info!(operators = keys.len(), "loaded operator signing keys");
        Self { keys }
    }

    /// True when no operator keys are configured.
    pub fn is_mock(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of configured operator keys.
    pub fn operator_count(&self) -> usize {
        self.keys.len()
    }

    /// Aggregate an operator signature over the batch root.
    ///
    /// The signed message is SHA-256 of the 32 root bytes. Individually
    /// invalid signatures are skipped; an empty surviving set is an error.
    pub fn aggregate(&self, root: &[u8; 32]) -> Result<Vec<u8>, SignError> {
        if self.keys.is_empty() {
            let root_hex = hex::encode(root);
            let mut sig = MOCK_SIGNATURE_PREFIX.to_vec();
            sig.extend_from_slice(root_hex[..16].as_bytes());
            info!(root = %root_hex, "no operator keys configured, using mock signature");
            return Ok(sig);
        }

        let message: [u8; 32] = Sha256::digest(root).into();

        let mut signatures: Vec<Signature> = Vec::with_capacity(self.keys.len());
        for (index, key) in self.keys.iter().enumerate() {
            let signature = key.sign(&message, DST, &[]);
            if let Err(err) = signature.validate(true) {
                warn!(index, ?err, "operator signature failed validation, skipping");
                continue;
            }
            signatures.push(signature);
        }

        if signatures.is_empty() {
            return Err(SignError::EmptyQuorum {
                operators: self.keys.len(),
            });
        }

        let refs: Vec<&Signature> = signatures.iter().collect();
        let aggregate = AggregateSignature::aggregate(&refs, false)
            .map_err(|err| SignError::Aggregation(format!("{err:?}")))?;

        info!(
            signers = signatures.len(),
            operators = self.keys.len(),
            "aggregated operator signatures"
        );
        Ok(aggregate.to_signature().to_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_root() -> [u8; 32] {
        Sha256::digest(b"batch under test").into()
    }

    // Small scalars are valid secret keys on the signing curve.
    fn hex_key(fill: u8) -> String {
        hex::encode([fill; 32])
    }

    #[test]
    fn test_mock_signature_shape() {
        let signer = ThresholdSigner::mock();
        assert!(signer.is_mock());

        let root = test_root();
        let sig = signer.aggregate(&root).unwrap();

        assert!(is_mock_signature(&sig));
        let expected_suffix = &hex::encode(root)[..16];
        assert!(sig.ends_with(expected_suffix.as_bytes()));
    }

    #[test]
    fn test_mock_signature_is_deterministic() {
        let signer = ThresholdSigner::mock();
        let root = test_root();
        assert_eq!(signer.aggregate(&root).unwrap(), signer.aggregate(&root).unwrap());
    }

    #[test]
    fn test_key_loading_skips_invalid_entries() {
        let raw = format!("not-hex,,{},0x{}", hex_key(1), hex_key(2));
        let signer = ThresholdSigner::from_env_value(&raw);
        assert_eq!(signer.operator_count(), 2);
        assert!(!signer.is_mock());
    }

    #[test]
    fn test_all_invalid_keys_falls_back_to_mock() {
        let signer = ThresholdSigner::from_env_value("zz,not-a-key");
        assert!(signer.is_mock());

        let sig = signer.aggregate(&test_root()).unwrap();
        assert!(is_mock_signature(&sig));
    }

    #[test]
    fn test_real_aggregate_is_not_mock_shaped() {
        let raw = format!("{},{}", hex_key(1), hex_key(2));
        let signer = ThresholdSigner::from_env_value(&raw);

        let sig = signer.aggregate(&test_root()).unwrap();
        assert!(!is_mock_signature(&sig));
        // Compressed aggregate signature on the signature subgroup
        assert_eq!(sig.len(), 96);
    }

    #[test]
    fn test_real_aggregate_is_deterministic() {
        let raw = hex_key(3);
        let signer = ThresholdSigner::from_env_value(&raw);
        let root = test_root();
        assert_eq!(signer.aggregate(&root).unwrap(), signer.aggregate(&root).unwrap());
    }

    #[test]
    fn test_aggregate_differs_per_root() {
        let signer = ThresholdSigner::from_env_value(&hex_key(3));
        let other_root: [u8; 32] = Sha256::digest(b"another batch").into();
        assert_ne!(
            signer.aggregate(&test_root()).unwrap(),
            signer.aggregate(&other_root).unwrap()
        );
    }
}
