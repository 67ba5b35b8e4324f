//! Private key loading and agent key generation.
//!
//! Security notes:
//! - Key bytes live in `Zeroizing` buffers and are wiped on drop.
//! - Keys are loaded once at startup; no runtime key rotation.
//! - Never log private key material.

use std::fmt;
use std::path::PathBuf;

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use zeroize::Zeroizing;

use crate::error::KeyError;

/// Source of the private key.
#[derive(Debug, Clone)]
pub enum KeySource {
    /// Load from environment variable (development).
    EnvVar { var_name: String },
    /// Load from file (production, recommend 0600 permissions).
    File { path: PathBuf },
}

// Parse hex key from string (supports 0x prefix and whitespace trimming)
fn parse_hex_key(hex_str: &str) -> Result<Zeroizing<Vec<u8>>, KeyError> {
    let trimmed = hex_str.trim().trim_start_matches("0x");
    Ok(Zeroizing::new(hex::decode(trimmed)?))
}

impl KeySource {
    /// Load the key and verify the derived address.
    ///
    /// # Errors
    /// Returns `KeyError` if:
    /// - Environment variable not found
    /// - File read fails
    /// - Hex decoding fails
    /// - Private key is invalid
    /// - Address mismatch
    pub fn load(&self, expected_address: Option<Address>) -> Result<PrivateKeySigner, KeyError> {
        let secret_bytes = match self {
            Self::EnvVar { var_name } => {
                let hex = Zeroizing::new(
                    std::env::var(var_name)
                        .map_err(|_| KeyError::EnvVarNotFound(var_name.clone()))?,
                );
                parse_hex_key(&hex)?
            }
            Self::File { path } => {
                let content = Zeroizing::new(std::fs::read_to_string(path)?);
                parse_hex_key(&content)?
            }
        };

        signer_from_bytes(&secret_bytes, expected_address)
    }
}

/// Build a signer from raw key bytes, optionally checking its address.
pub fn signer_from_bytes(
    secret_bytes: &[u8],
    expected_address: Option<Address>,
) -> Result<PrivateKeySigner, KeyError> {
    let signer = PrivateKeySigner::from_slice(secret_bytes)
        .map_err(|e| KeyError::InvalidKey(e.to_string()))?;

    if let Some(expected) = expected_address {
        if signer.address() != expected {
            return Err(KeyError::AddressMismatch {
                expected,
                actual: signer.address(),
            });
        }
    }

    Ok(signer)
}

/// Freshly generated agent private key.
///
/// Handed to the caller by value; nothing else keeps a copy. Consuming
/// accessors make the single exposure explicit.
pub struct AgentKey {
    secret: Zeroizing<[u8; 32]>,
}

impl AgentKey {
    /// Address the key signs as.
    pub fn address(&self) -> Result<Address, KeyError> {
        Ok(signer_from_bytes(self.secret.as_slice(), None)?.address())
    }

    /// `0x`-prefixed hex of the key. Consumes the key.
    pub fn into_hex(self) -> Zeroizing<String> {
        Zeroizing::new(format!("0x{}", hex::encode(self.secret.as_slice())))
    }

    /// Signer for the agent identity. Consumes the key.
    pub fn into_signer(self) -> Result<PrivateKeySigner, KeyError> {
        signer_from_bytes(self.secret.as_slice(), None)
    }
}

impl fmt::Debug for AgentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AgentKey(<redacted>)")
    }
}

/// Generate a new agent key pair from the OS CSPRNG.
pub fn generate_agent_key() -> (AgentKey, Address) {
    let signer = PrivateKeySigner::random();
    let address = signer.address();
    let secret = Zeroizing::new(signer.to_bytes().0);
    (AgentKey { secret }, address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // Well-known test private key (DO NOT use in production)
    const TEST_PRIVATE_KEY: &str =
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn test_key_bytes() -> Vec<u8> {
        hex::decode(TEST_PRIVATE_KEY.trim_start_matches("0x")).unwrap()
    }

    fn test_address() -> Address {
        "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap()
    }

    #[test]
    fn test_signer_from_bytes() {
        let signer = signer_from_bytes(&test_key_bytes(), None).unwrap();
        assert_eq!(signer.address(), test_address());
    }

    #[test]
    fn test_signer_address_mismatch() {
        let result = signer_from_bytes(&test_key_bytes(), Some(Address::ZERO));
        assert!(matches!(result, Err(KeyError::AddressMismatch { .. })));
    }

    #[test]
    fn test_load_from_env_var() {
        let var_name = "HLX_SIGNER_TEST_KEY_ENV";
        std::env::set_var(var_name, format!("  {TEST_PRIVATE_KEY}\n"));

        let source = KeySource::EnvVar {
            var_name: var_name.to_string(),
        };
        let signer = source.load(Some(test_address())).unwrap();
        assert_eq!(signer.address(), test_address());

        std::env::remove_var(var_name);
    }

    #[test]
    fn test_load_missing_env_var() {
        let source = KeySource::EnvVar {
            var_name: "HLX_SIGNER_TEST_KEY_MISSING".to_string(),
        };
        assert!(matches!(source.load(None), Err(KeyError::EnvVarNotFound(_))));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("hlx-key-{}.hex", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{}", TEST_PRIVATE_KEY.trim_start_matches("0x")).unwrap();

        let source = KeySource::File { path: path.clone() };
        let signer = source.load(None).unwrap();
        assert_eq!(signer.address(), test_address());

        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_load_bad_hex() {
        let var_name = "HLX_SIGNER_TEST_KEY_BAD";
        std::env::set_var(var_name, "0xnothex");
        let source = KeySource::EnvVar {
            var_name: var_name.to_string(),
        };
        assert!(matches!(source.load(None), Err(KeyError::HexDecode(_))));
        std::env::remove_var(var_name);
    }

    #[test]
    fn test_generate_agent_key() {
        let (key, address) = generate_agent_key();
        let (other, other_address) = generate_agent_key();
        assert_ne!(address, other_address);
        assert_eq!(other.address().unwrap(), other_address);

        let signer = key.into_signer().unwrap();
        assert_eq!(signer.address(), address);

        let hex = other.into_hex();
        assert_eq!(hex.len(), 66);
        assert!(hex.starts_with("0x"));
    }

    #[test]
    fn test_agent_key_debug_redacted() {
        let (key, _) = generate_agent_key();
        assert_eq!(format!("{key:?}"), "AgentKey(<redacted>)");
    }
}
