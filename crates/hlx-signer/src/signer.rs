//! Action signing.
//!
//! Three schemes, selected by [`Action::signing_scheme`]:
//!
//! - **L1**: `action_hash` over the msgpack bytes plus nonce, vault and
//!   expiry, then an EIP-712 signature over the phantom `Agent` struct.
//! - **User-signed**: an EIP-712 `HyperliquidTransaction:<Kind>` message in
//!   the `HyperliquidSignTransaction` domain. No vault, no expiry.
//! - **Multi-sig**: the bundle body (without its `type` tag) is hashed like
//!   an L1 action, and that hash is signed as `SendMultiSig`.
//!
//! The network flag comes only from [`Network`]; nothing here compares URL
//! strings.

use alloy::primitives::{keccak256, Address, B256};
use alloy::sol;
use alloy::sol_types::{eip712_domain, Eip712Domain, SolStruct};
use hlx_core::Network;
use serde::Serialize;
use tracing::debug;

use crate::action::{Action, MultiSigAction, SigningScheme};
use crate::eip712::{TypedField, TypedPayload, TypedValue};
use crate::envelope::{ActionSignature, SignedEnvelope};
use crate::error::{SignerError, SignerResult};
use crate::wallet::WalletSigner;
use crate::wire::address_to_wire;

// =============================================================================
// SigningInput and action_hash
// =============================================================================

/// Inputs of the L1 action hash.
#[derive(Debug, Clone)]
pub struct SigningInput<'a, T: Serialize> {
    pub payload: &'a T,
    pub nonce: u64,
    /// None = normal trading, Some = vault trading
    pub vault_address: Option<Address>,
    /// Signature expiration (optional)
    pub expires_after: Option<u64>,
}

impl<T: Serialize> SigningInput<'_, T> {
    /// Calculate the action hash.
    ///
    /// ```text
    /// keccak256(msgpack(payload) || nonce_be8 || vault_tag || [0x00 || expires_be8])
    /// ```
    ///
    /// # Errors
    /// Returns `SignerError::SerializationFailed` if msgpack serialization fails.
    pub fn action_hash(&self) -> SignerResult<B256> {
        // 1. msgpack in named (map) form
        let mut data = rmp_serde::to_vec_named(self.payload)?;

        // 2. nonce as big-endian 8 bytes
        data.extend_from_slice(&self.nonce.to_be_bytes());

        // 3. vault_address tag
        //    None: 0x00 (1 byte)
        //    Some: 0x01 + address (21 bytes)
        match &self.vault_address {
            None => data.push(0x00),
            Some(addr) => {
                data.push(0x01);
                data.extend_from_slice(addr.as_slice());
            }
        }

        // 4. expires_after tag
        //    None: nothing added
        //    Some: 0x00 + big-endian 8 bytes
        if let Some(expires) = self.expires_after {
            data.push(0x00);
            data.extend_from_slice(&expires.to_be_bytes());
        }

        Ok(keccak256(&data))
    }
}

// =============================================================================
// PhantomAgent and EIP-712 Signing
// =============================================================================

/// Domain of L1 phantom-agent signatures.
pub const L1_DOMAIN: Eip712Domain = eip712_domain! {
    name: "Exchange",
    version: "1",
    chain_id: 1337,
    verifying_contract: Address::ZERO,
};

sol! {
    #[derive(Debug)]
    struct Agent {
        string source;
        bytes32 connectionId;
    }
}

/// Phantom Agent structure (EIP-712 signing target).
#[derive(Debug, Clone)]
pub struct PhantomAgent {
    /// "a" (mainnet) or "b" (testnet)
    pub source: &'static str,
    /// action_hash result
    pub connection_id: B256,
}

impl PhantomAgent {
    pub fn new(action_hash: B256, network: Network) -> Self {
        Self {
            source: network.l1_source(),
            connection_id: action_hash,
        }
    }

    /// `keccak256(0x1901 || domain_separator || struct_hash)`
    pub fn signing_hash(&self) -> B256 {
        let agent = Agent {
            source: self.source.to_string(),
            connectionId: self.connection_id,
        };
        agent.eip712_signing_hash(&L1_DOMAIN)
    }

    pub async fn sign(&self, wallet: &dyn WalletSigner) -> SignerResult<ActionSignature> {
        let signature = wallet.sign_hash(&self.signing_hash()).await?;
        Ok(ActionSignature::from(signature))
    }
}

// =============================================================================
// Signer
// =============================================================================

/// Signs actions for one network.
///
/// Holds no key material; the wallet is passed per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signer {
    network: Network,
    expires_after: Option<u64>,
}

impl Signer {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            expires_after: None,
        }
    }

    /// Network derived from an API base URL.
    pub fn for_base_url(base_url: &str) -> Self {
        Self::new(Network::from_base_url(base_url))
    }

    /// Reject L1 actions after this timestamp (ms).
    #[must_use]
    pub fn with_expires_after(mut self, expires_after: Option<u64>) -> Self {
        self.expires_after = expires_after;
        self
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn expires_after(&self) -> Option<u64> {
        self.expires_after
    }

    /// Sign any action with the scheme its kind requires.
    ///
    /// `vault_address` is ignored for user-signed actions.
    pub async fn sign_action(
        &self,
        wallet: &dyn WalletSigner,
        action: &Action,
        nonce: u64,
        vault_address: Option<Address>,
    ) -> SignerResult<ActionSignature> {
        let signature = match action.signing_scheme() {
            SigningScheme::L1 => self.sign_l1(wallet, action, nonce, vault_address).await?,
            SigningScheme::UserSigned => self.sign_user_signed(wallet, action).await?,
            SigningScheme::MultiSig => {
                self.sign_multi_sig(wallet, action, nonce, vault_address)
                    .await?
            }
        };

        // NOTE: Do not log signature as it contains sensitive information
        debug!(
            action = action.kind(),
            nonce,
            network = %self.network,
            "action signed"
        );

        Ok(signature)
    }

    /// Sign and wrap into the request envelope.
    ///
    /// The vault address is carried only by actions that allow it.
    pub async fn sign_envelope(
        &self,
        wallet: &dyn WalletSigner,
        action: Action,
        nonce: u64,
        vault_address: Option<Address>,
    ) -> SignerResult<SignedEnvelope> {
        let vault_address = vault_address.filter(|_| action.allows_vault());
        let signature = self
            .sign_action(wallet, &action, nonce, vault_address)
            .await?;

        Ok(SignedEnvelope {
            action,
            nonce,
            signature,
            vault_address: vault_address.as_ref().map(address_to_wire),
            expires_after: self.expires_after,
        })
    }

    /// L1 signature over any serializable payload.
    pub async fn sign_l1<T: Serialize + Sync>(
        &self,
        wallet: &dyn WalletSigner,
        payload: &T,
        nonce: u64,
        vault_address: Option<Address>,
    ) -> SignerResult<ActionSignature> {
        let action_hash = self.l1_action_hash(payload, nonce, vault_address)?;
        PhantomAgent::new(action_hash, self.network)
            .sign(wallet)
            .await
    }

    pub fn l1_action_hash<T: Serialize>(
        &self,
        payload: &T,
        nonce: u64,
        vault_address: Option<Address>,
    ) -> SignerResult<B256> {
        SigningInput {
            payload,
            nonce,
            vault_address,
            expires_after: self.expires_after,
        }
        .action_hash()
    }

    pub async fn sign_user_signed(
        &self,
        wallet: &dyn WalletSigner,
        action: &Action,
    ) -> SignerResult<ActionSignature> {
        let payload = self.user_signed_payload(action)?;
        sign_typed(wallet, &payload).await
    }

    /// Outer signature of a multi-sig bundle.
    pub async fn sign_multi_sig(
        &self,
        wallet: &dyn WalletSigner,
        action: &Action,
        nonce: u64,
        vault_address: Option<Address>,
    ) -> SignerResult<ActionSignature> {
        let Action::MultiSig(body) = action else {
            return Err(SignerError::InvalidAction(format!(
                "{} is not a multi-sig action",
                action.kind()
            )));
        };

        let multi_sig_action_hash = self.multi_sig_action_hash(body, nonce, vault_address)?;
        let payload = TypedPayload::new(
            "SendMultiSig",
            vec![
                self.chain_field(),
                TypedField::new(
                    "multiSigActionHash",
                    TypedValue::Bytes32(multi_sig_action_hash),
                ),
                TypedField::new("nonce", TypedValue::Uint64(nonce)),
            ],
        );
        sign_typed(wallet, &payload).await
    }

    /// L1-style hash of the bundle body, without the `type` tag.
    pub fn multi_sig_action_hash(
        &self,
        body: &MultiSigAction,
        nonce: u64,
        vault_address: Option<Address>,
    ) -> SignerResult<B256> {
        self.l1_action_hash(body, nonce, vault_address)
    }

    /// Co-signer signature over an inner L1 action.
    ///
    /// Signs `[multiSigUser, outerSigner, action]` with the regular L1 scheme.
    pub async fn sign_multi_sig_l1_payload(
        &self,
        wallet: &dyn WalletSigner,
        inner: &Action,
        multi_sig_user: Address,
        outer_signer: Address,
        nonce: u64,
        vault_address: Option<Address>,
    ) -> SignerResult<ActionSignature> {
        if inner.signing_scheme() != SigningScheme::L1 {
            return Err(SignerError::InvalidAction(format!(
                "{} is not an L1 action",
                inner.kind()
            )));
        }
        let envelope = (
            address_to_wire(&multi_sig_user),
            address_to_wire(&outer_signer),
            inner,
        );
        self.sign_l1(wallet, &envelope, nonce, vault_address).await
    }

    /// Co-signer signature over an inner user-signed action.
    ///
    /// The typed message gains `payloadMultiSigUser` and `outerSigner`.
    pub async fn sign_multi_sig_user_signed_payload(
        &self,
        wallet: &dyn WalletSigner,
        inner: &Action,
        multi_sig_user: Address,
        outer_signer: Address,
    ) -> SignerResult<ActionSignature> {
        let payload = self
            .user_signed_payload(inner)?
            .with_multi_sig(multi_sig_user, outer_signer);
        sign_typed(wallet, &payload).await
    }

    fn user_signed_payload(&self, action: &Action) -> SignerResult<TypedPayload> {
        action.typed_payload().ok_or_else(|| {
            SignerError::InvalidAction(format!("{} is not a user-signed action", action.kind()))
        })
    }

    fn chain_field(&self) -> TypedField {
        TypedField::new(
            "hyperliquidChain",
            TypedValue::String(self.network.chain_name().to_string()),
        )
    }
}

async fn sign_typed(
    wallet: &dyn WalletSigner,
    payload: &TypedPayload,
) -> SignerResult<ActionSignature> {
    let signature = wallet.sign_hash(&payload.signing_hash()).await?;
    Ok(ActionSignature::from(signature))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{CancelWire, Grouping, OrderTypeWire, OrderWire};
    use alloy::primitives::PrimitiveSignature;
    use alloy::signers::local::PrivateKeySigner;
    use hlx_core::{OrderKind, TimeInForce};
    use std::str::FromStr;

    // Well-known test private key (DO NOT use in production)
    const TEST_PRIVATE_KEY: &str =
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn test_wallet() -> PrivateKeySigner {
        PrivateKeySigner::from_str(TEST_PRIVATE_KEY).unwrap()
    }

    fn reference_order() -> Action {
        Action::order(
            vec![OrderWire {
                asset: 110027,
                is_buy: true,
                limit_px: "105.00".to_string(),
                sz: "0.2".to_string(),
                reduce_only: false,
                order_type: OrderTypeWire::from_kind(&OrderKind::Limit {
                    tif: TimeInForce::ImmediateOrCancel,
                })
                .unwrap(),
                cloid: Some("0x0de3e244a8f44fc28a6b7bc852d66d19".to_string()),
            }],
            Grouping::Na,
            None,
        )
        .unwrap()
    }

    fn recover(signature: &ActionSignature, hash: &B256) -> Address {
        let mut bytes = [0u8; 65];
        bytes[..32].copy_from_slice(&hex::decode(&signature.r[2..]).unwrap());
        bytes[32..64].copy_from_slice(&hex::decode(&signature.s[2..]).unwrap());
        bytes[64] = signature.v - 27;
        PrimitiveSignature::try_from(&bytes[..])
            .unwrap()
            .recover_address_from_prehash(hash)
            .unwrap()
    }

    #[test]
    fn test_action_hash_reference_vector() {
        let signer = Signer::new(Network::Testnet);
        let hash = signer
            .l1_action_hash(&reference_order(), 1769339470576, None)
            .unwrap();
        assert_eq!(
            hex::encode(hash.as_slice()),
            "904c57b8f4b75ac9da005b49298dc39af735ed8c3a89b241f5f1e061e0207868",
            "Action hash must match the exchange reference"
        );
    }

    #[test]
    fn test_action_hash_with_vault() {
        let action = Action::cancel(vec![CancelWire { asset: 5, oid: 123 }]).unwrap();
        let signer = Signer::new(Network::Mainnet);

        let hash_with_vault = signer
            .l1_action_hash(&action, 1000, Some(Address::repeat_byte(0x42)))
            .unwrap();
        let hash_no_vault = signer.l1_action_hash(&action, 1000, None).unwrap();

        assert_ne!(hash_with_vault, hash_no_vault);
    }

    #[test]
    fn test_action_hash_with_expires() {
        let action = reference_order();
        let plain = Signer::new(Network::Mainnet);
        let expiring = plain.with_expires_after(Some(1700000000));

        assert_ne!(
            plain.l1_action_hash(&action, 1000, None).unwrap(),
            expiring.l1_action_hash(&action, 1000, None).unwrap()
        );
    }

    #[test]
    fn test_phantom_agent_source() {
        let hash = B256::repeat_byte(0xab);
        assert_eq!(PhantomAgent::new(hash, Network::Mainnet).source, "a");
        assert_eq!(PhantomAgent::new(hash, Network::Testnet).source, "b");
    }

    #[test]
    fn test_network_from_base_url() {
        assert_eq!(
            Signer::for_base_url(hlx_core::MAINNET_API_URL).network(),
            Network::Mainnet
        );
        assert_eq!(
            Signer::for_base_url("MAINNET_API_URL").network(),
            Network::Testnet
        );
    }

    /// Domain separator and struct hash must agree with a hand-rolled
    /// EIP-712 encoding.
    #[test]
    fn test_eip712_domain_separator() {
        let action_hash = B256::from_slice(
            &hex::decode("f01fa6eaca0b8cbd2afe65f8852a2e00d35eae3d19560ece9b8a28614646e849")
                .unwrap(),
        );

        let type_hash = keccak256(
            b"EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)",
        );
        let mut domain_data = Vec::new();
        domain_data.extend_from_slice(type_hash.as_slice());
        domain_data.extend_from_slice(keccak256(b"Exchange").as_slice());
        domain_data.extend_from_slice(keccak256(b"1").as_slice());
        let mut chain_id_bytes = [0u8; 32];
        chain_id_bytes[24..].copy_from_slice(&1337u64.to_be_bytes());
        domain_data.extend_from_slice(&chain_id_bytes);
        domain_data.extend_from_slice(&[0u8; 32]);
        let manual_domain_separator = keccak256(&domain_data);

        let mut struct_data = Vec::new();
        struct_data.extend_from_slice(keccak256(b"Agent(string source,bytes32 connectionId)").as_slice());
        struct_data.extend_from_slice(keccak256(b"b").as_slice());
        struct_data.extend_from_slice(action_hash.as_slice());
        let manual_struct_hash = keccak256(&struct_data);

        let agent = Agent {
            source: "b".to_string(),
            connectionId: action_hash,
        };
        assert_eq!(L1_DOMAIN.hash_struct(), manual_domain_separator);
        assert_eq!(agent.eip712_hash_struct(), manual_struct_hash);

        let mut digest = vec![0x19, 0x01];
        digest.extend_from_slice(manual_domain_separator.as_slice());
        digest.extend_from_slice(manual_struct_hash.as_slice());
        assert_eq!(
            PhantomAgent::new(action_hash, Network::Testnet).signing_hash(),
            keccak256(&digest)
        );
    }

    /// RFC 6979 signatures are deterministic: same key and digest, same
    /// (r, s, v) as the reference client.
    #[tokio::test]
    async fn test_signature_reference_vector() {
        let wallet = test_wallet();
        let action_hash = B256::from_slice(
            &hex::decode("f01fa6eaca0b8cbd2afe65f8852a2e00d35eae3d19560ece9b8a28614646e849")
                .unwrap(),
        );

        let signature = PhantomAgent::new(action_hash, Network::Testnet)
            .sign(&wallet)
            .await
            .unwrap();

        assert_eq!(
            signature.r,
            "0xa9e728f2faea4febc0b6eb9c3dbbac04b375eb3869f051030d205318425faebc"
        );
        assert_eq!(
            signature.s,
            "0x7b21be7030bb979352b71494708b99d789266f0d0e1242a21e74905b683e4698"
        );
        assert_eq!(signature.v, 27);
    }

    #[tokio::test]
    async fn test_sign_l1_action_recovers_wallet() {
        let wallet = test_wallet();
        let signer = Signer::new(Network::Mainnet);
        let action = reference_order();

        let signature = signer
            .sign_action(&wallet, &action, 1234567890, None)
            .await
            .unwrap();

        let hash = signer.l1_action_hash(&action, 1234567890, None).unwrap();
        let digest = PhantomAgent::new(hash, Network::Mainnet).signing_hash();
        assert_eq!(recover(&signature, &digest), WalletSigner::address(&wallet));
    }

    #[tokio::test]
    async fn test_sign_user_signed_recovers_wallet() {
        let wallet = test_wallet();
        let signer = Signer::new(Network::Testnet);
        let action = Action::usd_send(Network::Testnet, Address::repeat_byte(1), "10", 1_700_000_000_000);

        let signature = signer.sign_action(&wallet, &action, 1, None).await.unwrap();

        let digest = action.typed_payload().unwrap().signing_hash();
        assert_eq!(recover(&signature, &digest), WalletSigner::address(&wallet));
    }

    #[tokio::test]
    async fn test_user_signed_ignores_vault() {
        let wallet = test_wallet();
        let signer = Signer::new(Network::Testnet);
        let action = Action::usd_class_transfer(Network::Testnet, "5", true, 77, None);

        let envelope = signer
            .sign_envelope(&wallet, action, 77, Some(Address::repeat_byte(9)))
            .await
            .unwrap();
        assert!(envelope.vault_address.is_none());
        assert!(envelope.to_json().unwrap().get("vaultAddress").is_none());
    }

    #[tokio::test]
    async fn test_l1_envelope_carries_vault_and_expiry() {
        let wallet = test_wallet();
        let signer = Signer::new(Network::Testnet).with_expires_after(Some(5));
        let vault = Address::repeat_byte(0xAB);

        let envelope = signer
            .sign_envelope(&wallet, Action::schedule_cancel(None), 10, Some(vault))
            .await
            .unwrap();
        let json = envelope.to_json().unwrap();
        assert_eq!(json["vaultAddress"], format!("0x{}", "ab".repeat(20)));
        assert_eq!(json["expiresAfter"], 5);
    }

    #[tokio::test]
    async fn test_multi_sig_outer_signature() {
        let wallet = test_wallet();
        let signer = Signer::new(Network::Testnet);
        let outer = WalletSigner::address(&wallet);
        let multi_sig_user = Address::repeat_byte(0x77);

        let action = Action::multi_sig(
            multi_sig_user,
            outer,
            Action::schedule_cancel(Some(1)),
            vec![],
        );
        let signature = signer.sign_action(&wallet, &action, 42, None).await.unwrap();

        let Action::MultiSig(body) = &action else {
            unreachable!()
        };
        // Body hash excludes the tag.
        let hash = signer.multi_sig_action_hash(body, 42, None).unwrap();
        assert_ne!(hash, signer.l1_action_hash(&action, 42, None).unwrap());

        let payload = TypedPayload::new(
            "SendMultiSig",
            vec![
                TypedField::new("hyperliquidChain", TypedValue::String("Testnet".into())),
                TypedField::new("multiSigActionHash", TypedValue::Bytes32(hash)),
                TypedField::new("nonce", TypedValue::Uint64(42)),
            ],
        );
        assert_eq!(recover(&signature, &payload.signing_hash()), outer);
    }

    #[tokio::test]
    async fn test_multi_sig_l1_co_signature() {
        let wallet = test_wallet();
        let signer = Signer::new(Network::Mainnet);
        let user = Address::repeat_byte(0xAA);
        let outer = Address::repeat_byte(0xBB);
        let inner = Action::set_referrer("CODE");

        let signature = signer
            .sign_multi_sig_l1_payload(&wallet, &inner, user, outer, 9, None)
            .await
            .unwrap();

        let envelope = (address_to_wire(&user), address_to_wire(&outer), &inner);
        let bytes = rmp_serde::to_vec_named(&envelope).unwrap();
        assert_eq!(bytes[0], 0x93, "envelope is a 3-element array");

        let hash = signer.l1_action_hash(&envelope, 9, None).unwrap();
        let digest = PhantomAgent::new(hash, Network::Mainnet).signing_hash();
        assert_eq!(recover(&signature, &digest), WalletSigner::address(&wallet));
    }

    #[tokio::test]
    async fn test_multi_sig_user_signed_co_signature() {
        let wallet = test_wallet();
        let signer = Signer::new(Network::Testnet);
        let user = Address::repeat_byte(0xAA);
        let outer = Address::repeat_byte(0xBB);
        let inner = Action::usd_send(Network::Testnet, Address::repeat_byte(1), "1", 5);

        let signature = signer
            .sign_multi_sig_user_signed_payload(&wallet, &inner, user, outer)
            .await
            .unwrap();

        let digest = inner
            .typed_payload()
            .unwrap()
            .with_multi_sig(user, outer)
            .signing_hash();
        assert_eq!(recover(&signature, &digest), WalletSigner::address(&wallet));
    }

    #[tokio::test]
    async fn test_scheme_mismatch_rejected() {
        let wallet = test_wallet();
        let signer = Signer::new(Network::Testnet);

        let l1 = Action::set_referrer("x");
        assert!(matches!(
            signer.sign_user_signed(&wallet, &l1).await,
            Err(SignerError::InvalidAction(_))
        ));
        assert!(matches!(
            signer.sign_multi_sig(&wallet, &l1, 1, None).await,
            Err(SignerError::InvalidAction(_))
        ));

        let user_signed = Action::usd_send(Network::Testnet, Address::ZERO, "1", 1);
        assert!(signer
            .sign_multi_sig_l1_payload(&wallet, &user_signed, Address::ZERO, Address::ZERO, 1, None)
            .await
            .is_err());
    }
}
