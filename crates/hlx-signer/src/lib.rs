//! Wire encoding, action building, and signing.
//!
//! Turns validated requests into the exact bytes the exchange hashes and
//! produces the signatures that go with them.
//!
//! # Key Components
//!
//! - [`wire`]: canonical order, cancel, and modify shapes
//! - [`Action`]: closed set of action kinds with pure builders
//! - [`Signer`]: L1, user-signed, and multi-sig signing
//! - [`NonceManager`]: strictly increasing millisecond nonces
//! - [`WalletSigner`]: the wallet capability the signer drives
//! - [`KeySource`], [`generate_agent_key`]: key loading and agent keys
//!
//! # Signing pipeline
//!
//! 1. Encode: `order_to_wire` and friends
//! 2. Build: `Action::order(...)`, `Action::usd_send(...)`, ...
//! 3. Sign: `Signer::sign_envelope(wallet, action, nonce, vault)`
//! 4. Post: `SignedEnvelope::to_json()` to `/exchange`

pub mod action;
pub mod eip712;
pub mod envelope;
pub mod error;
pub mod key;
pub mod nonce;
pub mod signer;
pub mod wallet;
pub mod wire;

// Actions
pub use action::{multi_sig_signers_json, Action, MultiSigAction, MultiSigPayload, SigningScheme};

// EIP-712
pub use eip712::{TypedField, TypedPayload, TypedValue, SIGNATURE_CHAIN_ID, SIGNATURE_CHAIN_ID_HEX};

// Envelope
pub use envelope::{ActionSignature, SignedEnvelope};

// Error types
pub use error::{KeyError, SignerError, SignerResult};

// Keys
pub use key::{generate_agent_key, signer_from_bytes, AgentKey, KeySource};

// Nonce management
pub use nonce::{Clock, NonceManager, NonceSource, SystemClock};

// Signing
pub use signer::{PhantomAgent, Signer, SigningInput, L1_DOMAIN};

// Wallet
pub use wallet::WalletSigner;

// Wire format
pub use wire::{
    address_to_wire, order_to_wire, BuilderInfo, CancelByCloidWire, CancelWire, Grouping,
    LimitOrderType, ModifyWire, OidWire, OrderTypeWire, OrderWire, TriggerOrderType,
};

pub use alloy::primitives::Address;
pub use alloy::signers::local::PrivateKeySigner;
