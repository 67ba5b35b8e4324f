//! EIP-712 hashing for user-signed actions.
//!
//! User-signed actions use primary types named
//! `HyperliquidTransaction:<Kind>`. The colon rules out `sol!` structs, so
//! the type string and struct hash are assembled by hand:
//!
//! ```text
//! typeHash   = keccak256("HyperliquidTransaction:UsdSend(string hyperliquidChain,...)")
//! structHash = keccak256(typeHash || enc(field_1) || ... || enc(field_n))
//! digest     = keccak256(0x1901 || domainSeparator || structHash)
//! ```

use alloy::primitives::{keccak256, Address, B256};
use alloy::sol_types::{eip712_domain, Eip712Domain};

/// Chain id used by every user-signed action (`0x66eee`).
pub const SIGNATURE_CHAIN_ID: u64 = 421_614;

/// Hex form of [`SIGNATURE_CHAIN_ID`] carried inside the action.
pub const SIGNATURE_CHAIN_ID_HEX: &str = "0x66eee";

/// Domain for user-signed actions.
pub const USER_SIGNED_DOMAIN: Eip712Domain = eip712_domain! {
    name: "HyperliquidSignTransaction",
    version: "1",
    chain_id: SIGNATURE_CHAIN_ID,
    verifying_contract: Address::ZERO,
};

/// Prefix of every user-signed primary type.
pub const PRIMARY_TYPE_PREFIX: &str = "HyperliquidTransaction:";

/// A single EIP-712 field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedValue {
    String(String),
    Address(Address),
    Bool(bool),
    Uint64(u64),
    Bytes32(B256),
}

impl TypedValue {
    /// Solidity type name as it appears in the type string.
    pub fn sol_type(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Address(_) => "address",
            Self::Bool(_) => "bool",
            Self::Uint64(_) => "uint64",
            Self::Bytes32(_) => "bytes32",
        }
    }

    /// 32-byte EIP-712 encoding of the value.
    pub fn encode(&self) -> B256 {
        let mut word = [0u8; 32];
        match self {
            Self::String(s) => return keccak256(s.as_bytes()),
            Self::Address(a) => word[12..].copy_from_slice(a.as_slice()),
            Self::Bool(b) => word[31] = u8::from(*b),
            Self::Uint64(n) => word[24..].copy_from_slice(&n.to_be_bytes()),
            Self::Bytes32(b) => return *b,
        }
        B256::from(word)
    }
}

/// Named field of a typed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedField {
    pub name: &'static str,
    pub value: TypedValue,
}

impl TypedField {
    pub fn new(name: &'static str, value: TypedValue) -> Self {
        Self { name, value }
    }
}

/// Typed-data message for one user-signed action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedPayload {
    /// Kind without the prefix, e.g. `UsdSend`.
    pub kind: &'static str,
    pub fields: Vec<TypedField>,
}

impl TypedPayload {
    pub fn new(kind: &'static str, fields: Vec<TypedField>) -> Self {
        Self { kind, fields }
    }

    pub fn primary_type(&self) -> String {
        format!("{PRIMARY_TYPE_PREFIX}{}", self.kind)
    }

    /// `Primary(type1 name1,type2 name2,...)`
    pub fn type_string(&self) -> String {
        let members: Vec<String> = self
            .fields
            .iter()
            .map(|f| format!("{} {}", f.value.sol_type(), f.name))
            .collect();
        format!("{}({})", self.primary_type(), members.join(","))
    }

    pub fn type_hash(&self) -> B256 {
        keccak256(self.type_string().as_bytes())
    }

    pub fn struct_hash(&self) -> B256 {
        let mut data = Vec::with_capacity(32 * (self.fields.len() + 1));
        data.extend_from_slice(self.type_hash().as_slice());
        for field in &self.fields {
            data.extend_from_slice(field.value.encode().as_slice());
        }
        keccak256(&data)
    }

    /// Digest handed to the wallet: `keccak256(0x1901 || domain || struct)`.
    pub fn signing_hash(&self) -> B256 {
        let mut data = Vec::with_capacity(66);
        data.extend_from_slice(&[0x19, 0x01]);
        data.extend_from_slice(USER_SIGNED_DOMAIN.hash_struct().as_slice());
        data.extend_from_slice(self.struct_hash().as_slice());
        keccak256(&data)
    }

    /// Extend the payload for a multi-sig co-signer.
    ///
    /// `payloadMultiSigUser` and `outerSigner` go right after the leading
    /// `hyperliquidChain` field.
    #[must_use]
    pub fn with_multi_sig(mut self, multi_sig_user: Address, outer_signer: Address) -> Self {
        let at = usize::from(!self.fields.is_empty());
        self.fields.insert(
            at,
            TypedField::new("outerSigner", TypedValue::Address(outer_signer)),
        );
        self.fields.insert(
            at,
            TypedField::new("payloadMultiSigUser", TypedValue::Address(multi_sig_user)),
        );
        self
    }
}
