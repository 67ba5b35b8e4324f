//! Action envelopes.
//!
//! [`Action`] is a closed set: one variant per exchange action kind, each
//! carrying its own field struct. The `type` tag is produced by serde and is
//! always the first key, both in the posted JSON and in the msgpack bytes
//! hashed for L1 signatures.
//!
//! Struct field order is the exchange's field order. Do not reorder.
//!
//! Builders here are pure: no I/O, no signing, no clock reads.

use alloy::primitives::Address;
use hlx_core::Network;
use serde::Serialize;

use crate::eip712::{TypedField, TypedPayload, TypedValue, SIGNATURE_CHAIN_ID_HEX};
use crate::envelope::ActionSignature;
use crate::error::{SignerError, SignerResult};
use crate::wire::{
    address_to_wire, serialize_address, BuilderInfo, CancelByCloidWire, CancelWire, Grouping,
    ModifyWire, OrderWire,
};

/// How an action kind is signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningScheme {
    /// msgpack hash signed through the phantom `Agent` struct.
    L1,
    /// EIP-712 `HyperliquidTransaction:<Kind>` message.
    UserSigned,
    /// Outer signature over a collected multi-sig bundle.
    MultiSig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Action {
    Order(BulkOrder),
    Cancel(BulkCancel),
    CancelByCloid(BulkCancelByCloid),
    BatchModify(BulkModify),
    ScheduleCancel(ScheduleCancel),
    UpdateLeverage(UpdateLeverage),
    UpdateIsolatedMargin(UpdateIsolatedMargin),
    VaultTransfer(VaultTransfer),
    SubAccountTransfer(SubAccountTransfer),
    SubAccountSpotTransfer(SubAccountSpotTransfer),
    SetReferrer(SetReferrer),
    CreateSubAccount(CreateSubAccount),
    UsdClassTransfer(UsdClassTransfer),
    UsdSend(UsdSend),
    SpotSend(SpotSend),
    #[serde(rename = "withdraw3")]
    Withdraw(Withdraw),
    ApproveAgent(ApproveAgent),
    ApproveBuilderFee(ApproveBuilderFee),
    ConvertToMultiSigUser(ConvertToMultiSigUser),
    MultiSig(MultiSigAction),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkOrder {
    pub orders: Vec<OrderWire>,
    pub grouping: Grouping,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub builder: Option<BuilderInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkCancel {
    pub cancels: Vec<CancelWire>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkCancelByCloid {
    pub cancels: Vec<CancelByCloidWire>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkModify {
    pub modifies: Vec<ModifyWire>,
}

/// Dead-man's switch. `time: None` clears a scheduled cancel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleCancel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeverage {
    pub asset: u32,
    pub is_cross: bool,
    pub leverage: u32,
}

/// Margin delta in micro-USD. `isBuy` is always true on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIsolatedMargin {
    pub asset: u32,
    pub is_buy: bool,
    pub ntli: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultTransfer {
    #[serde(serialize_with = "serialize_address")]
    pub vault_address: Address,
    pub is_deposit: bool,
    /// Micro-USD.
    pub usd: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubAccountTransfer {
    #[serde(serialize_with = "serialize_address")]
    pub sub_account_user: Address,
    pub is_deposit: bool,
    /// Micro-USD.
    pub usd: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubAccountSpotTransfer {
    #[serde(serialize_with = "serialize_address")]
    pub sub_account_user: Address,
    pub is_deposit: bool,
    pub token: String,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetReferrer {
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateSubAccount {
    pub name: String,
}

// User-signed actions lead with the chain fields, then their own members.

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsdClassTransfer {
    pub signature_chain_id: String,
    pub hyperliquid_chain: String,
    pub amount: String,
    pub to_perp: bool,
    pub nonce: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsdSend {
    pub signature_chain_id: String,
    pub hyperliquid_chain: String,
    pub destination: String,
    pub amount: String,
    pub time: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotSend {
    pub signature_chain_id: String,
    pub hyperliquid_chain: String,
    pub destination: String,
    /// `NAME:0x<token id>`
    pub token: String,
    pub amount: String,
    pub time: u64,
}

/// Bridge withdrawal (`withdraw3`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Withdraw {
    pub signature_chain_id: String,
    pub hyperliquid_chain: String,
    pub destination: String,
    pub amount: String,
    pub time: u64,
}

/// Agent approval. An unnamed agent omits `agentName` from the posted
/// action but signs it as the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveAgent {
    pub signature_chain_id: String,
    pub hyperliquid_chain: String,
    #[serde(serialize_with = "serialize_address")]
    pub agent_address: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    pub nonce: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveBuilderFee {
    pub signature_chain_id: String,
    pub hyperliquid_chain: String,
    /// Percentage string, e.g. `0.001%`.
    pub max_fee_rate: String,
    #[serde(serialize_with = "serialize_address")]
    pub builder: Address,
    pub nonce: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertToMultiSigUser {
    pub signature_chain_id: String,
    pub hyperliquid_chain: String,
    /// JSON text `{"authorizedUsers": [...], "threshold": n}`.
    pub signers: String,
    pub nonce: u64,
}

/// Multi-sig execution bundle.
///
/// Serialized without its `type` tag, this struct is also the input of the
/// multi-sig action hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiSigAction {
    pub signature_chain_id: String,
    /// Co-signatures in the order the caller collected them.
    pub signatures: Vec<ActionSignature>,
    pub payload: MultiSigPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiSigPayload {
    pub multi_sig_user: String,
    pub outer_signer: String,
    pub action: Box<Action>,
}

fn chain_fields(network: Network) -> (String, String) {
    (
        SIGNATURE_CHAIN_ID_HEX.to_string(),
        network.chain_name().to_string(),
    )
}

/// Exact `signers` text for a multi-sig conversion.
///
/// Users are lower-cased and sorted: the set defines membership, so order
/// must not depend on the caller. Separators follow the exchange's JSON
/// dump (`", "` and `": "`).
pub fn multi_sig_signers_json(users: &[Address], threshold: u32) -> SignerResult<String> {
    let mut sorted: Vec<String> = users.iter().map(address_to_wire).collect();
    sorted.sort();
    sorted.dedup();

    if sorted.is_empty() {
        return Err(SignerError::InvalidAction(
            "multi-sig conversion needs at least one authorized user".to_string(),
        ));
    }
    // Threshold counts distinct users.
    if threshold == 0 || threshold as usize > sorted.len() {
        return Err(SignerError::InvalidAction(format!(
            "threshold {threshold} out of range for {} distinct users",
            sorted.len()
        )));
    }

    let quoted: Vec<String> = sorted.iter().map(|u| format!("\"{u}\"")).collect();
    Ok(format!(
        "{{\"authorizedUsers\": [{}], \"threshold\": {}}}",
        quoted.join(", "),
        threshold
    ))
}

impl Action {
    /// Order batch. The builder address is lower-cased.
    pub fn order(
        orders: Vec<OrderWire>,
        grouping: Grouping,
        builder: Option<BuilderInfo>,
    ) -> SignerResult<Self> {
        if orders.is_empty() {
            return Err(SignerError::InvalidAction("empty order batch".to_string()));
        }
        Ok(Self::Order(BulkOrder {
            orders,
            grouping,
            builder: builder.map(|b| b.normalized()),
        }))
    }

    pub fn cancel(cancels: Vec<CancelWire>) -> SignerResult<Self> {
        if cancels.is_empty() {
            return Err(SignerError::InvalidAction("empty cancel batch".to_string()));
        }
        Ok(Self::Cancel(BulkCancel { cancels }))
    }

    pub fn cancel_by_cloid(cancels: Vec<CancelByCloidWire>) -> SignerResult<Self> {
        if cancels.is_empty() {
            return Err(SignerError::InvalidAction("empty cancel batch".to_string()));
        }
        Ok(Self::CancelByCloid(BulkCancelByCloid { cancels }))
    }

    pub fn batch_modify(modifies: Vec<ModifyWire>) -> SignerResult<Self> {
        if modifies.is_empty() {
            return Err(SignerError::InvalidAction("empty modify batch".to_string()));
        }
        Ok(Self::BatchModify(BulkModify { modifies }))
    }

    pub fn schedule_cancel(time: Option<u64>) -> Self {
        Self::ScheduleCancel(ScheduleCancel { time })
    }

    pub fn update_leverage(asset: u32, is_cross: bool, leverage: u32) -> Self {
        Self::UpdateLeverage(UpdateLeverage {
            asset,
            is_cross,
            leverage,
        })
    }

    pub fn update_isolated_margin(asset: u32, ntli: i64) -> Self {
        Self::UpdateIsolatedMargin(UpdateIsolatedMargin {
            asset,
            is_buy: true,
            ntli,
        })
    }

    pub fn vault_transfer(vault_address: Address, is_deposit: bool, usd: i64) -> Self {
        Self::VaultTransfer(VaultTransfer {
            vault_address,
            is_deposit,
            usd,
        })
    }

    pub fn sub_account_transfer(sub_account_user: Address, is_deposit: bool, usd: i64) -> Self {
        Self::SubAccountTransfer(SubAccountTransfer {
            sub_account_user,
            is_deposit,
            usd,
        })
    }

    pub fn sub_account_spot_transfer(
        sub_account_user: Address,
        is_deposit: bool,
        token: impl Into<String>,
        amount: impl Into<String>,
    ) -> Self {
        Self::SubAccountSpotTransfer(SubAccountSpotTransfer {
            sub_account_user,
            is_deposit,
            token: token.into(),
            amount: amount.into(),
        })
    }

    pub fn set_referrer(code: impl Into<String>) -> Self {
        Self::SetReferrer(SetReferrer { code: code.into() })
    }

    pub fn create_sub_account(name: impl Into<String>) -> Self {
        Self::CreateSubAccount(CreateSubAccount { name: name.into() })
    }

    /// Spot/perp balance move. With a vault, the amount names the
    /// sub-account: `"<amount> subaccount:<vault>"`.
    pub fn usd_class_transfer(
        network: Network,
        amount: &str,
        to_perp: bool,
        nonce: u64,
        vault_address: Option<Address>,
    ) -> Self {
        let amount = match vault_address {
            Some(vault) => format!("{amount} subaccount:{}", address_to_wire(&vault)),
            None => amount.to_string(),
        };
        let (signature_chain_id, hyperliquid_chain) = chain_fields(network);
        Self::UsdClassTransfer(UsdClassTransfer {
            signature_chain_id,
            hyperliquid_chain,
            amount,
            to_perp,
            nonce,
        })
    }

    pub fn usd_send(network: Network, destination: Address, amount: &str, time: u64) -> Self {
        let (signature_chain_id, hyperliquid_chain) = chain_fields(network);
        Self::UsdSend(UsdSend {
            signature_chain_id,
            hyperliquid_chain,
            destination: address_to_wire(&destination),
            amount: amount.to_string(),
            time,
        })
    }

    pub fn spot_send(
        network: Network,
        destination: Address,
        token: &str,
        amount: &str,
        time: u64,
    ) -> Self {
        let (signature_chain_id, hyperliquid_chain) = chain_fields(network);
        Self::SpotSend(SpotSend {
            signature_chain_id,
            hyperliquid_chain,
            destination: address_to_wire(&destination),
            token: token.to_string(),
            amount: amount.to_string(),
            time,
        })
    }

    pub fn withdraw(network: Network, destination: Address, amount: &str, time: u64) -> Self {
        let (signature_chain_id, hyperliquid_chain) = chain_fields(network);
        Self::Withdraw(Withdraw {
            signature_chain_id,
            hyperliquid_chain,
            destination: address_to_wire(&destination),
            amount: amount.to_string(),
            time,
        })
    }

    pub fn approve_agent(
        network: Network,
        agent_address: Address,
        agent_name: Option<String>,
        nonce: u64,
    ) -> Self {
        let (signature_chain_id, hyperliquid_chain) = chain_fields(network);
        Self::ApproveAgent(ApproveAgent {
            signature_chain_id,
            hyperliquid_chain,
            agent_address,
            agent_name,
            nonce,
        })
    }

    pub fn approve_builder_fee(
        network: Network,
        builder: Address,
        max_fee_rate: &str,
        nonce: u64,
    ) -> Self {
        let (signature_chain_id, hyperliquid_chain) = chain_fields(network);
        Self::ApproveBuilderFee(ApproveBuilderFee {
            signature_chain_id,
            hyperliquid_chain,
            max_fee_rate: max_fee_rate.to_string(),
            builder,
            nonce,
        })
    }

    pub fn convert_to_multi_sig_user(
        network: Network,
        users: &[Address],
        threshold: u32,
        nonce: u64,
    ) -> SignerResult<Self> {
        let signers = multi_sig_signers_json(users, threshold)?;
        let (signature_chain_id, hyperliquid_chain) = chain_fields(network);
        Ok(Self::ConvertToMultiSigUser(ConvertToMultiSigUser {
            signature_chain_id,
            hyperliquid_chain,
            signers,
            nonce,
        }))
    }

    /// Wrap an inner action with its collected co-signatures.
    ///
    /// Signature order is kept exactly as given.
    pub fn multi_sig(
        multi_sig_user: Address,
        outer_signer: Address,
        inner: Action,
        signatures: Vec<ActionSignature>,
    ) -> Self {
        Self::MultiSig(MultiSigAction {
            signature_chain_id: SIGNATURE_CHAIN_ID_HEX.to_string(),
            signatures,
            payload: MultiSigPayload {
                multi_sig_user: address_to_wire(&multi_sig_user),
                outer_signer: address_to_wire(&outer_signer),
                action: Box::new(inner),
            },
        })
    }

    /// The `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Order(_) => "order",
            Self::Cancel(_) => "cancel",
            Self::CancelByCloid(_) => "cancelByCloid",
            Self::BatchModify(_) => "batchModify",
            Self::ScheduleCancel(_) => "scheduleCancel",
            Self::UpdateLeverage(_) => "updateLeverage",
            Self::UpdateIsolatedMargin(_) => "updateIsolatedMargin",
            Self::VaultTransfer(_) => "vaultTransfer",
            Self::SubAccountTransfer(_) => "subAccountTransfer",
            Self::SubAccountSpotTransfer(_) => "subAccountSpotTransfer",
            Self::SetReferrer(_) => "setReferrer",
            Self::CreateSubAccount(_) => "createSubAccount",
            Self::UsdClassTransfer(_) => "usdClassTransfer",
            Self::UsdSend(_) => "usdSend",
            Self::SpotSend(_) => "spotSend",
            Self::Withdraw(_) => "withdraw3",
            Self::ApproveAgent(_) => "approveAgent",
            Self::ApproveBuilderFee(_) => "approveBuilderFee",
            Self::ConvertToMultiSigUser(_) => "convertToMultiSigUser",
            Self::MultiSig(_) => "multiSig",
        }
    }

    pub fn signing_scheme(&self) -> SigningScheme {
        match self {
            Self::Order(_)
            | Self::Cancel(_)
            | Self::CancelByCloid(_)
            | Self::BatchModify(_)
            | Self::ScheduleCancel(_)
            | Self::UpdateLeverage(_)
            | Self::UpdateIsolatedMargin(_)
            | Self::VaultTransfer(_)
            | Self::SubAccountTransfer(_)
            | Self::SubAccountSpotTransfer(_)
            | Self::SetReferrer(_)
            | Self::CreateSubAccount(_) => SigningScheme::L1,
            Self::UsdClassTransfer(_)
            | Self::UsdSend(_)
            | Self::SpotSend(_)
            | Self::Withdraw(_)
            | Self::ApproveAgent(_)
            | Self::ApproveBuilderFee(_)
            | Self::ConvertToMultiSigUser(_) => SigningScheme::UserSigned,
            Self::MultiSig(_) => SigningScheme::MultiSig,
        }
    }

    /// Whether a configured vault address goes into the envelope.
    ///
    /// User-signed actions are scoped to the signing account only.
    pub fn allows_vault(&self) -> bool {
        self.signing_scheme() != SigningScheme::UserSigned
    }

    /// EIP-712 message for user-signed kinds; `None` otherwise.
    pub fn typed_payload(&self) -> Option<TypedPayload> {
        use TypedValue::{Address as Addr, Bool, String as Str, Uint64};

        let chain = |c: &str| TypedField::new("hyperliquidChain", Str(c.to_string()));

        let payload = match self {
            Self::UsdClassTransfer(a) => TypedPayload::new(
                "UsdClassTransfer",
                vec![
                    chain(&a.hyperliquid_chain),
                    TypedField::new("amount", Str(a.amount.clone())),
                    TypedField::new("toPerp", Bool(a.to_perp)),
                    TypedField::new("nonce", Uint64(a.nonce)),
                ],
            ),
            Self::UsdSend(a) => TypedPayload::new(
                "UsdSend",
                vec![
                    chain(&a.hyperliquid_chain),
                    TypedField::new("destination", Str(a.destination.clone())),
                    TypedField::new("amount", Str(a.amount.clone())),
                    TypedField::new("time", Uint64(a.time)),
                ],
            ),
            Self::SpotSend(a) => TypedPayload::new(
                "SpotSend",
                vec![
                    chain(&a.hyperliquid_chain),
                    TypedField::new("destination", Str(a.destination.clone())),
                    TypedField::new("token", Str(a.token.clone())),
                    TypedField::new("amount", Str(a.amount.clone())),
                    TypedField::new("time", Uint64(a.time)),
                ],
            ),
            Self::Withdraw(a) => TypedPayload::new(
                "Withdraw",
                vec![
                    chain(&a.hyperliquid_chain),
                    TypedField::new("destination", Str(a.destination.clone())),
                    TypedField::new("amount", Str(a.amount.clone())),
                    TypedField::new("time", Uint64(a.time)),
                ],
            ),
            Self::ApproveAgent(a) => TypedPayload::new(
                "ApproveAgent",
                vec![
                    chain(&a.hyperliquid_chain),
                    TypedField::new("agentAddress", Addr(a.agent_address)),
                    TypedField::new("agentName", Str(a.agent_name.clone().unwrap_or_default())),
                    TypedField::new("nonce", Uint64(a.nonce)),
                ],
            ),
            Self::ApproveBuilderFee(a) => TypedPayload::new(
                "ApproveBuilderFee",
                vec![
                    chain(&a.hyperliquid_chain),
                    TypedField::new("maxFeeRate", Str(a.max_fee_rate.clone())),
                    TypedField::new("builder", Addr(a.builder)),
                    TypedField::new("nonce", Uint64(a.nonce)),
                ],
            ),
            Self::ConvertToMultiSigUser(a) => TypedPayload::new(
                "ConvertToMultiSigUser",
                vec![
                    chain(&a.hyperliquid_chain),
                    TypedField::new("signers", Str(a.signers.clone())),
                    TypedField::new("nonce", Uint64(a.nonce)),
                ],
            ),
            Self::Order(_)
            | Self::Cancel(_)
            | Self::CancelByCloid(_)
            | Self::BatchModify(_)
            | Self::ScheduleCancel(_)
            | Self::UpdateLeverage(_)
            | Self::UpdateIsolatedMargin(_)
            | Self::VaultTransfer(_)
            | Self::SubAccountTransfer(_)
            | Self::SubAccountSpotTransfer(_)
            | Self::SetReferrer(_)
            | Self::CreateSubAccount(_)
            | Self::MultiSig(_) => return None,
        };
        Some(payload)
    }
}
