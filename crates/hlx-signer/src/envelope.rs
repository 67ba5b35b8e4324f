//! Signed envelope ready for transmission.
//!
//! The `/exchange` request body is exactly
//! `{action, nonce, signature, vaultAddress?, expiresAfter?}`. Absent
//! optional keys are omitted, never sent as `null`.

use alloy::primitives::PrimitiveSignature;
use serde::{Deserialize, Serialize};

use crate::action::Action;

/// ECDSA signature components as the exchange expects them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSignature {
    /// r component (hex with 0x prefix, e.g., "0x1a2b...").
    pub r: String,
    /// s component (hex with 0x prefix, e.g., "0x3c4d...").
    pub s: String,
    /// v component (recovery id, 27 or 28).
    pub v: u8,
}

impl From<&PrimitiveSignature> for ActionSignature {
    fn from(sig: &PrimitiveSignature) -> Self {
        Self {
            r: format!("0x{}", hex::encode(sig.r().to_be_bytes::<32>())),
            s: format!("0x{}", hex::encode(sig.s().to_be_bytes::<32>())),
            v: 27 + u8::from(sig.v()),
        }
    }
}

impl From<PrimitiveSignature> for ActionSignature {
    fn from(sig: PrimitiveSignature) -> Self {
        Self::from(&sig)
    }
}

/// An action with its nonce and signature.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedEnvelope {
    pub action: Action,
    pub nonce: u64,
    pub signature: ActionSignature,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vault_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_after: Option<u64>,
}

impl SignedEnvelope {
    /// Request body for the `/exchange` endpoint.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, ScheduleCancel};
    use alloy::primitives::U256;

    #[test]
    fn test_signature_from_primitive_pads() {
        let sig = PrimitiveSignature::new(U256::from(1u8), U256::from(2u8), true);
        let wire = ActionSignature::from(&sig);
        assert_eq!(wire.r, format!("0x{}01", "0".repeat(62)));
        assert_eq!(wire.s, format!("0x{}02", "0".repeat(62)));
        assert_eq!(wire.v, 28);
    }

    #[test]
    fn test_envelope_omits_absent_keys() {
        let envelope = SignedEnvelope {
            action: Action::ScheduleCancel(ScheduleCancel { time: None }),
            nonce: 42,
            signature: ActionSignature {
                r: "0x01".into(),
                s: "0x02".into(),
                v: 27,
            },
            vault_address: None,
            expires_after: None,
        };
        let json = serde_json::to_string(&envelope).unwrap();
        assert_eq!(
            json,
            r#"{"action":{"type":"scheduleCancel"},"nonce":42,"signature":{"r":"0x01","s":"0x02","v":27}}"#
        );
    }

    #[test]
    fn test_envelope_key_order_with_vault() {
        let envelope = SignedEnvelope {
            action: Action::ScheduleCancel(ScheduleCancel { time: Some(5) }),
            nonce: 1,
            signature: ActionSignature {
                r: "0x01".into(),
                s: "0x02".into(),
                v: 28,
            },
            vault_address: Some("0xabc".into()),
            expires_after: Some(9),
        };
        let value = envelope.to_json().unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(
            keys,
            ["action", "nonce", "signature", "vaultAddress", "expiresAfter"]
        );
    }
}
