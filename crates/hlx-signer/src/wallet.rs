//! Wallet capability.
//!
//! The signing pipeline only needs two things from a wallet: its public
//! address and a signature over a 32-byte digest. Anything that can do that
//! (a local key, a remote signer, a hardware wallet bridge) plugs in here.

use alloy::primitives::{Address, PrimitiveSignature, B256};
use alloy::signers::local::PrivateKeySigner;
use hlx_core::BoxFuture;

use crate::error::SignerError;

/// Trait for producing signatures over prepared digests.
pub trait WalletSigner: Send + Sync {
    fn address(&self) -> Address;

    /// Sign a 32-byte digest (EIP-712 signing hash).
    fn sign_hash<'a>(&'a self, hash: &'a B256)
        -> BoxFuture<'a, Result<PrimitiveSignature, SignerError>>;
}

impl WalletSigner for PrivateKeySigner {
    fn address(&self) -> Address {
        alloy::signers::Signer::address(self)
    }

    fn sign_hash<'a>(
        &'a self,
        hash: &'a B256,
    ) -> BoxFuture<'a, Result<PrimitiveSignature, SignerError>> {
        Box::pin(async move {
            let signature = alloy::signers::Signer::sign_hash(self, hash).await?;
            Ok(signature)
        })
    }
}
