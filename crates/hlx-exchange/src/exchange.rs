//! Action dispatcher.
//!
//! Every operation follows the same pipeline:
//!
//! 1. Resolve: coin names to asset indices, mids, positions
//! 2. Encode: requests to wire shapes (validation errors surface here)
//! 3. Sign: L1, user-signed, or multi-sig, chosen by the action kind
//! 4. Submit: POST the envelope to `/exchange` and hand back the raw response
//!
//! The response is returned as-is. Exchange-side rejections (bad nonce,
//! insufficient margin, ...) are data for the caller, not errors.

use std::sync::Arc;

use alloy::primitives::Address;
use hlx_core::{
    decimal_to_wire, round_price, usd_to_micros, CancelByCloidRequest, CancelRequest, Cloid,
    ModifyRequest, Network, OrderRef, OrderRequest, Price, Size, TimeInForce,
};
use hlx_info::{MarketInfo, Transport, EXCHANGE_PATH};
use hlx_signer::{
    address_to_wire, generate_agent_key, order_to_wire, Action, ActionSignature, AgentKey,
    BuilderInfo, CancelByCloidWire, CancelWire, Grouping, ModifyWire, NonceManager, NonceSource,
    OrderWire, Signer, WalletSigner,
};
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::ExchangeConfig;
use crate::error::{ExchangeError, ExchangeResult};

// ============================================================================
// MarketOptions
// ============================================================================

/// Optional knobs for [`Exchange::market_open`] and [`Exchange::market_close`].
#[derive(Debug, Clone, Default)]
pub struct MarketOptions {
    /// Reference price; the current mid when `None`.
    pub price: Option<Price>,
    /// Slippage fraction; the configured default when `None`.
    pub slippage: Option<Decimal>,
    pub cloid: Option<Cloid>,
    pub builder: Option<BuilderInfo>,
}

impl MarketOptions {
    pub fn with_slippage(mut self, slippage: Decimal) -> Self {
        self.slippage = Some(slippage);
        self
    }

    pub fn with_price(mut self, price: Price) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_cloid(mut self, cloid: Cloid) -> Self {
        self.cloid = Some(cloid);
        self
    }

    pub fn with_builder(mut self, builder: BuilderInfo) -> Self {
        self.builder = Some(builder);
        self
    }
}

// ============================================================================
// Exchange
// ============================================================================

/// Exchange action façade.
///
/// Holds no per-call state. The identity (wallet, vault, account) is fixed
/// at construction; the nonce source is the only shared mutable piece.
pub struct Exchange {
    wallet: Arc<dyn WalletSigner>,
    transport: Arc<dyn Transport>,
    info: Arc<dyn MarketInfo>,
    nonces: Arc<dyn NonceSource>,
    signer: Signer,
    vault_address: Option<Address>,
    account_address: Option<Address>,
    default_slippage: Decimal,
}

impl Exchange {
    /// Create a dispatcher.
    ///
    /// The signing network is derived from the transport's base URL, the
    /// URL requests actually go to. Nonces come from the process-wide
    /// [`NonceManager::shared`] instance.
    pub fn new(
        wallet: Arc<dyn WalletSigner>,
        transport: Arc<dyn Transport>,
        info: Arc<dyn MarketInfo>,
        config: &ExchangeConfig,
    ) -> ExchangeResult<Self> {
        config.validate()?;
        let signer =
            Signer::for_base_url(transport.base_url()).with_expires_after(config.expires_after);

        info!(
            network = %signer.network(),
            wallet = %address_to_wire(&wallet.address()),
            vault = ?config.vault_address,
            account = ?config.account_address,
            "Exchange dispatcher created"
        );

        Ok(Self {
            wallet,
            transport,
            info,
            nonces: NonceManager::shared(),
            signer,
            vault_address: config.vault()?,
            account_address: config.account()?,
            default_slippage: config.default_slippage,
        })
    }

    /// Replace the nonce source.
    #[must_use]
    pub fn with_nonce_source(mut self, nonces: Arc<dyn NonceSource>) -> Self {
        self.nonces = nonces;
        self
    }

    pub fn network(&self) -> Network {
        self.signer.network()
    }

    pub fn wallet_address(&self) -> Address {
        self.wallet.address()
    }

    pub fn vault_address(&self) -> Option<Address> {
        self.vault_address
    }

    /// Account whose state market orders act on: vault, else account, else
    /// the wallet itself.
    pub fn effective_user(&self) -> Address {
        self.vault_address
            .or(self.account_address)
            .unwrap_or_else(|| self.wallet.address())
    }

    // ------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------

    fn resolve_asset(&self, coin: &str) -> ExchangeResult<u32> {
        self.info
            .name_to_asset(coin)
            .ok_or_else(|| ExchangeError::UnknownCoin(coin.to_string()))
    }

    fn encode_order(&self, request: &OrderRequest) -> ExchangeResult<OrderWire> {
        let asset = self.resolve_asset(&request.coin)?;
        Ok(order_to_wire(request, asset)?)
    }

    async fn submit(&self, action: Action) -> ExchangeResult<Value> {
        let nonce = self.nonces.next_nonce();
        self.submit_with(action, nonce, self.vault_address).await
    }

    async fn submit_with(
        &self,
        action: Action,
        nonce: u64,
        vault_address: Option<Address>,
    ) -> ExchangeResult<Value> {
        let kind = action.kind();
        let envelope = self
            .signer
            .sign_envelope(self.wallet.as_ref(), action, nonce, vault_address)
            .await?;
        let body = envelope.to_json()?;

        // NOTE: body carries the signature; log only the kind and nonce
        debug!(action = kind, nonce, "Posting action");
        let response = self.transport.post_json(EXCHANGE_PATH, body).await?;
        debug!(action = kind, nonce, "Action response received");
        Ok(response)
    }

    // ------------------------------------------------------------------
    // Orders
    // ------------------------------------------------------------------

    pub async fn order(
        &self,
        request: OrderRequest,
        builder: Option<BuilderInfo>,
    ) -> ExchangeResult<Value> {
        self.bulk_orders(&[request], Grouping::Na, builder).await
    }

    /// Place a batch of orders in one signed action.
    pub async fn bulk_orders(
        &self,
        requests: &[OrderRequest],
        grouping: Grouping,
        builder: Option<BuilderInfo>,
    ) -> ExchangeResult<Value> {
        if requests.is_empty() {
            return Err(ExchangeError::Validation("no orders given".to_string()));
        }
        let wires = requests
            .iter()
            .map(|r| self.encode_order(r))
            .collect::<ExchangeResult<Vec<_>>>()?;

        self.submit(Action::order(wires, grouping, builder)?).await
    }

    pub async fn modify_order(
        &self,
        target: impl Into<OrderRef>,
        order: OrderRequest,
    ) -> ExchangeResult<Value> {
        self.bulk_modify(&[ModifyRequest {
            target: target.into(),
            order,
        }])
        .await
    }

    pub async fn bulk_modify(&self, modifies: &[ModifyRequest]) -> ExchangeResult<Value> {
        if modifies.is_empty() {
            return Err(ExchangeError::Validation("no modifies given".to_string()));
        }
        let wires = modifies
            .iter()
            .map(|m| {
                Ok(ModifyWire {
                    oid: m.target.into(),
                    order: self.encode_order(&m.order)?,
                })
            })
            .collect::<ExchangeResult<Vec<_>>>()?;

        self.submit(Action::batch_modify(wires)?).await
    }

    pub async fn cancel(&self, coin: &str, oid: u64) -> ExchangeResult<Value> {
        self.bulk_cancel(&[CancelRequest {
            coin: coin.to_string(),
            oid,
        }])
        .await
    }

    pub async fn bulk_cancel(&self, cancels: &[CancelRequest]) -> ExchangeResult<Value> {
        if cancels.is_empty() {
            return Err(ExchangeError::Validation("no cancels given".to_string()));
        }
        let wires = cancels
            .iter()
            .map(|c| {
                Ok(CancelWire {
                    asset: self.resolve_asset(&c.coin)?,
                    oid: c.oid,
                })
            })
            .collect::<ExchangeResult<Vec<_>>>()?;

        self.submit(Action::cancel(wires)?).await
    }

    pub async fn cancel_by_cloid(&self, coin: &str, cloid: Cloid) -> ExchangeResult<Value> {
        self.bulk_cancel_by_cloid(&[CancelByCloidRequest {
            coin: coin.to_string(),
            cloid,
        }])
        .await
    }

    pub async fn bulk_cancel_by_cloid(
        &self,
        cancels: &[CancelByCloidRequest],
    ) -> ExchangeResult<Value> {
        if cancels.is_empty() {
            return Err(ExchangeError::Validation("no cancels given".to_string()));
        }
        let wires = cancels
            .iter()
            .map(|c| {
                Ok(CancelByCloidWire {
                    asset: self.resolve_asset(&c.coin)?,
                    cloid: c.cloid.to_hex(),
                })
            })
            .collect::<ExchangeResult<Vec<_>>>()?;

        self.submit(Action::cancel_by_cloid(wires)?).await
    }

    // ------------------------------------------------------------------
    // Market orders
    // ------------------------------------------------------------------

    /// Aggressive limit price: reference price moved by `slippage`, then
    /// rounded to 5 significant figures and 6 (perp) or 8 (spot) decimals.
    pub async fn slippage_price(
        &self,
        coin: &str,
        is_buy: bool,
        slippage: Decimal,
        price: Option<Price>,
    ) -> ExchangeResult<Price> {
        let asset = self.resolve_asset(coin)?;
        let reference = match price {
            Some(price) => price,
            None => self.info.mid_price(coin).await?,
        };
        let adjusted = reference.with_slippage(is_buy, slippage);
        Ok(round_price(adjusted, self.info.is_spot(asset)))
    }

    /// Local checks for market orders, run before any info lookup.
    /// Returns the slippage to apply.
    fn check_market_inputs(
        &self,
        coin: &str,
        size: Option<Size>,
        options: &MarketOptions,
    ) -> ExchangeResult<Decimal> {
        self.resolve_asset(coin)?;
        if let Some(size) = size {
            if !size.is_positive() {
                return Err(ExchangeError::Validation(format!(
                    "size {size} for {coin} must be positive"
                )));
            }
        }
        if let Some(price) = options.price {
            if !price.is_positive() {
                return Err(ExchangeError::Validation(format!(
                    "price {price} for {coin} must be positive"
                )));
            }
        }
        let slippage = options.slippage.unwrap_or(self.default_slippage);
        if slippage.is_sign_negative() || slippage >= Decimal::ONE {
            return Err(ExchangeError::Validation(format!(
                "slippage {slippage} must be in [0, 1)"
            )));
        }
        Ok(slippage)
    }

    /// Immediate-or-cancel limit order at the slippage price.
    pub async fn market_open(
        &self,
        coin: &str,
        is_buy: bool,
        size: Size,
        options: MarketOptions,
    ) -> ExchangeResult<Value> {
        let slippage = self.check_market_inputs(coin, Some(size), &options)?;
        let price = self
            .slippage_price(coin, is_buy, slippage, options.price)
            .await?;

        info!(coin, is_buy, %size, %price, "Market open");
        let mut request =
            OrderRequest::limit(coin, is_buy, size, price, TimeInForce::ImmediateOrCancel);
        request.cloid = options.cloid;

        self.order(request, options.builder).await
    }

    /// Close (all or `size` of) the current position in `coin`.
    ///
    /// Fails with [`ExchangeError::NoMatchingPosition`] before any order is
    /// built when the effective user holds nothing in `coin`.
    pub async fn market_close(
        &self,
        coin: &str,
        size: Option<Size>,
        options: MarketOptions,
    ) -> ExchangeResult<Value> {
        let slippage = self.check_market_inputs(coin, size, &options)?;
        let user = address_to_wire(&self.effective_user());
        let positions = self.info.user_positions(&user).await?;
        let position = positions
            .into_iter()
            .find(|p| p.coin == coin && !p.is_empty())
            .ok_or_else(|| ExchangeError::NoMatchingPosition {
                coin: coin.to_string(),
                user: user.clone(),
            })?;

        let size = size.unwrap_or_else(|| position.abs_size());
        let is_buy = position.is_short();
        let price = self
            .slippage_price(coin, is_buy, slippage, options.price)
            .await?;

        info!(coin, is_buy, %size, %price, position = %position.size, "Market close");
        let mut request =
            OrderRequest::limit(coin, is_buy, size, price, TimeInForce::ImmediateOrCancel)
                .reduce_only();
        request.cloid = options.cloid;

        self.order(request, options.builder).await
    }

    // ------------------------------------------------------------------
    // Account
    // ------------------------------------------------------------------

    /// Cancel all orders at `time` (ms); `None` clears the schedule.
    pub async fn schedule_cancel(&self, time: Option<u64>) -> ExchangeResult<Value> {
        self.submit(Action::schedule_cancel(time)).await
    }

    pub async fn update_leverage(
        &self,
        leverage: u32,
        coin: &str,
        is_cross: bool,
    ) -> ExchangeResult<Value> {
        if leverage == 0 {
            return Err(ExchangeError::Validation(
                "leverage must be at least 1".to_string(),
            ));
        }
        let asset = self.resolve_asset(coin)?;
        self.submit(Action::update_leverage(asset, is_cross, leverage))
            .await
    }

    /// Add (positive) or remove (negative) isolated margin in USD.
    pub async fn update_isolated_margin(
        &self,
        amount: Decimal,
        coin: &str,
    ) -> ExchangeResult<Value> {
        let asset = self.resolve_asset(coin)?;
        let ntli = usd_to_micros(amount)?;
        self.submit(Action::update_isolated_margin(asset, ntli))
            .await
    }

    pub async fn set_referrer(&self, code: &str) -> ExchangeResult<Value> {
        self.submit(Action::set_referrer(code)).await
    }

    pub async fn create_sub_account(&self, name: &str) -> ExchangeResult<Value> {
        self.submit(Action::create_sub_account(name)).await
    }

    // ------------------------------------------------------------------
    // Transfers
    // ------------------------------------------------------------------

    /// Move USD between the spot and perp balances.
    ///
    /// With a vault configured the amount names the sub-account; the
    /// envelope itself never carries `vaultAddress` for this action.
    pub async fn usd_class_transfer(&self, amount: Decimal, to_perp: bool) -> ExchangeResult<Value> {
        let amount = positive_amount(amount)?;
        let nonce = self.nonces.next_nonce();
        let action = Action::usd_class_transfer(
            self.network(),
            &amount,
            to_perp,
            nonce,
            self.vault_address,
        );
        self.submit_with(action, nonce, self.vault_address).await
    }

    pub async fn usd_transfer(&self, amount: Decimal, destination: Address) -> ExchangeResult<Value> {
        let amount = positive_amount(amount)?;
        let nonce = self.nonces.next_nonce();
        let action = Action::usd_send(self.network(), destination, &amount, nonce);
        self.submit_with(action, nonce, None).await
    }

    /// Send a spot token (`token` is `NAME:0x<token id>`).
    pub async fn spot_transfer(
        &self,
        amount: Decimal,
        destination: Address,
        token: &str,
    ) -> ExchangeResult<Value> {
        let amount = positive_amount(amount)?;
        let nonce = self.nonces.next_nonce();
        let action = Action::spot_send(self.network(), destination, token, &amount, nonce);
        self.submit_with(action, nonce, None).await
    }

    pub async fn withdraw_from_bridge(
        &self,
        amount: Decimal,
        destination: Address,
    ) -> ExchangeResult<Value> {
        let amount = positive_amount(amount)?;
        let nonce = self.nonces.next_nonce();
        let action = Action::withdraw(self.network(), destination, &amount, nonce);
        self.submit_with(action, nonce, None).await
    }

    pub async fn vault_transfer(
        &self,
        vault_address: Address,
        is_deposit: bool,
        usd: Decimal,
    ) -> ExchangeResult<Value> {
        let usd = usd_to_micros(usd)?;
        self.submit(Action::vault_transfer(vault_address, is_deposit, usd))
            .await
    }

    pub async fn sub_account_transfer(
        &self,
        sub_account_user: Address,
        is_deposit: bool,
        usd: Decimal,
    ) -> ExchangeResult<Value> {
        let usd = usd_to_micros(usd)?;
        self.submit(Action::sub_account_transfer(sub_account_user, is_deposit, usd))
            .await
    }

    pub async fn sub_account_spot_transfer(
        &self,
        sub_account_user: Address,
        is_deposit: bool,
        token: &str,
        amount: Decimal,
    ) -> ExchangeResult<Value> {
        let amount = positive_amount(amount)?;
        self.submit(Action::sub_account_spot_transfer(
            sub_account_user,
            is_deposit,
            token,
            amount,
        ))
        .await
    }

    // ------------------------------------------------------------------
    // Agents, builders, multi-sig
    // ------------------------------------------------------------------

    /// Authorize a freshly generated agent key to trade for this wallet.
    ///
    /// The key is returned to the caller by value and not kept anywhere.
    pub async fn approve_agent(&self, name: Option<String>) -> ExchangeResult<(Value, AgentKey)> {
        let (agent_key, agent_address) = generate_agent_key();
        let nonce = self.nonces.next_nonce();

        info!(agent = %address_to_wire(&agent_address), name = ?name, "Approving agent");
        let action = Action::approve_agent(self.network(), agent_address, name, nonce);
        let response = self.submit_with(action, nonce, None).await?;
        Ok((response, agent_key))
    }

    /// Allow `builder` to charge up to `max_fee_rate` (e.g. `"0.001%"`).
    pub async fn approve_builder_fee(
        &self,
        builder: Address,
        max_fee_rate: &str,
    ) -> ExchangeResult<Value> {
        let nonce = self.nonces.next_nonce();
        let action = Action::approve_builder_fee(self.network(), builder, max_fee_rate, nonce);
        self.submit_with(action, nonce, None).await
    }

    /// Turn this account into a multi-sig account.
    pub async fn convert_to_multi_sig_user(
        &self,
        authorized_users: &[Address],
        threshold: u32,
    ) -> ExchangeResult<Value> {
        let nonce = self.nonces.next_nonce();
        let action =
            Action::convert_to_multi_sig_user(self.network(), authorized_users, threshold, nonce)?;
        self.submit_with(action, nonce, None).await
    }

    /// Submit `inner` on behalf of `multi_sig_user` with collected
    /// co-signatures, in the order given.
    ///
    /// `nonce` must be the one the co-signers signed over.
    pub async fn execute_multi_sig(
        &self,
        multi_sig_user: Address,
        inner: Action,
        signatures: Vec<ActionSignature>,
        nonce: u64,
        vault_address: Option<Address>,
    ) -> ExchangeResult<Value> {
        if signatures.is_empty() {
            return Err(ExchangeError::Validation(
                "multi-sig requires at least one signature".to_string(),
            ));
        }
        let action = Action::multi_sig(multi_sig_user, self.wallet.address(), inner, signatures);
        self.submit_with(action, nonce, vault_address).await
    }

    /// This wallet's co-signature over an inner L1 action.
    pub async fn multi_sig_l1_signature(
        &self,
        inner: &Action,
        multi_sig_user: Address,
        outer_signer: Address,
        nonce: u64,
    ) -> ExchangeResult<ActionSignature> {
        Ok(self
            .signer
            .sign_multi_sig_l1_payload(
                self.wallet.as_ref(),
                inner,
                multi_sig_user,
                outer_signer,
                nonce,
                self.vault_address,
            )
            .await?)
    }

    /// This wallet's co-signature over an inner user-signed action.
    pub async fn multi_sig_user_signed_signature(
        &self,
        inner: &Action,
        multi_sig_user: Address,
        outer_signer: Address,
    ) -> ExchangeResult<ActionSignature> {
        Ok(self
            .signer
            .sign_multi_sig_user_signed_payload(
                self.wallet.as_ref(),
                inner,
                multi_sig_user,
                outer_signer,
            )
            .await?)
    }
}

fn positive_amount(amount: Decimal) -> ExchangeResult<String> {
    if amount.is_sign_negative() || amount.is_zero() {
        return Err(ExchangeError::Validation(format!(
            "amount {amount} must be positive"
        )));
    }
    Ok(decimal_to_wire(amount)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_positive_amount() {
        assert_eq!(positive_amount(dec!(1.50)).unwrap(), "1.5");
        assert!(matches!(
            positive_amount(dec!(0)),
            Err(ExchangeError::Validation(_))
        ));
        assert!(positive_amount(dec!(-3)).is_err());
    }

    #[test]
    fn test_market_options_builders() {
        let options = MarketOptions::default()
            .with_slippage(dec!(0.01))
            .with_price(Price::new(dec!(10)));
        assert_eq!(options.slippage, Some(dec!(0.01)));
        assert_eq!(options.price, Some(Price::new(dec!(10))));
        assert!(options.cloid.is_none());
    }
}
