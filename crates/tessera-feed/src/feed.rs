//! Authorization, freshness and overwrite gate over a [`PriceStore`].
//!
//! `set_prices` runs its checks in a fixed order and writes nothing unless
//! all of them pass:
//!
//! 1. the recovered signer is authorized
//! 2. the package is fresh against the caller's reference clock
//! 3. no symbol in the package is already present

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tessera_types::{Address, PricePackage, Signature, Symbol};

use crate::config::{ClearPolicy, FeedConfig};
use crate::freshness::FreshnessWindow;
use crate::store::PriceStore;
use crate::verifier::SignerRecovery;
use crate::{CallContext, FeedError, Result};

/// Price state plus the signer set and policy that guard it.
#[derive(Clone)]
pub struct PriceFeed {
    admin: Address,
    verifier: Arc<dyn SignerRecovery>,
    window: FreshnessWindow,
    clear_policy: ClearPolicy,
    signers: HashSet<Address>,
    operators: HashSet<Address>,
    store: PriceStore,
}

impl PriceFeed {
    /// Create a feed administered by `admin`.
    ///
    /// # Errors
    ///
    /// - [`FeedError::InvalidVerifier`] if `verifier` is `None`
    /// - [`FeedError::DelayTooShort`] if the configured delay is below 15s
    pub fn new(
        admin: Address,
        verifier: Option<Arc<dyn SignerRecovery>>,
        config: &FeedConfig,
    ) -> Result<Self> {
        let verifier = verifier.ok_or(FeedError::InvalidVerifier)?;
        let window = FreshnessWindow::new(config.max_price_delay_secs)?;
        tracing::info!(
            %admin,
            max_delay = config.max_price_delay_secs,
            clear_policy = ?config.clear_policy,
            "price feed created"
        );
        Ok(Self {
            admin,
            verifier,
            window,
            clear_policy: config.clear_policy,
            signers: HashSet::new(),
            operators: HashSet::new(),
            store: PriceStore::new(),
        })
    }

    fn require_admin(&self, ctx: &CallContext) -> Result<()> {
        if ctx.caller != self.admin {
            return Err(FeedError::Unauthorized { caller: ctx.caller });
        }
        Ok(())
    }

    /// Add `signer` to the authorized set. Idempotent.
    pub fn authorize_signer(&mut self, ctx: &CallContext, signer: Address) -> Result<()> {
        self.require_admin(ctx)?;
        if self.signers.insert(signer) {
            tracing::info!(%signer, "signer authorized");
        }
        Ok(())
    }

    /// Remove `signer` from the authorized set. Idempotent.
    pub fn revoke_signer(&mut self, ctx: &CallContext, signer: Address) -> Result<()> {
        self.require_admin(ctx)?;
        if self.signers.remove(&signer) {
            tracing::info!(%signer, "signer revoked");
        }
        Ok(())
    }

    /// Allow `operator` to clear prices under [`ClearPolicy::Restricted`].
    pub fn authorize_operator(&mut self, ctx: &CallContext, operator: Address) -> Result<()> {
        self.require_admin(ctx)?;
        if self.operators.insert(operator) {
            tracing::info!(%operator, "operator authorized");
        }
        Ok(())
    }

    pub fn revoke_operator(&mut self, ctx: &CallContext, operator: Address) -> Result<()> {
        self.require_admin(ctx)?;
        if self.operators.remove(&operator) {
            tracing::info!(%operator, "operator revoked");
        }
        Ok(())
    }

    /// Hand administration to `new_admin`.
    pub fn transfer_admin(&mut self, ctx: &CallContext, new_admin: Address) -> Result<()> {
        self.require_admin(ctx)?;
        tracing::warn!(old = %self.admin, new = %new_admin, "feed administration transferred");
        self.admin = new_admin;
        Ok(())
    }

    /// Authenticate `package` and admit all of its entries.
    ///
    /// # Errors
    ///
    /// - [`FeedError::InvalidSignature`] if no identity can be recovered
    /// - [`FeedError::UnauthorizedSigner`] if the recovered identity is not authorized
    /// - [`FeedError::FutureTimestamp`] / [`FeedError::StaleTimestamp`] outside the window
    /// - [`FeedError::OverwriteConflict`] if any symbol is already present
    pub fn set_prices(
        &mut self,
        ctx: &CallContext,
        package: &PricePackage,
        signature: &Signature,
    ) -> Result<()> {
        let recovered = self.verifier.recover_signer(package, signature)?;
        if !self.signers.contains(&recovered) {
            tracing::warn!(%recovered, "rejected package from unauthorized signer");
            return Err(FeedError::UnauthorizedSigner { recovered });
        }

        self.window.check(package.timestamp, ctx.timestamp)?;
        self.store.insert_all(&package.entries)?;

        tracing::debug!(
            signer = %recovered,
            entries = package.len(),
            timestamp = package.timestamp,
            "prices set"
        );
        Ok(())
    }

    /// Remove every symbol named in `package`. Absent symbols are skipped.
    ///
    /// # Errors
    ///
    /// [`FeedError::Unauthorized`] under [`ClearPolicy::Restricted`] when the
    /// caller is neither the administrator nor an operator.
    pub fn clear_prices(&mut self, ctx: &CallContext, package: &PricePackage) -> Result<()> {
        if self.clear_policy == ClearPolicy::Restricted
            && ctx.caller != self.admin
            && !self.operators.contains(&ctx.caller)
        {
            return Err(FeedError::Unauthorized { caller: ctx.caller });
        }

        let removed = package
            .symbols()
            .filter(|symbol| self.store.remove(symbol))
            .count();
        tracing::debug!(removed, requested = package.len(), "prices cleared");
        Ok(())
    }

    /// Stored value for `symbol`.
    ///
    /// # Errors
    ///
    /// [`FeedError::NoPricingData`] if the symbol is absent.
    pub fn get_price(&self, symbol: &Symbol) -> Result<u128> {
        self.store
            .get(symbol)
            .ok_or(FeedError::NoPricingData { symbol: *symbol })
    }

    pub fn is_signer_authorized(&self, signer: &Address) -> bool {
        self.signers.contains(signer)
    }

    pub fn is_operator(&self, operator: &Address) -> bool {
        self.operators.contains(operator)
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    pub fn max_price_delay(&self) -> u64 {
        self.window.max_delay()
    }

    pub fn clear_policy(&self) -> ClearPolicy {
        self.clear_policy
    }

    pub fn store(&self) -> &PriceStore {
        &self.store
    }
}

impl fmt::Debug for PriceFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriceFeed")
            .field("admin", &self.admin)
            .field("window", &self.window)
            .field("clear_policy", &self.clear_policy)
            .field("signers", &self.signers)
            .field("operators", &self.operators)
            .field("store", &self.store)
            .finish()
    }
}
