//! Deposit/valuation application used as the call target.
//!
//! Balances are whole units per `(account, asset)`. The value of a position
//! is `balance * price`, where `price` is the fixed-point feed value, so a
//! deposit of `q` at a whole-unit price `p` is worth `q * p * 10^8`.

use std::collections::HashMap;

use tessera_codec::abi::{self, AbiReader, AbiWord};
use tessera_feed::{CallContext, FeedError, LitePriceReader, PriceFeed, Target};
use tessera_inject::{Contract, Injector, Operation, Receipt};
use tessera_types::{Address, Symbol};

pub const DEPOSIT: &str = "deposit(bytes32,uint256)";
pub const BALANCE_OF: &str = "balanceOf(address,bytes32)";
pub const CURRENT_VALUE_OF: &str = "currentValueOf(address,bytes32)";

pub struct Deposit {
    pub asset: Symbol,
    pub amount: u128,
}

impl Operation for Deposit {
    const NAME: &'static str = "deposit";
    const SIGNATURE: &'static str = DEPOSIT;
    const READ_ONLY: bool = false;
    type Output = ();

    fn encode_args(&self) -> Vec<u8> {
        abi::encode_words(&[self.asset.to_word(), self.amount.to_word()])
    }
}

pub struct BalanceOf {
    pub account: Address,
    pub asset: Symbol,
}

impl Operation for BalanceOf {
    const NAME: &'static str = "balance_of";
    const SIGNATURE: &'static str = BALANCE_OF;
    const READ_ONLY: bool = true;
    type Output = u128;

    fn encode_args(&self) -> Vec<u8> {
        abi::encode_words(&[self.account.to_word(), self.asset.to_word()])
    }
}

pub struct CurrentValueOf {
    pub account: Address,
    pub asset: Symbol,
}

impl Operation for CurrentValueOf {
    const NAME: &'static str = "current_value_of";
    const SIGNATURE: &'static str = CURRENT_VALUE_OF;
    const READ_ONLY: bool = true;
    type Output = u128;

    fn encode_args(&self) -> Vec<u8> {
        abi::encode_words(&[self.account.to_word(), self.asset.to_word()])
    }
}

/// Typed surface over a deployed [`MockDefi`] or [`LiteDefi`].
#[derive(Clone, Debug)]
pub struct DefiClient {
    contract: Contract,
}

impl DefiClient {
    pub fn new(contract: Contract) -> Self {
        Self { contract }
    }

    pub fn wrap(&self, injector: Injector) -> Self {
        Self::new(self.contract.wrap(injector))
    }

    pub fn unwrap(&self) -> Self {
        Self::new(self.contract.unwrap())
    }

    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    pub async fn deposit(&self, asset: Symbol, amount: u128) -> tessera_inject::Result<Receipt> {
        self.contract.send(&Deposit { asset, amount }).await
    }

    pub async fn balance_of(&self, account: Address, asset: Symbol) -> tessera_inject::Result<u128> {
        self.contract.call(&BalanceOf { account, asset }).await
    }

    pub async fn current_value_of(
        &self,
        account: Address,
        asset: Symbol,
    ) -> tessera_inject::Result<u128> {
        self.contract.call(&CurrentValueOf { account, asset }).await
    }
}

fn selector_of(calldata: &[u8]) -> Result<[u8; 4], FeedError> {
    calldata
        .get(..4)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| FeedError::Target("calldata shorter than a selector".to_string()))
}

/// Application state: balances only. Prices come from the caller.
#[derive(Clone, Debug, Default)]
pub struct MockDefi {
    balances: HashMap<(Address, Symbol), u128>,
}

impl MockDefi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute `calldata`, pricing assets with `price`.
    pub fn dispatch(
        &mut self,
        caller: Address,
        calldata: &[u8],
        price: impl Fn(&Symbol) -> Result<u128, FeedError>,
    ) -> Result<Vec<u8>, FeedError> {
        let selector = selector_of(calldata)?;
        let args = AbiReader::new(&calldata[4..]);

        if selector == abi::selector(DEPOSIT) {
            let asset: Symbol = args.word_as(0)?;
            let amount: u128 = args.word_as(32)?;
            let balance = self.balances.entry((caller, asset)).or_default();
            *balance = balance
                .checked_add(amount)
                .ok_or_else(|| FeedError::Target("balance overflow".to_string()))?;
            Ok(Vec::new())
        } else if selector == abi::selector(BALANCE_OF) {
            let account: Address = args.word_as(0)?;
            let asset: Symbol = args.word_as(32)?;
            Ok(self.balance(&account, &asset).to_word().to_vec())
        } else if selector == abi::selector(CURRENT_VALUE_OF) {
            let account: Address = args.word_as(0)?;
            let asset: Symbol = args.word_as(32)?;
            let value = self
                .balance(&account, &asset)
                .checked_mul(price(&asset)?)
                .ok_or_else(|| FeedError::Target("value overflow".to_string()))?;
            Ok(value.to_word().to_vec())
        } else {
            Err(FeedError::Target(format!(
                "unknown selector 0x{:02x}{:02x}{:02x}{:02x}",
                selector[0], selector[1], selector[2], selector[3]
            )))
        }
    }

    pub fn balance(&self, account: &Address, asset: &Symbol) -> u128 {
        self.balances.get(&(*account, *asset)).copied().unwrap_or(0)
    }
}

impl Target for MockDefi {
    fn execute(
        &mut self,
        ctx: &CallContext,
        feed: &PriceFeed,
        calldata: &[u8],
    ) -> Result<Vec<u8>, FeedError> {
        self.dispatch(ctx.caller, calldata, |asset| feed.get_price(asset))
    }
}

/// The same application reading prices straight out of its calldata.
#[derive(Clone, Debug)]
pub struct LiteDefi {
    reader: LitePriceReader,
    inner: MockDefi,
}

impl LiteDefi {
    pub fn new(reader: LitePriceReader) -> Self {
        Self {
            reader,
            inner: MockDefi::new(),
        }
    }

    /// Price-aware operations require a lite payload; the rest ignore
    /// anything after their arguments.
    pub fn execute(&mut self, ctx: &CallContext, calldata: &[u8]) -> Result<Vec<u8>, FeedError> {
        if selector_of(calldata)? != abi::selector(CURRENT_VALUE_OF) {
            return self.inner.dispatch(ctx.caller, calldata, |asset| {
                Err(FeedError::NoPricingData { symbol: *asset })
            });
        }

        let prices = self.reader.read(calldata, ctx.timestamp)?;
        self.inner.dispatch(ctx.caller, prices.prefix, |asset| {
            prices
                .price_of(asset)
                .ok_or(FeedError::NoPricingData { symbol: *asset })
        })
    }
}
