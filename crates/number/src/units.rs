use {
    alloy::primitives::{
        U256,
        utils::{ParseUnits, Unit, parse_units},
    },
    anyhow::{Context, Result, bail, ensure},
};

pub trait EthUnit: std::marker::Sized {
    /// Returns the current wei amount.
    fn wei(self) -> U256;

    /// Returns the current Gwei amount as wei (i.e. 1e9 wei).
    fn gwei(self) -> U256 {
        self.wei() * Unit::GWEI.wei()
    }

    /// Returns the current Eth amount as wei (i.e. 1e18 wei).
    fn eth(self) -> U256 {
        self.wei() * Unit::ETHER.wei()
    }
}

impl EthUnit for u64 {
    fn wei(self) -> U256 {
        U256::from(self)
    }
}

impl EthUnit for u128 {
    fn wei(self) -> U256 {
        U256::from(self)
    }
}

/// Parses a non-negative decimal amount with an optional unit suffix into
/// wei.
///
/// Accepts inputs like `"100"`, `"10 gwei"`, `"0.1ether"` or `"1.5 Finney"`.
/// Without a suffix the amount is taken to be in wei already. Amounts finer
/// than 1 wei are rejected.
pub fn parse_amount(amount: &str) -> Result<U256> {
    let (value, unit) = split_amount(amount);
    ensure!(!value.is_empty(), "missing numeric value in {amount:?}");
    ensure_wei_precision(amount)?;

    match parse_units(value, unit.as_str())
        .with_context(|| format!("invalid amount {amount:?}"))?
    {
        ParseUnits::U256(wei) => Ok(wei),
        ParseUnits::I256(_) => bail!("amount {amount:?} must not be negative"),
    }
}

/// Fails if `amount` has more fractional digits than its unit has decimals,
/// i.e. if converting it to wei would have to round.
///
/// Amounts with a suffix that isn't a known unit are left for the caller to
/// reject.
pub fn ensure_wei_precision(amount: &str) -> Result<()> {
    let (value, unit) = split_amount(amount);
    let Ok(unit) = Unit::try_from(unit.as_str()) else {
        return Ok(());
    };
    let fraction = value
        .split_once('.')
        .map(|(_, fraction)| fraction.trim_end_matches('0'))
        .unwrap_or_default();
    ensure!(
        fraction.len() <= usize::from(unit.get()),
        "amount {:?} has more precision than wei",
        amount.trim()
    );
    Ok(())
}

/// Splits `"1.5 gwei"` into `("1.5", "gwei")`, defaulting to wei.
fn split_amount(amount: &str) -> (&str, String) {
    let amount = amount.trim();
    let split = amount
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(amount.len());
    let (value, unit) = amount.split_at(split);
    let unit = match unit.trim() {
        "" => "wei".to_string(),
        unit => unit.to_ascii_lowercase(),
    };
    (value.trim(), unit)
}

/// Like [`parse_amount`] but for values that have to fit into a `u128`, such
/// as gas prices.
pub fn parse_amount_u128(amount: &str) -> Result<u128> {
    let wei = parse_amount(amount)?;
    u128::try_from(wei).with_context(|| format!("amount {amount:?} does not fit into 128 bits"))
}
