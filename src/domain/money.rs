use {
    super::error::PayError,
    serde::{Deserialize, Serialize},
    std::fmt,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyAmount(i64);

impl MoneyAmount {
    pub fn new(minor_units: i64) -> Result<Self, PayError> {
        if minor_units < 0 {
            return Err(PayError::PreconditionFailed(format!(
                "MoneyAmount cannot be negative, got: {minor_units}"
            )));
        }
        Ok(Self(minor_units))
    }

    pub fn zero() -> Self {
        Self(0)
    }

    pub fn minor_units(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for MoneyAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Jpy,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Jpy => "JPY",
        }
    }

    /// Number of minor-unit digits in the provider's decimal representation.
    pub fn exponent(&self) -> u32 {
        match self {
            Self::Jpy => 0,
            _ => 2,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for Currency {
    type Error = PayError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            "GBP" => Ok(Self::Gbp),
            "JPY" => Ok(Self::Jpy),
            other => Err(PayError::PreconditionFailed(format!(
                "unknown currency: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: MoneyAmount,
    currency: Currency,
}

impl Money {
    pub fn new(amount: MoneyAmount, currency: Currency) -> Self {
        Self { amount, currency }
    }

    pub fn zero(currency: Currency) -> Self {
        Self::new(MoneyAmount::zero(), currency)
    }

    pub fn amount(&self) -> MoneyAmount {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Decimal string the provider API expects, e.g. `"12.34"` (USD) or
    /// `"1234"` (JPY).
    pub fn wire_value(&self) -> String {
        let units = self.amount.minor_units();
        match self.currency.exponent() {
            0 => units.to_string(),
            exp => {
                let scale = 10i64.pow(exp);
                format!(
                    "{}.{:0width$}",
                    units / scale,
                    units % scale,
                    width = exp as usize
                )
            }
        }
    }

    /// Parse the provider's decimal string back into minor units.
    pub fn from_wire(value: &str, currency: Currency) -> Result<Self, PayError> {
        let exp = currency.exponent() as usize;
        let (whole, frac) = match value.split_once('.') {
            Some((w, f)) => (w, f),
            None => (value, ""),
        };
        if frac.len() > exp {
            return Err(PayError::PreconditionFailed(format!(
                "too many decimal places for {currency}: {value}"
            )));
        }
        let whole: i64 = whole
            .parse()
            .map_err(|_| PayError::PreconditionFailed(format!("bad amount: {value}")))?;
        let frac_units: i64 = if frac.is_empty() {
            0
        } else {
            frac.parse::<i64>()
                .map_err(|_| PayError::PreconditionFailed(format!("bad amount: {value}")))?
                * 10i64.pow((exp - frac.len()) as u32)
        };
        let amount = MoneyAmount::new(whole * 10i64.pow(exp as u32) + frac_units)?;
        Ok(Self::new(amount, currency))
    }
}
