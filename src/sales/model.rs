//! Sale record and currency amounts

use crate::error::{Error, Result};
use chrono::{NaiveDate, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::ops::Sub;
use std::str::FromStr;

/// Maximum length of `product_name`, in characters.
pub const PRODUCT_NAME_MAX_LEN: usize = 200;

/// Largest absolute amount a `DECIMAL(10,2)` column holds, in cents.
pub const MONEY_MAX_CENTS: i64 = 9_999_999_999;

/// Fixed-point currency amount with two decimals, stored as integer cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    /// Rounds a database REAL to the nearest cent.
    pub fn from_f64(value: f64) -> Self {
        Money((value * 100.0).round() as i64)
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Fits in ten digits with two decimals.
    pub fn in_range(self) -> bool {
        self.0.unsigned_abs() <= MONEY_MAX_CENTS as u64
    }

    pub fn check_range(self) -> Result<Self> {
        if self.in_range() {
            Ok(self)
        } else {
            Err(Error::InvalidInput(format!(
                "amount {} exceeds 10 digits with 2 decimals",
                self
            )))
        }
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }
}

/// Renders as `$12.50`; negative amounts render as `$-3.00`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "${}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl FromStr for Money {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidInput(format!("invalid amount: {:?}", s));

        let trimmed = s.trim().trim_start_matches('$');
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if frac.len() > 2
            || !whole.chars().all(|c| c.is_ascii_digit())
            || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let frac: i64 = format!("{:0<2}", frac).parse().map_err(|_| invalid())?;

        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac))
            .ok_or_else(invalid)?;

        Money(if negative { -cents } else { cents }).check_range()
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

/// A row of `sales_sale`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sale {
    pub id: i64,
    pub date: NaiveDate,
    pub price_sold: Money,
    pub price_purchased: Money,
    pub product_name: String,
}

impl Sale {
    /// Derived at read time; never stored.
    pub fn profit(&self) -> Money {
        self.price_sold - self.price_purchased
    }
}

impl fmt::Display for Sale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.product_name, self.date)
    }
}

/// Input for inserting a sale.
#[derive(Debug, Clone)]
pub struct NewSale {
    pub date: NaiveDate,
    pub price_sold: Money,
    pub price_purchased: Money,
    pub product_name: String,
}

impl NewSale {
    /// Dated today (UTC).
    pub fn new(product_name: impl Into<String>, price_sold: Money, price_purchased: Money) -> Self {
        Self {
            date: Utc::now().date_naive(),
            price_sold,
            price_purchased,
            product_name: product_name.into(),
        }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let name = self.product_name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("product_name is required".to_string()));
        }
        if name.chars().count() > PRODUCT_NAME_MAX_LEN {
            return Err(Error::InvalidInput(format!(
                "product_name exceeds {} characters",
                PRODUCT_NAME_MAX_LEN
            )));
        }
        self.price_sold.check_range()?;
        self.price_purchased.check_range()?;
        Ok(())
    }
}
