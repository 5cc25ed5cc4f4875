//! Value Objects for the storefront

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// URL-safe slug derived from a display name
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slug(String);

impl Slug {
    pub fn new(value: impl AsRef<str>) -> Result<Self, SlugError> {
        let mut slug = String::new();
        for c in value.as_ref().trim().chars().flat_map(char::to_lowercase) {
            if c.is_alphanumeric() {
                slug.push(c);
            } else if !slug.is_empty() && !slug.ends_with('-') {
                slug.push('-');
            }
        }
        while slug.ends_with('-') { slug.pop(); }
        if slug.is_empty() { return Err(SlugError::Empty); }
        if slug.len() > 120 { return Err(SlugError::TooLong); }
        Ok(Self(slug))
    }
    pub fn as_str(&self) -> &str { &self.0 }
    pub fn into_inner(self) -> String { self.0 }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone)] pub enum SlugError { Empty, TooLong }
impl std::error::Error for SlugError {}
impl fmt::Display for SlugError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Empty => write!(f, "slug empty"), Self::TooLong => write!(f, "slug too long") }
    }
}

/// Phone number reduced to the digits WhatsApp expects in `wa.me` links
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn parse(value: &str) -> Result<Self, PhoneError> {
        let trimmed = value.trim();
        let mut digits = String::with_capacity(trimmed.len());
        for (i, c) in trimmed.chars().enumerate() {
            match c {
                '0'..='9' => digits.push(c),
                '+' if i == 0 => {}
                ' ' | '-' | '(' | ')' | '.' => {}
                _ => return Err(PhoneError::InvalidCharacter(c)),
            }
        }
        if !(7..=15).contains(&digits.len()) { return Err(PhoneError::BadLength(digits.len())); }
        Ok(Self(digits))
    }
    pub fn digits(&self) -> &str { &self.0 }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum PhoneError { InvalidCharacter(char), BadLength(usize) }
impl std::error::Error for PhoneError {}
impl fmt::Display for PhoneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCharacter(c) => write!(f, "invalid character '{c}' in phone number"),
            Self::BadLength(n) => write!(f, "phone number must have 7-15 digits, got {n}"),
        }
    }
}

/// An amount in the shop currency, as shown to customers ("KES 1234.50").
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Money<'a> { amount: Decimal, currency: &'a str }

impl<'a> Money<'a> {
    pub fn new(amount: Decimal, currency: &'a str) -> Self { Self { amount, currency } }

    /// Prices and totals are stored in cents and must stay below 10^12.
    pub fn check(amount: Decimal) -> Result<(), MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative);
        }
        if amount.normalize().scale() > MONEY_SCALE {
            return Err(MoneyError::TooPrecise);
        }
        if amount >= Decimal::new(MONEY_LIMIT, 0) {
            return Err(MoneyError::TooLarge);
        }
        Ok(())
    }
}

const MONEY_SCALE: u32 = 2;
const MONEY_LIMIT: i64 = 1_000_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)] pub enum MoneyError { Negative, TooPrecise, TooLarge }
impl std::error::Error for MoneyError {}
impl fmt::Display for MoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Negative => write!(f, "must not be negative"),
            Self::TooPrecise => write!(f, "must have at most {} decimal places", MONEY_SCALE),
            Self::TooLarge => write!(f, "must be less than {}", MONEY_LIMIT),
        }
    }
}

impl fmt::Display for Money<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:.2}", self.currency, self.amount.round_dp(2))
    }
}

/// Units of stock. Never negative; taking more than is there fails instead of wrapping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: u32) -> Self { Self(value) }
    pub fn value(&self) -> u32 { self.0 }
    pub fn add(&self, other: u32) -> Self { Self(self.0.saturating_add(other)) }
    pub fn subtract(&self, other: u32) -> Option<Self> {
        if other > self.0 { None } else { Some(Self(self.0 - other)) }
    }
}
