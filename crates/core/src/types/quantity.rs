//! Cart line quantity, clamped to the range the storefront sells in.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Quantity of a single cart line.
///
/// Always within `Quantity::MIN..=Quantity::MAX`. Values outside the range
/// are clamped on construction and on deserialization, so a hand-edited
/// storage file can't smuggle in a quantity of 50.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Quantity(u32);

/// Outcome of applying a delta or an absolute request to a quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    /// The line keeps existing with this quantity.
    Set(Quantity),
    /// The request reached zero (or below); the line should be removed.
    Remove,
}

impl Quantity {
    /// Smallest quantity a line can hold.
    pub const MIN: u32 = 1;
    /// Largest quantity a line can hold.
    pub const MAX: u32 = 10;

    /// A quantity of one.
    pub const ONE: Self = Self(Self::MIN);

    /// Clamp any integer into `MIN..=MAX`.
    #[must_use]
    pub fn clamped(value: i64) -> Self {
        let bounded = value.clamp(i64::from(Self::MIN), i64::from(Self::MAX));
        // Bounded to 1..=10 above, the conversion can't fail.
        Self(u32::try_from(bounded).unwrap_or(Self::MIN))
    }

    /// The raw value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Apply a signed delta. Results at or below zero mean "remove".
    #[must_use]
    pub fn apply_delta(self, delta: i64) -> QuantityChange {
        Self::request(i64::from(self.0).saturating_add(delta))
    }

    /// Interpret an absolute requested quantity. Zero or below means "remove".
    #[must_use]
    pub fn request(requested: i64) -> QuantityChange {
        if requested <= 0 {
            QuantityChange::Remove
        } else {
            QuantityChange::Set(Self::clamped(requested))
        }
    }

    /// Add to this quantity, saturating at `MAX`.
    #[must_use]
    pub fn saturating_add(self, other: Self) -> Self {
        Self::clamped(i64::from(self.0) + i64::from(other.0))
    }

    /// Whether another unit can be added.
    #[must_use]
    pub const fn is_max(self) -> bool {
        self.0 >= Self::MAX
    }

    /// Whether a unit can be taken away without removing the line.
    #[must_use]
    pub const fn is_min(self) -> bool {
        self.0 <= Self::MIN
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        Ok(Self::clamped(raw))
    }
}
