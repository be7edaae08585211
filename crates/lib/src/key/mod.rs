//! Fractional order keys.
//!
//! An [`OrderKey`] is a string over the 62-character alphabet `0-9A-Za-z`,
//! read as the digits of a base-62 fraction in the open interval (0, 1).
//! Because the alphabet is in ASCII order and trailing zero digits are never
//! stored, comparing two keys as plain strings gives the same answer as
//! comparing the fractions they encode. Any store that can sort strings can
//! therefore sort records by key without knowing anything about this module.
//!
//! A [`KeySpace`] fixes the precision budget: the maximum number of digits a
//! key may carry. Inside that budget a new key can be synthesised strictly
//! between any two neighbours until their distance shrinks to a single unit
//! of the last digit, at which point [`KeySpace::midpoint`] reports
//! [`KeyError::NoMidpoint`] and the domain has to be rebalanced.
//!
//! # Examples
//!
//! ```
//! use orderable::key::KeySpace;
//!
//! let space = KeySpace::new(4).unwrap();
//! let first = space.midpoint(None, None).unwrap();
//! let second = space.midpoint(Some(&first), None).unwrap();
//! let between = space.midpoint(Some(&first), Some(&second)).unwrap();
//!
//! assert!(first < between);
//! assert!(between < second);
//! ```

pub mod errors;

pub use errors::KeyError;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Digits of a key, in ascending order.
pub const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Numeric base of a key digit.
const BASE: u128 = 62;

/// Largest precision whose full range still fits in a `u128`.
pub const MAX_KEY_LENGTH: usize = 21;

/// Precision used when a collection does not configure one.
pub const DEFAULT_KEY_LENGTH: usize = 12;

/// A single item's position inside an ordering domain.
///
/// Ordering is plain string ordering. Construct keys through
/// [`KeySpace::parse`] or the allocation methods on [`KeySpace`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderKey(String);

impl OrderKey {
    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of digits in the key.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Keys are never empty; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<str> for OrderKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &self.0)
    }
}

impl From<OrderKey> for String {
    fn from(key: OrderKey) -> Self {
        key.0
    }
}

fn digit_value(byte: u8) -> Option<u128> {
    match byte {
        b'0'..=b'9' => Some(u128::from(byte - b'0')),
        b'A'..=b'Z' => Some(u128::from(byte - b'A') + 10),
        b'a'..=b'z' => Some(u128::from(byte - b'a') + 36),
        _ => None,
    }
}

fn check_format(key: &str) -> Result<()> {
    let invalid = |reason: String| -> crate::Error {
        KeyError::InvalidKey {
            key: key.to_string(),
            reason,
        }
        .into()
    };

    if key.is_empty() {
        return Err(invalid("empty key".to_string()));
    }
    if let Some(bad) = key.bytes().find(|b| digit_value(*b).is_none()) {
        return Err(invalid(format!("unexpected character {:?}", bad as char)));
    }
    if key.ends_with('0') {
        return Err(invalid("trailing zero digit".to_string()));
    }
    Ok(())
}

/// Precision budget for order keys.
///
/// Internally a key of at most `length` digits is handled as an integer
/// number of units in `(0, 62^length)`; this is what makes midpoints exact and
/// deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeySpace {
    length: usize,
}

impl Default for KeySpace {
    fn default() -> Self {
        Self {
            length: DEFAULT_KEY_LENGTH,
        }
    }
}

impl KeySpace {
    /// Creates a key space allowing keys of up to `length` digits.
    pub fn new(length: usize) -> Result<Self> {
        if length == 0 || length > MAX_KEY_LENGTH {
            return Err(KeyError::InvalidLength {
                length,
                max: MAX_KEY_LENGTH,
            }
            .into());
        }
        Ok(Self { length })
    }

    /// Maximum number of digits per key.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Largest number of items [`spread`](Self::spread) can place while
    /// keeping a free slot next to every key.
    pub fn capacity(&self) -> u128 {
        self.scale() / 2 - 1
    }

    fn scale(&self) -> u128 {
        BASE.pow(self.length as u32)
    }

    /// One unit of the leading digit.
    fn step(&self) -> u128 {
        BASE.pow(self.length as u32 - 1)
    }

    /// Validates a stored key against this key space.
    pub fn parse(&self, key: &str) -> Result<OrderKey> {
        check_format(key)?;
        if key.len() > self.length {
            return Err(KeyError::ExceedsPrecision {
                key: key.to_string(),
                length: self.length,
            }
            .into());
        }
        Ok(OrderKey(key.to_string()))
    }

    /// Reads a key as stored on a record.
    ///
    /// Unlike [`parse`](Self::parse) this accepts keys longer than the
    /// precision budget, which still sort correctly but leave no room for
    /// neighbours. Malformed strings yield `None`.
    pub fn read_stored(&self, key: &str) -> Option<OrderKey> {
        check_format(key).ok().map(|_| OrderKey(key.to_string()))
    }

    fn units(&self, key: &OrderKey) -> Result<u128> {
        if key.len() > self.length {
            return Err(KeyError::ExceedsPrecision {
                key: key.0.clone(),
                length: self.length,
            }
            .into());
        }
        let mut value = 0u128;
        for byte in key.0.bytes() {
            let digit = digit_value(byte).ok_or_else(|| KeyError::InvalidKey {
                key: key.0.clone(),
                reason: format!("unexpected character {:?}", byte as char),
            })?;
            value = value * BASE + digit;
        }
        Ok(value * BASE.pow((self.length - key.len()) as u32))
    }

    fn key_at(&self, units: u128) -> OrderKey {
        debug_assert!(units > 0 && units < self.scale());
        let mut digits = vec![b'0'; self.length];
        let mut rest = units;
        for slot in digits.iter_mut().rev() {
            *slot = ALPHABET[(rest % BASE) as usize];
            rest /= BASE;
        }
        while digits.last() == Some(&b'0') {
            digits.pop();
        }
        OrderKey(digits.into_iter().map(char::from).collect())
    }

    /// Exclusive bounds of the interval between two optional neighbours.
    fn bounds(&self, prev: Option<&OrderKey>, next: Option<&OrderKey>) -> Result<(u128, u128)> {
        let lo = prev.map(|k| self.units(k)).transpose()?.unwrap_or(0);
        let hi = next.map(|k| self.units(k)).transpose()?.unwrap_or(self.scale());
        if lo >= hi {
            return Err(KeyError::OutOfOrder {
                prev: prev.map(|k| k.0.clone()).unwrap_or_default(),
                next: next.map(|k| k.0.clone()).unwrap_or_default(),
            }
            .into());
        }
        Ok((lo, hi))
    }

    fn no_midpoint(&self, prev: Option<&OrderKey>, next: Option<&OrderKey>) -> crate::Error {
        KeyError::NoMidpoint {
            prev: prev.map(|k| k.0.clone()),
            next: next.map(|k| k.0.clone()),
            length: self.length,
        }
        .into()
    }

    fn between(lo: u128, hi: u128) -> Option<u128> {
        (hi - lo >= 2).then(|| lo + (hi - lo) / 2)
    }

    /// Synthesises a key strictly between two optional neighbours.
    ///
    /// - both absent: the centre of the key space (`"V"`)
    /// - `next` absent: one leading-digit step after `prev`, or halfway to the
    ///   end of the space when that step does not fit
    /// - `prev` absent: one leading-digit step before `next`, or halfway to
    ///   the start of the space
    /// - both present: the exact midpoint
    ///
    /// Fails with [`KeyError::NoMidpoint`] when nothing representable lies in
    /// between.
    pub fn midpoint(&self, prev: Option<&OrderKey>, next: Option<&OrderKey>) -> Result<OrderKey> {
        let (lo, hi) = self.bounds(prev, next)?;
        let step = self.step();
        let units = match (prev, next) {
            (None, None) => Some(self.scale() / 2),
            (Some(_), None) if lo + step < hi => Some(lo + step),
            (None, Some(_)) if hi > step => Some(hi - step),
            _ => Self::between(lo, hi),
        };
        units
            .map(|u| self.key_at(u))
            .ok_or_else(|| self.no_midpoint(prev, next))
    }

    /// Synthesises `count` strictly increasing keys between two optional
    /// neighbours.
    ///
    /// At an open end the keys advance by whole leading-digit steps while they
    /// fit; otherwise they are spaced evenly across the interval.
    pub fn keys_between(
        &self,
        prev: Option<&OrderKey>,
        next: Option<&OrderKey>,
        count: usize,
    ) -> Result<Vec<OrderKey>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let (lo, hi) = self.bounds(prev, next)?;
        let n = count as u128;
        let step = self.step();
        let span = step.checked_mul(n);

        let stepped: Option<Vec<u128>> = match (prev, next, span) {
            (Some(_), None, Some(span)) if lo.checked_add(span).is_some_and(|end| end < hi) => {
                Some((1..=n).map(|i| lo + step * i).collect())
            }
            (None, Some(_), Some(span)) if hi > span => {
                Some((0..n).map(|i| hi - step * (n - i)).collect())
            }
            _ => None,
        };
        if let Some(units) = stepped {
            return Ok(units.into_iter().map(|u| self.key_at(u)).collect());
        }

        let gap = hi - lo;
        if gap < n + 1 {
            return Err(self.no_midpoint(prev, next));
        }
        let parts = n + 1;
        Ok((1..=n)
            .map(|i| lo + (gap / parts) * i + (gap % parts) * i / parts)
            .map(|u| self.key_at(u))
            .collect())
    }

    /// Spreads `count` keys evenly over the whole key space.
    ///
    /// Every adjacent pair, and each end of the sequence, keeps at least one
    /// free slot, so a midpoint exists anywhere in the result.
    pub fn spread(&self, count: usize) -> Result<Vec<OrderKey>> {
        if count as u128 > self.capacity() {
            return Err(KeyError::CapacityExceeded {
                items: count,
                capacity: self.capacity(),
            }
            .into());
        }
        self.keys_between(None, None, count)
    }
}
