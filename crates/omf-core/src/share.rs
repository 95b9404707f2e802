//! Additive-share arithmetic over `Z/2^32` carried in signed 64-bit words.

use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// An additive share of a 32-bit ring element.
///
/// The share is carried in a signed 64-bit word so intermediate products and
/// sums have headroom; reduction to the 32-bit ring happens only at I/O
/// boundaries via [`Share::to_bits`] and [`Share::from_bits`]. All operators
/// wrap, so no arithmetic path can panic on overflow.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Share(i64);

impl Share {
    /// The additive identity.
    pub const ZERO: Share = Share(0);
    /// The share carrying the value one.
    pub const ONE: Share = Share(1);

    /// Wraps a 64-bit carrier value.
    pub fn new(value: i64) -> Self {
        Share(value)
    }

    /// Returns the 64-bit carrier value.
    pub fn value(self) -> i64 {
        self.0
    }

    /// Reduces to the ring and returns the 32-bit bit pattern used on disk.
    pub fn to_bits(self) -> u32 {
        self.0 as u32
    }

    /// Sign-extends a 32-bit bit pattern back into a carrier.
    pub fn from_bits(bits: u32) -> Self {
        Share(bits as i32 as i64)
    }
}

impl Add for Share {
    type Output = Share;

    fn add(self, rhs: Share) -> Share {
        Share(self.0.wrapping_add(rhs.0))
    }
}

impl Sub for Share {
    type Output = Share;

    fn sub(self, rhs: Share) -> Share {
        Share(self.0.wrapping_sub(rhs.0))
    }
}

impl Mul for Share {
    type Output = Share;

    fn mul(self, rhs: Share) -> Share {
        Share(self.0.wrapping_mul(rhs.0))
    }
}

impl Neg for Share {
    type Output = Share;

    fn neg(self) -> Share {
        Share(self.0.wrapping_neg())
    }
}

impl AddAssign for Share {
    fn add_assign(&mut self, rhs: Share) {
        *self = *self + rhs;
    }
}

impl SubAssign for Share {
    fn sub_assign(&mut self, rhs: Share) {
        *self = *self - rhs;
    }
}

/// Elementwise sum of two share vectors.
///
/// Length mismatch is a programmer error and panics.
pub fn vec_add(a: &[Share], b: &[Share]) -> Vec<Share> {
    assert_eq!(a.len(), b.len(), "vector length mismatch");
    a.iter().zip(b).map(|(&x, &y)| x + y).collect()
}

/// Elementwise difference of two share vectors.
pub fn vec_sub(a: &[Share], b: &[Share]) -> Vec<Share> {
    assert_eq!(a.len(), b.len(), "vector length mismatch");
    a.iter().zip(b).map(|(&x, &y)| x - y).collect()
}

/// Inner product of two share vectors.
pub fn vec_dot(a: &[Share], b: &[Share]) -> Share {
    assert_eq!(a.len(), b.len(), "vector length mismatch");
    a.iter()
        .zip(b)
        .fold(Share::ZERO, |acc, (&x, &y)| acc + x * y)
}

/// Scales every element of a share vector.
pub fn vec_scale(v: &[Share], scalar: Share) -> Vec<Share> {
    v.iter().map(|&x| x * scalar).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduction_keeps_low_bits() {
        let share = Share::new((1i64 << 40) + 7);
        assert_eq!(share.to_bits(), 7);
    }

    #[test]
    fn from_bits_sign_extends() {
        let share = Share::from_bits(u32::MAX);
        assert_eq!(share.value(), -1);
        assert_eq!(share.to_bits(), u32::MAX);
    }

    #[test]
    fn shares_reconstruct_mod_2_32() {
        let secret = Share::new(-123_456);
        let half = Share::new(987_654_321);
        let other = secret - half;
        assert_eq!((half + other).to_bits(), secret.to_bits());
    }

    #[test]
    fn operators_wrap() {
        let a = Share::new(i64::MAX);
        assert_eq!((a + Share::ONE).value(), i64::MIN);
        assert_eq!((a * Share::new(2)).value(), -2);
    }

    #[test]
    fn dot_product() {
        let a: Vec<Share> = [1, 2, 3].iter().map(|&v| Share::new(v)).collect();
        let b: Vec<Share> = [4, 5, 6].iter().map(|&v| Share::new(v)).collect();
        assert_eq!(vec_dot(&a, &b), Share::new(32));
    }

    #[test]
    #[should_panic(expected = "length mismatch")]
    fn mismatched_lengths_panic() {
        vec_add(&[Share::ZERO], &[Share::ZERO, Share::ONE]);
    }
}
