//! Correlated randomness consumed by the online protocol.
//!
//! Pure generators in the ideal-functionality style: each samples one unit of
//! material and returns the two party halves. The dealer task streams these
//! over the party channels; the structs themselves are the wire messages.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::share::{vec_add, vec_dot, vec_scale, vec_sub, Share};

/// One party's half of a masked one-hot row selector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorShare {
    /// Share of the rotation offset hiding the selector position.
    pub offset: Share,
    /// Additive share of the one-hot vector.
    pub shares: Vec<Share>,
}

/// One party's half of a Beaver triple for an inner product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DotTripleShare {
    /// Random mask share for the left operand.
    pub x: Vec<Share>,
    /// Random mask share for the right operand.
    pub y: Vec<Share>,
    /// Share of the cross terms of the two mask pairs' inner product.
    pub product: Share,
}

/// One party's half of a Beaver-style triple for a scalar-vector product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalarTripleShare {
    /// Random mask share for the scalar operand.
    pub scalar: Share,
    /// Random mask share for the vector operand.
    pub vector: Vec<Share>,
    /// Share of the cross terms of the two mask pairs' product.
    pub product: Vec<Share>,
}

// Draws stay in the i8 range so every intermediate product sits well inside
// the 64-bit carrier.
fn small<R: Rng + ?Sized>(rng: &mut R) -> Share {
    Share::new(rng.gen::<i8>() as i64)
}

fn small_vec<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Vec<Share> {
    (0..len).map(|_| small(rng)).collect()
}

/// Samples a selector pair for an item domain of `items` rows.
///
/// P0 receives the mask and one additive half of the one-hot vector
/// `e_r`; P1 receives `r − mask` and the other half. The offsets reconstruct
/// the position `r` the one-hot vector already sits at.
pub fn row_selector<R: Rng + ?Sized>(items: usize, rng: &mut R) -> (SelectorShare, SelectorShare) {
    let position = rng.gen::<u32>() as usize % items;
    let mut one_hot = vec![Share::ZERO; items];
    one_hot[position] = Share::ONE;

    let half0 = small_vec(items, rng);
    let half1 = vec_sub(&one_hot, &half0);
    let mask = small(rng);

    (
        SelectorShare {
            offset: mask,
            shares: half0,
        },
        SelectorShare {
            offset: Share::new(position as i64) - mask,
            shares: half1,
        },
    )
}

/// Samples a Beaver triple pair for inner products of length `len`.
pub fn dot_triple<R: Rng + ?Sized>(len: usize, rng: &mut R) -> (DotTripleShare, DotTripleShare) {
    let x0 = small_vec(len, rng);
    let y0 = small_vec(len, rng);
    let x1 = small_vec(len, rng);
    let y1 = small_vec(len, rng);
    let blind = small(rng);

    let product0 = vec_dot(&x0, &y1) + blind;
    let product1 = vec_dot(&x1, &y0) - blind;

    (
        DotTripleShare {
            x: x0,
            y: y0,
            product: product0,
        },
        DotTripleShare {
            x: x1,
            y: y1,
            product: product1,
        },
    )
}

/// Samples a triple pair for scalar-vector products of length `len`.
pub fn scalar_triple<R: Rng + ?Sized>(
    len: usize,
    rng: &mut R,
) -> (ScalarTripleShare, ScalarTripleShare) {
    let scalar0 = small(rng);
    let scalar1 = small(rng);
    let vector0 = small_vec(len, rng);
    let vector1 = small_vec(len, rng);
    let blind = small_vec(len, rng);

    let product0 = vec_add(&vec_scale(&vector0, scalar1), &blind);
    let product1 = vec_sub(&vec_scale(&vector1, scalar0), &blind);

    (
        ScalarTripleShare {
            scalar: scalar0,
            vector: vector0,
            product: product0,
        },
        ScalarTripleShare {
            scalar: scalar1,
            vector: vector1,
            product: product1,
        },
    )
}
