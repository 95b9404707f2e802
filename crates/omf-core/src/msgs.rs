//! Messages exchanged on the peer link, one type per protocol round.

use serde::{Deserialize, Serialize};

use crate::share::Share;

/// Blinded rotation offset revealed during the oblivious row fetch.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RotationOffset(pub Share);

/// Beaver-masked operands of an inner product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskedDotInputs {
    /// Own left operand plus the triple's left mask.
    pub x: Vec<Share>,
    /// Own right operand plus the triple's right mask.
    pub y: Vec<Share>,
}

/// Beaver-masked operands of a scalar-vector product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskedScalarVector {
    /// Own scalar plus the triple's scalar mask.
    pub scalar: Share,
    /// Own vector plus the triple's vector mask.
    pub vector: Vec<Share>,
}

/// Item-update component blinded with the sender's leaf correction word.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MaskedLeafValue(pub Share);
