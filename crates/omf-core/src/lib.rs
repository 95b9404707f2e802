//! Core primitives for three-party secret-shared matrix-factorization
//! updates.
//!
//! Two compute parties hold additive shares of user and item profile
//! matrices and apply one online Funk-SVD step per query without learning
//! the item index or either matrix; a third party deals the correlated
//! randomness the online phase consumes. This crate carries everything that
//! does no I/O: share arithmetic, the distributed point function, the
//! correlated-randomness generators, the wire-message types, and the
//! cleartext reference rule. The online protocol itself lives in
//! `omf-protocol`.

#![deny(
    unsafe_code,
    missing_docs,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all
)]

pub mod dpf;
pub mod matrix;
pub mod msgs;
pub mod prg;
pub mod share;
pub mod sim;
pub mod triple;

pub use matrix::ShareMatrix;
pub use share::Share;

/// One update query as held by a single compute party.
#[derive(Debug, Clone)]
pub struct Query {
    /// Public user row index, identical on both parties.
    pub user_index: u32,
    /// Additive share of the item row index.
    pub item_share: Share,
    /// Key share encoding the item's one-hot row, generated with a zero
    /// point value.
    pub key: dpf::DpfKey,
}
