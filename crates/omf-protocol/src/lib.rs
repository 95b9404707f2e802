//! Online three-party protocol: the correlated-randomness dealer and the
//! per-party update engine.
//!
//! Each process runs exactly one task; the only suspension points are channel
//! operations. Channels are serio sinks/streams, so the same code runs over
//! framed TCP sockets in deployment and in-memory duplexes in tests.

#![deny(
    unsafe_code,
    missing_docs,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all
)]

use std::fmt;

mod dealer;
mod exchange;
mod party;

pub use dealer::{Dealer, DealerError};
pub use party::{EngineError, PartyState, RunStats, UpdateEngine};

/// Compute-party role.
///
/// The role fixes which side writes first at every symmetric exchange site
/// and which side contributes the public unit in the `1 - d` reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// First party: dials the peer, contributes 0 to public constants.
    P0,
    /// Second party: accepts the peer link, contributes 1 to public
    /// constants.
    P1,
}

impl Role {
    /// Numeric index. Summing the two indices yields the public unit, which
    /// only holds for a two-party setup with indices {0, 1}.
    pub fn index(self) -> i64 {
        match self {
            Role::P0 => 0,
            Role::P1 => 1,
        }
    }

    /// Parses the index form used on the command line.
    pub fn from_index(index: u8) -> Option<Role> {
        match index {
            0 => Some(Role::P0),
            1 => Some(Role::P1),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::P0 => write!(f, "P0"),
            Role::P1 => write!(f, "P1"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_indices_sum_to_one() {
        assert_eq!(Role::P0.index() + Role::P1.index(), 1);
    }

    #[test]
    fn role_parsing() {
        assert_eq!(Role::from_index(0), Some(Role::P0));
        assert_eq!(Role::from_index(1), Some(Role::P1));
        assert_eq!(Role::from_index(2), None);
    }
}
