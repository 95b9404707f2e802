//! Per-party update engine.

use std::time::{Duration, Instant};

use serio::{stream::IoStreamExt, IoSink, IoStream};
use tracing::debug;

use omf_core::{
    dpf::DpfKey,
    matrix::ShareMatrix,
    msgs::{MaskedDotInputs, MaskedLeafValue, MaskedScalarVector, RotationOffset},
    share::{vec_add, vec_dot, vec_scale, vec_sub, Share},
    triple::{DotTripleShare, ScalarTripleShare, SelectorShare},
    Query,
};

use crate::{exchange::exchange, Role};

/// Share matrices owned by one compute party, mutated in place per query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartyState {
    /// User-profile shares, m × k.
    pub users: ShareMatrix,
    /// Item-profile shares, n × k.
    pub items: ShareMatrix,
}

/// Wall-clock timings collected per query.
#[derive(Debug, Default, Clone)]
pub struct RunStats {
    /// Duration of the user-update phase (row fetch through the user write).
    pub user_update: Vec<Duration>,
    /// Duration of the item-update phase (complement through the broadcast).
    pub item_update: Vec<Duration>,
}

impl RunStats {
    /// Mean user-update duration.
    pub fn average_user_update(&self) -> Duration {
        average(&self.user_update)
    }

    /// Mean item-update duration.
    pub fn average_item_update(&self) -> Duration {
        average(&self.item_update)
    }
}

fn average(durations: &[Duration]) -> Duration {
    match durations.len() {
        0 => Duration::ZERO,
        n => durations.iter().sum::<Duration>() / n as u32,
    }
}

/// Errors produced by the update engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Channel failure on the dealer or peer link.
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),
    /// A query referenced a user row outside the loaded matrix.
    #[error("query references user row {index} but only {limit} rows are loaded")]
    UserOutOfRange {
        /// Offending row index.
        index: u32,
        /// Number of loaded rows.
        limit: usize,
    },
}

/// The per-party update engine.
///
/// Drives the fixed per-query sequence: oblivious item-row fetch, profile
/// dot product, two scalar-vector products, and the point-function broadcast
/// of the item-row increment. Material from the dealer channel is consumed
/// in exactly the order the dealer emits it; nothing detects a desync, the
/// session just computes garbage, so both builds must agree on the schedule.
pub struct UpdateEngine<D, P> {
    role: Role,
    dealer: D,
    peer: P,
}

impl<D, P> UpdateEngine<D, P>
where
    D: IoSink + IoStream + Send + Unpin,
    P: IoSink + IoStream + Send + Unpin,
{
    /// Binds an engine to its dealer and peer channels.
    pub fn new(role: Role, dealer: D, peer: P) -> Self {
        Self { role, dealer, peer }
    }

    /// Runs every query in order, mutating `state` in place.
    ///
    /// Any channel error aborts the session; callers must not persist the
    /// matrices after a failed run.
    pub async fn run(
        &mut self,
        state: &mut PartyState,
        queries: &[Query],
    ) -> Result<RunStats, EngineError> {
        let mut stats = RunStats::default();
        for (index, query) in queries.iter().enumerate() {
            debug!(
                role = %self.role,
                query = index,
                user = query.user_index,
                "starting query"
            );
            self.execute_query(state, query, &mut stats).await?;
            debug!(role = %self.role, query = index, "finished query");
        }
        Ok(stats)
    }

    async fn execute_query(
        &mut self,
        state: &mut PartyState,
        query: &Query,
        stats: &mut RunStats,
    ) -> Result<(), EngineError> {
        let user = query.user_index as usize;
        if user >= state.users.rows() {
            return Err(EngineError::UserOutOfRange {
                index: query.user_index,
                limit: state.users.rows(),
            });
        }
        // Both update phases read the user row as it was before this query.
        let user_row = state.users.row(user).to_vec();

        let started = Instant::now();
        let item_row = self.fetch_item_row(query.item_share, &state.items).await?;
        let dot = self.inner_product(&user_row, &item_row).await?;
        let scaled = self.scalar_vector_product(dot, &item_row).await?;
        state
            .users
            .set_row(user, vec_sub(&vec_add(&user_row, &item_row), &scaled));
        stats.user_update.push(started.elapsed());

        let started = Instant::now();
        // Reconstructs shares of 1 - d: the role indices sum to the public
        // unit. Valid only for two parties with indices {0, 1}.
        let complement = Share::new(self.role.index()) - dot;
        let update = self.scalar_vector_product(complement, &user_row).await?;
        self.broadcast_item_update(&update, &query.key, &mut state.items)
            .await?;
        stats.item_update.push(started.elapsed());
        Ok(())
    }

    /// Obliviously assembles this party's share of the item row `V[j]`.
    ///
    /// The dealer's one-hot selector sits at a random position; revealing
    /// only the blinded offset lets both sides rotate it onto the shared
    /// item index without learning it. One prepared inner product per
    /// feature column then extracts the row.
    async fn fetch_item_row(
        &mut self,
        item_share: Share,
        items: &ShareMatrix,
    ) -> Result<Vec<Share>, EngineError> {
        let rows = items.rows();
        let selector: SelectorShare = self.dealer.expect_next().await?;

        let offset = item_share - selector.offset;
        let peer: RotationOffset =
            exchange(&mut self.peer, self.role == Role::P0, RotationOffset(offset)).await?;
        let combined = offset.value().wrapping_add(peer.0.value());
        let rotation = combined.rem_euclid(rows as i64) as usize;

        let mut selector_vec = selector.shares;
        selector_vec.rotate_left((rows - rotation) % rows);

        let mut row = Vec::with_capacity(items.cols());
        for feature in 0..items.cols() {
            let column = items.column(feature);
            row.push(self.inner_product(&column, &selector_vec).await?);
        }
        Ok(row)
    }

    /// One Beaver multiplication: consumes a dot triple from the dealer and
    /// one masked-operand exchange with the peer.
    async fn inner_product(&mut self, x: &[Share], y: &[Share]) -> Result<Share, EngineError> {
        let triple: DotTripleShare = self.dealer.expect_next().await?;
        let masked = MaskedDotInputs {
            x: vec_add(x, &triple.x),
            y: vec_add(y, &triple.y),
        };
        let peer: MaskedDotInputs =
            exchange(&mut self.peer, self.role == Role::P0, masked).await?;

        Ok(vec_dot(x, &vec_add(y, &peer.y)) - vec_dot(&triple.y, &peer.x) + triple.product)
    }

    /// One Beaver-style scalar-vector multiplication.
    async fn scalar_vector_product(
        &mut self,
        scalar: Share,
        vector: &[Share],
    ) -> Result<Vec<Share>, EngineError> {
        let triple: ScalarTripleShare = self.dealer.expect_next().await?;
        let masked = MaskedScalarVector {
            scalar: scalar + triple.scalar,
            vector: vec_add(vector, &triple.vector),
        };
        let peer: MaskedScalarVector =
            exchange(&mut self.peer, self.role == Role::P1, masked).await?;

        Ok(vec_add(
            &vec_sub(
                &vec_scale(&vec_add(vector, &peer.vector), scalar),
                &vec_scale(&triple.vector, peer.scalar),
            ),
            &triple.product,
        ))
    }

    /// Adds the update vector into the secret item row of `items`.
    ///
    /// Per feature, both sides blind their update share with their own leaf
    /// correction word and reveal the sum; substituting it into a copy of
    /// the key turns the zero-valued point function into one whose
    /// evaluations sum to the update at the item index and to zero
    /// everywhere else.
    async fn broadcast_item_update(
        &mut self,
        update: &[Share],
        key: &DpfKey,
        items: &mut ShareMatrix,
    ) -> Result<(), EngineError> {
        let rows = items.rows() as u64;
        for (feature, &component) in update.iter().enumerate() {
            let masked = MaskedLeafValue(component - Share::new(key.leaf_cw));
            let peer: MaskedLeafValue =
                exchange(&mut self.peer, self.role == Role::P1, masked).await?;

            let mut patched = key.clone();
            patched.leaf_cw = (masked.0 + peer.0).value();

            let delta: Vec<Share> = patched
                .eval_full(rows)
                .into_iter()
                .map(Share::new)
                .collect();
            items.add_column(feature, &delta);
        }
        Ok(())
    }
}
