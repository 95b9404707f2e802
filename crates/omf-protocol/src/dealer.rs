//! Correlated-randomness dealer.

use rand::{rngs::StdRng, Rng, SeedableRng};
use serio::{IoSink, IoStream, SinkExt};
use tracing::debug;

use omf_core::triple::{dot_triple, row_selector, scalar_triple};

/// Errors produced by the dealer.
#[derive(Debug, thiserror::Error)]
pub enum DealerError {
    /// Channel failure on a party link.
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),
}

/// Streams per-query correlated material to the two compute parties.
///
/// Material goes out in the exact order the engine consumes it: the row
/// selector, one dot triple per feature column (item-domain length), the
/// profile dot triple, then the two scalar-vector triples. There are no
/// acknowledgements and no state carried across queries.
pub struct Dealer<Io, R = StdRng> {
    p0: Io,
    p1: Io,
    rng: R,
}

impl<Io> Dealer<Io>
where
    Io: IoSink + IoStream + Send + Unpin,
{
    /// Creates a dealer over the two party channels with an OS-seeded rng.
    pub fn new(p0: Io, p1: Io) -> Self {
        Self::with_rng(p0, p1, StdRng::from_entropy())
    }
}

impl<Io, R> Dealer<Io, R>
where
    Io: IoSink + IoStream + Send + Unpin,
    R: Rng,
{
    /// Creates a dealer drawing from the provided rng.
    pub fn with_rng(p0: Io, p1: Io, rng: R) -> Self {
        Self { p0, p1, rng }
    }

    /// Serves material for `queries` queries, then returns.
    pub async fn run(
        &mut self,
        items: usize,
        features: usize,
        queries: usize,
    ) -> Result<(), DealerError> {
        for query in 0..queries {
            debug!(query, "dealing query material");
            self.deal_query(items, features).await?;
        }
        Ok(())
    }

    async fn deal_query(&mut self, items: usize, features: usize) -> Result<(), DealerError> {
        let (selector0, selector1) = row_selector(items, &mut self.rng);
        self.p0.send(selector0).await?;
        self.p1.send(selector1).await?;

        for _ in 0..features {
            self.send_dot_triple(items).await?;
        }
        self.send_dot_triple(features).await?;
        self.send_scalar_triple(features).await?;
        self.send_scalar_triple(features).await?;
        Ok(())
    }

    async fn send_dot_triple(&mut self, len: usize) -> Result<(), DealerError> {
        let (t0, t1) = dot_triple(len, &mut self.rng);
        self.p0.send(t0).await?;
        self.p1.send(t1).await?;
        Ok(())
    }

    async fn send_scalar_triple(&mut self, len: usize) -> Result<(), DealerError> {
        let (t0, t1) = scalar_triple(len, &mut self.rng);
        self.p0.send(t0).await?;
        self.p1.send(t1).await?;
        Ok(())
    }
}
