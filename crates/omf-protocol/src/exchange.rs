//! Role-ordered symmetric exchange.

use std::io;

use serio::{stream::IoStreamExt, Deserialize, IoSink, IoStream, Serialize, SinkExt};

/// Sends `value` to the peer and receives the peer's counterpart.
///
/// Exactly one side of every exchange site must pass `send_first = true` and
/// the other `false`; both sending first deadlocks over TCP. Call sites fix
/// the convention by role.
pub(crate) async fn exchange<T, Io>(io: &mut Io, send_first: bool, value: T) -> io::Result<T>
where
    T: Serialize + Deserialize,
    Io: IoSink + IoStream + Unpin,
{
    if send_first {
        io.send(value).await?;
        io.expect_next().await
    } else {
        let peer = io.expect_next().await?;
        io.send(value).await?;
        Ok(peer)
    }
}

#[cfg(test)]
mod tests {
    use serio::channel::duplex;

    use super::*;

    #[tokio::test]
    async fn both_orders_deliver() {
        let (mut left, mut right) = duplex(1);
        let (a, b) = tokio::join!(
            exchange::<u64, _>(&mut left, true, 17),
            exchange::<u64, _>(&mut right, false, 42)
        );
        assert_eq!(a.unwrap(), 42);
        assert_eq!(b.unwrap(), 17);
    }
}
