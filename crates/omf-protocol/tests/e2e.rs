//! Three-party end-to-end runs over in-memory channels, checked bit-for-bit
//! against the cleartext update rule.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serio::channel::duplex;

use omf_core::{dpf::DpfKey, matrix::ShareMatrix, share::Share, sim, Query};
use omf_protocol::{Dealer, PartyState, Role, UpdateEngine};

fn to_matrix(values: &[Vec<i64>]) -> ShareMatrix {
    ShareMatrix::from_rows(
        values
            .iter()
            .map(|row| row.iter().map(|&v| Share::new(v)).collect())
            .collect(),
    )
}

fn split_matrix<R: Rng>(values: &[Vec<i64>], rng: &mut R) -> (ShareMatrix, ShareMatrix) {
    let mut rows0 = Vec::with_capacity(values.len());
    let mut rows1 = Vec::with_capacity(values.len());
    for row in values {
        let mut half0 = Vec::with_capacity(row.len());
        let mut half1 = Vec::with_capacity(row.len());
        for &value in row {
            let half = Share::new(rng.gen::<i8>() as i64);
            half0.push(half);
            half1.push(Share::new(value) - half);
        }
        rows0.push(half0);
        rows1.push(half1);
    }
    (ShareMatrix::from_rows(rows0), ShareMatrix::from_rows(rows1))
}

fn split_queries<R: Rng>(
    queries: &[(u32, u32)],
    items: u64,
    rng: &mut R,
) -> (Vec<Query>, Vec<Query>) {
    let mut q0 = Vec::with_capacity(queries.len());
    let mut q1 = Vec::with_capacity(queries.len());
    for &(user, item) in queries {
        let half = Share::new(rng.gen::<i32>() as i64);
        let (k0, k1) = DpfKey::generate(item as u64, 0, items, rng);
        q0.push(Query {
            user_index: user,
            item_share: half,
            key: k0,
        });
        q1.push(Query {
            user_index: user,
            item_share: Share::new(item as i64) - half,
            key: k1,
        });
    }
    (q0, q1)
}

fn reduce(matrix: &ShareMatrix) -> Vec<Vec<u32>> {
    matrix
        .iter_rows()
        .map(|row| row.iter().map(|share| share.to_bits()).collect())
        .collect()
}

fn reconstruct(a: &ShareMatrix, b: &ShareMatrix) -> Vec<Vec<u32>> {
    a.iter_rows()
        .zip(b.iter_rows())
        .map(|(ra, rb)| {
            ra.iter()
                .zip(rb)
                .map(|(&sa, &sb)| (sa + sb).to_bits())
                .collect()
        })
        .collect()
}

/// Runs dealer and both engines concurrently over duplex channels, returning
/// the reconstructed (U, V) bit patterns.
async fn run_mpc(
    users: &[Vec<i64>],
    items: &[Vec<i64>],
    queries: &[(u32, u32)],
    seed: u64,
) -> (Vec<Vec<u32>>, Vec<Vec<u32>>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let (users0, users1) = split_matrix(users, &mut rng);
    let (items0, items1) = split_matrix(items, &mut rng);
    let (queries0, queries1) = split_queries(queries, items.len() as u64, &mut rng);

    let (dealer_io0, engine0_dealer) = duplex(32);
    let (dealer_io1, engine1_dealer) = duplex(32);
    let (peer0, peer1) = duplex(32);

    let mut dealer = Dealer::with_rng(
        dealer_io0,
        dealer_io1,
        ChaCha8Rng::seed_from_u64(seed.wrapping_add(1)),
    );
    let mut engine0 = UpdateEngine::new(Role::P0, engine0_dealer, peer0);
    let mut engine1 = UpdateEngine::new(Role::P1, engine1_dealer, peer1);

    let mut state0 = PartyState {
        users: users0,
        items: items0,
    };
    let mut state1 = PartyState {
        users: users1,
        items: items1,
    };

    let features = items.first().map(Vec::len).unwrap_or_default();
    let (dealt, run0, run1) = tokio::join!(
        dealer.run(items.len(), features, queries.len()),
        engine0.run(&mut state0, &queries0),
        engine1.run(&mut state1, &queries1),
    );
    dealt.unwrap();
    run0.unwrap();
    run1.unwrap();

    (
        reconstruct(&state0.users, &state1.users),
        reconstruct(&state0.items, &state1.items),
    )
}

/// Replays the queries in the clear and reduces to bit patterns.
fn run_cleartext(
    users: &[Vec<i64>],
    items: &[Vec<i64>],
    queries: &[(u32, u32)],
) -> (Vec<Vec<u32>>, Vec<Vec<u32>>) {
    let mut u = to_matrix(users);
    let mut v = to_matrix(items);
    sim::apply_queries(&mut u, &mut v, queries);
    (reduce(&u), reduce(&v))
}

fn random_scene<R: Rng>(
    users: usize,
    items: usize,
    features: usize,
    query_count: usize,
    rng: &mut R,
) -> (Vec<Vec<i64>>, Vec<Vec<i64>>, Vec<(u32, u32)>) {
    let u = (0..users)
        .map(|_| (0..features).map(|_| rng.gen_range(-8..8)).collect())
        .collect();
    let v = (0..items)
        .map(|_| (0..features).map(|_| rng.gen_range(-8..8)).collect())
        .collect();
    let queries = (0..query_count)
        .map(|_| {
            (
                rng.gen_range(0..users) as u32,
                rng.gen_range(0..items) as u32,
            )
        })
        .collect();
    (u, v, queries)
}

#[tokio::test]
async fn copies_user_row_into_zero_item_row() {
    let users = vec![vec![5]];
    let items = vec![vec![0], vec![0]];
    let queries = [(0, 1)];

    let (u, v) = run_mpc(&users, &items, &queries, 100).await;
    assert_eq!(u, vec![vec![5]]);
    assert_eq!(v, vec![vec![0], vec![5]]);
    assert_eq!((u, v), run_cleartext(&users, &items, &queries));
}

#[tokio::test]
async fn unit_dot_product_changes_nothing() {
    let users = vec![vec![1, 2], vec![3, 4]];
    let items = vec![vec![1, 0], vec![0, 1]];
    let queries = [(0, 0)];

    let (u, v) = run_mpc(&users, &items, &queries, 101).await;
    assert_eq!(u, vec![vec![1, 2], vec![3, 4]]);
    assert_eq!(v, vec![vec![1, 0], vec![0, 1]]);
    assert_eq!((u, v), run_cleartext(&users, &items, &queries));
}

#[tokio::test]
async fn sequential_queries_see_prior_writes() {
    let users = vec![vec![2, 3]];
    let items = vec![vec![1, 0], vec![0, 1], vec![0, 0], vec![0, 0]];
    let queries = [(0, 2), (0, 3)];

    let result = run_mpc(&users, &items, &queries, 102).await;
    assert_eq!(result, run_cleartext(&users, &items, &queries));
}

#[tokio::test]
async fn random_runs_match_the_cleartext_rule() {
    let mut rng = ChaCha8Rng::seed_from_u64(103);
    let (users, items, queries) = random_scene(3, 3, 3, 5, &mut rng);

    let result = run_mpc(&users, &items, &queries, 104).await;
    assert_eq!(result, run_cleartext(&users, &items, &queries));
}

#[tokio::test]
async fn non_power_of_two_item_domain() {
    // 50 items round up to a depth-6 tree; leaves past the domain are never
    // consulted.
    let mut rng = ChaCha8Rng::seed_from_u64(105);
    let (users, items, mut queries) = random_scene(2, 50, 2, 3, &mut rng);
    queries[0].1 = 49;

    let result = run_mpc(&users, &items, &queries, 106).await;
    assert_eq!(result, run_cleartext(&users, &items, &queries));
}

#[tokio::test]
async fn hundred_queries_stay_in_sync() {
    let mut rng = ChaCha8Rng::seed_from_u64(107);
    let (users, items, queries) = random_scene(10, 50, 3, 100, &mut rng);

    let result = run_mpc(&users, &items, &queries, 108).await;
    assert_eq!(result, run_cleartext(&users, &items, &queries));
}
