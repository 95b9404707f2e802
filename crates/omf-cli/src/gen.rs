//! Random share-matrix and query generation.

use rand::Rng;

use omf_core::{dpf::DpfKey, matrix::ShareMatrix, share::Share, Query};

use crate::config::Dimensions;

/// Everything one session needs on disk, split per party.
#[derive(Debug)]
pub struct GeneratedRun {
    /// User-profile share matrices for P0 and P1.
    pub users: (ShareMatrix, ShareMatrix),
    /// Item-profile share matrices for P0 and P1.
    pub items: (ShareMatrix, ShareMatrix),
    /// Query lists for P0 and P1.
    pub queries: (Vec<Query>, Vec<Query>),
    /// The cleartext (user, item) pairs behind the query lists.
    pub cleartext: Vec<(u32, u32)>,
}

/// Samples fresh profile matrices and a query sequence.
///
/// Profile values stay in the i8 range; item-index shares use the full
/// 32-bit range. DPF keys are generated with a zero point value, which the
/// online protocol patches per feature.
pub fn generate_run<R: Rng>(dims: &Dimensions, rng: &mut R) -> GeneratedRun {
    let users = split_random_matrix(dims.users, dims.features, rng);
    let items = split_random_matrix(dims.items, dims.features, rng);

    let mut queries0 = Vec::with_capacity(dims.queries);
    let mut queries1 = Vec::with_capacity(dims.queries);
    let mut cleartext = Vec::with_capacity(dims.queries);
    for _ in 0..dims.queries {
        let user = rng.gen_range(0..dims.users) as u32;
        let item = rng.gen_range(0..dims.items) as u32;
        let half = Share::new(rng.gen::<i32>() as i64);
        let (key0, key1) = DpfKey::generate(item as u64, 0, dims.items as u64, rng);
        queries0.push(Query {
            user_index: user,
            item_share: half,
            key: key0,
        });
        queries1.push(Query {
            user_index: user,
            item_share: Share::new(item as i64) - half,
            key: key1,
        });
        cleartext.push((user, item));
    }

    GeneratedRun {
        users,
        items,
        queries: (queries0, queries1),
        cleartext,
    }
}

fn split_random_matrix<R: Rng>(
    rows: usize,
    cols: usize,
    rng: &mut R,
) -> (ShareMatrix, ShareMatrix) {
    let mut rows0 = Vec::with_capacity(rows);
    let mut rows1 = Vec::with_capacity(rows);
    for _ in 0..rows {
        let mut half0 = Vec::with_capacity(cols);
        let mut half1 = Vec::with_capacity(cols);
        for _ in 0..cols {
            let value = Share::new(rng.gen::<i8>() as i64);
            let half = Share::new(rng.gen::<i8>() as i64);
            half0.push(half);
            half1.push(value - half);
        }
        rows0.push(half0);
        rows1.push(half1);
    }
    (ShareMatrix::from_rows(rows0), ShareMatrix::from_rows(rows1))
}
