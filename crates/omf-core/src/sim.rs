//! Cleartext replay of the update rule.
//!
//! Used by the correctness checker and the protocol tests as the reference
//! the secure computation must reproduce bit-for-bit after reduction.

use crate::matrix::ShareMatrix;
use crate::share::{vec_add, vec_dot, vec_scale, Share};

/// Applies one query's update in the clear.
///
/// Both row deltas are computed from the pre-update rows, then written; the
/// item update sees the user row as it was before this query.
pub fn apply_query(users: &mut ShareMatrix, items: &mut ShareMatrix, user: usize, item: usize) {
    let user_row = users.row(user).to_vec();
    let item_row = items.row(item).to_vec();
    let delta = Share::ONE - vec_dot(&user_row, &item_row);

    users.set_row(user, vec_add(&user_row, &vec_scale(&item_row, delta)));
    items.set_row(item, vec_add(&item_row, &vec_scale(&user_row, delta)));
}

/// Replays a whole query sequence in order.
pub fn apply_queries(users: &mut ShareMatrix, items: &mut ShareMatrix, queries: &[(u32, u32)]) {
    for &(user, item) in queries {
        apply_query(users, items, user as usize, item as usize);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(values: &[&[i64]]) -> ShareMatrix {
        ShareMatrix::from_rows(
            values
                .iter()
                .map(|row| row.iter().map(|&v| Share::new(v)).collect())
                .collect(),
        )
    }

    #[test]
    fn zero_item_row_copies_the_user_row() {
        let mut users = matrix(&[&[5]]);
        let mut items = matrix(&[&[0], &[0]]);
        apply_query(&mut users, &mut items, 0, 1);
        assert_eq!(users, matrix(&[&[5]]));
        assert_eq!(items, matrix(&[&[0], &[5]]));
    }

    #[test]
    fn unit_dot_product_is_a_fixed_point() {
        let mut users = matrix(&[&[1, 2], &[3, 4]]);
        let mut items = matrix(&[&[1, 0], &[0, 1]]);
        apply_query(&mut users, &mut items, 0, 0);
        assert_eq!(users, matrix(&[&[1, 2], &[3, 4]]));
        assert_eq!(items, matrix(&[&[1, 0], &[0, 1]]));
    }

    #[test]
    fn item_update_reads_the_pre_step_user_row() {
        let mut users = matrix(&[&[2, 3]]);
        let mut items = matrix(&[&[1, 0], &[0, 1], &[0, 0], &[0, 0]]);
        apply_queries(&mut users, &mut items, &[(0, 2), (0, 3)]);

        // Query (0, 2): d = 0, so u gains v_2 = 0 and v_2 gains the old u.
        // Query (0, 3): again d = 0 against a zero row.
        assert_eq!(users, matrix(&[&[2, 3]]));
        assert_eq!(
            items,
            matrix(&[&[1, 0], &[0, 1], &[2, 3], &[2, 3]])
        );
    }
}
