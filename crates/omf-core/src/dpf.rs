//! Distributed point function over a power-of-two-rounded index domain.
//!
//! A key pair shares the function `f(alpha) = beta`, `f(x) = 0` elsewhere:
//! for every index the two parties' evaluations sum to the function value
//! while either key alone looks uniform. Keys are generated with a zero
//! `beta`; the useful point value is patched in later by replacing the leaf
//! correction word, which is how the item-row broadcast reuses one key per
//! feature column.

use std::io::{self, Read, Write};

use rand::Rng;

use crate::prg::expand;

/// Levels above this bound cannot come from a valid key and indicate a
/// corrupt blob.
pub const MAX_TREE_DEPTH: u64 = 64;

/// Per-level public correction steering both parties onto matching off-path
/// subtrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrectionWord {
    /// Seed correction, XORed into the child seed when the control flag is set.
    pub seed: u64,
    /// Control-bit correction for the left child.
    pub flag_left: bool,
    /// Control-bit correction for the right child.
    pub flag_right: bool,
}

/// One party's key share of a point function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DpfKey {
    /// Root seed of this party's evaluation tree.
    pub root_seed: u64,
    /// Root control flag. The two keys of a pair hold opposite root flags.
    pub root_flag: bool,
    /// Correction words, one per tree level, identical across the pair.
    pub levels: Vec<CorrectionWord>,
    /// Leaf-level additive correction, applied when the leaf flag is set.
    pub leaf_cw: i64,
    /// ±1, fixed by this party's leaf control flag at generation time. The
    /// two keys of a pair carry opposite signs.
    pub sign: i64,
}

/// Number of tree levels for a domain of `domain` indices.
pub(crate) fn tree_depth(domain: u64) -> u32 {
    domain.next_power_of_two().trailing_zeros().max(1)
}

impl DpfKey {
    /// Splits `f(alpha) = beta` over `[0, domain)` into two key shares.
    pub fn generate<R: Rng + ?Sized>(
        alpha: u64,
        beta: i64,
        domain: u64,
        rng: &mut R,
    ) -> (DpfKey, DpfKey) {
        let depth = tree_depth(domain);

        let root0 = rng.gen::<u8>() as u64;
        let root1 = rng.gen::<u8>() as u64;
        let mut seed0 = root0;
        let mut seed1 = root1;
        let mut flag0 = false;
        let mut flag1 = true;

        let mut levels = Vec::with_capacity(depth as usize);
        for level in 0..depth {
            let c0 = expand(seed0);
            let c1 = expand(seed1);
            let path_right = (alpha >> (depth - 1 - level)) & 1 == 1;

            // The on-path child correction carries an extra flip so the pair's
            // control flags stay opposite along the path; the off-path
            // correction makes them equal, which cancels those subtrees.
            let (cw, child0, child1) = if path_right {
                (
                    CorrectionWord {
                        seed: c0.seed_left ^ c1.seed_left,
                        flag_left: c0.flag_left ^ c1.flag_left,
                        flag_right: !(c0.flag_right ^ c1.flag_right),
                    },
                    (c0.seed_right, c0.flag_right),
                    (c1.seed_right, c1.flag_right),
                )
            } else {
                (
                    CorrectionWord {
                        seed: c0.seed_right ^ c1.seed_right,
                        flag_left: !(c0.flag_left ^ c1.flag_left),
                        flag_right: c0.flag_right ^ c1.flag_right,
                    },
                    (c0.seed_left, c0.flag_left),
                    (c1.seed_left, c1.flag_left),
                )
            };
            let path_fcw = if path_right {
                cw.flag_right
            } else {
                cw.flag_left
            };

            seed0 = child0.0;
            seed1 = child1.0;
            let mut flag0_next = child0.1;
            let mut flag1_next = child1.1;
            if flag0 {
                seed0 ^= cw.seed;
                flag0_next ^= path_fcw;
            }
            if flag1 {
                seed1 ^= cw.seed;
                flag1_next ^= path_fcw;
            }
            flag0 = flag0_next;
            flag1 = flag1_next;
            levels.push(cw);
        }

        let sign0: i64 = if flag0 { 1 } else { -1 };
        let sign1: i64 = if flag1 { 1 } else { -1 };
        let mask = rng.gen::<i8>() as i64;
        let leaf0 = mask.wrapping_add(sign0.wrapping_mul(seed0 as i64));
        let leaf1 = beta
            .wrapping_sub(mask)
            .wrapping_add(sign1.wrapping_mul(seed1 as i64));

        (
            DpfKey {
                root_seed: root0,
                root_flag: false,
                levels: levels.clone(),
                leaf_cw: leaf0,
                sign: sign0,
            },
            DpfKey {
                root_seed: root1,
                root_flag: true,
                levels,
                leaf_cw: leaf1,
                sign: sign1,
            },
        )
    }

    /// Evaluates this key share at a single index.
    ///
    /// `domain` must match the value used at generation; a mismatch yields
    /// garbage without an error.
    pub fn eval(&self, index: u64, domain: u64) -> i64 {
        let depth = tree_depth(domain);
        let mut seed = self.root_seed;
        let mut flag = self.root_flag;
        for level in 0..depth {
            let children = expand(seed);
            let path_right = (index >> (depth - 1 - level)) & 1 == 1;
            let (mut next_seed, mut next_flag) = if path_right {
                (children.seed_right, children.flag_right)
            } else {
                (children.seed_left, children.flag_left)
            };
            if flag {
                let cw = &self.levels[level as usize];
                next_seed ^= cw.seed;
                next_flag ^= if path_right {
                    cw.flag_right
                } else {
                    cw.flag_left
                };
            }
            seed = next_seed;
            flag = next_flag;
        }
        self.leaf_value(seed, flag)
    }

    /// Materializes the first `domain` leaves of the evaluation tree.
    ///
    /// One pass over the tree: every reachable node is expanded exactly once
    /// and subtrees lying entirely past `domain` are pruned, so the walk does
    /// O(domain) work on an O(depth) stack. Output is deterministic in
    /// `(self, domain)`.
    pub fn eval_full(&self, domain: u64) -> Vec<i64> {
        let depth = tree_depth(domain);
        let mut out = Vec::with_capacity(domain as usize);
        self.walk(self.root_seed, self.root_flag, 0, depth, 0, domain, &mut out);
        out
    }

    #[allow(clippy::too_many_arguments)]
    fn walk(
        &self,
        seed: u64,
        flag: bool,
        level: u32,
        depth: u32,
        base: u64,
        limit: u64,
        out: &mut Vec<i64>,
    ) {
        if base >= limit {
            return;
        }
        if level == depth {
            out.push(self.leaf_value(seed, flag));
            return;
        }
        let children = expand(seed);
        let (mut seed_left, mut flag_left) = (children.seed_left, children.flag_left);
        let (mut seed_right, mut flag_right) = (children.seed_right, children.flag_right);
        if flag {
            let cw = &self.levels[level as usize];
            seed_left ^= cw.seed;
            seed_right ^= cw.seed;
            flag_left ^= cw.flag_left;
            flag_right ^= cw.flag_right;
        }
        let half = 1u64 << (depth - level - 1);
        self.walk(seed_left, flag_left, level + 1, depth, base, limit, out);
        self.walk(
            seed_right,
            flag_right,
            level + 1,
            depth,
            base + half,
            limit,
            out,
        );
    }

    fn leaf_value(&self, seed: u64, flag: bool) -> i64 {
        let mut value = seed as i64;
        if flag {
            value = value.wrapping_add(self.leaf_cw);
        }
        value.wrapping_mul(self.sign)
    }

    /// Writes the fixed little-endian blob layout.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.root_seed.to_le_bytes())?;
        writer.write_all(&[self.root_flag as u8])?;
        writer.write_all(&self.leaf_cw.to_le_bytes())?;
        writer.write_all(&(self.sign as i32).to_le_bytes())?;
        writer.write_all(&(self.levels.len() as u64).to_le_bytes())?;
        for cw in &self.levels {
            writer.write_all(&cw.seed.to_le_bytes())?;
            writer.write_all(&[cw.flag_left as u8, cw.flag_right as u8])?;
        }
        Ok(())
    }

    /// Reads one key blob. Short reads and impossible level counts are
    /// errors; callers treat them as fatal.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<DpfKey, KeyCodecError> {
        let root_seed = u64::from_le_bytes(read_array(reader)?);
        let root_flag = read_array::<_, 1>(reader)?[0] != 0;
        let leaf_cw = i64::from_le_bytes(read_array(reader)?);
        let sign = i32::from_le_bytes(read_array(reader)?) as i64;
        let count = u64::from_le_bytes(read_array(reader)?);
        if count > MAX_TREE_DEPTH {
            return Err(KeyCodecError::DepthOverflow(count));
        }
        let mut levels = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let seed = u64::from_le_bytes(read_array(reader)?);
            let flags = read_array::<_, 2>(reader)?;
            levels.push(CorrectionWord {
                seed,
                flag_left: flags[0] != 0,
                flag_right: flags[1] != 0,
            });
        }
        Ok(DpfKey {
            root_seed,
            root_flag,
            levels,
            leaf_cw,
            sign,
        })
    }
}

fn read_array<R: Read, const N: usize>(reader: &mut R) -> io::Result<[u8; N]> {
    let mut buf = [0u8; N];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

/// Errors decoding a key blob.
#[derive(Debug, thiserror::Error)]
pub enum KeyCodecError {
    /// Truncated or unreadable blob.
    #[error("i/o: {0}")]
    Io(#[from] io::Error),
    /// Level count exceeding any valid tree depth.
    #[error("correction word count {0} exceeds the supported tree depth")]
    DepthOverflow(u64),
}
