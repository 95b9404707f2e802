//! Correctness checker: replays the session in the clear and compares with
//! the parties' written shares.

use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use omf_cli::{config::Config, files, init_tracing};
use omf_core::{matrix::ShareMatrix, share::vec_add, sim};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Configuration file (TOML); defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn load(dir: &Path, name: &str, rows: usize, cols: usize) -> anyhow::Result<ShareMatrix> {
    files::load_matrix(&dir.join(name), rows, cols).with_context(|| format!("loading {name}"))
}

fn combine(a: &ShareMatrix, b: &ShareMatrix) -> ShareMatrix {
    ShareMatrix::from_rows(
        a.iter_rows()
            .zip(b.iter_rows())
            .map(|(ra, rb)| vec_add(ra, rb))
            .collect(),
    )
}

fn reduce(matrix: &ShareMatrix) -> Vec<Vec<u32>> {
    matrix
        .iter_rows()
        .map(|row| row.iter().map(|share| share.to_bits()).collect())
        .collect()
}

/// Reports mismatches between the cleartext replay and the MPC output,
/// returning how many cells differ.
fn compare(label: &str, expected: &[Vec<u32>], actual: &[Vec<u32>]) -> usize {
    const REPORT_LIMIT: usize = 10;
    let mut mismatches = 0;
    for (row, (e, a)) in expected.iter().zip(actual).enumerate() {
        for (col, (&ev, &av)) in e.iter().zip(a).enumerate() {
            if ev != av {
                if mismatches < REPORT_LIMIT {
                    error!(
                        matrix = label,
                        row,
                        col,
                        expected = ev,
                        actual = av,
                        "mismatch"
                    );
                }
                mismatches += 1;
            }
        }
    }
    mismatches
}

fn main() -> anyhow::Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    let dims = config.dimensions;

    let dir = files::locate_data_dir(&config.data_dir, "U0.txt");
    info!(dir = %dir.display(), "checking session output");

    let u0 = load(&dir, "U0.txt", dims.users, dims.features)?;
    let u1 = load(&dir, "U1.txt", dims.users, dims.features)?;
    let v0 = load(&dir, "V0.txt", dims.items, dims.features)?;
    let v1 = load(&dir, "V1.txt", dims.items, dims.features)?;

    let mut users = combine(&u0, &u1);
    let mut items = combine(&v0, &v1);

    let queries = match files::read_cleartext_queries(&dir.join("queries_cleartext.txt")) {
        Ok(queries) => queries,
        Err(_) => {
            info!("cleartext query list missing, recombining the binary files");
            let q0 = files::read_queries(&dir.join("queries_p0.bin"))?;
            let q1 = files::read_queries(&dir.join("queries_p1.bin"))?;
            files::recombine_queries(&q0, &q1)?
        }
    };
    anyhow::ensure!(
        queries.len() == dims.queries,
        "expected {} queries, found {}",
        dims.queries,
        queries.len()
    );

    sim::apply_queries(&mut users, &mut items, &queries);

    let u0_updated = load(&dir, "U0_updated.txt", dims.users, dims.features)
        .context("has the protocol run?")?;
    let u1_updated = load(&dir, "U1_updated.txt", dims.users, dims.features)?;
    let v0_updated = load(&dir, "V0_updated.txt", dims.items, dims.features)?;
    let v1_updated = load(&dir, "V1_updated.txt", dims.items, dims.features)?;

    let user_mismatches = compare(
        "U",
        &reduce(&users),
        &reduce(&combine(&u0_updated, &u1_updated)),
    );
    let item_mismatches = compare(
        "V",
        &reduce(&items),
        &reduce(&combine(&v0_updated, &v1_updated)),
    );

    if user_mismatches + item_mismatches == 0 {
        info!("success: MPC output matches the cleartext replay");
        Ok(ExitCode::SUCCESS)
    } else {
        error!(
            user_mismatches,
            item_mismatches, "failure: MPC output does not match"
        );
        Ok(ExitCode::FAILURE)
    }
}
