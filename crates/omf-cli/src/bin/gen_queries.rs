//! Generates fresh share matrices and query files for one session.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use rand::{rngs::StdRng, SeedableRng};
use tracing::info;

use omf_cli::{config::Config, files, gen, init_tracing};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Directory the share and query files are written into.
    output_dir: PathBuf,
    /// Configuration file (TOML); defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    let dims = config.dimensions;

    std::fs::create_dir_all(&cli.output_dir)
        .with_context(|| format!("creating {}", cli.output_dir.display()))?;

    let mut rng = StdRng::from_entropy();
    let run = gen::generate_run(&dims, &mut rng);

    let out = |name: &str| cli.output_dir.join(name);
    files::save_matrix(&out("U0.txt"), &run.users.0)?;
    files::save_matrix(&out("U1.txt"), &run.users.1)?;
    files::save_matrix(&out("V0.txt"), &run.items.0)?;
    files::save_matrix(&out("V1.txt"), &run.items.1)?;
    files::write_queries(&out("queries_p0.bin"), &run.queries.0)?;
    files::write_queries(&out("queries_p1.bin"), &run.queries.1)?;
    files::write_cleartext_queries(&out("queries_cleartext.txt"), &run.cleartext)?;

    info!(
        dir = %cli.output_dir.display(),
        users = dims.users,
        items = dims.items,
        features = dims.features,
        queries = dims.queries,
        "wrote share and query files"
    );
    Ok(())
}
