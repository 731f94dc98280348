use std::time;

use anyhow::Context;
use clap::Parser;
use vcf_clinical::{
    cli::{handle_error_and_exit, init_verbose, FilterCli},
    Criteria, VcfRewriter,
};

fn runner() -> anyhow::Result<()> {
    let cli = FilterCli::parse();
    init_verbose(cli.verbosity);
    log::trace!("CLI options set: {:?}", cli);

    log::info!("Running {}-{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    let start_timer = time::Instant::now();

    let criteria = Criteria::from_path(&cli.criteria)?;
    if criteria.is_empty() {
        log::warn!("No criteria in {}; every record will pass", cli.criteria.display());
    } else {
        log::info!("Monitoring fields: {}", criteria.fields().join(", "));
    }

    let rewriter = VcfRewriter::new(criteria, cli.combine_mode());
    rewriter
        .rewrite_file(&cli.input, &cli.output)
        .with_context(|| format!("Filtering {} failed", cli.input.display()))?;

    log::info!("Total execution time: {:.2?}", start_timer.elapsed());
    Ok(())
}

fn main() {
    if let Err(e) = runner() {
        handle_error_and_exit(format!("{:#}", e));
    }
}
