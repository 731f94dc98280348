use std::time;

use clap::Parser;
use vcf_clinical::{
    cli::{handle_error_and_exit, init_verbose, AnnotateCli},
    export::{save_csv, save_spreadsheet, AnalysisSummary, ExportCapability},
    Annotator, RemoteSource,
};

fn runner() -> anyhow::Result<()> {
    let cli = AnnotateCli::parse();
    init_verbose(cli.verbosity);
    log::trace!("CLI options set: {:?}", cli);

    let capability = if cli.csv_only {
        ExportCapability::CsvOnly
    } else {
        ExportCapability::detect()
    };

    let config = cli.annotator_config();
    let source = RemoteSource::new(&config)?;
    log::debug!("Annotation source: {}", source.describe());
    let annotator = Annotator::new(source, config.delay);

    let start_timer = time::Instant::now();
    println!("Analyzing VCF file: {}", cli.input.display());
    println!("{}", "=".repeat(60));

    let results = annotator.analyze_vcf_file(&cli.input);
    if results.is_empty() {
        println!("No PASS variants found or error in analysis");
        return Ok(());
    }

    println!("\nFound {} PASS variants", results.len());
    println!("Processing results...");

    let spreadsheet = cli.spreadsheet_path();
    let primary = save_spreadsheet(&results, &spreadsheet, capability)?;
    if primary == spreadsheet {
        println!("Excel file saved: {}", primary.display());
    } else {
        println!("Cannot create Excel file. Results will be saved as CSV instead.");
    }
    let csv_file = cli.csv_path();
    save_csv(&results, &csv_file)?;
    println!("CSV backup saved: {}", csv_file.display());

    println!("\n{}", AnalysisSummary::from_rows(&results));

    let rule = "=".repeat(60);
    println!("\n{}", rule);
    println!("FILES CREATED:");
    if primary != csv_file {
        println!("  - {} (Main results with formatting)", primary.display());
    }
    println!("  - {} (Backup CSV format)", csv_file.display());
    println!("{}", rule);

    log::info!("Total execution time: {:.2?}", start_timer.elapsed());
    Ok(())
}

fn main() {
    if let Err(e) = runner() {
        handle_error_and_exit(format!("{:#}", e));
    }
}
