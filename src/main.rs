use std::path::PathBuf;

use clap::Parser;
use invoicing::{
    aggregate::Aggregator,
    diagnostics,
    partner::Settings,
    render::write_report,
    report::compose,
    workbook::{discover, FILE_PREFIX},
};
use log::{error, info};

#[derive(Parser)]
#[clap(about = "Build partner invoices from merchant card summary workbooks")]
struct Cli {
    /// Directory holding the summary workbooks
    #[clap(long, default_value = "./summary_files")]
    input_dir: PathBuf,
    /// Only files whose name contains this marker are read
    #[clap(long, default_value = FILE_PREFIX)]
    prefix: String,
    /// Partner registry (TOML)
    #[clap(long, default_value = "partners.toml")]
    partners: PathBuf,
    #[clap(long, default_value = ".")]
    output_dir: PathBuf,
    #[clap(long, default_value = "errors.log")]
    log_file: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    diagnostics::init(&cli.log_file)?;

    let settings = Settings::load(&cli.partners)?;
    let files = discover(&cli.input_dir, &cli.prefix)?;
    info!(
        "{} summary files, {} partners",
        files.len(),
        settings.registry.len()
    );

    let mut aggregator = Aggregator::new(settings.registry, settings.layout);
    let ingest = aggregator.process_files(&files);
    info!(
        "{} files processed, {} failed",
        ingest.processed.len(),
        ingest.failures.len()
    );

    std::fs::create_dir_all(&cli.output_dir)?;
    let mut failed_reports = 0;
    for (partner, merchant) in aggregator.merchants() {
        let report = compose(partner, merchant, aggregator.date_range());
        match write_report(&report, &cli.output_dir) {
            Ok(path) => info!("wrote {}", path.display()),
            Err(err) => {
                error!("unable to write report for \"{}\": {}", partner.appears_as, err);
                failed_reports += 1;
            }
        }
    }

    aggregator.serialize(std::io::stdout())?;

    if failed_reports > 0 {
        return Err(format!("{} report(s) could not be written", failed_reports).into());
    }
    Ok(())
}
