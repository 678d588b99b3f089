use clap::Parser;
use miette::Result;
use std::process::ExitCode;
use tracing::Level;
use typegen_build::WriteOutcome;
use typegen_driver::Driver;

#[derive(Parser)]
#[command(name = "typegen")]
#[command(author, version, about = "Generate binding glue from annotated native headers")]
struct Cli {
    /// Log every parsing and emission step
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_target(false)
        .without_time()
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            println!("{:?}", report);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(false)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))?;

    let driver = Driver::locate()?;
    let report = driver.run()?;

    for file in &report.files {
        let path = file.path.strip_prefix(driver.root()).unwrap_or(&file.path);
        match file.outcome {
            WriteOutcome::Wrote => println!("wrote {}", path.display()),
            WriteOutcome::Unchanged => println!("skipped {}, no changes", path.display()),
        }
    }
    if !report.diagnostics.is_empty() {
        tracing::debug!(warnings = report.diagnostics.len(), "generation finished with warnings");
    }
    Ok(())
}
