use std::process::ExitCode;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use precinct_adjacency::{
    build_adjacency, graph::LogProgress, BuildConfig, CancelReason, CancelToken, Progress, ProgressObserver,
    ScanStatus,
};

/// Exit status when the scan stopped early and a partial map was written.
const PARTIAL_EXIT: u8 = 2;

/// Progress bar over finished rows. Rows finish out of order, so the bar counts them.
struct BarProgress(ProgressBar);

impl BarProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} rows ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self(bar)
    }
}

impl ProgressObserver for BarProgress {
    fn observe(&self, progress: Progress) {
        if self.0.length() == Some(0) {
            self.0.set_length(progress.total.saturating_sub(1) as u64);
        }
        self.0.inc(1);
    }
}

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::BuildArgs) -> Result<ExitCode> {
    let mut config = match &args.config {
        Some(path) => BuildConfig::load(path)?,
        None => BuildConfig::default(),
    };
    args.apply(&mut config).context("invalid --timeout")?;
    config.validate()?;
    let output = config.paths()?.1.to_path_buf();
    tracing::debug!(?config, "resolved build config");

    let cancel = CancelToken::new();
    let interrupt = cancel.clone();
    ctrlc::set_handler(move || {
        // A second interrupt gives up on the partial result.
        if interrupt.reason() == Some(CancelReason::Requested) {
            std::process::exit(130);
        }
        tracing::warn!("interrupted; finishing rows in flight, press Ctrl-C again to abort");
        interrupt.cancel();
    })
    .context("failed to install interrupt handler")?;
    let report = if args.no_progress {
        build_adjacency(&config, &LogProgress, &cancel)?
    } else {
        let bar = BarProgress::new();
        let report = build_adjacency(&config, &bar, &cancel);
        bar.0.finish_and_clear();
        report?
    };

    let path = precinct_adjacency::write_report(&report, &output, args.force)
        .with_context(|| format!("failed to write adjacency map ({} precincts)", report.map.len()))?;

    match report.status {
        ScanStatus::Complete => {
            eprintln!(
                "[build] {} precincts, {} edges, {} evaluations in {:.2?} -> {}",
                report.map.len(),
                report.map.edge_count(),
                report.evaluations,
                report.elapsed,
                path.display()
            );
            Ok(ExitCode::SUCCESS)
        }
        ScanStatus::Partial { reason, last_completed, rows_completed } => {
            let through = last_completed.map_or_else(|| "none".to_string(), |row| row.to_string());
            eprintln!(
                "[build] partial result ({reason}): {rows_completed} rows finished, contiguous through row {through} -> {}",
                path.display()
            );
            Ok(ExitCode::from(PARTIAL_EXIT))
        }
    }
}
