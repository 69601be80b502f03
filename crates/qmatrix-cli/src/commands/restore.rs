//! Restore command
//!
//! Usage: qmatrix restore <BACKUP> [--db PATH] [--config FILE] [--json]

use clap::Args;
use qmatrix_store::restore::{restore_backup_file, QuestionOutcome, RestoreReport};
use std::path::PathBuf;

use crate::config::DbArgs;

#[derive(Debug, Args)]
pub struct RestoreArgs {
    /// Path to the backup YAML document
    pub backup: PathBuf,

    #[command(flatten)]
    pub db: DbArgs,

    /// Print the full report as JSON instead of a summary
    #[arg(long)]
    pub json: bool,
}

/// Execute restore command
///
/// Fails (non-zero exit) when any question could not be restored.
pub fn execute(args: RestoreArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (_config, mut conn) = args.db.open()?;

    let report = restore_backup_file(&mut conn, &args.backup)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    if report.is_success() {
        Ok(())
    } else {
        Err(format!("{} question(s) failed to restore", report.failed_count()).into())
    }
}

fn print_summary(report: &RestoreReport) {
    println!("Restore {}", report.request_id);
    for question in &report.questions {
        match &question.outcome {
            QuestionOutcome::Restored {
                summary,
                attempt_steps,
                legacy_states,
                response_failures,
                unmapped_cells,
            } => {
                let mode = if summary.created { "created" } else { "merged" };
                println!(
                    "✓ question {} -> {} ({}: {} rows, {} cols, {} weights; {} attempt steps, {} legacy states)",
                    question.old_question_id,
                    question.new_question_id,
                    mode,
                    summary.rows,
                    summary.cols,
                    summary.weights,
                    attempt_steps,
                    legacy_states
                );
                for failure in response_failures {
                    match failure.sequence_number {
                        Some(seq) => println!("  ! step {}: [{}] {}", seq, failure.code, failure.message),
                        None => println!("  ! legacy state: [{}] {}", failure.code, failure.message),
                    }
                }
                if !unmapped_cells.is_empty() {
                    println!("  ! {} legacy cell reference(s) had no mapping", unmapped_cells.len());
                }
            }
            QuestionOutcome::Failed { code, message } => {
                println!(
                    "✗ question {} -> {}: [{}] {}",
                    question.old_question_id, question.new_question_id, code, message
                );
            }
        }
    }
    println!(
        "{} restored, {} failed",
        report.restored_count(),
        report.failed_count()
    );
}
