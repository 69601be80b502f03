//! Hash command
//!
//! Prints one `<old question id>\t<sha256>` line per backup question. Two
//! questions with equal hashes hold the same matrix content regardless of
//! their ids.

use clap::Args;
use qmatrix_core::questiondata::{content_identity_hash, convert_backup_to_questiondata};
use qmatrix_store::backup::parse_backup_file;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct HashArgs {
    /// Path to the backup YAML document
    pub backup: PathBuf,

    /// Only hash this old question id
    #[arg(long)]
    pub question: Option<i64>,
}

pub fn execute(args: HashArgs) -> Result<(), Box<dyn std::error::Error>> {
    let doc = parse_backup_file(&args.backup)?;

    let mut printed = 0;
    for question in &doc.questions {
        if args.question.is_some_and(|id| id != question.old_question_id) {
            continue;
        }
        let data = convert_backup_to_questiondata(&question.matrix);
        println!("{}\t{}", question.old_question_id, content_identity_hash(&data)?);
        printed += 1;
    }

    if printed == 0 {
        if let Some(id) = args.question {
            return Err(format!("Question {} not found in backup", id).into());
        }
    }
    Ok(())
}
