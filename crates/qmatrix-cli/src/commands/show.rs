//! Show command
//!
//! Usage: qmatrix show <QUESTION_ID> [--db PATH] [--config FILE]

use clap::Args;
use qmatrix_store::repo::attempt_steps_for_question;
use qmatrix_store::SqliteMatrixStore;

use crate::config::DbArgs;

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Destination question id
    pub question_id: i64,

    #[command(flatten)]
    pub db: DbArgs,

    /// Include stored attempt steps
    #[arg(long)]
    pub attempts: bool,
}

pub fn execute(args: ShowArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (_config, conn) = args.db.open()?;

    let stored = SqliteMatrixStore::new(&conn)
        .load_matrix(args.question_id)?
        .ok_or_else(|| qmatrix_store::errors::matrix_not_found(args.question_id))?;

    let mut value = serde_json::to_value(&stored)?;
    if args.attempts {
        let steps = attempt_steps_for_question(&conn, args.question_id)?;
        value["attempts"] = serde_json::to_value(steps)?;
    }
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
