use anyhow::Context;
use clap::Parser;
use retag::apply::{self, ApplyOptions};
use retag::plan;
use retag::repository::Repository;
use std::path::PathBuf;

/// Rename every tag to a canonical date-derived name.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The path to the repo to re-tag
    #[arg(long)]
    path: PathBuf,
    /// Only display the changes without tagging
    #[arg(long)]
    dry_run: bool,
    /// Delete the old tags
    #[arg(long)]
    delete: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    std::fs::read_dir(&cli.path)
        .context(format!("could not read path '{}'", cli.path.display()))?;

    let repo = Repository::load(cli.path.clone()).context(format!(
        "could not load git repo from path '{}'",
        cli.path.display()
    ))?;

    let plan = plan::build_plan(&repo).context("could not get tags from repo")?;

    if plan.is_empty() {
        println!("no tags to update");
    }

    println!("Tags to migrate:");
    for record in &plan {
        println!(
            "{} --> {} message: {}",
            record.source_name, record.target_name, record.message
        );
    }

    if cli.dry_run {
        return Ok(());
    }

    apply::apply(
        &repo,
        &plan,
        &ApplyOptions {
            delete_original: cli.delete,
        },
    );

    Ok(())
}
