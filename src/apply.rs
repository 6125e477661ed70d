//! Best-effort application of a migration plan.

use crate::plan::TagRecord;
use crate::repository::Repository;

pub struct ApplyOptions {
    /// Delete each original tag after its replacement has been created.
    pub delete_original: bool,
}

/// Apply the plan record by record, in plan order.
///
/// Failures are isolated per record: a failed creation skips that record's
/// deletion, a failed deletion is logged, and in both cases the remaining
/// records still run. Nothing is rolled back.
///
/// Returns the number of tags that were created.
pub fn apply(repo: &Repository, plan: &[TagRecord], options: &ApplyOptions) -> usize {
    let mut applied = 0;

    for record in plan {
        if let Err(e) = repo.create_tag(&record.target_name, &record.commit_sha, &record.message) {
            eprintln!(
                "could not create tag {} on commit {}: {:#}",
                record.target_name, record.commit_sha, e
            );
            continue;
        }

        applied += 1;

        if !options.delete_original {
            continue;
        }

        if let Err(e) = repo.delete_tag(&record.source_name) {
            eprintln!("could not delete tag {}: {:#}", record.source_name, e);
        }
    }

    applied
}
