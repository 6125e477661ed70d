//! The tag migration planner.
//!
//! Collects one [`TagRecord`] per tag reference, derives a date-based target
//! name per record, resolves name collisions with chronological ordinals, and
//! orders the finished plan by commit time. Everything here is side-effect
//! free; only [`crate::apply`] writes to the repository.

use crate::repository::Repository;
use anyhow::Context;
use chrono::{DateTime, Datelike, FixedOffset};
use indexmap::IndexMap;

/// One tag rename: `source_name` becomes `target_name` on `commit_sha`.
#[derive(Debug, Clone)]
pub struct TagRecord {
    pub source_name: String,
    pub target_name: String,
    pub commit_sha: String,
    /// Committer time of the tagged commit, in its original timezone.
    pub commit_time: DateTime<FixedOffset>,
    pub message: String,
}

pub fn default_message(source_name: &str) -> String {
    format!("converted from tag {}", source_name)
}

/// Derive the collision-prone month name for a commit time.
///
/// Year and month are taken from the commit's own timezone, never from UTC;
/// the month is not zero-padded.
pub fn month_name(time: &DateTime<FixedOffset>) -> String {
    format!("v{}.{}", time.year(), time.month())
}

/// Turn every tag reference into a [`TagRecord`], leaving `target_name`
/// empty.
///
/// A reference whose commit cannot be resolved is dropped from the working
/// set with a diagnostic on stderr; the remaining tags are unaffected.
pub fn collect_tags(repo: &Repository) -> anyhow::Result<Vec<TagRecord>> {
    let refs = repo
        .list_tags()
        .context("could not read tags from repository")?;

    let mut records = Vec::with_capacity(refs.len());

    for (name, sha) in refs {
        let (commit_sha, commit) = match repo.resolve_commit(&sha) {
            Ok(resolved) => resolved,
            Err(e) => {
                eprintln!("skipping tag {}: error getting commit: {:#}", name, e);
                continue;
            }
        };

        let commit_time = match commit.committer_time() {
            Ok(time) => time,
            Err(e) => {
                eprintln!("skipping tag {}: {:#}", name, e);
                continue;
            }
        };

        let mut message = default_message(&name);

        match repo.resolve_annotated_tag(&sha) {
            Ok(Some(tag)) => {
                if let Some(original) = tag.message() {
                    message = format!("{} ({})", original.trim_end(), message);
                }
            }
            Ok(None) => {} // lightweight tag
            Err(e) => {
                eprintln!("skipping tag {}: error getting tag object: {:#}", name, e);
                continue;
            }
        }

        records.push(TagRecord {
            source_name: name,
            target_name: String::new(),
            commit_sha,
            commit_time,
            message,
        });
    }

    Ok(records)
}

/// Set every record's target to its derived month name.
pub fn derive_names(records: &mut [TagRecord]) {
    for record in records {
        record.target_name = month_name(&record.commit_time);
    }
}

/// Ascending commit time; equal timestamps fall back to the source name so
/// the order is deterministic.
pub fn sort_by_commit_time(records: &mut [TagRecord]) {
    records.sort_by(|a, b| {
        a.commit_time
            .cmp(&b.commit_time)
            .then_with(|| a.source_name.cmp(&b.source_name))
    });
}

/// Make every `target_name` unique by appending a chronological ordinal.
///
/// Records are grouped by their derived name; within a group the earliest
/// commit becomes `.1`, the next `.2`, and so on. A group of one still gets
/// `.1`: there is no no-collision special case.
pub fn assign_revisions(records: Vec<TagRecord>) -> Vec<TagRecord> {
    let mut groups: IndexMap<String, Vec<TagRecord>> = IndexMap::new();

    for record in records {
        groups
            .entry(record.target_name.clone())
            .or_default()
            .push(record);
    }

    let mut out = Vec::new();

    for (_, mut group) in groups {
        sort_by_commit_time(&mut group);

        for (n, mut record) in group.into_iter().enumerate() {
            record.target_name = format!("{}.{}", record.target_name, n + 1);
            out.push(record);
        }
    }

    out
}

/// Build the full migration plan: collect, derive, resolve collisions, then
/// one flat chronological sort across all records.
pub fn build_plan(repo: &Repository) -> anyhow::Result<Vec<TagRecord>> {
    let mut records = collect_tags(repo)?;

    derive_names(&mut records);

    let mut plan = assign_revisions(records);
    sort_by_commit_time(&mut plan);

    Ok(plan)
}
