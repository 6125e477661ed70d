mod common;

use anyhow::{Context, Result};
use std::process::Command;

const JAN_05_2023: i64 = 1672876800;
const FEB_01_2023: i64 = 1675209600;

fn run_retag(root: &std::path::Path, extra: &[&str]) -> Result<std::process::Output> {
    let mut args = vec!["--path", root.to_str().unwrap()];
    args.extend_from_slice(extra);

    Command::new(env!("CARGO_BIN_EXE_retag"))
        .args(args)
        .output()
        .context("spawn retag")
}

#[test]
fn dry_run_prints_the_plan_and_writes_nothing() -> Result<()> {
    let tmp = tempfile::tempdir().context("create tempdir")?;
    let repo = common::init_repo(tmp.path())?;

    let c1 = common::write_commit(&repo, JAN_05_2023, "+0000", "one")?;
    let c2 = common::write_commit(&repo, FEB_01_2023, "+0000", "two")?;
    common::lightweight_tag(&repo, "alpha", &c1)?;
    common::lightweight_tag(&repo, "beta", &c2)?;

    let before = repo.list_tags()?;

    let dry = run_retag(tmp.path(), &["--dry-run"])?;
    assert!(dry.status.success());

    let stdout = String::from_utf8(dry.stdout).context("stdout utf8")?;
    assert!(stdout.contains("Tags to migrate:"));
    assert!(stdout.contains("alpha --> v2023.1.1 message: converted from tag alpha"));
    assert!(stdout.contains("beta --> v2023.2.1 message: converted from tag beta"));

    assert_eq!(before, repo.list_tags()?);

    // the applied run prints the same plan it executes
    let wet = run_retag(tmp.path(), &[])?;
    assert!(wet.status.success());
    assert_eq!(String::from_utf8(wet.stdout).context("stdout utf8")?, stdout);

    let tags = repo.list_tags()?;
    assert!(tags.contains_key("v2023.1.1"));
    assert!(tags.contains_key("v2023.2.1"));
    assert!(tags.contains_key("alpha"));

    Ok(())
}

#[test]
fn empty_tag_set_prints_notice() -> Result<()> {
    let tmp = tempfile::tempdir().context("create tempdir")?;
    common::init_repo(tmp.path())?;

    let out = run_retag(tmp.path(), &[])?;
    assert!(out.status.success());

    let stdout = String::from_utf8(out.stdout).context("stdout utf8")?;
    assert!(stdout.contains("no tags to update"));

    Ok(())
}

#[test]
fn unopenable_repository_is_fatal() -> Result<()> {
    let tmp = tempfile::tempdir().context("create tempdir")?;

    // a readable directory that is not a repository
    let out = run_retag(tmp.path(), &[])?;
    assert!(!out.status.success());

    // an unreadable path
    let missing = tmp.path().join("does-not-exist");
    let out = run_retag(&missing, &[])?;
    assert!(!out.status.success());

    Ok(())
}
