use anyhow::{Context, Result};
use retag::objects::{Fmt, GitObject};
use retag::repository::Repository;
use std::fs;
use std::path::Path;

/// Lay out a minimal `.git` directory and open it.
pub fn init_repo(root: &Path) -> Result<Repository> {
    let git_dir = root.join(".git");

    fs::create_dir_all(git_dir.join("objects")).context("create objects dir")?;
    fs::create_dir_all(git_dir.join("refs/tags")).context("create tags dir")?;
    fs::write(git_dir.join("HEAD"), "ref: refs/heads/master\n").context("write HEAD")?;
    fs::write(
        git_dir.join("config"),
        "[user]\nname = Test User\nemail = test@example.com\n",
    )
    .context("write config")?;

    Repository::load(root)
}

/// Write a loose commit object with the given committer time and return its
/// id. The tree is the well-known empty tree.
pub fn write_commit(repo: &Repository, secs: i64, tz: &str, message: &str) -> Result<String> {
    let ident = format!("A U Thor <author@example.com> {} {}", secs, tz);
    let body = format!(
        "tree 4b825dc642cb6eb9a060e54bf8d69288fbee4904\nauthor {}\ncommitter {}\n\n{}\n",
        ident, ident, message
    );

    repo.write_object(&GitObject::new(Fmt::Commit, body.into_bytes()))
}

/// Point a loose lightweight tag ref at an object id.
pub fn lightweight_tag(repo: &Repository, name: &str, sha: &str) -> Result<()> {
    let path = repo.git_dir.join("refs/tags").join(name);

    fs::write(path, format!("{}\n", sha)).context("write tag ref")?;

    Ok(())
}
