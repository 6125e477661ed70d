use crate::objects::commit::Commit;
use crate::objects::tag::Tag;
use crate::objects::{Fmt, GitObject, GitObjectTrait};
use crate::utils::sha;
use anyhow::Context;
use bytes::Bytes;
use indexmap::IndexMap;
use std::fs;
use std::io::{Read, Write};
use std::ops::Deref;
use std::path::PathBuf;

/// A git repository opened for tag migration.
///
/// This is the only type that touches repository storage: everything above it
/// works on plain [`crate::plan::TagRecord`] values.
pub struct Repository {
    pub work_tree: PathBuf,
    pub git_dir: PathBuf,
    pub config: RepoConfig,
}

#[derive(Debug)]
pub struct RepoConfig(configparser::ini::Ini);

impl RepoConfig {
    pub fn user(&self) -> Option<String> {
        let name = self.get("user", "name")?;
        let email = self.get("user", "email")?;

        Some(format!("{} <{}>", name, email))
    }
}

impl Deref for RepoConfig {
    type Target = configparser::ini::Ini;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self(configparser::ini::Ini::new())
    }
}

impl Repository {
    /// Load a repository at path.
    pub fn load(working_dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let working_dir = working_dir.into();
        let git_dir = working_dir.join(".git");

        anyhow::ensure!(
            git_dir.is_dir(),
            "not a git repository: {}",
            working_dir.display()
        );

        let mut config = configparser::ini::Ini::new();
        let config_path = git_dir.join("config");

        if config_path.exists() {
            config
                .load(config_path)
                .map_err(|e| anyhow::anyhow!(e))
                .context("failed to read repository config")?;
        }

        Ok(Self {
            work_tree: working_dir,
            git_dir,
            config: RepoConfig(config),
        })
    }

    /// List every tag reference as (short name, target object id).
    ///
    /// Merges `packed-refs` entries with loose refs; a loose ref shadows a
    /// packed one of the same name.
    pub fn list_tags(&self) -> anyhow::Result<IndexMap<String, String>> {
        let mut dict = self.packed_tags()?;

        let tags_dir = self.git_dir.join("refs").join("tags");
        if !tags_dir.exists() {
            return Ok(dict);
        }

        for entry in walkdir::WalkDir::new(&tags_dir) {
            let entry =
                entry.context(format!("failed to read tag refs: {}", tags_dir.display()))?;
            if entry.file_type().is_dir() {
                continue;
            }

            let path = entry.path();
            let name = path
                .strip_prefix(&tags_dir)
                .unwrap() // the walk root is a parent of every entry
                .to_str()
                .context("invalid ref name")?
                .to_string();

            let data = fs::read_to_string(path)
                .context(format!("failed to read ref file: {}", path.display()))?;

            dict.insert(name, data.trim_end().to_string());
        }

        Ok(dict)
    }

    fn packed_tags(&self) -> anyhow::Result<IndexMap<String, String>> {
        let mut dict = IndexMap::new();

        let path = self.git_dir.join("packed-refs");
        if !path.exists() {
            return Ok(dict);
        }

        let data = fs::read_to_string(&path).context("failed to read packed-refs")?;

        for line in data.lines() {
            // '#' starts the header, '^' carries the peeled commit of the
            // annotated tag on the previous line
            if line.starts_with('#') || line.starts_with('^') {
                continue;
            }
            let Some((sha, name)) = line.split_once(' ') else {
                continue;
            };
            if let Some(short) = name.strip_prefix("refs/tags/") {
                dict.insert(short.to_string(), sha.to_string());
            }
        }

        Ok(dict)
    }

    pub fn read_object(&self, sha: &str) -> anyhow::Result<GitObject> {
        anyhow::ensure!(is_object_id(sha), "invalid object id: {}", sha);

        let path = self.git_dir.join("objects").join(&sha[..2]).join(&sha[2..]);

        anyhow::ensure!(path.exists(), "object not found: {}", sha);

        let file = fs::File::open(&path)?;

        let mut data = Vec::new();
        flate2::bufread::ZlibDecoder::new(std::io::BufReader::new(file))
            .read_to_end(&mut data)
            .context("failed to read zlib data")?;

        GitObject::from_bytes(Bytes::from(data))
    }

    /// write object to disk
    ///
    /// returns sha of object
    pub fn write_object(&self, object: &GitObject) -> anyhow::Result<String> {
        let data = object.serialize();

        let sha = sha(&data);

        let path = self.git_dir.join("objects").join(&sha[..2]).join(&sha[2..]);

        if path.exists() {
            return Ok(sha);
        }

        fs::create_dir_all(
            path.parent()
                .context(format!("failed to get path parent: {}", path.display()))?,
        )?;

        let file = fs::File::create(&path)?;

        let mut encoder = flate2::write::ZlibEncoder::new(file, flate2::Compression::default());

        encoder
            .write_all(&data)
            .context("failed to write zlib data")?;

        encoder.finish().context("failed to write zlib data")?;

        Ok(sha)
    }

    /// Resolve an object id to the commit it points at, peeling annotated tag
    /// objects along the way.
    ///
    /// Returns the peeled commit id together with the parsed commit.
    pub fn resolve_commit(&self, sha: &str) -> anyhow::Result<(String, Commit)> {
        let mut sha = sha.to_string();
        let mut depth = 0;

        loop {
            anyhow::ensure!(depth < 10, "too many levels of tag indirection");

            let object = self.read_object(&sha)?;

            match object.header.fmt {
                Fmt::Commit => return Ok((sha, Commit::from_bytes(object.data)?)),
                Fmt::Tag => {
                    let tag = Tag::from_bytes(object.data)?;
                    sha = tag
                        .object()
                        .context("tag object missing object field")?
                        .clone();
                }
                fmt => anyhow::bail!("object {} is a {}, not a commit", sha, fmt.to_str()),
            }

            depth += 1;
        }
    }

    /// Fetch the annotated tag object at `sha`.
    ///
    /// Returns `Ok(None)` when `sha` is some other object kind; lightweight
    /// tags point straight at their commit, so absence is a normal outcome.
    pub fn resolve_annotated_tag(&self, sha: &str) -> anyhow::Result<Option<Tag>> {
        let object = self.read_object(sha)?;

        if object.header.fmt != Fmt::Tag {
            return Ok(None);
        }

        Ok(Some(Tag::from_bytes(object.data)?))
    }

    pub fn tag_exists(&self, name: &str) -> anyhow::Result<bool> {
        if self.git_dir.join("refs").join("tags").join(name).exists() {
            return Ok(true);
        }

        Ok(self.packed_tags()?.contains_key(name))
    }

    /// Create an annotated tag `name` pointing at `commit_sha`.
    ///
    /// Fails if a tag of that name already exists, loose or packed.
    pub fn create_tag(&self, name: &str, commit_sha: &str, message: &str) -> anyhow::Result<()> {
        anyhow::ensure!(!self.tag_exists(name)?, "tag already exists: {}", name);

        let tag = Tag::new(
            name.to_string(),
            commit_sha.to_string(),
            self.tagger(),
            chrono::Local::now(),
            message.to_string(),
        );

        let object = GitObject::new(Fmt::Tag, tag.serialize()?.to_vec());
        let tag_sha = self.write_object(&object)?;

        let path = self.git_dir.join("refs").join("tags").join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("failed to create ref directory")?;
        }

        fs::write(&path, format!("{}\n", tag_sha))
            .context(format!("failed to write ref file: {}", path.display()))?;

        Ok(())
    }

    /// Delete the tag reference `name`.
    ///
    /// A ref can exist loose and packed at the same time; both forms are
    /// removed, otherwise the packed entry would resurface on the next
    /// listing.
    pub fn delete_tag(&self, name: &str) -> anyhow::Result<()> {
        let path = self.git_dir.join("refs").join("tags").join(name);

        let loose = path.is_file();
        if loose {
            fs::remove_file(&path)
                .context(format!("failed to remove ref file: {}", path.display()))?;
        }

        let packed = self.remove_packed_tag(name)?;

        anyhow::ensure!(loose || packed, "tag not found: {}", name);

        Ok(())
    }

    /// Strip `name` from packed-refs; returns whether an entry was removed.
    fn remove_packed_tag(&self, name: &str) -> anyhow::Result<bool> {
        let path = self.git_dir.join("packed-refs");

        if !path.exists() {
            return Ok(false);
        }

        let data = fs::read_to_string(&path).context("failed to read packed-refs")?;
        let full_name = format!("refs/tags/{}", name);

        let mut kept = Vec::new();
        let mut found = false;
        let mut skip_peel = false;

        for line in data.lines() {
            if skip_peel && line.starts_with('^') {
                skip_peel = false;
                continue;
            }
            skip_peel = false;

            if line.split_once(' ').is_some_and(|(_, n)| n == full_name) {
                found = true;
                skip_peel = true;
                continue;
            }

            kept.push(line);
        }

        if !found {
            return Ok(false);
        }

        let mut out = kept.join("\n");
        out.push('\n');

        fs::write(&path, out).context("failed to write packed-refs")?;

        Ok(true)
    }

    /// Tagger identity for new tag objects.
    ///
    /// Read from git config (global files, then the repository's own config),
    /// with a fixed fallback so apply stays best-effort on repositories with
    /// no configured user.
    pub fn tagger(&self) -> String {
        self.read_config()
            .ok()
            .and_then(|config| config.user())
            .unwrap_or_else(|| "retag <retag@localhost>".to_string())
    }

    pub fn read_config(&self) -> anyhow::Result<RepoConfig> {
        let mut config = configparser::ini::Ini::new();

        let user_home = dirs::home_dir().context("failed to get home directory")?;

        let config_dir = if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(xdg_config_home)
        } else {
            user_home.join(".config")
        };

        let config_files = [
            config_dir.join("git/config"),
            user_home.join(".gitconfig"),
            self.git_dir.join("config"),
        ];

        for config_file in config_files {
            if config_file.exists() {
                config
                    .load_and_append(config_file)
                    .map_err(|e| anyhow::anyhow!(e))?;
            }
        }

        Ok(RepoConfig(config))
    }
}

fn is_object_id(sha: &str) -> bool {
    sha.len() == 40 && sha.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_id_shape() {
        assert!(is_object_id(&"a1".repeat(20)));
        assert!(!is_object_id("a1b2"));
        assert!(!is_object_id(&"zz".repeat(20)));
        assert!(!is_object_id("ref: refs/heads/master"));
    }
}
