pub mod commit;
pub mod kvlm;
pub mod tag;

use anyhow::Context;
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// A loose git object, framed as `<fmt> <length>\0<data>`.
#[derive(Debug)]
pub struct GitObject {
    pub header: Header,
    pub data: Bytes,
}

#[derive(Debug)]
pub struct Header {
    pub fmt: Fmt,
    pub length: usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Fmt {
    Commit,
    Tree,
    Blob,
    Tag,
}

impl Fmt {
    pub fn to_str(&self) -> &str {
        match self {
            Fmt::Commit => "commit",
            Fmt::Tree => "tree",
            Fmt::Blob => "blob",
            Fmt::Tag => "tag",
        }
    }

    pub fn from_str(fmt: &str) -> anyhow::Result<Fmt> {
        match fmt {
            "commit" => Ok(Fmt::Commit),
            "tree" => Ok(Fmt::Tree),
            "blob" => Ok(Fmt::Blob),
            "tag" => Ok(Fmt::Tag),
            _ => anyhow::bail!("unknown object type: {}", fmt),
        }
    }
}

impl GitObject {
    pub fn new(fmt: Fmt, data: Vec<u8>) -> GitObject {
        let length = data.len();

        let header = Header { fmt, length };

        GitObject {
            header,
            data: data.into(),
        }
    }

    /// Parse the decompressed bytes of a loose object.
    pub fn from_bytes(mut data: Bytes) -> anyhow::Result<GitObject> {
        let space = data
            .iter()
            .position(|&b| b == b' ')
            .context("failed to split object fmt")?;
        let nul = data
            .iter()
            .position(|&b| b == b'\0')
            .context("failed to split object length")?;

        anyhow::ensure!(space < nul, "malformed object header");

        let fmt = std::str::from_utf8(&data[..space]).context("failed to parse object fmt")?;
        let fmt = Fmt::from_str(fmt)?;

        let length = std::str::from_utf8(&data[space + 1..nul])
            .context("failed to parse object length")?
            .parse::<usize>()
            .context("failed to parse object length")?;

        data.advance(nul + 1);

        anyhow::ensure!(data.len() == length, "object length mismatch");

        let header = Header { fmt, length };

        Ok(GitObject { header, data })
    }

    pub fn serialize(&self) -> Bytes {
        let mut data = BytesMut::new();

        data.extend_from_slice(self.header.fmt.to_str().as_bytes());
        data.put_u8(b' ');
        data.extend_from_slice(self.header.length.to_string().as_bytes());
        data.put_u8(b'\0');
        data.extend_from_slice(&self.data);

        data.into()
    }
}

pub trait GitObjectTrait {
    fn from_bytes(data: Bytes) -> anyhow::Result<Self>
    where
        Self: Sized;
    fn serialize(&self) -> anyhow::Result<Bytes>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framing_roundtrip() {
        let object = GitObject::new(Fmt::Tag, b"object abc\n".to_vec());

        let parsed = GitObject::from_bytes(object.serialize()).unwrap();

        assert_eq!(parsed.header.fmt, Fmt::Tag);
        assert_eq!(parsed.header.length, 11);
        assert_eq!(&parsed.data[..], b"object abc\n");
    }

    #[test]
    fn rejects_length_mismatch() {
        let data = Bytes::from_static(b"blob 5\0abc");

        assert!(GitObject::from_bytes(data).is_err());
    }
}
