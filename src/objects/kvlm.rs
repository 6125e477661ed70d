use anyhow::Context;
use bytes::{BufMut, Bytes, BytesMut};
use indexmap::IndexMap;
use std::ops::{Deref, DerefMut};

/// A key-value list with message, the body format shared by commit and tag
/// objects. Header values may span lines; continuation lines start with a
/// space. The message follows the first blank line and is stored under the
/// synthetic key `message`.
#[derive(Default)]
pub struct Kvlm {
    pub dict: IndexMap<String, Vec<String>>,
}

impl Kvlm {
    pub fn parse(raw: Bytes) -> anyhow::Result<Self> {
        let mut dict = IndexMap::<String, Vec<String>>::new();
        let mut pos = 0usize;

        while pos < raw.len() && raw[pos] != b'\n' {
            let space = raw[pos..]
                .iter()
                .position(|&b| b == b' ')
                .map(|i| pos + i)
                .context("malformed header: missing space")?;
            let key = String::from_utf8_lossy(&raw[pos..space]).to_string();

            let mut value = BytesMut::new();
            let mut cursor = space + 1;
            loop {
                let newline = raw[cursor..]
                    .iter()
                    .position(|&b| b == b'\n')
                    .map(|i| cursor + i)
                    .context("malformed header: missing newline")?;
                value.extend_from_slice(&raw[cursor..newline]);

                if raw.get(newline + 1) == Some(&b' ') {
                    // continuation line
                    value.put_u8(b'\n');
                    cursor = newline + 2;
                } else {
                    pos = newline + 1;
                    break;
                }
            }

            let value = String::from_utf8_lossy(&value).to_string();
            dict.entry(key).or_default().push(value);
        }

        anyhow::ensure!(pos < raw.len(), "malformed object: missing message separator");

        let message = String::from_utf8_lossy(&raw[pos + 1..]).to_string();
        dict.entry("message".to_string()).or_default().push(message);

        Ok(Kvlm { dict })
    }

    pub fn serialize(&self) -> Bytes {
        let mut data = BytesMut::new();

        for (key, values) in self.dict.iter().filter(|(k, _)| **k != "message") {
            for value in values {
                data.extend_from_slice(key.as_bytes());
                data.put_u8(b' ');
                for byte in value.as_bytes() {
                    data.put_u8(*byte);
                    if *byte == b'\n' {
                        data.put_u8(b' ');
                    }
                }
                data.put_u8(b'\n');
            }
        }

        data.put_u8(b'\n');

        if let Some(message) = self.dict.get("message").and_then(|v| v.first()) {
            data.extend_from_slice(message.as_bytes());
        }

        data.into()
    }

    /// get a single value of a key
    ///
    /// returns None if the key does not exist or the key has multiple values
    pub fn get_single(&self, key: &str) -> Option<&String> {
        let values = self.dict.get(key)?;
        if values.len() != 1 {
            return None;
        }
        values.first()
    }

    pub fn get(&self, key: &str) -> Option<&Vec<String>> {
        self.dict.get(key)
    }
}

impl Deref for Kvlm {
    type Target = IndexMap<String, Vec<String>>;

    fn deref(&self) -> &Self::Target {
        &self.dict
    }
}

impl DerefMut for Kvlm {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.dict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tag_object() {
        let raw = Bytes::from_static(
            b"object 29ff16c9c14e2652b22f8b78bb08a5a07930c147
type commit
tag release
tagger someone <someone@example.com> 1718000000 +0200

first cut
",
        );

        let kvlm = Kvlm::parse(raw.clone()).unwrap();

        assert_eq!(
            kvlm.get("object").unwrap(),
            &vec!["29ff16c9c14e2652b22f8b78bb08a5a07930c147"]
        );
        assert_eq!(kvlm.get("type").unwrap(), &vec!["commit"]);
        assert_eq!(kvlm.get("tag").unwrap(), &vec!["release"]);
        assert_eq!(kvlm.get("message").unwrap(), &vec!["first cut\n"]);

        assert_eq!(kvlm.serialize(), raw);
    }

    #[test]
    fn parse_continuation_lines_and_repeated_keys() {
        let raw = Bytes::from_static(
            b"tree 1b2e5dbb8500b4f307e9dcd96b9f78089c52e1eb
parent 70a4a69f733f3b34879a4dcf80e551a5037fb7ce
parent 4a551e80632b4326b9e85e26ba07ab5b39e74292
gpgsig line one
 line two

merge it",
        );

        let kvlm = Kvlm::parse(raw.clone()).unwrap();

        assert_eq!(kvlm.get("parent").unwrap().len(), 2);
        assert_eq!(kvlm.get("gpgsig").unwrap(), &vec!["line one\nline two"]);
        assert_eq!(kvlm.get_single("gpgsig").unwrap(), "line one\nline two");
        assert!(kvlm.get_single("parent").is_none());
        assert_eq!(kvlm.get("message").unwrap(), &vec!["merge it"]);

        assert_eq!(kvlm.serialize(), raw);
    }

    #[test]
    fn rejects_headers_without_message() {
        let raw = Bytes::from_static(b"object 29ff16c9\n");

        assert!(Kvlm::parse(raw).is_err());
    }
}
