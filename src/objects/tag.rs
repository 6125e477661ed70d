use crate::objects::kvlm::Kvlm;
use crate::objects::GitObjectTrait;
use bytes::Bytes;
use chrono::{DateTime, Local, Offset};

/// An annotated tag object; contains following fields:
///
/// 1. object: the object the tag points to;
/// 2. type: the kind of that object;
/// 3. tag: the name of the tag;
/// 4. tagger: the identity of the person who created the tag;
/// 5. message: the message associated with the tag.
pub struct Tag {
    kvlm: Kvlm,
}

impl Tag {
    impl_kvlm_getter_single! {
        tag,
        object,
        message
    }

    /// Build a new annotated tag pointing at a commit.
    pub fn new(
        tag: String,
        object: String,
        tagger: String,
        time: DateTime<Local>,
        message: String,
    ) -> Self {
        let mut kvlm = Kvlm::default();

        kvlm.insert("object".to_string(), vec![object]);
        kvlm.insert("type".to_string(), vec!["commit".to_string()]);
        kvlm.insert("tag".to_string(), vec![tag]);
        kvlm.insert(
            "tagger".to_string(),
            vec![format!("{} {}", tagger, format_time(&time))],
        );
        kvlm.insert("message".to_string(), vec![message]);

        Self { kvlm }
    }
}

fn format_time(time: &DateTime<Local>) -> String {
    let offset = time.offset().fix().local_minus_utc();

    let hours = offset / 3600;
    let minutes = (offset.abs() % 3600) / 60;

    format!("{} {:>+03}{:02}", time.timestamp(), hours, minutes)
}

impl GitObjectTrait for Tag {
    fn from_bytes(data: Bytes) -> anyhow::Result<Self> {
        let kvlm = Kvlm::parse(data)?;

        anyhow::ensure!(kvlm.contains_key("object"), "missing field object");
        anyhow::ensure!(kvlm.contains_key("type"), "missing field type");
        anyhow::ensure!(kvlm.contains_key("tag"), "missing field tag");

        Ok(Self { kvlm })
    }

    fn serialize(&self) -> anyhow::Result<Bytes> {
        Ok(self.kvlm.serialize())
    }
}
