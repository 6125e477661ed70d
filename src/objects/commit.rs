use crate::objects::kvlm::Kvlm;
use crate::objects::GitObjectTrait;
use anyhow::Context;
use bytes::Bytes;
use chrono::{DateTime, FixedOffset};

/// A commit object; contains following fields:
///
/// Zero, one or more parents;
///
/// An author identity (name and email), and a timestamp;
///
/// A committer identity (name and email), and a timestamp;
///
/// A message;
pub struct Commit {
    kvlm: Kvlm,
}

impl Commit {
    impl_kvlm_getter_single! {
        committer
    }

    /// Committer time, kept in the timezone it was recorded with.
    pub fn committer_time(&self) -> anyhow::Result<DateTime<FixedOffset>> {
        let committer = self.committer().context("commit missing committer field")?;

        parse_ident_time(committer).context("invalid committer time")
    }
}

/// Parse the trailing `<unix-secs> <±hhmm>` of an identity line like
/// `A U Thor <author@example.com> 1672876800 +0800`.
fn parse_ident_time(ident: &str) -> anyhow::Result<DateTime<FixedOffset>> {
    let mut fields = ident.rsplitn(3, ' ');

    let tz = fields.next().context("missing timezone")?;
    let secs = fields
        .next()
        .context("missing timestamp")?
        .parse::<i64>()
        .context("invalid timestamp")?;

    // git does not validate this field, so it can hold arbitrary bytes;
    // the ascii check keeps the byte slicing below from panicking
    anyhow::ensure!(tz.len() == 5 && tz.is_ascii(), "invalid timezone: {}", tz);

    let sign = match &tz[..1] {
        "+" => 1,
        "-" => -1,
        _ => anyhow::bail!("invalid timezone: {}", tz),
    };
    let hours = tz[1..3].parse::<i32>().context("invalid timezone")?;
    let minutes = tz[3..5].parse::<i32>().context("invalid timezone")?;

    let offset = FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .context("timezone out of range")?;

    let time = DateTime::from_timestamp(secs, 0).context("timestamp out of range")?;

    Ok(time.with_timezone(&offset))
}

impl GitObjectTrait for Commit {
    fn from_bytes(bytes: Bytes) -> anyhow::Result<Self> {
        Ok(Commit {
            kvlm: Kvlm::parse(bytes)?,
        })
    }

    fn serialize(&self) -> anyhow::Result<Bytes> {
        Ok(self.kvlm.serialize())
    }
}
