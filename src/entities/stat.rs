//! Passive filesystem metadata attached to a [`FileEntry`](super::FileEntry)
//!
//! **Why**: Directory scans can collect `stat` info once and carry it along with
//! each entry, so listings can be reported (size, times) without touching disk again.
//! Offline listings can build a `Stat` by hand from previously captured values.
//!
//! **Used by**: scan (directory walker), report (CSV columns)
//!
//! Grouping logic never reads these fields.

use serde::{Deserialize, Serialize};
use std::fs::Metadata;
use std::time::{SystemTime, UNIX_EPOCH};

/// Mirror of the POSIX `stat` record. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stat {
    pub size: Option<u64>,
    pub inode: Option<u64>,
    pub nlink: Option<u64>,
    pub dev: Option<u64>,
    pub mode: Option<u32>,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    pub ctime: Option<f64>, // Unix seconds
    pub mtime: Option<f64>,
    pub atime: Option<f64>,
}

impl Stat {
    /// Stat with only a size, handy for offline listings
    pub fn with_size(size: u64) -> Self {
        Self {
            size: Some(size),
            ..Default::default()
        }
    }

    /// Look up a field by its `stat_order` name
    pub fn field(&self, name: &str) -> Option<StatValue> {
        match name {
            "size" => self.size.map(StatValue::Int),
            "inode" => self.inode.map(StatValue::Int),
            "nlink" => self.nlink.map(StatValue::Int),
            "dev" => self.dev.map(StatValue::Int),
            "mode" => self.mode.map(|v| StatValue::Int(v as u64)),
            "uid" => self.uid.map(|v| StatValue::Int(v as u64)),
            "gid" => self.gid.map(|v| StatValue::Int(v as u64)),
            "ctime" => self.ctime.map(StatValue::Time),
            "mtime" => self.mtime.map(StatValue::Time),
            "atime" => self.atime.map(StatValue::Time),
            _ => None,
        }
    }
}

/// Single stat column value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatValue {
    Int(u64),
    Time(f64),
}

fn unix_secs(time: std::io::Result<SystemTime>) -> Option<f64> {
    let time = time.ok()?;
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => Some(d.as_secs_f64()),
        Err(e) => Some(-e.duration().as_secs_f64()),
    }
}

impl From<&Metadata> for Stat {
    fn from(meta: &Metadata) -> Self {
        #[allow(unused_mut)]
        let mut stat = Self {
            size: Some(meta.len()),
            mtime: unix_secs(meta.modified()),
            atime: unix_secs(meta.accessed()),
            ctime: unix_secs(meta.created()),
            ..Default::default()
        };

        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            stat.inode = Some(meta.ino());
            stat.nlink = Some(meta.nlink());
            stat.dev = Some(meta.dev());
            stat.mode = Some(meta.mode());
            stat.uid = Some(meta.uid());
            stat.gid = Some(meta.gid());
            // POSIX ctime is inode change time, not creation time
            stat.ctime = Some(meta.ctime() as f64 + meta.ctime_nsec() as f64 / 1e9);
        }

        stat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_lookup() {
        let stat = Stat {
            size: Some(42),
            mode: Some(0o644),
            mtime: Some(1.5),
            ..Default::default()
        };

        assert_eq!(stat.field("size"), Some(StatValue::Int(42)));
        assert_eq!(stat.field("mode"), Some(StatValue::Int(0o644)));
        assert_eq!(stat.field("mtime"), Some(StatValue::Time(1.5)));
        assert_eq!(stat.field("atime"), None);
        assert_eq!(stat.field("bogus"), None);
    }

    #[test]
    fn test_from_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plate.0001.exr");
        std::fs::write(&path, b"12345").unwrap();

        let meta = std::fs::metadata(&path).unwrap();
        let stat = Stat::from(&meta);

        assert_eq!(stat.size, Some(5));
        assert!(stat.mtime.is_some());
        #[cfg(unix)]
        assert_eq!(stat.nlink, Some(1));
    }
}
