use crate::error::StoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::io::{ErrorKind, Write};
use std::path::Path;

/// Content hash of a persisted store file.
///
/// Surfaces remember the fingerprint of what they last wrote or loaded so a
/// change notification caused by their own save can be told apart from an
/// edit made by another process.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(bytes: &[u8]) -> Self {
        Fingerprint(hex::encode(Sha256::digest(bytes)))
    }

    /// Fingerprint the current contents of `path`, `None` when it cannot be
    /// read.
    pub fn of_file(path: &Path) -> Option<Self> {
        std::fs::read(path).ok().map(|bytes| Self::of(&bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Outcome of loading a line-delimited store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Number of records accepted.
    pub records: usize,
    /// 1-based line numbers that failed to parse and were skipped.
    pub skipped: Vec<usize>,
    /// The file did not exist (or could not be read) and the store is empty.
    pub missing: bool,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

pub(crate) struct JsonlRead<T> {
    pub records: Vec<T>,
    pub report: LoadReport,
    pub fingerprint: Option<Fingerprint>,
}

impl<T> JsonlRead<T> {
    fn empty() -> Self {
        Self {
            records: Vec::new(),
            report: LoadReport {
                missing: true,
                ..LoadReport::default()
            },
            fingerprint: None,
        }
    }
}

/// Read every record of `path`. A missing or unreadable file yields an empty
/// result, malformed lines (bad JSON or bad UTF-8) are logged and skipped
/// individually.
pub(crate) fn read_jsonl<T: DeserializeOwned>(path: &Path) -> JsonlRead<T> {
    let content = match std::fs::read(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return JsonlRead::empty(),
        Err(source) => {
            let err = StoreError::Read {
                path: path.to_path_buf(),
                source,
            };
            tracing::warn!(error = %err, "treating unreadable store as empty");
            return JsonlRead::empty();
        }
    };
    let mut read = parse_jsonl(path, &content);
    read.fingerprint = Some(Fingerprint::of(&content));
    read
}

fn parse_jsonl<T: DeserializeOwned>(path: &Path, content: &[u8]) -> JsonlRead<T> {
    let mut records = Vec::new();
    let mut skipped = Vec::new();
    for (idx, line) in content.split(|b| *b == b'\n').enumerate() {
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        match serde_json::from_slice::<T>(line) {
            Ok(record) => records.push(record),
            Err(source) => {
                let err = StoreError::Parse {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    source,
                };
                tracing::warn!(error = %err, "skipping malformed record");
                skipped.push(idx + 1);
            }
        }
    }
    JsonlRead {
        report: LoadReport {
            records: records.len(),
            skipped,
            missing: false,
        },
        records,
        fingerprint: None,
    }
}

/// Serialize `records` one JSON object per line and atomically replace
/// `path` with the result. Returns the fingerprint of the bytes written.
pub(crate) fn write_jsonl<'a, T, I>(path: &Path, records: I) -> Result<Fingerprint, StoreError>
where
    T: Serialize + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut buf = Vec::new();
    for record in records {
        serde_json::to_writer(&mut buf, record)
            .map_err(|e| StoreError::write(path, e.into()))?;
        buf.push(b'\n');
    }
    write_atomic(path, &buf)?;
    Ok(Fingerprint::of(&buf))
}

/// Write `bytes` to a temporary file next to `path` and rename it into place
/// so readers never observe a partially written file.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| StoreError::write(path, e))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| StoreError::write(path, e))?;
    tmp.write_all(bytes).map_err(|e| StoreError::write(path, e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| StoreError::write(path, e))?;
    tmp.persist(path).map_err(|e| StoreError::write(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Row {
        id: String,
    }

    #[test]
    fn malformed_lines_are_skipped_individually() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("rows.jsonl");
        std::fs::write(&path, "{\"id\":\"a\"}\nnot json\n\n{\"id\":\"b\"}\n{\"nope\":1}\n")
            .expect("write");

        let read: JsonlRead<Row> = read_jsonl(&path);
        let ids: Vec<_> = read.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(read.report.skipped, vec![2, 5]);
        assert!(!read.report.missing);
        assert!(read.fingerprint.is_some());
    }

    #[test]
    fn invalid_utf8_only_drops_its_line() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("rows.jsonl");
        let mut bytes = b"{\"id\":\"a\"}\r\n".to_vec();
        bytes.extend_from_slice(b"{\"id\":\"\xff\"}\n");
        bytes.extend_from_slice(b"{\"id\":\"b\"}");
        std::fs::write(&path, &bytes).expect("write");

        let read: JsonlRead<Row> = read_jsonl(&path);
        let ids: Vec<_> = read.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(read.report.skipped, vec![2]);
        assert_eq!(read.fingerprint, Some(Fingerprint::of(&bytes)));
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempdir().expect("tempdir");
        let read: JsonlRead<Row> = read_jsonl(&dir.path().join("absent.jsonl"));
        assert!(read.records.is_empty());
        assert!(read.report.missing);
        assert!(read.fingerprint.is_none());
    }

    #[test]
    fn write_leaves_only_target_file_with_trailing_newline() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("rows.jsonl");
        let rows = vec![Row { id: "x".into() }, Row { id: "y".into() }];

        let fp = write_jsonl(&path, &rows).expect("write");
        let content = std::fs::read_to_string(&path).expect("read back");
        assert_eq!(content, "{\"id\":\"x\"}\n{\"id\":\"y\"}\n");
        assert_eq!(Fingerprint::of_file(&path), Some(fp));

        let entries = std::fs::read_dir(path.parent().unwrap()).expect("list").count();
        assert_eq!(entries, 1);
    }
}
