//! JsonLinesSource - 每行一个 JSON 事实

use std::path::{Path, PathBuf};

use contracts::{ContractError, Fact, FactSource};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, trace};

use crate::error::{IngestionError, Result};

/// 从 JSON Lines 文件读取事实
///
/// 空行跳过；非 UTF-8 或无法解析的行作为单条错误返回，之后继续读取下一行。
/// 读取 I/O 错误后来源视为耗尽。
pub struct JsonLinesSource {
    name: String,
    path: PathBuf,
    reader: BufReader<File>,
    buf: Vec<u8>,
    line_no: u64,
    finished: bool,
}

impl JsonLinesSource {
    /// 打开文件
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)
            .await
            .map_err(|source| IngestionError::OpenFailed {
                path: path.clone(),
                source,
            })?;

        debug!(path = %path.display(), "json lines source opened");

        Ok(Self {
            name: format!("json_lines:{}", path.display()),
            path,
            reader: BufReader::new(file),
            buf: Vec::new(),
            line_no: 0,
            finished: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FactSource for JsonLinesSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn next_fact(&mut self) -> std::result::Result<Option<Fact>, ContractError> {
        if self.finished {
            return Ok(None);
        }

        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf).await {
                Ok(0) => {
                    self.finished = true;
                    return Ok(None);
                }
                Ok(_) => {}
                Err(e) => {
                    self.finished = true;
                    return Err(ContractError::source_read(
                        &self.name,
                        format!("read failed after line {}: {e}", self.line_no),
                    ));
                }
            }
            self.line_no += 1;

            let line = match std::str::from_utf8(&self.buf) {
                Ok(line) => line,
                Err(e) => {
                    return Err(ContractError::source_read(
                        &self.name,
                        format!("line {}: not valid UTF-8: {e}", self.line_no),
                    ));
                }
            };

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            trace!(line = self.line_no, "json line read");
            return serde_json::from_str(trimmed).map(Some).map_err(|e| {
                ContractError::source_read(
                    &self.name,
                    format!("line {}: invalid fact: {e}", self.line_no),
                )
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FACT_1: &str = r#"{"period_start":"2024-12-01","period_end":"2024-12-31","period_key":"month","indicator_to_mo_id":1,"indicator_to_mo_fact_id":0,"value":1,"fact_time":"2024-12-31","is_plan":0,"auth_user_id":40,"comment":"one"}"#;
    const FACT_2: &str = r#"{"period_start":"2024-12-01","period_end":"2024-12-31","period_key":"month","indicator_to_mo_id":1,"indicator_to_mo_fact_id":0,"value":2,"fact_time":"2024-12-31","is_plan":0,"auth_user_id":40}"#;

    fn write_lines(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn test_reads_facts_and_skips_blank_lines() {
        let file = write_lines(&[FACT_1, "", "   ", FACT_2]);
        let mut source = JsonLinesSource::open(file.path()).await.unwrap();

        let first = source.next_fact().await.unwrap().unwrap();
        assert_eq!(first.value, 1);
        assert_eq!(first.comment, "one");

        let second = source.next_fact().await.unwrap().unwrap();
        assert_eq!(second.value, 2);
        assert!(second.comment.is_empty());

        assert!(source.next_fact().await.unwrap().is_none());
        assert!(source.next_fact().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_line_is_error_then_continues() {
        let file = write_lines(&[FACT_1, "{not json", FACT_2]);
        let mut source = JsonLinesSource::open(file.path()).await.unwrap();

        assert!(source.next_fact().await.unwrap().is_some());

        let err = source.next_fact().await.unwrap_err();
        assert!(matches!(err, ContractError::SourceRead { .. }));
        assert!(err.to_string().contains("line 2"), "got: {err}");

        let next = source.next_fact().await.unwrap().unwrap();
        assert_eq!(next.value, 2);
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_is_error_then_continues() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{FACT_1}").unwrap();
        file.write_all(&[0xFF, 0xFE, b'\n']).unwrap();
        write!(file, "{FACT_2}").unwrap();
        file.flush().unwrap();
        let mut source = JsonLinesSource::open(file.path()).await.unwrap();

        assert_eq!(source.next_fact().await.unwrap().unwrap().value, 1);

        let err = source.next_fact().await.unwrap_err();
        assert!(err.to_string().contains("line 2"), "got: {err}");
        assert!(err.to_string().contains("UTF-8"), "got: {err}");

        // last line has no trailing newline
        assert_eq!(source.next_fact().await.unwrap().unwrap().value, 2);
        assert!(source.next_fact().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = JsonLinesSource::open(dir.path().join("missing.jsonl")).await;
        assert!(matches!(result, Err(IngestionError::OpenFailed { .. })));
    }
}
