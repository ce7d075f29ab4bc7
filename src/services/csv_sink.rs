//! CSV 输出 - 业务能力层
//!
//! 只追加写入：打开时写表头，之后每条记录一行。文件句柄在整个运行期间持有，
//! 每道题结束后刷新，中途失败时已写入的行保留在磁盘上。

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use csv::{Terminator, Writer, WriterBuilder};
use tracing::debug;

use crate::error::{ExtractError, Result};
use crate::models::{StudentAnswerRecord, CSV_HEADER};
use crate::services::block_extractor::normalize_newlines;

pub struct CsvSink<W: Write = File> {
    path: PathBuf,
    writer: Writer<W>,
    rows: usize,
}

impl CsvSink<File> {
    /// 创建（覆盖）输出文件并写入表头，必要时创建上级目录
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ExtractError::sink_open(&path, e))?;
        }
        let file = File::create(&path).map_err(|e| ExtractError::sink_open(&path, e))?;

        let sink = Self::from_writer(path, file)?;
        debug!("输出文件已创建: {}", sink.path.display());
        Ok(sink)
    }
}

impl<W: Write> CsvSink<W> {
    /// 在任意输出上写表头；`path` 只用于错误信息
    pub fn from_writer(path: impl Into<PathBuf>, out: W) -> Result<Self> {
        let mut sink = Self {
            path: path.into(),
            writer: WriterBuilder::new()
                .has_headers(false)
                .terminator(Terminator::Any(b'\n'))
                .from_writer(out),
            rows: 0,
        };
        sink.writer
            .write_record(CSV_HEADER)
            .map_err(|e| ExtractError::sink_write(&sink.path, e))?;
        sink.flush()?;
        Ok(sink)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows_written(&self) -> usize {
        self.rows
    }

    /// 写入一行（字段内换行统一为 `\n`）
    pub fn write(&mut self, record: &StudentAnswerRecord) -> Result<()> {
        let row = StudentAnswerRecord {
            question_number: record.question_number,
            student_id: normalize_newlines(&record.student_id),
            student_label: normalize_newlines(&record.student_label),
            mark: normalize_newlines(&record.mark),
            comment: normalize_newlines(&record.comment),
            student_answer: normalize_newlines(&record.student_answer),
        };
        self.writer
            .serialize(&row)
            .map_err(|e| ExtractError::sink_write(&self.path, e))?;
        self.rows += 1;
        Ok(())
    }

    /// 把缓冲的行写到底层输出
    pub fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| ExtractError::sink_write(&self.path, e.into()))
    }

    /// 刷新并关闭，返回写入的数据行数
    pub fn finish(mut self) -> Result<usize> {
        self.flush()?;
        Ok(self.rows)
    }
}
