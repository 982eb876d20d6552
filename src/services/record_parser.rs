use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use csv::{ReaderBuilder, Trim};
use thiserror::Error;

use crate::models::{NewStockRecord, PrefixIndexEntry};
use crate::services::error::StockServiceError;

pub const COL_CODE: &str = "SC_CODE";
pub const COL_NAME: &str = "SC_NAME";
pub const COL_OPEN: &str = "OPEN";
pub const COL_HIGH: &str = "HIGH";
pub const COL_LOW: &str = "LOW";
pub const COL_CLOSE: &str = "CLOSE";
pub const COL_PREV_CLOSE: &str = "PREVCLOSE";
pub const COL_VOLUME: &str = "NO_OF_SHRS";

/// 一行原始数据：列名 -> 字符串值
pub type RawRow = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("line {line}: invalid {field} {value:?}: {reason}")]
pub struct ParseError {
    pub line: u64,
    pub field: String,
    pub value: String,
    pub reason: String,
}

impl ParseError {
    fn new(line: u64, field: &str, value: &str, reason: impl Into<String>) -> Self {
        Self {
            line,
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// 校验通过的一行：入库记录与对应的索引条目
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecord {
    pub line: u64,
    pub record: NewStockRecord,
    pub entry: PrefixIndexEntry,
}

#[derive(Debug, Default)]
pub struct ParsedRows {
    pub total: usize,
    pub records: Vec<ParsedRecord>,
    pub errors: Vec<ParseError>,
}

/// 读取 CSV 为原始行。单行读取失败只记为该行的错误
pub fn read_rows(content: &[u8]) -> Result<Vec<Result<(u64, RawRow), ParseError>>, StockServiceError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content);

    let headers = reader
        .headers()
        .map_err(|e| StockServiceError::MalformedArchive(format!("CSV 表头读取失败: {e}")))?
        .clone();

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        // 表头占第 1 行
        let fallback_line = index as u64 + 2;
        match result {
            Ok(record) => {
                let line = record.position().map(|p| p.line()).unwrap_or(fallback_line);
                let row: RawRow = headers
                    .iter()
                    .zip(record.iter())
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect();
                rows.push(Ok((line, row)));
            }
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(fallback_line);
                rows.push(Err(ParseError::new(line, "<row>", "", e.to_string())));
            }
        }
    }
    Ok(rows)
}

pub fn parse_row(line: u64, row: &RawRow) -> Result<NewStockRecord, ParseError> {
    let code: i64 = parse_field(line, row, COL_CODE)?;

    let name = field(line, row, COL_NAME)?;
    if name.is_empty() {
        return Err(ParseError::new(line, COL_NAME, name, "name must not be empty"));
    }

    let open = parse_price(line, row, COL_OPEN)?;
    let high = parse_price(line, row, COL_HIGH)?;
    let low = parse_price(line, row, COL_LOW)?;
    let close = parse_price(line, row, COL_CLOSE)?;
    let prev_close = parse_price(line, row, COL_PREV_CLOSE)?;

    let volume: i64 = parse_field(line, row, COL_VOLUME)?;
    if volume < 0 {
        return Err(ParseError::new(
            line,
            COL_VOLUME,
            &volume.to_string(),
            "volume must not be negative",
        ));
    }

    Ok(NewStockRecord {
        code,
        name: name.to_string(),
        open,
        high,
        low,
        close,
        prev_close,
        volume,
    })
}

/// 索引条目的价格取文件中的原始文本，只对校验通过的行调用
pub fn index_entry(row: &RawRow, record: &NewStockRecord) -> PrefixIndexEntry {
    let raw = |name: &str| row.get(name).cloned().unwrap_or_default();
    PrefixIndexEntry {
        name: record.name.clone(),
        code: record.code,
        open: raw(COL_OPEN),
        high: raw(COL_HIGH),
        low: raw(COL_LOW),
        close: raw(COL_CLOSE),
    }
}

/// 读取并校验整份文件，返回成功的记录与逐行错误
pub fn parse_rows(content: &[u8]) -> Result<ParsedRows, StockServiceError> {
    let mut parsed = ParsedRows::default();
    for row in read_rows(content)? {
        parsed.total += 1;
        let result = row.and_then(|(line, raw)| {
            parse_row(line, &raw).map(|record| ParsedRecord {
                line,
                entry: index_entry(&raw, &record),
                record,
            })
        });
        match result {
            Ok(parsed_record) => parsed.records.push(parsed_record),
            Err(e) => parsed.errors.push(e),
        }
    }
    Ok(parsed)
}

fn field<'a>(line: u64, row: &'a RawRow, name: &str) -> Result<&'a str, ParseError> {
    row.get(name)
        .map(String::as_str)
        .ok_or_else(|| ParseError::new(line, name, "", "missing column"))
}

fn parse_field<T>(line: u64, row: &RawRow, name: &str) -> Result<T, ParseError>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = field(line, row, name)?;
    raw.parse::<T>()
        .map_err(|e| ParseError::new(line, name, raw, e.to_string()))
}

fn parse_price(line: u64, row: &RawRow, name: &str) -> Result<f64, ParseError> {
    let value: f64 = parse_field(line, row, name)?;
    if !value.is_finite() {
        return Err(ParseError::new(line, name, &value.to_string(), "price must be finite"));
    }
    Ok(value)
}
