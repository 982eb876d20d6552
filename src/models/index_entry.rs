//! 自动补全索引条目的编码与解码
//!
//! 条目格式 `name:code:open:high:low:close`，按字节字典序排序。
//! 价格字段保留文件中的原始文本（去掉首尾空白），`10.00` 不会被改写成 `10`。
//!
//! - `V1`：线上已有数据使用的格式，`low` 与 `close` 之间缺少分隔符，
//!   实际产出为 `name:code:open:high{low}:close`。在确认原意之前保持原样。
//! - `V2`：补齐分隔符的格式。
//!
//! 两个版本的 `name`、`code` 位置相同，查询路径只解码这两个字段。

use std::fmt;
use std::str::FromStr;

pub const ENTRY_DELIMITER: char = ':';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryFormat {
    #[default]
    V1,
    V2,
}

impl FromStr for EntryFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" | "1" => Ok(EntryFormat::V1),
            "v2" | "2" => Ok(EntryFormat::V2),
            other => Err(format!("未知的索引条目格式: {other}")),
        }
    }
}

impl fmt::Display for EntryFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryFormat::V1 => write!(f, "v1"),
            EntryFormat::V2 => write!(f, "v2"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixIndexEntry {
    pub name: String,
    pub code: i64,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
}

impl PrefixIndexEntry {
    pub fn encode(&self, format: EntryFormat) -> String {
        let d = ENTRY_DELIMITER;
        match format {
            EntryFormat::V1 => format!(
                "{}{d}{}{d}{}{d}{}{}{d}{}",
                self.name, self.code, self.open, self.high, self.low, self.close
            ),
            EntryFormat::V2 => format!(
                "{}{d}{}{d}{}{d}{}{d}{}{d}{}",
                self.name, self.code, self.open, self.high, self.low, self.close
            ),
        }
    }
}

/// 查询路径解码出的展示字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedEntry {
    pub name: String,
    pub code: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    MissingCode,
    InvalidCode(String),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::MissingCode => write!(f, "缺少 code 字段"),
            DecodeError::InvalidCode(v) => write!(f, "code 字段不是整数: {v}"),
        }
    }
}

/// 只按前两个分隔符切分，价格部分不解析
pub fn decode_entry(member: &str) -> Result<DecodedEntry, DecodeError> {
    let mut parts = member.splitn(3, ENTRY_DELIMITER);
    let name = parts.next().unwrap_or_default().to_string();
    let raw_code = parts.next().ok_or(DecodeError::MissingCode)?;
    let code = raw_code
        .parse::<i64>()
        .map_err(|_| DecodeError::InvalidCode(raw_code.to_string()))?;
    Ok(DecodedEntry { name, code })
}
