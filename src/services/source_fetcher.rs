use std::io::{Cursor, Read};

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use zip::ZipArchive;

use crate::services::error::StockServiceError;

/// 日终文件名格式：`<prefix><DDMMYY>_CSV.ZIP`
pub fn daily_file_url(prefix: &str, date: NaiveDate) -> String {
    format!("{}{}_CSV.ZIP", prefix, date.format("%d%m%y"))
}

/// 日终文件来源，返回压缩包内唯一的 CSV 文件内容
#[async_trait]
pub trait DailyFileSource: Send + Sync {
    async fn fetch_daily_file(&self, url: &str) -> Result<Vec<u8>, StockServiceError>;
}

pub struct HttpDailyFileSource {
    client: Client,
}

impl HttpDailyFileSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DailyFileSource for HttpDailyFileSource {
    async fn fetch_daily_file(&self, url: &str) -> Result<Vec<u8>, StockServiceError> {
        tracing::info!("下载日终文件: {}", url);
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(StockServiceError::FetchFailed(format!(
                "HTTP 状态 {} ({})",
                status.as_u16(),
                url
            )));
        }
        let body = resp.bytes().await?;
        tracing::debug!("日终文件下载完成，大小 {} 字节", body.len());
        extract_single_file(&body)
    }
}

/// 预分配上限，压缩包头里声明的大小不可信
const MAX_CAPACITY_HINT: u64 = 16 * 1024 * 1024;

fn capacity_hint(declared_size: u64) -> usize {
    declared_size.min(MAX_CAPACITY_HINT) as usize
}

/// 解压只包含一个文件的压缩包，目录项不计入
pub fn extract_single_file(archive_bytes: &[u8]) -> Result<Vec<u8>, StockServiceError> {
    let mut archive = ZipArchive::new(Cursor::new(archive_bytes))?;

    let mut file_indices = Vec::new();
    for i in 0..archive.len() {
        if archive.by_index(i)?.is_file() {
            file_indices.push(i);
        }
    }

    let index = match file_indices.as_slice() {
        [only] => *only,
        [] => {
            return Err(StockServiceError::MalformedArchive(
                "archive contains no file".to_string(),
            ))
        }
        many => {
            return Err(StockServiceError::MalformedArchive(format!(
                "archive contains {} files, expected exactly one",
                many.len()
            )))
        }
    };

    let mut entry = archive.by_index(index)?;
    tracing::debug!("解压文件: {}", entry.name());
    let mut content = Vec::with_capacity(capacity_hint(entry.size()));
    entry
        .read_to_end(&mut content)
        .map_err(|e| StockServiceError::MalformedArchive(e.to_string()))?;
    Ok(content)
}
