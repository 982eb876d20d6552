use std::time::Duration;

use reqwest::{Client, header::{HeaderMap, HeaderValue, USER_AGENT, ACCEPT, REFERER, ACCEPT_ENCODING}};

/// 创建用于下载 BSE 日终文件的 HTTP 客户端
/// BSE 会拒绝没有浏览器请求头的访问
pub fn create_bhav_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
        ),
    );
    headers.insert(ACCEPT, HeaderValue::from_static("application/zip, application/octet-stream, */*"));
    headers.insert(REFERER, HeaderValue::from_static("https://www.bseindia.com/"));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()
}
