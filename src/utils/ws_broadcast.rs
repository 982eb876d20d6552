use tokio::sync::broadcast;
use serde::{Serialize, Deserialize};

/// 任务状态事件：running / success / partial / failed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusMessage {
    pub job_name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub timestamp: i64,
}

pub type JobStatusSender = broadcast::Sender<JobStatusMessage>;

pub fn create_broadcast_channel() -> JobStatusSender {
    let (tx, _rx) = broadcast::channel(100);
    tx
}

pub fn broadcast_job_status(
    sender: &JobStatusSender,
    job_name: &str,
    status: &str,
    detail: Option<String>,
) {
    let msg = JobStatusMessage {
        job_name: job_name.to_string(),
        status: status.to_string(),
        detail,
        timestamp: chrono::Utc::now().timestamp_millis(),
    };

    // 没有订阅者时 send 返回错误，属于正常情况
    if sender.send(msg).is_err() {
        tracing::debug!("任务状态 {} -> {} 无订阅者", job_name, status);
    } else {
        tracing::debug!("广播任务状态: {} -> {}", job_name, status);
    }
}
