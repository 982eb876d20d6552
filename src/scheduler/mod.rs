pub mod ingest_job;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use futures::future::BoxFuture;
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

pub type ScheduledJob = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// 固定间隔调度：在 `first_run` 首次执行，此后每隔 `interval` 执行一次
pub struct IntervalScheduler {
    inner: JobScheduler,
}

impl IntervalScheduler {
    pub async fn new() -> Result<Self, JobSchedulerError> {
        Ok(Self {
            inner: JobScheduler::new().await?,
        })
    }

    pub async fn start(&self) -> Result<(), JobSchedulerError> {
        self.inner.start().await
    }

    pub async fn shutdown(&mut self) -> Result<(), JobSchedulerError> {
        self.inner.shutdown().await
    }

    pub fn every(
        &self,
        job_name: &'static str,
        interval: Duration,
        first_run: DateTime<Utc>,
        job: ScheduledJob,
    ) -> JoinHandle<()> {
        let scheduler = self.inner.clone();
        tokio::spawn(async move {
            let now = Utc::now();
            let next = next_run_after(first_run, interval, now);
            tracing::info!(
                "任务 {} 下次执行时间 {}（UTC），之后每 {} 秒执行一次",
                job_name,
                next.format("%Y-%m-%d %H:%M:%S"),
                interval.as_secs()
            );
            tokio::time::sleep((next - now).to_std().unwrap_or_default()).await;

            // 重复任务从注册时刻开始计时，本次执行在这里直接触发
            let repeated = job.clone();
            match Job::new_repeated_async(interval, move |_uuid, _l| repeated()) {
                Ok(repeated_job) => {
                    if let Err(e) = scheduler.add(repeated_job).await {
                        tracing::error!("任务 {} 注册失败: {}", job_name, e);
                    }
                }
                Err(e) => tracing::error!("任务 {} 创建失败: {}", job_name, e),
            }
            job().await;
        })
    }
}

/// `first_run + k * interval` 中不早于 `now` 的最小时刻
pub fn next_run_after(first_run: DateTime<Utc>, interval: Duration, now: DateTime<Utc>) -> DateTime<Utc> {
    if now <= first_run {
        return first_run;
    }
    let interval_ms = (interval.as_millis() as i64).max(1);
    let elapsed_ms = (now - first_run).num_milliseconds();
    let periods = (elapsed_ms + interval_ms - 1) / interval_ms;
    first_run + TimeDelta::milliseconds(periods * interval_ms)
}
