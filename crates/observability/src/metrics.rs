//! 遥测分发指标收集模块
//!
//! 记录事件路由、批量落盘、告警与通知的运行指标。

use contracts::Severity;
use metrics::{counter, gauge, histogram};

/// 记录一次 `track` 调用
pub fn record_event_tracked(severity: Severity) {
    counter!("telemetry_events_tracked_total", "severity" => severity.as_str()).increment(1);
}

/// 记录一次批量写入
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_batch_flushed;
///
/// let started = Instant::now();
/// let result = sink.write_batch(&batch).await;
/// record_batch_flushed(batch.len(), started.elapsed().as_secs_f64() * 1000.0, result.is_ok());
/// ```
pub fn record_batch_flushed(batch_size: usize, latency_ms: f64, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!("telemetry_batches_flushed_total", "status" => status).increment(1);
    histogram!("telemetry_batch_size").record(batch_size as f64);
    histogram!("telemetry_flush_latency_ms").record(latency_ms);
    if success {
        counter!("telemetry_records_persisted_total").increment(batch_size as u64);
    }
}

/// 记录丢弃的日志记录 (队列满 / 写入失败)
pub fn record_records_dropped(reason: &'static str, count: usize) {
    counter!("telemetry_records_dropped_total", "reason" => reason).increment(count as u64);
}

/// 记录缓冲区待写入深度
pub fn record_buffer_depth(pending: usize) {
    gauge!("telemetry_buffer_pending").set(pending as f64);
}

/// 记录告警结果 (sent / sampled_out / failed)
pub fn record_alert(outcome: &'static str) {
    counter!("telemetry_alerts_total", "outcome" => outcome).increment(1);
}

/// 记录通知结果 (sent / suppressed / failed)
pub fn record_notification(outcome: &'static str) {
    counter!("telemetry_notifications_total", "outcome" => outcome).increment(1);
}

/// 批量写入统计聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct FlushStatsAggregator {
    /// 批次总数
    pub total_batches: u64,

    /// 失败批次数
    pub failed_batches: u64,

    /// 成功写入的记录数
    pub records_written: u64,

    /// 因写入失败丢弃的记录数
    pub records_lost: u64,

    /// 批次大小统计
    pub batch_size_stats: RunningStats,

    /// 写入延迟统计 (毫秒)
    pub latency_stats: RunningStats,
}

impl FlushStatsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, batch_size: usize, latency_ms: f64, success: bool) {
        self.total_batches += 1;
        if success {
            self.records_written += batch_size as u64;
        } else {
            self.failed_batches += 1;
            self.records_lost += batch_size as u64;
        }
        self.batch_size_stats.push(batch_size as f64);
        self.latency_stats.push(latency_ms);
    }

    /// 生成摘要报告
    pub fn summary(&self) -> FlushSummary {
        FlushSummary {
            total_batches: self.total_batches,
            failed_batches: self.failed_batches,
            records_written: self.records_written,
            records_lost: self.records_lost,
            failure_rate: if self.total_batches > 0 {
                self.failed_batches as f64 / self.total_batches as f64 * 100.0
            } else {
                0.0
            },
            batch_size: StatsSummary::from(&self.batch_size_stats),
            latency_ms: StatsSummary::from(&self.latency_stats),
        }
    }
}

/// 批量写入摘要
#[derive(Debug, Clone, Default)]
pub struct FlushSummary {
    pub total_batches: u64,
    pub failed_batches: u64,
    pub records_written: u64,
    pub records_lost: u64,
    pub failure_rate: f64,
    pub batch_size: StatsSummary,
    pub latency_ms: StatsSummary,
}

impl std::fmt::Display for FlushSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Flush Summary ===")?;
        writeln!(f, "Batches: {}", self.total_batches)?;
        writeln!(
            f,
            "Failed batches: {} ({:.2}%)",
            self.failed_batches, self.failure_rate
        )?;
        writeln!(f, "Records written: {}", self.records_written)?;
        writeln!(f, "Records lost: {}", self.records_lost)?;
        writeln!(f, "Batch size: {}", self.batch_size)?;
        writeln!(f, "Flush latency (ms): {}", self.latency_ms)?;
        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// 最小值
    pub fn min(&self) -> f64 {
        self.min
    }

    /// 最大值
    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = FlushStatsAggregator::new();
        aggregator.update(10, 2.0, true);
        aggregator.update(4, 8.0, false);

        assert_eq!(aggregator.total_batches, 2);
        assert_eq!(aggregator.failed_batches, 1);
        assert_eq!(aggregator.records_written, 10);
        assert_eq!(aggregator.records_lost, 4);

        let summary = aggregator.summary();
        assert!((summary.failure_rate - 50.0).abs() < 1e-10);
        assert!((summary.latency_ms.mean - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = FlushStatsAggregator::new();
        aggregator.update(3, 1.5, true);
        let text = aggregator.summary().to_string();
        assert!(text.contains("Records written: 3"));
        assert!(text.contains("n=1"));
    }

    #[test]
    fn test_empty_summary_display() {
        let summary = FlushStatsAggregator::new().summary();
        assert_eq!(summary.latency_ms.to_string(), "N/A");
    }
}
