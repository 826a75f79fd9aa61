//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 配置文件 -> Dispatcher -> sinks 的端到端测试
//! - 并发调用与关闭语义

#[cfg(test)]
mod contract_tests {
    use contracts::{RawEvent, Severity};

    #[test]
    fn test_contracts_compile() {
        // 验证 contracts crate 可编译
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_raw_event_wire_shape() {
        let raw: RawEvent = serde_json::from_str(
            r#"{"category":"AUTH","action":"login","message":"ok","severity":"Warning","context":{"ip":"10.0.0.1"}}"#,
        )
        .unwrap();
        assert_eq!(raw.severity.parse::<Severity>().unwrap(), Severity::Warning);
        assert_eq!(raw.context.unwrap()["ip"], "10.0.0.1");
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{LogRecord, RawEvent, RoutingRules, Severity, TelemetryConfig, TelemetryEvent};
    use dispatcher::{create_dispatcher, DispatcherBuilder, MemorySink, PreferenceHandle, Sampler};
    use tokio::net::UdpSocket;

    fn event(category: &str, severity: Severity) -> TelemetryEvent {
        TelemetryEvent::new(category, "test", format!("{category} {severity}"), severity)
    }

    /// End-to-end test: TOML config -> create_dispatcher -> file + network sinks
    ///
    /// 验证完整的数据流：
    /// 1. ConfigLoader 解析并验证配置
    /// 2. Dispatcher 按 severity 分类
    /// 3. 持久化记录写入 JSON-lines 文件，告警/通知通过 UDP 发出
    #[tokio::test]
    async fn test_e2e_config_to_file_and_network() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("events.jsonl");
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = receiver.local_addr().unwrap();

        let toml = format!(
            r#"
[routing]
min_severity_for_persist = "info"
min_severity_for_alert = "error"
min_severity_for_toast = "critical"
alert_sample_rate = 1.0

[batch]
batch_size = 2
flush_interval_ms = 60000

[sinks.persist]
name = "disk"
sink_type = "file"
params = {{ path = '{}' }}

[sinks.alert]
name = "tracker"
sink_type = "network"
params = {{ addr = "{}" }}
"#,
            log_path.display(),
            addr
        );
        let config = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
        let dispatcher = create_dispatcher(config, PreferenceHandle::default())
            .await
            .unwrap();

        dispatcher.track(event("AUTH", Severity::Info));
        dispatcher.track(event("UPLOAD", Severity::Error));
        dispatcher.track(event("AUTH", Severity::Success));

        let mut buf = vec![0u8; 4096];
        let n = tokio::time::timeout(Duration::from_secs(2), receiver.recv(&mut buf))
            .await
            .unwrap()
            .unwrap();
        let alert: serde_json::Value = serde_json::from_slice(&buf[..n]).unwrap();
        assert_eq!(alert["kind"], "alert");
        assert_eq!(alert["severity"], "error");
        assert_eq!(alert["message"], "UPLOAD error");

        let report = dispatcher.shutdown().await;
        assert_eq!(report.metrics.events_tracked, 3);
        assert_eq!(report.metrics.alerts_sent, 1);
        assert_eq!(report.metrics.notifications_sent, 0);
        let flush = report.flush.unwrap();
        assert_eq!(flush.total_batches, 2);
        assert_eq!(flush.records_written, 3);

        let content = std::fs::read_to_string(&log_path).unwrap();
        let records: Vec<LogRecord> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        let severities: Vec<Severity> = records.iter().map(|r| r.severity).collect();
        assert_eq!(
            severities,
            vec![Severity::Info, Severity::Error, Severity::Success]
        );
    }

    #[tokio::test]
    async fn test_e2e_preferences_file() {
        let dir = tempfile::tempdir().unwrap();
        let prefs_path = dir.path().join("prefs.json");
        std::fs::write(
            &prefs_path,
            r#"{"do_not_disturb": false, "categories": {"MARKETING": false}}"#,
        )
        .unwrap();

        let prefs = ConfigLoader::load_preferences_from_path(&prefs_path).unwrap();
        let notify = MemorySink::new("notify");
        let dispatcher = DispatcherBuilder::new(TelemetryConfig::with_rules(RoutingRules::default()))
            .notification_sink(Arc::new(notify.clone()))
            .preferences(PreferenceHandle::new(prefs))
            .build()
            .unwrap();

        dispatcher.track(event("MARKETING", Severity::Critical));
        dispatcher.track(event("AUTH", Severity::Warning));

        let delivered = notify.notifications();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].category, "AUTH");
        assert!(delivered[0].channels.desktop);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_track_loses_nothing() {
        let persist = MemorySink::new("persist");
        let mut config = TelemetryConfig::with_rules(RoutingRules::default());
        config.batch.batch_size = 7;
        config.batch.flush_interval_ms = 20;

        let dispatcher = Arc::new(
            DispatcherBuilder::new(config)
                .persistent_sink(persist.clone())
                .build()
                .unwrap(),
        );

        let mut tasks = Vec::new();
        for worker in 0..8 {
            let dispatcher = Arc::clone(&dispatcher);
            tasks.push(tokio::spawn(async move {
                for i in 0..50 {
                    dispatcher.track(
                        TelemetryEvent::new("LOAD", format!("w{worker}"), i.to_string(), Severity::Info),
                    );
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let dispatcher = Arc::into_inner(dispatcher).unwrap();
        let report = dispatcher.shutdown().await;
        assert_eq!(report.metrics.records_persisted, 400);
        assert_eq!(persist.records().len(), 400);
        assert!(persist.batches().iter().all(|b| b.len() <= 7));

        // Per-producer order survives batching
        for worker in 0..8 {
            let action = format!("w{worker}");
            let seq: Vec<u32> = persist
                .records()
                .iter()
                .filter(|r| r.action == action)
                .map(|r| r.message.parse().unwrap())
                .collect();
            assert_eq!(seq, (0..50).collect::<Vec<_>>());
        }
    }

    #[tokio::test]
    async fn test_timer_flush_without_drain() {
        let persist = MemorySink::new("persist");
        let mut config = TelemetryConfig::with_rules(RoutingRules::default());
        config.batch.batch_size = 100;
        config.batch.flush_interval_ms = 30;

        let dispatcher = DispatcherBuilder::new(config)
            .persistent_sink(persist.clone())
            .build()
            .unwrap();

        dispatcher.log_activity("open", "dashboard opened");
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(persist.batches().len(), 1);
        assert_eq!(dispatcher.metrics().pending, 0);
    }

    #[tokio::test]
    async fn test_failed_persistence_alerts_once() {
        let persist = MemorySink::new("persist");
        let alert = MemorySink::new("alert");
        persist.fail_writes(true);

        let mut config = TelemetryConfig::with_rules(RoutingRules::default());
        config.batch.batch_size = 3;
        let dispatcher = DispatcherBuilder::new(config)
            .persistent_sink(persist.clone())
            .alert_sink(Arc::new(alert.clone()))
            .sampler(Sampler::seeded(1.0, 9))
            .build()
            .unwrap();

        for _ in 0..3 {
            dispatcher.track(event("AUTH", Severity::Info));
        }
        assert_eq!(dispatcher.drain().await.unwrap(), 0);

        let alerts = alert.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Severity::Critical);
        assert!(persist.records().is_empty());

        let report = dispatcher.shutdown().await;
        assert_eq!(report.metrics.records_lost, 3);
        assert_eq!(report.flush.unwrap().failed_batches, 1);
    }

    #[tokio::test]
    async fn test_track_raw_end_to_end() {
        let persist = MemorySink::new("persist");
        let alert = MemorySink::new("alert");
        let dispatcher = DispatcherBuilder::new(TelemetryConfig::with_rules(RoutingRules::default()))
            .persistent_sink(persist.clone())
            .alert_sink(Arc::new(alert.clone()))
            .build()
            .unwrap();

        let lines = [
            r#"{"category":"DB","action":"query","message":"timeout","severity":"CRITICAL"}"#,
            r#"{"category":"DB","action":"query","message":"odd","severity":"panic"}"#,
        ];
        for line in lines {
            dispatcher.track_raw(serde_json::from_str::<RawEvent>(line).unwrap());
        }
        dispatcher.drain().await.unwrap();

        assert_eq!(alert.alerts().len(), 1);
        assert_eq!(alert.alerts()[0].message, "timeout");
        // critical record, anomaly self-report, info-routed record
        assert_eq!(persist.records().len(), 3);
    }
}
