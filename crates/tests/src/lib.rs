//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 配置合约测试
//! - 队列 / 关闭协调 / 生产者 / 投递器的端到端场景
//! - 本地假 HTTP 端点上的投递测试

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{ConfigVersion, SinkType, SourceType};
    use std::time::Duration;

    const FULL_CONFIG: &str = r#"
[queue]
capacity = 1000

[producer]
source = "synthetic"
count = 10
interval_ms = 0
comment_prefix = "buffer test"
[producer.template]
period_start = "2024-12-01"
period_end = "2024-12-31"
period_key = "month"
indicator_to_mo_id = 227373
indicator_to_mo_fact_id = 0
fact_time = "2024-12-31"
is_plan = 0
auth_user_id = 40

[sink]
name = "kpi"
sink_type = "http"
delivery_timeout_ms = 10000
[sink.params]
url = "https://example.invalid/_api/facts/save_fact"

[shutdown]
drain_grace_ms = 0
stop_when_exhausted = false
"#;

    #[test]
    fn test_documented_config_loads() {
        let bp = ConfigLoader::load_from_str(FULL_CONFIG, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.version, ConfigVersion::V1);
        assert_eq!(bp.queue.capacity, 1000);
        assert_eq!(bp.producer.source, SourceType::Synthetic);
        assert_eq!(bp.producer.template.auth_user_id, 40);
        assert_eq!(bp.sink.sink_type, SinkType::Http);
        assert_eq!(bp.sink.delivery_timeout(), Duration::from_secs(10));
        assert!(bp.shutdown.drain_grace().is_none());
    }

    #[test]
    fn test_config_survives_json_round_trip() {
        let bp = ConfigLoader::load_from_str(FULL_CONFIG, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&bp).unwrap();
        let back = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(back.producer.template, bp.producer.template);
        assert_eq!(back.sink.params, bp.sink.params);
    }
}

#[cfg(test)]
mod queue_scenarios {
    use contracts::{FactEnvelope, FactSource, FactTemplate};
    use dispatcher::{DispatchExit, Dispatcher, DispatcherConfig, LogSink};
    use fact_queue::{BoundedQueue, CancellationToken, Dequeued, DropReason, Enqueue};
    use ingestion::SyntheticSource;

    async fn envelopes(n: u64) -> Vec<FactEnvelope> {
        let mut source = SyntheticSource::new(FactTemplate::default(), "buffer test", n);
        let mut out = Vec::new();
        let mut seq = 0;
        while let Some(fact) = source.next_fact().await.unwrap() {
            seq += 1;
            out.push(FactEnvelope::new(seq, fact));
        }
        out
    }

    /// C=2: A, B accepted; C dropped; A, B dequeued; close; Closed
    #[tokio::test]
    async fn test_capacity_two_scenario() {
        let queue = BoundedQueue::new(2).unwrap();
        let token = CancellationToken::new();
        let mut facts = envelopes(3).await.into_iter();

        assert_eq!(queue.try_enqueue(facts.next().unwrap()), Enqueue::Accepted);
        assert_eq!(queue.try_enqueue(facts.next().unwrap()), Enqueue::Accepted);
        assert_eq!(
            queue.try_enqueue(facts.next().unwrap()),
            Enqueue::Dropped(DropReason::Full)
        );

        for expected in 1..=2u64 {
            match queue.dequeue(&token).await {
                Dequeued::Item(envelope) => {
                    assert_eq!(envelope.seq, expected);
                    assert_eq!(envelope.fact.comment, format!("buffer test {expected}"));
                }
                other => panic!("expected item {expected}, got {other:?}"),
            }
        }

        assert!(queue.close());
        assert!(matches!(queue.dequeue(&token).await, Dequeued::Closed));
    }

    /// 5 buffered, no consumer yet, cancellation first: nothing delivered
    #[tokio::test]
    async fn test_cancel_with_five_queued_abandons_them() {
        let queue = BoundedQueue::new(10).unwrap();
        for envelope in envelopes(5).await {
            assert!(queue.try_enqueue(envelope).is_accepted());
        }

        let cancel = CancellationToken::new();
        cancel.cancel();

        let sink = LogSink::new("log");
        let report = Dispatcher::new(sink, queue.clone(), cancel, DispatcherConfig::default())
            .run()
            .await;

        assert_eq!(report.exit, DispatchExit::Cancelled);
        assert_eq!(report.delivered, 0);
        assert_eq!(report.failed, 0);
        assert_eq!(report.abandoned, 5);
        assert_eq!(report.summary.total_attempts, 0);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{Fact, FactEnvelope, FactSource, FactTemplate, SinkConfig, SinkType};
    use dispatcher::{create_sink, DispatchExit, Dispatcher, DispatcherConfig};
    use fact_queue::{BoundedQueue, DropReason, Enqueue};
    use ingestion::{Producer, ProducerExit, ProducerSettings, SyntheticSource};
    use lifecycle::{DrainPolicy, ShutdownCoordinator, ShutdownReason, ShutdownState};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn sink_config(sink_type: SinkType, params: HashMap<String, String>) -> SinkConfig {
        SinkConfig {
            name: "e2e".to_string(),
            sink_type,
            delivery_timeout_ms: 2000,
            params,
        }
    }

    /// End-to-end: SyntheticSource -> BoundedQueue -> Dispatcher -> FileSink
    ///
    /// 来源耗尽后触发关闭，宽限期内排空队列，文件中按顺序写入全部事实。
    #[tokio::test]
    async fn test_e2e_synthetic_to_file_drains_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("facts.jsonl");

        let queue = BoundedQueue::<FactEnvelope>::new(16).unwrap();
        let coordinator = Arc::new(ShutdownCoordinator::new(
            queue.clone(),
            DrainPolicy::Drain {
                grace: Duration::from_secs(2),
            },
        ));

        let sink = create_sink(
            &sink_config(
                SinkType::File,
                HashMap::from([("path".to_string(), path.display().to_string())]),
            ),
            None,
        )
        .await
        .unwrap();

        let listener = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move {
                coordinator
                    .listen(std::future::pending::<ShutdownReason>())
                    .await
            })
        };

        let dispatch = Dispatcher::new(
            sink,
            queue.clone(),
            coordinator.dispatch_token(),
            DispatcherConfig::default(),
        )
        .spawn();

        let source = SyntheticSource::new(FactTemplate::default(), "buffer test", 10);
        let producer = Producer::new(source, queue, coordinator.intake_token())
            .stop_when_exhausted(Arc::clone(&coordinator));
        let produced = tokio::spawn(producer.run());

        let report = tokio::time::timeout(Duration::from_secs(5), dispatch)
            .await
            .expect("dispatcher never finished")
            .unwrap();
        let produced = produced.await.unwrap();
        assert!(coordinator.complete());
        listener.await.unwrap();

        assert_eq!(produced.exit, ProducerExit::Exhausted);
        assert_eq!(produced.accepted, 10);
        assert_eq!(report.exit, DispatchExit::Drained);
        assert_eq!(report.delivered, 10);
        assert_eq!(coordinator.reason(), Some(ShutdownReason::SourceExhausted));
        assert_eq!(coordinator.state(), ShutdownState::Complete);

        let content = std::fs::read_to_string(&path).unwrap();
        let comments: Vec<String> = content
            .lines()
            .map(|line| serde_json::from_str::<Fact>(line).unwrap().comment)
            .collect();
        let expected: Vec<String> = (1..=10).map(|i| format!("buffer test {i}")).collect();
        assert_eq!(comments, expected);
    }

    /// Signal mid-run under Abandon: producer stops, queue refuses new facts
    #[tokio::test]
    async fn test_signal_stops_slow_producer_and_closes_intake() {
        let queue = BoundedQueue::<FactEnvelope>::new(8).unwrap();
        let coordinator = Arc::new(ShutdownCoordinator::new(
            queue.clone(),
            DrainPolicy::Abandon,
        ));

        let listener = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move {
                coordinator
                    .listen(async {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        ShutdownReason::Signal
                    })
                    .await
            })
        };

        let sink = create_sink(&sink_config(SinkType::Log, HashMap::new()), None)
            .await
            .unwrap();
        let dispatch = Dispatcher::new(
            sink,
            queue.clone(),
            coordinator.dispatch_token(),
            DispatcherConfig::default(),
        )
        .spawn();

        let source = SyntheticSource::new(FactTemplate::default(), "buffer test", 1_000);
        let producer = Producer::new(source, queue.clone(), coordinator.intake_token())
            .with_settings(ProducerSettings {
                interval: Some(Duration::from_millis(10)),
            });
        let produced = tokio::spawn(producer.run());

        let report = tokio::time::timeout(Duration::from_secs(2), dispatch)
            .await
            .expect("dispatcher ignored the signal")
            .unwrap();
        let produced = produced.await.unwrap();
        coordinator.complete();
        listener.await.unwrap();

        assert_eq!(coordinator.reason(), Some(ShutdownReason::Signal));
        assert_eq!(report.exit, DispatchExit::Cancelled);
        assert_eq!(produced.exit, ProducerExit::Cancelled);
        assert!(produced.produced < 1_000);
        assert_eq!(
            report.delivered + report.failed + report.abandoned,
            produced.accepted
        );

        let mut late_source = SyntheticSource::new(FactTemplate::default(), "late", 1);
        let late = late_source.next_fact().await.unwrap().unwrap();
        assert_eq!(
            queue.try_enqueue(FactEnvelope::new(9_999, late)),
            Enqueue::Dropped(DropReason::Closed)
        );
    }

    /// Answer each connection with one response; 500 when the form carries `value=2`
    async fn kpi_endpoint() -> (String, Arc<std::sync::Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/_api/facts/save_fact", listener.local_addr().unwrap());
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));

        let log = Arc::clone(&seen);
        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                let log = Arc::clone(&log);
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let mut chunk = [0u8; 2048];
                    let request = loop {
                        let n = stream.read(&mut chunk).await.unwrap_or(0);
                        if n == 0 {
                            break String::from_utf8_lossy(&buf).to_string();
                        }
                        buf.extend_from_slice(&chunk[..n]);
                        let text = String::from_utf8_lossy(&buf).to_string();
                        if let Some(end) = text.find("\r\n\r\n") {
                            let length = text[..end]
                                .lines()
                                .find_map(|l| {
                                    l.to_ascii_lowercase()
                                        .strip_prefix("content-length:")
                                        .and_then(|v| v.trim().parse::<usize>().ok())
                                })
                                .unwrap_or(0);
                            if buf.len() >= end + 4 + length {
                                break text;
                            }
                        }
                    };

                    let (status, body) = if request.contains("value=2&") {
                        (500, "rejected")
                    } else {
                        (200, "ok")
                    };
                    log.lock().unwrap().push(request);
                    let response = format!(
                        "HTTP/1.1 {status} Status\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        (url, seen)
    }

    /// End-to-end over HTTP: a rejected fact does not stop the next one
    #[tokio::test]
    async fn test_e2e_http_failure_isolation() {
        let (url, seen) = kpi_endpoint().await;

        let queue = BoundedQueue::<FactEnvelope>::new(8).unwrap();
        let coordinator = Arc::new(ShutdownCoordinator::new(
            queue.clone(),
            DrainPolicy::Drain {
                grace: Duration::from_secs(5),
            },
        ));

        let sink = create_sink(
            &sink_config(SinkType::Http, HashMap::from([("url".to_string(), url)])),
            Some("e2e-token".into()),
        )
        .await
        .unwrap();
        let dispatch = Dispatcher::new(
            sink,
            queue.clone(),
            coordinator.dispatch_token(),
            DispatcherConfig::default(),
        )
        .spawn();

        let source = SyntheticSource::new(FactTemplate::default(), "buffer test", 3);
        let produced = Producer::new(source, queue, coordinator.intake_token())
            .stop_when_exhausted(Arc::clone(&coordinator))
            .run()
            .await;
        assert_eq!(produced.accepted, 3);

        let report = tokio::time::timeout(Duration::from_secs(10), dispatch)
            .await
            .expect("dispatcher never drained")
            .unwrap();
        coordinator.complete();

        assert_eq!(report.exit, DispatchExit::Drained);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.summary.rejected, 1);

        let requests = seen.lock().unwrap();
        assert_eq!(requests.len(), 3);
        assert!(requests
            .iter()
            .all(|r| r.to_ascii_lowercase().contains("authorization: bearer e2e-token")));
    }
}
