//! Integration tests for domainerator

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use domainerator::{
    generator::{combine, is_prohibited},
    AvailabilityCheck, DomaineratorError, GenerateOptions, OutputConfig, OutputFormat, Pipeline,
    PipelineConfig, Progress, ResponseCode, Result, RetryPolicy,
};
use tokio_util::sync::CancellationToken;

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn config(workers: usize, retry: RetryPolicy, avail_only: bool) -> PipelineConfig {
    PipelineConfig {
        workers,
        retry,
        output: OutputConfig {
            format: if avail_only { OutputFormat::Simple } else { OutputFormat::Verbose },
            avail_only,
        },
        progress_interval: 1,
    }
}

/// Answers from a fixed table, NXDOMAIN for anything else
struct TableChecker {
    answers: HashMap<String, ResponseCode>,
}

#[async_trait]
impl AvailabilityCheck for TableChecker {
    async fn check(&self, domain: &str) -> Result<ResponseCode> {
        Ok(self.answers.get(domain).copied().unwrap_or(ResponseCode::NXDomain))
    }
}

/// Fails the first `failures` attempts per domain, then answers NXDOMAIN
struct FlakyChecker {
    failures: u32,
    attempts: Mutex<HashMap<String, u32>>,
}

impl FlakyChecker {
    fn new(failures: u32) -> Self {
        Self {
            failures,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    fn attempts(&self, domain: &str) -> u32 {
        self.attempts.lock().unwrap().get(domain).copied().unwrap_or(0)
    }
}

#[async_trait]
impl AvailabilityCheck for FlakyChecker {
    async fn check(&self, domain: &str) -> Result<ResponseCode> {
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            let count = attempts.entry(domain.to_string()).or_insert(0);
            *count += 1;
            *count
        };
        if attempt <= self.failures {
            Err(DomaineratorError::query(domain, "127.0.0.1:53", "connection refused"))
        } else {
            Ok(ResponseCode::NXDomain)
        }
    }
}

/// Always times out after a short pause
struct DeadChecker {
    calls: AtomicU32,
}

#[async_trait]
impl AvailabilityCheck for DeadChecker {
    async fn check(&self, _domain: &str) -> Result<ResponseCode> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        Err(DomaineratorError::timeout("NS query", 5))
    }
}

/// Counts calls and answers NXDOMAIN
#[derive(Default)]
struct CountingChecker {
    calls: AtomicU32,
}

#[async_trait]
impl AvailabilityCheck for CountingChecker {
    async fn check(&self, _domain: &str) -> Result<ResponseCode> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ResponseCode::NXDomain)
    }
}

#[test]
fn test_scenario_concatenation() {
    let domains = combine(&words(&["go"]), &words(&["lang"]), &words(&["com"]), &GenerateOptions::default());
    assert_eq!(domains, vec!["golang.com"]);
}

#[test]
fn test_scenario_hyphenation() {
    let options = GenerateOptions {
        hyphenate: true,
        ..GenerateOptions::default()
    };
    let domains = combine(&words(&["go"]), &words(&["lang"]), &words(&["com"]), &options);
    let set: HashSet<_> = domains.into_iter().collect();
    assert_eq!(set, HashSet::from(["golang.com".to_string(), "go-lang.com".to_string()]));
}

#[test]
fn test_generator_properties_across_options() {
    let prefixes = words(&["go", "py", "data", "in", "café", "blue-"]);
    let suffixes = words(&["lang", "taxi", "dex", "go", "ex"]);
    let psl = words(&["com", "ex", "io", "co.uk"]);

    for mask in 0u32..128 {
        let options = GenerateOptions {
            include_single_words: mask & 1 != 0,
            hyphenate: mask & 2 != 0,
            include_self_pairing: mask & 4 != 0,
            domain_hacks: mask & 8 != 0,
            fuse: mask & 16 != 0,
            allow_utf8: mask & 32 != 0,
            min_label_length: 4,
            max_domain_length: 12,
            strict: mask & 64 != 0,
        };
        let domains = combine(&prefixes, &suffixes, &psl, &options);

        let unique: HashSet<_> = domains.iter().collect();
        assert_eq!(unique.len(), domains.len(), "duplicates with mask {}", mask);

        let mut sorted = domains.clone();
        sorted.sort();
        assert_eq!(sorted, domains, "unsorted with mask {}", mask);
        assert_eq!(combine(&prefixes, &suffixes, &psl, &options), domains);

        for domain in &domains {
            assert!(domain.chars().count() <= 12, "{} too long", domain);
            if !options.allow_utf8 {
                assert_eq!(domain.chars().count(), domain.len(), "{} is not ascii", domain);
            }
            if !options.hyphenate {
                assert!(!domain.contains('-') || domain.starts_with("blue-"), "{} hyphenated", domain);
            }
            if !options.include_single_words {
                let label = domain.split('.').next().unwrap();
                assert!(label.chars().count() >= 4, "{} label too short", domain);
            }
            if !options.include_self_pairing {
                assert!(!domain.starts_with("gogo."), "{} pairs a word with itself", domain);
            }
            if options.strict {
                assert!(!is_prohibited(domain), "{} has a public suffix as its label", domain);
            }
        }
    }
}

#[tokio::test]
async fn test_retries_until_success() {
    let checker = Arc::new(FlakyChecker::new(3));
    let pipeline = Pipeline::new(checker.clone(), config(2, RetryPolicy::unbounded(), true));

    let mut sink = Vec::new();
    let summary = pipeline.run(words(&["x.com"]), &mut sink, |_| {}).await.unwrap();

    assert_eq!(String::from_utf8(sink).unwrap(), "x.com\n");
    assert_eq!(checker.attempts("x.com"), 4);
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.retried, 3);
    assert!(summary.is_complete());
}

#[tokio::test]
async fn test_retry_attempts_reported() {
    let mut json = config(1, RetryPolicy::unbounded(), false);
    json.output.format = OutputFormat::Json;
    let pipeline = Pipeline::new(Arc::new(FlakyChecker::new(2)), json);

    let mut sink = Vec::new();
    pipeline.run(words(&["x.com"]), &mut sink, |_| {}).await.unwrap();

    let line = String::from_utf8(sink).unwrap();
    let value: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
    assert_eq!(value["attempts"], 3);
    assert_eq!(value["outcome"]["rcode"], "NXDOMAIN");
}

#[tokio::test]
async fn test_avail_mode_writes_only_nxdomain() {
    let checker = TableChecker {
        answers: HashMap::from([("b.com".to_string(), ResponseCode::ServFail)]),
    };
    let pipeline = Pipeline::new(Arc::new(checker), config(3, RetryPolicy::default(), true));

    let mut sink = Vec::new();
    let summary = pipeline
        .run(words(&["a.com", "b.com", "c.com"]), &mut sink, |_| {})
        .await
        .unwrap();

    let output = String::from_utf8(sink).unwrap();
    let mut lines: Vec<_> = output.lines().collect();
    lines.sort();
    assert_eq!(lines, vec!["a.com", "c.com"]);
    assert_eq!(summary.processed, 3);
    assert_eq!(summary.written, 2);
    assert_eq!(summary.available, 2);
}

#[tokio::test]
async fn test_completes_with_any_worker_count() {
    for workers in [1, 2, 10] {
        let pipeline = Pipeline::new(
            Arc::new(TableChecker { answers: HashMap::new() }),
            config(workers, RetryPolicy::default(), false),
        );
        let mut sink = Vec::new();
        let domains = words(&["a.com", "b.com", "c.com"]);

        let summary = tokio::time::timeout(Duration::from_secs(5), pipeline.run(domains, &mut sink, |_| {}))
            .await
            .expect("pipeline deadlocked")
            .unwrap();

        assert_eq!(summary.processed, 3, "workers = {}", workers);
        let output = String::from_utf8(sink).unwrap();
        assert_eq!(output.lines().count(), 3);
        assert!(output.lines().all(|l| l.ends_with("\tNXDOMAIN\t\"\"")));
    }
}

#[tokio::test]
async fn test_every_domain_reported_once() {
    let domains: Vec<String> = (0..200).map(|i| format!("name{}.com", i)).collect();
    let retry = RetryPolicy {
        max_attempts: Some(3),
        base_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(4),
    };
    let pipeline = Pipeline::new(Arc::new(FlakyChecker::new(1)), config(16, retry, false));

    let mut sink = Vec::new();
    let summary = pipeline.run(domains.clone(), &mut sink, |_| {}).await.unwrap();

    let output = String::from_utf8(sink).unwrap();
    let seen: Vec<_> = output.lines().map(|l| l.split('\t').next().unwrap().to_string()).collect();
    let unique: HashSet<_> = seen.iter().cloned().collect();
    assert_eq!(seen.len(), 200);
    assert_eq!(unique, domains.into_iter().collect::<HashSet<_>>());
    assert_eq!(summary.retried, 200);
}

#[tokio::test]
async fn test_bounded_retries_fail_terminally() {
    let checker = Arc::new(DeadChecker { calls: AtomicU32::new(0) });
    let retry = RetryPolicy {
        max_attempts: Some(3),
        base_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(2),
    };
    let pipeline = Pipeline::new(checker.clone(), config(4, retry, false));

    let mut sink = Vec::new();
    let summary = pipeline.run(words(&["x.com"]), &mut sink, |_| {}).await.unwrap();

    assert_eq!(checker.calls.load(Ordering::SeqCst), 3);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.available, 0);
    let output = String::from_utf8(sink).unwrap();
    assert!(output.starts_with("x.com\tFAILED\t\"Timeout error"));
}

#[tokio::test]
async fn test_cancellation_stops_unbounded_retries() {
    let checker = Arc::new(DeadChecker { calls: AtomicU32::new(0) });
    let token = CancellationToken::new();
    let pipeline = Pipeline::new(checker, config(4, RetryPolicy::unbounded(), false))
        .with_cancellation(token.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });

    let mut sink = Vec::new();
    let summary = tokio::time::timeout(
        Duration::from_secs(5),
        pipeline.run(words(&["x.com", "y.com"]), &mut sink, |_| {}),
    )
    .await
    .expect("pipeline ignored cancellation")
    .unwrap();

    tokio_test::assert_ok!(canceller.await);
    assert!(summary.interrupted);
    assert_eq!(summary.processed, 0);
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_no_checks_after_cancellation() {
    let domains: Vec<String> = (0..100).map(|i| format!("name{}.com", i)).collect();

    for _ in 0..20 {
        let checker = Arc::new(CountingChecker::default());
        let token = CancellationToken::new();
        token.cancel();
        let pipeline = Pipeline::new(checker.clone(), config(10, RetryPolicy::default(), false))
            .with_cancellation(token);

        let mut sink = Vec::new();
        let summary = tokio::time::timeout(
            Duration::from_secs(5),
            pipeline.run(domains.clone(), &mut sink, |_| {}),
        )
        .await
        .expect("pipeline ignored cancellation")
        .unwrap();

        assert_eq!(checker.calls.load(Ordering::SeqCst), 0);
        assert!(summary.interrupted);
        assert_eq!(summary.processed, 0);
        assert!(sink.is_empty());
    }
}

#[tokio::test]
async fn test_progress_reaches_total() {
    let progress: Mutex<Vec<Progress>> = Mutex::new(Vec::new());
    let pipeline = Pipeline::new(
        Arc::new(TableChecker { answers: HashMap::new() }),
        config(2, RetryPolicy::default(), true),
    );

    let mut sink = Vec::new();
    pipeline
        .run(words(&["a.com", "b.com", "c.com"]), &mut sink, |p| progress.lock().unwrap().push(p.clone()))
        .await
        .unwrap();

    let progress = progress.into_inner().unwrap();
    let last = progress.last().unwrap();
    assert!(last.is_complete());
    assert_eq!(last.available, 3);
    assert!(last.estimated_total.is_some());
    assert!(progress.windows(2).all(|w| w[0].processed <= w[1].processed));
}

struct BrokenSink;

impl tokio::io::AsyncWrite for BrokenSink {
    fn poll_write(
        self: std::pin::Pin<&mut Self>,
        _cx: &mut std::task::Context<'_>,
        _buf: &[u8],
    ) -> std::task::Poll<std::io::Result<usize>> {
        std::task::Poll::Ready(Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "broken pipe")))
    }

    fn poll_flush(self: std::pin::Pin<&mut Self>, _cx: &mut std::task::Context<'_>) -> std::task::Poll<std::io::Result<()>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: std::pin::Pin<&mut Self>, _cx: &mut std::task::Context<'_>) -> std::task::Poll<std::io::Result<()>> {
        std::task::Poll::Ready(Ok(()))
    }
}

#[tokio::test]
async fn test_write_failure_aborts_run() {
    let domains: Vec<String> = (0..50).map(|i| format!("name{}.com", i)).collect();
    let pipeline = Pipeline::new(
        Arc::new(TableChecker { answers: HashMap::new() }),
        config(4, RetryPolicy::default(), true),
    );

    let mut sink = BrokenSink;
    let err = tokio::time::timeout(Duration::from_secs(5), pipeline.run(domains, &mut sink, |_| {}))
        .await
        .expect("pipeline hung after write failure")
        .unwrap_err();
    assert!(matches!(err, DomaineratorError::OutputWrite { .. }));
    assert_eq!(err.exit_code(), 41);
}
