//! Property-based tests for urlscan using proptest
//!
//! These tests generate random inputs to check the extraction offsets,
//! the purity of content sniffing and that the pipeline neither drops
//! nor duplicates matches.

use async_trait::async_trait;
use proptest::prelude::*;
use std::sync::Arc;
use tokio::sync::mpsc;
use urlscan::discovery::{extract, extract_bytes};
use urlscan::discovery::sniff::{detect_content_type, is_text};
use urlscan::{CheckLink, CheckOutcome, Coordinator, IgnorePattern, Input, Match, WorkerSplit};

/// Generate valid-ish URLs for testing
fn url_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::collection::vec("[a-z]{3,10}", 1..4)
            .prop_map(|parts| format!("https://{}.com", parts.join("."))),
        (r"[a-z]{3,8}", 1024..65535u16)
            .prop_map(|(domain, port)| format!("http://{domain}.org:{port}")),
        (r"[a-z]{3,8}", prop::collection::vec(r"[a-z]{1,8}", 1..4)).prop_map(
            |(domain, path_parts)| format!("https://{domain}.net/{}", path_parts.join("/"))
        ),
        (r"[a-z]{3,8}", r"[a-z]{1,8}", r"[a-z0-9]{1,8}")
            .prop_map(|(domain, key, value)| format!("https://{domain}.io?{key}={value}")),
    ]
}

/// Filler text that can never contain a scheme separator
fn filler_strategy() -> impl Strategy<Value = String> {
    r"[a-zA-Z ,;éü]{0,20}"
}

/// Checker that completes every match without network access
struct EchoChecker;

#[async_trait]
impl CheckLink for EchoChecker {
    async fn check(&self, unchecked: Match) -> Match {
        unchecked.complete(CheckOutcome::Status {
            code: 200,
            text: "200 OK".to_string(),
        })
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_extract_column_points_at_url(
        lines in prop::collection::vec((filler_strategy(), url_strategy(), filler_strategy()), 1..10)
    ) {
        let text: String = lines
            .iter()
            .map(|(before, url, after)| format!("{before} {url} {after}\n"))
            .collect();
        let source_lines: Vec<&str> = text.lines().collect();

        let matches = extract("prop.txt", &text, &IgnorePattern::none());

        prop_assert_eq!(matches.len(), lines.len());
        for (m, (_, url, _)) in matches.iter().zip(&lines) {
            prop_assert_eq!(m.url(), url.as_str());
            let line = source_lines[m.line() - 1];
            prop_assert_eq!(&line[m.column()..m.column() + m.url().len()], m.url());
            prop_assert!(m.result().is_none());
        }
    }

    #[test]
    fn test_extract_never_panics(content in any::<String>()) {
        for m in extract("random", &content, &IgnorePattern::none()) {
            prop_assert!(m.line() >= 1);
            prop_assert!(m.url().contains("://"));
        }
    }

    #[test]
    fn test_extract_bytes_column_indexes_raw_line(
        prefix in prop::collection::vec(any::<u8>().prop_filter("no line break", |b| *b != b'\n' && *b != b'\r'), 0..40),
        url in url_strategy()
    ) {
        let mut raw = prefix.clone();
        raw.push(b' ');
        raw.extend_from_slice(url.as_bytes());
        raw.push(b' ');

        let matches = extract_bytes("raw.txt", &raw, &IgnorePattern::none());

        for m in &matches {
            if !m.url().contains('\u{fffd}') {
                let start = m.column();
                prop_assert_eq!(&raw[start..start + m.url().len()], m.url().as_bytes());
            }
        }
        prop_assert!(matches
            .iter()
            .any(|m| m.url() == url && m.column() == prefix.len() + 1));
    }

    #[test]
    fn test_sniff_is_pure(content in prop::collection::vec(any::<u8>(), 0..2048)) {
        prop_assert_eq!(detect_content_type(&content), detect_content_type(&content));
        prop_assert_eq!(is_text(&content), is_text(&content));
    }

    #[test]
    fn test_sniff_only_reads_prefix(
        prefix in prop::collection::vec(any::<u8>(), 512..600),
        tail in prop::collection::vec(any::<u8>(), 0..256)
    ) {
        let mut longer = prefix.clone();
        longer.extend_from_slice(&tail);

        prop_assert_eq!(
            detect_content_type(&prefix[..512]),
            detect_content_type(&longer)
        );
    }

    #[test]
    fn test_lowercase_prose_is_text(content in r"[a-z][a-z0-9 .,:/\n]{0,400}") {
        // Every signature needs an uppercase letter, a control byte or '<'
        prop_assert!(is_text(content.as_bytes()));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn test_pipeline_emits_every_match_once(
        budget in 1usize..9,
        files in 0usize..6,
        urls_per_file in 0usize..6
    ) {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();

        let inputs: Vec<Input> = (0..files)
            .map(|f| Input::Text {
                name: format!("file{f}"),
                text: (0..urls_per_file)
                    .map(|u| format!("https://example.com/{f}/{u}\n"))
                    .collect::<String>()
                    .into_bytes(),
            })
            .collect();

        let emitted = runtime.block_on(async move {
            let coordinator = Coordinator::new(
                WorkerSplit::from_budget(budget),
                Arc::new(EchoChecker),
                IgnorePattern::none(),
            )
            .with_queue_capacities(2, 1);
            let (tx, mut rx) = mpsc::channel(1);

            let collector = tokio::spawn(async move {
                let mut out = Vec::new();
                while let Some(m) = rx.recv().await {
                    out.push(m);
                }
                out
            });

            coordinator.run(inputs, tx).await.unwrap();
            collector.await.unwrap()
        });

        prop_assert_eq!(emitted.len(), files * urls_per_file);
        let mut keys: Vec<(String, usize)> = emitted
            .iter()
            .map(|m| (m.source().to_string(), m.line()))
            .collect();
        keys.sort();
        keys.dedup();
        prop_assert_eq!(keys.len(), files * urls_per_file);
        prop_assert!(emitted.iter().all(|m| m.is_checked()));
    }
}
