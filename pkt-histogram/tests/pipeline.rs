use pkt_histogram::report::find_histogram;
use pkt_histogram::{Aggregator, Error, Extractor, Histogram, Record, Stage, stage};
use std::future::pending;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader, ReadBuf};
use tokio::sync::oneshot;

/// A source whose every read fails.
struct FailingSource;

impl AsyncRead for FailingSource {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::other("device gone")))
    }
}

async fn run_to_end<S: Stage>(stage: S, input: &str) -> Vec<Record> {
    let mut out = Vec::new();
    stage::run(stage, input.as_bytes(), &mut out, pending())
        .await
        .unwrap();
    String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|l| Record::decode(l).unwrap())
        .collect()
}

fn histograms(records: Vec<Record>) -> Vec<Histogram> {
    records
        .into_iter()
        .map(|r| match r {
            Record::Histogram(h) => h,
            other => panic!("unexpected {} record", other.kind()),
        })
        .collect()
}

fn latency_lines(values: &[i64]) -> String {
    values
        .iter()
        .map(|v| {
            format!(r#"{{"type":"latency","object":{{"latency-user-hw":{v},"latency-user-user":{v}}}}}"#)
                + "\n"
        })
        .collect()
}

#[tokio::test]
async fn extractor_emits_microsecond_latencies() {
    let input = concat!(
        r#"{"type":"rx-packet","object":{"sequence-number":1,"tx-user-timestamp":"2024-03-01T10:00:00.000000000","rx-hw-timestamp":"2024-03-01T10:00:00.001500000","rx-user-timestamp":"2024-03-01T10:00:00.002000000"}}"#,
        "\n",
        r#"{"type":"rx-error","object":{"dropped-packets":2,"sequence-error":true}}"#,
        "\n",
        r#"{"type":"rx-packet","object":{"tx-user-timestamp":"2024-03-01T10:00:00Z","rx-user-timestamp":"2024-03-01T10:00:00Z"}}"#,
        "\n",
        "not a record\n",
        r#"{"type":"something-else","object":{}}"#,
        "\n",
    );

    let records = run_to_end(Extractor, input).await;
    assert_eq!(records.len(), 1);
    let Record::Latency(sample) = &records[0] else {
        panic!("expected a latency record");
    };
    assert_eq!(sample.user_hw, 1500);
    assert_eq!(sample.user_user, 2000);
}

#[tokio::test]
async fn empty_input_yields_one_empty_histogram() {
    let records = histograms(run_to_end(Aggregator::new(0), "").await);
    assert_eq!(records, vec![Histogram::new()]);
}

#[tokio::test]
async fn window_of_two_over_five_samples() {
    let input = latency_lines(&[1, 2, 3, 4, 5]);
    let counts: Vec<u64> = histograms(run_to_end(Aggregator::new(2), &input).await)
        .iter()
        .map(Histogram::count)
        .collect();
    assert_eq!(counts, vec![2, 2, 1]);
}

#[tokio::test]
async fn exact_window_still_flushes_at_end() {
    let input = latency_lines(&[1, 2, 3, 4]);
    let counts: Vec<u64> = histograms(run_to_end(Aggregator::new(2), &input).await)
        .iter()
        .map(Histogram::count)
        .collect();
    assert_eq!(counts, vec![2, 2, 0]);
}

#[tokio::test]
async fn unwindowed_flushes_once() {
    let values: Vec<i64> = (-10..500).collect();
    let out = histograms(run_to_end(Aggregator::new(0), &latency_lines(&values)).await);
    assert_eq!(out.len(), 1);
    let h = &out[0];
    assert_eq!(h.count(), 510);
    assert_eq!(h.time_error(), 10);
    assert_eq!(h.outliers(), 400);
    assert_eq!(h.in_range(), 100);
    assert_eq!(h.min(), Some(-10));
    assert_eq!(h.max(), Some(499));
}

#[tokio::test]
async fn malformed_lines_are_invisible() {
    let mut input = latency_lines(&[42]);
    input.push_str("{\"type\":\"latency\"}\n");
    input.push_str("{\"type\":\"latency\",\"object\":{\"latency-user-hw\":1.5}}\n");
    input.push_str("\n\n{{{\n");
    input.push_str(&latency_lines(&[-5, 150]));

    let out = histograms(run_to_end(Aggregator::new(0), &input).await);
    let h = &out[0];
    assert_eq!(h.count(), 3);
    assert_eq!(h.buckets()[42], 1);
    assert_eq!(h.time_error(), 1);
    assert_eq!(h.outliers(), 1);
}

#[tokio::test]
async fn stages_compose() {
    let packets: String = (0..4)
        .map(|i| {
            format!(
                r#"{{"type":"rx-packet","object":{{"tx-user-timestamp":"2024-03-01T10:00:00.000000Z","rx-hw-timestamp":"2024-03-01T10:00:00.0000{i}0Z","rx-user-timestamp":"2024-03-01T10:00:00.001000Z"}}}}"#
            ) + "\n"
        })
        .collect();

    let mut latencies = Vec::new();
    stage::run(Extractor, packets.as_bytes(), &mut latencies, pending())
        .await
        .unwrap();
    let mut out = Vec::new();
    stage::run(Aggregator::new(0), &latencies[..], &mut out, pending())
        .await
        .unwrap();

    let Record::Histogram(h) = Record::decode(out.trim_ascii_end()).unwrap() else {
        panic!("expected a histogram");
    };
    assert_eq!(h.count(), 4);
    for bucket in [0, 10, 20, 30] {
        assert_eq!(h.buckets()[bucket], 1, "bucket {bucket}");
    }
}

#[tokio::test]
async fn interrupt_flushes_in_flight_histogram() {
    let (mut writer, reader) = tokio::io::duplex(4096);
    let (out_writer, out_reader) = tokio::io::duplex(64 * 1024);
    let (cancel_tx, cancel_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(stage::run(
        Aggregator::new(0),
        BufReader::new(reader),
        out_writer,
        async move {
            let _ = cancel_rx.await;
        },
    ));

    writer
        .write_all(latency_lines(&[7, 8, 9]).as_bytes())
        .await
        .unwrap();
    // single-threaded runtime: yielding lets the stage drain what was written
    // and park on the next read, since the writer stays open
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
    assert!(!task.is_finished());

    cancel_tx.send(()).unwrap();
    task.await.unwrap().unwrap();

    let h = find_histogram(BufReader::new(out_reader)).await.unwrap();
    assert_eq!(h.count(), 3);
    assert_eq!(h.min(), Some(7));
    assert_eq!(h.max(), Some(9));
    drop(writer);
}

#[tokio::test]
async fn read_error_still_flushes_in_flight_histogram() {
    let lines = latency_lines(&[12, 34]);
    let input = BufReader::new(lines.as_bytes().chain(FailingSource));
    let mut out = Vec::new();

    let result = stage::run(Aggregator::new(0), input, &mut out, pending()).await;
    assert!(matches!(result, Err(Error::Io(_))));

    let h = find_histogram(&out[..]).await.unwrap();
    assert_eq!(h.count(), 2);
    assert_eq!(h.buckets()[12], 1);
    assert_eq!(h.buckets()[34], 1);
}
