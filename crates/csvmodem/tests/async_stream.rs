#![expect(missing_docs)]

use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use csvmodem::{
    CallbackError, CsvParser, ErrorSource, HeaderMode, ParseEvent, ParserOptions, Row, RowStream,
    StreamError, Verdict, row,
};
use futures::{FutureExt, StreamExt, future, stream};

mod common;

fn byte_chunks(chunks: &[&str]) -> Vec<Result<Vec<u8>, io::Error>> {
    chunks.iter().map(|c| Ok(c.as_bytes().to_vec())).collect()
}

fn rows(events: &[ParseEvent]) -> Vec<Row> {
    events
        .iter()
        .filter_map(|event| match event {
            ParseEvent::Row(record) => Some(record.row.clone()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn slow_validators_keep_input_order() {
    let input = stream::iter(byte_chunks(&["a\nb\nc", "\nd\ne\n"]));
    let stream = RowStream::new(input, ParserOptions::default())
        .unwrap()
        .validate_async(|row| {
            let name = row.field(0).unwrap_or_default().to_owned();
            async move {
                // Earlier rows take longer so a reordering would show.
                let delay = 5 - u64::from(name.as_bytes()[0] - b'a');
                tokio::time::sleep(Duration::from_millis(delay)).await;
                Ok::<_, CallbackError>(Verdict::from(name != "c"))
            }
        });

    let events: Vec<_> = stream.map(Result::unwrap).collect().await;
    assert_eq!(
        rows(&events),
        vec![row!["a"], row!["b"], row!["d"], row!["e"]]
    );
    assert!(matches!(&events[2], ParseEvent::Invalid(f) if f.number == 3));
    assert_eq!(events.last(), Some(&ParseEvent::End { row_count: 4 }));
}

#[tokio::test]
async fn async_transform_runs_after_sync_validation() {
    let parser = CsvParser::builder(ParserOptions {
        headers: HeaderMode::FirstRow,
        ..Default::default()
    })
    .validate(|row| row.get("name") != Some("skip"))
    .build()
    .unwrap();
    let input = stream::iter(byte_chunks(&common::CHUNKS));
    let stream = RowStream::from_parser(input, parser).transform_async(|row: Row| async move {
        tokio::time::sleep(Duration::from_millis(1)).await;
        Ok::<_, CallbackError>(Row::Fields(vec![row.get("id").unwrap_or_default().to_owned()]))
    });

    let events: Vec<_> = stream.map(Result::unwrap).collect().await;
    assert!(matches!(&events[0], ParseEvent::Headers { names } if names.len() == 3));
    assert_eq!(rows(&events), vec![row!["1"], row!["2"], row!["3"]]);
}

#[tokio::test]
async fn input_is_pulled_only_on_demand() {
    let pulled = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&pulled);
    let input = stream::iter((0..100).map(|i| Ok::<_, io::Error>(format!("row{i}\n"))))
        .inspect(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    let mut stream = RowStream::new(input, ParserOptions::default()).unwrap();

    for expected in ["row0", "row1", "row2"] {
        match stream.next().await {
            Some(Ok(ParseEvent::Row(record))) => assert_eq!(record.row.field(0), Some(expected)),
            other => panic!("unexpected {other:?}"),
        }
    }
    assert_eq!(pulled.load(Ordering::SeqCst), 3);
    assert_eq!(stream.row_count(), 3);
}

#[tokio::test]
async fn cancel_drops_the_pending_callback() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let input = stream::iter(byte_chunks(&["a\nb\nc\n"]));
    let mut stream = RowStream::new(input, ParserOptions::default())
        .unwrap()
        .validate_async(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            future::pending::<Result<Verdict, CallbackError>>()
        });

    assert!(stream.next().now_or_never().is_none());
    stream.cancel();
    assert!(stream.next().await.is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(stream.row_count(), 0);
}

#[tokio::test]
async fn input_errors_end_the_stream() {
    let input = stream::iter(vec![
        Ok(b"a\n".to_vec()),
        Err(io::Error::other("disk on fire")),
        Ok(b"b\n".to_vec()),
    ]);
    let mut stream = RowStream::new(input, ParserOptions::default()).unwrap();

    assert!(matches!(stream.next().await, Some(Ok(ParseEvent::Row(_)))));
    match stream.next().await {
        Some(Err(StreamError::Input(err))) => assert_eq!(err.to_string(), "disk on fire"),
        other => panic!("unexpected {other:?}"),
    }
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn async_validator_errors_are_fatal() {
    let input = stream::iter(byte_chunks(&["ok\nbad\nlater\n"]));
    let stream = RowStream::new(input, ParserOptions::default())
        .unwrap()
        .validate_async(|row| {
            let bad = row.field(0) == Some("bad");
            async move {
                if bad {
                    Err(CallbackError::from("lookup failed"))
                } else {
                    Ok(Verdict::Valid)
                }
            }
        });

    let events: Vec<_> = stream.collect().await;
    assert_eq!(events.len(), 2);
    match &events[1] {
        Err(StreamError::Parse(err)) => {
            assert!(matches!(err.kind(), ErrorSource::Validate(_)));
            assert_eq!(err.row(), 2);
            assert_eq!(
                err.to_string(),
                "validate callback failed: lookup failed at 3..6 (row 2)"
            );
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn multibyte_characters_split_across_byte_chunks() {
    let text = "naïve,€uro\n𝄞,x\n".as_bytes();
    let input = stream::iter(text.chunks(1).map(|c| Ok::<_, io::Error>(c.to_vec())));
    let events: Vec<_> = RowStream::new(input, ParserOptions::default())
        .unwrap()
        .map(Result::unwrap)
        .collect()
        .await;
    assert_eq!(rows(&events), vec![row!["naïve", "€uro"], row!["𝄞", "x"]]);
}
