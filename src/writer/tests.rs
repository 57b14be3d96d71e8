//! Lifecycle tests for the sink writer adapter.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::channel::mpsc;
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, FusedStream};
use futures::StreamExt;

use crate::writer::*;

fn ok_stream<T>(items: Vec<T>) -> impl futures::Stream<Item = Result<T, String>> {
    stream::iter(items).map(Ok)
}

mod completion_tests {
    use super::*;

    #[tokio::test]
    async fn writes_every_value_in_order_and_closes_once() {
        let sink = MemorySink::new();

        let out: Vec<_> = ok_stream(vec![1, 2, 3, 4, 5])
            .to_writable_sink(&sink)
            .unwrap()
            .collect()
            .await;

        assert_eq!(out, vec![Ok(1), Ok(2), Ok(3), Ok(4), Ok(5)]);
        assert_eq!(sink.written(), vec![1, 2, 3, 4, 5]);
        assert_eq!(sink.close_calls(), 1);
        assert_eq!(sink.terminal_calls(), 1);
        assert_eq!(sink.state(), SinkState::Closed);
    }

    #[tokio::test]
    async fn uses_a_pre_acquired_writer_without_reacquiring() {
        let sink = MemorySink::new();
        let writer = sink.get_writer().unwrap();

        let out: Vec<_> = ok_stream(vec!["a", "b"]).to_writable(writer).collect().await;

        assert_eq!(out, vec![Ok("a"), Ok("b")]);
        assert_eq!(sink.written(), vec!["a", "b"]);
        assert_eq!(sink.close_calls(), 1);
    }

    #[tokio::test]
    async fn empty_source_still_closes() {
        let sink = MemorySink::<i32>::new();

        let out: Vec<_> = ok_stream(vec![]).to_writable_sink(&sink).unwrap().collect().await;

        assert!(out.is_empty());
        assert_eq!(sink.close_calls(), 1);
    }

    #[tokio::test]
    async fn skip_close_leaves_the_sink_open() {
        let sink = MemorySink::new();

        let out: Vec<_> = ok_stream(vec![1, 2])
            .to_writable_sink(&sink)
            .unwrap()
            .skip_close()
            .collect()
            .await;

        assert_eq!(out.len(), 2);
        assert_eq!(sink.written(), vec![1, 2]);
        assert_eq!(sink.terminal_calls(), 0);
        assert_eq!(sink.state(), SinkState::Open);
    }

    #[tokio::test]
    async fn options_can_be_supplied_as_a_value() {
        let sink = MemorySink::new();
        let options = WriteOptions::new().with_close_on_complete(false);

        let adapter = ok_stream(vec![1])
            .to_writable_sink(&sink)
            .unwrap()
            .with_options(options);
        assert_eq!(adapter.options(), options);

        let _: Vec<_> = adapter.collect().await;
        assert_eq!(sink.close_calls(), 0);
    }

    #[tokio::test]
    async fn close_failure_is_yielded_as_close_error() {
        let sink = MemorySink::new().fail_close("flush failed");

        let out: Vec<_> = ok_stream(vec![1])
            .to_writable_sink(&sink)
            .unwrap()
            .collect()
            .await;

        assert_eq!(
            out,
            vec![
                Ok(1),
                Err(WriteError::Close(MemoryError::Injected(
                    "flush failed".to_string()
                )))
            ]
        );
        assert_eq!(sink.close_calls(), 1);
    }

    #[tokio::test]
    async fn stream_is_fused_after_completion() {
        let sink = MemorySink::new();
        let mut adapter = ok_stream(vec![1]).to_writable_sink(&sink).unwrap();

        assert_eq!(adapter.next().await, Some(Ok(1)));
        assert_eq!(adapter.next().await, None);
        assert!(adapter.is_terminated());
        assert_eq!(adapter.next().await, None);

        drop(adapter);
        assert_eq!(sink.close_calls(), 1);
    }
}

mod error_tests {
    use super::*;

    #[tokio::test]
    async fn source_error_aborts_with_its_message() {
        let sink = MemorySink::new();
        let source = stream::iter(vec![Ok(1), Ok(2), Ok(3), Err("boom".to_string()), Ok(4)]);

        let out: Vec<_> = source.to_writable_sink(&sink).unwrap().collect().await;

        assert_eq!(
            out,
            vec![
                Ok(1),
                Ok(2),
                Ok(3),
                Err(WriteError::Source("boom".to_string()))
            ]
        );
        assert_eq!(sink.written(), vec![1, 2, 3]);
        assert_eq!(sink.write_attempts(), 3);
        assert_eq!(sink.abort_reasons(), vec!["boom".to_string()]);
        assert_eq!(sink.close_calls(), 0);
    }

    #[tokio::test]
    async fn source_error_aborts_even_with_skip_close() {
        let sink = MemorySink::new();
        let source = stream::iter(vec![Ok(1), Err("boom".to_string())]);

        let _: Vec<_> = source
            .to_writable_sink(&sink)
            .unwrap()
            .skip_close()
            .collect()
            .await;

        assert_eq!(sink.abort_reasons(), vec!["boom".to_string()]);
    }

    #[tokio::test]
    async fn write_failure_aborts_and_stops() {
        let sink = MemorySink::new().fail_write_at(1, "disk full");

        let out: Vec<_> = ok_stream(vec![1, 2, 3])
            .to_writable_sink(&sink)
            .unwrap()
            .collect()
            .await;

        assert_eq!(
            out,
            vec![
                Ok(1),
                Err(WriteError::Write(MemoryError::Injected(
                    "disk full".to_string()
                )))
            ]
        );
        assert_eq!(sink.write_attempts(), 2);
        assert_eq!(sink.abort_reasons().len(), 1);
        assert!(sink.abort_reasons()[0].contains("disk full"));
        assert_eq!(sink.close_calls(), 0);
    }

    #[tokio::test]
    async fn abort_failure_does_not_mask_the_source_error() {
        let sink = MemorySink::new().fail_abort("abort refused");
        let source = stream::iter(vec![Ok(1), Err("boom".to_string())]);

        let out: Vec<_> = source.to_writable_sink(&sink).unwrap().collect().await;

        assert_eq!(
            out,
            vec![Ok(1), Err(WriteError::Source("boom".to_string()))]
        );
        assert_eq!(sink.terminal_calls(), 1);
    }

    #[tokio::test]
    async fn error_after_external_close_issues_no_abort() {
        let sink = MemorySink::new();
        sink.close_externally();
        let source = stream::iter(vec![Ok(1), Err("boom".to_string())]);

        let out: Vec<_> = source.to_writable_sink(&sink).unwrap().collect().await;

        assert_eq!(
            out,
            vec![Ok(1), Err(WriteError::Source("boom".to_string()))]
        );
        assert!(sink.written().is_empty());
        assert_eq!(sink.terminal_calls(), 0);
    }

    #[tokio::test]
    async fn stream_is_fused_after_error() {
        let sink = MemorySink::<i32>::new();
        let mut adapter = stream::iter(vec![Err("boom".to_string())])
            .to_writable_sink(&sink)
            .unwrap();

        assert!(matches!(adapter.next().await, Some(Err(WriteError::Source(_)))));
        assert_eq!(adapter.next().await, None);
        assert!(adapter.is_finalized());

        drop(adapter);
        assert_eq!(sink.terminal_calls(), 1);
    }
}

mod cancellation_tests {
    use super::*;

    #[tokio::test]
    async fn dropping_after_three_values_closes_once() {
        let sink = MemorySink::new();

        let out: Vec<_> = ok_stream(vec![1, 2, 3, 4, 5])
            .to_writable_sink(&sink)
            .unwrap()
            .take(3)
            .collect()
            .await;

        assert_eq!(out, vec![Ok(1), Ok(2), Ok(3)]);
        assert_eq!(sink.written(), vec![1, 2, 3]);
        assert_eq!(sink.close_calls(), 1);
        assert!(sink.abort_reasons().is_empty());
    }

    #[tokio::test]
    async fn dropping_before_first_poll_closes() {
        let sink = MemorySink::<i32>::new();
        let adapter = ok_stream(vec![1]).to_writable_sink(&sink).unwrap();

        drop(adapter);

        assert!(sink.written().is_empty());
        assert_eq!(sink.close_calls(), 1);
        assert!(!sink.is_locked());
    }

    #[tokio::test]
    async fn dropping_with_skip_close_leaves_sink_open() {
        let sink = MemorySink::new();
        let mut adapter = ok_stream(vec![1, 2])
            .to_writable_sink(&sink)
            .unwrap()
            .skip_close();

        assert_eq!(adapter.next().await, Some(Ok(1)));
        drop(adapter);

        assert_eq!(sink.terminal_calls(), 0);
        assert_eq!(sink.state(), SinkState::Open);
    }

    #[tokio::test]
    async fn cancel_closes_and_reports_the_outcome() {
        let sink = MemorySink::new();
        let mut adapter = ok_stream(vec![1, 2, 3]).to_writable_sink(&sink).unwrap();

        assert_eq!(adapter.next().await, Some(Ok(1)));
        assert_eq!(adapter.cancel().await, Ok(()));

        assert_eq!(sink.written(), vec![1]);
        assert_eq!(sink.close_calls(), 1);
    }

    #[tokio::test]
    async fn cancel_surfaces_close_failure() {
        let sink = MemorySink::<i32>::new().fail_close("flush failed");
        let adapter = ok_stream(vec![1]).to_writable_sink(&sink).unwrap();

        let result = adapter.cancel().await;

        assert_eq!(
            result,
            Err(MemoryError::Injected("flush failed".to_string()))
        );
        assert_eq!(sink.close_calls(), 1);
    }

    #[tokio::test]
    async fn cancel_after_completion_is_a_noop() {
        let sink = MemorySink::new();
        let mut adapter = ok_stream(vec![1]).to_writable_sink(&sink).unwrap();

        while adapter.next().await.is_some() {}
        assert_eq!(adapter.cancel().await, Ok(()));

        assert_eq!(sink.close_calls(), 1);
    }
}

mod closed_watch_tests {
    use super::*;

    #[tokio::test]
    async fn external_close_skips_remaining_writes() {
        let sink = MemorySink::new();
        let (tx, rx) = mpsc::unbounded::<Result<i32, String>>();
        let mut adapter = rx.to_writable_sink(&sink).unwrap();

        tx.unbounded_send(Ok(1)).unwrap();
        tx.unbounded_send(Ok(2)).unwrap();
        assert_eq!(adapter.next().await, Some(Ok(1)));
        assert_eq!(adapter.next().await, Some(Ok(2)));

        sink.close_externally();
        for n in 3..=5 {
            tx.unbounded_send(Ok(n)).unwrap();
        }
        drop(tx);

        let rest: Vec<_> = adapter.by_ref().collect().await;

        assert_eq!(rest, vec![Ok(3), Ok(4), Ok(5)]);
        assert!(adapter.is_closed());
        assert_eq!(sink.written(), vec![1, 2]);
        assert_eq!(sink.write_attempts(), 2);
        assert_eq!(sink.terminal_calls(), 0);

        drop(adapter);
        assert_eq!(sink.terminal_calls(), 0);
    }

    #[tokio::test]
    async fn close_triggered_while_pulling_skips_the_write() {
        let sink = MemorySink::new();
        let closer = sink.clone();

        let out: Vec<_> = stream::iter(1..=5)
            .inspect(move |n| {
                if *n == 3 {
                    closer.close_externally();
                }
            })
            .map(Ok::<_, String>)
            .to_writable_sink(&sink)
            .unwrap()
            .collect()
            .await;

        assert_eq!(out, vec![Ok(1), Ok(2), Ok(3), Ok(4), Ok(5)]);
        assert_eq!(sink.written(), vec![1, 2]);
        assert_eq!(sink.write_attempts(), 2);
        assert!(sink.abort_reasons().is_empty());
        assert_eq!(sink.terminal_calls(), 0);
    }

    /// Closes its sink while the write of `close_at` is in flight.
    struct ClosingWriter {
        inner: MemoryWriter<i32>,
        sink: MemorySink<i32>,
        close_at: i32,
    }

    impl SinkWriter for ClosingWriter {
        type Item = i32;
        type Error = MemoryError;

        fn write(&mut self, item: i32) -> BoxFuture<'static, Result<(), MemoryError>> {
            if item == self.close_at {
                self.sink.close_externally();
            }
            self.inner.write(item)
        }

        fn close(&mut self) -> BoxFuture<'static, Result<(), MemoryError>> {
            self.inner.close()
        }

        fn abort(&mut self, reason: String) -> BoxFuture<'static, Result<(), MemoryError>> {
            self.inner.abort(reason)
        }

        fn closed(&self) -> BoxFuture<'static, ()> {
            self.inner.closed()
        }
    }

    #[tokio::test]
    async fn write_failing_on_a_racing_close_passes_the_value_through() {
        let sink = MemorySink::new();
        let writer = ClosingWriter {
            inner: sink.get_writer().unwrap(),
            sink: sink.clone(),
            close_at: 2,
        };

        let out: Vec<_> = ok_stream(vec![1, 2, 3, 4]).to_writable(writer).collect().await;

        assert_eq!(out, vec![Ok(1), Ok(2), Ok(3), Ok(4)]);
        assert_eq!(sink.written(), vec![1]);
        assert_eq!(sink.write_attempts(), 1);
        assert_eq!(sink.terminal_calls(), 0);
    }

    #[tokio::test]
    async fn closed_before_start_writes_nothing() {
        let sink = MemorySink::new();
        sink.close_externally();

        let out: Vec<_> = ok_stream(vec![1, 2])
            .to_writable_sink(&sink)
            .unwrap()
            .collect()
            .await;

        assert_eq!(out, vec![Ok(1), Ok(2)]);
        assert_eq!(sink.write_attempts(), 0);
        assert_eq!(sink.close_calls(), 0);
    }

    #[tokio::test]
    async fn second_adapter_cannot_lock_the_sink() {
        let sink = MemorySink::<i32>::new();
        let first = ok_stream(vec![1]).to_writable_sink(&sink).unwrap();

        let second = ok_stream(vec![2]).to_writable_sink(&sink);
        assert_eq!(second.err(), Some(AcquireError::Locked));

        drop(first);
        assert!(ok_stream(vec![3]).to_writable_sink(&sink).is_ok());
    }
}

mod ordering_tests {
    use super::*;

    /// Records when each write starts and finishes; writes take a moment.
    struct SlowWriter {
        log: Arc<Mutex<Vec<String>>>,
    }

    impl SinkWriter for SlowWriter {
        type Item = i32;
        type Error = String;

        fn write(&mut self, item: i32) -> BoxFuture<'static, Result<(), String>> {
            let log = Arc::clone(&self.log);
            log.lock().unwrap().push(format!("start {}", item));
            async move {
                tokio::time::sleep(Duration::from_millis(2)).await;
                log.lock().unwrap().push(format!("end {}", item));
                Ok(())
            }
            .boxed()
        }

        fn close(&mut self) -> BoxFuture<'static, Result<(), String>> {
            let log = Arc::clone(&self.log);
            async move {
                tokio::time::sleep(Duration::from_millis(2)).await;
                log.lock().unwrap().push("closed".to_string());
                Ok(())
            }
            .boxed()
        }

        fn abort(&mut self, reason: String) -> BoxFuture<'static, Result<(), String>> {
            self.log.lock().unwrap().push(format!("abort {}", reason));
            futures::future::ready(Ok(())).boxed()
        }

        fn closed(&self) -> BoxFuture<'static, ()> {
            futures::future::pending().boxed()
        }
    }

    #[tokio::test]
    async fn each_write_completes_before_the_next_value_is_pulled() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pulls = Arc::clone(&log);
        let source = stream::iter(1..=3)
            .inspect(move |n| pulls.lock().unwrap().push(format!("pull {}", n)))
            .map(Ok::<_, String>);

        let out: Vec<_> = source
            .to_writable(SlowWriter {
                log: Arc::clone(&log),
            })
            .collect()
            .await;

        assert_eq!(out, vec![Ok(1), Ok(2), Ok(3)]);
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "pull 1", "start 1", "end 1", "pull 2", "start 2", "end 2", "pull 3", "start 3",
                "end 3", "closed"
            ]
        );
    }

    #[tokio::test]
    async fn completion_waits_for_the_close_outcome() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut adapter = ok_stream(vec![1]).to_writable(SlowWriter {
            log: Arc::clone(&log),
        });

        assert_eq!(adapter.next().await, Some(Ok(1)));
        assert_eq!(adapter.next().await, None);

        assert_eq!(log.lock().unwrap().last().map(String::as_str), Some("closed"));
    }
}

#[cfg(feature = "tracing")]
mod tracing_tests {
    use super::*;
    use tracing_test::traced_test;

    #[traced_test]
    #[tokio::test]
    async fn logs_abort_reason() {
        let sink = MemorySink::new();
        let source = stream::iter(vec![Ok(1), Err("boom".to_string())]);

        let _: Vec<_> = source.to_writable_sink(&sink).unwrap().collect().await;

        assert!(logs_contain("aborting sink: boom"));
    }
}
