use std::collections::HashMap;
use std::sync::{mpsc as std_mpsc, Arc};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use writechan::{AcquireBuffer, Buffer, BufferError, ChannelWriter, Heap, VecBuffer};

// Acquirer that remembers every size hint it was asked for
#[derive(Clone, Default)]
struct RecordingHeap {
    hints: Arc<Mutex<Vec<usize>>>,
}

impl AcquireBuffer for RecordingHeap {
    type Buffer = VecBuffer;

    fn acquire(&self, size_hint: usize) -> VecBuffer {
        self.hints.lock().push(size_hint);
        VecBuffer::with_capacity(size_hint)
    }
}

// Buffer whose copy step always fails
struct RejectingBuffer;

impl Buffer for RejectingBuffer {
    fn write(&mut self, _data: &[u8]) -> Result<usize, BufferError> {
        Err(BufferError::Full { limit: 0 })
    }

    fn len(&self) -> usize {
        0
    }

    fn as_slice(&self) -> &[u8] {
        &[]
    }
}

struct Rejecting;

impl AcquireBuffer for Rejecting {
    type Buffer = RejectingBuffer;

    fn acquire(&self, _size_hint: usize) -> RejectingBuffer {
        RejectingBuffer
    }
}

#[test]
fn test_sequential_writes_keep_order() {
    let (tx, mut rx) = mpsc::channel(4);
    let writer = ChannelWriter::new(tx);

    writer.write_sync(b"first").unwrap();
    writer.write_sync(b"second").unwrap();

    assert_eq!(&*rx.try_recv().unwrap(), b"first");
    assert_eq!(&*rx.try_recv().unwrap(), b"second");
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_one_acquire_per_write_with_length_hint() {
    let (tx, mut rx) = mpsc::channel(4);
    let heap = RecordingHeap::default();
    let writer = ChannelWriter::with_acquirer(tx, heap.clone());

    writer.write_sync(b"Hello").unwrap();
    writer.write_sync(b"").unwrap();
    writer.write_sync(b"abc").unwrap();

    assert_eq!(*heap.hints.lock(), vec![5, 0, 3]);
    assert_eq!(rx.try_recv().unwrap().len(), 5);
    assert!(rx.try_recv().unwrap().is_empty());
    assert_eq!(rx.try_recv().unwrap().len(), 3);
}

#[test]
fn test_short_write_is_still_queued() {
    let (tx, mut rx) = mpsc::channel(2);
    let writer = ChannelWriter::with_acquirer(tx, Heap::capped(3));

    assert_eq!(writer.write_sync(b"abcdef").unwrap(), 3);

    let buffer = rx.try_recv().unwrap();
    assert_eq!(&*buffer, b"abc");
}

#[test]
fn test_failed_copy_is_still_queued() {
    let (tx, mut rx) = mpsc::channel(2);
    let writer = ChannelWriter::with_acquirer(tx, Rejecting);

    let result = writer.write_sync(b"data");
    assert_eq!(result, Err(BufferError::Full { limit: 0 }));

    let buffer = rx.try_recv().unwrap();
    assert!(buffer.is_empty());
}

#[test]
fn test_full_queue_blocks_until_drained() {
    let (tx, mut rx) = mpsc::channel(1);
    let writer = ChannelWriter::new(tx);

    assert_eq!(writer.write_sync(&[0x01u8, 0x02]).unwrap(), 2);

    let (done_tx, done_rx) = std_mpsc::channel();
    let second = writer.clone();
    let handle = thread::spawn(move || {
        let n = second.write_sync(&[0x03u8]);
        done_tx.send(()).unwrap();
        n
    });

    // Nobody drains yet, so the second write must still be waiting
    assert!(done_rx.recv_timeout(Duration::from_millis(100)).is_err());

    assert_eq!(&*rx.blocking_recv().unwrap(), &[0x01u8, 0x02]);

    assert_eq!(handle.join().unwrap().unwrap(), 1);
    assert_eq!(&*rx.blocking_recv().unwrap(), &[0x03u8]);
}

#[test]
fn test_concurrent_producers_lose_nothing() {
    const PRODUCERS: usize = 8;
    const WRITES: usize = 50;

    let (tx, mut rx) = mpsc::channel(4);
    let writer = ChannelWriter::new(tx);

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let writer = writer.clone();
            thread::spawn(move || {
                for i in 0..WRITES {
                    let payload = format!("{p}:{i}");
                    writer.write_sync(payload.as_bytes()).unwrap();
                }
            })
        })
        .collect();
    drop(writer);

    let mut seen: HashMap<usize, Vec<usize>> = HashMap::new();
    while let Some(buffer) = rx.blocking_recv() {
        let text = String::from_utf8(buffer.into_inner()).unwrap();
        let (p, i) = text.split_once(':').unwrap();
        seen.entry(p.parse().unwrap())
            .or_default()
            .push(i.parse().unwrap());
    }

    for producer in producers {
        producer.join().unwrap();
    }

    assert_eq!(seen.len(), PRODUCERS);
    let expected: Vec<usize> = (0..WRITES).collect();
    for indices in seen.values() {
        // Each producer's buffers arrive once each, in its own write order
        assert_eq!(indices, &expected);
    }
}

#[test]
fn test_closed_queue_does_not_block() {
    let (tx, rx) = mpsc::channel(1);
    let writer = ChannelWriter::new(tx);
    writer.write_sync(b"fills the slot").unwrap();
    drop(rx);

    assert!(writer.is_closed());
    assert_eq!(writer.write_sync(b"dropped").unwrap(), 7);
}

#[tokio::test]
async fn test_async_write_waits_for_free_slot() {
    let (tx, mut rx) = mpsc::channel(1);
    let writer = ChannelWriter::new(tx);

    assert_eq!(writer.write_async(&[0x01u8, 0x02]).await.unwrap(), 2);
    assert_eq!(writer.capacity(), 0);

    let pending =
        tokio::time::timeout(Duration::from_millis(50), writer.write_async(&[0x03u8])).await;
    assert!(pending.is_err(), "write should wait while the queue is full");

    // The timed-out write was dropped before it got a slot
    assert_eq!(&*rx.recv().await.unwrap(), &[0x01u8, 0x02]);
    assert!(rx.try_recv().is_err());

    assert_eq!(writer.write_async(&[0x03u8]).await.unwrap(), 1);
    assert_eq!(&*rx.recv().await.unwrap(), &[0x03u8]);
}

#[tokio::test]
async fn test_async_producers_with_consumer_task() {
    let (tx, mut rx) = mpsc::channel(2);
    let writer = ChannelWriter::new(tx);

    let consumer = tokio::spawn(async move {
        let mut payloads = Vec::new();
        while let Some(buffer) = rx.recv().await {
            payloads.push(buffer.into_inner());
        }
        payloads
    });

    let writes = (0u8..10).map(|i| {
        let writer = writer.clone();
        async move { writer.write_async(&[i; 3]).await }
    });
    let results = futures::future::join_all(writes).await;
    drop(writer);

    assert!(results.iter().all(|r| *r == Ok(3)));

    let mut payloads = consumer.await.unwrap();
    payloads.sort();
    let expected: Vec<Vec<u8>> = (0u8..10).map(|i| vec![i; 3]).collect();
    assert_eq!(payloads, expected);
}

#[tokio::test]
async fn test_embedded_io_async_write() {
    use embedded_io_async::Write;

    let (tx, mut rx) = mpsc::channel(2);
    let mut writer = ChannelWriter::new(tx);

    writer.write_all(b"Broadcast").await.unwrap();
    writer.flush().await.unwrap();

    assert_eq!(&*rx.recv().await.unwrap(), b"Broadcast");
}

#[test]
fn test_embedded_io_write() {
    use embedded_io::Write;

    let (tx, mut rx) = mpsc::channel(2);
    let mut writer = ChannelWriter::with_acquirer(tx, Heap::capped(0));

    let err = writer.write(b"x").unwrap_err();
    assert_eq!(
        embedded_io::Error::kind(&err),
        embedded_io::ErrorKind::WriteZero
    );
    assert!(rx.try_recv().unwrap().is_empty());
}
