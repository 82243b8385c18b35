use super::*;
use crate::job::AudioDescriptor;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

fn job(n: i64) -> TranscriptionJob {
    let audio = AudioDescriptor {
        file_id: format!("file-{n}"),
        file_size: 100,
        mime_type: "audio/ogg".to_string(),
        file_name: None,
        file_unique_id: format!("uniq-{n}"),
    };
    TranscriptionJob::new(n, n * 10, &audio, n * 100)
}

#[tokio::test]
async fn put_then_get_returns_same_job() {
    let queue = JobQueue::new(4);
    queue.put(job(1)).await;

    let got = queue.get().await;
    assert_eq!(got.chat_id, 1);
    assert!(queue.is_empty());
}

#[tokio::test]
async fn fifo_order_is_preserved() {
    let queue = JobQueue::new(8);
    for n in 0..5 {
        queue.put(job(n)).await;
    }

    for n in 0..5 {
        assert_eq!(queue.get().await.chat_id, n);
    }
}

#[tokio::test]
async fn is_full_exactly_at_capacity() {
    let queue = JobQueue::new(2);
    assert!(!queue.is_full());

    queue.put(job(1)).await;
    assert!(!queue.is_full());
    assert_eq!(queue.len(), 1);

    queue.put(job(2)).await;
    assert!(queue.is_full());
    assert_eq!(queue.len(), 2);

    queue.get().await;
    assert!(!queue.is_full());
}

#[tokio::test]
async fn put_blocks_while_full_and_resumes_after_get() {
    let queue = Arc::new(JobQueue::new(1));
    queue.put(job(1)).await;

    // A put past capacity must not complete...
    let blocked = {
        let queue = queue.clone();
        tokio::spawn(async move { queue.put(job(2)).await })
    };
    let raced = timeout(Duration::from_millis(50), async {
        loop {
            if blocked.is_finished() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(raced.is_err(), "put should block while the queue is full");

    // ...until a get frees a slot.
    assert_eq!(queue.get().await.chat_id, 1);
    timeout(Duration::from_millis(500), blocked)
        .await
        .expect("blocked put should resume")
        .unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.get().await.chat_id, 2);
}

#[tokio::test]
async fn get_blocks_on_empty_queue() {
    let queue = Arc::new(JobQueue::new(1));

    let waiter = {
        let queue = queue.clone();
        tokio::spawn(async move { queue.get().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!waiter.is_finished(), "get should block while empty");

    queue.put(job(7)).await;
    let got = timeout(Duration::from_millis(500), waiter)
        .await
        .expect("waiting get should resume")
        .unwrap();
    assert_eq!(got.chat_id, 7);
}

#[tokio::test]
async fn concurrent_consumers_drain_every_job_once() {
    let queue = Arc::new(JobQueue::new(32));
    for n in 0..32 {
        queue.put(job(n)).await;
    }

    let mut handles = Vec::new();
    for _ in 0..4 {
        let queue = queue.clone();
        handles.push(tokio::spawn(async move {
            let mut seen = Vec::new();
            for _ in 0..8 {
                seen.push(queue.get().await.chat_id);
            }
            seen
        }));
    }

    let mut all: Vec<i64> = Vec::new();
    for handle in handles {
        all.extend(handle.await.unwrap());
    }
    all.sort_unstable();
    assert_eq!(all, (0..32).collect::<Vec<_>>());
    assert!(queue.is_empty());
}
