//! Exchange engine against a simulated worker sharing the mailbox directory.

use carbridge::bridge::codec::{self, EMPTY_DOCUMENT};
use carbridge::bridge::{
    BridgeError, ExchangeConfig, ExchangeEngine, Mailbox, Payload, Request, Slot, Status,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const POLL: Duration = Duration::from_millis(20);
const TIMEOUT: Duration = Duration::from_millis(300);

fn config() -> ExchangeConfig {
    ExchangeConfig {
        timeout: TIMEOUT,
        poll_interval: POLL,
    }
}

async fn open_mailbox(dir: &tempfile::TempDir) -> Mailbox {
    let mailbox = Mailbox::open_default(dir.path()).unwrap();
    mailbox.initialize().await.unwrap();
    mailbox
}

/// Ids handed out in order, repeating the last one when exhausted.
fn sequence(ids: &'static [&'static str]) -> impl Fn() -> String + Send + Sync {
    let next = AtomicUsize::new(0);
    move || {
        let index = next.fetch_add(1, Ordering::SeqCst).min(ids.len() - 1);
        ids[index].to_string()
    }
}

/// Poll the command slot until a request shows up.
async fn wait_for_command(mailbox: &Mailbox) -> Request {
    loop {
        let content = mailbox.read(Slot::Command).await.unwrap();
        if let Some(request) = codec::decode_request(&content) {
            return request;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Answer every request whose id is accepted by `answer`, forever.
fn spawn_worker<F>(mailbox: Mailbox, answer: F) -> tokio::task::JoinHandle<()>
where
    F: Fn(&Request) -> Option<serde_json::Value> + Send + 'static,
{
    tokio::spawn(async move {
        let mut last_id = String::new();
        loop {
            let request = wait_for_command(&mailbox).await;
            if request.correlation_id != last_id {
                last_id = request.correlation_id.clone();
                if let Some(document) = answer(&request) {
                    mailbox
                        .write(Slot::Result, &document.to_string())
                        .await
                        .unwrap();
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
}

#[tokio::test]
async fn test_correlated_response_is_returned() {
    let dir = tempfile::tempdir().unwrap();
    let mailbox = open_mailbox(&dir).await;
    let worker = spawn_worker(mailbox.clone(), |request| {
        Some(json!({
            "correlation_id": request.correlation_id,
            "status": "success",
            "data": [{"name": "A", "imagePath": "src/Images/x.jpg"}]
        }))
    });

    let engine =
        ExchangeEngine::new(mailbox.clone(), config()).with_id_generator(sequence(&["abc-123"]));
    let response = engine
        .exchange("GET_ALL_CARS", Payload::new())
        .await
        .unwrap();
    worker.abort();

    assert_eq!(response.correlation_id, "abc-123");
    assert_eq!(response.status, Status::Success);
    assert_eq!(
        response.data.unwrap()[0]["imagePath"],
        "src/Images/x.jpg"
    );
    assert_eq!(mailbox.read(Slot::Command).await.unwrap(), EMPTY_DOCUMENT);
}

#[tokio::test]
async fn test_command_carries_operation_and_payload() {
    let dir = tempfile::tempdir().unwrap();
    let mailbox = open_mailbox(&dir).await;
    let engine =
        ExchangeEngine::new(mailbox.clone(), config()).with_id_generator(sequence(&["del-1"]));

    let mut payload = Payload::new();
    payload.insert("carName".to_string(), json!("BMW X5"));

    let watcher = mailbox.clone();
    let seen = tokio::spawn(async move {
        let request = wait_for_command(&watcher).await;
        let answer = json!({"correlation_id": request.correlation_id, "status": "success"});
        watcher
            .write(Slot::Result, &answer.to_string())
            .await
            .unwrap();
        request
    });

    let response = engine.exchange("DELETE_CAR", payload).await.unwrap();
    let request = seen.await.unwrap();

    assert_eq!(request.operation, "DELETE_CAR");
    assert_eq!(request.correlation_id, response.correlation_id);
    assert_eq!(request.str_field("carName"), Some("BMW X5"));
}

#[tokio::test]
async fn test_timeout_then_next_exchange_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let mailbox = open_mailbox(&dir).await;
    let worker = spawn_worker(mailbox.clone(), |request| {
        (request.correlation_id == "ghi-789").then(|| {
            json!({"correlation_id": "ghi-789", "status": "success", "data": []})
        })
    });

    let engine = ExchangeEngine::new(mailbox.clone(), config())
        .with_id_generator(sequence(&["def-456", "ghi-789"]));

    let err = engine
        .exchange("GET_ALL_CARS", Payload::new())
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::Timeout { .. }));
    assert_eq!(err.correlation_id(), Some("def-456"));
    assert!(err.is_retriable());
    assert_eq!(mailbox.read(Slot::Command).await.unwrap(), EMPTY_DOCUMENT);

    let response = engine
        .exchange("GET_ALL_CARS", Payload::new())
        .await
        .unwrap();
    worker.abort();

    assert_eq!(response.correlation_id, "ghi-789");
    assert!(response.is_success());
}

#[tokio::test]
async fn test_timeout_bounds() {
    let dir = tempfile::tempdir().unwrap();
    let mailbox = open_mailbox(&dir).await;
    let engine = ExchangeEngine::new(mailbox.clone(), config());

    let started = Instant::now();
    let err = engine
        .exchange("GET_ALL_CARS", Payload::new())
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, BridgeError::Timeout { malformed_reads: 0, .. }));
    assert!(elapsed >= POLL, "returned after {:?}", elapsed);
    // One poll interval of slack plus scheduling jitter.
    assert!(
        elapsed <= TIMEOUT + POLL + Duration::from_millis(500),
        "returned after {:?}",
        elapsed
    );
    assert_eq!(mailbox.read(Slot::Command).await.unwrap(), EMPTY_DOCUMENT);
}

#[tokio::test]
async fn test_malformed_reads_before_valid_response() {
    let dir = tempfile::tempdir().unwrap();
    let mailbox = open_mailbox(&dir).await;
    let engine = ExchangeEngine::new(
        mailbox.clone(),
        ExchangeConfig {
            timeout: Duration::from_secs(5),
            poll_interval: POLL,
        },
    )
    .with_id_generator(sequence(&["mal-1"]));

    let writer = mailbox.clone();
    tokio::spawn(async move {
        wait_for_command(&writer).await;
        writer
            .write(Slot::Result, r#"{"correlation_id": "mal-1", "sta"#)
            .await
            .unwrap();
        tokio::time::sleep(POLL * 3).await;
        writer.write(Slot::Result, "not json at all").await.unwrap();
        tokio::time::sleep(POLL * 3).await;
        writer
            .write(
                Slot::Result,
                r#"{"correlation_id": "mal-1", "status": "success", "data": {"ok": true}}"#,
            )
            .await
            .unwrap();
    });

    let response = engine
        .exchange("GET_ALL_CARS", Payload::new())
        .await
        .unwrap();

    assert_eq!(response.correlation_id, "mal-1");
    assert_eq!(response.data, Some(json!({"ok": true})));
}

#[tokio::test]
async fn test_malformed_reads_counted_on_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let mailbox = open_mailbox(&dir).await;
    let engine = ExchangeEngine::new(mailbox.clone(), config());

    let writer = mailbox.clone();
    tokio::spawn(async move {
        wait_for_command(&writer).await;
        writer.write(Slot::Result, "{\"status\": ").await.unwrap();
    });

    let err = engine
        .exchange("GET_ALL_CARS", Payload::new())
        .await
        .unwrap_err();

    let BridgeError::Timeout {
        malformed_reads, ..
    } = &err
    else {
        panic!("expected timeout, got {:?}", err);
    };
    assert!(*malformed_reads > 0);
}

#[tokio::test]
async fn test_stale_response_is_never_returned() {
    let dir = tempfile::tempdir().unwrap();
    let mailbox = open_mailbox(&dir).await;
    mailbox
        .write(
            Slot::Result,
            r#"{"correlation_id": "stale-0", "status": "success", "data": "old"}"#,
        )
        .await
        .unwrap();

    let worker = spawn_worker(mailbox.clone(), |request| {
        Some(json!({"correlation_id": request.correlation_id, "status": "success", "data": "fresh"}))
    });
    let engine =
        ExchangeEngine::new(mailbox.clone(), config()).with_id_generator(sequence(&["fresh-1"]));

    let response = engine
        .exchange("GET_ALL_CARS", Payload::new())
        .await
        .unwrap();
    worker.abort();

    assert_eq!(response.correlation_id, "fresh-1");
    assert_eq!(response.data, Some(json!("fresh")));
}

#[tokio::test]
async fn test_uncorrelated_response_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let mailbox = open_mailbox(&dir).await;
    let worker = spawn_worker(mailbox.clone(), |_| {
        Some(json!({"correlation_id": "someone-else", "status": "success"}))
    });
    let engine = ExchangeEngine::new(mailbox.clone(), config());

    let err = engine
        .exchange("GET_ALL_CARS", Payload::new())
        .await
        .unwrap_err();
    worker.abort();

    assert!(matches!(err, BridgeError::Timeout { .. }));
}

#[tokio::test]
async fn test_worker_error_is_a_response() {
    let dir = tempfile::tempdir().unwrap();
    let mailbox = open_mailbox(&dir).await;
    let worker = spawn_worker(mailbox.clone(), |request| {
        Some(json!({
            "correlation_id": request.correlation_id,
            "status": "error",
            "message": "Car not found for deletion."
        }))
    });
    let engine = ExchangeEngine::new(mailbox.clone(), config());

    let response = engine
        .exchange("DELETE_CAR", Payload::new())
        .await
        .unwrap();
    worker.abort();

    assert_eq!(response.status, Status::Error);
    assert_eq!(
        response.message.as_deref(),
        Some("Car not found for deletion.")
    );
}

#[tokio::test]
async fn test_concurrent_exchanges_are_serialized() {
    let dir = tempfile::tempdir().unwrap();
    let mailbox = open_mailbox(&dir).await;
    let worker = spawn_worker(mailbox.clone(), |request| {
        Some(json!({
            "correlation_id": request.correlation_id,
            "status": "success",
            "data": request.correlation_id
        }))
    });
    let engine = Arc::new(ExchangeEngine::new(
        mailbox.clone(),
        ExchangeConfig {
            timeout: Duration::from_secs(5),
            poll_interval: POLL,
        },
    ));

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.exchange("GET_ALL_CARS", Payload::new()).await })
        })
        .collect();

    for task in tasks {
        let response = task.await.unwrap().unwrap();
        assert_eq!(response.data, Some(json!(response.correlation_id)));
    }
    worker.abort();
}

#[tokio::test]
async fn test_result_slot_fault_then_recovery() {
    let dir = tempfile::tempdir().unwrap();
    let mailbox = open_mailbox(&dir).await;
    let engine = ExchangeEngine::new(
        mailbox.clone(),
        ExchangeConfig {
            timeout: Duration::from_secs(5),
            poll_interval: POLL,
        },
    )
    .with_id_generator(sequence(&["io-1", "io-2"]));

    // Turn the result slot into a directory once the command is out.
    let result_path = mailbox.path(Slot::Result).to_path_buf();
    let watcher = mailbox.clone();
    let saboteur = tokio::spawn(async move {
        wait_for_command(&watcher).await;
        std::fs::remove_file(&result_path).unwrap();
        std::fs::create_dir(&result_path).unwrap();
    });

    let err = engine
        .exchange("GET_ALL_CARS", Payload::new())
        .await
        .unwrap_err();
    saboteur.await.unwrap();

    assert!(matches!(
        err,
        BridgeError::MailboxIo {
            slot: Slot::Result,
            ..
        }
    ));
    assert!(err.is_retriable());
    assert_eq!(mailbox.read(Slot::Command).await.unwrap(), EMPTY_DOCUMENT);

    std::fs::remove_dir(mailbox.path(Slot::Result)).unwrap();
    let worker = spawn_worker(mailbox.clone(), |request| {
        Some(json!({"correlation_id": request.correlation_id, "status": "success"}))
    });

    let response = engine
        .exchange("GET_ALL_CARS", Payload::new())
        .await
        .unwrap();
    worker.abort();

    assert_eq!(response.correlation_id, "io-2");
}

#[tokio::test]
async fn test_unwritable_result_slot_fails_before_sending() {
    let dir = tempfile::tempdir().unwrap();
    let mailbox = open_mailbox(&dir).await;
    std::fs::remove_file(mailbox.path(Slot::Result)).unwrap();
    std::fs::create_dir(mailbox.path(Slot::Result)).unwrap();
    let engine = ExchangeEngine::new(mailbox.clone(), config());

    let err = engine
        .exchange("GET_ALL_CARS", Payload::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BridgeError::MailboxIo {
            slot: Slot::Result,
            ..
        }
    ));
    assert_eq!(mailbox.read(Slot::Command).await.unwrap(), EMPTY_DOCUMENT);
}
