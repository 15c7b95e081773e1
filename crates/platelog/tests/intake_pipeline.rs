//! Integration tests for submit → enrichment → getStatus.

mod common;

use std::time::Duration;

use common::*;
use platelog::pipeline::IntakeEvent;
use platelog::recognition::RecognitionError;
use platelog::record::{IntakeStatus, RecordStore, StatusView};
use platelog::storage::ImageStore;
use platelog::worker::{EnrichmentJob, JobOutcome};
use platelog::IntakeError;

const JPEG: &[u8] = b"\xff\xd8\xff\xe0fake-jpeg";

fn expect_record(view: StatusView) -> platelog::IntakeRecord {
    match view {
        StatusView::Ready(record) => record,
        StatusView::Pending { id, .. } => panic!("record {} still pending", id),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_submit_returns_pending_without_waiting() {
    let harness = TestHarness::new();
    let recognizer = GatedRecognizer::new(raw_result("Tacos", "['tortilla']", FULL_NUTRITION));
    let (pipeline, pool) = harness.start(recognizer.clone(), 1);

    let record = pipeline.submit("u1", JPEG, "tacos.jpg").unwrap();
    assert_eq!(record.status, IntakeStatus::Pending);
    assert!(!record.id.is_empty());
    assert_eq!(record.owner, "u1");
    assert_eq!(record.image_ref, "u1_tacos.jpg");
    assert_eq!(record.image_url, "/api/v1/food-images/u1_tacos.jpg");

    let view = pipeline.get_status(&record.id).unwrap();
    assert_eq!(
        view,
        StatusView::Pending {
            id: record.id.clone(),
            status: IntakeStatus::Pending
        }
    );

    recognizer.release(1);
    let done = expect_record(wait_for_terminal(&pipeline, &record.id).await);
    assert_eq!(done.status, IntakeStatus::Complete);
    assert_eq!(done.food_name, "Tacos");

    pool.shutdown();
    pool.wait().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_complete_record_has_fixed_nutrient_slots() {
    let harness = TestHarness::new();
    let recognizer = StaticRecognizer::ok(raw_result(
        "Rice and Beans",
        "['rice', 'beans']",
        FULL_NUTRITION,
    ));
    let (pipeline, _pool) = harness.start(recognizer, 2);

    let record = pipeline.submit("u2", JPEG, "bowl.jpg").unwrap();
    let done = expect_record(wait_for_terminal(&pipeline, &record.id).await);

    assert_eq!(done.status, IntakeStatus::Complete);
    assert_eq!(done.ingredients, vec!["rice", "beans"]);

    let slots: Vec<(&str, f64, &str)> = done
        .nutrients
        .iter()
        .map(|n| (n.name.as_str(), n.amount, n.unit.as_str()))
        .collect();
    assert_eq!(
        slots,
        vec![
            ("Calories", 100.0, "kcal"),
            ("Protein", 5.0, "g"),
            ("Fat", 2.0, "g"),
            ("Saturated Fat", 1.0, "g"),
            ("Carbohydrates", 20.0, "g"),
            ("Fiber", 3.0, "g"),
            ("Sugar", 1.0, "g"),
        ]
    );

    assert_eq!(done.owner, record.owner);
    assert_eq!(done.image_ref, record.image_ref);
    assert_eq!(done.created_at, record.created_at);
    assert!(done.updated_at > record.updated_at);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_short_nutrition_list_fails_record() {
    let harness = TestHarness::new();
    let recognizer =
        StaticRecognizer::ok(raw_result("Mystery", "['something']", "[100.0, 5.0, 2.0]"));
    let (pipeline, _pool) = harness.start(recognizer, 1);

    let record = pipeline.submit("u1", JPEG, "mystery.png").unwrap();
    let done = expect_record(wait_for_terminal(&pipeline, &record.id).await);

    assert_eq!(done.status, IntakeStatus::Failed);
    assert!(done.nutrients.is_empty());
    assert!(done.ingredients.is_empty());
    assert!(done.food_name.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_endpoint_failure_is_visible_as_failed_status() {
    let harness = TestHarness::new();
    let mut events = harness.events.subscribe();
    let recognizer = StaticRecognizer::err(RecognitionError::BadStatus {
        status: 500,
        body: "internal error".to_string(),
    });
    let (pipeline, _pool) = harness.start(recognizer.clone(), 1);

    let record = pipeline.submit("u1", JPEG, "dinner.jpg").unwrap();
    let done = expect_record(wait_for_terminal(&pipeline, &record.id).await);
    assert_eq!(done.status, IntakeStatus::Failed);
    assert_eq!(recognizer.calls(), 1);

    let mut failure = None;
    while let Ok(Ok(event)) = tokio::time::timeout(Duration::from_secs(2), events.recv()).await {
        if let IntakeEvent::Failed { reason, .. } = event {
            failure = Some(reason);
            break;
        }
    }
    assert!(failure.unwrap().contains("500"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_owners_have_independent_outcomes() {
    let harness = TestHarness::new();
    let recognizer = ByFilenameRecognizer::new(|filename| {
        if filename.starts_with("u1_") {
            Err(RecognitionError::Transport("connection reset".to_string()))
        } else {
            Ok(raw_result("Salad", "['lettuce', 'tomato']", FULL_NUTRITION))
        }
    });
    let (pipeline, _pool) = harness.start(recognizer, 4);

    let mut submitted = Vec::new();
    for i in 0..5 {
        submitted.push(pipeline.submit("u1", JPEG, &format!("meal{}.jpg", i)).unwrap());
        submitted.push(pipeline.submit("u2", JPEG, &format!("meal{}.jpg", i)).unwrap());
    }

    for record in &submitted {
        let done = expect_record(wait_for_terminal(&pipeline, &record.id).await);
        let expected = if record.owner == "u1" {
            IntakeStatus::Failed
        } else {
            IntakeStatus::Complete
        };
        assert_eq!(done.status, expected, "record for {}", record.owner);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_second_enrichment_pass_does_not_rewrite() {
    let harness = TestHarness::new();
    let recognizer = StaticRecognizer::ok(raw_result("Pasta", "['penne']", FULL_NUTRITION));
    let (pipeline, _pool) = harness.start(recognizer.clone(), 1);

    let record = pipeline.submit("u1", JPEG, "pasta.jpg").unwrap();
    let first = expect_record(wait_for_terminal(&pipeline, &record.id).await);

    let enricher = harness.enricher(recognizer.clone());
    let result = enricher.run(&EnrichmentJob::for_record(&record)).await;
    assert_eq!(
        result.outcome,
        JobOutcome::Skipped {
            status: IntakeStatus::Complete
        }
    );
    assert_eq!(recognizer.calls(), 1);

    let again = expect_record(pipeline.get_status(&record.id).unwrap());
    assert_eq!(again.updated_at, first.updated_at);
    assert_eq!(again, first);
}

#[tokio::test]
async fn test_get_status_unknown_id() {
    let harness = TestHarness::new();
    let (pipeline, _pool) = harness.start(StaticRecognizer::ok(raw_result("x", "[]", FULL_NUTRITION)), 1);

    let err = pipeline.get_status("does-not-exist").unwrap_err();
    assert!(matches!(err, IntakeError::NotFound(id) if id == "does-not-exist"));
}

#[tokio::test]
async fn test_submit_validation() {
    let harness = TestHarness::new();
    let (pipeline, _pool) = harness.start(StaticRecognizer::ok(raw_result("x", "[]", FULL_NUTRITION)), 1);

    assert!(matches!(
        pipeline.submit("", JPEG, "a.jpg"),
        Err(IntakeError::Validation(_))
    ));
    assert!(matches!(
        pipeline.submit("   ", JPEG, "a.jpg"),
        Err(IntakeError::Validation(_))
    ));
    assert!(matches!(
        pipeline.submit("u1", b"", "a.jpg"),
        Err(IntakeError::Validation(_))
    ));
    assert!(matches!(
        pipeline.submit("u1", JPEG, ""),
        Err(IntakeError::Validation(_))
    ));

    assert!(harness.records.list_by_owner("u1").unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_same_file_name_gets_distinct_image_refs() {
    let harness = TestHarness::new();
    let recognizer = GatedRecognizer::new(raw_result("x", "[]", FULL_NUTRITION));
    let (pipeline, _pool) = harness.start(recognizer, 1);

    let first = pipeline.submit("u1", b"first", "lunch.jpg").unwrap();
    let second = pipeline.submit("u1", b"second", "lunch.jpg").unwrap();

    assert_eq!(first.image_ref, "u1_lunch.jpg");
    assert_eq!(second.image_ref, "u1_lunch_2.jpg");
    assert_eq!(harness.images.read(&second.image_ref).unwrap(), b"second");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unrecognized_extension_is_stored_as_generic() {
    let harness = TestHarness::new();
    let recognizer = GatedRecognizer::new(raw_result("x", "[]", FULL_NUTRITION));
    let (pipeline, _pool) = harness.start(recognizer, 1);

    let record = pipeline.submit("u1", JPEG, "scan.heic").unwrap();
    assert_eq!(record.image_ref, "u1_scan.heic");
    assert!(harness.images.exists(&record.image_ref));
    assert_eq!(
        harness.images.content_type(&record.image_ref),
        "application/octet-stream"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_list_for_owner_newest_first() {
    let harness = TestHarness::new();
    let recognizer = GatedRecognizer::new(raw_result("x", "[]", FULL_NUTRITION));
    let (pipeline, _pool) = harness.start(recognizer, 1);

    let a = pipeline.submit("u1", JPEG, "a.jpg").unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let b = pipeline.submit("u1", JPEG, "b.jpg").unwrap();
    pipeline.submit("u2", JPEG, "c.jpg").unwrap();

    let ids: Vec<String> = pipeline
        .list_for_owner("u1")
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec![b.id, a.id]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_submit_after_shutdown_persists_nothing() {
    let harness = TestHarness::new();
    let recognizer = StaticRecognizer::ok(raw_result("Curry", "['rice']", FULL_NUTRITION));
    let (pipeline, pool) = harness.start(recognizer.clone(), 1);

    pool.shutdown();
    pool.wait().await;

    for _ in 0..2 {
        let err = pipeline.submit("u1", JPEG, "curry.jpg").unwrap_err();
        assert!(matches!(err, IntakeError::Worker(_)));
    }

    assert!(harness.records.list_pending().unwrap().is_empty());
    assert!(harness.records.list_by_owner("u1").unwrap().is_empty());
    assert!(!harness.images.exists("u1_curry.jpg"));

    // A fresh pool accepts the upload and enriches it exactly once.
    let (pipeline, pool) = harness.start(recognizer.clone(), 1);
    assert_eq!(pool.recover_pending(harness.records.as_ref()).unwrap(), 0);

    let record = pipeline.submit("u1", JPEG, "curry.jpg").unwrap();
    assert_eq!(record.image_ref, "u1_curry.jpg");
    let done = expect_record(wait_for_terminal(&pipeline, &record.id).await);
    assert_eq!(done.status, IntakeStatus::Complete);
    assert_eq!(recognizer.calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_queued_event_precedes_worker_events() {
    let harness = TestHarness::new();
    let mut events = harness.events.subscribe();
    let recognizer = StaticRecognizer::ok(raw_result("Ramen", "['noodles']", FULL_NUTRITION));
    let (pipeline, _pool) = harness.start(recognizer, 2);

    let record = pipeline.submit("u1", JPEG, "ramen.jpg").unwrap();
    wait_for_terminal(&pipeline, &record.id).await;

    let mut seen = Vec::new();
    while let Ok(Ok(event)) = tokio::time::timeout(Duration::from_secs(2), events.recv()).await {
        if event.record_id() == record.id {
            let done = matches!(event, IntakeEvent::Completed { .. });
            seen.push(event);
            if done {
                break;
            }
        }
    }

    assert!(matches!(seen.first(), Some(IntakeEvent::Queued { .. })));
    assert!(matches!(seen.get(1), Some(IntakeEvent::Started { .. })));
    assert!(matches!(seen.last(), Some(IntakeEvent::Completed { .. })));
}
