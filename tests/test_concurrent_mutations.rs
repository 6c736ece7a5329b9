mod common;

use std::sync::Arc;

use common::TestHarness;
use remindbot::error::RequestError;
use remindbot::reminder::ops::CreateRequest;

const RAW: &str = "qq:GroupMessage:12345";

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_lose_nothing() {
    let h = TestHarness::new().await;
    let ops = Arc::new(h.ops(false));
    let requester = common::requester("alice");

    let mut handles = Vec::new();
    for i in 0..8 {
        let ops = Arc::clone(&ops);
        let requester = requester.clone();
        handles.push(tokio::spawn(async move {
            let text = format!("reminder-{i}");
            let date_time = format!("2099-01-0{} 09:00", i + 1);
            ops.create(
                RAW,
                &requester,
                CreateRequest {
                    text: &text,
                    date_time: &date_time,
                    week: None,
                    repeat: None,
                    holiday_gate: None,
                    is_task: false,
                },
            )
            .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(ops.list(RAW, &requester).await.len(), 8);
    assert_eq!(h.scheduler.job_count().await, 8);
    // Every create reached the disk copy as well.
    let persisted = h.backend.load().await;
    assert_eq!(persisted[RAW].len(), 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn interleaved_creates_and_deletes_converge() {
    let h = TestHarness::new().await;
    let ops = Arc::new(h.ops(false));
    let requester = common::requester("alice");

    for i in 0..4 {
        let text = format!("seed-{i}");
        ops.create(
            RAW,
            &requester,
            CreateRequest {
                text: &text,
                date_time: "2099-05-01 09:00",
                week: None,
                repeat: Some("daily"),
                holiday_gate: None,
                is_task: false,
            },
        )
        .await
        .unwrap();
    }

    // One task keeps creating while another drains from the front.
    let creator = {
        let ops = Arc::clone(&ops);
        let requester = requester.clone();
        tokio::spawn(async move {
            for i in 0..4 {
                let text = format!("extra-{i}");
                ops.create(
                    RAW,
                    &requester,
                    CreateRequest {
                        text: &text,
                        date_time: "2099-05-02 09:00",
                        week: None,
                        repeat: Some("daily"),
                        holiday_gate: None,
                        is_task: false,
                    },
                )
                .await
                .unwrap();
            }
        })
    };
    let deleter = {
        let ops = Arc::clone(&ops);
        let requester = requester.clone();
        tokio::spawn(async move {
            for _ in 0..4 {
                ops.delete(RAW, &requester, 1).await.unwrap();
            }
        })
    };
    creator.await.unwrap();
    deleter.await.unwrap();

    // 4 seeded + 4 created - 4 deleted, in memory and on disk alike.
    let listed = ops.list(RAW, &requester).await;
    assert_eq!(listed.len(), 4);
    assert_eq!(h.backend.load().await[RAW].len(), 4);
    assert_eq!(h.scheduler.job_count().await, 4);
}

#[tokio::test]
async fn delete_on_empty_session_reports_empty() {
    let h = TestHarness::new().await;
    let ops = h.ops(false);
    let requester = common::requester("alice");
    assert!(matches!(
        ops.delete(RAW, &requester, 1).await,
        Err(RequestError::Empty)
    ));
}

#[tokio::test]
async fn delete_out_of_range_reports_the_index() {
    let h = TestHarness::new().await;
    let ops = h.ops(false);
    let requester = common::requester("alice");
    ops.create(
        RAW,
        &requester,
        CreateRequest {
            text: "only one",
            date_time: "2099-01-01 09:00",
            week: None,
            repeat: None,
            holiday_gate: None,
            is_task: false,
        },
    )
    .await
    .unwrap();

    assert!(matches!(
        ops.delete(RAW, &requester, 0).await,
        Err(RequestError::InvalidIndex(0))
    ));
    assert!(matches!(
        ops.delete(RAW, &requester, 5).await,
        Err(RequestError::InvalidIndex(5))
    ));
}

#[tokio::test]
async fn isolated_sessions_do_not_see_each_other() {
    let h = TestHarness::new().await;
    let ops = h.ops(true);
    let alice = common::requester("alice");
    let bob = common::requester("bob");

    ops.create(
        RAW,
        &alice,
        CreateRequest {
            text: "alice's",
            date_time: "2099-01-01 09:00",
            week: None,
            repeat: None,
            holiday_gate: None,
            is_task: false,
        },
    )
    .await
    .unwrap();

    assert_eq!(ops.list(RAW, &alice).await.len(), 1);
    assert!(ops.list(RAW, &bob).await.is_empty());
    assert!(matches!(
        ops.delete(RAW, &bob, 1).await,
        Err(RequestError::Empty)
    ));
}
