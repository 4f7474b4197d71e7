use super::*;
use std::time::Duration;

use tokio::sync::oneshot;

#[test]
fn newer_ticket_supersedes_older() {
    let generation = QueryGeneration::new();
    let first = generation.begin();
    assert!(generation.is_current(first));
    let second = generation.begin();
    assert!(!generation.is_current(first));
    assert!(generation.is_current(second));
    assert!(second > first);
}

#[tokio::test]
async fn single_call_is_applied() {
    let generation = QueryGeneration::new();
    assert_eq!(generation.run_latest(async { 5 }).await, Some(5));
}

#[tokio::test]
async fn late_response_of_earlier_call_is_discarded() {
    let generation = QueryGeneration::new();
    let (release_slow, slow_gate) = oneshot::channel::<()>();

    let slow = generation.run_latest(async move {
        slow_gate.await.ok();
        "farm-1"
    });
    let fast = async {
        // Let the slow call take its ticket first.
        tokio::time::sleep(Duration::from_millis(10)).await;
        let out = generation.run_latest(async { "farm-2" }).await;
        release_slow.send(()).ok();
        out
    };

    let (slow_out, fast_out) = tokio::join!(slow, fast);
    assert_eq!(fast_out, Some("farm-2"));
    assert_eq!(slow_out, None);
}
