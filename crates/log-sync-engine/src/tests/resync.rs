use super::harness::{id, Reply, TestHarness, INDEX};
use crate::FileOutcome;

#[tokio::test]
async fn file_below_retention_jumps_to_oldest() {
    let h = TestHarness::new();
    h.set_cursor("1_2.log");
    h.source
        .set_index(&["1_5.log", "1_6.log", "1_7.log", "1_8.log", "1_9.log"]);

    let mut engine = h.engine();
    let outcome = engine.handle_file(&id("1_3.log")).await.unwrap();

    assert_eq!(outcome, FileOutcome::Resynced);
    assert_eq!(h.stored_cursor().as_deref(), Some("1_5.log"));
    assert_eq!(engine.cursor(), Some(id("1_5.log")));
    assert_eq!(h.source.request_count("1_3.log"), 1);
    assert_eq!(engine.stats().resyncs, 1);
}

#[tokio::test]
async fn repeated_misses_past_newest_restart_from_oldest() {
    let h = TestHarness::new();
    h.set_cursor("1_11.log");
    h.source.set_index(&["1_5.log", "1_9.log"]);

    let mut engine = h.engine();
    let outcome = engine.handle_file(&id("1_12.log")).await.unwrap();

    assert_eq!(outcome, FileOutcome::Resynced);
    assert_eq!(h.stored_cursor().as_deref(), Some("1_5.log"));
    assert_eq!(h.source.request_count("1_12.log"), 4);
    assert_eq!(h.source.request_count(INDEX), 4);
}

#[tokio::test]
async fn miss_past_newest_waits_for_the_file() {
    let h = TestHarness::new();
    h.set_cursor("1_9.log");
    h.source.set_index(&["1_5.log", "1_9.log"]);
    h.source.queue("1_10.log", Reply::NotFound);
    h.serve("1_10.log");

    let mut engine = h.engine();
    engine.run_once().await.unwrap();

    assert_eq!(h.stored_cursor().as_deref(), Some("1_10.log"));
    assert_eq!(h.source.request_count("1_10.log"), 2);
    assert_eq!(engine.stats().resyncs, 0);
}

#[tokio::test]
async fn listed_file_that_stays_missing_uses_every_attempt() {
    let h = TestHarness::new();
    h.set_cursor("1_5.log");
    h.source.set_index(&["1_5.log", "1_6.log", "1_7.log"]);

    let mut engine = h.engine();
    let outcome = engine.handle_file(&id("1_6.log")).await.unwrap();

    assert_eq!(outcome, FileOutcome::Failed);
    assert_eq!(h.source.request_count("1_6.log"), 4);
    assert_eq!(h.stored_cursor().as_deref(), Some("1_6.log"));
    assert_eq!(h.syslog.session_count(), 0);
    assert_eq!(engine.stats().resyncs, 0);
}

#[tokio::test]
async fn listed_file_is_delivered_once_it_appears() {
    let h = TestHarness::new();
    h.set_cursor("1_5.log");
    h.source.set_index(&["1_5.log", "1_6.log", "1_7.log"]);
    h.source.queue("1_6.log", Reply::NotFound);
    h.serve("1_6.log");

    let mut engine = h.engine();
    let outcome = engine.handle_file(&id("1_6.log")).await.unwrap();

    assert_eq!(outcome, FileOutcome::Delivered);
    assert_eq!(h.source.request_count("1_6.log"), 2);
    assert_eq!(h.syslog.messages(), vec!["1_6.log payload".to_string()]);
}

#[tokio::test]
async fn steady_run_commits_listed_file_after_late_arrival() {
    let h = TestHarness::new();
    h.set_cursor("1_5.log");
    h.source.set_index(&["1_5.log", "1_6.log", "1_7.log"]);
    h.source.queue("1_6.log", Reply::NotFound);
    h.source.queue("1_6.log", Reply::NotFound);
    h.serve("1_6.log");

    let mut engine = h.engine();
    engine.run_once().await.unwrap();

    assert_eq!(h.stored_cursor().as_deref(), Some("1_6.log"));
    assert_eq!(engine.cursor(), Some(id("1_6.log")));
    assert_eq!(h.source.request_count("1_6.log"), 3);
    assert_eq!(engine.stats().delivered, 1);

    // The next iteration moves on to the following file.
    h.serve("1_7.log");
    engine.run_once().await.unwrap();
    assert_eq!(h.stored_cursor().as_deref(), Some("1_7.log"));
}

#[tokio::test]
async fn unlisted_gap_inside_bounds_is_retried() {
    let h = TestHarness::new();
    h.set_cursor("1_5.log");
    h.source.set_index(&["1_5.log", "1_7.log"]);

    let mut engine = h.engine();
    let outcome = engine.handle_file(&id("1_6.log")).await.unwrap();

    assert_eq!(outcome, FileOutcome::Failed);
    assert_eq!(h.source.request_count("1_6.log"), 4);
    assert_eq!(h.stored_cursor().as_deref(), Some("1_5.log"));
}

#[tokio::test]
async fn failed_resync_index_counts_as_an_attempt() {
    let h = TestHarness::new();
    h.source.set(INDEX, Reply::Status(502));

    let mut engine = h.engine();
    let outcome = engine.handle_file(&id("1_3.log")).await.unwrap();

    assert_eq!(outcome, FileOutcome::Failed);
    assert_eq!(h.source.request_count("1_3.log"), 4);
    assert_eq!(h.source.request_count(INDEX), 4);
}

#[tokio::test]
async fn bounds_compare_sequence_across_prefixes() {
    let h = TestHarness::new();
    h.set_cursor("1_2.log");
    h.source.set_index(&["2_5.log", "2_9.log"]);

    let mut engine = h.engine();
    let outcome = engine.handle_file(&id("1_3.log")).await.unwrap();

    assert_eq!(outcome, FileOutcome::Resynced);
    assert_eq!(h.stored_cursor().as_deref(), Some("2_5.log"));
}
