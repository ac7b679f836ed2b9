//! Action queue and search debouncer exercised through the public API, with
//! a consumer that acknowledges deliveries the way the explorer loop does.

use std::time::Duration;

use tokio::time::{timeout, Instant};

use wikigraph::pipeline::{
    ActionQueue, SearchDebouncer, SearchInput, DEFAULT_ACTION_INTERVAL, DEFAULT_DEBOUNCE,
    DEFAULT_QUEUE_CAPACITY,
};
use wikigraph::types::ActionKind;

#[tokio::test(start_paused = true)]
async fn acknowledged_deliveries_free_slots_in_order() {
    let (queue, mut deliveries) = ActionQueue::spawn(DEFAULT_QUEUE_CAPACITY, DEFAULT_ACTION_INTERVAL);
    let start = Instant::now();

    for id in ["A", "B", "C"] {
        queue.enqueue(ActionKind::Expand, id).unwrap();
    }
    assert!(queue.enqueue(ActionKind::Expand, "D").unwrap_err().is_queue_full());

    let first = deliveries.recv().await.unwrap();
    assert_eq!(first.node_id, "A");
    assert_eq!(start.elapsed(), Duration::from_secs(1));

    // Delivered but not yet acknowledged: still occupies a slot.
    assert_eq!(queue.len(), 3);
    assert_eq!(queue.dequeue().unwrap().node_id, "A");
    queue.enqueue(ActionKind::Collapse, "D").unwrap();

    let mut order = Vec::new();
    for _ in 0..3 {
        let action = deliveries.recv().await.unwrap();
        queue.dequeue();
        order.push((action.node_id, action.kind));
    }
    assert_eq!(
        order,
        vec![
            ("B".to_string(), ActionKind::Expand),
            ("C".to_string(), ActionKind::Expand),
            ("D".to_string(), ActionKind::Collapse),
        ]
    );
    assert_eq!(start.elapsed(), Duration::from_secs(4));
    assert!(queue.is_empty());
}

#[tokio::test(start_paused = true)]
async fn idle_queue_delivers_one_interval_after_enqueue() {
    let (queue, mut deliveries) = ActionQueue::spawn(DEFAULT_QUEUE_CAPACITY, Duration::from_millis(250));
    tokio::time::sleep(Duration::from_secs(10)).await;

    let enqueued = Instant::now();
    queue.enqueue(ActionKind::Expand, "A").unwrap();
    deliveries.recv().await.unwrap();
    assert_eq!(enqueued.elapsed(), Duration::from_millis(250));
}

#[tokio::test(start_paused = true)]
async fn pending_reports_oldest_first() {
    let (queue, _deliveries) = ActionQueue::spawn(2, DEFAULT_ACTION_INTERVAL);
    queue.enqueue(ActionKind::Expand, "A").unwrap();
    queue.enqueue(ActionKind::Collapse, "B").unwrap();
    let pending: Vec<_> = queue
        .pending()
        .into_iter()
        .map(|a| (a.kind, a.node_id))
        .collect();
    assert_eq!(
        pending,
        vec![
            (ActionKind::Expand, "A".to_string()),
            (ActionKind::Collapse, "B".to_string()),
        ]
    );
    assert_eq!(queue.capacity(), 2);
}

#[tokio::test(start_paused = true)]
async fn debouncer_settles_on_pauses_between_bursts() {
    let (search, mut rx) = SearchDebouncer::spawn(DEFAULT_DEBOUNCE);

    search.submit("gra");
    tokio::time::sleep(Duration::from_millis(400)).await;
    search.submit("graph");
    let start = Instant::now();
    assert_eq!(rx.recv().await, Some(SearchInput::Query("graph".into())));
    assert_eq!(start.elapsed(), DEFAULT_DEBOUNCE);

    search.submit("graph t");
    search.submit("graph th");
    assert_eq!(rx.recv().await, Some(SearchInput::Query("graph th".into())));

    search.submit("");
    assert_eq!(rx.recv().await, Some(SearchInput::Clear));
}

#[tokio::test(start_paused = true)]
async fn typing_back_to_the_last_query_is_silent() {
    let (search, mut rx) = SearchDebouncer::spawn(DEFAULT_DEBOUNCE);
    search.submit("tree");
    assert_eq!(rx.recv().await, Some(SearchInput::Query("tree".into())));

    search.submit("trees");
    search.submit("tree");
    let next = timeout(Duration::from_secs(5), rx.recv()).await;
    assert!(next.is_err(), "unexpected emission: {next:?}");
}

#[tokio::test(start_paused = true)]
async fn dropping_the_debouncer_flushes_and_closes() {
    let (search, mut rx) = SearchDebouncer::spawn(DEFAULT_DEBOUNCE);
    search.submit("euler");
    drop(search);
    assert_eq!(rx.recv().await, Some(SearchInput::Query("euler".into())));
    assert_eq!(rx.recv().await, None);
}
