use std::sync::{Arc, Mutex};

use serde_json::json;
use tashreef_core::{GenerationResult, Identity, NavigationDescriptor, WorkflowPhase, WorkflowStatus};
use tashreef_state::{install_navigation, ObservableStateStore, StoreChange};

fn result(svg: &str, pattern: serde_json::Value) -> GenerationResult {
    GenerationResult {
        artifact: svg.to_string(),
        pattern_config: Some(pattern),
        content_config: None,
    }
}

#[test]
fn nav_items_keep_given_order() {
    let store = ObservableStateStore::new();
    let items = vec![
        NavigationDescriptor::new("z", "Zed", "/z", "z"),
        NavigationDescriptor::new("a", "Ay", "/a", "a"),
    ];
    store.set_nav_items(items.clone());
    assert_eq!(*store.nav_items(), items);
}

#[test]
fn new_result_replaces_previous_entirely() {
    let store = ObservableStateStore::new();
    store.set_generation_result(Some(GenerationResult {
        artifact: "<svg>one</svg>".into(),
        pattern_config: Some(json!({ "engine_type": "l_system" })),
        content_config: Some(json!({ "event_title": "You're Invited" })),
    }));
    let second = result("<svg>two</svg>", json!({ "engine_type": "parametric" }));
    store.set_generation_result(Some(second.clone()));

    assert_eq!(*store.generation_result().unwrap(), second);
    assert_eq!(store.generation_result().unwrap().content_config, None);

    store.set_generation_result(None);
    assert!(store.generation_result().is_none());
}

#[test]
fn every_listener_sees_every_write_in_order() {
    let store = ObservableStateStore::new();
    let seen_a = Arc::new(Mutex::new(Vec::new()));
    let seen_b = Arc::new(Mutex::new(Vec::new()));

    let a = {
        let seen = seen_a.clone();
        store.subscribe(move |e| seen.lock().unwrap().push(e.revision))
    };
    let b = {
        let seen = seen_b.clone();
        store.subscribe(move |e| seen.lock().unwrap().push(e.revision))
    };

    for i in 0..10 {
        store.set_generation_result(Some(result(&format!("<svg>{i}</svg>"), json!({}))));
    }
    store.set_workflow_status(WorkflowStatus::pending());

    let expected: Vec<u64> = (1..=11).collect();
    assert_eq!(*seen_a.lock().unwrap(), expected);
    assert_eq!(*seen_b.lock().unwrap(), expected);
    drop((a, b));
}

#[test]
fn listener_can_read_the_committed_value() {
    let store = ObservableStateStore::new();
    let reader = store.clone();
    let seen = Arc::new(Mutex::new(None));
    let _sub = {
        let seen = seen.clone();
        store.subscribe(move |_| *seen.lock().unwrap() = Some(reader.workflow_status().phase))
    };

    store.set_workflow_status(WorkflowStatus::pending());
    assert_eq!(*seen.lock().unwrap(), Some(WorkflowPhase::Pending));
}

#[test]
fn dropping_subscription_stops_delivery() {
    let store = ObservableStateStore::new();
    let count = Arc::new(Mutex::new(0));
    let sub = {
        let count = count.clone();
        store.subscribe(move |_| *count.lock().unwrap() += 1)
    };
    assert_eq!(store.subscriber_count(), 1);

    store.set_generation_result(None);
    sub.unsubscribe();
    store.set_generation_result(None);

    assert_eq!(*count.lock().unwrap(), 1);
    assert_eq!(store.subscriber_count(), 0);
}

#[test]
fn concurrent_writers_never_tear_reads() {
    let store = ObservableStateStore::new();
    let writers: Vec<_> = (0..4)
        .map(|t| {
            let store = store.clone();
            std::thread::spawn(move || {
                for i in 0..200 {
                    let tag = format!("{t}-{i}");
                    store.set_generation_result(Some(result(&tag, json!({ "tag": tag }))));
                }
            })
        })
        .collect();

    let reader = {
        let store = store.clone();
        std::thread::spawn(move || {
            for _ in 0..500 {
                if let Some(r) = store.generation_result() {
                    assert_eq!(r.pattern_config.as_ref().unwrap()["tag"], r.artifact.as_str());
                }
            }
        })
    };

    for w in writers {
        w.join().unwrap();
    }
    reader.join().unwrap();
    assert_eq!(store.revision(), 800);
}

#[tokio::test]
async fn event_stream_delivers_without_loss() {
    let store = ObservableStateStore::new();
    let mut events = store.events();

    install_navigation(&store, &Identity::from_token("abcdef"));
    store.set_workflow_status(WorkflowStatus::pending());
    store.set_generation_result(Some(result("<svg/>", json!({}))));

    let first = events.recv().await.unwrap();
    assert_eq!(first.revision, 1);
    assert!(matches!(first.change, StoreChange::NavItems(ref items) if items.len() == 2));

    let second = events.recv().await.unwrap();
    assert!(matches!(second.change, StoreChange::WorkflowStatus(ref s) if s.is_pending()));

    let third = events.recv().await.unwrap();
    assert_eq!(third.revision, 3);
    assert!(events.try_recv().is_none());

    drop(events);
    assert_eq!(store.subscriber_count(), 0);
}

#[test]
fn navigation_is_rebuilt_when_labels_change() {
    let store = ObservableStateStore::new();
    let identity = Identity::from_token("abcdef");
    install_navigation(&store, &identity);
    assert_eq!(store.nav_items().len(), 2);

    install_navigation(&store, &identity.with_labels(["admin"]));
    assert_eq!(store.nav_items().len(), 3);
}

#[test]
fn completed_generation_is_one_write() {
    let store = ObservableStateStore::new();
    let events = Arc::new(Mutex::new(Vec::new()));
    let _sub = {
        let events = events.clone();
        store.subscribe(move |e| events.lock().unwrap().push(e.clone()))
    };

    let revision = store.complete_generation(result("<svg/>", json!({})), WorkflowStatus::succeeded(10));

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].revision, revision);
    assert!(matches!(
        &events[0].change,
        StoreChange::GenerationCompleted { result, status }
            if result.artifact == "<svg/>" && status.phase == WorkflowPhase::Succeeded
    ));
    assert_eq!(store.workflow_status().phase, WorkflowPhase::Succeeded);
}
