//! Refresh engine end-to-end tests against an HTTP repository

mod helper;

use std::sync::Arc;

use futures::future::join_all;
use mockito::Server;
use tokio::sync::mpsc;

use dependency_updates::engine::{EngineEvent, RefreshOutcome, ResolutionEngine};
use helper::{FakeBuild, compile_report, metadata_xml, settings_for};

fn engine(build: Arc<FakeBuild>) -> ResolutionEngine {
    ResolutionEngine::new("/build", build.clone(), build)
}

#[tokio::test(flavor = "multi_thread")]
async fn shared_module_is_fetched_once_for_all_projects() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/org/x/lib/maven-metadata.xml")
        .with_status(200)
        .with_body(metadata_xml("1.2", &["1.0", "1.1", "1.2"]))
        .expect(1)
        .create_async()
        .await;

    let build = Arc::new(
        FakeBuild::new("demo")
            .with_project(":app", true)
            .with_project(":lib", true)
            .with_report(":app", compile_report(&["org.x:lib:1.0"]))
            .with_report(":lib", compile_report(&["org.x:lib:1.0", "project :app"])),
    );
    let engine = engine(build.clone());

    let outcome = engine.refresh(&settings_for(&server.url())).unwrap();
    assert!(matches!(outcome, RefreshOutcome::Started(_)));
    let tree = engine.wait_idle().await.unwrap();

    mock.assert_async().await;
    let latest: Vec<_> = tree
        .dependencies()
        .map(|(_, dependency)| dependency.latest_version.clone())
        .collect();
    assert_eq!(latest, vec![Some("1.2".to_string()); 2]);
    assert!(tree.is_settled());

    let mut listed = build.listed();
    listed.sort();
    assert_eq!(listed, vec![":", ":app", ":lib"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn engine_is_busy_until_every_lookup_completes() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/org/x/lib/maven-metadata.xml")
        .with_status(200)
        .with_body(metadata_xml("2.0", &[]))
        .create_async()
        .await;

    let build = Arc::new(FakeBuild::new("demo").with_report(":", compile_report(&["org.x:lib:1.0"])));
    let engine = engine(build);
    assert!(engine.is_idle());

    engine.refresh(&settings_for(&server.url())).unwrap();
    assert!(!engine.is_idle());

    let tree = engine.wait_idle().await.unwrap();
    assert!(engine.is_idle());
    let (_, dependency) = tree.dependencies().next().unwrap();
    assert_eq!(dependency.latest_version.as_deref(), Some("2.0"));
}

#[tokio::test(flavor = "multi_thread")]
async fn failing_listing_does_not_stop_sibling_projects() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/org/x/lib/maven-metadata.xml")
        .with_status(200)
        .with_body(metadata_xml("1.1", &[]))
        .create_async()
        .await;

    let build = Arc::new(
        FakeBuild::new("demo")
            .with_project(":broken", true)
            .with_project(":ok", true)
            .with_failing_report(":broken", "Could not resolve all files")
            .with_report(":ok", compile_report(&["org.x:lib:1.0"])),
    );
    let engine = engine(build);

    engine.refresh(&settings_for(&server.url())).unwrap();
    let tree = engine.wait_idle().await.unwrap();

    let broken = tree.get(tree.find_project(":broken").unwrap()).unwrap();
    assert!(broken.error().unwrap().contains("Could not resolve all files"));
    let ok = tree.find_project(":ok").unwrap();
    let (_, dependency) = tree.children(ok).next().unwrap();
    assert_eq!(
        dependency.dependency().unwrap().latest_version.as_deref(),
        Some("1.1")
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn discovery_failure_is_shown_on_root() {
    let engine = engine(Arc::new(FakeBuild::broken()));

    engine
        .refresh(&settings_for("http://127.0.0.1:9/unused"))
        .unwrap();
    let tree = engine.wait_idle().await.unwrap();

    assert_eq!(tree.len(), 1);
    assert!(tree.root().error().unwrap().contains("Could not configure"));
    assert!(tree.is_settled());
}

#[tokio::test(flavor = "multi_thread")]
async fn repository_errors_are_recorded_per_dependency() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/org/x/gone/maven-metadata.xml")
        .with_status(404)
        .create_async()
        .await;
    server
        .mock("GET", "/org/x/lib/maven-metadata.xml")
        .with_status(200)
        .with_body(metadata_xml("1.0", &["1.0"]))
        .create_async()
        .await;

    let build = Arc::new(
        FakeBuild::new("demo").with_report(":", compile_report(&["org.x:gone:1.0", "org.x:lib:1.0"])),
    );
    let engine = engine(build);

    engine.refresh(&settings_for(&server.url())).unwrap();
    let tree = engine.wait_idle().await.unwrap();

    let records: Vec<_> = tree.dependencies().map(|(_, dependency)| dependency.clone()).collect();
    assert_eq!(records[0].error.as_deref(), Some("Test returned 404 Not Found"));
    assert_eq!(records[0].latest_version, None);
    assert_eq!(records[1].error, None);
    assert_eq!(records[1].latest_version, None);
}

#[tokio::test(flavor = "multi_thread")]
async fn events_describe_the_run_in_order() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/org/x/lib/maven-metadata.xml")
        .with_status(200)
        .with_body(metadata_xml("1.5", &[]))
        .create_async()
        .await;

    let build = Arc::new(FakeBuild::new("demo").with_report(":", compile_report(&["org.x:lib:1.0"])));
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let engine = engine(build).with_events(events_tx);

    let RefreshOutcome::Started(run) = engine.refresh(&settings_for(&server.url())).unwrap() else {
        panic!("refresh did not start");
    };
    engine.wait_idle().await.unwrap();

    let mut events = Vec::new();
    while let Some(event) = events_rx.recv().await {
        let finished = matches!(event, EngineEvent::RunFinished { .. });
        events.push(event);
        if finished {
            break;
        }
    }

    assert!(events.iter().all(|event| event.run() == run));
    assert!(matches!(events[0], EngineEvent::RunStarted { .. }));
    assert!(matches!(events[1], EngineEvent::TreeDiscovered { .. }));

    let added = events
        .iter()
        .position(|event| matches!(event, EngineEvent::NodeAdded { .. }))
        .unwrap();
    let resolved = events
        .iter()
        .rposition(|event| match event {
            EngineEvent::NodeUpdated { node, .. } => node
                .dependency()
                .is_some_and(|dependency| dependency.latest_version.as_deref() == Some("1.5")),
            _ => false,
        })
        .unwrap();
    assert!(added < resolved);
}

#[tokio::test(flavor = "multi_thread")]
async fn every_waiter_observes_the_same_final_tree() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/org/x/lib/maven-metadata.xml")
        .with_status(200)
        .with_body(metadata_xml("1.3", &[]))
        .create_async()
        .await;

    let build = Arc::new(FakeBuild::new("demo").with_report(":", compile_report(&["org.x:lib:1.0"])));
    let engine = engine(build);
    engine.refresh(&settings_for(&server.url())).unwrap();

    let trees = join_all((0..3).map(|_| engine.wait_idle())).await;

    let first = trees[0].clone().unwrap();
    assert!(trees.iter().all(|tree| tree.as_ref().is_some_and(|tree| Arc::ptr_eq(tree, &first))));
}
