//! ---
//! rpg_section: "06-testing"
//! rpg_subsection: "integration-tests"
//! rpg_type: "source"
//! rpg_scope: "code"
//! rpg_description: "Discovery and invocation scenarios over HTTP against a fake system."
//! rpg_version: "v0.1.0"
//! rpg_owner: "tbd"
//! ---
use rpg_client::{ClientError, Payload, Query, System};
use rpg_common::config::EndpointConfig;
use rpg_testharness::fixtures::{minimal_turtle_sim, turtle_fleet};
use rpg_testharness::{CannedResponse, FakeServerHandle};
use serde_json::json;

fn connect(server: &FakeServerHandle) -> System {
    System::connect(&EndpointConfig {
        base_url: server.base_url(),
        ..EndpointConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn minimal_system_walkthrough() {
    let server = minimal_turtle_sim().spawn().await.unwrap();
    let mut system = connect(&server);

    system.setup().await.unwrap();
    let ids: Vec<String> = system
        .container_ids()
        .unwrap()
        .into_iter()
        .map(|id| id.to_string())
        .collect();
    assert_eq!(ids, vec!["c1"]);

    let container = system
        .container(&Query::by_type("turtle_sim"))
        .await
        .unwrap()
        .expect("turtle_sim container");
    assert_eq!(container.identifier().as_str(), "c1");
    let process = container
        .process(&Query::by_type("get_profile"))
        .await
        .unwrap()
        .expect("get_profile process")
        .clone();
    assert_eq!(process.identifier().as_str(), "p1");

    let result = process.call(None).await;
    assert_eq!(
        result,
        Some(Payload::Json(json!({"name": "turtle_sim", "turtles": 2})))
    );
    let calls = server.recorded_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].body, json!({}));

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn missing_type_names_return_none() {
    let server = minimal_turtle_sim().spawn().await.unwrap();
    let mut system = connect(&server);
    system.setup().await.unwrap();

    assert!(system
        .container(&Query::by_type("turtle"))
        .await
        .unwrap()
        .is_none());
    let container = system
        .container(&Query::by_type("turtle_sim"))
        .await
        .unwrap()
        .unwrap();
    assert!(container
        .process(&Query::by_type("get_pose"))
        .await
        .unwrap()
        .is_none());

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn server_error_on_call_yields_none() {
    let server = minimal_turtle_sim().spawn().await.unwrap();
    server.set_call("p1", CannedResponse::Status(500));
    let mut system = connect(&server);
    system.setup().await.unwrap();

    let process = system
        .container(&Query::by_type("turtle_sim"))
        .await
        .unwrap()
        .unwrap()
        .process(&Query::by_type("get_profile"))
        .await
        .unwrap()
        .unwrap()
        .clone();
    assert_eq!(process.call(None).await, None);
    // The failure does not poison later calls.
    server.set_call("p1", json!({"ok": true}));
    assert_eq!(process.call(None).await, Some(Payload::Json(json!({"ok": true}))));

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn setup_twice_reflects_server_changes() {
    let server = minimal_turtle_sim().spawn().await.unwrap();
    let mut system = connect(&server);

    system.setup().await.unwrap();
    let first = system.profile().unwrap().clone();
    system.setup().await.unwrap();
    assert_eq!(system.profile().unwrap(), &first);

    server.set_system(json!({"containers": {"c1": {}, "c2": {}}}));
    server.set_container("c2", json!({"type_name": "turtle", "processes": []}));
    system.setup().await.unwrap();
    let ids: Vec<&str> = system
        .container_ids()
        .unwrap()
        .into_iter()
        .map(|id| id.as_str())
        .collect();
    assert_eq!(ids, vec!["c1", "c2"]);

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn fleet_containers_follow_profile_order() {
    let server = turtle_fleet().spawn().await.unwrap();
    let mut system = connect(&server);
    system.setup().await.unwrap();

    let mut described = Vec::new();
    for container in system.containers().await.unwrap() {
        let type_name = container.type_name().unwrap().to_owned();
        let processes = container.processes().await.unwrap().len();
        described.push((container.identifier().to_string(), type_name, processes));
    }
    assert_eq!(
        described,
        vec![
            ("core://core/Container/sim0::turtle_sim".to_owned(), "turtle_sim".to_owned(), 2),
            ("core://core/Container/t0::turtle".to_owned(), "turtle".to_owned(), 3),
            ("core://core/Container/t1::turtle".to_owned(), "turtle".to_owned(), 2),
        ]
    );

    let turtles = system.containers_by_type("turtle").await.unwrap();
    assert_eq!(turtles.len(), 2);

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn fleet_payload_shapes() {
    let server = turtle_fleet().spawn().await.unwrap();
    let mut system = connect(&server);
    system.setup().await.unwrap();

    let sim = system
        .container(&Query::by_type("turtle_sim"))
        .await
        .unwrap()
        .unwrap();
    let map = sim
        .process(&Query::by_type("get_map"))
        .await
        .unwrap()
        .unwrap()
        .call(None)
        .await
        .unwrap();
    match map {
        Payload::Binary {
            content_type,
            bytes,
        } => {
            assert_eq!(content_type.as_deref(), Some("image/png"));
            assert!(bytes.starts_with(b"\x89PNG"));
        }
        other => panic!("expected binary payload, got {other:?}"),
    }

    let turtle = system
        .container(&Query::by_type("turtle"))
        .await
        .unwrap()
        .unwrap();
    let velocity = turtle
        .process(&Query::by_type("set_target_velocity"))
        .await
        .unwrap()
        .unwrap()
        .clone();
    let ack = velocity
        .call(Some(&json!({"vx": 0.1, "vy": 0.0, "wz": 0.2})))
        .await;
    assert_eq!(ack, Some(Payload::Json(json!(null))));
    let calls = server.recorded_calls();
    assert_eq!(calls.last().unwrap().body, json!({"vx": 0.1, "vy": 0.0, "wz": 0.2}));

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn uninitialized_system_is_an_error() {
    let server = minimal_turtle_sim().spawn().await.unwrap();
    let mut system = connect(&server);

    assert!(matches!(
        system.container_ids(),
        Err(ClientError::Uninitialized { .. })
    ));
    assert!(matches!(
        system.containers().await,
        Err(ClientError::Uninitialized { .. })
    ));
    assert_eq!(server.read_count("system/"), 0);

    server.shutdown().await.unwrap();
}
