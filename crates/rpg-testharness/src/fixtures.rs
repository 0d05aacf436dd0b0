//! ---
//! rpg_section: "04-test-harness"
//! rpg_subsection: "module"
//! rpg_type: "source"
//! rpg_scope: "code"
//! rpg_description: "Canned remote systems shared by test suites."
//! rpg_version: "v0.1.0"
//! rpg_owner: "tbd"
//! ---
use serde_json::json;

use crate::server::{CannedResponse, FakeServer};

/// One `turtle_sim` container `c1` hosting a single `get_profile` process `p1`.
pub fn minimal_turtle_sim() -> FakeServer {
    FakeServer::new()
        .system(json!({"containers": {"c1": {"type_name": "turtle_sim"}}}))
        .container("c1", json!({"type_name": "turtle_sim", "processes": ["p1"]}))
        .process("p1", json!({"type_name": "get_profile"}))
        .on_call("p1", json!({"name": "turtle_sim", "turtles": 2}))
}

/// A simulator container plus two turtles, in the shape the original server
/// reports (`core_store.containers`). Poses come back as `[timestamp, [x, y, th]]`.
pub fn turtle_fleet() -> FakeServer {
    FakeServer::new()
        .system(json!({
            "core_store": {
                "containers": {
                    "core://core/Container/sim0::turtle_sim": {},
                    "core://core/Container/t0::turtle": {},
                    "core://core/Container/t1::turtle": {}
                }
            }
        }))
        .container(
            "core://core/Container/sim0::turtle_sim",
            json!({
                "type_name": "turtle_sim",
                "processes": [
                    "core://core/ContainerProcess/sim0_profile::get_profile",
                    "core://core/ContainerProcess/sim0_map::get_map"
                ]
            }),
        )
        .container(
            "core://core/Container/t0::turtle",
            json!({
                "type_name": "turtle",
                "processes": [
                    "core://core/ContainerProcess/t0_pose::get_pose",
                    "core://core/ContainerProcess/t0_vel::set_target_velocity",
                    "core://core/ContainerProcess/t0_lidar::get_lidar"
                ]
            }),
        )
        .container(
            "core://core/Container/t1::turtle",
            json!({
                "type_name": "turtle",
                "processes": [
                    "core://core/ContainerProcess/t1_pose::get_pose",
                    "core://core/ContainerProcess/t1_vel::set_target_velocity"
                ]
            }),
        )
        .process(
            "core://core/ContainerProcess/sim0_profile::get_profile",
            json!({"type_name": "get_profile"}),
        )
        .process(
            "core://core/ContainerProcess/sim0_map::get_map",
            json!({"type_name": "get_map"}),
        )
        .process(
            "core://core/ContainerProcess/t0_pose::get_pose",
            json!({"type_name": "get_pose"}),
        )
        .process(
            "core://core/ContainerProcess/t0_vel::set_target_velocity",
            json!({"type_name": "set_target_velocity"}),
        )
        .process(
            "core://core/ContainerProcess/t0_lidar::get_lidar",
            json!({"type_name": "get_lidar"}),
        )
        .process(
            "core://core/ContainerProcess/t1_pose::get_pose",
            json!({"type_name": "get_pose"}),
        )
        .process(
            "core://core/ContainerProcess/t1_vel::set_target_velocity",
            json!({"type_name": "set_target_velocity"}),
        )
        .on_call(
            "core://core/ContainerProcess/t0_pose::get_pose",
            json!([1000, [0.5, -0.25, 1.57]]),
        )
        .on_call(
            "core://core/ContainerProcess/t1_pose::get_pose",
            json!([1000, [-1.0, 2.0, 0.0]]),
        )
        .on_call(
            "core://core/ContainerProcess/t0_vel::set_target_velocity",
            json!(null),
        )
        .on_call(
            "core://core/ContainerProcess/t0_lidar::get_lidar",
            json!({"ranges": [1.0, 1.5, 2.0], "angle_min": -0.5, "angle_increment": 0.5}),
        )
        .on_call(
            "core://core/ContainerProcess/sim0_map::get_map",
            CannedResponse::Binary {
                content_type: "image/png".into(),
                body: bytes::Bytes::from_static(b"\x89PNG\r\n\x1a\n"),
            },
        )
        .list(
            "container",
            json!([
                "core://core/Container/sim0::turtle_sim",
                "core://core/Container/t0::turtle",
                "core://core/Container/t1::turtle"
            ]),
        )
}
