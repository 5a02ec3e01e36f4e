//! Playbook and workflow operations end to end.

mod common;

use axum::http::{Method, StatusCode};
use common::*;
use serde_json::json;

#[tokio::test]
async fn copying_a_playbook_regenerates_every_id() {
    let app = test_app().await;
    let source = create_playbook(&app, "P1", vec![placeholder_workflow("W1")]).await;
    let source_wf = &source["workflows"][0];
    assert_eq!(source_wf["start"], "a1");

    let uri = format!("/api/playbooks/{}/copy", id_of(&source));
    let (status, copy) = send(&app, Method::POST, &uri, Some(&admin()), Some(json!({}))).await;
    assert_eq!(status, StatusCode::CREATED, "{copy}");
    assert_eq!(copy["name"], "P1_Copy");
    assert_ne!(copy["id"], source["id"]);

    let copy_wf = &copy["workflows"][0];
    assert_eq!(copy_wf["name"], "W1");
    assert_ne!(copy_wf["id"], source_wf["id"]);
    assert_ne!(copy_wf["start"], "a1");

    // Source is unchanged.
    let (status, reread) = send(&app, Method::GET, &format!("/api/playbooks/{}", id_of(&source)), Some(&admin()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reread, source);

    let (_, listing) = send(&app, Method::GET, "/api/playbooks", Some(&admin()), None).await;
    let names: Vec<_> = listing.as_array().unwrap().iter().map(|p| p["name"].clone()).collect();
    assert_eq!(names, vec![json!("P1"), json!("P1_Copy")]);
}

#[tokio::test]
async fn copied_graph_keeps_its_wiring() {
    let app = test_app().await;
    let source = create_playbook(&app, "Wired", vec![wired_workflow("W")]).await;
    let uri = format!("/api/playbooks/{}/copy", id_of(&source));
    let (status, copy) = send(&app, Method::POST, &uri, Some(&admin()), Some(json!({ "name": "Rewired" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(copy["name"], "Rewired");

    let wf = &copy["workflows"][0];
    let a = wf["actions"][0]["id"].as_str().unwrap();
    let b = wf["actions"][1]["id"].as_str().unwrap();
    assert_ne!(a, "a");
    assert_ne!(b, "b");
    assert_eq!(wf["start"], a);
    assert_eq!(wf["branches"][0]["source_id"], a);
    assert_eq!(wf["branches"][0]["destination_id"], b);
    assert_eq!(wf["actions"][1]["arguments"][0]["reference"], a);
}

#[tokio::test]
async fn create_with_source_is_a_copy() {
    let app = test_app().await;
    let source = create_playbook(&app, "Template", vec![placeholder_workflow("W1")]).await;

    let uri = format!("/api/playbooks?source={}", id_of(&source));
    let (status, copy) = send(&app, Method::POST, &uri, Some(&admin()), Some(json!({ "name": "FromTemplate" }))).await;
    assert_eq!(status, StatusCode::CREATED, "{copy}");
    assert_eq!(copy["name"], "FromTemplate");
    assert_eq!(copy["workflows"][0]["name"], "W1");

    let (status, body) = send(&app, Method::POST, "/api/playbooks?source=bogus", Some(&admin()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "invalid_identifier");
}

#[tokio::test]
async fn duplicate_playbook_name_conflicts() {
    let app = test_app().await;
    create_playbook(&app, "Dup", vec![]).await;

    let (status, body) = send(&app, Method::POST, "/api/playbooks", Some(&admin()), Some(json!({ "name": "Dup" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "conflict");
    assert_eq!(body["error"], "Unique constraint failed.");

    let (_, listing) = send(&app, Method::GET, "/api/playbooks", Some(&admin()), None).await;
    assert_eq!(listing.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn missing_name_is_invalid_input() {
    let app = test_app().await;
    let (status, body) = send(&app, Method::POST, "/api/playbooks", Some(&admin()), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_input");
}

#[tokio::test]
async fn listing_is_ordered_case_insensitively() {
    let app = test_app().await;
    create_playbook(&app, "beta", vec![]).await;
    create_playbook(&app, "gamma", vec![]).await;
    create_playbook(&app, "Alpha", vec![placeholder_workflow("zeta"), placeholder_workflow("Eta")]).await;

    let (status, listing) = send(&app, Method::GET, "/api/playbooks", Some(&admin()), None).await;
    assert_eq!(status, StatusCode::OK);
    let playbooks = listing.as_array().unwrap();
    let names: Vec<_> = playbooks.iter().map(|p| p["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["Alpha", "beta", "gamma"]);

    let workflows = playbooks[0]["workflows"].as_array().unwrap();
    let wf_names: Vec<_> = workflows.iter().map(|w| w["name"].as_str().unwrap()).collect();
    assert_eq!(wf_names, ["Eta", "zeta"]);
    // Summaries carry ids and names only.
    assert!(workflows[0].get("start").is_none());

    let (_, full) = send(&app, Method::GET, "/api/playbooks?full=true", Some(&admin()), None).await;
    assert_eq!(full[0]["workflows"][0]["start"], "a1");
}

#[tokio::test]
async fn workflows_are_ordered_case_insensitively_in_every_view() {
    let app = test_app().await;
    let playbook = create_playbook(
        &app,
        "P",
        vec![placeholder_workflow("zeta"), placeholder_workflow("Eta"), placeholder_workflow("beta")],
    )
    .await;
    let expected = ["beta", "Eta", "zeta"];
    let names = |workflows: &serde_json::Value| -> Vec<String> {
        workflows
            .as_array()
            .unwrap()
            .iter()
            .map(|w| w["name"].as_str().unwrap().to_string())
            .collect()
    };

    let pb_uri = format!("/api/playbooks/{}", id_of(&playbook));
    let (status, workflows) = send(&app, Method::GET, &format!("{pb_uri}/workflows"), Some(&admin()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&workflows), expected);

    let (_, read) = send(&app, Method::GET, &pb_uri, Some(&admin()), None).await;
    assert_eq!(names(&read["workflows"]), expected);

    let (_, full) = send(&app, Method::GET, "/api/playbooks?full=true", Some(&admin()), None).await;
    assert_eq!(names(&full[0]["workflows"]), expected);

    let (_, summary) = send(&app, Method::GET, "/api/playbooks", Some(&admin()), None).await;
    assert_eq!(names(&summary[0]["workflows"]), expected);
}

#[tokio::test]
async fn update_playbook_takes_its_id_from_the_body() {
    let app = test_app().await;
    let playbook = create_playbook(&app, "Old", vec![placeholder_workflow("W1")]).await;
    create_playbook(&app, "Taken", vec![]).await;

    let (status, updated) = send(
        &app,
        Method::PUT,
        "/api/playbooks",
        Some(&admin()),
        Some(json!({ "id": id_of(&playbook), "name": "New" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "New");
    assert_eq!(updated["workflows"][0]["name"], "W1");

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/playbooks",
        Some(&admin()),
        Some(json!({ "id": id_of(&playbook), "name": "Taken" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, Method::PUT, "/api/playbooks", Some(&admin()), Some(json!({ "id": "x" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "invalid_identifier");
}

#[tokio::test]
async fn update_with_an_empty_name_keeps_the_old_one() {
    let app = test_app().await;
    let playbook = create_playbook(&app, "Kept", vec![placeholder_workflow("W1")]).await;

    let (status, updated) = send(
        &app,
        Method::PUT,
        "/api/playbooks",
        Some(&admin()),
        Some(json!({ "id": id_of(&playbook), "name": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["name"], "Kept");
    assert_eq!(updated["id"], playbook["id"]);

    let uri = format!("/api/playbooks/{}/workflows", id_of(&playbook));
    let mut body = placeholder_workflow("");
    body["id"] = playbook["workflows"][0]["id"].clone();
    let (status, updated) = send(&app, Method::PUT, &uri, Some(&admin()), Some(body)).await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["name"], "W1");
}

#[tokio::test]
async fn update_without_an_id_is_invalid_input() {
    let app = test_app().await;
    let playbook = create_playbook(&app, "P1", vec![placeholder_workflow("W1")]).await;

    let (status, body) = send(&app, Method::PUT, "/api/playbooks", Some(&admin()), Some(json!({ "name": "X" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_input");

    let uri = format!("/api/playbooks/{}/workflows", id_of(&playbook));
    let (status, body) = send(&app, Method::PUT, &uri, Some(&admin()), Some(json!({ "name": "X" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_input");
}

#[tokio::test]
async fn delete_playbook_then_read_is_not_found() {
    let app = test_app().await;
    let playbook = create_playbook(&app, "Gone", vec![placeholder_workflow("W1")]).await;
    let uri = format!("/api/playbooks/{}", id_of(&playbook));

    let (status, body) = send(&app, Method::DELETE, &uri, Some(&admin()), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, _) = send(&app, Method::GET, &uri, Some(&admin()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_workflow_requires_start_and_valid_elements() {
    let app = test_app().await;
    let playbook = create_playbook(&app, "P1", vec![placeholder_workflow("W1")]).await;
    let uri = format!("/api/playbooks/{}/workflows", id_of(&playbook));

    let (status, body) = send(&app, Method::POST, &uri, Some(&admin()), Some(json!({ "name": "NoStart" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "\"start\" is a required field");

    // An explicit null reads the same as an absent start.
    let (status, body) = send(&app, Method::POST, &uri, Some(&admin()), Some(json!({ "name": "NullStart", "start": null }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "\"start\" is a required field");

    let mut broken = wired_workflow("Broken");
    broken["branches"][0]["destination_id"] = json!("ghost");
    let (status, body) = send(&app, Method::POST, &uri, Some(&admin()), Some(broken)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_input");

    let (status, created) = send(&app, Method::POST, &uri, Some(&admin()), Some(wired_workflow("W2"))).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["playbook_id"], playbook["id"]);

    let (_, workflows) = send(&app, Method::GET, &uri, Some(&admin()), None).await;
    assert_eq!(workflows.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn create_workflow_in_missing_playbook_is_not_found() {
    let app = test_app().await;
    let uri = format!("/api/playbooks/{}/workflows", uuid::Uuid::new_v4());
    let (status, body) = send(&app, Method::POST, &uri, Some(&admin()), Some(placeholder_workflow("W"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");
}

#[tokio::test]
async fn update_workflow_replaces_name_and_graph() {
    let app = test_app().await;
    let playbook = create_playbook(&app, "P1", vec![placeholder_workflow("W1")]).await;
    let wf_id = playbook["workflows"][0]["id"].clone();
    let uri = format!("/api/playbooks/{}/workflows", id_of(&playbook));

    let mut body = wired_workflow("Renamed");
    body["id"] = wf_id.clone();
    let (status, updated) = send(&app, Method::PUT, &uri, Some(&admin()), Some(body)).await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["id"], wf_id);
    assert_eq!(updated["name"], "Renamed");
    assert_eq!(updated["actions"].as_array().unwrap().len(), 2);

    let (status, _) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&admin()),
        Some(json!({ "id": uuid::Uuid::new_v4().to_string(), "start": "a1" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_the_last_workflow_removes_the_playbook() {
    let app = test_app().await;
    let playbook = create_playbook(&app, "P1", vec![placeholder_workflow("W1"), placeholder_workflow("W2")]).await;
    let pb_uri = format!("/api/playbooks/{}", id_of(&playbook));

    for (remaining, wf) in [(1usize, &playbook["workflows"][0]), (0, &playbook["workflows"][1])] {
        let uri = format!("{pb_uri}/workflows/{}", wf["id"].as_str().unwrap());
        let (status, _) = send(&app, Method::DELETE, &uri, Some(&admin()), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(&app, Method::GET, &pb_uri, Some(&admin()), None).await;
        if remaining > 0 {
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["workflows"].as_array().unwrap().len(), remaining);
        } else {
            assert_eq!(status, StatusCode::NOT_FOUND);
        }
    }
}

#[tokio::test]
async fn copy_workflow_within_and_across_playbooks() {
    let app = test_app().await;
    let source = create_playbook(&app, "Src", vec![wired_workflow("W")]).await;
    let dest = create_playbook(&app, "Dest", vec![]).await;
    let wf_uri = format!(
        "/api/playbooks/{}/workflows/{}",
        id_of(&source),
        source["workflows"][0]["id"].as_str().unwrap()
    );

    let (status, same) = send(&app, Method::POST, &format!("{wf_uri}/copy"), Some(&admin()), None).await;
    assert_eq!(status, StatusCode::CREATED, "{same}");
    assert_eq!(same["name"], "W_Copy");
    assert_eq!(same["playbook_id"], source["id"]);

    // Same name again in the same playbook.
    let (status, _) = send(&app, Method::POST, &format!("{wf_uri}/copy"), Some(&admin()), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, moved) = send(
        &app,
        Method::POST,
        &format!("{wf_uri}/copy"),
        Some(&admin()),
        Some(json!({ "playbook_id": id_of(&dest), "name": "W" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(moved["playbook_id"], dest["id"]);
    assert_eq!(moved["name"], "W");

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("{wf_uri}/copy"),
        Some(&admin()),
        Some(json!({ "playbook_id": uuid::Uuid::new_v4().to_string() })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Playbook does not exist.");
}

#[tokio::test]
async fn create_workflow_with_source_copies_it() {
    let app = test_app().await;
    let playbook = create_playbook(&app, "P1", vec![placeholder_workflow("W1")]).await;
    let wf_id = playbook["workflows"][0]["id"].as_str().unwrap();

    let uri = format!("/api/playbooks/{}/workflows?source={wf_id}", id_of(&playbook));
    let (status, copy) = send(&app, Method::POST, &uri, Some(&admin()), Some(json!({ "name": "Twin" }))).await;
    assert_eq!(status, StatusCode::CREATED, "{copy}");
    assert_eq!(copy["name"], "Twin");
    assert_ne!(copy["id"], wf_id);
    assert_ne!(copy["start"], "a1");
}
