//! Integration tests exercising the router end to end against an in-memory
//! SQLite store.

use std::{collections::HashSet, sync::Arc};

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode},
};
use conform_core::{access::OrgRole, catalog::FrameworkCatalog};
use conform_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::AppState;

struct Harness {
  router: Router,
  store:  Arc<SqliteStore>,
  admin:  Uuid,
}

async fn harness() -> Harness {
  let store = Arc::new(SqliteStore::open_in_memory().await.expect("store"));
  let admin = Uuid::new_v4();
  let state = AppState {
    store:           store.clone(),
    catalog:         Arc::new(FrameworkCatalog::builtin().expect("catalog")),
    instance_admins: Arc::new(HashSet::from([admin])),
  };
  Harness { router: crate::api_router(state), store, admin }
}

async fn send(
  router: &Router,
  method: &str,
  uri: &str,
  user: Option<Uuid>,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut req = Request::builder().method(method).uri(uri);
  if let Some(user) = user {
    req = req.header("x-user-id", user.to_string());
  }
  let req = match body {
    Some(v) => req
      .header("content-type", "application/json")
      .body(Body::from(v.to_string())),
    None => req.body(Body::empty()),
  }
  .expect("request");

  let resp = router.clone().oneshot(req).await.expect("response");
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .expect("body");
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).expect("json body")
  };
  (status, value)
}

#[tokio::test]
async fn health_needs_no_auth() {
  let h = harness().await;
  let (status, body) = send(&h.router, "GET", "/health", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn missing_user_header_is_unauthorized() {
  let h = harness().await;
  let (status, _) = send(&h.router, "GET", "/assessments", None, None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_creates_and_fetches_an_assessment() {
  let h = harness().await;

  let (status, created) = send(
    &h.router,
    "POST",
    "/assessments",
    Some(h.admin),
    Some(json!({"title": "Q3 PCI audit", "framework": "PCI DSS 4.0"})),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(created["column"], "backlog");
  assert_eq!(created["due_in"], "30 days");

  let id = created["id"].as_str().unwrap();
  let (status, fetched) = send(
    &h.router,
    "GET",
    &format!("/assessments/{id}"),
    Some(h.admin),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(fetched["title"], "Q3 PCI audit");
}

#[tokio::test]
async fn empty_title_is_rejected() {
  let h = harness().await;
  let (status, _) = send(
    &h.router,
    "POST",
    "/assessments",
    Some(h.admin),
    Some(json!({"title": "  "})),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stranger_gets_403_and_viewer_collaborator_reads_only() {
  use conform_core::{
    access::CollaboratorRole, assessment::NewAssessment,
    store::AssessmentStore,
  };

  let h = harness().await;
  let assessment = h
    .store
    .create_assessment(NewAssessment::new("shared"))
    .await
    .unwrap();
  let id = assessment.id;

  let stranger = Uuid::new_v4();
  let (status, _) = send(
    &h.router,
    "GET",
    &format!("/assessments/{id}"),
    Some(stranger),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let viewer = Uuid::new_v4();
  h.store
    .upsert_collaborator(id, viewer, CollaboratorRole::Viewer)
    .await
    .unwrap();

  let (status, _) = send(
    &h.router,
    "GET",
    &format!("/assessments/{id}/answers"),
    Some(viewer),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  let (status, _) = send(
    &h.router,
    "PATCH",
    &format!("/assessments/{id}/answers"),
    Some(viewer),
    Some(json!({"1.1": {"a": 1}})),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn editor_collaborator_can_share_the_assessment() {
  use conform_core::{
    access::CollaboratorRole, assessment::NewAssessment,
    store::AssessmentStore,
  };

  let h = harness().await;
  let id = h
    .store
    .create_assessment(NewAssessment::new("shared"))
    .await
    .unwrap()
    .id;

  let editor = Uuid::new_v4();
  let viewer = Uuid::new_v4();
  h.store
    .upsert_collaborator(id, editor, CollaboratorRole::Editor)
    .await
    .unwrap();
  h.store
    .upsert_collaborator(id, viewer, CollaboratorRole::Viewer)
    .await
    .unwrap();

  // Write access is enough to manage the ACL; no org role needed.
  let uri = format!("/assessments/{id}/collaborators");
  let invitee = Uuid::new_v4();
  let (status, rows) = send(
    &h.router,
    "POST",
    &uri,
    Some(editor),
    Some(json!({"user_id": invitee, "role": "viewer"})),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(rows.as_array().unwrap().len(), 3);

  let (status, _) = send(
    &h.router,
    "DELETE",
    &format!("{uri}/{invitee}"),
    Some(editor),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  // A read-only collaborator still cannot.
  let (status, _) = send(
    &h.router,
    "POST",
    &uri,
    Some(viewer),
    Some(json!({"user_id": Uuid::new_v4(), "role": "editor"})),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn answers_for_a_missing_assessment_are_404() {
  let h = harness().await;
  let (status, _) = send(
    &h.router,
    "GET",
    &format!("/assessments/{}/answers", Uuid::new_v4()),
    Some(h.admin),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn org_member_capabilities_flow_through_permissions() {
  use conform_core::{assessment::NewAssessment, store::AssessmentStore};

  let h = harness().await;
  let id = h
    .store
    .create_assessment(NewAssessment::new("roles"))
    .await
    .unwrap()
    .id;

  let qa = Uuid::new_v4();
  h.store
    .upsert_membership(qa, Uuid::new_v4(), OrgRole::Qa)
    .await
    .unwrap();

  let (status, caps) = send(
    &h.router,
    "GET",
    &format!("/assessments/{id}/permissions"),
    Some(qa),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(caps, json!({"canRead": true, "canWrite": false}));
}

#[tokio::test]
async fn answers_merge_across_requests() {
  let h = harness().await;

  let (_, created) = send(
    &h.router,
    "POST",
    "/assessments",
    Some(h.admin),
    Some(json!({"title": "merge"})),
  )
  .await;
  let id = created["id"].as_str().unwrap().to_owned();

  let uri = format!("/assessments/{id}/answers");
  send(
    &h.router,
    "PATCH",
    &uri,
    Some(h.admin),
    Some(json!({"3.2": {"segmentationUsed": "Yes"}})),
  )
  .await;
  let (status, merged) = send(
    &h.router,
    "PATCH",
    &uri,
    Some(h.admin),
    Some(json!({"3.2": {"outOfScopeNetworks": "guest"}})),
  )
  .await;

  assert_eq!(status, StatusCode::OK);
  assert_eq!(
    merged["3.2"],
    json!({"segmentationUsed": "Yes", "outOfScopeNetworks": "guest"})
  );
}

#[tokio::test]
async fn structure_resolves_template_and_override() {
  let h = harness().await;

  let (_, created) = send(
    &h.router,
    "POST",
    "/assessments",
    Some(h.admin),
    Some(json!({"title": "structured", "framework": "PCI DSS 4.0"})),
  )
  .await;
  let id = created["id"].as_str().unwrap().to_owned();
  let uri = format!("/assessments/{id}/structure");

  let (status, resolved) = send(&h.router, "GET", &uri, Some(h.admin), None).await;
  assert_eq!(status, StatusCode::OK);
  assert!(resolved["parts"].as_array().unwrap().len() > 1);

  let override_body = json!({"parts": [{
    "title": "Edited",
    "sections": [{"number": "1", "heading": "Scope", "items": []}],
  }]});
  let (status, _) = send(
    &h.router,
    "PUT",
    &uri,
    Some(h.admin),
    Some(override_body),
  )
  .await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (_, resolved) = send(&h.router, "GET", &uri, Some(h.admin), None).await;
  assert_eq!(resolved["parts"][0]["title"], "Edited");
}

#[tokio::test]
async fn message_round_trip_with_threading() {
  let h = harness().await;

  let (_, created) = send(
    &h.router,
    "POST",
    "/assessments",
    Some(h.admin),
    Some(json!({"title": "chatty"})),
  )
  .await;
  let id = created["id"].as_str().unwrap().to_owned();
  let uri = format!("/assessments/{id}/messages");

  let (status, root) = send(
    &h.router,
    "POST",
    &uri,
    Some(h.admin),
    Some(json!({"author": "jo", "text": "kickoff, see #3.2"})),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(root["sections"], json!(["3.2"]));

  let (status, _) = send(
    &h.router,
    "POST",
    &uri,
    Some(h.admin),
    Some(json!({
      "author": "kim",
      "text": "on it",
      "parent_id": root["id"],
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let (_, threads) = send(
    &h.router,
    "GET",
    &format!("{uri}?threaded=true"),
    Some(h.admin),
    None,
  )
  .await;
  let threads = threads.as_array().unwrap();
  assert_eq!(threads.len(), 1);
  assert_eq!(threads[0]["replies"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn replying_to_a_missing_parent_is_a_bad_request() {
  let h = harness().await;

  let (_, created) = send(
    &h.router,
    "POST",
    "/assessments",
    Some(h.admin),
    Some(json!({"title": "strict"})),
  )
  .await;
  let id = created["id"].as_str().unwrap().to_owned();

  let (status, _) = send(
    &h.router,
    "POST",
    &format!("/assessments/{id}/messages"),
    Some(h.admin),
    Some(json!({
      "author": "jo",
      "text": "hello?",
      "parent_id": Uuid::new_v4(),
    })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn section_links_via_the_api() {
  let h = harness().await;

  let (_, created) = send(
    &h.router,
    "POST",
    "/assessments",
    Some(h.admin),
    Some(json!({"title": "evidence"})),
  )
  .await;
  let id = created["id"].as_str().unwrap().to_owned();

  let (status, attachment) = send(
    &h.router,
    "POST",
    &format!("/assessments/{id}/attachments"),
    Some(h.admin),
    Some(json!({"name": "diagram.png", "size": 42})),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let uri = format!("/assessments/{id}/sections/3.2/attachments");
  let (status, linked) = send(
    &h.router,
    "PUT",
    &uri,
    Some(h.admin),
    Some(json!({"add": [attachment["id"]]})),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(linked, json!([attachment["id"]]));

  // Deleting the attachment clears the link.
  let (status, _) = send(
    &h.router,
    "DELETE",
    &format!("/assessments/{id}/attachments/{}", attachment["id"].as_str().unwrap()),
    Some(h.admin),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  let (_, linked) = send(&h.router, "GET", &uri, Some(h.admin), None).await;
  assert_eq!(linked, json!([]));
}

#[tokio::test]
async fn frameworks_endpoint_lists_the_catalog() {
  let h = harness().await;
  let (status, names) =
    send(&h.router, "GET", "/frameworks", Some(h.admin), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(names, json!(["PCI DSS 4.0"]));
}

#[tokio::test]
async fn unknown_assessment_is_404() {
  let h = harness().await;
  let (status, _) = send(
    &h.router,
    "GET",
    &format!("/assessments/{}", Uuid::new_v4()),
    Some(h.admin),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}
