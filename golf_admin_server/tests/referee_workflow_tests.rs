use golf_admin_server::response::APIErrorResponse;
use sea_orm::prelude::Uuid;
use serde_json::{json, Value};
use tracing_test::traced_test;

mod common;

use common::Fixture;

const TOURNAMENT: u128 = 300;

fn id(value: u128) -> Uuid {
    Uuid::from_u128(value)
}

async fn create_referee(fixture: &mut Fixture, name: &str, zone: u128, level: &str) -> Uuid {
    let mut response = fixture.post_json("/api/users", json!({
        "name": name,
        "email": format!("{}@federgolf.example", name.to_lowercase().replace(' ', ".")),
        "user_type": "referee",
        "zone_id": id(zone),
        "referee_level": level,
    })).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await;
    body["uuid"].as_str().unwrap().parse().unwrap()
}

#[tokio::test]
#[traced_test]
async fn test_tournament_zone_comes_from_club() {
    let mut fixture = Fixture::default().await;
    let mut response = fixture.post_json("/api/tournaments", json!({
        "name": "Coppa del Sud",
        "start_date": "2030-09-01",
        "end_date": "2030-09-02",
        "club_id": id(101),
        "category_id": id(201),
    })).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await;
    assert_eq!(body["zone_id"], id(2).to_string());
    assert_eq!(body["zone_name"], "Zona Sud");
    assert_eq!(body["status"], "draft");
    assert_eq!(body["assignments"], json!([]));
    assert_eq!(body["requirements"]["satisfied"], false);
}

#[tokio::test]
#[traced_test]
async fn test_tournament_dates_are_validated() {
    let mut fixture = Fixture::default().await;
    let mut response = fixture.post_json("/api/tournaments", json!({
        "name": "Coppa Impossibile",
        "start_date": "2030-09-05",
        "end_date": "2030-09-01",
        "club_id": id(100),
        "category_id": id(999),
        "availability_deadline": "2030-09-10",
    })).await;
    assert_eq!(response.status(), 422);
    let body: APIErrorResponse = response.json().await;
    let errors = body.errors.unwrap();
    assert!(errors.contains("end_date"));
    assert!(errors.contains("availability_deadline"));
    assert!(errors.contains("category_id"));
}

#[tokio::test]
#[traced_test]
async fn test_tournament_filters() {
    let mut fixture = Fixture::default().await;
    let mut response = fixture.get(&format!("/api/tournaments?zone_id={}&status=open", id(1))).await;
    let body: Value = response.json().await;
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["club_name"], "Golf Club Milano");

    let mut response = fixture.get("/api/tournaments?from=2031-01-01").await;
    let body: Value = response.json().await;
    assert_eq!(body["meta"]["total"], 0);
}

#[tokio::test]
#[traced_test]
async fn test_tournament_detail_lists_director_first() {
    let mut fixture = Fixture::default().await;
    let mut response = fixture.get(&format!("/api/tournaments/{}", id(TOURNAMENT))).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await;
    let assignments = body["assignments"].as_array().unwrap();
    assert_eq!(assignments.len(), 2);
    assert_eq!(assignments[0]["role"], "tournament_director");
    assert_eq!(assignments[0]["referee_name"], "Referee 2");
    assert_eq!(assignments[1]["role"], "referee");
    assert_eq!(body["requirements"]["assigned"], 2);
    assert_eq!(body["requirements"]["satisfied"], true);
}

#[tokio::test]
#[traced_test]
async fn test_deleting_tournament_removes_assignments() {
    let mut fixture = Fixture::default().await;
    let response = fixture.delete(&format!("/api/tournaments/{}", id(TOURNAMENT))).await;
    assert_eq!(response.status(), 200);

    let mut response = fixture.get(&format!("/api/users/{}/assignments", id(500))).await;
    let body: Value = response.json().await;
    assert_eq!(body, json!([]));

    let response = fixture.delete(&format!("/api/users/{}", id(500))).await;
    assert_eq!(response.status(), 200);
}

#[tokio::test]
#[traced_test]
async fn test_referee_declares_availability_once() {
    let mut fixture = Fixture::default().await;
    let path = format!("/api/tournaments/{}/availabilities", id(TOURNAMENT));
    let mut response = fixture.post_json(&path, json!({"user_id": id(502), "notes": " disponibile sabato "})).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await;
    assert_eq!(body["referee_name"], "Referee 3");
    assert_eq!(body["notes"], "disponibile sabato");

    let response = fixture.post_json(&path, json!({"user_id": id(502)})).await;
    assert_eq!(response.status(), 409);

    let mut response = fixture.get(&path).await;
    let body: Value = response.json().await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let mut response = fixture.get(&format!("/api/users/{}/availabilities", id(502))).await;
    let body: Value = response.json().await;
    assert_eq!(body[0]["tournament_name"], "Trofeo della Zona Nord");

    let availability = body[0]["uuid"].as_str().unwrap().to_string();
    let response = fixture.delete(&format!("/api/availabilities/{}", availability)).await;
    assert_eq!(response.status(), 200);
    let response = fixture.delete(&format!("/api/availabilities/{}", availability)).await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[traced_test]
async fn test_only_active_referees_declare_availability() {
    let mut fixture = Fixture::default().await;
    let path = format!("/api/tournaments/{}/availabilities", id(TOURNAMENT));
    let mut response = fixture.post_json(&path, json!({"user_id": id(400)})).await;
    assert_eq!(response.status(), 422);
    let body: APIErrorResponse = response.json().await;
    assert!(body.errors.unwrap().contains("user_id"));

    fixture.post_json_no_body(&format!("/api/users/{}/toggle-active", id(503))).await;
    let response = fixture.post_json(&path, json!({"user_id": id(503)})).await;
    assert_eq!(response.status(), 422);
}

#[tokio::test]
#[traced_test]
async fn test_availability_requires_open_tournament() {
    let mut fixture = Fixture::default().await;
    let response = fixture.post_json(&format!("/api/tournaments/{}/status", id(TOURNAMENT)), json!({"status": "closed"})).await;
    assert_eq!(response.status(), 200);

    let mut response = fixture.post_json(&format!("/api/tournaments/{}/availabilities", id(TOURNAMENT)), json!({"user_id": id(502)})).await;
    assert_eq!(response.status(), 422);
    let body: APIErrorResponse = response.json().await;
    assert!(body.errors.unwrap().contains("tournament_id"));
}

#[tokio::test]
#[traced_test]
async fn test_availability_deadline_is_enforced() {
    let mut fixture = Fixture::default().await;
    let mut response = fixture.post_json("/api/tournaments", json!({
        "name": "Gara Scaduta",
        "start_date": "2030-05-01",
        "end_date": "2030-05-01",
        "club_id": id(100),
        "category_id": id(200),
        "status": "open",
        "availability_deadline": "2020-01-01",
    })).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await;
    let tournament = body["uuid"].as_str().unwrap().to_string();

    let response = fixture.post_json(&format!("/api/tournaments/{}/availabilities", tournament), json!({"user_id": id(502)})).await;
    assert_eq!(response.status(), 422);
}

#[tokio::test]
#[traced_test]
async fn test_zonal_category_is_hidden_from_other_zones() {
    let mut fixture = Fixture::default().await;
    let southern = create_referee(&mut fixture, "Arbitro Sud", 2, "national").await;
    let response = fixture.post_json(&format!("/api/tournaments/{}/availabilities", id(TOURNAMENT)), json!({"user_id": southern})).await;
    assert_eq!(response.status(), 422);
}

#[tokio::test]
#[traced_test]
async fn test_assignment_checks_referee_level() {
    let mut fixture = Fixture::default().await;
    let path = format!("/api/tournaments/{}/assignments", id(TOURNAMENT));
    let mut response = fixture.post_json(&path, json!({"user_id": id(502)})).await;
    assert_eq!(response.status(), 422);
    let body: APIErrorResponse = response.json().await;
    assert!(body.errors.unwrap().contains("user_id"));

    let archived = create_referee(&mut fixture, "Arbitro Storico", 1, "archive").await;
    let response = fixture.post_json(&path, json!({"user_id": archived})).await;
    assert_eq!(response.status(), 422);

    let mut response = fixture.post_json(&path, json!({"user_id": id(503), "role": "referee"})).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await;
    assert_eq!(body["is_confirmed"], false);
    assert_eq!(body["referee_level"], "Internazionale");
}

#[tokio::test]
#[traced_test]
async fn test_duplicate_assignment_is_a_conflict() {
    let mut fixture = Fixture::default().await;
    let response = fixture.post_json(&format!("/api/tournaments/{}/assignments", id(TOURNAMENT)), json!({"user_id": id(500), "role": "observer"})).await;
    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[traced_test]
async fn test_observers_do_not_count_towards_limit() {
    let mut fixture = Fixture::default().await;
    let path = format!("/api/tournaments/{}/assignments", id(TOURNAMENT));
    let response = fixture.post_json(&path, json!({"user_id": id(503)})).await;
    assert_eq!(response.status(), 200);

    let extra = create_referee(&mut fixture, "Arbitro Extra", 1, "regional").await;
    let mut response = fixture.post_json(&path, json!({"user_id": extra, "role": "referee"})).await;
    assert_eq!(response.status(), 409);
    let body: APIErrorResponse = response.json().await;
    assert_eq!(body.message, "The tournament already has the maximum of 3 referees");

    let response = fixture.post_json(&path, json!({"user_id": extra, "role": "observer"})).await;
    assert_eq!(response.status(), 200);

    let mut response = fixture.get(&format!("/api/tournaments/{}/requirements", id(TOURNAMENT))).await;
    let body: Value = response.json().await;
    assert_eq!(body["assigned"], 3);
    assert_eq!(body["max"], 3);
    assert_eq!(body["satisfied"], true);

    let mut response = fixture.get(&path).await;
    let body: Value = response.json().await;
    let roles = body.as_array().unwrap().iter().map(|a| a["role"].as_str().unwrap().to_string()).collect::<Vec<_>>();
    assert_eq!(roles, vec!["tournament_director", "referee", "referee", "observer"]);
}

#[tokio::test]
#[traced_test]
async fn test_confirm_and_unassign() {
    let mut fixture = Fixture::default().await;
    let mut response = fixture.post_json(&format!("/api/tournaments/{}/assignments", id(TOURNAMENT)), json!({"user_id": id(503)})).await;
    let body: Value = response.json().await;
    let assignment = body["uuid"].as_str().unwrap().to_string();

    let response = fixture.post_json_no_body(&format!("/api/assignments/{}/confirm", assignment)).await;
    assert_eq!(response.status(), 200);

    let mut response = fixture.get(&format!("/api/users/{}/assignments", id(503))).await;
    let body: Value = response.json().await;
    assert_eq!(body[0]["is_confirmed"], true);
    assert_eq!(body[0]["tournament_name"], "Trofeo della Zona Nord");

    let response = fixture.delete(&format!("/api/assignments/{}", assignment)).await;
    assert_eq!(response.status(), 200);
    let mut response = fixture.get(&format!("/api/users/{}/assignments", id(503))).await;
    let body: Value = response.json().await;
    assert_eq!(body, json!([]));
}
