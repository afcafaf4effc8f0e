use assert_matches::assert_matches;
use axum::http::StatusCode;
use golf_admin_server::dispatch;
use golf_admin_server::response::APIErrorResponse;
use sea_orm::prelude::Uuid;
use serde_json::{json, Value};
use tracing_test::traced_test;

mod common;

use common::{Fixture, FixtureOptions};

const TOURNAMENT: u128 = 300;

fn id(value: u128) -> Uuid {
    Uuid::from_u128(value)
}

async fn prepare(fixture: &mut Fixture, tournament: Uuid, options: Value) -> String {
    let mut response = fixture.post_json(&format!("/api/tournaments/{}/notifications", tournament), options).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await;
    assert_eq!(body["status"], "draft");
    body["uuid"].as_str().unwrap().to_string()
}

async fn send(fixture: &mut Fixture, dispatch: &str) -> Value {
    let mut response = fixture.post_json_no_body(&format!("/api/notifications/{}/send", dispatch)).await;
    assert_eq!(response.status(), 200);
    response.json().await
}

fn children_of<'a>(detail: &'a Value, recipient_type: &str) -> Vec<&'a Value> {
    detail["notifications"].as_array().unwrap().iter().filter(|n| n["recipient_type"] == recipient_type).collect()
}

#[tokio::test]
#[traced_test]
async fn test_prepare_requires_assignments() {
    let mut fixture = Fixture::new(FixtureOptions {
        mock_options: golf_admin_entities::mock::MockOption {
            deterministic_uuids: true,
            with_assignments: false,
            ..Default::default()
        },
        ..Default::default()
    }).await;
    let mut response = fixture.post_json(&format!("/api/tournaments/{}/notifications", id(TOURNAMENT)), json!({})).await;
    assert_eq!(response.status(), 422);
    let body: APIErrorResponse = response.json().await;
    assert!(body.errors.unwrap().contains("tournament_id"));
}

#[tokio::test]
#[traced_test]
async fn test_prepare_validates_options() {
    let mut fixture = Fixture::default().await;
    let path = format!("/api/tournaments/{}/notifications", id(TOURNAMENT));
    let mut response = fixture.post_json(&path, json!({"additional_emails": ["ok@example.org", "not an email"]})).await;
    assert_eq!(response.status(), 422);
    let body: APIErrorResponse = response.json().await;
    assert!(body.errors.unwrap().contains("additional_emails"));

    let mut response = fixture.post_json(&path, json!({"referee_template_id": id(701)})).await;
    assert_eq!(response.status(), 422);
    let body: APIErrorResponse = response.json().await;
    assert!(body.errors.unwrap().contains("referee_template_id"));

    let response = fixture.post_json(&path, json!({"club_template_id": id(999)})).await;
    assert_eq!(response.status(), 422);
}

#[tokio::test]
#[traced_test]
async fn test_send_creates_one_notification_per_recipient() {
    let mut fixture = Fixture::default().await;
    let dispatch = prepare(&mut fixture, id(TOURNAMENT), json!({})).await;
    let detail = send(&mut fixture, &dispatch).await;

    assert_eq!(detail["status"], "sent");
    assert_eq!(detail["total_recipients"], 5);
    assert_eq!(detail["sent_count"], 5);
    assert_eq!(detail["failed_count"], 0);
    assert!(detail["sent_at"].is_string());
    assert_eq!(detail["notifications"].as_array().unwrap().len(), 5);
    assert_eq!(children_of(&detail, "club").len(), 1);
    assert_eq!(children_of(&detail, "referee").len(), 2);

    let mut institutional = children_of(&detail, "institutional").iter().map(|n| n["recipient_email"].as_str().unwrap().to_string()).collect::<Vec<_>>();
    institutional.sort();
    assert_eq!(institutional, vec!["comitato.nord@federgolf.example", "segreteria@federgolf.example"]);

    let sent = fixture.mailer.sent().await;
    assert_eq!(sent.len(), 5);
    let referee_mail = sent.iter().find(|m| m.to == "referee1@federgolf.example").unwrap();
    assert_eq!(referee_mail.subject, "[Zona Nord] Convocazione: Trofeo della Zona Nord");
    assert!(referee_mail.body.contains("Gentile Referee 1, ruolo: Arbitro."));
    assert!(referee_mail.body.starts_with("Federazione Italiana Golf\n\n"));
    let director_mail = sent.iter().find(|m| m.to == "referee2@federgolf.example").unwrap();
    assert!(director_mail.body.contains("ruolo: Direttore di Torneo."));
    assert!(sent.iter().all(|m| !m.body.contains("{{") && !m.subject.contains("{{")));

    let mut response = fixture.get(&format!("/api/tournaments/{}", id(TOURNAMENT))).await;
    let tournament: Value = response.json().await;
    assert_eq!(tournament["status"], "assigned");
}

#[tokio::test]
#[traced_test]
async fn test_only_drafts_can_be_sent() {
    let mut fixture = Fixture::default().await;
    let dispatch = prepare(&mut fixture, id(TOURNAMENT), json!({})).await;
    send(&mut fixture, &dispatch).await;
    let response = fixture.post_json_no_body(&format!("/api/notifications/{}/send", dispatch)).await;
    assert_eq!(response.status(), 409);
    assert_eq!(fixture.mailer.sent().await.len(), 5);
}

#[tokio::test]
#[traced_test]
async fn test_concurrent_sends_deliver_once() {
    let mut fixture = Fixture::default().await;
    let dispatch_id: Uuid = prepare(&mut fixture, id(TOURNAMENT), json!({})).await.parse().unwrap();

    let (first, second) = tokio::join!(
        dispatch::send(&fixture.db, fixture.mailer.as_ref(), dispatch_id, "Federazione Italiana Golf"),
        dispatch::send(&fixture.db, fixture.mailer.as_ref(), dispatch_id, "Federazione Italiana Golf"),
    );
    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert_matches!(outcomes.iter().find(|r| r.is_err()), Some(Err(e)) if e.code == StatusCode::CONFLICT);
    assert_eq!(fixture.mailer.sent().await.len(), 5);
}

#[tokio::test]
#[traced_test]
async fn test_disabled_groups_and_additional_emails() {
    let mut fixture = Fixture::default().await;
    let dispatch = prepare(&mut fixture, id(TOURNAMENT), json!({
        "send_to_club": false,
        "send_to_institutional": false,
        "additional_emails": [" Stampa@Example.org "],
    })).await;
    let detail = send(&mut fixture, &dispatch).await;
    assert_eq!(detail["total_recipients"], 3);
    assert!(children_of(&detail, "club").is_empty());
    let additional = children_of(&detail, "additional");
    assert_eq!(additional.len(), 1);
    assert_eq!(additional[0]["recipient_email"], "stampa@example.org");
    assert!(additional[0]["subject"].as_str().unwrap().starts_with("Designazioni"));
}

#[tokio::test]
#[traced_test]
async fn test_club_without_email_becomes_failed_row() {
    let mut fixture = Fixture::default().await;
    let mut response = fixture.post_json("/api/tournaments", json!({
        "name": "Campionato del Sud",
        "start_date": "2030-10-01",
        "end_date": "2030-10-03",
        "club_id": id(101),
        "category_id": id(201),
    })).await;
    let tournament: Value = response.json().await;
    let tournament: Uuid = tournament["uuid"].as_str().unwrap().parse().unwrap();
    for (referee, role) in [(501, "tournament_director"), (503, "referee")] {
        let response = fixture.post_json(&format!("/api/tournaments/{}/assignments", tournament), json!({"user_id": id(referee), "role": role})).await;
        assert_eq!(response.status(), 200);
    }

    let dispatch = prepare(&mut fixture, tournament, json!({})).await;
    let detail = send(&mut fixture, &dispatch).await;
    assert_eq!(detail["status"], "sent");
    assert_eq!(detail["total_recipients"], 5);
    assert_eq!(detail["sent_count"], 4);
    assert_eq!(detail["failed_count"], 1);

    let club = children_of(&detail, "club");
    assert_eq!(club[0]["status"], "failed");
    assert_eq!(club[0]["error_message"], "missing email address");
    assert_eq!(club[0]["attempts"], 0);

    let institutional = children_of(&detail, "institutional").iter().map(|n| n["recipient_name"].as_str().unwrap().to_string()).collect::<Vec<_>>();
    assert!(institutional.contains(&"Comitato Zona Sud".to_string()));
    assert!(!institutional.contains(&"Comitato Zona Nord".to_string()));

    let referee_mail = fixture.mailer.sent().await.into_iter().find(|m| m.to == "referee2@federgolf.example").unwrap();
    assert_eq!(referee_mail.subject, "Convocazione: Campionato del Sud");
}

#[tokio::test]
#[traced_test]
async fn test_resend_failed_retries_and_recounts() {
    let mut fixture = Fixture::new(FixtureOptions {
        failing_addresses: vec!["referee1@federgolf.example".to_string()],
        ..Default::default()
    }).await;
    let dispatch = prepare(&mut fixture, id(TOURNAMENT), json!({})).await;
    let detail = send(&mut fixture, &dispatch).await;
    assert_eq!(detail["sent_count"], 4);
    assert_eq!(detail["failed_count"], 1);
    let failed = children_of(&detail, "referee").into_iter().find(|n| n["status"] == "failed").unwrap();
    assert_eq!(failed["recipient_email"], "referee1@federgolf.example");
    assert_eq!(failed["attempts"], 1);
    assert!(failed["error_message"].as_str().unwrap().contains("rejected"));

    fixture.mailer.recover("referee1@federgolf.example").await;
    let mut response = fixture.post_json_no_body(&format!("/api/notifications/{}/resend-failed", dispatch)).await;
    assert_eq!(response.status(), 200);
    let detail: Value = response.json().await;
    assert_eq!(detail["status"], "sent");
    assert_eq!(detail["sent_count"], 5);
    assert_eq!(detail["failed_count"], 0);
    let retried = children_of(&detail, "referee").into_iter().find(|n| n["recipient_email"] == "referee1@federgolf.example").unwrap();
    assert_eq!(retried["status"], "sent");
    assert_eq!(retried["attempts"], 2);
    assert_eq!(retried["error_message"], Value::Null);
    assert_eq!(fixture.mailer.sent().await.len(), 5);
}

#[tokio::test]
#[traced_test]
async fn test_dispatch_fails_when_nothing_is_delivered() {
    let mut fixture = Fixture::new(FixtureOptions {
        failing_addresses: vec![
            "segreteria@gcmilano.example".to_string(),
            "referee1@federgolf.example".to_string(),
            "referee2@federgolf.example".to_string(),
            "segreteria@federgolf.example".to_string(),
            "comitato.nord@federgolf.example".to_string(),
        ],
        ..Default::default()
    }).await;
    let dispatch = prepare(&mut fixture, id(TOURNAMENT), json!({})).await;
    let detail = send(&mut fixture, &dispatch).await;
    assert_eq!(detail["status"], "failed");
    assert_eq!(detail["sent_count"], 0);
    assert_eq!(detail["failed_count"], 5);

    let response = fixture.post_json_no_body(&format!("/api/notifications/{}/resend-failed", dispatch)).await;
    assert_eq!(response.status(), 200);
}

#[tokio::test]
#[traced_test]
async fn test_missing_template_fails_before_sending() {
    let mut fixture = Fixture::default().await;
    let response = fixture.delete(&format!("/api/letter-templates/{}", id(701))).await;
    assert_eq!(response.status(), 200);

    let dispatch = prepare(&mut fixture, id(TOURNAMENT), json!({})).await;
    let mut response = fixture.post_json_no_body(&format!("/api/notifications/{}/send", dispatch)).await;
    assert_eq!(response.status(), 422);
    let body: APIErrorResponse = response.json().await;
    assert!(body.errors.unwrap().contains("template"));
    assert!(fixture.mailer.sent().await.is_empty());

    let mut response = fixture.get(&format!("/api/notifications/{}", dispatch)).await;
    let detail: Value = response.json().await;
    assert_eq!(detail["status"], "draft");
    assert_eq!(detail["notifications"], json!([]));
}

#[tokio::test]
#[traced_test]
async fn test_resend_requires_sent_dispatch() {
    let mut fixture = Fixture::default().await;
    let dispatch = prepare(&mut fixture, id(TOURNAMENT), json!({})).await;
    let response = fixture.post_json_no_body(&format!("/api/notifications/{}/resend-failed", dispatch)).await;
    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[traced_test]
async fn test_sent_dispatch_blocks_tournament_delete() {
    let mut fixture = Fixture::default().await;
    let dispatch = prepare(&mut fixture, id(TOURNAMENT), json!({})).await;
    send(&mut fixture, &dispatch).await;
    let response = fixture.delete(&format!("/api/tournaments/{}", id(TOURNAMENT))).await;
    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[traced_test]
async fn test_listing_statistics_and_delete() {
    let mut fixture = Fixture::default().await;
    let dispatch = prepare(&mut fixture, id(TOURNAMENT), json!({})).await;
    send(&mut fixture, &dispatch).await;
    prepare(&mut fixture, id(TOURNAMENT), json!({"send_to_club": false})).await;

    let mut response = fixture.get("/api/notifications?status=sent").await;
    let body: Value = response.json().await;
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["tournament_name"], "Trofeo della Zona Nord");

    let mut response = fixture.get(&format!("/api/notifications?zone_id={}", id(2))).await;
    let body: Value = response.json().await;
    assert_eq!(body["meta"]["total"], 0);

    let mut response = fixture.get(&format!("/api/tournaments/{}/notifications", id(TOURNAMENT))).await;
    let body: Value = response.json().await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let mut response = fixture.get("/api/notifications/statistics").await;
    let stats: Value = response.json().await;
    assert_eq!(stats["total"], 2);
    assert_eq!(stats["by_status"]["sent"], 1);
    assert_eq!(stats["by_status"]["draft"], 1);
    assert_eq!(stats["sent_messages"], 5);
    assert_eq!(stats["failed_messages"], 0);
    assert_eq!(stats["by_recipient_type"]["referee"], 2);

    let response = fixture.delete(&format!("/api/notifications/{}", dispatch)).await;
    assert_eq!(response.status(), 200);
    let response = fixture.get(&format!("/api/notifications/{}", dispatch)).await;
    assert_eq!(response.status(), 404);
    let mut response = fixture.get("/api/notifications/statistics").await;
    let stats: Value = response.json().await;
    assert_eq!(stats["sent_messages"], 0);
}
