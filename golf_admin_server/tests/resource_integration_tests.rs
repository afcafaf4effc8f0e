use assert_matches::assert_matches;
use golf_admin_entities::FieldErrors;
use golf_admin_server::response::APIErrorResponse;
use sea_orm::prelude::Uuid;
use serde_json::{json, Value};
use tracing_test::traced_test;

mod common;

use common::Fixture;

fn zone(id: u128) -> Uuid {
    Uuid::from_u128(id)
}

#[tokio::test]
#[traced_test]
async fn test_create_zone_uppercases_code() {
    let mut fixture = Fixture::empty().await;
    let mut response = fixture.post_json("/api/zones", json!({
        "name": "Zona Centro",
        "code": " zc ",
        "region": "Lazio",
    })).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await;
    assert_eq!(body["code"], "ZC");
    assert_eq!(body["is_active"], true);
    assert_eq!(body["users_count"], 0);

    let mut response = fixture.get("/api/zones").await;
    let body: Value = response.json().await;
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["name"], "Zona Centro");
}

#[tokio::test]
#[traced_test]
async fn test_duplicate_zone_code_is_a_field_error() {
    let mut fixture = Fixture::default().await;
    let mut response = fixture.post_json("/api/zones", json!({
        "name": "Altra Zona",
        "code": "z1",
    })).await;
    assert_eq!(response.status(), 422);
    let body: APIErrorResponse = response.json().await;
    assert!(!body.success);
    let errors: FieldErrors = body.errors.unwrap();
    assert!(errors.contains("code"));
}

#[tokio::test]
#[traced_test]
async fn test_missing_required_fields_are_reported() {
    let mut fixture = Fixture::empty().await;
    let mut response = fixture.post_json("/api/zones", json!({
        "name": "",
        "code": "",
        "email": "not-an-email",
    })).await;
    assert_eq!(response.status(), 422);
    let body: APIErrorResponse = response.json().await;
    let errors = body.errors.unwrap();
    assert!(errors.contains("name"));
    assert!(errors.contains("code"));
    assert!(errors.contains("email"));
}

#[tokio::test]
#[traced_test]
async fn test_zone_listing_carries_child_counts() {
    let mut fixture = Fixture::default().await;
    let mut response = fixture.get("/api/zones?search=nord").await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await;
    assert_eq!(body["meta"]["total"], 1);
    let row = &body["data"][0];
    assert_eq!(row["code"], "Z1");
    assert_eq!(row["users_count"], 5);
    assert_eq!(row["clubs_count"], 1);
    assert_eq!(row["tournaments_count"], 1);
}

#[tokio::test]
#[traced_test]
async fn test_listing_pagination_meta() {
    let mut fixture = Fixture::default().await;
    let mut response = fixture.get("/api/users?per_page=2&page=2").await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await;
    assert_eq!(body["meta"]["total"], 6);
    assert_eq!(body["meta"]["total_pages"], 3);
    assert_eq!(body["meta"]["has_next"], true);
    assert_eq!(body["meta"]["has_prev"], true);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
#[traced_test]
async fn test_huge_page_returns_empty_page() {
    let mut fixture = Fixture::default().await;
    let mut response = fixture.get("/api/zones?page=1000000000000000000&per_page=100").await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await;
    assert_eq!(body["meta"]["total"], 2);
    assert_eq!(body["meta"]["has_next"], false);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
#[traced_test]
async fn test_search_ignores_case_and_escapes_wildcards() {
    let mut fixture = Fixture::default().await;
    let mut response = fixture.get("/api/zones?search=NORD").await;
    let body: Value = response.json().await;
    assert_eq!(body["meta"]["total"], 1);

    let mut response = fixture.get("/api/zones?search=_").await;
    let body: Value = response.json().await;
    assert_eq!(body["meta"]["total"], 0);

    let mut response = fixture.get("/api/zones?search=%25").await;
    let body: Value = response.json().await;
    assert_eq!(body["meta"]["total"], 0);
}

#[tokio::test]
#[traced_test]
async fn test_unknown_sort_column_is_rejected() {
    let mut fixture = Fixture::default().await;
    let response = fixture.get("/api/zones?sort=password").await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[traced_test]
async fn test_zone_with_dependents_cannot_be_deleted() {
    let mut fixture = Fixture::default().await;
    let mut response = fixture.delete(&format!("/api/zones/{}", zone(1))).await;
    assert_eq!(response.status(), 409);
    let body: APIErrorResponse = response.json().await;
    assert_eq!(body.message, "Cannot delete zone: it has 5 users, 1 clubs, 1 tournaments");

    let response = fixture.get(&format!("/api/zones/{}", zone(1))).await;
    assert_eq!(response.status(), 200);
}

#[tokio::test]
#[traced_test]
async fn test_empty_zone_can_be_deleted() {
    let mut fixture = Fixture::empty().await;
    let mut response = fixture.post_json("/api/zones", json!({"name": "Zona Vuota", "code": "ZV"})).await;
    let body: Value = response.json().await;
    let id = body["uuid"].as_str().unwrap().to_string();

    let response = fixture.delete(&format!("/api/zones/{}", id)).await;
    assert_eq!(response.status(), 200);
    let response = fixture.get(&format!("/api/zones/{}", id)).await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[traced_test]
async fn test_toggle_active_flips_flag() {
    let mut fixture = Fixture::default().await;
    let mut response = fixture.post_json_no_body(&format!("/api/zones/{}/toggle-active", zone(2))).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await;
    assert_eq!(body["success"], true);
    assert_eq!(body["is_active"], false);

    let mut response = fixture.get("/api/zones?is_active=false").await;
    let body: Value = response.json().await;
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["code"], "Z2");
}

#[tokio::test]
#[traced_test]
async fn test_bulk_requires_ids() {
    let mut fixture = Fixture::default().await;
    let mut response = fixture.post_json("/api/zones/bulk", json!({"action": "deactivate", "ids": []})).await;
    assert_eq!(response.status(), 422);
    let body: APIErrorResponse = response.json().await;
    assert!(body.errors.unwrap().contains("ids"));
}

#[tokio::test]
#[traced_test]
async fn test_bulk_deactivate_and_blocked_delete() {
    let mut fixture = Fixture::default().await;
    let mut response = fixture.post_json("/api/zones/bulk", json!({"action": "deactivate", "ids": [zone(1), zone(2)]})).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await;
    assert_eq!(body["message"], "2 records deactivated");

    let response = fixture.post_json("/api/zones/bulk", json!({"action": "delete", "ids": [zone(1), zone(2)]})).await;
    assert_eq!(response.status(), 409);

    let mut response = fixture.get("/api/zones").await;
    let body: Value = response.json().await;
    assert_eq!(body["meta"]["total"], 2);
}

#[tokio::test]
#[traced_test]
async fn test_zone_export_is_csv_attachment() {
    let mut fixture = Fixture::default().await;
    let mut response = fixture.get("/api/zones/export").await;
    assert_eq!(response.status(), 200);
    assert_matches!(response.header("content-type"), Some(t) if t.starts_with("text/csv"));
    let disposition = response.header("content-disposition").unwrap();
    assert!(disposition.starts_with("attachment; filename=\"zones_"));
    assert!(disposition.ends_with(".csv\""));

    let text = response.text().await;
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("ID,Name,Code,Region,Email,Active,Users,Clubs,Tournaments,Created At"));
    let first = lines.next().unwrap();
    assert!(first.contains("Zona Nord"));
    assert!(first.contains(",Si,"));
    assert_eq!(lines.count(), 1);
}

async fn export_lines(fixture: &mut Fixture, path: &str, filename_prefix: &str) -> Vec<String> {
    let mut response = fixture.get(path).await;
    assert_eq!(response.status(), 200);
    assert_matches!(response.header("content-type"), Some(t) if t.starts_with("text/csv"));
    assert_matches!(response.header("content-disposition"), Some(d) if d.starts_with(&format!("attachment; filename=\"{}_", filename_prefix)));
    response.text().await.lines().map(|l| l.to_string()).collect()
}

#[tokio::test]
#[traced_test]
async fn test_club_export() {
    let mut fixture = Fixture::default().await;
    let response = fixture.post_json_no_body(&format!("/api/clubs/{}/toggle-active", Uuid::from_u128(101))).await;
    assert_eq!(response.status(), 200);

    let lines = export_lines(&mut fixture, "/api/clubs/export", "clubs").await;
    assert_eq!(lines, vec![
        "ID,Name,Code,Zone,City,Email,Phone,Active".to_string(),
        format!("{},Golf Club Milano,GCMI,Zona Nord,,segreteria@gcmilano.example,,Si", Uuid::from_u128(100)),
        format!("{},Golf Club Palermo,GCPA,Zona Sud,,,,No", Uuid::from_u128(101)),
    ]);

    let lines = export_lines(&mut fixture, &format!("/api/clubs/export?zone_id={}", zone(2)), "clubs").await;
    assert_eq!(lines.len(), 2);
}

#[tokio::test]
#[traced_test]
async fn test_user_export() {
    let mut fixture = Fixture::default().await;
    let lines = export_lines(&mut fixture, "/api/users/export", "users").await;
    assert_eq!(lines[0], "ID,Name,Email,Type,Zone,Referee Code,Level,Active");
    assert_eq!(lines.len(), 7);
    assert_eq!(lines[1], format!("{},Admin 1,admin1@federgolf.example,Super Admin,,,,Si", Uuid::from_u128(400)));
    assert!(lines.contains(&format!("{},Referee 2,referee2@federgolf.example,Referee,Zona Nord,ARB0002,Nazionale,Si", Uuid::from_u128(501))));

    let lines = export_lines(&mut fixture, "/api/users/export?user_type=referee", "users").await;
    assert_eq!(lines.len(), 5);
}

#[tokio::test]
#[traced_test]
async fn test_category_export() {
    let mut fixture = Fixture::default().await;
    let lines = export_lines(&mut fixture, "/api/categories/export", "tournament_categories").await;
    assert_eq!(lines, vec![
        "ID,Name,Code,National,Required Level,Min Referees,Max Referees,Active,Tournaments".to_string(),
        format!("{},Gara Zonale,GZ,No,Regionale,1,3,Si,1", Uuid::from_u128(200)),
        format!("{},Campionato Nazionale,CN,Si,Nazionale,2,5,Si,0", Uuid::from_u128(201)),
    ]);
}

#[tokio::test]
#[traced_test]
async fn test_institutional_email_export_joins_types() {
    let mut fixture = Fixture::default().await;
    let response = fixture.post_json("/api/institutional-emails", json!({
        "name": "Ufficio Stampa",
        "email": "stampa@federgolf.example",
        "category": "other",
        "receive_all_notifications": false,
        "notification_types": ["cancellation", "assignment"],
    })).await;
    assert_eq!(response.status(), 200);

    let lines = export_lines(&mut fixture, "/api/institutional-emails/export", "institutional_emails").await;
    assert_eq!(lines[0], "ID,Name,Email,Category,Zone,All Notifications,Notification Types,Active");
    assert_eq!(lines.len(), 7);
    let press = lines.iter().find(|l| l.contains("Ufficio Stampa")).unwrap();
    assert!(press.ends_with(",stampa@federgolf.example,Altro,,No,assignment;cancellation,Si"));
    let archive = lines.iter().find(|l| l.contains("Archivio")).unwrap();
    assert_eq!(archive, &format!("{},Archivio,archivio@federgolf.example,Federazione,,Si,,No", Uuid::from_u128(603)));
}

#[tokio::test]
#[traced_test]
async fn test_zone_statistics() {
    let mut fixture = Fixture::default().await;
    let mut response = fixture.get("/api/zones/statistics").await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["active"], 2);
    assert_eq!(body["with_users"], 1);
    assert_eq!(body["without_users"], 1);
}

#[tokio::test]
#[traced_test]
async fn test_club_requires_existing_zone() {
    let mut fixture = Fixture::default().await;
    let mut response = fixture.post_json("/api/clubs", json!({
        "name": "Golf Club Torino",
        "code": "GCTO",
        "zone_id": zone(99),
    })).await;
    assert_eq!(response.status(), 422);
    let body: APIErrorResponse = response.json().await;
    assert!(body.errors.unwrap().contains("zone_id"));

    let mut response = fixture.post_json("/api/clubs", json!({
        "name": "Golf Club Torino",
        "code": "gcto",
        "zone_id": zone(1),
        "city": "Torino",
    })).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await;
    assert_eq!(body["code"], "GCTO");
    assert_eq!(body["zone_name"], "Zona Nord");

    let mut response = fixture.get(&format!("/api/clubs?zone_id={}", zone(1))).await;
    let body: Value = response.json().await;
    assert_eq!(body["meta"]["total"], 2);
}

#[tokio::test]
#[traced_test]
async fn test_club_hosting_tournaments_cannot_be_deleted() {
    let mut fixture = Fixture::default().await;
    let response = fixture.delete(&format!("/api/clubs/{}", Uuid::from_u128(100))).await;
    assert_eq!(response.status(), 409);

    let response = fixture.delete(&format!("/api/clubs/{}", Uuid::from_u128(101))).await;
    assert_eq!(response.status(), 200);
}

#[tokio::test]
#[traced_test]
async fn test_referee_requires_zone_and_level() {
    let mut fixture = Fixture::default().await;
    let mut response = fixture.post_json("/api/users", json!({
        "name": "Nuovo Arbitro",
        "email": "nuovo@federgolf.example",
        "user_type": "referee",
    })).await;
    assert_eq!(response.status(), 422);
    let body: APIErrorResponse = response.json().await;
    let errors = body.errors.unwrap();
    assert!(errors.contains("zone_id"));
    assert!(errors.contains("referee_level"));
}

#[tokio::test]
#[traced_test]
async fn test_non_referee_has_referee_fields_cleared() {
    let mut fixture = Fixture::default().await;
    let mut response = fixture.post_json("/api/users", json!({
        "name": "Segreteria",
        "email": "Segreteria.Nord@FederGolf.example",
        "user_type": "national_admin",
        "referee_code": "ARB9999",
        "referee_level": "national",
    })).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await;
    assert_eq!(body["email"], "segreteria.nord@federgolf.example");
    assert_eq!(body["referee_code"], Value::Null);
    assert_eq!(body["referee_level"], Value::Null);
}

#[tokio::test]
#[traced_test]
async fn test_user_email_must_be_unique() {
    let mut fixture = Fixture::default().await;
    let mut response = fixture.post_json("/api/users", json!({
        "name": "Doppione",
        "email": "referee1@federgolf.example",
        "user_type": "super_admin",
    })).await;
    assert_eq!(response.status(), 422);
    let body: APIErrorResponse = response.json().await;
    assert!(body.errors.unwrap().contains("email"));
}

#[tokio::test]
#[traced_test]
async fn test_user_with_assignments_cannot_be_deleted() {
    let mut fixture = Fixture::default().await;
    let mut response = fixture.delete(&format!("/api/users/{}", Uuid::from_u128(500))).await;
    assert_eq!(response.status(), 409);
    let body: APIErrorResponse = response.json().await;
    assert!(body.message.contains("deactivate it instead"));

    let response = fixture.delete(&format!("/api/users/{}", Uuid::from_u128(503))).await;
    assert_eq!(response.status(), 200);
}

#[tokio::test]
#[traced_test]
async fn test_user_filters_and_statistics() {
    let mut fixture = Fixture::default().await;
    let mut response = fixture.get("/api/users?user_type=referee&referee_level=national").await;
    let body: Value = response.json().await;
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["name"], "Referee 2");

    let mut response = fixture.get("/api/users/statistics").await;
    let body: Value = response.json().await;
    assert_eq!(body["total"], 6);
    assert_eq!(body["by_type"]["referee"], 4);
    assert_eq!(body["referees_by_level"]["regional"], 1);
}

#[tokio::test]
#[traced_test]
async fn test_category_settings_are_validated() {
    let mut fixture = Fixture::default().await;
    let mut response = fixture.post_json("/api/categories", json!({
        "name": "Gara Giovanile",
        "code": "GG",
        "settings": {
            "required_referee_level": "first_level",
            "min_referees": 4,
            "max_referees": 2,
        },
    })).await;
    assert_eq!(response.status(), 422);
    let body: APIErrorResponse = response.json().await;
    assert!(body.errors.unwrap().contains("settings.max_referees"));
}

#[tokio::test]
#[traced_test]
async fn test_category_in_use_cannot_be_deleted() {
    let mut fixture = Fixture::default().await;
    let response = fixture.delete(&format!("/api/categories/{}", Uuid::from_u128(200))).await;
    assert_eq!(response.status(), 409);
    let response = fixture.delete(&format!("/api/categories/{}", Uuid::from_u128(201))).await;
    assert_eq!(response.status(), 200);
}

#[tokio::test]
#[traced_test]
async fn test_category_duplicate_and_reorder() {
    let mut fixture = Fixture::default().await;
    let mut response = fixture.post_json_no_body(&format!("/api/categories/{}/duplicate", Uuid::from_u128(200))).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await;
    assert_eq!(body["name"], "Gara Zonale (copia)");
    assert_eq!(body["code"], "GZ_COPY");
    assert_eq!(body["is_active"], false);
    assert_eq!(body["settings"]["max_referees"], 3);

    let mut response = fixture.post_json_no_body(&format!("/api/categories/{}/duplicate", Uuid::from_u128(200))).await;
    let body: Value = response.json().await;
    assert_eq!(body["code"], "GZ_COPY2");

    let response = fixture.post_json("/api/categories/reorder", json!([
        {"id": Uuid::from_u128(200), "sort_order": 5},
        {"id": Uuid::from_u128(201), "sort_order": 1},
    ])).await;
    assert_eq!(response.status(), 200);

    let mut response = fixture.get("/api/categories?is_active=true").await;
    let body: Value = response.json().await;
    assert_eq!(body["data"][0]["code"], "CN");
    assert_eq!(body["data"][1]["code"], "GZ");
}

#[tokio::test]
#[traced_test]
async fn test_duplicate_of_long_code_stays_valid() {
    let mut fixture = Fixture::default().await;
    let mut response = fixture.post_json("/api/categories", json!({
        "name": "Circuito Lungo",
        "code": "ABCDEFGHIJKLMNOPQRST",
    })).await;
    assert_eq!(response.status(), 200);
    let original: Value = response.json().await;

    let mut response = fixture.post_json_no_body(&format!("/api/categories/{}/duplicate", original["uuid"].as_str().unwrap())).await;
    assert_eq!(response.status(), 200);
    let copy: Value = response.json().await;
    assert_eq!(copy["code"], "ABCDEFGHIJKLMNO_COPY");

    let response = fixture.put_json(&format!("/api/categories/{}", copy["uuid"].as_str().unwrap()), json!({
        "name": copy["name"],
        "code": copy["code"],
        "is_national": copy["is_national"],
        "settings": copy["settings"],
    })).await;
    assert_eq!(response.status(), 200);
}

#[tokio::test]
#[traced_test]
async fn test_institutional_email_requires_types_unless_receiving_all() {
    let mut fixture = Fixture::default().await;
    let mut response = fixture.post_json("/api/institutional-emails", json!({
        "name": "Ufficio Stampa",
        "email": "stampa@federgolf.example",
        "category": "other",
        "receive_all_notifications": false,
        "notification_types": [],
    })).await;
    assert_eq!(response.status(), 422);
    let body: APIErrorResponse = response.json().await;
    assert!(body.errors.unwrap().contains("notification_types"));

    let response = fixture.post_json("/api/institutional-emails", json!({
        "name": "Ufficio Stampa",
        "email": "stampa@federgolf.example",
        "category": "other",
        "receive_all_notifications": false,
        "notification_types": ["assignment", "press_release"],
    })).await;
    assert_eq!(response.status(), 422);

    let mut response = fixture.post_json("/api/institutional-emails", json!({
        "name": "Ufficio Stampa",
        "email": "stampa@federgolf.example",
        "category": "other",
        "receive_all_notifications": true,
        "notification_types": ["assignment"],
    })).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await;
    assert_eq!(body["notification_types"], json!([]));
}

#[tokio::test]
#[traced_test]
async fn test_institutional_email_notification_type_filter() {
    let mut fixture = Fixture::default().await;
    let mut response = fixture.get("/api/institutional-emails?notification_type=cancellation&per_page=100").await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await;
    let mut names = body["data"].as_array().unwrap().iter().map(|r| r["name"].as_str().unwrap().to_string()).collect::<Vec<_>>();
    names.sort();
    assert_eq!(names, vec!["Archivio", "Comitato Zona Sud", "Segreteria Federale", "Ufficio Reclami"]);
}
