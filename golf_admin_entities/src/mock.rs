use chrono::NaiveDate;
use faker_rand::en_us::names::FullName;
use sea_orm::{prelude::*, ActiveModelTrait, ConnectionTrait, IntoActiveModel};

use crate::domain::assignment::AssignmentRole;
use crate::domain::category::{CategorySettings, ZoneVisibility};
use crate::domain::institutional_email::{EmailCategory, NotificationType, NotificationTypeList};
use crate::domain::letter_template::TemplateType;
use crate::domain::letterhead::LetterheadContact;
use crate::domain::tournament::TournamentStatus;
use crate::domain::user::{RefereeLevel, UserType};
use crate::schema;


#[derive(Debug)]
pub struct MockOption {
    pub deterministic_uuids: bool,
    pub num_referees: u32,
    pub use_random_names: bool,
    pub with_templates: bool,
    pub with_assignments: bool,
}

impl Default for MockOption {
    fn default() -> Self {
        Self {
            deterministic_uuids: false,
            num_referees: 4,
            use_random_names: false,
            with_templates: true,
            with_assignments: true,
        }
    }
}

/// Identifiers of everything `make_mock_federation_with_options` inserted.
#[derive(Debug, Clone, Default)]
pub struct MockFederation {
    pub zones: Vec<Uuid>,
    pub clubs: Vec<Uuid>,
    pub categories: Vec<Uuid>,
    pub tournament: Uuid,
    pub admins: Vec<Uuid>,
    pub referees: Vec<Uuid>,
    pub institutional_emails: Vec<Uuid>,
    pub templates: Vec<Uuid>,
    pub letterheads: Vec<Uuid>,
}

pub async fn make_mock_federation<C>(db: &C) -> Result<MockFederation, DbErr> where C: ConnectionTrait {
    make_mock_federation_with_options(db, Default::default()).await
}

pub async fn make_mock_federation_with_options<C>(db: &C, options: MockOption) -> Result<MockFederation, DbErr> where C: ConnectionTrait {
    /*
    Zones: 1
    Clubs: 100
    Categories: 200
    Tournament: 300
    Admins: 400
    Referees: 500
    Institutional emails: 600
    Templates: 700
    Letterheads: 800
    */
    let id = |base: u128| if options.deterministic_uuids { Uuid::from_u128(base) } else { Uuid::new_v4() };
    let now = chrono::Utc::now().naive_utc();
    let mut out = MockFederation::default();

    for (i, (name, code)) in [("Zona Nord", "Z1"), ("Zona Sud", "Z2")].into_iter().enumerate() {
        let uuid = id(1 + i as u128);
        schema::zone::Model {
            uuid,
            name: name.into(),
            code: code.into(),
            description: None,
            region: None,
            email: Some(format!("{}@federgolf.example", code.to_lowercase())),
            is_active: true,
            sort_order: i as i32,
            created_at: now,
            updated_at: now,
        }.into_active_model().insert(db).await?;
        out.zones.push(uuid);
    }

    for (i, (name, code, email)) in [("Golf Club Milano", "GCMI", Some("segreteria@gcmilano.example")), ("Golf Club Palermo", "GCPA", None)].into_iter().enumerate() {
        let uuid = id(100 + i as u128);
        schema::club::Model {
            uuid,
            name: name.into(),
            code: code.into(),
            zone_id: out.zones[i],
            email: email.map(|e| e.to_string()),
            phone: None,
            address: None,
            city: None,
            contact_person: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }.into_active_model().insert(db).await?;
        out.clubs.push(uuid);
    }

    let categories = [
        ("Gara Zonale", "GZ", false, CategorySettings {
            required_referee_level: RefereeLevel::Regional,
            min_referees: 1,
            max_referees: 3,
            visibility_zones: ZoneVisibility::Only(vec![out.zones[0]]),
            requires_tournament_director: false,
        }),
        ("Campionato Nazionale", "CN", true, CategorySettings {
            required_referee_level: RefereeLevel::National,
            min_referees: 2,
            max_referees: 5,
            visibility_zones: ZoneVisibility::All,
            requires_tournament_director: true,
        }),
    ];
    for (i, (name, code, is_national, settings)) in categories.into_iter().enumerate() {
        let uuid = id(200 + i as u128);
        schema::tournament_category::Model {
            uuid,
            name: name.into(),
            code: code.into(),
            description: None,
            is_national,
            sort_order: i as i32,
            is_active: true,
            settings,
            created_at: now,
            updated_at: now,
        }.into_active_model().insert(db).await?;
        out.categories.push(uuid);
    }

    out.tournament = id(300);
    schema::tournament::Model {
        uuid: out.tournament,
        name: "Trofeo della Zona Nord".into(),
        start_date: NaiveDate::from_ymd_opt(2030, 6, 10).unwrap_or_default(),
        end_date: NaiveDate::from_ymd_opt(2030, 6, 12).unwrap_or_default(),
        club_id: out.clubs[0],
        zone_id: out.zones[0],
        category_id: out.categories[0],
        status: TournamentStatus::Open,
        availability_deadline: NaiveDate::from_ymd_opt(2030, 6, 1),
        notes: None,
        created_at: now,
        updated_at: now,
    }.into_active_model().insert(db).await?;

    for (i, (user_type, zone)) in [(UserType::SuperAdmin, None), (UserType::ZoneAdmin, Some(out.zones[0]))].into_iter().enumerate() {
        let uuid = id(400 + i as u128);
        schema::user::Model {
            uuid,
            name: format!("Admin {}", i + 1),
            email: format!("admin{}@federgolf.example", i + 1),
            user_type,
            zone_id: zone,
            referee_code: None,
            referee_level: None,
            phone: None,
            city: None,
            photo_path: None,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }.into_active_model().insert(db).await?;
        out.admins.push(uuid);
    }

    let levels = [RefereeLevel::Regional, RefereeLevel::National, RefereeLevel::FirstLevel, RefereeLevel::International];
    for i in 0..options.num_referees {
        let uuid = id(500 + i as u128);
        let name = if options.use_random_names {
            rand::random::<FullName>().to_string()
        }
        else {
            format!("Referee {}", i + 1)
        };
        schema::user::Model {
            uuid,
            name,
            email: format!("referee{}@federgolf.example", i + 1),
            user_type: UserType::Referee,
            zone_id: Some(out.zones[0]),
            referee_code: Some(format!("ARB{:04}", i + 1)),
            referee_level: Some(levels[i as usize % levels.len()]),
            phone: None,
            city: None,
            photo_path: None,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }.into_active_model().insert(db).await?;
        out.referees.push(uuid);
    }

    if options.with_assignments && out.referees.len() >= 2 {
        for (i, role) in [AssignmentRole::Referee, AssignmentRole::TournamentDirector].into_iter().enumerate() {
            schema::assignment::Model {
                uuid: id(550 + i as u128),
                tournament_id: out.tournament,
                user_id: out.referees[i],
                role,
                is_confirmed: true,
                notes: None,
                assigned_at: now,
            }.into_active_model().insert(db).await?;
        }
    }

    let institutional = [
        ("Segreteria Federale", "segreteria@federgolf.example", None, true, vec![], true),
        ("Comitato Zona Nord", "comitato.nord@federgolf.example", Some(out.zones[0]), false, vec![NotificationType::Assignment], true),
        ("Comitato Zona Sud", "comitato.sud@federgolf.example", Some(out.zones[1]), true, vec![], true),
        ("Archivio", "archivio@federgolf.example", None, true, vec![], false),
        ("Ufficio Reclami", "reclami@federgolf.example", Some(out.zones[0]), false, vec![NotificationType::Cancellation], true),
    ];
    for (i, (name, email, zone_id, receive_all, types, is_active)) in institutional.into_iter().enumerate() {
        let uuid = id(600 + i as u128);
        schema::institutional_email::Model {
            uuid,
            name: name.into(),
            email: email.into(),
            description: None,
            category: if zone_id.is_some() { EmailCategory::Zone } else { EmailCategory::Federation },
            zone_id,
            receive_all_notifications: receive_all,
            notification_types: NotificationTypeList(types),
            is_active,
            created_at: now,
            updated_at: now,
        }.into_active_model().insert(db).await?;
        out.institutional_emails.push(uuid);
    }

    if options.with_templates {
        let templates = [
            ("Convocazione arbitro", TemplateType::RefereeAssignment, None,
                "Convocazione: {{tournament_name}}",
                "Gentile {{referee_name}},\nsei convocato come {{role}} per {{tournament_name}} ({{tournament_dates}}) presso {{club_name}}."),
            ("Comunicazione circolo", TemplateType::ClubNotification, None,
                "Arbitri designati: {{tournament_name}}",
                "Spett.le {{club_name}},\nper {{tournament_name}} sono stati designati:\n{{referees_list}}"),
            ("Comunicazione istituzionale", TemplateType::InstitutionalNotification, None,
                "Designazioni {{tournament_name}}",
                "Alla cortese attenzione di {{recipient_name}}:\n{{referees_list}}"),
            ("Convocazione arbitro zona nord", TemplateType::RefereeAssignment, Some(out.zones[0]),
                "[{{zone_name}}] Convocazione: {{tournament_name}}",
                "Gentile {{referee_name}}, ruolo: {{role}}."),
        ];
        for (i, (name, template_type, zone_id, subject, body)) in templates.into_iter().enumerate() {
            let uuid = id(700 + i as u128);
            schema::letter_template::Model {
                uuid,
                name: name.into(),
                template_type,
                subject: subject.into(),
                body: body.into(),
                zone_id,
                category_id: None,
                is_active: true,
                is_default: true,
                created_at: now,
                updated_at: now,
            }.into_active_model().insert(db).await?;
            out.templates.push(uuid);
        }

        let uuid = id(800);
        schema::letterhead::Model {
            uuid,
            title: "Carta intestata federale".into(),
            zone_id: None,
            header_text: Some("{{federation_name}}".into()),
            footer_text: None,
            contact: LetterheadContact {
                email: Some("segreteria@federgolf.example".into()),
                ..Default::default()
            },
            logo_path: None,
            is_active: true,
            is_default: true,
            created_at: now,
            updated_at: now,
        }.into_active_model().insert(db).await?;
        out.letterheads.push(uuid);
    }

    Ok(out)
}
