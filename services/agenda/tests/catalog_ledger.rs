//! Integration tests for catalog upkeep, manual ledger entries, period
//! totals and the business profile

use std::sync::Arc;

use agenda::{
    AgendaContext, AgendaError, AppointmentController, Catalog,
    aggregation::PeriodTotals,
    collections::MemoryVersions,
    dashboard::DaySummary,
    models::{
        ClientPatch, NewClient, NewService, OwnerId, ProfilePatch, TransactionInput,
        TransactionKind,
    },
    notify::{NoticeLevel, RecordingNotifier},
    resolver::AppointmentDraft,
    store::{EntityStore, MemoryStore},
};
use chrono::{NaiveDate, NaiveTime, Weekday};
use rust_decimal::Decimal;
use uuid::Uuid;

struct Harness {
    store: Arc<MemoryStore>,
    notices: Arc<RecordingNotifier>,
    appointments: AppointmentController,
    catalog: Catalog,
    owner: Option<OwnerId>,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let notices = Arc::new(RecordingNotifier::new());
    let ctx = AgendaContext::new(
        store.clone(),
        notices.clone(),
        Arc::new(MemoryVersions::new()),
    );

    Harness {
        store,
        notices,
        appointments: AppointmentController::new(ctx.clone()),
        catalog: Catalog::new(ctx),
        owner: Some(OwnerId(Uuid::new_v4())),
    }
}

fn day(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).unwrap()
}

fn entry(description: &str, cents: i64, kind: TransactionKind, date: NaiveDate) -> TransactionInput {
    TransactionInput {
        description: description.to_string(),
        amount: Decimal::new(cents, 2),
        kind,
        date: Some(date),
    }
}

#[tokio::test]
async fn clients_are_listed_by_name_and_patchable() {
    let h = harness();
    for name in ["Carla", "Ana", "Bruno"] {
        h.catalog
            .create_client(
                h.owner,
                NewClient {
                    name: name.to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    let clients = h.catalog.list_clients(h.owner).await.unwrap();
    let names: Vec<_> = clients.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Ana", "Bruno", "Carla"]);

    h.catalog
        .update_client(
            h.owner,
            clients[0].id,
            ClientPatch {
                phone: Some(Some("+55 11 99999-0000".to_string())),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let clients = h.catalog.list_clients(h.owner).await.unwrap();
    assert_eq!(clients[0].phone.as_deref(), Some("+55 11 99999-0000"));
    assert_eq!(h.notices.take().len(), 4);
}

#[tokio::test]
async fn blank_names_and_negative_prices_are_rejected() {
    let h = harness();

    let err = h
        .catalog
        .create_client(
            h.owner,
            NewClient {
                name: "   ".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AgendaError::Validation(_)));

    let err = h
        .catalog
        .create_service(
            h.owner,
            NewService {
                name: "Manicure".to_string(),
                price: Decimal::new(-100, 2),
                duration_minutes: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AgendaError::Validation(_)));

    assert_eq!(h.store.calls(), 0);
    let notices = h.notices.take();
    assert_eq!(notices.len(), 2);
    assert!(notices.iter().all(|n| n.level == NoticeLevel::Error));
}

#[tokio::test]
async fn deleting_a_client_keeps_their_appointments() {
    let h = harness();
    let ana = h
        .catalog
        .create_client(
            h.owner,
            NewClient {
                name: "Ana".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let clients = h.catalog.list_clients(h.owner).await.unwrap();

    let mut draft = AppointmentDraft {
        service_name: "Haircut".to_string(),
        date: Some(day(6, 12)),
        time: NaiveTime::from_hms_opt(10, 0, 0),
        price: Some(Decimal::new(5000, 2)),
        ..Default::default()
    };
    draft.select_client(Some(ana.id), &clients);
    let booked = h.appointments.create(h.owner, draft).await.unwrap();

    h.catalog.delete_client(h.owner, ana.id).await.unwrap();

    assert!(h.catalog.list_clients(h.owner).await.unwrap().is_empty());
    let stored = h.appointments.get(h.owner, booked.id).await.unwrap();
    assert_eq!(stored.client_name, "Ana");
    assert_eq!(stored.client_id, Some(ana.id));
}

#[tokio::test]
async fn manual_entries_feed_period_totals() {
    let h = harness();
    let today = day(6, 12); // Wednesday

    let entries = [
        entry("Haircut - Ana", 5000, TransactionKind::Credit, today),
        entry("Shampoo stock", 1250, TransactionKind::Debit, today),
        entry("Coloring - Bia", 12000, TransactionKind::Credit, day(6, 10)),
        entry("Rent", 80000, TransactionKind::Debit, day(6, 3)),
        entry("Old balance", 99999, TransactionKind::Credit, day(5, 31)),
    ];
    for input in entries {
        h.catalog
            .create_transaction(h.owner, input, today)
            .await
            .unwrap();
    }

    let ledger = h.catalog.list_transactions(h.owner).await.unwrap();
    assert_eq!(ledger.len(), 5);
    assert!(ledger.windows(2).all(|w| w[0].date >= w[1].date));

    let totals = PeriodTotals::compute(&ledger, today);
    assert_eq!(totals.today, Decimal::new(3750, 2));
    assert_eq!(totals.week, Decimal::new(15750, 2));
    assert_eq!(totals.month, Decimal::new(-64250, 2));
}

#[tokio::test]
async fn undated_entries_are_booked_today() {
    let h = harness();
    let today = day(6, 12);

    let posted = h
        .catalog
        .create_transaction(
            h.owner,
            TransactionInput {
                date: None,
                ..entry("Tip", 1000, TransactionKind::Credit, today)
            },
            today,
        )
        .await
        .unwrap();

    assert_eq!(posted.date, today);
    assert_eq!(posted.appointment_id, None);
}

#[tokio::test]
async fn deleting_an_entry_changes_the_totals() {
    let h = harness();
    let today = day(6, 12);
    let rent = h
        .catalog
        .create_transaction(
            h.owner,
            entry("Rent", 80000, TransactionKind::Debit, today),
            today,
        )
        .await
        .unwrap();

    let ledger = h.catalog.list_transactions(h.owner).await.unwrap();
    assert_eq!(
        PeriodTotals::compute(&ledger, today).today,
        Decimal::new(-80000, 2)
    );

    h.catalog.delete_transaction(h.owner, rent.id).await.unwrap();

    let ledger = h.catalog.list_transactions(h.owner).await.unwrap();
    assert_eq!(PeriodTotals::compute(&ledger, today).today, Decimal::ZERO);
}

#[tokio::test]
async fn completion_shows_up_on_the_dashboard() {
    let h = harness();
    let today = day(6, 12);

    let mut booked = Vec::new();
    for (hour, client) in [(15, "Bia"), (9, "Ana"), (11, "Carla")] {
        let draft = AppointmentDraft {
            client_name: client.to_string(),
            service_name: "Haircut".to_string(),
            date: Some(today),
            time: NaiveTime::from_hms_opt(hour, 0, 0),
            price: Some(Decimal::new(5000, 2)),
            ..Default::default()
        };
        booked.push(h.appointments.create(h.owner, draft).await.unwrap());
    }
    h.appointments.complete(h.owner, &booked[1]).await.unwrap();

    let appointments = h.appointments.list(h.owner, Some(today)).await.unwrap();
    let transactions = h.catalog.list_transactions(h.owner).await.unwrap();
    let summary = DaySummary::build(&appointments, &transactions, 0, today);

    let pending: Vec<_> = summary.pending.iter().map(|a| a.client_name.as_str()).collect();
    assert_eq!(pending, ["Carla", "Bia"]);
    assert_eq!(summary.completed_count, 1);
    assert_eq!(summary.totals.today, Decimal::new(5000, 2));
}

#[tokio::test]
async fn missing_profile_reads_as_defaults_without_writing() {
    let h = harness();
    let owner = h.owner.unwrap();

    let settings = h.catalog.profile(h.owner).await.unwrap();

    assert!(!settings.persisted);
    assert_eq!(settings.working_hours_start, NaiveTime::from_hms_opt(8, 0, 0).unwrap());
    assert_eq!(settings.working_hours_end, NaiveTime::from_hms_opt(18, 0, 0).unwrap());
    assert!(h.store.get_profile(owner).await.unwrap().is_none());
    assert!(h.notices.take().is_empty(), "reads do not notify");
}

#[tokio::test]
async fn first_save_creates_the_profile() {
    let h = harness();

    let saved = h
        .catalog
        .save_profile(
            h.owner,
            ProfilePatch {
                business_name: Some(Some("Studio Ana".to_string())),
                working_days: Some(vec![Weekday::Fri, Weekday::Mon, Weekday::Mon]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(saved.persisted);
    assert_eq!(saved.business_name.as_deref(), Some("Studio Ana"));
    assert_eq!(saved.working_days, [Weekday::Mon, Weekday::Fri]);
    assert_eq!(saved.working_hours_start, NaiveTime::from_hms_opt(8, 0, 0).unwrap());

    let again = h
        .catalog
        .save_profile(
            h.owner,
            ProfilePatch {
                working_hours_end: NaiveTime::from_hms_opt(20, 0, 0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(again.business_name.as_deref(), Some("Studio Ana"));
    assert_eq!(again.working_hours_end, NaiveTime::from_hms_opt(20, 0, 0).unwrap());

    let err = h
        .catalog
        .save_profile(
            h.owner,
            ProfilePatch {
                working_hours_start: NaiveTime::from_hms_opt(21, 0, 0),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AgendaError::Validation(_)));
}

#[tokio::test]
async fn anonymous_reads_are_refused() {
    let h = harness();

    assert!(matches!(
        h.catalog.list_clients(None).await,
        Err(AgendaError::Unauthenticated)
    ));
    assert!(matches!(
        h.catalog.list_transactions(None).await,
        Err(AgendaError::Unauthenticated)
    ));
    assert!(matches!(
        h.catalog.profile(None).await,
        Err(AgendaError::Unauthenticated)
    ));
    assert!(matches!(
        h.appointments.list(None, None).await,
        Err(AgendaError::Unauthenticated)
    ));
    assert_eq!(h.store.calls(), 0);
}

#[tokio::test]
async fn store_failures_surface_their_message() {
    let h = harness();
    h.store.fail("insert_service", "duplicate key value").await;

    let err = h
        .catalog
        .create_service(
            h.owner,
            NewService {
                name: "Manicure".to_string(),
                price: Decimal::new(3000, 2),
                duration_minutes: Some(45),
            },
        )
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "duplicate key value");
    let notices = h.notices.take();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].description, "duplicate key value");
}

#[tokio::test]
async fn saved_contact_details_can_be_cleared() {
    let h = harness();
    h.catalog
        .save_profile(
            h.owner,
            ProfilePatch {
                business_name: Some(Some("Studio Ana".to_string())),
                phone: Some(Some("+55 11 3333-0000".to_string())),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let cleared = h
        .catalog
        .save_profile(
            h.owner,
            ProfilePatch {
                business_name: Some(Some(String::new())),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(cleared.business_name, None);
    assert_eq!(cleared.phone.as_deref(), Some("+55 11 3333-0000"));

    let stored = h.catalog.profile(h.owner).await.unwrap();
    assert_eq!(stored.business_name, None);
}

#[tokio::test]
async fn blank_phone_is_stored_the_same_on_create_and_update() {
    let h = harness();
    let ana = h
        .catalog
        .create_client(
            h.owner,
            NewClient {
                name: "Ana".to_string(),
                phone: Some("+55 11 99999-0000".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    h.catalog
        .update_client(
            h.owner,
            ana.id,
            ClientPatch {
                phone: Some(Some("   ".to_string())),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let clients = h.catalog.list_clients(h.owner).await.unwrap();
    assert_eq!(clients[0].phone, None);
}

#[tokio::test]
async fn saving_the_profile_leaves_cached_lists_alone() {
    let h = harness();
    h.catalog.list_clients(h.owner).await.unwrap();
    h.catalog.list_transactions(h.owner).await.unwrap();
    let list_calls = h.store.list_calls();

    h.catalog
        .save_profile(
            h.owner,
            ProfilePatch {
                phone: Some(Some("+55 11 3333-0000".to_string())),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    h.catalog.list_clients(h.owner).await.unwrap();
    h.catalog.list_transactions(h.owner).await.unwrap();
    assert_eq!(h.store.list_calls(), list_calls);
    assert_eq!(
        h.catalog.profile(h.owner).await.unwrap().phone.as_deref(),
        Some("+55 11 3333-0000")
    );
}
