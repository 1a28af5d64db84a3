use axum::http::StatusCode;
use chrono::SubsecRound;
use chrono::TimeDelta;
use chrono::Utc;
use uuid::Uuid;

use crate::notes::Note;
use crate::notes::Priority;
use crate::storage::Memory;
use crate::storage::Storage;
use crate::tests::helper;

/// Store a note created some time ago
async fn insert_note(storage: &Memory, owner_id: &str, title: &str, age: TimeDelta) -> Uuid {
    let created_at = Utc::now().naive_utc().trunc_subsecs(6) - age;

    let note = Note {
        id: Uuid::new_v4(),
        owner_id: owner_id.to_string(),
        title: title.to_string(),
        content: String::new(),
        priority: Priority::Later,
        created_at,
        updated_at: created_at,
        deleted_at: None,
    };

    storage.save_note(&note).await.unwrap().id
}

#[tokio::test]
async fn test_list_by_priority() {
    let mut app = helper::setup_test_app();

    let access_token = helper::register(&mut app, "someone").await;

    helper::create_note(&mut app, &access_token, "One", "NOW").await;
    helper::create_note(&mut app, &access_token, "Two", "LATER").await;
    helper::create_note(&mut app, &access_token, "Three", "NOW").await;

    let (status_code, notes, _) =
        helper::list_notes(&mut app, &access_token, "priority=NOW").await;
    assert_eq!(StatusCode::OK, status_code);
    let notes = notes.unwrap();
    assert_eq!(2, notes.notes.len());
    assert!(notes.notes.iter().all(|note| note.priority == "NOW"));
    assert_eq!(1, notes.total_pages);

    let (_, notes, _) = helper::list_notes(&mut app, &access_token, "priority=DONE").await;
    let notes = notes.unwrap();
    assert!(notes.notes.is_empty());
    assert_eq!(0, notes.total_pages);

    let (status_code, _, error) =
        helper::list_notes(&mut app, &access_token, "priority=URGENT").await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    let error = error.unwrap();
    assert_eq!("Invalid priority".to_string(), error.error);
    assert_eq!(
        Some(r#"Unknown priority "URGENT", expected one of NOW, LATER, SOMEDAY or DONE"#.to_string()),
        error.description
    );
}

#[tokio::test]
async fn test_list_pages() {
    let (mut app, storage) = helper::setup_test_app_with_storage();

    let access_token = helper::register(&mut app, "someone").await;
    let owner_id = helper::owner_id(&storage, "someone").await;

    for minutes in 0..12 {
        insert_note(
            &storage,
            &owner_id,
            &format!("Note {minutes}"),
            TimeDelta::minutes(minutes),
        )
        .await;
    }

    let (_, notes, _) = helper::list_notes(&mut app, &access_token, "page=0").await;
    let notes = notes.unwrap();
    assert_eq!(10, notes.notes.len());
    assert_eq!(2, notes.total_pages);
    assert_eq!(0, notes.current_page);
    // newest first
    assert_eq!("Note 0".to_string(), notes.notes[0].title);
    assert_eq!("Note 9".to_string(), notes.notes[9].title);

    let (_, notes, _) = helper::list_notes(&mut app, &access_token, "page=1").await;
    let notes = notes.unwrap();
    assert_eq!(
        vec!["Note 10".to_string(), "Note 11".to_string()],
        notes
            .notes
            .into_iter()
            .map(|note| note.title)
            .collect::<Vec<_>>()
    );
    assert_eq!(1, notes.current_page);

    // out of range is not an error
    let (status_code, notes, _) = helper::list_notes(&mut app, &access_token, "page=5").await;
    assert_eq!(StatusCode::OK, status_code);
    let notes = notes.unwrap();
    assert!(notes.notes.is_empty());
    assert_eq!(2, notes.total_pages);
    assert_eq!(5, notes.current_page);

    let (status_code, _, error) = helper::list_notes(&mut app, &access_token, "page=-1").await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!("Invalid query parameter".to_string(), error.unwrap().error);
}

#[tokio::test]
async fn test_list_by_date_range() {
    let (mut app, storage) = helper::setup_test_app_with_storage();

    let access_token = helper::register(&mut app, "someone").await;
    let owner_id = helper::owner_id(&storage, "someone").await;

    let recent = insert_note(&storage, &owner_id, "Recent", TimeDelta::days(3)).await;
    let old = insert_note(&storage, &owner_id, "Old", TimeDelta::days(10)).await;
    let fresh = helper::create_note(&mut app, &access_token, "Fresh", "NOW").await;

    let (_, notes, _) =
        helper::list_notes(&mut app, &access_token, "dateRange=PAST_SEVEN_DAYS").await;
    let ids = notes
        .unwrap()
        .notes
        .into_iter()
        .map(|note| note.id)
        .collect::<Vec<_>>();
    assert_eq!(vec![fresh.id, recent], ids);

    let (_, notes, _) = helper::list_notes(&mut app, &access_token, "dateRange=TODAY").await;
    let ids = notes
        .unwrap()
        .notes
        .into_iter()
        .map(|note| note.id)
        .collect::<Vec<_>>();
    assert_eq!(vec![fresh.id], ids);

    // unknown ranges do not filter
    let (status_code, notes, _) =
        helper::list_notes(&mut app, &access_token, "dateRange=LAST_YEAR").await;
    assert_eq!(StatusCode::OK, status_code);
    let ids = notes
        .unwrap()
        .notes
        .into_iter()
        .map(|note| note.id)
        .collect::<Vec<_>>();
    assert_eq!(vec![fresh.id, recent, old], ids);

    // priority wins over the date range
    let (_, notes, _) = helper::list_notes(
        &mut app,
        &access_token,
        "priority=LATER&dateRange=TODAY",
    )
    .await;
    let ids = notes
        .unwrap()
        .notes
        .into_iter()
        .map(|note| note.id)
        .collect::<Vec<_>>();
    assert_eq!(vec![recent, old], ids);
}
