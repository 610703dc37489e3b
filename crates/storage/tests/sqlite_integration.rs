use chrono::Duration;
use dojo_core::model::{
    FlagEvent, FlagEventKind, FlagSet, PlaylistBook, PlaylistName, PracticeSettings,
    PracticeSettingsDraft, SessionSummary, Technique, TechniqueName, TechniqueView,
};
use dojo_core::time::fixed_now;
use storage::StorageError;
use storage::repository::{
    FlagRepository, PlaylistRepository, SessionSummaryRepository, SettingsRepository,
    TechniqueRepository, TechniqueViewRepository,
};
use storage::sqlite::SqliteRepository;

fn tn(raw: &str) -> TechniqueName {
    TechniqueName::new(raw).unwrap()
}

fn pn(raw: &str) -> PlaylistName {
    PlaylistName::new(raw).unwrap()
}

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn catalog_round_trips_in_stored_order() {
    let repo = connect("memdb_catalog").await;

    let catalog = vec![
        Technique::new(tn("Wrist Grab"), 2, "Yellow", 2)
            .with_facets("Grab", "Inward", "Palm")
            .with_link("https://example.com/wrist")
            .with_kids(true),
        Technique::new(tn("Bear Hug"), 1, "White", 1)
            .with_facets("Hug", "Elbow", "Heel")
            .with_complete(true)
            .with_adults(Some("true".into())),
    ];
    repo.replace_catalog(&catalog).await.unwrap();
    assert_eq!(repo.list_techniques().await.unwrap(), catalog);

    let replacement = vec![Technique::new(tn("Headlock"), 3, "Orange", 3)];
    repo.replace_catalog(&replacement).await.unwrap();
    assert_eq!(repo.list_techniques().await.unwrap(), replacement);

    let dup = Technique::new(tn("Headlock"), 4, "Orange", 3);
    let err = repo
        .replace_catalog(&[replacement[0].clone(), dup])
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict));
    // A failed replace leaves the previous catalog intact.
    assert_eq!(repo.list_techniques().await.unwrap(), replacement);
}

#[tokio::test]
async fn flags_and_events_persist() {
    let repo = connect("memdb_flags").await;
    assert!(repo.get_flags().await.unwrap().is_empty());

    let flags = FlagSet::from_names([tn("B"), tn("A")]);
    repo.save_flags(&flags).await.unwrap();
    assert_eq!(repo.get_flags().await.unwrap(), flags);

    let now = fixed_now();
    repo.append_flag_event(&FlagEvent::flag(FlagEventKind::Flag, tn("A"), now))
        .await
        .unwrap();
    repo.append_flag_event(&FlagEvent::playlist(
        FlagEventKind::PlaylistAdd,
        tn("B"),
        pn("Warmup"),
        now + Duration::seconds(1),
    ))
    .await
    .unwrap();

    let events = repo.list_flag_events().await.unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].kind, FlagEventKind::Flag);
    assert_eq!(events[0].playlist, None);
    assert_eq!(events[1].kind, FlagEventKind::PlaylistAdd);
    assert_eq!(events[1].playlist, Some(pn("Warmup")));
    assert_eq!(events[1].timestamp, now + Duration::seconds(1));
}

#[tokio::test]
async fn playlists_keep_member_order_and_empty_lists() {
    let repo = connect("memdb_playlists").await;

    let mut book = PlaylistBook::new();
    book.create(pn("Warmup")).unwrap();
    book.create(pn("Empty")).unwrap();
    book.add(&pn("Warmup"), tn("C")).unwrap();
    book.add(&pn("Warmup"), tn("A")).unwrap();
    repo.save_playlists(&book).await.unwrap();

    let loaded = repo.get_playlists().await.unwrap();
    assert_eq!(loaded, book);
    let warmup = loaded.get(&pn("Warmup")).unwrap();
    assert_eq!(warmup.techniques(), &[tn("C"), tn("A")]);
    assert!(loaded.get(&pn("Empty")).unwrap().techniques().is_empty());

    book.delete(&pn("Empty"));
    repo.save_playlists(&book).await.unwrap();
    assert_eq!(repo.get_playlists().await.unwrap().len(), 1);
}

#[tokio::test]
async fn session_summaries_round_trip_and_clear() {
    let repo = connect("memdb_summaries").await;
    let now = fixed_now();

    let first = SessionSummary::from_persisted(
        now,
        vec![tn("A"), tn("B"), tn("C")],
        12_000,
        vec![tn("B")],
    )
    .unwrap();
    let second =
        SessionSummary::from_persisted(now + Duration::hours(1), vec![tn("A")], 4_000, Vec::new())
            .unwrap();

    let second_id = repo.append_summary(&second).await.unwrap();
    let first_id = repo.append_summary(&first).await.unwrap();

    let rows = repo.list_summary_rows().await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, first_id);
    assert_eq!(rows[0].summary, first);
    assert_eq!(rows[1].id, second_id);

    let found = repo.find_summary(second.timestamp()).await.unwrap().unwrap();
    assert_eq!(found.summary, second);
    assert!(
        repo.find_summary(now - Duration::days(1))
            .await
            .unwrap()
            .is_none()
    );

    repo.clear_summaries().await.unwrap();
    assert!(repo.list_summary_rows().await.unwrap().is_empty());
}

#[tokio::test]
async fn views_and_settings_persist() {
    let repo = connect("memdb_views_settings").await;

    repo.append_view(&TechniqueView::new(tn("A"), fixed_now()))
        .await
        .unwrap();
    let views = repo.list_views().await.unwrap();
    assert_eq!(views, vec![TechniqueView::new(tn("A"), fixed_now())]);

    assert!(repo.get_settings().await.unwrap().is_none());
    let settings = PracticeSettingsDraft {
        delay_ms: Some(2_500),
        reminder_hour: Some(7),
        reminder_minute: Some(30),
    }
    .validate()
    .unwrap();
    repo.save_settings(&settings).await.unwrap();
    assert_eq!(repo.get_settings().await.unwrap(), Some(settings));

    repo.save_settings(&PracticeSettings::default())
        .await
        .unwrap();
    assert_eq!(
        repo.get_settings().await.unwrap(),
        Some(PracticeSettings::default())
    );
}
