mod common;
use std::time::Duration;

use nexus::{
    config,
    model::entity::{ItemType, PostStatus},
    studio::{
        Studio, StudioError,
        draft::{Draft, EntityRef},
        filter::{CourseFilter, StatusFilter},
        editor::{EditorError, EditorState, SaveIndicator, SwitchChoice, Transition},
        notices::NoticeKind,
    },
    web::UserRole,
};

use crate::common::{FlowDatabase, client_as, setup_test_db, spawn_server};

fn settings() -> config::Studio {
    config::Studio::new(20, 4)
}

async fn editor_studio(db: &FlowDatabase) -> Studio {
    let base = spawn_server(db).await;
    let api = client_as(db, &base, "editor", UserRole::Editor).await;
    let mut studio = Studio::connect(api, &settings()).await.unwrap();
    studio.refresh_courses().await.unwrap();
    studio
}

fn item_ids(studio: &Studio, module_id: i64) -> Vec<i64> {
    studio
        .tree()
        .module(module_id)
        .unwrap()
        .items
        .iter()
        .map(|i| i.id)
        .collect()
}

#[tokio::test]
async fn members_cannot_connect() {
    let db = setup_test_db().await;
    let base = spawn_server(&db).await;
    let api = client_as(&db, &base, "learner", UserRole::Member).await;

    let result = Studio::connect(api, &settings()).await;
    assert!(matches!(result, Err(StudioError::AccessDenied)));
}

#[tokio::test]
async fn create_course_selects_it() {
    let db = setup_test_db().await;
    let mut studio = editor_studio(&db).await;

    let id = studio.create_course("First").await.unwrap();
    assert_eq!(studio.selected_course(), Some(id));
    assert_eq!(studio.editor().selection(), Some(EntityRef::Course(id)));
    assert_eq!(studio.editor().state(), EditorState::Ready);
    assert_eq!(studio.courses().len(), 1);
    assert_eq!(studio.courses()[0].status, PostStatus::Draft);
    // the general bucket is always there
    assert_eq!(studio.tree().modules().len(), 1);
    assert_eq!(studio.notices().latest().unwrap().kind, NoticeKind::Success);
}

#[tokio::test]
async fn switching_while_dirty_saves_first() {
    let db = setup_test_db().await;
    let mut studio = editor_studio(&db).await;

    studio.create_course("Course").await.unwrap();
    let first = studio.create_item(0, "First", ItemType::Text).await.unwrap();
    let second = studio.create_item(0, "Second", ItemType::Text).await.unwrap();

    studio.select(EntityRef::Item(first)).await.unwrap();
    studio.edit_item(|d| d.title = String::from("First, edited")).unwrap();
    assert!(studio.editor().is_dirty());

    let transition = studio.select(EntityRef::Item(second)).await.unwrap();
    assert_eq!(transition, Transition::Confirm(EntityRef::Item(second)));
    // nothing moves until the choice is made
    assert_eq!(studio.editor().selection(), Some(EntityRef::Item(first)));

    let target = studio.resolve_switch(SwitchChoice::Save).await.unwrap();
    assert_eq!(target, EntityRef::Item(second));
    assert_eq!(studio.editor().selection(), Some(EntityRef::Item(second)));
    assert_eq!(studio.editor().state(), EditorState::Ready);

    let saved = studio.api().get_item(first).await.unwrap();
    assert_eq!(saved.title(), "First, edited");
    assert_eq!(studio.tree().item(first).unwrap().title, "First, edited");
}

#[tokio::test]
async fn discard_drops_unsaved_changes() {
    let db = setup_test_db().await;
    let mut studio = editor_studio(&db).await;

    let course = studio.create_course("Course").await.unwrap();
    let item = studio.create_item(0, "Keep me", ItemType::Text).await.unwrap();
    studio.edit_item(|d| d.title = String::from("Throw away")).unwrap();

    let transition = studio.select(EntityRef::Course(course)).await.unwrap();
    assert!(matches!(transition, Transition::Confirm(_)));
    studio.resolve_switch(SwitchChoice::Discard).await.unwrap();

    assert_eq!(studio.editor().selection(), Some(EntityRef::Course(course)));
    assert_eq!(studio.api().get_item(item).await.unwrap().title(), "Keep me");
}

#[tokio::test]
async fn failed_save_keeps_the_prompt() {
    let db = setup_test_db().await;
    let mut studio = editor_studio(&db).await;

    let course = studio.create_course("Course").await.unwrap();
    let other = studio.create_course("Other").await.unwrap();
    studio.select(EntityRef::Course(course)).await.unwrap();

    // the server refuses empty titles
    studio.edit_course(|d| d.title = String::new()).unwrap();
    studio.select(EntityRef::Course(other)).await.unwrap();

    let result = studio.resolve_switch(SwitchChoice::Save).await;
    assert!(matches!(result, Err(StudioError::Api(ref e)) if e.status() == Some(400)));
    assert_eq!(studio.editor().state(), EditorState::Dirty);
    assert_eq!(studio.editor().pending_switch(), Some(EntityRef::Course(other)));
    assert_eq!(studio.editor().selection(), Some(EntityRef::Course(course)));
    assert_eq!(studio.notices().latest().unwrap().kind, NoticeKind::Error);
}

#[tokio::test]
async fn video_without_url_never_reaches_the_server() {
    let db = setup_test_db().await;
    let mut studio = editor_studio(&db).await;

    studio.create_course("Course").await.unwrap();
    let item = studio.create_item(0, "Clip", ItemType::Video).await.unwrap();
    studio.edit_item(|d| d.title = String::from("Clip v2")).unwrap();

    let result = studio.save().await;
    assert!(matches!(
        result,
        Err(StudioError::Editor(EditorError::Invalid(ref m))) if m == "Video URL is required."
    ));
    let notice = studio.notices().latest().unwrap();
    assert_eq!(notice.kind, NoticeKind::Warning);
    assert_eq!(notice.message, "Video URL is required.");
    assert_eq!(studio.editor().state(), EditorState::Dirty);
    assert_eq!(studio.api().get_item(item).await.unwrap().title(), "Clip");

    studio
        .edit_item(|d| d.media.video_url = String::from("https://videos.example/clip"))
        .unwrap();
    studio.save().await.unwrap();
    assert_eq!(studio.api().get_item(item).await.unwrap().title(), "Clip v2");
}

#[tokio::test]
async fn autosave_runs_silently_after_the_idle_delay() {
    let db = setup_test_db().await;
    let mut studio = editor_studio(&db).await;

    let course = studio.create_course("Course").await.unwrap();
    studio.notices_mut().clear();
    studio.edit_course(|d| d.excerpt = String::from("autosaved")).unwrap();

    let deadline = studio.editor().autosave_deadline().unwrap();
    studio.tick(deadline - Duration::from_secs(1)).await.unwrap();
    assert_eq!(studio.editor().state(), EditorState::Dirty);

    studio.tick(deadline).await.unwrap();
    assert_eq!(studio.editor().state(), EditorState::Ready);
    assert!(studio.notices().is_empty());
    assert_eq!(studio.api().get_course(course).await.unwrap().excerpt, "autosaved");
}

#[tokio::test]
async fn save_choice_still_switches_after_an_autosave() {
    let db = setup_test_db().await;
    let mut studio = editor_studio(&db).await;

    studio.create_course("Course").await.unwrap();
    let first = studio.create_item(0, "First", ItemType::Text).await.unwrap();
    let second = studio.create_item(0, "Second", ItemType::Text).await.unwrap();

    studio.select(EntityRef::Item(first)).await.unwrap();
    studio.edit_item(|d| d.title = String::from("First, edited")).unwrap();
    let transition = studio.select(EntityRef::Item(second)).await.unwrap();
    assert_eq!(transition, Transition::Confirm(EntityRef::Item(second)));

    // the idle delay runs out while the prompt is open
    let deadline = studio.editor().autosave_deadline().unwrap();
    studio.tick(deadline).await.unwrap();
    assert_eq!(studio.editor().state(), EditorState::Ready);
    assert_eq!(studio.editor().pending_switch(), Some(EntityRef::Item(second)));

    let target = studio.resolve_switch(SwitchChoice::Save).await.unwrap();
    assert_eq!(target, EntityRef::Item(second));
    assert_eq!(studio.editor().selection(), Some(EntityRef::Item(second)));
    assert_eq!(studio.editor().state(), EditorState::Ready);
    assert_eq!(studio.editor().pending_switch(), None);
    assert_eq!(studio.api().get_item(first).await.unwrap().title(), "First, edited");
}

#[tokio::test]
async fn blur_saves_quietly() {
    let db = setup_test_db().await;
    let mut studio = editor_studio(&db).await;

    studio.create_course("Course").await.unwrap();
    let item = studio.create_item(0, "Clip", ItemType::Video).await.unwrap();
    studio.notices_mut().clear();

    // invalid drafts are skipped without a warning
    studio.edit_item(|d| d.title = String::from("Clip v2")).unwrap();
    studio.blur().await.unwrap();
    assert!(studio.notices().is_empty());
    assert_eq!(studio.editor().state(), EditorState::Dirty);
    assert_eq!(studio.api().get_item(item).await.unwrap().title(), "Clip");

    studio
        .edit_item(|d| d.media.video_url = String::from("https://videos.example/clip"))
        .unwrap();
    studio.blur().await.unwrap();
    assert!(studio.notices().is_empty());
    assert_eq!(studio.editor().state(), EditorState::Ready);
    assert_eq!(studio.api().get_item(item).await.unwrap().title(), "Clip v2");

    // nothing left to save
    studio.blur().await.unwrap();
    assert!(studio.notices().is_empty());
}

#[tokio::test]
async fn deleting_the_selected_module_clears_the_editor() {
    let db = setup_test_db().await;
    let mut studio = editor_studio(&db).await;

    studio.create_course("Course").await.unwrap();
    let module = studio.create_module("Week 1").await.unwrap();
    assert_eq!(studio.editor().selection(), Some(EntityRef::Module(module)));

    studio.delete_module(module).await.unwrap();
    assert_eq!(studio.editor().selection(), None);
    assert_eq!(studio.editor().state(), EditorState::Empty);
    assert!(studio.tree().module(module).is_none());

    let general = studio.delete_module(0).await;
    assert!(matches!(general, Err(StudioError::Editor(EditorError::GeneralModule))));
}

#[tokio::test]
async fn deleting_a_module_moves_the_open_item_draft() {
    let db = setup_test_db().await;
    let mut studio = editor_studio(&db).await;

    studio.create_course("Course").await.unwrap();
    let module = studio.create_module("Week 1").await.unwrap();
    let item = studio.create_item(module, "Inside", ItemType::Text).await.unwrap();

    studio.delete_module(module).await.unwrap();
    assert_eq!(studio.editor().selection(), Some(EntityRef::Item(item)));
    match studio.editor().draft() {
        Some(Draft::Item(d)) => assert_eq!(d.module_id, 0),
        other => panic!("unexpected draft {other:?}"),
    }
    assert_eq!(item_ids(&studio, 0), vec![item]);
}

#[tokio::test]
async fn move_item_keeps_a_permutation() {
    let db = setup_test_db().await;
    let mut studio = editor_studio(&db).await;

    studio.create_course("Course").await.unwrap();
    let a = studio.create_item(0, "A", ItemType::Text).await.unwrap();
    let b = studio.create_item(0, "B", ItemType::Text).await.unwrap();
    let c = studio.create_item(0, "C", ItemType::Text).await.unwrap();

    studio.move_item(0, c, 0).await.unwrap();
    assert_eq!(item_ids(&studio, 0), vec![c, a, b]);

    // past the end clamps to the last slot
    studio.move_item(0, c, 10).await.unwrap();
    let mut ids = item_ids(&studio, 0);
    assert_eq!(ids, vec![a, b, c]);
    ids.sort_unstable();
    assert_eq!(ids, vec![a, b, c]);
}

#[tokio::test]
async fn rejected_move_rolls_back() {
    let db = setup_test_db().await;
    let mut studio = editor_studio(&db).await;

    studio.create_course("Course").await.unwrap();
    let a = studio.create_item(0, "A", ItemType::Text).await.unwrap();
    let b = studio.create_item(0, "B", ItemType::Text).await.unwrap();

    // removed behind the cache's back, so the cached order is no longer a
    // permutation of the module
    studio.api().delete_item(a).await.unwrap();
    studio.notices_mut().clear();

    let result = studio.move_item(0, b, 0).await;
    assert!(matches!(result, Err(StudioError::Api(_))));
    assert_eq!(item_ids(&studio, 0), vec![a, b]);
    assert_eq!(studio.notices().latest().unwrap().kind, NoticeKind::Error);
}

#[tokio::test]
async fn cover_upload_and_removal() {
    let db = setup_test_db().await;
    let mut studio = editor_studio(&db).await;

    let course = studio.create_course("Course").await.unwrap();
    let uploaded = studio
        .set_cover("cover.png", "image/png", b"png".to_vec())
        .await
        .unwrap();

    match studio.editor().draft() {
        Some(Draft::Course(d)) => {
            assert_eq!(d.cover_id, uploaded.id);
            assert_eq!(d.cover_url, uploaded.url);
        }
        other => panic!("unexpected draft {other:?}"),
    }
    assert_eq!(studio.courses()[0].cover_id, uploaded.id);
    assert_eq!(
        studio.editor().indicator(std::time::Instant::now()),
        SaveIndicator::Saved
    );

    studio.remove_cover().await.unwrap();
    match studio.editor().draft() {
        Some(Draft::Course(d)) => {
            assert_eq!(d.cover_id, 0);
            assert!(d.cover_url.is_empty());
        }
        other => panic!("unexpected draft {other:?}"),
    }
    assert_eq!(studio.api().get_course(course).await.unwrap().cover_id, 0);
}

#[tokio::test]
async fn attached_media_fills_the_item_draft() {
    let db = setup_test_db().await;
    let mut studio = editor_studio(&db).await;

    studio.create_course("Course").await.unwrap();
    studio.create_item(0, "Handout", ItemType::Doc).await.unwrap();

    let uploaded = studio
        .attach_item_media(nexus::studio::MediaSlot::Pdf, "notes.pdf", "application/pdf", b"%PDF".to_vec())
        .await
        .unwrap();
    assert!(studio.editor().is_dirty());
    match studio.editor().draft() {
        Some(Draft::Item(d)) => assert_eq!(d.media.pdf_url, uploaded.url),
        other => panic!("unexpected draft {other:?}"),
    }
    studio.save().await.unwrap();

    let tabs = studio.content_tabs().await.unwrap();
    assert_eq!(tabs.len(), 1);
    let docs = studio.content(ItemType::Doc).await.unwrap();
    assert_eq!(docs[0].title, "Handout");
}

#[tokio::test]
async fn course_list_filter_and_counts() {
    let db = setup_test_db().await;
    let mut studio = editor_studio(&db).await;

    let draft = studio.create_course("Rust basics").await.unwrap();
    let published = studio.create_course("Advanced Rust").await.unwrap();
    studio.edit_course(|d| d.status = PostStatus::Publish).unwrap();
    studio.save().await.unwrap();

    studio.set_filter(CourseFilter {
        status: StatusFilter::Only(PostStatus::Publish),
        search: String::new(),
    });
    let visible: Vec<i64> = studio.visible_courses().iter().map(|c| c.id).collect();
    assert_eq!(visible, vec![published]);

    studio.set_filter(CourseFilter {
        status: StatusFilter::All,
        search: String::from("BASICS"),
    });
    let visible: Vec<i64> = studio.visible_courses().iter().map(|c| c.id).collect();
    assert_eq!(visible, vec![draft]);

    let counts = studio.status_counts();
    assert_eq!(counts.all, 2);
    assert_eq!(counts.draft, 1);
    assert_eq!(counts.publish, 1);

    studio.select_course(draft).await.unwrap();
    assert_eq!(studio.selected_course(), Some(draft));
    studio.create_module("Week 1").await.unwrap();
    let modules = studio.api().list_modules(draft).await.unwrap();
    assert_eq!(modules.len(), 1);
    assert_eq!(modules[0].name, "Week 1");
}
