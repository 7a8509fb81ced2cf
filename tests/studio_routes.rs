mod common;
use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use nexus::web::UserRole;
use serde_json::{Value, json};

use crate::common::{
    Action, Flow, create_course_action, create_item_action, seed_user, setup_server, setup_test_db,
    signin_seeded, signup_action,
};

fn tree_ids(body: &Value, module: usize) -> Vec<i64> {
    body["modules"][module]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn studio_requires_capability() {
    let db = setup_test_db().await;
    let mut server = setup_server(&db).await;

    Flow::new()
        .step(
            Action::new("anonymous", "GET", "/api/v1/studio/courses")
                .with_expect(StatusCode::UNAUTHORIZED),
        )
        .step(signup_action("member", "member1"))
        .step(
            Action::new("member_list", "GET", "/api/v1/studio/courses")
                .with_expect(StatusCode::FORBIDDEN)
                .assert_body(|body| {
                    assert_eq!(body["success"], false);
                    assert_eq!(body["message"], "You are not allowed to use the Studio.");
                }),
        )
        .step(create_course_action("nope").with_expect(StatusCode::FORBIDDEN))
        .run(&mut server)
        .await;
}

#[tokio::test]
async fn course_crud_flow() {
    let db = setup_test_db().await;
    seed_user(&db, "editor", UserRole::Editor).await;
    let mut server = setup_server(&db).await;

    Flow::new()
        .step(signin_seeded("editor"))
        .step(
            Action::new("empty_title", "POST", "/api/v1/studio/courses")
                .with_body(json!({"title": "   "}))
                .with_expect(StatusCode::BAD_REQUEST)
                .assert_body(|body| assert_eq!(body["message"], "Title is required.")),
        )
        .step(create_course_action("Rust 101").with_save_as("course"))
        .step(
            Action::new("list", "GET", "/api/v1/studio/courses").assert_body(|body| {
                let courses = body.as_array().unwrap();
                assert_eq!(courses.len(), 1);
                assert_eq!(courses[0]["title"], "Rust 101");
                assert_eq!(courses[0]["status"], "publish");
                assert_eq!(courses[0]["cover_id"], 0);
            }),
        )
        .step(
            Action::new("update", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/studio/courses/{}", ctx.id("course")))
                .with_body(json!({"title": "Rust 102", "excerpt": "short"}))
                .assert_body(|body| {
                    assert_eq!(body["title"], "Rust 102");
                    assert_eq!(body["excerpt"], "short");
                    assert_eq!(body["status"], "publish");
                }),
        )
        .step(
            Action::new("unknown_cover", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/studio/courses/{}", ctx.id("course")))
                .with_body(json!({"cover_id": 999}))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("delete", "DELETE", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/studio/courses/{}", ctx.id("course")))
                .assert_body(|body| assert_eq!(body["success"], true)),
        )
        .step(
            Action::new("get_deleted", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/studio/courses/{}", ctx.id("course")))
                .with_expect(StatusCode::NOT_FOUND)
                .assert_body(|body| assert_eq!(body["message"], "Course not found.")),
        )
        .step(
            Action::new("list_after_delete", "GET", "/api/v1/studio/courses")
                .assert_body(|body| assert!(body.as_array().unwrap().is_empty())),
        )
        .run(&mut server)
        .await;
}

#[tokio::test]
async fn modules_and_tree_flow() {
    let db = setup_test_db().await;
    seed_user(&db, "editor", UserRole::Editor).await;
    let mut server = setup_server(&db).await;

    Flow::new()
        .step(signin_seeded("editor"))
        .step(create_course_action("Tree").with_save_as("course"))
        .step(
            Action::new("create_module", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/studio/courses/{}/modules", ctx.id("course")))
                .with_body(json!({"name": "Basics"}))
                .with_save_as("module"),
        )
        .step(
            Action::new("item_in_module", "POST", "/api/v1/studio/items")
                .with_dyn_body(|ctx| {
                    json!({
                        "course_id": ctx.id("course"),
                        "module_id": ctx.id("module"),
                        "title": "Intro",
                        "type": "video",
                    })
                })
                .with_save_as("intro"),
        )
        .step(create_item_action("course", "Loose", "text").with_save_as("loose"))
        .step(
            Action::new("tree", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/studio/courses/{}/items", ctx.id("course")))
                .assert_body(|body| {
                    let modules = body["modules"].as_array().unwrap();
                    assert_eq!(modules.len(), 2);
                    assert_eq!(modules[0]["name"], "Basics");
                    assert_eq!(modules[1]["id"], 0);
                    assert_eq!(modules[1]["name"], "Geral");
                    assert_eq!(modules[0]["items"][0]["title"], "Intro");
                    assert_eq!(modules[1]["items"][0]["type"], "text");
                }),
        )
        .step(
            Action::new("rename_general", "PUT", "/api/v1/studio/modules/0")
                .with_body(json!({"name": "Other"}))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("rename_module", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/studio/modules/{}", ctx.id("module")))
                .with_body(json!({"name": "Getting started"}))
                .assert_body(|body| assert_eq!(body["name"], "Getting started")),
        )
        .step(
            Action::new("delete_module", "DELETE", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/studio/modules/{}", ctx.id("module"))),
        )
        .step(
            Action::new("tree_after_delete", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/studio/courses/{}/items", ctx.id("course")))
                .assert_body(|body| {
                    let modules = body["modules"].as_array().unwrap();
                    assert_eq!(modules.len(), 1);
                    assert_eq!(modules[0]["id"], 0);
                    assert_eq!(modules[0]["items"].as_array().unwrap().len(), 2);
                }),
        )
        .step(
            Action::new("item_moved_to_general", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/studio/items/{}", ctx.id("intro")))
                .assert_body(|body| assert_eq!(body["module_id"], 0)),
        )
        .run(&mut server)
        .await;
}

#[tokio::test]
async fn item_in_foreign_module_is_rejected() {
    let db = setup_test_db().await;
    seed_user(&db, "editor", UserRole::Editor).await;
    let mut server = setup_server(&db).await;

    Flow::new()
        .step(signin_seeded("editor"))
        .step(create_course_action("A").with_save_as("a"))
        .step(create_course_action("B").with_save_as("b"))
        .step(
            Action::new("module_of_b", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/studio/courses/{}/modules", ctx.id("b")))
                .with_body(json!({"name": "B1"}))
                .with_save_as("module"),
        )
        .step(
            Action::new("item_in_a", "POST", "/api/v1/studio/items")
                .with_dyn_body(|ctx| {
                    json!({
                        "course_id": ctx.id("a"),
                        "module_id": ctx.id("module"),
                        "title": "Wrong",
                    })
                })
                .with_expect(StatusCode::BAD_REQUEST)
                .assert_body(|body| {
                    assert_eq!(body["message"], "Module does not belong to this course.")
                }),
        )
        .step(
            Action::new("missing_course", "POST", "/api/v1/studio/items")
                .with_body(json!({"course_id": 4242, "module_id": 0, "title": "Lost"}))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .run(&mut server)
        .await;
}

#[tokio::test]
async fn reorder_flow() {
    let db = setup_test_db().await;
    seed_user(&db, "editor", UserRole::Editor).await;
    let mut server = setup_server(&db).await;

    let ctx = Flow::new()
        .step(signin_seeded("editor"))
        .step(create_course_action("Ordering").with_save_as("course"))
        .step(create_item_action("course", "One", "video").with_save_as("one"))
        .step(create_item_action("course", "Two", "video").with_save_as("two"))
        .step(create_item_action("course", "Three", "video").with_save_as("three"))
        .step(
            Action::new("reorder", "POST", "/api/v1/studio/reorder").with_dyn_body(|ctx| {
                json!({
                    "course_id": ctx.id("course"),
                    "module_id": 0,
                    "ordered_item_ids": [ctx.id("three"), ctx.id("one"), ctx.id("two")],
                })
            }),
        )
        .step(
            Action::new("tree", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/studio/courses/{}/items", ctx.id("course")))
                .with_save_as("tree"),
        )
        .step(
            Action::new("missing_one", "POST", "/api/v1/studio/reorder")
                .with_dyn_body(|ctx| {
                    json!({
                        "course_id": ctx.id("course"),
                        "module_id": 0,
                        "ordered_item_ids": [ctx.id("three"), ctx.id("one")],
                    })
                })
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("duplicate", "POST", "/api/v1/studio/reorder")
                .with_dyn_body(|ctx| {
                    json!({
                        "course_id": ctx.id("course"),
                        "module_id": 0,
                        "ordered_item_ids": [ctx.id("one"), ctx.id("one"), ctx.id("two")],
                    })
                })
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("empty", "POST", "/api/v1/studio/reorder")
                .with_dyn_body(|ctx| {
                    json!({"course_id": ctx.id("course"), "module_id": 0, "ordered_item_ids": []})
                })
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .run(&mut server)
        .await;

    let tree = ctx.get("tree");
    assert_eq!(
        tree_ids(tree, 0),
        vec![ctx.id("three"), ctx.id("one"), ctx.id("two")]
    );
    let orders: Vec<i64> = tree["modules"][0]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["menu_order"].as_i64().unwrap())
        .collect();
    assert_eq!(orders, vec![0, 1, 2]);
}

#[tokio::test]
async fn upsell_fields_need_capability() {
    let db = setup_test_db().await;
    seed_user(&db, "editor", UserRole::Editor).await;
    seed_user(&db, "admin", UserRole::Admin).await;
    let mut server = setup_server(&db).await;

    let offer = json!({
        "access": {
            "mode": "paid",
            "offer_title": "Premium",
            "offer_price": "R$ 97",
            "offer_bullets": ["  one ", "", "two"],
        }
    });

    Flow::new()
        .step(signin_seeded("editor"))
        .step(create_course_action("Offers").with_save_as("course"))
        .step(create_item_action("course", "Locked", "video").with_save_as("item"))
        .step(
            Action::new("editor_update", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/studio/items/{}", ctx.id("item")))
                .with_body(offer.clone())
                .assert_body(|body| {
                    assert_eq!(body["access"]["mode"], "paid");
                    assert_eq!(body["access"]["offer_title"], "");
                    assert!(body["access"]["offer_bullets"].as_array().unwrap().is_empty());
                }),
        )
        .step(signin_seeded("admin"))
        .step(
            Action::new("admin_update", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/studio/items/{}", ctx.id("item")))
                .with_body(offer)
                .assert_body(|body| {
                    assert_eq!(body["access"]["offer_title"], "Premium");
                    assert_eq!(body["access"]["offer_bullets"], json!(["one", "two"]));
                }),
        )
        .run(&mut server)
        .await;
}

#[tokio::test]
async fn content_library_lists_by_type() {
    let db = setup_test_db().await;
    seed_user(&db, "editor", UserRole::Editor).await;
    let mut server = setup_server(&db).await;

    Flow::new()
        .step(signin_seeded("editor"))
        .step(create_course_action("Library").with_save_as("course"))
        .step(create_item_action("course", "Clip", "video"))
        .step(create_item_action("course", "Handout", "doc").with_save_as("handout"))
        .step(
            Action::new("tabs", "GET", "/api/v1/studio/content-tabs").assert_body(|body| {
                let types: Vec<&str> = body
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|t| t["type"].as_str().unwrap())
                    .collect();
                assert!(types.contains(&"video"));
                assert!(types.contains(&"doc"));
                assert!(!types.contains(&"live"));
            }),
        )
        .step(
            Action::new("docs", "GET", "/api/v1/studio/content")
                .with_param("type", "doc")
                .assert_body(|body| {
                    let entries = body.as_array().unwrap();
                    assert_eq!(entries.len(), 1);
                    assert_eq!(entries[0]["title"], "Handout");
                    assert_eq!(entries[0]["module_id"], 0);
                }),
        )
        .step(
            Action::new("unknown_type", "GET", "/api/v1/studio/content")
                .with_param("type", "podcast")
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("missing_type", "GET", "/api/v1/studio/content")
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("empty_type", "GET", "/api/v1/studio/content")
                .with_param("type", " ")
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .run(&mut server)
        .await;
}

#[tokio::test]
async fn media_upload_is_served_back() {
    let db = setup_test_db().await;
    seed_user(&db, "editor", UserRole::Editor).await;
    let mut server = setup_server(&db).await;

    Flow::new().step(signin_seeded("editor")).run(&mut server).await;

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(b"fake png bytes".to_vec())
            .file_name("My Cover.png")
            .mime_type("image/png"),
    );
    let resp = server.post("/api/v1/studio/media").multipart(form).await;
    resp.assert_status_ok();
    let body = resp.json::<Value>();
    assert_eq!(body["success"], true);
    assert!(body["id"].as_i64().unwrap() > 0);

    let url = body["url"].as_str().unwrap();
    assert!(url.starts_with("/api/v1/static/"));
    let served = server.get(url).await;
    served.assert_status_ok();
    assert_eq!(served.as_bytes().as_ref(), b"fake png bytes");

    let empty = MultipartForm::new().add_text("other", "value");
    let resp = server.post("/api/v1/studio/media").multipart(empty).await;
    resp.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(resp.json::<Value>()["message"], "No file uploaded.");
}

#[tokio::test]
async fn unrecorded_upload_is_removed_from_disk() {
    let db = setup_test_db().await;
    seed_user(&db, "editor", UserRole::Editor).await;
    let mut server = setup_server(&db).await;

    Flow::new().step(signin_seeded("editor")).run(&mut server).await;

    sqlx::query("DROP TABLE media")
        .execute(db.db.pool())
        .await
        .unwrap();

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(b"orphan".to_vec())
            .file_name("notes.pdf")
            .mime_type("application/pdf"),
    );
    let resp = server.post("/api/v1/studio/media").multipart(form).await;
    assert!(resp.status_code().is_server_error());

    let leftovers = std::fs::read_dir(db.uploads.path()).unwrap().count();
    assert_eq!(leftovers, 0);
}
