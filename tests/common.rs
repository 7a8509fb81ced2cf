#![allow(dead_code)]

use std::collections::HashMap;

use axum::http::StatusCode;
use axum_test::TestServer;
use nexus::{
    auth::hash_password,
    build_server_with_state,
    client::ApiClient,
    model::{CrudRepository, DbConnection, ModelManager, entity::{UserEntity, UserEntityCreate}},
    web::{AppState, AuthenticatedUser, UserRole},
};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tower_cookies::Cookie;

pub const TEST_JWT: &str = "nexus-test-secret";
pub const PASSWORD: &str = "secret123";

/// `FlowDatabase` is a private in-memory database plus an uploads directory.
/// Both go away on `Drop`.
pub struct FlowDatabase {
    pub db: DbConnection,
    pub uploads: TempDir,
}

impl FlowDatabase {
    pub fn state(&self) -> AppState {
        AppState::new(
            ModelManager::new(self.db.clone()),
            TEST_JWT,
            self.uploads.path().to_path_buf(),
        )
    }
}

pub async fn setup_test_db() -> FlowDatabase {
    let db = DbConnection::in_memory().await.unwrap();
    let uploads = tempfile::tempdir().unwrap();
    FlowDatabase { db, uploads }
}

pub async fn setup_server(db: &FlowDatabase) -> TestServer {
    TestServer::new(build_server_with_state(db.state())).unwrap()
}

/// Serves the app on an ephemeral port and returns its `/api/v1` base url.
pub async fn spawn_server(db: &FlowDatabase) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_server_with_state(db.state());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api/v1")
}

pub async fn seed_user(db: &FlowDatabase, username: &str, role: UserRole) -> UserEntity {
    let mm = ModelManager::new(db.db.clone());
    UserEntity::create(
        &mm,
        &AuthenticatedUser::admin(),
        UserEntityCreate {
            username: username.to_string(),
            password_hash: hash_password(PASSWORD).unwrap(),
            role,
        },
    )
    .await
    .unwrap()
}

/// Signed-in client for a freshly seeded user.
pub async fn client_as(db: &FlowDatabase, base_url: &str, username: &str, role: UserRole) -> ApiClient {
    seed_user(db, username, role).await;
    let mut api = ApiClient::new(base_url);
    api.signin(username, PASSWORD).await.unwrap();
    api
}

#[derive(Debug)]
pub struct FlowContext {
    pub store: HashMap<&'static str, Value>, // a way to pass data between steps
}

impl FlowContext {
    pub fn new() -> Self {
        Self {
            store: HashMap::new(),
        }
    }

    pub fn store(&mut self, key: &'static str, val: Value) {
        self.store.insert(key, val);
    }

    pub fn get(&self, key: &str) -> &Value {
        self.store.get(key).expect("missing store key")
    }

    pub fn id(&self, key: &str) -> i64 {
        self.get(key)["id"].as_i64().expect("stored value has no id")
    }

    pub fn get_json<T>(&self, key: &str) -> T
    where
        T: DeserializeOwned,
    {
        serde_json::from_value(self.get(key).clone()).expect("Invalid json format")
    }
}

type DynFn<T> = Box<dyn Fn(&FlowContext) -> T + Send + Sync>;

pub struct Action {
    pub name: &'static str,
    pub method: &'static str,
    pub path: String,
    pub dyn_path: Option<DynFn<String>>,
    pub body: Option<Value>,
    pub dyn_body: Option<DynFn<Value>>,
    pub expect: StatusCode,
    pub clear_cookies: bool,
    pub save_cookies: bool,
    pub query_params: Vec<(String, String)>,
    pub cookie_asserts: Vec<(&'static str, Box<dyn Fn(&Cookie) + Send + Sync>)>,
    pub body_asserts: Vec<Box<dyn Fn(&Value) + Send + Sync>>,
    pub save_as: Option<&'static str>,
}

impl Action {
    pub fn new(name: &'static str, method: &'static str, path: &str) -> Self {
        Self {
            name,
            method,
            path: path.to_string(),
            dyn_path: None,
            body: None,
            dyn_body: None,
            expect: StatusCode::OK,
            clear_cookies: false,
            save_cookies: true,
            query_params: vec![],
            cookie_asserts: vec![],
            body_asserts: vec![],
            save_as: None,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_expect(mut self, expect: StatusCode) -> Self {
        self.expect = expect;
        self
    }

    pub fn with_save_cookies(mut self, save_cookies: bool) -> Self {
        self.save_cookies = save_cookies;
        self
    }

    pub fn with_clear_cookies(mut self, clear_cookies: bool) -> Self {
        self.clear_cookies = clear_cookies;
        self
    }

    pub fn with_param(mut self, key: &str, val: &str) -> Self {
        self.query_params.push((key.to_string(), val.to_string()));
        self
    }

    pub fn with_dyn_path<F>(mut self, f: F) -> Self
    where
        F: Fn(&FlowContext) -> String + Send + Sync + 'static,
    {
        self.dyn_path = Some(Box::new(f));
        self
    }

    pub fn with_dyn_body<F>(mut self, f: F) -> Self
    where
        F: Fn(&FlowContext) -> Value + Send + Sync + 'static,
    {
        self.dyn_body = Some(Box::new(f));
        self
    }

    pub fn with_save_as(mut self, key: &'static str) -> Self {
        self.save_as = Some(key);
        self
    }

    pub fn assert_cookie<F>(mut self, name: &'static str, check: F) -> Self
    where
        F: Fn(&Cookie) + Send + Sync + 'static,
    {
        self.cookie_asserts.push((name, Box::new(check)));
        self
    }

    pub fn assert_body<F>(mut self, check: F) -> Self
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.body_asserts.push(Box::new(check));
        self
    }
}

pub struct Flow {
    actions: Vec<Action>,
}

impl Flow {
    pub fn new() -> Self {
        Self { actions: vec![] }
    }

    pub fn step(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub async fn run(self, server: &mut TestServer) -> FlowContext {
        let mut ctx = FlowContext::new(); // create new context for this flow
        for action in self.actions {
            println!("==> Running test action `{}`", action.name);
            if action.clear_cookies {
                server.clear_cookies();
            }

            if action.save_cookies {
                server.save_cookies();
            } else {
                server.do_not_save_cookies();
            }

            let path = match &action.dyn_path {
                Some(f) => f(&ctx),
                None => action.path.clone(),
            };

            let mut req = match action.method {
                "GET" => server.get(&path),
                "POST" => server.post(&path),
                "PUT" => server.put(&path),
                "DELETE" => server.delete(&path),
                _ => panic!("unsupported method {}", action.method),
            };

            match (&action.dyn_body, &action.body) {
                (Some(f), _) => req = req.json(&f(&ctx)),
                (_, Some(json)) => req = req.json(json),
                _ => {}
            }

            for (k, v) in &action.query_params {
                req = req.add_query_param(k, v);
            }

            let resp = req.await;
            resp.assert_status(action.expect);
            let cookies = resp.cookies();

            for (cookie_name, check) in &action.cookie_asserts {
                let cookie = cookies
                    .get(cookie_name)
                    .unwrap_or_else(|| panic!("Cookie {} is not set", cookie_name));
                check(cookie);
            }

            if !action.body_asserts.is_empty() || action.save_as.is_some() {
                let body = resp.json::<Value>();
                for check in &action.body_asserts {
                    check(&body);
                }
                if let Some(save_key) = action.save_as {
                    ctx.store(save_key, body);
                }
            }
        }
        ctx
    }
}

// Common actions builders

pub fn signup_action(name: &str, password: &str) -> Action {
    Action::new("signup", "POST", "/api/v1/account/signup").with_body(json!({
        "username": name,
        "password": password,
    }))
}

pub fn signin_action(name: &str, password: &str) -> Action {
    Action::new("signin", "POST", "/api/v1/account/signin").with_body(json!({
        "username": name,
        "password": password,
    }))
}

/// Signs in a user created with [`seed_user`].
pub fn signin_seeded(name: &str) -> Action {
    signin_action(name, PASSWORD).with_clear_cookies(true)
}

pub fn create_course_action(title: &str) -> Action {
    Action::new("create_course", "POST", "/api/v1/studio/courses").with_body(json!({
        "title": title,
        "status": "publish",
    }))
}

pub fn create_item_action(course_key: &'static str, title: &str, item_type: &str) -> Action {
    let title = title.to_string();
    let item_type = item_type.to_string();
    Action::new("create_item", "POST", "/api/v1/studio/items").with_dyn_body(move |ctx| {
        json!({
            "course_id": ctx.id(course_key),
            "module_id": 0,
            "title": title,
            "type": item_type,
            "status": "publish",
        })
    })
}
