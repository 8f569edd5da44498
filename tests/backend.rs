//! End-to-end client behavior against an in-process mock of the forum backend.
//!
//! The mock speaks the same HTTP contract as the real server and records
//! every request line, so tests can assert both state changes and the
//! absence of round-trips.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post, put};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Value, json};

use flapper_news::config::HttpTimeouts;
use flapper_news::error::{NavigationError, PageError, PostsError, ValidationError};
use flapper_news::net::api::ForumApi;
use flapper_news::net::types::{CommentEntry, Credentials, NewPost};
use flapper_news::pages::auth::{AuthMode, AuthPage};
use flapper_news::pages::home::HomePage;
use flapper_news::router::{Route, Router, View};
use flapper_news::state::Session;
use flapper_news::state::auth::Claims;
use flapper_news::state::token_store::{MemoryTokenStore, TokenStore};

// =============================================================================
// MOCK BACKEND
// =============================================================================

#[derive(Clone)]
struct MockComment {
    id: String,
    body: String,
    author: String,
    upvotes: u64,
    downvotes: u64,
}

#[derive(Clone)]
struct MockPost {
    id: String,
    title: String,
    link: String,
    upvotes: u64,
    downvotes: u64,
    comments: Vec<MockComment>,
    author: String,
}

#[derive(Default)]
struct Backend {
    posts: Vec<MockPost>,
    users: HashMap<String, String>,
    requests: Vec<String>,
    next_id: u32,
    listing_down: bool,
}

type Shared = Arc<Mutex<Backend>>;
type Reply = Result<Json<Value>, (StatusCode, Json<Value>)>;

impl Backend {
    fn seeded() -> Self {
        let mut backend = Self::default();
        backend.users.insert("alice".into(), "wonderland".into());
        backend.posts.push(MockPost {
            id: "p1".into(),
            title: "Announcing Rust 2024".into(),
            link: "https://blog.rust-lang.org".into(),
            upvotes: 5,
            downvotes: 1,
            comments: vec![MockComment {
                id: "c1".into(),
                body: "finally".into(),
                author: "bob".into(),
                upvotes: 2,
                downvotes: 0,
            }],
            author: "alice".into(),
        });
        backend.posts.push(MockPost {
            id: "p2".into(),
            title: "Ask FN: favorite editor?".into(),
            link: String::new(),
            upvotes: 9,
            downvotes: 0,
            comments: Vec::new(),
            author: "bob".into(),
        });
        backend
    }

    fn fresh_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", 100 + self.next_id)
    }

    fn post_mut(&mut self, id: &str) -> Result<&mut MockPost, (StatusCode, Json<Value>)> {
        self.posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| reject(StatusCode::NOT_FOUND, "can't find post"))
    }
}

fn reject(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "message": message })))
}

fn comment_json(c: &MockComment) -> Value {
    json!({ "_id": c.id, "body": c.body, "author": c.author, "upvotes": c.upvotes, "downvotes": c.downvotes })
}

fn post_json(p: &MockPost, populated: bool) -> Value {
    let comments: Vec<Value> = if populated {
        p.comments.iter().map(comment_json).collect()
    } else {
        p.comments.iter().map(|c| json!(c.id)).collect()
    };
    json!({
        "_id": p.id,
        "title": p.title,
        "link": p.link,
        "upvotes": p.upvotes,
        "downvotes": p.downvotes,
        "comments": comments,
        "author": p.author,
    })
}

fn issue_token(username: &str, exp: u64) -> String {
    let claims = json!({ "_id": format!("u-{username}"), "username": username, "exp": exp });
    format!("mockheader.{}.mocksig", URL_SAFE_NO_PAD.encode(claims.to_string()))
}

fn now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()
}

fn require_user(headers: &HeaderMap) -> Result<String, (StatusCode, Json<Value>)> {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "No authorization token was found"))?;
    Claims::decode(token)
        .map(|claims| claims.username)
        .map_err(|_| reject(StatusCode::UNAUTHORIZED, "invalid token"))
}

fn record(state: &Shared, line: String) -> std::sync::MutexGuard<'_, Backend> {
    let mut backend = state.lock().unwrap();
    backend.requests.push(line);
    backend
}

async fn list_posts(State(state): State<Shared>) -> Reply {
    let backend = record(&state, "GET /posts".into());
    if backend.listing_down {
        return Err(reject(StatusCode::SERVICE_UNAVAILABLE, "listing unavailable"));
    }
    Ok(Json(Value::Array(backend.posts.iter().map(|p| post_json(p, false)).collect())))
}

async fn get_post(State(state): State<Shared>, Path(id): Path<String>) -> Reply {
    let mut backend = record(&state, format!("GET /posts/{id}"));
    let post = backend.post_mut(&id)?;
    Ok(Json(post_json(post, true)))
}

async fn create_post(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let mut backend = record(&state, "POST /posts".into());
    let author = require_user(&headers)?;
    let id = backend.fresh_id("p");
    let post = MockPost {
        id,
        title: body["title"].as_str().unwrap_or_default().to_owned(),
        link: body["link"].as_str().unwrap_or_default().to_owned(),
        upvotes: 0,
        downvotes: 0,
        comments: Vec::new(),
        author,
    };
    let reply = post_json(&post, false);
    backend.posts.push(post);
    Ok(Json(reply))
}

// Vote replies carry inflated counts; the client must not trust them.
fn vote_post(state: &Shared, headers: &HeaderMap, id: &str, up: bool) -> Reply {
    let dir = if up { "upvote" } else { "downvote" };
    let mut backend = record(state, format!("PUT /posts/{id}/{dir}"));
    require_user(headers)?;
    let post = backend.post_mut(id)?;
    if up {
        post.upvotes += 1;
    } else {
        post.downvotes += 1;
    }
    Ok(Json(json!({ "_id": post.id, "upvotes": post.upvotes + 100, "downvotes": post.downvotes + 100 })))
}

async fn upvote_post(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Reply {
    vote_post(&state, &headers, &id, true)
}

async fn downvote_post(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Reply {
    vote_post(&state, &headers, &id, false)
}

async fn add_comment(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    let mut backend = record(&state, format!("POST /posts/{id}/comments"));
    require_user(&headers)?;
    let comment_id = backend.fresh_id("c");
    let comment = MockComment {
        id: comment_id,
        body: body["body"].as_str().unwrap_or_default().to_owned(),
        author: body["author"].as_str().unwrap_or_default().to_owned(),
        upvotes: 0,
        downvotes: 0,
    };
    let reply = comment_json(&comment);
    backend.post_mut(&id)?.comments.push(comment);
    Ok(Json(reply))
}

fn vote_comment(state: &Shared, headers: &HeaderMap, id: &str, cid: &str, up: bool) -> Reply {
    let dir = if up { "upvote" } else { "downvote" };
    let mut backend = record(state, format!("PUT /posts/{id}/comments/{cid}/{dir}"));
    require_user(headers)?;
    let comment = backend
        .post_mut(id)?
        .comments
        .iter_mut()
        .find(|c| c.id == cid)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "can't find comment"))?;
    if up {
        comment.upvotes += 1;
    } else {
        comment.downvotes += 1;
    }
    Ok(Json(json!({ "upvotes": 0, "downvotes": 0 })))
}

async fn upvote_comment(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((id, cid)): Path<(String, String)>,
) -> Reply {
    vote_comment(&state, &headers, &id, &cid, true)
}

async fn downvote_comment(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((id, cid)): Path<(String, String)>,
) -> Reply {
    vote_comment(&state, &headers, &id, &cid, false)
}

async fn register(State(state): State<Shared>, Json(body): Json<Value>) -> Reply {
    let mut backend = record(&state, "POST /register".into());
    let username = body["username"].as_str().unwrap_or_default().to_owned();
    let password = body["password"].as_str().unwrap_or_default().to_owned();
    if username.is_empty() || password.is_empty() {
        return Err(reject(StatusCode::BAD_REQUEST, "Please fill out all fields"));
    }
    if backend.users.contains_key(&username) {
        return Err(reject(StatusCode::BAD_REQUEST, "Username already taken"));
    }
    backend.users.insert(username.clone(), password);
    Ok(Json(json!({ "token": issue_token(&username, now() + 3600) })))
}

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Reply {
    let backend = record(&state, "POST /login".into());
    let username = body["username"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    match backend.users.get(username) {
        Some(expected) if expected == password => Ok(Json(json!({ "token": issue_token(username, now() + 3600) }))),
        Some(_) => Err(reject(StatusCode::UNAUTHORIZED, "Incorrect password.")),
        None => Err(reject(StatusCode::UNAUTHORIZED, "Incorrect username.")),
    }
}

async fn spawn_backend(backend: Backend) -> (String, Shared) {
    let shared: Shared = Arc::new(Mutex::new(backend));
    let app = axum::Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/{id}", get(get_post))
        .route("/posts/{id}/upvote", put(upvote_post))
        .route("/posts/{id}/downvote", put(downvote_post))
        .route("/posts/{id}/comments", post(add_comment))
        .route("/posts/{id}/comments/{cid}/upvote", put(upvote_comment))
        .route("/posts/{id}/comments/{cid}/downvote", put(downvote_comment))
        .route("/register", post(register))
        .route("/login", post(login))
        .with_state(shared.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), shared)
}

// =============================================================================
// HARNESS
// =============================================================================

struct Harness {
    session: Session,
    router: Router,
    store: Arc<MemoryTokenStore>,
    backend: Shared,
}

impl Harness {
    async fn start() -> Self {
        Self::with_store(MemoryTokenStore::new()).await
    }

    async fn logged_in_as(username: &str) -> Self {
        Self::with_store(MemoryTokenStore::with_token(issue_token(username, now() + 3600))).await
    }

    async fn with_store(store: MemoryTokenStore) -> Self {
        let (base_url, backend) = spawn_backend(Backend::seeded()).await;
        let store = Arc::new(store);
        let api = ForumApi::new(&base_url, HttpTimeouts { request_secs: 10, connect_secs: 5 }).unwrap();
        let session = Session::new(api, store.clone());
        Self { session, router: Router::new(), store, backend }
    }

    fn request_count(&self) -> usize {
        self.backend.lock().unwrap().requests.len()
    }

    fn requests(&self) -> Vec<String> {
        self.backend.lock().unwrap().requests.clone()
    }
}

// =============================================================================
// NAVIGATION
// =============================================================================

#[tokio::test]
async fn home_preloads_post_list() {
    let mut h = Harness::start().await;
    let view = h.router.go_to_path(&mut h.session, "/home").await.unwrap();
    assert!(matches!(view, View::Home(_)));
    assert_eq!(h.requests(), ["GET /posts"]);

    let posts = h.session.posts.posts();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].comments, [CommentEntry::Ref("c1".into())]);

    let rendered = view.render(&h.session);
    let p2 = rendered.find("favorite editor").unwrap();
    let p1 = rendered.find("Announcing Rust").unwrap();
    assert!(p2 < p1, "higher-voted post renders first:\n{rendered}");
}

#[tokio::test]
async fn unknown_path_falls_back_home() {
    let mut h = Harness::start().await;
    let view = h.router.go_to_path(&mut h.session, "/nowhere").await.unwrap();
    assert_eq!(view.route(), Route::Home);
    assert_eq!(h.router.current(), Some(&Route::Home));
}

#[tokio::test]
async fn post_route_preloads_single_post_without_touching_list() {
    let mut h = Harness::start().await;
    let view = h.router.go_to_path(&mut h.session, "/posts/p1").await.unwrap();
    let View::Post(page) = view else { panic!("expected post view") };
    assert_eq!(page.post.title, "Announcing Rust 2024");
    assert_eq!(page.post.loaded_comments().count(), 1);
    assert!(h.session.posts.posts().is_empty());
    assert_eq!(h.requests(), ["GET /posts/p1"]);
}

#[tokio::test]
async fn missing_post_aborts_transition() {
    let mut h = Harness::start().await;
    h.router.go(&mut h.session, Route::Home).await.unwrap();
    let err = h.router.go(&mut h.session, Route::Post("nope".into())).await.unwrap_err();
    assert!(matches!(err, NavigationError::Posts(PostsError::Api(ref api)) if !api.is_unauthorized()));
    assert_eq!(h.router.current(), Some(&Route::Home));
}

#[tokio::test]
async fn failed_reload_keeps_previous_list() {
    let mut h = Harness::start().await;
    h.session.posts.get_all().await.unwrap();
    h.backend.lock().unwrap().listing_down = true;

    let err = h.session.posts.get_all().await.unwrap_err();
    assert!(matches!(err, PostsError::Api(ref api) if api.display_message() == "listing unavailable"));
    let ids: Vec<&str> = h.session.posts.posts().iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["p1", "p2"]);
    assert_eq!(h.requests(), ["GET /posts", "GET /posts"]);
}

#[tokio::test]
async fn post_id_is_sent_as_one_escaped_segment() {
    let mut h = Harness::start().await;
    let err = h.router.go(&mut h.session, Route::Post("a?b".into())).await.unwrap_err();
    assert!(matches!(err, NavigationError::Posts(PostsError::Api(ref api)) if api.display_message() == "can't find post"));
    assert_eq!(h.requests(), ["GET /posts/a?b"]);
    assert_eq!(h.router.current(), None);
}

#[tokio::test]
async fn login_route_redirects_home_when_logged_in() {
    let mut h = Harness::logged_in_as("alice").await;
    let view = h.router.go_to_path(&mut h.session, "/login").await.unwrap();
    assert!(matches!(view, View::Home(_)));
    assert_eq!(h.router.current(), Some(&Route::Home));
    assert_eq!(h.requests(), ["GET /posts"]);
}

#[tokio::test]
async fn register_route_renders_form_when_logged_out() {
    let mut h = Harness::start().await;
    let view = h.router.go(&mut h.session, Route::Register).await.unwrap();
    assert!(matches!(view, View::Register(ref page) if page.mode == AuthMode::Register));
    assert_eq!(h.request_count(), 0);
}

// =============================================================================
// POSTS
// =============================================================================

#[tokio::test]
async fn create_appends_server_post() {
    let mut h = Harness::logged_in_as("carol").await;
    h.session.posts.get_all().await.unwrap();
    let before = h.session.posts.posts().len();

    let new_post = NewPost { title: "Show FN: a CLI".into(), link: Some("https://example.test".into()) };
    let created = h.session.posts.create(&h.session.auth, &new_post).await.unwrap().clone();

    assert_eq!(h.session.posts.posts().len(), before + 1);
    assert_eq!(created.id, "p101");
    assert_eq!(created.author.as_deref(), Some("carol"));
    assert!(h.session.posts.posts().contains(&created));
}

#[tokio::test]
async fn create_without_token_is_rejected_by_server() {
    let mut h = Harness::start().await;
    h.session.posts.get_all().await.unwrap();

    let new_post = NewPost { title: "anon".into(), link: None };
    let err = h.session.posts.create(&h.session.auth, &new_post).await.unwrap_err();
    assert!(matches!(err, PostsError::Api(ref api) if api.is_unauthorized()));
    assert_eq!(h.session.posts.posts().len(), 2);
}

#[tokio::test]
async fn blank_title_never_reaches_server() {
    let mut h = Harness::logged_in_as("carol").await;
    let mut page = h.router.home(&mut h.session).await.unwrap();
    let before = h.request_count();

    page.title = String::new();
    page.link = "https://example.test".into();
    let err = page.add_post(&mut h.session).await.unwrap_err();

    assert!(matches!(err, PageError::Validation(ValidationError::BlankTitle)));
    assert_eq!(h.request_count(), before);
}

#[tokio::test]
async fn home_page_add_post_clears_form() {
    let mut h = Harness::logged_in_as("carol").await;
    let mut page = h.router.home(&mut h.session).await.unwrap();
    page.title = "Fresh".into();
    page.add_post(&mut h.session).await.unwrap();

    assert_eq!(page, HomePage::default());
    let last = h.session.posts.posts().last().unwrap();
    assert_eq!(last.title, "Fresh");
    assert_eq!(last.link.as_deref(), Some(""));
    assert!(h.requests().contains(&"POST /posts".to_owned()));
}

#[tokio::test]
async fn upvote_increments_exactly_one_and_ignores_reply() {
    let mut h = Harness::logged_in_as("alice").await;
    h.session.posts.get_all().await.unwrap();
    let before = h.session.posts.listed("p1").unwrap().clone();

    h.session.posts.upvote_listed(&h.session.auth, "p1").await.unwrap();

    let after = h.session.posts.listed("p1").unwrap();
    assert_eq!(after.upvotes, before.upvotes + 1);
    assert_eq!(after.downvotes, before.downvotes);
    assert_eq!(after.title, before.title);
    assert_eq!(after.comments, before.comments);
}

#[tokio::test]
async fn downvote_owned_post() {
    let h = Harness::logged_in_as("alice").await;
    let mut post = h.session.posts.get("p2").await.unwrap();
    h.session.posts.downvote(&h.session.auth, &mut post).await.unwrap();
    assert_eq!((post.upvotes, post.downvotes), (9, 1));
}

#[tokio::test]
async fn failed_vote_is_ignored_by_home_page() {
    let mut h = Harness::start().await;
    let page = h.router.home(&mut h.session).await.unwrap();
    page.upvote(&mut h.session, "p1").await;
    assert_eq!(h.session.posts.listed("p1").unwrap().upvotes, 5);
    assert!(h.requests().contains(&"PUT /posts/p1/upvote".to_owned()));
}

// =============================================================================
// COMMENTS
// =============================================================================

#[tokio::test]
async fn upvote_comment_from_two_to_three() {
    let mut h = Harness::logged_in_as("alice").await;
    let mut page = h.router.post(&h.session, "p1").await.unwrap();
    page.upvote(&h.session, "c1").await;

    let comment = page.post.loaded_comments().next().unwrap();
    assert_eq!(comment.upvotes, 3);
    assert_eq!(comment.downvotes, 0);
    assert!(h.requests().contains(&"PUT /posts/p1/comments/c1/upvote".to_owned()));
}

#[tokio::test]
async fn downvote_comment_via_service() {
    let h = Harness::logged_in_as("alice").await;
    let mut post = h.session.posts.get("p1").await.unwrap();
    h.session.posts.downvote_comment(&h.session.auth, &mut post, "c1").await.unwrap();
    let comment = post.loaded_comments().next().unwrap();
    assert_eq!((comment.upvotes, comment.downvotes), (2, 1));
}

#[tokio::test]
async fn add_comment_appends_with_current_user_as_author() {
    let mut h = Harness::logged_in_as("dave").await;
    let mut page = h.router.post(&h.session, "p2").await.unwrap();
    page.body = "vim, obviously".into();
    page.add_comment(&h.session).await.unwrap();

    assert!(page.body.is_empty());
    let comments: Vec<_> = page.post.loaded_comments().collect();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].body, "vim, obviously");
    assert_eq!(comments[0].author, "dave");
}

#[tokio::test]
async fn add_comment_service_returns_comment_without_appending() {
    let h = Harness::logged_in_as("dave").await;
    let post = h.session.posts.get("p2").await.unwrap();
    let comment = flapper_news::net::types::NewComment { body: "emacs".into(), author: "user".into() };
    let created = h.session.posts.add_comment(&h.session.auth, &post.id, &comment).await.unwrap();
    assert_eq!(created.body, "emacs");
    assert!(post.comments.is_empty());
}

// =============================================================================
// AUTH
// =============================================================================

#[tokio::test]
async fn login_persists_token_and_exposes_user() {
    let mut h = Harness::start().await;
    let View::Login(mut page) = h.router.go(&mut h.session, Route::Login).await.unwrap() else {
        panic!("expected login view")
    };
    page.user = Credentials { username: "alice".into(), password: "wonderland".into() };

    assert_eq!(page.submit(&h.session).await, Some(Route::Home));
    assert!(page.error.is_none());
    assert!(h.store.get().unwrap().is_some());
    assert!(h.session.auth.is_logged_in().unwrap());
    assert_eq!(h.session.auth.current_user().unwrap().as_deref(), Some("alice"));
}

#[tokio::test]
async fn wrong_password_shows_inline_error() {
    let h = Harness::start().await;
    let mut page = AuthPage::new(AuthMode::Login);
    page.user = Credentials { username: "alice".into(), password: "nope".into() };

    assert_eq!(page.log_in(&h.session).await, None);
    assert_eq!(page.error.as_deref(), Some("Incorrect password."));
    assert_eq!(h.store.get().unwrap(), None);
}

#[tokio::test]
async fn register_then_log_out() {
    let h = Harness::start().await;
    let mut page = AuthPage::new(AuthMode::Register);
    page.user = Credentials { username: "erin".into(), password: "pw".into() };

    assert_eq!(page.register(&h.session).await, Some(Route::Home));
    assert_eq!(h.session.auth.current_user().unwrap().as_deref(), Some("erin"));

    h.session.auth.log_out().unwrap();
    assert!(!h.session.auth.is_logged_in().unwrap());
    assert_eq!(h.session.auth.current_user().unwrap(), None);
}

#[tokio::test]
async fn duplicate_registration_keeps_previous_token() {
    let h = Harness::logged_in_as("alice").await;
    let previous = h.store.get().unwrap();
    let mut page = AuthPage::new(AuthMode::Register);
    page.user = Credentials { username: "alice".into(), password: "again".into() };

    assert_eq!(page.register(&h.session).await, None);
    assert_eq!(page.error.as_deref(), Some("Username already taken"));
    assert_eq!(h.store.get().unwrap(), previous);
}

#[tokio::test]
async fn expired_token_is_logged_out_and_login_renders() {
    let mut h = Harness::with_store(MemoryTokenStore::with_token(issue_token("alice", 1))).await;
    assert!(!h.session.auth.is_logged_in().unwrap());
    let view = h.router.go(&mut h.session, Route::Login).await.unwrap();
    assert!(matches!(view, View::Login(_)));
}
