//! Integration tests driving the full router against the in-memory store

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use tower::ServiceExt;
use uuid::Uuid;

use local_library::{
    api,
    config::AppConfig,
    models::BookInstanceStatus,
    repository::Repository,
    AppState,
};

struct TestApp {
    router: Router,
    repository: Repository,
}

struct TestResponse {
    status: StatusCode,
    location: Option<String>,
    headers: axum::http::HeaderMap,
    body: String,
}

impl TestResponse {
    /// Id at the end of the redirect target
    fn created_id(&self) -> String {
        let location = self.location.as_deref().expect("response should redirect");
        location.rsplit('/').next().unwrap().to_string()
    }
}

impl TestApp {
    fn new() -> Self {
        let repository = Repository::in_memory();
        let state = AppState::new(AppConfig::default(), repository.clone());
        Self {
            router: api::router(state),
            repository,
        }
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let location = headers
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        TestResponse {
            status,
            location,
            headers,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn post(&self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(serde_urlencoded::to_string(fields).unwrap()))
            .unwrap();
        self.send(request).await
    }

    async fn create_author(&self, first: &str, family: &str) -> String {
        let response = self
            .post(
                "/catalog/author/create",
                &[("first_name", first), ("family_name", family)],
            )
            .await;
        assert_eq!(response.status, StatusCode::SEE_OTHER, "{}", response.body);
        response.created_id()
    }

    async fn create_genre(&self, name: &str) -> String {
        let response = self.post("/catalog/genre/create", &[("name", name)]).await;
        assert_eq!(response.status, StatusCode::SEE_OTHER, "{}", response.body);
        response.created_id()
    }

    async fn create_book(&self, title: &str, author: &str, genres: &[&str]) -> String {
        let mut fields = vec![
            ("title", title),
            ("author", author),
            ("summary", "A summary"),
            ("isbn", "9780000000000"),
        ];
        fields.extend(genres.iter().map(|g| ("genre", *g)));
        let response = self.post("/catalog/book/create", &fields).await;
        assert_eq!(response.status, StatusCode::SEE_OTHER, "{}", response.body);
        response.created_id()
    }

    async fn create_copy(&self, book: &str, status: &str) -> String {
        let response = self
            .post(
                "/catalog/bookinstance/create",
                &[("book", book), ("imprint", "Gollancz 2001"), ("status", status)],
            )
            .await;
        assert_eq!(response.status, StatusCode::SEE_OTHER, "{}", response.body);
        response.created_id()
    }
}

#[tokio::test]
async fn test_root_redirects_to_catalog() {
    let app = TestApp::new();
    let response = app.get("/").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/catalog"));
}

#[tokio::test]
async fn test_health_probes() {
    let app = TestApp::new();

    let health = app.get("/health").await;
    assert_eq!(health.status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&health.body).unwrap();
    assert_eq!(body["status"], "healthy");

    let ready = app.get("/ready").await;
    assert_eq!(ready.status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&ready.body).unwrap();
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_security_headers() {
    let app = TestApp::new();
    let response = app.get("/catalog").await;
    assert_eq!(response.headers["x-content-type-options"], "nosniff");
    assert_eq!(response.headers["x-frame-options"], "SAMEORIGIN");
}

#[tokio::test]
async fn test_dashboard_counts() {
    let app = TestApp::new();

    let empty = app.get("/catalog/").await;
    assert_eq!(empty.status, StatusCode::OK);
    assert!(empty.body.contains("<strong>Books:</strong> 0"));
    assert!(empty.body.contains("<strong>Genres:</strong> 0"));

    let author = app.create_author("Isaac", "Asimov").await;
    let genre = app.create_genre("Science Fiction").await;
    let book = app.create_book("Foundation", &author, &[genre.as_str()]).await;
    app.create_copy(&book, "Available").await;
    app.create_copy(&book, "Loaned").await;

    let populated = app.get("/catalog").await;
    assert_eq!(populated.status, StatusCode::OK);
    assert!(populated.body.contains("<strong>Books:</strong> 1"));
    assert!(populated.body.contains("<strong>Copies:</strong> 2"));
    assert!(populated.body.contains("<strong>Copies available:</strong> 1"));
    assert!(populated.body.contains("<strong>Authors:</strong> 1"));
    assert!(populated.body.contains("<strong>Genres:</strong> 1"));
}

#[tokio::test]
async fn test_genre_name_length() {
    let app = TestApp::new();

    app.create_genre("Fantasy").await;
    app.create_genre("Sci").await;

    let response = app.post("/catalog/genre/create", &[("name", "Fi")]).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response
        .body
        .contains("Genre name must contain at least 3 characters."));
    assert!(response.body.contains("value=\"Fi\""));
    assert_eq!(app.repository.genres.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_genre_duplicate_redirects_to_existing() {
    let app = TestApp::new();

    let first = app.post("/catalog/genre/create", &[("name", "Fantasy")]).await;
    let second = app.post("/catalog/genre/create", &[("name", " Fantasy ")]).await;
    assert_eq!(second.status, StatusCode::SEE_OTHER);
    assert_eq!(first.location, second.location);
    assert_eq!(app.repository.genres.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_author_create_and_detail() {
    let app = TestApp::new();

    let response = app
        .post(
            "/catalog/author/create",
            &[
                ("first_name", "  Isaac "),
                ("family_name", "Asimov"),
                ("date_of_birth", "1920-01-02"),
                ("date_of_death", ""),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    let location = response.location.clone().unwrap();
    assert!(location.starts_with("/catalog/author/"));

    let detail = app.get(&location).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert!(detail.body.contains("Author: Asimov, Isaac"));
    assert!(detail.body.contains("Jan 2, 1920"));
    assert!(detail.body.contains("This author has no books."));

    let list = app.get("/catalog/authors").await;
    assert!(list.body.contains(&location));
}

#[tokio::test]
async fn test_author_invalid_field_persists_nothing() {
    let app = TestApp::new();

    let response = app
        .post(
            "/catalog/author/create",
            &[("first_name", "Isaac!"), ("family_name", "Asimov")],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response
        .body
        .contains("First name has non-alphanumeric characters."));
    assert!(!response.body.contains("Family name must"));
    assert_eq!(app.repository.authors.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_author_delete_blocked_while_books_exist() {
    let app = TestApp::new();
    let author = app.create_author("Isaac", "Asimov").await;
    let book = app.create_book("Foundation", &author, &[]).await;

    let confirm = app.get(&format!("/catalog/author/{}/delete", author)).await;
    assert_eq!(confirm.status, StatusCode::OK);
    assert!(confirm.body.contains("Foundation"));

    let blocked = app
        .post(
            &format!("/catalog/author/{}/delete", author),
            &[("authorid", author.as_str())],
        )
        .await;
    assert_eq!(blocked.status, StatusCode::OK);
    assert!(blocked
        .body
        .contains("Delete the following books before attempting to delete this author."));
    assert_eq!(app.repository.authors.count().await.unwrap(), 1);

    let removed = app
        .post(&format!("/catalog/book/{}/delete", book), &[("bookid", book.as_str())])
        .await;
    assert_eq!(removed.location.as_deref(), Some("/catalog/books"));

    let deleted = app
        .post(
            &format!("/catalog/author/{}/delete", author),
            &[("authorid", author.as_str())],
        )
        .await;
    assert_eq!(deleted.status, StatusCode::SEE_OTHER);
    assert_eq!(deleted.location.as_deref(), Some("/catalog/authors"));
    assert_eq!(app.repository.authors.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_genre_delete_blocked_while_books_tagged() {
    let app = TestApp::new();
    let author = app.create_author("Frank", "Herbert").await;
    let genre = app.create_genre("Science Fiction").await;
    app.create_book("Dune", &author, &[genre.as_str()]).await;

    let blocked = app
        .post(
            &format!("/catalog/genre/{}/delete", genre),
            &[("genreid", genre.as_str())],
        )
        .await;
    assert_eq!(blocked.status, StatusCode::OK);
    assert!(blocked.body.contains("Dune"));
    assert_eq!(app.repository.genres.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_update_preserves_id() {
    let app = TestApp::new();
    let genre = app.create_genre("Horor").await;
    let url = format!("/catalog/genre/{}", genre);

    let form = app.get(&format!("{}/update", url)).await;
    assert_eq!(form.status, StatusCode::OK);
    assert!(form.body.contains("value=\"Horor\""));

    let response = app
        .post(&format!("{}/update", url), &[("name", "Horror")])
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some(url.as_str()));

    let detail = app.get(&url).await;
    assert!(detail.body.contains("Genre: Horror"));
    assert_eq!(app.repository.genres.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_update_of_deleted_document_is_not_found() {
    let app = TestApp::new();
    let response = app
        .post(
            &format!("/catalog/author/{}/update", Uuid::new_v4()),
            &[("first_name", "Isaac"), ("family_name", "Asimov")],
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(app.repository.authors.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_book_with_unknown_author_persists_nothing() {
    let app = TestApp::new();
    let genre = app.create_genre("Fantasy").await;
    let unknown = Uuid::new_v4().to_string();

    let response = app
        .post(
            "/catalog/book/create",
            &[
                ("title", "The Hobbit"),
                ("author", unknown.as_str()),
                ("summary", "There and back again"),
                ("isbn", "9780261103344"),
                ("genre", genre.as_str()),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Author not found."));
    // Submitted genre stays checked
    assert!(response.body.contains(&format!("value=\"{}\" checked", genre)));
    assert_eq!(app.repository.books.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_book_detail_shows_genres_and_copies() {
    let app = TestApp::new();
    let author = app.create_author("Ursula", "LeGuin").await;
    let fantasy = app.create_genre("Fantasy").await;
    let classics = app.create_genre("Classics").await;
    let book = app
        .create_book("A Wizard of Earthsea", &author, &[fantasy.as_str(), classics.as_str()])
        .await;
    app.create_copy(&book, "Available").await;

    let detail = app.get(&format!("/catalog/book/{}", book)).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert!(detail.body.contains("LeGuin, Ursula"));
    assert!(detail.body.contains("Fantasy"));
    assert!(detail.body.contains("Classics"));
    assert!(detail.body.contains("Gollancz 2001"));

    let stored = app
        .repository
        .books
        .get(Uuid::parse_str(&book).unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.genre.len(), 2);
}

#[tokio::test]
async fn test_book_delete_blocked_while_copies_exist() {
    let app = TestApp::new();
    let author = app.create_author("Frank", "Herbert").await;
    let book = app.create_book("Dune", &author, &[]).await;
    let copy = app.create_copy(&book, "Loaned").await;

    let blocked = app
        .post(&format!("/catalog/book/{}/delete", book), &[("bookid", book.as_str())])
        .await;
    assert_eq!(blocked.status, StatusCode::OK);
    assert!(blocked.body.contains(&copy));
    assert_eq!(app.repository.books.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_bookinstance_delete_is_unconditional() {
    let app = TestApp::new();
    let author = app.create_author("Frank", "Herbert").await;
    let book = app.create_book("Dune", &author, &[]).await;
    let copy = app.create_copy(&book, "Reserved").await;

    let response = app
        .post(
            &format!("/catalog/bookinstance/{}/delete", copy),
            &[("bookinstanceid", copy.as_str())],
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/catalog/bookinstances"));
    assert_eq!(app.repository.book_instances.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_bookinstance_defaults() {
    let app = TestApp::new();
    let author = app.create_author("Frank", "Herbert").await;
    let book = app.create_book("Dune", &author, &[]).await;

    let before = Utc::now();
    let response = app
        .post(
            "/catalog/bookinstance/create",
            &[("book", book.as_str()), ("imprint", "Chilton 1965")],
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);

    let id = Uuid::parse_str(&response.created_id()).unwrap();
    let copy = app
        .repository
        .book_instances
        .get(id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(copy.status, BookInstanceStatus::Maintenance);
    assert!(copy.due_back >= before && copy.due_back <= Utc::now());

    let detail = app.get(response.location.as_deref().unwrap()).await;
    assert!(detail.body.contains("Copy: Dune"));
    assert!(detail.body.contains(&copy.due_back_formatted()));
}

#[tokio::test]
async fn test_bookinstance_invalid_status() {
    let app = TestApp::new();
    let author = app.create_author("Frank", "Herbert").await;
    let book = app.create_book("Dune", &author, &[]).await;

    let response = app
        .post(
            "/catalog/bookinstance/create",
            &[("book", book.as_str()), ("imprint", "Chilton 1965"), ("status", "Lost")],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Invalid status."));
    assert_eq!(app.repository.book_instances.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_create_routes_win_over_ids() {
    let app = TestApp::new();
    for (uri, heading) in [
        ("/catalog/genre/create", "Create Genre"),
        ("/catalog/author/create", "Create Author"),
        ("/catalog/book/create", "Create Book"),
        ("/catalog/bookinstance/create", "Create BookInstance"),
    ] {
        let response = app.get(uri).await;
        assert_eq!(response.status, StatusCode::OK, "{}", uri);
        assert!(response.body.contains(heading), "{}", uri);
    }
}

#[tokio::test]
async fn test_missing_and_malformed_ids() {
    let app = TestApp::new();

    assert_eq!(app.get("/catalog/author/not-an-id").await.status, StatusCode::NOT_FOUND);
    assert_eq!(
        app.get(&format!("/catalog/book/{}", Uuid::new_v4())).await.status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.get(&format!("/catalog/genre/{}/update", Uuid::new_v4())).await.status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(app.get("/catalog/nowhere").await.status, StatusCode::NOT_FOUND);

    let delete = app.get("/catalog/author/not-an-id/delete").await;
    assert_eq!(delete.status, StatusCode::SEE_OTHER);
    assert_eq!(delete.location.as_deref(), Some("/catalog/authors"));
}

#[tokio::test]
async fn test_genre_name_bound_counts_submitted_characters() {
    let app = TestApp::new();
    let name = format!("Rock & Roll {}", "x".repeat(88));

    let genre = app.create_genre(&name).await;
    let detail = app.get(&format!("/catalog/genre/{}", genre)).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert!(detail.body.contains("Genre: Rock &amp; Roll x"));

    let too_long = app
        .post("/catalog/genre/create", &[("name", &*format!("{}x", name))])
        .await;
    assert_eq!(too_long.status, StatusCode::OK);
    assert!(too_long.body.contains("Genre name must not exceed 100 characters."));
    assert_eq!(app.repository.genres.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_author_update() {
    let app = TestApp::new();
    let author = app.create_author("Isaak", "Asimov").await;
    let url = format!("/catalog/author/{}", author);

    let form = app.get(&format!("{}/update", url)).await;
    assert_eq!(form.status, StatusCode::OK);
    assert!(form.body.contains("Update Author"));
    assert!(form.body.contains("value=\"Isaak\""));

    let response = app
        .post(
            &format!("{}/update", url),
            &[
                ("first_name", "Isaac"),
                ("family_name", "Asimov"),
                ("date_of_birth", "1920-01-02"),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some(url.as_str()));

    let detail = app.get(&url).await;
    assert!(detail.body.contains("Author: Asimov, Isaac"));
    assert_eq!(app.repository.authors.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_invalid_update_rerenders_and_keeps_stored_document() {
    let app = TestApp::new();
    let author = app.create_author("Isaac", "Asimov").await;
    let url = format!("/catalog/author/{}", author);

    let response = app
        .post(
            &format!("{}/update", url),
            &[("first_name", "Isaac!"), ("family_name", "Asimov")],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Update Author"));
    assert!(response
        .body
        .contains("First name has non-alphanumeric characters."));
    assert!(response.body.contains("value=\"Isaac!\""));

    let stored = app
        .repository
        .authors
        .get(Uuid::parse_str(&author).unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.first_name, "Isaac");
}

#[tokio::test]
async fn test_book_update_replaces_genres() {
    let app = TestApp::new();
    let author = app.create_author("Frank", "Herbert").await;
    let genre = app.create_genre("Science Fiction").await;
    let book = app.create_book("Dune", &author, &[genre.as_str()]).await;
    let url = format!("/catalog/book/{}", book);

    let form = app.get(&format!("{}/update", url)).await;
    assert_eq!(form.status, StatusCode::OK);
    assert!(form.body.contains("Update Book"));
    assert!(form.body.contains(&format!("value=\"{}\" checked", genre)));
    assert!(form.body.contains(&format!("value=\"{}\" selected", author)));

    // No genre field at all clears the stored genres
    let response = app
        .post(
            &format!("{}/update", url),
            &[
                ("title", "Dune Messiah"),
                ("author", author.as_str()),
                ("summary", "A summary"),
                ("isbn", "9780000000000"),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some(url.as_str()));

    let stored = app
        .repository
        .books
        .get(Uuid::parse_str(&book).unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.title, "Dune Messiah");
    assert!(stored.genre.is_empty());
    assert_eq!(app.repository.books.count().await.unwrap(), 1);

    let form = app.get(&format!("{}/update", url)).await;
    assert!(!form.body.contains(&format!("value=\"{}\" checked", genre)));
}

#[tokio::test]
async fn test_bookinstance_update() {
    let app = TestApp::new();
    let author = app.create_author("Frank", "Herbert").await;
    let book = app.create_book("Dune", &author, &[]).await;
    let copy = app.create_copy(&book, "Reserved").await;
    let url = format!("/catalog/bookinstance/{}", copy);

    let form = app.get(&format!("{}/update", url)).await;
    assert_eq!(form.status, StatusCode::OK);
    assert!(form.body.contains("value=\"Reserved\" selected"));

    let response = app
        .post(
            &format!("{}/update", url),
            &[
                ("book", book.as_str()),
                ("imprint", "Ace 1990"),
                ("status", "Loaned"),
                ("due_back", "2030-06-01"),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some(url.as_str()));

    let stored = app
        .repository
        .book_instances
        .get(Uuid::parse_str(&copy).unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.imprint, "Ace 1990");
    assert_eq!(stored.status, BookInstanceStatus::Loaned);
    assert_eq!(stored.due_back_yyyy_mm_dd(), "2030-06-01");
    assert_eq!(app.repository.book_instances.count().await.unwrap(), 1);
}

/// Round trip against a real PostgreSQL database.
/// Run with: DATABASE_URL=... cargo test -- --ignored
#[tokio::test]
#[ignore]
async fn test_postgres_round_trip() {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("Failed to connect to database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    let repository = Repository::new(pool);
    let app = TestApp {
        router: api::router(AppState::new(AppConfig::default(), repository.clone())),
        repository,
    };

    let author = app.create_author("Isaac", "Asimov").await;
    let genre = app.create_genre(&format!("Genre {}", Uuid::new_v4().simple())).await;
    // Escaping pushes the stored name past 100 characters
    let long_genre = app
        .create_genre(&format!("Rock & Roll {}", "x".repeat(88)))
        .await;
    let book = app.create_book("Foundation", &author, &[genre.as_str()]).await;
    let copy = app.create_copy(&book, "Available").await;

    let detail = app.get(&format!("/catalog/book/{}", book)).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert!(detail.body.contains("Asimov, Isaac"));

    let by_genre = app
        .repository
        .books
        .find_by_genre(Uuid::parse_str(&genre).unwrap())
        .await
        .unwrap();
    assert_eq!(by_genre.len(), 1);

    app.post(
        &format!("/catalog/bookinstance/{}/delete", copy),
        &[("bookinstanceid", copy.as_str())],
    )
    .await;
    app.post(&format!("/catalog/book/{}/delete", book), &[("bookid", book.as_str())])
        .await;
    for id in [&genre, &long_genre] {
        app.post(
            &format!("/catalog/genre/{}/delete", id),
            &[("genreid", id.as_str())],
        )
        .await;
    }
    let deleted = app
        .post(
            &format!("/catalog/author/{}/delete", author),
            &[("authorid", author.as_str())],
        )
        .await;
    assert_eq!(deleted.status, StatusCode::SEE_OTHER);
    assert!(app
        .repository
        .authors
        .get(Uuid::parse_str(&author).unwrap())
        .await
        .unwrap()
        .is_none());
}
