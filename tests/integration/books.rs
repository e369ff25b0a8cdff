//! Book endpoints against a real database.
//!
//! Run with: DATABASE_URL=postgres://... cargo test -- --ignored

use axum::{
    http::{Method, StatusCode},
    Router,
};
use serde_json::{json, Value};

use crate::common::{body_json, database_app, get, send};

async fn add(app: &Router, book: Value) -> Value {
    let response = send(app, Method::POST, "/api/v1/books", Some(book)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

async fn count(app: &Router) -> i64 {
    let response = get(app, "/api/v1/books/count").await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await.as_i64().expect("count is an integer")
}

async fn search(app: &Router, query: &str) -> Vec<Value> {
    let response = get(app, &format!("/api/v1/books/search{}", query)).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await.as_array().unwrap().clone()
}

fn titles(books: &[Value]) -> Vec<&str> {
    books.iter().map(|b| b["title"].as_str().unwrap()).collect()
}

fn sample_books() -> Vec<Value> {
    vec![
        json!({
            "title": "Dune",
            "author": "Frank Herbert",
            "published": "1965-08-01",
            "edition": 1,
            "description": "Desert planet",
            "genre_name": "Science Fiction"
        }),
        json!({
            "title": "Children of Dune",
            "author": "Frank Herbert",
            "published": "1976-04-01",
            "edition": 2,
            "description": "Sequel",
            "genre_name": "Science Fiction"
        }),
        json!({
            "title": "Emma",
            "author": "Jane Austen",
            "published": "1815-12-23",
            "edition": 3,
            "description": "Matchmaking",
            "genre_name": "Romance"
        }),
    ]
}

#[tokio::test]
#[ignore]
async fn add_returns_created_book_with_fresh_id() {
    let (app, _repo, _guard) = database_app().await;

    let first = add(&app, json!({"title": "Dune", "author": "Herbert", "edition": 1})).await;
    let second = add(&app, json!({"title": "Emma", "author": "Austen", "edition": 1})).await;

    let first_id = first["id"].as_i64().unwrap();
    let second_id = second["id"].as_i64().unwrap();
    assert!(first_id > 0);
    assert!(second_id > first_id);
    assert_eq!(first["title"], "Dune");
    assert!(first.get("deleted_at").is_none());
}

#[tokio::test]
#[ignore]
async fn invalid_add_does_not_create_a_row() {
    let (app, _repo, _guard) = database_app().await;
    add(&app, json!({"title": "Dune", "author": "Herbert"})).await;
    let before = count(&app).await;

    for body in [
        json!({"author": "Herbert"}),
        json!({"title": "Dune"}),
        json!({"title": "Dune", "author": "Herbert", "edition": 0}),
    ] {
        let response = send(&app, Method::POST, "/api/v1/books", Some(body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    assert_eq!(count(&app).await, before);
}

#[tokio::test]
#[ignore]
async fn get_returns_what_was_added() {
    let (app, _repo, _guard) = database_app().await;
    let created = add(
        &app,
        json!({
            "title": "Dune",
            "author": "Herbert",
            "edition": 2,
            "genre_name": "Science Fiction",
            "published": "1965-08-01T02:00:00+02:00"
        }),
    )
    .await;
    let id = created["id"].as_i64().unwrap();

    let response = get(&app, &format!("/api/v1/books/{}", id)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let book = body_json(response).await;

    assert_eq!(book["title"], "Dune");
    assert_eq!(book["author"], "Herbert");
    assert_eq!(book["edition"], 2);
    assert_eq!(book["genre_name"], "Science Fiction");
    assert_eq!(book["published"], "1965-08-01T00:00:00Z");
}

#[tokio::test]
#[ignore]
async fn get_unknown_id_returns_404() {
    let (app, _repo, _guard) = database_app().await;
    let created = add(&app, json!({"title": "Dune", "author": "Herbert"})).await;
    let missing = created["id"].as_i64().unwrap() + 1;

    let response = get(&app, &format!("/api/v1/books/{}", missing)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
#[ignore]
async fn list_returns_every_book_in_insertion_order() {
    let (app, _repo, _guard) = database_app().await;
    let inputs = sample_books();
    for book in &inputs {
        add(&app, book.clone()).await;
    }

    let response = get(&app, "/api/v1/books").await;
    assert_eq!(response.status(), StatusCode::OK);
    let books = body_json(response).await.as_array().unwrap().clone();

    assert_eq!(books.len(), inputs.len());
    for (stored, input) in books.iter().zip(&inputs) {
        assert_eq!(stored["title"], input["title"]);
        assert_eq!(stored["author"], input["author"]);
        assert_eq!(stored["edition"], input["edition"]);
        assert_eq!(stored["genre_name"], input["genre_name"]);
    }
}

#[tokio::test]
#[ignore]
async fn replace_changes_only_the_sent_values() {
    let (app, _repo, _guard) = database_app().await;
    let original = add(&app, sample_books()[0].clone()).await;
    let id = original["id"].as_i64().unwrap();

    let mut replacement = original.clone();
    replacement["title"] = json!("Dune Messiah");
    replacement["author"] = json!("F. Herbert");

    let response = send(
        &app,
        Method::PUT,
        &format!("/api/v1/books/{}", id),
        Some(replacement),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["title"], "Dune Messiah");

    let stored = body_json(get(&app, &format!("/api/v1/books/{}", id)).await).await;
    assert_eq!(stored["id"], original["id"]);
    assert_eq!(stored["title"], "Dune Messiah");
    assert_eq!(stored["author"], "F. Herbert");
    assert_eq!(stored["edition"], original["edition"]);
    assert_eq!(stored["description"], original["description"]);
    assert_eq!(stored["genre_name"], original["genre_name"]);
    assert_eq!(stored["published"], original["published"]);
}

#[tokio::test]
#[ignore]
async fn replace_unknown_id_returns_404() {
    let (app, _repo, _guard) = database_app().await;
    let created = add(&app, json!({"title": "Dune", "author": "Herbert"})).await;
    let missing = created["id"].as_i64().unwrap() + 1;

    let response = send(
        &app,
        Method::PUT,
        &format!("/api/v1/books/{}", missing),
        Some(json!({"title": "Dune", "author": "Herbert"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn patch_changes_only_listed_fields() {
    let (app, _repo, _guard) = database_app().await;
    let original = add(&app, sample_books()[0].clone()).await;
    let id = original["id"].as_i64().unwrap();

    let response = send(
        &app,
        Method::PATCH,
        &format!("/api/v1/books/{}", id),
        Some(json!({"edition": 5, "description": null})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let patched = body_json(response).await;

    assert_eq!(patched["edition"], 5);
    assert_eq!(patched["description"], Value::Null);
    assert_eq!(patched["title"], original["title"]);
    assert_eq!(patched["author"], original["author"]);
    assert_eq!(patched["genre_name"], original["genre_name"]);
    assert_eq!(patched["published"], original["published"]);
}

#[tokio::test]
#[ignore]
async fn patch_unknown_id_returns_404() {
    let (app, _repo, _guard) = database_app().await;

    let response = send(
        &app,
        Method::PATCH,
        "/api/v1/books/999999",
        Some(json!({"title": "Nothing"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn rejected_patch_leaves_book_untouched() {
    let (app, _repo, _guard) = database_app().await;
    let original = add(&app, sample_books()[0].clone()).await;
    let id = original["id"].as_i64().unwrap();

    let response = send(
        &app,
        Method::PATCH,
        &format!("/api/v1/books/{}", id),
        Some(json!({"title": "Changed", "shelf": "B3"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let stored = body_json(get(&app, &format!("/api/v1/books/{}", id)).await).await;
    assert_eq!(stored["title"], original["title"]);
}

#[tokio::test]
#[ignore]
async fn delete_is_soft_and_not_repeatable() {
    let (app, repo, _guard) = database_app().await;
    let created = add(&app, json!({"title": "Dune", "author": "Herbert"})).await;
    let id = created["id"].as_i64().unwrap();
    let uri = format!("/api/v1/books/{}", id);

    let response = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"message": "Book deleted successfully"})
    );

    assert_eq!(get(&app, &uri).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        send(&app, Method::DELETE, &uri, None).await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        send(&app, Method::PATCH, &uri, Some(json!({"title": "Back"}))).await.status(),
        StatusCode::NOT_FOUND
    );

    // The row is still there, only marked
    let deleted_at: Option<chrono::DateTime<chrono::Utc>> =
        sqlx::query_scalar("SELECT deleted_at FROM books WHERE id = $1")
            .bind(id)
            .fetch_one(&repo.pool)
            .await
            .unwrap();
    assert!(deleted_at.is_some());
}

#[tokio::test]
#[ignore]
async fn delete_unknown_id_returns_404() {
    let (app, _repo, _guard) = database_app().await;

    let response = send(&app, Method::DELETE, "/api/v1/books/424242", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn search_filters_by_substring_case_insensitively() {
    let (app, _repo, _guard) = database_app().await;
    for book in sample_books() {
        add(&app, book).await;
    }

    let found = search(&app, "?author=herbert").await;
    assert_eq!(titles(&found), vec!["Dune", "Children of Dune"]);

    let found = search(&app, "?title=DUNE").await;
    assert_eq!(titles(&found), vec!["Dune", "Children of Dune"]);

    let found = search(&app, "?description=MATCH").await;
    assert_eq!(titles(&found), vec!["Emma"]);
}

#[tokio::test]
#[ignore]
async fn search_filters_combine_with_and() {
    let (app, _repo, _guard) = database_app().await;
    for book in sample_books() {
        add(&app, book).await;
    }

    let found = search(&app, "?author=herbert&genre=romance").await;
    assert!(found.is_empty());

    let found = search(&app, "?author=austen&genre=romance").await;
    assert_eq!(titles(&found), vec!["Emma"]);

    let found = search(&app, "?author=herbert&title=children").await;
    assert_eq!(titles(&found), vec!["Children of Dune"]);
}

#[tokio::test]
#[ignore]
async fn search_without_filters_returns_all_live_books() {
    let (app, _repo, _guard) = database_app().await;
    let mut ids = Vec::new();
    for book in sample_books() {
        ids.push(add(&app, book).await["id"].as_i64().unwrap());
    }
    send(&app, Method::DELETE, &format!("/api/v1/books/{}", ids[0]), None).await;

    let found = search(&app, "").await;
    assert_eq!(titles(&found), vec!["Children of Dune", "Emma"]);

    let found = search(&app, "?title=&author=").await;
    assert_eq!(found.len(), 2);
}

#[tokio::test]
#[ignore]
async fn search_date_range_is_inclusive() {
    let (app, _repo, _guard) = database_app().await;
    for book in sample_books() {
        add(&app, book).await;
    }

    let found = search(&app, "?from=1965-08-01&to=1976-04-01").await;
    assert_eq!(titles(&found), vec!["Dune", "Children of Dune"]);

    let found = search(&app, "?to=1900-01-01").await;
    assert_eq!(titles(&found), vec!["Emma"]);

    let found = search(&app, "?from=1966-01-01").await;
    assert_eq!(titles(&found), vec!["Children of Dune"]);
}

#[tokio::test]
#[ignore]
async fn search_treats_wildcards_literally() {
    let (app, _repo, _guard) = database_app().await;
    add(&app, json!({"title": "100% Pure", "author": "A"})).await;
    add(&app, json!({"title": "1000 Pages", "author": "B"})).await;

    let found = search(&app, "?title=100%25").await;
    assert_eq!(titles(&found), vec!["100% Pure"]);
}

#[tokio::test]
#[ignore]
async fn count_tracks_adds_and_deletes() {
    let (app, _repo, _guard) = database_app().await;
    assert_eq!(count(&app).await, 0);

    let created = add(&app, json!({"title": "Dune", "author": "Herbert"})).await;
    assert_eq!(count(&app).await, 1);
    add(&app, json!({"title": "Emma", "author": "Austen"})).await;
    assert_eq!(count(&app).await, 2);

    let uri = format!("/api/v1/books/{}", created["id"]);
    send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(count(&app).await, 1);

    // A failed delete leaves the count alone
    send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(count(&app).await, 1);
}

#[tokio::test]
#[ignore]
async fn book_lifecycle_end_to_end() {
    let (app, _repo, _guard) = database_app().await;

    let created = add(&app, json!({"title": "Dune", "author": "Herbert", "edition": 1})).await;
    let uri = format!("/api/v1/books/{}", created["id"]);

    let response = get(&app, &uri).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["title"], "Dune");

    let response = send(&app, Method::PATCH, &uri, Some(json!({"title": "Dune (Deluxe)"}))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let patched = body_json(response).await;
    assert_eq!(patched["title"], "Dune (Deluxe)");
    assert_eq!(patched["author"], "Herbert");

    let response = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(get(&app, &uri).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn teardown_then_migrate_recreates_schema() {
    let (app, repo, _guard) = database_app().await;
    add(&app, json!({"title": "Dune", "author": "Herbert"})).await;

    repo.teardown().await.unwrap();
    repo.migrate().await.unwrap();

    assert_eq!(count(&app).await, 0);
}
