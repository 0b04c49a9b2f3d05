//! Integration tests for the Image resource actions against a mocked
//! Cloudinary API.

mod common;

use common::{png_part, TestHarness, CLOUD};
use reqwest::multipart::Form;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

const CAT_URL: &str = "https://res.cloudinary.com/demo/image/upload/v1/images/cat.png";
const DOG_URL: &str = "https://res.cloudinary.com/demo/image/upload/v1/images/dog.png";

async fn post_form(h: &TestHarness, cookie: &str, path: &str, form: Form) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .post(h.url(path))
        .header(reqwest::header::COOKIE, cookie)
        .multipart(form)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap_or(Value::Null))
}

async fn get_json(h: &TestHarness, cookie: &str, path: &str) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .get(h.url(path))
        .header(reqwest::header::COOKIE, cookie)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap_or(Value::Null))
}

fn strings(value: &Value) -> Vec<String> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn new_with_uploads_records_aligned_arrays() {
    let h = TestHarness::start().await;
    h.mock_upload("cat", CAT_URL).await;
    h.mock_upload("dog", DOG_URL).await;
    let cookie = h.login().await;

    let form = Form::new()
        .text("title", "pets")
        .part("upload.0", png_part("cat.png"))
        .part("upload.1", png_part("dog.png"));
    let (status, body) = post_form(&h, &cookie, "/admin/api/resources/Image/actions/new", form).await;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["notice"]["type"], "success");

    let params = &body["record"]["params"];
    assert_eq!(params["title"], "pets");
    assert_eq!(strings(&params["imageUrls"]), vec![CAT_URL, DOG_URL]);
    let keys = strings(&params["imageKeys"]);
    assert_eq!(keys.len(), 2);
    assert!(keys[0].starts_with("images/") && keys[0].ends_with("-cat"));
    assert!(keys[1].starts_with("images/") && keys[1].ends_with("-dog"));

    // The public endpoint serves what was recorded.
    let id = body["record"]["id"].as_str().unwrap();
    let public: Value = reqwest::get(h.url(&format!("/admin/api/image-urls/{id}")))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(public, json!({ "imageUrls": [CAT_URL, DOG_URL] }));
}

#[tokio::test]
async fn new_without_files_creates_plain_record() {
    let h = TestHarness::start().await;
    let cookie = h.login().await;

    let form = Form::new()
        .text("title", "no files")
        .text("imageUrls.0", "https://evil.example/injected.png");
    let (status, body) = post_form(&h, &cookie, "/admin/api/resources/Image/actions/new", form).await;
    assert_eq!(status, 200);
    assert_eq!(body["record"]["params"]["imageUrls"], json!([]));
    assert_eq!(body["record"]["params"]["imageKeys"], json!([]));
}

#[tokio::test]
async fn rejected_mime_type_creates_nothing() {
    let h = TestHarness::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/v1_1/{CLOUD}/image/upload")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.cloudinary)
        .await;
    let cookie = h.login().await;

    let text = reqwest::multipart::Part::bytes(b"hello".to_vec())
        .file_name("notes.txt")
        .mime_str("text/plain")
        .unwrap();
    let form = Form::new().text("title", "bad").part("upload", text);
    let (status, body) = post_form(&h, &cookie, "/admin/api/resources/Image/actions/new", form).await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "validation_error");

    let total = iv_db::queries::images::count_images(&h.conn()).unwrap();
    assert_eq!(total, 0);
}

#[tokio::test]
async fn provider_failure_leaves_record_unchanged() {
    let h = TestHarness::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/v1_1/{CLOUD}/image/upload")))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": { "message": "Invalid image file" } })),
        )
        .mount(&h.cloudinary)
        .await;
    let cookie = h.login().await;
    let doc = h.create_image(json!({
        "title": "kept",
        "imageKeys": ["images/1-old"],
        "imageUrls": ["https://x/old.png"],
    }));

    let form = Form::new().part("upload", png_part("cat.png"));
    let (status, body) = post_form(
        &h,
        &cookie,
        &format!("/admin/api/resources/Image/records/{}/edit", doc.id),
        form,
    )
    .await;
    assert_eq!(status, 502);
    assert_eq!(body["code"], "provider_error");
    assert!(body["error"].as_str().unwrap().contains("Invalid image file"));

    let stored = h.image(&doc).unwrap();
    assert_eq!(stored.image_keys(), vec!["images/1-old"]);
    assert_eq!(stored.image_urls(), vec!["https://x/old.png"]);
}

#[tokio::test]
async fn edit_appends_after_existing_entries() {
    let h = TestHarness::start().await;
    h.mock_upload("dog", DOG_URL).await;
    let cookie = h.login().await;
    let doc = h.create_image(json!({
        "imageKeys": ["images/1-cat"],
        "imageUrls": [CAT_URL],
    }));

    let form = Form::new()
        .text("title", "renamed")
        .part("upload", png_part("dog.png"));
    let (status, body) = post_form(
        &h,
        &cookie,
        &format!("/admin/api/resources/Image/records/{}/edit", doc.id),
        form,
    )
    .await;
    assert_eq!(status, 200, "{body}");

    let stored = h.image(&doc).unwrap();
    assert_eq!(stored.params["title"], "renamed");
    assert_eq!(stored.image_urls(), vec![CAT_URL, DOG_URL]);
    let keys = stored.image_keys();
    assert_eq!(keys.len(), 2);
    assert_eq!(keys[0], "images/1-cat");
    assert!(keys[1].ends_with("-dog"));
}

#[tokio::test]
async fn edit_remove_key_drops_the_pair() {
    let h = TestHarness::start().await;
    h.mock_destroy(1).await;
    let cookie = h.login().await;
    let doc = h.create_image(json!({
        "imageKeys": ["images/1-cat", "images/2-dog"],
        "imageUrls": [CAT_URL, DOG_URL],
    }));

    let form = Form::new().text("removeKeys", "images/1-cat");
    let (status, body) = post_form(
        &h,
        &cookie,
        &format!("/admin/api/resources/Image/records/{}/edit", doc.id),
        form,
    )
    .await;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["record"]["params"]["imageKeys"], json!(["images/2-dog"]));
    assert_eq!(body["record"]["params"]["imageUrls"], json!([DOG_URL]));

    let stored = h.image(&doc).unwrap();
    assert_eq!(stored.image_keys(), vec!["images/2-dog"]);
    assert_eq!(stored.image_urls(), vec![DOG_URL]);
}

#[tokio::test]
async fn delete_purges_provider_objects() {
    let h = TestHarness::start().await;
    h.mock_destroy(2).await;
    let cookie = h.login().await;
    let doc = h.create_image(json!({
        "imageKeys": ["images/1-cat", "images/2-dog"],
        "imageUrls": [CAT_URL, DOG_URL],
    }));

    let (status, body) = post_form(
        &h,
        &cookie,
        &format!("/admin/api/resources/Image/records/{}/delete", doc.id),
        Form::new(),
    )
    .await;
    assert_eq!(status, 200, "{body}");
    assert!(h.image(&doc).is_none());

    let resp = reqwest::get(h.url(&format!("/admin/api/image-urls/{}", doc.id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn delete_keeps_record_when_provider_fails() {
    let h = TestHarness::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/v1_1/{CLOUD}/image/destroy")))
        .respond_with(ResponseTemplate::new(500))
        .mount(&h.cloudinary)
        .await;
    let cookie = h.login().await;
    let doc = h.create_image(json!({
        "imageKeys": ["images/1-cat"],
        "imageUrls": [CAT_URL],
    }));

    let (status, _) = post_form(
        &h,
        &cookie,
        &format!("/admin/api/resources/Image/records/{}/delete", doc.id),
        Form::new(),
    )
    .await;
    assert_eq!(status, 502);
    assert!(h.image(&doc).is_some());
}

#[tokio::test]
async fn list_normalizes_legacy_scalars() {
    let h = TestHarness::start().await;
    let cookie = h.login().await;
    h.create_image(json!({ "title": "legacy", "imageUrls": CAT_URL, "imageKeys": "images/1-cat" }));

    let (status, body) = get_json(&h, &cookie, "/admin/api/resources/Image/actions/list").await;
    assert_eq!(status, 200);
    assert_eq!(body["meta"]["total"], 1);
    let params = &body["records"][0]["params"];
    assert_eq!(params["imageUrls"], json!([CAT_URL]));
    assert_eq!(params["imageKeys"], json!(["images/1-cat"]));
}

#[tokio::test]
async fn list_paginates_newest_first() {
    let h = TestHarness::start().await;
    let cookie = h.login().await;
    for i in 0..3 {
        h.create_image(json!({ "title": format!("n{i}") }));
    }

    let (status, body) = get_json(
        &h,
        &cookie,
        "/admin/api/resources/Image/actions/list?page=1&perPage=2",
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["meta"], json!({ "total": 3, "page": 1, "perPage": 2 }));
    assert_eq!(body["records"].as_array().unwrap().len(), 2);
    assert_eq!(body["records"][0]["params"]["title"], "n2");

    let (_, body) = get_json(
        &h,
        &cookie,
        "/admin/api/resources/Image/actions/list?page=2&perPage=2",
    )
    .await;
    assert_eq!(body["records"].as_array().unwrap().len(), 1);
    assert_eq!(body["records"][0]["params"]["title"], "n0");
}

#[tokio::test]
async fn show_under_both_resource_names() {
    let h = TestHarness::start().await;
    let cookie = h.login().await;
    let doc = h.create_image(json!({ "imageUrls": CAT_URL }));

    for path in [
        format!("/admin/api/resources/Image/records/{}", doc.id),
        format!("/admin/api/resources/image/records/{}", doc.id),
        format!("/admin/api/resources/Image/records/{}/show", doc.id),
    ] {
        let (status, body) = get_json(&h, &cookie, &path).await;
        assert_eq!(status, 200, "{path}");
        assert_eq!(body["record"]["id"], doc.id.to_string());
        assert_eq!(body["record"]["params"]["imageUrls"], json!([CAT_URL]));
    }
}

#[tokio::test]
async fn show_unknown_record_is_not_found() {
    let h = TestHarness::start().await;
    let cookie = h.login().await;

    let (status, body) = get_json(
        &h,
        &cookie,
        &format!("/admin/api/resources/Image/records/{}", iv_core::RecordId::new()),
    )
    .await;
    assert_eq!(status, 404);
    assert_eq!(body["code"], "not_found");
}
