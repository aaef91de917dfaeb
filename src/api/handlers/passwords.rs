use crate::{domain::CredentialView, store::CredentialPaginator};
use axum::{
    Json,
    extract::{Extension, Path, Query},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based page number, defaults to 1.
    page: Option<i64>,
    /// Records per page (1..=100), defaults to 10.
    limit: Option<i64>,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct Meta {
    count: i64,
    page: i64,
    limit: i64,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct Page {
    meta: Meta,
    records: Vec<CredentialView>,
}

#[utoipa::path(
    get,
    path= "/api/v1/passwords/{login}",
    params(("login" = Uuid, Path, description = "Login the passwords belong to"), PageQuery),
    responses (
        (status = 200, description = "One page of passwords", body = Page, content_type = "application/json"),
        (status = 400, description = "Invalid login, page or limit"),
    ),
    tag= "passwords"
)]
// axum handler for listing the passwords of a login
#[instrument(skip(paginator))]
pub async fn page(
    paginator: Extension<Arc<dyn CredentialPaginator>>,
    Path(login): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Response {
    let page = query.page.unwrap_or(DEFAULT_PAGE);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);

    if page < 1 {
        return (StatusCode::BAD_REQUEST, "Invalid page".to_string()).into_response();
    }

    if !(1..=MAX_LIMIT).contains(&limit) {
        return (StatusCode::BAD_REQUEST, "Invalid limit".to_string()).into_response();
    }

    let Some(offset) = (page - 1).checked_mul(limit) else {
        return (StatusCode::BAD_REQUEST, "Invalid page".to_string()).into_response();
    };

    let result = tokio::try_join!(
        paginator.count_by_subject(login),
        paginator.page(login, offset, limit)
    );

    let (count, records) = match result {
        Ok(found) => found,
        Err(e) => {
            error!("Error listing passwords: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error listing passwords".to_string(),
            )
                .into_response();
        }
    };

    let mut headers = HeaderMap::new();
    for (name, value) in [
        ("x-pagination-count", count),
        ("x-pagination-page", page),
        ("x-pagination-limit", limit),
    ] {
        headers.insert(HeaderName::from_static(name), HeaderValue::from(value));
    }

    let body = Page {
        meta: Meta {
            count,
            page,
            limit,
        },
        records: records.iter().map(CredentialView::from).collect(),
    };

    (StatusCode::OK, headers, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use crate::api::handlers::test_support::{TestApp, body_json};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use tower::ServiceExt;
    use uuid::Uuid;

    async fn get(app: &TestApp, uri: &str) -> Response {
        app.router
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn seed(app: &TestApp, login: Uuid, count: usize) {
        for i in 0..count {
            app.service
                .add(login, &format!("secret-{i}"), false, None)
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn pages_through_a_login() {
        let app = TestApp::new();
        let login = Uuid::new_v4();
        seed(&app, login, 3).await;
        seed(&app, Uuid::new_v4(), 2).await;

        let response = get(&app, &format!("/api/v1/passwords/{login}?page=2&limit=2")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-pagination-count"], "3");
        assert_eq!(response.headers()["x-pagination-page"], "2");
        assert_eq!(response.headers()["x-pagination-limit"], "2");

        let json = body_json(response).await;
        assert_eq!(json["meta"]["count"], 3);
        let records = json["records"].as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["login"], login.to_string());
        assert!(records[0].get("verifier").is_none());
    }

    #[tokio::test]
    async fn defaults_to_first_page_of_ten() {
        let app = TestApp::new();
        let login = Uuid::new_v4();
        seed(&app, login, 12).await;

        let json = body_json(get(&app, &format!("/api/v1/passwords/{login}")).await).await;
        assert_eq!(json["meta"]["page"], 1);
        assert_eq!(json["meta"]["limit"], 10);
        assert_eq!(json["meta"]["count"], 12);
        assert_eq!(json["records"].as_array().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn unknown_login_is_an_empty_page() {
        let app = TestApp::new();

        let response = get(&app, &format!("/api/v1/passwords/{}", Uuid::new_v4())).await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["meta"]["count"], 0);
        assert!(json["records"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_out_of_range_parameters() {
        let app = TestApp::new();
        let login = Uuid::new_v4();

        for query in ["page=0", "limit=0", "limit=101", "page=-1", "page=x"] {
            let response = get(&app, &format!("/api/v1/passwords/{login}?{query}")).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{query}");
        }

        let response = get(&app, "/api/v1/passwords/not-a-uuid").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn store_failure_is_internal_error() {
        let app = TestApp::new();
        app.store.fail_reads(true);

        let response = get(&app, &format!("/api/v1/passwords/{}", Uuid::new_v4())).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
