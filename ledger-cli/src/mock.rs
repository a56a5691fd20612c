//! Canned in-process backend for `--mock` runs.
//!
//! Answers the routes the client uses with fixed data, so every command
//! can be exercised without a server. State does not persist between
//! invocations - only the local queue and cache in the data dir do.

use ledger_client::{HttpResponse, Method, MockTransport};
use serde_json::json;

/// Base URL used when running against the mock backend.
pub const BASE_URL: &str = "http://mock.local/api";

/// Build the canned transport.
pub fn transport() -> MockTransport {
    let mock = MockTransport::new();
    mock.set_handler(|req, _| {
        let path = req.url.strip_prefix(BASE_URL).unwrap_or(req.url.as_str());
        let response = match (req.method, path) {
            (Method::Post, "/users/login") | (Method::Post, "/users/register") => {
                HttpResponse::json_body(
                    200,
                    &json!({
                        "userId": "demo-user",
                        "accessToken": "demo-access-token",
                        "refreshToken": "demo-refresh-token",
                        "accessTokenExpiresAt": u64::MAX,
                    }),
                )
            }
            (Method::Post, "/users/refresh-token") => HttpResponse::json_body(
                200,
                &json!({"accessToken": "demo-access-token-2", "accessTokenExpiresAt": u64::MAX}),
            ),
            (Method::Post, "/users/logout") => HttpResponse::json_body(200, &json!({})),
            (Method::Get, "/transactions") => HttpResponse::json_body(
                200,
                &json!([
                    {
                        "id": "tx-1",
                        "kind": "expense",
                        "amountMinor": 1250,
                        "categoryId": "cat-1",
                        "note": "coffee",
                        "occurredAt": 1_700_000_000_000u64,
                        "createdAt": 1_700_000_000_000u64,
                    },
                    {
                        "id": "tx-2",
                        "kind": "income",
                        "amountMinor": 250_000,
                        "note": "salary",
                        "occurredAt": 1_700_100_000_000u64,
                        "createdAt": 1_700_100_000_000u64,
                    },
                ]),
            ),
            (Method::Get, "/categories") => HttpResponse::json_body(
                200,
                &json!([{"id": "cat-1", "name": "Groceries", "kind": "expense"}]),
            ),
            (Method::Get, "/alerts") | (Method::Get, "/reminders") => {
                HttpResponse::json_body(200, &json!([]))
            }
            (Method::Post, "/transactions") => {
                let mut body = req.body.clone().unwrap_or_else(|| json!({}));
                if let Some(obj) = body.as_object_mut() {
                    obj.insert("id".into(), json!("tx-new"));
                    obj.entry("createdAt").or_insert(json!(1_700_200_000_000u64));
                }
                HttpResponse::json_body(201, &body)
            }
            _ => HttpResponse::json_body(404, &json!({"message": "no such route"})),
        };
        Ok(response)
    });
    mock
}
