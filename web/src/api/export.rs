//! Guest-list CSV export.
//!
//! Presentation only: the delimited rendering here is outside the check-in
//! correctness model, so it stays dumb — every field quoted, embedded quotes
//! doubled, one row per guest in listing order.

use super::AdminAccess;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use soiree_checkin::model::Guest;
use soiree_core::environment::Clock as _;

const HEADER_ROW: [&str; 7] = [
    "Name",
    "Email",
    "Phone",
    "Attending",
    "Has Responded",
    "Credential",
    "Created At",
];

fn field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn row(guest: &Guest) -> String {
    [
        field(&guest.name),
        field(guest.email.as_deref().unwrap_or_default()),
        field(guest.phone.as_deref().unwrap_or_default()),
        field(if guest.is_attending == Some(true) {
            "Yes"
        } else {
            "No"
        }),
        field(if guest.has_responded { "Yes" } else { "No" }),
        field(guest.credential.as_str()),
        field(&guest.created_at.to_rfc3339()),
    ]
    .join(",")
}

/// Render the guest list as CSV text.
#[must_use]
pub fn render(guests: &[Guest]) -> String {
    let mut lines = Vec::with_capacity(guests.len() + 1);
    lines.push(
        HEADER_ROW
            .iter()
            .map(|h| field(h))
            .collect::<Vec<_>>()
            .join(","),
    );
    lines.extend(guests.iter().map(row));
    lines.join("\n")
}

/// `GET /api/guests/export` — download the guest list as CSV.
pub async fn download(
    _admin: AdminAccess,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let guests = state.registry.list().await?;
    let csv = render(&guests);
    let filename = format!("guests-{}.csv", state.clock.now().format("%Y-%m-%d"));

    Ok((
        [
            (
                header::CONTENT_TYPE.as_str(),
                "text/csv; charset=utf-8".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION.as_str(),
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    ))
}
