//! Handlers behind the HTML page

use axum::{
    extract::{Form, Multipart, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::error::diagnostic;
use crate::server::cookie::SessionId;
use crate::server::page::{self, PageView};
use crate::server::state::{AppState, Notice};

use super::{read_uploads, save_uploads};

/// GET / - the page
pub async fn index_page(State(state): State<AppState>, session: SessionId) -> Response {
    let (history, notices) = state.take_view(session.id);

    let folder = state.folder().clone();
    let documents = tokio::task::spawn_blocking(move || folder.list())
        .await
        .ok()
        .and_then(|listed| listed.ok())
        .unwrap_or_default();

    let html = page::render(&PageView {
        docs_dir: state.folder().path(),
        db_path: state.db_path(),
        index_exists: state.index_exists(),
        documents: &documents,
        notices: &notices,
        history: &history,
    });

    session.attach(Html(html).into_response())
}

fn back_home(session: SessionId) -> Response {
    session.attach(Redirect::to("/").into_response())
}

/// POST /upload - save selected PDFs into the documents folder
pub async fn upload(
    State(state): State<AppState>,
    session: SessionId,
    multipart: Multipart,
) -> Response {
    let uploads = match read_uploads(multipart).await {
        Ok(uploads) => uploads,
        Err(err) => {
            state.notify(session.id, Notice::error("Upload failed.", diagnostic(err)));
            return back_home(session);
        }
    };

    if uploads.is_empty() {
        state.notify(session.id, Notice::warning("Please select at least one PDF."));
        return back_home(session);
    }

    match save_uploads(&state, uploads).await {
        Ok((saved, rejected)) => {
            if !saved.is_empty() {
                state.notify(
                    session.id,
                    Notice::success(format!(
                        "Saved {} PDF(s) to {}",
                        saved.len(),
                        state.folder().path().display()
                    )),
                );
            }
            for err in rejected {
                state.notify(session.id, Notice::warning(err.to_string()));
            }
        }
        Err(err) => state.notify(session.id, Notice::error("Upload failed.", diagnostic(err))),
    }

    back_home(session)
}

/// POST /build - build or rebuild the index
pub async fn build(State(state): State<AppState>, session: SessionId) -> Response {
    let notice = match state.build_index().await {
        Ok(path) => Notice::success(format!("Index built → {}", path.display())),
        Err(err) => {
            tracing::warn!("Index build failed: {}", err);
            Notice::error("Index build failed.", diagnostic(err))
        }
    };
    state.notify(session.id, notice);
    back_home(session)
}

#[derive(Debug, Deserialize)]
pub struct AskForm {
    #[serde(default)]
    pub question: String,
}

/// POST /ask - answer a question into the session history
pub async fn ask(
    State(state): State<AppState>,
    session: SessionId,
    Form(form): Form<AskForm>,
) -> Response {
    state.ask_in_session(session.id, &form.question).await;
    back_home(session)
}

/// POST /clear - forget the session history
pub async fn clear_history(State(state): State<AppState>, session: SessionId) -> Response {
    state.with_session(session.id, |s| s.history.clear());
    back_home(session)
}
