use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use noteforge_core::{CoreError, Forge, GenerationError, SetProgress, Settings};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::api::dto::{
    CardOut, GenerateIn, GeneratedOut, MasteredOut, NoteOut, ReforgeIn, SetOut, SetWithCards,
};

pub struct AppState {
    pub forge: Arc<Forge>,
    pub settings: Settings,
}

/// Error body is always `{"error": "..."}`.
pub enum ApiError {
    Core(CoreError),
    Generation(GenerationError),
    /// Body was present but did not decode.
    BadBody(String),
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        ApiError::Core(e)
    }
}

impl From<GenerationError> for ApiError {
    fn from(e: GenerationError) -> Self {
        ApiError::Generation(e)
    }
}

fn core_status(e: &CoreError) -> StatusCode {
    match e {
        CoreError::NotFound(_) => StatusCode::NOT_FOUND,
        CoreError::Invalid(_) => StatusCode::BAD_REQUEST,
        CoreError::Conflict(_) => StatusCode::CONFLICT,
        CoreError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Core(e) => (core_status(&e), e.to_string()),
            ApiError::BadBody(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Generation(GenerationError::Storage(e)) => (core_status(&e), e.to_string()),
            ApiError::Generation(e) => {
                let status = match e {
                    GenerationError::Validation(_) => StatusCode::BAD_REQUEST,
                    GenerationError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
                    _ => StatusCode::BAD_GATEWAY,
                };
                (status, e.user_message())
            }
        };
        if status.is_server_error() {
            warn!(status = status.as_u16(), error = %message, "request failed");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// An empty body means "use the saved settings"; anything else must decode
/// fully, so a bad count or action is refused rather than defaulted.
fn decode_body<T: DeserializeOwned + Default>(body: &Bytes) -> ApiResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::BadBody(format!("Invalid request body: {e}")))
}

pub async fn list_notes(State(st): State<Arc<AppState>>) -> ApiResult<Json<Vec<NoteOut>>> {
    let notes = st.forge.repo().list_notes(st.settings.owner_id).await?;
    Ok(Json(notes.into_iter().map(NoteOut::from).collect()))
}

pub async fn list_sets(State(st): State<Arc<AppState>>) -> ApiResult<Json<Vec<SetOut>>> {
    let sets = st.forge.repo().list_sets(st.settings.owner_id).await?;
    Ok(Json(sets.into_iter().map(SetOut::from).collect()))
}

pub async fn set_cards(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<CardOut>>> {
    let set = st.forge.owned_set(st.settings.owner_id, id).await?;
    let cards = st.forge.repo().list_flashcards(set.id).await?;
    Ok(Json(cards.into_iter().map(CardOut::from).collect()))
}

pub async fn set_progress(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SetProgress>> {
    let set = st.forge.owned_set(st.settings.owner_id, id).await?;
    Ok(Json(st.forge.set_progress(set.id).await?))
}

pub async fn generate(
    State(st): State<Arc<AppState>>,
    Path(note_id): Path<Uuid>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<GeneratedOut>)> {
    let body: GenerateIn = decode_body(&body)?;
    let owner = st.settings.owner_id;

    let mut gs = st.settings.generation.clone();
    if let Some(c) = body.count {
        gs.min_count = c;
    }
    if let Some(d) = body.difficulty {
        gs.difficulty = d;
    }
    if let Some(i) = body.instructions {
        gs.custom_prompt = i;
    }

    if body.preview {
        let result = st.forge.preview_for_note(owner, note_id, &gs).await?;
        return Ok((StatusCode::OK, Json(GeneratedOut::new(None, result))));
    }
    let forged = st.forge.generate_for_note(owner, note_id, &gs).await?;
    Ok((StatusCode::CREATED, Json(GeneratedOut::new(Some(forged.set), forged.result))))
}

pub async fn reforge(
    State(st): State<Arc<AppState>>,
    Path(set_id): Path<Uuid>,
    body: Bytes,
) -> ApiResult<Json<GeneratedOut>> {
    let body: ReforgeIn = decode_body(&body)?;
    let owner = st.settings.owner_id;

    let mut rs = st.settings.reforge.clone();
    if let Some(a) = body.action {
        rs.action = a;
    }
    if let Some(c) = body.count {
        rs.min_count = c;
    }
    if let Some(d) = body.difficulty {
        rs.difficulty = d;
    }
    if body.selected_section.is_some() {
        rs.use_selected_section = true;
    }
    let section = body.selected_section.as_deref();

    if body.preview {
        let set = st.forge.owned_set(owner, set_id).await?;
        let note_id = set
            .note_id
            .ok_or_else(|| GenerationError::validation("This set has no source note to reforge from"))?;
        let note = st.forge.owned_note(owner, note_id).await?;
        let result = st
            .forge
            .preview_reforge(owner, set_id, &note.content, section, &rs)
            .await?;
        return Ok(Json(GeneratedOut::new(None, result)));
    }
    let forged = st.forge.reforge(owner, set_id, section, &rs).await?;
    Ok(Json(GeneratedOut::new(Some(forged.set), forged.result)))
}

pub async fn mark_mastered(
    State(st): State<Arc<AppState>>,
    Path(card_id): Path<Uuid>,
) -> ApiResult<Json<MasteredOut>> {
    let card = st.forge.repo().get_flashcard(card_id).await?;
    st.forge.owned_set(st.settings.owner_id, card.set_id).await?;
    let (card, progress) = st.forge.mark_mastered(card.id).await?;
    Ok(Json(MasteredOut { card: card.into(), progress }))
}

pub async fn public_set(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SetWithCards>> {
    let (set, cards) = st.forge.public_set(id).await?;
    Ok(Json(SetWithCards {
        set: set.into(),
        cards: cards.into_iter().map(CardOut::from).collect(),
    }))
}
