use std::convert::Infallible;
use std::path::PathBuf;

use percent_encoding::percent_decode_str;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::conversations;
use crate::error::{ApiError, StoreError};
use crate::models::NewMessage;
use crate::server::Server;

const MAX_BODY_BYTES: u64 = 16 * 1024;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub user_id: String,
}

/// WebSocket relay, message history API and static files.
pub fn routes(
    server: Server,
    static_dir: PathBuf,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "POST", "PATCH"])
        .allow_header("content-type");

    ws(server.clone())
        .or(api(server))
        .or(warp::fs::dir(static_dir))
        .with(cors)
        .recover(handle_rejection)
}

pub fn ws(server: Server) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path("ws")
        .and(warp::path::end())
        .and(warp::ws())
        .and(with_server(server))
        .map(|ws: warp::ws::Ws, server: Server| {
            ws.on_upgrade(move |socket| async move {
                server.handle_connection(socket).await;
            })
        })
}

pub fn api(server: Server) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let list = warp::path!("api" / "messages")
        .and(warp::get())
        .and(warp::query::<UserQuery>())
        .and(with_server(server.clone()))
        .and_then(list_messages);

    let create = warp::path!("api" / "messages")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(with_server(server.clone()))
        .and_then(create_message);

    let conversation = warp::path!("api" / "messages" / String)
        .and(warp::get())
        .and(warp::query::<UserQuery>())
        .and(with_server(server.clone()))
        .and_then(get_conversation);

    let mark_read = warp::path!("api" / "messages" / Uuid / "read")
        .and(warp::patch())
        .and(with_server(server.clone()))
        .and_then(mark_read);

    let summaries = warp::path!("api" / "conversations")
        .and(warp::get())
        .and(warp::query::<UserQuery>())
        .and(with_server(server))
        .and_then(list_conversations);

    list.or(create)
        .or(conversation)
        .or(mark_read)
        .or(summaries)
}

fn with_server(server: Server) -> impl Filter<Extract = (Server,), Error = Infallible> + Clone {
    warp::any().map(move || server.clone())
}

fn store_failure(action: &'static str, source: StoreError) -> Rejection {
    warp::reject::custom(ApiError::Store { action, source })
}

async fn list_messages(query: UserQuery, server: Server) -> Result<impl Reply, Rejection> {
    let messages = server
        .store()
        .messages_for_user(&query.user_id)
        .await
        .map_err(|e| store_failure("get messages", e))?;
    Ok(warp::reply::json(&messages))
}

async fn create_message(message: NewMessage, server: Server) -> Result<impl Reply, Rejection> {
    match server.store().create_message(message).await {
        Ok(created) => Ok(warp::reply::with_status(
            warp::reply::json(&created),
            StatusCode::CREATED,
        )),
        Err(StoreError::Invalid(reason)) => {
            log::debug!("Rejected message: {}", reason);
            Err(warp::reject::custom(ApiError::InvalidMessage))
        }
        Err(e) => Err(store_failure("create message", e)),
    }
}

async fn get_conversation(
    other_id: String,
    query: UserQuery,
    server: Server,
) -> Result<impl Reply, Rejection> {
    // Path segments arrive still percent-encoded, unlike query values.
    let other_id = percent_decode_str(&other_id)
        .decode_utf8()
        .map_err(|_| warp::reject::custom(ApiError::InvalidUserId))?;
    let messages = server
        .store()
        .conversation(&query.user_id, &other_id)
        .await
        .map_err(|e| store_failure("get messages", e))?;
    Ok(warp::reply::json(&messages))
}

async fn mark_read(id: Uuid, server: Server) -> Result<impl Reply, Rejection> {
    let found = server
        .store()
        .mark_read(id)
        .await
        .map_err(|e| store_failure("mark message as read", e))?;
    if found {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(warp::reject::custom(ApiError::NotFound))
    }
}

async fn list_conversations(query: UserQuery, server: Server) -> Result<impl Reply, Rejection> {
    let messages = server
        .store()
        .messages_for_user(&query.user_id)
        .await
        .map_err(|e| store_failure("get conversations", e))?;
    Ok(warp::reply::json(&conversations::summarize(
        &query.user_id,
        &messages,
    )))
}

pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if let Some(e) = err.find::<ApiError>() {
        let status = match e {
            ApiError::InvalidMessage | ApiError::InvalidUserId => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Store { source, .. } => {
                log::error!("{}: {}", e, source);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, e.to_string())
    } else if err
        .find::<warp::filters::body::BodyDeserializeError>()
        .is_some()
        || err.find::<warp::reject::UnsupportedMediaType>().is_some()
        || err.find::<warp::reject::LengthRequired>().is_some()
    {
        (
            StatusCode::BAD_REQUEST,
            ApiError::InvalidMessage.to_string(),
        )
    } else if err.find::<warp::reject::InvalidQuery>().is_some() {
        (
            StatusCode::BAD_REQUEST,
            "userId query parameter is required".to_string(),
        )
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Payload too large".to_string())
    } else if err.find::<warp::reject::MissingHeader>().is_some()
        || err.find::<warp::reject::InvalidHeader>().is_some()
    {
        (StatusCode::BAD_REQUEST, "Missing or invalid header".to_string())
    } else if err.find::<warp::filters::cors::CorsForbidden>().is_some() {
        (StatusCode::FORBIDDEN, "CORS request forbidden".to_string())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "Method not allowed".to_string(),
        )
    } else {
        log::error!("Unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        )
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&json!({ "error": message })),
        status,
    ))
}
