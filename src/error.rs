use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::{debug, error};
use serde::Serialize;

use crate::{connection, conversation, feed, message, session, suggestion, user};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    _User(#[from] user::Error),
    #[error(transparent)]
    _Connection(#[from] connection::Error),
    #[error(transparent)]
    _Conversation(#[from] conversation::Error),
    #[error(transparent)]
    _Message(#[from] message::Error),
    #[error(transparent)]
    _Feed(#[from] feed::Error),
    #[error(transparent)]
    _Suggestion(#[from] suggestion::Error),
    #[error(transparent)]
    _Session(#[from] session::Error),
}

impl From<&Error> for StatusCode {
    fn from(e: &Error) -> Self {
        match e {
            Error::_User(e) => e.into(),
            Error::_Connection(e) => e.into(),
            Error::_Conversation(e) => e.into(),
            Error::_Message(e) => e.into(),
            Error::_Feed(e) => e.into(),
            Error::_Suggestion(e) => e.into(),
            Error::_Session(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            message: String,
        }

        let status = StatusCode::from(&self);
        let message = if status.is_server_error() {
            error!("{self:?}");
            "Something went wrong".to_owned()
        } else {
            debug!("{status}: {self}");
            self.to_string()
        };

        (status, Json(ErrorResponse { message })).into_response()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn should_map_domain_errors_to_status() {
        let cases = [
            (
                Error::from(message::Error::Empty),
                StatusCode::BAD_REQUEST,
            ),
            (
                Error::from(conversation::Error::ThreadNotFound(
                    conversation::ThreadId::random(),
                )),
                StatusCode::NOT_FOUND,
            ),
            (
                Error::from(connection::Error::AlreadyExists(
                    user::Id::random(),
                    user::Id::random(),
                )),
                StatusCode::CONFLICT,
            ),
            (
                Error::from(message::Error::_Conversation(
                    conversation::Error::MissingName,
                )),
                StatusCode::BAD_REQUEST,
            ),
            (
                Error::from(session::Error::MissingIdentity),
                StatusCode::UNAUTHORIZED,
            ),
            (
                Error::from(feed::Error::_User(user::Error::_Diesel(
                    diesel::result::Error::RollbackTransaction,
                ))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(StatusCode::from(&error), expected, "{error}");
        }
    }
}
