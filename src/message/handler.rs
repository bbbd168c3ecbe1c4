use axum::http::StatusCode;

impl From<&super::Error> for StatusCode {
    fn from(e: &super::Error) -> Self {
        match e {
            super::Error::NotFound(_) => Self::NOT_FOUND,
            super::Error::Empty | super::Error::TooLong(_) => Self::BAD_REQUEST,
            super::Error::NoActiveConversation => Self::CONFLICT,
            super::Error::_Conversation(e) => e.into(),
            super::Error::_R2d2(_) | super::Error::_Diesel(_) | super::Error::_Join(_) => {
                Self::INTERNAL_SERVER_ERROR
            }
        }
    }
}

pub(super) mod api {
    use axum::{
        Extension, Json,
        extract::Path,
        http::StatusCode,
        response::IntoResponse,
    };
    use chrono::NaiveDate;
    use serde::Deserialize;

    use crate::conversation::Key;
    use crate::message::{
        self,
        model::{Draft, TimelineItem},
    };
    use crate::session;

    pub async fn open(
        Extension(session): Extension<session::Handle>,
        Path(key): Path<Key>,
    ) -> crate::Result<Json<Vec<TimelineItem>>> {
        let timeline = session.open(key).await?;
        Ok(Json(timeline))
    }

    pub async fn send(
        Extension(session): Extension<session::Handle>,
        Path(key): Path<Key>,
        Json(draft): Json<Draft>,
    ) -> impl IntoResponse {
        let outcome = session.send(key, draft).await;
        let status = if outcome.success {
            StatusCode::CREATED
        } else {
            StatusCode::UNPROCESSABLE_ENTITY
        };
        (status, Json(outcome))
    }

    #[derive(Deserialize)]
    pub struct HideParams {
        before: NaiveDate,
    }

    pub async fn hide_before(
        Extension(session): Extension<session::Handle>,
        Path(key): Path<Key>,
        Json(params): Json<HideParams>,
    ) -> crate::Result<Json<Vec<TimelineItem>>> {
        session.hide_before(key, params.before).await?;
        Ok(Json(session.messages().timeline().await))
    }

    pub async fn delete(
        Extension(session): Extension<session::Handle>,
        Path(id): Path<message::Id>,
    ) -> crate::Result<StatusCode> {
        session.delete_message(&id).await?;
        Ok(StatusCode::NO_CONTENT)
    }
}
