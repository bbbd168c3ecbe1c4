use axum::http::StatusCode;

impl From<&super::Error> for StatusCode {
    fn from(e: &super::Error) -> Self {
        match e {
            super::Error::InvalidKey(_)
            | super::Error::MissingName
            | super::Error::SelfConversation => Self::BAD_REQUEST,
            super::Error::ThreadNotFound(_) => Self::NOT_FOUND,
            super::Error::NoViewer => Self::UNAUTHORIZED,
            super::Error::_User(e) => e.into(),
            super::Error::_Message(e) => e.as_ref().into(),
            super::Error::_R2d2(_) | super::Error::_Diesel(_) | super::Error::_Join(_) => {
                Self::INTERNAL_SERVER_ERROR
            }
        }
    }
}

pub(super) mod api {
    use axum::{
        Extension, Json,
        extract::{Path, Query},
        http::StatusCode,
    };
    use serde::Deserialize;

    use crate::conversation::{Key, ThreadId, model::Conversation};
    use crate::session;
    use crate::user;

    #[derive(Deserialize)]
    pub struct FindAllParams {
        q: Option<String>,
    }

    pub async fn find_all(
        Extension(session): Extension<session::Handle>,
        Query(params): Query<FindAllParams>,
    ) -> Json<Vec<Conversation>> {
        let store = session.conversations();
        store.search(params.q.as_deref().unwrap_or_default()).await;
        Json(store.filtered_conversations().await)
    }

    pub async fn refetch(
        Extension(session): Extension<session::Handle>,
    ) -> crate::Result<Json<Vec<Conversation>>> {
        let store = session.conversations();
        store.refetch().await?;
        Ok(Json(store.filtered_conversations().await))
    }

    pub async fn start_direct(
        Extension(session): Extension<session::Handle>,
        Path(user_id): Path<user::Id>,
    ) -> crate::Result<Json<Conversation>> {
        let conversation = session.conversations().start_direct(&user_id).await?;
        Ok(Json(conversation))
    }

    pub async fn mark_as_read(
        Extension(session): Extension<session::Handle>,
        Path(key): Path<Key>,
    ) -> crate::Result<StatusCode> {
        session.mark_as_read(&key).await?;
        Ok(StatusCode::NO_CONTENT)
    }

    #[derive(Deserialize)]
    pub struct RenameParams {
        name: String,
    }

    pub async fn rename(
        Extension(session): Extension<session::Handle>,
        Path(id): Path<ThreadId>,
        Json(params): Json<RenameParams>,
    ) -> crate::Result<StatusCode> {
        session
            .conversations()
            .rename_group_chat(&id, &params.name)
            .await?;
        Ok(StatusCode::NO_CONTENT)
    }
}
