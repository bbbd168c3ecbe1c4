use axum::http::StatusCode;

impl From<&super::Error> for StatusCode {
    fn from(e: &super::Error) -> Self {
        match e {
            super::Error::UnknownFilter(_) => Self::BAD_REQUEST,
            super::Error::_User(e) => e.into(),
            super::Error::_Connection(e) => e.into(),
            super::Error::_Post(_) => Self::INTERNAL_SERVER_ERROR,
        }
    }
}

pub(super) mod api {
    use axum::{Extension, Json, extract::Query};
    use serde::Deserialize;

    use crate::feed::{Filter, model::Page};
    use crate::session;

    #[derive(Deserialize)]
    pub struct ResetParams {
        filter: Option<String>,
    }

    pub async fn reset(
        Extension(session): Extension<session::Handle>,
        Query(params): Query<ResetParams>,
    ) -> crate::Result<Json<Page>> {
        let feed = session.feed();
        match params.filter {
            Some(filter) => feed.set_filter(filter.parse::<Filter>()?).await?,
            None => feed.refresh().await?,
        }
        Ok(Json(feed.page().await))
    }

    pub async fn load_more(
        Extension(session): Extension<session::Handle>,
    ) -> crate::Result<Json<Page>> {
        let feed = session.feed();
        feed.load_more().await?;
        Ok(Json(feed.page().await))
    }
}
