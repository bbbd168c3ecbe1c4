use axum::http::StatusCode;

impl From<&super::Error> for StatusCode {
    fn from(e: &super::Error) -> Self {
        match e {
            super::Error::_User(e) => e.into(),
            super::Error::_Connection(e) => e.into(),
        }
    }
}

pub(super) mod api {
    use axum::{
        Extension, Json,
        extract::{Query, State},
    };
    use serde::Deserialize;

    use crate::suggestion::{self, View, scorer::Suggestion};
    use crate::user;

    #[derive(Deserialize)]
    pub struct FindAllParams {
        limit: Option<usize>,
        #[serde(default)]
        view: View,
    }

    pub async fn find_all(
        Extension(viewer): Extension<user::Id>,
        suggestion_service: State<suggestion::Service>,
        Query(params): Query<FindAllParams>,
    ) -> crate::Result<Json<Vec<Suggestion>>> {
        let suggestions = suggestion_service
            .suggest(&viewer, params.view, params.limit)
            .await?;
        Ok(Json(suggestions))
    }
}
