use axum::http::StatusCode;

impl From<&super::Error> for StatusCode {
    fn from(e: &super::Error) -> Self {
        match e {
            super::Error::NotFound(_) => Self::NOT_FOUND,
            super::Error::AlreadyExists(..) => Self::CONFLICT,
            super::Error::NotAddressee => Self::FORBIDDEN,
            super::Error::SelfReference => Self::BAD_REQUEST,
            super::Error::UnknownStatus(_)
            | super::Error::_R2d2(_)
            | super::Error::_Diesel(_)
            | super::Error::_Join(_) => Self::INTERNAL_SERVER_ERROR,
        }
    }
}

pub(super) mod api {
    use axum::{
        Extension, Json,
        extract::{Path, State},
    };
    use serde::Deserialize;

    use crate::connection::{
        self,
        model::{Connection, RequestOutcome},
    };
    use crate::user;

    #[derive(Deserialize)]
    pub struct RequestParams {
        addressee: user::Id,
    }

    pub async fn request(
        Extension(viewer): Extension<user::Id>,
        connection_service: State<connection::Service>,
        Json(params): Json<RequestParams>,
    ) -> crate::Result<Json<RequestOutcome>> {
        let outcome = connection_service
            .request(&viewer, &params.addressee)
            .await?;
        Ok(Json(outcome))
    }

    pub async fn accept(
        Extension(viewer): Extension<user::Id>,
        connection_service: State<connection::Service>,
        Path(id): Path<connection::Id>,
    ) -> crate::Result<Json<Connection>> {
        let connection = connection_service.accept(&viewer, &id).await?;
        Ok(Json(connection))
    }
}
