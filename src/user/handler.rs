use axum::http::StatusCode;

impl From<&super::Error> for StatusCode {
    fn from(e: &super::Error) -> Self {
        match e {
            super::Error::NotFound(_) => Self::NOT_FOUND,
            super::Error::_R2d2(_) | super::Error::_Diesel(_) | super::Error::_Join(_) => {
                Self::INTERNAL_SERVER_ERROR
            }
        }
    }
}

pub(super) mod api {
    use axum::{
        Json,
        extract::{Path, State},
    };

    use crate::user::{self, model::Profile};

    pub async fn find_one(
        user_service: State<user::Service>,
        Path(id): Path<user::Id>,
    ) -> crate::Result<Json<Profile>> {
        let profile = user_service.find_profile(&id).await?;
        Ok(Json(profile))
    }
}
