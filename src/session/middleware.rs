use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::session;
use crate::user;

/// Resolves the caller's identity header into its user id and session.
pub async fn resolve(
    registry: State<session::Registry>,
    mut req: Request,
    next: Next,
) -> crate::Result<Response> {
    let header = req
        .headers()
        .get(session::IDENTITY_HEADER)
        .ok_or(session::Error::MissingIdentity)?;
    let raw = header
        .to_str()
        .map_err(|_| session::Error::InvalidIdentity(format!("{header:?}")))?;
    let viewer = raw
        .trim()
        .parse::<user::Id>()
        .map_err(|_| session::Error::InvalidIdentity(raw.to_owned()))?;

    let session = registry.get_or_open(viewer).await;

    let ext = req.extensions_mut();
    ext.insert(viewer);
    ext.insert(session);

    Ok(next.run(req).await)
}
