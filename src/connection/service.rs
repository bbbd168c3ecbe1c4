use async_trait::async_trait;
use log::debug;

use crate::user;

use super::model::{Connection, RequestOutcome};
use super::{Id, Repository, Status};

#[async_trait]
pub trait ConnectionService {
    /// Creates a pending connection. An existing pair is reported, not failed.
    async fn request(
        &self,
        requester: &user::Id,
        addressee: &user::Id,
    ) -> super::Result<RequestOutcome>;

    async fn accept(&self, actor: &user::Id, id: &Id) -> super::Result<Connection>;
}

#[derive(Clone)]
pub struct ConnectionServiceImpl {
    repo: Repository,
}

impl ConnectionServiceImpl {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl ConnectionService for ConnectionServiceImpl {
    async fn request(
        &self,
        requester: &user::Id,
        addressee: &user::Id,
    ) -> super::Result<RequestOutcome> {
        let connection = Connection::new(requester, addressee);

        match self.repo.add(&connection).await {
            Ok(()) => Ok(RequestOutcome::Created { connection }),
            Err(super::Error::AlreadyExists(a, b)) => {
                debug!("connection {a} <-> {b} already exists, nothing to do");
                Ok(RequestOutcome::AlreadyExists)
            }
            Err(e) => Err(e),
        }
    }

    async fn accept(&self, actor: &user::Id, id: &Id) -> super::Result<Connection> {
        let mut c = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(super::Error::NotFound(*id))?;

        if c.addressee().ne(actor) {
            return Err(super::Error::NotAddressee);
        }

        if c.status().ne(&Status::Accepted) {
            self.repo.update_status(id, &Status::Accepted).await?;
            c.set_status(Status::Accepted);
        }

        Ok(c)
    }
}
