use std::ops::{Deref, DerefMut};

use mongodb::ClientSession;

/// Wrapper around a Mongo client session; every store operation is scoped to
/// one of these so it can take part in a transaction.
pub struct Session {
    client_session: ClientSession,
}

impl Session {
    pub fn new(client_session: ClientSession) -> Self {
        Session { client_session }
    }
}

impl Deref for Session {
    type Target = ClientSession;

    fn deref(&self) -> &Self::Target {
        &self.client_session
    }
}

impl DerefMut for Session {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.client_session
    }
}

impl<'a> From<&'a mut Session> for &'a mut ClientSession {
    fn from(session: &'a mut Session) -> &'a mut ClientSession {
        &mut session.client_session
    }
}
