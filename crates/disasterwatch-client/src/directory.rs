//! Local state of the user administration view.
//!
//! Unlike the alert feed, changes here are not optimistic: a user is removed
//! or promoted locally only after the backend confirms.

use disasterwatch_types::{Role, UserId, UserRecord};

use crate::api::ApiClient;
use crate::error::ClientError;

/// The list of registered users as last loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserDirectory {
    users: Vec<UserRecord>,
}

impl UserDirectory {
    /// Wrap an already fetched list.
    pub const fn new(users: Vec<UserRecord>) -> Self {
        Self { users }
    }

    /// Fetch the list from the backend.
    pub async fn load(client: &ApiClient, token: Option<&str>) -> Result<Self, ClientError> {
        client.list_users(token).await.map(Self::new)
    }

    /// Users in backend order.
    pub fn users(&self) -> &[UserRecord] {
        &self.users
    }

    /// Number of users.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Look up a user.
    pub fn get(&self, id: &UserId) -> Option<&UserRecord> {
        self.users.iter().find(|u| &u.id == id)
    }

    /// Delete a user on the backend, then drop them locally.
    pub async fn ban(
        &mut self,
        client: &ApiClient,
        token: Option<&str>,
        id: &UserId,
    ) -> Result<(), ClientError> {
        client.delete_user(token, id).await?;
        self.remove(id);
        Ok(())
    }

    /// Promote a user on the backend, then mark them admin locally.
    pub async fn promote(
        &mut self,
        client: &ApiClient,
        token: Option<&str>,
        id: &UserId,
    ) -> Result<(), ClientError> {
        client.promote_user(token, id).await?;
        self.mark_admin(id);
        Ok(())
    }

    /// Drop a user. Returns whether one was present.
    pub fn remove(&mut self, id: &UserId) -> bool {
        let before = self.users.len();
        self.users.retain(|u| &u.id != id);
        self.users.len() != before
    }

    /// Set a user's role to admin. Returns whether one was present.
    pub fn mark_admin(&mut self, id: &UserId) -> bool {
        self.users
            .iter_mut()
            .find(|u| &u.id == id)
            .map(|u| u.role = Role::Admin)
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, role: Role) -> UserRecord {
        UserRecord {
            id: UserId::from(id),
            fullname: Some(format!("User {id}")),
            email: Some(format!("{id}@example.org")),
            role,
        }
    }

    fn directory() -> UserDirectory {
        UserDirectory::new(vec![user("a", Role::User), user("b", Role::Admin), user("c", Role::User)])
    }

    #[test]
    fn remove_drops_only_the_target() {
        let mut dir = directory();
        assert!(dir.remove(&UserId::from("a")));
        assert!(!dir.remove(&UserId::from("a")));
        assert_eq!(dir.len(), 2);
        assert!(dir.get(&UserId::from("b")).is_some());
    }

    #[test]
    fn mark_admin_updates_role() {
        let mut dir = directory();
        assert!(dir.mark_admin(&UserId::from("c")));
        assert_eq!(dir.get(&UserId::from("c")).map(|u| u.role), Some(Role::Admin));
        assert!(!dir.mark_admin(&UserId::from("zz")));
    }
}
