use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use userguard_auth::User;
use userguard_core::{DomainError, DomainResult, UserId};

use super::page::{Page, UserQuery};

/// User storage abstraction.
///
/// Email uniqueness is enforced by implementations on `insert`/`save`, so two
/// concurrent creations with the same email cannot both succeed.
pub trait UserRepository: Send + Sync {
    /// Filtered and paginated listing, ordered by creation time then id.
    fn find_all(&self, query: &UserQuery) -> DomainResult<Page<User>>;
    fn find_by_id(&self, id: UserId) -> Option<User>;
    /// Lookup by (already normalised) email.
    fn find_by_email(&self, email: &str) -> Option<User>;
    fn insert(&self, user: User) -> DomainResult<()>;
    /// Replace an existing user.
    fn save(&self, user: User) -> DomainResult<()>;
    /// Returns whether a user was removed.
    fn delete(&self, id: UserId) -> bool;
}

impl<S> UserRepository for Arc<S>
where
    S: UserRepository + ?Sized,
{
    fn find_all(&self, query: &UserQuery) -> DomainResult<Page<User>> {
        (**self).find_all(query)
    }

    fn find_by_id(&self, id: UserId) -> Option<User> {
        (**self).find_by_id(id)
    }

    fn find_by_email(&self, email: &str) -> Option<User> {
        (**self).find_by_email(email)
    }

    fn insert(&self, user: User) -> DomainResult<()> {
        (**self).insert(user)
    }

    fn save(&self, user: User) -> DomainResult<()> {
        (**self).save(user)
    }

    fn delete(&self, id: UserId) -> bool {
        (**self).delete(id)
    }
}

pub(crate) const EMAIL_IN_USE: &str = "Email already in use";

/// In-memory user store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    inner: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn email_taken(map: &HashMap<UserId, User>, email: &str, except: Option<UserId>) -> bool {
    map.values()
        .any(|u| u.email == email && Some(u.id) != except)
}

fn poisoned() -> DomainError {
    DomainError::internal("user store lock poisoned")
}

impl UserRepository for InMemoryUserRepository {
    fn find_all(&self, query: &UserQuery) -> DomainResult<Page<User>> {
        let (page, per_page) = query.window()?;
        let needle = query.needle();

        let mut users: Vec<User> = match self.inner.read() {
            Ok(map) => map
                .values()
                .filter(|u| match &needle {
                    Some(n) => u.name.to_lowercase().contains(n) || u.email.contains(n),
                    None => true,
                })
                .cloned()
                .collect(),
            Err(_) => vec![],
        };
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        Ok(Page::slice(users, page, per_page))
    }

    fn find_by_id(&self, id: UserId) -> Option<User> {
        let map = self.inner.read().ok()?;
        map.get(&id).cloned()
    }

    fn find_by_email(&self, email: &str) -> Option<User> {
        let map = self.inner.read().ok()?;
        map.values().find(|u| u.email == email).cloned()
    }

    fn insert(&self, user: User) -> DomainResult<()> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if email_taken(&map, &user.email, None) {
            return Err(DomainError::conflict(EMAIL_IN_USE));
        }
        if map.contains_key(&user.id) {
            return Err(DomainError::conflict(format!("User with ID \"{}\" already exists", user.id)));
        }
        map.insert(user.id, user);
        Ok(())
    }

    fn save(&self, user: User) -> DomainResult<()> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if !map.contains_key(&user.id) {
            return Err(DomainError::not_found(format!("User with ID \"{}\" not found", user.id)));
        }
        if email_taken(&map, &user.email, Some(user.id)) {
            return Err(DomainError::conflict(EMAIL_IN_USE));
        }
        map.insert(user.id, user);
        Ok(())
    }

    fn delete(&self, id: UserId) -> bool {
        match self.inner.write() {
            Ok(mut map) => map.remove(&id).is_some(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use userguard_auth::Role;

    use super::*;

    fn user(name: &str, email: &str, minutes: i64) -> User {
        let at = Utc::now() + Duration::minutes(minutes);
        User {
            id: UserId::new(),
            name: name.into(),
            email: email.into(),
            password_hash: String::new(),
            role: Role::User,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn insert_rejects_duplicate_email() {
        let repo = InMemoryUserRepository::new();
        repo.insert(user("A", "a@example.com", 0)).unwrap();

        let err = repo.insert(user("B", "a@example.com", 1)).unwrap_err();
        assert_eq!(err, DomainError::conflict("Email already in use"));
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn save_allows_keeping_own_email_but_not_taking_another() {
        let repo = InMemoryUserRepository::new();
        let mut a = user("A", "a@example.com", 0);
        let b = user("B", "b@example.com", 1);
        repo.insert(a.clone()).unwrap();
        repo.insert(b).unwrap();

        a.name = "Renamed".into();
        repo.save(a.clone()).unwrap();
        assert_eq!(repo.find_by_id(a.id).unwrap().name, "Renamed");

        a.email = "b@example.com".into();
        assert!(matches!(repo.save(a), Err(DomainError::Conflict(_))));
    }

    #[test]
    fn save_of_unknown_user_is_not_found() {
        let repo = InMemoryUserRepository::new();
        assert!(matches!(
            repo.save(user("A", "a@example.com", 0)),
            Err(DomainError::NotFound(_))
        ));
    }

    #[test]
    fn listing_is_ordered_and_searchable() {
        let repo = InMemoryUserRepository::new();
        repo.insert(user("Carol", "carol@example.com", 2)).unwrap();
        repo.insert(user("Alice", "alice@example.com", 0)).unwrap();
        repo.insert(user("Bob", "bob@corp.test", 1)).unwrap();

        let all = repo.find_all(&UserQuery::default()).unwrap();
        let names: Vec<_> = all.data.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["Alice", "Bob", "Carol"]);
        assert_eq!(all.meta.total, 3);

        let q = UserQuery { search: Some("EXAMPLE".into()), ..Default::default() };
        assert_eq!(repo.find_all(&q).unwrap().meta.total, 2);

        let q = UserQuery { search: Some("bo".into()), ..Default::default() };
        let found = repo.find_all(&q).unwrap();
        assert_eq!(found.data.len(), 1);
        assert_eq!(found.data[0].name, "Bob");
    }

    #[test]
    fn delete_reports_whether_anything_was_removed() {
        let repo = InMemoryUserRepository::new();
        let a = user("A", "a@example.com", 0);
        repo.insert(a.clone()).unwrap();

        assert!(repo.delete(a.id));
        assert!(!repo.delete(a.id));
        assert!(repo.is_empty());
    }
}
