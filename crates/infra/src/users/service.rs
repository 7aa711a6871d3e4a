use chrono::Utc;
use serde::Deserialize;

use userguard_auth::{hash_password, Role, User};
use userguard_core::{DomainError, DomainResult, UserId};

use super::page::{Page, UserQuery};
use super::repository::{UserRepository, EMAIL_IN_USE};

const MAX_NAME_LEN: usize = 100;
const MIN_PASSWORD_LEN: usize = 8;

/// Payload for creating a user.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

/// A bootstrap account created by [`UserService::seed_defaults`].
#[derive(Debug, Clone, Copy)]
pub struct SeedUser {
    pub name: &'static str,
    pub email: &'static str,
    pub password: &'static str,
    pub role: Role,
}

pub const DEFAULT_SEED_USERS: [SeedUser; 3] = [
    SeedUser {
        name: "Admin User",
        email: "admin@example.com",
        password: "Admin123!",
        role: Role::Admin,
    },
    SeedUser {
        name: "Manager User",
        email: "manager@example.com",
        password: "Manager123!",
        role: Role::Manager,
    },
    SeedUser {
        name: "Regular User",
        email: "user@example.com",
        password: "User123!",
        role: Role::User,
    },
];

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_name(name: &str) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("name should not be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(DomainError::validation(format!(
            "name must be shorter than or equal to {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_email(email: &str) -> DomainResult<()> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(DomainError::validation("email must be an email")),
    }
}

fn validate_password(password: &str) -> DomainResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::validation(format!(
            "password must be longer than or equal to {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn hash(password: &str) -> DomainResult<String> {
    hash_password(password).map_err(|e| DomainError::internal(e.to_string()))
}

fn not_found(id: UserId) -> DomainError {
    DomainError::not_found(format!("User with ID \"{id}\" not found"))
}

/// User CRUD on top of a [`UserRepository`].
#[derive(Debug, Clone)]
pub struct UserService<R> {
    repo: R,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn create(&self, input: NewUser) -> DomainResult<User> {
        validate_name(&input.name)?;
        let email = normalize_email(&input.email);
        validate_email(&email)?;
        validate_password(&input.password)?;

        if self.repo.find_by_email(&email).is_some() {
            return Err(DomainError::conflict(EMAIL_IN_USE));
        }

        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            name: input.name.trim().to_string(),
            email,
            password_hash: hash(&input.password)?,
            role: input.role.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };
        self.repo.insert(user.clone())?;

        tracing::info!(user_id = %user.id, role = %user.role, "user created");
        Ok(user)
    }

    pub fn find_all(&self, query: &UserQuery) -> DomainResult<Page<User>> {
        self.repo.find_all(query)
    }

    pub fn find_by_id(&self, id: UserId) -> DomainResult<User> {
        self.repo.find_by_id(id).ok_or_else(|| not_found(id))
    }

    pub fn find_by_email(&self, email: &str) -> DomainResult<User> {
        let email = normalize_email(email);
        self.repo
            .find_by_email(&email)
            .ok_or_else(|| DomainError::not_found(format!("User with email \"{email}\" not found")))
    }

    pub fn update(&self, id: UserId, patch: UserPatch) -> DomainResult<User> {
        let mut user = self.find_by_id(id)?;

        if let Some(name) = &patch.name {
            validate_name(name)?;
            user.name = name.trim().to_string();
        }
        if let Some(email) = &patch.email {
            let email = normalize_email(email);
            validate_email(&email)?;
            if self.repo.find_by_email(&email).is_some_and(|other| other.id != id) {
                return Err(DomainError::conflict(EMAIL_IN_USE));
            }
            user.email = email;
        }
        if let Some(password) = &patch.password {
            validate_password(password)?;
            user.password_hash = hash(password)?;
        }
        if let Some(role) = patch.role {
            user.role = role;
        }
        user.updated_at = Utc::now();

        self.repo.save(user.clone())?;
        tracing::info!(user_id = %id, "user updated");
        Ok(user)
    }

    pub fn remove(&self, id: UserId) -> DomainResult<()> {
        if !self.repo.delete(id) {
            return Err(not_found(id));
        }
        tracing::info!(user_id = %id, "user removed");
        Ok(())
    }

    /// Create the bootstrap accounts whose emails are not taken yet.
    /// Returns how many were created.
    pub fn seed(&self, seeds: &[SeedUser]) -> DomainResult<usize> {
        let mut created = 0;
        for seed in seeds {
            if self.repo.find_by_email(seed.email).is_some() {
                tracing::info!(email = seed.email, "seed user already exists, skipping");
                continue;
            }
            self.create(NewUser {
                name: seed.name.to_string(),
                email: seed.email.to_string(),
                password: seed.password.to_string(),
                role: Some(seed.role),
            })?;
            created += 1;
        }
        Ok(created)
    }

    pub fn seed_defaults(&self) -> DomainResult<usize> {
        self.seed(&DEFAULT_SEED_USERS)
    }
}
