//! User aggregate: scalar fields plus a replace-on-write role set.
//!
//! The insert path owns password hashing; update never touches the stored
//! credential, and the outbound DTO shape cannot carry one at all.

use std::collections::BTreeSet;
use std::sync::Arc;

use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::Argon2;
use rand::rngs::OsRng;

use crate::crud::{Aggregate, CrudService};
use crate::domain::{Role, User};
use crate::dto::{RoleDto, UserDto, UserInsertDto};
use crate::errors::ServiceError;
use crate::repository::EntityStore;

pub enum UserAggregate {}

impl Aggregate for UserAggregate {
    const NAME: &'static str = "user";

    type Entity = User;
    type Assoc = Role;
    type Dto = UserDto;
    type InsertDto = UserInsertDto;

    fn blank() -> User {
        User::default()
    }

    fn summary(entity: &User) -> UserDto {
        UserDto {
            id: entity.id,
            first_name: entity.first_name.clone(),
            last_name: entity.last_name.clone(),
            email: entity.email.clone(),
            roles: Vec::new(),
        }
    }

    fn detail(entity: &User) -> UserDto {
        let mut dto = Self::summary(entity);
        dto.roles = entity
            .roles
            .iter()
            .map(|r| RoleDto { id: r.id, authority: r.authority.clone() })
            .collect();
        dto
    }

    fn apply(dto: &UserDto, entity: &mut User, refs: &dyn EntityStore<Role>) {
        entity.first_name = dto.first_name.clone();
        entity.last_name = dto.last_name.clone();
        entity.email = dto.email.clone();
        // password intentionally untouched: update never rewrites credentials
        let ids: BTreeSet<i64> = dto.roles.iter().filter_map(|r| r.id).collect();
        entity.roles = ids.into_iter().map(|id| refs.get_ref(id).into()).collect();
    }

    fn apply_insert(
        dto: &UserInsertDto,
        entity: &mut User,
        refs: &dyn EntityStore<Role>,
    ) -> Result<(), ServiceError> {
        Self::apply(&dto.as_update(), entity, refs);
        let salt = SaltString::generate(&mut OsRng);
        entity.password = Argon2::default()
            .hash_password(dto.password.as_bytes(), &salt)
            .map_err(|e| ServiceError::Storage(format!("password hashing failed: {e}")))?
            .to_string();
        Ok(())
    }
}

pub type UserService = CrudService<UserAggregate>;

pub fn service(
    users: Arc<dyn EntityStore<User>>,
    roles: Arc<dyn EntityStore<Role>>,
) -> UserService {
    CrudService::new(users, roles)
}
