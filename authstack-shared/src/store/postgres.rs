/// PostgreSQL user store
///
/// Thin adapter from [`UserStore`] to the query functions on
/// [`User`](crate::models::user::User).

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{parse_user_id, StoreError, UserStore};
use crate::db::pool::health_check;
use crate::models::user::{CreateUser, UpdateUser, User};

#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, data: CreateUser) -> Result<User, StoreError> {
        Ok(User::create(&self.pool, data).await?)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        let id = parse_user_id(id)?;
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn update(&self, id: Uuid, data: UpdateUser) -> Result<Option<User>, StoreError> {
        Ok(User::update(&self.pool, id, data).await?)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(health_check(&self.pool).await?)
    }
}
