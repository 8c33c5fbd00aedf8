//! Admin-or-owner gate shared by every module-level operation.

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::user::Role,
    store::Store,
    utils::jwt::Claims,
};

/// The authenticated identity behind a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub id: Uuid,
    pub role: Role,
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl TryFrom<&Claims> for Caller {
    type Error = AppError;

    fn try_from(claims: &Claims) -> Result<Self, Self::Error> {
        Ok(Self {
            id: claims.user_id()?,
            role: claims.role(),
        })
    }
}

/// True when the caller is an admin or holds an ownership record for the course.
pub async fn has_course_access(
    store: &dyn Store,
    caller: &Caller,
    course_id: Uuid,
) -> AppResult<bool> {
    if caller.is_admin() {
        return Ok(true);
    }
    Ok(store.find_ownership(caller.id, course_id).await?.is_some())
}

pub async fn ensure_course_access(
    store: &dyn Store,
    caller: &Caller,
    course_id: Uuid,
) -> AppResult<()> {
    if has_course_access(store, caller, course_id).await? {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You do not have access to this course".to_string(),
        ))
    }
}
