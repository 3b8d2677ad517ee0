//! Company-hierarchy access scoping.
//!
//! Every query in the system is filtered by the set of companies the caller
//! may see: their own company plus companies whose `related_company` edge
//! points into that set. Authentication itself is handled upstream; the
//! caller identity arrives in headers and is resolved here.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::entities::company;
use crate::errors::ServiceError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const COMPANY_ID_HEADER: &str = "x-company-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    ManagerMain,
    SalesmanagerMain,
    ServiceMain,
    ManagerDistributor,
    SalesmanagerDistributor,
    ServiceDistributor,
}

/// Caller identity, extracted from request headers.
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user_id: Uuid,
    pub role: Option<Role>,
    pub company_id: Option<Uuid>,
}

#[async_trait]
impl<S> FromRequestParts<S> for UserContext
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header_value(parts, USER_ID_HEADER)
            .ok_or_else(|| ServiceError::Unauthorized(format!("missing {USER_ID_HEADER} header")))?
            .parse::<Uuid>()
            .map_err(|_| {
                ServiceError::Unauthorized(format!("invalid {USER_ID_HEADER} header"))
            })?;

        let role = match header_value(parts, USER_ROLE_HEADER) {
            Some(raw) => Some(raw.parse::<Role>().map_err(|_| {
                ServiceError::Unauthorized(format!("unknown role '{raw}'"))
            })?),
            None => None,
        };

        let company_id = match header_value(parts, COMPANY_ID_HEADER) {
            Some(raw) => Some(raw.parse::<Uuid>().map_err(|_| {
                ServiceError::Unauthorized(format!("invalid {COMPANY_ID_HEADER} header"))
            })?),
            None => None,
        };

        Ok(UserContext {
            user_id,
            role,
            company_id,
        })
    }
}

fn header_value(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// The set of companies a caller may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompanyScope {
    Unrestricted,
    Companies(Vec<Uuid>),
}

impl CompanyScope {
    /// Scope that sees nothing at all.
    pub fn empty() -> Self {
        CompanyScope::Companies(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CompanyScope::Companies(ids) if ids.is_empty())
    }

    pub fn permits(&self, company_id: Uuid) -> bool {
        match self {
            CompanyScope::Unrestricted => true,
            CompanyScope::Companies(ids) => ids.contains(&company_id),
        }
    }
}

/// Resolves the visible company set for a caller.
///
/// Main-company managers and service staff see everything. A main-company
/// sales manager sees the companies assigned to them and those companies'
/// direct children. Distributor roles see their own company and its direct
/// children. Anyone else sees nothing.
pub async fn resolve_scope<C: ConnectionTrait>(
    db: &C,
    user: &UserContext,
) -> Result<CompanyScope, ServiceError> {
    let Some(role) = user.role else {
        return Ok(CompanyScope::empty());
    };

    match role {
        Role::ManagerMain | Role::ServiceMain => Ok(CompanyScope::Unrestricted),
        Role::SalesmanagerMain => {
            let assigned: Vec<Uuid> = company::Entity::find()
                .filter(company::Column::RelatedManagerId.eq(user.user_id))
                .all(db)
                .await?
                .into_iter()
                .map(|c| c.id)
                .collect();

            if assigned.is_empty() {
                return Ok(CompanyScope::empty());
            }

            let related: Vec<Uuid> = company::Entity::find()
                .filter(company::Column::RelatedCompanyId.is_in(assigned.clone()))
                .all(db)
                .await?
                .into_iter()
                .map(|c| c.id)
                .collect();

            Ok(CompanyScope::Companies(dedup(
                assigned.into_iter().chain(related),
            )))
        }
        Role::ManagerDistributor | Role::SalesmanagerDistributor | Role::ServiceDistributor => {
            let Some(own) = user.company_id else {
                return Ok(CompanyScope::empty());
            };

            let related: Vec<Uuid> = company::Entity::find()
                .filter(company::Column::RelatedCompanyId.eq(own))
                .all(db)
                .await?
                .into_iter()
                .map(|c| c.id)
                .collect();

            Ok(CompanyScope::Companies(dedup(
                std::iter::once(own).chain(related),
            )))
        }
    }
}

fn dedup(ids: impl Iterator<Item = Uuid>) -> Vec<Uuid> {
    ids.collect::<BTreeSet<_>>().into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_parse_from_header_strings() {
        assert_eq!(
            "manager_main".parse::<Role>().unwrap(),
            Role::ManagerMain
        );
        assert_eq!(
            "salesmanager_distributor".parse::<Role>().unwrap(),
            Role::SalesmanagerDistributor
        );
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn empty_scope_permits_nothing() {
        let scope = CompanyScope::empty();
        assert!(scope.is_empty());
        assert!(!scope.permits(Uuid::new_v4()));
    }

    #[test]
    fn unrestricted_scope_permits_everything() {
        assert!(CompanyScope::Unrestricted.permits(Uuid::new_v4()));
        assert!(!CompanyScope::Unrestricted.is_empty());
    }

    #[test]
    fn company_list_scope_permits_members_only() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let scope = CompanyScope::Companies(vec![a]);
        assert!(scope.permits(a));
        assert!(!scope.permits(b));
    }
}
