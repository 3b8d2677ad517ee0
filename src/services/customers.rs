use crate::{
    access::CompanyScope,
    db::DbPool,
    entities::{company, company::CompanyType, working_hours},
    errors::ServiceError,
    scheduling::WorkWeek,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Upper bound accepted for a daily working-hours value.
const MAX_DAILY_HOURS: f64 = 24.0;

#[derive(Debug, Clone)]
pub struct CreateCustomer {
    pub name: String,
    pub company_type: CompanyType,
    pub related_company_id: Option<Uuid>,
    pub related_manager_id: Option<Uuid>,
    pub tax_number: Option<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct UpsertWorkingHours {
    pub daily_working_hours: f64,
    pub working_on_saturday: bool,
    pub working_on_sunday: bool,
}

/// Service for managing customer companies and their working-hours profiles
#[derive(Clone)]
pub struct CustomerService {
    db: Arc<DbPool>,
}

impl CustomerService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn create_customer(
        &self,
        input: CreateCustomer,
    ) -> Result<company::Model, ServiceError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::ValidationError(
                "company name cannot be empty".to_string(),
            ));
        }

        let db = self.db.as_ref();

        let existing = company::Entity::find()
            .filter(company::Column::Name.eq(name.clone()))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "company '{}' already exists",
                name
            )));
        }

        if let Some(parent_id) = input.related_company_id {
            company::Entity::find_by_id(parent_id)
                .one(db)
                .await?
                .ok_or_else(|| {
                    ServiceError::ValidationError(format!(
                        "related company {} does not exist",
                        parent_id
                    ))
                })?;
        }

        let created = company::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            company_type: Set(input.company_type.as_str().to_string()),
            related_company_id: Set(input.related_company_id),
            related_manager_id: Set(input.related_manager_id),
            tax_number: Set(input.tax_number),
            email: Set(input.email),
            telephone: Set(input.telephone),
            active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await?;

        Ok(created)
    }

    #[instrument(skip(self, scope))]
    pub async fn get_customer(
        &self,
        scope: &CompanyScope,
        id: Uuid,
    ) -> Result<company::Model, ServiceError> {
        let customer = company::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .filter(|c| scope.permits(c.id))
            .ok_or_else(|| ServiceError::NotFound(format!("Company {} not found", id)))?;
        Ok(customer)
    }

    #[instrument(skip(self, scope))]
    pub async fn list_customers(
        &self,
        scope: &CompanyScope,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<company::Model>, u64), ServiceError> {
        let db = self.db.as_ref();

        let mut query = company::Entity::find();
        match scope {
            CompanyScope::Unrestricted => {}
            CompanyScope::Companies(ids) => {
                if ids.is_empty() {
                    return Ok((Vec::new(), 0));
                }
                query = query.filter(company::Column::Id.is_in(ids.clone()));
            }
        }

        let total = query.clone().count(db).await?;

        let offset = page.saturating_sub(1) * limit;
        let companies = query
            .order_by_asc(company::Column::Name)
            .offset(offset)
            .limit(limit)
            .all(db)
            .await?;

        Ok((companies, total))
    }

    /// Creates or replaces the customer's working-hours profile.
    #[instrument(skip(self, scope))]
    pub async fn upsert_working_hours(
        &self,
        scope: &CompanyScope,
        company_id: Uuid,
        input: UpsertWorkingHours,
    ) -> Result<working_hours::Model, ServiceError> {
        if !(input.daily_working_hours > 0.0 && input.daily_working_hours <= MAX_DAILY_HOURS) {
            return Err(ServiceError::ValidationError(format!(
                "daily working hours must be between 0 and {MAX_DAILY_HOURS}"
            )));
        }

        let db = self.db.as_ref();

        let company = company::Entity::find_by_id(company_id)
            .one(db)
            .await?
            .filter(|c| scope.permits(c.id))
            .ok_or_else(|| ServiceError::NotFound(format!("Company {} not found", company_id)))?;

        let existing = working_hours::Entity::find()
            .filter(working_hours::Column::CompanyId.eq(company.id))
            .one(db)
            .await?;

        let saved = match existing {
            Some(model) => {
                let mut active: working_hours::ActiveModel = model.into();
                active.daily_working_hours = Set(input.daily_working_hours);
                active.working_on_saturday = Set(input.working_on_saturday);
                active.working_on_sunday = Set(input.working_on_sunday);
                active.update(db).await?
            }
            None => {
                working_hours::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    company_id: Set(company.id),
                    daily_working_hours: Set(input.daily_working_hours),
                    working_on_saturday: Set(input.working_on_saturday),
                    working_on_sunday: Set(input.working_on_sunday),
                    ..Default::default()
                }
                .insert(db)
                .await?
            }
        };

        Ok(saved)
    }
}

/// Loads a customer's work week, if a profile exists. Input to the due-date
/// calculator; `None` triggers the assumed 40-hour week there.
pub(crate) async fn work_week_for<C: ConnectionTrait>(
    db: &C,
    company_id: Uuid,
) -> Result<Option<WorkWeek>, sea_orm::DbErr> {
    Ok(working_hours::Entity::find()
        .filter(working_hours::Column::CompanyId.eq(company_id))
        .one(db)
        .await?
        .map(|profile| profile.work_week()))
}
