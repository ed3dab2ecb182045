use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::domain::month::Month;
use crate::domain::service_name::ServiceName;

/// Optional predicates shared by the list and summary queries.
/// Absent fields add no condition at all.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionFilter {
    pub user_id: Option<Uuid>,
    pub service_name: Option<ServiceName>,
}

/// Appends conjunctive `WHERE` conditions to a query, binding every value.
pub struct Conditions<'args> {
    builder: QueryBuilder<'args, Postgres>,
    count: usize,
}

impl<'args> Conditions<'args> {
    pub fn new(statement: &str) -> Self {
        Self {
            builder: QueryBuilder::new(statement),
            count: 0,
        }
    }

    fn next(&mut self) -> &mut QueryBuilder<'args, Postgres> {
        let keyword = if self.count == 0 { " WHERE " } else { " AND " };

        self.count += 1;
        self.builder.push(keyword)
    }

    pub fn matching(mut self, filter: &SubscriptionFilter) -> Self {
        if let Some(user_id) = filter.user_id {
            self.next().push("user_id = ").push_bind(user_id);
        }

        if let Some(service_name) = &filter.service_name {
            self.next()
                .push("service_name = ")
                .push_bind(service_name.as_ref().to_string());
        }

        self
    }

    /// Keeps rows whose active interval intersects `[from, to]`.
    pub fn active_between(mut self, from: Month, to: Month) -> Self {
        self.next()
            .push("NOT (end_month IS NOT NULL AND end_month < ")
            .push_bind(from.first_day())
            .push(")");
        self.next()
            .push("start_month <= ")
            .push_bind(to.first_day());

        self
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn finish(self) -> QueryBuilder<'args, Postgres> {
        self.builder
    }
}
