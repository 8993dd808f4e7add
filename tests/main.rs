mod composition;
mod query_plan;
mod schema;
