//! Keeps an entity's columns consistent with the queries bound to it.
//!
//! The rules:
//!
//! - The first Reader query of an entity defines its columns.
//! - Adding a Reader query whose result differs asks the caller whether to
//!   replace the columns; declining drops the query.
//! - Whenever the columns change, every other Reader query is re-analyzed
//!   and flagged errored if it no longer fits.
//! - Removing the last Reader query clears the columns.

use entity_schema_core::{
    CommandType, Discrepancy, Entity, ExecuteMethod, ModelError, Query, check_compatibility,
    make_safe_name, set_columns,
};
use tracing::{debug, info, warn};

use crate::analyzer::SchemaAnalyzer;
use crate::driver::SchemaDriver;
use crate::report::ReconcileReport;

/// User input for a new or edited query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDraft {
    pub name: String,
    pub command_text: String,
    pub command_type: CommandType,
    pub execute_method: ExecuteMethod,
}

impl QueryDraft {
    pub fn new(
        name: &str,
        command_text: &str,
        command_type: CommandType,
        execute_method: ExecuteMethod,
    ) -> Self {
        Self {
            name: name.to_string(),
            command_text: command_text.to_string(),
            command_type,
            execute_method,
        }
    }

    fn into_query(self) -> Query {
        Query::new(
            &self.name,
            &self.command_text,
            self.command_type,
            self.execute_method,
        )
    }
}

/// Applies query edits to entities, re-analyzing through a [`SchemaAnalyzer`].
pub struct Reconciler<'a, D> {
    analyzer: &'a SchemaAnalyzer<D>,
}

impl<'a, D: SchemaDriver> Reconciler<'a, D> {
    pub fn new(analyzer: &'a SchemaAnalyzer<D>) -> Self {
        Self { analyzer }
    }

    /// Adds a query to `entity`.
    ///
    /// For a Reader query on an entity that already has columns, `decide` is
    /// called with the query name and the discrepancies when the result does
    /// not fit. Returning `true` replaces the entity's columns and
    /// re-validates the other Reader queries without a summary; `false`
    /// leaves the entity untouched and the report not accepted.
    ///
    /// If analysis fails the query is still added, flagged errored, and the
    /// failure is recorded in the report.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DuplicateQuery`] if the sanitized name is taken.
    pub fn add_query<F>(
        &self,
        entity: &mut Entity,
        draft: QueryDraft,
        decide: F,
    ) -> Result<ReconcileReport, ModelError>
    where
        F: FnOnce(&str, &[Discrepancy]) -> bool,
    {
        let mut report = ReconcileReport::new(&entity.name);
        let mut query = draft.into_query();
        if entity.query_index(&query.name).is_some() {
            return Err(ModelError::DuplicateQuery {
                entity: entity.name.clone(),
                query: query.name,
            });
        }

        let metadata = match self
            .analyzer
            .get_metadata(&query.command_text, query.command_type)
        {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(
                    entity = %entity.name,
                    query = %query.name,
                    error = %e,
                    "analysis failed while adding query"
                );
                query.mark_error();
                report.record_failure(&query.name, e.to_string());
                entity.add_query(query)?;
                return Ok(report);
            }
        };

        let mut replaced = false;
        if query.is_reader() {
            if entity.properties.is_empty() {
                report.columns_changed = set_columns(entity, &metadata);
            } else {
                let discrepancies = check_compatibility(entity, &metadata, false);
                if !discrepancies.is_empty() {
                    let accepted = decide(&query.name, &discrepancies);
                    report.discrepancies = discrepancies;
                    if !accepted {
                        debug!(
                            entity = %entity.name,
                            query = %query.name,
                            "column replacement declined"
                        );
                        report.accepted = false;
                        return Ok(report);
                    }
                    report.columns_changed = set_columns(entity, &metadata);
                    replaced = true;
                }
            }
        }

        query.parameters = metadata.parameters;
        query.mark_ok();
        report.record_ok(&query.name);
        let index = entity.queries.len();
        entity.add_query(query)?;

        if replaced {
            info!(entity = %entity.name, "columns replaced by new query");
            report.suppressed = true;
            self.refresh_at(entity, index, true, &mut report);
        }

        Ok(report)
    }

    /// Replaces a query's definition and refreshes it.
    ///
    /// A new name that collides with a sibling is declined and the old name
    /// kept, exactly like a rename.
    pub fn edit_query(
        &self,
        entity: &mut Entity,
        name: &str,
        draft: QueryDraft,
    ) -> Result<ReconcileReport, ModelError> {
        let index = require_query(entity, name)?;
        if make_safe_name(&draft.name) != name && !entity.rename_query(name, &draft.name) {
            debug!(entity = %entity.name, query = name, new_name = %draft.name, "rename declined");
        }

        let query = &mut entity.queries[index];
        query.command_text = draft.command_text;
        query.command_type = draft.command_type;
        query.execute_method = draft.execute_method;

        let mut report = ReconcileReport::new(&entity.name);
        self.refresh_at(entity, index, false, &mut report);
        Ok(report)
    }

    /// Re-analyzes one query.
    ///
    /// Reader queries re-define the entity's columns; if that changes them
    /// the other Reader queries are re-validated. On analysis failure the
    /// query is flagged errored and its parameters are left as they were.
    pub fn refresh_query(
        &self,
        entity: &mut Entity,
        name: &str,
    ) -> Result<ReconcileReport, ModelError> {
        let index = require_query(entity, name)?;
        let mut report = ReconcileReport::new(&entity.name);
        self.refresh_at(entity, index, false, &mut report);
        Ok(report)
    }

    /// Re-analyzes every query of the entity.
    ///
    /// Non-Reader queries are refreshed one by one. Then the first Reader
    /// query is refreshed and all other Reader queries are re-validated
    /// against the result, whether or not the columns changed.
    pub fn refresh_entity(&self, entity: &mut Entity) -> ReconcileReport {
        let mut report = ReconcileReport::new(&entity.name);

        for index in 0..entity.queries.len() {
            if !entity.queries[index].is_reader() {
                self.refresh_at(entity, index, false, &mut report);
            }
        }

        if let Some(first_reader) = entity.queries.iter().position(Query::is_reader) {
            self.refresh_at(entity, first_reader, true, &mut report);
        }

        report
    }

    /// Removes a query, clearing the columns if it was the last Reader.
    pub fn delete_query(&self, entity: &mut Entity, name: &str) -> Result<Query, ModelError> {
        let index = require_query(entity, name)?;
        let removed = entity
            .remove_query(index)
            .ok_or_else(|| ModelError::QueryNotFound {
                entity: entity.name.clone(),
                query: name.to_string(),
            })?;
        if entity.properties.is_empty() && removed.is_reader() {
            debug!(entity = %entity.name, query = name, "last reader removed, columns cleared");
        }
        Ok(removed)
    }

    fn refresh_at(
        &self,
        entity: &mut Entity,
        index: usize,
        refresh_all: bool,
        report: &mut ReconcileReport,
    ) {
        let (command_text, command_type) = {
            let query = &entity.queries[index];
            (query.command_text.clone(), query.command_type)
        };

        let mut columns_changed = false;
        match self.analyzer.get_metadata(&command_text, command_type) {
            Ok(metadata) => {
                if entity.queries[index].is_reader() {
                    columns_changed = set_columns(entity, &metadata);
                }
                let query = &mut entity.queries[index];
                query.parameters = metadata.parameters;
                query.mark_ok();
                report.record_ok(&query.name);
            }
            Err(e) => {
                let query = &mut entity.queries[index];
                warn!(query = %query.name, error = %e, "analysis failed while refreshing query");
                query.mark_error();
                report.record_failure(&query.name, e.to_string());
            }
        }

        if columns_changed {
            info!(
                entity = %entity.name,
                columns = entity.properties.len(),
                "entity columns changed"
            );
            report.columns_changed = true;
        }
        if columns_changed || refresh_all {
            self.revalidate_readers(entity, index, report);
        }
    }

    /// Checks every Reader query except `skip` against the entity's columns.
    fn revalidate_readers(&self, entity: &mut Entity, skip: usize, report: &mut ReconcileReport) {
        for index in 0..entity.queries.len() {
            if index == skip || !entity.queries[index].is_reader() {
                continue;
            }
            let (command_text, command_type) = {
                let query = &entity.queries[index];
                (query.command_text.clone(), query.command_type)
            };

            match self.analyzer.get_metadata(&command_text, command_type) {
                Ok(metadata) => {
                    let fits = check_compatibility(entity, &metadata, true).is_empty();
                    let query = &mut entity.queries[index];
                    if fits {
                        query.mark_ok();
                        report.record_ok(&query.name);
                    } else {
                        debug!(query = %query.name, "query no longer fits entity");
                        query.mark_error();
                        report.record_errored(&query.name);
                    }
                }
                Err(e) => {
                    let query = &mut entity.queries[index];
                    warn!(
                        query = %query.name,
                        error = %e,
                        "analysis failed while re-validating query"
                    );
                    query.mark_error();
                    report.record_failure(&query.name, e.to_string());
                }
            }
        }
    }
}

fn require_query(entity: &Entity, name: &str) -> Result<usize, ModelError> {
    entity
        .query_index(name)
        .ok_or_else(|| ModelError::QueryNotFound {
            entity: entity.name.clone(),
            query: name.to_string(),
        })
}
