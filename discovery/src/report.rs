//! Structured outcome of a reconciliation operation.

use entity_schema_core::Discrepancy;
use serde::{Deserialize, Serialize};

/// An analysis failure for one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFailure {
    pub query: String,
    /// Driver message, verbatim.
    pub message: String,
}

/// What happened during one add, edit or refresh.
///
/// Presentation layers use this instead of dialogs: `ok` and `errored` are
/// the queries to flash, `failures` the errors to show, and [`summary`]
/// the incompatibility message.
///
/// [`summary`]: ReconcileReport::summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub entity: String,
    /// `false` when the user declined to replace the entity's columns.
    pub accepted: bool,
    /// Whether the entity's properties were replaced.
    pub columns_changed: bool,
    /// Discrepancies shown to the decision callback, if it was asked.
    pub discrepancies: Vec<Discrepancy>,
    /// Queries whose analysis succeeded and that fit the entity.
    pub ok: Vec<String>,
    /// Reader queries that no longer fit the entity's columns.
    pub errored: Vec<String>,
    pub failures: Vec<QueryFailure>,
    /// The incompatibility summary must not be shown.
    pub suppressed: bool,
}

impl ReconcileReport {
    pub fn new(entity: &str) -> Self {
        Self {
            entity: entity.to_string(),
            accepted: true,
            ..Self::default()
        }
    }

    pub(crate) fn record_ok(&mut self, query: &str) {
        if !self.ok.iter().any(|q| q == query) {
            self.ok.push(query.to_string());
        }
    }

    pub(crate) fn record_errored(&mut self, query: &str) {
        self.ok.retain(|q| q != query);
        if !self.errored.iter().any(|q| q == query) {
            self.errored.push(query.to_string());
        }
    }

    pub(crate) fn record_failure(&mut self, query: &str, message: String) {
        self.ok.retain(|q| q != query);
        self.failures.push(QueryFailure {
            query: query.to_string(),
            message,
        });
    }

    /// Whether anything went wrong.
    pub fn has_problems(&self) -> bool {
        !self.errored.is_empty() || !self.failures.is_empty()
    }

    /// The message listing incompatible queries, unless suppressed.
    ///
    /// # Examples
    ///
    /// ```
    /// use entity_schema_discovery::ReconcileReport;
    ///
    /// let mut report = ReconcileReport::new("Customer");
    /// assert_eq!(report.summary(), None);
    ///
    /// report.errored.push("GetAll".into());
    /// assert_eq!(
    ///     report.summary().unwrap(),
    ///     "The result returned by the query 'GetAll' is not compatible with the entity 'Customer'."
    /// );
    ///
    /// report.errored.push("GetById".into());
    /// assert_eq!(
    ///     report.summary().unwrap(),
    ///     "The result returned by the following queries is not compatible with the entity 'Customer':\n - GetAll\n - GetById"
    /// );
    /// ```
    pub fn summary(&self) -> Option<String> {
        if self.suppressed {
            return None;
        }
        match self.errored.as_slice() {
            [] => None,
            [single] => Some(format!(
                "The result returned by the query '{single}' is not compatible with the entity '{}'.",
                self.entity
            )),
            many => Some(format!(
                "The result returned by the following queries is not compatible with the entity '{}':\n - {}",
                self.entity,
                many.join("\n - ")
            )),
        }
    }
}
