//! Execution of compiled searches and assembly of the result page.

use std::collections::HashSet;

use metabridge_proto::{EntityDetail, Paging};
use tracing::{debug, warn};

use super::compiler::{SearchPlan, SubQuery};
use super::sequencing::{page, sort_instances};
use crate::catalog::{CatalogAccess, CatalogObject};
use crate::translate::{EntityTranslator, TranslationContext};

/// Runs a search plan against the catalog.
pub struct ResultAssembler<'a> {
    context: TranslationContext<'a>,
    catalog: &'a dyn CatalogAccess,
}

impl<'a> ResultAssembler<'a> {
    pub fn new(context: TranslationContext<'a>, catalog: &'a dyn CatalogAccess) -> Self {
        Self { context, catalog }
    }

    /// Issue the plan's queries, translate, merge, sort and page.
    ///
    /// A failed sub-query contributes nothing. Returns `None` for an empty
    /// page.
    pub fn assemble(&self, plan: &SearchPlan, paging: &Paging) -> Option<Vec<EntityDetail>> {
        let mut seen = HashSet::new();
        let mut results = Vec::new();
        for sub_query in plan.issued() {
            for object in self.run(sub_query) {
                for detail in self.translate(sub_query, &object) {
                    if !self.expected(plan, &detail) {
                        debug!(guid = %detail.guid(), "Result is not of the searched type");
                        continue;
                    }
                    if seen.insert(detail.guid().to_string()) {
                        results.push(detail);
                    }
                }
            }
        }
        sort_instances(
            &mut results,
            paging.sequencing_order,
            paging.sequencing_property.as_deref(),
        );
        page(results, paging)
    }

    fn run(&self, sub_query: &SubQuery) -> Vec<CatalogObject> {
        match self
            .catalog
            .list_by_filter(&sub_query.query, &sub_query.attribute_filter)
        {
            Ok(objects) => objects,
            Err(e) => {
                warn!(
                    filter = ?sub_query.query.filter.as_ref().map(ToString::to_string),
                    error = %e,
                    "Sub-query failed, skipping its results"
                );
                Vec::new()
            }
        }
    }

    fn translate(&self, sub_query: &SubQuery, object: &CatalogObject) -> Vec<EntityDetail> {
        let catalog_type = object.type_name().unwrap_or_default();
        sub_query
            .prefixes_for(&catalog_type)
            .into_iter()
            .filter_map(|prefix| {
                match EntityTranslator::new(self.context, object, prefix).detail() {
                    Ok(detail) => detail,
                    Err(e) => {
                        warn!(guid = %object.guid(), prefix = ?prefix, error = %e, "Dropping untranslatable result");
                        None
                    }
                }
            })
            .collect()
    }

    fn expected(&self, plan: &SearchPlan, detail: &EntityDetail) -> bool {
        match &plan.expected_type {
            Some(expected) => self
                .context
                .registry
                .is_subtype_of(detail.header.type_name(), expected),
            None => true,
        }
    }
}
