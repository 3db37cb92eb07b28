//! Trait seams between the binder and its collaborators.
//!
//! - `DocumentValidator` — trusted checker run before anything is bound
//! - `ValueResolver`     — the rendering layer, which owns every hook and
//!   every computed value
//!
//! The binder never evaluates a hook itself. It asks the resolver, and a
//! resolver that cannot answer returns `None`.

use dossier_schema::{
    hook::HookName, visualization::VisualizationKey, DossierResult, ReportConfig,
    ValidationReport,
};
use serde_json::Value;

/// Whole-document validation.
///
/// Implementations must be deterministic: the same document always yields
/// the same report, with issues in document order.
pub trait DocumentValidator: Send + Sync {
    /// Validate `doc` and report every issue found.
    ///
    /// A failing document is an `Ok` report with `passed = false`. `Err` is
    /// reserved for failures of the validator itself.
    fn validate(&self, doc: &ReportConfig) -> DossierResult<ValidationReport>;
}

/// Source of computed values and hook results.
///
/// Values are returned as raw JSON; the binder checks them against the
/// shape their data point or visualization declares.
pub trait ValueResolver: Send + Sync {
    /// The current value of a data point, if the rendering layer has one.
    fn data_point_value(&self, id: &str) -> Option<Value>;

    /// The value computed for the visualization at `key`, typically by
    /// running its aggregation function.
    fn visualization_value(&self, key: &VisualizationKey) -> Option<Value>;

    /// Evaluate a card's `showCondition`.
    fn evaluate_condition(&self, hook: &HookName) -> Option<bool>;

    /// Resolve a page's `placeholderFunction` to display text.
    fn resolve_placeholder(&self, hook: &HookName) -> Option<String>;
}
