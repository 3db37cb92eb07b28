//! The binder: turns a validated document into a render model.
//!
//! The binder enforces the binding pipeline:
//!
//!   Validate → Data points → Pages (blocks → segments → visualizations)
//!
//! Nothing is bound unless the validator passes the whole document. After
//! that, every entry binds independently: a value that breaks its contract
//! marks only that entry as errored.

use dossier_schema::{
    datapoint::DataPointConfig,
    hook::HookName,
    page::{Block, Page},
    visualization::{VisualizationConfig, VisualizationKey},
    DossierError, DossierResult, ReportConfig,
};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::{
    render::{
        Binding, RenderBlock, RenderCard, RenderDataPoint, RenderModel, RenderPage, RenderSection,
        RenderSegment, RenderVisualization,
    },
    traits::{DocumentValidator, ValueResolver},
};

/// Binds documents against values supplied by the rendering layer.
///
/// The binder owns the trusted validator and runs it on every call to
/// `bind()`, so an unvalidated document can never reach the render model.
pub struct Binder {
    validator: Box<dyn DocumentValidator>,
    parallel: bool,
}

impl Binder {
    /// Create a binder that binds pages on the rayon pool.
    pub fn new(validator: Box<dyn DocumentValidator>) -> Self {
        Self {
            validator,
            parallel: true,
        }
    }

    /// Bind pages on the calling thread only when `parallel` is false.
    /// Output is identical either way.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Validate `doc` and bind every data point and visualization.
    ///
    /// # Errors
    ///
    /// Returns `DossierError::InvalidDocument` when validation fails and
    /// propagates validator errors. Shape mismatches in supplied values are
    /// NOT errors: they appear as `Binding::Errored` entries in the model.
    pub fn bind(&self, doc: &ReportConfig, values: &dyn ValueResolver) -> DossierResult<RenderModel> {
        debug!(document = %doc.name, parallel = self.parallel, "binding starting");

        // ── Step 1: Validation gate ──────────────────────────────────────────
        let report = self.validator.validate(doc)?;
        if !report.passed {
            let summary = report.summary();
            warn!(
                document = %doc.name,
                issues = report.issues.len(),
                summary = %summary,
                "document failed validation, nothing bound"
            );
            return Err(DossierError::InvalidDocument {
                count: report.issues.len() + report.truncated,
                summary,
            });
        }

        // ── Step 2: Data points ──────────────────────────────────────────────
        let data_points: Vec<RenderDataPoint> = doc
            .data_points
            .iter()
            .map(|dp| bind_data_point(dp, values))
            .collect();

        // ── Step 3: Pages ────────────────────────────────────────────────────
        //
        // Pages are independent; collect keeps document order on the pool.
        let pages: Vec<RenderPage> = if self.parallel {
            doc.pages
                .par_iter()
                .map(|page| bind_page(page, values))
                .collect::<DossierResult<_>>()?
        } else {
            doc.pages
                .iter()
                .map(|page| bind_page(page, values))
                .collect::<DossierResult<_>>()?
        };

        let model = RenderModel {
            name: doc.name.clone(),
            main_page: doc.main_page.clone(),
            data_points,
            pages,
        };

        let errored = model.errored_count();
        if errored > 0 {
            warn!(document = %doc.name, errored, "some entries could not be bound");
        }
        info!(
            document = %doc.name,
            data_points = model.data_points.len(),
            pages = model.pages.len(),
            errored,
            "document bound"
        );

        Ok(model)
    }
}

fn bind_data_point(dp: &DataPointConfig, values: &dyn ValueResolver) -> RenderDataPoint {
    let binding = match values.data_point_value(&dp.id) {
        Some(raw) => match dp.coerce_value(&raw) {
            Ok(value) => Binding::Resolved { value },
            Err(errors) => {
                warn!(
                    data_point = %dp.id,
                    errors = errors.len(),
                    "data point value breaks its contract"
                );
                Binding::Errored { errors }
            }
        },
        None => match dp.stored_value() {
            Some(value) => Binding::Resolved { value },
            None => Binding::Missing,
        },
    };

    RenderDataPoint {
        id: dp.id.clone(),
        data_point_type: dp.data_point_type(),
        label: dp.label.clone(),
        multiple: dp.multiple,
        binding,
    }
}

fn bind_page(page: &Page, values: &dyn ValueResolver) -> DossierResult<RenderPage> {
    let placeholder = page.placeholder_function.as_ref().and_then(|hook| {
        let text = values.resolve_placeholder(hook);
        if text.is_none() {
            debug!(page = %page.id, hook = %hook, "placeholder did not resolve");
        }
        text
    });

    let mut blocks = Vec::with_capacity(page.blocks.len());
    for (b, block) in page.blocks.iter().enumerate() {
        blocks.push(match block {
            Block::Dashboard(dashboard) => {
                let mut segments = Vec::with_capacity(dashboard.segments.len());
                for (s, segment) in dashboard.segments.iter().enumerate() {
                    let mut visualizations = Vec::with_capacity(segment.visualizations.len());
                    for (i, vis) in segment.visualizations.iter().enumerate() {
                        let key = VisualizationKey {
                            page: page.id.clone(),
                            block: b,
                            segment: s,
                            index: i,
                        };
                        visualizations.push(bind_visualization(key, vis, values)?);
                    }
                    segments.push(RenderSegment {
                        title: segment.title.clone(),
                        page_link: segment.page_link.clone(),
                        visualizations,
                    });
                }
                RenderBlock::Dashboard {
                    name: dashboard.name.clone(),
                    segments,
                }
            }
            Block::Questionnaire(questionnaire) => RenderBlock::Questionnaire {
                name: questionnaire.name.clone(),
                sections: questionnaire
                    .sections
                    .iter()
                    .map(|section| RenderSection {
                        name: section.name.clone(),
                        cards: section
                            .cards
                            .iter()
                            .map(|card| RenderCard {
                                name: card.name.clone(),
                                data_point_ids: card.data_point_ids.clone(),
                                visible: card
                                    .show_condition
                                    .as_ref()
                                    .map_or(true, |hook| condition_holds(&page.id, hook, values)),
                            })
                            .collect(),
                    })
                    .collect(),
            },
        });
    }

    Ok(RenderPage {
        id: page.id.clone(),
        name: page.name.clone(),
        entity_path: page.entity_path.clone(),
        description: page.description.clone(),
        with_navigation: page.with_navigation,
        placeholder,
        blocks,
    })
}

/// An unevaluated condition leaves the card visible.
fn condition_holds(page: &str, hook: &HookName, values: &dyn ValueResolver) -> bool {
    values.evaluate_condition(hook).unwrap_or_else(|| {
        debug!(page = %page, hook = %hook, "show condition did not resolve");
        true
    })
}

fn bind_visualization(
    key: VisualizationKey,
    vis: &VisualizationConfig,
    values: &dyn ValueResolver,
) -> DossierResult<RenderVisualization> {
    // Computed values win over literals.
    let binding = match values.visualization_value(&key) {
        Some(raw) => match vis.kind.coerce_value(&raw) {
            Ok(value) => Binding::Resolved { value },
            Err(errors) => {
                warn!(
                    visualization = %key,
                    errors = errors.len(),
                    "computed value breaks its contract"
                );
                Binding::Errored { errors }
            }
        },
        None => match vis.kind.literal() {
            Some(value) => Binding::Resolved { value },
            None => Binding::Missing,
        },
    };

    let options = serde_json::to_value(&vis.kind)?
        .get("visualizationOptions")
        .cloned();

    Ok(RenderVisualization {
        visualization_type: vis.kind.visualization_type(),
        aggregation_function: vis.aggregation_function.clone(),
        options,
        binding,
        key,
    })
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use dossier_schema::{
        datapoint::DataPointValue,
        error::ValidationError,
        parse_document,
        shape::ProgressValue,
        visualization::VisualizationValue,
        DossierError, DossierResult, ParseOptions, ReportConfig, ShapeMismatch, ValidationReport,
    };
    use serde_json::{json, Value};

    use crate::{
        render::Binding,
        resolver::StaticValues,
        traits::DocumentValidator,
    };

    use super::*;

    // ── Mock helpers ─────────────────────────────────────────────────────────

    /// A validator that returns a pre-configured report.
    struct MockValidator {
        report: ValidationReport,
    }

    impl MockValidator {
        fn passing() -> Box<Self> {
            Box::new(Self {
                report: ValidationReport::passed(),
            })
        }

        fn failing() -> Box<Self> {
            Box::new(Self {
                report: ValidationReport::from_issues(vec![ValidationError::DanglingMainPage {
                    main_page: "nowhere".to_string(),
                }
                .into()]),
            })
        }
    }

    impl DocumentValidator for MockValidator {
        fn validate(&self, _doc: &ReportConfig) -> DossierResult<ValidationReport> {
            Ok(self.report.clone())
        }
    }

    fn document() -> ReportConfig {
        let raw: Value = json!({
            "name": "Field report",
            "dataPoints": [
                { "id": "consent", "type": "choice", "label": "Consent?",
                  "valueOptions": { "options": ["yes", "no"] } },
                { "id": "visits", "type": "time", "label": "Visits",
                  "value": ["2024-05"], "valueOptions": { "timeType": "month" } },
                { "id": "notes", "type": "text", "label": "Notes" }
            ],
            "pages": [
                { "id": "overview", "description": "Overview",
                  "placeholderFunction": "districtName", "blocks": [
                    { "type": "dashboard", "name": "Status", "segments": [
                        { "title": "Progress", "pageLink": "answers", "visualizations": [
                            { "type": "progress", "aggregationFunction": "completion" },
                            { "type": "donutChart", "value": 0.4 },
                            { "type": "text" }
                        ] }
                    ] }
                ] },
                { "id": "answers", "description": "Answers", "blocks": [
                    { "type": "questionnaire", "name": "Consent", "sections": [
                        { "cards": [
                            { "name": "Ask", "dataPointIDs": ["consent"], "showCondition": "isAdult" },
                            { "dataPointIDs": ["notes"], "showCondition": "unknownHook" }
                        ] }
                    ] }
                ] }
            ],
            "mainPage": "overview"
        });
        parse_document(&raw, ParseOptions::default()).unwrap()
    }

    fn key(index: usize) -> VisualizationKey {
        VisualizationKey {
            page: "overview".to_string(),
            block: 0,
            segment: 0,
            index,
        }
    }

    fn binder() -> Binder {
        Binder::new(MockValidator::passing())
    }

    // ── Validation gate ──────────────────────────────────────────────────────

    #[test]
    fn invalid_document_is_not_bound() {
        let err = Binder::new(MockValidator::failing())
            .bind(&document(), &StaticValues::default())
            .unwrap_err();
        match err {
            DossierError::InvalidDocument { count, summary } => {
                assert_eq!(count, 1);
                assert!(summary.contains("nowhere"));
            }
            other => panic!("expected InvalidDocument, got {other:?}"),
        }
    }

    // ── Data points ──────────────────────────────────────────────────────────

    #[test]
    fn choice_value_resolves_only_when_it_is_an_option() {
        let doc = document();

        let model = binder()
            .bind(&doc, &StaticValues::default().with_data_point("consent", json!("yes")))
            .unwrap();
        assert_eq!(
            model.data_point("consent").unwrap().binding,
            Binding::Resolved { value: DataPointValue::Text("yes".to_string()) }
        );

        let model = binder()
            .bind(&doc, &StaticValues::default().with_data_point("consent", json!("maybe")))
            .unwrap();
        assert_eq!(
            model.data_point("consent").unwrap().binding,
            Binding::Errored {
                errors: vec![ShapeMismatch::NotAnOption { value: "maybe".to_string() }]
            }
        );
        // The rest of the document still binds.
        assert!(model.data_point("visits").unwrap().binding.is_resolved());
        assert_eq!(model.errored_count(), 1);
    }

    #[test]
    fn stored_values_fill_in_and_others_are_missing() {
        let model = binder().bind(&document(), &StaticValues::default()).unwrap();
        assert!(matches!(
            model.data_point("visits").unwrap().binding,
            Binding::Resolved { value: DataPointValue::Dates(ref d) } if d.len() == 1
        ));
        assert_eq!(model.data_point("notes").unwrap().binding, Binding::Missing);
    }

    // ── Visualizations ───────────────────────────────────────────────────────

    #[test]
    fn progress_value_is_shape_checked() {
        let doc = document();

        let model = binder()
            .bind(&doc, &StaticValues::default().with_visualization(key(0), json!([3, 5])))
            .unwrap();
        assert_eq!(
            model.visualization(&key(0)).unwrap().binding,
            Binding::Resolved {
                value: VisualizationValue::Progress(ProgressValue { completed: 3.0, total: 5.0 })
            }
        );

        let model = binder()
            .bind(&doc, &StaticValues::default().with_visualization(key(0), json!([6, 5])))
            .unwrap();
        assert!(matches!(
            &model.visualization(&key(0)).unwrap().binding,
            Binding::Errored { errors } if matches!(errors[..], [ShapeMismatch::CompletedExceedsTotal { .. }])
        ));
    }

    #[test]
    fn computed_value_wins_over_literal() {
        let doc = document();

        let model = binder().bind(&doc, &StaticValues::default()).unwrap();
        assert!(matches!(
            model.visualization(&key(1)).unwrap().binding,
            Binding::Resolved { value: VisualizationValue::Donut(d) } if d.0 == 0.4
        ));
        assert_eq!(model.visualization(&key(2)).unwrap().binding, Binding::Missing);

        let model = binder()
            .bind(&doc, &StaticValues::default().with_visualization(key(1), json!(0.9)))
            .unwrap();
        assert!(matches!(
            model.visualization(&key(1)).unwrap().binding,
            Binding::Resolved { value: VisualizationValue::Donut(d) } if d.0 == 0.9
        ));
    }

    // ── Hooks ────────────────────────────────────────────────────────────────

    #[test]
    fn hooks_are_resolved_through_the_resolver() {
        let values = StaticValues::default()
            .with_condition("isAdult", false)
            .with_placeholder("districtName", "North");
        let model = binder().bind(&document(), &values).unwrap();

        assert_eq!(model.pages[0].placeholder.as_deref(), Some("North"));
        let RenderBlock::Questionnaire { sections, .. } = &model.pages[1].blocks[0] else {
            panic!("expected a questionnaire block");
        };
        assert!(!sections[0].cards[0].visible);
        // Unresolved conditions leave the card visible.
        assert!(sections[0].cards[1].visible);
    }

    // ── Determinism ──────────────────────────────────────────────────────────

    #[test]
    fn binding_twice_yields_identical_fingerprints() {
        let doc = document();
        let values = StaticValues::default()
            .with_data_point("consent", json!("no"))
            .with_visualization(key(0), json!({ "values": [1, 4] }));

        let first = binder().bind(&doc, &values).unwrap();
        let second = binder().bind(&doc, &values).unwrap();
        let sequential = binder().with_parallel(false).bind(&doc, &values).unwrap();

        assert_eq!(first, second);
        assert_eq!(first, sequential);
        let fingerprint = first.fingerprint().unwrap();
        assert_eq!(fingerprint, second.fingerprint().unwrap());
        assert_eq!(fingerprint.len(), 64);
    }

    #[test]
    fn render_model_carries_visualization_options() {
        let model = binder().bind(&document(), &StaticValues::default()).unwrap();
        let progress = model.visualization(&key(0)).unwrap();
        assert_eq!(progress.options, Some(json!({})));
        assert_eq!(
            progress.aggregation_function.as_ref().map(|h| h.as_str()),
            Some("completion")
        );
        assert_eq!(
            serde_json::to_value(progress).unwrap()["key"],
            json!("overview/0/0/0")
        );
    }
}
