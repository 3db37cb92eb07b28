//! # dossier-schema
//!
//! Typed model of report config documents: data points, visualizations,
//! pages and their blocks, plus the diagnostics every stage reports.
//!
//! The other dossier crates build on these types. Parsing lives here because
//! node-level checks are part of the model; document-scope checks live in
//! `dossier-validate`.

pub mod datapoint;
pub mod date;
pub mod document;
pub mod error;
pub mod hook;
pub mod index;
pub mod page;
pub mod parse;
pub mod report;
pub mod shape;
pub mod table;
pub mod visualization;

pub use document::ReportConfig;
pub use error::{DossierError, DossierResult, SchemaError, ShapeMismatch, ValidationError};
pub use parse::{parse_document, parse_document_str, ParseOptions, UnknownFields};
pub use report::{Issue, ValidationReport};

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use datapoint::{DataPointKind, DataPointType};
    use date::DateLike;
    use index::DocumentIndex;
    use page::Block;

    fn survey() -> Value {
        json!({
            "name": "District survey",
            "dataPoints": [
                { "id": "consent", "type": "choice", "label": "Consent?",
                  "valueOptions": { "options": ["yes", "no"] } },
                { "id": "weight", "type": "number", "label": "Weight",
                  "valueOption": { "unit": "kg" } },
                { "id": "visits", "type": "time", "label": "Visits",
                  "value": ["2024-03", "2024-04"],
                  "valueOptions": { "timeType": "month" } },
                { "id": "season", "type": "time-range", "label": "Season",
                  "value": ["2024-01-01", "2024-02-01", "2024-06-30"],
                  "valueOptions": { "timeType": "date" } },
                { "id": "districts", "type": "table", "label": "Districts",
                  "value": [ { "district": "North", "status": "open" } ],
                  "valueOptions": {
                      "namedIndexesColumn": { "headerName": "#", "labels": ["A", "B"] },
                      "columns": [
                          { "field": "district", "headerName": "District", "input": { "type": "text" } },
                          { "field": "status", "headerName": "Status",
                            "input": { "type": "choice", "valueOptions": { "options": ["open", "closed"] } } }
                      ] } }
            ],
            "pages": [
                { "id": "overview", "description": "Summary", "withNavigation": true, "blocks": [
                    { "type": "dashboard", "name": "Progress", "segments": [
                        { "title": "Collection", "pageLink": "details", "visualizations": [
                            { "type": "progress", "value": [3, 10] },
                            { "type": "barChart", "aggregationFunction": "visitsPerMonth",
                              "visualizationOptions": { "direction": "horizontal" } }
                        ] }
                    ] }
                ] },
                { "id": "details", "description": "Answers", "entityPath": ["north"], "blocks": [
                    { "type": "questionnaire", "name": "Answers", "sections": [
                        { "name": "General", "cards": [
                            { "dataPointIDs": ["consent", "weight"], "showCondition": "hasConsent" }
                        ] }
                    ] }
                ] }
            ],
            "mainPage": "overview"
        })
    }

    // ── Parsing ──────────────────────────────────────────────────────────────

    #[test]
    fn survey_parses_into_typed_nodes() {
        let doc = parse_document(&survey(), ParseOptions::default()).unwrap();

        let types: Vec<DataPointType> = doc.data_points.iter().map(|d| d.data_point_type()).collect();
        assert_eq!(
            types,
            vec![
                DataPointType::Choice,
                DataPointType::Number,
                DataPointType::Time,
                DataPointType::TimeRange,
                DataPointType::Table,
            ]
        );
        assert!(matches!(doc.pages[0].blocks[0], Block::Dashboard(_)));
        assert!(matches!(doc.pages[1].blocks[0], Block::Questionnaire(_)));
        assert!(doc.schema_issues().is_empty());
    }

    #[test]
    fn time_range_keeps_first_and_last_elements() {
        let doc = parse_document(&survey(), ParseOptions::default()).unwrap();
        let DataPointKind::TimeRange { value, .. } = &doc.data_points[3].kind else {
            panic!("expected a time-range data point");
        };
        let range = value.0.expect("range should be present");
        assert_eq!(range.start, "2024-01-01".parse::<DateLike>().unwrap());
        assert_eq!(range.end, "2024-06-30".parse::<DateLike>().unwrap());
    }

    // ── Serialization ────────────────────────────────────────────────────────

    #[test]
    fn serialized_document_reparses_to_the_same_model() {
        let doc = parse_document(&survey(), ParseOptions::default()).unwrap();
        let written = doc.to_json_string().unwrap();
        let reparsed = parse_document_str(&written, ParseOptions::default()).unwrap();
        assert_eq!(doc, reparsed);

        let raw: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(raw["dataPoints"][1]["valueOptions"]["unit"], "kg");
        assert_eq!(raw["dataPoints"][3]["value"], json!(["2024-01-01", "2024-06-30"]));
        assert_eq!(
            raw["pages"][0]["blocks"][0]["segments"][0]["visualizations"][0]["value"],
            json!({ "values": [3.0, 10.0] })
        );
    }

    // ── Index ────────────────────────────────────────────────────────────────

    #[test]
    fn index_resolves_ids_and_keeps_first_duplicate() {
        let mut doc = parse_document(&survey(), ParseOptions::default()).unwrap();
        let mut shadow = doc.data_points[1].clone();
        shadow.label = "Shadow".to_string();
        doc.data_points.push(shadow);

        let index = DocumentIndex::build(&doc);
        assert!(index.has_page("details"));
        assert!(!index.has_page("missing"));
        assert_eq!(index.data_point("weight").map(|d| d.label.as_str()), Some("Weight"));
        assert_eq!(index.page("overview").map(|p| p.with_navigation), Some(true));
    }

    // ── Reports ──────────────────────────────────────────────────────────────

    #[test]
    fn report_truncation_counts_dropped_issues() {
        let issues = (0..5)
            .map(|i| {
                Issue::from(ValidationError::DanglingMainPage {
                    main_page: format!("p{i}"),
                })
            })
            .collect();
        let mut report = ValidationReport::from_issues(issues);
        report.truncate(2);

        assert!(!report.passed);
        assert_eq!(report.issues.len(), 2);
        assert_eq!(report.truncated, 3);
        assert_eq!(
            report.summary(),
            "document: mainPage 'p0' does not match any page id; \
             document: mainPage 'p1' does not match any page id"
        );
    }

    #[test]
    fn issues_serialize_with_stage_and_kind() {
        let issue = Issue::from(SchemaError::MissingField {
            path: "pages[0]".to_string(),
            field: "blocks".to_string(),
        });
        assert_eq!(
            serde_json::to_value(&issue).unwrap(),
            json!({ "stage": "schema", "error": {
                "kind": "missing_field", "path": "pages[0]", "field": "blocks" } })
        );
        assert!(ValidationReport::passed().passed);
    }
}
