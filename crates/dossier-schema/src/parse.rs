//! Node-by-node parsing of raw documents.
//!
//! Parsing walks the raw JSON tree and builds typed nodes bottom-up. Every
//! node is checked for its discriminant, its required fields and fields that
//! belong to no member of its variant before serde converts it. A failing
//! node records its errors and parsing carries on with its siblings, so one
//! pass reports every malformed node in the document.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{
    datapoint::{DataPointConfig, DataPointType},
    document::ReportConfig,
    error::{json_kind, SchemaError},
    hook::HookName,
    page::{
        check_entity_path, Block, DashboardBlock, Page, QuestionnaireBlock, QuestionnaireCardConfig,
        QuestionnaireSectionConfig, SegmentConfig,
    },
    visualization::{VisualizationConfig, VisualizationType},
};

/// What to do with fields that belong to no member of a node's variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownFields {
    /// Report a `SchemaError::UnexpectedField`.
    #[default]
    Deny,
    /// Log a warning and ignore the field.
    Warn,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    pub unknown_fields: UnknownFields,
}

/// Parse a whole document, collecting every node-level error.
pub fn parse_document(raw: &Value, options: ParseOptions) -> Result<ReportConfig, Vec<SchemaError>> {
    let mut parser = Parser::new(options);
    let doc = parser.document(raw);
    parser.finish(doc)
}

/// Parse a document from JSON text.
pub fn parse_document_str(json: &str, options: ParseOptions) -> Result<ReportConfig, Vec<SchemaError>> {
    let raw: Value = serde_json::from_str(json).map_err(|e| {
        vec![SchemaError::InvalidField {
            path: "$".to_string(),
            message: format!("document is not valid JSON: {e}"),
        }]
    })?;
    parse_document(&raw, options)
}

/// Parse a single data point.
pub fn parse_data_point(
    raw: &Value,
    path: &str,
    options: ParseOptions,
) -> Result<DataPointConfig, Vec<SchemaError>> {
    let mut parser = Parser::new(options);
    let dp = parser.data_point(raw, path);
    parser.finish(dp)
}

/// Parse a single visualization.
pub fn parse_visualization(
    raw: &Value,
    path: &str,
    options: ParseOptions,
) -> Result<VisualizationConfig, Vec<SchemaError>> {
    let mut parser = Parser::new(options);
    let vis = parser.visualization(raw, path);
    parser.finish(vis)
}

// ── Field tables ──────────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
struct Fields {
    required: &'static [&'static str],
    optional: &'static [&'static str],
}

impl Fields {
    const fn new(required: &'static [&'static str], optional: &'static [&'static str]) -> Self {
        Self { required, optional }
    }

    fn allows(&self, key: &str) -> bool {
        self.required.contains(&key) || self.optional.contains(&key)
    }
}

const DOCUMENT: Fields = Fields::new(&["name", "dataPoints", "pages", "mainPage"], &[]);
const PAGE: Fields = Fields::new(
    &["id", "description", "blocks"],
    &["name", "entityPath", "placeholderFunction", "withNavigation"],
);
const DASHBOARD: Fields = Fields::new(&["type", "name", "segments"], &[]);
const QUESTIONNAIRE: Fields = Fields::new(&["type", "name", "sections"], &[]);
const SEGMENT: Fields = Fields::new(&["title", "visualizations", "pageLink"], &[]);
const SECTION: Fields = Fields::new(&["cards"], &["name"]);
const CARD: Fields = Fields::new(&["dataPointIDs"], &["name", "showCondition"]);
const TABLE_COLUMN: Fields = Fields::new(&["field", "headerName", "input"], &[]);
const NAMED_INDEXES: Fields = Fields::new(&["headerName", "labels"], &[]);
const VISUALIZATION_COLUMN: Fields = Fields::new(&["field", "headerName", "type"], &[]);

/// Fields of a data point node and of its `valueOptions` bag.
fn data_point_fields(t: DataPointType) -> (Fields, Fields) {
    const WITH_OPTIONS: &[&str] = &["id", "type", "label", "valueOptions"];
    match t {
        DataPointType::Text => (
            Fields::new(&["id", "type", "label"], &["multiple", "valueOptions"]),
            Fields::new(&[], &["multiline"]),
        ),
        DataPointType::Number => (
            Fields::new(&["id", "type", "label"], &["multiple", "valueOptions", "valueOption"]),
            Fields::new(&[], &["unit"]),
        ),
        DataPointType::Choice => (
            Fields::new(WITH_OPTIONS, &["multiple"]),
            Fields::new(&["options"], &[]),
        ),
        DataPointType::Table => (
            Fields::new(WITH_OPTIONS, &["multiple", "value"]),
            Fields::new(&["columns"], &["namedIndexesColumn"]),
        ),
        DataPointType::Address => (
            Fields::new(WITH_OPTIONS, &["multiple"]),
            Fields::new(&["addressType"], &[]),
        ),
        DataPointType::File => (
            Fields::new(WITH_OPTIONS, &["multiple", "value"]),
            Fields::new(&["fileTypes"], &[]),
        ),
        DataPointType::Time | DataPointType::TimeRange => (
            Fields::new(WITH_OPTIONS, &["multiple", "value"]),
            Fields::new(&["timeType"], &[]),
        ),
    }
}

/// Fields of a table cell config and of its `valueOptions` bag.
fn cell_fields(tag: &str) -> Option<(Fields, Fields)> {
    Some(match tag {
        "text" => (
            Fields::new(&["type"], &["multiple", "valueOptions"]),
            Fields::new(&[], &["multiline"]),
        ),
        "time" => (
            Fields::new(&["type"], &["valueOptions"]),
            Fields::new(&[], &["timeType"]),
        ),
        "number" => (
            Fields::new(&["type", "valueOptions"], &[]),
            Fields::new(&[], &["unit"]),
        ),
        "choice" => (
            Fields::new(&["type", "valueOptions"], &["multiple"]),
            Fields::new(&["options"], &[]),
        ),
        _ => return None,
    })
}

/// Fields of a visualization node and of its `visualizationOptions` bag.
fn visualization_fields(t: VisualizationType) -> (Fields, Fields) {
    const OPTIONAL: &[&str] = &["value", "visualizationOptions", "aggregationFunction"];
    match t {
        VisualizationType::Progress => (
            Fields::new(&["type"], OPTIONAL),
            Fields::new(&[], &["label", "size"]),
        ),
        VisualizationType::DonutChart => (
            Fields::new(&["type"], OPTIONAL),
            Fields::new(&[], &["label"]),
        ),
        VisualizationType::Text => (
            Fields::new(&["type"], OPTIONAL),
            Fields::new(&[], &["label", "size"]),
        ),
        VisualizationType::BarChart => (
            Fields::new(&["type"], OPTIONAL),
            Fields::new(&[], &["valuesAxisLabel", "labelsAxisLabel", "direction"]),
        ),
        VisualizationType::LineChart => (
            Fields::new(&["type"], OPTIONAL),
            Fields::new(&[], &["valuesAxisLabel", "labelsAxisLabel"]),
        ),
        VisualizationType::Table => (
            Fields::new(
                &["type", "visualizationOptions"],
                &["value", "aggregationFunction"],
            ),
            Fields::new(&["columns"], &[]),
        ),
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn at(path: &str) -> String {
    if path.is_empty() {
        "$".to_string()
    } else {
        path.to_string()
    }
}

// ── Parser ────────────────────────────────────────────────────────────────────

/// Parser state: the options in force and every error recorded so far.
///
/// Node methods return `None` when the node could not be built. The reason
/// is always recorded in `errors` first.
struct Parser {
    options: ParseOptions,
    errors: Vec<SchemaError>,
}

impl Parser {
    fn new(options: ParseOptions) -> Self {
        Self {
            options,
            errors: Vec::new(),
        }
    }

    fn finish<T>(mut self, node: Option<T>) -> Result<T, Vec<SchemaError>> {
        match node {
            Some(node) if self.errors.is_empty() => Ok(node),
            _ => {
                if self.errors.is_empty() {
                    self.errors.push(SchemaError::InvalidField {
                        path: "$".to_string(),
                        message: "document could not be parsed".to_string(),
                    });
                }
                Err(self.errors)
            }
        }
    }

    // ── Diagnostic helpers ────────────────────────────────────────────────────

    fn invalid(&mut self, path: &str, expected: &str, found: &Value) {
        self.errors.push(SchemaError::InvalidField {
            path: at(path),
            message: format!("expected {expected}, found {}", json_kind(found)),
        });
    }

    /// Record missing required fields and fields outside the node's variant.
    ///
    /// Returns false when the node cannot be built.
    fn check_fields(&mut self, obj: &Map<String, Value>, path: &str, fields: Fields) -> bool {
        let mut ok = true;

        for field in fields.required {
            if !obj.contains_key(*field) {
                self.errors.push(SchemaError::MissingField {
                    path: at(path),
                    field: field.to_string(),
                });
                ok = false;
            }
        }

        for key in obj.keys() {
            if fields.allows(key) {
                continue;
            }
            match self.options.unknown_fields {
                UnknownFields::Deny => {
                    self.errors.push(SchemaError::UnexpectedField {
                        path: at(path),
                        field: key.clone(),
                    });
                    ok = false;
                }
                UnknownFields::Warn => {
                    warn!(path = %at(path), field = %key, "ignoring unexpected field");
                }
            }
        }

        ok
    }

    // ── Field accessors ───────────────────────────────────────────────────────
    //
    // Absent required fields were already reported by `check_fields`, so the
    // accessors return `None` for them without recording anything.

    fn object<'v>(&mut self, raw: &'v Value, path: &str) -> Option<&'v Map<String, Value>> {
        match raw {
            Value::Object(obj) => Some(obj),
            other => {
                self.invalid(path, "an object", other);
                None
            }
        }
    }

    fn tag<'v>(&mut self, obj: &'v Map<String, Value>, path: &str) -> Option<&'v str> {
        match obj.get("type") {
            None => {
                self.errors.push(SchemaError::MissingField {
                    path: at(path),
                    field: "type".to_string(),
                });
                None
            }
            Some(Value::String(tag)) => Some(tag),
            Some(other) => {
                self.invalid(&join(path, "type"), "a string", other);
                None
            }
        }
    }

    fn unknown_variant(&mut self, path: &str, family: &str, found: &str) {
        self.errors.push(SchemaError::UnknownVariant {
            path: at(path),
            family: family.to_string(),
            found: found.to_string(),
        });
    }

    fn string(&mut self, obj: &Map<String, Value>, key: &str, path: &str) -> Option<String> {
        match obj.get(key)? {
            Value::String(s) => Some(s.clone()),
            other => {
                self.invalid(&join(path, key), "a string", other);
                None
            }
        }
    }

    fn opt_string(&mut self, obj: &Map<String, Value>, key: &str, path: &str) -> Option<Option<String>> {
        match obj.get(key) {
            None | Some(Value::Null) => Some(None),
            Some(Value::String(s)) => Some(Some(s.clone())),
            Some(other) => {
                self.invalid(&join(path, key), "a string", other);
                None
            }
        }
    }

    fn opt_hook(&mut self, obj: &Map<String, Value>, key: &str, path: &str) -> Option<Option<HookName>> {
        self.opt_string(obj, key, path)
            .map(|name| name.map(HookName))
    }

    fn opt_bool(&mut self, obj: &Map<String, Value>, key: &str, path: &str) -> Option<bool> {
        match obj.get(key) {
            None | Some(Value::Null) => Some(false),
            Some(Value::Bool(b)) => Some(*b),
            Some(other) => {
                self.invalid(&join(path, key), "a boolean", other);
                None
            }
        }
    }

    fn string_list(&mut self, obj: &Map<String, Value>, key: &str, path: &str) -> Option<Vec<String>> {
        let raw = obj.get(key)?;
        let list = raw
            .as_array()
            .and_then(|items| items.iter().map(|i| i.as_str().map(str::to_string)).collect());
        if list.is_none() {
            self.invalid(&join(path, key), "a sequence of strings", raw);
        }
        list
    }

    /// Parse every element of the array at `key`, carrying on past failures.
    fn each<T>(
        &mut self,
        obj: &Map<String, Value>,
        key: &str,
        path: &str,
        mut parse: impl FnMut(&mut Self, &Value, &str) -> Option<T>,
    ) -> Option<Vec<T>> {
        let items = match obj.get(key)? {
            Value::Array(items) => items,
            other => {
                self.invalid(&join(path, key), "a sequence", other);
                return None;
            }
        };

        let mut parsed = Vec::with_capacity(items.len());
        let mut ok = true;
        for (i, item) in items.iter().enumerate() {
            match parse(self, item, &format!("{}[{i}]", join(path, key))) {
                Some(node) => parsed.push(node),
                None => ok = false,
            }
        }
        ok.then_some(parsed)
    }

    fn typed<T: DeserializeOwned>(&mut self, raw: Value, path: &str) -> Option<T> {
        match serde_json::from_value(raw) {
            Ok(node) => Some(node),
            Err(e) => {
                self.errors.push(SchemaError::InvalidField {
                    path: at(path),
                    message: e.to_string(),
                });
                None
            }
        }
    }

    /// Check the options bag at `key`, if present.
    fn options_bag(&mut self, obj: &Map<String, Value>, key: &str, path: &str, fields: Fields) -> bool {
        match obj.get(key) {
            None => true,
            Some(bag) => {
                let bag_path = join(path, key);
                match self.object(bag, &bag_path) {
                    Some(bag) => self.check_fields(bag, &bag_path, fields),
                    None => false,
                }
            }
        }
    }

    // ── Document ──────────────────────────────────────────────────────────────

    fn document(&mut self, raw: &Value) -> Option<ReportConfig> {
        let obj = self.object(raw, "")?;
        self.check_fields(obj, "", DOCUMENT);

        let name = self.string(obj, "name", "");
        let data_points = self.each(obj, "dataPoints", "", Self::data_point);
        let pages = self.each(obj, "pages", "", Self::page);
        let main_page = self.string(obj, "mainPage", "");

        debug!(
            data_points = data_points.as_ref().map_or(0, Vec::len),
            pages = pages.as_ref().map_or(0, Vec::len),
            errors = self.errors.len(),
            "parsed document"
        );

        Some(ReportConfig {
            name: name?,
            data_points: data_points?,
            pages: pages?,
            main_page: main_page?,
        })
    }

    // ── Data points ───────────────────────────────────────────────────────────

    fn data_point(&mut self, raw: &Value, path: &str) -> Option<DataPointConfig> {
        let obj = self.object(raw, path)?;
        let tag = self.tag(obj, path)?;
        let Some(dp_type) = DataPointType::from_tag(tag) else {
            self.unknown_variant(path, "data point", tag);
            return None;
        };

        let (fields, option_fields) = data_point_fields(dp_type);
        let mut ok = self.check_fields(obj, path, fields);
        ok &= self.options_bag(obj, "valueOptions", path, option_fields);
        if dp_type == DataPointType::Number {
            ok &= self.options_bag(obj, "valueOption", path, option_fields);
        }
        if dp_type == DataPointType::Table {
            if let Some(Value::Object(bag)) = obj.get("valueOptions") {
                ok &= self.table_options(bag, &join(path, "valueOptions"));
            }
        }
        if !ok {
            return None;
        }

        let mut stripped = obj.clone();
        let literal = stripped.remove("value").filter(|v| !v.is_null());
        let mut dp: DataPointConfig = self.typed(Value::Object(stripped), path)?;

        if let Some(literal) = literal.filter(|_| fields.allows("value")) {
            if let Err(mismatches) = dp.set_stored_value(&literal) {
                let value_path = join(path, "value");
                self.errors.extend(mismatches.into_iter().map(|reason| SchemaError::InvalidValue {
                    path: value_path.clone(),
                    reason,
                }));
                return None;
            }
        }

        let issues = dp.check(path);
        if !issues.is_empty() {
            self.errors.extend(issues);
            return None;
        }
        Some(dp)
    }

    fn table_options(&mut self, bag: &Map<String, Value>, path: &str) -> bool {
        let mut ok = true;

        if let Some(named) = bag.get("namedIndexesColumn") {
            let named_path = join(path, "namedIndexesColumn");
            ok &= match self.object(named, &named_path) {
                Some(named) => self.check_fields(named, &named_path, NAMED_INDEXES),
                None => false,
            };
        }

        let Some(Value::Array(columns)) = bag.get("columns") else {
            return ok;
        };
        for (i, column) in columns.iter().enumerate() {
            let column_path = format!("{path}.columns[{i}]");
            let Some(column) = self.object(column, &column_path) else {
                ok = false;
                continue;
            };
            ok &= self.check_fields(column, &column_path, TABLE_COLUMN);
            if let Some(input) = column.get("input") {
                ok &= self.cell_config(input, &join(&column_path, "input"));
            }
        }
        ok
    }

    fn cell_config(&mut self, raw: &Value, path: &str) -> bool {
        let Some(obj) = self.object(raw, path) else {
            return false;
        };
        let Some(tag) = self.tag(obj, path) else {
            return false;
        };
        let Some((fields, option_fields)) = cell_fields(tag) else {
            self.unknown_variant(path, "table cell", tag);
            return false;
        };
        let ok = self.check_fields(obj, path, fields);
        ok & self.options_bag(obj, "valueOptions", path, option_fields)
    }

    // ── Visualizations ────────────────────────────────────────────────────────

    fn visualization(&mut self, raw: &Value, path: &str) -> Option<VisualizationConfig> {
        let obj = self.object(raw, path)?;
        let tag = self.tag(obj, path)?;
        let Some(vis_type) = VisualizationType::from_tag(tag) else {
            self.unknown_variant(path, "visualization", tag);
            return None;
        };

        let (fields, option_fields) = visualization_fields(vis_type);
        let mut ok = self.check_fields(obj, path, fields);
        ok &= self.options_bag(obj, "visualizationOptions", path, option_fields);
        if vis_type == VisualizationType::Table {
            let options_path = join(path, "visualizationOptions");
            if let Some(Value::Array(columns)) = obj
                .get("visualizationOptions")
                .and_then(|o| o.get("columns"))
            {
                for (i, column) in columns.iter().enumerate() {
                    let column_path = format!("{options_path}.columns[{i}]");
                    ok &= match self.object(column, &column_path) {
                        Some(column) => self.check_fields(column, &column_path, VISUALIZATION_COLUMN),
                        None => false,
                    };
                }
            }
        }
        if !ok {
            return None;
        }

        let mut stripped = obj.clone();
        let literal = stripped.remove("value").filter(|v| !v.is_null());
        let mut vis: VisualizationConfig = self.typed(Value::Object(stripped), path)?;

        let issues = vis.kind.check(path);
        if !issues.is_empty() {
            self.errors.extend(issues);
            return None;
        }

        if let Some(literal) = literal {
            match vis.kind.coerce_value(&literal) {
                Ok(value) => {
                    let stored = vis.kind.set_literal(value);
                    debug_assert!(stored, "coerced value must match its own variant");
                }
                Err(mismatches) => {
                    let value_path = join(path, "value");
                    self.errors.extend(mismatches.into_iter().map(|reason| {
                        SchemaError::InvalidValue {
                            path: value_path.clone(),
                            reason,
                        }
                    }));
                    return None;
                }
            }
        }

        Some(vis)
    }

    // ── Pages and blocks ──────────────────────────────────────────────────────

    fn page(&mut self, raw: &Value, path: &str) -> Option<Page> {
        let obj = self.object(raw, path)?;
        self.check_fields(obj, path, PAGE);

        let id = self.string(obj, "id", path);
        let name = self.opt_string(obj, "name", path);
        let entity_path = match obj.get("entityPath") {
            None | Some(Value::Null) => Some(Vec::new()),
            Some(_) => self.string_list(obj, "entityPath", path),
        };
        if let Some(entries) = &entity_path {
            self.errors.extend(check_entity_path(entries, path));
        }
        let description = self.string(obj, "description", path);
        let blocks = self.each(obj, "blocks", path, Self::block);
        let placeholder_function = self.opt_hook(obj, "placeholderFunction", path);
        let with_navigation = self.opt_bool(obj, "withNavigation", path);

        Some(Page {
            id: id?,
            name: name?,
            entity_path: entity_path?,
            description: description?,
            blocks: blocks?,
            placeholder_function: placeholder_function?,
            with_navigation: with_navigation?,
        })
    }

    fn block(&mut self, raw: &Value, path: &str) -> Option<Block> {
        let obj = self.object(raw, path)?;
        let tag = self.tag(obj, path)?;
        match tag {
            "dashboard" => {
                self.check_fields(obj, path, DASHBOARD);
                let name = self.string(obj, "name", path);
                let segments = self.each(obj, "segments", path, Self::segment);
                Some(Block::Dashboard(DashboardBlock {
                    name: name?,
                    segments: segments?,
                }))
            }
            "questionnaire" => {
                self.check_fields(obj, path, QUESTIONNAIRE);
                let name = self.string(obj, "name", path);
                let sections = self.each(obj, "sections", path, Self::section);
                Some(Block::Questionnaire(QuestionnaireBlock {
                    name: name?,
                    sections: sections?,
                }))
            }
            other => {
                self.unknown_variant(path, "block", other);
                None
            }
        }
    }

    fn segment(&mut self, raw: &Value, path: &str) -> Option<SegmentConfig> {
        let obj = self.object(raw, path)?;
        self.check_fields(obj, path, SEGMENT);

        let title = self.string(obj, "title", path);
        let visualizations = self.each(obj, "visualizations", path, Self::visualization);
        let page_link = self.string(obj, "pageLink", path);

        Some(SegmentConfig {
            title: title?,
            visualizations: visualizations?,
            page_link: page_link?,
        })
    }

    fn section(&mut self, raw: &Value, path: &str) -> Option<QuestionnaireSectionConfig> {
        let obj = self.object(raw, path)?;
        self.check_fields(obj, path, SECTION);

        let name = self.opt_string(obj, "name", path);
        let cards = self.each(obj, "cards", path, Self::card);

        Some(QuestionnaireSectionConfig {
            name: name?,
            cards: cards?,
        })
    }

    fn card(&mut self, raw: &Value, path: &str) -> Option<QuestionnaireCardConfig> {
        let obj = self.object(raw, path)?;
        self.check_fields(obj, path, CARD);

        let name = self.opt_string(obj, "name", path);
        let data_point_ids = self.string_list(obj, "dataPointIDs", path);
        let show_condition = self.opt_hook(obj, "showCondition", path);

        if data_point_ids.as_ref().is_some_and(Vec::is_empty) {
            self.errors.push(SchemaError::EmptyCollection {
                path: at(path),
                field: "dataPointIDs".to_string(),
            });
            return None;
        }

        Some(QuestionnaireCardConfig {
            name: name?,
            data_point_ids: data_point_ids?,
            show_condition: show_condition?,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn deny() -> ParseOptions {
        ParseOptions::default()
    }

    fn minimal_document() -> Value {
        json!({
            "name": "Site survey",
            "dataPoints": [
                { "id": "consent", "type": "choice", "label": "Consent?",
                  "valueOptions": { "options": ["yes", "no"] } }
            ],
            "pages": [
                { "id": "main", "description": "Entry", "blocks": [
                    { "type": "questionnaire", "name": "Intro", "sections": [
                        { "cards": [ { "dataPointIDs": ["consent"] } ] }
                    ] }
                ] }
            ],
            "mainPage": "main"
        })
    }

    #[test]
    fn parses_a_minimal_document() {
        let doc = parse_document(&minimal_document(), deny()).unwrap();
        assert_eq!(doc.name, "Site survey");
        assert_eq!(doc.data_points.len(), 1);
        assert_eq!(doc.pages[0].blocks[0].name(), "Intro");
    }

    #[test]
    fn unknown_data_point_type_is_reported() {
        let errors = parse_data_point(
            &json!({ "id": "x", "type": "slider", "label": "X", "valueOptions": {} }),
            "dataPoints[0]",
            deny(),
        )
        .unwrap_err();
        assert_eq!(
            errors,
            vec![SchemaError::UnknownVariant {
                path: "dataPoints[0]".into(),
                family: "data point".into(),
                found: "slider".into(),
            }]
        );
    }

    #[test]
    fn missing_and_foreign_fields_are_reported() {
        let errors = parse_data_point(
            &json!({ "id": "a", "type": "address", "label": "A",
                     "valueOptions": { "addressType": "city", "options": ["x"] } }),
            "dataPoints[1]",
            deny(),
        )
        .unwrap_err();
        assert_eq!(
            errors,
            vec![SchemaError::UnexpectedField {
                path: "dataPoints[1].valueOptions".into(),
                field: "options".into(),
            }]
        );

        let errors = parse_data_point(
            &json!({ "id": "c", "type": "choice", "label": "C" }),
            "dataPoints[2]",
            deny(),
        )
        .unwrap_err();
        assert!(matches!(&errors[..], [SchemaError::MissingField { field, .. }] if field == "valueOptions"));
    }

    #[test]
    fn warn_policy_tolerates_foreign_fields() {
        let options = ParseOptions { unknown_fields: UnknownFields::Warn };
        let dp = parse_data_point(
            &json!({ "id": "t", "type": "text", "label": "T", "placeholder": "..." }),
            "dataPoints[0]",
            options,
        )
        .unwrap();
        assert_eq!(dp.id, "t");
    }

    #[test]
    fn sibling_errors_are_all_collected() {
        let mut raw = minimal_document();
        raw["dataPoints"] = json!([
            { "id": "a", "type": "bogus", "label": "A" },
            { "id": "b", "type": "address", "label": "B", "valueOptions": { "addressType": "planet" } },
            { "id": "c", "type": "text", "label": "C" }
        ]);
        raw["pages"][0]["blocks"][0]["sections"][0]["cards"][0]["dataPointIDs"] = json!([]);

        let errors = parse_document(&raw, deny()).unwrap_err();
        assert_eq!(errors.len(), 3, "{errors:?}");
        assert!(matches!(errors[0], SchemaError::UnknownVariant { .. }));
        assert!(matches!(&errors[1], SchemaError::InvalidField { path, .. } if path == "dataPoints[1]"));
        assert!(matches!(&errors[2], SchemaError::EmptyCollection { field, .. } if field == "dataPointIDs"));
    }

    #[test]
    fn literal_visualization_values_are_shape_checked() {
        let errors = parse_visualization(
            &json!({ "type": "progress", "value": { "values": [6, 5] } }),
            "v",
            deny(),
        )
        .unwrap_err();
        assert!(matches!(
            &errors[..],
            [SchemaError::InvalidValue { reason: crate::error::ShapeMismatch::CompletedExceedsTotal { .. }, .. }]
        ));

        let vis = parse_visualization(&json!({ "type": "donutChart", "value": 0.25 }), "v", deny()).unwrap();
        assert_eq!(
            serde_json::to_value(&vis).unwrap(),
            json!({ "type": "donutChart", "value": { "percentValue": 0.25 }, "visualizationOptions": {} })
        );
    }

    #[test]
    fn table_visualization_rejects_unknown_column_types() {
        let errors = parse_visualization(
            &json!({ "type": "table", "visualizationOptions": { "columns": [
                { "field": "a", "headerName": "A", "type": "sparkline" } ] } }),
            "v",
            deny(),
        )
        .unwrap_err();
        assert!(matches!(&errors[..], [SchemaError::InvalidField { .. }]));
    }

    #[test]
    fn table_rows_keep_unknown_columns_for_document_checks() {
        let dp = parse_data_point(
            &json!({
                "id": "cities", "type": "table", "label": "Cities",
                "value": [ { "city": "Berlin", "pop": 3.5, "extra": 1 } ],
                "valueOptions": { "columns": [
                    { "field": "city", "headerName": "City", "input": { "type": "text" } },
                    { "field": "pop", "headerName": "Pop", "input": { "type": "number", "valueOptions": {} } }
                ] }
            }),
            "dataPoints[0]",
            deny(),
        )
        .unwrap();
        assert!(matches!(dp.stored_value(), Some(crate::datapoint::DataPointValue::Table(rows)) if rows[0].contains_key("extra")));
    }

    #[test]
    fn invalid_json_text_is_a_root_error() {
        let errors = parse_document_str("{ not json", deny()).unwrap_err();
        assert!(matches!(&errors[..], [SchemaError::InvalidField { path, .. }] if path == "$"));
    }
}
