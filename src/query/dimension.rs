//! Dimension specs and extraction functions
//!
//! A dimension spec names a dimension to group on, optionally transformed
//! by an extraction function and wrapped in a filtering spec. Raw column
//! names are also accepted anywhere a spec is, via [`DimensionRef`].

use serde_json::{json, Map, Value};

/// A transform applied to a dimension's raw value before grouping,
/// filtering, or display.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionFunction {
    /// Regex capture: the first matching group replaces the value
    Regex { expr: String },
    /// Partial match: values not matching the regex are removed
    Partial { expr: String },
    /// Arbitrary JavaScript transform
    Javascript { function: String, injective: bool },
    /// Format the `__time` column (or any timestamp dimension)
    TimeFormat {
        format: String,
        locale: Option<String>,
        time_zone: Option<String>,
    },
    /// Inline map lookup
    MapLookup {
        map: Map<String, Value>,
        retain_missing_values: bool,
        replace_missing_values: Option<String>,
        injective: bool,
    },
    /// Lookup against a pre-registered namespace
    NamespaceLookup {
        namespace: String,
        retain_missing_values: bool,
        replace_missing_values: Option<String>,
        injective: bool,
    },
}

impl ExtractionFunction {
    pub fn regex(expr: impl Into<String>) -> Self {
        Self::Regex { expr: expr.into() }
    }

    pub fn partial(expr: impl Into<String>) -> Self {
        Self::Partial { expr: expr.into() }
    }

    pub fn javascript(function: impl Into<String>, injective: bool) -> Self {
        Self::Javascript {
            function: function.into(),
            injective,
        }
    }

    pub fn time_format(
        format: impl Into<String>,
        locale: Option<&str>,
        time_zone: Option<&str>,
    ) -> Self {
        Self::TimeFormat {
            format: format.into(),
            locale: locale.map(String::from),
            time_zone: time_zone.map(String::from),
        }
    }

    pub fn map_lookup(
        map: Map<String, Value>,
        retain_missing_values: bool,
        replace_missing_values: Option<&str>,
        injective: bool,
    ) -> Self {
        Self::MapLookup {
            map,
            retain_missing_values,
            replace_missing_values: replace_missing_values.map(String::from),
            injective,
        }
    }

    pub fn namespace_lookup(
        namespace: impl Into<String>,
        retain_missing_values: bool,
        replace_missing_values: Option<&str>,
        injective: bool,
    ) -> Self {
        Self::NamespaceLookup {
            namespace: namespace.into(),
            retain_missing_values,
            replace_missing_values: replace_missing_values.map(String::from),
            injective,
        }
    }

    /// Lower to the wire document
    pub fn build(&self) -> Value {
        match self {
            Self::Regex { expr } => json!({"type": "regex", "expr": expr}),
            Self::Partial { expr } => json!({"type": "partial", "expr": expr}),
            Self::Javascript {
                function,
                injective,
            } => json!({
                "type": "javascript",
                "function": function,
                "injective": injective,
            }),
            Self::TimeFormat {
                format,
                locale,
                time_zone,
            } => {
                let mut doc = Map::new();
                doc.insert("type".into(), json!("timeFormat"));
                doc.insert("format".into(), json!(format));
                if let Some(locale) = locale {
                    doc.insert("locale".into(), json!(locale));
                }
                if let Some(time_zone) = time_zone {
                    doc.insert("timeZone".into(), json!(time_zone));
                }
                Value::Object(doc)
            }
            Self::MapLookup {
                map,
                retain_missing_values,
                replace_missing_values,
                injective,
            } => json!({
                "type": "lookup",
                "lookup": {"type": "map", "map": map},
                "retainMissingValue": retain_missing_values,
                "replaceMissingValueWith": replace_missing_values,
                "injective": injective,
            }),
            Self::NamespaceLookup {
                namespace,
                retain_missing_values,
                replace_missing_values,
                injective,
            } => json!({
                "type": "lookup",
                "lookup": {"type": "namespace", "namespace": namespace},
                "retainMissingValue": retain_missing_values,
                "replaceMissingValueWith": replace_missing_values,
                "injective": injective,
            }),
        }
    }
}

/// A filtering spec wrapping a delegate dimension spec
#[derive(Debug, Clone, PartialEq)]
pub enum FilterSpec {
    /// Keep (or drop) an explicit list of values
    ListFiltered {
        values: Vec<String>,
        is_whitelist: bool,
    },
    /// Keep values matching a regex
    RegexFiltered { pattern: String },
}

impl FilterSpec {
    pub fn list(values: Vec<String>) -> Self {
        Self::ListFiltered {
            values,
            is_whitelist: true,
        }
    }

    pub fn blacklist(values: Vec<String>) -> Self {
        Self::ListFiltered {
            values,
            is_whitelist: false,
        }
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        Self::RegexFiltered {
            pattern: pattern.into(),
        }
    }

    /// Lower to the wire document, wrapping the already-built delegate
    pub fn build(&self, delegate: Value) -> Value {
        match self {
            Self::ListFiltered {
                values,
                is_whitelist,
            } => {
                let mut doc = Map::new();
                doc.insert("type".into(), json!("listFiltered"));
                doc.insert("delegate".into(), delegate);
                doc.insert("values".into(), json!(values));
                // whitelist is the engine default; only emitted when disabled
                if !is_whitelist {
                    doc.insert("isWhitelist".into(), json!(false));
                }
                Value::Object(doc)
            }
            Self::RegexFiltered { pattern } => json!({
                "type": "regexFiltered",
                "delegate": delegate,
                "pattern": pattern,
            }),
        }
    }
}

/// A dimension to group by, with an output name and optional transforms
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionSpec {
    pub dimension: String,
    pub output_name: String,
    pub extraction_fn: Option<ExtractionFunction>,
    pub filter_spec: Option<FilterSpec>,
}

impl DimensionSpec {
    /// Create a plain dimension spec
    pub fn new(dimension: impl Into<String>, output_name: impl Into<String>) -> Self {
        Self {
            dimension: dimension.into(),
            output_name: output_name.into(),
            extraction_fn: None,
            filter_spec: None,
        }
    }

    /// Attach an extraction function
    pub fn with_extraction(mut self, extraction_fn: ExtractionFunction) -> Self {
        self.extraction_fn = Some(extraction_fn);
        self
    }

    /// Wrap in a filtering spec
    pub fn with_filter(mut self, filter_spec: FilterSpec) -> Self {
        self.filter_spec = Some(filter_spec);
        self
    }

    /// Lower to the wire document
    pub fn build(&self) -> Value {
        let base = match &self.extraction_fn {
            Some(extraction_fn) => json!({
                "type": "extraction",
                "dimension": self.dimension,
                "outputName": self.output_name,
                "extractionFn": extraction_fn.build(),
            }),
            None => json!({
                "type": "default",
                "dimension": self.dimension,
                "outputName": self.output_name,
            }),
        };

        match &self.filter_spec {
            Some(filter_spec) => filter_spec.build(base),
            None => base,
        }
    }
}

/// Either a raw column name or a full dimension spec
#[derive(Debug, Clone, PartialEq)]
pub enum DimensionRef {
    Name(String),
    Spec(DimensionSpec),
}

impl DimensionRef {
    /// Lower to the wire representation: raw names pass through as bare
    /// strings, specs as their full document.
    pub fn build(&self) -> Value {
        match self {
            Self::Name(name) => json!(name),
            Self::Spec(spec) => spec.build(),
        }
    }
}

impl From<&str> for DimensionRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for DimensionRef {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<DimensionSpec> for DimensionRef {
    fn from(spec: DimensionSpec) -> Self {
        Self::Spec(spec)
    }
}
