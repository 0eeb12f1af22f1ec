//! JSONPath expressions over event documents.
//!
//! Supported syntax:
//!
//! | Syntax | Meaning |
//! |--------|---------|
//! | `$` | document root |
//! | `.name`, `['name']`, `["name"]` | object member |
//! | `[n]` | array element, negative `n` counts from the end |
//! | `.*`, `[*]` | every member or element |
//! | `['a','b']`, `[0,2]` | union of members or elements |
//! | `[start:end:step]` | array slice (positive step) |
//! | `..name`, `..*`, `..[sel]` | recursive descent |
//!
//! Filter and script expressions (`[?(...)]`, `[(...)]`) are rejected.
//!
//! A path made only of member and index steps is *definite* and selects a
//! single value. Any other path selects a list of values.

use crate::error::{Result, SigmaError};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
enum Selector {
    Name(String),
    Index(i64),
    Wildcard,
    Slice {
        start: Option<i64>,
        end: Option<i64>,
        step: i64,
    },
    Union(Vec<Selector>),
}

impl Selector {
    fn is_definite(&self) -> bool {
        matches!(self, Selector::Name(_) | Selector::Index(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Child(Selector),
    Descendant(Selector),
}

impl Segment {
    fn is_definite(&self) -> bool {
        match self {
            Segment::Child(selector) => selector.is_definite(),
            Segment::Descendant(_) => false,
        }
    }
}

/// Why a JSONPath selection produced no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// A step needed an object or array but found a scalar of the given type.
    UnsupportedValueType(&'static str),
    /// A member step named a key the object does not have.
    UnknownKey(String),
    /// An index step fell outside the array.
    IndexOutOfRange(i64),
}

impl PathError {
    /// True when the failure came from traversing into an undecoded scalar.
    pub fn is_unsupported_value_type(&self) -> bool {
        matches!(self, PathError::UnsupportedValueType(_))
    }
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::UnsupportedValueType(found) => {
                write!(f, "unsupported value type {found}, expected object or array")
            }
            PathError::UnknownKey(key) => write!(f, "unknown key {key}"),
            PathError::IndexOutOfRange(index) => write!(f, "index {index} out of range"),
        }
    }
}

/// A parsed JSONPath expression.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonPath {
    source: String,
    segments: Vec<Segment>,
}

impl JsonPath {
    /// Parse a JSONPath expression.
    ///
    /// # Errors
    /// Returns [`SigmaError::InvalidJsonPath`] when the expression is malformed
    /// or uses unsupported syntax.
    pub fn parse(expr: &str) -> Result<Self> {
        let segments = Parser::new(expr)
            .parse()
            .map_err(|reason| SigmaError::InvalidJsonPath(format!("{expr}: {reason}")))?;
        Ok(Self {
            source: expr.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True when the path can only ever select a single value.
    pub fn is_definite(&self) -> bool {
        self.segments.iter().all(Segment::is_definite)
    }

    /// The top-level member selected by the first step, for `$.field...` and
    /// `$["field"]...` paths.
    pub fn root_field(&self) -> Option<&str> {
        match self.segments.first() {
            Some(Segment::Child(Selector::Name(name))) => Some(name.as_str()),
            _ => None,
        }
    }

    /// Select from `root`.
    ///
    /// Definite paths return the selected value itself. Other paths return an
    /// array of every selected value, in document order.
    pub fn select(&self, root: &Value) -> std::result::Result<Value, PathError> {
        self.select_segments(root, &self.segments)
    }

    /// Select from the value of the top-level field named by
    /// [`root_field`](Self::root_field), treating the first step as taken.
    ///
    /// Paths without a root field are selected from `member` as a whole.
    pub fn select_from_root_field(&self, member: &Value) -> std::result::Result<Value, PathError> {
        match self.segments.split_first() {
            Some((Segment::Child(Selector::Name(_)), rest)) => self.select_segments(member, rest),
            _ => self.select(member),
        }
    }

    fn select_segments(
        &self,
        root: &Value,
        segments: &[Segment],
    ) -> std::result::Result<Value, PathError> {
        let mut nodes = vec![root];
        // While every step so far was definite, failures are reported instead
        // of silently dropping the branch.
        let mut strict = true;

        for segment in segments {
            let mut next = Vec::new();
            for node in nodes {
                if strict && !is_container(node) {
                    return Err(PathError::UnsupportedValueType(type_name(node)));
                }
                match segment {
                    Segment::Child(selector) => select_child(selector, node, strict, &mut next)?,
                    Segment::Descendant(selector) => {
                        let mut descendants = Vec::new();
                        collect_descendants(node, &mut descendants);
                        for descendant in descendants {
                            select_child(selector, descendant, false, &mut next)?;
                        }
                    }
                }
            }
            strict = strict && segment.is_definite();
            nodes = next;
        }

        if self.is_definite() {
            Ok(nodes.first().map(|v| (*v).clone()).unwrap_or(Value::Null))
        } else {
            Ok(Value::Array(nodes.into_iter().cloned().collect()))
        }
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn is_container(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let resolved = if index < 0 { len + index } else { index };
    (0..len).contains(&resolved).then_some(resolved as usize)
}

fn select_child<'a>(
    selector: &Selector,
    node: &'a Value,
    strict: bool,
    out: &mut Vec<&'a Value>,
) -> std::result::Result<(), PathError> {
    match (selector, node) {
        (Selector::Name(name), Value::Object(map)) => match map.get(name) {
            Some(value) => out.push(value),
            None if strict => return Err(PathError::UnknownKey(name.clone())),
            None => {}
        },
        (Selector::Name(name), _) if strict => {
            return Err(PathError::UnknownKey(name.clone()));
        }
        (Selector::Index(index), Value::Array(items)) => {
            match normalize_index(*index, items.len()) {
                Some(i) => out.push(&items[i]),
                None if strict => return Err(PathError::IndexOutOfRange(*index)),
                None => {}
            }
        }
        (Selector::Index(index), _) if strict => {
            return Err(PathError::UnknownKey(index.to_string()));
        }
        (Selector::Wildcard, Value::Object(map)) => out.extend(map.values()),
        (Selector::Wildcard, Value::Array(items)) => out.extend(items.iter()),
        (Selector::Slice { start, end, step }, Value::Array(items)) => {
            let len = items.len() as i64;
            let bound = |v: i64| if v < 0 { (len + v).max(0) } else { v.min(len) };
            let from = start.map_or(0, bound) as usize;
            let to = end.map_or(len, bound) as usize;
            let step = usize::try_from(*step).unwrap_or(usize::MAX);
            out.extend((from..to).step_by(step).filter_map(|i| items.get(i)));
        }
        (Selector::Union(selectors), _) => {
            for selector in selectors {
                select_child(selector, node, false, out)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn collect_descendants<'a>(node: &'a Value, out: &mut Vec<&'a Value>) {
    out.push(node);
    match node {
        Value::Object(map) => map.values().for_each(|v| collect_descendants(v, out)),
        Value::Array(items) => items.iter().for_each(|v| collect_descendants(v, out)),
        _ => {}
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

type ParseResult<T> = std::result::Result<T, String>;

impl Parser {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn parse(mut self) -> ParseResult<Vec<Segment>> {
        if !self.eat('$') {
            return Err("expression must start with '$'".to_string());
        }

        let mut segments = Vec::new();
        while let Some(c) = self.bump() {
            let segment = match c {
                '.' if self.eat('.') => Segment::Descendant(self.parse_descendant()?),
                '.' => Segment::Child(self.parse_dot_member()?),
                '[' => Segment::Child(self.parse_bracket()?),
                other => return Err(format!("unexpected '{other}' at offset {}", self.pos - 1)),
            };
            segments.push(segment);
        }
        Ok(segments)
    }

    fn parse_descendant(&mut self) -> ParseResult<Selector> {
        if self.eat('[') {
            self.parse_bracket()
        } else {
            self.parse_dot_member()
        }
    }

    fn parse_dot_member(&mut self) -> ParseResult<Selector> {
        if self.eat('*') {
            return Ok(Selector::Wildcard);
        }
        let start = self.pos;
        while self.peek().is_some_and(|c| c != '.' && c != '[') {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(format!("missing member name at offset {start}"));
        }
        Ok(Selector::Name(self.chars[start..self.pos].iter().collect()))
    }

    // Called after the opening '['; consumes the closing ']'.
    fn parse_bracket(&mut self) -> ParseResult<Selector> {
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            items.push(self.parse_bracket_item()?);
            self.skip_whitespace();
            match self.bump() {
                Some(',') => continue,
                Some(']') => break,
                Some(other) => return Err(format!("unexpected '{other}' in brackets")),
                None => return Err("unterminated brackets".to_string()),
            }
        }

        if items.len() == 1 {
            Ok(items.remove(0))
        } else {
            Ok(Selector::Union(items))
        }
    }

    fn parse_bracket_item(&mut self) -> ParseResult<Selector> {
        match self.peek() {
            Some('*') => {
                self.pos += 1;
                Ok(Selector::Wildcard)
            }
            Some(quote @ ('\'' | '"')) => {
                self.pos += 1;
                self.parse_quoted(quote).map(Selector::Name)
            }
            Some('?') | Some('(') => {
                Err("filter and script expressions are not supported".to_string())
            }
            Some(c) if c == '-' || c == ':' || c.is_ascii_digit() => self.parse_index_or_slice(),
            Some(other) => Err(format!("unexpected '{other}' in brackets")),
            None => Err("unterminated brackets".to_string()),
        }
    }

    fn parse_quoted(&mut self, quote: char) -> ParseResult<String> {
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some(escaped) => out.push(escaped),
                    None => return Err("unterminated string".to_string()),
                },
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
                None => return Err("unterminated string".to_string()),
            }
        }
    }

    fn parse_int(&mut self) -> ParseResult<Option<i64>> {
        let start = self.pos;
        self.eat('-');
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if start == self.pos {
            return Ok(None);
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse::<i64>()
            .map(Some)
            .map_err(|_| format!("invalid integer '{text}'"))
    }

    fn parse_index_or_slice(&mut self) -> ParseResult<Selector> {
        let start = self.parse_int()?;
        self.skip_whitespace();
        if !self.eat(':') {
            return start
                .map(Selector::Index)
                .ok_or_else(|| "missing index".to_string());
        }

        self.skip_whitespace();
        let end = self.parse_int()?;
        self.skip_whitespace();
        let step = if self.eat(':') {
            self.skip_whitespace();
            self.parse_int()?.unwrap_or(1)
        } else {
            1
        };
        if step <= 0 {
            return Err(format!("slice step must be positive, got {step}"));
        }
        Ok(Selector::Slice { start, end, step })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn select(expr: &str, doc: &Value) -> std::result::Result<Value, PathError> {
        JsonPath::parse(expr).unwrap().select(doc)
    }

    fn sample() -> Value {
        json!({
            "process": {"name": "cmd.exe", "args": ["/c", "whoami", "/all"]},
            "users": [{"name": "alice"}, {"name": "bob"}, {"id": 3}],
            "payload": "{\"x\":1}",
            "odd key": true
        })
    }

    #[test]
    fn test_definite_member_paths() {
        let doc = sample();
        assert_eq!(select("$.process.name", &doc), Ok(json!("cmd.exe")));
        assert_eq!(select("$['process'][\"name\"]", &doc), Ok(json!("cmd.exe")));
        assert_eq!(select("$['odd key']", &doc), Ok(json!(true)));
        assert_eq!(select("$.process.args", &doc), Ok(json!(["/c", "whoami", "/all"])));
        assert_eq!(select("$", &doc), Ok(doc.clone()));
    }

    #[test]
    fn test_indexes() {
        let doc = sample();
        assert_eq!(select("$.process.args[1]", &doc), Ok(json!("whoami")));
        assert_eq!(select("$.process.args[-1]", &doc), Ok(json!("/all")));
        assert_eq!(
            select("$.process.args[3]", &doc),
            Err(PathError::IndexOutOfRange(3))
        );
    }

    #[test]
    fn test_missing_key() {
        let doc = sample();
        assert_eq!(
            select("$.process.pid", &doc),
            Err(PathError::UnknownKey("pid".to_string()))
        );
    }

    #[test]
    fn test_traversing_a_string_is_unsupported_value_type() {
        let doc = sample();
        let err = select("$.payload.x", &doc).unwrap_err();
        assert_eq!(err, PathError::UnsupportedValueType("string"));
        assert!(err.is_unsupported_value_type());

        let err = select("$.payload[*]", &doc).unwrap_err();
        assert!(err.is_unsupported_value_type());
    }

    #[test]
    fn test_wildcards_collect_in_order() {
        let doc = sample();
        assert_eq!(
            select("$.users[*].name", &doc),
            Ok(json!(["alice", "bob"]))
        );
        assert_eq!(
            select("$.process.args.*", &doc),
            Ok(json!(["/c", "whoami", "/all"]))
        );
    }

    #[test]
    fn test_indefinite_paths_skip_scalars() {
        let doc = json!({"items": ["plain", {"x": 1}, {"x": 2}]});
        assert_eq!(select("$.items[*].x", &doc), Ok(json!([1, 2])));
    }

    #[test]
    fn test_union_and_slice() {
        let doc = sample();
        assert_eq!(
            select("$.process['name','missing']", &doc),
            Ok(json!(["cmd.exe"]))
        );
        assert_eq!(select("$.process.args[0,2]", &doc), Ok(json!(["/c", "/all"])));
        assert_eq!(select("$.process.args[1:]", &doc), Ok(json!(["whoami", "/all"])));
        assert_eq!(select("$.process.args[:-1]", &doc), Ok(json!(["/c", "whoami"])));
        assert_eq!(select("$.process.args[::2]", &doc), Ok(json!(["/c", "/all"])));
    }

    #[test]
    fn test_slice_with_huge_step() {
        let doc = json!({"a": [1, 2, 3]});
        assert_eq!(select("$.a[1:5:9223372036854775807]", &doc), Ok(json!([2])));
        assert_eq!(select("$.a[::9223372036854775807]", &doc), Ok(json!([1])));
    }

    #[test]
    fn test_extreme_bounds_never_panic() {
        let doc = json!({"a": [1, 2, 3]});
        let cases = [
            ("$.a[-9223372036854775808:9223372036854775807]", json!([1, 2, 3])),
            ("$.a[-9223372036854775808:9223372036854775807:9223372036854775807]", json!([1])),
            ("$.a[9223372036854775807:]", json!([])),
            ("$.a[:-9223372036854775808]", json!([])),
            ("$.a[-2::2]", json!([2])),
            ("$.a[2:1]", json!([])),
            ("$.a[0,-9223372036854775808,9223372036854775807]", json!([1])),
            ("$..[-9223372036854775808]", json!([])),
        ];
        for (expr, expected) in cases {
            assert_eq!(select(expr, &doc), Ok(expected), "{expr}");
        }

        assert_eq!(
            select("$.a[-9223372036854775808]", &doc),
            Err(PathError::IndexOutOfRange(i64::MIN))
        );
        assert_eq!(
            select("$.a[9223372036854775807]", &doc),
            Err(PathError::IndexOutOfRange(i64::MAX))
        );
    }

    #[test]
    fn test_recursive_descent() {
        let doc = sample();
        assert_eq!(
            select("$..name", &doc),
            Ok(json!(["cmd.exe", "alice", "bob"]))
        );
        assert_eq!(select("$..id", &doc), Ok(json!([3])));
    }

    #[test]
    fn test_select_from_root_field() {
        let path = JsonPath::parse("$.payload.x").unwrap();
        assert_eq!(path.select_from_root_field(&json!({"x": 1})), Ok(json!(1)));
        assert_eq!(
            path.select_from_root_field(&json!("{\"x\":1}")),
            Err(PathError::UnsupportedValueType("string"))
        );

        let path = JsonPath::parse("$.payload").unwrap();
        assert_eq!(path.select_from_root_field(&json!("raw")), Ok(json!("raw")));

        let path = JsonPath::parse("$[0]").unwrap();
        assert_eq!(path.select_from_root_field(&json!(["a"])), Ok(json!("a")));
    }

    #[test]
    fn test_root_field() {
        assert_eq!(JsonPath::parse("$.payload.x").unwrap().root_field(), Some("payload"));
        assert_eq!(JsonPath::parse("$[\"payload\"].x").unwrap().root_field(), Some("payload"));
        assert_eq!(JsonPath::parse("$[0].x").unwrap().root_field(), None);
        assert_eq!(JsonPath::parse("$..x").unwrap().root_field(), None);
        assert_eq!(JsonPath::parse("$.*").unwrap().root_field(), None);
    }

    #[test]
    fn test_definiteness() {
        assert!(JsonPath::parse("$.a[0].b").unwrap().is_definite());
        assert!(!JsonPath::parse("$.a[*]").unwrap().is_definite());
        assert!(!JsonPath::parse("$..a").unwrap().is_definite());
        assert!(!JsonPath::parse("$.a[0:1]").unwrap().is_definite());
    }

    #[test]
    fn test_syntax_errors() {
        for expr in [
            "a.b",
            "$.",
            "$..",
            "$[",
            "$['unterminated",
            "$[?(@.x == 1)]",
            "$[(@.length-1)]",
            "$[::0]",
            "$[]",
            "$x",
        ] {
            let err = JsonPath::parse(expr).unwrap_err();
            assert!(
                matches!(err, SigmaError::InvalidJsonPath(_)),
                "expected syntax error for {expr}"
            );
        }
    }

    #[test]
    fn test_display_is_source() {
        let path = JsonPath::parse("$.process['name']").unwrap();
        assert_eq!(path.to_string(), "$.process['name']");
        assert_eq!(path.as_str(), "$.process['name']");
    }
}
