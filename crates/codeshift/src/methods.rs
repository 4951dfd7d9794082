//! Member-call and built-in function renames between python and javascript.
//!
//! The table is built once by [`MethodNameMapper::new`] and never mutated, so a
//! single instance can be shared across threads behind an `Arc`.
//!
//! Each [`MethodMapping`] names its counterpart on both sides. A side with no
//! equivalent carries [`Counterpart::Missing`] with an explanation; converting
//! *from* the other side then reports a [`MappingGap`] instead of guessing.
//!
//! Conversion of a line runs in two phases:
//!
//! 1. custom transforms, in table order, for mappings that have one
//! 2. one pass over the line renaming every `.name(` token, plus free-function
//!    rewrites of `name(` where `name` is not a member access. Text inside
//!    string literals is left alone.
//!
//! Mappings with a custom transform for a direction rely on it entirely for
//! that direction: if it does not apply, the plain rename is skipped and a
//! `Missing` target is reported as a gap.

use crate::line::map_code;
use regex::{Captures, Regex};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::LazyLock;

/// What kind of call a mapping covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MethodCategory {
    Text,
    Sequence,
    AssociativeCollection,
    FreeFunction,
}

/// One side of a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counterpart {
    Name(&'static str),
    /// No equivalent exists; the text explains what to use instead.
    Missing(&'static str),
}

impl Counterpart {
    fn name(&self) -> Option<&'static str> {
        match self {
            Counterpart::Name(name) => Some(name),
            Counterpart::Missing(_) => None,
        }
    }
}

/// Conversion direction for the mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    ToJavaScript,
    ToPython,
}

/// Custom rewrite of a whole line. Returns `None` when it does not apply.
pub type Transform = fn(&str) -> Option<String>;

#[derive(Debug, Clone)]
pub struct MethodMapping {
    pub category: MethodCategory,
    pub python: Counterpart,
    pub javascript: Counterpart,
    to_javascript: Option<Transform>,
    to_python: Option<Transform>,
}

impl MethodMapping {
    fn new(category: MethodCategory, python: &'static str, javascript: &'static str) -> Self {
        Self {
            category,
            python: Counterpart::Name(python),
            javascript: Counterpart::Name(javascript),
            to_javascript: None,
            to_python: None,
        }
    }

    fn python_only(category: MethodCategory, python: &'static str, reason: &'static str) -> Self {
        Self {
            category,
            python: Counterpart::Name(python),
            javascript: Counterpart::Missing(reason),
            to_javascript: None,
            to_python: None,
        }
    }

    fn javascript_only(
        category: MethodCategory,
        javascript: &'static str,
        reason: &'static str,
    ) -> Self {
        Self {
            category,
            python: Counterpart::Missing(reason),
            javascript: Counterpart::Name(javascript),
            to_javascript: None,
            to_python: None,
        }
    }

    fn with_to_javascript(mut self, transform: Transform) -> Self {
        self.to_javascript = Some(transform);
        self
    }

    fn with_to_python(mut self, transform: Transform) -> Self {
        self.to_python = Some(transform);
        self
    }

    fn source(&self, direction: Direction) -> Counterpart {
        match direction {
            Direction::ToJavaScript => self.python,
            Direction::ToPython => self.javascript,
        }
    }

    fn target(&self, direction: Direction) -> Counterpart {
        match direction {
            Direction::ToJavaScript => self.javascript,
            Direction::ToPython => self.python,
        }
    }

    fn custom(&self, direction: Direction) -> Option<Transform> {
        match direction {
            Direction::ToJavaScript => self.to_javascript,
            Direction::ToPython => self.to_python,
        }
    }
}

/// A call that was left alone because the target grammar has no counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingGap {
    pub name: &'static str,
    pub reason: &'static str,
}

/// Result of [`MethodNameMapper::convert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedLine {
    pub text: String,
    pub changed: bool,
    pub gaps: Vec<MappingGap>,
}

#[derive(Debug)]
struct FunctionPattern {
    mapping: usize,
    direction: Direction,
    regex: Regex,
}

/// Immutable bidirectional rename table.
#[derive(Debug)]
pub struct MethodNameMapper {
    mappings: Vec<MethodMapping>,
    /// Member-call source name -> first mapping with that name.
    from_python: HashMap<&'static str, usize>,
    from_javascript: HashMap<&'static str, usize>,
    functions: Vec<FunctionPattern>,
}

static MEMBER_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.([A-Za-z_$][\w$]*)(\s*)\(").unwrap());

impl MethodNameMapper {
    /// Build the mapper with the built-in table.
    pub fn new() -> Self {
        Self::with_mappings(builtin_mappings())
    }

    fn with_mappings(mappings: Vec<MethodMapping>) -> Self {
        let mut from_python = HashMap::new();
        let mut from_javascript = HashMap::new();
        let mut functions = Vec::new();

        for (index, mapping) in mappings.iter().enumerate() {
            for direction in [Direction::ToJavaScript, Direction::ToPython] {
                let Some(name) = mapping.source(direction).name() else {
                    continue;
                };
                if mapping.category == MethodCategory::FreeFunction {
                    let pattern = format!(r"(^|[^\w.$]){}\s*\(", regex::escape(name));
                    // Names are escaped, so the pattern is always valid.
                    if let Ok(regex) = Regex::new(&pattern) {
                        functions.push(FunctionPattern {
                            mapping: index,
                            direction,
                            regex,
                        });
                    }
                } else {
                    let methods = match direction {
                        Direction::ToJavaScript => &mut from_python,
                        Direction::ToPython => &mut from_javascript,
                    };
                    methods.entry(name).or_insert(index);
                }
            }
        }

        Self {
            mappings,
            from_python,
            from_javascript,
            functions,
        }
    }

    fn method_index(&self, name: &str, direction: Direction) -> Option<usize> {
        let methods = match direction {
            Direction::ToJavaScript => &self.from_python,
            Direction::ToPython => &self.from_javascript,
        };
        methods.get(name).copied()
    }

    pub fn mappings(&self) -> &[MethodMapping] {
        &self.mappings
    }

    /// Look up the mapping for a source-side name.
    pub fn mapping(&self, name: &str, direction: Direction) -> Option<&MethodMapping> {
        self.mappings
            .iter()
            .find(|m| m.source(direction).name() == Some(name))
    }

    pub fn by_category(&self, category: MethodCategory) -> impl Iterator<Item = &MethodMapping> {
        self.mappings.iter().filter(move |m| m.category == category)
    }

    /// Rewrite member calls and built-in functions in `line`.
    pub fn convert(&self, line: &str, direction: Direction) -> MappedLine {
        let mut text = line.to_string();
        let mut gaps = Vec::new();
        let mut customised = vec![false; self.mappings.len()];

        for (index, mapping) in self.mappings.iter().enumerate() {
            if mapping.source(direction).name().is_none() {
                continue;
            }
            if let Some(transform) = mapping.custom(direction) {
                customised[index] = true;
                if let Some(new) = transform(&text) {
                    text = new;
                }
            }
        }

        let text = map_code(&text, |code| {
            self.rename_code(code, direction, &customised, &mut gaps)
        });

        MappedLine {
            changed: text != line,
            text,
            gaps,
        }
    }

    /// Free-function and `.name(` renames over one run of code that holds no
    /// string literal.
    fn rename_code(
        &self,
        code: &str,
        direction: Direction,
        customised: &[bool],
        gaps: &mut Vec<MappingGap>,
    ) -> String {
        let mut text = code.to_string();
        for pattern in self.functions.iter().filter(|p| p.direction == direction) {
            let mapping = &self.mappings[pattern.mapping];
            if !pattern.regex.is_match(&text) {
                continue;
            }
            match mapping.target(direction) {
                Counterpart::Name(target) if !customised[pattern.mapping] => {
                    text = pattern
                        .regex
                        .replace_all(&text, |caps: &Captures| format!("{}{}(", &caps[1], target))
                        .into_owned();
                }
                Counterpart::Name(_) => {}
                Counterpart::Missing(reason) => push_gap(gaps, mapping, direction, reason),
            }
        }

        MEMBER_CALL
            .replace_all(&text, |caps: &Captures| {
                let name = &caps[1];
                let Some(index) = self.method_index(name, direction) else {
                    return caps[0].to_string();
                };
                let mapping = &self.mappings[index];
                match mapping.target(direction) {
                    Counterpart::Name(target) if !customised[index] => {
                        format!(".{}{}(", target, &caps[2])
                    }
                    Counterpart::Name(_) => caps[0].to_string(),
                    Counterpart::Missing(reason) => {
                        push_gap(gaps, mapping, direction, reason);
                        caps[0].to_string()
                    }
                }
            })
            .into_owned()
    }
}

impl Default for MethodNameMapper {
    fn default() -> Self {
        Self::new()
    }
}

fn push_gap(
    gaps: &mut Vec<MappingGap>,
    mapping: &MethodMapping,
    direction: Direction,
    reason: &'static str,
) {
    let Some(name) = mapping.source(direction).name() else {
        return;
    };
    if !gaps.iter().any(|g| g.name == name) {
        gaps.push(MappingGap { name, reason });
    }
}

// ============================================================================
// Built-in table
// ============================================================================

/// A receiver pattern compiled on first use and kept for the process.
macro_rules! cached {
    ($pattern:expr) => {{
        static RE: LazyLock<Regex> = LazyLock::new(|| compile($pattern));
        &*RE
    }};
}

fn builtin_mappings() -> Vec<MethodMapping> {
    use MethodCategory::*;

    vec![
        // Text
        MethodMapping::new(Text, "upper", "toUpperCase"),
        MethodMapping::new(Text, "lower", "toLowerCase"),
        MethodMapping::new(Text, "strip", "trim"),
        MethodMapping::new(Text, "lstrip", "trimStart"),
        MethodMapping::new(Text, "rstrip", "trimEnd"),
        MethodMapping::new(Text, "replace", "replaceAll"),
        MethodMapping::new(Text, "split", "split"),
        MethodMapping::new(Text, "join", "join")
            .with_to_javascript(swap_join)
            .with_to_python(swap_join),
        MethodMapping::new(Text, "startswith", "startsWith"),
        MethodMapping::new(Text, "endswith", "endsWith"),
        MethodMapping::new(Text, "find", "indexOf"),
        MethodMapping::new(Text, "rjust", "padStart"),
        MethodMapping::new(Text, "ljust", "padEnd"),
        MethodMapping::python_only(Text, "count", "use split(sep).length - 1")
            .with_to_javascript(count_to_split),
        MethodMapping::python_only(Text, "isdigit", "test against /^\\d+$/")
            .with_to_javascript(|line| char_class_test(cached!(r"(RECV)\.isdigit\(\s*\)"), line, r"/^\d+$/")),
        MethodMapping::python_only(Text, "isalpha", "test against /^[a-zA-Z]+$/")
            .with_to_javascript(|line| char_class_test(cached!(r"(RECV)\.isalpha\(\s*\)"), line, "/^[a-zA-Z]+$/")),
        MethodMapping::python_only(Text, "isalnum", "test against /^[a-zA-Z0-9]+$/")
            .with_to_javascript(|line| char_class_test(cached!(r"(RECV)\.isalnum\(\s*\)"), line, "/^[a-zA-Z0-9]+$/")),
        MethodMapping::python_only(Text, "capitalize", "charAt(0).toUpperCase() + slice(1)")
            .with_to_javascript(capitalize),
        MethodMapping::python_only(Text, "swapcase", "no JavaScript equivalent"),
        MethodMapping::python_only(Text, "title", "needs a custom word-capitalising helper"),
        MethodMapping::javascript_only(Text, "charAt", "use indexing").with_to_python(char_at),
        MethodMapping::javascript_only(Text, "substring", "use slicing")
            .with_to_python(substring),
        // Sequence
        MethodMapping::new(Sequence, "append", "push"),
        MethodMapping::python_only(Sequence, "extend", "use push(...items)")
            .with_to_javascript(extend_to_push),
        MethodMapping::javascript_only(Sequence, "concat", "use + on lists")
            .with_to_python(concat_to_plus),
        MethodMapping::python_only(Sequence, "insert", "use splice(index, 0, value)")
            .with_to_javascript(insert_to_splice),
        MethodMapping::python_only(Sequence, "remove", "use splice(indexOf(value), 1)")
            .with_to_javascript(remove_to_splice),
        MethodMapping::javascript_only(Sequence, "splice", "use slicing, del or insert"),
        MethodMapping::new(Sequence, "pop", "pop"),
        MethodMapping::new(Sequence, "index", "indexOf"),
        MethodMapping::new(Sequence, "sort", "sort"),
        MethodMapping::new(Sequence, "reverse", "reverse"),
        MethodMapping::new(Sequence, "copy", "slice").with_to_python(slice_to_index),
        MethodMapping::javascript_only(Sequence, "includes", "use the in operator")
            .with_to_python(includes_to_in),
        MethodMapping::python_only(Sequence, "clear", "assign length = 0 or delete keys"),
        MethodMapping::javascript_only(Sequence, "forEach", "use a for loop"),
        MethodMapping::javascript_only(Sequence, "reduce", "use functools.reduce"),
        // Associative collections
        MethodMapping::new(AssociativeCollection, "keys", "keys")
            .with_to_javascript(|line| object_static_to_js(cached!(r"(RECV)\.keys\(\s*\)"), line, "keys"))
            .with_to_python(|line| object_static_to_py(cached!(r"Object\.keys\((RECV)\)"), line, "keys")),
        MethodMapping::new(AssociativeCollection, "values", "values")
            .with_to_javascript(|line| object_static_to_js(cached!(r"(RECV)\.values\(\s*\)"), line, "values"))
            .with_to_python(|line| object_static_to_py(cached!(r"Object\.values\((RECV)\)"), line, "values")),
        MethodMapping::new(AssociativeCollection, "items", "entries")
            .with_to_javascript(|line| object_static_to_js(cached!(r"(RECV)\.items\(\s*\)"), line, "entries"))
            .with_to_python(|line| object_static_to_py(cached!(r"Object\.entries\((RECV)\)"), line, "items")),
        MethodMapping::new(AssociativeCollection, "get", "get").with_to_javascript(get_to_index),
        MethodMapping::new(AssociativeCollection, "update", "assign")
            .with_to_javascript(update_to_assign)
            .with_to_python(assign_to_update),
        MethodMapping::python_only(AssociativeCollection, "setdefault", "use ??= on the key"),
        MethodMapping::python_only(AssociativeCollection, "popitem", "no JavaScript equivalent"),
        MethodMapping::python_only(AssociativeCollection, "fromkeys", "use Object.fromEntries"),
        MethodMapping::javascript_only(AssociativeCollection, "hasOwnProperty", "use the in operator")
            .with_to_python(has_own_to_in),
        // Free functions
        MethodMapping::new(FreeFunction, "len", "length")
            .with_to_javascript(len_to_length)
            .with_to_python(length_to_len),
        MethodMapping::new(FreeFunction, "str", "String"),
        MethodMapping::new(FreeFunction, "int", "parseInt"),
        MethodMapping::new(FreeFunction, "float", "parseFloat"),
        MethodMapping::new(FreeFunction, "float", "Number"),
        MethodMapping::new(FreeFunction, "bool", "Boolean"),
        MethodMapping::new(FreeFunction, "list", "Array.from"),
        MethodMapping::new(FreeFunction, "set", "new Set"),
        MethodMapping::new(FreeFunction, "abs", "Math.abs"),
        MethodMapping::new(FreeFunction, "min", "Math.min"),
        MethodMapping::new(FreeFunction, "max", "Math.max"),
        MethodMapping::new(FreeFunction, "round", "Math.round"),
        MethodMapping::new(FreeFunction, "pow", "Math.pow"),
        MethodMapping::new(FreeFunction, "math.sqrt", "Math.sqrt"),
        MethodMapping::new(FreeFunction, "math.floor", "Math.floor"),
        MethodMapping::new(FreeFunction, "math.ceil", "Math.ceil"),
        MethodMapping::new(FreeFunction, "json.dumps", "JSON.stringify"),
        MethodMapping::new(FreeFunction, "json.loads", "JSON.parse"),
        MethodMapping::new(FreeFunction, "type", "typeof")
            .with_to_javascript(type_to_typeof)
            .with_to_python(typeof_to_type),
        MethodMapping::python_only(FreeFunction, "sum", "reduce((a, b) => a + b, 0)")
            .with_to_javascript(sum_to_reduce),
        MethodMapping::python_only(FreeFunction, "sorted", "[...items].sort()")
            .with_to_javascript(|line| copy_then(cached!(r"(^|[^\w.$])sorted\((RECV)\)"), line, "sort")),
        MethodMapping::python_only(FreeFunction, "reversed", "[...items].reverse()")
            .with_to_javascript(|line| copy_then(cached!(r"(^|[^\w.$])reversed\((RECV)\)"), line, "reverse")),
        MethodMapping::python_only(FreeFunction, "range", "Array.from({ length: n }, (_, i) => i)")
            .with_to_javascript(range_to_array),
        MethodMapping::python_only(FreeFunction, "enumerate", "use entries() on the array"),
        MethodMapping::python_only(FreeFunction, "zip", "needs a zip helper"),
        MethodMapping::python_only(FreeFunction, "any", "use some() with a predicate"),
        MethodMapping::python_only(FreeFunction, "all", "use every() with a predicate"),
        MethodMapping::python_only(FreeFunction, "isinstance", "use typeof or instanceof"),
        MethodMapping::javascript_only(FreeFunction, "Array.isArray", "use isinstance(x, list)")
            .with_to_python(is_array),
        MethodMapping::javascript_only(FreeFunction, "setTimeout", "use threading.Timer or asyncio"),
        MethodMapping::javascript_only(FreeFunction, "Object.freeze", "no Python equivalent"),
    ]
}

// ============================================================================
// Custom transforms
// ============================================================================

/// Simple receiver: a dotted name, optionally followed by one call or index.
const RECEIVER: &str = r"[A-Za-z_$][\w$.]*(?:\([^()]*\)|\[[^\]]*\])?";

fn compile(pattern: &str) -> Regex {
    Regex::new(&pattern.replace("RECV", RECEIVER)).unwrap()
}

fn rewrite(regex: &Regex, line: &str, f: impl Fn(&Captures) -> String) -> Option<String> {
    if !regex.is_match(line) {
        return None;
    }
    let out = regex.replace_all(line, |caps: &Captures| f(caps)).into_owned();
    (out != line).then_some(out)
}

fn swap_join(line: &str) -> Option<String> {
    static RE: LazyLock<Regex> = LazyLock::new(|| {
        compile(r#"('[^']*'|"[^"]*"|RECV)\.join\(([^()]*)\)"#)
    });
    rewrite(&RE, line, |caps| {
        let receiver = &caps[1];
        let arg = caps[2].trim();
        if arg.is_empty() {
            // JavaScript's default separator.
            format!("\",\".join({receiver})")
        } else {
            format!("{arg}.join({receiver})")
        }
    })
}

fn count_to_split(line: &str) -> Option<String> {
    static RE: LazyLock<Regex> = LazyLock::new(|| compile(r"(RECV)\.count\(([^()]+)\)"));
    rewrite(&RE, line, |caps| {
        format!("{}.split({}).length - 1", &caps[1], caps[2].trim())
    })
}

fn char_class_test(re: &Regex, line: &str, class: &str) -> Option<String> {
    rewrite(re, line, |caps| format!("{class}.test({})", &caps[1]))
}

fn capitalize(line: &str) -> Option<String> {
    static RE: LazyLock<Regex> = LazyLock::new(|| compile(r"(RECV)\.capitalize\(\s*\)"));
    rewrite(&RE, line, |caps| {
        let s = &caps[1];
        format!("({s}.charAt(0).toUpperCase() + {s}.slice(1))")
    })
}

fn char_at(line: &str) -> Option<String> {
    static RE: LazyLock<Regex> = LazyLock::new(|| compile(r"(RECV)\.charAt\(([^()]+)\)"));
    rewrite(&RE, line, |caps| format!("{}[{}]", &caps[1], caps[2].trim()))
}

fn substring(line: &str) -> Option<String> {
    static RE: LazyLock<Regex> =
        LazyLock::new(|| compile(r"(RECV)\.substring\(([^(),]+)(?:,([^()]+))?\)"));
    rewrite(&RE, line, |caps| {
        let end = caps.get(3).map(|m| m.as_str().trim()).unwrap_or("");
        format!("{}[{}:{}]", &caps[1], caps[2].trim(), end)
    })
}

fn extend_to_push(line: &str) -> Option<String> {
    static RE: LazyLock<Regex> = LazyLock::new(|| compile(r"(RECV)\.extend\(([^()]+)\)"));
    rewrite(&RE, line, |caps| format!("{}.push(...{})", &caps[1], caps[2].trim()))
}

fn concat_to_plus(line: &str) -> Option<String> {
    static RE: LazyLock<Regex> = LazyLock::new(|| compile(r"(RECV)\.concat\(([^(),]+)\)"));
    rewrite(&RE, line, |caps| format!("{} + {}", &caps[1], caps[2].trim()))
}

fn insert_to_splice(line: &str) -> Option<String> {
    static RE: LazyLock<Regex> =
        LazyLock::new(|| compile(r"(RECV)\.insert\(([^(),]+),([^()]+)\)"));
    rewrite(&RE, line, |caps| {
        format!("{}.splice({}, 0, {})", &caps[1], caps[2].trim(), caps[3].trim())
    })
}

fn remove_to_splice(line: &str) -> Option<String> {
    static RE: LazyLock<Regex> = LazyLock::new(|| compile(r"(RECV)\.remove\(([^()]+)\)"));
    rewrite(&RE, line, |caps| {
        let list = &caps[1];
        format!("{list}.splice({list}.indexOf({}), 1)", caps[2].trim())
    })
}

fn slice_to_index(line: &str) -> Option<String> {
    static RE: LazyLock<Regex> =
        LazyLock::new(|| compile(r"(RECV)\.slice\(([^(),]*)(?:,([^()]+))?\)"));
    rewrite(&RE, line, |caps| {
        let start = caps[2].trim();
        let end = caps.get(3).map(|m| m.as_str().trim()).unwrap_or("");
        if start.is_empty() {
            format!("{}.copy()", &caps[1])
        } else {
            format!("{}[{}:{}]", &caps[1], start, end)
        }
    })
}

fn includes_to_in(line: &str) -> Option<String> {
    static RE: LazyLock<Regex> = LazyLock::new(|| compile(r"(RECV)\.includes\(([^()]+)\)"));
    rewrite(&RE, line, |caps| format!("{} in {}", caps[2].trim(), &caps[1]))
}

fn object_static_to_js(re: &Regex, line: &str, static_name: &str) -> Option<String> {
    rewrite(re, line, |caps| {
        format!("Object.{static_name}({})", &caps[1])
    })
}

fn object_static_to_py(re: &Regex, line: &str, method: &str) -> Option<String> {
    rewrite(re, line, |caps| format!("{}.{method}()", &caps[1]))
}

fn get_to_index(line: &str) -> Option<String> {
    static RE: LazyLock<Regex> =
        LazyLock::new(|| compile(r"(RECV)\.get\(([^(),]+)(?:,([^()]+))?\)"));
    rewrite(&RE, line, |caps| match caps.get(3) {
        Some(default) => format!(
            "({}[{}] ?? {})",
            &caps[1],
            caps[2].trim(),
            default.as_str().trim()
        ),
        None => format!("{}[{}]", &caps[1], caps[2].trim()),
    })
}

fn update_to_assign(line: &str) -> Option<String> {
    static RE: LazyLock<Regex> = LazyLock::new(|| compile(r"(RECV)\.update\(([^()]+)\)"));
    rewrite(&RE, line, |caps| {
        format!("Object.assign({}, {})", &caps[1], caps[2].trim())
    })
}

fn assign_to_update(line: &str) -> Option<String> {
    static RE: LazyLock<Regex> =
        LazyLock::new(|| compile(r"Object\.assign\((RECV),([^()]+)\)"));
    rewrite(&RE, line, |caps| format!("{}.update({})", &caps[1], caps[2].trim()))
}

fn has_own_to_in(line: &str) -> Option<String> {
    static RE: LazyLock<Regex> =
        LazyLock::new(|| compile(r"(RECV)\.hasOwnProperty\(([^()]+)\)"));
    rewrite(&RE, line, |caps| format!("{} in {}", caps[2].trim(), &caps[1]))
}

fn len_to_length(line: &str) -> Option<String> {
    static RE: LazyLock<Regex> = LazyLock::new(|| compile(r"(^|[^\w.$])len\((RECV)\)"));
    rewrite(&RE, line, |caps| format!("{}{}.length", &caps[1], &caps[2]))
}

fn length_to_len(line: &str) -> Option<String> {
    static RE: LazyLock<Regex> = LazyLock::new(|| compile(r"(RECV)\.length\b(\s*\()?"));
    rewrite(&RE, line, |caps| {
        if caps.get(2).is_some() {
            // `.length(` is a call on something else; leave it.
            caps[0].to_string()
        } else {
            format!("len({})", &caps[1])
        }
    })
}

fn type_to_typeof(line: &str) -> Option<String> {
    static RE: LazyLock<Regex> = LazyLock::new(|| compile(r"(^|[^\w.$])type\((RECV)\)"));
    rewrite(&RE, line, |caps| format!("{}typeof {}", &caps[1], &caps[2]))
}

fn typeof_to_type(line: &str) -> Option<String> {
    static RE: LazyLock<Regex> = LazyLock::new(|| compile(r"\btypeof\s+(RECV)"));
    rewrite(&RE, line, |caps| format!("type({})", &caps[1]))
}

fn sum_to_reduce(line: &str) -> Option<String> {
    static RE: LazyLock<Regex> = LazyLock::new(|| compile(r"(^|[^\w.$])sum\((RECV)\)"));
    rewrite(&RE, line, |caps| {
        format!("{}{}.reduce((a, b) => a + b, 0)", &caps[1], &caps[2])
    })
}

fn copy_then(re: &Regex, line: &str, method: &str) -> Option<String> {
    rewrite(re, line, |caps| {
        format!("{}[...{}].{method}()", &caps[1], &caps[2])
    })
}

fn range_to_array(line: &str) -> Option<String> {
    static RE: LazyLock<Regex> = LazyLock::new(|| compile(r"(^|[^\w.$])range\(([^(),]+)\)"));
    rewrite(&RE, line, |caps| {
        format!(
            "{}Array.from({{ length: {} }}, (_, i) => i)",
            &caps[1],
            caps[2].trim()
        )
    })
}

fn is_array(line: &str) -> Option<String> {
    static RE: LazyLock<Regex> =
        LazyLock::new(|| compile(r"(^|[^\w.$])Array\.isArray\(([^()]+)\)"));
    rewrite(&RE, line, |caps| {
        format!("{}isinstance({}, list)", &caps[1], caps[2].trim())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_js(line: &str) -> MappedLine {
        MethodNameMapper::new().convert(line, Direction::ToJavaScript)
    }

    fn to_py(line: &str) -> MappedLine {
        MethodNameMapper::new().convert(line, Direction::ToPython)
    }

    #[test]
    fn test_simple_rename() {
        let out = to_js("name.upper()");
        assert_eq!(out.text, "name.toUpperCase()");
        assert!(out.changed);
        assert_eq!(to_py("name.toUpperCase()").text, "name.upper()");
    }

    #[test]
    fn test_chained_calls_in_one_pass() {
        assert_eq!(
            to_js("text.strip().lower().split(',')").text,
            "text.trim().toLowerCase().split(',')"
        );
        assert_eq!(
            to_py("text.trim().toLowerCase().split(',')").text,
            "text.strip().lower().split(',')"
        );
    }

    #[test]
    fn test_every_occurrence_rewritten() {
        assert_eq!(to_js("a.append(1); b.append(2)").text, "a.push(1); b.push(2)");
    }

    #[test]
    fn test_token_boundary() {
        // `.appendix(` must not be touched by the `append` mapping.
        let out = to_js("doc.appendix(3)");
        assert_eq!(out.text, "doc.appendix(3)");
        assert!(!out.changed);
    }

    #[test]
    fn test_join_swaps_receiver() {
        assert_eq!(to_js(r#"", ".join(names)"#).text, "names.join(\", \")");
        assert_eq!(to_py(r#"names.join(", ")"#).text, "\", \".join(names)");
    }

    #[test]
    fn test_len_and_length() {
        assert_eq!(to_js("n = len(items)").text, "n = items.length");
        assert_eq!(to_py("n = items.length").text, "n = len(items)");
    }

    #[test]
    fn test_dict_views() {
        assert_eq!(to_js("ks = d.keys()").text, "ks = Object.keys(d)");
        assert_eq!(to_py("ks = Object.entries(d)").text, "ks = d.items()");
        assert_eq!(to_py("n = Object.keys(d).length").text, "n = len(d.keys())");
    }

    #[test]
    fn test_free_functions() {
        assert_eq!(to_js("x = abs(y)").text, "x = Math.abs(y)");
        assert_eq!(to_py("x = Math.max(a, b)").text, "x = max(a, b)");
        assert_eq!(to_js("s = str(n)").text, "s = String(n)");
        assert_eq!(to_py("n = Number(s)").text, "n = float(s)");
        // Already a member call: not a free function.
        assert_eq!(to_js("x = obj.abs(y)").text, "x = obj.abs(y)");
    }

    #[test]
    fn test_missing_counterpart_reports_gap() {
        let out = to_js("s.swapcase()");
        assert_eq!(out.text, "s.swapcase()");
        assert!(!out.changed);
        assert_eq!(out.gaps.len(), 1);
        assert_eq!(out.gaps[0].name, "swapcase");

        let out = to_py("items.forEach(print)");
        assert_eq!(out.gaps[0].name, "forEach");

        let out = to_js("pairs = zip(a, b)");
        assert_eq!(out.gaps[0].name, "zip");
    }

    #[test]
    fn test_custom_transform_preferred() {
        assert_eq!(to_js("n = s.count('a')").text, "n = s.split('a').length - 1");
        assert_eq!(to_js("v = d.get('k', 0)").text, "v = (d['k'] ?? 0)");
        assert_eq!(to_py("ok = xs.includes(3)").text, "ok = 3 in xs");
        assert_eq!(to_py("part = s.slice(1, 3)").text, "part = s[1:3]");
    }

    #[test]
    fn test_unchanged_line() {
        let out = to_js("x = y + 1");
        assert!(!out.changed);
        assert!(out.gaps.is_empty());
    }

    #[test]
    fn test_lookup() {
        let mapper = MethodNameMapper::new();
        let mapping = mapper.mapping("append", Direction::ToJavaScript).unwrap();
        assert_eq!(mapping.javascript, Counterpart::Name("push"));
        assert!(mapper.by_category(MethodCategory::FreeFunction).count() > 10);
    }

    #[test]
    fn test_string_literals_untouched() {
        let out = to_js("text = \"use str(x) here\"");
        assert_eq!(out.text, "text = \"use str(x) here\"");
        assert!(!out.changed);
        assert_eq!(to_js("log('a.append(b)')").text, "log('a.append(b)')");
        assert_eq!(to_js("x.append('str(y)')").text, "x.push('str(y)')");
        assert_eq!(to_py("s = `${a}.toUpperCase()`").text, "s = `${a}.toUpperCase()`");
        // A missing counterpart named inside a literal is not a gap.
        assert!(to_js("msg = 'call s.swapcase()'").gaps.is_empty());
    }

    #[test]
    fn test_cached_receiver_patterns() {
        let mapper = MethodNameMapper::new();
        for _ in 0..1_000 {
            let out = mapper.convert("ok = code.isdigit() and sorted(xs)", Direction::ToJavaScript);
            assert_eq!(out.text, "ok = /^\\d+$/.test(code) and [...xs].sort()");
        }
        assert_eq!(to_js("vs = d.values()").text, "vs = Object.values(d)");
        assert_eq!(to_py("vs = Object.values(d)").text, "vs = d.values()");
        assert_eq!(to_js("ys = reversed(xs)").text, "ys = [...xs].reverse()");
        assert_eq!(to_js("ok = s.isalpha()").text, "ok = /^[a-zA-Z]+$/.test(s)");
    }
}
