//! Template expression renderer.
//!
//! Understands exactly four constructs: `{{ name }}`, `{{ a.b }}`,
//! `{% if cond %}...{% else %}...{% endif %}` and
//! `{% for item in list %}...{% endfor %}`.
//!
//! Rendering runs three phases in a fixed order, each rewriting the output of
//! the previous one: loops are expanded, then conditionals, then variable
//! references. Blocks do not nest; delimiters pair first-match, so an inner
//! `{% endif %}` closes the outer `{% if %}`. Unmatched tags stay in the output
//! as literal text. Substituted values are never rendered again within the
//! same call, so feeding the output back in may substitute further.

use std::{collections::HashMap, sync::LazyLock};

use regex::{Captures, Regex};
use serde_json::{Number, Value};
use tracing::{debug, trace};

use crate::{
    error::RenderError,
    models::{draft::Draft, template::RenderedContent},
};

pub type Variables = HashMap<String, Value>;

static FOR_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\{%\s*for\s+([[:word:]]+)\s+in\s+([[:word:]]+)\s*%\}([\s\S]*?)\{%\s*endfor\s*%\}",
    )
    .unwrap()
});

static IF_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\{%\s*if\s+([[:word:]]+)\s*%\}([\s\S]*?)(?:\{%\s*else\s*%\}([\s\S]*?))?\{%\s*endif\s*%\}",
    )
    .unwrap()
});

static IF_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{%\s*if\s+([[:word:]]+)\s*%\}").unwrap());

static ITEM_PROPERTY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([[:word:]]+)\.([[:word:]]+)\s*\}\}").unwrap()
});

static ITEM_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([[:word:]]+)\s*\}\}").unwrap());

static VARIABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([[:word:]]+(?:\.[[:word:]]+)*)\s*\}\}").unwrap()
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{%([\s\S]*?)%\}").unwrap());

static EXPRESSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([\s\S]*?)\}\}").unwrap());

static FOR_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^for\s+[[:word:]]+\s+in\s+[[:word:]]+$").unwrap()
});

static IF_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^if\s+[[:word:]]+$").unwrap());

static PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[[:word:]]+(?:\.[[:word:]]+)*$").unwrap());

/// Renders `template` against `variables`.
///
/// Total over any input: unresolved references become empty strings and
/// malformed tags pass through unchanged.
pub fn render(template: &str, variables: &Variables) -> String {
    let mut missing = Vec::new();
    render_phases(template, variables, &mut missing)
}

/// Like [`render`], but fails on the first `{{ path }}` that does not resolve.
///
/// A path resolving to `null` counts as present.
pub fn render_strict(template: &str, variables: &Variables) -> Result<String, RenderError> {
    let mut missing = Vec::new();
    let rendered = render_phases(template, variables, &mut missing);

    match missing.into_iter().next() {
        Some(path) => Err(RenderError::MissingVariable { path }),
        None => Ok(rendered),
    }
}

/// Renders every template field of a draft with the same variable bag.
pub fn render_content(draft: &Draft, variables: &Variables) -> RenderedContent {
    debug!(
        variable_count = variables.len(),
        html_len = draft.body_html.len(),
        "Rendering draft content"
    );

    RenderedContent {
        subject: render(&draft.subject, variables),
        html: render(&draft.body_html, variables),
        text: render(&draft.body_text, variables),
    }
}

fn render_phases(template: &str, variables: &Variables, missing: &mut Vec<String>) -> String {
    let expanded = expand_loops(template, variables);
    let resolved = expand_conditionals(&expanded, variables);
    let rendered = substitute_variables(&resolved, variables, missing);

    trace!(
        input_len = template.len(),
        output_len = rendered.len(),
        unresolved = missing.len(),
        "Template rendered"
    );

    rendered
}

fn expand_loops(template: &str, variables: &Variables) -> String {
    FOR_BLOCK
        .replace_all(template, |caps: &Captures<'_>| {
            let item_var = &caps[1];
            let list_var = &caps[2];
            let body = &caps[3];

            match variables.get(list_var) {
                Some(Value::Array(items)) => items
                    .iter()
                    .map(|item| expand_loop_body(body, item_var, item))
                    .collect::<String>(),
                _ => {
                    debug!(list = list_var, "Loop source is not an array, dropping block");
                    String::new()
                }
            }
        })
        .into_owned()
}

fn expand_loop_body(body: &str, item_var: &str, item: &Value) -> String {
    let with_properties = ITEM_PROPERTY.replace_all(body, |caps: &Captures<'_>| {
        if &caps[1] == item_var {
            lookup(item, &caps[2]).map(stringify).unwrap_or_default()
        } else {
            caps[0].to_string()
        }
    });

    ITEM_REFERENCE
        .replace_all(&with_properties, |caps: &Captures<'_>| {
            if &caps[1] == item_var {
                stringify(item)
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

fn expand_conditionals(template: &str, variables: &Variables) -> String {
    IF_BLOCK
        .replace_all(template, |caps: &Captures<'_>| {
            if is_truthy(variables.get(&caps[1])) {
                caps[2].to_string()
            } else {
                caps.get(3)
                    .map(|branch| branch.as_str().to_string())
                    .unwrap_or_default()
            }
        })
        .into_owned()
}

fn substitute_variables(template: &str, variables: &Variables, missing: &mut Vec<String>) -> String {
    VARIABLE
        .replace_all(template, |caps: &Captures<'_>| {
            let path = &caps[1];
            match resolve_path(variables, path) {
                Some(value) => stringify(value),
                None => {
                    missing.push(path.to_string());
                    String::new()
                }
            }
        })
        .into_owned()
}

/// Condition truthiness: `true`, any non-empty string other than `"false"`,
/// or any non-zero number. Everything else, absence included, is false.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(s)) => !s.is_empty() && s != "false",
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    }
}

/// String form of a value as it appears in rendered output.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(n) => format_number(n),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn format_number(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f == 0.0 => "0".to_string(),
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{f:.0}"),
        _ => n.to_string(),
    }
}

fn lookup<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|index| items.get(index)),
        _ => None,
    }
}

fn resolve_path<'a>(variables: &'a Variables, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let root = variables.get(segments.next()?)?;
    segments.try_fold(root, |value, key| lookup(value, key))
}

/// Checks `template` against the supported grammar.
///
/// Reports the earliest problem: an unknown or malformed tag, an unterminated
/// tag or expression, a stray `else`/`endif`/`endfor`, a nested block, or a
/// block left open. Never affects what [`render`] produces.
pub fn validate_syntax(template: &str) -> Result<(), RenderError> {
    let earliest = [check_blocks(template), check_expressions(template)]
        .into_iter()
        .flatten()
        .min_by_key(|(offset, _)| *offset);

    match earliest {
        Some((offset, message)) => Err(RenderError::Syntax { offset, message }),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    If,
    For,
}

impl Block {
    fn keyword(&self) -> &str {
        match self {
            Block::If => "if",
            Block::For => "for",
        }
    }
}

struct OpenBlock {
    kind: Block,
    offset: usize,
    has_else: bool,
}

fn check_blocks(template: &str) -> Option<(usize, String)> {
    let mut open: Option<OpenBlock> = None;
    let mut scanned = 0;

    for caps in TAG.captures_iter(template) {
        let tag = caps.get(0)?;
        let offset = tag.start();
        let inner = caps[1].trim();
        scanned = tag.end();

        let opens = if FOR_TAG.is_match(inner) {
            Some(Block::For)
        } else if IF_TAG.is_match(inner) {
            Some(Block::If)
        } else {
            None
        };

        if let Some(kind) = opens {
            if let Some(outer) = &open {
                return Some((
                    offset,
                    format!(
                        "nested '{}' inside '{}' is not supported",
                        kind.keyword(),
                        outer.kind.keyword()
                    ),
                ));
            }
            open = Some(OpenBlock {
                kind,
                offset,
                has_else: false,
            });
            continue;
        }

        match inner {
            "else" => match open.as_mut() {
                Some(block) if block.kind == Block::If && !block.has_else => {
                    block.has_else = true;
                }
                Some(block) if block.kind == Block::If => {
                    return Some((offset, "duplicate 'else' in 'if' block".to_string()));
                }
                _ => return Some((offset, "'else' without matching 'if'".to_string())),
            },
            "endif" | "endfor" => {
                let expected = if inner == "endif" { Block::If } else { Block::For };
                match open.take() {
                    Some(block) if block.kind == expected => {}
                    _ => {
                        return Some((
                            offset,
                            format!("'{}' without matching '{}'", inner, expected.keyword()),
                        ));
                    }
                }
            }
            _ => {
                let keyword = inner.split_whitespace().next().unwrap_or_default();
                return Some((offset, format!("unsupported or malformed tag '{}'", keyword)));
            }
        }
    }

    let unterminated = template[scanned..]
        .find("{%")
        .map(|position| (scanned + position, "unterminated tag".to_string()));
    let unclosed = open.map(|block| {
        (
            block.offset,
            format!("unclosed '{}' block", block.kind.keyword()),
        )
    });

    [unclosed, unterminated]
        .into_iter()
        .flatten()
        .min_by_key(|(offset, _)| *offset)
}

fn check_expressions(template: &str) -> Option<(usize, String)> {
    let mut scanned = 0;

    for caps in EXPRESSION.captures_iter(template) {
        let expression = caps.get(0)?;
        let inner = caps[1].trim();
        scanned = expression.end();

        if !PATH.is_match(inner) {
            return Some((
                expression.start(),
                format!("unsupported expression '{}'", inner),
            ));
        }
    }

    template[scanned..]
        .find("{{")
        .map(|position| (scanned + position, "unterminated expression".to_string()))
}

/// Top-level variable names read by `template`, in order of first appearance.
///
/// Inside a loop body, `{{ item }}` and `{{ item.prop }}` refer to the loop
/// item and are not included.
pub fn referenced_variables(template: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = 0;

    for caps in FOR_BLOCK.captures_iter(template) {
        let Some(block) = caps.get(0) else {
            continue;
        };

        collect_references(&template[cursor..block.start()], None, &mut names);
        push_unique(&mut names, &caps[2]);
        collect_references(&caps[3], Some(&caps[1]), &mut names);
        cursor = block.end();
    }

    collect_references(&template[cursor..], None, &mut names);
    names
}

fn collect_references(segment: &str, item_var: Option<&str>, names: &mut Vec<String>) {
    let conditions = IF_OPEN
        .captures_iter(segment)
        .filter_map(|caps| Some((caps.get(0)?.start(), caps.get(1)?.as_str())));

    // Only `{{ item }}` and `{{ item.prop }}` are bound to the loop item;
    // conditions and deeper paths still read the bag.
    let expressions = VARIABLE.captures_iter(segment).filter_map(|caps| {
        let path = caps.get(1)?;
        let mut segments = path.as_str().split('.');
        let root = segments.next()?;
        let bound_to_item = Some(root) == item_var && segments.nth(1).is_none();
        (!bound_to_item).then_some((path.start(), root))
    });

    let mut found: Vec<(usize, &str)> = conditions.chain(expressions).collect();
    found.sort_by_key(|(position, _)| *position);

    for (_, name) in found {
        push_unique(names, name);
    }
}

fn push_unique(names: &mut Vec<String>, name: &str) {
    if !names.iter().any(|existing| existing == name) {
        names.push(name.to_string());
    }
}
