//! Field style validation
//!
//! Style checks are a fixed table of disallowed-pattern tests per
//! dialect. Coherence rules live on the schemas themselves; this module
//! only knows how to run a single field's content against a dialect.

use std::sync::LazyLock;

use regex::Regex;
use sn_schema::{StyleDialect, ValidationReport};

struct DisallowedPattern {
    pattern: &'static LazyLock<Regex>,
    message: &'static str,
    hint: &'static str,
}

static ARROW_FN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"=>").unwrap());
static LET_DECL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\blet\s").unwrap());
static CONST_DECL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bconst\s").unwrap());
static TEMPLATE_LITERAL: LazyLock<Regex> = LazyLock::new(|| Regex::new("`").unwrap());
static ASYNC_FN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\basync\s+function\b").unwrap());
static AWAIT_EXPR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bawait\s").unwrap());
static CLASS_DECL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bclass\s+[A-Za-z_]").unwrap());

/// Constructs rejected by the legacy ES5 server runtime.
static LEGACY_ES5_DISALLOWED: &[DisallowedPattern] = &[
    DisallowedPattern {
        pattern: &ARROW_FN,
        message: "arrow functions are not supported by the legacy server runtime",
        hint: "use a function expression: function(...) { ... }",
    },
    DisallowedPattern {
        pattern: &LET_DECL,
        message: "`let` declarations are not supported by the legacy server runtime",
        hint: "declare with `var` instead",
    },
    DisallowedPattern {
        pattern: &CONST_DECL,
        message: "`const` declarations are not supported by the legacy server runtime",
        hint: "declare with `var` instead",
    },
    DisallowedPattern {
        pattern: &TEMPLATE_LITERAL,
        message: "template literals are not supported by the legacy server runtime",
        hint: "concatenate strings with `+`",
    },
    DisallowedPattern {
        pattern: &ASYNC_FN,
        message: "`async function` is not supported by the legacy server runtime",
        hint: "server scripts run synchronously; remove the async keyword",
    },
    DisallowedPattern {
        pattern: &AWAIT_EXPR,
        message: "`await` is not supported by the legacy server runtime",
        hint: "server scripts run synchronously; remove the await expression",
    },
    DisallowedPattern {
        pattern: &CLASS_DECL,
        message: "`class` declarations are not supported by the legacy server runtime",
        hint: "use Class.create() or a constructor function",
    },
];

/// Run a dialect's disallowed-pattern tests against stripped content.
pub fn check_style(content: &str, dialect: StyleDialect) -> ValidationReport {
    let patterns = match dialect {
        StyleDialect::LegacyEs5 => LEGACY_ES5_DISALLOWED,
    };

    let mut report = ValidationReport::ok();
    for disallowed in patterns {
        if disallowed.pattern.is_match(content) {
            report.push_error(disallowed.message);
            report.push_hint(disallowed.hint);
        }
    }
    report
}
