//! Scaffold stripping
//!
//! Removes injected wrapper scaffolds before any content is compared to a
//! baseline or pushed back. Earlier tool versions wrapped with slightly
//! different shells, so the strip pass knows every historical variant and
//! repeats until the content stops shrinking; nested or duplicated
//! scaffolding comes off completely, not one layer at a time.

use sn_schema::WrapperSpec;

/// Which kind of content a historical wrapper pair was injected into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PairFamily {
    Script,
    Markup,
    /// The marker-comment scaffold wrapped any field kind.
    Any,
}

impl PairFamily {
    /// The family a schema wrapper belongs to.
    fn of(spec: &WrapperSpec) -> Self {
        if spec.header.starts_with('<') {
            Self::Markup
        } else {
            Self::Script
        }
    }

    fn applies_to(self, family: Option<PairFamily>) -> bool {
        match family {
            // No wrapper spec means the content kind is unknown;
            // every historical pair stays in play.
            None => true,
            Some(family) => self == Self::Any || self == family,
        }
    }
}

/// Header/footer pairs injected by current and earlier tool versions.
const KNOWN_WRAPPER_PAIRS: &[(&str, &str, PairFamily)] = &[
    ("(function() {", "})();", PairFamily::Script),
    ("(function(){", "})();", PairFamily::Script),
    ("api.controller = function(api) {", "};", PairFamily::Script),
    ("<div>", "</div>", PairFamily::Markup),
    // Marker-comment scaffold from the first release
    (
        "// BEGIN sn-sync scaffold",
        "// END sn-sync scaffold",
        PairFamily::Any,
    ),
];

/// Strip all recognized scaffolds from `content`.
///
/// `spec` adds the schema's own wrapper pair to the known set and narrows
/// the historical variants to the ones matching its content kind, so a
/// markup pair is never tried against a script field (or vice versa). The
/// result is trimmed of outer whitespace; stripping is idempotent:
/// `strip(strip(x)) == strip(x)`.
pub fn strip_scaffold(content: &str, spec: Option<&WrapperSpec>) -> String {
    let family = spec.map(PairFamily::of);
    let mut current = content.trim().to_string();

    loop {
        let before = current.len();

        if let Some(spec) = spec {
            current = strip_pair(&current, spec.header, spec.footer);
        }
        for (header, footer, pair_family) in KNOWN_WRAPPER_PAIRS {
            if pair_family.applies_to(family) {
                current = strip_pair(&current, header, footer);
            }
        }

        if current.len() == before {
            return current;
        }
    }
}

/// Remove one `header`/`footer` layer if both enclose the content.
fn strip_pair(content: &str, header: &str, footer: &str) -> String {
    let trimmed = content.trim();
    if trimmed.len() <= header.len() + footer.len() {
        // A bare scaffold with no interior still counts as one layer
        if trimmed == format!("{header}\n{footer}") || trimmed == format!("{header}{footer}") {
            return String::new();
        }
        return trimmed.to_string();
    }
    if trimmed.starts_with(header) && trimmed.ends_with(footer) {
        let inner = &trimmed[header.len()..trimmed.len() - footer.len()];
        inner.trim().to_string()
    } else {
        trimmed.to_string()
    }
}
