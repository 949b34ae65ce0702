//! Unit-of-measure compatibility for package matching.
//!
//! A package can only satisfy a prescription when its unit of measure is
//! equivalent to the prescribed unit. Equivalence is deliberately narrow:
//! exact match, simple plurals, and a fixed alias table. Unmatched units
//! are incompatible — never coerced, never fuzzy-matched.

/// Fixed alias table mapping pharmacy unit spellings to a canonical family.
///
/// Same-magnitude aliases only: mg↔g is a conversion, not a synonym, and
/// stays incompatible here.
const UNIT_SYNONYMS: &[(&str, &str)] = &[
    ("tab", "tablet"),
    ("tabs", "tablet"),
    ("tablet", "tablet"),
    ("tablets", "tablet"),
    ("cap", "capsule"),
    ("caps", "capsule"),
    ("capsule", "capsule"),
    ("capsules", "capsule"),
    ("ml", "ml"),
    ("milliliter", "ml"),
    ("milliliters", "ml"),
    ("millilitre", "ml"),
    ("millilitres", "ml"),
    ("cc", "ml"),
    ("mg", "mg"),
    ("milligram", "mg"),
    ("milligrams", "mg"),
    ("g", "g"),
    ("gm", "g"),
    ("gram", "g"),
    ("grams", "g"),
    ("mcg", "mcg"),
    ("ug", "mcg"),
    ("µg", "mcg"),
    ("microgram", "mcg"),
    ("micrograms", "mcg"),
    ("ea", "each"),
    ("each", "each"),
];

/// Decide whether a package's unit of measure can satisfy the prescribed
/// unit. Rules applied in order: (a) exact match, (b) simple plural
/// (`x` vs `x+"s"` / `x+"es"`), (c) the fixed synonym table.
pub fn units_compatible(package_unit: &str, needed_unit: &str) -> bool {
    let package = package_unit.trim().to_lowercase();
    let needed = needed_unit.trim().to_lowercase();

    if package.is_empty() || needed.is_empty() {
        return false;
    }
    if package == needed {
        return true;
    }
    if is_plural_pair(&package, &needed) {
        return true;
    }

    match (canonical_family(&package), canonical_family(&needed)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Canonical family for a (lowercased) unit spelling, if the table knows it.
fn canonical_family(unit: &str) -> Option<&'static str> {
    UNIT_SYNONYMS
        .iter()
        .find(|(alias, _)| *alias == unit)
        .map(|(_, family)| *family)
}

/// `x` vs `x+"s"` or `x` vs `x+"es"`, in either direction.
fn is_plural_pair(a: &str, b: &str) -> bool {
    plural_of(a, b) || plural_of(b, a)
}

fn plural_of(plural: &str, singular: &str) -> bool {
    plural.strip_suffix('s') == Some(singular) || plural.strip_suffix("es") == Some(singular)
}
