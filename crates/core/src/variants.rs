//! Variant Resolution

use thiserror::Error;

use crate::catalog::Variant;

/// Errors resolving the variant a cart line refers to.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VariantError {
    /// Several active variants exist, none is the default, and no code was supplied.
    #[error("a variant must be chosen for this item")]
    VariantRequired,

    /// The requested code matched no active variant.
    #[error("no active variant matches `{0}`")]
    VariantNotFound(String),
}

impl VariantError {
    /// Stable machine code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            VariantError::VariantRequired => "variantRequired",
            VariantError::VariantNotFound(_) => "variantNotFound",
        }
    }
}

/// Lowercase, trim and collapse inner whitespace.
fn normalize(value: &str) -> String {
    value
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn matches_requested(variant: &Variant, requested: &str) -> bool {
    let code = std::iter::once(variant.code.as_str());
    let slug = variant.slug.as_deref().into_iter();

    code.chain(slug)
        .chain(variant.name.values())
        .chain(variant.size_label.values())
        .any(|candidate| normalize(candidate) == requested)
}

/// Pick the variant a line is priced against.
///
/// A requested code is matched loosely against each active variant's code, slug and
/// every localized name and size label, since storefronts may submit a label. Without a
/// code the active default wins, then a sole active variant. Items with no variants
/// resolve to `None` and are priced from item-level entries.
///
/// # Errors
///
/// - [`VariantError::VariantNotFound`]: the requested code matched nothing.
/// - [`VariantError::VariantRequired`]: the choice is ambiguous.
pub fn resolve_variant<'a>(
    variants: &'a [Variant],
    requested: Option<&str>,
) -> Result<Option<&'a Variant>, VariantError> {
    if variants.is_empty() {
        return Ok(None);
    }

    let mut active = variants.iter().filter(|variant| variant.is_active);

    if let Some(requested) = requested.filter(|code| !code.trim().is_empty()) {
        let wanted = normalize(requested);

        return active
            .find(|variant| matches_requested(variant, &wanted))
            .map(Some)
            .ok_or_else(|| VariantError::VariantNotFound(requested.to_string()));
    }

    if let Some(default) = variants
        .iter()
        .find(|variant| variant.is_active && variant.is_default)
    {
        return Ok(Some(default));
    }

    match (active.next(), active.next()) {
        (Some(only), None) => Ok(Some(only)),
        _ => Err(VariantError::VariantRequired),
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;
    use crate::{catalog::TranslatedLabel, prices::PriceSource};

    fn variant(code: &str) -> Variant {
        Variant {
            code: code.to_string(),
            slug: None,
            name: TranslatedLabel::default(),
            size_label: TranslatedLabel::default(),
            is_default: false,
            is_active: true,
            prices: PriceSource::default(),
        }
    }

    fn codes(resolved: Option<&Variant>) -> Option<&str> {
        resolved.map(|variant| variant.code.as_str())
    }

    #[test]
    fn items_without_variants_resolve_to_none() -> TestResult {
        assert_eq!(resolve_variant(&[], None)?, None);
        assert_eq!(resolve_variant(&[], Some("large"))?, None);

        Ok(())
    }

    #[test]
    fn requested_code_matches_loosely() -> TestResult {
        let mut large = variant("lg");
        large.slug = Some("large-pizza".to_string());
        large.size_label = TranslatedLabel {
            en: Some("Large".to_string()),
            es: Some("Grande  Familiar".to_string()),
            ..TranslatedLabel::default()
        };

        let variants = [variant("sm"), large];

        assert_eq!(codes(resolve_variant(&variants, Some(" LG "))?), Some("lg"));
        assert_eq!(codes(resolve_variant(&variants, Some("Large-Pizza"))?), Some("lg"));
        assert_eq!(codes(resolve_variant(&variants, Some("large"))?), Some("lg"));
        assert_eq!(
            codes(resolve_variant(&variants, Some("grande familiar"))?),
            Some("lg")
        );

        Ok(())
    }

    #[test]
    fn unmatched_code_is_not_found() {
        let variants = [variant("sm"), variant("lg")];

        assert_eq!(
            resolve_variant(&variants, Some("xl")),
            Err(VariantError::VariantNotFound("xl".to_string()))
        );
    }

    #[test]
    fn inactive_variants_never_match() {
        let mut retired = variant("xl");
        retired.is_active = false;

        let variants = [variant("sm"), retired];

        assert_eq!(
            resolve_variant(&variants, Some("xl")),
            Err(VariantError::VariantNotFound("xl".to_string()))
        );
    }

    #[test]
    fn default_variant_is_used_without_a_code() -> TestResult {
        let mut medium = variant("md");
        medium.is_default = true;

        let variants = [variant("sm"), medium, variant("lg")];

        assert_eq!(codes(resolve_variant(&variants, None)?), Some("md"));
        assert_eq!(codes(resolve_variant(&variants, Some("  "))?), Some("md"));

        Ok(())
    }

    #[test]
    fn sole_active_variant_is_used_without_a_code() -> TestResult {
        let mut retired = variant("old");
        retired.is_active = false;

        let variants = [retired, variant("only")];

        assert_eq!(codes(resolve_variant(&variants, None)?), Some("only"));

        Ok(())
    }

    #[test]
    fn ambiguous_choice_requires_a_variant() {
        let variants = [variant("sm"), variant("lg")];

        assert_eq!(
            resolve_variant(&variants, None),
            Err(VariantError::VariantRequired)
        );
        assert_eq!(VariantError::VariantRequired.code(), "variantRequired");
    }
}
