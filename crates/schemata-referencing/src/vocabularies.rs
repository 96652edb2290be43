use serde_json::{Map, Value};

use crate::Error;

/// A named bundle of keywords with shared semantics, selected via `$vocabulary`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vocabulary {
    Core,
    Applicator,
    Unevaluated,
    Validation,
    MetaData,
    FormatAnnotation,
    FormatAssertion,
    Content,
    /// The OpenAPI 3.1 base vocabulary (`discriminator`, `xml`, …).
    OasBase,
}

impl Vocabulary {
    /// The canonical URI declared in `$vocabulary` objects.
    #[must_use]
    pub fn uri(self) -> &'static str {
        match self {
            Vocabulary::Core => "https://json-schema.org/draft/2020-12/vocab/core",
            Vocabulary::Applicator => "https://json-schema.org/draft/2020-12/vocab/applicator",
            Vocabulary::Unevaluated => "https://json-schema.org/draft/2020-12/vocab/unevaluated",
            Vocabulary::Validation => "https://json-schema.org/draft/2020-12/vocab/validation",
            Vocabulary::MetaData => "https://json-schema.org/draft/2020-12/vocab/meta-data",
            Vocabulary::FormatAnnotation => {
                "https://json-schema.org/draft/2020-12/vocab/format-annotation"
            }
            Vocabulary::FormatAssertion => {
                "https://json-schema.org/draft/2020-12/vocab/format-assertion"
            }
            Vocabulary::Content => "https://json-schema.org/draft/2020-12/vocab/content",
            Vocabulary::OasBase => "https://spec.openapis.org/oas/3.1/vocab/base",
        }
    }

    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Vocabulary> {
        [
            Vocabulary::Core,
            Vocabulary::Applicator,
            Vocabulary::Unevaluated,
            Vocabulary::Validation,
            Vocabulary::MetaData,
            Vocabulary::FormatAnnotation,
            Vocabulary::FormatAssertion,
            Vocabulary::Content,
            Vocabulary::OasBase,
        ]
        .into_iter()
        .find(|vocabulary| vocabulary.uri() == uri)
    }
}

/// An ordered set of active vocabularies.
///
/// Order matters: keyword evaluation follows vocabulary declaration order, so
/// `items` (applicator) runs before `unevaluatedItems` (unevaluated) runs
/// before nothing else touches the same annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabularySet {
    ordered: Vec<Vocabulary>,
}

impl VocabularySet {
    /// The Draft 2020-12 default dialect, in meta-schema declaration order.
    #[must_use]
    pub fn draft2020_12() -> VocabularySet {
        VocabularySet {
            ordered: vec![
                Vocabulary::Core,
                Vocabulary::Applicator,
                Vocabulary::Unevaluated,
                Vocabulary::Validation,
                Vocabulary::MetaData,
                Vocabulary::FormatAnnotation,
                Vocabulary::Content,
            ],
        }
    }

    /// The OpenAPI 3.1 base dialect: Draft 2020-12 plus the OAS base vocabulary.
    #[must_use]
    pub fn openapi3_1() -> VocabularySet {
        let mut set = VocabularySet::draft2020_12();
        set.ordered.push(Vocabulary::OasBase);
        set
    }

    /// Build a set from a `$vocabulary` object, preserving declaration order.
    ///
    /// Unknown vocabularies marked required are an error; unknown optional
    /// vocabularies are skipped.
    pub fn from_object(object: &Map<String, Value>) -> Result<VocabularySet, Error> {
        let mut ordered = Vec::with_capacity(object.len());
        for (uri, required) in object {
            match Vocabulary::from_uri(uri) {
                Some(vocabulary) => ordered.push(vocabulary),
                None if required == &Value::Bool(true) => {
                    return Err(Error::UnknownVocabulary { uri: uri.clone() });
                }
                None => {
                    tracing::debug!(vocabulary = %uri, "skipping unknown optional vocabulary");
                }
            }
        }
        Ok(VocabularySet { ordered })
    }

    #[must_use]
    pub fn contains(&self, vocabulary: Vocabulary) -> bool {
        self.ordered.contains(&vocabulary)
    }

    pub fn iter(&self) -> impl Iterator<Item = Vocabulary> + '_ {
        self.ordered.iter().copied()
    }

    /// Force `format` into assertion mode by swapping the annotation vocabulary.
    pub fn assert_formats(&mut self) {
        for vocabulary in &mut self.ordered {
            if *vocabulary == Vocabulary::FormatAnnotation {
                *vocabulary = Vocabulary::FormatAssertion;
                return;
            }
        }
        self.ordered.push(Vocabulary::FormatAssertion);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn declaration_order_is_preserved() {
        let object = json!({
            "https://json-schema.org/draft/2020-12/vocab/validation": true,
            "https://json-schema.org/draft/2020-12/vocab/core": true,
        });
        let set = VocabularySet::from_object(object.as_object().expect("object"))
            .expect("known vocabularies");
        let ordered: Vec<_> = set.iter().collect();
        assert_eq!(ordered, [Vocabulary::Validation, Vocabulary::Core]);
    }

    #[test]
    fn unknown_required_vocabulary_is_an_error() {
        let object = json!({"https://example.com/vocab/custom": true});
        let error = VocabularySet::from_object(object.as_object().expect("object"))
            .expect_err("unknown required vocabulary");
        assert!(matches!(error, Error::UnknownVocabulary { .. }));
    }

    #[test]
    fn unknown_optional_vocabulary_is_skipped() {
        let object = json!({
            "https://json-schema.org/draft/2020-12/vocab/core": true,
            "https://example.com/vocab/custom": false,
        });
        let set = VocabularySet::from_object(object.as_object().expect("object"))
            .expect("optional unknowns are fine");
        assert_eq!(set.iter().count(), 1);
    }

    #[test]
    fn format_assertion_swap() {
        let mut set = VocabularySet::draft2020_12();
        assert!(!set.contains(Vocabulary::FormatAssertion));
        set.assert_formats();
        assert!(set.contains(Vocabulary::FormatAssertion));
        assert!(!set.contains(Vocabulary::FormatAnnotation));
    }
}
