//! Pattern compilation behind a dialect switch.
//!
//! The native dialect hands patterns to the host engines directly, preferring
//! the linear-time `regex` engine and falling back to `fancy-regex` for
//! backtracking features. The ECMA dialect first rewrites the pattern per
//! ECMA-262 semantics (see [`ecma`]), rejecting constructs that are invalid
//! there. Resolved patterns are cached by pattern string during compilation.

pub(crate) mod ecma;

use std::sync::Arc;

use ahash::AHashMap;

use crate::error::SchemaError;

/// User-supplied pattern matcher.
pub trait PatternMatch: Send + Sync {
    /// Unanchored match, per the `pattern` keyword contract.
    fn is_match(&self, text: &str) -> bool;
}

/// User-supplied compilation of pattern strings, the `regexp_resolver`
/// extension point.
pub trait PatternResolver: Send + Sync {
    fn resolve(
        &self,
        pattern: &str,
    ) -> Result<Arc<dyn PatternMatch>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Which dialect `pattern`, `patternProperties`, and `propertyNames` patterns
/// are interpreted in.
#[derive(Clone, Default)]
pub enum PatternEngine {
    /// Compile with the host engines as-is.
    #[default]
    Native,
    /// Translate ECMA-262 constructs before compiling.
    Ecma,
    Custom(Arc<dyn PatternResolver>),
}

impl std::fmt::Debug for PatternEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternEngine::Native => f.write_str("Native"),
            PatternEngine::Ecma => f.write_str("Ecma"),
            PatternEngine::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// A compiled pattern, engine-erased.
pub(crate) enum CompiledPattern {
    Standard(regex::Regex),
    Fancy(fancy_regex::Regex),
    Custom(Arc<dyn PatternMatch>),
}

impl std::fmt::Debug for CompiledPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompiledPattern::Standard(r) => f.debug_tuple("Standard").field(r).finish(),
            CompiledPattern::Fancy(r) => f.debug_tuple("Fancy").field(r).finish(),
            CompiledPattern::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl CompiledPattern {
    /// Unanchored match. Backtracking limits are treated as a non-match.
    pub(crate) fn is_match(&self, text: &str) -> bool {
        match self {
            CompiledPattern::Standard(re) => re.is_match(text),
            CompiledPattern::Fancy(re) => re.is_match(text).unwrap_or(false),
            CompiledPattern::Custom(matcher) => matcher.is_match(text),
        }
    }
}

fn compile_host(pattern: &str) -> Result<CompiledPattern, SchemaError> {
    match regex::Regex::new(pattern) {
        Ok(re) => Ok(CompiledPattern::Standard(re)),
        // Lookaround and backreferences need the backtracking engine.
        Err(_) => fancy_regex::Regex::new(pattern)
            .map(CompiledPattern::Fancy)
            .map_err(|error| SchemaError::InvalidRegexpResolution {
                pattern: pattern.to_string(),
                message: error.to_string(),
            }),
    }
}

/// Per-validator pattern cache, populated during compilation only.
pub(crate) struct PatternCache {
    engine: PatternEngine,
    resolved: AHashMap<String, Arc<CompiledPattern>>,
}

impl PatternCache {
    pub(crate) fn new(engine: PatternEngine) -> PatternCache {
        PatternCache {
            engine,
            resolved: AHashMap::new(),
        }
    }

    pub(crate) fn resolve(&mut self, pattern: &str) -> Result<Arc<CompiledPattern>, SchemaError> {
        if let Some(compiled) = self.resolved.get(pattern) {
            return Ok(Arc::clone(compiled));
        }
        let compiled = match &self.engine {
            PatternEngine::Native => compile_host(pattern)?,
            PatternEngine::Ecma => {
                let translated = ecma::translate(pattern)?;
                compile_host(&translated)?
            }
            PatternEngine::Custom(resolver) => CompiledPattern::Custom(
                resolver
                    .resolve(pattern)
                    .map_err(|error| SchemaError::InvalidRegexpResolution {
                        pattern: pattern.to_string(),
                        message: error.to_string(),
                    })?,
            ),
        };
        let compiled = Arc::new(compiled);
        self.resolved
            .insert(pattern.to_string(), Arc::clone(&compiled));
        Ok(compiled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_returns_the_same_compilation() {
        let mut cache = PatternCache::new(PatternEngine::Native);
        let first = cache.resolve("^a+$").expect("compiles");
        let second = cache.resolve("^a+$").expect("cached");
        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.is_match("aaa"));
        assert!(!first.is_match("b"));
    }

    #[test]
    fn lookahead_falls_back_to_the_backtracking_engine() {
        let mut cache = PatternCache::new(PatternEngine::Native);
        let compiled = cache.resolve("^(?=a)ab$").expect("fancy handles lookahead");
        assert!(matches!(*compiled, CompiledPattern::Fancy(_)));
        assert!(compiled.is_match("ab"));
    }

    #[test]
    fn unanchored_matching() {
        let mut cache = PatternCache::new(PatternEngine::Native);
        let compiled = cache.resolve("b+").expect("compiles");
        assert!(compiled.is_match("abc"));
    }

    #[test]
    fn broken_patterns_error() {
        let mut cache = PatternCache::new(PatternEngine::Native);
        let error = cache.resolve("(unclosed").expect_err("invalid");
        assert!(matches!(error, SchemaError::InvalidRegexpResolution { .. }));
    }
}
