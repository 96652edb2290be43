//! Numeric bounds and `multipleOf`.

use std::cmp::Ordering;

use fraction::BigFraction;
use serde_json::{Map, Number, Value};

use crate::compiler::Ctx;
use crate::error::SchemaError;
use crate::evaluation::{AdjacentResults, Evaluation, EvaluationContext};
use crate::node::{Evaluate, Keyword};
use crate::paths::LazyLocation;

use super::helpers::compare;
use super::KeywordCore;

#[derive(Clone, Copy)]
enum Bound {
    Maximum,
    ExclusiveMaximum,
    Minimum,
    ExclusiveMinimum,
}

impl Bound {
    fn holds(self, ordering: Ordering) -> bool {
        match self {
            Bound::Maximum => ordering != Ordering::Greater,
            Bound::ExclusiveMaximum => ordering == Ordering::Less,
            Bound::Minimum => ordering != Ordering::Less,
            Bound::ExclusiveMinimum => ordering == Ordering::Greater,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Bound::Maximum => "greater than",
            Bound::ExclusiveMaximum => "greater than or equal to",
            Bound::Minimum => "less than",
            Bound::ExclusiveMinimum => "less than or equal to",
        }
    }
}

pub(crate) struct BoundEvaluator {
    core: KeywordCore,
    bound: Bound,
    limit: Number,
}

impl BoundEvaluator {
    fn check(&self, instance: &Value) -> bool {
        let Value::Number(number) = instance else {
            return true;
        };
        compare(number, &self.limit).is_some_and(|ordering| self.bound.holds(ordering))
    }
}

impl Evaluate for BoundEvaluator {
    fn evaluate(
        &self,
        instance: &Value,
        iloc: &LazyLocation,
        kloc: &LazyLocation,
        _ctx: &mut EvaluationContext,
        _adjacent: &AdjacentResults,
    ) -> Option<Evaluation> {
        let kloc = kloc.push(self.core.name.as_ref());
        Some(if self.check(instance) {
            self.core.pass(iloc, &kloc, None, Vec::new())
        } else {
            let message = format!(
                "number at {} is {} {}",
                iloc.resolve().formatted(),
                self.bound.describe(),
                self.limit
            );
            let tag = self.core.name.to_string();
            self.core
                .fail(instance, iloc, &kloc, tag, message, None, Vec::new())
        })
    }

    fn is_valid(&self, instance: &Value, _ctx: &mut EvaluationContext) -> bool {
        self.check(instance)
    }
}

fn compile_bound(
    value: &Value,
    core: KeywordCore,
    bound: Bound,
) -> Result<Option<Keyword>, SchemaError> {
    let Value::Number(limit) = value else {
        return Ok(None);
    };
    Ok(Some(Keyword {
        kind: core.kind,
        evaluator: Box::new(BoundEvaluator {
            core,
            bound,
            limit: limit.clone(),
        }),
    }))
}

pub(crate) fn compile_maximum(
    _ctx: &mut Ctx<'_>,
    _parent: &Map<String, Value>,
    value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    compile_bound(value, core, Bound::Maximum)
}

pub(crate) fn compile_exclusive_maximum(
    _ctx: &mut Ctx<'_>,
    _parent: &Map<String, Value>,
    value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    compile_bound(value, core, Bound::ExclusiveMaximum)
}

pub(crate) fn compile_minimum(
    _ctx: &mut Ctx<'_>,
    _parent: &Map<String, Value>,
    value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    compile_bound(value, core, Bound::Minimum)
}

pub(crate) fn compile_exclusive_minimum(
    _ctx: &mut Ctx<'_>,
    _parent: &Map<String, Value>,
    value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    compile_bound(value, core, Bound::ExclusiveMinimum)
}

pub(crate) struct MultipleOfEvaluator {
    core: KeywordCore,
    divisor: Number,
}

/// Decimal-exact divisibility: `8.61` is a multiple of `0.01` even though
/// neither is exactly representable as a binary float. Both operands are
/// parsed from their decimal notation into exact fractions; numbers the
/// fraction parser cannot read (exponent notation) fall back to float
/// arithmetic.
fn is_multiple(value: &Number, divisor: &Number) -> bool {
    if let (Ok(value), Ok(divisor)) = (
        value.to_string().parse::<BigFraction>(),
        divisor.to_string().parse::<BigFraction>(),
    ) {
        let zero = BigFraction::from(0u8);
        if divisor != zero {
            return value % divisor == zero;
        }
    }
    let (Some(value), Some(divisor)) = (value.as_f64(), divisor.as_f64()) else {
        return false;
    };
    if divisor == 0.0 {
        return false;
    }
    (value / divisor).fract() == 0.0
}

impl Evaluate for MultipleOfEvaluator {
    fn evaluate(
        &self,
        instance: &Value,
        iloc: &LazyLocation,
        kloc: &LazyLocation,
        _ctx: &mut EvaluationContext,
        _adjacent: &AdjacentResults,
    ) -> Option<Evaluation> {
        let kloc = kloc.push(self.core.name.as_ref());
        Some(match instance {
            Value::Number(number) if !is_multiple(number, &self.divisor) => {
                let message = format!(
                    "number at {} is not a multiple of {}",
                    iloc.resolve().formatted(),
                    self.divisor
                );
                self.core
                    .fail(instance, iloc, &kloc, "multipleOf", message, None, Vec::new())
            }
            _ => self.core.pass(iloc, &kloc, None, Vec::new()),
        })
    }

    fn is_valid(&self, instance: &Value, _ctx: &mut EvaluationContext) -> bool {
        match instance {
            Value::Number(number) => is_multiple(number, &self.divisor),
            _ => true,
        }
    }
}

pub(crate) fn compile_multiple_of(
    _ctx: &mut Ctx<'_>,
    _parent: &Map<String, Value>,
    value: &Value,
    core: KeywordCore,
) -> Result<Option<Keyword>, SchemaError> {
    let Value::Number(divisor) = value else {
        return Ok(None);
    };
    Ok(Some(Keyword {
        kind: core.kind,
        evaluator: Box::new(MultipleOfEvaluator {
            core,
            divisor: divisor.clone(),
        }),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case(8.61, 0.01, true; "decimal exact")]
    #[test_case(1.0, 0.1, true)]
    #[test_case(0.0075, 0.0001, true)]
    #[test_case(7.0, 2.0, false)]
    fn multiples(value: f64, divisor: f64, expected: bool) {
        let value = json!(value);
        let divisor = json!(divisor);
        assert_eq!(
            is_multiple(
                value.as_number().expect("number"),
                divisor.as_number().expect("number")
            ),
            expected
        );
    }

    #[test]
    fn integer_multiples() {
        assert!(is_multiple(
            json!(10).as_number().expect("number"),
            json!(5).as_number().expect("number")
        ));
    }
}
