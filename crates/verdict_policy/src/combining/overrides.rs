//! XACML 3.0 deny-overrides and permit-overrides, plain and ordered.

use super::{CombinerParameter, CombiningAlgorithm, CombiningElement, FirstFailure};
use crate::context::EvaluationContext;
use crate::decision::{Decision, Effect, EvaluationResult};
use crate::error::EvaluationOutcome;
use crate::tree::Evaluatable;
use verdict_core::Identifier;

/// Overrides algorithm: a child deciding the overriding effect decides the
/// whole combination
///
/// A plain `Indeterminate` child counts as `Indeterminate{DP}`. The result
/// is `Indeterminate{DP}` when an error could have produced the overriding
/// effect while the other effect is also possible.
#[derive(Debug, Clone)]
pub struct Overrides {
    id: Identifier,
    overriding: Effect,
}

impl Overrides {
    /// Create an overrides algorithm registered under `id`
    #[must_use]
    pub fn new(id: impl Into<Identifier>, overriding: Effect) -> Self {
        Self {
            id: id.into(),
            overriding,
        }
    }

    /// Effect that wins over everything else
    #[must_use]
    pub const fn overriding(&self) -> Effect {
        self.overriding
    }
}

impl<T: Evaluatable> CombiningAlgorithm<T> for Overrides {
    fn id(&self) -> &Identifier {
        &self.id
    }

    fn combine(
        &self,
        ctx: &dyn EvaluationContext,
        elements: &[CombiningElement<T>],
        _parameters: &[CombinerParameter],
    ) -> EvaluationOutcome<EvaluationResult> {
        let over = self.overriding;
        let other = over.opposite();

        let mut combined = EvaluationResult::new(other.decision());
        let mut at_least_one_other = false;
        let mut error_over = false;
        let mut error_other = false;
        let mut error_both = false;
        let mut failure = FirstFailure::default();

        for element in elements {
            let result = element.evaluate(ctx)?;
            match result.decision {
                Decision::NotApplicable => {}
                d if d == over.decision() => return Ok(result),
                d if d == other.decision() => {
                    at_least_one_other = true;
                    combined.merge(result);
                }
                d if d == over.indeterminate() => {
                    error_over = true;
                    failure.record(&result);
                }
                d if d == other.indeterminate() => {
                    error_other = true;
                    failure.record(&result);
                }
                _ => {
                    error_both = true;
                    failure.record(&result);
                }
            }
        }

        let result = if error_both || (error_over && (error_other || at_least_one_other)) {
            failure.into_result(Decision::IndeterminateDenyPermit)
        } else if error_over {
            failure.into_result(over.indeterminate())
        } else if at_least_one_other {
            combined
        } else if error_other {
            failure.into_result(other.indeterminate())
        } else {
            EvaluationResult::not_applicable()
        };
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, Fixed};
    use proptest::prelude::*;
    use verdict_core::xacml;

    fn deny_overrides() -> Overrides {
        Overrides::new(xacml::RULE_DENY_OVERRIDES, Effect::Deny)
    }

    fn permit_overrides() -> Overrides {
        Overrides::new(
            xacml::rule_combining_algorithm("3.0", "permit-overrides").as_str(),
            Effect::Permit,
        )
    }

    fn combine(algorithm: &Overrides, decisions: &[Decision]) -> Decision {
        testing::combine(algorithm, decisions).decision
    }

    use Decision::{
        Deny as D, Indeterminate as I, IndeterminateDeny as ID, IndeterminateDenyPermit as IDP,
        IndeterminatePermit as IP, NotApplicable as NA, Permit as P,
    };

    #[test]
    fn test_deny_overrides_pairs() {
        let table = [
            ([P, P], P),
            ([P, D], D),
            ([P, NA], P),
            ([P, ID], IDP),
            ([P, IP], P),
            ([P, IDP], IDP),
            ([P, I], IDP),
            ([D, IDP], D),
            ([NA, NA], NA),
            ([NA, ID], ID),
            ([NA, IP], IP),
            ([NA, IDP], IDP),
            ([ID, IP], IDP),
            ([ID, ID], ID),
            ([IP, IP], IP),
            ([IDP, NA], IDP),
            ([I, NA], IDP),
        ];
        for (children, expected) in table {
            assert_eq!(combine(&deny_overrides(), &children), expected, "{:?}", children);
            let mut reversed = children;
            reversed.reverse();
            assert_eq!(combine(&deny_overrides(), &reversed), expected, "{:?}", reversed);
        }
    }

    #[test]
    fn test_permit_overrides_pairs() {
        let table = [
            ([D, D], D),
            ([D, P], P),
            ([D, NA], D),
            ([D, IP], IDP),
            ([D, ID], D),
            ([D, IDP], IDP),
            ([P, IDP], P),
            ([NA, NA], NA),
            ([NA, IP], IP),
            ([NA, ID], ID),
            ([IP, ID], IDP),
            ([IP, IP], IP),
            ([I, D], IDP),
        ];
        for (children, expected) in table {
            assert_eq!(combine(&permit_overrides(), &children), expected, "{:?}", children);
            let mut reversed = children;
            reversed.reverse();
            assert_eq!(combine(&permit_overrides(), &reversed), expected, "{:?}", reversed);
        }
    }

    #[test]
    fn test_empty_is_not_applicable() {
        assert_eq!(combine(&deny_overrides(), &[]), NA);
    }

    #[test]
    fn test_overriding_child_returned_unchanged() {
        let result = testing::combine_fixed(
            &deny_overrides(),
            vec![
                Fixed::new(P).with_obligation("urn:example:permit-obligation"),
                Fixed::new(D).with_obligation("urn:example:deny-obligation"),
                Fixed::new(P).with_obligation("urn:example:late"),
            ],
        );
        assert_eq!(result.decision, D);
        assert_eq!(result.obligations.len(), 1);
        assert_eq!(result.obligations[0].id.as_str(), "urn:example:deny-obligation");
    }

    #[test]
    fn test_other_effect_merged_in_order() {
        let result = testing::combine_fixed(
            &deny_overrides(),
            vec![
                Fixed::new(P).with_obligation("urn:example:first"),
                Fixed::new(NA),
                Fixed::new(P).with_obligation("urn:example:second"),
            ],
        );
        assert_eq!(result.decision, P);
        let ids: Vec<_> = result.obligations.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, ["urn:example:first", "urn:example:second"]);
    }

    #[test]
    fn test_indeterminate_keeps_first_status() {
        let result = testing::combine_fixed(
            &deny_overrides(),
            vec![
                Fixed::failing(ID, "first failure"),
                Fixed::failing(IP, "second failure"),
            ],
        );
        assert_eq!(result.decision, IDP);
        assert_eq!(result.status.message.as_deref(), Some("first failure"));
        assert!(result.obligations.is_empty());
    }

    #[test]
    fn test_deny_stops_evaluation() {
        let result = testing::combine_fixed(&deny_overrides(), vec![Fixed::new(D), Fixed::panicking()]);
        assert_eq!(result.decision, D);
    }

    fn any_decision() -> impl Strategy<Value = Decision> {
        prop_oneof![
            Just(P),
            Just(D),
            Just(NA),
            Just(I),
            Just(ID),
            Just(IP),
            Just(IDP),
        ]
    }

    proptest! {
        #[test]
        fn test_deny_always_overrides(mut children in prop::collection::vec(any_decision(), 0..8), at in 0usize..8) {
            let at = at.min(children.len());
            children.insert(at, D);
            prop_assert_eq!(combine(&deny_overrides(), &children), D);
        }

        #[test]
        fn test_permit_always_overrides(mut children in prop::collection::vec(any_decision(), 0..8), at in 0usize..8) {
            let at = at.min(children.len());
            children.insert(at, P);
            prop_assert_eq!(combine(&permit_overrides(), &children), P);
        }

        #[test]
        fn test_result_is_order_independent(children in prop::collection::vec(any_decision(), 0..8)) {
            let mut reversed = children.clone();
            reversed.reverse();
            prop_assert_eq!(
                combine(&deny_overrides(), &children),
                combine(&deny_overrides(), &reversed)
            );
        }
    }
}
