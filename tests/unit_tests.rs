//! Feature-area tests over the public parse/traverse/optimize surface.

use pretty_assertions::assert_eq;

use oniguruma_parser::core::nodes::*;
use oniguruma_parser::{generate, optimize, parse, OptimizerOptions, ParserOptions};

mod anchors_and_assertions {
    use super::*;

    #[test]
    fn line_anchors_parse_as_assertions() {
        let ast = parse("^a$", ParserOptions::default()).unwrap();
        if let Node::Regex(r) = &ast {
            if let Node::Pattern(p) = r.pattern.as_ref() {
                if let Node::Alternative(a) = &p.alternatives[0] {
                    assert!(matches!(a.elements[0], Node::Assertion(Assertion { kind: AssertionKind::LineStart, .. })));
                    assert!(matches!(a.elements[2], Node::Assertion(Assertion { kind: AssertionKind::LineEnd, .. })));
                    return;
                }
            }
        }
        panic!("unexpected AST shape");
    }

    #[test]
    fn word_boundary_negation_round_trips() {
        let out = generate(&parse("\\B", ParserOptions::default()).unwrap()).unwrap();
        assert_eq!(out.pattern, "\\B");
    }
}

mod groups_and_captures {
    use super::*;

    #[test]
    fn numbered_captures_increment_in_source_order() {
        let ast = parse("(a)(b)(c)", ParserOptions::default()).unwrap();
        let Node::Regex(r) = &ast else { panic!() };
        let Node::Pattern(p) = r.pattern.as_ref() else { panic!() };
        let Node::Alternative(a) = &p.alternatives[0] else { panic!() };
        let numbers: Vec<u32> = a
            .elements
            .iter()
            .map(|el| match el {
                Node::CapturingGroup(g) => g.number,
                _ => panic!("expected capturing group"),
            })
            .collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn named_group_demotes_unnamed_siblings_by_default() {
        let ast = parse("(a)(?<x>b)", ParserOptions::default()).unwrap();
        let Node::Regex(r) = &ast else { panic!() };
        let Node::Pattern(p) = r.pattern.as_ref() else { panic!() };
        let Node::Alternative(a) = &p.alternatives[0] else { panic!() };
        assert!(matches!(a.elements[0], Node::Group(_)));
        assert!(matches!(a.elements[1], Node::CapturingGroup(_)));
    }

    #[test]
    fn capture_group_rule_keeps_unnamed_groups_capturing() {
        let options = ParserOptions {
            rules: ParserRules { capture_group: true, ..Default::default() },
            ..Default::default()
        };
        let ast = parse("(a)(?<x>b)", options).unwrap();
        let Node::Regex(r) = &ast else { panic!() };
        let Node::Pattern(p) = r.pattern.as_ref() else { panic!() };
        let Node::Alternative(a) = &p.alternatives[0] else { panic!() };
        assert!(matches!(a.elements[0], Node::CapturingGroup(_)));
    }
}

mod backreferences_and_subroutines {
    use super::*;

    #[test]
    fn backreference_to_undefined_group_errors() {
        let err = parse("\\k<missing>", ParserOptions::default()).unwrap_err();
        assert!(matches!(err, OnigError::Reference { .. }));
    }

    #[test]
    fn subroutine_may_reference_a_group_defined_later() {
        let ast = parse("\\g<1>(a)", ParserOptions::default());
        assert!(ast.is_ok());
    }

    #[test]
    fn skip_backref_validation_produces_an_orphan() {
        let options = ParserOptions { skip_backref_validation: true, ..Default::default() };
        let ast = parse("\\k<later>(?<later>a)", options).unwrap();
        let Node::Regex(r) = &ast else { panic!() };
        let Node::Pattern(p) = r.pattern.as_ref() else { panic!() };
        let Node::Alternative(a) = &p.alternatives[0] else { panic!() };
        assert!(matches!(&a.elements[0], Node::Backreference(b) if b.orphan));
    }
}

mod lookaround {
    use super::*;

    #[test]
    fn lookbehind_rejects_a_negative_lookbehind_inside_a_positive_one() {
        let err = parse("(?<=(?<!a))", ParserOptions::default()).unwrap_err();
        assert!(matches!(err, OnigError::Feature { .. } | OnigError::Syntax { .. }));
    }

    #[test]
    fn lookbehind_rejects_lookahead_of_either_polarity() {
        assert!(parse("(?<=(?=a))", ParserOptions::default()).is_err());
        assert!(parse("(?<!(?!a))", ParserOptions::default()).is_err());
    }

    #[test]
    fn lookbehind_rejects_a_capture_nested_under_a_quantifier() {
        assert!(parse("(?<!(a)*)", ParserOptions::default()).is_err());
    }

    #[test]
    fn positive_lookbehind_allows_a_capturing_group() {
        assert!(parse("(?<=(a))", ParserOptions::default()).is_ok());
    }
}

mod quantifiers {
    use super::*;

    #[test]
    fn reversed_bounds_reinterpret_as_possessive() {
        let ast = parse("a{3,1}", ParserOptions::default()).unwrap();
        let Node::Regex(r) = &ast else { panic!() };
        let Node::Pattern(p) = r.pattern.as_ref() else { panic!() };
        let Node::Alternative(alt) = &p.alternatives[0] else { panic!() };
        let Node::Quantifier(q) = &alt.elements[0] else { panic!() };
        assert_eq!(q.min, 1);
        assert_eq!(q.max, Max::Bounded(3));
        assert_eq!(q.kind, QuantifierKind::Possessive);
    }
}

mod character_classes {
    use super::*;

    #[test]
    fn hyphen_at_class_edges_is_literal() {
        let ast = parse("[-a]", ParserOptions::default()).unwrap();
        let Node::Regex(r) = &ast else { panic!() };
        let Node::Pattern(p) = r.pattern.as_ref() else { panic!() };
        let Node::Alternative(a) = &p.alternatives[0] else { panic!() };
        let Node::CharacterClass(cc) = &a.elements[0] else { panic!() };
        assert!(matches!(cc.elements[0], Node::Character(Character { value }) if value == '-' as u32));
    }

    #[test]
    fn empty_class_is_a_syntax_error() {
        assert!(parse("[]", ParserOptions::default()).is_err());
    }

    #[test]
    fn intersection_segments_build_sub_classes() {
        let ast = parse("[a-z&&[^aeiou]]", ParserOptions::default()).unwrap();
        let Node::Regex(r) = &ast else { panic!() };
        let Node::Pattern(p) = r.pattern.as_ref() else { panic!() };
        let Node::Alternative(a) = &p.alternatives[0] else { panic!() };
        let Node::CharacterClass(cc) = &a.elements[0] else { panic!() };
        assert_eq!(cc.kind, ClassKind::Intersection);
        assert_eq!(cc.elements.len(), 2);
    }
}

mod unicode_properties {
    use super::*;

    #[test]
    fn known_alias_resolves_to_its_canonical_name() {
        let ast = parse("\\p{Nd}", ParserOptions::default()).unwrap();
        let Node::Regex(r) = &ast else { panic!() };
        let Node::Pattern(p) = r.pattern.as_ref() else { panic!() };
        let Node::Alternative(a) = &p.alternatives[0] else { panic!() };
        assert!(matches!(&a.elements[0], Node::CharacterSet(cs) if cs.value.as_deref() == Some("Decimal_Number")));
    }

    #[test]
    fn unknown_property_errors_against_a_provided_map() {
        let mut map = std::collections::HashMap::new();
        map.insert("decimalnumber".to_string(), "Decimal_Number".to_string());
        let options = ParserOptions { unicode_property_map: Some(map), ..Default::default() };
        assert!(parse("\\p{NotARealProperty}", options).is_err());
    }
}

mod optimizer_scenarios {
    use super::*;

    #[test]
    fn decimal_number_property_to_digit_shorthand() {
        let out = optimize("\\p{Decimal_Number}", OptimizerOptions::default()).unwrap();
        assert_eq!(out.pattern, "\\d");
    }

    #[test]
    fn reversed_quantifier_bounds_survive_optimization() {
        let out = optimize("a{3,1}", OptimizerOptions::default()).unwrap();
        assert_eq!(out.pattern, "a{1,3}+");
    }
}
