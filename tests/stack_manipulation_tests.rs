//! Size arithmetic and validity of stack manipulations

mod common;

use classweave::bytecode::comparison::Comparison;
use classweave::bytecode::constant::{IntegerConstant, LongConstant, TextConstant};
use classweave::bytecode::{removal, Code, Relation, Size, StackManipulation, StackSize};
use classweave::description::PrimitiveType;
use classweave::Error;

#[cfg(test)]
mod size_tests {
    use super::*;

    #[test]
    fn test_aggregate_is_associative() {
        let sizes = [Size::new(2, 2), Size::new(-1, 0), Size::new(1, 3), Size::new(-3, 0), Size::new(0, 4)];
        for a in sizes {
            for b in sizes {
                for c in sizes {
                    assert_eq!(a.aggregate(b).aggregate(c), a.aggregate(b.aggregate(c)));
                }
            }
        }
    }

    #[test]
    fn test_long_comparison_size() {
        for relation in Relation::ALL {
            assert_eq!(Comparison::of(PrimitiveType::Long, relation).size(), Size::new(-3, 0));
            assert_eq!(Comparison::of(PrimitiveType::Double, relation).size(), Size::new(-3, 0));
            assert_eq!(Comparison::of(PrimitiveType::Int, relation).size(), Size::new(-1, 0));
        }
        assert!(!Comparison::of(PrimitiveType::Boolean, Relation::Equal).is_valid());
    }

    #[test]
    fn test_compound_size_tracks_peak() {
        let manipulation = StackManipulation::compound(vec![
            LongConstant::for_value(1),
            LongConstant::for_value(2),
            Comparison::of(PrimitiveType::Long, Relation::Less),
            removal(StackSize::Single),
        ]);
        assert_eq!(manipulation.size(), Size::new(0, 4));
    }
}

#[cfg(test)]
mod validity_tests {
    use super::*;

    #[test]
    fn test_compound_is_valid_only_when_every_part_is() {
        let valid = StackManipulation::compound(vec![IntegerConstant::for_value(1), StackManipulation::Trivial]);
        assert!(valid.is_valid());
        let nested_illegal = StackManipulation::compound(vec![
            TextConstant::new("x"),
            StackManipulation::compound(vec![StackManipulation::Illegal]),
        ]);
        assert!(!nested_illegal.is_valid());
        assert!(StackManipulation::compound(Vec::new()).is_valid());
    }

    #[test]
    fn test_illegal_manipulation_emits_nothing() {
        common::init_logging();
        let mut code = Code::new();
        let illegal = IntegerConstant::for_value(3).and_then(StackManipulation::Illegal);
        assert!(matches!(illegal.apply(&mut code), Err(Error::IllegalStackManipulation { .. })));
        assert!(code.is_empty());
    }
}
