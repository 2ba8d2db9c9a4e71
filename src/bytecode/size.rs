//! Operand stack bookkeeping

/// Effect of a stack manipulation on the operand stack
///
/// `size_impact` is the net change in words, `maximal_size` the highest depth above the
/// starting height reached while the manipulation executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub size_impact: i32,
    pub maximal_size: i32,
}

impl Size {
    pub const ZERO: Size = Size { size_impact: 0, maximal_size: 0 };

    pub const fn new(size_impact: i32, maximal_size: i32) -> Self {
        Self { size_impact, maximal_size }
    }

    /// Sequence `other` after `self`
    pub fn aggregate(self, other: Size) -> Size {
        Size {
            size_impact: self.size_impact + other.size_impact,
            maximal_size: self.maximal_size.max(self.size_impact + other.maximal_size),
        }
    }
}

/// Number of operand stack words a value occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StackSize {
    Zero,
    Single,
    Double,
}

impl StackSize {
    pub fn of(words: u16) -> Option<StackSize> {
        match words {
            0 => Some(StackSize::Zero),
            1 => Some(StackSize::Single),
            2 => Some(StackSize::Double),
            _ => None,
        }
    }

    pub fn size(self) -> u16 {
        match self {
            StackSize::Zero => 0,
            StackSize::Single => 1,
            StackSize::Double => 2,
        }
    }

    /// Pushing a value of this size
    pub fn to_increasing_size(self) -> Size {
        let words = self.size() as i32;
        Size::new(words, words)
    }

    /// Consuming a value of this size
    pub fn to_decreasing_size(self) -> Size {
        Size::new(-(self.size() as i32), 0)
    }

    pub fn maximum(self, other: StackSize) -> StackSize {
        self.max(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_measures_from_running_height() {
        let push_long = StackSize::Double.to_increasing_size();
        let push_int = StackSize::Single.to_increasing_size();
        assert_eq!(push_long.aggregate(push_int), Size::new(3, 3));
        let consume = Size::new(-3, 0);
        assert_eq!(push_long.aggregate(push_int).aggregate(consume), Size::new(0, 3));
    }

    #[test]
    fn test_aggregate_is_associative() {
        let sizes = [Size::new(1, 1), Size::new(-2, 0), Size::new(2, 3), Size::new(0, 1)];
        for a in &sizes {
            for b in &sizes {
                for c in &sizes {
                    let left = a.aggregate(*b).aggregate(*c);
                    let right = a.aggregate(b.aggregate(*c));
                    assert_eq!(left, right);
                }
            }
        }
    }

    #[test]
    fn test_stack_size_conversions() {
        assert_eq!(StackSize::Double.to_decreasing_size(), Size::new(-2, 0));
        assert_eq!(StackSize::of(1), Some(StackSize::Single));
        assert_eq!(StackSize::Zero.maximum(StackSize::Single), StackSize::Single);
    }
}
