//! Modifier sets of types, fields and methods

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use crate::classfile::defs::access_flags::*;

/// Accessibility of a member or type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Visibility {
    Private,
    Package,
    Protected,
    Public,
}

/// Access flags as written to a class file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers(u16);

impl Modifiers {
    pub const EMPTY: Modifiers = Modifiers(0);
    pub const PUBLIC: Modifiers = Modifiers(ACC_PUBLIC);
    pub const PRIVATE: Modifiers = Modifiers(ACC_PRIVATE);
    pub const PROTECTED: Modifiers = Modifiers(ACC_PROTECTED);
    pub const STATIC: Modifiers = Modifiers(ACC_STATIC);
    pub const FINAL: Modifiers = Modifiers(ACC_FINAL);
    pub const SUPER: Modifiers = Modifiers(ACC_SUPER);
    pub const SYNCHRONIZED: Modifiers = Modifiers(ACC_SYNCHRONIZED);
    pub const VOLATILE: Modifiers = Modifiers(ACC_VOLATILE);
    pub const BRIDGE: Modifiers = Modifiers(ACC_BRIDGE);
    pub const TRANSIENT: Modifiers = Modifiers(ACC_TRANSIENT);
    pub const VARARGS: Modifiers = Modifiers(ACC_VARARGS);
    pub const NATIVE: Modifiers = Modifiers(ACC_NATIVE);
    pub const INTERFACE: Modifiers = Modifiers(ACC_INTERFACE);
    pub const ABSTRACT: Modifiers = Modifiers(ACC_ABSTRACT);
    pub const STRICT: Modifiers = Modifiers(ACC_STRICT);
    pub const SYNTHETIC: Modifiers = Modifiers(ACC_SYNTHETIC);
    pub const ANNOTATION: Modifiers = Modifiers(ACC_ANNOTATION);
    pub const ENUM: Modifiers = Modifiers(ACC_ENUM);

    const VISIBILITY_MASK: u16 = ACC_PUBLIC | ACC_PROTECTED | ACC_PRIVATE;

    pub const fn from_bits(bits: u16) -> Self {
        Modifiers(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: Modifiers) -> Self {
        Modifiers(self.0 | other.0)
    }

    pub const fn without(self, other: Modifiers) -> Self {
        Modifiers(self.0 & !other.0)
    }

    pub fn is_public(self) -> bool {
        self.contains(Self::PUBLIC)
    }

    pub fn is_protected(self) -> bool {
        self.contains(Self::PROTECTED)
    }

    pub fn is_private(self) -> bool {
        self.contains(Self::PRIVATE)
    }

    pub fn is_static(self) -> bool {
        self.contains(Self::STATIC)
    }

    pub fn is_final(self) -> bool {
        self.contains(Self::FINAL)
    }

    pub fn is_abstract(self) -> bool {
        self.contains(Self::ABSTRACT)
    }

    pub fn is_interface(self) -> bool {
        self.contains(Self::INTERFACE)
    }

    pub fn is_synthetic(self) -> bool {
        self.contains(Self::SYNTHETIC)
    }

    pub fn is_native(self) -> bool {
        self.contains(Self::NATIVE)
    }

    pub fn visibility(self) -> Visibility {
        if self.is_public() {
            Visibility::Public
        } else if self.is_protected() {
            Visibility::Protected
        } else if self.is_private() {
            Visibility::Private
        } else {
            Visibility::Package
        }
    }

    /// Replace the visibility bits
    pub fn with_visibility(self, visibility: Visibility) -> Self {
        let bits = self.0 & !Self::VISIBILITY_MASK;
        Modifiers(
            bits | match visibility {
                Visibility::Public => ACC_PUBLIC,
                Visibility::Protected => ACC_PROTECTED,
                Visibility::Private => ACC_PRIVATE,
                Visibility::Package => 0,
            },
        )
    }

    /// At most one visibility flag may be set
    pub fn has_single_visibility(self) -> bool {
        (self.0 & Self::VISIBILITY_MASK).count_ones() <= 1
    }
}

impl BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Modifiers) -> Modifiers {
        self.union(rhs)
    }
}

impl BitOrAssign for Modifiers {
    fn bitor_assign(&mut self, rhs: Modifiers) {
        *self = self.union(rhs);
    }
}

/// Java source order keywords for the flags of a method
impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keywords = [
            (Self::PUBLIC, "public"),
            (Self::PROTECTED, "protected"),
            (Self::PRIVATE, "private"),
            (Self::ABSTRACT, "abstract"),
            (Self::STATIC, "static"),
            (Self::FINAL, "final"),
            (Self::NATIVE, "native"),
        ];
        let words: Vec<&str> = keywords
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, word)| *word)
            .collect();
        write!(f, "{}", words.join(" "))
    }
}
