//! Generic classfile-specific definitions

use std::fmt;

/// Header of Java class file (magic number)
pub const MAGIC: u32 = 0xCAFEBABE;

/// Access and property flags of classes, fields and methods
pub mod access_flags {
    pub const ACC_PUBLIC: u16 = 0x0001;
    pub const ACC_PRIVATE: u16 = 0x0002;
    pub const ACC_PROTECTED: u16 = 0x0004;
    pub const ACC_STATIC: u16 = 0x0008;
    pub const ACC_FINAL: u16 = 0x0010;
    pub const ACC_SUPER: u16 = 0x0020;
    pub const ACC_SYNCHRONIZED: u16 = 0x0020;
    pub const ACC_VOLATILE: u16 = 0x0040;
    pub const ACC_BRIDGE: u16 = 0x0040;
    pub const ACC_TRANSIENT: u16 = 0x0080;
    pub const ACC_VARARGS: u16 = 0x0080;
    pub const ACC_NATIVE: u16 = 0x0100;
    pub const ACC_INTERFACE: u16 = 0x0200;
    pub const ACC_ABSTRACT: u16 = 0x0400;
    pub const ACC_STRICT: u16 = 0x0800;
    pub const ACC_SYNTHETIC: u16 = 0x1000;
    pub const ACC_ANNOTATION: u16 = 0x2000;
    pub const ACC_ENUM: u16 = 0x4000;
}

/// Attribute names understood by the reader and writer
pub mod attribute_names {
    pub const CODE: &str = "Code";
    pub const STACK_MAP_TABLE: &str = "StackMapTable";
    pub const SIGNATURE: &str = "Signature";
    pub const EXCEPTIONS: &str = "Exceptions";
}

/// JVM version constants
pub mod major_versions {
    pub const JAVA_1_1: u16 = 45;
    pub const JAVA_5_0: u16 = 49;
    pub const JAVA_6_0: u16 = 50;
    pub const JAVA_7: u16 = 51;
    pub const JAVA_8: u16 = 52;
    pub const JAVA_11: u16 = 55;
    pub const JAVA_17: u16 = 61;
    pub const JAVA_21: u16 = 65;
}

/// A class file format version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassFileVersion {
    pub major: u16,
    pub minor: u16,
}

impl ClassFileVersion {
    pub const JAVA_V5: ClassFileVersion = ClassFileVersion::new(major_versions::JAVA_5_0);
    pub const JAVA_V6: ClassFileVersion = ClassFileVersion::new(major_versions::JAVA_6_0);
    pub const JAVA_V7: ClassFileVersion = ClassFileVersion::new(major_versions::JAVA_7);
    pub const JAVA_V8: ClassFileVersion = ClassFileVersion::new(major_versions::JAVA_8);
    pub const JAVA_V11: ClassFileVersion = ClassFileVersion::new(major_versions::JAVA_11);
    pub const JAVA_V17: ClassFileVersion = ClassFileVersion::new(major_versions::JAVA_17);
    pub const JAVA_V21: ClassFileVersion = ClassFileVersion::new(major_versions::JAVA_21);

    pub const fn new(major: u16) -> Self {
        Self { major, minor: 0 }
    }

    /// Version for a Java release number, e.g. `8` or `17`
    pub fn of_java(release: u16) -> Option<Self> {
        match release {
            1..=4 => Some(Self::new(major_versions::JAVA_1_1 + release - 1)),
            5..=30 => Some(Self::new(major_versions::JAVA_5_0 + release - 5)),
            _ => None,
        }
    }

    /// Java release number of this version
    pub fn java_release(&self) -> u16 {
        self.major.saturating_sub(major_versions::JAVA_5_0 - 5)
    }

    /// Java 6 introduced the `StackMapTable` attribute, Java 7 made it mandatory
    pub fn uses_stack_map_frames(&self) -> bool {
        self.major >= major_versions::JAVA_6_0
    }

    /// Non-abstract interface methods need Java 8
    pub fn supports_default_methods(&self) -> bool {
        self.major >= major_versions::JAVA_8
    }
}

impl Default for ClassFileVersion {
    fn default() -> Self {
        Self::JAVA_V8
    }
}

impl fmt::Display for ClassFileVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Java {} ({}.{})", self.java_release(), self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_java_release_mapping() {
        assert_eq!(ClassFileVersion::of_java(8), Some(ClassFileVersion::JAVA_V8));
        assert_eq!(ClassFileVersion::of_java(17), Some(ClassFileVersion::JAVA_V17));
        assert_eq!(ClassFileVersion::JAVA_V11.java_release(), 11);
        assert_eq!(ClassFileVersion::of_java(0), None);
    }

    #[test]
    fn test_frame_and_default_method_support() {
        assert!(!ClassFileVersion::JAVA_V5.uses_stack_map_frames());
        assert!(ClassFileVersion::JAVA_V7.uses_stack_map_frames());
        assert!(!ClassFileVersion::JAVA_V7.supports_default_methods());
        assert!(ClassFileVersion::JAVA_V8.supports_default_methods());
    }
}
