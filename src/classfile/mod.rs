//! Class file structures, reading and writing
//!
//! The writer side lowers compiled method bodies into a constant pool, `Code` attributes and
//! `StackMapTable` frames. The reader side parses existing class files far enough to describe
//! the supertypes of a generated type.

pub mod attribute;
pub mod class;
pub mod class_writer;
pub mod code_writer;
pub mod constpool;
pub mod defs;
pub mod error;
pub mod frame;
pub mod opcodes;
pub mod reader;
pub mod writer;

pub use class_writer::ClassFileWriter;
pub use defs::ClassFileVersion;
pub use reader::{ClassReader, ParsedClass};
