// Well-known internal names referenced by generated code

pub const OBJECT: &str = "java/lang/Object";
pub const STRING: &str = "java/lang/String";
pub const CLASS: &str = "java/lang/Class";
pub const THROWABLE: &str = "java/lang/Throwable";
pub const EXCEPTION: &str = "java/lang/Exception";
pub const RUNTIME_EXCEPTION: &str = "java/lang/RuntimeException";
pub const UNSUPPORTED_OPERATION_EXCEPTION: &str = "java/lang/UnsupportedOperationException";
pub const NUMBER: &str = "java/lang/Number";
pub const RUNNABLE: &str = "java/lang/Runnable";
pub const CALLABLE: &str = "java/util/concurrent/Callable";
pub const CLONEABLE: &str = "java/lang/Cloneable";
pub const SERIALIZABLE: &str = "java/io/Serializable";

// Special method names
pub const CONSTRUCTOR_NAME: &str = "<init>";
pub const TYPE_INITIALIZER_NAME: &str = "<clinit>";
pub const FINALIZE_NAME: &str = "finalize";

// Message prefix of accessors that have no super implementation to call
pub const NO_SUPER_IMPLEMENTATION: &str = "There is no super implementation for: ";

// Field name prefix of captured method call proxy state
pub const PROXY_FIELD_PREFIX: &str = "argument";

// Safety cap for hierarchy walks
pub const MAX_HIERARCHY_DEPTH: usize = 4_096;

// Naming of builder output without an explicit name
pub const DEFAULT_NAME_INFIX: &str = "ClassWeave";
pub const DEFAULT_PACKAGE: &str = "classweave/generated";
