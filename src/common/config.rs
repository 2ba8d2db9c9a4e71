//! Build configuration shared by every stage of the pipeline

use crate::auxiliary::naming::AuxiliaryNaming;
use crate::classfile::defs::ClassFileVersion;

/// Configuration of a type build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Class file version of every written type
    pub class_file_version: ClassFileVersion,
    /// Reject illegal names and modifier combinations before compilation
    pub type_validation: bool,
    /// Emit `StackMapTable` attributes for versions that use them
    pub emit_frames: bool,
    /// How auxiliary types are named
    pub auxiliary_naming: AuxiliaryNaming,
    /// Infix placed between a method name and the suffix of its accessor
    pub accessor_infix: String,
    /// Infix placed between the instrumented type name and the suffix of an auxiliary type
    pub auxiliary_infix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            class_file_version: ClassFileVersion::JAVA_V8,
            type_validation: true,
            emit_frames: true,
            auxiliary_naming: AuxiliaryNaming::ContentHash,
            accessor_infix: "accessor".to_string(),
            auxiliary_infix: "auxiliary".to_string(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read overrides from `CLASSWEAVE_*` environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(value) = std::env::var("CLASSWEAVE_CLASS_VERSION") {
            match value.trim().parse::<u16>().ok().and_then(ClassFileVersion::of_java) {
                Some(version) => config.class_file_version = version,
                None => log::warn!("ignoring unsupported CLASSWEAVE_CLASS_VERSION={}", value),
            }
        }
        if let Ok(value) = std::env::var("CLASSWEAVE_TYPE_VALIDATION") {
            config.type_validation = parse_flag(&value, config.type_validation);
        }
        if let Ok(value) = std::env::var("CLASSWEAVE_EMIT_FRAMES") {
            config.emit_frames = parse_flag(&value, config.emit_frames);
        }
        config
    }

    pub fn with_class_file_version(mut self, version: ClassFileVersion) -> Self {
        self.class_file_version = version;
        self
    }

    pub fn with_type_validation(mut self, enabled: bool) -> Self {
        self.type_validation = enabled;
        self
    }

    pub fn with_frames(mut self, enabled: bool) -> Self {
        self.emit_frames = enabled;
        self
    }

    pub fn with_auxiliary_naming(mut self, naming: AuxiliaryNaming) -> Self {
        self.auxiliary_naming = naming;
        self
    }

    /// Whether written methods carry stack map frames
    pub fn writes_frames(&self) -> bool {
        self.emit_frames && self.class_file_version.uses_stack_map_frames()
    }
}

fn parse_flag(value: &str, fallback: bool) -> bool {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => true,
        "0" | "false" | "off" | "no" => false,
        _ => fallback,
    }
}
