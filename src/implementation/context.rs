//! State collected while the methods of one type are compiled

use std::collections::HashMap;

use log::{debug, warn};

use super::target::ImplementationTarget;
use super::throw_with_message;
use crate::auxiliary::naming::compose;
use crate::auxiliary::AuxiliaryType;
use crate::bytecode::member::{MethodReturn, MethodVariableAccess};
use crate::bytecode::{ByteCodeAppender, Code};
use crate::common::{Config, Error, Result};
use crate::consts::{NO_SUPER_IMPLEMENTATION, RUNTIME_EXCEPTION};
use crate::description::{MethodDescription, Modifiers, SignatureToken, TypeDescription};
use crate::dynamic::DynamicType;
use crate::scaffold::type_writer::{CompiledMethod, MethodBody};

/// Accessors and auxiliary types registered by the implementations of one build
#[derive(Debug)]
pub struct ImplementationContext {
    instrumented: String,
    config: Config,
    accessors: Vec<CompiledMethod>,
    accessor_index: HashMap<SignatureToken, usize>,
    auxiliary: Vec<DynamicType>,
    auxiliary_index: HashMap<AuxiliaryType, usize>,
}

impl ImplementationContext {
    pub fn new(instrumented: &TypeDescription, config: &Config) -> Self {
        Self {
            instrumented: instrumented.name.clone(),
            config: config.clone(),
            accessors: Vec::new(),
            accessor_index: HashMap::new(),
            auxiliary: Vec::new(),
            auxiliary_index: HashMap::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// A synthetic method of the instrumented type invoking the original implementation of `method`
    ///
    /// The original is the super implementation, or else the only default method of a directly
    /// implemented interface. Requesting the same method twice yields the same accessor. When
    /// neither can be invoked the accessor throws a `RuntimeException` naming `method`.
    pub fn require_accessor_for(
        &mut self,
        target: &ImplementationTarget<'_>,
        method: &MethodDescription,
    ) -> Result<MethodDescription> {
        let token = method.signature_token();
        if let Some(&position) = self.accessor_index.get(&token) {
            return Ok(self.accessors[position].description.clone());
        }
        if !method.is_method() || target.graph().locate(&token).is_none() {
            return Err(Error::MethodNotReachable { type_name: self.instrumented.clone(), method: method.to_string() });
        }

        let suffix = self.config.auxiliary_naming.suffix(self.accessors.len(), &token);
        let mut modifiers = Modifiers::SYNTHETIC | Modifiers::FINAL;
        if method.is_static() {
            modifiers |= Modifiers::STATIC;
        }
        let mut accessor = MethodDescription::new(
            self.instrumented.clone(),
            compose(&method.name, &self.config.accessor_infix, &suffix),
            modifiers,
            method.parameters.clone(),
            method.return_type.clone(),
        );
        accessor.exceptions = method.exceptions.clone();

        let invocation = target.invoke_dominant(&token);
        let body = if invocation.is_valid() {
            vec![
                MethodVariableAccess::load_this_and_arguments(&accessor),
                invocation.manipulation(),
                MethodReturn::of(&accessor.return_type),
            ]
        } else {
            warn!("{}: accessor {} has no super implementation to call", self.instrumented, accessor.name);
            vec![throw_with_message(RUNTIME_EXCEPTION, &format!("{}{}", NO_SUPER_IMPLEMENTATION, method))]
        };
        let mut code = Code::new();
        let size = ByteCodeAppender::simple(body).apply(&mut code, &accessor)?;
        debug!("{}: registered accessor {} for {}", self.instrumented, accessor.name, token);

        self.accessor_index.insert(token, self.accessors.len());
        self.accessors.push(CompiledMethod::new(accessor.clone(), Some(MethodBody::new(code, size))));
        Ok(accessor)
    }

    /// Build `auxiliary` unless an equal one was registered before, and describe it
    pub fn register_auxiliary(&mut self, auxiliary: AuxiliaryType) -> Result<TypeDescription> {
        if let Some(&position) = self.auxiliary_index.get(&auxiliary) {
            return Ok(self.auxiliary[position].description.clone());
        }
        let suffix = self.config.auxiliary_naming.suffix(self.auxiliary.len(), &auxiliary);
        let name = compose(&self.instrumented, &self.config.auxiliary_infix, &suffix);
        let made = auxiliary.make(&name, &self.config)?;
        debug!("{}: registered auxiliary type {}", self.instrumented, name);
        let description = made.description.clone();
        self.auxiliary_index.insert(auxiliary, self.auxiliary.len());
        self.auxiliary.push(made);
        Ok(description)
    }

    pub fn accessors(&self) -> &[CompiledMethod] {
        &self.accessors
    }

    pub fn auxiliary_types(&self) -> &[DynamicType] {
        &self.auxiliary
    }

    pub fn into_auxiliary_types(self) -> Vec<DynamicType> {
        self.auxiliary
    }

    /// Accessors and auxiliary types
    pub fn into_parts(self) -> (Vec<CompiledMethod>, Vec<DynamicType>) {
        (self.accessors, self.auxiliary)
    }
}
