//! Function prototype rendering

use crate::descriptor::FunctionDescriptor;
use crate::error::RewriteError;

/// Render `return_type name parameter_list`
///
/// No terminator is appended; callers add `;` or a body. The parameter list is
/// inserted exactly as given.
pub fn build_prototype(return_type: &str, name: &str, parameter_list: &str) -> String {
    let mut prototype = String::with_capacity(return_type.len() + name.len() + parameter_list.len() + 1);
    prototype.push_str(return_type);
    prototype.push(' ');
    prototype.push_str(name);
    prototype.push_str(parameter_list);
    prototype
}

/// Prototype of `descriptor` under its original name, sliced from `source`
pub fn prototype_for(descriptor: &FunctionDescriptor, source: &str) -> Result<String, RewriteError> {
    let parameter_list = descriptor.parameter_list_text(source)?;
    Ok(build_prototype(
        descriptor.return_type(),
        descriptor.name(),
        parameter_list,
    ))
}
