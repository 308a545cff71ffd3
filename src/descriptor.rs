use std::str::FromStr;

use jdescriptor::MethodDescriptor;

use crate::error::Error;

/// Split a JVM method descriptor into its ordered parameter descriptors and
/// return descriptor.
pub(crate) fn split_method_descriptor(descriptor: &str) -> Result<(Vec<String>, String), Error> {
    let parsed = MethodDescriptor::from_str(descriptor)
        .map_err(|err| Error::malformed(format!("method descriptor '{descriptor}': {err}")))?;
    let parameters = parsed
        .parameter_types()
        .iter()
        .map(|parameter| parameter.to_string())
        .collect();
    Ok((parameters, parsed.return_type().to_string()))
}
