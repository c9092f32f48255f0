use crate::errors::{Error, Result};

/// Characters that would change the shape of the request path if they
/// appeared inside an identifier.
const FORBIDDEN_ID_CHARS: [char; 4] = ['/', '?', '#', '%'];

/// Validates a device or gateway identifier.
///
/// An identifier must be non-empty, must not be only whitespace and must
/// be usable verbatim as a single path segment.
pub fn validate_device_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(Error::InvalidArgument("Device ID cannot be empty".to_string()));
    }

    if let Some(c) = id
        .chars()
        .find(|c| c.is_whitespace() || FORBIDDEN_ID_CHARS.contains(c))
    {
        return Err(Error::InvalidArgument(format!(
            "Device ID {:?} contains forbidden character {:?}",
            id, c
        )));
    }

    Ok(())
}

/// Validates an attribute name used in a series query
pub fn validate_attribute(attribute: &str) -> Result<()> {
    if attribute.trim().is_empty() {
        return Err(Error::InvalidArgument(
            "Attribute name cannot be empty".to_string(),
        ));
    }

    if attribute.contains(['&', '#']) {
        return Err(Error::InvalidArgument(format!(
            "Attribute name {:?} cannot contain '&' or '#'",
            attribute
        )));
    }

    // Spaces are escaped by the query builder; URL parsing drops tabs and
    // newlines silently.
    if let Some(c) = attribute.chars().find(|c| c.is_whitespace() && *c != ' ') {
        return Err(Error::InvalidArgument(format!(
            "Attribute name {:?} contains forbidden whitespace {:?}",
            attribute, c
        )));
    }

    Ok(())
}
