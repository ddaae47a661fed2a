use core::fmt;

/// Errors returned by `ObservableMap` operations.
///
/// Every variant is a precondition violation reported to the immediate
/// caller; the map is left unchanged when one is returned.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MapError {
    /// `insert` was called with a key that is already present. Use `set`
    /// to overwrite.
    DuplicateKey,
    /// `get` was called with a key that is not present.
    KeyNotFound,
    /// A mutation was attempted from inside a change-event handler while
    /// more than one change subscriber is registered.
    Reentrancy,
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::DuplicateKey => f.write_str("an entry with the same key already exists"),
            MapError::KeyNotFound => f.write_str("the given key was not present in the map"),
            MapError::Reentrancy => f.write_str(
                "cannot change the map during a change notification with multiple subscribers",
            ),
        }
    }
}

impl std::error::Error for MapError {}

#[cfg(test)]
mod tests {
    use super::MapError;

    #[test]
    fn display_is_human_readable() {
        assert_eq!(
            MapError::DuplicateKey.to_string(),
            "an entry with the same key already exists"
        );
        assert!(MapError::Reentrancy.to_string().contains("multiple subscribers"));
    }

    #[test]
    fn usable_as_boxed_error() {
        fn fails() -> Result<(), Box<dyn std::error::Error>> {
            Err(MapError::KeyNotFound)?;
            Ok(())
        }
        let e = fails().unwrap_err();
        assert_eq!(e.to_string(), "the given key was not present in the map");
    }
}
