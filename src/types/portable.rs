/// Portable, language-neutral names for field value types.
///
/// These names appear as the `type` tag of serialized field entries.

/// Maps a Rust type to its portable type name.
///
/// Types without an explicit mapping fall back to the compiler's type name.
pub trait PortableDataType {
    /// Portable name of this type
    fn portable_name() -> String {
        std::any::type_name::<Self>().to_string()
    }
}

macro_rules! portable_type {
    ($($ty:ty => $name:expr),* $(,)?) => {
        $(
            impl PortableDataType for $ty {
                fn portable_name() -> String {
                    $name.to_string()
                }
            }
        )*
    };
}

portable_type! {
    i32 => "int",
    u32 => "unsigned",
    f64 => "double",
    f32 => "float",
    bool => "bool",
    char => "char",
    u64 => "uint64",
    i64 => "int64",
    String => "string",
}

impl<T: PortableDataType> PortableDataType for Vec<T> {
    fn portable_name() -> String {
        format!("{}[]", T::portable_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Opaque;
    impl PortableDataType for Opaque {}

    #[test]
    fn test_scalar_names() {
        assert_eq!(i32::portable_name(), "int");
        assert_eq!(u32::portable_name(), "unsigned");
        assert_eq!(f64::portable_name(), "double");
        assert_eq!(f32::portable_name(), "float");
        assert_eq!(bool::portable_name(), "bool");
        assert_eq!(char::portable_name(), "char");
        assert_eq!(u64::portable_name(), "uint64");
        assert_eq!(i64::portable_name(), "int64");
        assert_eq!(String::portable_name(), "string");
    }

    #[test]
    fn test_vector_names() {
        assert_eq!(Vec::<f64>::portable_name(), "double[]");
        assert_eq!(Vec::<Vec<i32>>::portable_name(), "int[][]");
        assert_eq!(Vec::<String>::portable_name(), "string[]");
    }

    #[test]
    fn test_fallback_uses_type_name() {
        assert!(Opaque::portable_name().ends_with("Opaque"));
    }
}
