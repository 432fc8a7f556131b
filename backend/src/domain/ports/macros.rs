//! Defines helper macros for generating domain port error enums.
//!
//! Variants prefixed with `[transient]` describe failures that a retry may
//! clear (a dropped connection, a lost transaction race). The generated
//! [`TransientError`](super::TransientError) impl exposes that split so the
//! services can decide between "redeliver" and "give up".

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            #[doc = concat!("Build the `", stringify!($variant), "` variant.")]
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            #[doc = concat!("Build the `", stringify!($variant), "` variant.")]
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };

    (@transient transient) => { true };
    (@transient) => { false };

    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $([$kind:ident])?
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }

        impl $crate::domain::ports::TransientError for $name {
            fn is_transient(&self) -> bool {
                match self {
                    $(
                        Self::$variant { .. } => define_port_error!(@transient $($kind)?),
                    )*
                }
            }
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use crate::domain::ports::TransientError;

    define_port_error! {
        pub enum ExamplePortError {
            [transient]
            Unavailable { message: String } => "unavailable: {message}",
            Rejected { message: String, count: u32 } => "rejected: {message} ({count})",
            Missing => "missing",
        }
    }

    #[test]
    fn constructors_accept_str_for_string_fields() {
        let err = ExamplePortError::unavailable("socket closed");
        assert_eq!(err.to_string(), "unavailable: socket closed");
    }

    #[test]
    fn constructors_support_mixed_fields() {
        let err = ExamplePortError::rejected("bad row", 3_u32);
        assert_eq!(err.to_string(), "rejected: bad row (3)");
    }

    #[test]
    fn transient_marker_drives_classification() {
        assert!(ExamplePortError::unavailable("x").is_transient());
        assert!(!ExamplePortError::rejected("x", 1_u32).is_transient());
        assert!(!ExamplePortError::missing().is_transient());
    }
}
