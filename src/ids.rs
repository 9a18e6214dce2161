//! Shared shape of the UUID-backed identifiers used across the domains.
//!
//! Every record in the control plane is keyed by a random v4 UUID. The
//! [`uuid_identifier!`] macro stamps out a transparent newtype per record
//! kind so a `TaskId` can never be passed where a `SessionId` is expected,
//! while all of them serialize, parse and print as the bare UUID.

/// Declares a `Copy` newtype over [`uuid::Uuid`].
///
/// The generated type serializes transparently, parses from a trimmed
/// string, displays as the hyphenated UUID, and defaults to a fresh random
/// value. The string literal names the record kind in generated docs.
macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $vis:vis struct $name:ident => $noun:literal;) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize,
        )]
        #[serde(transparent)]
        $vis struct $name(::uuid::Uuid);

        impl $name {
            #[doc = concat!("Generates a fresh random ", $noun, " identifier.")]
            #[must_use]
            pub fn new() -> Self {
                Self(::uuid::Uuid::new_v4())
            }

            #[doc = concat!("Wraps a UUID already known to name a ", $noun, ".")]
            #[must_use]
            pub const fn from_uuid(uuid: ::uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Unwraps the underlying UUID, e.g. for a database column.
            #[must_use]
            pub const fn into_inner(self) -> ::uuid::Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl AsRef<::uuid::Uuid> for $name {
            fn as_ref(&self) -> &::uuid::Uuid {
                &self.0
            }
        }

        impl From<::uuid::Uuid> for $name {
            fn from(uuid: ::uuid::Uuid) -> Self {
                Self(uuid)
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = ::uuid::Error;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                ::uuid::Uuid::parse_str(raw.trim()).map(Self)
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

pub(crate) use uuid_identifier;

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use uuid::Uuid;

    uuid_identifier! {
        /// Identifier used only by these tests.
        pub struct SampleId => "sample";
    }

    #[rstest]
    fn parsing_trims_surrounding_whitespace() {
        let raw = Uuid::new_v4();

        let parsed: SampleId = format!("  {raw}\n").parse().expect("valid uuid");

        assert_eq!(parsed.into_inner(), raw);
    }

    #[rstest]
    #[case("")]
    #[case("not-a-uuid")]
    fn malformed_text_is_rejected(#[case] raw: &str) {
        assert!(raw.parse::<SampleId>().is_err());
    }

    #[rstest]
    fn serializes_as_the_bare_uuid() {
        let raw = Uuid::new_v4();
        let id = SampleId::from(raw);

        let json = serde_json::to_value(id).expect("identifier serializes");

        assert_eq!(json, serde_json::Value::String(raw.to_string()));
        assert_eq!(id.to_string(), raw.to_string());
    }

    #[rstest]
    fn fresh_identifiers_differ() {
        assert_ne!(SampleId::new(), SampleId::default());
    }
}
