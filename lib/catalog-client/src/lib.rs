//! Blocking client for a Backstage-style software catalog REST API.
//!
//! Calls are authorized with a short-lived bearer token obtained through the
//! OAuth2 client credentials grant and cached by [`TokenProvider`].

pub mod auth;
pub mod client;
pub mod errors;
pub mod owner;

pub use auth::{ClientCredentials, Clock, SystemClock, TokenProvider};
pub use client::{Catalog, Client, ClientBuilder};
pub use errors::{CatalogError, CatalogResult};
pub use owner::OwnerResolver;

mod support {
    use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

    const PATH_SET: &AsciiSet = &CONTROLS
        .add(b' ')
        .add(b'"')
        .add(b'#')
        .add(b'%')
        .add(b'/')
        .add(b'<')
        .add(b'>')
        .add(b'?')
        .add(b'`')
        .add(b'{')
        .add(b'}');

    /// Encode a single path segment. `/` is encoded so a segment can never
    /// address a different resource.
    pub(crate) fn encode_path(pc: &str) -> String {
        utf8_percent_encode(pc, PATH_SET).to_string()
    }

    #[cfg(test)]
    mod tests {
        use test_case::test_case;

        use super::encode_path;

        #[test_case("aws-123456789012" => "aws-123456789012")]
        #[test_case("my bucket" => "my%20bucket")]
        #[test_case("a/b" => "a%2Fb")]
        #[test_case("50%" => "50%25")]
        fn encodes_segment(segment: &str) -> String {
            encode_path(segment)
        }
    }
}
